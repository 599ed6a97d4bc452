// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The engine: pass lifecycle, cooperative scheduling, and commit promotion.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

use crate::commit::{self, CommitSummary};
use crate::config::EngineConfig;
use crate::element::{Element, Props};
use crate::error::FiberError;
use crate::fiber::{Fiber, FiberArena, FiberId, FiberKind};
use crate::hooks::UpdateSignal;
use crate::host::{Deadline, RenderTarget, Unbounded};

/// Outcome of one [`Engine::work_loop`] call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WorkStatus {
    /// No pass was in flight and no update was scheduled.
    Idle,
    /// The deadline ran out; work remains for the next call.
    Yielded,
    /// A pass finished and was committed to the render target.
    Committed(CommitSummary),
}

/// An interruptible reconciler bound to one render target.
///
/// The engine owns every fiber of the committed tree and of the pass in
/// flight. Callers drive it by calling [`render`](Self::render) to start a
/// pass and then [`work_loop`](Self::work_loop) from the host's idle
/// callback until it reports [`WorkStatus::Committed`].
///
/// Between two passes only one tree exists: the committed one. While a pass
/// is in flight, the work-in-progress fibers point at their committed
/// counterparts through `alternate`. Committing frees the previous
/// generation, so memory stays bounded by at most two trees.
pub struct Engine<T: RenderTarget> {
    pub(crate) target: T,
    pub(crate) config: EngineConfig,
    pub(crate) arena: FiberArena<T::Node>,
    pub(crate) next_unit: Option<FiberId>,
    wip_root: Option<FiberId>,
    current_root: Option<FiberId>,
    pub(crate) deletions: Vec<FiberId>,
    pub(crate) signal: Rc<UpdateSignal>,
    units_in_pass: usize,
    last_commit: Option<CommitSummary>,
    abandoned_passes: usize,
}

impl<T: RenderTarget> fmt::Debug for Engine<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("fibers", &self.arena.len())
            .field("next_unit", &self.next_unit)
            .field("wip_root", &self.wip_root)
            .field("current_root", &self.current_root)
            .field("deletions", &self.deletions.len())
            .field("abandoned_passes", &self.abandoned_passes)
            .finish_non_exhaustive()
    }
}

impl<T: RenderTarget> Engine<T> {
    /// Creates an engine with the default [`EngineConfig`].
    pub fn new(target: T) -> Self {
        Self::with_config(target, EngineConfig::new())
    }

    /// Creates an engine with an explicit configuration.
    pub fn with_config(target: T, config: EngineConfig) -> Self {
        Self {
            target,
            config,
            arena: FiberArena::new(),
            next_unit: None,
            wip_root: None,
            current_root: None,
            deletions: Vec::new(),
            signal: Rc::new(UpdateSignal::default()),
            units_in_pass: 0,
            last_commit: None,
            abandoned_passes: 0,
        }
    }

    /// Starts a pass that renders `element` as the only child of `container`.
    ///
    /// Any pass already in flight is abandoned; the committed tree is left
    /// untouched. No render-target mutation happens until the new pass has
    /// been fully worked and committed.
    pub fn render(&mut self, element: Element, container: T::Node) {
        let mut root = Fiber::new(FiberKind::Root, Rc::new(Props::new().with_child(element)));
        root.dom = Some(container);
        root.alternate = self.current_root;
        // The new pass reads the committed hooks, so it already covers
        // anything queued so far.
        self.signal.clear_pending();
        self.begin_pass(root);
    }

    /// Performs units of work until the pass completes or `deadline` runs low.
    ///
    /// After every unit the deadline is polled; if less than
    /// [`EngineConfig::yield_threshold`] remains, the loop returns
    /// [`WorkStatus::Yielded`] and the next call resumes at the same fiber.
    /// At least one unit is performed per call when work is pending.
    ///
    /// State updates raised since the last unit restart the pass from the
    /// committed tree before more work is done.
    ///
    /// # Errors
    ///
    /// Returns an error if a component breaks the hook-order contract or the
    /// fiber tree is inconsistent. The pass in flight is dropped; the
    /// committed tree stays as it was.
    pub fn work_loop<D: Deadline + ?Sized>(
        &mut self,
        deadline: &D,
    ) -> Result<WorkStatus, FiberError> {
        let mut should_yield = false;
        loop {
            self.take_scheduled_update();
            let Some(unit) = self.next_unit else {
                break;
            };
            if should_yield {
                log::trace!("yielding before {unit:?}");
                return Ok(WorkStatus::Yielded);
            }
            match self.perform_unit_of_work(unit) {
                Ok(next) => {
                    self.next_unit = next;
                    self.units_in_pass += 1;
                }
                Err(err) => {
                    log::warn!("dropping pass: {err}");
                    self.abort_pass();
                    return Err(err);
                }
            }
            should_yield = deadline.time_remaining() < self.config.yield_threshold();
        }

        if self.wip_root.is_some() {
            self.commit().map(WorkStatus::Committed)
        } else {
            Ok(WorkStatus::Idle)
        }
    }

    /// Runs passes to completion, including any scheduled by state updates.
    ///
    /// Returns the summary of the last commit, or `None` if there was nothing
    /// to do.
    ///
    /// # Errors
    ///
    /// See [`work_loop`](Self::work_loop).
    pub fn flush(&mut self) -> Result<Option<CommitSummary>, FiberError> {
        let mut last = None;
        loop {
            match self.work_loop(&Unbounded)? {
                WorkStatus::Committed(summary) => last = Some(summary),
                WorkStatus::Idle => return Ok(last),
                WorkStatus::Yielded => {}
            }
        }
    }

    /// Returns `true` if a pass is in flight or an update is scheduled.
    #[must_use]
    pub fn has_pending_work(&self) -> bool {
        self.wip_root.is_some() || self.signal.is_pending()
    }

    /// The render target.
    #[must_use]
    pub fn target(&self) -> &T {
        &self.target
    }

    /// Mutable access to the render target.
    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    /// Consumes the engine, returning the render target.
    pub fn into_target(self) -> T {
        self.target
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Looks up a live fiber.
    #[must_use]
    pub fn fiber(&self, id: FiberId) -> Option<&Fiber<T::Node>> {
        self.arena.get(id)
    }

    /// Root of the last committed tree.
    #[must_use]
    pub fn committed_root(&self) -> Option<FiberId> {
        self.current_root
    }

    /// Root of the pass in flight.
    #[must_use]
    pub fn wip_root(&self) -> Option<FiberId> {
        self.wip_root
    }

    /// The fiber the next unit of work will process.
    #[must_use]
    pub fn next_unit(&self) -> Option<FiberId> {
        self.next_unit
    }

    /// Old fibers the pass in flight will remove at commit.
    #[must_use]
    pub fn deletions(&self) -> &[FiberId] {
        &self.deletions
    }

    /// Summary of the most recent commit.
    #[must_use]
    pub fn last_commit(&self) -> Option<CommitSummary> {
        self.last_commit
    }

    /// Passes dropped before commit because a newer pass replaced them.
    #[must_use]
    pub fn abandoned_passes(&self) -> usize {
        self.abandoned_passes
    }

    /// Number of live fibers across the committed tree and the pass in flight.
    #[must_use]
    pub fn fiber_count(&self) -> usize {
        self.arena.len()
    }

    fn begin_pass(&mut self, root: Fiber<T::Node>) {
        if let Some(wip) = self.wip_root.take() {
            let freed = self.arena.free_tree(wip);
            self.abandoned_passes += 1;
            log::warn!("abandoning pass at {wip:?} ({freed} fibers)");
        }
        let root = self.arena.insert(root);
        log::debug!("starting pass at {root:?}");
        self.deletions.clear();
        self.units_in_pass = 0;
        self.wip_root = Some(root);
        self.next_unit = Some(root);
    }

    /// Restarts from the committed tree if a state update is pending.
    fn take_scheduled_update(&mut self) {
        if !self.signal.take_pending() {
            return;
        }
        let Some(current) = self.current_root else {
            // Nothing to restart from yet; rerun once the first pass commits.
            log::debug!("update before the first commit; deferring");
            self.signal.defer();
            return;
        };
        let Some(committed) = self.arena.get(current) else {
            return;
        };
        let mut root = Fiber::new(FiberKind::Root, committed.props.clone());
        root.dom = committed.dom.clone();
        root.alternate = Some(current);
        self.begin_pass(root);
    }

    fn commit(&mut self) -> Result<CommitSummary, FiberError> {
        let Some(root) = self.wip_root else {
            return Ok(CommitSummary::default());
        };
        let mut summary = match commit::commit_root(
            &self.arena,
            &mut self.target,
            &self.deletions,
            root,
            &self.config,
        ) {
            Ok(summary) => summary,
            Err(err) => {
                log::warn!("commit failed: {err}");
                self.abort_pass();
                return Err(err);
            }
        };
        summary.units = self.units_in_pass;

        self.wip_root = None;
        self.next_unit = None;
        self.deletions.clear();
        if let Some(old) = self.current_root.replace(root) {
            let freed = self.arena.free_tree(old);
            log::trace!("freed {freed} fibers of the previous generation");
        }
        self.arena.for_each_in_tree(root, |fiber| fiber.alternate = None);
        self.last_commit = Some(summary);
        log::debug!("committed {root:?}: {summary:?}");

        if self.signal.promote_deferred() {
            log::debug!("update raised during render; scheduling another pass");
        }
        Ok(summary)
    }

    fn abort_pass(&mut self) {
        if let Some(wip) = self.wip_root.take() {
            self.arena.free_tree(wip);
        }
        self.next_unit = None;
        self.deletions.clear();
        self.units_in_pass = 0;
        self.signal.clear_deferred();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Component;
    use crate::fiber::EffectTag;
    use crate::memory::MemoryTarget;
    use core::cell::Cell;

    fn list(n: usize) -> Element {
        let mut ul = Element::host("ul");
        for i in 0..n {
            ul = ul.with_child(Element::host("li").with("id", i as i64));
        }
        ul
    }

    #[test]
    fn idle_without_work() {
        let mut engine = Engine::new(MemoryTarget::new());
        assert_eq!(engine.work_loop(&Unbounded), Ok(WorkStatus::Idle));
        assert_eq!(engine.flush(), Ok(None));
    }

    #[test]
    fn yields_after_one_unit_when_budget_is_exhausted() {
        let mut target = MemoryTarget::new();
        let container = target.create_container();
        let mut engine = Engine::new(target);
        engine.render(list(3), container);

        let empty = || 0.0;
        let mut yields = 0;
        loop {
            let before = engine.next_unit();
            match engine.work_loop(&empty).unwrap() {
                WorkStatus::Yielded => {
                    yields += 1;
                    assert_ne!(engine.next_unit(), before);
                    assert!(engine.target().children(container).is_empty());
                }
                WorkStatus::Committed(summary) => {
                    // root, ul, three li
                    assert_eq!(summary.units, 5);
                    break;
                }
                WorkStatus::Idle => panic!("pass vanished"),
            }
        }
        assert_eq!(yields, 4);
        assert_eq!(engine.target().children(container).len(), 1);
    }

    #[test]
    fn commit_promotes_the_new_generation() {
        let mut target = MemoryTarget::new();
        let container = target.create_container();
        let mut engine = Engine::new(target);

        engine.render(list(2), container);
        engine.flush().unwrap();
        let first_root = engine.committed_root().unwrap();
        assert_eq!(engine.fiber_count(), 4);

        engine.render(list(2), container);
        engine.flush().unwrap();
        let root = engine.committed_root().unwrap();
        assert_ne!(root, first_root);
        assert!(engine.fiber(first_root).is_none());
        assert_eq!(engine.fiber_count(), 4);

        let ul = engine.fiber(root).unwrap().child().unwrap();
        let ul = engine.fiber(ul).unwrap();
        assert_eq!(ul.effect_tag(), EffectTag::Update);
        assert_eq!(ul.alternate(), None);
        assert!(engine.wip_root().is_none());
        assert!(engine.deletions().is_empty());
    }

    #[test]
    fn rendering_mid_pass_abandons_the_old_pass() {
        let mut target = MemoryTarget::new();
        let container = target.create_container();
        let mut engine = Engine::new(target);

        engine.render(list(3), container);
        assert_eq!(engine.work_loop(&|| 0.0), Ok(WorkStatus::Yielded));
        engine.render(Element::host("p"), container);
        assert_eq!(engine.abandoned_passes(), 1);

        engine.flush().unwrap();
        assert_eq!(engine.target().to_markup(container), "<#container><p></p></#container>");
        assert_eq!(engine.fiber_count(), 2);
    }

    #[test]
    fn hook_errors_drop_the_pass() {
        let flip = Rc::new(Cell::new(false));
        let seen = flip.clone();
        let component = Component::new(move |cx, _| {
            let (_, set) = cx.use_state(0_u8);
            if seen.get() {
                // Deferred by the failing render; must not outlive the pass.
                set.set(1);
                let _ = cx.use_state(0_u8);
            }
            Element::host("div")
        });

        let mut target = MemoryTarget::new();
        let container = target.create_container();
        let mut engine = Engine::new(target);
        engine.render(Element::function(component.clone(), Props::new()), container);
        engine.flush().unwrap();
        let committed = engine.committed_root();

        flip.set(true);
        engine.render(Element::function(component, Props::new()), container);
        assert!(matches!(
            engine.flush(),
            Err(FiberError::HookOverrun { index: 1, recorded: 1, .. })
        ));
        assert_eq!(engine.committed_root(), committed);
        assert!(engine.wip_root().is_none());
        assert!(!engine.has_pending_work());
    }
}
