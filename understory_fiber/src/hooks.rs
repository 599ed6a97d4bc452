// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! State hooks for function components.
//!
//! A [`RenderCx`] exists for exactly one component invocation. It carries the
//! hook index and the hooks of the fiber's alternate, so hook lookups can never
//! leak into another component or outlive the call.
//!
//! Each hook is a shared cell holding the state and a queue of pending updates.
//! A [`SetState`] closes over one hook cell: updating it pushes onto that
//! cell's queue and raises the engine's [`UpdateSignal`]. The next pass rebuilds
//! the hook from the alternate's cell, folding the queue into the state.
//!
//! The old queue is read, not drained, when a hook is rebuilt. If the pass is
//! abandoned and restarted, the restarted pass folds the same updates from the
//! same committed state.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::any::Any;
use core::cell::{Cell, RefCell};
use core::fmt;
use core::marker::PhantomData;

use crate::error::FiberError;
use crate::fiber::FiberId;

/// Shared handle to one hook cell.
pub(crate) type HookRef = Rc<HookCell>;

/// Type-erased storage for a [`StateHook`].
pub(crate) struct HookCell(RefCell<Box<dyn Any>>);

impl fmt::Debug for HookCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookCell").finish_non_exhaustive()
    }
}

type Action<T> = Rc<dyn Fn(&T) -> T>;

struct StateHook<T> {
    state: T,
    queue: Vec<Action<T>>,
}

/// Re-render requests raised by [`SetState`], consumed by the engine.
#[derive(Debug, Default)]
pub(crate) struct UpdateSignal {
    /// An update arrived outside a component invocation; restart from the
    /// committed tree before the next unit of work.
    pending: Cell<bool>,
    /// An update arrived while a component was rendering; schedule a pass
    /// once the current one commits.
    deferred: Cell<bool>,
    /// A component invocation is on the stack.
    rendering: Cell<bool>,
}

impl UpdateSignal {
    fn raise(&self) {
        if self.rendering.get() {
            self.deferred.set(true);
        } else {
            self.pending.set(true);
        }
    }

    pub(crate) fn take_pending(&self) -> bool {
        self.pending.replace(false)
    }

    pub(crate) fn clear_pending(&self) {
        self.pending.set(false);
    }

    /// Holds a request until the next commit.
    pub(crate) fn defer(&self) {
        self.deferred.set(true);
    }

    pub(crate) fn clear_deferred(&self) {
        self.deferred.set(false);
    }

    /// Moves a deferred request to pending. Returns `true` if there was one.
    pub(crate) fn promote_deferred(&self) -> bool {
        let deferred = self.deferred.replace(false);
        if deferred {
            self.pending.set(true);
        }
        deferred
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.pending.get() || self.deferred.get()
    }
}

/// Per-invocation context handed to a function component.
pub struct RenderCx<'a> {
    fiber: FiberId,
    old_hooks: &'a [HookRef],
    has_alternate: bool,
    hooks: Vec<HookRef>,
    index: usize,
    signal: &'a Rc<UpdateSignal>,
    error: Option<FiberError>,
}

impl fmt::Debug for RenderCx<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderCx")
            .field("fiber", &self.fiber)
            .field("index", &self.index)
            .field("recorded", &self.old_hooks.len())
            .finish_non_exhaustive()
    }
}

impl<'a> RenderCx<'a> {
    pub(crate) fn new(
        fiber: FiberId,
        old_hooks: &'a [HookRef],
        has_alternate: bool,
        signal: &'a Rc<UpdateSignal>,
    ) -> Self {
        signal.rendering.set(true);
        Self {
            fiber,
            old_hooks,
            has_alternate,
            hooks: Vec::new(),
            index: 0,
            signal,
            error: None,
        }
    }

    /// The fiber being rendered.
    #[must_use]
    pub fn fiber(&self) -> FiberId {
        self.fiber
    }

    /// Returns the current state for this call site and an updater.
    ///
    /// On the first pass the state is `initial`. On later passes it is the
    /// previous pass's state with every queued update applied in order.
    /// Call sites are identified by call order, so a component must call
    /// `use_state` the same number of times on every pass.
    pub fn use_state<T: Clone + 'static>(&mut self, initial: T) -> (T, SetState<T>) {
        let index = self.index;
        self.index += 1;

        let old_hooks = self.old_hooks;
        let old = old_hooks.get(index);
        if old.is_none() && self.has_alternate {
            self.fail(FiberError::HookOverrun {
                fiber: self.fiber,
                index,
                recorded: old_hooks.len(),
            });
        }

        let mut state = initial;
        if let Some(old) = old {
            let cell = old.0.borrow();
            match cell.downcast_ref::<StateHook<T>>() {
                Some(hook) => {
                    state = hook.state.clone();
                    for action in &hook.queue {
                        state = action(&state);
                    }
                }
                None => self.fail(FiberError::HookTypeMismatch {
                    fiber: self.fiber,
                    index,
                }),
            }
        }

        let hook: HookRef = Rc::new(HookCell(RefCell::new(Box::new(StateHook {
            state: state.clone(),
            queue: Vec::new(),
        }))));
        self.hooks.push(hook.clone());

        let setter = SetState {
            hook: Rc::downgrade(&hook),
            signal: Rc::downgrade(self.signal),
            _marker: PhantomData,
        };
        (state, setter)
    }

    fn fail(&mut self, error: FiberError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Ends the invocation, yielding the hooks built during it.
    pub(crate) fn finish(mut self) -> Result<Vec<HookRef>, FiberError> {
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(core::mem::take(&mut self.hooks)),
        }
    }
}

impl Drop for RenderCx<'_> {
    fn drop(&mut self) {
        self.signal.rendering.set(false);
    }
}

/// Updater returned by [`RenderCx::use_state`].
///
/// Updaters hold weak references: once the hook's fiber has been freed or the
/// engine dropped, updates are ignored.
pub struct SetState<T> {
    hook: Weak<HookCell>,
    signal: Weak<UpdateSignal>,
    _marker: PhantomData<fn(T) -> T>,
}

impl<T> Clone for SetState<T> {
    fn clone(&self) -> Self {
        Self {
            hook: self.hook.clone(),
            signal: self.signal.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for SetState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetState")
            .field("type", &core::any::type_name::<T>())
            .field("live", &(self.hook.strong_count() > 0))
            .finish()
    }
}

impl<T: Clone + 'static> SetState<T> {
    /// Queues `action` to be folded into the state and schedules a new pass.
    pub fn update(&self, action: impl Fn(&T) -> T + 'static) {
        let Some(hook) = self.hook.upgrade() else {
            log::debug!("dropping update for a hook that is no longer alive");
            return;
        };
        if let Some(state) = hook.0.borrow_mut().downcast_mut::<StateHook<T>>() {
            state.queue.push(Rc::new(action));
        }
        if let Some(signal) = self.signal.upgrade() {
            signal.raise();
        }
    }

    /// Queues a replacement value and schedules a new pass.
    pub fn set(&self, value: T) {
        self.update(move |_| value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cx<'a>(
        old: &'a [HookRef],
        has_alternate: bool,
        signal: &'a Rc<UpdateSignal>,
    ) -> RenderCx<'a> {
        RenderCx::new(FiberId::new(0, 1), old, has_alternate, signal)
    }

    #[test]
    fn first_pass_uses_initial() {
        let signal = Rc::new(UpdateSignal::default());
        let mut cx = cx(&[], false, &signal);
        let (a, _) = cx.use_state(5_u32);
        let (b, _) = cx.use_state("x");
        assert_eq!((a, b), (5, "x"));
        assert_eq!(cx.finish().unwrap().len(), 2);
    }

    #[test]
    fn queued_updates_fold_in_order() {
        let signal = Rc::new(UpdateSignal::default());
        let mut first = cx(&[], false, &signal);
        let (_, set) = first.use_state(1_i32);
        let hooks = first.finish().unwrap();

        set.update(|n| n + 1);
        set.update(|n| n * 10);
        assert!(signal.take_pending());

        let mut second = cx(&hooks, true, &signal);
        let (n, _) = second.use_state(1_i32);
        assert_eq!(n, 20);

        // Rebuilding again from the same alternate folds the same queue.
        drop(second);
        let mut again = cx(&hooks, true, &signal);
        assert_eq!(again.use_state(1_i32).0, 20);
    }

    #[test]
    fn overrun_is_reported() {
        let signal = Rc::new(UpdateSignal::default());
        let mut cx = cx(&[], true, &signal);
        let _ = cx.use_state(0_u8);
        assert_eq!(
            cx.finish().unwrap_err(),
            FiberError::HookOverrun {
                fiber: FiberId::new(0, 1),
                index: 0,
                recorded: 0,
            }
        );
    }

    #[test]
    fn type_mismatch_is_reported() {
        let signal = Rc::new(UpdateSignal::default());
        let mut first = cx(&[], false, &signal);
        let _ = first.use_state(0_u8);
        let hooks = first.finish().unwrap();

        let mut second = cx(&hooks, true, &signal);
        let (v, _) = second.use_state(7_u64);
        assert_eq!(v, 7);
        assert!(matches!(
            second.finish(),
            Err(FiberError::HookTypeMismatch { index: 0, .. })
        ));
    }

    #[test]
    fn updates_during_render_are_deferred() {
        let signal = Rc::new(UpdateSignal::default());
        let mut cx = cx(&[], false, &signal);
        let (_, set) = cx.use_state(0_i32);
        set.set(3);
        assert!(!signal.take_pending());
        drop(cx);
        assert!(signal.promote_deferred());
        assert!(signal.take_pending());
    }

    #[test]
    fn updates_after_hook_is_freed_are_ignored() {
        let signal = Rc::new(UpdateSignal::default());
        let mut cx = cx(&[], false, &signal);
        let (_, set) = cx.use_state(0_i32);
        drop(cx.finish().unwrap());
        set.set(1);
        assert!(!signal.is_pending());
    }
}
