// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fiber records and the generational arena that owns them.

use alloc::borrow::Cow;
use alloc::rc::Rc;
use alloc::vec::Vec;

use crate::element::{Component, ElementType, Props};
use crate::hooks::HookRef;

/// Identifier for a fiber in an engine's arena.
///
/// A slot index plus a generation counter, like the node ids of
/// `understory_box_tree`. Freed slots are reused with a bumped generation, so
/// a stale `FiberId` never aliases a live fiber.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct FiberId(pub(crate) u32, pub(crate) u32);

impl FiberId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Per-fiber marker produced by diffing and consumed by commit.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum EffectTag {
    /// No effect (the work-in-progress root).
    #[default]
    None,
    /// Insert the fiber's node into its host parent.
    Placement,
    /// Apply prop changes to the node carried over from the alternate.
    Update,
    /// Remove the fiber's node(s) from the render target.
    Delete,
}

/// What a fiber stands for, resolved once when the fiber is created.
#[derive(Clone, Debug, PartialEq)]
pub enum FiberKind {
    /// The work-in-progress root; owns the container node.
    Root,
    /// A host element with the given tag.
    Host(Cow<'static, str>),
    /// A text node.
    Text,
    /// A function component; owns no node of its own.
    Function(Component),
}

impl FiberKind {
    /// Returns `true` if an element of type `ty` can reuse this fiber.
    pub(crate) fn matches(&self, ty: &ElementType) -> bool {
        match (self, ty) {
            (Self::Host(a), ElementType::Host(b)) => a == b,
            (Self::Text, ElementType::Text) => true,
            (Self::Function(a), ElementType::Function(b)) => a == b,
            _ => false,
        }
    }

    /// Returns `true` for function components.
    #[must_use]
    pub fn is_function(&self) -> bool {
        matches!(self, Self::Function(_))
    }
}

impl From<&ElementType> for FiberKind {
    fn from(ty: &ElementType) -> Self {
        match ty {
            ElementType::Host(tag) => Self::Host(tag.clone()),
            ElementType::Text => Self::Text,
            ElementType::Function(c) => Self::Function(c.clone()),
        }
    }
}

/// A retained work record for one tree position.
///
/// `child` and `sibling` define the tree of one generation; `parent` and
/// `alternate` are non-owning back references.
#[derive(Debug)]
pub struct Fiber<N> {
    pub(crate) kind: FiberKind,
    pub(crate) props: Rc<Props>,
    pub(crate) dom: Option<N>,
    pub(crate) parent: Option<FiberId>,
    pub(crate) child: Option<FiberId>,
    pub(crate) sibling: Option<FiberId>,
    pub(crate) alternate: Option<FiberId>,
    pub(crate) effect_tag: EffectTag,
    pub(crate) hooks: Vec<HookRef>,
}

impl<N> Fiber<N> {
    pub(crate) fn new(kind: FiberKind, props: Rc<Props>) -> Self {
        Self {
            kind,
            props,
            dom: None,
            parent: None,
            child: None,
            sibling: None,
            alternate: None,
            effect_tag: EffectTag::None,
            hooks: Vec::new(),
        }
    }

    /// What this fiber stands for.
    #[must_use]
    pub fn kind(&self) -> &FiberKind {
        &self.kind
    }

    /// Props of the pass that produced this fiber.
    #[must_use]
    pub fn props(&self) -> &Props {
        &self.props
    }

    /// The owned render-target node; always `None` for function components.
    #[must_use]
    pub fn dom(&self) -> Option<&N> {
        self.dom.as_ref()
    }

    /// Parent fiber.
    #[must_use]
    pub fn parent(&self) -> Option<FiberId> {
        self.parent
    }

    /// First child.
    #[must_use]
    pub fn child(&self) -> Option<FiberId> {
        self.child
    }

    /// Next sibling.
    #[must_use]
    pub fn sibling(&self) -> Option<FiberId> {
        self.sibling
    }

    /// The fiber at the same position in the previous generation.
    ///
    /// Cleared once the fiber's pass has been committed.
    #[must_use]
    pub fn alternate(&self) -> Option<FiberId> {
        self.alternate
    }

    /// Effect recorded by the pass that produced this fiber.
    #[must_use]
    pub fn effect_tag(&self) -> EffectTag {
        self.effect_tag
    }

    /// Number of state hooks recorded on the last invocation.
    #[must_use]
    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }
}

#[derive(Debug)]
struct Slot<N> {
    generation: u32,
    fiber: Option<Fiber<N>>,
}

/// Slot storage for fibers with a free list.
#[derive(Debug)]
pub(crate) struct FiberArena<N> {
    slots: Vec<Slot<N>>,
    free: Vec<u32>,
    live: usize,
}

impl<N> Default for FiberArena<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> FiberArena<N> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    pub(crate) fn insert(&mut self, fiber: Fiber<N>) -> FiberId {
        self.live += 1;
        if let Some(idx) = self.free.pop() {
            let slot = &mut self.slots[idx as usize];
            slot.generation += 1;
            slot.fiber = Some(fiber);
            return FiberId::new(idx, slot.generation);
        }
        let idx = u32::try_from(self.slots.len()).expect("fiber arena exceeds u32::MAX slots");
        self.slots.push(Slot {
            generation: 1,
            fiber: Some(fiber),
        });
        FiberId::new(idx, 1)
    }

    pub(crate) fn get(&self, id: FiberId) -> Option<&Fiber<N>> {
        let slot = self.slots.get(id.idx())?;
        if slot.generation != id.1 {
            return None;
        }
        slot.fiber.as_ref()
    }

    pub(crate) fn get_mut(&mut self, id: FiberId) -> Option<&mut Fiber<N>> {
        let slot = self.slots.get_mut(id.idx())?;
        if slot.generation != id.1 {
            return None;
        }
        slot.fiber.as_mut()
    }

    pub(crate) fn remove(&mut self, id: FiberId) -> Option<Fiber<N>> {
        let slot = self.slots.get_mut(id.idx())?;
        if slot.generation != id.1 {
            return None;
        }
        let fiber = slot.fiber.take()?;
        self.free.push(id.0);
        self.live -= 1;
        Some(fiber)
    }

    pub(crate) fn len(&self) -> usize {
        self.live
    }

    /// Frees `root` and every fiber reachable through its `child` links
    /// (and their siblings). `root`'s own siblings are left alone.
    ///
    /// Returns the number of fibers freed.
    pub(crate) fn free_tree(&mut self, root: FiberId) -> usize {
        let mut freed = 0;
        let mut stack = Vec::new();
        if let Some(fiber) = self.remove(root) {
            freed += 1;
            stack.extend(fiber.child);
        }
        while let Some(id) = stack.pop() {
            if let Some(fiber) = self.remove(id) {
                freed += 1;
                stack.extend(fiber.sibling);
                stack.extend(fiber.child);
            }
        }
        freed
    }

    /// Visits `root` and its descendants in depth-first, child-then-sibling order.
    pub(crate) fn for_each_in_tree(&mut self, root: FiberId, mut f: impl FnMut(&mut Fiber<N>)) {
        let mut stack = Vec::new();
        stack.push(root);
        while let Some(id) = stack.pop() {
            let Some(fiber) = self.get_mut(id) else {
                continue;
            };
            f(fiber);
            if id != root {
                stack.extend(fiber.sibling);
            }
            stack.extend(fiber.child);
        }
    }
}
