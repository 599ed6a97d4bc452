// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host collaborator interfaces: the render target and the time budget.

use crate::element::{Handler, PropValue};

/// The retained output tree the engine mutates.
///
/// Implement this for a DOM binding, a scene graph, or a widget toolkit. The
/// engine only ever calls these primitives from the commit phase and while
/// materializing new nodes; it never reads back from the target.
///
/// `Node` is a cheap handle (an id, an `Rc`, a JS reference). The engine clones
/// it freely: a fiber that survives a pass shares its handle with the fiber it
/// replaced.
pub trait RenderTarget {
    /// Handle to one node in the target.
    type Node: Clone;

    /// Creates an element node with the given tag.
    fn create_node(&mut self, tag: &str) -> Self::Node;

    /// Creates an empty text node.
    ///
    /// Text content arrives afterwards as the
    /// [`TEXT_VALUE_KEY`](crate::TEXT_VALUE_KEY) attribute.
    fn create_text_node(&mut self) -> Self::Node;

    /// Assigns an attribute.
    fn set_attribute(&mut self, node: &Self::Node, key: &str, value: &PropValue);

    /// Resets an attribute to its default.
    fn remove_attribute(&mut self, node: &Self::Node, key: &str);

    /// Subscribes `handler` to `event` on `node`.
    fn add_listener(&mut self, node: &Self::Node, event: &str, handler: &Handler);

    /// Unsubscribes a handler previously passed to [`add_listener`](Self::add_listener).
    fn remove_listener(&mut self, node: &Self::Node, event: &str, handler: &Handler);

    /// Appends `node` as the last child of `parent`.
    fn insert_child(&mut self, parent: &Self::Node, node: &Self::Node);

    /// Detaches `node` from `parent`.
    fn remove_child(&mut self, parent: &Self::Node, node: &Self::Node);
}

/// Remaining time in the host's current idle slice.
///
/// Units are up to the host (milliseconds in a browser); the engine only
/// compares the value against [`EngineConfig::yield_threshold`](crate::EngineConfig::yield_threshold).
pub trait Deadline {
    /// Time left in the current slice.
    fn time_remaining(&self) -> f64;
}

impl<F: Fn() -> f64> Deadline for F {
    fn time_remaining(&self) -> f64 {
        self()
    }
}

/// A deadline that never expires.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Unbounded;

impl Deadline for Unbounded {
    fn time_remaining(&self) -> f64 {
        f64::INFINITY
    }
}

/// A wall-clock slice: `budget_ms` milliseconds starting at `start`.
#[cfg(feature = "std")]
#[derive(Copy, Clone, Debug)]
pub struct SliceDeadline {
    start: std::time::Instant,
    budget_ms: f64,
}

#[cfg(feature = "std")]
impl SliceDeadline {
    /// Starts a slice of `budget_ms` milliseconds now.
    #[must_use]
    pub fn new(budget_ms: f64) -> Self {
        Self {
            start: std::time::Instant::now(),
            budget_ms,
        }
    }
}

#[cfg(feature = "std")]
impl Deadline for SliceDeadline {
    fn time_remaining(&self) -> f64 {
        let elapsed = self.start.elapsed().as_secs_f64() * 1000.0;
        (self.budget_ms - elapsed).max(0.0)
    }
}
