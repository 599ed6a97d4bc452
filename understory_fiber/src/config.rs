// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Engine configuration.

/// Tunables for an [`Engine`](crate::Engine).
///
/// ```rust
/// use understory_fiber::EngineConfig;
///
/// let config = EngineConfig::new().with_event_prefix("@").with_yield_threshold(2.0);
/// assert_eq!(config.event_prefix(), "@");
/// assert_eq!(config.yield_threshold(), 2.0);
/// ```
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EngineConfig {
    event_prefix: &'static str,
    yield_threshold: f64,
}

impl EngineConfig {
    /// The default configuration: event prefix `"on"`, yield threshold `1.0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            event_prefix: "on",
            yield_threshold: 1.0,
        }
    }

    /// Sets the prefix that marks a handler-valued prop as an event.
    #[must_use]
    pub const fn with_event_prefix(mut self, prefix: &'static str) -> Self {
        self.event_prefix = prefix;
        self
    }

    /// Sets the threshold below which the work loop yields.
    ///
    /// After each unit of work the loop yields once
    /// [`Deadline::time_remaining`](crate::Deadline::time_remaining) drops
    /// below this value.
    #[must_use]
    pub const fn with_yield_threshold(mut self, threshold: f64) -> Self {
        self.yield_threshold = threshold;
        self
    }

    /// Event key prefix.
    #[must_use]
    pub const fn event_prefix(&self) -> &'static str {
        self.event_prefix
    }

    /// Yield threshold.
    #[must_use]
    pub const fn yield_threshold(&self) -> f64 {
        self.yield_threshold
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
