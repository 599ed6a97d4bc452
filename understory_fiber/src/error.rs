// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Engine failure kinds.

use core::fmt;

use crate::fiber::FiberId;

/// A reconciliation invariant was violated.
///
/// These are programming errors rather than operational faults. Any of them
/// aborts the pass in progress: the work-in-progress tree is discarded and the
/// committed tree record is left unchanged. A failure during commit is not
/// rolled back, so the render target may already hold part of the pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FiberError {
    /// The diff walked into a fiber that is no longer alive, so the old and
    /// new chains are out of sync.
    Desync {
        /// The dangling fiber.
        fiber: FiberId,
    },
    /// Commit found no ancestor owning a render-target node.
    MissingHostAncestor {
        /// The fiber being committed.
        fiber: FiberId,
    },
    /// A component called `use_state` more often than on its previous pass.
    HookOverrun {
        /// The function fiber.
        fiber: FiberId,
        /// Index of the offending call.
        index: usize,
        /// Hooks recorded on the previous pass.
        recorded: usize,
    },
    /// A hook was read back with a different state type than it was created with.
    HookTypeMismatch {
        /// The function fiber.
        fiber: FiberId,
        /// Index of the offending call.
        index: usize,
    },
}

impl fmt::Display for FiberError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Desync { fiber } => {
                write!(f, "fiber {fiber:?} is not alive; old and new chains diverged")
            }
            Self::MissingHostAncestor { fiber } => {
                write!(f, "fiber {fiber:?} has no ancestor owning a render-target node")
            }
            Self::HookOverrun {
                fiber,
                index,
                recorded,
            } => write!(
                f,
                "fiber {fiber:?} called use_state #{index} but only {recorded} hooks were recorded on the previous pass"
            ),
            Self::HookTypeMismatch { fiber, index } => {
                write!(f, "fiber {fiber:?} read hook #{index} with a different state type")
            }
        }
    }
}

impl core::error::Error for FiberError {}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn display_names_the_fiber() {
        let err = FiberError::HookOverrun {
            fiber: FiberId::new(3, 1),
            index: 2,
            recorded: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains("use_state #2"));
        assert!(msg.contains("FiberId(3, 1)"));
    }
}
