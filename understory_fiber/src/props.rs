// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Prop classification and prop-set differencing.
//!
//! Every prop key falls into exactly one [`PropKind`]:
//!
//! - **Children**: the reserved [`CHILDREN_KEY`]; structural, never applied.
//! - **Event**: the key starts with the event prefix (default `"on"`) *and* the
//!   value is a [`PropValue::Handler`].
//! - **Attribute**: everything else.
//!
//! [`diff`] compares two prop sets and reports what a render-target node needs
//! to change. Classification is per side: a key that holds a handler in the old
//! set and a string in the new set is a stale event *and* a new attribute.
//!
//! ```rust
//! use understory_fiber::props::{self, PropKind};
//! use understory_fiber::{Handler, PropValue, Props};
//!
//! let old = Props::new().with("id", "a").with("title", "t");
//! let new = Props::new().with("id", "b").with("onClick", Handler::new(|_| {}));
//!
//! let d = props::diff(&old, &new, "on");
//! assert_eq!(d.gone_attributes, ["title"]);
//! assert_eq!(d.changed_attributes.len(), 1);
//! assert_eq!(d.new_events.len(), 1);
//! assert!(d.stale_events.is_empty());
//!
//! assert_eq!(props::classify("onClick", &PropValue::from("x"), "on"), PropKind::Attribute);
//! ```

use alloc::string::String;
use alloc::vec::Vec;

use crate::element::{CHILDREN_KEY, Handler, PropValue, Props};

/// How a prop key is treated by the mutation applier.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PropKind {
    /// A plain attribute assigned to the node.
    Attribute,
    /// An event subscription.
    Event,
    /// The structural child sequence.
    Children,
}

/// Classifies `key` holding `value`.
#[must_use]
pub fn classify(key: &str, value: &PropValue, event_prefix: &str) -> PropKind {
    if key == CHILDREN_KEY {
        PropKind::Children
    } else if is_event(key, value, event_prefix) {
        PropKind::Event
    } else {
        PropKind::Attribute
    }
}

/// Returns `true` if `key` is an event subscription.
#[must_use]
pub fn is_event(key: &str, value: &PropValue, event_prefix: &str) -> bool {
    key.starts_with(event_prefix) && matches!(value, PropValue::Handler(_))
}

/// Returns `true` if `key` is a plain attribute.
#[must_use]
pub fn is_property(key: &str, value: &PropValue, event_prefix: &str) -> bool {
    key != CHILDREN_KEY && !is_event(key, value, event_prefix)
}

/// Returns `true` if `key` is present in `new` with a value that differs from
/// `old` (or is absent from `old`).
#[must_use]
pub fn is_new(old: &Props, new: &Props, key: &str) -> bool {
    match new.get(key) {
        Some(value) => old.get(key) != Some(value),
        None => false,
    }
}

/// Returns `true` if `key` is present in `old` and absent from `new`.
#[must_use]
pub fn is_gone(old: &Props, new: &Props, key: &str) -> bool {
    old.contains(key) && !new.contains(key)
}

/// Maps an event key to the event name the render target understands.
///
/// The key is lower-cased and the prefix removed: `"onClick"` → `"click"`.
#[must_use]
pub fn event_name(key: &str, event_prefix: &str) -> String {
    let lower = key.to_lowercase();
    match lower.get(event_prefix.len()..) {
        Some(name) => name.into(),
        None => String::new(),
    }
}

/// The changes needed to move a node from one prop set to another.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropDiff<'a> {
    /// Attributes present before that are no longer attributes.
    pub gone_attributes: Vec<&'a str>,
    /// Attributes that are new or whose value changed, with the new value.
    pub changed_attributes: Vec<(&'a str, &'a PropValue)>,
    /// Subscriptions to drop: gone or changed event keys, with the old handler.
    pub stale_events: Vec<(&'a str, &'a Handler)>,
    /// Subscriptions to add: new or changed event keys, with the new handler.
    pub new_events: Vec<(&'a str, &'a Handler)>,
}

impl PropDiff<'_> {
    /// Returns `true` if the node needs no changes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.gone_attributes.is_empty()
            && self.changed_attributes.is_empty()
            && self.stale_events.is_empty()
            && self.new_events.is_empty()
    }
}

/// Computes the attribute and event changes between `old` and `new`.
#[must_use]
pub fn diff<'a>(old: &'a Props, new: &'a Props, event_prefix: &str) -> PropDiff<'a> {
    let mut out = PropDiff::default();

    for (key, value) in old.iter() {
        match classify(key, value, event_prefix) {
            PropKind::Attribute => {
                let still_attribute = new
                    .get(key)
                    .is_some_and(|v| is_property(key, v, event_prefix));
                if !still_attribute {
                    out.gone_attributes.push(key);
                }
            }
            PropKind::Event => {
                if is_gone(old, new, key) || is_new(old, new, key) {
                    if let PropValue::Handler(handler) = value {
                        out.stale_events.push((key, handler));
                    }
                }
            }
            PropKind::Children => {}
        }
    }

    for (key, value) in new.iter() {
        match (classify(key, value, event_prefix), value) {
            (PropKind::Attribute, _) if is_new(old, new, key) => {
                out.changed_attributes.push((key, value));
            }
            (PropKind::Event, PropValue::Handler(handler)) if is_new(old, new, key) => {
                out.new_events.push((key, handler));
            }
            _ => {}
        }
    }

    out
}
