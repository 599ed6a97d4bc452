// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Applying prop changes to a render-target node.

use crate::config::EngineConfig;
use crate::element::Props;
use crate::host::RenderTarget;
use crate::props::{self, PropDiff};

/// Brings `node` from `old` props to `new` props with the fewest target calls.
///
/// Pass empty `old` props when the node was just created. Changes are applied
/// in a fixed order so a replaced handler is never bound twice:
///
/// 1. reset attributes that are gone,
/// 2. assign attributes that are new or changed,
/// 3. unsubscribe events that are gone or changed,
/// 4. subscribe events that are new or changed.
pub fn update_node<T: RenderTarget>(
    target: &mut T,
    node: &T::Node,
    old: &Props,
    new: &Props,
    config: &EngineConfig,
) {
    let prefix = config.event_prefix();
    let PropDiff {
        gone_attributes,
        changed_attributes,
        stale_events,
        new_events,
    } = props::diff(old, new, prefix);

    for key in gone_attributes {
        target.remove_attribute(node, key);
    }
    for (key, value) in changed_attributes {
        target.set_attribute(node, key, value);
    }
    for (key, handler) in stale_events {
        target.remove_listener(node, &props::event_name(key, prefix), handler);
    }
    for (key, handler) in new_events {
        target.add_listener(node, &props::event_name(key, prefix), handler);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Handler;
    use crate::memory::{MemoryTarget, Mutation};

    #[test]
    fn unchanged_props_emit_nothing() {
        let mut target = MemoryTarget::new();
        let node = target.create_node("div");
        target.clear_mutations();
        let h = Handler::new(|_| {});
        let props = Props::new().with("id", "a").with("onClick", h);
        update_node(&mut target, &node, &props, &props.clone(), &EngineConfig::new());
        assert!(target.mutations().is_empty());
    }

    #[test]
    fn removals_precede_additions() {
        let mut target = MemoryTarget::new();
        let node = target.create_node("div");
        let old_h = Handler::new(|_| {});
        let new_h = Handler::new(|_| {});
        let old = Props::new().with("title", "t").with("onClick", old_h);
        let new = Props::new().with("id", "x").with("onClick", new_h);
        let config = EngineConfig::new();
        update_node(&mut target, &node, &Props::new(), &old, &config);
        target.clear_mutations();

        update_node(&mut target, &node, &old, &new, &config);
        let kinds: alloc::vec::Vec<_> = target
            .mutations()
            .iter()
            .map(|m| match m {
                Mutation::RemoveAttribute { .. } => "remove_attribute",
                Mutation::SetAttribute { .. } => "set_attribute",
                Mutation::RemoveListener { .. } => "remove_listener",
                Mutation::AddListener { .. } => "add_listener",
                _ => "other",
            })
            .collect();
        assert_eq!(
            kinds,
            [
                "remove_attribute",
                "set_attribute",
                "remove_listener",
                "add_listener"
            ]
        );
        assert_eq!(target.listener_count(node, "click"), 1);
        assert_eq!(target.attribute(node, "title"), None);
    }
}
