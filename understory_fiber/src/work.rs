// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Units of work: rendering one fiber and picking the next.

use alloc::vec::Vec;
use core::slice;

use crate::apply::update_node;
use crate::element::{Component, Props};
use crate::engine::Engine;
use crate::error::FiberError;
use crate::fiber::{FiberId, FiberKind};
use crate::hooks::{HookRef, RenderCx};
use crate::host::RenderTarget;
use crate::reconcile::reconcile_children;

impl<T: RenderTarget> Engine<T> {
    /// Processes `id` and returns the fiber to process next.
    ///
    /// Function components are invoked and their single output diffed; host
    /// and text fibers get a node if they lack one, then their children are
    /// diffed. The next unit is the first child, else the next sibling of
    /// the nearest ancestor that has one.
    pub(crate) fn perform_unit_of_work(
        &mut self,
        id: FiberId,
    ) -> Result<Option<FiberId>, FiberError> {
        let fiber = self.arena.get(id).ok_or(FiberError::Desync { fiber: id })?;
        log::trace!("unit {id:?} {:?}", fiber.kind);

        if let FiberKind::Function(component) = &fiber.kind {
            let component = component.clone();
            self.update_function_component(id, &component)?;
        } else {
            self.update_host_component(id)?;
        }
        self.next_after(id)
    }

    fn update_function_component(
        &mut self,
        id: FiberId,
        component: &Component,
    ) -> Result<(), FiberError> {
        let fiber = self.arena.get(id).ok_or(FiberError::Desync { fiber: id })?;
        let props = fiber.props.clone();
        let alternate = fiber.alternate;
        let old_hooks: Vec<HookRef> = match alternate {
            Some(alt) => self
                .arena
                .get(alt)
                .ok_or(FiberError::Desync { fiber: alt })?
                .hooks
                .clone(),
            None => Vec::new(),
        };

        let mut cx = RenderCx::new(id, &old_hooks, alternate.is_some(), &self.signal);
        let child = component.call(&mut cx, &props);
        let hooks = cx.finish()?;

        self.arena
            .get_mut(id)
            .ok_or(FiberError::Desync { fiber: id })?
            .hooks = hooks;
        reconcile_children(
            &mut self.arena,
            &mut self.deletions,
            id,
            slice::from_ref(&child),
        )
    }

    fn update_host_component(&mut self, id: FiberId) -> Result<(), FiberError> {
        let fiber = self.arena.get(id).ok_or(FiberError::Desync { fiber: id })?;
        let props = fiber.props.clone();

        if fiber.dom.is_none() {
            let node = match &fiber.kind {
                FiberKind::Host(tag) => Some(self.target.create_node(tag)),
                FiberKind::Text => Some(self.target.create_text_node()),
                FiberKind::Root | FiberKind::Function(_) => None,
            };
            if let Some(node) = node {
                update_node(&mut self.target, &node, &Props::new(), &props, &self.config);
                self.arena
                    .get_mut(id)
                    .ok_or(FiberError::Desync { fiber: id })?
                    .dom = Some(node);
            }
        }

        reconcile_children(&mut self.arena, &mut self.deletions, id, props.children())
    }

    fn next_after(&self, id: FiberId) -> Result<Option<FiberId>, FiberError> {
        let fiber = self.arena.get(id).ok_or(FiberError::Desync { fiber: id })?;
        if let Some(child) = fiber.child {
            return Ok(Some(child));
        }
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let fiber = self
                .arena
                .get(current)
                .ok_or(FiberError::Desync { fiber: current })?;
            if let Some(sibling) = fiber.sibling {
                return Ok(Some(sibling));
            }
            cursor = fiber.parent;
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use crate::element::{Element, PropValue};
    use crate::engine::Engine;
    use crate::memory::{MemoryTarget, Mutation};

    #[test]
    fn traversal_is_depth_first_child_then_sibling() {
        let mut target = MemoryTarget::new();
        let container = target.create_container();
        let mut engine = Engine::new(target);
        engine.render(
            Element::host("a")
                .with_child(Element::host("b").with_child(Element::host("c")))
                .with_child(Element::host("d")),
            container,
        );

        let mut created = alloc::vec::Vec::new();
        while let Some(unit) = engine.next_unit() {
            engine.target_mut().clear_mutations();
            let next = engine.perform_unit_of_work(unit).unwrap();
            for m in engine.target().mutations() {
                if let Mutation::CreateNode { tag, .. } = m {
                    created.push(tag.clone());
                }
            }
            engine.next_unit = next;
        }
        assert_eq!(created, ["a", "b", "c", "d"]);
    }

    #[test]
    fn new_nodes_get_their_initial_props_but_stay_detached() {
        let mut target = MemoryTarget::new();
        let container = target.create_container();
        let mut engine = Engine::new(target);
        engine.render(Element::host("div").with("id", "x"), container);

        let root = engine.next_unit().unwrap();
        let div = engine.perform_unit_of_work(root).unwrap().unwrap();
        engine.perform_unit_of_work(div).unwrap();

        let node = *engine.fiber(div).unwrap().dom().unwrap();
        assert_eq!(engine.target().attribute(node, "id"), Some(&PropValue::from("x")));
        assert_eq!(engine.target().parent(node), None);
        assert!(engine.target().children(container).is_empty());
    }
}
