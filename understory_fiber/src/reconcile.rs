// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Position-keyed child diffing.

use alloc::vec::Vec;

use crate::element::Element;
use crate::error::FiberError;
use crate::fiber::{EffectTag, Fiber, FiberArena, FiberId, FiberKind};

/// Diffs `elements` against the children of `parent`'s alternate.
///
/// Both sequences are walked in lockstep by position; position is the only
/// correspondence. At each index:
///
/// - same type: a new UPDATE fiber carries the new props and the old node,
///   with the old fiber as its alternate;
/// - a new element without a type match: a new PLACEMENT fiber;
/// - an old fiber without a type match: the old fiber is tagged DELETE and
///   pushed onto `deletions`.
///
/// The produced fibers become `parent`'s child chain in element order. A
/// reordered list therefore degrades to per-position delete plus insert.
pub(crate) fn reconcile_children<N: Clone>(
    arena: &mut FiberArena<N>,
    deletions: &mut Vec<FiberId>,
    parent: FiberId,
    elements: &[Element],
) -> Result<(), FiberError> {
    let alternate = arena
        .get(parent)
        .ok_or(FiberError::Desync { fiber: parent })?
        .alternate;
    let mut old_fiber = match alternate {
        Some(alt) => arena.get(alt).ok_or(FiberError::Desync { fiber: alt })?.child,
        None => None,
    };

    let mut prev: Option<FiberId> = None;
    let mut first: Option<FiberId> = None;
    let mut index = 0;

    while index < elements.len() || old_fiber.is_some() {
        let element = elements.get(index);
        let old = match old_fiber {
            Some(id) => Some((id, arena.get(id).ok_or(FiberError::Desync { fiber: id })?)),
            None => None,
        };
        let same_type = match (old, element) {
            (Some((_, old)), Some(element)) => old.kind.matches(element.element_type()),
            _ => false,
        };
        let next_old = old.and_then(|(_, old)| old.sibling);

        let mut new_fiber = None;
        if let Some(element) = element {
            let mut fiber = Fiber::new(
                FiberKind::from(element.element_type()),
                element.shared_props().clone(),
            );
            fiber.parent = Some(parent);
            match old {
                Some((old_id, old)) if same_type => {
                    fiber.dom = old.dom.clone();
                    fiber.alternate = Some(old_id);
                    fiber.effect_tag = EffectTag::Update;
                }
                _ => fiber.effect_tag = EffectTag::Placement,
            }
            new_fiber = Some(arena.insert(fiber));
        }

        if let Some(old_id) = old_fiber
            && !same_type
        {
            if let Some(old) = arena.get_mut(old_id) {
                old.effect_tag = EffectTag::Delete;
            }
            deletions.push(old_id);
        }

        if let Some(new_id) = new_fiber {
            match prev {
                Some(prev_id) => {
                    if let Some(prev_fiber) = arena.get_mut(prev_id) {
                        prev_fiber.sibling = Some(new_id);
                    }
                }
                None => first = Some(new_id),
            }
            prev = Some(new_id);
        }

        old_fiber = next_old;
        index += 1;
    }

    let parent_fiber = arena
        .get_mut(parent)
        .ok_or(FiberError::Desync { fiber: parent })?;
    parent_fiber.child = first;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Props;
    use alloc::rc::Rc;

    fn root(arena: &mut FiberArena<u32>, alternate: Option<FiberId>) -> FiberId {
        let mut fiber = Fiber::new(FiberKind::Root, Rc::new(Props::new()));
        fiber.dom = Some(0);
        fiber.alternate = alternate;
        arena.insert(fiber)
    }

    fn chain(arena: &FiberArena<u32>, parent: FiberId) -> Vec<(FiberId, EffectTag)> {
        let mut out = Vec::new();
        let mut cursor = arena.get(parent).unwrap().child;
        while let Some(id) = cursor {
            let fiber = arena.get(id).unwrap();
            out.push((id, fiber.effect_tag));
            cursor = fiber.sibling;
        }
        out
    }

    fn tags(arena: &FiberArena<u32>, parent: FiberId) -> Vec<EffectTag> {
        chain(arena, parent).into_iter().map(|(_, t)| t).collect()
    }

    fn hosts(tags: &[&'static str]) -> Vec<Element> {
        tags.iter().map(|t| Element::host(*t)).collect()
    }

    #[test]
    fn fresh_children_are_placements() {
        let mut arena = FiberArena::new();
        let mut deletions = Vec::new();
        let r = root(&mut arena, None);
        reconcile_children(&mut arena, &mut deletions, r, &hosts(&["a", "b", "c"])).unwrap();
        assert_eq!(tags(&arena, r), [EffectTag::Placement; 3]);
        assert!(deletions.is_empty());
        for (id, _) in chain(&arena, r) {
            assert_eq!(arena.get(id).unwrap().parent, Some(r));
        }
    }

    #[test]
    fn same_types_become_updates_with_alternates() {
        let mut arena = FiberArena::new();
        let mut deletions = Vec::new();
        let old_root = root(&mut arena, None);
        reconcile_children(&mut arena, &mut deletions, old_root, &hosts(&["a", "b"])).unwrap();
        let old = chain(&arena, old_root);
        arena.get_mut(old[0].0).unwrap().dom = Some(7);

        let new_root = root(&mut arena, Some(old_root));
        reconcile_children(&mut arena, &mut deletions, new_root, &hosts(&["a", "b"])).unwrap();
        let new = chain(&arena, new_root);
        assert_eq!(tags(&arena, new_root), [EffectTag::Update; 2]);
        assert_eq!(arena.get(new[0].0).unwrap().alternate, Some(old[0].0));
        assert_eq!(arena.get(new[0].0).unwrap().dom, Some(7));
        assert!(deletions.is_empty());
    }

    #[test]
    fn shrinking_deletes_trailing_old_fibers() {
        let mut arena = FiberArena::new();
        let mut deletions = Vec::new();
        let old_root = root(&mut arena, None);
        reconcile_children(&mut arena, &mut deletions, old_root, &hosts(&["a", "b", "c", "d"]))
            .unwrap();
        let old = chain(&arena, old_root);

        let new_root = root(&mut arena, Some(old_root));
        reconcile_children(&mut arena, &mut deletions, new_root, &hosts(&["a", "b"])).unwrap();
        assert_eq!(tags(&arena, new_root), [EffectTag::Update; 2]);
        assert_eq!(deletions, [old[2].0, old[3].0]);
        assert_eq!(arena.get(old[3].0).unwrap().effect_tag, EffectTag::Delete);
    }

    #[test]
    fn type_change_is_delete_plus_placement() {
        let mut arena = FiberArena::new();
        let mut deletions = Vec::new();
        let old_root = root(&mut arena, None);
        reconcile_children(&mut arena, &mut deletions, old_root, &hosts(&["a", "b"])).unwrap();
        let old = chain(&arena, old_root);

        let new_root = root(&mut arena, Some(old_root));
        reconcile_children(&mut arena, &mut deletions, new_root, &hosts(&["a", "x", "c"]))
            .unwrap();
        assert_eq!(
            tags(&arena, new_root),
            [EffectTag::Update, EffectTag::Placement, EffectTag::Placement]
        );
        assert_eq!(deletions, [old[1].0]);
    }

    #[test]
    fn reorder_degrades_to_replace() {
        let mut arena = FiberArena::new();
        let mut deletions = Vec::new();
        let old_root = root(&mut arena, None);
        reconcile_children(&mut arena, &mut deletions, old_root, &hosts(&["a", "b"])).unwrap();

        let new_root = root(&mut arena, Some(old_root));
        reconcile_children(&mut arena, &mut deletions, new_root, &hosts(&["b", "a"])).unwrap();
        assert_eq!(tags(&arena, new_root), [EffectTag::Placement; 2]);
        assert_eq!(deletions.len(), 2);
    }

    #[test]
    fn empty_children_clear_the_chain() {
        let mut arena = FiberArena::new();
        let mut deletions = Vec::new();
        let old_root = root(&mut arena, None);
        reconcile_children(&mut arena, &mut deletions, old_root, &hosts(&["a"])).unwrap();

        let new_root = root(&mut arena, Some(old_root));
        reconcile_children(&mut arena, &mut deletions, new_root, &[]).unwrap();
        assert!(arena.get(new_root).unwrap().child.is_none());
        assert_eq!(deletions.len(), 1);
    }

    #[test]
    fn dangling_old_chain_is_desync() {
        let mut arena = FiberArena::new();
        let mut deletions = Vec::new();
        let old_root = root(&mut arena, None);
        reconcile_children(&mut arena, &mut deletions, old_root, &hosts(&["a"])).unwrap();
        let stale = chain(&arena, old_root)[0].0;
        arena.remove(stale);

        let new_root = root(&mut arena, Some(old_root));
        assert_eq!(
            reconcile_children(&mut arena, &mut deletions, new_root, &hosts(&["a"])),
            Err(FiberError::Desync { fiber: stale })
        );
    }
}
