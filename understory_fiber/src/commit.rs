// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The commit phase: flushing a finished pass to the render target.

use alloc::vec::Vec;

use crate::apply::update_node;
use crate::config::EngineConfig;
use crate::error::FiberError;
use crate::fiber::{EffectTag, FiberArena, FiberId};
use crate::host::RenderTarget;

/// What one commit did to the render target.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CommitSummary {
    /// Nodes inserted for PLACEMENT fibers.
    pub inserted: usize,
    /// UPDATE fibers whose node went through the mutation applier.
    pub updated: usize,
    /// Fibers on the deletions list.
    pub deleted: usize,
    /// Nodes detached while processing deletions.
    pub removed_nodes: usize,
    /// Units of work performed for the pass.
    pub units: usize,
}

/// Applies every deletion, then walks the tree under `root` depth-first,
/// child before sibling, applying each fiber's effect.
pub(crate) fn commit_root<T: RenderTarget>(
    arena: &FiberArena<T::Node>,
    target: &mut T,
    deletions: &[FiberId],
    root: FiberId,
    config: &EngineConfig,
) -> Result<CommitSummary, FiberError> {
    let mut summary = CommitSummary::default();

    for &fiber in deletions {
        let parent_dom = host_parent(arena, fiber)?;
        summary.removed_nodes += commit_deletion(arena, target, fiber, parent_dom)?;
        summary.deleted += 1;
    }

    let mut stack: Vec<FiberId> = Vec::new();
    stack.extend(arena.get(root).ok_or(FiberError::Desync { fiber: root })?.child);

    while let Some(id) = stack.pop() {
        let fiber = arena.get(id).ok_or(FiberError::Desync { fiber: id })?;
        let descend = commit_work(arena, target, id, config, &mut summary)?;
        stack.extend(fiber.sibling);
        if descend {
            stack.extend(fiber.child);
        }
    }

    Ok(summary)
}

/// Applies the effect of one fiber. Returns `false` if its subtree must be
/// skipped.
fn commit_work<T: RenderTarget>(
    arena: &FiberArena<T::Node>,
    target: &mut T,
    id: FiberId,
    config: &EngineConfig,
    summary: &mut CommitSummary,
) -> Result<bool, FiberError> {
    let fiber = arena.get(id).ok_or(FiberError::Desync { fiber: id })?;
    let parent_dom = host_parent(arena, id)?;
    log::trace!("commit {id:?} {:?}", fiber.effect_tag);

    match fiber.effect_tag {
        EffectTag::Placement => {
            if let Some(dom) = &fiber.dom {
                target.insert_child(parent_dom, dom);
                summary.inserted += 1;
            }
        }
        EffectTag::Delete => {
            summary.removed_nodes += commit_deletion(arena, target, id, parent_dom)?;
            return Ok(false);
        }
        EffectTag::Update => {
            if let Some(dom) = &fiber.dom {
                let alternate = fiber
                    .alternate
                    .and_then(|alt| arena.get(alt))
                    .ok_or(FiberError::Desync { fiber: id })?;
                update_node(target, dom, &alternate.props, &fiber.props, config);
                summary.updated += 1;
            }
        }
        EffectTag::None => {}
    }
    Ok(true)
}

/// Finds the node of the nearest ancestor that owns one.
fn host_parent<N>(arena: &FiberArena<N>, fiber: FiberId) -> Result<&N, FiberError> {
    let mut cursor = arena
        .get(fiber)
        .ok_or(FiberError::Desync { fiber })?
        .parent;
    while let Some(id) = cursor {
        let ancestor = arena.get(id).ok_or(FiberError::Desync { fiber: id })?;
        if let Some(dom) = &ancestor.dom {
            return Ok(dom);
        }
        cursor = ancestor.parent;
    }
    Err(FiberError::MissingHostAncestor { fiber })
}

/// Detaches the node a deleted fiber stands for.
///
/// Function components own no node, so the first node down their child chain
/// is removed instead. Returns the number of nodes removed.
fn commit_deletion<T: RenderTarget>(
    arena: &FiberArena<T::Node>,
    target: &mut T,
    fiber: FiberId,
    parent_dom: &T::Node,
) -> Result<usize, FiberError> {
    let mut cursor = Some(fiber);
    while let Some(id) = cursor {
        let current = arena.get(id).ok_or(FiberError::Desync { fiber: id })?;
        if let Some(dom) = &current.dom {
            log::trace!("remove node of {id:?}");
            target.remove_child(parent_dom, dom);
            return Ok(1);
        }
        cursor = current.child;
    }
    Ok(0)
}
