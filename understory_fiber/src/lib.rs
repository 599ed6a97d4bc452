// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_fiber --heading-base-level=0

//! Understory Fiber: an interruptible reconciler for retained render targets.
//!
//! This crate turns a declarative tree of [`Element`]s into the smallest set of
//! mutations needed to bring a retained output tree (a DOM, a scene graph, a
//! widget tree) up to date. Work is split into small units, one fiber at a
//! time, so a host can interleave reconciliation with input handling and
//! resume it on the next idle slice.
//!
//! The engine is built from a few focused pieces:
//!
//! - **Elements** ([`Element`], [`ElementType`], [`Props`]): immutable
//!   descriptions of the desired tree, built by the caller before each render.
//! - **Render targets** ([`RenderTarget`]): the adapter the engine calls to
//!   create nodes, set attributes, bind listeners, and attach children.
//! - **Fibers** ([`Fiber`], [`FiberId`], [`EffectTag`]): retained work records,
//!   one per tree position, stored in a generational arena owned by the engine.
//! - **Scheduling** ([`Engine::work_loop`], [`Deadline`]): processes one fiber
//!   per step and yields when the host's time budget runs out.
//! - **Commit** ([`CommitSummary`]): applies the tagged fibers to the render
//!   target in depth-first order once a pass completes.
//! - **Hooks** ([`RenderCx::use_state`], [`SetState`]): per-component state
//!   that survives across passes and schedules new passes when updated.
//!
//! ## Quick Start
//!
//! ```rust
//! use understory_fiber::memory::MemoryTarget;
//! use understory_fiber::{Element, Engine};
//!
//! let mut target = MemoryTarget::new();
//! let container = target.create_container();
//! let mut engine = Engine::new(target);
//!
//! engine.render(
//!     Element::host("div").with("id", "greeting").with_child(Element::text("hi")),
//!     container,
//! );
//! engine.flush().unwrap();
//!
//! assert_eq!(
//!     engine.target().to_markup(container),
//!     r#"<#container><div id="greeting">hi</div></#container>"#
//! );
//! ```
//!
//! ## Function components and state
//!
//! ```rust
//! use understory_fiber::memory::MemoryTarget;
//! use understory_fiber::{Component, Element, Engine, Handler, Props};
//!
//! let counter = Component::new(|cx, _props: &Props| {
//!     let (count, set_count) = cx.use_state(0_i64);
//!     Element::host("button")
//!         .with("onClick", Handler::new(move |_| set_count.update(|c| c + 1)))
//!         .with_child(Element::text(count.to_string()))
//! });
//!
//! let mut target = MemoryTarget::new();
//! let container = target.create_container();
//! let mut engine = Engine::new(target);
//! engine.render(Element::function(counter, Props::new()), container);
//! engine.flush().unwrap();
//!
//! let button = engine.target().children(container)[0];
//! engine.target().dispatch(button, "click", &());
//! engine.flush().unwrap();
//! assert_eq!(engine.target().to_markup(button), "<button>1</button>");
//! ```
//!
//! ## Cooperative scheduling
//!
//! [`Engine::work_loop`] performs units of work until the [`Deadline`] reports
//! less than [`EngineConfig::yield_threshold`] remaining, then returns
//! [`WorkStatus::Yielded`]. The next call resumes from the same fiber. A pass
//! is only committed once every fiber has been processed, so the render target
//! never observes a half-reconciled tree.
//!
//! ## Features
//!
//! - `std` (default): adds [`SliceDeadline`], a wall-clock deadline.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

mod apply;
mod commit;
mod config;
mod element;
mod engine;
mod error;
mod fiber;
mod hooks;
mod host;
pub mod memory;
pub mod props;
mod reconcile;
mod work;

pub use apply::update_node;
pub use commit::CommitSummary;
pub use config::EngineConfig;
pub use element::{
    CHILDREN_KEY, Component, Element, ElementType, Handler, PropValue, Props, TEXT_VALUE_KEY,
};
pub use engine::{Engine, WorkStatus};
pub use error::FiberError;
pub use fiber::{EffectTag, Fiber, FiberId, FiberKind};
pub use hooks::{RenderCx, SetState};
#[cfg(feature = "std")]
pub use host::SliceDeadline;
pub use host::{Deadline, RenderTarget, Unbounded};
