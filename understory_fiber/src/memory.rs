// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! An in-memory [`RenderTarget`] that records every mutation.
//!
//! [`MemoryTarget`] keeps a plain node tree and a log of the calls the engine
//! made. It is what the tests and the demo render into, and a reference for
//! writing real adapters.
//!
//! ```rust
//! use understory_fiber::memory::{MemoryTarget, Mutation};
//! use understory_fiber::RenderTarget;
//!
//! let mut target = MemoryTarget::new();
//! let root = target.create_container();
//! let div = target.create_node("div");
//! target.set_attribute(&div, "id", &"a".into());
//! target.insert_child(&root, &div);
//!
//! assert_eq!(target.to_markup(root), r#"<#container><div id="a"></div></#container>"#);
//! assert_eq!(target.mutations().len(), 3);
//! assert!(matches!(target.mutations()[0], Mutation::CreateNode { .. }));
//! ```

use alloc::borrow::ToOwned;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::any::Any;
use core::fmt::Write as _;

use hashbrown::HashMap;

use crate::element::{Handler, PropValue, TEXT_VALUE_KEY};
use crate::host::RenderTarget;

/// Handle to a node in a [`MemoryTarget`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemoryNode(u32);

/// One recorded render-target call.
#[derive(Clone, Debug, PartialEq)]
pub enum Mutation {
    /// `create_node`.
    CreateNode {
        /// The new node.
        node: MemoryNode,
        /// Its tag.
        tag: String,
    },
    /// `create_text_node`.
    CreateTextNode {
        /// The new node.
        node: MemoryNode,
    },
    /// `set_attribute`.
    SetAttribute {
        /// Target node.
        node: MemoryNode,
        /// Attribute key.
        key: String,
        /// Assigned value.
        value: PropValue,
    },
    /// `remove_attribute`.
    RemoveAttribute {
        /// Target node.
        node: MemoryNode,
        /// Attribute key.
        key: String,
    },
    /// `add_listener`.
    AddListener {
        /// Target node.
        node: MemoryNode,
        /// Event name.
        event: String,
    },
    /// `remove_listener`.
    RemoveListener {
        /// Target node.
        node: MemoryNode,
        /// Event name.
        event: String,
    },
    /// `insert_child`.
    InsertChild {
        /// New parent.
        parent: MemoryNode,
        /// Inserted node.
        node: MemoryNode,
    },
    /// `remove_child`.
    RemoveChild {
        /// Former parent.
        parent: MemoryNode,
        /// Removed node.
        node: MemoryNode,
    },
}

#[derive(Debug, Default)]
struct NodeData {
    /// `None` for text nodes.
    tag: Option<String>,
    attributes: HashMap<String, PropValue>,
    listeners: HashMap<String, Vec<Handler>>,
    parent: Option<MemoryNode>,
    children: Vec<MemoryNode>,
}

/// A recording render target backed by plain vectors.
#[derive(Debug, Default)]
pub struct MemoryTarget {
    nodes: Vec<NodeData>,
    mutations: Vec<Mutation>,
}

const CONTAINER_TAG: &str = "#container";

impl MemoryTarget {
    /// Creates an empty target.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a detached container node to render into. Not recorded.
    ///
    /// # Panics
    ///
    /// Panics if the target already holds `u32::MAX` nodes.
    pub fn create_container(&mut self) -> MemoryNode {
        self.alloc(Some(CONTAINER_TAG.to_owned()))
    }

    fn alloc(&mut self, tag: Option<String>) -> MemoryNode {
        let id = u32::try_from(self.nodes.len()).expect("memory target exceeds u32::MAX nodes");
        self.nodes.push(NodeData {
            tag,
            ..NodeData::default()
        });
        MemoryNode(id)
    }

    fn node(&self, node: MemoryNode) -> Option<&NodeData> {
        self.nodes.get(node.0 as usize)
    }

    fn node_mut(&mut self, node: MemoryNode) -> Option<&mut NodeData> {
        self.nodes.get_mut(node.0 as usize)
    }

    /// Calls recorded since creation or the last clear.
    #[must_use]
    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    /// Takes the recorded calls, leaving the log empty.
    pub fn take_mutations(&mut self) -> Vec<Mutation> {
        core::mem::take(&mut self.mutations)
    }

    /// Clears the recorded calls.
    pub fn clear_mutations(&mut self) {
        self.mutations.clear();
    }

    /// Children of `node` in order.
    #[must_use]
    pub fn children(&self, node: MemoryNode) -> &[MemoryNode] {
        match self.node(node) {
            Some(data) => &data.children,
            None => &[],
        }
    }

    /// Parent of `node`, if attached.
    #[must_use]
    pub fn parent(&self, node: MemoryNode) -> Option<MemoryNode> {
        self.node(node)?.parent
    }

    /// Tag of an element node; `None` for text nodes.
    #[must_use]
    pub fn tag(&self, node: MemoryNode) -> Option<&str> {
        self.node(node)?.tag.as_deref()
    }

    /// Current value of an attribute.
    #[must_use]
    pub fn attribute(&self, node: MemoryNode, key: &str) -> Option<&PropValue> {
        self.node(node)?.attributes.get(key)
    }

    /// Content of a text node.
    #[must_use]
    pub fn text(&self, node: MemoryNode) -> Option<&str> {
        self.attribute(node, TEXT_VALUE_KEY)?.as_str()
    }

    /// Number of handlers bound to `event` on `node`.
    #[must_use]
    pub fn listener_count(&self, node: MemoryNode, event: &str) -> usize {
        self.node(node)
            .and_then(|n| n.listeners.get(event))
            .map_or(0, Vec::len)
    }

    /// Invokes every handler bound to `event` on `node`, in binding order.
    ///
    /// Returns the number of handlers called.
    pub fn dispatch(&self, node: MemoryNode, event: &str, payload: &dyn Any) -> usize {
        let handlers: Vec<Handler> = self
            .node(node)
            .and_then(|n| n.listeners.get(event))
            .cloned()
            .unwrap_or_default();
        for handler in &handlers {
            handler.call(payload);
        }
        handlers.len()
    }

    /// Serializes the subtree under `node` as markup.
    ///
    /// Attributes are sorted by key and listeners are omitted. Text content is
    /// written as is.
    #[must_use]
    pub fn to_markup(&self, node: MemoryNode) -> String {
        let mut out = String::new();
        self.write_markup(node, &mut out);
        out
    }

    fn write_markup(&self, node: MemoryNode, out: &mut String) {
        let Some(data) = self.node(node) else {
            return;
        };
        let Some(tag) = &data.tag else {
            if let Some(text) = data.attributes.get(TEXT_VALUE_KEY) {
                write_value(out, text);
            }
            return;
        };

        let _ = write!(out, "<{tag}");
        let mut attributes: Vec<_> = data.attributes.iter().collect();
        attributes.sort_by(|a, b| a.0.cmp(b.0));
        for (key, value) in attributes {
            let _ = write!(out, " {key}=\"");
            write_value(out, value);
            out.push('"');
        }
        out.push('>');
        for &child in &data.children {
            self.write_markup(child, out);
        }
        let _ = write!(out, "</{tag}>");
    }

    fn detach(&mut self, node: MemoryNode) {
        let Some(parent) = self.node_mut(node).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(parent) = self.node_mut(parent) {
            parent.children.retain(|&c| c != node);
        }
    }
}

fn write_value(out: &mut String, value: &PropValue) {
    match value {
        PropValue::Str(s) => out.push_str(s),
        PropValue::Int(i) => out.push_str(&i.to_string()),
        PropValue::Float(f) => out.push_str(&f.to_string()),
        PropValue::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        PropValue::Handler(_) => out.push_str("[handler]"),
    }
}

impl RenderTarget for MemoryTarget {
    type Node = MemoryNode;

    fn create_node(&mut self, tag: &str) -> MemoryNode {
        let node = self.alloc(Some(tag.to_owned()));
        self.mutations.push(Mutation::CreateNode {
            node,
            tag: tag.to_owned(),
        });
        node
    }

    fn create_text_node(&mut self) -> MemoryNode {
        let node = self.alloc(None);
        self.mutations.push(Mutation::CreateTextNode { node });
        node
    }

    fn set_attribute(&mut self, node: &MemoryNode, key: &str, value: &PropValue) {
        if let Some(data) = self.node_mut(*node) {
            data.attributes.insert(key.to_owned(), value.clone());
        }
        self.mutations.push(Mutation::SetAttribute {
            node: *node,
            key: key.to_owned(),
            value: value.clone(),
        });
    }

    fn remove_attribute(&mut self, node: &MemoryNode, key: &str) {
        if let Some(data) = self.node_mut(*node) {
            data.attributes.remove(key);
        }
        self.mutations.push(Mutation::RemoveAttribute {
            node: *node,
            key: key.to_owned(),
        });
    }

    fn add_listener(&mut self, node: &MemoryNode, event: &str, handler: &Handler) {
        if let Some(data) = self.node_mut(*node) {
            data.listeners
                .entry(event.to_owned())
                .or_default()
                .push(handler.clone());
        }
        self.mutations.push(Mutation::AddListener {
            node: *node,
            event: event.to_owned(),
        });
    }

    fn remove_listener(&mut self, node: &MemoryNode, event: &str, handler: &Handler) {
        if let Some(list) = self
            .node_mut(*node)
            .and_then(|data| data.listeners.get_mut(event))
            && let Some(pos) = list.iter().position(|h| h.ptr_eq(handler))
        {
            list.remove(pos);
        }
        self.mutations.push(Mutation::RemoveListener {
            node: *node,
            event: event.to_owned(),
        });
    }

    fn insert_child(&mut self, parent: &MemoryNode, node: &MemoryNode) {
        self.detach(*node);
        if let Some(data) = self.node_mut(*parent) {
            data.children.push(*node);
        }
        if let Some(data) = self.node_mut(*node) {
            data.parent = Some(*parent);
        }
        self.mutations.push(Mutation::InsertChild {
            parent: *parent,
            node: *node,
        });
    }

    fn remove_child(&mut self, parent: &MemoryNode, node: &MemoryNode) {
        if let Some(data) = self.node_mut(*parent) {
            data.children.retain(|c| c != node);
        }
        if let Some(data) = self.node_mut(*node)
            && data.parent == Some(*parent)
        {
            data.parent = None;
        }
        self.mutations.push(Mutation::RemoveChild {
            parent: *parent,
            node: *node,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use core::cell::Cell;

    #[test]
    fn every_node_gets_its_own_handle() {
        let mut t = MemoryTarget::new();
        let a = t.create_container();
        let b = t.create_node("b");
        let c = t.create_text_node();
        assert_eq!([a, b, c], [MemoryNode(0), MemoryNode(1), MemoryNode(2)]);
        assert_eq!(t.to_markup(b), "<b></b>");
    }

    #[test]
    fn reinsertion_moves_the_node() {
        let mut t = MemoryTarget::new();
        let a = t.create_container();
        let b = t.create_node("b");
        let c = t.create_node("c");
        t.insert_child(&a, &c);
        t.insert_child(&b, &c);
        assert!(t.children(a).is_empty());
        assert_eq!(t.children(b), [c]);
        assert_eq!(t.parent(c), Some(b));
    }

    #[test]
    fn listeners_dispatch_and_unbind() {
        let mut t = MemoryTarget::new();
        let n = t.create_node("button");
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let h = Handler::new(move |_| counter.set(counter.get() + 1));
        t.add_listener(&n, "click", &h);
        assert_eq!(t.dispatch(n, "click", &()), 1);
        assert_eq!(t.dispatch(n, "keydown", &()), 0);
        t.remove_listener(&n, "click", &Handler::new(|_| {}));
        assert_eq!(t.listener_count(n, "click"), 1);
        t.remove_listener(&n, "click", &h);
        assert_eq!(t.listener_count(n, "click"), 0);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn markup_sorts_attributes_and_writes_text() {
        let mut t = MemoryTarget::new();
        let root = t.create_container();
        let p = t.create_node("p");
        let text = t.create_text_node();
        t.set_attribute(&p, "z", &PropValue::Int(1));
        t.set_attribute(&p, "a", &PropValue::Bool(true));
        t.set_attribute(&text, TEXT_VALUE_KEY, &"hello".into());
        t.insert_child(&p, &text);
        t.insert_child(&root, &p);
        assert_eq!(t.to_markup(p), r#"<p a="true" z="1">hello</p>"#);
        assert_eq!(t.text(text), Some("hello"));
        assert_eq!(t.tag(text), None);
        assert_eq!(t.tag(root), Some("#container"));

        let log = t.take_mutations();
        assert_eq!(log.len(), 7);
        assert!(t.mutations().is_empty());
    }
}
