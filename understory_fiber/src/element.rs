// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Element descriptions: the immutable input to a render pass.
//!
//! An [`Element`] pairs an [`ElementType`] with shared [`Props`]. Elements are
//! cheap to clone (props are reference counted), so the engine can carry them
//! into fibers without copying whole subtrees.

use alloc::borrow::Cow;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

use smallvec::SmallVec;

use crate::hooks::RenderCx;

/// Reserved prop key for the ordered child sequence.
///
/// Children are stored in [`Props::children`]; an attribute set under this key
/// is classified as structural and never reaches the render target.
pub const CHILDREN_KEY: &str = "children";

/// Attribute key holding the content of a [`ElementType::Text`] element.
pub const TEXT_VALUE_KEY: &str = "nodeValue";

/// Inline capacity for prop entries; most nodes carry only a handful.
const INLINE_PROPS: usize = 4;

/// A shared event callback.
///
/// Handlers compare by identity: two handlers are equal only if they are
/// clones of the same allocation. A re-render that builds a fresh closure
/// therefore counts as a changed handler and is re-bound.
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn(&dyn Any)>);

impl Handler {
    /// Wraps a callback receiving the render target's event payload.
    pub fn new(f: impl Fn(&dyn Any) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invokes the callback.
    pub fn call(&self, event: &dyn Any) {
        (self.0)(event);
    }

    /// Returns `true` if both handlers share one callback allocation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({:p})", Rc::as_ptr(&self.0))
    }
}

/// A single prop value.
#[derive(Clone, Debug, PartialEq)]
pub enum PropValue {
    /// Text value.
    Str(String),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// Boolean value.
    Bool(bool),
    /// Event callback; only meaningful under an event key (see [`crate::props`]).
    Handler(Handler),
}

impl PropValue {
    /// Returns the text value, if this is [`PropValue::Str`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the handler, if this is [`PropValue::Handler`].
    #[must_use]
    pub fn as_handler(&self) -> Option<&Handler> {
        match self {
            Self::Handler(h) => Some(h),
            _ => None,
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        Self::Str(value.into())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Handler> for PropValue {
    fn from(value: Handler) -> Self {
        Self::Handler(value)
    }
}

/// Ordered attribute map plus the child sequence of an element.
///
/// Entries keep insertion order; setting an existing key replaces its value in
/// place.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Props {
    entries: SmallVec<[(Cow<'static, str>, PropValue); INLINE_PROPS]>,
    children: Vec<Element>,
}

impl Props {
    /// Creates empty props.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Props::set`].
    #[must_use]
    pub fn with(mut self, key: impl Into<Cow<'static, str>>, value: impl Into<PropValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Sets `key` to `value`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<Cow<'static, str>>, value: impl Into<PropValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<PropValue> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&PropValue> {
        self.entries
            .iter()
            .find_map(|(k, v)| (k == key).then_some(v))
    }

    /// Returns `true` if `key` has a value.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterates over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_ref(), v))
    }

    /// Number of attribute entries (children excluded).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no attribute entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The ordered child sequence.
    #[must_use]
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// Appends a child.
    pub fn push_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Builder form of [`Props::push_child`].
    #[must_use]
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Appends every child from `children`.
    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }
}

/// Signature of a function component's render callable.
pub(crate) type RenderFn = dyn Fn(&mut RenderCx<'_>, &Props) -> Element;

/// A function component.
///
/// Component identity is the allocation made by [`Component::new`]: clones
/// of one `Component` are the same component, while two `new` calls are
/// different components even when they wrap the same code. Build each
/// component once and clone it into every element that renders it, or its
/// state is reset on every pass.
#[derive(Clone)]
pub struct Component {
    render: Rc<RenderFn>,
    name: &'static str,
}

impl Component {
    /// Wraps a render callable.
    pub fn new<F>(render: F) -> Self
    where
        F: Fn(&mut RenderCx<'_>, &Props) -> Element + 'static,
    {
        Self {
            render: Rc::new(render),
            name: core::any::type_name::<F>(),
        }
    }

    /// Type name of the render callable, for diagnostics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn call(&self, cx: &mut RenderCx<'_>, props: &Props) -> Element {
        (self.render)(cx, props)
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.render, &other.render)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Component").field(&self.name).finish()
    }
}

/// What an element renders to.
#[derive(Clone, Debug, PartialEq)]
pub enum ElementType {
    /// A render-target node with the given tag.
    Host(Cow<'static, str>),
    /// A text node; its content is the [`TEXT_VALUE_KEY`] attribute.
    Text,
    /// A function component producing one child element.
    Function(Component),
}

/// An immutable description of one tree position.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    element_type: ElementType,
    props: Rc<Props>,
}

impl Element {
    /// Creates an element of any type.
    #[must_use]
    pub fn new(element_type: ElementType, props: Props) -> Self {
        Self {
            element_type,
            props: Rc::new(props),
        }
    }

    /// Creates a host element with the given tag and no props.
    #[must_use]
    pub fn host(tag: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ElementType::Host(tag.into()), Props::new())
    }

    /// Creates a text element.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        let value: String = value.into();
        Self::new(ElementType::Text, Props::new().with(TEXT_VALUE_KEY, value))
    }

    /// Creates a function component element.
    #[must_use]
    pub fn function(component: Component, props: Props) -> Self {
        Self::new(ElementType::Function(component), props)
    }

    /// Builder: sets an attribute.
    #[must_use]
    pub fn with(mut self, key: impl Into<Cow<'static, str>>, value: impl Into<PropValue>) -> Self {
        Rc::make_mut(&mut self.props).set(key, value);
        self
    }

    /// Builder: appends a child.
    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        Rc::make_mut(&mut self.props).push_child(child);
        self
    }

    /// Builder: appends children.
    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = Self>) -> Self {
        let props = Rc::make_mut(&mut self.props);
        for child in children {
            props.push_child(child);
        }
        self
    }

    /// The element's type.
    #[must_use]
    pub fn element_type(&self) -> &ElementType {
        &self.element_type
    }

    /// The element's props.
    #[must_use]
    pub fn props(&self) -> &Props {
        &self.props
    }

    pub(crate) fn shared_props(&self) -> &Rc<Props> {
        &self.props
    }
}
