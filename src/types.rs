//! Core types for spark-vdom.
//!
//! These types define the foundation that everything builds on.
//! A [`Node`] tree is produced by application code on every render pass,
//! diffed by the renderer, and retained by the pipeline until the next pass.

use std::collections::BTreeMap;
use std::fmt;

use crate::primitives::events::{ActivationHandler, EventHandler};

// =============================================================================
// Tags
// =============================================================================

/// Sentinel tag for pure text nodes (no element wrapper).
pub const TEXT_TAG: &str = "#text";

/// Tag substituted when a render function produces nothing.
pub const PLACEHOLDER_TAG: &str = "template";

/// How the renderer reconciles an element's `content`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementClass {
    /// A native text node.
    Text,
    /// `input` and `textarea`: content maps to the live value, guarded by focus.
    EditableText,
    /// `select`: content maps to the selected value.
    Selection,
    /// Everything else: content maps to text content.
    Other,
}

impl ElementClass {
    /// Classify a tag.
    pub fn of(tag: &str) -> Self {
        match tag {
            TEXT_TAG => Self::Text,
            "input" | "textarea" => Self::EditableText,
            "select" => Self::Selection,
            _ => Self::Other,
        }
    }
}

/// Check whether an attribute name denotes an event binding (`onClick`, `oninput`).
pub fn is_event_attribute(name: &str) -> bool {
    name.len() > 2 && name.starts_with("on")
}

/// Native event name for an event attribute: `onClick` -> `click`.
pub fn event_name(attribute: &str) -> String {
    attribute[2..].to_ascii_lowercase()
}

// =============================================================================
// Instance Keys
// =============================================================================

/// Stable identity of a component instance in the component graph.
///
/// Composite keys are `parent + ":" + local`, so structurally identical
/// subtrees under different parents never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceKey(String);

impl InstanceKey {
    /// Key of the active root instance.
    pub const ROOT: &'static str = "__root__";

    /// The root instance key.
    pub fn root() -> Self {
        Self(Self::ROOT.to_string())
    }

    /// Wrap a raw key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Derive the composite key for a child rendered under this instance.
    pub fn child(&self, local: &str) -> Self {
        Self(format!("{}:{}", self.0, local))
    }

    /// True if `self` was derived (at any depth) from `ancestor`.
    pub fn is_descendant_of(&self, ancestor: &InstanceKey) -> bool {
        self.0.len() > ancestor.0.len()
            && self.0.starts_with(&ancestor.0)
            && self.0.as_bytes()[ancestor.0.len()] == b':'
    }

    /// Borrow the raw key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Attribute Values
// =============================================================================

/// Value of a node attribute.
///
/// Handlers never compare equal, not even to themselves: function values
/// cannot be checked for change, so the renderer rebinds them every pass.
#[derive(Clone)]
pub enum AttrValue {
    /// Plain string attribute.
    Text(String),
    /// Boolean attribute: `true` renders as present with an empty value, `false` as absent.
    Bool(bool),
    /// Event binding.
    Handler(EventHandler),
}

impl AttrValue {
    /// String form written to the native node, `None` when the attribute should be absent.
    pub fn as_native(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            Self::Bool(true) => Some(""),
            Self::Bool(false) | Self::Handler(_) => None,
        }
    }

    /// True for event bindings.
    pub fn is_handler(&self) -> bool {
        matches!(self, Self::Handler(_))
    }
}

impl PartialEq for AttrValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(value) => write!(f, "{value:?}"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Handler(_) => f.write_str("<handler>"),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<EventHandler> for AttrValue {
    fn from(value: EventHandler) -> Self {
        Self::Handler(value)
    }
}

// =============================================================================
// Node - The declarative tree
// =============================================================================

/// A node in the declarative tree.
///
/// Constructed fresh every render pass. Text nodes (tag [`TEXT_TAG`]) carry
/// their text in `content` and have no attributes or children. Elements render
/// `content` as text only when they have no children.
#[derive(Clone, Default)]
pub struct Node {
    /// Element tag or [`TEXT_TAG`].
    pub tag: String,
    /// Attributes, including event bindings (`on*`).
    pub attributes: BTreeMap<String, AttrValue>,
    /// Ordered children.
    pub children: Vec<Node>,
    /// Text content, or the value of form elements.
    pub content: String,
    /// Legacy zero-argument click callback.
    pub on_activate: Option<ActivationHandler>,
    /// Reconciliation key. Reserved; the positional diff ignores it.
    pub key: Option<String>,
    /// Render scope identity, stamped on the root tree by the pipeline.
    pub scope: Option<String>,
    /// Instances whose render produced this node (innermost first).
    pub(crate) owners: Vec<InstanceKey>,
}

impl Node {
    /// Create a node from its parts.
    pub fn new(
        tag: impl Into<String>,
        attributes: BTreeMap<String, AttrValue>,
        children: Vec<Node>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            tag: tag.into(),
            attributes,
            children,
            content: content.into(),
            ..Self::default()
        }
    }

    /// Create an empty element.
    pub fn element(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Create a pure text node.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            tag: TEXT_TAG.to_string(),
            content: content.into(),
            ..Self::default()
        }
    }

    /// The element substituted for an empty render.
    pub fn placeholder() -> Self {
        Self::element(PLACEHOLDER_TAG)
    }

    /// Set an attribute.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Bind an event handler. `event` is the native event name (`click`, `input`).
    pub fn on(mut self, event: &str, handler: EventHandler) -> Self {
        self.attributes
            .insert(format!("on{event}"), AttrValue::Handler(handler));
        self
    }

    /// Set the legacy activation callback.
    pub fn on_activate(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_activate = Some(std::sync::Arc::new(callback));
        self
    }

    /// Append a child.
    pub fn child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Append several children.
    pub fn children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    /// Set the text content.
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Set the reconciliation key.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// True for pure text nodes.
    pub fn is_text(&self) -> bool {
        self.tag == TEXT_TAG
    }

    /// How this node's content is reconciled.
    pub fn class(&self) -> ElementClass {
        ElementClass::of(&self.tag)
    }

    /// Instance keys that own this node.
    pub fn owners(&self) -> &[InstanceKey] {
        &self.owners
    }

    /// Follow a path of child indices.
    pub fn at_path(&self, path: &[usize]) -> Option<&Node> {
        path.iter().try_fold(self, |node, &i| node.children.get(i))
    }

    /// Follow a path of child indices, mutably.
    pub fn at_path_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        path.iter()
            .try_fold(self, |node, &i| node.children.get_mut(i))
    }

    /// Count nodes in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(Node::subtree_len).sum::<usize>()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_text() {
            return write!(f, "Text({:?})", self.content);
        }
        let mut s = f.debug_struct("Node");
        s.field("tag", &self.tag);
        if !self.attributes.is_empty() {
            s.field("attributes", &self.attributes);
        }
        if !self.content.is_empty() {
            s.field("content", &self.content);
        }
        if !self.children.is_empty() {
            s.field("children", &self.children);
        }
        if let Some(scope) = &self.scope {
            s.field("scope", scope);
        }
        s.finish()
    }
}

// =============================================================================
// Patch Flags (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Kinds of native mutation performed by a patch.
    ///
    /// Combine with bitwise OR: `PatchFlags::ATTRIBUTES | PatchFlags::CONTENT`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PatchFlags: u8 {
        const NONE = 0;
        /// An attribute was written or removed.
        const ATTRIBUTES = 1 << 0;
        /// Event handlers were rebound.
        const HANDLERS = 1 << 1;
        /// Text content was written.
        const CONTENT = 1 << 2;
        /// A form value was written.
        const VALUE = 1 << 3;
        /// Children were materialized and appended.
        const APPENDED = 1 << 4;
        /// Children were removed.
        const REMOVED = 1 << 5;
        /// A node was discarded and replaced by a fresh subtree.
        const REPLACED = 1 << 6;
    }
}

impl PatchFlags {
    /// True if nothing except handler rebinding happened.
    pub fn is_quiet(self) -> bool {
        self.difference(Self::HANDLERS).is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
