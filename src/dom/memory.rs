//! MemoryDocument - In-memory native document.
//!
//! Manages native nodes the way the component registry manages indices:
//! - Arena of node slots indexed by [`NodeId`]
//! - Free index pool for O(1) reuse, with a generation per slot so a stale
//!   handle never aliases the node that reused its slot
//! - Recursive release of a removed subtree
//! - Focus, live form values and per-event handlers
//! - A mutation log so callers can assert exactly which native calls a patch made

use std::collections::{BTreeMap, HashMap};

use super::Platform;
use super::html;
use crate::primitives::events::EventHandler;
use crate::types::TEXT_TAG;

// =============================================================================
// Handles and Mutations
// =============================================================================

/// Handle to a node in a [`MemoryDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

impl NodeId {
    /// Slot index of this node. Shared with later nodes once it is released.
    pub fn index(self) -> usize {
        self.index
    }
}

/// A native call recorded by the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Create { node: NodeId, tag: String },
    SetAttribute { node: NodeId, name: String, value: String },
    RemoveAttribute { node: NodeId, name: String },
    SetText { node: NodeId, text: String },
    SetValue { node: NodeId, value: String },
    BindHandler { node: NodeId, event: String },
    Append { parent: NodeId, child: NodeId },
    Remove { parent: NodeId, child: NodeId },
    Replace { parent: NodeId, new_child: NodeId, old_child: NodeId },
}

impl Mutation {
    /// True for handler (re)binding, which patches perform on every pass.
    pub fn is_handler_bind(&self) -> bool {
        matches!(self, Self::BindHandler { .. })
    }
}

// =============================================================================
// Native Nodes
// =============================================================================

pub(super) struct NativeNode {
    pub(super) tag: String,
    pub(super) attributes: BTreeMap<String, String>,
    pub(super) text: String,
    pub(super) value: String,
    pub(super) handlers: HashMap<String, EventHandler>,
    pub(super) parent: Option<NodeId>,
    pub(super) children: Vec<NodeId>,
}

impl NativeNode {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attributes: BTreeMap::new(),
            text: String::new(),
            value: String::new(),
            handlers: HashMap::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    pub(super) fn is_text(&self) -> bool {
        self.tag == TEXT_TAG
    }
}

struct Slot {
    generation: u32,
    node: Option<NativeNode>,
}

// =============================================================================
// MemoryDocument
// =============================================================================

/// In-memory render target.
///
/// The document starts with a `body` element. Mount points are ordinary
/// elements with an `id` attribute, found with `#id` selectors.
///
/// Every native call is appended to a mutation log. Long-running hosts that
/// never read it should turn it off with [`set_recording`](Self::set_recording).
pub struct MemoryDocument {
    nodes: Vec<Slot>,
    free: Vec<usize>,
    body: NodeId,
    focused: Option<NodeId>,
    log: Vec<Mutation>,
    recording: bool,
}

impl MemoryDocument {
    /// Create an empty document holding only `body`.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            free: Vec::new(),
            body: NodeId { index: 0, generation: 0 },
            focused: None,
            log: Vec::new(),
            recording: true,
        };
        doc.body = doc.allocate(NativeNode::new("body"));
        doc
    }

    /// Create a document with a `<div id="{id}">` mount point under `body`.
    pub fn with_mount(id: &str) -> Self {
        let mut doc = Self::new();
        doc.create_mount(id);
        doc
    }

    /// Add a `<div id="{id}">` under `body` without logging it.
    pub fn create_mount(&mut self, id: &str) -> NodeId {
        let mut node = NativeNode::new("div");
        node.attributes.insert("id".to_string(), id.to_string());
        node.parent = Some(self.body);
        let mount = self.allocate(node);
        if let Some(body) = self.get_mut(self.body) {
            body.children.push(mount);
        }
        mount
    }

    /// The `body` element.
    pub fn body(&self) -> NodeId {
        self.body
    }

    // -------------------------------------------------------------------------
    // Allocation
    // -------------------------------------------------------------------------

    fn allocate(&mut self, node: NativeNode) -> NodeId {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.nodes[index];
                slot.node = Some(node);
                NodeId { index, generation: slot.generation }
            }
            None => {
                self.nodes.push(Slot { generation: 0, node: Some(node) });
                NodeId { index: self.nodes.len() - 1, generation: 0 }
            }
        }
    }

    /// Release a node and its whole subtree back to the pool.
    fn release(&mut self, id: NodeId) {
        let Some(slot) = self.nodes.get_mut(id.index).filter(|s| s.generation == id.generation) else {
            return;
        };
        let Some(node) = slot.node.take() else {
            return;
        };
        slot.generation = slot.generation.wrapping_add(1);
        for child in node.children {
            self.release(child);
        }
        if self.focused == Some(id) {
            self.focused = None;
        }
        self.free.push(id.index);
    }

    pub(super) fn get(&self, id: NodeId) -> Option<&NativeNode> {
        self.nodes
            .get(id.index)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_ref())
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut NativeNode> {
        self.nodes
            .get_mut(id.index)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_mut())
    }

    /// Detach `child` from its current parent, if any.
    fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.get(child).and_then(|n| n.parent) else {
            return;
        };
        if let Some(p) = self.get_mut(parent) {
            p.children.retain(|&c| c != child);
        }
        if let Some(c) = self.get_mut(child) {
            c.parent = None;
        }
    }

    // -------------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------------

    /// True while the node has not been removed.
    pub fn is_live(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Tag of a node (`#text` for text nodes).
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.get(id).map(|n| n.tag.as_str())
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.get(id)
            .and_then(|n| n.attributes.get(name))
            .map(String::as_str)
    }

    /// Child handles in order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.get(id).map(|n| n.children.clone()).unwrap_or_default()
    }

    /// Concatenated text of the subtree, like the DOM's `textContent`.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.get(id) else { return };
        out.push_str(&node.text);
        for &child in &node.children {
            self.collect_text(child, out);
        }
    }

    /// Number of live nodes, `body` included.
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|s| s.node.is_some()).count()
    }

    /// First element carrying `id="{id}"`, in document order.
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.find(self.body, &|n| n.attributes.get("id").is_some_and(|v| v == id))
    }

    fn find(&self, from: NodeId, pred: &dyn Fn(&NativeNode) -> bool) -> Option<NodeId> {
        let node = self.get(from)?;
        if pred(node) {
            return Some(from);
        }
        node.children.iter().find_map(|&child| self.find(child, pred))
    }

    /// Serialize the children of `id` as HTML.
    pub fn inner_html(&self, id: NodeId) -> String {
        html::inner_html(self, id)
    }

    /// Serialize `id` itself as HTML.
    pub fn outer_html(&self, id: NodeId) -> String {
        html::outer_html(self, id)
    }

    // -------------------------------------------------------------------------
    // User interaction
    // -------------------------------------------------------------------------

    /// Give input focus to a node.
    pub fn focus(&mut self, id: NodeId) {
        if self.is_live(id) {
            self.focused = Some(id);
        }
    }

    /// Drop input focus.
    pub fn blur(&mut self) {
        self.focused = None;
    }

    /// Currently focused node.
    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    /// Simulate the user editing a form element. Not recorded in the log.
    pub fn type_text(&mut self, id: NodeId, value: &str) {
        if let Some(node) = self.get_mut(id) {
            node.value = value.to_string();
        }
    }

    // -------------------------------------------------------------------------
    // Mutation log
    // -------------------------------------------------------------------------

    fn record(&mut self, mutation: Mutation) {
        if self.recording {
            self.log.push(mutation);
        }
    }

    /// Turn the mutation log on or off. On by default.
    pub fn set_recording(&mut self, enabled: bool) {
        self.recording = enabled;
        if !enabled {
            self.log.clear();
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Native calls recorded since the last clear.
    pub fn mutations(&self) -> &[Mutation] {
        &self.log
    }

    /// Take and clear the recorded calls.
    pub fn take_mutations(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.log)
    }

    pub fn clear_mutations(&mut self) {
        self.log.clear();
    }

    /// Recorded calls other than handler rebinding.
    pub fn structural_mutations(&self) -> Vec<&Mutation> {
        self.log.iter().filter(|m| !m.is_handler_bind()).collect()
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Platform impl
// =============================================================================

impl Platform for MemoryDocument {
    type Handle = NodeId;

    fn query_selector(&self, selector: &str) -> Option<NodeId> {
        match selector.strip_prefix('#') {
            Some(id) => self.get_element_by_id(id),
            None => self.find(self.body, &|n| n.tag == selector),
        }
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        let id = self.allocate(NativeNode::new(tag));
        self.record(Mutation::Create { node: id, tag: tag.to_string() });
        id
    }

    fn create_text(&mut self, content: &str) -> NodeId {
        let mut node = NativeNode::new(TEXT_TAG);
        node.text = content.to_string();
        let id = self.allocate(node);
        self.record(Mutation::Create { node: id, tag: TEXT_TAG.to_string() });
        id
    }

    fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) {
        let Some(n) = self.get_mut(*node) else { return };
        n.attributes.insert(name.to_string(), value.to_string());
        self.record(Mutation::SetAttribute {
            node: *node,
            name: name.to_string(),
            value: value.to_string(),
        });
    }

    fn remove_attribute(&mut self, node: &NodeId, name: &str) {
        let Some(n) = self.get_mut(*node) else { return };
        n.attributes.remove(name);
        self.record(Mutation::RemoveAttribute { node: *node, name: name.to_string() });
    }

    fn set_text_content(&mut self, node: &NodeId, text: &str) {
        let Some(n) = self.get_mut(*node) else { return };
        n.text = text.to_string();
        let children = std::mem::take(&mut n.children);
        for child in children {
            self.release(child);
        }
        self.record(Mutation::SetText { node: *node, text: text.to_string() });
    }

    fn value(&self, node: &NodeId) -> String {
        self.get(*node).map(|n| n.value.clone()).unwrap_or_default()
    }

    fn set_value(&mut self, node: &NodeId, value: &str) {
        let Some(n) = self.get_mut(*node) else { return };
        n.value = value.to_string();
        self.record(Mutation::SetValue { node: *node, value: value.to_string() });
    }

    fn is_focused(&self, node: &NodeId) -> bool {
        self.focused == Some(*node)
    }

    fn set_event_handler(&mut self, node: &NodeId, event: &str, handler: EventHandler) {
        let Some(n) = self.get_mut(*node) else { return };
        n.handlers.insert(event.to_string(), handler);
        self.record(Mutation::BindHandler { node: *node, event: event.to_string() });
    }

    fn event_handler(&self, node: &NodeId, event: &str) -> Option<EventHandler> {
        self.get(*node).and_then(|n| n.handlers.get(event).cloned())
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) {
        if !self.is_live(*parent) || !self.is_live(*child) {
            return;
        }
        self.detach(*child);
        if let Some(p) = self.get_mut(*parent) {
            p.children.push(*child);
        }
        if let Some(c) = self.get_mut(*child) {
            c.parent = Some(*parent);
        }
        self.record(Mutation::Append { parent: *parent, child: *child });
    }

    fn remove_child(&mut self, parent: &NodeId, child: &NodeId) {
        let is_child = self.get(*child).is_some_and(|c| c.parent == Some(*parent));
        if !is_child {
            return;
        }
        self.detach(*child);
        self.release(*child);
        self.record(Mutation::Remove { parent: *parent, child: *child });
    }

    fn replace_child(&mut self, parent: &NodeId, new_child: &NodeId, old_child: &NodeId) {
        let position = self
            .get(*parent)
            .and_then(|p| p.children.iter().position(|c| c == old_child));
        let Some(position) = position else { return };
        if !self.is_live(*new_child) {
            return;
        }
        self.detach(*new_child);
        if let Some(p) = self.get_mut(*parent) {
            p.children[position] = *new_child;
        }
        if let Some(n) = self.get_mut(*new_child) {
            n.parent = Some(*parent);
        }
        if let Some(o) = self.get_mut(*old_child) {
            o.parent = None;
        }
        self.release(*old_child);
        self.record(Mutation::Replace {
            parent: *parent,
            new_child: *new_child,
            old_child: *old_child,
        });
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.get(*node).and_then(|n| n.parent)
    }

    fn child_at(&self, parent: &NodeId, index: usize) -> Option<NodeId> {
        self.get(*parent).and_then(|n| n.children.get(index).copied())
    }

    fn child_count(&self, parent: &NodeId) -> usize {
        self.get(*parent).map_or(0, |n| n.children.len())
    }
}

// =============================================================================
// Tests
// =============================================================================
