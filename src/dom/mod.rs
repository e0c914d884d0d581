//! Native platform layer.
//!
//! The renderer never talks to a concrete document. It drives a [`Platform`]:
//! the handful of create / set-attribute / append / remove / replace primitives
//! every retained-mode target offers (a browser DOM, a native widget tree, a
//! headless document).
//!
//! - [`Platform`] - The primitive operations, keyed by an opaque handle
//! - [`MemoryDocument`] - In-memory document with focus, values and a mutation log
//!
//! # Handles
//!
//! Handles are cheap to clone and compare. A handle stays valid until its node is
//! removed from the document. [`MemoryDocument`] ignores operations on a stale
//! handle, even after its slot has been reused by a newer node.

mod html;
mod memory;

pub use memory::{MemoryDocument, Mutation, NodeId};

use std::fmt;

use crate::primitives::events::EventHandler;

/// Primitive operations on a persistent, stateful render target.
pub trait Platform {
    /// Opaque native node handle.
    type Handle: Clone + PartialEq + fmt::Debug;

    /// Find a mount point. Selectors are `#id` or a bare tag name.
    fn query_selector(&self, selector: &str) -> Option<Self::Handle>;

    /// Create a detached element.
    fn create_element(&mut self, tag: &str) -> Self::Handle;

    /// Create a detached text node.
    fn create_text(&mut self, content: &str) -> Self::Handle;

    fn set_attribute(&mut self, node: &Self::Handle, name: &str, value: &str);

    fn remove_attribute(&mut self, node: &Self::Handle, name: &str);

    /// Replace the node's text. On elements this discards all children.
    fn set_text_content(&mut self, node: &Self::Handle, text: &str);

    /// Live value of a form element.
    fn value(&self, node: &Self::Handle) -> String;

    fn set_value(&mut self, node: &Self::Handle, value: &str);

    /// True if the node currently has input focus.
    fn is_focused(&self, node: &Self::Handle) -> bool;

    /// Bind `handler` to `event`, superseding any previous handler for that event.
    fn set_event_handler(&mut self, node: &Self::Handle, event: &str, handler: EventHandler);

    /// Handler currently bound to `event`.
    fn event_handler(&self, node: &Self::Handle, event: &str) -> Option<EventHandler>;

    fn append_child(&mut self, parent: &Self::Handle, child: &Self::Handle);

    fn remove_child(&mut self, parent: &Self::Handle, child: &Self::Handle);

    /// Put `new_child` where `old_child` is and discard `old_child`.
    fn replace_child(
        &mut self,
        parent: &Self::Handle,
        new_child: &Self::Handle,
        old_child: &Self::Handle,
    );

    fn parent(&self, node: &Self::Handle) -> Option<Self::Handle>;

    fn child_at(&self, parent: &Self::Handle, index: usize) -> Option<Self::Handle>;

    fn child_count(&self, parent: &Self::Handle) -> usize;

    /// Remove every child of `node`.
    fn clear_children(&mut self, node: &Self::Handle) {
        while let Some(child) = self.child_at(node, 0) {
            self.remove_child(node, &child);
        }
    }
}
