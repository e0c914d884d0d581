//! Differential patching of a live native subtree.
//!
//! The diff compares the previous tree to the new tree and only issues native
//! calls for what changed. Identity of native nodes is preserved wherever the
//! tag stays the same, which keeps focus, caret and typed input intact.
//!
//! # Algorithm
//!
//! 1. Tags differ: materialize the new node, swap it in through the parent, stop
//! 2. Attributes: clear removed keys (event bindings excepted), write changed
//!    values, rebind every handler
//! 3. Content by element class (editable text guarded by focus)
//! 4. Children by position: reconcile the common prefix, append surplus new
//!    children, remove surplus native children from the tail backwards

use super::materialize::{activation_handler, bind_handler, materialize, materialize_into};
use crate::dom::Platform;
use crate::types::{is_event_attribute, AttrValue, ElementClass, Node, PatchFlags};

/// Result of patching one node.
#[derive(Debug, Clone, PartialEq)]
pub struct Patched<H> {
    /// Kinds of native mutation performed in the subtree.
    pub flags: PatchFlags,
    /// Fresh native node when the old one was discarded.
    pub replacement: Option<H>,
}

impl<H> Patched<H> {
    fn with_flags(flags: PatchFlags) -> Self {
        Self { flags, replacement: None }
    }

    /// The native node that now represents the patched tree node.
    pub fn handle<'a>(&'a self, original: &'a H) -> &'a H {
        self.replacement.as_ref().unwrap_or(original)
    }
}

/// Mutate `native` (which currently reflects `old`) so that it reflects `new`.
pub fn diff_and_apply<P: Platform>(
    platform: &mut P,
    native: &P::Handle,
    old: &Node,
    new: &Node,
) -> Patched<P::Handle> {
    if old.tag != new.tag {
        return replace(platform, native, old, new);
    }

    let mut flags = PatchFlags::empty();
    if !new.is_text() {
        flags |= patch_attributes(platform, native, old, new);
    }
    flags |= patch_content(platform, native, old, new);
    if !new.is_text() {
        flags |= patch_children(platform, native, old, new);
    }
    Patched::with_flags(flags)
}

/// Mount-level patch. Any missing argument makes this a no-op.
///
/// An empty mount point is materialized into instead of patched.
pub fn patch_mount<P: Platform>(
    platform: &mut P,
    mount: Option<&P::Handle>,
    old: Option<&Node>,
    new: Option<&Node>,
) -> PatchFlags {
    let (Some(mount), Some(old), Some(new)) = (mount, old, new) else {
        return PatchFlags::empty();
    };
    match platform.child_at(mount, 0) {
        Some(native) => diff_and_apply(platform, &native, old, new).flags,
        None => {
            materialize_into(platform, mount, new);
            PatchFlags::APPENDED
        }
    }
}

// =============================================================================
// Steps
// =============================================================================

fn replace<P: Platform>(
    platform: &mut P,
    native: &P::Handle,
    old: &Node,
    new: &Node,
) -> Patched<P::Handle> {
    tracing::debug!(from = %old.tag, to = %new.tag, "tag changed, replacing subtree");
    let fresh = materialize(platform, new);
    match platform.parent(native) {
        Some(parent) => platform.replace_child(&parent, &fresh, native),
        None => tracing::debug!(to = %new.tag, "replaced node is detached"),
    }
    Patched {
        flags: PatchFlags::REPLACED,
        replacement: Some(fresh),
    }
}

fn patch_attributes<P: Platform>(
    platform: &mut P,
    native: &P::Handle,
    old: &Node,
    new: &Node,
) -> PatchFlags {
    let mut flags = PatchFlags::empty();

    // Stale event bindings are left to be superseded by the next bind
    for (name, value) in &old.attributes {
        if new.attributes.contains_key(name) || is_event_attribute(name) || value.is_handler() {
            continue;
        }
        if value.as_native().is_some() {
            platform.remove_attribute(native, name);
            flags |= PatchFlags::ATTRIBUTES;
        }
    }

    if let Some(callback) = &new.on_activate {
        platform.set_event_handler(native, "click", activation_handler(callback));
        flags |= PatchFlags::HANDLERS;
    }

    for (name, value) in &new.attributes {
        if let AttrValue::Handler(handler) = value {
            bind_handler(platform, native, name, handler);
            flags |= PatchFlags::HANDLERS;
            continue;
        }
        let previous = old.attributes.get(name);
        if previous == Some(value) {
            continue;
        }
        match value.as_native() {
            Some(text) => platform.set_attribute(native, name, text),
            None if previous.and_then(AttrValue::as_native).is_some() => {
                platform.remove_attribute(native, name)
            }
            None => continue,
        }
        flags |= PatchFlags::ATTRIBUTES;
    }

    flags
}

fn patch_content<P: Platform>(
    platform: &mut P,
    native: &P::Handle,
    old: &Node,
    new: &Node,
) -> PatchFlags {
    match new.class() {
        ElementClass::EditableText => {
            if platform.is_focused(native) {
                tracing::trace!(tag = %new.tag, "focused, value left alone");
                return PatchFlags::empty();
            }
            if platform.value(native) != new.content {
                platform.set_value(native, &new.content);
                return PatchFlags::VALUE;
            }
            PatchFlags::empty()
        }
        ElementClass::Selection => {
            if new.content.is_empty() {
                return PatchFlags::empty();
            }
            platform.set_value(native, &new.content);
            PatchFlags::VALUE
        }
        ElementClass::Text | ElementClass::Other => {
            if !new.children.is_empty() {
                // Text left over from a childless render would shift child positions
                if old.children.is_empty() && !old.content.is_empty() {
                    platform.set_text_content(native, "");
                    return PatchFlags::CONTENT;
                }
                return PatchFlags::empty();
            }
            if old.content != new.content || (!old.children.is_empty() && !new.content.is_empty()) {
                platform.set_text_content(native, &new.content);
                return PatchFlags::CONTENT;
            }
            PatchFlags::empty()
        }
    }
}

fn patch_children<P: Platform>(
    platform: &mut P,
    native: &P::Handle,
    old: &Node,
    new: &Node,
) -> PatchFlags {
    let mut flags = PatchFlags::empty();
    let common = old.children.len().min(new.children.len());

    for (index, (old_child, new_child)) in old.children.iter().zip(&new.children).enumerate() {
        match platform.child_at(native, index) {
            Some(child) => flags |= diff_and_apply(platform, &child, old_child, new_child).flags,
            None => tracing::warn!(index, tag = %new.tag, "native child missing, skipping"),
        }
    }

    for extra in &new.children[common..] {
        let child = materialize(platform, extra);
        platform.append_child(native, &child);
        flags |= PatchFlags::APPENDED;
    }

    for index in (common..old.children.len()).rev() {
        // Children may already be gone if text content replaced them
        if let Some(child) = platform.child_at(native, index) {
            platform.remove_child(native, &child);
            flags |= PatchFlags::REMOVED;
        }
    }

    if !flags.is_quiet() {
        tracing::trace!(tag = %new.tag, ?flags, "patched children");
    }
    flags
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{MemoryDocument, Mutation, NodeId};
    use crate::primitives::{div, input_text, list, list_item, paragraph, span, text};
    use rstest::rstest;
    use std::sync::Arc;

    fn render(tree: &Node) -> (MemoryDocument, NodeId, NodeId) {
        let mut doc = MemoryDocument::with_mount("app");
        let mount = doc.query_selector("#app").unwrap();
        let root = materialize_into(&mut doc, &mount, tree);
        doc.clear_mutations();
        (doc, mount, root)
    }

    #[test]
    fn test_identical_trees_only_rebind_handlers() {
        let tree = div([
            paragraph("hello").attr("class", "greeting"),
            Node::element("button").on("click", Arc::new(|_| {})),
            input_text("typed"),
        ]);
        let (mut doc, _, root) = render(&tree);

        let patched = diff_and_apply(&mut doc, &root, &tree, &tree);
        assert!(patched.flags.is_quiet());
        assert!(doc.structural_mutations().is_empty());
        assert_eq!(doc.mutations().len(), 1);
    }

    #[test]
    fn test_tag_change_replaces_subtree() {
        let old = div([paragraph("a")]);
        let new = div([span("a")]);
        let (mut doc, _, root) = render(&old);
        let before = doc.child_at(&root, 0).unwrap();

        let patched = diff_and_apply(&mut doc, &root, &old, &new);
        assert!(patched.flags.contains(PatchFlags::REPLACED));
        let after = doc.child_at(&root, 0).unwrap();
        assert_ne!(before, after);
        assert!(!doc.is_live(before));
        assert_eq!(doc.tag(after), Some("span"));
    }

    #[test]
    fn test_root_replacement_swaps_in_mount() {
        let (mut doc, mount, root) = render(&paragraph("x"));
        let patched = diff_and_apply(&mut doc, &root, &paragraph("x"), &span("x"));
        assert_eq!(doc.child_at(&mount, 0).as_ref(), patched.replacement.as_ref());
        assert_eq!(doc.child_count(&mount), 1);
    }

    #[test]
    fn test_attribute_changes() {
        let old = Node::element("a")
            .attr("href", "/a")
            .attr("title", "t")
            .attr("disabled", true);
        let new = Node::element("a").attr("href", "/b").attr("disabled", false);
        let (mut doc, _, root) = render(&old);

        let patched = diff_and_apply(&mut doc, &root, &old, &new);
        assert_eq!(patched.flags, PatchFlags::ATTRIBUTES);
        assert_eq!(doc.attribute(root, "href"), Some("/b"));
        assert_eq!(doc.attribute(root, "title"), None);
        assert_eq!(doc.attribute(root, "disabled"), None);
    }

    #[test]
    fn test_handlers_rebound_every_pass() {
        let tree = Node::element("button")
            .content("go")
            .on_activate(|| {});
        let (mut doc, _, root) = render(&tree);

        let patched = diff_and_apply(&mut doc, &root, &tree, &tree);
        assert_eq!(patched.flags, PatchFlags::HANDLERS);
        assert_eq!(
            doc.mutations(),
            &[Mutation::BindHandler { node: root, event: "click".to_string() }]
        );
    }

    #[test]
    fn test_removed_handler_attribute_is_not_cleared() {
        let old = Node::element("button").on("click", Arc::new(|_| {}));
        let new = Node::element("button");
        let (mut doc, _, root) = render(&old);

        let patched = diff_and_apply(&mut doc, &root, &old, &new);
        assert!(patched.flags.is_empty());
        assert!(doc.event_handler(&root, "click").is_some());
    }

    #[test]
    fn test_unfocused_input_synchronizes_value() {
        let (mut doc, _, root) = render(&input_text(""));
        diff_and_apply(&mut doc, &root, &input_text(""), &input_text("h"));
        assert_eq!(doc.value(&root), "h");
    }

    #[test]
    fn test_focused_input_keeps_value() {
        let (mut doc, _, root) = render(&input_text(""));
        doc.focus(root);
        doc.type_text(root, "typed");

        let patched = diff_and_apply(&mut doc, &root, &input_text(""), &input_text("h"));
        assert!(!patched.flags.contains(PatchFlags::VALUE));
        assert_eq!(doc.value(&root), "typed");

        doc.blur();
        diff_and_apply(&mut doc, &root, &input_text("h"), &input_text("h"));
        assert_eq!(doc.value(&root), "h");
    }

    #[test]
    fn test_unfocused_input_cleared_to_empty() {
        let (mut doc, _, root) = render(&input_text("old"));
        diff_and_apply(&mut doc, &root, &input_text("old"), &input_text(""));
        assert_eq!(doc.value(&root), "");
    }

    #[test]
    fn test_select_value_written_every_pass() {
        let tree = crate::primitives::select("b", [("a", "A"), ("b", "B")]);
        let (mut doc, _, root) = render(&tree);
        let patched = diff_and_apply(&mut doc, &root, &tree, &tree);
        assert!(patched.flags.contains(PatchFlags::VALUE));
    }

    #[test]
    fn test_text_node_content() {
        let old = div([text("a")]);
        let new = div([text("b")]);
        let (mut doc, _, root) = render(&old);

        let patched = diff_and_apply(&mut doc, &root, &old, &new);
        assert_eq!(patched.flags, PatchFlags::CONTENT);
        assert_eq!(doc.text_content(root), "b");
    }

    #[test]
    fn test_content_ignored_with_children() {
        let old = div([span("x")]).content("ignored");
        let new = div([span("x")]).content("also ignored");
        let (mut doc, _, root) = render(&old);

        assert!(diff_and_apply(&mut doc, &root, &old, &new).flags.is_empty());
    }

    #[test]
    fn test_text_to_children_clears_text() {
        let old = Node::element("div").content("loading");
        let new = div([span("a"), span("b")]);
        let (mut doc, _, root) = render(&old);

        diff_and_apply(&mut doc, &root, &old, &new);
        assert_eq!(doc.inner_html(root), "<span>a</span><span>b</span>");
    }

    #[test]
    fn test_children_to_text() {
        let old = div([span("a"), span("b")]);
        let new = Node::element("div").content("done");
        let (mut doc, _, root) = render(&old);

        diff_and_apply(&mut doc, &root, &old, &new);
        assert_eq!(doc.inner_html(root), "done");
    }

    fn items(n: usize) -> Node {
        list((0..n).map(|i| list_item(format!("item {i}"))))
    }

    #[rstest]
    #[case(2, 5)]
    #[case(5, 2)]
    #[case(0, 3)]
    #[case(3, 0)]
    #[case(4, 4)]
    fn test_list_resize(#[case] from: usize, #[case] to: usize) {
        let (mut doc, _, root) = render(&items(from));
        let kept: Vec<_> = doc.children(root).into_iter().take(from.min(to)).collect();

        diff_and_apply(&mut doc, &root, &items(from), &items(to));

        let appended = doc
            .mutations()
            .iter()
            .filter(|m| matches!(m, Mutation::Append { parent, .. } if *parent == root))
            .count();
        let removed = doc
            .mutations()
            .iter()
            .filter(|m| matches!(m, Mutation::Remove { parent, .. } if *parent == root))
            .count();
        assert_eq!(appended, to.saturating_sub(from));
        assert_eq!(removed, from.saturating_sub(to));

        // Common prefix reconciled in place, not recreated
        let children = doc.children(root);
        assert_eq!(children.len(), to);
        assert_eq!(&children[..kept.len()], kept.as_slice());
        assert_eq!(doc.text_content(root), (0..to).map(|i| format!("item {i}")).collect::<String>());
    }

    #[test]
    fn test_patch_mount_none_is_noop() {
        let mut doc = MemoryDocument::with_mount("app");
        let mount = doc.query_selector("#app");
        let tree = paragraph("x");
        doc.clear_mutations();

        assert!(patch_mount(&mut doc, None, Some(&tree), Some(&tree)).is_empty());
        assert!(patch_mount(&mut doc, mount.as_ref(), None, Some(&tree)).is_empty());
        assert!(patch_mount(&mut doc, mount.as_ref(), Some(&tree), None).is_empty());
        assert!(doc.mutations().is_empty());
    }

    #[test]
    fn test_patch_mount_materializes_empty_mount() {
        let mut doc = MemoryDocument::with_mount("app");
        let mount = doc.query_selector("#app").unwrap();
        let old = paragraph("x");
        let new = paragraph("y");

        assert_eq!(patch_mount(&mut doc, Some(&mount), Some(&old), Some(&new)), PatchFlags::APPENDED);
        assert_eq!(patch_mount(&mut doc, Some(&mount), Some(&new), Some(&old)), PatchFlags::CONTENT);
        assert_eq!(doc.inner_html(mount), "<p>x</p>");
    }
}
