//! Materialization - Building fresh native subtrees.

use std::sync::Arc;

use crate::dom::Platform;
use crate::primitives::events::{ActivationHandler, EventHandler};
use crate::types::{is_event_attribute, event_name, AttrValue, ElementClass, Node};

/// Build a brand-new native subtree for `node` and return its (detached) root.
///
/// One native node is created for every tree node, empty text included, so
/// native child positions always line up with tree positions.
pub fn materialize<P: Platform>(platform: &mut P, node: &Node) -> P::Handle {
    if node.is_text() {
        return platform.create_text(&node.content);
    }

    let handle = platform.create_element(&node.tag);

    if let Some(callback) = &node.on_activate {
        platform.set_event_handler(&handle, "click", activation_handler(callback));
    }
    for (name, value) in &node.attributes {
        write_attribute(platform, &handle, name, value);
    }

    let class = node.class();
    match class {
        ElementClass::EditableText if !node.content.is_empty() => {
            platform.set_value(&handle, &node.content);
        }
        ElementClass::Other if node.children.is_empty() && !node.content.is_empty() => {
            platform.set_text_content(&handle, &node.content);
        }
        _ => {}
    }

    for child in &node.children {
        let native = materialize(platform, child);
        platform.append_child(&handle, &native);
    }

    // The selected value only resolves once the options exist
    if class == ElementClass::Selection && !node.content.is_empty() {
        platform.set_value(&handle, &node.content);
    }

    handle
}

/// Materialize `node` and append it under `mount`.
pub fn materialize_into<P: Platform>(platform: &mut P, mount: &P::Handle, node: &Node) -> P::Handle {
    let handle = materialize(platform, node);
    platform.append_child(mount, &handle);
    tracing::trace!(tag = %node.tag, nodes = node.subtree_len(), "materialized subtree");
    handle
}

/// Write one attribute of a fresh element.
fn write_attribute<P: Platform>(platform: &mut P, handle: &P::Handle, name: &str, value: &AttrValue) {
    match value {
        AttrValue::Handler(handler) => bind_handler(platform, handle, name, handler),
        other => {
            if let Some(native) = other.as_native() {
                platform.set_attribute(handle, name, native);
            }
        }
    }
}

/// Bind an event handler stored under attribute `name`.
pub(crate) fn bind_handler<P: Platform>(
    platform: &mut P,
    handle: &P::Handle,
    name: &str,
    handler: &EventHandler,
) {
    let event = if is_event_attribute(name) {
        event_name(name)
    } else {
        name.to_ascii_lowercase()
    };
    platform.set_event_handler(handle, &event, handler.clone());
}

/// Wrap the legacy activation callback as a `click` handler.
pub(crate) fn activation_handler(callback: &ActivationHandler) -> EventHandler {
    let callback = callback.clone();
    Arc::new(move |_event| callback())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{MemoryDocument, Mutation};
    use crate::primitives::{div, input_text, list, list_item, select, text};

    fn mounted() -> (MemoryDocument, crate::dom::NodeId) {
        let doc = MemoryDocument::with_mount("app");
        let mount = doc.query_selector("#app").unwrap();
        (doc, mount)
    }

    #[test]
    fn test_materialize_nested_list() {
        let (mut doc, mount) = mounted();
        let tree = list([list_item("a"), list_item("b")]).attr("class", "items");
        materialize_into(&mut doc, &mount, &tree);

        assert_eq!(
            doc.inner_html(mount),
            r#"<ul class="items"><li>a</li><li>b</li></ul>"#
        );
    }

    #[test]
    fn test_empty_text_nodes_still_created() {
        let (mut doc, mount) = mounted();
        let root = materialize_into(&mut doc, &mount, &div([text(""), text("x")]));
        assert_eq!(doc.child_count(&root), 2);
    }

    #[test]
    fn test_editable_value_not_text() {
        let (mut doc, mount) = mounted();
        let input = materialize_into(&mut doc, &mount, &input_text("hello"));
        assert_eq!(doc.value(&input), "hello");
        assert_eq!(doc.text_content(input), "");
    }

    #[test]
    fn test_select_value_written_after_options() {
        let (mut doc, _) = mounted();
        doc.clear_mutations();
        let handle = materialize(&mut doc, &select("b", [("a", "A"), ("b", "B")]));

        let log = doc.take_mutations();
        let value_at = log
            .iter()
            .position(|m| matches!(m, Mutation::SetValue { .. }))
            .unwrap();
        let last_append = log
            .iter()
            .rposition(|m| matches!(m, Mutation::Append { .. }))
            .unwrap();
        assert!(value_at > last_append);
        assert_eq!(doc.value(&handle), "b");
    }

    #[test]
    fn test_bool_attributes() {
        let (mut doc, _) = mounted();
        let node = Node::element("button")
            .attr("disabled", true)
            .attr("hidden", false);
        let handle = materialize(&mut doc, &node);
        assert_eq!(doc.attribute(handle, "disabled"), Some(""));
        assert_eq!(doc.attribute(handle, "hidden"), None);
    }

    #[test]
    fn test_handlers_bound_by_event_name() {
        let (mut doc, _) = mounted();
        let node = Node::element("button")
            .on("click", Arc::new(|_| {}))
            .attr("onMouseDown", AttrValue::Handler(Arc::new(|_| {})));
        let handle = materialize(&mut doc, &node);
        assert!(doc.event_handler(&handle, "click").is_some());
        assert!(doc.event_handler(&handle, "mousedown").is_some());
        assert_eq!(doc.attribute(handle, "onclick"), None);
    }
}
