//! HTML serialization of a [`MemoryDocument`] subtree.

use super::memory::{MemoryDocument, NodeId};

/// Elements that never have a closing tag.
const VOID_ELEMENTS: &[&str] = &["input", "br", "img", "hr", "meta", "link"];

pub(super) fn inner_html(doc: &MemoryDocument, id: NodeId) -> String {
    let mut out = String::new();
    let Some(node) = doc.get(id) else { return out };
    if node.is_text() {
        escape_text(&node.text, &mut out);
        return out;
    }
    escape_text(&node.text, &mut out);
    for &child in &node.children {
        write_node(doc, child, &mut out);
    }
    out
}

pub(super) fn outer_html(doc: &MemoryDocument, id: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, id, &mut out);
    out
}

fn write_node(doc: &MemoryDocument, id: NodeId, out: &mut String) {
    let Some(node) = doc.get(id) else { return };
    if node.is_text() {
        escape_text(&node.text, out);
        return;
    }

    out.push('<');
    out.push_str(&node.tag);
    for (name, value) in &node.attributes {
        out.push(' ');
        out.push_str(name);
        if !value.is_empty() {
            out.push_str("=\"");
            escape_attribute(value, out);
            out.push('"');
        }
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&node.tag.as_str()) {
        return;
    }

    escape_text(&node.text, out);
    for &child in &node.children {
        write_node(doc, child, out);
    }

    out.push_str("</");
    out.push_str(&node.tag);
    out.push('>');
}

fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::dom::{MemoryDocument, Platform};

    #[test]
    fn test_serializes_nested_elements() {
        let mut doc = MemoryDocument::with_mount("app");
        let mount = doc.query_selector("#app").unwrap();
        let ul = doc.create_element("ul");
        let li = doc.create_element("li");
        doc.set_attribute(&ul, "class", "items");
        doc.set_text_content(&li, "a < b");
        doc.append_child(&ul, &li);
        doc.append_child(&mount, &ul);

        assert_eq!(
            doc.inner_html(mount),
            r#"<ul class="items"><li>a &lt; b</li></ul>"#
        );
    }

    #[test]
    fn test_void_and_boolean_attributes() {
        let mut doc = MemoryDocument::new();
        let input = doc.create_element("input");
        doc.set_attribute(&input, "disabled", "");
        doc.set_attribute(&input, "type", "text");
        assert_eq!(doc.outer_html(input), r#"<input disabled type="text">"#);
    }
}
