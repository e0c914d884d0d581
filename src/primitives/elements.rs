//! Element builders.
//!
//! Shorthands for the nodes template code produces most often. They are plain
//! constructors: every builder returns a [`Node`] that can be refined with the
//! chained setters on `Node` (`attr`, `on`, `child`, `key`).

use crate::types::Node;

/// A pure text node (no element wrapper).
pub fn text(content: impl Into<String>) -> Node {
    Node::text(content)
}

/// A `<p>` holding text.
pub fn paragraph(content: impl Into<String>) -> Node {
    Node::element("p").content(content)
}

/// A `<div>` with children.
pub fn div(children: impl IntoIterator<Item = Node>) -> Node {
    Node::element("div").children(children)
}

/// A `<span>` holding text.
pub fn span(content: impl Into<String>) -> Node {
    Node::element("span").content(content)
}

/// A heading `<h1>`..`<h6>`. Levels outside 1..=6 are clamped.
pub fn heading(level: u8, content: impl Into<String>) -> Node {
    Node::element(format!("h{}", level.clamp(1, 6))).content(content)
}

/// A `<button>` with a text label.
pub fn button(label: impl Into<String>) -> Node {
    Node::element("button").content(label)
}

/// An `<input type="text">` whose value is `value`.
pub fn input_text(value: impl Into<String>) -> Node {
    Node::element("input").attr("type", "text").content(value)
}

/// A `<textarea>` whose value is `value`.
pub fn textarea(value: impl Into<String>) -> Node {
    Node::element("textarea").content(value)
}

/// A `<select>` with `(value, label)` options and `selected` as its value.
pub fn select<'a>(
    selected: impl Into<String>,
    options: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Node {
    Node::element("select")
        .children(options.into_iter().map(|(value, label)| option(value, label)))
        .content(selected)
}

/// An `<option>`.
pub fn option(value: impl Into<String>, label: impl Into<String>) -> Node {
    Node::element("option").attr("value", value.into()).content(label)
}

/// A `<ul>` of `<li>` items.
pub fn list(items: impl IntoIterator<Item = Node>) -> Node {
    Node::element("ul").children(items)
}

/// An `<li>` holding text.
pub fn list_item(content: impl Into<String>) -> Node {
    Node::element("li").content(content)
}

/// An `<a>` link.
pub fn link(href: impl Into<String>, label: impl Into<String>) -> Node {
    Node::element("a").attr("href", href.into()).content(label)
}

/// A `<form>` with children.
pub fn form(children: impl IntoIterator<Item = Node>) -> Node {
    Node::element("form").children(children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AttrValue, ElementClass};

    #[test]
    fn test_input_text_shape() {
        let node = input_text("hi");
        assert_eq!(node.tag, "input");
        assert_eq!(node.attributes.get("type"), Some(&AttrValue::from("text")));
        assert_eq!(node.content, "hi");
        assert_eq!(node.class(), ElementClass::EditableText);
    }

    #[test]
    fn test_select_builds_options() {
        let node = select("b", [("a", "Alpha"), ("b", "Beta")]);
        assert_eq!(node.children.len(), 2);
        assert_eq!(node.children[1].content, "Beta");
        assert_eq!(node.content, "b");
    }

    #[test]
    fn test_heading_clamps_level() {
        assert_eq!(heading(0, "x").tag, "h1");
        assert_eq!(heading(9, "x").tag, "h6");
    }
}
