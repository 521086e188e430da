//! HTML import (via `scraper`/html5ever) and serialization for `MemoryDocument`.

use scraper::{ElementRef, Html, Node};

use super::memory::{MemoryDocument, NodeKind};
use super::{NodeId, UiTree};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Imports a full page under `parent`, starting at its `<html>` element.
pub(super) fn import_document(doc: &mut MemoryDocument, parent: NodeId, markup: &str) {
    let parsed = Html::parse_document(markup);
    let root = parsed.root_element();
    let html = create_from(doc, root);
    doc.append_child(parent, html);
    import_children(doc, html, root);
}

/// Imports a markup fragment as children of `parent`.
pub(super) fn import_fragment(doc: &mut MemoryDocument, parent: NodeId, markup: &str) {
    let parsed = Html::parse_fragment(markup);
    import_children(doc, parent, parsed.root_element());
}

fn create_from(doc: &mut MemoryDocument, element: ElementRef<'_>) -> NodeId {
    let value = element.value();
    let attrs = value
        .attrs()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    doc.create_element_with_attrs(value.name(), attrs)
}

fn import_children(doc: &mut MemoryDocument, parent: NodeId, element: ElementRef<'_>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let text: &str = &text.text;
                let id = doc.create_text(text);
                doc.append_child(parent, id);
            }
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    let id = create_from(doc, child_el);
                    doc.append_child(parent, id);
                    import_children(doc, id, child_el);
                }
            }
            _ => {}
        }
    }
}

pub(super) fn write_node(doc: &MemoryDocument, node: NodeId, out: &mut String) {
    let Some(data) = doc.node(node) else {
        return;
    };
    match &data.kind {
        NodeKind::Document => {
            for child in &data.children {
                write_node(doc, *child, out);
            }
        }
        NodeKind::Text(text) => {
            let raw = doc
                .parent(node)
                .and_then(|p| doc.tag_name(p))
                .is_some_and(|t| RAW_TEXT_ELEMENTS.contains(&t.as_str()));
            if raw {
                out.push_str(text);
            } else {
                escape_into(text, false, out);
            }
        }
        NodeKind::Element { tag, attrs } => {
            out.push('<');
            out.push_str(tag);
            for (name, value) in attrs {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                escape_into(value, true, out);
                out.push('"');
            }
            out.push('>');
            if VOID_ELEMENTS.contains(&tag.as_str()) {
                return;
            }
            for child in &data.children {
                write_node(doc, *child, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}
