//! HTML serialization of a `Document` subtree.
//!
//! Rules:
//! - Attributes are written in assignment order.
//! - Text is escaped for `&`, `<`, `>`; attribute values for `&` and `"`.
//! - Void elements are written without a closing tag.

use core_types::HostHandle;
use memchr::{memchr2, memchr3};

use crate::document::{Document, NodeKind};

const VOID_ELEMENTS: [&str; 13] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

pub fn inner_html(doc: &Document, node: HostHandle) -> String {
    let mut out = String::new();
    for &child in doc.children(node) {
        write_node(doc, child, &mut out);
    }
    out
}

pub fn outer_html(doc: &Document, node: HostHandle) -> String {
    let mut out = String::new();
    write_node(doc, node, &mut out);
    out
}

fn write_node(doc: &Document, node: HostHandle, out: &mut String) {
    match doc.kind(node) {
        Some(NodeKind::Text { text }) => escape_text(text, out),
        Some(NodeKind::Element {
            tag, attributes, ..
        }) => {
            out.push('<');
            out.push_str(tag);
            for (name, value) in attributes {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                escape_attr(value, out);
                out.push('"');
            }
            out.push('>');
            if VOID_ELEMENTS.contains(&&**tag) {
                return;
            }
            for &child in doc.children(node) {
                write_node(doc, child, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
        None => {}
    }
}

fn escape_text(text: &str, out: &mut String) {
    let bytes = text.as_bytes();
    let mut start = 0;
    while let Some(rel) = memchr3(b'&', b'<', b'>', &bytes[start..]) {
        let pos = start + rel;
        out.push_str(&text[start..pos]);
        out.push_str(match bytes[pos] {
            b'&' => "&amp;",
            b'<' => "&lt;",
            _ => "&gt;",
        });
        start = pos + 1;
    }
    out.push_str(&text[start..]);
}

fn escape_attr(value: &str, out: &mut String) {
    let bytes = value.as_bytes();
    let mut start = 0;
    while let Some(rel) = memchr2(b'&', b'"', &bytes[start..]) {
        let pos = start + rel;
        out.push_str(&value[start..pos]);
        out.push_str(if bytes[pos] == b'&' { "&amp;" } else { "&quot;" });
        start = pos + 1;
    }
    out.push_str(&value[start..]);
}
