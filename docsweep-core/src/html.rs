//! Minimal HTML re-serialization over `scraper`'s read-only tree.
//!
//! `scraper` cannot mutate a parsed document, so every transformation
//! (boilerplate removal, URL rewriting, table replacement) is expressed as a
//! [`Rewrite`] applied while writing the tree back out.

use scraper::{ElementRef, Node};
use std::borrow::Cow;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

pub(crate) trait Rewrite {
    /// Returns `true` when the element was fully handled (written or dropped).
    fn element(&mut self, _element: ElementRef<'_>, _out: &mut String) -> bool {
        false
    }

    /// Replacement value for an attribute, if any.
    fn attribute(&self, _element: &str, _name: &str, _value: &str) -> Option<String> {
        None
    }
}

pub(crate) fn write_element<R: Rewrite>(element: ElementRef<'_>, out: &mut String, rewrite: &mut R) {
    if rewrite.element(element, out) {
        return;
    }
    write_element_with(element, out, rewrite);
}

/// Writes the element itself, bypassing [`Rewrite::element`] for it (children still pass through).
pub(crate) fn write_element_with<R: Rewrite>(
    element: ElementRef<'_>,
    out: &mut String,
    rewrite: &mut R,
) {
    let name = element.value().name();
    out.push('<');
    out.push_str(name);
    for (attr, value) in element.value().attrs() {
        let value = match rewrite.attribute(name, attr, value) {
            Some(replaced) => Cow::Owned(replaced),
            None => Cow::Borrowed(value),
        };
        out.push(' ');
        out.push_str(attr);
        out.push_str("=\"");
        out.push_str(&escape_attribute(&value));
        out.push('"');
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&name) {
        return;
    }

    write_children(element, out, rewrite);

    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

pub(crate) fn write_children<R: Rewrite>(element: ElementRef<'_>, out: &mut String, rewrite: &mut R) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&escape_text(text)),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    write_element(child, out, rewrite);
                }
            }
            _ => {}
        }
    }
}

pub(crate) fn escape_text(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>']) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;"),
    )
}

pub(crate) fn escape_attribute(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '"']) {
        return Cow::Borrowed(value);
    }
    Cow::Owned(value.replace('&', "&amp;").replace('"', "&quot;"))
}
