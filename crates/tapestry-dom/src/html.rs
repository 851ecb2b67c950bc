//! HTML fragment parsing and serialization.
//!
//! Parsing goes through html5ever's document parser. The children of the
//! resulting `<body>` are imported into the arena as detached nodes.
//! Serialization follows the innerHTML algorithm closely enough that
//! snapshots compare equal to what a browser would report.

use std::sync::LazyLock;

use html5ever::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};
use regex::Regex;

use crate::document::{Document, NodeData, NodeId, is_void_element};

/// Parses `html` as body content and returns the detached top-level nodes.
pub fn parse_fragment(doc: &mut Document, html: &str) -> Vec<NodeId> {
    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            drop_doctype: true,
            ..Default::default()
        },
        ..Default::default()
    };
    let dom = parse_document(RcDom::default(), opts)
        .from_utf8()
        .one(html.as_bytes());

    let Some(body) = find_body(&dom.document) else {
        return Vec::new();
    };
    let children = body.children.borrow();
    children
        .iter()
        .filter_map(|child| import(doc, child))
        .collect()
}

/// Replaces the children of `parent` with the parsed fragment.
pub fn set_inner_html(doc: &mut Document, parent: NodeId, html: &str) {
    for child in doc.children(parent).to_vec() {
        doc.detach(child);
    }
    for node in parse_fragment(doc, html) {
        doc.append_child(parent, node);
    }
}

fn find_body(handle: &Handle) -> Option<Handle> {
    if let RcNodeData::Element { ref name, .. } = handle.data {
        if &*name.local == "body" {
            return Some(handle.clone());
        }
    }
    handle.children.borrow().iter().find_map(find_body)
}

fn import(doc: &mut Document, handle: &Handle) -> Option<NodeId> {
    match handle.data {
        RcNodeData::Element {
            ref name,
            ref attrs,
            ..
        } => {
            let id = doc.create_element(&name.local);
            for attr in attrs.borrow().iter() {
                doc.set_attr(id, &attr.name.local, attr.value.to_string());
            }
            for child in handle.children.borrow().iter() {
                if let Some(child) = import(doc, child) {
                    doc.append_child(id, child);
                }
            }
            Some(id)
        }
        RcNodeData::Text { ref contents } => Some(doc.create_text(contents.borrow().to_string())),
        RcNodeData::Comment { ref contents } => Some(doc.create_comment(contents.to_string())),
        _ => None,
    }
}

/// Serializes the children of `id`.
pub fn inner_html(doc: &Document, id: NodeId) -> String {
    inner_html_filtered(doc, id, &|_| false)
}

/// Serializes the children of `id`, leaving out every subtree whose top
/// node `skip` accepts.
pub fn inner_html_filtered(doc: &Document, id: NodeId, skip: &dyn Fn(NodeId) -> bool) -> String {
    let mut out = String::new();
    let raw = doc
        .tag_name(id)
        .is_some_and(|name| RAW_TEXT_ELEMENTS.contains(&name));
    for &child in doc.children(id) {
        write_node(doc, child, raw, skip, &mut out);
    }
    out
}

/// Serializes `id` including its own tag.
pub fn outer_html(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, id, false, &|_| false, &mut out);
    out
}

const RAW_TEXT_ELEMENTS: &[&str] = &[
    "style", "script", "xmp", "iframe", "noembed", "noframes", "plaintext",
];

fn write_node(
    doc: &Document,
    id: NodeId,
    raw_text: bool,
    skip: &dyn Fn(NodeId) -> bool,
    out: &mut String,
) {
    if skip(id) {
        return;
    }
    match doc.data(id) {
        NodeData::Element(el) => {
            out.push('<');
            out.push_str(&el.name);
            for attr in &el.attrs {
                out.push(' ');
                out.push_str(&attr.name);
                out.push_str("=\"");
                escape_into(&attr.value, true, out);
                out.push('"');
            }
            out.push('>');
            if is_void_element(&el.name) {
                return;
            }
            let raw = RAW_TEXT_ELEMENTS.contains(&el.name.as_str());
            for &child in doc.children(id) {
                write_node(doc, child, raw, skip, out);
            }
            out.push_str("</");
            out.push_str(&el.name);
            out.push('>');
        }
        NodeData::Text(text) if raw_text => out.push_str(text),
        NodeData::Text(text) => escape_into(text, false, out),
        NodeData::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeData::Marker => {}
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' if attribute => out.push_str("&quot;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

struct LineBreakRule {
    pattern: Regex,
    before: bool,
    after: bool,
}

static LINE_BREAK_RULES: LazyLock<Vec<LineBreakRule>> = LazyLock::new(|| {
    [
        (r"(?i)</?\s*br\b[^>]*>", false, true),
        (r"(?i)</\s*(?:ul|ol|li)\b[^>]*>", false, true),
        (r"(?i)</\s*(?:div|p)\b[^>]*>", true, true),
        (r"(?i)<\s*(?:ul|ol)\b[^>]*>", false, true),
        (r"(?i)<\s*(?:div|p)\b[^>]*>", true, true),
    ]
    .into_iter()
    .filter_map(|(pattern, before, after)| match Regex::new(pattern) {
        Ok(pattern) => Some(LineBreakRule {
            pattern,
            before,
            after,
        }),
        Err(err) => {
            tracing::error!(target: "tapestry::dom", %err, "invalid line break pattern");
            None
        }
    })
    .collect()
});

/// Pretty-prints serialized HTML for the source view.
///
/// Puts a line break after `br` and closing list tags, after opening list
/// tags, and on both sides of `div`/`p` tags. A break is never added where
/// one already exists, and never at the very start of the text, so
/// formatting already-formatted markup changes nothing.
pub fn format_html_string(html: &str) -> String {
    let mut text = html.to_string();
    for rule in LINE_BREAK_RULES.iter() {
        text = surround_matches(&text, rule);
    }
    text
}

fn surround_matches(input: &str, rule: &LineBreakRule) -> String {
    let mut out = String::with_capacity(input.len() + input.len() / 8);
    let mut last = 0;
    for m in rule.pattern.find_iter(input) {
        out.push_str(&input[last..m.start()]);
        if rule.before && !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(m.as_str());
        if rule.after && !input[m.end()..].starts_with('\n') {
            out.push('\n');
        }
        last = m.end();
    }
    out.push_str(&input[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    fn roundtrip(html: &str) -> String {
        let mut doc = Document::new();
        let root = doc.root();
        set_inner_html(&mut doc, root, html);
        inner_html(&doc, root)
    }

    #[test]
    fn serializes_like_inner_html() {
        assert_snapshot!(
            roundtrip("<P ALIGN=center>a &amp; b<br>c&nbsp;d</P><img src=\"x\">"),
            @r#"<p align="center">a &amp; b<br>c&nbsp;d</p><img src="x">"#
        );
    }

    #[test]
    fn attribute_quotes_are_escaped() {
        assert_snapshot!(
            roundtrip(r#"<a href='say "hi"'>x</a>"#),
            @r#"<a href="say &quot;hi&quot;">x</a>"#
        );
    }

    #[test]
    fn markers_serialize_to_nothing() {
        let mut doc = Document::new();
        let root = doc.root();
        set_inner_html(&mut doc, root, "<p>ab</p>");
        let p = doc.first_child(root).unwrap();
        let marker = doc.create_marker();
        doc.insert_child(p, 0, marker);
        assert_eq!(inner_html(&doc, root), "<p>ab</p>");
    }

    #[test]
    fn filtered_serialization_skips_subtrees() {
        let mut doc = Document::new();
        let root = doc.root();
        set_inner_html(&mut doc, root, "<p>a<b>b</b>c</p>");
        let p = doc.first_child(root).unwrap();
        let b = doc.children(p)[1];
        assert_eq!(inner_html_filtered(&doc, root, &|node| node == b), "<p>ac</p>");
    }

    #[test]
    fn format_adds_line_breaks() {
        assert_snapshot!(
            format_html_string("<p>a<br>b</p><ul><li>x</li></ul><pre>y</pre>"),
            @r"
        <p>
        a<br>
        b
        </p>
        <ul>
        <li>x</li>
        </ul>
        <pre>y</pre>
        "
        );
    }

    #[test]
    fn format_is_idempotent() {
        let once = format_html_string("<div><p>a</p><p>b</p></div>");
        assert_eq!(format_html_string(&once), once);
    }

    #[test]
    fn format_then_parse_is_stable() {
        let formatted = format_html_string("<p>abc</p><ol><li>one</li></ol>");
        let reparsed = format_html_string(&roundtrip(&formatted));
        assert_eq!(reparsed, formatted);
    }
}
