//! Markup normalization.
//!
//! Two passes rewrite inline CSS. [`Pass::Canonical`] turns formatting
//! declarations into semantic elements so state queries only ever look at
//! tags; it runs whenever content is loaded into the editing surface.
//! [`Pass::Legacy`] goes the other way for the serialized form, producing
//! `align` attributes and `<font>` elements. Both finish with the
//! redundancy sweep: no bare wrappers, no empty markup, no formatting
//! element nested inside the same formatting.
//!
//! The module also holds the tag-stripping helpers the mutation engine
//! uses, and the allow-list sanitizer behind the Word paste cleanup.

use std::sync::LazyLock;

use regex::Regex;
use tapestry_dom::{Document, NodeData, NodeId, SmolStr};
use tracing::trace;

use crate::tags::{InlineFormat, KEPT_ATTRIBUTES, MARKUP_TAGS, is_block};
use crate::types::Align;

/// Elements that only exist to carry attributes.
const WRAPPER_TAGS: &[&str] = &["span", "div", "font"];

/// What [`clean_up_tag`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cleanup {
    /// Not a wrapper element, or detached.
    Skipped,
    Unwrapped,
    /// Still carries attributes.
    Kept,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// CSS to semantic tags, `align` to `text-align`.
    Canonical,
    /// `text-align` to `align`, font declarations to `<font>`.
    Legacy,
}

fn has_meaningful_attributes(doc: &Document, node: NodeId) -> bool {
    doc.attrs(node).iter().any(|attr| !attr.value.trim().is_empty())
}

/// A `div` or `p` turned inline needs a line break to keep the following
/// content on its own line.
fn needs_line_break(doc: &Document, block: NodeId) -> bool {
    doc.has_tag_in(block, &["div", "p"])
        && doc.next_sibling(block).is_some()
        && doc
            .last_child(block)
            .is_some_and(|last| !is_block(doc, last) && !doc.is_tag(last, "br"))
}

fn push_line_break(doc: &mut Document, block: NodeId, insert_br: bool) {
    if insert_br && needs_line_break(doc, block) {
        let br = doc.create_element("br");
        doc.append_child(block, br);
    }
}

/// Unwraps a `span`, `div` or `font` that carries no attributes.
pub fn clean_up_tag(doc: &mut Document, node: NodeId, insert_br: bool) -> Cleanup {
    if !doc.has_tag_in(node, WRAPPER_TAGS) || doc.parent(node).is_none() {
        return Cleanup::Skipped;
    }
    if has_meaningful_attributes(doc, node) {
        return Cleanup::Kept;
    }
    push_line_break(doc, node, insert_br);
    doc.unwrap(node);
    Cleanup::Unwrapped
}

/// Strips the tag of `node`, keeping its children in place.
///
/// When the element carries a `style` or `align` attribute it is demoted to
/// a `span` holding just those attributes, which is returned. Otherwise it
/// is removed outright and `None` comes back.
pub fn remove_tag_keep_attributes(
    doc: &mut Document,
    node: NodeId,
    insert_br: bool,
) -> Option<NodeId> {
    if !doc.is_element(node) || doc.parent(node).is_none() {
        return None;
    }
    let kept: Vec<(&str, String)> = KEPT_ATTRIBUTES
        .iter()
        .filter_map(|&name| {
            doc.attr(node, name)
                .filter(|value| !value.trim().is_empty())
                .map(|value| (name, value.to_string()))
        })
        .collect();
    push_line_break(doc, node, insert_br);
    if kept.is_empty() {
        doc.unwrap(node);
        return None;
    }
    if doc.is_tag(node, "span") && doc.attrs(node).len() == kept.len() {
        return Some(node);
    }
    let span = doc.create_element("span");
    for (name, value) in kept {
        doc.set_attr(span, name, value);
    }
    doc.replace_element(node, span);
    Some(span)
}

/// Strips `tags` from `node` and every descendant. An empty `tags` means
/// the node's own tag. Returns what stands where `node` was, if anything.
pub fn remove_tag_keep_attributes_recursive(
    doc: &mut Document,
    node: NodeId,
    tags: &[&str],
    insert_br: bool,
) -> Option<NodeId> {
    let own: Vec<SmolStr> = match tags {
        [] => doc.tag_name(node).map(SmolStr::new).into_iter().collect(),
        tags => tags.iter().map(|&t| SmolStr::new(t)).collect(),
    };
    let own: Vec<&str> = own.iter().map(SmolStr::as_str).collect();
    for descendant in doc.descendants(node).into_iter().rev() {
        if doc.has_tag_in(descendant, &own) {
            remove_tag_keep_attributes(doc, descendant, insert_br);
        }
    }
    if doc.has_tag_in(node, &own) {
        remove_tag_keep_attributes(doc, node, insert_br)
    } else {
        Some(node)
    }
}

/// Strips `tags` from the direct children of `parent`.
pub fn remove_tag_keep_attributes_children(
    doc: &mut Document,
    parent: NodeId,
    tags: &[&str],
    insert_br: bool,
) {
    for child in doc.children(parent).to_vec() {
        if doc.has_tag_in(child, tags) {
            remove_tag_keep_attributes(doc, child, insert_br);
        }
    }
}

/// Puts `replacement` in place of `old`, moving the children over and
/// copying attributes `replacement` does not already set.
pub fn replace_tag(doc: &mut Document, old: NodeId, replacement: NodeId) -> NodeId {
    for attr in doc.attrs(old).to_vec() {
        if doc.attr(replacement, &attr.name).is_none() {
            doc.set_attr(replacement, &attr.name, attr.value);
        }
    }
    doc.replace_element(old, replacement);
    replacement
}

// === Property and attribute removal ===

/// Removes an inline style property. A wrapper left without attributes is
/// unwrapped.
pub fn remove_property(doc: &mut Document, node: NodeId, property: &str) -> Cleanup {
    if doc.remove_style_property(node, property).is_none() {
        return Cleanup::Skipped;
    }
    clean_up_tag(doc, node, true)
}

/// [`remove_property`] on every descendant of `node`.
pub fn remove_property_children(doc: &mut Document, node: NodeId, property: &str) {
    for descendant in doc.descendants(node) {
        if doc.is_element(descendant) {
            remove_property(doc, descendant, property);
        }
    }
}

pub fn remove_property_recursively(doc: &mut Document, node: NodeId, property: &str) {
    remove_property_children(doc, node, property);
    remove_property(doc, node, property);
}

pub fn remove_attribute(doc: &mut Document, node: NodeId, attribute: &str) -> Cleanup {
    if doc.remove_attr(node, attribute).is_none() {
        return Cleanup::Skipped;
    }
    clean_up_tag(doc, node, true)
}

pub fn remove_attribute_children(doc: &mut Document, node: NodeId, attribute: &str) {
    for descendant in doc.descendants(node) {
        if doc.is_element(descendant) {
            remove_attribute(doc, descendant, attribute);
        }
    }
}

pub fn remove_attribute_recursively(doc: &mut Document, node: NodeId, attribute: &str) {
    remove_attribute_children(doc, node, attribute);
    remove_attribute(doc, node, attribute);
}

/// Drops zero margins and paddings from the inline style.
pub fn remove_default_css(doc: &mut Document, node: NodeId) {
    let mut style = doc.style(node);
    let before = style.len();
    style.retain(|name, value| {
        !((name.starts_with("margin") || name.starts_with("padding")) && is_zero_length(value))
    });
    if style.len() != before {
        doc.set_style(node, &style);
    }
}

fn is_zero_length(value: &str) -> bool {
    value.split_whitespace().all(|token| {
        let number = token.trim_end_matches(|c: char| c.is_ascii_alphabetic() || c == '%');
        number.parse::<f64>().is_ok_and(|n| n == 0.0)
    })
}

// === Passes ===

/// Runs a pass over everything below `root`, then the redundancy sweep.
pub fn normalize(doc: &mut Document, root: NodeId, pass: Pass) {
    trace!(target: "tapestry::normalize", ?pass, "normalizing");
    for node in doc.descendants(root) {
        if !doc.is_element(node) || !doc.contains(root, node) {
            continue;
        }
        match pass {
            Pass::Canonical => canonicalize_element(doc, node),
            Pass::Legacy => legacy_element(doc, node),
        }
    }
    sweep(doc, root);
}

fn is_bold(weight: &str) -> bool {
    let weight = weight.trim().to_ascii_lowercase();
    weight == "bold" || weight == "bolder" || weight.parse::<u32>().is_ok_and(|w| w >= 600)
}

fn canonicalize_element(doc: &mut Document, node: NodeId) {
    let mut style = doc.style(node);
    let mut wraps: Vec<&'static str> = Vec::new();

    if style.get("font-weight").is_some_and(is_bold) {
        style.remove("font-weight");
        wraps.push("strong");
    }
    if let Some(font_style) = style.get("font-style").map(str::to_ascii_lowercase) {
        if font_style == "italic" || font_style == "oblique" {
            style.remove("font-style");
            wraps.push("em");
        }
    }
    for property in ["text-decoration", "text-decoration-line"] {
        let Some(value) = style.get(property).map(str::to_ascii_lowercase) else {
            continue;
        };
        let mut matched = false;
        if value.contains("underline") {
            wraps.push("u");
            matched = true;
        }
        if value.contains("line-through") {
            wraps.push("strike");
            matched = true;
        }
        if matched {
            style.remove(property);
        }
    }
    if let Some(value) = style.get("vertical-align").map(str::to_ascii_lowercase) {
        let tag = match value.as_str() {
            "sub" => Some("sub"),
            "super" => Some("sup"),
            _ => None,
        };
        if let Some(tag) = tag {
            style.remove("vertical-align");
            wraps.push(tag);
        }
    }
    if let Some(align) = doc.remove_attr(node, "align") {
        let align = align.trim().to_ascii_lowercase();
        if !style.contains("text-align") && Align::from_css(&align) != Align::None {
            style.set("text-align", &align);
        }
    }
    doc.set_style(node, &style);
    remove_default_css(doc, node);

    if !doc.is_void(node) {
        for tag in wraps.into_iter().rev() {
            let already = InlineFormat::from_tag(tag).is_some_and(|format| {
                doc.inclusive_ancestors(node)
                    .any(|n| doc.has_tag_in(n, format.tags()))
            });
            if already {
                continue;
            }
            trace!(target: "tapestry::normalize", tag, "style to element");
            let wrapper = doc.create_element(tag);
            doc.wrap_children(node, wrapper);
        }
    }
    clean_up_tag(doc, node, true);
}

/// `<font size>` for a CSS `font-size`, when the value maps onto the
/// seven legacy sizes.
fn legacy_font_size(value: &str) -> Option<u8> {
    const PX: [f64; 7] = [10.0, 13.0, 16.0, 18.0, 24.0, 32.0, 48.0];
    let value = value.trim().to_ascii_lowercase();
    let keyword = match value.as_str() {
        "xx-small" | "x-small" => Some(1),
        "small" => Some(2),
        "medium" => Some(3),
        "large" => Some(4),
        "x-large" => Some(5),
        "xx-large" => Some(6),
        "xxx-large" => Some(7),
        _ => None,
    };
    if keyword.is_some() {
        return keyword;
    }
    let px = if let Some(px) = value.strip_suffix("px") {
        px.trim().parse::<f64>().ok()?
    } else if let Some(pt) = value.strip_suffix("pt") {
        pt.trim().parse::<f64>().ok()? * 4.0 / 3.0
    } else {
        return None;
    };
    PX.iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (px - **a).abs().total_cmp(&(px - **b).abs()))
        .map(|(idx, _)| idx as u8 + 1)
}

fn legacy_element(doc: &mut Document, node: NodeId) {
    let mut style = doc.style(node);
    if let Some(align) = style.remove("text-align") {
        let align = align.trim().to_ascii_lowercase();
        if Align::from_css(&align) != Align::None {
            doc.set_attr(node, "align", align);
        }
    }
    let face = style
        .remove("font-family")
        .map(|f| f.replace(['"', '\''], ""));
    let size = style.get("font-size").and_then(legacy_font_size);
    if size.is_some() {
        style.remove("font-size");
    }
    let color = style.remove("color");
    doc.set_style(node, &style);

    if (face.is_some() || size.is_some() || color.is_some()) && !doc.is_void(node) {
        let font = if doc.is_tag(node, "font") {
            node
        } else {
            let font = doc.create_element("font");
            doc.wrap_children(node, font);
            font
        };
        trace!(target: "tapestry::normalize", ?face, ?size, ?color, "style to font");
        if let Some(face) = face {
            doc.set_attr(font, "face", face);
        }
        if let Some(size) = size {
            doc.set_attr(font, "size", size.to_string());
        }
        if let Some(color) = color {
            doc.set_attr(font, "color", color);
        }
    }
    remove_default_css(doc, node);
    clean_up_tag(doc, node, true);
}

// === Redundancy sweep ===

/// Removes redundant markup below `root`: bare wrappers, formatting nested
/// in the same formatting, and markup with nothing inside.
pub fn sweep(doc: &mut Document, root: NodeId) {
    for node in doc.descendants(root) {
        if doc.is_element(node) && doc.contains(root, node) {
            clean_up_tag(doc, node, true);
        }
    }
    for node in doc.descendants(root) {
        if doc.is_element(node) && doc.contains(root, node) && is_nested_duplicate(doc, root, node)
        {
            trace!(target: "tapestry::normalize", tag = ?doc.tag_name(node), "nested duplicate");
            doc.unwrap(node);
        }
    }
    for node in doc.descendants(root).into_iter().rev() {
        if doc.has_tag_in(node, MARKUP_TAGS) && is_empty_markup(doc, node) {
            doc.detach(node);
        }
    }
}

fn is_nested_duplicate(doc: &Document, root: NodeId, node: NodeId) -> bool {
    let Some(tag) = doc.tag_name(node) else {
        return false;
    };
    let below_root = |n: &NodeId| *n != root;
    if let Some(format) = InlineFormat::from_tag(tag) {
        return doc
            .ancestors(node)
            .take_while(below_root)
            .any(|n| doc.has_tag_in(n, format.tags()));
    }
    match tag {
        "a" => doc
            .ancestors(node)
            .take_while(below_root)
            .any(|n| doc.is_tag(n, "a")),
        "font" | "span" => doc.parent(node).is_some_and(|parent| {
            parent != root && doc.is_tag(parent, tag) && doc.attrs(parent) == doc.attrs(node)
        }),
        _ => false,
    }
}

fn is_empty_markup(doc: &Document, node: NodeId) -> bool {
    doc.descendants(node)
        .into_iter()
        .all(|n| matches!(doc.data(n), NodeData::Text(t) if t.is_empty()) || doc.is_marker(n))
}

// === Sanitizer ===

const ALLOWED_TAGS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "a", "ul", "ol", "li", "b", "i", "strong", "em",
    "strike", "code", "hr", "br", "div", "span", "font", "sub", "sup", "table", "thead", "tbody",
    "tr", "th", "td", "caption", "pre",
];

/// Elements dropped together with their content.
const DROPPED_TAGS: &[&str] = &[
    "script", "style", "head", "title", "meta", "link", "iframe", "object", "embed", "noscript",
    "template",
];

const LINK_SCHEMES: &[&str] = &["http", "https", "mailto"];

/// Hex, named, and functional `rgb`/`hsl` colors.
static COLOR: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"^(?:#(?:[0-9a-f]{3,4}|[0-9a-f]{6}|[0-9a-f]{8})|[a-z]+|(?:rgba?|hsla?)\(\s*-?[0-9.]+(?:%|deg|rad|turn)?(?:\s*[,/ ]\s*-?[0-9.]+%?){2,3}\s*\))$",
    )
    .ok()
});

/// Accepts relative URLs, fragments and the allowed schemes. Browsers
/// ignore whitespace and control characters inside a scheme, so the check
/// runs with them removed.
fn link_allowed(href: &str) -> bool {
    let compact: String = href
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_ascii_control())
        .collect();
    let scheme_end = compact.find([':', '/', '?', '#']);
    match scheme_end {
        Some(end) if compact[end..].starts_with(':') => {
            let scheme = compact[..end].to_ascii_lowercase();
            LINK_SCHEMES.contains(&scheme.as_str())
        }
        _ => true,
    }
}

fn color_allowed(value: &str) -> bool {
    COLOR.as_ref().is_some_and(|re| re.is_match(value))
}

fn attribute_allowed(tag: &str, name: &str, value: &str) -> bool {
    match (tag, name) {
        (_, "style") => true,
        ("a", "href") => link_allowed(value),
        ("a", "target" | "shape") => true,
        ("font", "color" | "face" | "size") => true,
        _ => false,
    }
}

fn style_allowed(name: &str, value: &str) -> bool {
    let value = value.trim().to_ascii_lowercase();
    match name {
        "direction" => value == "ltr" || value == "rtl",
        "text-align" => matches!(value.as_str(), "left" | "center" | "right" | "justify"),
        "margin-left" | "margin-right" => true,
        "background-color" => color_allowed(&value),
        _ => false,
    }
}

/// Reduces everything below `root` to the allow-listed tags, attributes and
/// style properties, then runs the redundancy sweep.
pub fn sanitize(doc: &mut Document, root: NodeId) {
    for node in doc.descendants(root) {
        if !doc.contains(root, node) {
            continue;
        }
        if matches!(doc.data(node), NodeData::Comment(_)) {
            doc.detach(node);
            continue;
        }
        let Some(tag) = doc.tag_name(node).map(SmolStr::new) else {
            continue;
        };
        if DROPPED_TAGS.contains(&tag.as_str()) {
            doc.detach(node);
        } else if !ALLOWED_TAGS.contains(&tag.as_str()) {
            trace!(target: "tapestry::normalize", %tag, "unwrapping disallowed tag");
            doc.unwrap(node);
        } else {
            filter_attributes(doc, node, &tag);
        }
    }
    sweep(doc, root);
}

fn filter_attributes(doc: &mut Document, node: NodeId, tag: &str) {
    for attr in doc.attrs(node).to_vec() {
        if !attribute_allowed(tag, &attr.name, &attr.value) {
            doc.remove_attr(node, &attr.name);
        }
    }
    let mut style = doc.style(node);
    style.retain(style_allowed);
    doc.set_style(node, &style);
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use tapestry_dom::{inner_html, set_inner_html};

    fn run(html: &str, pass: Pass) -> String {
        let mut doc = Document::new();
        let root = doc.root();
        set_inner_html(&mut doc, root, html);
        normalize(&mut doc, root, pass);
        inner_html(&doc, root)
    }

    fn sanitized(html: &str) -> String {
        let mut doc = Document::new();
        let root = doc.root();
        set_inner_html(&mut doc, root, html);
        sanitize(&mut doc, root);
        inner_html(&doc, root)
    }

    #[test]
    fn canonical_turns_css_into_tags() {
        assert_snapshot!(
            run(
                r#"<p><span style="font-weight: bold; font-style: italic;">x</span> <span style="text-decoration: underline line-through;">y</span></p>"#,
                Pass::Canonical,
            ),
            @"<p><strong><em>x</em></strong> <u><strike>y</strike></u></p>"
        );
    }

    #[test]
    fn canonical_moves_align_into_style() {
        assert_snapshot!(
            run(r#"<p align="center">a</p>"#, Pass::Canonical),
            @r#"<p style="text-align: center;">a</p>"#
        );
    }

    #[test]
    fn numeric_weight_is_bold() {
        assert_snapshot!(
            run(r#"<span style="font-weight: 700;">a</span>"#, Pass::Canonical),
            @"<strong>a</strong>"
        );
        assert_snapshot!(
            run(r#"<span style="font-weight: 400;">a</span>"#, Pass::Canonical),
            @r#"<span style="font-weight: 400;">a</span>"#
        );
    }

    #[test]
    fn vertical_align_becomes_sub_and_sup() {
        assert_snapshot!(
            run(
                r#"<span style="vertical-align: super;">2</span><span style="vertical-align: sub;">i</span>"#,
                Pass::Canonical,
            ),
            @"<sup>2</sup><sub>i</sub>"
        );
    }

    #[test]
    fn bold_inside_bold_is_not_doubled() {
        assert_snapshot!(
            run(r#"<b><span style="font-weight: bold;">a</span></b>"#, Pass::Canonical),
            @"<b>a</b>"
        );
    }

    #[test]
    fn legacy_builds_font_elements() {
        assert_snapshot!(
            run(
                r#"<p style="text-align: right;"><span style="font-family: 'Arial'; font-size: 24px; color: red;">x</span></p>"#,
                Pass::Legacy,
            ),
            @r#"<p align="right"><font face="Arial" size="5" color="red">x</font></p>"#
        );
    }

    #[test]
    fn legacy_font_sizes() {
        assert_eq!(legacy_font_size("x-small"), Some(1));
        assert_eq!(legacy_font_size("16px"), Some(3));
        assert_eq!(legacy_font_size("12pt"), Some(3));
        assert_eq!(legacy_font_size("47px"), Some(7));
        assert_eq!(legacy_font_size("2em"), None);
    }

    #[test]
    fn zero_margins_are_dropped() {
        assert_snapshot!(
            run(
                r#"<p style="margin: 0px; padding-left: 0; margin-left: 40px;">a</p>"#,
                Pass::Canonical,
            ),
            @r#"<p style="margin-left: 40px;">a</p>"#
        );
    }

    #[test]
    fn unwrapped_div_keeps_its_line() {
        assert_snapshot!(
            run("<div>a</div><div>b</div>", Pass::Canonical),
            @"a<br>b"
        );
    }

    #[test]
    fn sweep_removes_redundancy() {
        assert_snapshot!(
            run(
                r#"<strong>a<strong>b</strong></strong><em></em><span><font color="red"><font color="red">c</font></font></span>"#,
                Pass::Canonical,
            ),
            @r#"<strong>ab</strong><font color="red">c</font>"#
        );
    }

    #[test]
    fn canonical_is_a_fixed_point() {
        let input = r#"<div style="direction: rtl;"><p align="justify"><span style="font-weight: bold; color: blue;">a</span><div>b</div>c</p></div>"#;
        let once = run(input, Pass::Canonical);
        assert_eq!(run(&once, Pass::Canonical), once);
    }

    #[test]
    fn remove_tag_demotes_styled_elements() {
        let mut doc = Document::new();
        let root = doc.root();
        set_inner_html(&mut doc, root, r#"<p style="text-align: center;" class="x">a</p><p>b</p>"#);
        let first = doc.first_child(root).unwrap();
        let second = doc.last_child(root).unwrap();
        let span = remove_tag_keep_attributes(&mut doc, first, true).unwrap();
        assert_eq!(remove_tag_keep_attributes(&mut doc, second, true), None);
        assert_eq!(doc.tag_name(span), Some("span"));
        assert_snapshot!(inner_html(&doc, root), @r#"<span style="text-align: center;">a<br></span>b"#);
    }

    #[test]
    fn remove_property_unwraps_bare_wrapper() {
        let mut doc = Document::new();
        let root = doc.root();
        set_inner_html(&mut doc, root, r#"<div style="direction: rtl;"><p style="direction: ltr;">a</p></div>"#);
        remove_property_recursively(&mut doc, root, "direction");
        assert_snapshot!(inner_html(&doc, root), @"<p>a</p>");
    }

    #[test]
    fn sanitize_applies_allow_list() {
        assert_snapshot!(
            sanitized(
                r#"<p class="MsoNormal" style="margin-left: 10px; font-size: 11pt; text-align: center;">a<o:p></o:p><u>b</u><!-- c --><script>x()</script></p>"#
            ),
            @r#"<p style="margin-left: 10px; text-align: center;">ab</p>"#
        );
    }

    #[test]
    fn sanitize_filters_link_attributes() {
        assert_snapshot!(
            sanitized(r#"<a href="javascript:alert(1)" onclick="x" target="_blank">a</a><a href="http://x" title="t">b</a>"#),
            @r#"<a target="_blank">a</a><a href="http://x">b</a>"#
        );
    }

    #[test]
    fn sanitize_keeps_only_safe_link_schemes() {
        for href in [
            "vbscript:msgbox(1)",
            "data:text/html,<script>alert(1)</script>",
            "java\tscript:alert(1)",
            " JavaScript:alert(1)",
            "\u{1}javascript:alert(1)",
            "file:///etc/passwd",
        ] {
            let mut doc = Document::new();
            let root = doc.root();
            let link = doc.create_element("a");
            doc.set_attr(link, "href", href);
            doc.append_child(root, link);
            let text = doc.create_text("x");
            doc.append_child(link, text);
            sanitize(&mut doc, root);
            assert_eq!(inner_html(&doc, root), "<a>x</a>", "href {href:?} survived");
        }
        for href in [
            "http://example.com/a?b=c",
            "HTTPS://example.com",
            "mailto:someone@example.com",
            "/relative/path:with-colon",
            "page.html",
            "#top",
            "?q=1",
        ] {
            assert!(link_allowed(href), "{href} rejected");
        }
    }

    #[test]
    fn sanitize_requires_color_backgrounds() {
        assert_snapshot!(
            sanitized(
                r#"<span style="background-color: #FFFF00;">a</span><span style="background-color: rgb(255, 0, 0);">b</span><span style="background-color: url(javascript:x);">c</span><span style="background-color: red; position: fixed;">d</span><span style="background-color: expression(alert(1));">e</span>"#
            ),
            @r#"<span style="background-color: #FFFF00;">a</span><span style="background-color: rgb(255, 0, 0);">b</span>c<span style="background-color: red;">d</span>e"#
        );
    }
}
