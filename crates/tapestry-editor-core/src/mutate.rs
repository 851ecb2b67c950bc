//! The tree mutation engine.
//!
//! Each operation applies one structural change for one formatting intent
//! at the surface's current range. With no range every operation is a
//! silent no-op.
//!
//! The range is captured as text offsets before the tree changes and put
//! back afterwards. Wrapping, unwrapping and splitting never change the text
//! content, so the restored range covers the same characters. Operations
//! that insert content place the caret themselves instead.

use tapestry_dom::{Boundary, Document, NodeId, Range, parse_fragment};
use tracing::{trace, warn};

use crate::error::{EditorError, Result};
use crate::normalize::{
    remove_attribute, remove_default_css, remove_property, remove_property_children,
    remove_property_recursively, remove_tag_keep_attributes, remove_tag_keep_attributes_children,
    remove_tag_keep_attributes_recursive, replace_tag,
};
use crate::query::{
    NodeKinds, NodesInRange, ancestor_of_type, highest_node, nearest_ancestor_of_type,
    nodes_in_range, range_container,
};
use crate::surface::Surface;
use crate::tags::{InlineFormat, LIST_CONTAINER_TAGS, MARKUP_TAGS, is_blank_text, is_block, is_inline, is_markup};
use crate::types::{CaretPosition, Direction};

/// Runs `op` on the tree and puts the range back on the same text.
fn preserving_selection<R>(
    surface: &mut Surface,
    op: impl FnOnce(&mut Document, Range) -> R,
) -> Option<R> {
    let range = surface.range()?;
    let saved = surface.text_selection();
    let out = op(surface.doc_mut(), range);
    surface.ensure_not_empty();
    if let Some(saved) = saved {
        surface.restore_text_selection(saved);
    }
    Some(out)
}

// === Surround ===

/// Wraps the selection in a `tag` element, or unwraps an existing one.
///
/// With `toggle`, an existing `tag` ancestor of the range is stripped
/// instead and whatever stands in its place comes back: a demoted `span`
/// when it carried style or alignment, else `None`. Without `toggle` the
/// existing ancestor is returned untouched.
///
/// `clean` strips `tag` from inside the new wrapper so it never nests in
/// itself. `insert_br` keeps line separation when a stripped block is
/// followed by more content.
pub fn surround_range(
    surface: &mut Surface,
    tag: &str,
    toggle: bool,
    clean: bool,
    insert_br: bool,
) -> Option<NodeId> {
    preserving_selection(surface, |doc, range| {
        surround(doc, &range, tag, toggle, clean, insert_br)
    })
    .flatten()
}

fn surround(
    doc: &mut Document,
    range: &Range,
    tag: &str,
    toggle: bool,
    clean: bool,
    insert_br: bool,
) -> Option<NodeId> {
    if let Some(existing) = nearest_ancestor_of_type(doc, range, &[tag], &[]) {
        if !toggle {
            return Some(existing);
        }
        trace!(target: "tapestry::mutate", tag, "toggling off");
        return if clean {
            remove_tag_keep_attributes_recursive(doc, existing, &[], insert_br)
        } else {
            remove_tag_keep_attributes(doc, existing, insert_br)
        };
    }

    let element = doc.create_element(tag);
    let wrapper = if range.is_collapsed() {
        let container = nearest_ancestor_of_type(doc, range, &[], MARKUP_TAGS)
            .or_else(|| highest_node(doc, range))
            .unwrap_or(doc.root());
        surround_container(doc, container, element)
    } else {
        let children = nodes_in_range(doc, range, NodesInRange::ChildrenAll, NodeKinds::all());
        let partial = nodes_in_range(
            doc,
            range,
            NodesInRange::IntersectingWithText,
            NodeKinds::ELEMENT,
        );
        match children.as_slice() {
            [] => None,
            [only] if partial.is_empty() => surround_container(doc, *only, element),
            [..] if partial.is_empty() => {
                surround_contents(doc, range, element, &children);
                Some(element)
            }
            [first, ..] => {
                let parent = doc.parent(*first)?;
                if children.len() == doc.children(parent).len() {
                    surround_container(doc, parent, element)
                } else {
                    doc.wrap_all(&children, element);
                    Some(element)
                }
            }
        }
    }?;
    trace!(target: "tapestry::mutate", tag, "wrapped");

    if clean {
        let children = doc.children(wrapper).to_vec();
        match children.as_slice() {
            [only] => {
                remove_tag_keep_attributes_recursive(doc, *only, &[tag, "div"], true);
            }
            _ => remove_tag_keep_attributes_children(doc, wrapper, &[tag], insert_br),
        }
    }
    Some(wrapper)
}

/// Wraps `container` in `element`, reusing a wrapper-only `span`/`div` and
/// climbing past parents that hold nothing else.
fn surround_container(doc: &mut Document, container: NodeId, element: NodeId) -> Option<NodeId> {
    let root = doc.root();
    if container == root {
        doc.wrap_children(root, element);
        return Some(element);
    }
    if doc.has_tag_in(container, &["span", "div"]) {
        return Some(replace_tag(doc, container, element));
    }
    let parent = doc.parent(container)?;
    if doc.children(parent).len() == 1 {
        return surround_container(doc, parent, element);
    }
    doc.wrap(container, element);
    Some(element)
}

/// `Range::surround_contents`, falling back to wrapping `children` as a
/// group when the range cuts through an element.
fn surround_contents(doc: &mut Document, range: &Range, element: NodeId, children: &[NodeId]) {
    let mut range = *range;
    if let Err(err) = range.surround_contents(doc, element) {
        warn!(target: "tapestry::mutate", %err, "surround rejected, wrapping the children instead");
        doc.wrap_all(children, element);
    }
}

/// Ensures a `tag` block around the selection and sets `property` on it,
/// clearing the same property below.
pub fn apply_property_to_range(
    surface: &mut Surface,
    property: &str,
    value: &str,
    tag: &str,
) -> Option<NodeId> {
    let element = surround_range(surface, tag, false, true, true)?;
    let doc = surface.doc_mut();
    doc.set_style_property(element, property, value);
    remove_property_children(doc, element, property);
    Some(element)
}

/// Adds `diff` pixels to a length property of the owning `tag` block. A
/// result of zero or less removes the declaration.
pub fn add_to_property(
    surface: &mut Surface,
    property: &str,
    diff: i64,
    tag: &str,
) -> Option<NodeId> {
    let element = surround_range(surface, tag, false, true, true)?;
    let doc = surface.doc_mut();
    let current = doc
        .style_property(element, property)
        .and_then(|value| leading_int(&value))
        .unwrap_or(0);
    let value = current + diff;
    if value <= 0 {
        doc.remove_style_property(element, property);
    } else {
        doc.set_style_property(element, property, &format!("{value}px"));
    }
    remove_property_children(doc, element, property);
    remove_default_css(doc, element);
    Some(element)
}

/// The integer a CSS length starts with.
pub(crate) fn leading_int(value: &str) -> Option<i64> {
    let value = value.trim();
    let end = value
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && c == '-')))
        .map_or(value.len(), |(i, _)| i);
    value[..end].parse().ok()
}

/// Removes a style property from the nodes the range covers and from the
/// nearest ancestor setting it.
pub fn remove_property_from_range(surface: &mut Surface, property: &str, mode: NodesInRange) {
    preserving_selection(surface, |doc, range| {
        if let Some(owner) = crate::query::ancestor_with_style(doc, &range, property) {
            remove_property_recursively(doc, owner, property);
        }
        for node in nodes_in_range(doc, &range, mode, NodeKinds::ELEMENT) {
            remove_property(doc, node, property);
        }
    });
}

// === Direction ===

/// Sets the text direction for the whole content. Returns whether the
/// content changed.
///
/// RTL lives on the root's sole `div` child, or on a new `div` wrapping
/// everything. Any `direction` below it is cleared first. LTR just clears
/// the property everywhere, which unwraps a direction-only wrapper.
pub fn change_direction(surface: &mut Surface, direction: Direction) -> bool {
    let before = surface.html();
    let saved = surface.text_selection();
    let doc = surface.doc_mut();
    let root = doc.root();
    match direction {
        Direction::Rtl => {
            let target = match doc.content_children(root).as_slice() {
                [only] if doc.is_tag(*only, "div") => *only,
                _ => {
                    let div = doc.create_element("div");
                    doc.wrap_children(root, div);
                    div
                }
            };
            remove_property_children(doc, target, "direction");
            doc.set_style_property(target, "direction", direction.css_value());
        }
        Direction::Ltr => remove_property_children(doc, root, "direction"),
    }
    surface.ensure_not_empty();
    if let Some(saved) = saved {
        surface.restore_text_selection(saved);
    }
    let changed = surface.html() != before;
    trace!(target: "tapestry::mutate", ?direction, changed, "direction");
    changed
}

// === Lists ===

/// Splits the children of `parent` into runs of inline content.
///
/// A `br` ends the run it belongs to and stays in it as the last node. A
/// block forms a run of its own.
pub fn group_child_nodes(doc: &Document, parent: NodeId) -> Vec<Vec<NodeId>> {
    let mut groups = Vec::new();
    let mut current = Vec::new();
    for child in doc.content_children(parent) {
        if doc.is_tag(child, "br") {
            current.push(child);
            groups.push(std::mem::take(&mut current));
        } else if is_block(doc, child) {
            if !current.is_empty() {
                groups.push(std::mem::take(&mut current));
            }
            groups.push(vec![child]);
        } else {
            current.push(child);
        }
    }
    if !current.is_empty() {
        groups.push(current);
    }
    groups
}

fn is_blank_group(doc: &Document, group: &[NodeId]) -> bool {
    group
        .iter()
        .all(|&node| is_blank_text(doc, node) || doc.is_tag(node, "br"))
}

/// Builds one `li` per group inside `list`, placed where the first group
/// started. Line breaks ending a group are dropped.
fn fill_list(doc: &mut Document, list: NodeId, groups: &[Vec<NodeId>]) -> Option<NodeId> {
    let first = *groups.first()?.first()?;
    doc.insert_before(first, list);
    let mut first_item = None;
    for group in groups {
        let li = doc.create_element("li");
        doc.append_child(list, li);
        first_item.get_or_insert(li);
        for &node in group {
            if doc.is_tag(node, "br") {
                doc.detach(node);
            } else {
                doc.append_child(li, node);
            }
        }
        for child in doc.children(li).to_vec() {
            if doc.has_tag_in(child, &["p", "div"]) {
                remove_tag_keep_attributes(doc, child, true);
            }
        }
    }
    first_item
}

/// Inserts an `ol` or `ul` for the selection.
///
/// Inside a list of the other kind the list is converted in place; inside a
/// list of the same kind its items become paragraphs again. A caret inside
/// a paragraph or heading turns that block into a one-item list; a caret in
/// bare text takes the line around it. A selection gets one item per line
/// or block it touches. The caret ends at the start of the first item.
pub fn insert_list(surface: &mut Surface, tag: &str) {
    if tag != "ol" && tag != "ul" {
        return;
    }
    let Some(range) = surface.range() else {
        return;
    };
    let doc = surface.doc();
    if let Some(existing) = nearest_ancestor_of_type(doc, &range, &["ol", "ul"], &[]) {
        let same_kind = doc.is_tag(existing, tag);
        preserving_selection(surface, |doc, _| {
            if same_kind {
                trace!(target: "tapestry::mutate", tag, "list off");
                for item in doc.children(existing).to_vec() {
                    if doc.is_tag(item, "li") {
                        let p = doc.create_element("p");
                        replace_tag(doc, item, p);
                    }
                }
                doc.unwrap(existing);
            } else {
                trace!(target: "tapestry::mutate", tag, "list kind switch");
                let list = doc.create_element(tag);
                replace_tag(doc, existing, list);
            }
        });
        return;
    }

    let doc = surface.doc_mut();
    let list = doc.create_element(tag);
    let first_item = if range.is_collapsed() {
        list_at_caret(doc, &range, list)
    } else {
        list_from_selection(doc, &range, list)
    };
    match first_item {
        Some(li) => surface.set_caret_at_beginning(li),
        None => {
            let li = surface.doc_mut().create_element("li");
            surface.doc_mut().append_child(list, li);
            insert_node_at_range(surface, list, CaretPosition::Inherit);
            surface.set_caret_at_beginning(li);
        }
    }
    trace!(target: "tapestry::mutate", tag, "list inserted");
}

fn list_container(doc: &Document, range: &Range) -> Option<NodeId> {
    let root = doc.root();
    doc.inclusive_ancestors(range.common_ancestor(doc))
        .take_while(|&n| n != root)
        .find(|&n| doc.has_tag_in(n, LIST_CONTAINER_TAGS))
        .filter(|&n| !(doc.is_tag(n, "div") && doc.style_property(n, "direction").is_some()))
}

fn list_at_caret(doc: &mut Document, range: &Range, list: NodeId) -> Option<NodeId> {
    if let Some(container) = list_container(doc, range) {
        let li = doc.create_element("li");
        if let Some(style) = doc.attr(container, "style").map(str::to_string) {
            doc.set_attr(li, "style", style);
        }
        doc.append_child(list, li);
        doc.insert_before(container, list);
        doc.move_children(container, li);
        doc.detach(container);
        return Some(li);
    }

    let parent = ancestor_of_type(doc, range.common_ancestor(doc), &[], MARKUP_TAGS)
        .unwrap_or(doc.root());
    let start = range.start();
    let item = if start.node == parent {
        doc.child(parent, start.offset)
            .or_else(|| start.offset.checked_sub(1).and_then(|i| doc.child(parent, i)))
    } else {
        doc.inclusive_ancestors(start.node)
            .find(|&n| doc.parent(n) == Some(parent))
    };
    let item = item?;
    let group = group_child_nodes(doc, parent)
        .into_iter()
        .find(|group| group.contains(&item))?;
    if is_blank_group(doc, &group) || group.iter().any(|&n| is_block(doc, n)) {
        return None;
    }
    fill_list(doc, list, &[group])
}

fn list_from_selection(doc: &mut Document, range: &Range, list: NodeId) -> Option<NodeId> {
    let children = nodes_in_range(doc, range, NodesInRange::ChildrenAll, NodeKinds::all());
    let parent = range_container(doc, range);
    let groups: Vec<Vec<NodeId>> = group_child_nodes(doc, parent)
        .into_iter()
        .filter(|group| {
            group
                .iter()
                .any(|node| !doc.is_tag(*node, "br") && children.contains(node))
        })
        .filter(|group| !is_blank_group(doc, group))
        .collect();
    let first_item = fill_list(doc, list, &groups)?;

    let root = doc.root();
    if let Some(parent) = doc.parent(list).filter(|&p| p != root) {
        if doc.has_tag_in(parent, LIST_CONTAINER_TAGS) && doc.content_children(parent) == [list] {
            remove_tag_keep_attributes(doc, parent, false);
        }
    }
    Some(first_item)
}

// === Inline formatting ===

/// Character-level formatting carried by an inline element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineTarget {
    Format(InlineFormat),
    /// A `<font>` attribute: `color`, `face` or `size`.
    FontAttr(&'static str),
    /// An inline element with a `background-color` declaration.
    Background,
    Link,
    /// Every formatting element except links.
    AnyMarkup,
}

impl InlineTarget {
    fn matches(self, doc: &Document, node: NodeId) -> bool {
        match self {
            Self::Format(format) => doc.has_tag_in(node, format.tags()),
            Self::FontAttr(attr) => {
                doc.is_tag(node, "font") && doc.attr(node, attr).is_some_and(|v| !v.is_empty())
            }
            Self::Background => {
                is_markup(doc, node)
                    && doc
                        .style_property(node, "background-color")
                        .is_some_and(|v| !v.is_empty())
            }
            Self::Link => doc.is_tag(node, "a"),
            Self::AnyMarkup => is_markup(doc, node) && !doc.is_tag(node, "a"),
        }
    }

    fn create(self, doc: &mut Document, value: &str) -> Option<NodeId> {
        match self {
            Self::Format(format) => Some(doc.create_element(format.tag())),
            Self::FontAttr(attr) => {
                let font = doc.create_element("font");
                doc.set_attr(font, attr, value);
                Some(font)
            }
            Self::Background => {
                let span = doc.create_element("span");
                doc.set_style_property(span, "background-color", value);
                Some(span)
            }
            Self::Link | Self::AnyMarkup => None,
        }
    }

    /// Takes this formatting off `node`, keeping anything else it carries.
    fn strip(self, doc: &mut Document, node: NodeId) {
        match self {
            Self::Format(_) => {
                remove_tag_keep_attributes(doc, node, false);
            }
            Self::FontAttr(attr) => {
                remove_attribute(doc, node, attr);
            }
            Self::Background => {
                remove_property(doc, node, "background-color");
            }
            Self::Link | Self::AnyMarkup => {
                doc.unwrap(node);
            }
        }
    }
}

fn matching_ancestors(
    doc: &Document,
    node: NodeId,
    target: InlineTarget,
) -> impl Iterator<Item = NodeId> + '_ {
    let root = doc.root();
    doc.inclusive_ancestors(node)
        .take_while(move |&n| n != root)
        .filter(move |&n| target.matches(doc, n))
}

/// Text nodes inside the range that carry visible characters.
fn selected_texts(doc: &Document, range: &Range) -> Vec<NodeId> {
    range.nodes(doc, |doc, node| doc.is_text(node) && !is_blank_text(doc, node))
}

/// Whether the formatting is in effect: around the caret, or on every
/// visible character of the selection.
pub fn is_inline_active(doc: &Document, range: &Range, target: InlineTarget) -> bool {
    if range.is_collapsed() {
        return matching_ancestors(doc, range.start().node, target)
            .next()
            .is_some();
    }
    let texts = selected_texts(doc, range);
    !texts.is_empty()
        && texts
            .iter()
            .all(|&text| matching_ancestors(doc, text, target).next().is_some())
}

/// Splits the boundary text nodes so the range starts and ends on text
/// node edges.
fn split_range_boundaries(doc: &mut Document, range: &Range) -> Range {
    let (start, end) = (range.start(), range.end());
    let mut new_end = end;
    if doc.is_text(end.node) && end.offset > 0 && end.offset < doc.node_length(end.node) {
        doc.split_text(end.node, end.offset);
    }
    let mut new_start = start;
    if doc.is_text(start.node) && start.offset > 0 && start.offset < doc.node_length(start.node) {
        let right = doc.split_text(start.node, start.offset);
        if end.node == start.node {
            new_end = Boundary::new(right, end.offset - start.offset);
        }
        new_start = Boundary::new(right, 0);
    }
    Range::new(doc, new_start, new_end)
}

/// Whitespace between blocks is layout, not content.
fn is_block_gap(doc: &Document, text: NodeId) -> bool {
    let gap = |sibling: Option<NodeId>| sibling.is_none_or(|s| is_block(doc, s));
    is_blank_text(doc, text) && gap(doc.previous_sibling(text)) && gap(doc.next_sibling(text))
}

/// Wraps the selected text in the target formatting.
///
/// Each selected text node is lifted to its highest inline ancestor whose
/// text is entirely selected, adjacent results are wrapped together, the
/// same formatting is stripped inside each wrapper, and wrappers left next
/// to an identical element are merged into it. A caret gets an empty
/// wrapper to type into, which the surface keeps as pending markup until it
/// receives content. Caret formatting inside a pending wrapper nests in it.
pub fn apply_inline(surface: &mut Surface, target: InlineTarget, value: &str) {
    let Some(range) = surface.range() else {
        return;
    };
    if range.is_collapsed() {
        let nested = surface
            .pending_markup()
            .is_some_and(|pending| surface.doc().contains(pending, range.start().node));
        if !nested {
            surface.drop_pending_markup();
        }
        let Some(wrapper) = target.create(surface.doc_mut(), value) else {
            return;
        };
        if !insert_node_at_range(surface, wrapper, CaretPosition::Inherit) {
            return;
        }
        surface.set_range(Range::collapsed_at(Boundary::new(wrapper, 0)));
        if !nested {
            surface.set_pending_markup(wrapper);
        }
        return;
    }
    preserving_selection(surface, |doc, range| {
        let range = split_range_boundaries(doc, &range);
        let root = doc.root();
        let mut units: Vec<NodeId> = Vec::new();
        for text in range.nodes(doc, |doc, n| doc.is_text(n) && !is_block_gap(doc, n)) {
            if doc.node_length(text) == 0 {
                continue;
            }
            let mut unit = text;
            while let Some(parent) = doc.parent(unit) {
                if parent == root || !is_inline(doc, parent) || !range.contains_node_text(doc, parent)
                {
                    break;
                }
                unit = parent;
            }
            if !units.contains(&unit) {
                units.push(unit);
            }
        }

        let mut runs: Vec<Vec<NodeId>> = Vec::new();
        for unit in units {
            match runs.last_mut() {
                Some(run) if run.last().and_then(|&l| doc.next_sibling(l)) == Some(unit) => {
                    run.push(unit);
                }
                _ => runs.push(vec![unit]),
            }
        }

        for run in runs {
            let Some(wrapper) = target.create(doc, value) else {
                return;
            };
            doc.wrap_all(&run, wrapper);
            for inner in doc.descendants(wrapper).into_iter().rev() {
                if target.matches(doc, inner) {
                    target.strip(doc, inner);
                }
            }
            merge_with_siblings(doc, wrapper);
        }
        trace!(target: "tapestry::mutate", ?target, "applied");
    });
}

fn same_element(doc: &Document, a: NodeId, b: NodeId) -> bool {
    doc.is_element(a) && doc.tag_name(a) == doc.tag_name(b) && doc.attrs(a) == doc.attrs(b)
}

fn merge_with_siblings(doc: &mut Document, wrapper: NodeId) {
    let mut wrapper = wrapper;
    if let Some(prev) = doc.previous_sibling(wrapper).filter(|&p| same_element(doc, p, wrapper)) {
        doc.move_children(wrapper, prev);
        doc.detach(wrapper);
        wrapper = prev;
    }
    if let Some(next) = doc.next_sibling(wrapper).filter(|&n| same_element(doc, n, wrapper)) {
        doc.move_children(next, wrapper);
        doc.detach(next);
    }
}

/// Splits every element from `point` up to and including `top`, so that
/// the content after `point` moves into shallow copies placed after each.
/// Nothing is split at an element's very start or end.
fn split_up_to(doc: &mut Document, top: NodeId, point: Boundary) {
    let mut point = point;
    loop {
        let node = point.node;
        let len = doc.children(node).len();
        let next = if point.offset == 0 {
            Boundary::before(doc, node)
        } else {
            if point.offset < len {
                let copy = doc.shallow_clone(node);
                let moving = doc.children(node)[point.offset..].to_vec();
                doc.insert_after(node, copy);
                for child in moving {
                    doc.append_child(copy, child);
                }
            }
            Boundary::after(doc, node)
        };
        if node == top {
            return;
        }
        match next {
            Some(next) => point = next,
            None => return,
        }
    }
}

/// Takes the target formatting off the selection.
///
/// Formatting elements reaching past the selection are split at its edges
/// first, so only the selected characters lose the formatting. At a caret
/// the whole element around it is unwrapped.
pub fn remove_inline(surface: &mut Surface, target: InlineTarget) {
    preserving_selection(surface, |doc, range| {
        if range.is_collapsed() {
            let found: Vec<NodeId> = matching_ancestors(doc, range.start().node, target).collect();
            for node in found {
                target.strip(doc, node);
            }
            return;
        }
        let range = split_range_boundaries(doc, &range);
        let texts = selected_texts(doc, &range);
        let mut tops: Vec<NodeId> = Vec::new();
        for &text in &texts {
            if let Some(top) = matching_ancestors(doc, text, target).last() {
                if !tops.contains(&top) {
                    tops.push(top);
                }
            }
        }
        for top in tops {
            let inside: Vec<NodeId> = texts
                .iter()
                .copied()
                .filter(|&t| doc.contains(top, t))
                .collect();
            let (Some(&first), Some(&last)) = (inside.first(), inside.last()) else {
                continue;
            };
            if let Some(after) = Boundary::after(doc, last) {
                split_up_to(doc, top, after);
            }
            if let Some(before) = Boundary::before(doc, first) {
                split_up_to(doc, top, before);
            }
        }
        for &text in &texts {
            let found: Vec<NodeId> = matching_ancestors(doc, text, target).collect();
            for node in found {
                target.strip(doc, node);
            }
        }
        trace!(target: "tapestry::mutate", ?target, "removed");
    });
}

/// Applies or removes an inline format depending on whether the whole
/// selection already has it. Subscript and superscript exclude each other.
pub fn toggle_format(surface: &mut Surface, format: InlineFormat) {
    let Some(range) = surface.range() else {
        return;
    };
    let target = InlineTarget::Format(format);
    if is_inline_active(surface.doc(), &range, target) {
        remove_inline(surface, target);
        return;
    }
    if let Some(other) = format.exclusive_with() {
        remove_inline(surface, InlineTarget::Format(other));
    }
    apply_inline(surface, target, "");
}

/// Replaces the value of a font attribute or background over the
/// selection. An empty value only clears it.
pub fn set_inline_value(surface: &mut Surface, target: InlineTarget, value: &str) {
    remove_inline(surface, target);
    if !value.trim().is_empty() {
        apply_inline(surface, target, value.trim());
    }
}

// === Insertion ===

/// Replaces the selection with `node` and places the caret.
pub fn insert_node_at_range(surface: &mut Surface, node: NodeId, caret: CaretPosition) -> bool {
    let Some(mut range) = surface.range() else {
        return false;
    };
    let doc = surface.doc_mut();
    range.delete_contents(doc);
    if let Err(err) = range.insert_node(doc, node) {
        warn!(target: "tapestry::mutate", %err, "could not insert node");
        return false;
    }
    match caret {
        CaretPosition::Inherit => surface.set_range(range),
        CaretPosition::Before => surface.set_caret_before(node),
        CaretPosition::After => surface.set_caret_after(node),
    }
    true
}

/// Parses `html` and inserts the nodes at the selection, caret after them.
pub fn insert_html_at_range(surface: &mut Surface, html: &str) {
    let doc = surface.doc_mut();
    let holder = doc.create_element("span");
    for node in parse_fragment(doc, html) {
        doc.append_child(holder, node);
    }
    if !insert_node_at_range(surface, holder, CaretPosition::After) {
        return;
    }
    let doc = surface.doc_mut();
    let Some(before) = Boundary::before(doc, holder) else {
        return;
    };
    let inserted = doc.unwrap(holder);
    match inserted.last() {
        Some(&last) => surface.set_caret_after(last),
        None => surface.set_range(Range::collapsed_at(before)),
    }
}

fn last_content_child(doc: &Document, parent: NodeId) -> Option<NodeId> {
    doc.content_children(parent)
        .into_iter()
        .rev()
        .find(|&child| doc.text(child).is_none_or(|t| !t.is_empty()))
}

/// Inserts a `br`. When it ends up last in its block a second one follows,
/// with the caret between them, so the new line is rendered.
pub fn insert_break_at_range(surface: &mut Surface) {
    let br = surface.doc_mut().create_element("br");
    if !insert_node_at_range(surface, br, CaretPosition::After) {
        return;
    }
    let doc = surface.doc();
    let Some(parent) = doc.parent(br) else {
        return;
    };
    let block = parent == doc.root() || is_block(doc, parent);
    if block && last_content_child(doc, parent) == Some(br) {
        let filler = surface.doc_mut().create_element("br");
        insert_node_at_range(surface, filler, CaretPosition::Before);
    }
}

pub fn insert_horizontal_rule(surface: &mut Surface) {
    let hr = surface.doc_mut().create_element("hr");
    insert_node_at_range(surface, hr, CaretPosition::After);
}

/// Links the selection to `url`.
///
/// An empty URL or the dialog placeholder is rejected. At a caret a new
/// link with `text` is inserted; otherwise the selection is wrapped.
pub fn create_link(
    surface: &mut Surface,
    url: &str,
    target: &str,
    placeholder: &str,
    text: &str,
) -> Result<()> {
    let url = url.trim();
    if url.is_empty() || url == placeholder.trim() {
        return Err(EditorError::InvalidLinkUrl {
            placeholder: placeholder.to_string(),
        });
    }
    let Some(range) = surface.range() else {
        return Ok(());
    };
    let doc = surface.doc_mut();
    let link = doc.create_element("a");
    doc.set_attr(link, "href", url);
    if !target.is_empty() {
        doc.set_attr(link, "target", target);
    }
    doc.set_attr(link, "shape", "rect");

    if range.is_collapsed() {
        let label = doc.create_text(text);
        doc.append_child(link, label);
        insert_node_at_range(surface, link, CaretPosition::After);
    } else {
        let children = nodes_in_range(doc, &range, NodesInRange::ChildrenAll, NodeKinds::all());
        surround_contents(doc, &range, link, &children);
        surface.select_node_contents(link);
    }
    trace!(target: "tapestry::mutate", url, "link created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use tapestry_dom::inner_html;

    fn surface(html: &str, start: usize, end: usize) -> Surface {
        let mut surface = Surface::from_html(html);
        surface.select_text(start, end);
        surface
    }

    fn bold() -> InlineTarget {
        InlineTarget::Format(InlineFormat::Bold)
    }

    #[test]
    fn bold_wraps_selected_word() {
        let mut s = surface("<p>Hello world</p>", 6, 11);
        toggle_format(&mut s, InlineFormat::Bold);
        assert_snapshot!(s.html(), @"<p>Hello <strong>world</strong></p>");
        assert_eq!(s.selected_text(), "world");
        let range = s.range().unwrap();
        assert!(is_inline_active(s.doc(), &range, bold()));
    }

    #[test]
    fn bold_twice_restores_tree() {
        let mut s = surface("<p>Hello world</p>", 6, 11);
        toggle_format(&mut s, InlineFormat::Bold);
        toggle_format(&mut s, InlineFormat::Bold);
        assert_snapshot!(s.html(), @"<p>Hello world</p>");
    }

    #[test]
    fn bold_absorbs_inner_bold() {
        let mut s = surface("<p>a<b>bc</b>d</p>", 0, 4);
        toggle_format(&mut s, InlineFormat::Italic);
        assert_snapshot!(s.html(), @"<p><em>a<b>bc</b>d</em></p>");
        let mut s = surface("<p>a<strong>bc</strong>d</p>", 0, 4);
        toggle_format(&mut s, InlineFormat::Bold);
        assert_snapshot!(s.html(), @"<p><strong>abcd</strong></p>");
    }

    #[test]
    fn partial_unbold_splits_the_element() {
        let mut s = surface("<p><strong>abcdef</strong></p>", 2, 4);
        toggle_format(&mut s, InlineFormat::Bold);
        assert_snapshot!(s.html(), @"<p><strong>ab</strong>cd<strong>ef</strong></p>");
        assert_eq!(s.selected_text(), "cd");
    }

    #[test]
    fn bold_across_paragraphs_wraps_each() {
        let mut s = surface("<p>ab</p><p>cd</p>", 1, 3);
        toggle_format(&mut s, InlineFormat::Bold);
        assert_snapshot!(s.html(), @"<p>a<strong>b</strong></p><p><strong>c</strong>d</p>");
    }

    #[test]
    fn superscript_replaces_subscript() {
        let mut s = surface("<p>x<sub>2</sub></p>", 1, 2);
        toggle_format(&mut s, InlineFormat::Superscript);
        assert_snapshot!(s.html(), @"<p>x<sup>2</sup></p>");
    }

    #[test]
    fn caret_bold_waits_for_content() {
        let mut s = surface("<p>ab</p>", 1, 1);
        toggle_format(&mut s, InlineFormat::Bold);
        assert_snapshot!(s.html(), @"<p>ab</p>");
        assert_snapshot!(inner_html(s.doc(), s.root()), @"<p>a<strong></strong>b</p>");
        insert_html_at_range(&mut s, "x");
        assert_eq!(s.pending_markup(), None);
        assert_snapshot!(s.html(), @"<p>a<strong>x</strong>b</p>");
    }

    #[test]
    fn caret_bold_toggles_back_off() {
        let mut s = surface("<p>ab</p>", 1, 1);
        toggle_format(&mut s, InlineFormat::Bold);
        toggle_format(&mut s, InlineFormat::Bold);
        assert_snapshot!(inner_html(s.doc(), s.root()), @"<p>ab</p>");
    }

    #[test]
    fn caret_formats_nest_in_the_pending_wrapper() {
        let mut s = surface("<p>ab</p>", 1, 1);
        toggle_format(&mut s, InlineFormat::Bold);
        toggle_format(&mut s, InlineFormat::Italic);
        assert_snapshot!(inner_html(s.doc(), s.root()), @"<p>a<strong><em></em></strong>b</p>");
        s.select_text(0, 0);
        assert_snapshot!(inner_html(s.doc(), s.root()), @"<p>ab</p>");
    }

    #[test]
    fn moving_the_caret_drops_unused_markup() {
        let mut s = surface("<p>ab</p>", 1, 1);
        toggle_format(&mut s, InlineFormat::Bold);
        s.select_text(0, 0);
        toggle_format(&mut s, InlineFormat::Italic);
        assert_snapshot!(inner_html(s.doc(), s.root()), @"<p><em></em>ab</p>");
        s.select_text(2, 2);
        assert_snapshot!(inner_html(s.doc(), s.root()), @"<p>ab</p>");
        assert_eq!(s.selected_text(), "");
        assert_eq!(s.text_selection().map(|sel| sel.start.offset), Some(2));
    }

    #[test]
    fn forecolor_replaces_previous_color() {
        let mut s = surface(r#"<p><font color="red">abc</font></p>"#, 0, 3);
        set_inline_value(&mut s, InlineTarget::FontAttr("color"), "blue");
        assert_snapshot!(s.html(), @r#"<p><font color="blue">abc</font></p>"#);
        set_inline_value(&mut s, InlineTarget::FontAttr("color"), "");
        assert_snapshot!(s.html(), @"<p>abc</p>");
    }

    #[test]
    fn backcolor_uses_styled_span() {
        let mut s = surface("<p>abc</p>", 0, 2);
        set_inline_value(&mut s, InlineTarget::Background, "yellow");
        assert_snapshot!(s.html(), @r#"<p><span style="background-color: yellow;">ab</span>c</p>"#);
    }

    #[test]
    fn remove_format_keeps_links() {
        let mut s = surface(r#"<p><a href="x"><strong><em>ab</em></strong></a></p>"#, 0, 2);
        remove_inline(&mut s, InlineTarget::AnyMarkup);
        assert_snapshot!(s.html(), @r#"<p><a href="x">ab</a></p>"#);
        remove_inline(&mut s, InlineTarget::Link);
        assert_snapshot!(s.html(), @"<p>ab</p>");
    }

    #[test]
    fn paragraph_toggles() {
        let mut s = surface("Hello world", 2, 2);
        let wrapper = surround_range(&mut s, "p", true, true, true);
        assert!(wrapper.is_some());
        assert_snapshot!(s.html(), @"<p>Hello world</p>");
        surround_range(&mut s, "p", true, true, true);
        assert_snapshot!(s.html(), @"Hello world");
    }

    #[test]
    fn alignment_replaces_previous_value() {
        let mut s = surface("<p>abc</p>", 1, 2);
        apply_property_to_range(&mut s, "text-align", "center", "p");
        apply_property_to_range(&mut s, "text-align", "right", "p");
        assert_snapshot!(s.html(), @r#"<p style="text-align: right;">abc</p>"#);
    }

    #[test]
    fn alignment_wraps_bare_text() {
        let mut s = surface("abc", 1, 2);
        apply_property_to_range(&mut s, "text-align", "center", "p");
        assert_snapshot!(s.html(), @r#"<p style="text-align: center;">abc</p>"#);
    }

    #[test]
    fn indent_and_outdent() {
        let mut s = surface("<p>abc</p>", 1, 1);
        add_to_property(&mut s, "margin-left", 40, "p");
        add_to_property(&mut s, "margin-left", 40, "p");
        assert_snapshot!(s.html(), @r#"<p style="margin-left: 80px;">abc</p>"#);
        add_to_property(&mut s, "margin-left", -40, "p");
        add_to_property(&mut s, "margin-left", -40, "p");
        assert_snapshot!(s.html(), @"<p>abc</p>");
    }

    #[test]
    fn leading_int_parses_like_parse_int() {
        assert_eq!(leading_int("40px"), Some(40));
        assert_eq!(leading_int("-8px"), Some(-8));
        assert_eq!(leading_int("1.5em"), Some(1));
        assert_eq!(leading_int("auto"), None);
    }

    #[test]
    fn direction_round_trip() {
        let mut s = surface("<p>abc</p>", 1, 1);
        assert!(change_direction(&mut s, Direction::Rtl));
        assert_snapshot!(s.html(), @r#"<div style="direction: rtl;"><p>abc</p></div>"#);
        assert!(!change_direction(&mut s, Direction::Rtl));
        assert!(change_direction(&mut s, Direction::Ltr));
        assert_snapshot!(s.html(), @"<p>abc</p>");
    }

    #[test]
    fn caret_list_converts_paragraph() {
        let mut s = surface("<p>Item</p>", 2, 2);
        insert_list(&mut s, "ol");
        assert_snapshot!(s.html(), @"<ol><li>Item</li></ol>");
        insert_list(&mut s, "ul");
        assert_snapshot!(s.html(), @"<ul><li>Item</li></ul>");
        insert_list(&mut s, "ul");
        assert_snapshot!(s.html(), @"<p>Item</p>");
    }

    #[test]
    fn selection_list_uses_lines() {
        let mut s = surface("one<br>two<br>three", 1, 9);
        insert_list(&mut s, "ul");
        assert_snapshot!(s.html(), @"<ul><li>one</li><li>two</li><li>three</li></ul>");
        let range = s.range().unwrap();
        assert_eq!(s.doc().text(range.start().node), Some("one"));
    }

    #[test]
    fn selection_list_uses_paragraphs() {
        let mut s = surface("<p>a</p><p>b</p><p>c</p>", 0, 2);
        insert_list(&mut s, "ol");
        assert_snapshot!(s.html(), @"<ol><li>a</li><li>b</li></ol><p>c</p>");
    }

    #[test]
    fn list_in_empty_editor() {
        let mut s = surface("", 0, 0);
        insert_list(&mut s, "ul");
        assert_snapshot!(s.html(), @"<ul><li></li></ul>");
    }

    #[test]
    fn line_break_at_end_doubles() {
        let mut s = surface("abc", 3, 3);
        insert_break_at_range(&mut s);
        assert_snapshot!(s.html(), @"abc<br><br>");
        let mut s = surface("abc", 1, 1);
        insert_break_at_range(&mut s);
        assert_snapshot!(s.html(), @"a<br>bc");
    }

    #[test]
    fn html_insertion_replaces_selection() {
        let mut s = surface("<p>abc</p>", 1, 2);
        insert_html_at_range(&mut s, "<em>x</em>y");
        assert_snapshot!(s.html(), @"<p>a<em>x</em>yc</p>");
    }

    #[test]
    fn link_validation() {
        let mut s = surface("<p>abc</p>", 0, 3);
        let err = create_link(&mut s, "https://", "_blank", "https://", "new link").unwrap_err();
        assert!(matches!(err, EditorError::InvalidLinkUrl { .. }));
        assert!(create_link(&mut s, "  ", "", "https://", "new link").is_err());
        assert_snapshot!(s.html(), @"<p>abc</p>");
    }

    #[test]
    fn link_wraps_selection_or_inserts_text() {
        let mut s = surface("<p>abc</p>", 0, 3);
        create_link(&mut s, "http://x", "_blank", "https://", "new link").unwrap();
        assert_snapshot!(s.html(), @r#"<p><a href="http://x" target="_blank" shape="rect">abc</a></p>"#);
        let mut s = surface("<p>abc</p>", 3, 3);
        create_link(&mut s, "http://y", "", "https://", "new link").unwrap();
        assert_snapshot!(s.html(), @r#"<p>abc<a href="http://y" shape="rect">new link</a></p>"#);
    }

    #[test]
    fn no_range_is_a_no_op() {
        let mut s = Surface::from_html("<p>abc</p>");
        toggle_format(&mut s, InlineFormat::Bold);
        insert_list(&mut s, "ol");
        assert_eq!(surround_range(&mut s, "p", true, true, true), None);
        assert_snapshot!(s.html(), @"<p>abc</p>");
    }
}
