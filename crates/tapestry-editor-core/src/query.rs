//! Read-only questions about a range: which nodes it touches, which element
//! owns it, and what formatting is in effect there.
//!
//! Every lookup stops below the editor root. The root is never reported as
//! an ancestor, so callers fall back to it explicitly where that makes sense.

use bitflags::bitflags;
use tapestry_dom::{Document, NodeId, Range};

bitflags! {
    /// Node kinds a range query reports.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct NodeKinds: u8 {
        const ELEMENT = 1;
        const TEXT = 1 << 1;
    }
}

impl NodeKinds {
    fn matches(self, doc: &Document, node: NodeId) -> bool {
        (self.contains(Self::ELEMENT) && doc.is_element(node))
            || (self.contains(Self::TEXT) && doc.is_text(node))
    }
}

/// Which of the nodes a range touches to report.
///
/// "Contents" containment checks the node's own start and end points;
/// "text" containment checks its first and last text characters, so a node
/// whose text is fully selected counts as inside even when the range
/// boundaries sit within its first or last text node's parent tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodesInRange {
    /// Every node the range touches.
    All,
    /// Nodes whose contents lie within the range.
    Inside,
    /// Nodes whose text lies within the range.
    InsideWithText,
    /// Nodes only partly covered, by contents.
    Intersecting,
    /// Nodes only partly covered, by text.
    IntersectingWithText,
    /// Direct children of the element owning the range.
    ChildrenAll,
    ChildrenInside,
    ChildrenInsideWithText,
}

/// The first element at or above `node`, below the root, whose tag is in
/// `names` (any tag when empty) and not in `blacklist`.
pub fn ancestor_of_type(
    doc: &Document,
    node: NodeId,
    names: &[&str],
    blacklist: &[&str],
) -> Option<NodeId> {
    let root = doc.root();
    doc.inclusive_ancestors(node)
        .take_while(|&n| n != root)
        .find(|&n| {
            doc.is_element(n)
                && (names.is_empty() || doc.has_tag_in(n, names))
                && !doc.has_tag_in(n, blacklist)
        })
}

/// Walks up from the range's common ancestor.
pub fn nearest_ancestor_of_type(
    doc: &Document,
    range: &Range,
    names: &[&str],
    blacklist: &[&str],
) -> Option<NodeId> {
    ancestor_of_type(doc, range.common_ancestor(doc), names, blacklist)
}

/// The element owning the range, or the root.
pub fn range_container(doc: &Document, range: &Range) -> NodeId {
    nearest_ancestor_of_type(doc, range, &[], &[]).unwrap_or(doc.root())
}

/// Nodes the range touches, in document order, filtered by `mode` and `kinds`.
pub fn nodes_in_range(
    doc: &Document,
    range: &Range,
    mode: NodesInRange,
    kinds: NodeKinds,
) -> Vec<NodeId> {
    let container = range_container(doc, range);
    range.nodes(doc, |doc, node| {
        if !kinds.matches(doc, node) {
            return false;
        }
        match mode {
            NodesInRange::All => true,
            NodesInRange::Inside => range.contains_node_contents(doc, node),
            NodesInRange::InsideWithText => range.contains_node_text(doc, node),
            NodesInRange::Intersecting => !range.contains_node_contents(doc, node),
            NodesInRange::IntersectingWithText => !range.contains_node_text(doc, node),
            NodesInRange::ChildrenAll => doc.parent(node) == Some(container),
            NodesInRange::ChildrenInside => {
                doc.parent(node) == Some(container) && range.contains_node_contents(doc, node)
            }
            NodesInRange::ChildrenInsideWithText => {
                doc.parent(node) == Some(container) && range.contains_node_text(doc, node)
            }
        }
    })
}

/// The single child the range covers exactly, when nothing is only partly
/// selected. `names` restricts the tag when not empty.
pub fn exact_node_in_range(doc: &Document, range: &Range, names: &[&str]) -> Option<NodeId> {
    let children = nodes_in_range(doc, range, NodesInRange::ChildrenAll, NodeKinds::all());
    let partial = nodes_in_range(doc, range, NodesInRange::Intersecting, NodeKinds::ELEMENT);
    match children.as_slice() {
        [only] if partial.is_empty() && (names.is_empty() || doc.has_tag_in(*only, names)) => {
            Some(*only)
        }
        _ => None,
    }
}

/// The topmost ancestor of the range directly below the root. `None` when
/// the range sits in the root itself.
pub fn highest_node(doc: &Document, range: &Range) -> Option<NodeId> {
    let root = doc.root();
    doc.inclusive_ancestors(range.common_ancestor(doc))
        .take_while(|&n| n != root)
        .last()
}

pub fn ancestor_with_style(doc: &Document, range: &Range, property: &str) -> Option<NodeId> {
    let container = nearest_ancestor_of_type(doc, range, &[], &[])?;
    ancestor_of(doc, container, |n| {
        doc.style_property(n, property).is_some_and(|v| !v.is_empty())
    })
}

/// The inline `property` value of the nearest ancestor that sets it, or an
/// empty string.
pub fn effective_style_value(doc: &Document, range: &Range, property: &str) -> String {
    ancestor_with_style(doc, range, property)
        .and_then(|n| doc.style_property(n, property))
        .unwrap_or_default()
}

pub fn ancestor_with_attribute(doc: &Document, range: &Range, attribute: &str) -> Option<NodeId> {
    let container = nearest_ancestor_of_type(doc, range, &[], &[])?;
    ancestor_of(doc, container, |n| {
        doc.attr(n, attribute).is_some_and(|v| !v.is_empty())
    })
}

pub fn effective_attribute_value(doc: &Document, range: &Range, attribute: &str) -> String {
    ancestor_with_attribute(doc, range, attribute)
        .and_then(|n| doc.attr(n, attribute))
        .map(str::to_string)
        .unwrap_or_default()
}

fn ancestor_of(doc: &Document, node: NodeId, pred: impl Fn(NodeId) -> bool) -> Option<NodeId> {
    let root = doc.root();
    doc.inclusive_ancestors(node)
        .take_while(|&n| n != root)
        .find(|&n| pred(n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Surface;

    fn selected(html: &str, start: usize, end: usize) -> (Surface, Range) {
        let mut surface = Surface::from_html(html);
        surface.select_text(start, end);
        let range = surface.range().unwrap();
        (surface, range)
    }

    #[test]
    fn nearest_ancestor_respects_blacklist() {
        let (surface, range) = selected("<p>a<strong>bc</strong></p>", 1, 2);
        let doc = surface.doc();
        let found = nearest_ancestor_of_type(doc, &range, &[], &["strong"]).unwrap();
        assert_eq!(doc.tag_name(found), Some("p"));
        let strong = nearest_ancestor_of_type(doc, &range, &["strong"], &[]).unwrap();
        assert_eq!(doc.tag_name(strong), Some("strong"));
    }

    #[test]
    fn root_is_never_an_ancestor() {
        let (surface, range) = selected("plain", 1, 2);
        assert_eq!(nearest_ancestor_of_type(surface.doc(), &range, &[], &[]), None);
        let highest = highest_node(surface.doc(), &range).unwrap();
        assert!(surface.doc().is_text(highest));
        assert_eq!(range_container(surface.doc(), &range), surface.root());
    }

    #[test]
    fn text_containment_differs_from_contents_containment() {
        // The range starts inside <b> at the start of its text, so the
        // element's own start point lies outside it.
        let (surface, range) = selected("<p>a<b>bc</b>d</p>", 1, 4);
        let doc = surface.doc();
        let inside = nodes_in_range(doc, &range, NodesInRange::Inside, NodeKinds::ELEMENT);
        let with_text =
            nodes_in_range(doc, &range, NodesInRange::InsideWithText, NodeKinds::ELEMENT);
        assert!(inside.is_empty());
        assert_eq!(with_text.len(), 1);
        assert_eq!(doc.tag_name(with_text[0]), Some("b"));
    }

    #[test]
    fn children_are_relative_to_the_owning_element() {
        let (surface, range) = selected("<p>ab<i>cd</i>ef</p>", 1, 5);
        let doc = surface.doc();
        let children = nodes_in_range(doc, &range, NodesInRange::ChildrenAll, NodeKinds::all());
        assert_eq!(children.len(), 3);
        assert!(children.iter().all(|&c| doc.tag_name(doc.parent(c).unwrap()) == Some("p")));
    }

    #[test]
    fn exact_node_needs_a_single_whole_child() {
        let mut surface = Surface::from_html("<p>one</p><p>two</p>");
        let root = surface.root();
        let first = surface.doc().first_child(root).unwrap();
        let range = Range::around_node(surface.doc(), first).unwrap();
        surface.set_range(range);
        assert_eq!(exact_node_in_range(surface.doc(), &range, &["p"]), Some(first));
        assert_eq!(exact_node_in_range(surface.doc(), &range, &["div"]), None);
    }

    #[test]
    fn effective_style_walks_up() {
        let (surface, range) = selected(
            r#"<div style="direction: rtl;"><p style="text-align: center;">ab</p></div>"#,
            0,
            1,
        );
        let doc = surface.doc();
        assert_eq!(effective_style_value(doc, &range, "text-align"), "center");
        assert_eq!(effective_style_value(doc, &range, "direction"), "rtl");
        assert_eq!(effective_style_value(doc, &range, "color"), "");
    }

    #[test]
    fn effective_attribute_walks_up() {
        let (surface, range) = selected(r#"<font face="Arial"><b>ab</b></font>"#, 0, 2);
        assert_eq!(effective_attribute_value(surface.doc(), &range, "face"), "Arial");
        assert_eq!(effective_attribute_value(surface.doc(), &range, "size"), "");
    }
}
