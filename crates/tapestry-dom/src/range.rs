//! DOM-style ranges over a `Document`.
//!
//! Boundary points follow the DOM model: for character data the offset counts
//! characters, for elements it counts children. The containment and node
//! enumeration helpers follow the semantics rich-text editors have long relied
//! on from the browser (`containsNodeContents`, `intersectsNode`, `getNodes`).

use std::cmp::Ordering;

use crate::document::{Document, NodeId};
use crate::error::DomError;

/// A point in the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Boundary {
    pub node: NodeId,
    pub offset: usize,
}

impl Boundary {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }

    /// The point just before `node` in its parent.
    pub fn before(doc: &Document, node: NodeId) -> Option<Self> {
        Some(Self::new(doc.parent(node)?, doc.index_of(node)?))
    }

    /// The point just after `node` in its parent.
    pub fn after(doc: &Document, node: NodeId) -> Option<Self> {
        Some(Self::new(doc.parent(node)?, doc.index_of(node)? + 1))
    }
}

/// Orders two nodes by document position. Ancestors sort before descendants.
fn tree_order(doc: &Document, a: NodeId, b: NodeId) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    doc.tree_path(a).cmp(&doc.tree_path(b))
}

/// Compares two boundary points using the DOM algorithm.
pub fn compare_points(doc: &Document, a: Boundary, b: Boundary) -> Ordering {
    if a.node == b.node {
        return a.offset.cmp(&b.offset);
    }
    if tree_order(doc, a.node, b.node) == Ordering::Greater {
        return compare_points(doc, b, a).reverse();
    }
    if doc.contains(a.node, b.node) {
        let child = doc
            .inclusive_ancestors(b.node)
            .find(|&n| doc.parent(n) == Some(a.node));
        if let Some(idx) = child.and_then(|child| doc.index_of(child)) {
            if idx < a.offset {
                return Ordering::Greater;
            }
        }
    }
    Ordering::Less
}

/// A pair of ordered boundary points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Range {
    start: Boundary,
    end: Boundary,
}

impl Range {
    /// Builds a range, swapping the points if they are out of order.
    pub fn new(doc: &Document, start: Boundary, end: Boundary) -> Self {
        if compare_points(doc, start, end) == Ordering::Greater {
            Self {
                start: end,
                end: start,
            }
        } else {
            Self { start, end }
        }
    }

    pub fn collapsed_at(point: Boundary) -> Self {
        Self {
            start: point,
            end: point,
        }
    }

    /// A range covering `node` itself.
    pub fn around_node(doc: &Document, node: NodeId) -> Option<Self> {
        Some(Self {
            start: Boundary::before(doc, node)?,
            end: Boundary::after(doc, node)?,
        })
    }

    /// A range covering the contents of `node`.
    pub fn node_contents(doc: &Document, node: NodeId) -> Self {
        Self {
            start: Boundary::new(node, 0),
            end: Boundary::new(node, doc.node_length(node)),
        }
    }

    pub fn start(&self) -> Boundary {
        self.start
    }

    pub fn end(&self) -> Boundary {
        self.end
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Moves the start. If it passes the end, the range collapses to it.
    pub fn set_start(&mut self, doc: &Document, point: Boundary) {
        self.start = point;
        if compare_points(doc, self.start, self.end) == Ordering::Greater {
            self.end = point;
        }
    }

    /// Moves the end. If it precedes the start, the range collapses to it.
    pub fn set_end(&mut self, doc: &Document, point: Boundary) {
        self.end = point;
        if compare_points(doc, self.start, self.end) == Ordering::Greater {
            self.start = point;
        }
    }

    pub fn collapse(&mut self, to_start: bool) {
        if to_start {
            self.end = self.start;
        } else {
            self.start = self.end;
        }
    }

    pub fn select_node(&mut self, doc: &Document, node: NodeId) {
        if let Some(range) = Self::around_node(doc, node) {
            *self = range;
        }
    }

    pub fn select_node_contents(&mut self, doc: &Document, node: NodeId) {
        *self = Self::node_contents(doc, node);
    }

    pub fn collapse_before(&mut self, doc: &Document, node: NodeId) {
        if let Some(point) = Boundary::before(doc, node) {
            *self = Self::collapsed_at(point);
        }
    }

    pub fn collapse_after(&mut self, doc: &Document, node: NodeId) {
        if let Some(point) = Boundary::after(doc, node) {
            *self = Self::collapsed_at(point);
        }
    }

    /// Deepest node containing both boundary points.
    pub fn common_ancestor(&self, doc: &Document) -> NodeId {
        doc.inclusive_ancestors(self.start.node)
            .find(|&ancestor| doc.contains(ancestor, self.end.node))
            .unwrap_or(self.start.node)
    }

    pub fn contains_point(&self, doc: &Document, point: Boundary) -> bool {
        compare_points(doc, self.start, point) != Ordering::Greater
            && compare_points(doc, point, self.end) != Ordering::Greater
    }

    /// Both the start and end of the node's contents lie within the range.
    pub fn contains_node_contents(&self, doc: &Document, node: NodeId) -> bool {
        self.contains_point(doc, Boundary::new(node, 0))
            && self.contains_point(doc, Boundary::new(node, doc.node_length(node)))
    }

    /// The node, including its own boundaries, lies within the range.
    pub fn contains_node(&self, doc: &Document, node: NodeId) -> bool {
        match (Boundary::before(doc, node), Boundary::after(doc, node)) {
            (Some(before), Some(after)) => {
                self.contains_point(doc, before) && self.contains_point(doc, after)
            }
            _ => self.contains_node_contents(doc, node),
        }
    }

    /// All text inside the node lies within the range, from the start of its
    /// first text descendant to the end of its last. Nodes without text fall
    /// back to `contains_node_contents`.
    pub fn contains_node_text(&self, doc: &Document, node: NodeId) -> bool {
        let texts = doc.text_nodes(node);
        match (texts.first(), texts.last()) {
            (Some(&first), Some(&last)) => {
                self.contains_point(doc, Boundary::new(first, 0))
                    && self.contains_point(doc, Boundary::new(last, doc.node_length(last)))
            }
            _ => self.contains_node_contents(doc, node),
        }
    }

    pub fn contains_range(&self, doc: &Document, other: &Range) -> bool {
        self.contains_point(doc, other.start) && self.contains_point(doc, other.end)
    }

    /// The range overlaps the node by more than a touching boundary.
    pub fn intersects_node(&self, doc: &Document, node: NodeId) -> bool {
        let (Some(parent), Some(idx)) = (doc.parent(node), doc.index_of(node)) else {
            return true;
        };
        compare_points(doc, Boundary::new(parent, idx), self.end) == Ordering::Less
            && compare_points(doc, Boundary::new(parent, idx + 1), self.start) == Ordering::Greater
    }

    /// Nodes the range touches, in document order, that pass `filter`.
    ///
    /// Partially selected elements are reported before their selected
    /// descendants; fully selected nodes contribute their whole subtree.
    /// A text start container sitting at its own end, and a text end
    /// container at offset zero, are left out.
    pub fn nodes(&self, doc: &Document, filter: impl Fn(&Document, NodeId) -> bool) -> Vec<NodeId> {
        let mut visited = Vec::new();
        collect_range_nodes(doc, self, &mut visited);
        visited
            .into_iter()
            .filter(|&node| {
                if node == self.start.node
                    && doc.is_character_data(node)
                    && self.start.offset == doc.node_length(node)
                {
                    return false;
                }
                if node == self.end.node && doc.is_character_data(node) && self.end.offset == 0 {
                    return false;
                }
                filter(doc, node)
            })
            .collect()
    }

    /// Splits text nodes at the boundary points so both boundaries sit
    /// between children of a common parent. Returns `(parent, start, end)`
    /// child indices.
    fn split_to_children(&mut self, doc: &mut Document) -> (NodeId, usize, usize) {
        let Range { start, end } = *self;
        if start.node == end.node && doc.is_character_data(start.node) {
            let text = start.node;
            let len = doc.node_length(text);
            if end.offset < len {
                doc.split_text(text, end.offset);
            }
            let middle = if start.offset > 0 {
                doc.split_text(text, start.offset)
            } else {
                text
            };
            let parent = doc.parent(middle).unwrap_or(middle);
            let idx = doc.index_of(middle).unwrap_or(0);
            *self = Self {
                start: Boundary::new(parent, idx),
                end: Boundary::new(parent, idx + 1),
            };
            return (parent, idx, idx + 1);
        }

        let (start, split) = split_point(doc, start);
        let mut end = end;
        if split && end.node == start.node && end.offset >= start.offset {
            end.offset += 1;
        }
        let (end, _) = split_point(doc, end);
        *self = Self { start, end };
        (start.node, start.offset, end.offset)
    }

    /// Wraps the selected content in `new_parent` and selects it.
    ///
    /// Fails with `PartiallySelected` when a non-text node is only partly
    /// inside the range.
    pub fn surround_contents(
        &mut self,
        doc: &mut Document,
        new_parent: NodeId,
    ) -> Result<(), DomError> {
        let common = self.common_ancestor(doc);
        for (from, other) in [(self.start.node, self.end.node), (self.end.node, self.start.node)] {
            let partial = doc
                .inclusive_ancestors(from)
                .take_while(|&node| node != common)
                .any(|node| !doc.is_character_data(node) && !doc.contains(node, other));
            if partial {
                return Err(DomError::PartiallySelected);
            }
        }
        if !doc.is_element(new_parent) {
            return Err(DomError::NotAnElement);
        }
        if doc.contains(new_parent, self.start.node) {
            return Err(DomError::HierarchyRequest);
        }
        if self.is_collapsed() {
            for child in doc.children(new_parent).to_vec() {
                doc.detach(child);
            }
            self.insert_node(doc, new_parent)?;
            self.select_node(doc, new_parent);
            return Ok(());
        }

        let (parent, from, to) = self.split_to_children(doc);
        let selected = doc.children(parent)[from..to.min(doc.children(parent).len())].to_vec();
        for child in doc.children(new_parent).to_vec() {
            doc.detach(child);
        }
        doc.insert_child(parent, from, new_parent);
        for node in selected {
            doc.append_child(new_parent, node);
        }
        self.select_node(doc, new_parent);
        Ok(())
    }

    /// Inserts `node` at the start of the range, splitting text if needed.
    pub fn insert_node(&mut self, doc: &mut Document, node: NodeId) -> Result<(), DomError> {
        if doc.contains(node, self.start.node) {
            return Err(DomError::HierarchyRequest);
        }
        let was_collapsed = self.is_collapsed();
        let Boundary { node: container, offset } = self.start;
        if doc.is_character_data(container) {
            let len = doc.node_length(container);
            if offset > len {
                return Err(DomError::InvalidBoundary {
                    offset,
                    length: len,
                });
            }
            if doc.parent(container).is_none() {
                return Err(DomError::HierarchyRequest);
            }
            if offset == 0 {
                doc.insert_before(container, node);
            } else {
                if offset < len {
                    let right = doc.split_text(container, offset);
                    if self.end.node == container && self.end.offset >= offset {
                        self.end = Boundary::new(right, self.end.offset - offset);
                    }
                }
                doc.insert_after(container, node);
            }
        } else {
            let len = doc.node_length(container);
            if offset > len {
                return Err(DomError::InvalidBoundary {
                    offset,
                    length: len,
                });
            }
            doc.insert_child(container, offset, node);
            if self.end.node == container && self.end.offset >= offset && !was_collapsed {
                self.end.offset += 1;
            }
        }
        if was_collapsed {
            if let Some(after) = Boundary::after(doc, node) {
                self.end = after;
            }
        }
        Ok(())
    }

    /// Removes the selected content and collapses the range.
    pub fn delete_contents(&mut self, doc: &mut Document) {
        if self.is_collapsed() {
            return;
        }
        let Range { start, end } = *self;
        if start.node == end.node && doc.is_character_data(start.node) {
            doc.delete_text(start.node, start.offset, end.offset);
            self.collapse(true);
            return;
        }

        let collapse_to = if doc.contains(start.node, end.node) {
            start
        } else {
            let reference = doc
                .inclusive_ancestors(start.node)
                .find(|&node| doc.parent(node).is_some_and(|p| doc.contains(p, end.node)));
            match reference.and_then(|r| Boundary::after(doc, r)) {
                Some(point) => point,
                None => start,
            }
        };

        let common = self.common_ancestor(doc);
        let contained: Vec<NodeId> = doc
            .descendants(common)
            .into_iter()
            .filter(|&node| self.contains_node(doc, node))
            .collect();
        let outermost: Vec<NodeId> = contained
            .iter()
            .copied()
            .filter(|&node| doc.parent(node).is_none_or(|p| !contained.contains(&p)))
            .collect();

        if doc.is_character_data(start.node) {
            let len = doc.node_length(start.node);
            doc.delete_text(start.node, start.offset, len);
        }
        let mut collapse_to = collapse_to;
        for node in outermost {
            if collapse_to.node == doc.parent(node).unwrap_or(collapse_to.node)
                && doc.index_of(node).is_some_and(|idx| idx < collapse_to.offset)
            {
                collapse_to.offset -= 1;
            }
            doc.detach(node);
        }
        if doc.is_character_data(end.node) {
            doc.delete_text(end.node, 0, end.offset);
        }
        *self = Self::collapsed_at(collapse_to);
    }

    /// Moves element boundary points into adjacent text nodes where possible,
    /// so later splits and wraps keep tracking the same characters.
    pub fn anchor_in_text(&mut self, doc: &Document) {
        if self.is_collapsed() {
            let point = descend_forward(doc, self.start);
            *self = Self::collapsed_at(point);
            return;
        }
        let start = descend_forward(doc, self.start);
        let end = descend_backward(doc, self.end);
        if compare_points(doc, start, end) != Ordering::Greater {
            self.start = start;
            self.end = end;
        }
    }
}

/// Converts a text point into a point between children, splitting the text
/// when the offset falls inside it. The flag reports whether a split happened.
fn split_point(doc: &mut Document, point: Boundary) -> (Boundary, bool) {
    if !doc.is_character_data(point.node) {
        return (point, false);
    }
    let (Some(parent), Some(idx)) = (doc.parent(point.node), doc.index_of(point.node)) else {
        return (point, false);
    };
    let len = doc.node_length(point.node);
    if point.offset == 0 {
        (Boundary::new(parent, idx), false)
    } else if point.offset >= len {
        (Boundary::new(parent, idx + 1), false)
    } else {
        doc.split_text(point.node, point.offset);
        (Boundary::new(parent, idx + 1), true)
    }
}

fn descendable(doc: &Document, node: NodeId) -> bool {
    doc.is_element(node) && !doc.is_void(node)
}

fn descend_forward(doc: &Document, mut point: Boundary) -> Boundary {
    loop {
        if !doc.is_element(point.node) {
            return point;
        }
        if let Some(child) = doc.child(point.node, point.offset) {
            if doc.is_text(child) {
                return Boundary::new(child, 0);
            }
            if descendable(doc, child) {
                point = Boundary::new(child, 0);
                continue;
            }
            return point;
        }
        match point.offset.checked_sub(1).and_then(|i| doc.child(point.node, i)) {
            Some(prev) if doc.is_text(prev) => return Boundary::new(prev, doc.node_length(prev)),
            _ => return point,
        }
    }
}

fn descend_backward(doc: &Document, mut point: Boundary) -> Boundary {
    loop {
        if !doc.is_element(point.node) {
            return point;
        }
        if let Some(prev) = point.offset.checked_sub(1).and_then(|i| doc.child(point.node, i)) {
            if doc.is_text(prev) {
                return Boundary::new(prev, doc.node_length(prev));
            }
            if descendable(doc, prev) {
                point = Boundary::new(prev, doc.node_length(prev));
                continue;
            }
            return point;
        }
        match doc.child(point.node, 0) {
            Some(first) if point.offset == 0 && doc.is_text(first) => {
                return Boundary::new(first, 0);
            }
            _ => return point,
        }
    }
}

/// Walks a range the way a subtree range iterator does.
fn collect_range_nodes(doc: &Document, range: &Range, out: &mut Vec<NodeId>) {
    if range.is_collapsed() {
        return;
    }
    let Range { start, end } = *range;
    if start.node == end.node && doc.is_character_data(start.node) {
        out.push(start.node);
        return;
    }
    let root = range.common_ancestor(doc);
    let first = if start.node == root && !doc.is_character_data(start.node) {
        doc.child(start.node, start.offset)
    } else {
        closest_child_of(doc, start.node, root)
    };
    let last = if end.node == root && !doc.is_character_data(end.node) {
        end.offset.checked_sub(1).and_then(|i| doc.child(end.node, i))
    } else {
        closest_child_of(doc, end.node, root)
    };

    let mut current = first;
    while let Some(node) = current {
        let partial = !doc.is_character_data(node)
            && (doc.contains(node, start.node) || doc.contains(node, end.node));
        out.push(node);
        if partial {
            let sub_start = if doc.contains(node, start.node) {
                start
            } else {
                Boundary::new(node, 0)
            };
            let sub_end = if doc.contains(node, end.node) {
                end
            } else {
                Boundary::new(node, doc.node_length(node))
            };
            let sub = Range {
                start: sub_start,
                end: sub_end,
            };
            collect_range_nodes(doc, &sub, out);
        } else if !doc.is_character_data(node) {
            out.extend(doc.descendants(node));
        }
        if Some(node) == last {
            break;
        }
        current = doc.next_sibling(node);
    }
}

/// The ancestor-or-self of `node` whose parent is `root`.
fn closest_child_of(doc: &Document, node: NodeId, root: NodeId) -> Option<NodeId> {
    doc.inclusive_ancestors(node)
        .find(|&n| doc.parent(n) == Some(root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::{inner_html, set_inner_html};

    fn doc_with(html: &str) -> Document {
        let mut doc = Document::new();
        let root = doc.root();
        set_inner_html(&mut doc, root, html);
        doc
    }

    /// First text node whose content equals `text`.
    fn find_text(doc: &Document, text: &str) -> NodeId {
        doc.descendants(doc.root())
            .into_iter()
            .find(|&n| doc.text(n) == Some(text))
            .unwrap()
    }

    #[test]
    fn compare_points_across_levels() {
        let doc = doc_with("<p>ab</p><p>cd</p>");
        let root = doc.root();
        let ab = find_text(&doc, "ab");
        let cd = find_text(&doc, "cd");
        assert_eq!(
            compare_points(&doc, Boundary::new(ab, 2), Boundary::new(cd, 0)),
            Ordering::Less
        );
        assert_eq!(
            compare_points(&doc, Boundary::new(root, 1), Boundary::new(ab, 1)),
            Ordering::Greater
        );
        assert_eq!(
            compare_points(&doc, Boundary::new(root, 1), Boundary::new(cd, 0)),
            Ordering::Less
        );
    }

    #[test]
    fn nodes_skips_touching_text_containers() {
        let doc = doc_with("<p>ab</p><p>cd</p><p>ef</p>");
        let ab = find_text(&doc, "ab");
        let ef = find_text(&doc, "ef");
        let range = Range::new(&doc, Boundary::new(ab, 2), Boundary::new(ef, 0));
        let texts = range.nodes(&doc, |d, n| d.is_text(n));
        assert_eq!(texts, vec![find_text(&doc, "cd")]);
    }

    #[test]
    fn nodes_reports_partial_parents_first() {
        let doc = doc_with("<p>a<b>bc</b></p>");
        let p = doc.first_child(doc.root()).unwrap();
        let a = find_text(&doc, "a");
        let bc = find_text(&doc, "bc");
        let range = Range::new(&doc, Boundary::new(a, 0), Boundary::new(bc, 1));
        let b = doc.children(p)[1];
        assert_eq!(range.nodes(&doc, |_, _| true), vec![a, b, bc]);
    }

    #[test]
    fn contains_node_text_ignores_element_edges() {
        let doc = doc_with("<p><b>xy</b></p>");
        let b = doc.first_child(doc.first_child(doc.root()).unwrap()).unwrap();
        let xy = find_text(&doc, "xy");
        let range = Range::new(&doc, Boundary::new(xy, 0), Boundary::new(xy, 2));
        assert!(range.contains_node_text(&doc, b));
        assert!(!range.contains_node_contents(&doc, b));
    }

    #[test]
    fn intersects_node_excludes_touching() {
        let doc = doc_with("<p>ab</p><p>cd</p>");
        let root = doc.root();
        let second = doc.children(root)[1];
        let ab = find_text(&doc, "ab");
        let touching = Range::new(&doc, Boundary::new(ab, 0), Boundary::new(root, 1));
        assert!(!touching.intersects_node(&doc, second));
        let cd = find_text(&doc, "cd");
        let overlapping = Range::new(&doc, Boundary::new(ab, 0), Boundary::new(cd, 1));
        assert!(overlapping.intersects_node(&doc, second));
    }

    #[test]
    fn surround_contents_splits_text() {
        let mut doc = doc_with("<p>Hello world</p>");
        let text = find_text(&doc, "Hello world");
        let mut range = Range::new(&doc, Boundary::new(text, 6), Boundary::new(text, 11));
        let strong = doc.create_element("strong");
        range.surround_contents(&mut doc, strong).unwrap();
        assert_eq!(
            inner_html(&doc, doc.root()),
            "<p>Hello <strong>world</strong></p>"
        );
        assert_eq!(range, Range::around_node(&doc, strong).unwrap());
    }

    #[test]
    fn surround_contents_rejects_partial_elements() {
        let mut doc = doc_with("<p>ab</p><p>cd</p>");
        let ab = find_text(&doc, "ab");
        let cd = find_text(&doc, "cd");
        let mut range = Range::new(&doc, Boundary::new(ab, 1), Boundary::new(cd, 1));
        let span = doc.create_element("span");
        assert_eq!(
            range.surround_contents(&mut doc, span),
            Err(DomError::PartiallySelected)
        );
        assert_eq!(inner_html(&doc, doc.root()), "<p>ab</p><p>cd</p>");
    }

    #[test]
    fn insert_node_at_collapsed_text_point() {
        let mut doc = doc_with("<p>abcd</p>");
        let text = find_text(&doc, "abcd");
        let mut range = Range::collapsed_at(Boundary::new(text, 2));
        let br = doc.create_element("br");
        range.insert_node(&mut doc, br).unwrap();
        assert_eq!(inner_html(&doc, doc.root()), "<p>ab<br>cd</p>");
        assert_eq!(range.end(), Boundary::after(&doc, br).unwrap());
    }

    #[test]
    fn delete_contents_across_paragraphs() {
        let mut doc = doc_with("<p>abc</p><p>def</p>");
        let abc = find_text(&doc, "abc");
        let def = find_text(&doc, "def");
        let mut range = Range::new(&doc, Boundary::new(abc, 1), Boundary::new(def, 2));
        range.delete_contents(&mut doc);
        assert_eq!(inner_html(&doc, doc.root()), "<p>a</p><p>f</p>");
        assert!(range.is_collapsed());
    }

    #[test]
    fn anchor_in_text_descends_into_elements() {
        let doc = doc_with("<p><b>ab</b>cd</p>");
        let root = doc.root();
        let mut range = Range::new(&doc, Boundary::new(root, 0), Boundary::new(root, 1));
        range.anchor_in_text(&doc);
        assert_eq!(range.start(), Boundary::new(find_text(&doc, "ab"), 0));
        assert_eq!(range.end(), Boundary::new(find_text(&doc, "cd"), 2));
    }
}
