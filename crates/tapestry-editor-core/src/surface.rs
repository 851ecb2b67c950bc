//! The editing surface: the live tree, its selection and the editable flag.

use std::cmp::Ordering;

use tapestry_dom::{
    Boundary, Document, NodeId, Range, compare_points, inner_html_filtered, set_inner_html,
};

use crate::types::{Affinity, TextPosition, TextSelection};

/// Owns the live tree rooted at the editor container.
///
/// The root always has at least one child. An empty surface holds a single
/// empty text node, which serializes to nothing but gives the caret
/// somewhere to live.
///
/// Formatting applied at a caret creates an empty wrapper to type into.
/// It stays pending until it receives content: while empty it is left out
/// of the serialized form, and moving the selection removes it.
#[derive(Debug, Clone)]
pub struct Surface {
    doc: Document,
    range: Option<Range>,
    editable: bool,
    pending_markup: Option<NodeId>,
}

impl Default for Surface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface {
    pub fn new() -> Self {
        let mut surface = Self {
            doc: Document::new(),
            range: None,
            editable: true,
            pending_markup: None,
        };
        surface.ensure_not_empty();
        surface
    }

    pub fn from_html(html: &str) -> Self {
        let mut surface = Self::new();
        surface.set_html(html);
        surface
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn doc_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn root(&self) -> NodeId {
        self.doc.root()
    }

    pub fn html(&self) -> String {
        let pending = self.pending_markup.filter(|&node| self.is_unused(node));
        inner_html_filtered(&self.doc, self.doc.root(), &|node| Some(node) == pending)
    }

    /// Replaces the content. The selection is dropped, as a browser drops it
    /// when `innerHTML` is assigned, and the old tree is freed.
    pub fn set_html(&mut self, html: &str) {
        self.doc.clear();
        let root = self.doc.root();
        set_inner_html(&mut self.doc, root, html);
        self.ensure_not_empty();
        self.range = None;
        self.pending_markup = None;
    }

    pub(crate) fn ensure_not_empty(&mut self) {
        let root = self.doc.root();
        if self.doc.children(root).is_empty() {
            let empty = self.doc.create_text("");
            self.doc.append_child(root, empty);
        }
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    pub fn set_editable(&mut self, editable: bool) {
        self.editable = editable;
    }

    // === Caret formatting ===

    /// The wrapper from the last caret formatting, if it is still waiting
    /// for content.
    pub fn pending_markup(&self) -> Option<NodeId> {
        self.pending_markup.filter(|&node| self.is_unused(node))
    }

    pub(crate) fn set_pending_markup(&mut self, node: NodeId) {
        self.pending_markup = Some(node);
    }

    fn is_unused(&self, node: NodeId) -> bool {
        self.doc.is_attached(node) && !self.doc.has_content(node)
    }

    /// Takes an empty caret formatting wrapper out of the tree. Markers
    /// parked inside it are kept in its place and the range keeps its text
    /// position.
    pub fn drop_pending_markup(&mut self) {
        let Some(node) = self.pending_markup.take() else {
            return;
        };
        if !self.is_unused(node) {
            return;
        }
        let selection = self.text_selection();
        for marker in self.doc.descendants(node) {
            if self.doc.is_marker(marker) {
                self.doc.insert_before(node, marker);
            }
        }
        self.doc.detach(node);
        if let Some(selection) = selection {
            self.restore_text_selection(selection);
        }
    }

    // === Selection ===

    /// The current range, if there is one and it still points into the tree.
    pub fn range(&self) -> Option<Range> {
        let range = self.range?;
        let valid = [range.start(), range.end()].into_iter().all(|point| {
            self.doc.is_attached(point.node) && point.offset <= self.doc.node_length(point.node)
        });
        valid.then_some(range)
    }

    pub fn set_range(&mut self, range: Range) {
        self.range = Some(range);
    }

    pub fn clear_range(&mut self) {
        self.range = None;
    }

    /// Moves element boundary points of the range into text nodes.
    pub fn anchor_range(&mut self) {
        if let Some(mut range) = self.range() {
            range.anchor_in_text(&self.doc);
            self.range = Some(range);
        }
    }

    pub fn collapse_to(&mut self, point: Boundary) {
        self.range = Some(Range::collapsed_at(point));
        self.anchor_range();
    }

    pub fn set_caret_after(&mut self, node: NodeId) {
        if let Some(point) = Boundary::after(&self.doc, node) {
            self.range = Some(Range::collapsed_at(point));
        }
    }

    pub fn set_caret_before(&mut self, node: NodeId) {
        if let Some(point) = Boundary::before(&self.doc, node) {
            self.range = Some(Range::collapsed_at(point));
        }
    }

    pub fn set_caret_at_beginning(&mut self, node: NodeId) {
        self.collapse_to(Boundary::new(node, 0));
    }

    pub fn select_node_contents(&mut self, node: NodeId) {
        self.range = Some(Range::node_contents(&self.doc, node));
        self.anchor_range();
    }

    pub fn select_all(&mut self) {
        self.drop_pending_markup();
        self.select_node_contents(self.doc.root());
    }

    /// Selects the characters `start..end` of the root's text content.
    pub fn select_text(&mut self, start: usize, end: usize) {
        self.drop_pending_markup();
        let (start, end) = (start.min(end), start.max(end));
        let selection = TextSelection {
            start: TextPosition::new(start, Affinity::After),
            end: TextPosition::new(end, Affinity::Before),
        };
        let selection = if start == end {
            TextSelection {
                start: TextPosition::new(start, Affinity::Before),
                end: TextPosition::new(start, Affinity::Before),
            }
        } else {
            selection
        };
        self.restore_text_selection(selection);
    }

    /// The text covered by the range.
    pub fn selected_text(&self) -> String {
        self.text_selection()
            .map(|sel| {
                self.doc
                    .text_content(self.doc.root())
                    .chars()
                    .skip(sel.start.offset)
                    .take(sel.end.offset - sel.start.offset)
                    .collect()
            })
            .unwrap_or_default()
    }

    // === Text anchoring ===

    /// Converts a boundary point to an offset in the root's text content.
    pub fn text_position(&self, point: Boundary) -> TextPosition {
        let doc = &self.doc;
        let mut total = 0;
        for text in doc.text_nodes(doc.root()) {
            let len = doc.node_length(text);
            if text == point.node {
                let affinity = if point.offset == len && len > 0 {
                    Affinity::Before
                } else {
                    Affinity::After
                };
                return TextPosition::new(total + point.offset.min(len), affinity);
            }
            let precedes = Boundary::after(doc, text)
                .is_some_and(|after| compare_points(doc, after, point) != Ordering::Greater);
            if !precedes {
                break;
            }
            total += len;
        }
        let affinity = if doc.child(point.node, point.offset).is_some() {
            Affinity::After
        } else {
            Affinity::Before
        };
        TextPosition::new(total, affinity)
    }

    pub fn text_selection(&self) -> Option<TextSelection> {
        let range = self.range()?;
        Some(TextSelection {
            start: self.text_position(range.start()),
            end: self.text_position(range.end()),
        })
    }

    /// Finds the boundary point for a text offset.
    pub fn resolve_position(&self, position: TextPosition) -> Boundary {
        let doc = &self.doc;
        let texts = doc.text_nodes(doc.root());
        let mut acc = 0;
        let mut last = None;
        for &text in &texts {
            let len = doc.node_length(text);
            if len == 0 {
                continue;
            }
            let hit = match position.affinity {
                Affinity::After => position.offset < acc + len,
                Affinity::Before => position.offset <= acc + len,
            };
            if hit {
                return Boundary::new(text, position.offset.saturating_sub(acc));
            }
            acc += len;
            last = Some(text);
        }
        match (last, texts.first()) {
            (Some(text), _) => Boundary::new(text, doc.node_length(text)),
            (None, Some(&text)) => Boundary::new(text, 0),
            (None, None) => Boundary::new(doc.root(), 0),
        }
    }

    pub fn restore_text_selection(&mut self, selection: TextSelection) {
        let start = self.resolve_position(selection.start);
        let end = if selection.is_collapsed() {
            start
        } else {
            self.resolve_position(selection.end)
        };
        self.range = Some(Range::new(&self.doc, start, end));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_surface_keeps_a_child() {
        let mut surface = Surface::from_html("");
        assert_eq!(surface.doc().children(surface.root()).len(), 1);
        assert_eq!(surface.html(), "");
        surface.select_text(0, 0);
        assert!(surface.range().is_some());
    }

    #[test]
    fn select_text_spans_elements() {
        let mut surface = Surface::from_html("<p>Hello <b>big</b> world</p>");
        surface.select_text(6, 13);
        assert_eq!(surface.selected_text(), "big wor");
    }

    #[test]
    fn text_selection_round_trips_through_wrapping() {
        let mut surface = Surface::from_html("<p>ab</p><p>cd</p>");
        surface.select_text(1, 3);
        let before = surface.text_selection().unwrap();
        let root = surface.root();
        let div = surface.doc_mut().create_element("div");
        surface.doc_mut().wrap_children(root, div);
        surface.restore_text_selection(before);
        assert_eq!(surface.text_selection(), Some(before));
        assert_eq!(surface.selected_text(), "bc");
    }

    #[test]
    fn caret_at_paragraph_end_stays_in_paragraph() {
        let mut surface = Surface::from_html("<p>ab</p><p>cd</p>");
        surface.select_text(2, 2);
        let range = surface.range().unwrap();
        assert_eq!(surface.doc().text(range.start().node), Some("ab"));
    }

    #[test]
    fn stale_range_is_dropped() {
        let mut surface = Surface::from_html("<p>ab</p>");
        surface.select_all();
        surface.set_html("<p>x</p>");
        assert_eq!(surface.range(), None);
    }
}
