//! Saving a selection across a focus change.
//!
//! The boundaries are persisted as marker nodes inside the tree, so they
//! move with the content if it is edited while the selection is parked.
//! Markers never serialize.

use tapestry_dom::{Boundary, Document, NodeId, Range};
use tracing::trace;

use crate::surface::Surface;

/// Marker nodes standing in for a saved range. A caret uses one marker for
/// both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavedSelection {
    start: NodeId,
    end: NodeId,
}

impl SavedSelection {
    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// Injects markers at the range boundaries. `None` without a range.
pub fn save_selection(surface: &mut Surface) -> Option<SavedSelection> {
    let range = surface.range()?;
    let doc = surface.doc_mut();
    let end = doc.create_marker();
    Range::collapsed_at(range.end()).insert_node(doc, end).ok()?;
    let start = if range.is_collapsed() {
        end
    } else {
        let start = doc.create_marker();
        if Range::collapsed_at(range.start()).insert_node(doc, start).is_err() {
            doc.detach(end);
            return None;
        }
        start
    };

    let (Some(from), Some(to)) = (Boundary::after(doc, start), Boundary::before(doc, end)) else {
        return None;
    };
    let parked = if start == end {
        Range::collapsed_at(to)
    } else {
        Range::new(doc, from, to)
    };
    surface.set_range(parked);
    trace!(target: "tapestry::dom", collapsed = start == end, "selection saved");
    Some(SavedSelection { start, end })
}

/// Removes the markers and selects what lay between them. Returns false
/// when the markers are gone, e.g. because the content was replaced.
pub fn restore_selection(surface: &mut Surface, saved: SavedSelection) -> bool {
    let doc = surface.doc_mut();
    if !doc.is_attached(saved.start) || !doc.is_attached(saved.end) {
        discard_markers(doc, saved);
        return false;
    }
    let mut start = marker_point(doc, saved.start);
    let mut end = marker_point(doc, saved.end);

    for marker in [saved.start, saved.end] {
        let Some(parent) = doc.parent(marker) else {
            continue;
        };
        let index = doc.index_of(marker).unwrap_or(0);
        let prev = doc.previous_sibling(marker);
        let next = doc.next_sibling(marker);
        doc.detach(marker);
        for point in [&mut start, &mut end] {
            if point.node == parent && point.offset > index {
                point.offset -= 1;
            }
        }
        if let (Some(left), Some(right)) = (prev, next) {
            if let Some(shift) = join_texts(doc, left, right) {
                for point in [&mut start, &mut end] {
                    if point.node == right {
                        *point = Boundary::new(left, shift + point.offset);
                    } else if point.node == parent && point.offset > index {
                        point.offset -= 1;
                    }
                }
            }
        }
    }

    let range = Range::new(surface.doc(), start, end);
    surface.set_range(range);
    trace!(target: "tapestry::dom", "selection restored");
    true
}

/// Drops the markers without touching the range.
pub fn discard_markers(doc: &mut Document, saved: SavedSelection) {
    for marker in [saved.start, saved.end] {
        doc.detach(marker);
    }
}

/// Where the marker sits, expressed in a neighbouring text node when
/// there is one.
fn marker_point(doc: &Document, marker: NodeId) -> Boundary {
    let mut before = doc.previous_sibling(marker);
    while let Some(node) = before.filter(|&n| doc.is_marker(n)) {
        before = doc.previous_sibling(node);
    }
    if let Some(text) = before.filter(|&n| doc.is_text(n)) {
        return Boundary::new(text, doc.node_length(text));
    }
    let mut after = doc.next_sibling(marker);
    while let Some(node) = after.filter(|&n| doc.is_marker(n)) {
        after = doc.next_sibling(node);
    }
    if let Some(text) = after.filter(|&n| doc.is_text(n)) {
        return Boundary::new(text, 0);
    }
    let parent = doc.parent(marker).unwrap_or(doc.root());
    let index = doc.children(parent)[..doc.index_of(marker).unwrap_or(0)]
        .iter()
        .filter(|&&n| !doc.is_marker(n))
        .count();
    Boundary::new(parent, index)
}

/// Appends `right` to `left` when both are text. Returns the length of
/// `left` before the join.
fn join_texts(doc: &mut Document, left: NodeId, right: NodeId) -> Option<usize> {
    let appended = doc.text(right)?.to_string();
    let original = doc.text(left)?.to_string();
    let shift = doc.node_length(left);
    doc.set_text(left, original + &appended);
    doc.detach(right);
    Some(shift)
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    #[test]
    fn round_trip_keeps_the_same_text() {
        let mut surface = Surface::from_html("<p>Hello <b>big</b> world</p>");
        surface.select_text(3, 11);
        let before = surface.text_selection();
        let saved = save_selection(&mut surface).unwrap();
        assert_snapshot!(surface.html(), @"<p>Hello <b>big</b> world</p>");
        assert!(restore_selection(&mut surface, saved));
        assert_eq!(surface.text_selection(), before);
        assert_eq!(surface.selected_text(), "lo big w");
        assert_eq!(surface.doc().text_nodes(surface.root()).len(), 3);
    }

    #[test]
    fn caret_round_trip() {
        let mut surface = Surface::from_html("<p>abc</p>");
        surface.select_text(1, 1);
        let saved = save_selection(&mut surface).unwrap();
        assert!(saved.is_collapsed());
        surface.clear_range();
        assert!(restore_selection(&mut surface, saved));
        let range = surface.range().unwrap();
        assert!(range.is_collapsed());
        assert_eq!(surface.text_position(range.start()).offset, 1);
        assert_eq!(surface.doc().text_nodes(surface.root()).len(), 1);
    }

    #[test]
    fn replaced_content_loses_the_markers() {
        let mut surface = Surface::from_html("<p>abc</p>");
        surface.select_text(0, 2);
        let saved = save_selection(&mut surface).unwrap();
        surface.set_html("<p>xyz</p>");
        assert!(!restore_selection(&mut surface, saved));
    }

    #[test]
    fn no_range_saves_nothing() {
        let mut surface = Surface::from_html("<p>abc</p>");
        assert_eq!(save_selection(&mut surface), None);
    }
}
