//! Arena-backed node tree.
//!
//! Detaching a node only unlinks it from its parent, so ids stay valid
//! until the arena is cleared. `Document::clear` drops every node at once
//! and starts a new generation; ids from an older generation are dead and
//! never alias the new nodes.

use smol_str::SmolStr;

use crate::style::StyleDeclaration;

/// Index of a node in its `Document`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

impl NodeId {
    pub fn index(self) -> usize {
        self.index
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub name: SmolStr,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementData {
    /// Lowercase tag name.
    pub name: SmolStr,
    pub attrs: Vec<Attribute>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeData {
    Element(ElementData),
    Text(String),
    Comment(String),
    /// Zero-width placeholder used to persist a selection boundary across
    /// mutations. Serializes to nothing.
    Marker,
}

#[derive(Clone, Debug)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// A tree of nodes rooted at an editor container element.
#[derive(Clone, Debug)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    generation: u32,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates a document whose root is an empty `div`.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
            generation: 0,
        };
        doc.root = doc.create_element("div");
        doc
    }

    /// Drops every node and starts over with an empty root. Ids handed out
    /// before the call are dead afterwards.
    pub fn clear(&mut self) {
        let root = self.node(self.root).data.clone();
        self.generation = self.generation.wrapping_add(1);
        self.nodes.clear();
        self.root = self.push(root);
    }

    /// A copy holding only the root and what is attached to it.
    pub fn compacted(&self) -> Document {
        let mut copy = Document::new();
        let root = copy.root;
        copy.node_mut(root).data = self.node(self.root).data.clone();
        for &child in self.children(self.root) {
            let child = copy.import_from(self, child);
            copy.append_child(root, child);
        }
        copy
    }

    fn import_from(&mut self, other: &Document, id: NodeId) -> NodeId {
        let copy = self.push(other.node(id).data.clone());
        for &child in other.children(id) {
            let child = self.import_from(other, child);
            self.append_child(copy, child);
        }
        copy
    }

    /// Slots in the arena, detached nodes included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether `id` belongs to the current generation of this arena.
    pub fn is_live(&self, id: NodeId) -> bool {
        id.generation == self.generation && id.index < self.nodes.len()
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId {
            index: self.nodes.len(),
            generation: self.generation,
        };
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index]
    }

    // === Construction ===

    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push(NodeData::Element(ElementData {
            name: SmolStr::new(name.to_ascii_lowercase()),
            attrs: Vec::new(),
        }))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Text(text.into()))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Comment(text.into()))
    }

    pub fn create_marker(&mut self) -> NodeId {
        self.push(NodeData::Marker)
    }

    /// Copies a node without its children.
    pub fn shallow_clone(&mut self, id: NodeId) -> NodeId {
        let data = self.node(id).data.clone();
        self.push(data)
    }

    /// Copies a node and its whole subtree. The copy is detached.
    pub fn deep_clone(&mut self, id: NodeId) -> NodeId {
        let copy = self.shallow_clone(id);
        let children = self.node(id).children.clone();
        for child in children {
            let child_copy = self.deep_clone(child);
            self.append_child(copy, child_copy);
        }
        copy
    }

    // === Node data ===

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.node(id).data
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.data(id), NodeData::Element(_))
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.data(id), NodeData::Text(_))
    }

    pub fn is_marker(&self, id: NodeId) -> bool {
        matches!(self.data(id), NodeData::Marker)
    }

    /// Text and comment nodes carry character data and take character offsets.
    pub fn is_character_data(&self, id: NodeId) -> bool {
        matches!(self.data(id), NodeData::Text(_) | NodeData::Comment(_))
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match self.data(id) {
            NodeData::Element(el) => Some(el.name.as_str()),
            _ => None,
        }
    }

    pub fn is_tag(&self, id: NodeId, name: &str) -> bool {
        self.tag_name(id) == Some(name)
    }

    pub fn has_tag_in(&self, id: NodeId, names: &[&str]) -> bool {
        self.tag_name(id).is_some_and(|name| names.contains(&name))
    }

    pub fn is_void(&self, id: NodeId) -> bool {
        self.tag_name(id).is_some_and(is_void_element)
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.data(id) {
            NodeData::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, value: impl Into<String>) {
        if let NodeData::Text(text) = &mut self.node_mut(id).data {
            *text = value.into();
        }
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(text) = self.text(id) {
            out.push_str(text);
        }
        for node in self.descendants(id) {
            if let Some(text) = self.text(node) {
                out.push_str(text);
            }
        }
        out
    }

    /// DOM node length: characters for character data, children otherwise.
    pub fn node_length(&self, id: NodeId) -> usize {
        match self.data(id) {
            NodeData::Text(text) | NodeData::Comment(text) => text.chars().count(),
            NodeData::Element(_) => self.node(id).children.len(),
            NodeData::Marker => 0,
        }
    }

    /// Whether the subtree holds visible content: non-empty text or a void
    /// element such as `br` or `img`.
    pub fn has_content(&self, id: NodeId) -> bool {
        std::iter::once(id)
            .chain(self.descendants(id))
            .any(|node| match self.data(node) {
                NodeData::Text(text) => !text.is_empty(),
                NodeData::Element(el) => is_void_element(&el.name),
                _ => false,
            })
    }

    // === Attributes ===

    pub fn attrs(&self, id: NodeId) -> &[Attribute] {
        match self.data(id) {
            NodeData::Element(el) => &el.attrs,
            _ => &[],
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attrs(id)
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    /// Present and not the empty string.
    pub fn has_attr_value(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some_and(|value| !value.is_empty())
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        let value = value.into();
        if let NodeData::Element(el) = &mut self.node_mut(id).data {
            let name = name.to_ascii_lowercase();
            match el.attrs.iter_mut().find(|attr| attr.name == name) {
                Some(attr) => attr.value = value,
                None => el.attrs.push(Attribute {
                    name: SmolStr::new(name),
                    value,
                }),
            }
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Option<String> {
        match &mut self.node_mut(id).data {
            NodeData::Element(el) => {
                let idx = el.attrs.iter().position(|attr| attr.name == name)?;
                Some(el.attrs.remove(idx).value)
            }
            _ => None,
        }
    }

    // === Inline style ===

    pub fn style(&self, id: NodeId) -> StyleDeclaration {
        self.attr(id, "style")
            .map(StyleDeclaration::parse)
            .unwrap_or_default()
    }

    /// Writes the style back. An empty declaration removes the attribute.
    pub fn set_style(&mut self, id: NodeId, style: &StyleDeclaration) {
        if style.is_empty() {
            self.remove_attr(id, "style");
        } else {
            self.set_attr(id, "style", style.to_string());
        }
    }

    pub fn style_property(&self, id: NodeId, property: &str) -> Option<String> {
        self.style(id).get(property).map(str::to_string)
    }

    pub fn set_style_property(&mut self, id: NodeId, property: &str, value: &str) {
        let mut style = self.style(id);
        style.set(property, value);
        self.set_style(id, &style);
    }

    pub fn remove_style_property(&mut self, id: NodeId, property: &str) -> Option<String> {
        let mut style = self.style(id);
        let previous = style.remove(property);
        if previous.is_some() {
            self.set_style(id, &style);
        }
        previous
    }

    // === Navigation ===

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Children with markers filtered out.
    pub fn content_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&child| !self.is_marker(child))
            .collect()
    }

    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).get(index).copied()
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    /// Position of the node among its parent's children.
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&child| child == id)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let idx = self.index_of(id)?;
        self.child(parent, idx + 1)
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let idx = self.index_of(id)?;
        idx.checked_sub(1).and_then(|prev| self.child(parent, prev))
    }

    /// Ancestors from the parent upwards, excluding the node itself.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), |&node| self.parent(node))
    }

    /// The node followed by its ancestors.
    pub fn inclusive_ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), |&node| self.parent(node))
    }

    /// True when `ancestor` is `node` or one of its ancestors.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.inclusive_ancestors(node).any(|n| n == ancestor)
    }

    /// Connected to the document root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.is_live(id) && self.contains(self.root, id)
    }

    /// All descendants in document order, excluding the node itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// Text node descendants (or the node itself) in document order.
    pub fn text_nodes(&self, id: NodeId) -> Vec<NodeId> {
        std::iter::once(id)
            .chain(self.descendants(id))
            .filter(|&node| self.is_text(node))
            .collect()
    }

    /// Child indices from the topmost ancestor down to the node.
    pub fn tree_path(&self, id: NodeId) -> Vec<usize> {
        let mut path: Vec<usize> = self
            .inclusive_ancestors(id)
            .filter_map(|node| self.index_of(node))
            .collect();
        path.reverse();
        path
    }

    // === Mutation ===

    /// Unlinks a node from its parent. The subtree stays intact.
    pub fn detach(&mut self, id: NodeId) {
        if !self.is_live(id) {
            return;
        }
        if let Some(parent) = self.node(id).parent {
            self.node_mut(parent).children.retain(|&child| child != id);
            self.node_mut(id).parent = None;
        }
    }

    /// Inserts `child` at `index` in `parent`, detaching it first. Indices
    /// past the end append.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        if self.contains(child, parent) {
            tracing::warn!(target: "tapestry::dom", "refusing to insert a node into its own subtree");
            return;
        }
        let index = if self.parent(child) == Some(parent) {
            let current = self.index_of(child).unwrap_or(index);
            self.detach(child);
            if current < index { index - 1 } else { index }
        } else {
            self.detach(child);
            index
        };
        let children = &mut self.node_mut(parent).children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.node_mut(child).parent = Some(parent);
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let len = self.children(parent).len();
        self.insert_child(parent, len, child);
    }

    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) {
        if let (Some(parent), Some(idx)) = (self.parent(reference), self.index_of(reference)) {
            self.insert_child(parent, idx, node);
        }
    }

    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) {
        if let (Some(parent), Some(idx)) = (self.parent(reference), self.index_of(reference)) {
            self.insert_child(parent, idx + 1, node);
        }
    }

    /// Moves every child of `from` to the end of `to`.
    pub fn move_children(&mut self, from: NodeId, to: NodeId) {
        let children = self.children(from).to_vec();
        for child in children {
            self.append_child(to, child);
        }
    }

    /// Replaces an element with its children. Returns the lifted children.
    pub fn unwrap(&mut self, id: NodeId) -> Vec<NodeId> {
        let Some(parent) = self.parent(id) else {
            return Vec::new();
        };
        let idx = self.index_of(id).unwrap_or(0);
        let children = self.children(id).to_vec();
        for (offset, &child) in children.iter().enumerate() {
            self.insert_child(parent, idx + offset, child);
        }
        self.detach(id);
        children
    }

    /// Puts `wrapper` where `node` was and moves `node` inside it.
    pub fn wrap(&mut self, node: NodeId, wrapper: NodeId) {
        if self.parent(node).is_none() {
            return;
        }
        self.insert_before(node, wrapper);
        self.append_child(wrapper, node);
    }

    /// Wraps a run of nodes in one wrapper placed at the first node's position.
    pub fn wrap_all(&mut self, nodes: &[NodeId], wrapper: NodeId) {
        let Some(&first) = nodes.first() else {
            return;
        };
        if self.parent(first).is_none() {
            return;
        }
        self.insert_before(first, wrapper);
        for &node in nodes {
            self.append_child(wrapper, node);
        }
    }

    /// Moves all children of `parent` into `wrapper`, which becomes the only child.
    pub fn wrap_children(&mut self, parent: NodeId, wrapper: NodeId) {
        self.move_children(parent, wrapper);
        self.append_child(parent, wrapper);
    }

    /// Puts `replacement` at the position of `old`, moving `old`'s children
    /// into it. `old` is detached.
    pub fn replace_element(&mut self, old: NodeId, replacement: NodeId) {
        self.insert_before(old, replacement);
        self.move_children(old, replacement);
        self.detach(old);
    }

    /// Splits a text node at a character offset. The original node keeps the
    /// left part; the new right node is inserted after it and returned.
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> NodeId {
        let right_text = match &mut self.node_mut(id).data {
            NodeData::Text(text) => {
                let byte = char_to_byte(text, offset);
                text.split_off(byte)
            }
            _ => String::new(),
        };
        let right = self.create_text(right_text);
        self.insert_after(id, right);
        right
    }

    /// Removes the characters in `[start, end)` from a text node.
    pub fn delete_text(&mut self, id: NodeId, start: usize, end: usize) {
        if let NodeData::Text(text) = &mut self.node_mut(id).data {
            let from = char_to_byte(text, start);
            let to = char_to_byte(text, end.max(start));
            text.replace_range(from..to, "");
        }
    }

    /// Merges adjacent text nodes below `id`. Returns
    /// `(removed, survivor, offset)` triples so callers can remap boundaries.
    pub fn merge_text_nodes(&mut self, id: NodeId) -> Vec<(NodeId, NodeId, usize)> {
        let mut moves = Vec::new();
        let mut scope = vec![id];
        scope.extend(self.descendants(id));
        for parent in scope {
            let mut idx = 0;
            while idx < self.children(parent).len() {
                let child = self.children(parent)[idx];
                let Some(next) = self.child(parent, idx + 1) else {
                    break;
                };
                if self.is_text(child) && self.is_text(next) {
                    let offset = self.node_length(child);
                    let appended = self.text(next).unwrap_or_default().to_string();
                    if let NodeData::Text(text) = &mut self.node_mut(child).data {
                        text.push_str(&appended);
                    }
                    self.detach(next);
                    moves.push((next, child, offset));
                } else {
                    idx += 1;
                }
            }
        }
        moves
    }

    /// Removes every marker below `id`.
    pub fn remove_markers(&mut self, id: NodeId) {
        for node in self.descendants(id) {
            if self.is_marker(node) {
                self.detach(node);
            }
        }
    }
}

pub(crate) fn char_to_byte(text: &str, offset: usize) -> usize {
    text.char_indices()
        .nth(offset)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len())
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

    #[test]
    fn unwrap_lifts_children_in_place() {
        let mut doc = doc_with("<p>a<b>bc</b>d</p>");
        let p = doc.first_child(doc.root()).unwrap();
        let b = doc.children(p)[1];
        let lifted = doc.unwrap(b);
        assert_eq!(lifted.len(), 1);
        assert_eq!(inner_html(&doc, doc.root()), "<p>abcd</p>");
    }

    #[test]
    fn wrap_all_uses_first_position() {
        let mut doc = doc_with("x<i>y</i>z");
        let root = doc.root();
        let kids = doc.children(root)[1..].to_vec();
        let span = doc.create_element("span");
        doc.wrap_all(&kids, span);
        assert_eq!(inner_html(&doc, root), "x<span><i>y</i>z</span>");
    }

    #[test]
    fn split_text_uses_char_offsets() {
        let mut doc = doc_with("héllo");
        let text = doc.first_child(doc.root()).unwrap();
        let right = doc.split_text(text, 2);
        assert_eq!(doc.text(text), Some("hé"));
        assert_eq!(doc.text(right), Some("llo"));
        assert_eq!(doc.next_sibling(text), Some(right));
    }

    #[test]
    fn merge_text_nodes_reports_moves() {
        let mut doc = doc_with("ab");
        let text = doc.first_child(doc.root()).unwrap();
        let right = doc.split_text(text, 1);
        let moves = doc.merge_text_nodes(doc.root());
        assert_eq!(moves, vec![(right, text, 1)]);
        assert_eq!(doc.children(doc.root()), &[text]);
    }

    #[test]
    fn insert_child_within_same_parent_adjusts_index() {
        let mut doc = doc_with("<i>1</i><i>2</i><i>3</i>");
        let root = doc.root();
        let first = doc.children(root)[0];
        doc.insert_child(root, 3, first);
        assert_eq!(inner_html(&doc, root), "<i>2</i><i>3</i><i>1</i>");
    }

    #[test]
    fn style_helpers_drop_empty_attribute() {
        let mut doc = doc_with("<p style=\"text-align: center;\">x</p>");
        let p = doc.first_child(doc.root()).unwrap();
        assert_eq!(doc.style_property(p, "text-align").as_deref(), Some("center"));
        doc.remove_style_property(p, "text-align");
        assert_eq!(doc.attr(p, "style"), None);
    }

    #[test]
    fn deep_clone_is_detached_copy() {
        let mut doc = doc_with("<p>a<b>b</b></p>");
        let p = doc.first_child(doc.root()).unwrap();
        let copy = doc.deep_clone(p);
        assert_eq!(doc.parent(copy), None);
        assert_eq!(crate::html::outer_html(&doc, copy), "<p>a<b>b</b></p>");
    }

    #[test]
    fn clear_kills_old_ids() {
        let mut doc = doc_with("<p>abc</p>");
        let p = doc.first_child(doc.root()).unwrap();
        doc.clear();
        assert!(!doc.is_live(p));
        assert!(!doc.is_attached(p));
        doc.detach(p);
        assert_eq!(doc.node_count(), 1);
        let root = doc.root();
        set_inner_html(&mut doc, root, "<p>x</p>");
        let fresh = doc.first_child(root).unwrap();
        assert_eq!(fresh.index(), p.index());
        assert_ne!(fresh, p);
    }

    #[test]
    fn compacted_keeps_only_the_live_tree() {
        let mut doc = doc_with("<p>a<b>b</b></p><div>gone</div>");
        let div = doc.last_child(doc.root()).unwrap();
        doc.detach(div);
        let compact = doc.compacted();
        assert_eq!(compact.node_count(), 5);
        assert_eq!(inner_html(&compact, compact.root()), "<p>a<b>b</b></p>");
    }
}
