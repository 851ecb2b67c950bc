//! Tag classification shared by the query, mutation and normalization code.

use tapestry_dom::{Document, NodeId};

/// Character-level formatting elements. A collapsed caret never treats one
/// of these as its block container.
pub const MARKUP_TAGS: &[&str] = &[
    "strong", "em", "sub", "sup", "u", "strike", "font", "span", "b", "i", "s", "del", "a",
    "code",
];

/// Paragraph-level elements.
pub const BLOCK_TAGS: &[&str] = &[
    "p", "div", "ul", "ol", "li", "h1", "h2", "h3", "h4", "h5", "h6", "pre", "blockquote",
    "table", "thead", "tbody", "tfoot", "tr", "th", "td", "caption", "hr", "address",
];

/// Elements a caret-only list insertion converts in place.
pub const LIST_CONTAINER_TAGS: &[&str] = &["p", "div", "h1", "h2", "h3", "h4", "h5", "h6"];

/// Attributes that keep a wrapper meaningful when its tag is stripped.
pub const KEPT_ATTRIBUTES: &[&str] = &["style", "align"];

pub fn is_block(doc: &Document, node: NodeId) -> bool {
    doc.has_tag_in(node, BLOCK_TAGS)
}

pub fn is_markup(doc: &Document, node: NodeId) -> bool {
    doc.has_tag_in(node, MARKUP_TAGS)
}

/// Text or a non-block element other than a line break.
pub fn is_inline(doc: &Document, node: NodeId) -> bool {
    doc.is_text(node) || (doc.is_element(node) && !is_block(doc, node) && !doc.is_tag(node, "br"))
}

/// A text node holding only whitespace.
pub fn is_blank_text(doc: &Document, node: NodeId) -> bool {
    doc.text(node).is_some_and(|t| t.trim().is_empty())
}

/// Formatting toggled by a dedicated element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InlineFormat {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Subscript,
    Superscript,
}

impl InlineFormat {
    /// The element the engine creates.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Bold => "strong",
            Self::Italic => "em",
            Self::Underline => "u",
            Self::Strikethrough => "strike",
            Self::Subscript => "sub",
            Self::Superscript => "sup",
        }
    }

    /// Every tag that carries this formatting, canonical tag first.
    pub fn tags(self) -> &'static [&'static str] {
        match self {
            Self::Bold => &["strong", "b"],
            Self::Italic => &["em", "i"],
            Self::Underline => &["u"],
            Self::Strikethrough => &["strike", "s", "del"],
            Self::Subscript => &["sub"],
            Self::Superscript => &["sup"],
        }
    }

    /// Formatting that cannot coexist with this one.
    pub fn exclusive_with(self) -> Option<Self> {
        match self {
            Self::Subscript => Some(Self::Superscript),
            Self::Superscript => Some(Self::Subscript),
            _ => None,
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        [
            Self::Bold,
            Self::Italic,
            Self::Underline,
            Self::Strikethrough,
            Self::Subscript,
            Self::Superscript,
        ]
        .into_iter()
        .find(|format| format.tags().contains(&tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_tags_map_to_formats() {
        assert_eq!(InlineFormat::from_tag("b"), Some(InlineFormat::Bold));
        assert_eq!(InlineFormat::from_tag("del"), Some(InlineFormat::Strikethrough));
        assert_eq!(InlineFormat::from_tag("span"), None);
    }
}
