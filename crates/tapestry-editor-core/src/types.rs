//! Small value types shared across the editor: text positions, directions,
//! alignments and the source-field selection.

use std::ops::Range;

/// Which neighbouring text a position sticks to when it sits on the edge
/// between two text nodes.
///
/// `Before` keeps the caret at the end of the preceding text, `After` at the
/// start of the following text.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Default)]
pub enum Affinity {
    #[default]
    Before,
    After,
}

/// A character offset into the text content of the editor root.
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub struct TextPosition {
    pub offset: usize,
    pub affinity: Affinity,
}

impl TextPosition {
    pub fn new(offset: usize, affinity: Affinity) -> Self {
        Self { offset, affinity }
    }
}

/// A selection expressed in text offsets. Survives any mutation that only
/// restructures elements, because wrapping and unwrapping never change the
/// text content.
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub struct TextSelection {
    pub start: TextPosition,
    pub end: TextPosition,
}

impl TextSelection {
    pub fn is_collapsed(&self) -> bool {
        self.start.offset == self.end.offset
    }

    pub fn to_range(&self) -> Range<usize> {
        self.start.offset..self.end.offset
    }
}

/// Selection inside the plain-text source field, in characters.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    /// Where selection started
    pub anchor: usize,
    /// Where the caret is now
    pub head: usize,
}

impl Selection {
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    pub fn collapsed(offset: usize) -> Self {
        Self {
            anchor: offset,
            head: offset,
        }
    }

    pub fn start(&self) -> usize {
        self.anchor.min(self.head)
    }

    pub fn end(&self) -> usize {
        self.anchor.max(self.head)
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }

    pub fn to_range(&self) -> Range<usize> {
        self.start()..self.end()
    }
}

/// Text direction of the editor content.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

impl Direction {
    pub fn css_value(self) -> &'static str {
        match self {
            Self::Ltr => "ltr",
            Self::Rtl => "rtl",
        }
    }
}

/// Paragraph alignment. `None` means no `text-align` is in effect.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Hash, Default)]
pub enum Align {
    Left,
    Center,
    Right,
    Justify,
    #[default]
    None,
}

impl Align {
    pub fn from_css(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" => Self::Left,
            "center" => Self::Center,
            "right" => Self::Right,
            "justify" => Self::Justify,
            _ => Self::None,
        }
    }

    pub fn css_value(self) -> Option<&'static str> {
        match self {
            Self::Left => Some("left"),
            Self::Center => Some("center"),
            Self::Right => Some("right"),
            Self::Justify => Some("justify"),
            Self::None => None,
        }
    }
}

/// Where the caret goes after inserting a node.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Default)]
pub enum CaretPosition {
    /// Leave the range as the insertion left it.
    Inherit,
    Before,
    #[default]
    After,
}
