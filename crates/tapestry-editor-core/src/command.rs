//! Command dispatch: symbolic command names to engine operations, the
//! read-side state queries the toolbar highlights from, and the mode
//! state machine.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use smol_str::SmolStr;
use tracing::{debug, warn};

use crate::config::Mode;
use crate::edit_area::EditArea;
use crate::error::Result;
use crate::host::CommandHost;
use crate::mutate::{
    InlineTarget, add_to_property, apply_property_to_range, change_direction, create_link,
    insert_break_at_range, insert_horizontal_rule, insert_list, is_inline_active, leading_int,
    remove_inline, remove_property_from_range, set_inline_value, surround_range, toggle_format,
};
use crate::normalize::{remove_property_recursively, sanitize};
use crate::query::{
    NodesInRange, effective_attribute_value, effective_style_value, exact_node_in_range,
    nearest_ancestor_of_type,
};
use crate::tags::InlineFormat;
use crate::types::{Align, Direction};
use crate::undo::UndoManager;

/// A formatting command, parsed from its name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EditorCommand {
    Paragraph,
    Justify(Align),
    Undo,
    Redo,
    Direction(Direction),
    Indent,
    Outdent,
    InsertOrderedList,
    InsertUnorderedList,
    PasteText,
    PasteWord,
    ForeColor,
    BackColor,
    ResetForeColor,
    ResetBackColor,
    FontName,
    FontSize,
    Format(InlineFormat),
    RemoveFormat,
    CreateLink,
    Unlink,
    InsertHorizontalRule,
    InsertLineBreak,
    /// Anything else goes to the host.
    Native(SmolStr),
}

impl EditorCommand {
    pub fn name(&self) -> &str {
        match self {
            Self::Paragraph => "p",
            Self::Justify(Align::Left) => "justifyleft",
            Self::Justify(Align::Center) => "justifycenter",
            Self::Justify(Align::Right) => "justifyright",
            Self::Justify(Align::Justify) => "justifyfull",
            Self::Justify(Align::None) => "justifyreset",
            Self::Undo => "undo",
            Self::Redo => "redo",
            Self::Direction(Direction::Ltr) => "formatltr",
            Self::Direction(Direction::Rtl) => "formatrtl",
            Self::Indent => "indent",
            Self::Outdent => "outdent",
            Self::InsertOrderedList => "insertorderedlist",
            Self::InsertUnorderedList => "insertunorderedlist",
            Self::PasteText => "pastetext",
            Self::PasteWord => "pasteword",
            Self::ForeColor => "forecolor",
            Self::BackColor => "backcolor",
            Self::ResetForeColor => "resetforecolor",
            Self::ResetBackColor => "resetbackcolor",
            Self::FontName => "fontname",
            Self::FontSize => "fontsize",
            Self::Format(InlineFormat::Bold) => "bold",
            Self::Format(InlineFormat::Italic) => "italic",
            Self::Format(InlineFormat::Underline) => "underline",
            Self::Format(InlineFormat::Strikethrough) => "strikethrough",
            Self::Format(InlineFormat::Subscript) => "subscript",
            Self::Format(InlineFormat::Superscript) => "superscript",
            Self::RemoveFormat => "removeformat",
            Self::CreateLink => "createlink",
            Self::Unlink => "unlink",
            Self::InsertHorizontalRule => "inserthorizontalrule",
            Self::InsertLineBreak => "insertlinebreak",
            Self::Native(name) => name.as_str(),
        }
    }
}

impl FromStr for EditorCommand {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Ok(match name.as_str() {
            "p" | "paragraph" => Self::Paragraph,
            "justifyleft" => Self::Justify(Align::Left),
            "justifycenter" => Self::Justify(Align::Center),
            "justifyright" => Self::Justify(Align::Right),
            "justifyfull" => Self::Justify(Align::Justify),
            "justifyreset" => Self::Justify(Align::None),
            "undo" => Self::Undo,
            "redo" => Self::Redo,
            "formatltr" => Self::Direction(Direction::Ltr),
            "formatrtl" => Self::Direction(Direction::Rtl),
            "indent" => Self::Indent,
            "outdent" => Self::Outdent,
            "insertorderedlist" => Self::InsertOrderedList,
            "insertunorderedlist" => Self::InsertUnorderedList,
            "pastetext" => Self::PasteText,
            "pasteword" => Self::PasteWord,
            "forecolor" => Self::ForeColor,
            "backcolor" | "hilitecolor" => Self::BackColor,
            "resetforecolor" => Self::ResetForeColor,
            "resetbackcolor" => Self::ResetBackColor,
            "fontname" => Self::FontName,
            "fontsize" => Self::FontSize,
            "bold" => Self::Format(InlineFormat::Bold),
            "italic" => Self::Format(InlineFormat::Italic),
            "underline" => Self::Format(InlineFormat::Underline),
            "strikethrough" => Self::Format(InlineFormat::Strikethrough),
            "subscript" => Self::Format(InlineFormat::Subscript),
            "superscript" => Self::Format(InlineFormat::Superscript),
            "removeformat" => Self::RemoveFormat,
            "createlink" => Self::CreateLink,
            "unlink" => Self::Unlink,
            "inserthorizontalrule" => Self::InsertHorizontalRule,
            "insertlinebreak" => Self::InsertLineBreak,
            _ => Self::Native(SmolStr::new(name)),
        })
    }
}

impl From<&str> for EditorCommand {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(command) => command,
            Err(never) => match never {},
        }
    }
}

impl fmt::Display for EditorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A font attribute in effect at the selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontValue {
    /// The legacy `size` attribute, 1 to 7.
    Size(i64),
    /// The `face` attribute, lower-cased. Empty when none is set.
    Name(String),
}

impl<H: CommandHost> EditArea<H> {
    /// Runs a formatting command by name.
    pub fn exec(&mut self, command: &str, value: &str) {
        self.format_doc(&EditorCommand::from(command), false, value);
    }

    /// Runs a formatting command, then refocuses the surface and records
    /// history.
    ///
    /// A parked selection is restored first, so commands issued from a
    /// popup act on what was selected before it opened. Commands only run
    /// in design mode on an editable surface.
    pub fn format_doc(&mut self, command: &EditorCommand, show_ui: bool, value: &str) {
        self.restore_selection();
        if self.mode != Mode::Design || !self.surface.is_editable() {
            debug!(target: "tapestry::command", %command, mode = ?self.mode, "not editable, skipped");
            return;
        }
        debug!(target: "tapestry::command", %command, value, "format");
        match command {
            EditorCommand::Paragraph => {
                if let Some(p) = surround_range(&mut self.surface, "p", true, true, true) {
                    remove_property_recursively(self.surface.doc_mut(), p, "text-align");
                }
            }
            EditorCommand::Justify(Align::None) => {
                remove_property_from_range(&mut self.surface, "text-align", NodesInRange::All);
            }
            EditorCommand::Justify(align) => {
                if let Some(css) = align.css_value() {
                    apply_property_to_range(&mut self.surface, "text-align", css, "p");
                }
            }
            EditorCommand::Undo => {
                self.undo();
            }
            EditorCommand::Redo => {
                self.redo();
            }
            EditorCommand::Direction(direction) => {
                change_direction(&mut self.surface, *direction);
            }
            EditorCommand::Indent => self.shift_indent(self.config.indent_step_px),
            EditorCommand::Outdent => self.shift_indent(-self.config.indent_step_px),
            EditorCommand::InsertOrderedList => insert_list(&mut self.surface, "ol"),
            EditorCommand::InsertUnorderedList => insert_list(&mut self.surface, "ul"),
            EditorCommand::PasteText => {
                self.paste_as_plain_text = true;
                self.exec_native("paste", show_ui, value);
            }
            EditorCommand::PasteWord => {
                self.exec_native("paste", show_ui, value);
                let root = self.surface.root();
                sanitize(self.surface.doc_mut(), root);
                self.surface.ensure_not_empty();
            }
            EditorCommand::ForeColor => {
                set_inline_value(&mut self.surface, InlineTarget::FontAttr("color"), value);
            }
            EditorCommand::BackColor => {
                set_inline_value(&mut self.surface, InlineTarget::Background, value);
            }
            EditorCommand::ResetForeColor => {
                set_inline_value(&mut self.surface, InlineTarget::FontAttr("color"), "");
            }
            EditorCommand::ResetBackColor => {
                set_inline_value(&mut self.surface, InlineTarget::Background, "");
            }
            EditorCommand::FontName => {
                set_inline_value(&mut self.surface, InlineTarget::FontAttr("face"), value);
            }
            EditorCommand::FontSize => {
                set_inline_value(&mut self.surface, InlineTarget::FontAttr("size"), value);
            }
            EditorCommand::Format(format) => toggle_format(&mut self.surface, *format),
            EditorCommand::RemoveFormat => remove_inline(&mut self.surface, InlineTarget::AnyMarkup),
            EditorCommand::Unlink => remove_inline(&mut self.surface, InlineTarget::Link),
            EditorCommand::CreateLink => {
                let (url, target) = value.split_once(' ').unwrap_or((value, ""));
                if let Err(err) = self.apply_link(url, target.trim()) {
                    warn!(target: "tapestry::command", %err, "link rejected");
                }
            }
            EditorCommand::InsertHorizontalRule => insert_horizontal_rule(&mut self.surface),
            EditorCommand::InsertLineBreak => insert_break_at_range(&mut self.surface),
            EditorCommand::Native(name) => self.exec_native(name, show_ui, value),
        }
        self.focus();
        self.record_change();
    }

    fn exec_native(&mut self, command: &str, show_ui: bool, value: &str) {
        if self.host.query_command_enabled(command) {
            self.host.exec_command(command, show_ui, value);
        } else {
            warn!(target: "tapestry::command", command, "native command not enabled, skipped");
        }
    }

    fn shift_indent(&mut self, step: i64) {
        let property = match self.get_direction() {
            Direction::Ltr => "margin-left",
            Direction::Rtl => "margin-right",
        };
        add_to_property(&mut self.surface, property, step, "p");
    }

    fn apply_link(&mut self, url: &str, target: &str) -> Result<()> {
        create_link(
            &mut self.surface,
            url,
            target,
            &self.config.link_placeholder,
            &self.config.new_link_text,
        )
    }

    /// Links the selection. An empty or placeholder URL is the one error a
    /// user sees.
    pub fn create_link(&mut self, url: &str, target: &str) -> Result<()> {
        self.restore_selection();
        self.apply_link(url, target)?;
        self.focus();
        self.record_change();
        Ok(())
    }

    /// Sets the content direction. Returns whether the content changed.
    pub fn change_direction(&mut self, direction: Direction) -> bool {
        let changed = change_direction(&mut self.surface, direction);
        if changed {
            self.record_change();
        }
        changed
    }

    /// Whether the selection already has the command's formatting. `None`
    /// for commands neither the engine nor the host can answer.
    pub fn check_state(&self, command: &EditorCommand) -> Option<bool> {
        match command {
            EditorCommand::Paragraph => Some(self.check_paragraph()),
            EditorCommand::Justify(align) => Some(self.get_alignment() == *align),
            EditorCommand::Direction(direction) => Some(self.get_direction() == *direction),
            EditorCommand::Format(format) => {
                let range = self.surface.range()?;
                Some(is_inline_active(
                    self.surface.doc(),
                    &range,
                    InlineTarget::Format(*format),
                ))
            }
            other => {
                let name = other.name();
                if self.host.query_command_enabled(name) {
                    self.host.query_command_state(name)
                } else {
                    None
                }
            }
        }
    }

    pub fn check_paragraph(&self) -> bool {
        let Some(range) = self.surface.range() else {
            return false;
        };
        let doc = self.surface.doc();
        nearest_ancestor_of_type(doc, &range, &["p"], &[]).is_some()
            || exact_node_in_range(doc, &range, &["p"]).is_some()
    }

    pub fn get_alignment(&self) -> Align {
        self.surface
            .range()
            .map(|range| Align::from_css(&effective_style_value(self.surface.doc(), &range, "text-align")))
            .unwrap_or_default()
    }

    /// An unset or `ltr` direction reads as left-to-right.
    pub fn get_direction(&self) -> Direction {
        let value = self
            .surface
            .range()
            .map(|range| effective_style_value(self.surface.doc(), &range, "direction"))
            .unwrap_or_default();
        if value.is_empty() || value.eq_ignore_ascii_case("ltr") {
            Direction::Ltr
        } else {
            Direction::Rtl
        }
    }

    /// The nearest `font` attribute for the toolbar's font dropdowns:
    /// `fontsize` reads `size`, `fontname` reads `face`.
    pub fn get_font(&self, property: &str) -> Option<FontValue> {
        let range = self.surface.range();
        let value = |attribute: &str| {
            range
                .map(|range| effective_attribute_value(self.surface.doc(), &range, attribute))
                .unwrap_or_default()
        };
        match property.to_ascii_lowercase().as_str() {
            "fontsize" => leading_int(&value("size")).map(FontValue::Size),
            "fontname" => Some(FontValue::Name(value("face").to_lowercase())),
            _ => None,
        }
    }

    // === Modes ===

    /// Switches between design, source and preview. Returns false when
    /// already in `mode`.
    ///
    /// Entering source mode writes the surface to the text field; leaving
    /// it parses the field back. Preview makes the surface read-only.
    pub fn update_mode(&mut self, mode: Mode) -> bool {
        if mode == self.mode {
            return false;
        }
        let previous = std::mem::replace(&mut self.mode, mode);
        debug!(target: "tapestry::command", from = ?previous, to = ?mode, "mode");
        match mode {
            Mode::Html => {
                self.remove_saved_selection();
                self.update_text_area();
            }
            Mode::Design | Mode::Preview => {
                if previous == Mode::Html {
                    self.update_editor();
                    self.record_change();
                }
            }
        }
        self.surface.set_editable(mode != Mode::Preview);
        if mode == Mode::Design {
            self.focus();
        }
        true
    }
}
