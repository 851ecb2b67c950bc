//! Toolbar model: the items above and below the surface, their
//! highlighted state, and the popups they open.
//!
//! Rendering is the host's business. Items are addressed by id, which is
//! the command name for plain buttons.

use bitflags::bitflags;
use smol_str::SmolStr;
use tracing::debug;

use crate::command::{EditorCommand, FontValue};
use crate::config::{EditorConfig, Mode, ToolbarStyle};
use crate::edit_area::EditArea;
use crate::error::{EditorError, Result};
use crate::host::CommandHost;

bitflags! {
    /// What a toolbar item can do.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Capabilities: u8 {
        /// Runs a command when clicked.
        const EXECUTABLE = 1;
        /// Reflects the selection's state.
        const CHECKABLE = 1 << 1;
        /// Opens a popup that holds on to the selection.
        const POPUP = 1 << 2;
    }
}

pub const DEFAULT_COLORS: &[&str] = &["#FF0000", "#FFFF00"];
pub const LINK_TARGETS: &[&str] = &["_blank", "_self", "_parent", "_top"];

/// Dropdown value that clears formatting instead of setting a font.
pub const DEFAULT_OPTION: &str = "default";

#[derive(Debug, Clone, PartialEq)]
pub enum ItemKind {
    Separator,
    Button {
        command: EditorCommand,
        argument: SmolStr,
        checkable: bool,
    },
    ModeToggle(Mode),
    /// Font face or size picker.
    Dropdown {
        command: EditorCommand,
        options: Vec<SmolStr>,
    },
    ColorPicker {
        command: EditorCommand,
        colors: Vec<SmolStr>,
    },
    LinkDialog,
    /// Canned snippets inserted at the caret.
    InsertList(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolbarItem {
    pub id: SmolStr,
    pub title: SmolStr,
    pub kind: ItemKind,
    /// Highlighted, or for mode toggles, the current mode.
    pub active: bool,
    pub enabled: bool,
    /// Selected dropdown value.
    pub value: Option<SmolStr>,
}

impl ToolbarItem {
    fn new(id: &str, title: &str, kind: ItemKind) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind,
            active: false,
            enabled: true,
            value: None,
        }
    }

    pub fn separator() -> Self {
        Self::new("|", "", ItemKind::Separator)
    }

    /// A button running `command`. Checkable buttons light up when the
    /// selection already has the formatting.
    pub fn button(command: &str, title: &str, checkable: bool) -> Self {
        Self::new(
            command,
            title,
            ItemKind::Button {
                command: EditorCommand::from(command),
                argument: SmolStr::default(),
                checkable,
            },
        )
    }

    /// A button passing a fixed argument, e.g. `paragraph` running `p`.
    pub fn button_with_argument(id: &str, title: &str, command: &str, argument: &str) -> Self {
        Self::new(
            id,
            title,
            ItemKind::Button {
                command: EditorCommand::from(command),
                argument: argument.into(),
                checkable: false,
            },
        )
    }

    pub fn mode_toggle(mode: Mode) -> Self {
        let (id, title) = match mode {
            Mode::Design => ("design", "Design"),
            Mode::Html => ("html", "HTML"),
            Mode::Preview => ("preview", "Preview"),
        };
        Self::new(id, title, ItemKind::ModeToggle(mode))
    }

    pub fn dropdown(command: &str, title: &str, options: &[&str]) -> Self {
        Self::new(
            command,
            title,
            ItemKind::Dropdown {
                command: EditorCommand::from(command),
                options: options.iter().map(|&o| SmolStr::new(o)).collect(),
            },
        )
    }

    pub fn color_picker(command: &str, title: &str) -> Self {
        Self::new(
            command,
            title,
            ItemKind::ColorPicker {
                command: EditorCommand::from(command),
                colors: DEFAULT_COLORS.iter().map(|&c| SmolStr::new(c)).collect(),
            },
        )
    }

    pub fn link_dialog() -> Self {
        Self::new("link", "Insert link", ItemKind::LinkDialog)
    }

    pub fn insert_list(values: Vec<String>) -> Self {
        Self::new("insertlist", "Insert", ItemKind::InsertList(values))
    }

    pub fn capabilities(&self) -> Capabilities {
        match &self.kind {
            ItemKind::Separator | ItemKind::InsertList(_) => Capabilities::empty(),
            ItemKind::Button { checkable, .. } => {
                if *checkable {
                    Capabilities::EXECUTABLE | Capabilities::CHECKABLE
                } else {
                    Capabilities::EXECUTABLE
                }
            }
            ItemKind::ModeToggle(_) => Capabilities::EXECUTABLE | Capabilities::CHECKABLE,
            ItemKind::Dropdown { .. } => Capabilities::EXECUTABLE | Capabilities::CHECKABLE,
            ItemKind::ColorPicker { .. } | ItemKind::LinkDialog => Capabilities::POPUP,
        }
    }
}

/// Tracks which popup is open. Opening a second one closes the first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopupRegistry {
    open: Option<SmolStr>,
}

impl PopupRegistry {
    /// Registers `id` as the open popup, returning the one it displaced.
    pub fn register(&mut self, id: &str) -> Option<SmolStr> {
        self.open.replace(SmolStr::new(id)).filter(|previous| previous != id)
    }

    /// Forgets `id` if it is the open popup.
    pub fn unregister(&mut self, id: &str) -> bool {
        if self.open.as_deref() == Some(id) {
            self.open = None;
            true
        } else {
            false
        }
    }

    pub fn open(&self) -> Option<&str> {
        self.open.as_deref()
    }
}

fn full_layout() -> Vec<ToolbarItem> {
    let mut items = vec![
        ToolbarItem::button("undo", "Undo (Ctrl+Z)", false),
        ToolbarItem::button("redo", "Redo (Ctrl+Y)", false),
        ToolbarItem::separator(),
    ];
    for (command, title) in [
        ("bold", "Bold"),
        ("italic", "Italic"),
        ("underline", "Underline"),
        ("strikethrough", "Strikethrough"),
        ("subscript", "Subscript"),
        ("superscript", "Superscript"),
    ] {
        items.push(ToolbarItem::button(command, title, true));
    }
    items.extend([
        ToolbarItem::separator(),
        ToolbarItem::button("formatltr", "Left to right", true),
        ToolbarItem::button("formatrtl", "Right to left", true),
        ToolbarItem::separator(),
        ToolbarItem::color_picker("forecolor", "Text color"),
        ToolbarItem::button("resetforecolor", "Reset text color", false),
        ToolbarItem::color_picker("backcolor", "Highlight"),
        ToolbarItem::button("resetbackcolor", "Reset highlight", false),
        ToolbarItem::button("removeformat", "Remove formatting", false),
        ToolbarItem::separator(),
    ]);
    for (command, title) in [
        ("cut", "Cut"),
        ("copy", "Copy"),
        ("paste", "Paste"),
        ("pastetext", "Paste as text"),
        ("pasteword", "Paste from Word"),
    ] {
        items.push(ToolbarItem::button(command, title, false));
    }
    items.extend([
        ToolbarItem::separator(),
        ToolbarItem::button("indent", "Indent", false),
        ToolbarItem::button("outdent", "Outdent", false),
        ToolbarItem::button_with_argument("paragraph", "Paragraph", "p", ""),
        ToolbarItem::separator(),
        ToolbarItem::button("justifyleft", "Align left", true),
        ToolbarItem::button("justifycenter", "Center", true),
        ToolbarItem::button("justifyright", "Align right", true),
        ToolbarItem::button("justifyfull", "Justify", true),
        ToolbarItem::button("justifyreset", "Reset alignment", false),
        ToolbarItem::separator(),
        ToolbarItem::button("insertorderedlist", "Numbered list", false),
        ToolbarItem::button("insertunorderedlist", "Bullet list", false),
        ToolbarItem::button("inserthorizontalrule", "Horizontal rule", false),
        ToolbarItem::separator(),
        ToolbarItem::link_dialog(),
        ToolbarItem::button("unlink", "Remove link", false),
    ]);
    items
}

/// Toolbar state for one editor.
#[derive(Debug, Clone, PartialEq)]
pub struct Toolbar {
    items: Vec<ToolbarItem>,
    bottom: Vec<ToolbarItem>,
    popups: PopupRegistry,
}

impl Toolbar {
    pub fn new(style: ToolbarStyle, show_bottom: bool) -> Self {
        let items = match style {
            ToolbarStyle::Full => full_layout(),
            ToolbarStyle::Simple => vec![ToolbarItem::button("undo", "Undo (Ctrl+Z)", false)],
        };
        let bottom = if show_bottom {
            [Mode::Design, Mode::Html, Mode::Preview]
                .into_iter()
                .map(ToolbarItem::mode_toggle)
                .collect()
        } else {
            Vec::new()
        };
        Self {
            items,
            bottom,
            popups: PopupRegistry::default(),
        }
    }

    pub fn from_config(config: &EditorConfig) -> Self {
        let mut toolbar = Self::new(config.toolbar, config.show_bottom_toolbar);
        if !config.insert_list_values.is_empty() {
            toolbar.push(ToolbarItem::insert_list(config.insert_list_values.clone()));
        }
        toolbar
    }

    pub fn push(&mut self, item: ToolbarItem) {
        self.items.push(item);
    }

    pub fn items(&self) -> &[ToolbarItem] {
        &self.items
    }

    pub fn bottom_items(&self) -> &[ToolbarItem] {
        &self.bottom
    }

    pub fn item(&self, id: &str) -> Option<&ToolbarItem> {
        self.items.iter().chain(&self.bottom).find(|item| item.id == id)
    }

    fn kind_of(&self, id: &str) -> Option<ItemKind> {
        self.item(id).map(|item| item.kind.clone())
    }

    pub fn open_popup(&self) -> Option<&str> {
        self.popups.open()
    }

    /// Re-reads every checkable item's state from the editor. Items other
    /// than mode toggles are disabled outside design mode.
    pub fn refresh<H: CommandHost>(&mut self, area: &EditArea<H>) {
        let design = area.mode() == Mode::Design;
        for item in self.items.iter_mut().chain(self.bottom.iter_mut()) {
            item.enabled = design || matches!(item.kind, ItemKind::ModeToggle(_));
            match &item.kind {
                ItemKind::Button {
                    command,
                    checkable: true,
                    ..
                } => item.active = design && area.check_state(command) == Some(true),
                ItemKind::ModeToggle(mode) => item.active = area.mode() == *mode,
                ItemKind::Dropdown { command, .. } => {
                    item.value = match area.get_font(command.name()) {
                        Some(FontValue::Size(size)) => Some(SmolStr::new(size.to_string())),
                        Some(FontValue::Name(name)) if !name.is_empty() => Some(name.into()),
                        _ => None,
                    };
                    item.active = item.value.is_some();
                }
                _ => {}
            }
        }
    }

    /// Handles a click. Returns whether the click did anything.
    pub fn click<H: CommandHost>(&mut self, id: &str, area: &mut EditArea<H>) -> bool {
        let Some(kind) = self.kind_of(id) else {
            return false;
        };
        let handled = match kind {
            ItemKind::Button {
                command, argument, ..
            } => {
                area.format_doc(&command, false, &argument);
                true
            }
            ItemKind::ModeToggle(mode) => area.update_mode(mode),
            ItemKind::ColorPicker { .. } | ItemKind::LinkDialog => self.show_popup(id, area),
            ItemKind::Separator | ItemKind::Dropdown { .. } | ItemKind::InsertList(_) => false,
        };
        self.refresh(area);
        handled
    }

    /// A dropdown or insert-list choice.
    pub fn select<H: CommandHost>(&mut self, id: &str, value: &str, area: &mut EditArea<H>) {
        match self.kind_of(id) {
            Some(ItemKind::Dropdown { command, .. }) => {
                if value == DEFAULT_OPTION {
                    area.format_doc(&EditorCommand::RemoveFormat, false, "");
                } else {
                    area.format_doc(&command, false, value);
                }
            }
            Some(ItemKind::InsertList(_)) => {
                area.insert_text(value);
                area.record_change();
            }
            _ => return,
        }
        self.refresh(area);
    }

    fn show_popup<H: CommandHost>(&mut self, id: &str, area: &mut EditArea<H>) -> bool {
        if self.popups.open() == Some(id) {
            self.close_popup(area, true);
            return false;
        }
        if self.popups.open().is_some() {
            self.close_popup(area, true);
        }
        self.popups.register(id);
        area.save_selection();
        area.set_editable(false);
        debug!(target: "tapestry::command", popup = id, "popup opened");
        true
    }

    /// Closes the open popup and re-enables editing. A forced close, e.g.
    /// another popup opening, drops the parked selection; otherwise the
    /// link dialog puts it back.
    pub fn close_popup<H: CommandHost>(&mut self, area: &mut EditArea<H>, forced: bool) {
        let Some(id) = self.popups.open().map(SmolStr::new) else {
            return;
        };
        self.popups.unregister(&id);
        area.set_editable(true);
        if forced {
            area.remove_saved_selection();
        } else if matches!(self.kind_of(&id), Some(ItemKind::LinkDialog)) {
            area.restore_selection();
        }
        debug!(target: "tapestry::command", popup = %id, forced, "popup closed");
    }

    /// A color was chosen in the open picker. `None` is the reset entry.
    pub fn pick_color<H: CommandHost>(&mut self, area: &mut EditArea<H>, color: Option<&str>) {
        let Some(ItemKind::ColorPicker { command, .. }) =
            self.popups.open().and_then(|id| self.kind_of(id))
        else {
            return;
        };
        self.close_popup(area, false);
        let command = match (color, &command) {
            (Some(_), command) => command.clone(),
            (None, EditorCommand::BackColor) => EditorCommand::ResetBackColor,
            (None, _) => EditorCommand::ResetForeColor,
        };
        area.format_doc(&command, false, color.unwrap_or_default());
        self.refresh(area);
    }

    /// Submits the link dialog. A rejected URL keeps the dialog open so
    /// the host can alert and let the user correct it.
    pub fn submit_link<H: CommandHost>(
        &mut self,
        area: &mut EditArea<H>,
        url: &str,
        target: &str,
    ) -> Result<()> {
        if !matches!(
            self.popups.open().and_then(|id| self.kind_of(id)),
            Some(ItemKind::LinkDialog)
        ) {
            return Ok(());
        }
        let placeholder = area.config().link_placeholder.clone();
        let url = url.trim();
        if url.is_empty() || url == placeholder.trim() {
            return Err(EditorError::InvalidLinkUrl { placeholder });
        }
        self.close_popup(area, false);
        area.create_link(url, target)?;
        self.refresh(area);
        Ok(())
    }
}
