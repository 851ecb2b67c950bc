//! The editor object: a rich-text surface paired with the plain-text field
//! that holds its serialized form.
//!
//! Input events arrive as method calls with explicit instants. Commands and
//! mode switches live in [`crate::command`].

use smol_str::SmolStr;
use tapestry_dom::{format_html_string, inner_html};
use tracing::{debug, trace};
use web_time::Instant;

use crate::actions::{Key, KeyCombo, KeydownResult};
use crate::command::EditorCommand;
use crate::config::{EditorConfig, Mode};
use crate::debounce::Debouncer;
use crate::error::{EditorError, Result};
use crate::host::{CommandHost, NullHost};
use crate::mutate::{insert_break_at_range, insert_html_at_range};
use crate::normalize::{Pass, normalize};
use crate::query::nearest_ancestor_of_type;
use crate::selection::{SavedSelection, restore_selection, save_selection};
use crate::surface::Surface;
use crate::types::Selection;
use crate::undo::{History, UndoManager};

/// An element handed over by the host page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostElement {
    pub tag: SmolStr,
    pub id: SmolStr,
    /// Current value for form fields, inner HTML otherwise.
    pub value: String,
}

impl HostElement {
    pub fn new(tag: impl Into<SmolStr>, id: impl Into<SmolStr>, value: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            id: id.into(),
            value: value.into(),
        }
    }

    pub fn text_area(id: impl Into<SmolStr>, value: impl Into<String>) -> Self {
        Self::new("textarea", id, value)
    }

    pub fn div(id: impl Into<SmolStr>) -> Self {
        Self::new("div", id, "")
    }
}

pub struct EditArea<H = NullHost> {
    pub(crate) surface: Surface,
    pub(crate) text_area: String,
    pub(crate) text_area_selection: Selection,
    text_area_id: SmolStr,
    pub(crate) mode: Mode,
    pub(crate) history: History,
    debouncer: Debouncer,
    pub(crate) host: H,
    pub(crate) config: EditorConfig,
    saved_selection: Option<SavedSelection>,
    pub(crate) paste_as_plain_text: bool,
    pending_focus: bool,
}

impl EditArea<NullHost> {
    /// An editor over `html` with no host and default settings.
    pub fn from_html(html: &str) -> Self {
        Self::with_host(html, NullHost, EditorConfig::default())
    }
}

impl<H: CommandHost> EditArea<H> {
    /// Mounts the editor on a `<textarea>` and the `<div>` that becomes the
    /// editing surface. Any other pairing is an integration error.
    pub fn new(
        text_area: HostElement,
        editor: HostElement,
        host: H,
        config: EditorConfig,
    ) -> Result<Self> {
        if !text_area.tag.eq_ignore_ascii_case("textarea") || !editor.tag.eq_ignore_ascii_case("div")
        {
            return Err(EditorError::InvalidHostElements {
                text_area: text_area.tag.to_ascii_lowercase(),
                editor: editor.tag.to_ascii_lowercase(),
            });
        }
        let mut area = Self {
            surface: Surface::new(),
            text_area: text_area.value,
            text_area_selection: Selection::default(),
            text_area_id: text_area.id,
            mode: Mode::Design,
            history: History::new(String::new(), config.history_capacity),
            debouncer: Debouncer::from_millis(config.debounce_wait_ms, config.debounce_max_wait_ms),
            host,
            config,
            saved_selection: None,
            paste_as_plain_text: false,
            pending_focus: false,
        };
        area.update_editor();
        let html = area.surface.html();
        area.history.reset(&html);
        let mode = area.config.mode;
        area.update_mode(mode);
        debug!(target: "tapestry::command", id = %area.text_area_id, "editor mounted");
        Ok(area)
    }

    pub fn with_host(html: &str, host: H, config: EditorConfig) -> Self {
        let mut area = Self {
            surface: Surface::new(),
            text_area: html.to_string(),
            text_area_selection: Selection::default(),
            text_area_id: SmolStr::default(),
            mode: Mode::Design,
            history: History::new(String::new(), config.history_capacity),
            debouncer: Debouncer::from_millis(config.debounce_wait_ms, config.debounce_max_wait_ms),
            host,
            config,
            saved_selection: None,
            paste_as_plain_text: false,
            pending_focus: false,
        };
        area.update_editor();
        let html = area.surface.html();
        area.history.reset(&html);
        area
    }

    // === Accessors ===

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }

    pub fn html(&self) -> String {
        self.surface.html()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn text_area_value(&self) -> &str {
        &self.text_area
    }

    /// Replaces the text field's value, as the user typing in source mode.
    pub fn set_text_area_value(&mut self, value: impl Into<String>) {
        self.text_area = value.into();
        let end = self.text_area.chars().count();
        self.text_area_selection = Selection::collapsed(end);
    }

    pub fn text_area_selection(&self) -> Selection {
        self.text_area_selection
    }

    pub fn set_text_area_selection(&mut self, selection: Selection) {
        let len = self.text_area.chars().count();
        self.text_area_selection = Selection::new(selection.anchor.min(len), selection.head.min(len));
    }

    /// Registry key: the text field id with `_html_editor` appended.
    pub fn unique_id(&self) -> String {
        format!("{}_html_editor", self.text_area_id)
    }

    pub fn is_editable(&self) -> bool {
        self.surface.is_editable()
    }

    pub fn set_editable(&mut self, editable: bool) {
        self.surface.set_editable(editable);
    }

    /// Selects characters of the surface's text content.
    pub fn select_text(&mut self, start: usize, end: usize) {
        self.surface.select_text(start, end);
    }

    pub fn select_all(&mut self) {
        self.surface.select_all();
    }

    pub fn selected_text(&self) -> String {
        self.surface.selected_text()
    }

    pub fn focus(&mut self) {
        self.host.focus();
    }

    // === Syncing the two representations ===

    /// Loads the text field into the surface and normalizes it.
    pub fn update_editor(&mut self) {
        self.saved_selection = None;
        self.surface.set_html(&self.text_area);
        let root = self.surface.root();
        normalize(self.surface.doc_mut(), root, Pass::Canonical);
        self.surface.ensure_not_empty();
    }

    /// Writes the surface to the text field in its legacy, readable form.
    pub fn update_text_area(&mut self) {
        let mut doc = self.surface.doc().compacted();
        let root = doc.root();
        doc.remove_markers(root);
        normalize(&mut doc, root, Pass::Legacy);
        self.text_area = format_html_string(&inner_html(&doc, root));
        let end = self.text_area.chars().count();
        self.text_area_selection = Selection::collapsed(end);
    }

    /// The form is about to be submitted. Outside source mode the text
    /// field is refreshed from the surface.
    pub fn before_submit(&mut self) {
        if self.debouncer.flush() {
            self.record_change();
        }
        if self.mode != Mode::Html {
            self.update_text_area();
        }
    }

    // === History ===

    /// Records the current content if it changed since the last entry.
    pub fn record_change(&mut self) -> bool {
        if self.mode == Mode::Html {
            return false;
        }
        let html = self.surface.html();
        self.history.record(&html)
    }

    fn show_snapshot(&mut self, html: String) {
        self.saved_selection = None;
        self.surface.set_html(&html);
        let current = self.surface.html();
        self.history.reset(&current);
    }

    // === Input events ===

    /// Handles a key press on the surface.
    ///
    /// Space and Enter close the current history entry. Ctrl+Z and Ctrl+Y
    /// undo and redo. Enter outside a list inserts a line break instead of
    /// the platform's new paragraph.
    pub fn handle_key_down(&mut self, combo: &KeyCombo) -> KeydownResult {
        if self.mode != Mode::Design || !self.surface.is_editable() {
            return KeydownResult::PassThrough;
        }
        if matches!(combo.key, Key::Space | Key::Enter) {
            self.record_change();
        }
        if combo.modifiers.ctrl && combo.key.is_char('y') {
            self.format_doc(&EditorCommand::Redo, false, "");
            return KeydownResult::Handled;
        }
        if combo.modifiers.ctrl && combo.key.is_char('z') {
            self.format_doc(&EditorCommand::Undo, false, "");
            return KeydownResult::Handled;
        }
        if combo.key == Key::Enter {
            let in_list = self.surface.range().is_some_and(|range| {
                nearest_ancestor_of_type(self.surface.doc(), &range, &["li", "ul", "ol"], &[])
                    .is_some()
            });
            if !in_list {
                trace!(target: "tapestry::command", "enter as line break");
                insert_break_at_range(&mut self.surface);
                return KeydownResult::Handled;
            }
        }
        if combo.key.is_navigation() || combo.key.is_modifier() {
            KeydownResult::PassThrough
        } else {
            KeydownResult::NotHandled
        }
    }

    /// A key was released. History records once typing pauses.
    pub fn on_key_up(&mut self, now: Instant) {
        self.debouncer.call(now);
    }

    /// Mouse-up, blur and cut record immediately.
    pub fn on_mouse_up(&mut self) {
        self.record_change();
    }

    pub fn on_blur(&mut self) {
        self.record_change();
    }

    pub fn on_cut(&mut self) {
        self.record_change();
    }

    /// A paste is about to happen. Returns whether the platform should go
    /// ahead with its own paste; after a `pastetext` command the clipboard
    /// text is inserted here instead, escaped, with newlines as breaks.
    pub fn on_paste(&mut self, clipboard_text: &str) -> bool {
        self.record_change();
        if !self.paste_as_plain_text {
            return true;
        }
        self.paste_as_plain_text = false;
        let html = escape_text(clipboard_text).replace('\n', "<br />");
        insert_html_at_range(&mut self.surface, &html);
        self.record_change();
        false
    }

    /// Runs deferred work that is due: debounced history recording and the
    /// refocus after a selection restore.
    pub fn tick(&mut self, now: Instant) {
        if self.debouncer.poll(now) {
            self.record_change();
        }
        if std::mem::take(&mut self.pending_focus) {
            self.host.focus();
        }
    }

    pub fn has_pending_work(&self) -> bool {
        self.debouncer.is_pending() || self.pending_focus
    }

    // === Saved selection ===

    /// Parks the selection in the tree, e.g. while a popup has focus.
    pub fn save_selection(&mut self) {
        self.remove_saved_selection();
        self.saved_selection = save_selection(&mut self.surface);
    }

    /// Puts a parked selection back and refocuses on the next tick.
    pub fn restore_selection(&mut self) {
        if let Some(saved) = self.saved_selection.take() {
            restore_selection(&mut self.surface, saved);
            self.pending_focus = true;
        }
    }

    /// Drops a parked selection. The markers come out of the tree and the
    /// range is left where they were, without refocusing.
    pub fn remove_saved_selection(&mut self) {
        if let Some(saved) = self.saved_selection.take() {
            restore_selection(&mut self.surface, saved);
        }
    }

    pub fn has_saved_selection(&self) -> bool {
        self.saved_selection.is_some()
    }

    // === Insertion ===

    /// Inserts a snippet: as markup at the caret in design mode, as text
    /// over the field's selection in source mode.
    pub fn insert_text(&mut self, value: &str) {
        match self.mode {
            Mode::Design => {
                self.focus();
                insert_html_at_range(&mut self.surface, value);
            }
            Mode::Html => {
                let selection = self.text_area_selection;
                let start = byte_offset(&self.text_area, selection.start());
                let end = byte_offset(&self.text_area, selection.end());
                self.text_area.replace_range(start..end, value);
                let caret = selection.start() + value.chars().count();
                self.text_area_selection = Selection::collapsed(caret);
            }
            Mode::Preview => {}
        }
    }
}

impl<H: CommandHost> UndoManager for EditArea<H> {
    fn can_undo(&self) -> bool {
        self.history.undo_depth() > 0
    }

    fn can_redo(&self) -> bool {
        self.history.redo_depth() > 0
    }

    fn undo(&mut self) -> bool {
        let Some(html) = self.history.step_back().map(str::to_string) else {
            return false;
        };
        self.show_snapshot(html);
        true
    }

    fn redo(&mut self) -> bool {
        let Some(html) = self.history.step_forward().map(str::to_string) else {
            return false;
        };
        self.show_snapshot(html);
        true
    }

    fn clear_history(&mut self) {
        self.history.clear();
    }
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map_or(text.len(), |(byte, _)| byte)
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.replace("\r\n", "\n").chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use std::time::Duration;

    #[test]
    fn mounting_checks_element_types() {
        let err = EditArea::new(
            HostElement::div("body"),
            HostElement::div("editor"),
            NullHost,
            EditorConfig::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, EditorError::InvalidHostElements { .. }));
        assert_snapshot!(err.to_string(), @"invalid host elements: expected <textarea> and <div>, got <div> and <div>");

        let area = EditArea::new(
            HostElement::text_area("body", "<p style=\"font-weight: bold\">x</p>"),
            HostElement::new("DIV", "editor", ""),
            NullHost,
            EditorConfig::default(),
        )
        .unwrap();
        assert_eq!(area.unique_id(), "body_html_editor");
        assert_snapshot!(area.html(), @"<p><strong>x</strong></p>");
    }

    #[test]
    fn enter_outside_list_inserts_break() {
        let mut area = EditArea::from_html("abc");
        area.select_text(3, 3);
        let result = area.handle_key_down(&KeyCombo::new(Key::Enter));
        assert_eq!(result, KeydownResult::Handled);
        assert_snapshot!(area.html(), @"abc<br><br>");

        let mut area = EditArea::from_html("<ul><li>abc</li></ul>");
        area.select_text(3, 3);
        let result = area.handle_key_down(&KeyCombo::new(Key::Enter));
        assert_eq!(result, KeydownResult::NotHandled);
        assert_snapshot!(area.html(), @"<ul><li>abc</li></ul>");
    }

    #[test]
    fn ctrl_z_undoes() {
        let mut area = EditArea::from_html("<p>a</p>");
        area.surface_mut().set_html("<p>ab</p>");
        area.on_mouse_up();
        let result = area.handle_key_down(&KeyCombo::ctrl(Key::character("z")));
        assert_eq!(result, KeydownResult::Handled);
        assert_snapshot!(area.html(), @"<p>a</p>");
        area.handle_key_down(&KeyCombo::ctrl(Key::character("y")));
        assert_snapshot!(area.html(), @"<p>ab</p>");
    }

    #[test]
    fn typing_records_after_pause() {
        let start = Instant::now();
        let mut area = EditArea::from_html("<p>a</p>");
        area.surface_mut().set_html("<p>ab</p>");
        area.on_key_up(start);
        area.tick(start + Duration::from_millis(100));
        assert!(!area.can_undo());
        area.tick(start + Duration::from_millis(600));
        assert!(area.can_undo());
        assert!(!area.has_pending_work());
    }

    #[test]
    fn plain_text_paste_is_escaped() {
        let mut area = EditArea::from_html("<p>x</p>");
        area.select_text(1, 1);
        area.paste_as_plain_text = true;
        assert!(!area.on_paste("a<b>\nc"));
        assert_snapshot!(area.html(), @"<p>xa&lt;b&gt;<br>c</p>");
        assert!(area.on_paste("ignored"));
    }

    #[test]
    fn source_mode_insert_replaces_field_selection() {
        let mut area = EditArea::from_html("<p>x</p>");
        area.mode = Mode::Html;
        area.set_text_area_value("hello world");
        area.set_text_area_selection(Selection::new(6, 11));
        area.insert_text("there");
        assert_eq!(area.text_area_value(), "hello there");
        assert_eq!(area.text_area_selection(), Selection::collapsed(11));
    }

    #[test]
    fn before_submit_writes_legacy_form() {
        let mut area = EditArea::from_html(r#"<p style="text-align: center;">a</p><p>b</p>"#);
        area.before_submit();
        assert_snapshot!(area.text_area_value(), @r#"
        <p align="center">
        a
        </p>
        <p>
        b
        </p>
        "#);
    }

    #[test]
    fn saved_selection_survives_popup() {
        let mut area = EditArea::from_html("<p>Hello world</p>");
        area.select_text(0, 5);
        area.save_selection();
        area.set_editable(false);
        area.surface_mut().clear_range();
        area.set_editable(true);
        area.restore_selection();
        assert_eq!(area.selected_text(), "Hello");
        assert!(area.has_pending_work());
        area.tick(Instant::now());
        assert!(!area.has_pending_work());
    }

    #[test]
    fn undo_redo_frees_replaced_trees() {
        let mut area = EditArea::from_html("<p>Hello world</p>");
        area.select_text(6, 11);
        area.exec("bold", "");
        assert!(area.undo());
        assert!(area.redo());
        let settled = area.surface().doc().node_count();
        for _ in 0..200 {
            assert!(area.undo());
            assert!(area.redo());
        }
        assert_eq!(area.surface().doc().node_count(), settled);
        assert_snapshot!(area.html(), @"<p>Hello <strong>world</strong></p>");

        area.before_submit();
        assert_eq!(area.surface().doc().node_count(), settled);
        assert!(area.text_area_value().contains("Hello "));
    }
}
