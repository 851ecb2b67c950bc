//! The set of editors on a page, owned by whatever bootstraps them.

use tracing::{debug, warn};

use crate::edit_area::EditArea;
use crate::host::{CommandHost, NullHost};

/// Editors keyed by [`EditArea::unique_id`], in registration order.
pub struct EditorRegistry<H = NullHost> {
    editors: Vec<EditArea<H>>,
}

impl<H> Default for EditorRegistry<H> {
    fn default() -> Self {
        Self {
            editors: Vec::new(),
        }
    }
}

impl<H: CommandHost> EditorRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an editor and returns its id. An editor already registered
    /// under the same id is replaced.
    pub fn register(&mut self, area: EditArea<H>) -> String {
        let id = area.unique_id();
        if let Some(existing) = self.editors.iter_mut().find(|e| e.unique_id() == id) {
            warn!(target: "tapestry::command", %id, "editor registered twice, replacing");
            *existing = area;
        } else {
            self.editors.push(area);
        }
        id
    }

    pub fn unregister(&mut self, id: &str) -> Option<EditArea<H>> {
        let index = self.editors.iter().position(|e| e.unique_id() == id)?;
        Some(self.editors.remove(index))
    }

    pub fn get(&self, id: &str) -> Option<&EditArea<H>> {
        self.editors.iter().find(|e| e.unique_id() == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut EditArea<H>> {
        self.editors.iter_mut().find(|e| e.unique_id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EditArea<H>> {
        self.editors.iter()
    }

    pub fn len(&self) -> usize {
        self.editors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.editors.is_empty()
    }

    /// The form is being submitted: every editor writes its content back
    /// to its text field.
    pub fn flush_all(&mut self) {
        debug!(target: "tapestry::command", editors = self.editors.len(), "flushing editors");
        for area in &mut self.editors {
            area.before_submit();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EditorConfig, Mode};
    use crate::edit_area::HostElement;

    fn mount(id: &str, html: &str) -> EditArea {
        EditArea::new(
            HostElement::text_area(id, html),
            HostElement::div(format!("{id}_surface")),
            NullHost,
            EditorConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn lookup_by_text_area_id() {
        let mut registry = EditorRegistry::new();
        assert_eq!(registry.register(mount("body", "<p>a</p>")), "body_html_editor");
        registry.register(mount("summary", "<p>b</p>"));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("summary_html_editor").unwrap().html(), "<p>b</p>");
        assert!(registry.get("body").is_none());

        registry.register(mount("body", "<p>c</p>"));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("body_html_editor").unwrap().html(), "<p>c</p>");
        assert!(registry.unregister("body_html_editor").is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn flush_writes_text_fields() {
        let mut registry = EditorRegistry::new();
        registry.register(mount("a", "<b>x</b>"));
        registry.register(mount("b", "<p>y</p>"));

        let source = registry.get_mut("b_html_editor").unwrap();
        source.update_mode(Mode::Html);
        source.set_text_area_value("<p>typed</p>");
        registry.get_mut("a_html_editor").unwrap().select_all();

        registry.flush_all();
        assert_eq!(registry.get("a_html_editor").unwrap().text_area_value(), "<b>x</b>");
        assert_eq!(registry.get("b_html_editor").unwrap().text_area_value(), "<p>typed</p>");
    }
}
