//! Editor configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EditorError, Result};

/// Which toolbar layout to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolbarStyle {
    Simple,
    #[default]
    Full,
}

/// Editing surface mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Rich-text editing on the live tree.
    #[default]
    Design,
    /// Editing the serialized markup in the source field.
    Html,
    /// Read-only view of the live tree.
    Preview,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Undo steps kept before the oldest is dropped.
    pub history_capacity: usize,
    /// Quiet period after a key-up before history records.
    pub debounce_wait_ms: u64,
    /// Upper bound on how long a burst of typing can defer recording.
    pub debounce_max_wait_ms: u64,
    pub indent_step_px: i64,
    /// Value pre-filled in the link dialog. Submitting it unchanged is rejected.
    pub link_placeholder: String,
    /// Text of a link created at a collapsed caret.
    pub new_link_text: String,
    pub toolbar: ToolbarStyle,
    pub mode: Mode,
    pub show_bottom_toolbar: bool,
    /// Canned snippets offered by the insert-list box.
    pub insert_list_values: Vec<String>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_capacity: 100,
            debounce_wait_ms: 500,
            debounce_max_wait_ms: 1500,
            indent_step_px: 40,
            link_placeholder: "https://".into(),
            new_link_text: "new link".into(),
            toolbar: ToolbarStyle::Full,
            mode: Mode::Design,
            show_bottom_toolbar: true,
            insert_list_values: Vec::new(),
        }
    }
}

impl EditorConfig {
    /// Loads a config file, choosing JSON or TOML by extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json(&source).map_err(|message| config_error(path, message))
        } else {
            Self::from_toml(&source).map_err(|message| config_error(path, message))
        }
    }

    pub fn from_toml(source: &str) -> std::result::Result<Self, String> {
        toml::from_str(source).map_err(|e| e.to_string())
    }

    pub fn from_json(source: &str) -> std::result::Result<Self, String> {
        serde_json::from_str(source).map_err(|e| e.to_string())
    }
}

fn config_error(path: &Path, message: String) -> EditorError {
    EditorError::Config {
        path: path.display().to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = EditorConfig::from_toml(
            r#"
            history_capacity = 5
            toolbar = "simple"
            mode = "preview"
            "#,
        )
        .unwrap();
        assert_eq!(config.history_capacity, 5);
        assert_eq!(config.toolbar, ToolbarStyle::Simple);
        assert_eq!(config.mode, Mode::Preview);
        assert_eq!(config.debounce_wait_ms, 500);
        assert_eq!(config.link_placeholder, "https://");
    }

    #[test]
    fn json_config() {
        let config =
            EditorConfig::from_json(r#"{"indent_step_px": 20, "insert_list_values": ["[name]"]}"#)
                .unwrap();
        assert_eq!(config.indent_step_px, 20);
        assert_eq!(config.insert_list_values, vec!["[name]".to_string()]);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(EditorConfig::from_toml("mode = \"wysiwyg\"").is_err());
    }
}
