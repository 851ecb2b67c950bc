//! Command scripts: one editor action per line, replayed against an
//! `EditArea`.
//!
//! ```text
//! # comments and blank lines are skipped
//! select 6 11
//! exec bold
//! exec forecolor #FF0000
//! link http://example.com _blank
//! key ctrl+z
//! mode html
//! ```

use std::sync::Arc;

use miette::{Diagnostic, NamedSource, SourceSpan};
use tapestry_editor_core::{
    CommandHost, EditArea, EditorCommand, EditorError, KeyCombo, Mode, UndoManager,
};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Select { start: usize, end: usize },
    SelectAll,
    Exec { command: EditorCommand, value: String },
    Link { url: String, target: String },
    /// Markup at the caret, or text in source mode.
    Insert(String),
    /// Replaces the text field, as typing in source mode.
    Source(String),
    Key(KeyCombo),
    Mode(Mode),
    Undo,
    Redo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub action: Action,
    /// Where the step's line sits in the script.
    pub span: SourceSpan,
}

#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum ScriptErrorKind {
    #[error("unknown action `{0}`")]
    #[diagnostic(help(
        "expected one of: select, select-all, exec, link, insert, source, key, mode, undo, redo"
    ))]
    UnknownAction(String),

    #[error("`{action}` needs {expected}")]
    MissingArgument {
        action: &'static str,
        expected: &'static str,
    },

    #[error("`{0}` is not a character offset")]
    BadOffset(String),

    #[error("bad key combination: {0}")]
    #[diagnostic(help("write combinations like ctrl+z, shift+enter or space"))]
    BadKey(String),

    #[error("unknown mode `{0}`")]
    #[diagnostic(help("modes are design, html and preview"))]
    BadMode(String),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Rejected(#[from] EditorError),
}

/// A script problem pointing at the offending line.
#[derive(thiserror::Error, Debug, Diagnostic)]
#[error("script error: {kind}")]
#[diagnostic(code(tapestry::script))]
pub struct ScriptError {
    #[diagnostic_source]
    pub kind: ScriptErrorKind,
    #[source_code]
    src: NamedSource<Arc<String>>,
    #[label("here")]
    span: SourceSpan,
}

/// A script read from `name`.
pub struct Script {
    src: NamedSource<Arc<String>>,
    steps: Vec<Step>,
}

impl Script {
    pub fn parse(name: &str, source: impl Into<String>) -> Result<Self, ScriptError> {
        let source = Arc::new(source.into());
        let src = NamedSource::new(name, source.clone());
        let mut steps = Vec::new();
        let mut offset = 0;
        for line in source.split_inclusive('\n') {
            let start = offset;
            offset += line.len();
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let indent = line.len() - line.trim_start().len();
            let span = SourceSpan::new((start + indent).into(), trimmed.len());
            match parse_action(trimmed) {
                Ok(action) => steps.push(Step { action, span }),
                Err(kind) => {
                    return Err(ScriptError {
                        kind,
                        src: src.clone(),
                        span,
                    });
                }
            }
        }
        Ok(Self { src, steps })
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Replays every step. The only step that can fail is a link with a
    /// rejected URL.
    pub fn run<H: CommandHost>(&self, area: &mut EditArea<H>) -> Result<(), ScriptError> {
        for step in &self.steps {
            debug!(target: "tapestry::command", action = ?step.action, "script step");
            apply(area, &step.action).map_err(|err| ScriptError {
                kind: err.into(),
                src: self.src.clone(),
                span: step.span,
            })?;
        }
        Ok(())
    }
}

fn apply<H: CommandHost>(area: &mut EditArea<H>, action: &Action) -> Result<(), EditorError> {
    match action {
        Action::Select { start, end } => area.select_text(*start, *end),
        Action::SelectAll => area.select_all(),
        Action::Exec { command, value } => area.format_doc(command, false, value),
        Action::Link { url, target } => area.create_link(url, target)?,
        Action::Insert(value) => {
            area.insert_text(value);
            area.record_change();
        }
        Action::Source(value) => area.set_text_area_value(value.as_str()),
        Action::Key(combo) => {
            area.handle_key_down(combo);
        }
        Action::Mode(mode) => {
            area.update_mode(*mode);
        }
        Action::Undo => {
            area.undo();
        }
        Action::Redo => {
            area.redo();
        }
    }
    Ok(())
}

fn parse_offset(word: &str) -> Result<usize, ScriptErrorKind> {
    word.parse()
        .map_err(|_| ScriptErrorKind::BadOffset(word.to_string()))
}

fn parse_action(line: &str) -> Result<Action, ScriptErrorKind> {
    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(word, rest)| (word, rest.trim()));
    let missing = |action, expected| ScriptErrorKind::MissingArgument { action, expected };
    Ok(match word.to_ascii_lowercase().as_str() {
        "select" => {
            let mut words = rest.split_whitespace();
            let start = words.next().ok_or_else(|| missing("select", "a start offset"))?;
            let start = parse_offset(start)?;
            let end = match words.next() {
                Some(end) => parse_offset(end)?,
                None => start,
            };
            Action::Select { start, end }
        }
        "select-all" => Action::SelectAll,
        "exec" => {
            let (name, value) = rest
                .split_once(char::is_whitespace)
                .map_or((rest, ""), |(name, value)| (name, value.trim()));
            if name.is_empty() {
                return Err(missing("exec", "a command name"));
            }
            Action::Exec {
                command: EditorCommand::from(name),
                value: value.to_string(),
            }
        }
        "link" => {
            let mut words = rest.split_whitespace();
            let url = words.next().ok_or_else(|| missing("link", "a URL"))?;
            Action::Link {
                url: url.to_string(),
                target: words.next().unwrap_or_default().to_string(),
            }
        }
        "insert" => Action::Insert(rest.to_string()),
        "source" => Action::Source(rest.to_string()),
        "key" => {
            if rest.is_empty() {
                return Err(missing("key", "a key combination"));
            }
            Action::Key(rest.parse().map_err(ScriptErrorKind::BadKey)?)
        }
        "mode" => Action::Mode(match rest.to_ascii_lowercase().as_str() {
            "design" => Mode::Design,
            "html" | "source" => Mode::Html,
            "preview" => Mode::Preview,
            "" => return Err(missing("mode", "a mode")),
            other => return Err(ScriptErrorKind::BadMode(other.to_string())),
        }),
        "undo" => Action::Undo,
        "redo" => Action::Redo,
        other => return Err(ScriptErrorKind::UnknownAction(other.to_string())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use tapestry_editor_core::{InlineFormat, Key};

    fn actions(source: &str) -> Vec<Action> {
        Script::parse("test.script", source)
            .unwrap()
            .steps()
            .iter()
            .map(|step| step.action.clone())
            .collect()
    }

    #[test]
    fn parses_actions() {
        let parsed = actions(
            "# setup\nselect 6 11\n\n  exec bold\nexec forecolor #FF0000\nlink http://x _blank\nkey ctrl+z\nmode HTML\nselect 3\n",
        );
        assert_eq!(
            parsed,
            vec![
                Action::Select { start: 6, end: 11 },
                Action::Exec {
                    command: EditorCommand::Format(InlineFormat::Bold),
                    value: String::new(),
                },
                Action::Exec {
                    command: EditorCommand::ForeColor,
                    value: "#FF0000".into(),
                },
                Action::Link {
                    url: "http://x".into(),
                    target: "_blank".into(),
                },
                Action::Key(KeyCombo::ctrl(Key::character("z"))),
                Action::Mode(Mode::Html),
                Action::Select { start: 3, end: 3 },
            ]
        );
    }

    #[test]
    fn errors_point_at_the_line() {
        let source = "select 0 3\n  exec\n";
        let err = Script::parse("test.script", source).err().unwrap();
        assert!(matches!(
            err.kind,
            ScriptErrorKind::MissingArgument { action: "exec", .. }
        ));
        assert_eq!(err.span, SourceSpan::new(13.into(), 4));
        assert_snapshot!(err.to_string(), @"script error: `exec` needs a command name");

        let err = Script::parse("test.script", "select x").err().unwrap();
        assert_snapshot!(err.to_string(), @"script error: `x` is not a character offset");
        let err = Script::parse("test.script", "frobnicate").err().unwrap();
        assert!(matches!(err.kind, ScriptErrorKind::UnknownAction(_)));
        let err = Script::parse("test.script", "mode wysiwyg").err().unwrap();
        assert!(matches!(err.kind, ScriptErrorKind::BadMode(_)));
    }

    #[test]
    fn replays_against_an_editor() {
        let script = Script::parse(
            "test.script",
            "select 6 11\nexec bold\nselect 0 5\nexec italic\nundo\n",
        )
        .unwrap();
        let mut area = EditArea::from_html("<p>Hello world</p>");
        script.run(&mut area).unwrap();
        assert_snapshot!(area.html(), @"<p>Hello <strong>world</strong></p>");
    }

    #[test]
    fn rejected_link_keeps_location() {
        let script = Script::parse("test.script", "select 0 3\nlink https://\n").unwrap();
        let mut area = EditArea::from_html("<p>abc</p>");
        let err = script.run(&mut area).err().unwrap();
        assert!(matches!(
            err.kind,
            ScriptErrorKind::Rejected(EditorError::InvalidLinkUrl { .. })
        ));
        assert_eq!(err.span, SourceSpan::new(11.into(), 13));
    }
}
