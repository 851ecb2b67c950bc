//! Error types for the editor core.
//!
//! Selection-dependent operations never fail: with no range they do nothing.
//! `EditorError` covers construction, link validation and configuration.

use miette::Diagnostic;

#[derive(thiserror::Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum EditorError {
    /// The host handed over the wrong elements for the source field and
    /// editing surface.
    #[error("invalid host elements: expected <textarea> and <div>, got <{text_area}> and <{editor}>")]
    #[diagnostic(
        code(tapestry::host_elements),
        help("mount the editor on a textarea and a div container")
    )]
    InvalidHostElements { text_area: String, editor: String },

    /// A link was requested with an empty or placeholder URL.
    #[error("no link URL given")]
    #[diagnostic(
        code(tapestry::link_url),
        help("enter a URL other than the placeholder {placeholder:?}")
    )]
    InvalidLinkUrl { placeholder: String },

    #[error("invalid configuration in {path}: {message}")]
    #[diagnostic(code(tapestry::config))]
    Config { path: String, message: String },

    #[error(transparent)]
    #[diagnostic(code(tapestry::io))]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = EditorError> = std::result::Result<T, E>;
