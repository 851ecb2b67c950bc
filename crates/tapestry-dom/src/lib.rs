//! tapestry-dom: the document model the editor mutates.
//!
//! This crate provides:
//! - `Document` - an arena of element, text and marker nodes addressed by `NodeId`
//! - `StyleDeclaration` - ordered inline `style` attribute handling
//! - `Range` - DOM-style boundary points with containment and surround operations
//! - HTML fragment parsing (html5ever) and innerHTML-style serialization

pub mod document;
pub mod error;
pub mod html;
pub mod range;
pub mod style;

pub use document::{Attribute, Document, ElementData, NodeData, NodeId, is_void_element};
pub use error::DomError;
pub use html::{
    format_html_string, inner_html, inner_html_filtered, outer_html, parse_fragment, set_inner_html,
};
pub use range::{Boundary, Range, compare_points};
pub use smol_str::SmolStr;
pub use style::StyleDeclaration;
