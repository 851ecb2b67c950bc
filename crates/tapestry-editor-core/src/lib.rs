//! tapestry-editor-core: rich-text editing over an HTML tree, without a
//! browser.
//!
//! This crate provides:
//! - `query` - ancestor and range lookups
//! - `mutate` - selection-aware wrapping, unwrapping, styling and insertion
//! - `normalize` - CSS/tag canonicalization, the legacy form and sanitizing
//! - `EditArea` - the editor object: command dispatch, modes, history, input events
//! - `Toolbar` and `EditorRegistry` - the page-level pieces around editors

pub mod actions;
pub mod command;
pub mod config;
pub mod debounce;
pub mod edit_area;
pub mod error;
pub mod host;
pub mod mutate;
pub mod normalize;
pub mod query;
pub mod registry;
pub mod selection;
pub mod surface;
pub mod tags;
pub mod toolbar;
pub mod types;
pub mod undo;

pub use actions::{Key, KeyCombo, KeydownResult, Modifiers};
pub use command::{EditorCommand, FontValue};
pub use config::{EditorConfig, Mode, ToolbarStyle};
pub use debounce::Debouncer;
pub use edit_area::{EditArea, HostElement};
pub use error::{EditorError, Result};
pub use host::{CommandHost, NullHost};
pub use mutate::InlineTarget;
pub use normalize::{Pass, normalize, sanitize};
pub use query::{NodeKinds, NodesInRange};
pub use registry::EditorRegistry;
pub use selection::SavedSelection;
pub use smol_str::SmolStr;
pub use surface::Surface;
pub use tags::InlineFormat;
pub use toolbar::{Capabilities, ItemKind, PopupRegistry, Toolbar, ToolbarItem};
pub use types::{Affinity, Align, CaretPosition, Direction, Selection, TextPosition, TextSelection};
pub use undo::{History, UndoEntry, UndoManager};
