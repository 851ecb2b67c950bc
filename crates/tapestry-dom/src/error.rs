use thiserror::Error;

/// Errors raised by tree and range operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DomError {
    /// `surround_contents` was asked to split a non-text node.
    #[error("range partially selects a non-text node")]
    PartiallySelected,

    /// The node would become its own ancestor, or has no parent to insert around.
    #[error("node cannot be inserted at this position")]
    HierarchyRequest,

    #[error("expected an element node")]
    NotAnElement,

    #[error("offset {offset} is out of bounds for a node of length {length}")]
    InvalidBoundary { offset: usize, length: usize },
}
