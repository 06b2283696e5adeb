//! Error types for parsing, querying and mutating documents.
//!
//! Every fallible operation in the crate returns [`Result`], whose error type
//! is the [`Error`] enum below. [`ParseError`] reports malformed XML and
//! converts into [`Error`] through `?`, as do tree errors from the document
//! engine. Query compilation and evaluation failures become
//! [`Error::Query`].

use std::fmt;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Source location within an XML fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number (in characters, not bytes).
    pub column: u32,
    /// 0-based byte offset from the start of the input.
    pub byte_offset: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The error returned when XML text is not well-formed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at {location}: {message}")]
pub struct ParseError {
    /// The primary error message.
    pub message: String,
    /// Where in the source the error occurred.
    pub location: SourceLocation,
}

/// Errors surfaced by nodes, node sets, the query facade and the projector.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// `first()` or `last()` was called on an empty node set.
    #[error("node set requires at least one node")]
    EmptyCollection,

    /// `child(index)` was called with an index outside the set.
    #[error("no node at index {index}, set has {len} nodes")]
    IndexOutOfRange {
        /// The index that was requested.
        index: usize,
        /// Length of the set; valid indexes are `0..len`.
        len: usize,
    },

    /// The operation needs a parent, but the node has none.
    #[error("node \"{name}\" has no parent")]
    MissingParent {
        /// Name of the node the operation was applied to.
        name: String,
    },

    /// The document root cannot be replaced or removed.
    #[error("cannot {operation} the document root")]
    InvalidRootMutation {
        /// The attempted operation (e.g. `replace`).
        operation: &'static str,
    },

    /// A value or node was not of the kind the operation requires.
    #[error("type mismatch: {message}")]
    TypeMismatch {
        /// Description of what was expected and what was found.
        message: String,
    },

    /// A `?` placeholder had no corresponding parameter.
    #[error("parameter {index} (1-based) of expression \"{query}\" is missing")]
    MissingQueryParameter {
        /// 1-based position of the missing parameter.
        index: usize,
        /// The query as given by the caller.
        query: String,
    },

    /// A parameter value cannot be rendered as a query literal.
    #[error("query value of type \"{type_name}\" is not recognized")]
    UnsupportedParameterValue {
        /// The type of the offending value.
        type_name: &'static str,
    },

    /// The projector met slot content it does not know how to project.
    #[error("do not know what to do with slot content of type \"{type_name}\"")]
    UnreachableProjectionContent {
        /// Description of the content.
        type_name: String,
    },

    /// The handle addresses a node that was removed or replaced.
    #[error("node handle refers to a node that is no longer in the document")]
    StaleNode,

    /// A syntax-tree kind or slot name is not a valid XML element name.
    #[error("\"{name}\" is not a valid element name")]
    InvalidName {
        /// The rejected name.
        name: String,
    },

    /// XML text passed to a mutation was not well-formed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A path query failed to compile or evaluate.
    #[error("query \"{query}\" failed: {message}")]
    Query {
        /// The query as it was evaluated, after parameter substitution.
        query: String,
        /// The engine's description of the failure.
        message: String,
    },

    /// The document engine rejected a structural change.
    #[error("tree error: {message}")]
    Tree {
        /// The engine's description of the failure.
        message: String,
    },
}

impl From<xot::Error> for Error {
    fn from(err: xot::Error) -> Self {
        Self::Tree {
            message: err.to_string(),
        }
    }
}
