//! # xmlquery
//!
//! Projects syntax trees into XML documents without losing a byte of the
//! source, then lets you query them with `XPath` 3.1 and rewrite them with
//! a small set of structural mutations.
//!
//! ## Quick Start
//!
//! ```
//! use xmlquery::Node;
//!
//! let root = Node::from_xml(r#"<class name="Foo"><method>bar</method></class>"#).unwrap();
//! let methods = root.find("//class[@name=?]/method", &["Foo".into()]).unwrap();
//! assert_eq!(methods.text().unwrap(), "bar");
//!
//! methods.first().unwrap().after("<method>baz</method>").unwrap();
//! assert_eq!(root.find("//method", &[]).unwrap().len(), 2);
//! ```
//!
//! ## Layout
//!
//! - [`projector`]: syntax tree to document, with enhancers.
//! - [`node`]: node handles, node sets and attribute maps.
//! - [`query`]: `?` parameter substitution and query evaluation.
//! - [`document`]: the document engine, a thin layer over `xot`; queries
//!   are compiled and run by `xee-xpath`.

pub mod document;
pub mod error;
pub mod node;
pub mod projector;
pub mod query;

// Re-export primary types at the crate root for convenience.
pub use error::{Error, Result};
pub use node::{Attributes, Fragment, Node, NodeSet};
pub use projector::{Enhancer, Projector, ProjectorOptions, SyntaxNode, SyntaxToken};
pub use document::{Document, NodeId};
pub use query::{parameterize, QueryParam, QueryValue};
