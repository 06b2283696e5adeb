//! Path-query facade.
//!
//! Callers write queries with `?` placeholders and pass the values
//! separately, so untrusted text never has to be spliced into an expression
//! by hand:
//!
//! ```
//! use xmlquery::query::{parameterize, QueryParam};
//!
//! let query = parameterize("//Token[@kind=? and text()=?]", &[
//!     QueryParam::from(12),
//!     QueryParam::from("function"),
//! ]).unwrap();
//! assert_eq!(query, r#"//Token[@kind=12 and text()="function"]"#);
//! ```
//!
//! A `?` inside a string literal is left alone, which is how a query matches
//! a literal question mark.
//!
//! Queries are `XPath` 3.1 expressions compiled and run by `xee-xpath`
//! against the document's `xot` tree.

use std::fmt;

use tracing::trace;
use xee_xpath::query::SequenceQuery;
use xee_xpath::{Atomic, Item, Queries, Query, Sequence};

use crate::document::{Document, NodeId};
use crate::error::{Error, Result};

/// A value substituted for a `?` placeholder.
///
/// Strings become `XPath` string literals and numbers are written verbatim.
/// [`Boolean`](Self::Boolean), [`Null`](Self::Null) and non-finite floats have
/// no literal form and are rejected by [`parameterize`].
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    /// Text, quoted on substitution.
    String(String),
    /// An integer, written verbatim.
    Integer(i64),
    /// A float, written verbatim when finite.
    Float(f64),
    /// Not representable in a query.
    Boolean(bool),
    /// Not representable in a query.
    Null,
}

impl QueryParam {
    /// Name of the value's type, as reported in errors.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Integer(_) => "integer",
            Self::Float(f) if f.is_finite() => "float",
            Self::Float(_) => "non-finite float",
            Self::Boolean(_) => "boolean",
            Self::Null => "null",
        }
    }

    /// Renders the value as an expression literal.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedParameterValue`] for booleans, nulls and
    /// non-finite floats.
    pub fn to_literal(&self) -> Result<String> {
        match self {
            Self::String(s) => Ok(string_literal(s)),
            Self::Integer(n) => Ok(n.to_string()),
            Self::Float(f) if f.is_finite() => Ok(f.to_string()),
            _ => Err(Error::UnsupportedParameterValue {
                type_name: self.type_name(),
            }),
        }
    }
}

impl fmt::Display for QueryParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Null => f.write_str("null"),
        }
    }
}

impl From<&str> for QueryParam {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for QueryParam {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i32> for QueryParam {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for QueryParam {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<i64> for QueryParam {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for QueryParam {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for QueryParam {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl<T: Into<QueryParam>> From<Option<T>> for QueryParam {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Replaces each unquoted `?` in `query` with the next parameter.
///
/// A quoted region opens on `"` or `'` and closes only on the same
/// character. Surplus parameters are ignored.
///
/// # Errors
///
/// Returns [`Error::MissingQueryParameter`] when there are more placeholders
/// than parameters, and [`Error::UnsupportedParameterValue`] when a
/// parameter has no literal form.
///
/// # Examples
///
/// ```
/// use xmlquery::query::parameterize;
///
/// let query = parameterize("//x[@a='?' and @b=?]", &["v".into()]).unwrap();
/// assert_eq!(query, r#"//x[@a='?' and @b="v"]"#);
/// ```
pub fn parameterize(query: &str, params: &[QueryParam]) -> Result<String> {
    let mut output = String::with_capacity(query.len());
    let mut quote: Option<char> = None;
    let mut next = 0;

    for ch in query.chars() {
        match (quote, ch) {
            (None, '"' | '\'') => quote = Some(ch),
            (Some(open), _) if open == ch => quote = None,
            (None, '?') => {
                let param = params.get(next).ok_or_else(|| Error::MissingQueryParameter {
                    index: next + 1,
                    query: query.to_string(),
                })?;
                next += 1;
                output.push_str(&param.to_literal()?);
                continue;
            }
            _ => {}
        }
        output.push(ch);
    }

    Ok(output)
}

/// The result of evaluating a query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    /// Nodes in document order. An empty result is an empty node list.
    Nodes(Vec<NodeId>),
    /// A single boolean.
    Boolean(bool),
    /// A single number of any numeric type.
    Number(f64),
    /// A single string or other atomic value, as its string value.
    String(String),
    /// Several items of which at least one is not a node.
    Sequence(Vec<QueryValue>),
}

impl QueryValue {
    /// Name of the value's type, as reported in errors.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Nodes(_) => "node sequence",
            Self::Boolean(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Sequence(_) => "mixed sequence",
        }
    }

    fn from_sequence(doc: &Document, sequence: &Sequence, query: &str) -> Result<Self> {
        let items: Vec<Item> = sequence.iter().collect();
        if items.iter().all(|item| matches!(item, Item::Node(_))) {
            let nodes = items
                .into_iter()
                .filter_map(|item| match item {
                    Item::Node(node) => Some(node),
                    _ => None,
                })
                .collect();
            return Ok(Self::Nodes(nodes));
        }
        let mut values = items
            .into_iter()
            .map(|item| Self::from_item(doc, item, query))
            .collect::<Result<Vec<_>>>()?;
        if values.len() == 1 {
            if let Some(value) = values.pop() {
                return Ok(value);
            }
        }
        Ok(Self::Sequence(values))
    }

    fn from_item(doc: &Document, item: Item, query: &str) -> Result<Self> {
        match item {
            Item::Node(node) => Ok(Self::Nodes(vec![node])),
            Item::Atomic(Atomic::Boolean(b)) => Ok(Self::Boolean(b)),
            Item::Atomic(atomic) if atomic.is_numeric() => f64::try_from(atomic)
                .map(Self::Number)
                .map_err(|e| query_error(query, &e)),
            Item::Atomic(atomic) => Item::Atomic(atomic)
                .string_value(doc.xot())
                .map(Self::String)
                .map_err(|e| query_error(query, &e)),
            Item::Function(_) => Err(Error::TypeMismatch {
                message: format!("query \"{query}\" returned a function"),
            }),
        }
    }
}

/// A query compiled once and run against any number of scope nodes.
pub(crate) struct CompiledQuery {
    text: String,
    query: SequenceQuery,
}

impl CompiledQuery {
    /// Substitutes `params` and compiles the result.
    pub(crate) fn new(query: &str, params: &[QueryParam]) -> Result<Self> {
        let text = parameterize(query, params)?;
        let query = Queries::default()
            .sequence(&text)
            .map_err(|e| query_error(&text, &e))?;
        Ok(Self { text, query })
    }

    pub(crate) fn text(&self) -> &str {
        &self.text
    }

    fn run(&self, doc: &mut Document, scope: NodeId) -> Result<Sequence> {
        trace!(query = %self.text, "evaluating query");
        let program = self.query.program();
        // A context without shared documents gets fresh document-order
        // annotations, which mutations between runs would otherwise
        // invalidate.
        let mut builder = program.dynamic_context_builder();
        builder.context_node(scope);
        let context = builder.build();
        program
            .runnable(&context)
            .many(doc.xot_mut())
            .map_err(|e| query_error(&self.text, &e))
    }

    /// Evaluates the query and converts the result.
    pub(crate) fn evaluate(&self, doc: &mut Document, scope: NodeId) -> Result<QueryValue> {
        let sequence = self.run(doc, scope)?;
        QueryValue::from_sequence(doc, &sequence, &self.text)
    }

    /// Evaluates the query and requires a sequence of tree nodes.
    pub(crate) fn select(&self, doc: &mut Document, scope: NodeId) -> Result<Vec<NodeId>> {
        let nodes = match self.evaluate(doc, scope)? {
            QueryValue::Nodes(nodes) => nodes,
            other => {
                return Err(Error::TypeMismatch {
                    message: format!(
                        "query \"{}\" returned a {} instead of nodes",
                        self.text,
                        other.type_name()
                    ),
                })
            }
        };
        if nodes.iter().any(|&node| doc.is_attribute_like(node)) {
            return Err(Error::TypeMismatch {
                message: format!("query \"{}\" selected an attribute node", self.text),
            });
        }
        Ok(nodes)
    }

    /// Evaluates the query and returns its effective boolean value.
    pub(crate) fn matches(&self, doc: &mut Document, scope: NodeId) -> Result<bool> {
        self.run(doc, scope)?
            .effective_boolean_value()
            .map_err(|e| query_error(&self.text, &e))
    }
}

/// Substitutes `params` into `query` and evaluates it with `scope` as the
/// context node.
///
/// # Errors
///
/// Fails with the errors of [`parameterize`], or with [`Error::Query`] if
/// the resulting expression does not compile or evaluate.
pub fn evaluate(
    doc: &mut Document,
    scope: NodeId,
    query: &str,
    params: &[QueryParam],
) -> Result<QueryValue> {
    CompiledQuery::new(query, params)?.evaluate(doc, scope)
}

fn query_error(query: &str, err: &impl fmt::Display) -> Error {
    Error::Query {
        query: query.to_string(),
        message: err.to_string(),
    }
}

/// Quotes `value` as a string literal. A quote character inside a literal
/// is escaped by doubling it.
fn string_literal(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}
