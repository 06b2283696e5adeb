//! Lossless projection of syntax trees into XML documents.
//!
//! [`Projector::project`] walks a syntax tree depth-first and builds one
//! element per syntax node, one element per named child slot and one
//! `Token` element per token, preceded by a `Preamble` element when the
//! token has leading trivia. Because every token's trivia and text are each
//! captured exactly once, the text content of the resulting document is the
//! original source, byte for byte.
//!
//! For the source `a = 1;` a statement might project as:
//!
//! ```text
//! <Ast parse-time="0.000041">
//!   <ExpressionStatement>
//!     <Expression>
//!       <AssignmentExpression>
//!         <LeftOperand><Token kind="Name">a</Token></LeftOperand>
//!         <Operator><Preamble> </Preamble><Token kind="Equals">=</Token></Operator>
//!         <RightOperand><Preamble> </Preamble><Token kind="Integer">1</Token></RightOperand>
//!       </AssignmentExpression>
//!     </Expression>
//!     <Semicolon><Token kind="Semicolon">;</Token></Semicolon>
//!   </ExpressionStatement>
//! </Ast>
//! ```
//!
//! The syntax tree reaches the projector only through the [`SyntaxNode`] and
//! [`SyntaxToken`] traits. [`OwnedNode`] and [`OwnedToken`] implement them
//! for callers without a tree of their own.

mod enhancer;
mod owned;
mod syntax;

pub use enhancer::{ElementMut, Enhancer, NamespacedNameEnhancer, QualifiedNameEnhancer};
pub use owned::{OwnedNode, OwnedSlot, OwnedToken};
pub use syntax::{
    Capability, CapabilityKind, ChildSlot, NameQualification, Slot, SyntaxNode, SyntaxToken,
    TokenSpan,
};

use std::fmt;
use std::time::Instant;

use tracing::{debug, trace};

use crate::document::{Document, NodeId};
use crate::error::{Error, Result};
use crate::node::Node;

/// Options controlling the shape of projected documents.
///
/// ```
/// use xmlquery::projector::ProjectorOptions;
///
/// let opts = ProjectorOptions::default()
///     .root_name("SourceTree")
///     .token_positions(true);
/// assert!(opts.record_parse_time);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectorOptions {
    /// Name of the element wrapping the projected tree (default: `Ast`).
    pub root_name: String,
    /// Store the projection time, in seconds, in the `parse-time` attribute
    /// of the root element (default: true).
    pub record_parse_time: bool,
    /// Store `full-start`, `start` and `length` attributes on `Token`
    /// elements whose token reports a span (default: false).
    pub token_positions: bool,
}

impl Default for ProjectorOptions {
    fn default() -> Self {
        Self {
            root_name: "Ast".to_string(),
            record_parse_time: true,
            token_positions: false,
        }
    }
}

impl ProjectorOptions {
    /// Sets the root element name.
    #[must_use]
    pub fn root_name(mut self, name: impl Into<String>) -> Self {
        self.root_name = name.into();
        self
    }

    /// Enables or disables the `parse-time` attribute.
    #[must_use]
    pub fn record_parse_time(mut self, record: bool) -> Self {
        self.record_parse_time = record;
        self
    }

    /// Enables or disables token position attributes.
    #[must_use]
    pub fn token_positions(mut self, enabled: bool) -> Self {
        self.token_positions = enabled;
        self
    }
}

/// Builds XML documents from syntax trees.
///
/// Enhancers run in registration order.
#[derive(Default)]
pub struct Projector {
    options: ProjectorOptions,
    enhancers: Vec<Box<dyn Enhancer>>,
}

impl Projector {
    /// Creates a projector with default options and no enhancers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a projector with the given options and no enhancers.
    #[must_use]
    pub fn with_options(options: ProjectorOptions) -> Self {
        Self {
            options,
            enhancers: Vec::new(),
        }
    }

    /// Registers an enhancer.
    #[must_use]
    pub fn with_enhancer(mut self, enhancer: impl Enhancer + 'static) -> Self {
        self.add_enhancer(enhancer);
        self
    }

    /// Registers an enhancer.
    pub fn add_enhancer(&mut self, enhancer: impl Enhancer + 'static) {
        self.enhancers.push(Box::new(enhancer));
    }

    /// The options in effect.
    #[must_use]
    pub fn options(&self) -> &ProjectorOptions {
        &self.options
    }

    /// Projects `root`, parsed from `source`, and returns a handle to the
    /// document root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnreachableProjectionContent`] for slot content that
    /// cannot be represented and [`Error::InvalidName`] for a kind, slot or
    /// attribute name that is not a valid XML name.
    pub fn project(&self, source: &str, root: &dyn SyntaxNode) -> Result<Node> {
        self.project_document(source, root).map(Node::from_document)
    }

    /// Projects `root`, parsed from `source`, into a bare document.
    ///
    /// # Errors
    ///
    /// Fails under the same conditions as [`project`](Self::project).
    pub fn project_document(&self, source: &str, root: &dyn SyntaxNode) -> Result<Document> {
        let start = Instant::now();
        debug!(
            root = %self.options.root_name,
            enhancers = self.enhancers.len(),
            source_len = source.len(),
            "projecting syntax tree"
        );

        let mut walk = Walk {
            projector: self,
            source,
            doc: Document::new(),
            elements: 0,
        };
        let document_root = walk.doc.root();
        let ast = walk.element(&self.options.root_name, document_root)?;
        walk.run(root, ast)?;

        let elapsed = start.elapsed().as_secs_f64();
        if self.options.record_parse_time {
            walk.doc.set_attribute(ast, "parse-time", elapsed.to_string())?;
        }
        debug!(elapsed, elements = walk.elements, "projection finished");
        Ok(walk.doc)
    }
}

impl fmt::Debug for Projector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Projector")
            .field("options", &self.options)
            .field("enhancers", &self.enhancers.len())
            .finish()
    }
}

/// State of one projection.
struct Walk<'p> {
    projector: &'p Projector,
    source: &'p str,
    doc: Document,
    elements: usize,
}

/// Pending work of the depth-first walk, with the element it goes under.
enum Work<'t> {
    Node(&'t dyn SyntaxNode, NodeId),
    Slot(Slot<'t>, NodeId),
}

impl Walk<'_> {
    /// Projects `root` under `parent`. The walk keeps its own stack, so
    /// tree depth is bounded by memory rather than by the call stack.
    fn run<'t>(&mut self, root: &'t dyn SyntaxNode, parent: NodeId) -> Result<()> {
        let mut stack = vec![Work::Node(root, parent)];
        while let Some(work) = stack.pop() {
            match work {
                Work::Node(node, parent) => {
                    let element = self.node(node, parent)?;
                    let mut slots = Vec::new();
                    for slot in node.child_slots() {
                        let slot_element = self.element(&capitalize(slot.name), element)?;
                        slots.push(Work::Slot(slot.content, slot_element));
                    }
                    stack.extend(slots.into_iter().rev());
                }
                Work::Slot(Slot::Empty, _) => {}
                Work::Slot(Slot::Node(node), parent) => stack.push(Work::Node(node, parent)),
                Work::Slot(Slot::Token(token), parent) => self.token(token, parent)?,
                Work::Slot(Slot::List(items), parent) => {
                    stack.extend(items.into_iter().rev().map(|item| Work::Slot(item, parent)));
                }
                Work::Slot(Slot::Unknown(type_name), _) => {
                    return Err(Error::UnreachableProjectionContent { type_name })
                }
            }
        }
        Ok(())
    }

    /// Creates the element of one syntax node and runs the enhancers on it.
    fn node(&mut self, node: &dyn SyntaxNode, parent: NodeId) -> Result<NodeId> {
        let kind = node.kind_name();
        trace!(kind, "projecting syntax node");
        let element = self.element(kind, parent)?;

        let mut handle = ElementMut::new(&mut self.doc, element);
        for enhancer in &self.projector.enhancers {
            enhancer.enhance(node, &mut handle);
        }
        if let Some(name) = handle.into_rejected() {
            return Err(Error::InvalidName { name });
        }
        Ok(element)
    }

    fn token(&mut self, token: &dyn SyntaxToken, parent: NodeId) -> Result<()> {
        let trivia = token.leading_trivia(self.source);
        if !trivia.is_empty() {
            let preamble = self.element("Preamble", parent)?;
            let text = self.doc.create_text(trivia);
            self.doc.append_child(preamble, text)?;
        }

        let element = self.element("Token", parent)?;
        self.doc.set_attribute(element, "kind", token.kind_name())?;
        if self.projector.options.token_positions {
            if let Some(span) = token.span() {
                self.doc.set_attribute(element, "full-start", span.full_start.to_string())?;
                self.doc.set_attribute(element, "start", span.start.to_string())?;
                self.doc.set_attribute(element, "length", span.length.to_string())?;
            }
        }

        let content = token.text(self.source);
        if !content.is_empty() {
            let text = self.doc.create_text(content);
            self.doc.append_child(element, text)?;
        }
        Ok(())
    }

    fn element(&mut self, name: &str, parent: NodeId) -> Result<NodeId> {
        let id = self.doc.create_element(name)?;
        self.doc.append_child(parent, id)?;
        self.elements += 1;
        Ok(id)
    }
}

/// Upper-cases the first character of a slot name.
fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
