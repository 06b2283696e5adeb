//! Node handles: navigation, querying and structural mutation.
//!
//! A [`Node`] pairs a shared document with the id of one of its nodes.
//! Handles are cheap to clone and keep the document alive; mutating through
//! one handle is visible through every other handle into the same document.
//!
//! ```
//! use xmlquery::Node;
//!
//! let root = Node::from_xml("<list><item>one</item></list>").unwrap();
//! let list = root.find("//list", &[]).unwrap().first().unwrap();
//! list.append("<item>two</item>").unwrap();
//!
//! assert_eq!(root.text().unwrap(), "onetwo");
//! assert_eq!(list.children().unwrap().len(), 2);
//! ```
//!
//! A handle whose node was removed or replaced becomes *stale*: every
//! operation on it fails with [`Error::StaleNode`]. Removed subtrees are
//! detached but never freed, so a stale id can never alias a newer node.

mod attributes;
mod set;

pub use attributes::Attributes;
pub use set::NodeSet;

use std::borrow::Cow;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::document::{Document, NodeId};
use crate::error::{Error, ParseError, Result, SourceLocation};
use crate::query::{CompiledQuery, QueryParam, QueryValue};

// ---------------------------------------------------------------------------
// Fragment
// ---------------------------------------------------------------------------

/// Content handed to a mutation: what gets inserted or substituted.
///
/// Whatever the source, the mutation inserts an independent deep copy, so
/// the source is never moved or aliased.
#[derive(Debug, Clone)]
pub enum Fragment<'a> {
    /// An existing node, from this document or another one.
    Node(&'a Node),
    /// XML text, parsed as element content. The first parsed node is used,
    /// skipping whitespace-only text before it.
    Xml(Cow<'a, str>),
    /// A node of a bare engine document. The id is checked against the
    /// document's tree before it is used.
    Raw {
        /// The document holding the node.
        document: &'a Document,
        /// The node to copy.
        id: NodeId,
    },
}

impl<'a> From<&'a Node> for Fragment<'a> {
    fn from(node: &'a Node) -> Self {
        Self::Node(node)
    }
}

impl<'a> From<&'a str> for Fragment<'a> {
    fn from(xml: &'a str) -> Self {
        Self::Xml(Cow::Borrowed(xml))
    }
}

impl From<String> for Fragment<'_> {
    fn from(xml: String) -> Self {
        Self::Xml(Cow::Owned(xml))
    }
}

impl<'a> From<(&'a Document, NodeId)> for Fragment<'a> {
    fn from((document, id): (&'a Document, NodeId)) -> Self {
        Self::Raw { document, id }
    }
}

impl<'a> Fragment<'a> {
    /// Resolves the fragment into something that can be copied repeatedly.
    /// XML text is parsed here, once.
    pub(crate) fn prepare(self) -> Result<Prepared<'a>> {
        match self {
            Self::Node(node) => Ok(Prepared::Handle(node)),
            Self::Raw { document, id } => Ok(Prepared::Borrowed { document, id }),
            Self::Xml(xml) => {
                let document = Document::parse_fragment(&xml)?;
                let id = document
                    .children(document.root())
                    .find(|&child| !is_blank_text(&document, child))
                    .ok_or_else(|| ParseError {
                        message: "fragment contains no nodes".to_string(),
                        location: SourceLocation::default(),
                    })?;
                Ok(Prepared::Owned { document, id })
            }
        }
    }
}

fn is_blank_text(doc: &Document, id: NodeId) -> bool {
    doc.xot().text_str(id).is_some_and(|text| text.trim().is_empty())
}

/// A fragment ready to be imported into any number of targets.
pub(crate) enum Prepared<'a> {
    Handle(&'a Node),
    Owned { document: Document, id: NodeId },
    Borrowed { document: &'a Document, id: NodeId },
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// A handle to one node of a shared document.
#[derive(Clone)]
pub struct Node {
    doc: Rc<RefCell<Document>>,
    id: NodeId,
}

impl Node {
    /// Parses `xml` as a complete document and returns its document root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if `xml` is not a well-formed document.
    pub fn from_xml(xml: &str) -> Result<Self> {
        Ok(Self::from_document(Document::parse_str(xml)?))
    }

    /// Parses `xml` as a complete document and returns the first child of
    /// its document root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if `xml` is not a well-formed document.
    pub fn from_xml_first_child(xml: &str) -> Result<Self> {
        let root = Self::from_xml(xml)?;
        let first = root.doc.borrow().first_child(root.id);
        first.map(|id| root.handle(id)).ok_or(Error::EmptyCollection)
    }

    /// Takes ownership of `doc` and returns its document root.
    #[must_use]
    pub fn from_document(doc: Document) -> Self {
        let id = doc.root();
        Self {
            doc: Rc::new(RefCell::new(doc)),
            id,
        }
    }

    /// The engine id of the addressed node.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Runs `f` with read access to the underlying document.
    ///
    /// # Panics
    ///
    /// Panics if called from inside another `with_document` closure that is
    /// mutating the same document.
    pub fn with_document<R>(&self, f: impl FnOnce(&Document) -> R) -> R {
        f(&self.doc.borrow())
    }

    /// Returns `true` if the addressed node has been removed or replaced.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        !self.doc.borrow().contains(self.id)
    }

    /// Returns `true` if the handle addresses the document root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.id == self.doc.borrow().root()
    }

    /// Returns `true` if both handles share a document.
    #[must_use]
    pub fn same_document(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.doc, &other.doc)
    }

    // --- Queries ---

    /// Evaluates `query` with this node as context, after substituting
    /// `params` for its `?` placeholders, and returns the matched nodes in
    /// document order.
    ///
    /// Absolute paths (`/`, `//`) start at the document root.
    ///
    /// # Errors
    ///
    /// Fails if parameter substitution or the query fails, and with
    /// [`Error::TypeMismatch`] if the result is not a sequence of tree nodes.
    pub fn find(&self, query: &str, params: &[QueryParam]) -> Result<NodeSet> {
        let query = CompiledQuery::new(query, params)?;
        self.find_compiled(&query)
    }

    /// Evaluates `expression` with this node as context.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Query`] if the expression does not compile or
    /// evaluate.
    pub fn evaluate(&self, expression: &str) -> Result<QueryValue> {
        let query = CompiledQuery::new(expression, &[])?;
        let mut doc = self.write()?;
        query.evaluate(&mut doc, self.id)
    }

    // --- Navigation and reading ---

    /// Returns the parent node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingParent`] on the document root or a detached
    /// node.
    pub fn parent(&self) -> Result<Node> {
        let doc = self.read()?;
        match doc.parent(self.id) {
            Some(parent) => Ok(self.handle(parent)),
            None => Err(Error::MissingParent {
                name: doc.name(self.id),
            }),
        }
    }

    /// Returns the node name: the local name for elements, the target for
    /// processing instructions, `#document`, `#text` or `#comment`
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleNode`] if the handle is stale.
    pub fn name(&self) -> Result<String> {
        Ok(self.read()?.name(self.id))
    }

    /// Returns the concatenated text of this node and its descendants.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleNode`] if the handle is stale.
    pub fn text(&self) -> Result<String> {
        Ok(self.read()?.text_content(self.id))
    }

    /// Returns the document root. On the root this is a copy of the handle.
    #[must_use]
    pub fn root(&self) -> Node {
        let root = self.doc.borrow().root();
        self.handle(root)
    }

    /// Returns the child nodes in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleNode`] if the handle is stale.
    pub fn children(&self) -> Result<NodeSet> {
        let doc = self.read()?;
        Ok(doc.children(self.id).map(|id| self.handle(id)).collect())
    }

    /// Returns the attribute map of this element.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if the node is not an element.
    pub fn attributes(&self) -> Result<Attributes> {
        let doc = self.read()?;
        if !doc.is_element(self.id) {
            return Err(Error::TypeMismatch {
                message: format!(
                    "attributes are only available on elements, not on {}",
                    doc.name(self.id)
                ),
            });
        }
        Ok(Attributes::new(self.clone()))
    }

    /// Serializes the node.
    ///
    /// The document root is written as a whole document. Any other node is
    /// first copied into a fresh document of its own. With `pretty`, nested
    /// elements are indented by two spaces.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleNode`] if the handle is stale.
    pub fn dump(&self, pretty: bool) -> Result<String> {
        let doc = self.read()?;
        if self.id == doc.root() {
            return doc.serialize(self.id, pretty);
        }
        let mut standalone = Document::new();
        let copy = standalone.import(&doc, self.id)?;
        let root = standalone.root();
        standalone.append_child(root, copy)?;
        standalone.serialize(root, pretty)
    }

    // --- Mutation ---

    /// Substitutes a copy of `fragment` for this node and rebinds the handle
    /// to the copy. Other handles to the old node become stale.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRootMutation`] on the document root.
    pub fn replace<'f>(&mut self, fragment: impl Into<Fragment<'f>>) -> Result<&mut Self> {
        let prepared = fragment.into().prepare()?;
        self.replace_prepared(&prepared)?;
        Ok(self)
    }

    /// Replaces the children of an element with a single text node, or the
    /// content of a text-like leaf.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRootMutation`] on the document root.
    pub fn replace_text(&self, text: &str) -> Result<&Self> {
        let mut doc = self.write()?;
        if self.id == doc.root() {
            return Err(Error::InvalidRootMutation {
                operation: "replace the text of",
            });
        }
        trace!(node = ?self.id, "replace text");
        doc.set_text(self.id, text)?;
        Ok(self)
    }

    /// Inserts a copy of `fragment` as the preceding sibling.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingParent`] on the document root.
    pub fn before<'f>(&self, fragment: impl Into<Fragment<'f>>) -> Result<&Self> {
        let prepared = fragment.into().prepare()?;
        self.before_prepared(&prepared)?;
        Ok(self)
    }

    /// Inserts a copy of `fragment` as the following sibling.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingParent`] on the document root.
    pub fn after<'f>(&self, fragment: impl Into<Fragment<'f>>) -> Result<&Self> {
        let prepared = fragment.into().prepare()?;
        self.after_prepared(&prepared)?;
        Ok(self)
    }

    /// Appends a copy of `fragment` as the last child and returns a handle
    /// to it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if this node cannot have children.
    pub fn append<'f>(&self, fragment: impl Into<Fragment<'f>>) -> Result<Node> {
        let prepared = fragment.into().prepare()?;
        self.append_prepared(&prepared)
    }

    /// Inserts a copy of `fragment` as the first child.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if this node cannot have children.
    pub fn prepend<'f>(&self, fragment: impl Into<Fragment<'f>>) -> Result<&Self> {
        let prepared = fragment.into().prepare()?;
        self.prepend_prepared(&prepared)?;
        Ok(self)
    }

    /// Removes every child. Attributes are kept.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleNode`] if the handle is stale.
    pub fn clear(&self) -> Result<&Self> {
        let mut doc = self.write()?;
        trace!(node = ?self.id, "clear children");
        doc.clear_children(self.id)?;
        Ok(self)
    }

    /// Detaches this node and its subtree. Every handle into the subtree
    /// becomes stale.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRootMutation`] on the document root.
    pub fn remove(self) -> Result<()> {
        let mut doc = self.write()?;
        if self.id == doc.root() {
            return Err(Error::InvalidRootMutation { operation: "remove" });
        }
        trace!(node = ?self.id, "remove");
        doc.detach(self.id)
    }

    // --- Internals shared with NodeSet ---

    pub(crate) fn find_compiled(&self, query: &CompiledQuery) -> Result<NodeSet> {
        let ids = {
            let mut doc = self.write()?;
            query.select(&mut doc, self.id)?
        };
        Ok(ids.into_iter().map(|id| self.handle(id)).collect())
    }

    pub(crate) fn matches(&self, query: &CompiledQuery) -> Result<bool> {
        let mut doc = self.write()?;
        query.matches(&mut doc, self.id)
    }

    pub(crate) fn replace_prepared(&mut self, prepared: &Prepared<'_>) -> Result<()> {
        if self.read()?.root() == self.id {
            return Err(Error::InvalidRootMutation { operation: "replace" });
        }
        let copy = self.import(prepared)?;
        trace!(node = ?self.id, replacement = ?copy, "replace");
        self.write()?.replace_node(self.id, copy)?;
        self.id = copy;
        Ok(())
    }

    pub(crate) fn before_prepared(&self, prepared: &Prepared<'_>) -> Result<()> {
        self.require_parent()?;
        let copy = self.import(prepared)?;
        trace!(node = ?self.id, inserted = ?copy, "insert before");
        self.write()?.insert_before(self.id, copy)
    }

    pub(crate) fn after_prepared(&self, prepared: &Prepared<'_>) -> Result<()> {
        self.require_parent()?;
        let copy = self.import(prepared)?;
        trace!(node = ?self.id, inserted = ?copy, "insert after");
        self.write()?.insert_after(self.id, copy)
    }

    pub(crate) fn append_prepared(&self, prepared: &Prepared<'_>) -> Result<Node> {
        self.require_container()?;
        let copy = self.import(prepared)?;
        trace!(node = ?self.id, inserted = ?copy, "append");
        self.write()?.append_child(self.id, copy)?;
        Ok(self.handle(copy))
    }

    pub(crate) fn prepend_prepared(&self, prepared: &Prepared<'_>) -> Result<()> {
        self.require_container()?;
        let copy = self.import(prepared)?;
        trace!(node = ?self.id, inserted = ?copy, "prepend");
        self.write()?.prepend_child(self.id, copy)
    }

    /// Deep-copies the prepared fragment into this node's document,
    /// unattached.
    fn import(&self, prepared: &Prepared<'_>) -> Result<NodeId> {
        match prepared {
            Prepared::Handle(source) if self.same_document(source) => {
                let mut doc = self.write()?;
                check_importable(&doc, source.id)?;
                Ok(doc.duplicate(source.id))
            }
            Prepared::Handle(source) => {
                let source_doc = source.read()?;
                check_importable(&source_doc, source.id)?;
                self.write()?.import(&source_doc, source.id)
            }
            Prepared::Owned { document, id } => self.write()?.import(document, *id),
            Prepared::Borrowed { document, id } => {
                if !document.owns(*id) {
                    return Err(Error::StaleNode);
                }
                check_importable(document, *id)?;
                self.write()?.import(document, *id)
            }
        }
    }

    fn require_parent(&self) -> Result<()> {
        let doc = self.read()?;
        if doc.parent(self.id).is_none() {
            return Err(Error::MissingParent {
                name: doc.name(self.id),
            });
        }
        Ok(())
    }

    fn require_container(&self) -> Result<()> {
        let doc = self.read()?;
        if !doc.is_container(self.id) {
            return Err(Error::TypeMismatch {
                message: format!("{} nodes cannot have children", doc.name(self.id)),
            });
        }
        Ok(())
    }

    fn handle(&self, id: NodeId) -> Node {
        Node {
            doc: Rc::clone(&self.doc),
            id,
        }
    }

    fn read(&self) -> Result<Ref<'_, Document>> {
        let doc = self.doc.borrow();
        if doc.contains(self.id) {
            Ok(doc)
        } else {
            Err(Error::StaleNode)
        }
    }

    fn write(&self) -> Result<RefMut<'_, Document>> {
        let doc = self.doc.borrow_mut();
        if doc.contains(self.id) {
            Ok(doc)
        } else {
            Err(Error::StaleNode)
        }
    }
}

fn check_importable(doc: &Document, id: NodeId) -> Result<()> {
    if !doc.contains(id) {
        return Err(Error::StaleNode);
    }
    if id == doc.root() {
        return Err(Error::TypeMismatch {
            message: "a document node cannot be inserted into another node".to_string(),
        });
    }
    Ok(())
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.same_document(other) && self.id == other.id
    }
}

impl Eq for Node {}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let doc = self.doc.borrow();
        let name = if doc.contains(self.id) {
            doc.name(self.id)
        } else {
            "<stale>".to_string()
        };
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("name", &name)
            .finish()
    }
}
