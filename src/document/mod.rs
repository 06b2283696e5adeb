//! The document engine.
//!
//! A [`Document`] owns one [`xot`] arena and the document node at its top.
//! Parsing, serialization and tree surgery are delegated to `xot`; path
//! queries run through `xee-xpath` (see [`crate::query`]). This module only
//! adds what the node layer needs on top: liveness checks for handles,
//! deep import between arenas, and element-name validation.
//!
//! Text-node consolidation is switched off in every arena, so inserting or
//! removing a node never merges the text around it and handles to text
//! nodes stay valid.

use std::fmt;

use xot::output::xml::Parameters;
use xot::output::Indentation;
use xot::{NameId, NodeEdge, Value, ValueType, Xot};

use crate::error::{Error, ParseError, Result, SourceLocation};

/// Identifier of a node inside a [`Document`].
pub use xot::Node as NodeId;

/// A document: a node tree rooted at a document node.
#[derive(Debug)]
pub struct Document {
    xot: Xot,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        let mut xot = arena();
        let root = xot.new_document();
        Self { xot, root }
    }

    /// Parses a complete XML document.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if `xml` is not well-formed.
    pub fn parse_str(xml: &str) -> Result<Self, ParseError> {
        let mut xot = arena();
        let root = xot.parse(xml).map_err(|e| parse_error(xml, &e))?;
        Ok(Self { xot, root })
    }

    /// Parses element content: any mix of elements, text, comments and
    /// processing instructions, with any number of top-level nodes.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if `xml` is not well-formed content.
    pub fn parse_fragment(xml: &str) -> Result<Self, ParseError> {
        let mut xot = arena();
        let root = xot.parse_fragment(xml).map_err(|e| parse_error(xml, &e))?;
        Ok(Self { xot, root })
    }

    /// The document node.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The first element child of the document node.
    #[must_use]
    pub fn root_element(&self) -> Option<NodeId> {
        self.xot.children(self.root).find(|&n| self.xot.is_element(n))
    }

    /// Returns `true` if `id` is still attached to this document.
    ///
    /// `id` must have been issued by this document; use
    /// [`owns`](Self::owns) for ids of unknown origin.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.xot.root(id) == self.root
    }

    /// Returns `true` if `id` is a node of this document's tree. Unlike
    /// [`contains`](Self::contains) this never dereferences `id`.
    #[must_use]
    pub fn owns(&self, id: NodeId) -> bool {
        self.xot.descendants(self.root).any(|n| n == id)
    }

    /// Returns `true` for element nodes.
    #[must_use]
    pub fn is_element(&self, id: NodeId) -> bool {
        self.xot.is_element(id)
    }

    /// Returns `true` for nodes that can hold children: elements and the
    /// document node.
    #[must_use]
    pub fn is_container(&self, id: NodeId) -> bool {
        matches!(self.xot.value(id), Value::Element(_) | Value::Document)
    }

    /// Returns `true` for attribute and namespace nodes, which query
    /// results may contain but which are not part of the child tree.
    #[must_use]
    pub fn is_attribute_like(&self, id: NodeId) -> bool {
        matches!(self.xot.value(id), Value::Attribute(_) | Value::Namespace(_))
    }

    /// The node name: the local name of elements and attributes, the target
    /// of processing instructions, or `#document`, `#text`, `#comment` and
    /// `#namespace`.
    #[must_use]
    pub fn name(&self, id: NodeId) -> String {
        match self.xot.value(id) {
            Value::Document => "#document".to_string(),
            Value::Element(element) => self.xot.local_name_str(element.name()).to_string(),
            Value::Attribute(attribute) => self.xot.local_name_str(attribute.name()).to_string(),
            Value::ProcessingInstruction(pi) => self.xot.local_name_str(pi.target()).to_string(),
            Value::Text(_) => "#text".to_string(),
            Value::Comment(_) => "#comment".to_string(),
            Value::Namespace(_) => "#namespace".to_string(),
        }
    }

    /// The local name of an element.
    #[must_use]
    pub fn element_name(&self, id: NodeId) -> Option<&str> {
        self.xot
            .element(id)
            .map(|element| self.xot.local_name_str(element.name()))
    }

    /// The concatenated text of a node and its descendants.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        self.xot.string_value(id)
    }

    /// The parent, or `None` for the document node and detached nodes.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.xot.parent(id)
    }

    /// The first child.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.xot.first_child(id)
    }

    /// The children in order. Attributes are not children.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.xot.children(id)
    }

    // --- Attributes ---

    /// The value of attribute `name` on an element.
    #[must_use]
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        let name = self.xot.name(name)?;
        self.xot.get_attribute(id, name)
    }

    /// Every `(name, value)` pair of an element, in document order.
    #[must_use]
    pub fn attributes(&self, id: NodeId) -> Vec<(String, String)> {
        self.xot
            .attributes(id)
            .iter()
            .map(|(name, value)| (self.xot.local_name_str(name).to_string(), value.clone()))
            .collect()
    }

    /// Sets attribute `name` on an element.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidName`] for a name that is not an XML name and
    /// [`Error::TypeMismatch`] if `id` is not an element.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<String>) -> Result<()> {
        let name = self.checked_name(name)?;
        if !self.xot.is_element(id) {
            return Err(Error::TypeMismatch {
                message: format!("attributes can only be set on elements, not on {}", self.name(id)),
            });
        }
        self.xot.set_attribute(id, name, value);
        Ok(())
    }

    // --- Construction ---

    /// Creates an unattached element.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidName`] for a name that is not an XML name.
    pub fn create_element(&mut self, name: &str) -> Result<NodeId> {
        let name = self.checked_name(name)?;
        Ok(self.xot.new_element(name))
    }

    /// Creates an unattached text node.
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.xot.new_text(content)
    }

    // --- Tree surgery ---

    /// Appends `child` as the last child of `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tree`] if `parent` cannot hold `child`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        Ok(self.xot.append(parent, child)?)
    }

    /// Inserts `child` as the first child of `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tree`] if `parent` cannot hold `child`.
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        Ok(self.xot.prepend(parent, child)?)
    }

    /// Inserts `node` as the preceding sibling of `reference`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tree`] if `reference` has no parent.
    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) -> Result<()> {
        Ok(self.xot.insert_before(reference, node)?)
    }

    /// Inserts `node` as the following sibling of `reference`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tree`] if `reference` has no parent.
    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) -> Result<()> {
        Ok(self.xot.insert_after(reference, node)?)
    }

    /// Unlinks `id` and its subtree from the document.
    ///
    /// The subtree stays in the arena, so ids into it keep pointing at the
    /// detached nodes and [`contains`](Self::contains) reports them as gone.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tree`] for the document node.
    pub fn detach(&mut self, id: NodeId) -> Result<()> {
        Ok(self.xot.detach(id)?)
    }

    /// Puts `replacement` where `old` was and detaches `old`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tree`] if `old` has no parent.
    pub fn replace_node(&mut self, old: NodeId, replacement: NodeId) -> Result<()> {
        self.xot.insert_before(old, replacement)?;
        Ok(self.xot.detach(old)?)
    }

    /// Detaches every child of `id`. Attributes are kept.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tree`] if a child cannot be detached.
    pub fn clear_children(&mut self, id: NodeId) -> Result<()> {
        let children: Vec<_> = self.xot.children(id).collect();
        for child in children {
            self.xot.detach(child)?;
        }
        Ok(())
    }

    /// Replaces the children of an element with one text node, or the
    /// content of a text or comment node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] for other node kinds and
    /// [`Error::Tree`] for comment text the engine rejects.
    pub fn set_text(&mut self, id: NodeId, content: &str) -> Result<()> {
        match self.xot.value_type(id) {
            ValueType::Element => {
                self.clear_children(id)?;
                if !content.is_empty() {
                    let text = self.xot.new_text(content);
                    self.xot.append(id, text)?;
                }
            }
            ValueType::Text => {
                if let Some(text) = self.xot.text_mut(id) {
                    text.set(content);
                }
            }
            ValueType::Comment => {
                if let Some(comment) = self.xot.comment_mut(id) {
                    comment.set(content)?;
                }
            }
            _ => {
                return Err(Error::TypeMismatch {
                    message: format!("cannot set the text of {}", self.name(id)),
                })
            }
        }
        Ok(())
    }

    // --- Copies ---

    /// Deep-copies `id` within this document. The copy is unattached.
    pub fn duplicate(&mut self, id: NodeId) -> NodeId {
        self.xot.clone_node(id)
    }

    /// Deep-copies node `id` of `source` into this document, unattached.
    ///
    /// Namespace prefixes in scope at `id` are redeclared on the copy so it
    /// serializes on its own.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] for document, attribute and namespace
    /// nodes.
    pub fn import(&mut self, source: &Document, id: NodeId) -> Result<NodeId> {
        let mut open: Vec<NodeId> = Vec::new();
        let mut top = None;
        for edge in source.xot.traverse(id) {
            match edge {
                NodeEdge::Start(node) => {
                    let copy = self.copy_value(source, node)?;
                    match open.last() {
                        Some(&parent) => self.xot.append(parent, copy)?,
                        None => top = Some(copy),
                    }
                    open.push(copy);
                }
                NodeEdge::End(_) => {
                    open.pop();
                }
            }
        }
        let top = top.ok_or(Error::StaleNode)?;
        if self.xot.is_element(top) {
            for (prefix, namespace) in source.xot.namespaces_in_scope(id) {
                let prefix_str = source.xot.prefix_str(prefix);
                if prefix_str == "xml" {
                    continue;
                }
                let prefix = self.xot.add_prefix(prefix_str);
                let namespace = self.xot.add_namespace(source.xot.namespace_str(namespace));
                let mut declared = self.xot.namespaces_mut(top);
                if !declared.contains_key(prefix) {
                    declared.insert(prefix, namespace);
                }
            }
        }
        Ok(top)
    }

    fn copy_value(&mut self, source: &Document, node: NodeId) -> Result<NodeId> {
        let xot = &source.xot;
        let copy = match xot.value(node) {
            Value::Element(element) => {
                let name = self.map_name(xot, element.name());
                let copy = self.xot.new_element(name);
                for (prefix, namespace) in xot.namespaces(node).iter() {
                    let prefix = self.xot.add_prefix(xot.prefix_str(prefix));
                    let namespace = self.xot.add_namespace(xot.namespace_str(*namespace));
                    self.xot.namespaces_mut(copy).insert(prefix, namespace);
                }
                for (name, value) in xot.attributes(node).iter() {
                    let name = self.map_name(xot, name);
                    self.xot.set_attribute(copy, name, value.clone());
                }
                copy
            }
            Value::Text(text) => self.xot.new_text(text.get()),
            Value::Comment(comment) => self.xot.new_comment(comment.get()),
            Value::ProcessingInstruction(pi) => {
                let target = self.map_name(xot, pi.target());
                self.xot.new_processing_instruction(target, pi.data())
            }
            Value::Document | Value::Attribute(_) | Value::Namespace(_) => {
                return Err(Error::TypeMismatch {
                    message: format!("a {} node cannot be inserted into another node", source.name(node)),
                })
            }
        };
        Ok(copy)
    }

    /// Interns a name of another arena in this one.
    fn map_name(&mut self, xot: &Xot, name: NameId) -> NameId {
        let (local, namespace) = xot.name_ns_str(name);
        if namespace.is_empty() {
            self.xot.add_name(local)
        } else {
            let namespace = self.xot.add_namespace(namespace);
            self.xot.add_name_ns(local, namespace)
        }
    }

    fn checked_name(&mut self, name: &str) -> Result<NameId> {
        if !is_valid_name(name) {
            return Err(Error::InvalidName {
                name: name.to_string(),
            });
        }
        Ok(self.xot.add_name(name))
    }

    // --- Output ---

    /// Serializes a node.
    ///
    /// The document node is written as `<?xml version="1.0"?>` and a
    /// newline, then each top-level node followed by a newline. With
    /// `pretty`, element-only content is indented by two spaces per level
    /// and mixed content is left as is.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tree`] if the engine cannot serialize the node.
    pub fn serialize(&self, id: NodeId, pretty: bool) -> Result<String> {
        if id != self.root {
            return self.serialize_node(id, pretty);
        }
        let mut out = String::from("<?xml version=\"1.0\"?>\n");
        for child in self.xot.children(id) {
            let xml = self.serialize_node(child, pretty)?;
            out.push_str(&xml);
            if !xml.ends_with('\n') || !pretty {
                out.push('\n');
            }
        }
        Ok(out)
    }

    fn serialize_node(&self, id: NodeId, pretty: bool) -> Result<String> {
        let parameters = Parameters {
            indentation: pretty.then(Indentation::default),
            ..Parameters::default()
        };
        Ok(self.xot.serialize_xml_string(parameters, id)?)
    }

    pub(crate) fn xot(&self) -> &Xot {
        &self.xot
    }

    pub(crate) fn xot_mut(&mut self) -> &mut Xot {
        &mut self.xot
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let xml = self.serialize(self.root, false).map_err(|_| fmt::Error)?;
        f.write_str(&xml)
    }
}

fn arena() -> Xot {
    let mut xot = Xot::new();
    xot.set_text_consolidation(false);
    xot
}

/// Converts an engine parse error, resolving its byte offset to a line and
/// column.
fn parse_error(xml: &str, err: &xot::ParseError) -> ParseError {
    let offset = err.span().start.min(xml.len());
    let mut line = 1u32;
    let mut column = 1u32;
    for (i, ch) in xml.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line = line.saturating_add(1);
            column = 1;
        } else {
            column = column.saturating_add(1);
        }
    }
    ParseError {
        message: err.to_string(),
        location: SourceLocation {
            line,
            column,
            byte_offset: offset,
        },
    }
}

fn is_name_start_char(c: char) -> bool {
    matches!(c,
        'A'..='Z' | '_' | 'a'..='z' |
        '\u{C0}'..='\u{D6}' | '\u{D8}'..='\u{F6}' | '\u{F8}'..='\u{2FF}' |
        '\u{370}'..='\u{37D}' | '\u{37F}'..='\u{1FFF}' |
        '\u{200C}'..='\u{200D}' | '\u{2070}'..='\u{218F}' |
        '\u{2C00}'..='\u{2FEF}' | '\u{3001}'..='\u{D7FF}' |
        '\u{F900}'..='\u{FDCF}' | '\u{FDF0}'..='\u{FFFD}' |
        '\u{10000}'..='\u{EFFFF}'
    )
}

fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}' |
            '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}'
        )
}

/// Returns `true` if `name` is an unprefixed XML name (an `NCName`).
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(is_name_start_char) && chars.all(is_name_char)
}
