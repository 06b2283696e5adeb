//! Attribute access for element handles.

use tracing::trace;

use super::Node;
use crate::error::Result;

/// The attribute map of one element, read and written through its handle.
///
/// Obtained from [`Node::attributes`]. Reads and writes go straight to the
/// document, so an `Attributes` value never holds a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attributes {
    node: Node,
}

impl Attributes {
    pub(super) fn new(node: Node) -> Self {
        Self { node }
    }

    /// Returns the value of attribute `name`, or `None` if it is not set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleNode`] if the element was removed.
    pub fn get(&self, name: &str) -> Result<Option<String>> {
        let doc = self.node.read()?;
        Ok(doc.attribute(self.node.id, name).map(str::to_string))
    }

    /// Sets attribute `name` to `value`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidName`] if `name` is not an XML name, or
    /// [`Error::StaleNode`] if the element was removed.
    pub fn set(&self, name: &str, value: impl Into<String>) -> Result<&Self> {
        let mut doc = self.node.write()?;
        trace!(node = ?self.node.id, attribute = name, "set attribute");
        doc.set_attribute(self.node.id, name, value)?;
        Ok(self)
    }

    /// Returns every `(name, value)` pair in document order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleNode`] if the element was removed.
    pub fn to_vec(&self) -> Result<Vec<(String, String)>> {
        let doc = self.node.read()?;
        Ok(doc.attributes(self.node.id))
    }

    /// The element these attributes belong to.
    #[must_use]
    pub fn node(&self) -> &Node {
        &self.node
    }
}
