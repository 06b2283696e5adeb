//! Ordered collections of node handles.

use std::slice;

use super::{Fragment, Node};
use crate::document::Document;
use crate::error::{Error, Result};
use crate::query::{CompiledQuery, QueryParam};

/// An ordered sequence of node handles.
///
/// Most operations mirror those of [`Node`] and apply to every member in
/// order. A mutation that fails part way leaves the members before the
/// failing one mutated.
///
/// A set may hold a node together with some of its descendants, as `//b`
/// does for nested `b` elements. Removing, clearing or replacing an
/// ancestor detaches those descendants, so the destructive operations skip
/// members that went stale during the same call.
///
/// ```
/// use xmlquery::Node;
///
/// let root = Node::from_xml("<list><item/><item/></list>").unwrap();
/// root.find("//item", &[]).unwrap().append("<p/>").unwrap();
/// assert_eq!(root.find("//item/p", &[]).unwrap().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeSet {
    nodes: Vec<Node>,
}

impl NodeSet {
    /// Creates a set holding `nodes` in the given order.
    #[must_use]
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the set has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates over the members in order.
    pub fn iter(&self) -> slice::Iter<'_, Node> {
        self.nodes.iter()
    }

    /// The members as a slice.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Returns the first member.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyCollection`] if the set is empty.
    pub fn first(&self) -> Result<Node> {
        self.nodes.first().cloned().ok_or(Error::EmptyCollection)
    }

    /// Returns the last member.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyCollection`] if the set is empty.
    pub fn last(&self) -> Result<Node> {
        self.nodes.last().cloned().ok_or(Error::EmptyCollection)
    }

    /// Returns the member at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`], carrying the set length, if
    /// there is no such member.
    pub fn child(&self, index: usize) -> Result<Node> {
        self.nodes.get(index).cloned().ok_or(Error::IndexOutOfRange {
            index,
            len: self.nodes.len(),
        })
    }

    /// Keeps the members for which `predicate` holds.
    #[must_use]
    pub fn filter<F>(&self, mut predicate: F) -> NodeSet
    where
        F: FnMut(&Node) -> bool,
    {
        self.nodes.iter().filter(|n| predicate(n)).cloned().collect()
    }

    /// Keeps the members for which `expression`, evaluated with the member
    /// as context, has a true effective boolean value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Query`] if the expression does not compile or
    /// evaluate, or [`Error::StaleNode`] for a stale member.
    pub fn filter_by(&self, expression: &str) -> Result<NodeSet> {
        let query = CompiledQuery::new(expression, &[])?;
        let mut kept = Vec::new();
        for node in &self.nodes {
            if node.matches(&query)? {
                kept.push(node.clone());
            }
        }
        Ok(Self::new(kept))
    }

    /// Runs [`Node::find`] on every member and concatenates the results.
    /// The query is compiled once.
    ///
    /// # Errors
    ///
    /// Fails as soon as one member's query fails.
    pub fn find(&self, query: &str, params: &[QueryParam]) -> Result<NodeSet> {
        let query = CompiledQuery::new(query, params)?;
        let mut found = Vec::new();
        for node in &self.nodes {
            found.extend(node.find_compiled(&query)?);
        }
        Ok(Self::new(found))
    }

    /// Concatenates the children of every member.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleNode`] for a stale member.
    pub fn children(&self) -> Result<NodeSet> {
        let mut children = Vec::new();
        for node in &self.nodes {
            children.extend(node.children()?);
        }
        Ok(Self::new(children))
    }

    /// Concatenates the text of every member.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleNode`] for a stale member.
    pub fn text(&self) -> Result<String> {
        self.nodes.iter().map(Node::text).collect()
    }

    /// Inserts a copy of `fragment` before every member.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingParent`] if a member is a document root.
    pub fn before<'f>(&self, fragment: impl Into<Fragment<'f>>) -> Result<&Self> {
        let prepared = fragment.into().prepare()?;
        for node in &self.nodes {
            node.before_prepared(&prepared)?;
        }
        Ok(self)
    }

    /// Inserts a copy of `fragment` after every member.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingParent`] if a member is a document root.
    pub fn after<'f>(&self, fragment: impl Into<Fragment<'f>>) -> Result<&Self> {
        let prepared = fragment.into().prepare()?;
        for node in &self.nodes {
            node.after_prepared(&prepared)?;
        }
        Ok(self)
    }

    /// Appends a copy of `fragment` to every member.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if a member cannot have children.
    pub fn append<'f>(&self, fragment: impl Into<Fragment<'f>>) -> Result<&Self> {
        let prepared = fragment.into().prepare()?;
        for node in &self.nodes {
            node.append_prepared(&prepared)?;
        }
        Ok(self)
    }

    /// Prepends a copy of `fragment` to every member.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if a member cannot have children.
    pub fn prepend<'f>(&self, fragment: impl Into<Fragment<'f>>) -> Result<&Self> {
        let prepared = fragment.into().prepare()?;
        for node in &self.nodes {
            node.prepend_prepared(&prepared)?;
        }
        Ok(self)
    }

    /// Replaces every member with a copy of `fragment`, rebinding each
    /// member to its replacement. A member inside an earlier member's
    /// replaced subtree is skipped and stays stale.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRootMutation`] if a member is a document root
    /// and [`Error::StaleNode`] if a member was stale before the call.
    pub fn replace<'f>(&mut self, fragment: impl Into<Fragment<'f>>) -> Result<&mut Self> {
        self.require_live()?;
        let prepared = fragment.into().prepare()?;
        for node in &mut self.nodes {
            if node.is_stale() {
                continue;
            }
            node.replace_prepared(&prepared)?;
        }
        Ok(self)
    }

    /// Removes the children of every member. A member inside an earlier
    /// member's cleared content is skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleNode`] if a member was stale before the call.
    pub fn clear(&self) -> Result<&Self> {
        self.require_live()?;
        for node in &self.nodes {
            if node.is_stale() {
                continue;
            }
            node.clear()?;
        }
        Ok(self)
    }

    /// Removes every member from its document. A member inside an earlier
    /// member's removed subtree is skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRootMutation`] if a member is a document root
    /// and [`Error::StaleNode`] if a member was stale before the call.
    pub fn remove(self) -> Result<()> {
        self.require_live()?;
        for node in self.nodes {
            if node.is_stale() {
                continue;
            }
            node.remove()?;
        }
        Ok(())
    }

    fn require_live(&self) -> Result<()> {
        if self.nodes.iter().any(Node::is_stale) {
            return Err(Error::StaleNode);
        }
        Ok(())
    }

    /// Serializes a fresh document holding a copy of every member, in order.
    /// A document-root member contributes copies of its children.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleNode`] for a stale member.
    pub fn dump(&self, pretty: bool) -> Result<String> {
        let mut output = Document::new();
        let target = output.root();
        for node in &self.nodes {
            let source = node.read()?;
            let ids: Vec<_> = if node.id == source.root() {
                source.children(node.id).collect()
            } else {
                vec![node.id]
            };
            for id in ids {
                let copy = output.import(&source, id)?;
                output.append_child(target, copy)?;
            }
        }
        output.serialize(target, pretty)
    }
}

impl FromIterator<Node> for NodeSet {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl IntoIterator for NodeSet {
    type Item = Node;
    type IntoIter = std::vec::IntoIter<Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

impl<'a> IntoIterator for &'a NodeSet {
    type Item = &'a Node;
    type IntoIter = slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}
