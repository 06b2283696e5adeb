//! An owned syntax tree.
//!
//! For callers whose parser output does not implement [`SyntaxNode`]
//! directly: convert it into [`OwnedNode`]s and [`OwnedToken`]s once and
//! project that.
//!
//! ```
//! use xmlquery::projector::{OwnedNode, OwnedSlot, OwnedToken, Projector};
//!
//! let source = "echo 1;";
//! let tree = OwnedNode::new("EchoStatement")
//!     .with_slot("keyword", OwnedSlot::Token(OwnedToken::new("EchoKeyword", 0, 0, 4)))
//!     .with_slot("expression", OwnedSlot::Token(OwnedToken::new("IntegerLiteral", 4, 5, 1)))
//!     .with_slot("semicolon", OwnedSlot::Token(OwnedToken::new("Semicolon", 6, 6, 1)));
//!
//! let root = Projector::new().project(source, &tree).unwrap();
//! assert_eq!(root.text().unwrap(), source);
//! ```

use super::syntax::{Capability, CapabilityKind, ChildSlot, Slot, SyntaxNode, SyntaxToken, TokenSpan};

/// A token addressing its source by byte offsets.
///
/// Offsets that fall outside the source, or inside a multi-byte character,
/// read as empty text, as does a length that overflows `usize`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedToken {
    kind: String,
    span: TokenSpan,
}

impl OwnedToken {
    /// Creates a token whose trivia spans `full_start..start` and whose text
    /// spans `start..start + length`.
    #[must_use]
    pub fn new(kind: impl Into<String>, full_start: usize, start: usize, length: usize) -> Self {
        Self {
            kind: kind.into(),
            span: TokenSpan {
                full_start,
                start,
                length,
            },
        }
    }
}

impl SyntaxToken for OwnedToken {
    fn kind_name(&self) -> &str {
        &self.kind
    }

    fn leading_trivia<'s>(&self, source: &'s str) -> &'s str {
        source.get(self.span.full_start..self.span.start).unwrap_or("")
    }

    fn text<'s>(&self, source: &'s str) -> &'s str {
        self.span
            .start
            .checked_add(self.span.length)
            .and_then(|end| source.get(self.span.start..end))
            .unwrap_or("")
    }

    fn span(&self) -> Option<TokenSpan> {
        Some(self.span)
    }
}

/// Owned content of a child slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnedSlot {
    /// Nothing.
    Empty,
    /// A child node.
    Node(OwnedNode),
    /// A token.
    Token(OwnedToken),
    /// Several children.
    List(Vec<OwnedSlot>),
    /// Content the projector rejects.
    Unknown(String),
}

impl OwnedSlot {
    fn as_slot(&self) -> Slot<'_> {
        match self {
            Self::Empty => Slot::Empty,
            Self::Node(node) => Slot::Node(node),
            Self::Token(token) => Slot::Token(token),
            Self::List(items) => Slot::List(items.iter().map(Self::as_slot).collect()),
            Self::Unknown(type_name) => Slot::Unknown(type_name.clone()),
        }
    }
}

/// A syntax node that owns its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedNode {
    kind: String,
    slots: Vec<(String, OwnedSlot)>,
    capabilities: Vec<Capability>,
}

impl OwnedNode {
    /// Creates a node with no slots and no capabilities.
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            slots: Vec::new(),
            capabilities: Vec::new(),
        }
    }

    /// Appends a named slot.
    #[must_use]
    pub fn with_slot(mut self, name: impl Into<String>, content: OwnedSlot) -> Self {
        self.slots.push((name.into(), content));
        self
    }

    /// Adds a capability, replacing any previous one of the same kind.
    #[must_use]
    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capabilities.retain(|c| c.kind() != capability.kind());
        self.capabilities.push(capability);
        self
    }
}

impl SyntaxNode for OwnedNode {
    fn kind_name(&self) -> &str {
        &self.kind
    }

    fn child_slots(&self) -> Vec<ChildSlot<'_>> {
        self.slots
            .iter()
            .map(|(name, content)| ChildSlot::new(name, content.as_slot()))
            .collect()
    }

    fn capability(&self, kind: CapabilityKind) -> Option<Capability> {
        self.capabilities.iter().find(|c| c.kind() == kind).cloned()
    }
}
