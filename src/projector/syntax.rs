//! The traversal contract a syntax tree implements to be projected.
//!
//! The projector never sees a concrete parser type. A syntax node reports its
//! kind, its named child slots and, on request, a capability; a token
//! reports its kind and slices its leading trivia and text out of the source
//! it was parsed from.

/// A leaf of the syntax tree.
pub trait SyntaxToken {
    /// The token kind, written to the `kind` attribute of its `Token`
    /// element.
    fn kind_name(&self) -> &str;

    /// Whitespace and comments between the previous token and this one.
    fn leading_trivia<'s>(&self, source: &'s str) -> &'s str;

    /// The exact text of the token, without trivia.
    fn text<'s>(&self, source: &'s str) -> &'s str;

    /// Byte positions of the token in the source, if known.
    fn span(&self) -> Option<TokenSpan> {
        None
    }
}

/// Byte positions of a token within its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenSpan {
    /// Offset where the leading trivia starts.
    pub full_start: usize,
    /// Offset where the token text starts.
    pub start: usize,
    /// Length of the token text in bytes.
    pub length: usize,
}

/// An inner node of the syntax tree.
pub trait SyntaxNode {
    /// The node kind, used as the element name.
    fn kind_name(&self) -> &str;

    /// The named child slots in source order.
    fn child_slots(&self) -> Vec<ChildSlot<'_>>;

    /// Returns the capability of the given kind, if this node has it.
    fn capability(&self, kind: CapabilityKind) -> Option<Capability> {
        let _ = kind;
        None
    }
}

/// One named child slot of a syntax node.
#[derive(Clone)]
pub struct ChildSlot<'a> {
    /// Slot name; the slot element is named after it, capitalized.
    pub name: &'a str,
    /// What occupies the slot.
    pub content: Slot<'a>,
}

impl<'a> ChildSlot<'a> {
    /// Creates a slot.
    #[must_use]
    pub fn new(name: &'a str, content: Slot<'a>) -> Self {
        Self { name, content }
    }
}

/// The content of a child slot.
#[derive(Clone)]
pub enum Slot<'a> {
    /// Nothing; the slot element stays empty.
    Empty,
    /// A single child node.
    Node(&'a dyn SyntaxNode),
    /// A single token.
    Token(&'a dyn SyntaxToken),
    /// Children projected in order under the same slot element.
    List(Vec<Slot<'a>>),
    /// Content the projector cannot represent, described by its type name.
    Unknown(String),
}

impl Slot<'_> {
    /// A short description of the variant, for diagnostics.
    #[must_use]
    pub fn describe(&self) -> &str {
        match self {
            Self::Empty => "empty",
            Self::Node(_) => "node",
            Self::Token(_) => "token",
            Self::List(_) => "list",
            Self::Unknown(type_name) => type_name,
        }
    }
}

impl std::fmt::Debug for Slot<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Node(node) => f.debug_tuple("Node").field(&node.kind_name()).finish(),
            Self::Token(token) => f.debug_tuple("Token").field(&token.kind_name()).finish(),
            Self::List(items) => f.debug_tuple("List").field(items).finish(),
            Self::Empty | Self::Unknown(_) => f.write_str(self.describe()),
        }
    }
}

impl std::fmt::Debug for ChildSlot<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChildSlot")
            .field("name", &self.name)
            .field("content", &self.content)
            .finish()
    }
}

/// Capabilities a syntax node may expose to enhancers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityKind {
    /// The node declares or resolves to a namespaced name.
    NamespacedName,
    /// The node is a reference to a name with some qualification.
    NameReference,
}

/// A capability together with its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability {
    /// The resolved, namespaced name.
    NamespacedName(String),
    /// How a name reference is qualified.
    NameReference(NameQualification),
}

impl Capability {
    /// The kind this capability answers to.
    #[must_use]
    pub fn kind(&self) -> CapabilityKind {
        match self {
            Self::NamespacedName(_) => CapabilityKind::NamespacedName,
            Self::NameReference(_) => CapabilityKind::NameReference,
        }
    }
}

/// Qualification flags of a name reference.
///
/// The flags are independent; a parser may set any combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct NameQualification {
    /// Written with a leading separator, e.g. `\Foo\Bar`.
    pub fully_qualified: bool,
    /// Contains a separator but no leading one, e.g. `Foo\Bar`.
    pub qualified: bool,
    /// Relative to the current namespace, e.g. `namespace\Foo`.
    pub relative: bool,
    /// A bare name, e.g. `Foo`.
    pub unqualified: bool,
}

impl NameQualification {
    /// Names of the flags that are set, in the order full, qualified,
    /// relative, unqualified.
    #[must_use]
    pub fn labels(&self) -> Vec<&'static str> {
        [
            (self.fully_qualified, "full"),
            (self.qualified, "qualified"),
            (self.relative, "relative"),
            (self.unqualified, "unqualified"),
        ]
        .into_iter()
        .filter_map(|(set, label)| set.then_some(label))
        .collect()
    }
}
