//! Enhancers annotate projected elements with attributes.
//!
//! The projector calls every registered [`Enhancer`] once for each syntax
//! node, right after the node's element was created and before any of its
//! children exist. An enhancer inspects the syntax node (usually through
//! [`SyntaxNode::capability`]) and may write attributes through the
//! [`ElementMut`] it is given; it cannot rename, remove or look inside the
//! element.
//!
//! Any `Fn(&dyn SyntaxNode, &mut ElementMut<'_>)` closure is an enhancer:
//!
//! ```
//! use xmlquery::projector::{ElementMut, OwnedNode, Projector, SyntaxNode};
//!
//! let projector = Projector::new().with_enhancer(
//!     |node: &dyn SyntaxNode, element: &mut ElementMut<'_>| {
//!         element.set_attribute("slots", node.child_slots().len().to_string());
//!     },
//! );
//! let root = projector.project("", &OwnedNode::new("SourceFile")).unwrap();
//! let file = root.find("//SourceFile", &[]).unwrap().first().unwrap();
//! assert_eq!(file.attributes().unwrap().get("slots").unwrap().as_deref(), Some("0"));
//! ```

use crate::document::{Document, NodeId};

use super::syntax::{Capability, CapabilityKind, SyntaxNode};

/// Write access to the attributes of one freshly projected element.
pub struct ElementMut<'a> {
    doc: &'a mut Document,
    id: NodeId,
    rejected: Option<String>,
}

impl<'a> ElementMut<'a> {
    pub(super) fn new(doc: &'a mut Document, id: NodeId) -> Self {
        Self {
            doc,
            id,
            rejected: None,
        }
    }

    /// The element name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.doc.element_name(self.id).unwrap_or_default()
    }

    /// Returns the value of attribute `name`, if set.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.doc.attribute(self.id, name)
    }

    /// Sets attribute `name` to `value`.
    ///
    /// An invalid attribute name is not written; the projection then fails
    /// with [`Error::InvalidName`](crate::Error::InvalidName) once the
    /// enhancers for this element have run.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        if self.doc.set_attribute(self.id, name, value).is_err() && self.rejected.is_none() {
            self.rejected = Some(name.to_string());
        }
        self
    }

    /// The first attribute name that was rejected, if any.
    pub(super) fn into_rejected(self) -> Option<String> {
        self.rejected
    }
}

impl std::fmt::Debug for ElementMut<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementMut")
            .field("id", &self.id)
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

/// Annotates the element projected for a syntax node.
pub trait Enhancer {
    /// Called once per syntax node, before its children are projected.
    /// Nodes the enhancer does not recognize are left alone.
    fn enhance(&self, node: &dyn SyntaxNode, element: &mut ElementMut<'_>);
}

impl<F> Enhancer for F
where
    F: Fn(&dyn SyntaxNode, &mut ElementMut<'_>),
{
    fn enhance(&self, node: &dyn SyntaxNode, element: &mut ElementMut<'_>) {
        self(node, element);
    }
}

/// Writes the resolved name of nodes with a namespaced name to the
/// `namespaced-name` attribute.
#[derive(Debug, Clone, Copy, Default)]
pub struct NamespacedNameEnhancer;

impl Enhancer for NamespacedNameEnhancer {
    fn enhance(&self, node: &dyn SyntaxNode, element: &mut ElementMut<'_>) {
        if let Some(Capability::NamespacedName(name)) =
            node.capability(CapabilityKind::NamespacedName)
        {
            element.set_attribute("namespaced-name", name);
        }
    }
}

/// Writes how a name reference is qualified to the `qualification`
/// attribute, e.g. `full` or `qualified,relative`.
#[derive(Debug, Clone, Copy, Default)]
pub struct QualifiedNameEnhancer;

impl Enhancer for QualifiedNameEnhancer {
    fn enhance(&self, node: &dyn SyntaxNode, element: &mut ElementMut<'_>) {
        if let Some(Capability::NameReference(qualification)) =
            node.capability(CapabilityKind::NameReference)
        {
            element.set_attribute("qualification", qualification.labels().join(","));
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::projector::owned::OwnedNode;
    use crate::projector::syntax::NameQualification;

    fn run(enhancer: &dyn Enhancer, node: &OwnedNode) -> (Document, NodeId, Option<String>) {
        let mut doc = Document::new();
        let id = doc.create_element(node.kind_name()).unwrap();
        let root = doc.root();
        doc.append_child(root, id).unwrap();
        let mut element = ElementMut::new(&mut doc, id);
        enhancer.enhance(node, &mut element);
        let rejected = element.into_rejected();
        (doc, id, rejected)
    }

    #[test]
    fn test_namespaced_name() {
        let node = OwnedNode::new("ClassDeclaration")
            .with_capability(Capability::NamespacedName("App\\Foobar".to_string()));
        let (doc, id, _) = run(&NamespacedNameEnhancer, &node);
        assert_eq!(doc.attribute(id, "namespaced-name"), Some("App\\Foobar"));
    }

    #[test]
    fn test_namespaced_name_ignores_other_nodes() {
        let (doc, id, _) = run(&NamespacedNameEnhancer, &OwnedNode::new("Token"));
        assert!(doc.attributes(id).is_empty());
    }

    #[test]
    fn test_qualification_single_flags() {
        let cases = [
            (
                NameQualification {
                    unqualified: true,
                    ..NameQualification::default()
                },
                "unqualified",
            ),
            (
                NameQualification {
                    fully_qualified: true,
                    ..NameQualification::default()
                },
                "full",
            ),
            (
                NameQualification {
                    qualified: true,
                    ..NameQualification::default()
                },
                "qualified",
            ),
            (
                NameQualification {
                    relative: true,
                    ..NameQualification::default()
                },
                "relative",
            ),
        ];
        for (qualification, expected) in cases {
            let node = OwnedNode::new("QualifiedName")
                .with_capability(Capability::NameReference(qualification));
            let (doc, id, _) = run(&QualifiedNameEnhancer, &node);
            assert_eq!(doc.attribute(id, "qualification"), Some(expected));
        }
    }

    #[test]
    fn test_qualification_combined_flags() {
        let node = OwnedNode::new("QualifiedName").with_capability(Capability::NameReference(
            NameQualification {
                qualified: true,
                relative: true,
                ..NameQualification::default()
            },
        ));
        let (doc, id, _) = run(&QualifiedNameEnhancer, &node);
        assert_eq!(doc.attribute(id, "qualification"), Some("qualified,relative"));
    }

    #[test]
    fn test_closure_enhancer_and_rejected_name() {
        let enhancer = |_: &dyn SyntaxNode, element: &mut ElementMut<'_>| {
            element.set_attribute("ok", "1").set_attribute("not ok", "2");
        };
        let (doc, id, rejected) = run(&enhancer, &OwnedNode::new("Node"));
        assert_eq!(doc.attribute(id, "ok"), Some("1"));
        assert_eq!(doc.attribute(id, "not ok"), None);
        assert_eq!(rejected.as_deref(), Some("not ok"));
    }

    #[test]
    fn test_element_name_is_readable() {
        let enhancer = |_: &dyn SyntaxNode, element: &mut ElementMut<'_>| {
            let name = element.name().to_lowercase();
            element.set_attribute("lower", name);
        };
        let (doc, id, _) = run(&enhancer, &OwnedNode::new("Variable"));
        assert_eq!(doc.attribute(id, "lower"), Some("variable"));
    }
}
