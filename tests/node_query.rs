#![allow(clippy::unwrap_used)]
//! Integration tests for node handles, node sets and query parameters.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use xmlquery::{parameterize, Error, Node, NodeSet, QueryParam, QueryValue};

fn names(set: &NodeSet) -> Vec<String> {
    set.iter().map(|n| n.name().unwrap()).collect()
}

fn list(members: &str) -> NodeSet {
    Node::from_xml_first_child(&format!("<list>{members}</list>"))
        .unwrap()
        .children()
        .unwrap()
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

#[test]
fn test_find_product() {
    let node = Node::from_xml("<orders><order><product>Hello</product></order></orders>").unwrap();
    assert_eq!(node.find("//product", &[]).unwrap().len(), 1);
}

#[test]
fn test_replace_returns_rebound_handle() {
    let mut node = Node::from_xml("<product>Hello</product>")
        .unwrap()
        .children()
        .unwrap()
        .first()
        .unwrap();
    let replaced = node.replace("<product>Foobar</product>").unwrap();
    assert_eq!(replaced.find("//product", &[]).unwrap().text().unwrap(), "Foobar");
    assert_eq!(replaced.name().unwrap(), "product");
}

#[test]
fn test_replace_text() {
    let node = Node::from_xml("<product>Hello</product>")
        .unwrap()
        .children()
        .unwrap()
        .first()
        .unwrap();
    let node = node.replace_text("Foobar").unwrap();
    let dump = node.find("//product", &[]).unwrap().dump(false).unwrap();
    assert!(dump.contains("<product>Foobar</product>"));
}

#[test]
fn test_replace_document_fails() {
    let mut node = Node::from_xml("<product>Hello</product>").unwrap();
    assert!(matches!(
        node.replace("<product>Foobar</product>"),
        Err(Error::InvalidRootMutation { .. })
    ));
}

#[test]
fn test_parent() {
    let node = Node::from_xml("<product><foobar>Hello</foobar></product>").unwrap();
    let foobar = node.find("//foobar", &[]).unwrap().first().unwrap();
    assert_eq!(foobar.parent().unwrap().name().unwrap(), "product");
}

#[test]
fn test_parent_of_parent_of_root_element_fails() {
    let node = Node::from_xml_first_child("<foo/>").unwrap();
    let err = node.parent().unwrap().parent().unwrap_err();
    assert_eq!(err.to_string(), "node \"#document\" has no parent");
}

#[test]
fn test_name() {
    let node = Node::from_xml("<product/>").unwrap().children().unwrap().first().unwrap();
    assert_eq!(node.name().unwrap(), "product");
}

#[test]
fn test_removes_itself() {
    let products = Node::from_xml_first_child("<products><product/></products>").unwrap();
    assert_eq!(products.children().unwrap().len(), 1);
    products.children().unwrap().first().unwrap().remove().unwrap();
    assert_eq!(products.children().unwrap().len(), 0);
}

#[test]
fn test_text_from_document_and_node() {
    assert_eq!(Node::from_xml("<foobar>Hello</foobar>").unwrap().text().unwrap(), "Hello");
    assert_eq!(
        Node::from_xml_first_child("<foobar>Hello</foobar>").unwrap().text().unwrap(),
        "Hello"
    );
}

#[test]
fn test_inserts_node_before() {
    let node = Node::from_xml_first_child("<foobar>Hello</foobar>").unwrap();
    let node = node.before("<barbar>foo</barbar>").unwrap();
    assert_eq!(node.name().unwrap(), "foobar");
    assert_eq!(
        node.root().dump(false).unwrap(),
        "<?xml version=\"1.0\"?>\n<barbar>foo</barbar>\n<foobar>Hello</foobar>\n"
    );
}

#[test]
fn test_inserts_node_after() {
    let node = Node::from_xml_first_child("<foobar>Hello</foobar>").unwrap();
    node.after("<barbar>foo</barbar>").unwrap();
    assert_eq!(
        node.root().dump(false).unwrap(),
        "<?xml version=\"1.0\"?>\n<foobar>Hello</foobar>\n<barbar>foo</barbar>\n"
    );
}

#[test]
fn test_appends_node_as_last_child() {
    let node = Node::from_xml_first_child("<foobar><barfoo/></foobar>").unwrap();
    let appended = node.append("<barbar>foo</barbar>").unwrap();
    assert_eq!(appended.name().unwrap(), "barbar");
    assert_eq!(
        node.root().dump(false).unwrap(),
        "<?xml version=\"1.0\"?>\n<foobar><barfoo/><barbar>foo</barbar></foobar>\n"
    );
}

#[test]
fn test_prepends_node_as_first_child() {
    let node = Node::from_xml_first_child("<foobar><barfoo/></foobar>").unwrap();
    let same = node.prepend("<barbar>foo</barbar>").unwrap();
    assert_eq!(same.name().unwrap(), "foobar");
    assert_eq!(
        node.root().dump(false).unwrap(),
        "<?xml version=\"1.0\"?>\n<foobar><barbar>foo</barbar><barfoo/></foobar>\n"
    );
}

#[test]
fn test_prepends_when_there_is_no_first_child() {
    let node = Node::from_xml_first_child("<foobar></foobar>").unwrap();
    node.prepend("<barbar>foo</barbar>").unwrap();
    assert_eq!(
        node.root().dump(false).unwrap(),
        "<?xml version=\"1.0\"?>\n<foobar><barbar>foo</barbar></foobar>\n"
    );
}

#[test]
fn test_clears_all_children() {
    let node = Node::from_xml_first_child("<foobar><bar/><foo/></foobar>").unwrap();
    node.clear().unwrap();
    assert_eq!(
        node.root().dump(false).unwrap(),
        "<?xml version=\"1.0\"?>\n<foobar/>\n"
    );
}

#[test]
fn test_root_node() {
    let node = Node::from_xml_first_child("<foobar><bar/><foo/></foobar>").unwrap();
    assert_eq!(node.root().name().unwrap(), "#document");
    let root = Node::from_xml("<foobar></foobar>").unwrap();
    assert_eq!(root.root().name().unwrap(), "#document");
}

#[test]
fn test_dumps_from_current_node() {
    let node = Node::from_xml_first_child("<foobar><hello>HI</hello></foobar>").unwrap();
    assert_eq!(
        node.dump(false).unwrap(),
        "<?xml version=\"1.0\"?>\n<foobar><hello>HI</hello></foobar>\n"
    );
}

#[test]
fn test_pretty_prints_dump() {
    let node = Node::from_xml_first_child("<foobar><hello>HI</hello></foobar>").unwrap();
    assert_eq!(
        node.dump(true).unwrap(),
        "<?xml version=\"1.0\"?>\n<foobar>\n  <hello>HI</hello>\n</foobar>\n"
    );
}

#[test]
fn test_evaluates_expression() {
    let node = Node::from_xml_first_child(r#"<foobar foo="bar"/>"#).unwrap();
    assert_eq!(node.evaluate(r#"./@foo="bar""#).unwrap(), QueryValue::Boolean(true));
    assert_eq!(node.evaluate(r#"./@foo="foo""#).unwrap(), QueryValue::Boolean(false));
}

#[test]
fn test_attributes_get_and_set() {
    let node = Node::from_xml_first_child(r#"<foobar foobar="bar"/>"#).unwrap();
    assert_eq!(node.attributes().unwrap().get("foobar").unwrap().as_deref(), Some("bar"));
    node.attributes().unwrap().set("bar", "foobar").unwrap();
    assert_eq!(node.attributes().unwrap().get("bar").unwrap().as_deref(), Some("foobar"));
}

#[test]
fn test_attributes_on_root_fails() {
    let node = Node::from_xml_first_child(r#"<foobar foobar="bar"/>"#).unwrap();
    assert!(matches!(node.root().attributes(), Err(Error::TypeMismatch { .. })));
}

#[test]
fn test_root_invariants() {
    let mut root = Node::from_xml("<a><b/></a>").unwrap();
    assert!(matches!(root.parent(), Err(Error::MissingParent { .. })));
    assert!(matches!(root.replace("<c/>"), Err(Error::InvalidRootMutation { .. })));
    assert_eq!(root.dump(false).unwrap(), "<?xml version=\"1.0\"?>\n<a><b/></a>\n");
}

#[test]
fn test_imported_copy_is_independent() {
    let source = Node::from_xml_first_child("<item>original</item>").unwrap();
    let target = Node::from_xml_first_child("<list/>").unwrap();
    let copy = target.append(&source).unwrap();
    source.replace_text("changed").unwrap();
    assert_eq!(copy.text().unwrap(), "original");
    assert!(!copy.same_document(&source));
}

// ---------------------------------------------------------------------------
// NodeSet
// ---------------------------------------------------------------------------

#[test]
fn test_first_last_child() {
    let set = list("<foobar/><barfoo/>");
    assert_eq!(set.first().unwrap().name().unwrap(), "foobar");
    assert_eq!(set.last().unwrap().name().unwrap(), "barfoo");
    assert_eq!(set.child(1).unwrap().name().unwrap(), "barfoo");
}

#[test]
fn test_empty_list_first_and_last_fail() {
    let set = list("");
    assert_eq!(set.first().unwrap_err(), Error::EmptyCollection);
    assert_eq!(set.last().unwrap_err(), Error::EmptyCollection);
}

#[test]
fn test_child_out_of_range() {
    let err = list("<foobar/><barfoo/>").child(3).unwrap_err();
    assert_eq!(err.to_string(), "no node at index 3, set has 2 nodes");
}

#[test]
fn test_after_each_member() {
    let root = Node::from_xml("<list><one/><two/><three/></list>").unwrap();
    root.find("/list/*", &[]).unwrap().after("<p/>").unwrap();
    let children = root.find("/list/*", &[]).unwrap();
    assert_eq!(names(&children), vec!["one", "p", "two", "p", "three", "p"]);
}

#[test]
fn test_before_each_member() {
    let root = Node::from_xml("<list><one/><two/><three/></list>").unwrap();
    root.find("/list/*", &[]).unwrap().before("<p/>").unwrap();
    let children = root.find("/list/*", &[]).unwrap();
    assert_eq!(names(&children), vec!["p", "one", "p", "two", "p", "three"]);
}

#[test]
fn test_append_to_empty_elements() {
    let root = Node::from_xml("<list><a/><b/></list>").unwrap();
    root.find("/list/*", &[]).unwrap().append("<p/>").unwrap();
    assert_eq!(
        root.dump(false).unwrap(),
        "<?xml version=\"1.0\"?>\n<list><a><p/></a><b><p/></b></list>\n"
    );
}

#[test]
fn test_prepend_to_elements_with_one_child() {
    let root = Node::from_xml("<list><a><x/></a><b><y/></b></list>").unwrap();
    root.find("/list/*", &[]).unwrap().prepend("<p/>").unwrap();
    assert_eq!(
        root.dump(false).unwrap(),
        "<?xml version=\"1.0\"?>\n<list><a><p/><x/></a><b><p/><y/></b></list>\n"
    );
}

#[test]
fn test_find_results_in_document_order() {
    let root = Node::from_xml("<r><a><c/></a><b/><c/></r>").unwrap();
    let found = root.find("//c | //b | //a", &[]).unwrap();
    assert_eq!(names(&found), vec!["a", "c", "b", "c"]);
}

#[test]
fn test_filter_keeps_order() {
    let root = Node::from_xml(r#"<r><i n="1"/><i n="2"/><i n="3"/><i n="4"/></r>"#).unwrap();
    let items = root.find("//i", &[]).unwrap();
    let even = items.filter_by("@n mod 2 = 0").unwrap();
    let values: Vec<_> = even
        .iter()
        .map(|n| n.attributes().unwrap().get("n").unwrap().unwrap())
        .collect();
    assert_eq!(values, vec!["2", "4"]);
}

#[test]
fn test_set_replace_parses_once_and_imports_per_member() {
    let root = Node::from_xml("<r><a/><a/><a/></r>").unwrap();
    let mut set = root.find("//a", &[]).unwrap();
    set.replace("<b>x</b>").unwrap();
    set.first().unwrap().replace_text("y").unwrap();
    assert_eq!(root.text().unwrap(), "yxx");
}

#[test]
fn test_nested_members_remove() {
    let root = Node::from_xml("<a><b><b/></b><c/></a>").unwrap();
    root.find("//b", &[]).unwrap().remove().unwrap();
    assert_eq!(root.dump(false).unwrap(), "<?xml version=\"1.0\"?>\n<a><c/></a>\n");
}

#[test]
fn test_nested_members_clear() {
    let root = Node::from_xml("<a><b><b/></b><c/></a>").unwrap();
    root.find("//b", &[]).unwrap().clear().unwrap();
    assert_eq!(root.dump(false).unwrap(), "<?xml version=\"1.0\"?>\n<a><b/><c/></a>\n");
}

#[test]
fn test_nested_members_replace() {
    let root = Node::from_xml("<a><b><b/></b><c/></a>").unwrap();
    let mut set = root.find("//b", &[]).unwrap();
    set.replace("<d/>").unwrap();
    assert_eq!(root.dump(false).unwrap(), "<?xml version=\"1.0\"?>\n<a><d/><c/></a>\n");
    assert_eq!(set.first().unwrap().name().unwrap(), "d");
    assert!(set.last().unwrap().is_stale());
}

#[test]
fn test_nested_members_text() {
    let root = Node::from_xml("<a><b>1<b>2</b></b><c/></a>").unwrap();
    assert_eq!(root.find("//b", &[]).unwrap().text().unwrap(), "122");
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

#[test]
fn test_find_with_parameters() {
    let root = Node::from_xml(r#"<r><a k="1">one</a><a k="2">two?</a></r>"#).unwrap();
    let found = root.find("//a[@k=? and . != '?']", &[2.into()]).unwrap();
    assert_eq!(found.text().unwrap(), "two?");
}

#[test]
fn test_missing_parameter_surfaces_from_find() {
    let root = Node::from_xml("<r/>").unwrap();
    let err = root.find("//a[@k=?]", &[]).unwrap_err();
    assert!(matches!(err, Error::MissingQueryParameter { index: 1, .. }));
}

#[test]
fn test_missing_parameter_message_states_convention() {
    let err = parameterize("//a[@k=?]", &[]).unwrap_err();
    assert_eq!(
        err.to_string(),
        r#"parameter 1 (1-based) of expression "//a[@k=?]" is missing"#
    );
}

#[test]
fn test_string_parameter_with_both_quotes() {
    let root = Node::from_xml(r#"<r><a v="it's &quot;x&quot;"/></r>"#).unwrap();
    let found = root.find("//a[@v=?]", &[r#"it's "x""#.into()]).unwrap();
    assert_eq!(found.len(), 1);
}

#[test]
fn test_quote_awareness() {
    assert_eq!(parameterize("//x[@a='?']", &[]).unwrap(), "//x[@a='?']");
    assert_eq!(
        parameterize("//x[@a='?' and @b=?]", &[QueryParam::from("v")]).unwrap(),
        r#"//x[@a='?' and @b="v"]"#
    );
}

proptest! {
    #[test]
    fn prop_parameterize_without_placeholders_is_identity(query in "[a-z/@\\[\\]=' ]{0,40}") {
        prop_assume!(!query.contains('?'));
        prop_assert_eq!(parameterize(&query, &[]).unwrap(), query);
    }

    #[test]
    fn prop_string_parameters_match_themselves(value in "[ -~]{0,20}") {
        let root = Node::from_xml("<r><a/></r>").unwrap();
        let a = root.find("//a", &[]).unwrap().first().unwrap();
        a.attributes().unwrap().set("v", value.clone()).unwrap();
        let found = root.find("//a[@v=?]", &[QueryParam::from(value)]).unwrap();
        prop_assert_eq!(found.len(), 1);
    }
}
