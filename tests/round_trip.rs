use cxml::*;

#[test]
fn self_enclosing_child_round_trips_and_reports_flags() {
    let doc = Document::parse("<a><b/></a>").unwrap();
    assert!(doc.is_well_formed());
    let a = doc.root_element().unwrap();
    assert!(a.has_children());
    let b = a.children().next().unwrap();
    assert!(b.is_self_enclosing());

    let text = Serializer::new().to_string(doc.root());
    let doc2 = Document::parse(&text).unwrap();
    let a2 = doc2.root_element().unwrap();
    assert_eq!(a2.tag_name().unwrap().local(), "a");
    let b2 = a2.children().find(|c| c.is_element()).unwrap();
    assert_eq!(b2.tag_name().unwrap().local(), "b");
}

#[test]
fn first_attribute_by_position_serializes_first() {
    let doc = Document::parse(r#"<r><x a="1" b="2"/></r>"#).unwrap();
    let x = doc.root_element().unwrap().children().next().unwrap();
    let a = x.attribute("a").unwrap();
    let s = Serializer::new().to_string(a);
    assert_eq!(s.trim(), r#"a="1""#);
}

#[test]
fn entity_reference_decodes_and_strict_transpose_reencodes() {
    let doc = Document::parse("<r>&lt;b&gt;</r>").unwrap();
    let r = doc.root_element().unwrap();
    let text = r.children().next().unwrap();
    assert_eq!(text.value(), Some("<b>"));

    let mut config = Config::default();
    config.strict_transpose = true;
    let out = Serializer::with_config(config).to_string(doc.root());
    assert!(out.contains("&lt;b&gt;"));
}

#[test]
fn prolog_and_doctype_are_excluded_from_node_test() {
    let doc = Document::parse("<?xml version=\"1.0\"?><!DOCTYPE r><r/>").unwrap();
    let root = doc.root_element().unwrap();

    let via_root_path = eval_xpath("/r", root).unwrap().into_nodeset().unwrap();
    assert_eq!(via_root_path.len(), 1);
    assert_eq!(via_root_path[0].tag_name().unwrap().local(), "r");

    let via_node_test = eval_xpath("//node()", root).unwrap().into_nodeset().unwrap();
    assert_eq!(via_node_test.len(), 1);
    assert_eq!(via_node_test[0].tag_name().unwrap().local(), "r");

    assert!(doc.xml_declaration().is_some());
    assert!(doc.dtd().is_some());
}

#[test]
fn namespaced_attribute_is_addressable_by_expanded_name() {
    let doc = Document::parse(r#"<r xmlns:a="u"><a:e a:k="1"/></r>"#).unwrap();
    let nodes = eval_xpath("//a:e/@a:k", doc.root_element().unwrap())
        .unwrap()
        .into_nodeset()
        .unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].value(), Some("1"));
}
