use cxml::*;

#[test]
fn delete_removes_the_node_from_its_parents_children() {
    let mut doc = Document::parse("<r><a/><b/></r>").unwrap();
    let b_id = doc.root_element().unwrap().children().nth(1).unwrap().id();

    doc.delete_node(b_id);

    let root = doc.root_element().unwrap();
    assert_eq!(root.children().count(), 1);
    assert!(root.children().all(|c| c.id() != b_id));
    assert_eq!(root.children().next().unwrap().tag_name().unwrap().local(), "a");
}

#[test]
fn drop_updates_the_old_parents_children_and_flags() {
    let mut doc = Document::parse("<r><a/></r>").unwrap();
    let a_id = doc.root_element().unwrap().children().next().unwrap().id();

    doc.drop_node(a_id);

    let root = doc.root_element().unwrap();
    assert!(!root.has_children());
    assert!(root.children().all(|c| c.id() != a_id));
}
