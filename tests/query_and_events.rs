use cxml::*;

#[test]
fn compact_query_finds_the_node_xpath_would_find() {
    let doc = Document::parse("<root><item id='1'/><item id='2'/></root>").unwrap();
    let root = doc.root_element().unwrap();

    let via_query = query(root, "<item>/id='2'/").unwrap();
    let via_xpath = eval_xpath("/root/item[@id='2']", root).unwrap().into_nodeset().unwrap();

    assert_eq!(via_query.len(), 1);
    assert_eq!(via_xpath.len(), 1);
    assert_eq!(via_query[0].id(), via_xpath[0].id());
}

#[test]
fn compact_query_optional_group_matches_when_any_member_holds() {
    let doc = Document::parse("<root><item a='x'/><item b='y'/><item/></root>").unwrap();
    let root = doc.root_element().unwrap();

    let matched = query(root, "<item>/[a|='x' / b|='y']/").unwrap();
    assert_eq!(matched.len(), 2);
}

#[test]
fn event_reader_emits_a_begin_and_end_event_per_element() {
    let xml = "<root><child>text</child></root>";
    let mut reader = EventReader::new(xml);
    let mut begins = 0;
    let mut ends = 0;
    while let Some(ev) = reader.next() {
        match ev.unwrap() {
            Event::BeginElement { .. } => begins += 1,
            Event::EndElement { .. } => ends += 1,
            _ => {}
        }
    }
    assert_eq!(begins, 2);
    assert_eq!(ends, 2);
    assert!(reader.errors().is_empty());
}

#[test]
fn event_reader_and_tree_parser_see_the_same_element_names() {
    let xml = "<root><a/><b/></root>";
    let doc = Document::parse(xml).unwrap();
    let tree_names: Vec<String> = doc
        .root_element()
        .unwrap()
        .descendants()
        .filter(|n| n.is_element())
        .map(|n| n.tag_name().unwrap().local().to_string())
        .collect();

    let mut reader = EventReader::new(xml);
    let mut event_names = Vec::new();
    while let Some(ev) = reader.next() {
        if let Event::BeginElement { name, .. } = ev.unwrap() {
            event_names.push(name.local().to_string());
        }
    }

    assert_eq!(tree_names, event_names);
}
