use cxml::*;

#[test]
fn positional_predicate_selects_the_nth_node_in_document_order() {
    let doc = Document::parse("<r><x/><x/><x/></r>").unwrap();
    let root = doc.root_element().unwrap();
    let second = eval_xpath("//x[2]", root).unwrap().into_nodeset().unwrap();
    assert_eq!(second.len(), 1);

    let all_x: Vec<Node> = eval_xpath("//x", root).unwrap().into_nodeset().unwrap();
    assert_eq!(second[0].id(), all_x[1].id());
}

#[test]
fn result_set_is_unique_and_sorted_in_document_order() {
    let doc = Document::parse("<r><a><b/></a><c><b/></c></r>").unwrap();
    let root = doc.root_element().unwrap();

    // `descendant-or-self::b` visits each `b` once; unioning it with itself
    // must not duplicate results, and the set must come back in document order.
    let nodes = eval_xpath("(//b | //b)", root).unwrap().into_nodeset().unwrap();
    assert_eq!(nodes.len(), 2);
    let mut positions: Vec<u32> = nodes.iter().map(|n| n.position()).collect();
    let sorted = {
        let mut p = positions.clone();
        p.sort_unstable();
        p
    };
    assert_eq!(positions, sorted);
    positions.dedup();
    assert_eq!(positions.len(), 2);
}

#[test]
fn count_matches_the_result_set_size() {
    let doc = Document::parse("<r><x/><x/><x/></r>").unwrap();
    let root = doc.root_element().unwrap();
    let count = eval_xpath("count(//x)", root).unwrap().as_number();
    let nodes = eval_xpath("//x", root).unwrap().into_nodeset().unwrap();
    assert_eq!(count as usize, nodes.len());
}

#[test]
fn repeated_evaluation_of_an_absolute_path_is_idempotent() {
    let doc = Document::parse("<r><a/><b/><a/></r>").unwrap();
    let root = doc.root_element().unwrap();
    let xpath = XPath::compile("/r/a").unwrap();

    let first: Vec<NodeId> = xpath.evaluate(root).unwrap().into_nodeset().unwrap().iter().map(|n| n.id()).collect();
    let second: Vec<NodeId> = xpath.evaluate(root).unwrap().into_nodeset().unwrap().iter().map(|n| n.id()).collect();
    assert_eq!(first, second);
}

#[test]
fn naive_predicate_filter_matches_an_explicit_scan() {
    let doc = Document::parse("<r><x v='1'/><x v='2'/><x v='3'/></r>").unwrap();
    let root = doc.root_element().unwrap();

    let via_xpath: Vec<String> = eval_xpath("//x[@v='2']", root)
        .unwrap()
        .into_nodeset()
        .unwrap()
        .iter()
        .map(|n| n.string_value())
        .collect();

    let via_scan: Vec<String> = root
        .descendants()
        .filter(|n| n.tag_name().map(|t| t.local() == "x").unwrap_or(false))
        .filter(|n| n.attribute("v").and_then(|a| a.value()) == Some("2"))
        .map(|n| n.string_value())
        .collect();

    assert_eq!(via_xpath, via_scan);
}
