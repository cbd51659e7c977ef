//! Axis traversal: turns a context node into the ordered set of nodes an
//! XPath axis visits (spec §4.4 "3-stage step evaluation pipeline", stage 1).
//!
//! Grounded on `petty-xpath1`'s `axes.rs`, adapted to this crate's
//! `Node`/`NodeId` arena handles instead of borrowed DOM references.

use super::ast::Axis;
use crate::node::Node;

/// Returns the nodes visited by `axis` from `context`, in the axis's own
/// traversal order (forward axes: document order; reverse axes: reverse
/// document order, per the XPath 1.0 definition of "reverse axis").
pub(crate) fn nodes_for_axis<'a>(axis: Axis, context: Node<'a>) -> Vec<Node<'a>> {
    match axis {
        Axis::Self_ => vec![context],
        Axis::Parent => context.parent().into_iter().collect(),
        Axis::Child => context.children().collect(),
        Axis::Attribute => context.attributes().collect(),
        Axis::Namespace => in_scope_namespaces(context),
        Axis::Descendant => context.descendants().collect(),
        Axis::DescendantOrSelf => {
            let mut v = vec![context];
            v.extend(context.descendants());
            v
        }
        Axis::Ancestor => context.ancestors().collect(),
        Axis::AncestorOrSelf => {
            let mut v = vec![context];
            v.extend(context.ancestors());
            v
        }
        Axis::FollowingSibling => following_siblings(context),
        Axis::PrecedingSibling => preceding_siblings(context),
        Axis::Following => following(context),
        Axis::Preceding => preceding(context),
    }
}

fn following_siblings<'a>(context: Node<'a>) -> Vec<Node<'a>> {
    let mut out = Vec::new();
    let mut cur = context.next_sibling();
    while let Some(n) = cur {
        cur = n.next_sibling();
        out.push(n);
    }
    out
}

fn preceding_siblings<'a>(context: Node<'a>) -> Vec<Node<'a>> {
    let mut out = Vec::new();
    let mut cur = context.prev_sibling();
    while let Some(n) = cur {
        cur = n.prev_sibling();
        out.push(n);
    }
    out
}

/// Every node after `context` in document order, excluding its own
/// descendants and excluding attribute/namespace nodes (XPath 1.0 §2.3).
fn following<'a>(context: Node<'a>) -> Vec<Node<'a>> {
    let doc = context.document();
    let pos = context.position();
    let mut excluded: Vec<u32> = context.descendants().map(|n| n.position()).collect();
    excluded.push(pos);
    let mut out: Vec<Node<'a>> = doc
        .root()
        .descendants()
        .filter(|n| n.position() > pos && !excluded.contains(&n.position()))
        .collect();
    out.sort_by_key(|n| n.position());
    out
}

/// Every node before `context` in document order, excluding ancestors.
fn preceding<'a>(context: Node<'a>) -> Vec<Node<'a>> {
    let doc = context.document();
    let pos = context.position();
    let ancestor_positions: Vec<u32> = context.ancestors().map(|n| n.position()).collect();
    let mut out: Vec<Node<'a>> = doc
        .root()
        .descendants()
        .filter(|n| n.position() < pos && !ancestor_positions.contains(&n.position()))
        .collect();
    out.sort_by(|a, b| b.position().cmp(&a.position()));
    out
}

/// Namespace nodes visible at `context`: the nearest ancestor-or-self
/// element's declared bindings, walking outward and keeping the first
/// (innermost) binding per prefix.
fn in_scope_namespaces<'a>(context: Node<'a>) -> Vec<Node<'a>> {
    let start = if context.is_element() { Some(context) } else { context.parent_element() };
    let mut seen_prefixes = std::collections::HashSet::new();
    let mut out = Vec::new();
    let mut cur = start;
    while let Some(el) = cur {
        for ns in el.namespaces() {
            let prefix = ns.namespace_prefix().unwrap_or("").to_string();
            if seen_prefixes.insert(prefix) {
                out.push(ns);
            }
        }
        cur = el.parent_element();
    }
    out
}
