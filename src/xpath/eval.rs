//! Evaluation engine: turns a parsed [`Expr`] plus a context node into a
//! [`Value`].
//!
//! Grounded on `petty-xpath1`'s `eval.rs` for the value model and the
//! node-test/predicate pipeline shape, adapted to this crate's arena
//! `Node`/`NodeId` handles and to the tombstone-aware `Document`.

use super::ast::{Axis, BinaryOp, Expr, LocationPath, NameMatch, NodeTest, PathRoot};
use super::axes;
use super::cache::PathCache;
use super::functions;
use crate::error::{Error, Result};
use crate::node::{Node, NodeId};
use std::cell::RefCell;

/// One XPath 1.0 value (§2 of the data model: node-set, boolean, number,
/// string).
#[derive(Clone, Debug)]
pub enum Value<'a> {
    NodeSet(Vec<Node<'a>>),
    Boolean(bool),
    Number(f64),
    String(String),
}

impl<'a> Value<'a> {
    pub fn into_nodeset(self) -> Result<Vec<Node<'a>>> {
        match self {
            Value::NodeSet(v) => Ok(v),
            _ => Err(Error::XPathEval("expected a node-set".to_string())),
        }
    }

    pub fn as_boolean(&self) -> bool {
        match self {
            Value::NodeSet(v) => !v.is_empty(),
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
        }
    }

    pub fn as_number(&self) -> f64 {
        match self {
            Value::NodeSet(v) => match v.first() {
                Some(n) => string_to_number(&n.string_value()),
                None => f64::NAN,
            },
            Value::Boolean(b) => if *b { 1.0 } else { 0.0 },
            Value::Number(n) => *n,
            Value::String(s) => string_to_number(s),
        }
    }

    pub fn as_string(&self) -> String {
        match self {
            Value::NodeSet(v) => match v.first() {
                Some(n) => n.string_value(),
                None => String::new(),
            },
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
        }
    }
}

fn string_to_number(s: &str) -> f64 {
    s.trim().parse().unwrap_or(f64::NAN)
}

pub(crate) fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() }
    } else if n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Per-step context: the node being evaluated from, its position within the
/// current step's node-set, and the size of that set (XPath 1.0 `position()`
/// and `last()`).
pub struct EvaluationContext<'a, 'c> {
    pub node: Node<'a>,
    pub position: usize,
    pub size: usize,
    pub(crate) cache: &'c RefCell<PathCache>,
}

impl<'a, 'c> EvaluationContext<'a, 'c> {
    pub fn new(node: Node<'a>, cache: &'c RefCell<PathCache>) -> Self {
        EvaluationContext { node, position: 1, size: 1, cache }
    }

    fn with_node(&self, node: Node<'a>, position: usize, size: usize) -> EvaluationContext<'a, 'c> {
        EvaluationContext { node, position, size, cache: self.cache }
    }
}

pub(crate) fn evaluate<'a, 'c>(expr: &Expr, ctx: &EvaluationContext<'a, 'c>) -> Result<Value<'a>> {
    match expr {
        Expr::Path(path) => Ok(Value::NodeSet(eval_location_path(path, ctx)?)),
        Expr::Filter(primary, predicates) => {
            let base = evaluate(primary, ctx)?.into_nodeset()?;
            Ok(Value::NodeSet(apply_predicates(base, predicates, ctx)?))
        }
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Literal(s) => Ok(Value::String(s.clone())),
        Expr::Variable(name) => Err(Error::XPathEval(format!("undefined variable '${}': variable bindings are not supported", name))),
        Expr::FunctionCall(name, args) => functions::call(name, args, ctx),
        Expr::Union(lhs, rhs) => {
            let mut l = evaluate(lhs, ctx)?.into_nodeset()?;
            let r = evaluate(rhs, ctx)?.into_nodeset()?;
            l.extend(r);
            dedup_sort(&mut l);
            Ok(Value::NodeSet(l))
        }
        Expr::Negate(inner) => Ok(Value::Number(-evaluate(inner, ctx)?.as_number())),
        Expr::BinaryOp(op, lhs, rhs) => eval_binary(*op, lhs, rhs, ctx),
    }
}

fn eval_binary<'a, 'c>(op: BinaryOp, lhs: &Expr, rhs: &Expr, ctx: &EvaluationContext<'a, 'c>) -> Result<Value<'a>> {
    match op {
        BinaryOp::Or => {
            let l = evaluate(lhs, ctx)?;
            if l.as_boolean() {
                return Ok(Value::Boolean(true));
            }
            Ok(Value::Boolean(evaluate(rhs, ctx)?.as_boolean()))
        }
        BinaryOp::And => {
            let l = evaluate(lhs, ctx)?;
            if !l.as_boolean() {
                return Ok(Value::Boolean(false));
            }
            Ok(Value::Boolean(evaluate(rhs, ctx)?.as_boolean()))
        }
        BinaryOp::Eq | BinaryOp::Ne => {
            let l = evaluate(lhs, ctx)?;
            let r = evaluate(rhs, ctx)?;
            let eq = compare_equality(&l, &r);
            Ok(Value::Boolean(if op == BinaryOp::Eq { eq } else { !eq }))
        }
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let l = evaluate(lhs, ctx)?.as_number();
            let r = evaluate(rhs, ctx)?.as_number();
            let result = match op {
                BinaryOp::Lt => l < r,
                BinaryOp::Le => l <= r,
                BinaryOp::Gt => l > r,
                BinaryOp::Ge => l >= r,
                _ => unreachable!(),
            };
            Ok(Value::Boolean(result))
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
            let l = evaluate(lhs, ctx)?.as_number();
            let r = evaluate(rhs, ctx)?.as_number();
            let result = match op {
                BinaryOp::Add => l + r,
                BinaryOp::Sub => l - r,
                BinaryOp::Mul => l * r,
                BinaryOp::Div => l / r,
                BinaryOp::Mod => l % r,
                _ => unreachable!(),
            };
            Ok(Value::Number(result))
        }
    }
}

/// `=`/`!=` compare node-sets by existence of any matching pair (§3.4), and
/// otherwise coerce to the "richest" shared type (boolean > number > string).
fn compare_equality(l: &Value, r: &Value) -> bool {
    match (l, r) {
        (Value::NodeSet(a), Value::NodeSet(b)) => {
            a.iter().any(|x| b.iter().any(|y| x.string_value() == y.string_value()))
        }
        (Value::NodeSet(a), other) | (other, Value::NodeSet(a)) => match other {
            Value::Number(_) => a.iter().any(|n| string_to_number(&n.string_value()) == other.as_number()),
            Value::Boolean(_) => a.iter().next().is_some() == other.as_boolean(),
            Value::String(_) => a.iter().any(|n| n.string_value() == other.as_string()),
            Value::NodeSet(_) => unreachable!(),
        },
        (Value::Boolean(_), _) | (_, Value::Boolean(_)) => l.as_boolean() == r.as_boolean(),
        (Value::Number(_), _) | (_, Value::Number(_)) => l.as_number() == r.as_number(),
        _ => l.as_string() == r.as_string(),
    }
}

fn dedup_sort(nodes: &mut Vec<Node>) {
    nodes.sort_by_key(|n| n.position());
    nodes.dedup_by_key(|n| n.position());
}

fn apply_predicates<'a, 'c>(nodes: Vec<Node<'a>>, predicates: &[Expr], ctx: &EvaluationContext<'a, 'c>) -> Result<Vec<Node<'a>>> {
    let mut current = nodes;
    for pred in predicates {
        let size = current.len();
        let mut kept = Vec::with_capacity(current.len());
        for (i, node) in current.into_iter().enumerate() {
            let pred_ctx = ctx.with_node(node, i + 1, size);
            if predicate_matches(pred, &pred_ctx)? {
                kept.push(node);
            }
        }
        current = kept;
    }
    Ok(current)
}

fn predicate_matches(pred: &Expr, ctx: &EvaluationContext) -> Result<bool> {
    let v = evaluate(pred, ctx)?;
    Ok(match v {
        Value::Number(n) => n == ctx.position as f64,
        other => other.as_boolean(),
    })
}

pub(crate) fn eval_location_path<'a, 'c>(path: &LocationPath, ctx: &EvaluationContext<'a, 'c>) -> Result<Vec<Node<'a>>> {
    let cache_key = cacheable_key(path, ctx);
    if let Some(key) = cache_key {
        if let Some(ids) = ctx.cache.borrow_mut().get(key) {
            let doc = ctx.node.document();
            return Ok(ids.into_iter().map(|id| doc_node(doc, id)).collect());
        }
    }

    let mut current: Vec<Node<'a>> = match &path.root {
        PathRoot::Absolute => vec![ctx.node.document().root()],
        PathRoot::Relative => vec![ctx.node],
        PathRoot::Filter(inner) => evaluate(inner, ctx)?.into_nodeset()?,
    };

    for step in &path.steps {
        let mut next: Vec<Node<'a>> = Vec::new();
        for from in current.iter().copied() {
            let axis_nodes = axes::nodes_for_axis(step.axis, from);
            let filtered: Vec<Node<'a>> = axis_nodes.into_iter().filter(|n| node_test_matches(&step.test, *n, step.axis, from)).collect();
            let matched = apply_predicates(filtered, &step.predicates, ctx)?;
            next.extend(matched);
        }
        dedup_sort(&mut next);
        current = next;
    }

    if let Some(key) = cache_key {
        ctx.cache.borrow_mut().insert(key, current.iter().map(|n| n.id()).collect());
    }
    Ok(current)
}

fn doc_node<'a>(doc: &'a crate::node::Document, id: NodeId) -> Node<'a> {
    Node { id, doc }
}

/// Absolute paths with no variable/context-dependent predicates produce the
/// same node-set regardless of the caller's context node, so they are safe
/// to cache keyed by the `LocationPath`'s own address.
fn cacheable_key(path: &LocationPath, _ctx: &EvaluationContext) -> Option<usize> {
    if !matches!(path.root, PathRoot::Absolute) {
        return None;
    }
    Some(path as *const LocationPath as usize)
}

fn node_test_matches(test: &NodeTest, node: Node, axis: Axis, from: Node) -> bool {
    match test {
        NodeTest::AnyNode => true,
        NodeTest::Comment => node.is_comment(),
        NodeTest::Text => node.is_text(),
        NodeTest::ProcessingInstruction(target) => node.is_pi() && target.as_deref().map_or(true, |t| node.pi_target() == Some(t)),
        NodeTest::Name { prefix, local } => {
            if axis.principal_is_namespace() {
                return node.is_namespace()
                    && match local {
                        NameMatch::Any => true,
                        NameMatch::Exact(n) => node.namespace_prefix() == Some(n.as_str()),
                    };
            }
            let is_principal = if axis.principal_is_attribute() { node.is_attribute() } else { node.is_element() };
            if !is_principal {
                return false;
            }
            const XML_NS_URI: &str = "http://www.w3.org/XML/1998/namespace";
            let expected_uri: Option<String> = match prefix.as_deref() {
                None => None,
                Some("xml") => Some(XML_NS_URI.to_string()),
                Some(p) => from.resolve_prefix(p).map(|s| s.to_string()),
            };
            let actual_local = if axis.principal_is_attribute() {
                node.attribute_name().map(|q| q.local())
            } else {
                node.tag_name().map(|q| q.local())
            };
            let name_ok = match local {
                NameMatch::Any => true,
                NameMatch::Exact(n) => actual_local == Some(n.as_str()),
            };
            let uri_ok = match &expected_uri {
                None => node.namespace_uri().is_none(),
                Some(u) => node.namespace_uri() == Some(u.as_str()),
            };
            name_ok && uri_ok
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn eval_str<'a>(doc: &'a crate::node::Document, expr: &str) -> Value<'a> {
        let ast = crate::xpath::parser::parse(expr).unwrap();
        let cache = RefCell::new(PathCache::new(64));
        let ctx = EvaluationContext::new(doc.root_element().unwrap(), &cache);
        evaluate(&ast, &ctx).unwrap()
    }

    #[test]
    fn evaluates_a_simple_child_path() {
        let doc = parse("<root><a>1</a><a>2</a></root>").unwrap();
        let v = eval_str(&doc, "/root/a");
        assert_eq!(v.into_nodeset().unwrap().len(), 2);
    }

    #[test]
    fn positional_predicate_selects_one_node() {
        let doc = parse("<root><a>1</a><a>2</a></root>").unwrap();
        let v = eval_str(&doc, "/root/a[2]");
        let ns = v.into_nodeset().unwrap();
        assert_eq!(ns.len(), 1);
        assert_eq!(ns[0].string_value(), "2");
    }

    #[test]
    fn boolean_predicate_filters_by_attribute() {
        let doc = parse("<root><a id='x'/><a/></root>").unwrap();
        let v = eval_str(&doc, "/root/a[@id]");
        assert_eq!(v.into_nodeset().unwrap().len(), 1);
    }

    #[test]
    fn arithmetic_and_comparison_evaluate_to_scalars() {
        let doc = parse("<root/>").unwrap();
        assert_eq!(eval_str(&doc, "1 + 2 * 3").as_number(), 7.0);
        assert!(eval_str(&doc, "2 < 3").as_boolean());
    }

    #[test]
    fn wildcard_name_test_matches_any_element() {
        let doc = parse("<root><a/><b/></root>").unwrap();
        let v = eval_str(&doc, "/root/*");
        assert_eq!(v.into_nodeset().unwrap().len(), 2);
    }
}
