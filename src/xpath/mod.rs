//! Near-complete XPath 1.0 evaluator over this crate's tree.
//!
//! Structured as a classic front end/back end split: [`lexer`]/[`parser`]
//! turn an expression string into an [`ast::Expr`], [`axes`] turns one step's
//! axis into a node-set, [`functions`] implements the core function library,
//! and [`eval`] ties a parsed expression to a context node and produces a
//! [`eval::Value`]. Grounded on `petty-xpath1`'s module split (the only
//! other example repo implementing an XPath-shaped evaluator), adapted from
//! `nom` combinators to this crate's hand-written `Stream` scanning.

mod ast;
mod axes;
mod cache;
mod eval;
mod functions;
mod lexer;
mod parser;

pub use ast::{Axis, BinaryOp, Expr, LocationPath, NameMatch, NodeTest, PathRoot, Step};
pub use eval::Value;

use crate::error::Result;
use crate::node::Node;
use cache::PathCache;
use eval::EvaluationContext;
use std::cell::RefCell;

/// A parsed, reusable XPath 1.0 expression.
///
/// Parsing is separated from evaluation so the same compiled expression can
/// be run against many context nodes (e.g. once per element matched by a
/// [`crate::query`] selector) without re-tokenizing the text each time.
pub struct XPath {
    expr: Expr,
}

impl XPath {
    /// Parses `text` as an XPath 1.0 expression.
    pub fn compile(text: &str) -> Result<XPath> {
        Ok(XPath { expr: parser::parse(text)? })
    }

    /// Evaluates this expression with `context` as the context node, a
    /// context position of 1, and a context size of 1 (the defaults XPath
    /// 1.0 §2 assigns a lone context node at the top level).
    pub fn evaluate<'a>(&self, context: Node<'a>) -> Result<Value<'a>> {
        let node_count = context.document().arena_len();
        let cache = RefCell::new(PathCache::with_document_size(node_count));
        let ctx = EvaluationContext::new(context, &cache);
        eval::evaluate(&self.expr, &ctx)
    }
}

/// Parses and evaluates `expr` against `context` in one call.
pub fn evaluate<'a>(expr: &str, context: Node<'a>) -> Result<Value<'a>> {
    XPath::compile(expr)?.evaluate(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse as parse_xml;

    #[test]
    fn compiles_once_and_evaluates_against_multiple_contexts() {
        let doc = parse_xml("<root><a><b/></a><a><b/></a></root>").unwrap();
        let path = XPath::compile("count(b)").unwrap();
        for a in doc.root_element().unwrap().children().filter(|n| n.is_element()) {
            assert_eq!(path.evaluate(a).unwrap().as_number(), 1.0);
        }
    }

    #[test]
    fn top_level_convenience_function_parses_and_runs() {
        let doc = parse_xml("<root><a id='1'/><a id='2'/></root>").unwrap();
        let v = evaluate("/root/a[@id='2']", doc.root_element().unwrap()).unwrap();
        assert_eq!(v.into_nodeset().unwrap().len(), 1);
    }
}
