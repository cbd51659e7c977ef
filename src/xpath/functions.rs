//! The XPath 1.0 core function library (spec §4).
//!
//! Grounded on `petty-xpath1`'s `functions.rs` for the dispatch table shape;
//! bodies follow the XPath 1.0 recommendation's per-function definitions
//! directly since the corpus implementation covers only a subset.

use super::ast::Expr;
use super::eval::{evaluate, EvaluationContext, Value};
use crate::error::{Error, Result};

pub(crate) fn call<'a, 'c>(name: &str, args: &[Expr], ctx: &EvaluationContext<'a, 'c>) -> Result<Value<'a>> {
    match name {
        "last" => {
            check_arity(name, args, 0)?;
            Ok(Value::Number(ctx.size as f64))
        }
        "position" => {
            check_arity(name, args, 0)?;
            Ok(Value::Number(ctx.position as f64))
        }
        "count" => {
            check_arity(name, args, 1)?;
            let ns = evaluate(&args[0], ctx)?.into_nodeset()?;
            Ok(Value::Number(ns.len() as f64))
        }
        "id" => {
            check_arity(name, args, 1)?;
            let v = evaluate(&args[0], ctx)?;
            let ids = match &v {
                Value::NodeSet(ns) => ns.iter().map(|n| n.string_value()).collect::<Vec<_>>().join(" "),
                other => other.as_string(),
            };
            Ok(Value::NodeSet(lookup_ids(ctx, &ids)))
        }
        "local-name" => {
            let node = arg0_node(name, args, ctx)?;
            Ok(Value::String(match node {
                Some(n) => n.tag_name().map(|q| q.local().to_string()).or_else(|| n.attribute_name().map(|q| q.local().to_string())).or_else(|| n.pi_target().map(|s| s.to_string())).unwrap_or_default(),
                None => String::new(),
            }))
        }
        "namespace-uri" => {
            let node = arg0_node(name, args, ctx)?;
            Ok(Value::String(node.and_then(|n| n.namespace_uri()).unwrap_or("").to_string()))
        }
        "name" => {
            let node = arg0_node(name, args, ctx)?;
            Ok(Value::String(match node {
                Some(n) => n.tag_name().map(|q| q.combined().to_string()).or_else(|| n.attribute_name().map(|q| q.combined().to_string())).or_else(|| n.pi_target().map(|s| s.to_string())).unwrap_or_default(),
                None => String::new(),
            }))
        }
        "string" => {
            check_arity(name, args, if args.is_empty() { 0 } else { 1 })?;
            if args.is_empty() {
                Ok(Value::String(ctx.node.string_value()))
            } else {
                Ok(Value::String(evaluate(&args[0], ctx)?.as_string()))
            }
        }
        "concat" => {
            if args.len() < 2 {
                return Err(Error::XPathEval("concat() requires at least two arguments".to_string()));
            }
            let mut out = String::new();
            for a in args {
                out.push_str(&evaluate(a, ctx)?.as_string());
            }
            Ok(Value::String(out))
        }
        "starts-with" => {
            check_arity(name, args, 2)?;
            let a = evaluate(&args[0], ctx)?.as_string();
            let b = evaluate(&args[1], ctx)?.as_string();
            Ok(Value::Boolean(a.starts_with(b.as_str())))
        }
        "contains" => {
            check_arity(name, args, 2)?;
            let a = evaluate(&args[0], ctx)?.as_string();
            let b = evaluate(&args[1], ctx)?.as_string();
            Ok(Value::Boolean(a.contains(b.as_str())))
        }
        "substring-before" => {
            check_arity(name, args, 2)?;
            let a = evaluate(&args[0], ctx)?.as_string();
            let b = evaluate(&args[1], ctx)?.as_string();
            Ok(Value::String(a.find(b.as_str()).map(|i| a[..i].to_string()).unwrap_or_default()))
        }
        "substring-after" => {
            check_arity(name, args, 2)?;
            let a = evaluate(&args[0], ctx)?.as_string();
            let b = evaluate(&args[1], ctx)?.as_string();
            Ok(Value::String(a.find(b.as_str()).map(|i| a[i + b.len()..].to_string()).unwrap_or_default()))
        }
        "substring" => {
            if args.len() < 2 || args.len() > 3 {
                return Err(Error::XPathEval("substring() takes two or three arguments".to_string()));
            }
            let s = evaluate(&args[0], ctx)?.as_string();
            let chars: Vec<char> = s.chars().collect();
            let start = evaluate(&args[1], ctx)?.as_number().round();
            let len = if args.len() == 3 { evaluate(&args[2], ctx)?.as_number().round() } else { f64::INFINITY };
            Ok(Value::String(xpath_substring(&chars, start, len)))
        }
        "string-length" => {
            check_arity(name, args, if args.is_empty() { 0 } else { 1 })?;
            let s = if args.is_empty() { ctx.node.string_value() } else { evaluate(&args[0], ctx)?.as_string() };
            Ok(Value::Number(s.chars().count() as f64))
        }
        "normalize-space" => {
            check_arity(name, args, if args.is_empty() { 0 } else { 1 })?;
            let s = if args.is_empty() { ctx.node.string_value() } else { evaluate(&args[0], ctx)?.as_string() };
            Ok(Value::String(s.split_whitespace().collect::<Vec<_>>().join(" ")))
        }
        "translate" => {
            check_arity(name, args, 3)?;
            let s = evaluate(&args[0], ctx)?.as_string();
            let from: Vec<char> = evaluate(&args[1], ctx)?.as_string().chars().collect();
            let to: Vec<char> = evaluate(&args[2], ctx)?.as_string().chars().collect();
            let out: String = s
                .chars()
                .filter_map(|c| match from.iter().position(|&f| f == c) {
                    Some(i) => to.get(i).copied(),
                    None => Some(c),
                })
                .collect();
            Ok(Value::String(out))
        }
        "boolean" => {
            check_arity(name, args, 1)?;
            Ok(Value::Boolean(evaluate(&args[0], ctx)?.as_boolean()))
        }
        "not" => {
            check_arity(name, args, 1)?;
            Ok(Value::Boolean(!evaluate(&args[0], ctx)?.as_boolean()))
        }
        "true" => {
            check_arity(name, args, 0)?;
            Ok(Value::Boolean(true))
        }
        "false" => {
            check_arity(name, args, 0)?;
            Ok(Value::Boolean(false))
        }
        "lang" => {
            check_arity(name, args, 1)?;
            let wanted = evaluate(&args[0], ctx)?.as_string().to_ascii_lowercase();
            let mut cur = Some(ctx.node);
            while let Some(n) = cur {
                if let Some(attr) = n.attribute("lang") {
                    let actual = attr.value().unwrap_or("").to_ascii_lowercase();
                    return Ok(Value::Boolean(actual == wanted || actual.starts_with(&format!("{}-", wanted))));
                }
                cur = n.parent_element();
            }
            Ok(Value::Boolean(false))
        }
        "number" => {
            check_arity(name, args, if args.is_empty() { 0 } else { 1 })?;
            if args.is_empty() {
                Ok(Value::Number(Value::String(ctx.node.string_value()).as_number()))
            } else {
                Ok(Value::Number(evaluate(&args[0], ctx)?.as_number()))
            }
        }
        "sum" => {
            check_arity(name, args, 1)?;
            let ns = evaluate(&args[0], ctx)?.into_nodeset()?;
            Ok(Value::Number(ns.iter().map(|n| Value::String(n.string_value()).as_number()).sum()))
        }
        "floor" => {
            check_arity(name, args, 1)?;
            Ok(Value::Number(evaluate(&args[0], ctx)?.as_number().floor()))
        }
        "ceiling" => {
            check_arity(name, args, 1)?;
            Ok(Value::Number(evaluate(&args[0], ctx)?.as_number().ceil()))
        }
        "round" => {
            check_arity(name, args, 1)?;
            Ok(Value::Number(evaluate(&args[0], ctx)?.as_number().round()))
        }
        _ => Err(Error::XPathEval(format!("unknown function '{}()'", name))),
    }
}

fn check_arity(name: &str, args: &[Expr], expected: usize) -> Result<()> {
    if args.len() != expected {
        return Err(Error::XPathEval(format!("{}() expects {} argument(s), got {}", name, expected, args.len())));
    }
    Ok(())
}

fn arg0_node<'a, 'c>(name: &str, args: &[Expr], ctx: &EvaluationContext<'a, 'c>) -> Result<Option<crate::node::Node<'a>>> {
    if args.is_empty() {
        return Ok(Some(ctx.node));
    }
    check_arity(name, args, 1)?;
    let ns = evaluate(&args[0], ctx)?.into_nodeset()?;
    Ok(ns.into_iter().next())
}

fn lookup_ids<'a, 'c>(ctx: &EvaluationContext<'a, 'c>, ids: &str) -> Vec<crate::node::Node<'a>> {
    let wanted: Vec<&str> = ids.split_whitespace().collect();
    let doc = ctx.node.document();
    doc.root()
        .descendants()
        .filter(|n| n.is_element())
        .filter(|n| n.attribute("id").and_then(|a| a.value()).map_or(false, |v| wanted.contains(&v)))
        .collect()
}

fn xpath_substring(chars: &[char], start: f64, len: f64) -> String {
    if start.is_nan() || len.is_nan() {
        return String::new();
    }
    let first = start.round();
    let last = if len.is_infinite() { f64::INFINITY } else { first + len.round() };
    let lo = first.max(1.0) as usize;
    if last <= 1.0 {
        return String::new();
    }
    let hi = if last.is_infinite() { chars.len() + 1 } else { (last as usize).min(chars.len() + 1) };
    if lo >= hi || lo > chars.len() {
        return String::new();
    }
    chars[lo - 1..hi - 1].iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse as parse_xml;
    use crate::xpath::cache::PathCache;
    use crate::xpath::parser::parse as parse_xpath;
    use std::cell::RefCell;

    fn eval_str<'a>(doc: &'a crate::node::Document, expr: &str) -> Value<'a> {
        let ast = parse_xpath(expr).unwrap();
        let cache = RefCell::new(PathCache::new(64));
        let ctx = EvaluationContext::new(doc.root_element().unwrap(), &cache);
        evaluate(&ast, &ctx).unwrap()
    }

    #[test]
    fn concat_joins_its_arguments() {
        let doc = parse_xml("<root/>").unwrap();
        assert_eq!(eval_str(&doc, "concat('a', 'b', 'c')").as_string(), "abc");
    }

    #[test]
    fn substring_follows_one_based_rounding_semantics() {
        let doc = parse_xml("<root/>").unwrap();
        assert_eq!(eval_str(&doc, "substring('12345', 2, 3)").as_string(), "234");
        assert_eq!(eval_str(&doc, "substring('12345', 1.5, 2.6)").as_string(), "234");
        assert_eq!(eval_str(&doc, "substring('12345', 0, 3)").as_string(), "12");
    }

    #[test]
    fn normalize_space_collapses_interior_whitespace() {
        let doc = parse_xml("<root/>").unwrap();
        assert_eq!(eval_str(&doc, "normalize-space('  a   b  ')").as_string(), "a b");
    }

    #[test]
    fn translate_maps_and_strips_characters() {
        let doc = parse_xml("<root/>").unwrap();
        assert_eq!(eval_str(&doc, "translate('bar', 'abc', 'ABC')").as_string(), "BAr");
    }

    #[test]
    fn count_reports_node_set_size() {
        let doc = parse_xml("<root><a/><a/><a/></root>").unwrap();
        assert_eq!(eval_str(&doc, "count(/root/a)").as_number(), 3.0);
    }

    #[test]
    fn local_name_strips_the_prefix() {
        let doc = parse_xml("<root xmlns:p='urn:p'><p:item/></root>").unwrap();
        assert_eq!(eval_str(&doc, "local-name(/root/*)").as_string(), "item");
    }

    #[test]
    fn unknown_function_is_rejected() {
        let doc = parse_xml("<root/>").unwrap();
        let ast = parse_xpath("bogus-function()").unwrap();
        let cache = RefCell::new(PathCache::new(64));
        let ctx = EvaluationContext::new(doc.root_element().unwrap(), &cache);
        assert!(evaluate(&ast, &ctx).is_err());
    }
}
