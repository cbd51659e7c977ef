//! Compact query sublanguage: `'<' name '>' ('/' sub)* '/'`.
//!
//! Grounded on `include/query/cxql.h`/`cxql.c` in the reference C sources:
//! the lexer there walks a query string column by column collecting rigid
//! (`q_r_list`) and optional (`q_o_list`) condition lists keyed on a tag
//! name. This module keeps that two-list shape but, rather than walking the
//! tree itself the way `cxqapi.c` does, compiles the parsed conditions into
//! an XPath 1.0 location path string and hands evaluation to
//! [`crate::xpath`] — a thin reduction over the evaluator rather than a
//! second tree walker.
//!
//! Grammar (spec.md §6 "Compact query surface"):
//! `sub := attr '=' value | attr '|=' value | '@' attr
//!       | '$text' ('=' value | '|=' value)?
//!       | '#comment' ('=' value | '|=' value)?
//!       | '[' sub ('/' sub)* ']'`
//! A bracketed group is optional: the query still matches a node lacking
//! every condition in the group, as long as at least one condition in the
//! group holds when any of them are checked against that node.

use crate::error::{Error, Result};
use crate::node::Node;
use crate::stream::Stream;
use crate::xpath;

/// A compiled compact-query expression, reusable across many roots.
pub struct Query {
    xpath_expr: String,
}

impl Query {
    /// Parses `text` and compiles it to an equivalent XPath location path.
    pub fn compile(text: &str) -> Result<Query> {
        let xpath_expr = compile_to_xpath(text)?;
        Ok(Query { xpath_expr })
    }

    /// Returns every matching node, in document order.
    pub fn all_matches<'a>(&self, root: Node<'a>) -> Result<Vec<Node<'a>>> {
        xpath::evaluate(&self.xpath_expr, root)?.into_nodeset()
    }

    /// Returns the first matching node, if any.
    pub fn first_match<'a>(&self, root: Node<'a>) -> Result<Option<Node<'a>>> {
        Ok(self.all_matches(root)?.into_iter().next())
    }
}

/// Parses and evaluates `text` against `root` in one call, returning every
/// match in document order.
pub fn query<'a>(root: Node<'a>, text: &str) -> Result<Vec<Node<'a>>> {
    Query::compile(text)?.all_matches(root)
}

fn compile_to_xpath(text: &str) -> Result<String> {
    let mut s = Stream::new(text);
    s.skip_ws_any();
    s.consume_byte(b'<').map_err(|_| Error::QueryParse("compact query must start with '<name>'".to_string()))?;
    let start = s.pos();
    s.consume_while(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == ':' || c == '.');
    let name = &s.text()[start..s.pos()];
    if name.is_empty() {
        return Err(Error::QueryParse("compact query is missing a tag name".to_string()));
    }
    s.consume_byte(b'>').map_err(|_| Error::QueryParse("compact query tag name must be closed with '>'".to_string()))?;

    let mut rigid: Vec<String> = Vec::new();
    loop {
        s.skip_ws_any();
        if s.at_end() {
            break;
        }
        if !s.try_consume_byte(b'/') {
            return Err(Error::QueryParse("expected '/' between compact query conditions".to_string()));
        }
        s.skip_ws_any();
        if s.at_end() {
            break;
        }
        if s.curr_byte() == Some(b'[') {
            s.advance(1);
            let mut group: Vec<String> = Vec::new();
            loop {
                s.skip_ws_any();
                group.push(parse_sub(&mut s)?);
                s.skip_ws_any();
                if s.try_consume_byte(b'/') {
                    continue;
                }
                break;
            }
            s.skip_ws_any();
            s.consume_byte(b']').map_err(|_| Error::QueryParse("unterminated optional group in compact query".to_string()))?;
            rigid.push(format!("({})", group.join(" or ")));
        } else {
            rigid.push(parse_sub(&mut s)?);
        }
    }

    let mut xpath_expr = format!("descendant-or-self::{}", name);
    if !rigid.is_empty() {
        xpath_expr.push('[');
        xpath_expr.push_str(&rigid.join(" and "));
        xpath_expr.push(']');
    }
    Ok(xpath_expr)
}

fn parse_sub(s: &mut Stream) -> Result<String> {
    if s.try_consume_byte(b'@') {
        let key = consume_name(s)?;
        return Ok(format!("@{}", key));
    }
    if s.starts_with("$text") {
        s.advance(5);
        return parse_valued("text()", s);
    }
    if s.starts_with("#comment") {
        s.advance(8);
        return parse_valued("comment()", s);
    }
    let key = consume_name(s)?;
    if key.is_empty() {
        return Err(Error::QueryParse("expected an attribute name, '@attr', '$text' or '#comment'".to_string()));
    }
    parse_valued(&format!("@{}", key), s)
}

/// `target` is already an XPath sub-expression (`@attr`, `text()`,
/// `comment()`); consumes an optional `='v'` or `|='v'` suffix.
fn parse_valued(target: &str, s: &mut Stream) -> Result<String> {
    if s.try_consume_byte(b'=') {
        let value = consume_value(s)?;
        Ok(format!("{}={}", target, xpath_literal(&value)))
    } else if s.starts_with("|=") {
        s.advance(2);
        let value = consume_value(s)?;
        Ok(format!("contains({},{})", target, xpath_literal(&value)))
    } else {
        Ok(target.to_string())
    }
}

fn consume_name(s: &mut Stream) -> Result<String> {
    let start = s.pos();
    s.consume_while(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == ':' || c == '.');
    Ok(s.text()[start..s.pos()].to_string())
}

fn consume_value(s: &mut Stream) -> Result<String> {
    let quote = s.curr_byte();
    if quote == Some(b'\'') || quote == Some(b'"') {
        let q = quote.unwrap();
        s.advance(1);
        let start = s.pos();
        let end = s.rest().as_bytes().iter().position(|&b| b == q).ok_or_else(|| Error::QueryParse("unterminated value in compact query".to_string()))?;
        let value = s.text()[start..start + end].to_string();
        s.advance(end + 1);
        Ok(value)
    } else {
        let start = s.pos();
        s.consume_while(|c| c != '/' && c != ']');
        Ok(s.text()[start..s.pos()].trim_end().to_string())
    }
}

/// Quotes `s` as an XPath string literal, switching quote characters if `s`
/// itself contains one (XPath 1.0 has no in-literal escape).
fn xpath_literal(s: &str) -> String {
    if !s.contains('\'') {
        format!("'{}'", s)
    } else if !s.contains('"') {
        format!("\"{}\"", s)
    } else {
        format!("concat('{}')", s.replace('\'', "', \"'\", '"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn matches_by_tag_name_alone() {
        let doc = parse("<root><item/><item/></root>").unwrap();
        let matches = query(doc.root_element().unwrap(), "<item>/").unwrap();
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn filters_by_exact_attribute_value() {
        let doc = parse("<root><item id='a'/><item id='b'/></root>").unwrap();
        let matches = query(doc.root_element().unwrap(), "<item>/id='b'/").unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].attribute("id").and_then(|a| a.value()), Some("b"));
    }

    #[test]
    fn filters_by_substring_attribute_match() {
        let doc = parse("<root><item id='hello-world'/><item id='other'/></root>").unwrap();
        let matches = query(doc.root_element().unwrap(), "<item>/id|='world'/").unwrap();
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn existence_check_requires_the_attribute_present() {
        let doc = parse("<root><item flag='1'/><item/></root>").unwrap();
        let matches = query(doc.root_element().unwrap(), "<item>/@flag/").unwrap();
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn text_condition_matches_element_text_content() {
        let doc = parse("<root><item>hi</item><item>bye</item></root>").unwrap();
        let matches = query(doc.root_element().unwrap(), "<item>/$text='hi'/").unwrap();
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn optional_group_matches_when_any_member_holds() {
        let doc = parse("<root><item a='1'/><item b='2'/><item/></root>").unwrap();
        let matches = query(doc.root_element().unwrap(), "<item>/[@a/@b]/").unwrap();
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn first_match_returns_only_the_first_result() {
        let doc = parse("<root><item id='a'/><item id='b'/></root>").unwrap();
        let q = Query::compile("<item>/").unwrap();
        let first = q.first_match(doc.root_element().unwrap()).unwrap().unwrap();
        assert_eq!(first.attribute("id").and_then(|a| a.value()), Some("a"));
    }
}
