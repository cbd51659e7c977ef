//! Hand-written XPath 1.0 tokenizer.
//!
//! Grounded on `petty-xpath1`'s lexer for token shapes, reimplemented over
//! [`crate::stream::Stream`] instead of `nom` (SPEC_FULL.md §4.4 deviation)
//! so the XPath front end shares its scanning idiom with the rest of the
//! crate. Tokenizes eagerly into a `Vec<Token>`; the recursive-descent
//! parser in `parser.rs` disambiguates context-sensitive tokens (is `*` a
//! multiplication operator or the wildcard name test?) itself, per the
//! XPath 1.0 grammar's own note that this is a parser-level decision.

use crate::error::{Error, Result};
use crate::stream::Stream;

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Slash,
    DoubleSlash,
    Dot,
    DotDot,
    At,
    Comma,
    DoubleColon,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Pipe,
    Plus,
    Minus,
    Star,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Dollar,
    /// Identifier-shaped token: element/function/axis name, or a keyword
    /// operator (`and`, `or`, `div`, `mod`) the parser recognizes by text.
    Name(String),
    Literal(String),
    Number(f64),
    Eof,
}

pub(crate) fn tokenize(expr: &str) -> Result<Vec<Token>> {
    let mut s = Stream::new(expr);
    let mut tokens = Vec::new();
    loop {
        s.skip_ws_any();
        if s.at_end() {
            tokens.push(Token::Eof);
            return Ok(tokens);
        }
        let c = s.rest().chars().next().unwrap();
        let tok = match c {
            '/' => {
                s.advance(1);
                if s.try_consume_byte(b'/') {
                    Token::DoubleSlash
                } else {
                    Token::Slash
                }
            }
            '.' => {
                s.advance(1);
                if s.try_consume_byte(b'.') {
                    Token::DotDot
                } else if s.curr_byte().map(|b| b.is_ascii_digit()).unwrap_or(false) {
                    let rest_start = s.pos() - 1;
                    s.consume_while(|c| c.is_ascii_digit());
                    let n: f64 = s.text()[rest_start..s.pos()].parse().unwrap_or(f64::NAN);
                    Token::Number(n)
                } else {
                    Token::Dot
                }
            }
            '@' => {
                s.advance(1);
                Token::At
            }
            ',' => {
                s.advance(1);
                Token::Comma
            }
            ':' => {
                s.advance(1);
                if s.try_consume_byte(b':') {
                    Token::DoubleColon
                } else {
                    return Err(Error::XPathParse("unexpected ':'".to_string()));
                }
            }
            '(' => {
                s.advance(1);
                Token::LParen
            }
            ')' => {
                s.advance(1);
                Token::RParen
            }
            '[' => {
                s.advance(1);
                Token::LBracket
            }
            ']' => {
                s.advance(1);
                Token::RBracket
            }
            '|' => {
                s.advance(1);
                Token::Pipe
            }
            '+' => {
                s.advance(1);
                Token::Plus
            }
            '-' => {
                s.advance(1);
                Token::Minus
            }
            '*' => {
                s.advance(1);
                Token::Star
            }
            '=' => {
                s.advance(1);
                Token::Eq
            }
            '!' => {
                s.advance(1);
                if s.try_consume_byte(b'=') {
                    Token::Ne
                } else {
                    return Err(Error::XPathParse("unexpected '!'".to_string()));
                }
            }
            '<' => {
                s.advance(1);
                if s.try_consume_byte(b'=') {
                    Token::Le
                } else {
                    Token::Lt
                }
            }
            '>' => {
                s.advance(1);
                if s.try_consume_byte(b'=') {
                    Token::Ge
                } else {
                    Token::Gt
                }
            }
            '$' => {
                s.advance(1);
                Token::Dollar
            }
            '\'' | '"' => {
                let quote = c as u8;
                s.advance(1);
                let start = s.pos();
                let end = s
                    .rest()
                    .as_bytes()
                    .iter()
                    .position(|&b| b == quote)
                    .ok_or_else(|| Error::XPathParse("unterminated string literal".to_string()))?;
                let text = s.text()[start..start + end].to_string();
                s.advance(end + 1);
                Token::Literal(text)
            }
            c if c.is_ascii_digit() => {
                let start = s.pos();
                s.consume_while(|c| c.is_ascii_digit());
                if s.curr_byte() == Some(b'.') {
                    s.advance(1);
                    s.consume_while(|c| c.is_ascii_digit());
                }
                let n: f64 = s.text()[start..s.pos()].parse().unwrap_or(f64::NAN);
                Token::Number(n)
            }
            _ => {
                let name = consume_ncname_or_qname(&mut s)?;
                Token::Name(name)
            }
        };
        tokens.push(tok);
    }
}

/// Consumes an XPath `NCName(':'(NCName|'*'))?`-shaped name, allowing an
/// embedded `-` (e.g. `following-sibling`, `processing-instruction`).
fn consume_ncname_or_qname(s: &mut Stream) -> Result<String> {
    let start = s.pos();
    let first = s.rest().chars().next();
    match first {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return Err(Error::XPathParse(format!("unexpected character near {:?}", s.rest().chars().take(8).collect::<String>()))),
    }
    s.consume_while(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.');
    if s.curr_byte() == Some(b':') && s.text().as_bytes().get(s.pos() + 1) != Some(&b':') {
        s.advance(1);
        if s.curr_byte() == Some(b'*') {
            s.advance(1);
        } else {
            s.consume_while(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.');
        }
    }
    Ok(s.text()[start..s.pos()].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_a_simple_path() {
        let toks = tokenize("/a/b[@id='1']").unwrap();
        assert_eq!(
            toks,
            vec![
                Token::Slash,
                Token::Name("a".to_string()),
                Token::Slash,
                Token::Name("b".to_string()),
                Token::LBracket,
                Token::At,
                Token::Name("id".to_string()),
                Token::Eq,
                Token::Literal("1".to_string()),
                Token::RBracket,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn tokenizes_axis_and_function_call() {
        let toks = tokenize("descendant::node()").unwrap();
        assert_eq!(
            toks,
            vec![
                Token::Name("descendant".to_string()),
                Token::DoubleColon,
                Token::Name("node".to_string()),
                Token::LParen,
                Token::RParen,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn tokenizes_numbers_and_decimals() {
        let toks = tokenize("1 + 2.5").unwrap();
        assert_eq!(toks, vec![Token::Number(1.0), Token::Plus, Token::Number(2.5), Token::Eof]);
    }
}
