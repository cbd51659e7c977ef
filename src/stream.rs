//! Byte-cursor scanning primitives shared by the XML tokenizer and the
//! XPath lexer.
//!
//! Grounded on `roxmltree::tokenizer::{Stream, StrSpan, XmlCharExt}`: a
//! byte-position cursor over a `&str`, with `char`-aware consumption
//! helpers layered on top of byte-level ones for speed on the common ASCII
//! path.

use crate::error::{Error, TextPos};

pub(crate) trait XmlCharExt {
    fn is_xml_name_start(&self) -> bool;
    fn is_xml_name_char(&self) -> bool;
}

impl XmlCharExt for char {
    #[inline]
    fn is_xml_name_start(&self) -> bool {
        if (*self as u32) <= 128 {
            return matches!(*self as u8, b'A'..=b'Z' | b'a'..=b'z' | b':' | b'_');
        }
        matches!(*self as u32,
            0x00C0..=0x00D6 | 0x00D8..=0x00F6 | 0x00F8..=0x02FF
            | 0x0370..=0x037D | 0x037F..=0x1FFF | 0x200C..=0x200D
            | 0x2070..=0x218F | 0x2C00..=0x2FEF | 0x3001..=0xD7FF
            | 0xF900..=0xFDCF | 0xFDF0..=0xFFFD | 0x10000..=0xEFFFF)
    }

    #[inline]
    fn is_xml_name_char(&self) -> bool {
        if self.is_xml_name_start() {
            return true;
        }
        matches!(*self, '-' | '.' | '0'..='9' | '\u{B7}')
            || matches!(*self as u32, 0x0300..=0x036F | 0x203F..=0x2040)
    }
}

#[inline]
pub(crate) fn is_xml_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

/// A byte-position cursor over a source string.
#[derive(Clone)]
pub(crate) struct Stream<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Stream<'a> {
    pub fn new(text: &'a str) -> Self {
        Stream { text, pos: 0 }
    }

    pub fn from_pos(text: &'a str, pos: usize) -> Self {
        Stream { text, pos }
    }

    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn text(&self) -> &'a str {
        self.text
    }

    #[inline]
    pub fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    #[inline]
    pub fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    #[inline]
    pub fn curr_byte(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    #[inline]
    pub fn advance(&mut self, n: usize) {
        self.pos += n;
    }

    pub fn starts_with(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    pub fn skip_spaces(&mut self) {
        while let Some(b) = self.curr_byte() {
            if is_xml_space(b) {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    pub fn skip_ws_any(&mut self) {
        while let Some(c) = self.rest().chars().next() {
            if c.is_whitespace() {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
    }

    pub fn consume_byte(&mut self, b: u8) -> Result<(), Error> {
        match self.curr_byte() {
            Some(c) if c == b => {
                self.pos += 1;
                Ok(())
            }
            _ => Err(Error::UnexpectedToken {
                expected: "a specific character",
                found: self.curr_byte().map(|b| (b as char).to_string()).unwrap_or_default(),
                pos: self.text_pos(),
            }),
        }
    }

    pub fn try_consume_byte(&mut self, b: u8) -> bool {
        if self.curr_byte() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub fn try_consume_str(&mut self, s: &str) -> bool {
        if self.starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    pub fn consume_str(&mut self, s: &'static str) -> Result<(), Error> {
        if self.try_consume_str(s) {
            Ok(())
        } else {
            Err(Error::UnexpectedToken {
                expected: s,
                found: self.rest().chars().take(8).collect(),
                pos: self.text_pos(),
            })
        }
    }

    /// Consume an XML `Name`, returning its text.
    pub fn consume_name(&mut self) -> Result<&'a str, Error> {
        let start = self.pos;
        let mut chars = self.rest().char_indices();
        match chars.next() {
            Some((_, c)) if c.is_xml_name_start() => {}
            _ => {
                return Err(Error::UnexpectedToken {
                    expected: "a name",
                    found: String::new(),
                    pos: self.text_pos(),
                })
            }
        }
        let mut end = self.text.len();
        for (i, c) in chars {
            if !c.is_xml_name_char() {
                end = start + i;
                break;
            }
        }
        self.pos = end;
        Ok(&self.text[start..end])
    }

    /// Consume a (possibly prefixed) qualified name as `(prefix, local)`.
    /// `prefix` is `""` when there is no colon.
    pub fn consume_qname(&mut self) -> Result<(&'a str, &'a str), Error> {
        let start = self.pos;
        let name = self.consume_name()?;
        match name.find(':') {
            Some(i) => Ok((&self.text[start..start + i], &self.text[start + i + 1..self.pos])),
            None => Ok(("", name)),
        }
    }

    /// Consume bytes while `f` holds for the current char, char-by-char.
    pub fn consume_while<F: Fn(char) -> bool>(&mut self, f: F) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.rest().chars().next() {
            if f(c) {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        &self.text[start..self.pos]
    }

    /// Consume a single or double quote character, returning which one.
    pub fn consume_quote(&mut self) -> Result<u8, Error> {
        match self.curr_byte() {
            Some(b @ b'\'') | Some(b @ b'"') => {
                self.pos += 1;
                Ok(b)
            }
            _ => Err(Error::UnexpectedToken {
                expected: "a quote",
                found: String::new(),
                pos: self.text_pos(),
            }),
        }
    }

    /// Compute the 1-based line/column of the current position.
    pub fn text_pos(&self) -> TextPos {
        text_pos_at(self.text, self.pos)
    }
}

/// Compute a 1-based line/column for a byte offset into `text`.
///
/// **Note**: linear in `pos`, matching `roxmltree::Document::text_pos_from`'s
/// documented "this operation is expensive" contract — only called on the
/// (rare) error/debug path.
pub fn text_pos_at(text: &str, pos: usize) -> TextPos {
    let pos = pos.min(text.len());
    let mut line: u32 = 1;
    let mut col: u32 = 1;
    for c in text[..pos].chars() {
        if c == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    TextPos::new(line, col)
}
