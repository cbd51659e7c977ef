//! The pull-mode, SAX-style event reader (spec §4.3).
//!
//! Shares its lexical grammar with the tree parser (`parser.rs`): both scan
//! the same token shapes (`<?xml`, `<!DOCTYPE`, `<!--`, `<?`, start/end
//! tags, character data) off a [`Stream`], resolve namespaces the same way,
//! and expand entities through the same [`crate::entities`] helper. They
//! diverge only in what happens once a token is recognized: the tree
//! parser attaches a new arena node to its parent, the event reader instead
//! queues an [`Event`] for the caller to pull. Because every `Event` owns
//! its payload outright there is no lazy "consumed" flag to track (unlike
//! a borrowing reader): skipping an event costs nothing and reading it
//! twice is always safe.

use crate::config::Config;
use crate::entities::expand_entities;
use crate::error::{Error, IssueKind, ParseIssue, Result, TextPos};
use crate::qname::QName;
use crate::stream::Stream;
use std::collections::VecDeque;

const XML_NS_URI: &str = "http://www.w3.org/XML/1998/namespace";
const XMLNS_NS_URI: &str = "http://www.w3.org/2000/xmlns/";

/// One unit of streamed document structure.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    BeginDocument,
    XmlDeclaration { version: Option<String>, encoding: Option<String>, standalone: Option<String> },
    Dtd(String),
    BeginElement { name: QName, namespace_uri: Option<String> },
    /// A namespace declaration seen on the element currently being opened.
    Namespace { prefix: Option<String>, uri: String },
    /// An ordinary (non-`xmlns`) attribute on the element currently being opened.
    Attribute { name: QName, namespace_uri: Option<String>, value: String },
    Text { value: String, has_entity: bool },
    Cdata(String),
    Comment(String),
    ProcessingInstruction { target: String, value: Option<String> },
    EndElement { name: QName },
    EndDocument,
}

struct NsScope {
    prefix: String,
    uri: String,
}

/// A forward-only, pull-style reader over an XML document.
///
/// Call [`EventReader::next`] in a loop (or use its `Iterator` impl) until
/// it returns `None`. Recoverable well-formedness issues are reported the
/// same way as in [`crate::Document`]: accumulated in [`EventReader::errors`]
/// rather than aborting the stream, mirroring spec §4.2's recoverable/fatal
/// split.
pub struct EventReader<'a> {
    stream: Stream<'a>,
    config: Config,
    open: Vec<QName>,
    ns_stack: Vec<NsScope>,
    ns_scope_marks: Vec<usize>,
    pending: VecDeque<Event>,
    started: bool,
    finished: bool,
    seen_prolog_content: bool,
    errors: Vec<ParseIssue>,
}

impl<'a> EventReader<'a> {
    pub fn new(text: &'a str) -> Self {
        Self::with_config(text, Config::default())
    }

    pub fn with_config(text: &'a str, config: Config) -> Self {
        EventReader {
            stream: Stream::new(text),
            config,
            open: Vec::new(),
            ns_stack: Vec::new(),
            ns_scope_marks: Vec::new(),
            pending: VecDeque::new(),
            started: false,
            finished: false,
            seen_prolog_content: false,
            errors: Vec::new(),
        }
    }

    /// The current nesting depth (number of open elements).
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Recoverable issues accumulated so far.
    pub fn errors(&self) -> &[ParseIssue] {
        &self.errors
    }

    /// Skips forward past the end of the element most recently opened,
    /// discarding every event in between. A no-op if not positioned just
    /// after a `BeginElement`.
    pub fn skip_element(&mut self) -> Result<()> {
        if self.open.is_empty() {
            return Ok(());
        }
        let target_depth = self.open.len() - 1;
        loop {
            match self.next() {
                Some(Ok(Event::EndElement { .. })) if self.open.len() == target_depth => {
                    return Ok(())
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e),
                None => return Ok(()),
            }
        }
    }

    fn issue(&mut self, kind: IssueKind, error: Error) {
        let pos = self.stream.text_pos();
        if self.config.show_warnings {
            log::warn!("{:?} at {}: {}", kind, pos, error);
        }
        self.errors.push(ParseIssue { kind, error, pos });
    }

    /// Advances and returns the next event, or `None` at end of document.
    pub fn next(&mut self) -> Option<Result<Event>> {
        if let Some(ev) = self.pending.pop_front() {
            return Some(Ok(ev));
        }
        if self.finished {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(Ok(Event::BeginDocument));
        }
        match self.advance() {
            Ok(()) => self.pending.pop_front().map(Ok).or_else(|| {
                if self.finished {
                    None
                } else {
                    self.next()
                }
            }),
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }

    /// Scans forward until at least one event is queued (or EOF).
    fn advance(&mut self) -> Result<()> {
        loop {
            self.stream.skip_spaces();
            if self.stream.at_end() {
                if !self.open.is_empty() {
                    self.issue(
                        IssueKind::Syntactic,
                        Error::UnterminatedConstruct(self.stream.text_pos()),
                    );
                }
                self.finished = true;
                self.pending.push_back(Event::EndDocument);
                return Ok(());
            }
            if self.stream.starts_with("<?xml ")
                || self.stream.starts_with("<?xml\t")
                || self.stream.starts_with("<?xml\n")
            {
                self.scan_xml_declaration()?;
                return Ok(());
            }
            if self.stream.starts_with("<!DOCTYPE") {
                self.scan_doctype()?;
                return Ok(());
            }
            if self.stream.starts_with("<!--") {
                self.scan_comment()?;
                if self.pending.is_empty() {
                    continue;
                }
                return Ok(());
            }
            if self.stream.starts_with("<![CDATA[") {
                self.scan_cdata()?;
                return Ok(());
            }
            if self.stream.starts_with("<?") {
                self.scan_pi()?;
                return Ok(());
            }
            if self.stream.starts_with("</") {
                self.scan_end_tag()?;
                return Ok(());
            }
            if self.stream.curr_byte() == Some(b'<') {
                self.scan_start_tag()?;
                return Ok(());
            }
            if self.scan_text()? {
                return Ok(());
            }
            // Pure whitespace outside the root with `preserve_space == false`:
            // keep scanning instead of returning an empty batch.
        }
    }

    fn scan_xml_declaration(&mut self) -> Result<()> {
        if self.seen_prolog_content {
            self.issue(
                IssueKind::Syntactic,
                Error::MisplacedXmlDeclaration(self.stream.text_pos()),
            );
        }
        self.stream.consume_str("<?xml")?;
        let (mut version, mut encoding, mut standalone) = (None, None, None);
        loop {
            self.stream.skip_spaces();
            if self.stream.try_consume_str("?>") {
                break;
            }
            let (_, name) = self.stream.consume_qname()?;
            self.stream.skip_spaces();
            self.stream.consume_byte(b'=')?;
            self.stream.skip_spaces();
            let value = self.consume_quoted_string()?;
            match name {
                "version" => version = Some(value),
                "encoding" => encoding = Some(value),
                "standalone" => standalone = Some(value),
                _ => {}
            }
        }
        self.seen_prolog_content = true;
        self.pending.push_back(Event::XmlDeclaration { version, encoding, standalone });
        Ok(())
    }

    fn scan_doctype(&mut self) -> Result<()> {
        let start = self.stream.pos();
        self.stream.consume_str("<!DOCTYPE")?;
        let mut depth = 1usize;
        while depth > 0 {
            match self.stream.curr_byte() {
                None => {
                    self.issue(
                        IssueKind::Syntactic,
                        Error::UnterminatedConstruct(self.stream.text_pos()),
                    );
                    break;
                }
                Some(b'<') => {
                    depth += 1;
                    self.stream.advance(1);
                }
                Some(b'>') => {
                    depth -= 1;
                    self.stream.advance(1);
                }
                Some(_) => self.stream.advance(1),
            }
        }
        let end = self.stream.pos().saturating_sub(1).max(start);
        let raw = &self.stream.text()[start..end];
        let value = if self.config.trim_dtd {
            raw.split_whitespace().collect::<Vec<_>>().join(" ")
        } else {
            raw.to_string()
        };
        self.seen_prolog_content = true;
        self.pending.push_back(Event::Dtd(value));
        Ok(())
    }

    fn scan_comment(&mut self) -> Result<()> {
        let pos = self.stream.text_pos();
        self.stream.consume_str("<!--")?;
        let start = self.stream.pos();
        let end = match self.stream.rest().find("-->") {
            Some(i) => i,
            None => {
                self.issue(IssueKind::Lexical, Error::UnterminatedConstruct(pos));
                self.stream.advance(self.stream.rest().len());
                return Ok(());
            }
        };
        let content = self.stream.text()[start..start + end].to_string();
        if content.contains("--") {
            self.issue(IssueKind::Lexical, Error::InvalidComment(pos));
        }
        self.stream.advance(end + 3);
        self.seen_prolog_content = true;
        if self.config.preserve_comment {
            self.pending.push_back(Event::Comment(content));
        }
        Ok(())
    }

    fn scan_pi(&mut self) -> Result<()> {
        self.stream.consume_str("<?")?;
        let target = self.stream.consume_name()?.to_string();
        self.stream.skip_spaces();
        let start = self.stream.pos();
        let end = match self.stream.rest().find("?>") {
            Some(i) => i,
            None => {
                self.issue(
                    IssueKind::Lexical,
                    Error::UnterminatedConstruct(self.stream.text_pos()),
                );
                self.stream.advance(self.stream.rest().len());
                return Ok(());
            }
        };
        let value = self.stream.text()[start..start + end].to_string();
        self.stream.advance(end + 2);
        self.seen_prolog_content = true;
        let value = if value.is_empty() { None } else { Some(value) };
        self.pending.push_back(Event::ProcessingInstruction { target, value });
        Ok(())
    }

    fn scan_cdata(&mut self) -> Result<()> {
        let pos = self.stream.text_pos();
        self.stream.advance(9);
        let start = self.stream.pos();
        let end = match self.stream.rest().find("]]>") {
            Some(i) => i,
            None => {
                self.issue(IssueKind::Lexical, Error::UnterminatedConstruct(pos));
                self.stream.advance(self.stream.rest().len());
                return Ok(());
            }
        };
        let content = self.stream.text()[start..start + end].to_string();
        self.stream.advance(end + 3);
        self.seen_prolog_content = true;
        if self.config.preserve_cdata {
            self.pending.push_back(Event::Cdata(content));
        }
        Ok(())
    }

    /// Returns `true` if a `Text` event was queued.
    fn scan_text(&mut self) -> Result<bool> {
        let start = self.stream.pos();
        self.stream.consume_while(|c| c != '<');
        let raw = &self.stream.text()[start..self.stream.pos()];
        if self.open.is_empty() {
            if !raw.trim().is_empty() {
                self.issue(
                    IssueKind::Syntactic,
                    Error::ContentOutsideRoot(self.stream.text_pos()),
                );
            }
            return Ok(false);
        }
        if raw.is_empty() {
            return Ok(false);
        }
        if raw.trim().is_empty() && !self.config.preserve_space {
            return Ok(false);
        }
        let (value, has_entity) = expand_entities(raw, self.stream.text_pos())?;
        self.pending.push_back(Event::Text { value, has_entity });
        Ok(true)
    }

    fn consume_quoted_string(&mut self) -> Result<String> {
        let quote = self.stream.consume_quote()?;
        let start = self.stream.pos();
        let end = self
            .stream
            .rest()
            .as_bytes()
            .iter()
            .position(|&b| b == quote)
            .ok_or_else(|| Error::UnterminatedConstruct(self.stream.text_pos()))?;
        let raw = &self.stream.text()[start..start + end];
        self.stream.advance(end + 1);
        let (expanded, _) = expand_entities(raw, self.stream.text_pos())?;
        Ok(expanded)
    }

    fn scan_start_tag(&mut self) -> Result<()> {
        self.seen_prolog_content = true;
        self.stream.advance(1);
        let (prefix, local) = self.stream.consume_qname()?;
        if self.config.enable_debugging {
            log::trace!("scan_start_tag prefix={:?} local={:?} at {}", prefix, local, self.stream.text_pos());
        }
        let mut raw_attrs: Vec<(String, String, String, TextPos)> = Vec::new();
        let self_enclosing = loop {
            let before = self.stream.pos();
            self.stream.skip_spaces();
            let had_space = self.stream.pos() != before;
            if self.stream.try_consume_str("/>") {
                break true;
            }
            if self.stream.try_consume_byte(b'>') {
                break false;
            }
            if !had_space {
                self.issue(
                    IssueKind::Syntactic,
                    Error::UnexpectedToken {
                        expected: "whitespace, '/>' or '>'",
                        found: self.stream.rest().chars().take(1).collect(),
                        pos: self.stream.text_pos(),
                    },
                );
            }
            let attr_pos = self.stream.text_pos();
            let (ap, al) = self.stream.consume_qname()?;
            self.stream.skip_spaces();
            self.stream.consume_byte(b'=')?;
            self.stream.skip_spaces();
            let value = self.consume_quoted_string()?;
            raw_attrs.push((ap.to_string(), al.to_string(), value, attr_pos));
        };

        let scope_mark = self.ns_stack.len();
        let mut plain_attrs: Vec<(String, String, String, TextPos)> = Vec::new();
        for (ap, al, value, apos) in raw_attrs {
            if ap.is_empty() && al == "xmlns" {
                self.declare_namespace("", &value, apos, scope_mark);
                self.pending.push_back(Event::Namespace { prefix: None, uri: value });
            } else if ap == "xmlns" {
                self.declare_namespace(&al, &value, apos, scope_mark);
                self.pending.push_back(Event::Namespace { prefix: Some(al), uri: value });
            } else {
                plain_attrs.push((ap, al, value, apos));
            }
        }

        let namespace_uri = if prefix.is_empty() {
            self.lookup_default_ns()
        } else if prefix == "xml" {
            Some(XML_NS_URI.to_string())
        } else {
            match self.lookup_prefix(prefix) {
                Some(u) => Some(u),
                None => {
                    self.issue(
                        IssueKind::Namespace,
                        Error::UnknownNamespacePrefix(prefix.to_string(), self.stream.text_pos()),
                    );
                    None
                }
            }
        };
        let name = QName::new(prefix, local);
        self.pending.push_back(Event::BeginElement { name: name.clone(), namespace_uri });

        let mut seen: Vec<(Option<String>, String)> = Vec::new();
        for (ap, al, value, apos) in plain_attrs {
            let uri = if ap.is_empty() {
                None
            } else if ap == "xml" {
                Some(XML_NS_URI.to_string())
            } else {
                match self.lookup_prefix(&ap) {
                    Some(u) => Some(u),
                    None => {
                        self.issue(
                            IssueKind::Namespace,
                            Error::UnknownNamespacePrefix(ap.clone(), apos),
                        );
                        None
                    }
                }
            };
            let key = (uri.clone(), al.clone());
            if seen.contains(&key) {
                self.issue(
                    IssueKind::Syntactic,
                    Error::DuplicatedAttribute(format!("{}:{}", ap, al), apos),
                );
                continue;
            }
            seen.push(key);
            self.pending.push_back(Event::Attribute {
                name: QName::new(&ap, &al),
                namespace_uri: uri,
                value,
            });
        }

        if self_enclosing {
            self.ns_stack.truncate(scope_mark);
            self.pending.push_back(Event::EndElement { name });
        } else {
            self.open.push(name);
            self.ns_scope_marks.push(scope_mark);
        }
        Ok(())
    }

    fn declare_namespace(&mut self, prefix: &str, uri: &str, pos: TextPos, scope_mark: usize) {
        if prefix == "xml" {
            self.issue(IssueKind::Namespace, Error::InvalidXmlPrefixUri(pos));
            return;
        }
        if prefix == "xmlns" {
            self.issue(IssueKind::Namespace, Error::ReservedXmlnsPrefix(pos));
            return;
        }
        if uri == XML_NS_URI {
            self.issue(IssueKind::Namespace, Error::UnexpectedXmlUri(pos));
            return;
        }
        if uri == XMLNS_NS_URI {
            self.issue(IssueKind::Namespace, Error::UnexpectedXmlnsUri(pos));
            return;
        }
        let duplicate = self.ns_stack[scope_mark..].iter().any(|s| s.prefix == prefix);
        if duplicate && !self.config.allow_duplicate_namespaces {
            self.issue(IssueKind::Namespace, Error::DuplicatedNamespace(prefix.to_string(), pos));
        }
        self.ns_stack.push(NsScope { prefix: prefix.to_string(), uri: uri.to_string() });
    }

    fn lookup_prefix(&self, prefix: &str) -> Option<String> {
        self.ns_stack.iter().rev().find(|s| s.prefix == prefix).map(|s| s.uri.clone())
    }

    fn lookup_default_ns(&self) -> Option<String> {
        self.ns_stack.iter().rev().find(|s| s.prefix.is_empty()).map(|s| s.uri.clone())
    }

    fn scan_end_tag(&mut self) -> Result<()> {
        let pos = self.stream.text_pos();
        self.stream.consume_str("</")?;
        let (prefix, local) = self.stream.consume_qname()?;
        self.stream.skip_spaces();
        self.stream.consume_byte(b'>')?;
        let actual = QName::new(prefix, local);
        if self.config.enable_debugging {
            log::trace!("scan_end_tag {} at {}", actual.combined(), pos);
        }
        match self.open.pop() {
            Some(expected) if expected.combined() == actual.combined() => {
                self.pending.push_back(Event::EndElement { name: expected });
            }
            Some(expected) => {
                self.issue(
                    IssueKind::Syntactic,
                    Error::UnexpectedCloseTag {
                        expected: expected.combined().to_string(),
                        actual: actual.combined().to_string(),
                        pos,
                    },
                );
                self.pending.push_back(Event::EndElement { name: expected });
            }
            None => {
                self.issue(
                    IssueKind::Syntactic,
                    Error::UnexpectedCloseTag {
                        expected: String::new(),
                        actual: actual.combined().to_string(),
                        pos,
                    },
                );
            }
        }
        if let Some(mark) = self.ns_scope_marks.pop() {
            self.ns_stack.truncate(mark);
        }
        Ok(())
    }
}

impl<'a> Iterator for EventReader<'a> {
    type Item = Result<Event>;
    fn next(&mut self) -> Option<Self::Item> {
        EventReader::next(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(text: &str) -> Vec<Event> {
        EventReader::new(text).filter_map(|e| e.ok()).collect()
    }

    #[test]
    fn emits_begin_and_end_document() {
        let events = collect("<root/>");
        assert_eq!(events.first(), Some(&Event::BeginDocument));
        assert_eq!(events.last(), Some(&Event::EndDocument));
    }

    #[test]
    fn self_closing_element_emits_matching_begin_and_end() {
        let events = collect("<a/>");
        assert!(matches!(events[1], Event::BeginElement { .. }));
        assert!(matches!(events[2], Event::EndElement { .. }));
    }

    #[test]
    fn attribute_and_namespace_events_follow_begin_element() {
        let events = collect(r#"<a xmlns:p="urn:x" p:id="7"/>"#);
        assert!(matches!(events[1], Event::BeginElement { .. }));
        assert!(matches!(events[2], Event::Namespace { .. }));
        assert!(matches!(events[3], Event::Attribute { .. }));
    }

    #[test]
    fn text_between_elements_is_surfaced() {
        let events = collect("<a>hi</a>");
        assert!(events.iter().any(|e| matches!(e, Event::Text { value, .. } if value == "hi")));
    }

    #[test]
    fn skip_element_discards_its_subtree() {
        let mut r = EventReader::new("<a><b><c/></b><d/></a>");
        assert_eq!(r.next().unwrap().unwrap(), Event::BeginDocument);
        r.next(); // <a>
        r.next(); // <b>
        r.skip_element().unwrap();
        let next = r.next().unwrap().unwrap();
        assert!(matches!(next, Event::BeginElement { name, .. } if name.local() == "d"));
    }

    #[test]
    fn mismatched_close_tag_is_recoverable() {
        let mut r = EventReader::new("<a></b>");
        let events: Vec<_> = (&mut r).filter_map(|e| e.ok()).collect();
        assert!(!r.errors().is_empty());
        assert!(events.iter().any(|e| matches!(e, Event::EndElement { .. })));
    }
}
