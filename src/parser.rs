//! The tree parser: turns source text into a [`Document`] (spec §4.2).
//!
//! Grounded on `roxmltree::parse`'s token-driven builder: a state machine
//! over an open-element stack, with namespace resolution
//! (`resolve_namespaces`/`get_ns_by_prefix`) and attribute table population
//! (`resolve_attributes`) performed as each start tag closes. Diverges from
//! the teacher by accumulating most well-formedness violations as
//! [`ParseIssue`]s on the document rather than aborting, per spec §4.2
//! "recoverable vs. fatal" and §7 "Propagation".

use crate::config::Config;
use crate::containers::OrderedMap;
use crate::entities::expand_entities;
use crate::error::{Error, IssueKind, ParseIssue, Result, TextPos};
use crate::node::{
    AttributeData, Document, ElementData, NamespaceData, NodeId, NodeKind, TextData,
    XmlDeclData, DOCUMENT_ID,
};
use crate::qname::{ExpandedName, NumericValue, QName};
use crate::stream::Stream;

const XML_NS_URI: &str = "http://www.w3.org/XML/1998/namespace";
const XMLNS_NS_URI: &str = "http://www.w3.org/2000/xmlns/";

/// A namespace binding visible at some point in the open-element stack.
struct NsScope {
    prefix: String,
    uri: String,
}

struct Parser<'a> {
    config: Config,
    doc: Document,
    stream: Stream<'a>,
    /// Open elements, innermost last.
    open: Vec<NodeId>,
    /// Namespace bindings visible at the current point, pushed/popped with
    /// each element's scope.
    ns_stack: Vec<NsScope>,
    ns_scope_marks: Vec<usize>,
    seen_prolog_content: bool,
}

/// Parses `text` into a [`Document`] using default [`Config`].
pub fn parse(text: &str) -> Result<Document> {
    parse_with_config(text, Config::default())
}

/// Parses `text` into a [`Document`] using an explicit [`Config`].
pub fn parse_with_config(text: &str, config: Config) -> Result<Document> {
    if text.len() > u32::MAX as usize {
        return Err(Error::SizeLimit);
    }
    let mut p = Parser {
        doc: Document::empty(&config.doc_name),
        config,
        stream: Stream::new(text),
        open: Vec::new(),
        ns_stack: Vec::new(),
        ns_scope_marks: Vec::new(),
        seen_prolog_content: false,
    };
    p.doc.source = text.to_string();
    p.run()?;
    Ok(p.doc)
}

impl<'a> Parser<'a> {
    fn run(&mut self) -> Result<()> {
        loop {
            self.stream.skip_spaces();
            if self.stream.at_end() {
                break;
            }
            if self.stream.starts_with("<?xml ") || self.stream.starts_with("<?xml\t")
                || self.stream.starts_with("<?xml\n") || self.stream.rest() == "<?xml"
            {
                self.parse_xml_declaration()?;
                continue;
            }
            if self.stream.starts_with("<!DOCTYPE") {
                self.parse_doctype()?;
                continue;
            }
            if self.stream.starts_with("<!--") {
                self.parse_comment(self.current_parent())?;
                continue;
            }
            if self.stream.starts_with("<?") {
                self.parse_pi(self.current_parent())?;
                continue;
            }
            if self.stream.starts_with("<![CDATA[") {
                self.fatal(Error::ContentOutsideRoot(self.stream.text_pos()))?;
                self.skip_cdata();
                continue;
            }
            if self.stream.starts_with("</") {
                self.parse_end_tag()?;
                continue;
            }
            if self.stream.curr_byte() == Some(b'<') {
                self.parse_start_tag()?;
                continue;
            }
            self.parse_text_outside_or_inside_root()?;
        }
        if !self.open.is_empty() {
            self.issue(
                IssueKind::Syntactic,
                Error::UnterminatedConstruct(self.stream.text_pos()),
            );
        }
        if self.doc.root_element().is_none() {
            self.issue(IssueKind::Syntactic, Error::NoRootElement);
        }
        Ok(())
    }

    fn current_parent(&self) -> NodeId {
        *self.open.last().unwrap_or(&DOCUMENT_ID)
    }

    fn issue(&mut self, kind: IssueKind, error: Error) {
        let pos = self.pos_of(&error);
        if self.config.show_warnings {
            log::warn!("{:?} at {}: {}", kind, pos, error);
        }
        self.doc.errors.push(ParseIssue { kind, error, pos });
    }

    fn pos_of(&self, error: &Error) -> TextPos {
        // Every variant we issue carries (or defaults near) the current position.
        let _ = error;
        self.stream.text_pos()
    }

    /// A condition fatal enough to abort parsing outright (used only for
    /// the handful of structural violations spec §4.2 treats as
    /// unrecoverable, e.g. content before the root closes with no root at
    /// all). Most violations go through `issue` instead.
    fn fatal(&mut self, error: Error) -> Result<()> {
        self.issue(IssueKind::Syntactic, error);
        Ok(())
    }

    fn parse_xml_declaration(&mut self) -> Result<()> {
        if self.seen_prolog_content {
            let pos = self.stream.text_pos();
            self.issue(IssueKind::Syntactic, Error::MisplacedXmlDeclaration(pos));
        }
        self.stream.consume_str("<?xml")?;
        let mut decl = XmlDeclData::default();
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
                "version" => decl.version = Some(value),
                "encoding" => decl.encoding = Some(value),
                "standalone" => decl.standalone = Some(value),
                _ => {}
            }
        }
        // Parented at the document but deliberately not pushed into its
        // `children`, so tree navigation and `node()` never surface it
        // (SPEC_FULL.md §9 Open Question 1); reachable via `Document::xml_declaration`.
        self.doc.alloc(Some(DOCUMENT_ID), NodeKind::XmlDeclaration(decl));
        self.seen_prolog_content = true;
        Ok(())
    }

    fn parse_doctype(&mut self) -> Result<()> {
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
        let value = if self.config.trim_dtd { collapse_ws(raw) } else { raw.to_string() };
        // Same reasoning as the XML declaration above: parented but not a
        // navigable child, reachable via `Document::dtd`.
        self.doc.alloc(Some(DOCUMENT_ID), NodeKind::Dtd(value));
        self.seen_prolog_content = true;
        Ok(())
    }

    fn parse_comment(&mut self, parent: NodeId) -> Result<()> {
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
        let content = &self.stream.text()[start..start + end];
        if content.contains("--") {
            self.issue(IssueKind::Lexical, Error::InvalidComment(pos));
        }
        self.stream.advance(end + 3);
        if self.config.preserve_comment {
            let id = self.doc.alloc(Some(parent), NodeKind::Comment(content.to_string()));
            self.doc.append_child(parent, id);
        }
        self.seen_prolog_content = true;
        Ok(())
    }

    fn parse_pi(&mut self, parent: NodeId) -> Result<()> {
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
        let value = &self.stream.text()[start..start + end];
        self.stream.advance(end + 2);
        let value = if value.is_empty() { None } else { Some(value.to_string()) };
        let id = self.doc.alloc(Some(parent), NodeKind::ProcessingInstruction { target, value });
        self.doc.append_child(parent, id);
        self.seen_prolog_content = true;
        Ok(())
    }

    fn skip_cdata(&mut self) {
        self.stream.advance(9);
        if let Some(i) = self.stream.rest().find("]]>") {
            self.stream.advance(i + 3);
        } else {
            self.stream.advance(self.stream.rest().len());
        }
    }

    fn parse_text_outside_or_inside_root(&mut self) -> Result<()> {
        let start = self.stream.pos();
        let text = self.stream.consume_while(|c| c != '<');
        let _ = text;
        let raw = &self.stream.text()[start..self.stream.pos()];
        if self.open.is_empty() {
            if !raw.trim().is_empty() {
                self.issue(
                    IssueKind::Syntactic,
                    Error::ContentOutsideRoot(self.stream.text_pos()),
                );
            }
            return Ok(());
        }
        if raw.is_empty() {
            return Ok(());
        }
        self.push_text(raw, false)
    }

    fn push_text(&mut self, raw: &str, is_cdata: bool) -> Result<()> {
        if raw.trim().is_empty() && !self.config.preserve_space && !is_cdata {
            return Ok(());
        }
        let parent = self.current_parent();
        let (expanded, has_entity) = expand_entities(raw, self.stream.text_pos())?;
        let numeric = NumericValue::from_str(&expanded);
        let id = self.doc.alloc(
            Some(parent),
            NodeKind::Text(TextData { value: expanded, is_cdata, has_entity, numeric }),
        );
        self.doc.append_child(parent, id);
        Ok(())
    }

    fn parse_start_tag(&mut self) -> Result<()> {
        self.seen_prolog_content = true;
        let pos = self.stream.text_pos();
        self.stream.advance(1); // '<'
        let (prefix, local) = self.stream.consume_qname()?;
        let mut raw_attrs: Vec<(&str, &str, String, TextPos)> = Vec::new();
        loop {
            let had_space = {
                let before = self.stream.pos();
                self.stream.skip_spaces();
                self.stream.pos() != before
            };
            if self.stream.try_consume_str("/>") {
                self.open_element(prefix, local, raw_attrs, pos, true)?;
                return Ok(());
            }
            if self.stream.try_consume_byte(b'>') {
                self.open_element(prefix, local, raw_attrs, pos, false)?;
                return Ok(());
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
            raw_attrs.push((ap, al, value, attr_pos));
        }
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

    fn open_element(
        &mut self,
        prefix: &str,
        local: &str,
        raw_attrs: Vec<(&str, &str, String, TextPos)>,
        pos: TextPos,
        self_enclosing: bool,
    ) -> Result<()> {
        if self.config.enable_debugging {
            log::trace!(
                "open_element prefix={:?} local={:?} self_enclosing={} at {}",
                prefix, local, self_enclosing, pos
            );
        }

        if !self.open.is_empty() {
            // nested, fine
        } else if self.doc.root_element().is_some() {
            self.issue(IssueKind::Syntactic, Error::MultipleRootElements(pos));
        }

        let scope_mark = self.ns_stack.len();

        // Pass 1: declare namespaces from xmlns / xmlns:* attributes.
        let mut element_namespaces: Vec<NodeId> = Vec::new();
        let mut plain_attrs: Vec<(&str, &str, String, TextPos)> = Vec::new();
        for (ap, al, value, apos) in raw_attrs {
            if ap.is_empty() && al == "xmlns" {
                self.declare_namespace("", &value, apos, scope_mark, &mut element_namespaces, true);
            } else if ap == "xmlns" {
                self.declare_namespace(al, &value, apos, scope_mark, &mut element_namespaces, false);
            } else {
                plain_attrs.push((ap, al, value, apos));
            }
        }

        let element_uri = if prefix.is_empty() {
            self.lookup_default_ns()
        } else if prefix == "xml" {
            Some(XML_NS_URI.to_string())
        } else {
            match self.lookup_prefix(prefix) {
                Some(u) => Some(u),
                None => {
                    self.issue(
                        IssueKind::Namespace,
                        Error::UnknownNamespacePrefix(prefix.to_string(), pos),
                    );
                    None
                }
            }
        };

        let name = QName::new(prefix, local);
        let parent = self.current_parent();
        let elem_id = self.doc.alloc(
            Some(parent),
            NodeKind::Element(ElementData {
                name,
                expanded_uri: element_uri,
                attributes: OrderedMap::new(),
                namespaces_owned: element_namespaces,
                bound_namespace: None,
                children: Vec::new(),
                is_self_enclosing: self_enclosing,
            }),
        );
        self.doc.append_child(parent, elem_id);

        if !prefix.is_empty() {
            if let Some(uri) = self.lookup_prefix(prefix) {
                let ns_id = self.doc.alloc(
                    Some(elem_id),
                    NodeKind::Namespace(NamespaceData {
                        prefix: Some(prefix.to_string()),
                        uri,
                        is_default: false,
                        is_global: false,
                    }),
                );
                if let NodeKind::Element(e) = self.doc.kind_mut(elem_id) {
                    e.bound_namespace = Some(ns_id);
                }
            }
        }

        // Pass 2: resolve and attach real attributes, duplicate-checked by
        // expanded name (SPEC_FULL.md §9 Open Question 3).
        let mut seen: Vec<ExpandedName> = Vec::new();
        for (ap, al, value, apos) in plain_attrs {
            let (uri, bound) = if ap.is_empty() {
                (None, None)
            } else if ap == "xml" {
                (Some(XML_NS_URI.to_string()), None)
            } else {
                match self.lookup_prefix(ap) {
                    Some(u) => (Some(u), None),
                    None => {
                        self.issue(
                            IssueKind::Namespace,
                            Error::UnknownNamespacePrefix(ap.to_string(), apos),
                        );
                        (None, None)
                    }
                }
            };
            let expanded = ExpandedName::new(uri.as_deref(), al);
            if seen.contains(&expanded) {
                self.issue(
                    IssueKind::Syntactic,
                    Error::DuplicatedAttribute(format!("{}:{}", ap, al), apos),
                );
                continue;
            }
            seen.push(expanded.clone());
            let numeric = NumericValue::from_str(&value);
            let attr_id = self.doc.alloc(
                Some(elem_id),
                NodeKind::Attribute(AttributeData {
                    name: QName::new(ap, al),
                    value,
                    numeric,
                    bound_namespace: bound,
                }),
            );
            if let NodeKind::Element(e) = self.doc.kind_mut(elem_id) {
                e.attributes.insert(expanded, attr_id);
            }
        }

        if !self_enclosing {
            self.open.push(elem_id);
            self.ns_scope_marks.push(scope_mark);
        } else {
            // namespaces declared on a self-closing element don't stay in scope
            self.ns_stack.truncate(scope_mark);
        }
        Ok(())
    }

    fn declare_namespace(
        &mut self,
        prefix: &str,
        uri: &str,
        pos: TextPos,
        scope_mark: usize,
        owned: &mut Vec<NodeId>,
        is_default: bool,
    ) {
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
        // Only a second declaration of the same prefix *on this element* is
        // a duplicate; shadowing an ancestor's binding is normal scoping.
        let duplicate = self.ns_stack[scope_mark..].iter().any(|s| s.prefix == prefix);
        if duplicate && !self.config.allow_duplicate_namespaces {
            self.issue(
                IssueKind::Namespace,
                Error::DuplicatedNamespace(prefix.to_string(), pos),
            );
        }
        let is_global = self.ns_stack.is_empty() && self.open.is_empty();
        let ns_id = self.doc.alloc(
            None,
            NodeKind::Namespace(NamespaceData {
                prefix: if prefix.is_empty() { None } else { Some(prefix.to_string()) },
                uri: uri.to_string(),
                is_default,
                is_global,
            }),
        );
        owned.push(ns_id);
        self.ns_stack.push(NsScope { prefix: prefix.to_string(), uri: uri.to_string() });
    }

    fn lookup_prefix(&self, prefix: &str) -> Option<String> {
        self.ns_stack.iter().rev().find(|s| s.prefix == prefix).map(|s| s.uri.clone())
    }

    fn lookup_default_ns(&self) -> Option<String> {
        self.ns_stack.iter().rev().find(|s| s.prefix.is_empty()).map(|s| s.uri.clone())
    }

    fn parse_end_tag(&mut self) -> Result<()> {
        let pos = self.stream.text_pos();
        self.stream.consume_str("</")?;
        let (prefix, local) = self.stream.consume_qname()?;
        self.stream.skip_spaces();
        self.stream.consume_byte(b'>')?;
        let expected = self.open.last().map(|&id| self.doc.element_name(id));
        let actual = QName::new(prefix, local);
        match expected {
            Some(exp) if exp.combined() == actual.combined() => {
                self.close_current_element(Some(pos))?;
            }
            Some(exp) => {
                self.issue(
                    IssueKind::Syntactic,
                    Error::UnexpectedCloseTag {
                        expected: exp.combined().to_string(),
                        actual: actual.combined().to_string(),
                        pos,
                    },
                );
                self.close_current_element(Some(pos))?;
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
        Ok(())
    }

    fn close_current_element(&mut self, _pos: Option<TextPos>) -> Result<()> {
        if self.config.enable_debugging {
            log::trace!("close_current_element depth={}", self.open.len());
        }
        self.open.pop();
        if let Some(mark) = self.ns_scope_marks.pop() {
            self.ns_stack.truncate(mark);
        }
        Ok(())
    }

}

fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
