//! The node graph: an arena of nine node variants plus a borrowing `Node`
//! handle for navigation (spec §3 "Nodes", §9 "Nine-variant node graph").
//!
//! Grounded on `roxmltree`'s arena (`Vec<NodeData>` addressed by a
//! `NodeId`), generalized per SPEC_FULL.md §3/§9 Open Question 4 to own its
//! string payloads (rather than borrow from the source text) so that
//! `drop`/`delete` can hand a subtree to the caller independent of the
//! original parse's lifetime. Deletion is implemented by tombstoning
//! (`NodeKind::Tombstone`) rather than compacting the arena, so existing
//! `NodeId`s from before a delete never alias a different, later node.

use crate::containers::OrderedMap;
use crate::qname::{ExpandedName, NumericValue, QName};
use std::fmt;

/// An index into a [`Document`]'s node arena.
///
/// Stable for the lifetime of the `Document`: deleting a node tombstones
/// its slot rather than reusing it, so an old `NodeId` never comes to
/// refer to an unrelated node (it simply becomes "dead").
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

pub(crate) const DOCUMENT_ID: NodeId = NodeId(0);

/// The nine node variants of spec §3, plus an internal tombstone marking a
/// deleted slot.
#[derive(Debug)]
pub(crate) enum NodeKind {
    Document(DocumentData),
    Element(ElementData),
    Attribute(AttributeData),
    Text(TextData),
    Comment(String),
    ProcessingInstruction { target: String, value: Option<String> },
    Namespace(NamespaceData),
    Dtd(String),
    XmlDeclaration(XmlDeclData),
    /// A deleted node's former slot. Never surfaced through public API.
    Tombstone,
}

#[derive(Debug)]
pub(crate) struct DocumentData {
    pub name: String,
    pub root_element: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub well_formed: bool,
    pub is_svg: bool,
}

#[derive(Debug)]
pub(crate) struct ElementData {
    pub name: QName,
    pub expanded_uri: Option<String>,
    pub attributes: OrderedMap<ExpandedName, NodeId>,
    /// Namespace declarations owned by (physically written on) this element.
    pub namespaces_owned: Vec<NodeId>,
    /// The namespace node that resolves this element's own prefix, if any.
    pub bound_namespace: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub is_self_enclosing: bool,
}

#[derive(Debug)]
pub(crate) struct AttributeData {
    pub name: QName,
    pub value: String,
    pub numeric: NumericValue,
    pub bound_namespace: Option<NodeId>,
}

#[derive(Debug)]
pub(crate) struct TextData {
    pub value: String,
    pub is_cdata: bool,
    pub has_entity: bool,
    pub numeric: NumericValue,
}

#[derive(Debug)]
pub(crate) struct NamespaceData {
    pub prefix: Option<String>,
    pub uri: String,
    pub is_default: bool,
    pub is_global: bool,
}

#[derive(Debug, Default)]
pub(crate) struct XmlDeclData {
    pub version: Option<String>,
    pub encoding: Option<String>,
    pub standalone: Option<String>,
}

pub(crate) struct NodeData {
    pub parent: Option<NodeId>,
    pub position: u32,
    pub kind: NodeKind,
}

/// A parsed XML document: an arena of nodes plus the accumulated parse
/// diagnostics (spec §7 "Propagation").
pub struct Document {
    pub(crate) arena: Vec<NodeData>,
    pub(crate) next_position: u32,
    pub(crate) errors: Vec<crate::error::ParseIssue>,
    pub(crate) source: String,
}

impl Document {
    pub(crate) fn empty(name: &str) -> Self {
        let mut doc = Document {
            arena: Vec::new(),
            next_position: 0,
            errors: Vec::new(),
            source: String::new(),
        };
        doc.arena.push(NodeData {
            parent: None,
            position: 0,
            kind: NodeKind::Document(DocumentData {
                name: name.to_string(),
                root_element: None,
                children: Vec::new(),
                well_formed: true,
                is_svg: false,
            }),
        });
        doc.next_position = 1;
        doc
    }

    pub(crate) fn alloc(&mut self, parent: Option<NodeId>, kind: NodeKind) -> NodeId {
        let id = NodeId(self.arena.len() as u32);
        let position = self.next_position;
        self.next_position += 1;
        self.arena.push(NodeData { parent, position, kind });
        id
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.arena[id.index()]
    }

    fn data_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.arena[id.index()]
    }

    fn is_live(&self, id: NodeId) -> bool {
        id.index() < self.arena.len() && !matches!(self.data(id).kind, NodeKind::Tombstone)
    }

    /// The document root handle (`NodeId(0)`).
    pub fn root(&self) -> Node {
        Node { id: DOCUMENT_ID, doc: self }
    }

    /// The sole root element, per spec §3 invariant 2.
    pub fn root_element(&self) -> Option<Node> {
        match &self.data(DOCUMENT_ID).kind {
            NodeKind::Document(d) => d.root_element.map(|id| Node { id, doc: self }),
            _ => None,
        }
    }

    pub fn name(&self) -> &str {
        match &self.data(DOCUMENT_ID).kind {
            NodeKind::Document(d) => &d.name,
            _ => unreachable!(),
        }
    }

    /// True iff no lexical, syntactic, or namespace issue was recorded
    /// during parsing (spec §3 invariant / §7 "is_well_formed").
    pub fn is_well_formed(&self) -> bool {
        !self.errors.iter().any(|e| {
            matches!(
                e.kind,
                crate::error::IssueKind::Lexical
                    | crate::error::IssueKind::Syntactic
                    | crate::error::IssueKind::Namespace
            )
        })
    }

    pub fn errors(&self) -> &[crate::error::ParseIssue] {
        &self.errors
    }

    /// Total arena slots, including tombstoned ones. Used to scale the
    /// XPath evaluator's absolute-path cache to document size.
    pub(crate) fn arena_len(&self) -> usize {
        self.arena.len()
    }

    /// Computes a 1-based line/column for a byte offset in the original
    /// source text (§4.1 "Tracks line/column"). O(n) in `pos`.
    pub fn text_pos_at(&self, pos: usize) -> crate::error::TextPos {
        crate::stream::text_pos_at(&self.source, pos)
    }

    /// The XML declaration, if the document had one (kept out of `node()`
    /// per SPEC_FULL.md §9 Open Question 1).
    pub fn xml_declaration(&self) -> Option<Node> {
        self.prolog_child(|k| matches!(k, NodeKind::XmlDeclaration(_)))
    }

    /// The DTD node, if the document had a DOCTYPE.
    pub fn dtd(&self) -> Option<Node> {
        self.prolog_child(|k| matches!(k, NodeKind::Dtd(_)))
    }

    /// Scans the whole arena rather than `DocumentData.children`: the XML
    /// declaration and DTD are allocated as parented-at-document nodes but
    /// deliberately left out of `children` (SPEC_FULL.md §9 Open Question
    /// 1), so `node()`/sibling-axis traversal never surfaces them.
    fn prolog_child<F: Fn(&NodeKind) -> bool>(&self, f: F) -> Option<Node> {
        self.arena.iter().enumerate().find(|(_, d)| d.parent == Some(DOCUMENT_ID) && f(&d.kind)).map(|(i, _)| Node { id: NodeId(i as u32), doc: self })
    }

    fn node(&self, id: NodeId) -> Node {
        Node { id, doc: self }
    }

    pub(crate) fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.arena[id.index()].kind
    }

    /// The tag name of an open element, used by the tree parser to match
    /// close tags against their opener.
    pub(crate) fn element_name(&self, id: NodeId) -> &QName {
        match &self.arena[id.index()].kind {
            NodeKind::Element(e) => &e.name,
            _ => unreachable!("element_name called on a non-element node"),
        }
    }

    // ---- mutation (§3 Lifecycle, §5 Ownership rules, §8 property 4) ----

    /// Detach `id` from its parent's child/attribute/namespace collection.
    /// The node stays resident in this document's arena as the root of a
    /// standalone subtree; `parent(id)` is `None` afterwards.
    pub fn drop_node(&mut self, id: NodeId) {
        let parent = match self.data(id).parent {
            Some(p) => p,
            None => return,
        };
        self.unlink_from_parent(id, parent);
        self.data_mut(id).parent = None;
    }

    /// Detach `id` and free it and its descendants (tombstone their slots).
    /// Equivalent to `drop_node` followed by recursively discarding the
    /// subtree; unlike `drop_node`, the node is no longer usable afterwards.
    pub fn delete_node(&mut self, id: NodeId) {
        self.drop_node(id);
        self.tombstone_subtree(id);
    }

    fn tombstone_subtree(&mut self, id: NodeId) {
        if !self.is_live(id) {
            return;
        }
        let children: Vec<NodeId> = self.children_of(id);
        for c in children {
            self.tombstone_subtree(c);
        }
        if let NodeKind::Element(e) = &self.data(id).kind {
            let attrs: Vec<NodeId> = e.attributes.values().copied().collect();
            let nss: Vec<NodeId> = e.namespaces_owned.clone();
            for a in attrs {
                self.tombstone_subtree(a);
            }
            for n in nss {
                self.tombstone_subtree(n);
            }
        }
        self.data_mut(id).kind = NodeKind::Tombstone;
    }

    fn children_of(&self, id: NodeId) -> Vec<NodeId> {
        match &self.data(id).kind {
            NodeKind::Document(d) => d.children.clone(),
            NodeKind::Element(e) => e.children.clone(),
            _ => Vec::new(),
        }
    }

    fn unlink_from_parent(&mut self, id: NodeId, parent: NodeId) {
        match &mut self.data_mut(parent).kind {
            NodeKind::Document(d) => {
                d.children.retain(|&c| c != id);
                if d.root_element == Some(id) {
                    d.root_element = None;
                }
            }
            NodeKind::Element(e) => {
                e.children.retain(|&c| c != id);
                e.namespaces_owned.retain(|&c| c != id);
                let removed_key = e
                    .attributes
                    .iter()
                    .find(|(_, v)| *v == id)
                    .map(|(k, _)| k.clone());
                if let Some(k) = removed_key {
                    e.attributes.remove(&k);
                }
            }
            _ => {}
        }
    }

    /// Appends `child` to `parent`'s children (builder operation used by
    /// both the tree parser and explicit tree construction).
    pub(crate) fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.data_mut(child).parent = Some(parent);
        let child_is_element = matches!(self.arena[child.index()].kind, NodeKind::Element(_));
        match &mut self.data_mut(parent).kind {
            NodeKind::Document(d) => {
                if child_is_element {
                    d.root_element = Some(child);
                }
                d.children.push(child);
            }
            NodeKind::Element(e) => e.children.push(child),
            _ => {}
        }
    }
}

/// A borrowed handle into a [`Document`]'s arena — the public navigation type.
pub struct Node<'a> {
    pub(crate) id: NodeId,
    pub(crate) doc: &'a Document,
}

impl<'a> Clone for Node<'a> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<'a> Copy for Node<'a> {}

impl<'a> PartialEq for Node<'a> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && std::ptr::eq(self.doc, other.doc)
    }
}
impl<'a> Eq for Node<'a> {}

impl<'a> std::hash::Hash for Node<'a> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Node type discriminant, mirroring spec §3's variant table (DTD and XML
/// declaration included, unlike a minimal "5 kinds" reader — see §9 Open
/// Question 1 for how they interact with `node()`).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum NodeType {
    Document,
    Element,
    Attribute,
    Text,
    Comment,
    ProcessingInstruction,
    Namespace,
    Dtd,
    XmlDeclaration,
}

impl<'a> Node<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn document(&self) -> &'a Document {
        self.doc
    }

    pub(crate) fn kind(&self) -> &'a NodeKind {
        &self.doc.arena[self.id.index()].kind
    }

    pub fn node_type(&self) -> NodeType {
        match self.kind() {
            NodeKind::Document(_) => NodeType::Document,
            NodeKind::Element(_) => NodeType::Element,
            NodeKind::Attribute(_) => NodeType::Attribute,
            NodeKind::Text(_) => NodeType::Text,
            NodeKind::Comment(_) => NodeType::Comment,
            NodeKind::ProcessingInstruction { .. } => NodeType::ProcessingInstruction,
            NodeKind::Namespace(_) => NodeType::Namespace,
            NodeKind::Dtd(_) => NodeType::Dtd,
            NodeKind::XmlDeclaration(_) => NodeType::XmlDeclaration,
            NodeKind::Tombstone => unreachable!("tombstones are never exposed"),
        }
    }

    pub fn is_document(&self) -> bool {
        self.node_type() == NodeType::Document
    }
    pub fn is_element(&self) -> bool {
        self.node_type() == NodeType::Element
    }
    pub fn is_attribute(&self) -> bool {
        self.node_type() == NodeType::Attribute
    }
    pub fn is_text(&self) -> bool {
        self.node_type() == NodeType::Text
    }
    pub fn is_comment(&self) -> bool {
        self.node_type() == NodeType::Comment
    }
    pub fn is_pi(&self) -> bool {
        self.node_type() == NodeType::ProcessingInstruction
    }
    pub fn is_namespace(&self) -> bool {
        self.node_type() == NodeType::Namespace
    }

    /// Document position assigned at construction time; stable until
    /// structural mutation (spec §3 invariant 6).
    pub fn position(&self) -> u32 {
        self.doc.arena[self.id.index()].position
    }

    pub fn parent(&self) -> Option<Node<'a>> {
        self.doc.arena[self.id.index()].parent.map(|id| self.doc.node(id))
    }

    pub fn parent_element(&self) -> Option<Node<'a>> {
        let mut cur = self.parent();
        while let Some(n) = cur {
            if n.is_element() {
                return Some(n);
            }
            cur = n.parent();
        }
        None
    }

    pub fn has_parent(&self) -> bool {
        self.doc.arena[self.id.index()].parent.is_some()
    }

    fn children_ids(&self) -> &'a [NodeId] {
        match self.kind() {
            NodeKind::Document(d) => &d.children,
            NodeKind::Element(e) => &e.children,
            _ => &[],
        }
    }

    pub fn children(&self) -> impl Iterator<Item = Node<'a>> + 'a {
        let doc = self.doc;
        self.children_ids().iter().map(move |&id| doc.node(id))
    }

    pub fn has_children(&self) -> bool {
        !self.children_ids().is_empty()
    }

    pub fn first_child(&self) -> Option<Node<'a>> {
        self.children_ids().first().map(|&id| self.doc.node(id))
    }

    pub fn last_child(&self) -> Option<Node<'a>> {
        self.children_ids().last().map(|&id| self.doc.node(id))
    }

    pub fn first_element_child(&self) -> Option<Node<'a>> {
        self.children().find(|n| n.is_element())
    }

    pub fn next_sibling(&self) -> Option<Node<'a>> {
        let parent = self.parent()?;
        let sibs = parent.children_ids();
        let i = sibs.iter().position(|&id| id == self.id)?;
        sibs.get(i + 1).map(|&id| self.doc.node(id))
    }

    pub fn prev_sibling(&self) -> Option<Node<'a>> {
        let parent = self.parent()?;
        let sibs = parent.children_ids();
        let i = sibs.iter().position(|&id| id == self.id)?;
        if i == 0 {
            None
        } else {
            Some(self.doc.node(sibs[i - 1]))
        }
    }

    pub fn ancestors(&self) -> impl Iterator<Item = Node<'a>> {
        AncestorIter { next: self.parent() }
    }

    pub fn descendants(&self) -> impl Iterator<Item = Node<'a>> {
        let mut stack: Vec<Node<'a>> = self.children().collect();
        stack.reverse();
        DescendantIter { stack }
    }

    // ---- Element-only accessors ----

    pub fn tag_name(&self) -> Option<&'a QName> {
        match self.kind() {
            NodeKind::Element(e) => Some(&e.name),
            _ => None,
        }
    }

    pub fn namespace_uri(&self) -> Option<&'a str> {
        match self.kind() {
            NodeKind::Element(e) => e.expanded_uri.as_deref(),
            NodeKind::Attribute(a) => a
                .bound_namespace
                .map(|id| match &self.doc.arena[id.index()].kind {
                    NodeKind::Namespace(n) => n.uri.as_str(),
                    _ => "",
                }),
            _ => None,
        }
    }

    pub fn is_namespaced(&self) -> bool {
        self.namespace_uri().is_some()
    }

    pub fn has_tag_name(&self, local: &str) -> bool {
        self.tag_name().map(|n| n.local() == local).unwrap_or(false)
    }

    pub fn is_self_enclosing(&self) -> bool {
        match self.kind() {
            NodeKind::Element(e) => e.is_self_enclosing && e.children.is_empty(),
            _ => false,
        }
    }

    pub fn has_attribute_flag(&self) -> bool {
        match self.kind() {
            NodeKind::Element(e) => !e.attributes.is_empty(),
            _ => false,
        }
    }

    pub fn has_child_flag(&self) -> bool {
        self.has_children()
    }

    pub fn has_text_flag(&self) -> bool {
        self.children().any(|c| c.is_text())
    }

    pub fn has_comment_flag(&self) -> bool {
        self.children().any(|c| c.is_comment())
    }

    pub fn attribute(&self, local: &str) -> Option<Node<'a>> {
        self.attributes().find(|a| a.attribute_name().map(|n| n.local()) == Some(local))
    }

    pub fn attribute_ns(&self, uri: &str, local: &str) -> Option<Node<'a>> {
        match self.kind() {
            NodeKind::Element(e) => e
                .attributes
                .get(&ExpandedName::new(Some(uri), local))
                .map(|&id| self.doc.node(id)),
            _ => None,
        }
    }

    pub fn attributes(&self) -> impl Iterator<Item = Node<'a>> + 'a {
        let doc = self.doc;
        let ids: Vec<NodeId> = match self.kind() {
            NodeKind::Element(e) => {
                let mut v: Vec<NodeId> = e.attributes.values().copied().collect();
                v.sort_by_key(|&id| doc.arena[id.index()].position);
                v
            }
            _ => Vec::new(),
        };
        ids.into_iter().map(move |id| doc.node(id))
    }

    pub fn namespaces(&self) -> impl Iterator<Item = Node<'a>> + 'a {
        let doc = self.doc;
        let ids: Vec<NodeId> = match self.kind() {
            NodeKind::Element(e) => e.namespaces_owned.clone(),
            _ => Vec::new(),
        };
        ids.into_iter().map(move |id| doc.node(id))
    }

    pub fn bound_namespace(&self) -> Option<Node<'a>> {
        match self.kind() {
            NodeKind::Element(e) => e.bound_namespace.map(|id| self.doc.node(id)),
            NodeKind::Attribute(a) => a.bound_namespace.map(|id| self.doc.node(id)),
            _ => None,
        }
    }

    pub fn resolve_prefix(&self, prefix: &str) -> Option<&'a str> {
        let mut cur = if self.is_element() { Some(*self) } else { self.parent_element() };
        while let Some(n) = cur {
            for ns in n.namespaces() {
                if let NodeKind::Namespace(d) = ns.kind() {
                    let p = d.prefix.as_deref().unwrap_or("");
                    if p == prefix {
                        return Some(&d.uri);
                    }
                }
            }
            cur = n.parent_element();
        }
        None
    }

    // ---- leaf accessors ----

    pub fn value(&self) -> Option<&'a str> {
        match self.kind() {
            NodeKind::Text(t) => Some(&t.value),
            NodeKind::Comment(v) => Some(v),
            NodeKind::Attribute(a) => Some(&a.value),
            NodeKind::Dtd(v) => Some(v),
            _ => None,
        }
    }

    pub fn numeric_value(&self) -> Option<NumericValue> {
        match self.kind() {
            NodeKind::Text(t) => Some(t.numeric),
            NodeKind::Attribute(a) => Some(a.numeric),
            _ => None,
        }
    }

    pub fn is_cdata(&self) -> bool {
        matches!(self.kind(), NodeKind::Text(t) if t.is_cdata)
    }

    pub fn has_entity(&self) -> bool {
        matches!(self.kind(), NodeKind::Text(t) if t.has_entity)
    }

    pub fn pi_target(&self) -> Option<&'a str> {
        match self.kind() {
            NodeKind::ProcessingInstruction { target, .. } => Some(target),
            _ => None,
        }
    }

    pub fn pi_value(&self) -> Option<&'a str> {
        match self.kind() {
            NodeKind::ProcessingInstruction { value, .. } => value.as_deref(),
            _ => None,
        }
    }

    pub fn attribute_name(&self) -> Option<&'a QName> {
        match self.kind() {
            NodeKind::Attribute(a) => Some(&a.name),
            _ => None,
        }
    }

    pub fn namespace_prefix(&self) -> Option<&'a str> {
        match self.kind() {
            NodeKind::Namespace(n) => Some(n.prefix.as_deref().unwrap_or("")),
            _ => None,
        }
    }

    pub fn namespace_value(&self) -> Option<&'a str> {
        match self.kind() {
            NodeKind::Namespace(n) => Some(&n.uri),
            _ => None,
        }
    }

    pub fn is_default_namespace(&self) -> bool {
        matches!(self.kind(), NodeKind::Namespace(n) if n.is_default)
    }

    pub fn is_global_namespace(&self) -> bool {
        matches!(self.kind(), NodeKind::Namespace(n) if n.is_global)
    }

    pub fn xml_decl_version(&self) -> Option<&'a str> {
        match self.kind() {
            NodeKind::XmlDeclaration(d) => d.version.as_deref(),
            _ => None,
        }
    }

    pub fn xml_decl_encoding(&self) -> Option<&'a str> {
        match self.kind() {
            NodeKind::XmlDeclaration(d) => d.encoding.as_deref(),
            _ => None,
        }
    }

    pub fn xml_decl_standalone(&self) -> Option<&'a str> {
        match self.kind() {
            NodeKind::XmlDeclaration(d) => d.standalone.as_deref(),
            _ => None,
        }
    }

    /// The concatenated string-value of this node, per the XPath 1.0
    /// data model (element/document: concatenation of descendant text;
    /// leaves: their own value).
    pub fn string_value(&self) -> String {
        match self.kind() {
            NodeKind::Text(t) => t.value.clone(),
            NodeKind::Comment(v) => v.clone(),
            NodeKind::Attribute(a) => a.value.clone(),
            NodeKind::ProcessingInstruction { value, .. } => value.clone().unwrap_or_default(),
            NodeKind::Namespace(n) => n.uri.clone(),
            NodeKind::Dtd(v) => v.clone(),
            NodeKind::Document(_) | NodeKind::Element(_) => {
                let mut s = String::new();
                collect_text(self, &mut s);
                s
            }
            NodeKind::XmlDeclaration(_) => String::new(),
            NodeKind::Tombstone => String::new(),
        }
    }
}

fn collect_text(node: &Node, out: &mut String) {
    for child in node.children() {
        match child.kind() {
            NodeKind::Text(t) => out.push_str(&t.value),
            NodeKind::Element(_) | NodeKind::Document(_) => collect_text(&child, out),
            _ => {}
        }
    }
}

impl<'a> fmt::Debug for Node<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind() {
            NodeKind::Document(_) => write!(f, "Document"),
            NodeKind::Element(e) => write!(f, "Element({})", e.name),
            NodeKind::Attribute(a) => write!(f, "Attribute({}={:?})", a.name, a.value),
            NodeKind::Text(t) => write!(f, "Text({:?})", t.value),
            NodeKind::Comment(v) => write!(f, "Comment({:?})", v),
            NodeKind::ProcessingInstruction { target, value } => {
                write!(f, "PI({:?}, {:?})", target, value)
            }
            NodeKind::Namespace(n) => write!(f, "Namespace({:?}={:?})", n.prefix, n.uri),
            NodeKind::Dtd(v) => write!(f, "Dtd({:?})", v),
            NodeKind::XmlDeclaration(_) => write!(f, "XmlDeclaration"),
            NodeKind::Tombstone => write!(f, "<deleted>"),
        }
    }
}

struct AncestorIter<'a> {
    next: Option<Node<'a>>,
}
impl<'a> Iterator for AncestorIter<'a> {
    type Item = Node<'a>;
    fn next(&mut self) -> Option<Node<'a>> {
        let cur = self.next.take()?;
        self.next = cur.parent();
        Some(cur)
    }
}

struct DescendantIter<'a> {
    stack: Vec<Node<'a>>,
}
impl<'a> Iterator for DescendantIter<'a> {
    type Item = Node<'a>;
    fn next(&mut self) -> Option<Node<'a>> {
        let node = self.stack.pop()?;
        let mut children: Vec<Node<'a>> = node.children().collect();
        children.reverse();
        self.stack.extend(children);
        Some(node)
    }
}
