//! Crate-wide error type.
//!
//! Grounded on `roxmltree::parse::Error`: a flat enum with a `pos()`
//! accessor, extended with the XPath and I/O kinds from spec section 7.

use std::fmt;

/// A line/column position in the original document, 1-based.
///
/// Computed lazily from a byte offset — see [`crate::Document::text_pos_at`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TextPos {
    pub line: u32,
    pub col: u32,
}

impl TextPos {
    pub fn new(line: u32, col: u32) -> Self {
        TextPos { line, col }
    }
}

impl fmt::Display for TextPos {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// All errors the crate can produce.
///
/// Recoverable parser issues (§4.2) are *not* returned through this type —
/// they accumulate in [`crate::Document::errors`] as [`ParseIssue`] values.
/// This enum carries only conditions that are fatal to the enclosing
/// operation (parse, serialize, xpath compile/evaluate, I/O).
#[derive(thiserror::Error, Clone, Debug)]
pub enum Error {
    #[error("invalid character at {0}")]
    InvalidChar(TextPos),

    #[error("unexpected end of stream")]
    UnexpectedEof,

    #[error("expected {expected}, found {found:?} at {pos}")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
        pos: TextPos,
    },

    #[error("unexpected close tag: expected '{expected}', found '{actual}' at {pos}")]
    UnexpectedCloseTag {
        expected: String,
        actual: String,
        pos: TextPos,
    },

    #[error("the document has no root element")]
    NoRootElement,

    #[error("the document has more than one root element, second one at {0}")]
    MultipleRootElements(TextPos),

    #[error("non-whitespace content outside of the root element at {0}")]
    ContentOutsideRoot(TextPos),

    #[error("an XML declaration must be the first thing in the document, found at {0}")]
    MisplacedXmlDeclaration(TextPos),

    #[error("attribute '{0}' is already defined on this element, at {1}")]
    DuplicatedAttribute(String, TextPos),

    #[error("namespace '{0}' is already defined in this scope, at {1}")]
    DuplicatedNamespace(String, TextPos),

    #[error("an unresolved namespace prefix '{0}' at {1}")]
    UnknownNamespacePrefix(String, TextPos),

    #[error("the 'xmlns' prefix must not be declared, at {0}")]
    ReservedXmlnsPrefix(TextPos),

    #[error("the 'xml' prefix must be bound to the canonical XML namespace, at {0}")]
    InvalidXmlPrefixUri(TextPos),

    #[error("the canonical XML namespace URI must only be bound to the 'xml' prefix, at {0}")]
    UnexpectedXmlUri(TextPos),

    #[error("the reserved xmlns namespace URI must not be declared, at {0}")]
    UnexpectedXmlnsUri(TextPos),

    #[error("a malformed entity reference at {0}")]
    MalformedEntityReference(TextPos),

    #[error("reference to an undeclared entity '{0}' at {1}")]
    UnknownEntityReference(String, TextPos),

    #[error("a possible entity reference loop was detected at {0}")]
    EntityReferenceLoop(TextPos),

    #[error("an unterminated comment, CDATA section, or string starting at {0}")]
    UnterminatedConstruct(TextPos),

    #[error("XML comments must not contain '--', at {0}")]
    InvalidComment(TextPos),

    #[error("the input must be smaller than 4GiB")]
    SizeLimit,

    #[error("an XPath parse error: {0}")]
    XPathParse(String),

    #[error("an XPath evaluation error: {0}")]
    XPathEval(String),

    #[error("an invalid compact query: {0}")]
    QueryParse(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// A kind tag for a [`ParseIssue`], corresponding to spec §7's six error
/// kinds (minus the I/O kind, which is always fatal and never recoverable).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum IssueKind {
    Lexical,
    Syntactic,
    Namespace,
    Warning,
}

/// A recoverable error or warning recorded during tree parsing.
///
/// Accumulates on [`crate::Document::errors`]; the document's
/// `is_well_formed` flag is `true` iff no [`IssueKind::Lexical`],
/// [`IssueKind::Syntactic`], or [`IssueKind::Namespace`] issue is present
/// (warnings alone do not affect well-formedness).
#[derive(Clone, Debug)]
pub struct ParseIssue {
    pub kind: IssueKind,
    pub error: Error,
    pub pos: TextPos,
}

impl fmt::Display for ParseIssue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}
