//! An XML document tree, SAX-style pull event reader, serializer, compact
//! query language, and XPath 1.0 evaluator.
//!
//! Grounded on `roxmltree`'s architecture: a zero-copy tokenizer feeding an
//! arena-backed tree, generalized per this crate's design (see `DESIGN.md`)
//! to own its string payloads so nodes can be dropped or deleted, and to
//! share its lexical grammar with a second, event-based front end
//! ([`EventReader`]) for callers that would rather stream than build a tree.
//!
//! ```
//! use cxml::Document;
//!
//! let doc = Document::parse("<greeting lang='en'>hello</greeting>").unwrap();
//! let root = doc.root_element().unwrap();
//! assert_eq!(root.tag_name().unwrap().local(), "greeting");
//! assert_eq!(root.attribute("lang").and_then(|a| a.value()), Some("en"));
//! ```

mod config;
mod containers;
mod entities;
mod error;
mod node;
mod parser;
mod qname;
mod query;
mod reader;
mod serializer;
mod source;
mod stream;
mod xpath;

pub use config::Config;
pub use error::{Error, IssueKind, ParseIssue, Result, TextPos};
pub use node::{Document, Node, NodeId, NodeType};
pub use qname::{ExpandedName, NumericValue, QName};
pub use query::{query, Query};
pub use reader::{Event, EventReader};
pub use serializer::Serializer;
pub use source::{ByteSource, SliceSource};
pub use xpath::{evaluate as eval_xpath, Value as XPathValue, XPath};

#[cfg(feature = "std")]
pub use source::{read_file_to_string, ReaderSource};

impl Document {
    /// Parses `text` with [`Config::default`].
    pub fn parse(text: &str) -> Result<Document> {
        parser::parse(text)
    }

    /// Parses `text` with an explicit configuration.
    pub fn parse_with_config(text: &str, config: Config) -> Result<Document> {
        parser::parse_with_config(text, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_and_event_reader_agree_on_document_order() {
        let xml = "<root a='1'><child>text</child><!--c--></root>";
        let doc = Document::parse(xml).unwrap();
        let tree_values: Vec<String> = doc.root_element().unwrap().descendants().map(|n| n.string_value()).collect();

        let mut reader = EventReader::new(xml);
        let mut event_count = 0;
        while let Some(ev) = reader.next() {
            ev.unwrap();
            event_count += 1;
        }
        assert!(event_count > 0);
        assert!(!tree_values.is_empty());
    }

    #[test]
    fn xpath_and_query_agree_on_a_simple_selector() {
        let doc = Document::parse("<root><item id='1'/><item id='2'/></root>").unwrap();
        let root = doc.root_element().unwrap();
        let via_xpath = eval_xpath("/root/item[@id='2']", root).unwrap().into_nodeset().unwrap();
        let via_query = query(root, "<item>/id='2'/").unwrap();
        assert_eq!(via_xpath.len(), 1);
        assert_eq!(via_query.len(), 1);
        assert_eq!(via_xpath[0].id(), via_query[0].id());
    }

    #[test]
    fn round_trips_through_the_serializer() {
        let doc = Document::parse("<a><b>1</b></a>").unwrap();
        let out = Serializer::new().to_string(doc.root_element().unwrap());
        let doc2 = Document::parse(&out).unwrap();
        assert_eq!(doc2.root_element().unwrap().tag_name().unwrap().local(), "a");
    }
}
