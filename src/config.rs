//! Process-wide parsing/serialization options, threaded explicitly through
//! every call instead of stored in a global (see SPEC_FULL.md §9: "Replace
//! the process-wide configuration with an explicit configuration value").

/// Options controlling parsing and serialization.
///
/// Passed by value (it's `Copy` except for `doc_name`) to
/// [`crate::Document::parse_with_config`] and
/// [`crate::Serializer::with_config`]; nothing in this crate reads a
/// thread-local or static configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Retain pure-whitespace text nodes between elements.
    pub preserve_space: bool,
    /// Include comment nodes in the tree.
    pub preserve_comment: bool,
    /// Include CDATA text nodes (if false, CDATA content is dropped).
    pub preserve_cdata: bool,
    /// Collapse internal whitespace in the raw DTD value.
    pub trim_dtd: bool,
    /// Downgrade a duplicate namespace declaration from an error to a warning.
    pub allow_duplicate_namespaces: bool,
    /// Emit non-fatal diagnostics (to the `log` crate, at `warn` level).
    pub show_warnings: bool,
    /// Emit verbose parser traces (to the `log` crate, at `trace` level).
    pub enable_debugging: bool,
    /// Serializer indentation width, clamped to 1..=30.
    pub indent_space_size: u8,
    /// Whether the serializer performs entity transposition at all.
    pub transpose_text: bool,
    /// Escape all five predefined entities rather than only `< > &`.
    pub strict_transpose: bool,
    /// Wrap serialized output of a `Document` in a `<doc_name>` element.
    pub show_doc_as_top_level: bool,
    /// Prefix each node's debug/string form with `[Kind]='...'`.
    pub print_fancy: bool,
    /// Name used for the document wrapper and in `Document::name()`.
    pub doc_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            preserve_space: true,
            preserve_comment: true,
            preserve_cdata: true,
            trim_dtd: false,
            allow_duplicate_namespaces: false,
            show_warnings: false,
            enable_debugging: false,
            indent_space_size: 2,
            transpose_text: true,
            strict_transpose: false,
            show_doc_as_top_level: false,
            print_fancy: false,
            doc_name: "XMLDocument".to_string(),
        }
    }
}

impl Config {
    /// Returns a config with `indent_space_size` clamped into the
    /// documented 1..=30 range.
    pub fn indent(&self) -> usize {
        self.indent_space_size.clamp(1, 30) as usize
    }
}
