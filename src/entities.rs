//! Character/entity reference expansion shared by the tree parser and the
//! pull event reader (spec §4.1 "entity reference loop detection").
//!
//! Only the five predefined entities and numeric character references are
//! in scope (no DTD-declared general entities per spec Non-goals), so loop
//! detection degenerates to a reference-count cap rather than true graph
//! cycle detection — grounded on `roxmltree`'s `LoopDetector`, which bounds
//! nesting depth and total reference count for the same reason.

use crate::error::{Error, Result, TextPos};

const MAX_REFERENCES: u32 = 255;

/// Expands `&amp; &lt; &gt; &apos; &quot; &#NN; &#xNN;` references in `raw`.
/// Returns the expanded text and whether any reference was actually present.
pub(crate) fn expand_entities(raw: &str, pos: TextPos) -> Result<(String, bool)> {
    if !raw.contains('&') {
        return Ok((raw.to_string(), false));
    }
    let mut out = String::with_capacity(raw.len());
    let mut refs = 0u32;
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let semi = rest.find(';').ok_or(Error::MalformedEntityReference(pos))?;
        let ent = &rest[1..semi];
        refs += 1;
        if refs > MAX_REFERENCES {
            return Err(Error::EntityReferenceLoop(pos));
        }
        match ent {
            "amp" => out.push('&'),
            "lt" => out.push('<'),
            "gt" => out.push('>'),
            "apos" => out.push('\''),
            "quot" => out.push('"'),
            _ if ent.starts_with("#x") || ent.starts_with("#X") => {
                let code = u32::from_str_radix(&ent[2..], 16)
                    .map_err(|_| Error::MalformedEntityReference(pos))?;
                out.push(char::from_u32(code).ok_or(Error::MalformedEntityReference(pos))?);
            }
            _ if ent.starts_with('#') => {
                let code: u32 =
                    ent[1..].parse().map_err(|_| Error::MalformedEntityReference(pos))?;
                out.push(char::from_u32(code).ok_or(Error::MalformedEntityReference(pos))?);
            }
            other => return Err(Error::UnknownEntityReference(other.to_string(), pos)),
        }
        rest = &rest[semi + 1..];
    }
    out.push_str(rest);
    Ok((out, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TextPos;

    fn pos() -> TextPos {
        TextPos::new(1, 1)
    }

    #[test]
    fn expands_predefined_entities() {
        let (s, had) = expand_entities("a &lt;b&gt; &amp; c", pos()).unwrap();
        assert_eq!(s, "a <b> & c");
        assert!(had);
    }

    #[test]
    fn expands_numeric_and_hex_references() {
        let (s, _) = expand_entities("&#65;&#x42;", pos()).unwrap();
        assert_eq!(s, "AB");
    }

    #[test]
    fn rejects_unknown_entity() {
        assert!(expand_entities("&foo;", pos()).is_err());
    }

    #[test]
    fn rejects_excessive_reference_count() {
        let text: String = std::iter::repeat("&amp;").take(300).collect();
        assert!(matches!(expand_entities(&text, pos()), Err(Error::EntityReferenceLoop(_))));
    }

    #[test]
    fn no_ampersand_is_a_cheap_passthrough() {
        let (s, had) = expand_entities("plain text", pos()).unwrap();
        assert_eq!(s, "plain text");
        assert!(!had);
    }
}
