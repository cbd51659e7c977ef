//! Qualified names and the numeric-value side table (spec §3).

use std::fmt;

/// A qualified name: `prefix:local`, or just `local` when unprefixed.
///
/// Per spec §3 "Qualified name": the combined form owns the backing
/// storage and `prefix`/`local` are views into it.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct QName {
    combined: Box<str>,
    /// Byte offset in `combined` where the local part starts (0 if unprefixed).
    local_start: usize,
}

impl QName {
    pub fn new(prefix: &str, local: &str) -> Self {
        if prefix.is_empty() {
            QName { combined: Box::from(local), local_start: 0 }
        } else {
            let combined = format!("{}:{}", prefix, local);
            let local_start = prefix.len() + 1;
            QName { combined: combined.into_boxed_str(), local_start }
        }
    }

    pub fn from_local(local: &str) -> Self {
        Self::new("", local)
    }

    #[inline]
    pub fn prefix(&self) -> &str {
        if self.local_start == 0 {
            ""
        } else {
            &self.combined[..self.local_start - 1]
        }
    }

    #[inline]
    pub fn local(&self) -> &str {
        &self.combined[self.local_start..]
    }

    #[inline]
    pub fn combined(&self) -> &str {
        &self.combined
    }

    #[inline]
    pub fn has_prefix(&self) -> bool {
        self.local_start != 0
    }
}

impl fmt::Debug for QName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "QName({})", self.combined)
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.combined)
    }
}

/// An expanded name: `(namespace URI, local name)`, used for identity
/// comparisons across prefix aliases (GLOSSARY "Expanded name").
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct ExpandedName {
    pub uri: Option<String>,
    pub local: String,
}

impl ExpandedName {
    pub fn new(uri: Option<&str>, local: &str) -> Self {
        ExpandedName {
            uri: uri.filter(|u| !u.is_empty()).map(|s| s.to_string()),
            local: local.to_string(),
        }
    }
}

/// A tagged numeric value derived from an attribute or text node's string
/// content on construction (spec §3 "Numeric value").
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum NumericValue {
    Double(f64),
    Integer(i64),
    HexInteger(i64),
    NaN,
}

impl NumericValue {
    pub fn from_str(s: &str) -> Self {
        let trimmed = s.trim();
        if let Some(hex) = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            if let Ok(v) = i64::from_str_radix(hex, 16) {
                return NumericValue::HexInteger(v);
            }
            return NumericValue::NaN;
        }
        if let Ok(v) = trimmed.parse::<i64>() {
            return NumericValue::Integer(v);
        }
        if let Ok(v) = trimmed.parse::<f64>() {
            return NumericValue::Double(v);
        }
        NumericValue::NaN
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            NumericValue::Double(v) => v,
            NumericValue::Integer(v) => v as f64,
            NumericValue::HexInteger(v) => v as f64,
            NumericValue::NaN => f64::NAN,
        }
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, NumericValue::NaN) || self.as_f64().is_nan()
    }
}
