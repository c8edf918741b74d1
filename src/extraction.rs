//! Typed, coercing access to the cells of a flat record.
//!
//! Every accessor here follows the same rule: a cell that is absent, null, or
//! of the wrong shape yields "missing" (`None` or an empty list). Nothing in
//! this module fails.

use crate::entity::FieldValue;

/// Literal spellings of a missing natural key left behind by upstream
/// string conversion of null cells.
pub const DEFAULT_MISSING_KEY_SENTINELS: &[&str] = &["nan", "NaN", "None", "null"];

/// Trait for records whose cells can be looked up by column name
///
/// Implementors only provide [`Extractor::extract`]; the typed accessors are
/// derived from it.
///
/// # Example
///
/// ```ignore
/// use foodfacts::{Extractor, FieldValue};
/// use std::collections::HashMap;
///
/// struct Row(HashMap<String, FieldValue>);
///
/// impl Extractor for Row {
///     fn extract(&self, column: &str) -> Option<&FieldValue> {
///         self.0.get(column)
///     }
/// }
/// ```
pub trait Extractor {
    /// Raw cell lookup. `None` means the column is absent from this record.
    fn extract(&self, column: &str) -> Option<&FieldValue>;

    /// Text cell, trimmed. Numbers are rendered; blank text is missing.
    fn text(&self, column: &str) -> Option<String> {
        let value = match self.extract(column)? {
            FieldValue::String(s) => s.trim().to_string(),
            FieldValue::Int(i) => i.to_string(),
            FieldValue::Float(f) if f.is_finite() => f.to_string(),
            _ => return None,
        };
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }

    /// Numeric cell. Text is parsed after trimming; anything unparseable or
    /// non-finite is missing rather than an error.
    fn number(&self, column: &str) -> Option<f64> {
        let parsed = match self.extract(column)? {
            FieldValue::Int(i) => *i as f64,
            FieldValue::Float(f) => *f,
            FieldValue::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        parsed.is_finite().then_some(parsed)
    }

    /// Integral cell, accepting integral floats such as `4.0`.
    fn integer(&self, column: &str) -> Option<i32> {
        let n = self.number(column)?;
        if n.fract() != 0.0 || n < i32::MIN as f64 || n > i32::MAX as f64 {
            return None;
        }
        Some(n as i32)
    }

    /// Multi-valued cell as trimmed, non-empty strings in source order.
    ///
    /// A cell that is not a list (a stray scalar, a null, an absent column)
    /// is treated as an empty sequence.
    fn list(&self, column: &str) -> Vec<String> {
        match self.extract(column) {
            Some(FieldValue::List(items)) => items
                .iter()
                .filter_map(|item| match item {
                    FieldValue::String(s) => Some(s.trim()),
                    _ => None,
                })
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Canonical natural key of the record, or `None` when the retention
    /// filter rejects it.
    ///
    /// * strings are trimmed; blank strings and `sentinels` are missing
    /// * integers are rendered in decimal
    /// * integral finite floats are rendered without a fractional part
    /// * everything else (NaN, booleans, lists, null) is missing
    fn natural_key(&self, column: &str, sentinels: &[String]) -> Option<String> {
        let key = match self.extract(column)? {
            FieldValue::String(s) => s.trim().to_string(),
            FieldValue::Int(i) => i.to_string(),
            FieldValue::Float(f) if f.is_finite() && f.fract() == 0.0 => format!("{:.0}", f),
            FieldValue::Float(f) if f.is_finite() => f.to_string(),
            _ => return None,
        };
        if key.is_empty() || sentinels.iter().any(|s| s == &key) {
            None
        } else {
            Some(key)
        }
    }
}

/// The default sentinel list as owned strings.
pub fn default_missing_key_sentinels() -> Vec<String> {
    DEFAULT_MISSING_KEY_SENTINELS.iter().map(|s| s.to_string()).collect()
}
