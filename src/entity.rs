//! Core cell and row abstractions shared by every pipeline stage.
//!
//! A flat source record is a bag of [`FieldValue`] cells keyed by column name.
//! Product-keyed normalized rows implement [`Entity`] for export.

use serde::{Serialize, Deserialize};
use std::fmt;

use crate::tables::TableName;

/// Represents different types of cell values in a flat record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<FieldValue>),
    Null,
}

impl FieldValue {
    /// True for `Null` and for floating point NaN, the two shapes a missing
    /// cell takes in an exported data frame.
    pub fn is_missing(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// Build a list cell from plain strings.
    pub fn list_of<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldValue::List(items.into_iter().map(|s| FieldValue::String(s.into())).collect())
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(fl) => write!(f, "{}", fl),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::List(l) => write!(f, "{:?}", l),
            FieldValue::Null => write!(f, "null"),
        }
    }
}

/// A normalized row that belongs to exactly one product.
///
/// Rows are exported with their storage column names, so the serialized
/// form doubles as the relation's file layout.
pub trait Entity: Serialize {
    /// Relation the row is stored in
    const TABLE: TableName;

    /// Natural key of the product the row describes
    fn product_code(&self) -> &str;

    /// Convert entity to NDJSON line (newline-delimited JSON)
    fn to_ndjson_line(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(format!("{}\n", json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Sample {
        product_code: String,
        score: Option<f64>,
    }

    impl Entity for Sample {
        const TABLE: TableName = TableName::Products;

        fn product_code(&self) -> &str {
            &self.product_code
        }
    }

    #[test]
    fn test_ndjson_line_keeps_nulls() {
        let row = Sample {
            product_code: "001".to_string(),
            score: None,
        };

        let line = row.to_ndjson_line().unwrap();
        assert_eq!(line, "{\"product_code\":\"001\",\"score\":null}\n");
        assert_eq!(row.product_code(), "001");
    }

    #[test]
    fn test_missing_values() {
        assert!(FieldValue::Null.is_missing());
        assert!(FieldValue::Float(f64::NAN).is_missing());
        assert!(!FieldValue::Float(0.0).is_missing());
        assert!(!FieldValue::String("nan".to_string()).is_missing());
    }

    #[test]
    fn test_untagged_deserialize() {
        let cell: FieldValue = serde_json::from_str("[\"Acme\", \"Bolt\"]").unwrap();
        assert_eq!(cell, FieldValue::list_of(["Acme", "Bolt"]));

        let cell: FieldValue = serde_json::from_str("null").unwrap();
        assert_eq!(cell, FieldValue::Null);

        let cell: FieldValue = serde_json::from_str("3.5").unwrap();
        assert_eq!(cell, FieldValue::Float(3.5));
    }
}
