//! The cleaned flat table handed to the normalizer.

use std::io::BufRead;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::entity::FieldValue;
use crate::error::PipelineError;
use crate::extraction::Extractor;

/// Source column names of the cleaned flat table.
pub mod columns {
    pub const CODE: &str = "code";
    pub const PRODUCT_NAME: &str = "product_name";
    pub const QUANTITY: &str = "quantity";
    pub const QUANTITY_NUMERIC: &str = "quantity_numeric";
    pub const QUANTITY_UNIT: &str = "quantity_unit";
    pub const IMAGE_URL: &str = "image_url";
    pub const INGREDIENTS_TEXT: &str = "ingredients_text";
    pub const ALLERGENS: &str = "allergens_en";
    pub const NUTRISCORE_SCORE: &str = "nutriscore_score";
    pub const NUTRISCORE_GRADE: &str = "nutriscore_grade";
    pub const NOVA_GROUP: &str = "nova_group";
    pub const PNNS_GROUPS_2: &str = "pnns_groups_2";

    pub const BRANDS: &str = "brands";
    pub const CATEGORIES: &str = "categories_en";
    pub const COUNTRIES: &str = "countries_en";
    pub const LABELS: &str = "labels_en";

    pub const ENERGY_KCAL: &str = "energy-kcal_100g";
    pub const FAT: &str = "fat_100g";
    pub const SATURATED_FAT: &str = "saturated-fat_100g";
    pub const CARBOHYDRATES: &str = "carbohydrates_100g";
    pub const SUGARS: &str = "sugars_100g";
    pub const FIBER: &str = "fiber_100g";
    pub const PROTEINS: &str = "proteins_100g";
    pub const SALT: &str = "salt_100g";
    pub const SODIUM: &str = "sodium_100g";

    /// Nutrient columns projected into the nutrition satellite, in storage order.
    pub const NUTRIENTS: &[&str] = &[
        ENERGY_KCAL,
        FAT,
        SATURATED_FAT,
        CARBOHYDRATES,
        SUGARS,
        FIBER,
        PROTEINS,
        SALT,
        SODIUM,
    ];

    /// Multi-valued columns, one per dimension kind.
    pub const MULTI_VALUED: &[&str] = &[BRANDS, CATEGORIES, COUNTRIES, LABELS];
}

/// One row of the cleaned flat table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatRecord {
    cells: IndexMap<String, FieldValue>,
}

impl FlatRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style cell setter.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(column, value);
        self
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<FieldValue>) {
        self.cells.insert(column.into(), value.into());
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl Extractor for FlatRecord {
    fn extract(&self, column: &str) -> Option<&FieldValue> {
        self.cells.get(column)
    }
}

impl FromIterator<(String, FieldValue)> for FlatRecord {
    fn from_iter<T: IntoIterator<Item = (String, FieldValue)>>(iter: T) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

/// The whole cleaned dataset, held in memory for a single pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatTable {
    rows: Vec<FlatRecord>,
}

impl FlatTable {
    pub fn new(rows: Vec<FlatRecord>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[FlatRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Load a cleaned table from newline-delimited JSON, one object per row.
    ///
    /// Blank lines are skipped. A line that is not a JSON object is an error
    /// carrying its 1-based line number.
    pub fn from_ndjson<R: BufRead>(reader: R) -> Result<Self, PipelineError> {
        let mut rows = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: FlatRecord = serde_json::from_str(&line).map_err(|source| {
                PipelineError::Record {
                    line: index + 1,
                    source,
                }
            })?;
            rows.push(record);
        }
        Ok(Self { rows })
    }
}

impl From<Vec<FlatRecord>> for FlatTable {
    fn from(rows: Vec<FlatRecord>) -> Self {
        Self::new(rows)
    }
}

impl FromIterator<FlatRecord> for FlatTable {
    fn from_iter<T: IntoIterator<Item = FlatRecord>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
