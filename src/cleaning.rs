//! Field normalizer: raw CSV export rows to the cleaned flat table.
//!
//! All transforms here are per-cell. A cell that can't be cleaned becomes
//! missing and is counted in [`CleaningStats`]; nothing in this module drops
//! a row.

use std::collections::HashSet;
use std::io::Read;

use regex::Regex;
use serde::Serialize;

use crate::config::CleaningConfig;
use crate::entity::FieldValue;
use crate::error::PipelineError;
use crate::record::{columns, FlatRecord, FlatTable};
use crate::tables::{NOVA_GROUPS, NUTRISCORE_GRADES};

/// Single-valued text columns that are trimmed.
const TEXT_COLUMNS: &[&str] = &[
    columns::PRODUCT_NAME,
    columns::IMAGE_URL,
    columns::PNNS_GROUPS_2,
    columns::NUTRISCORE_GRADE,
    columns::INGREDIENTS_TEXT,
];

/// Columns dropped from the cleaned table.
const DROPPED_COLUMNS: &[&str] = &[columns::ALLERGENS];

/// Leading magnitude and unit of a free-text quantity such as "330 ml".
const QUANTITY_PATTERN: &str = r"(\d+\.?\d*)\s*([a-zA-Z]+)";

/// Counters from a cleaning pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleaningStats {
    pub rows: usize,
    pub placeholder_cells: usize,
    pub unparseable_numbers: usize,
    pub negative_values: usize,
    pub out_of_domain_values: usize,
}

impl CleaningStats {
    fn absorb(&mut self, other: CleaningStats) {
        self.rows += other.rows;
        self.placeholder_cells += other.placeholder_cells;
        self.unparseable_numbers += other.unparseable_numbers;
        self.negative_values += other.negative_values;
        self.out_of_domain_values += other.out_of_domain_values;
    }
}

/// Cleans raw export rows into [`FlatRecord`]s.
#[derive(Debug, Clone)]
pub struct FieldNormalizer {
    placeholders: HashSet<String>,
    quantity: Regex,
}

impl FieldNormalizer {
    pub fn new(config: &CleaningConfig) -> Result<Self, PipelineError> {
        Ok(Self {
            placeholders: config.placeholders.iter().map(|p| p.trim().to_string()).collect(),
            quantity: Regex::new(QUANTITY_PATTERN)?,
        })
    }

    /// Clean one raw row given as `(column, text)` pairs.
    pub fn clean_record<'a, I>(&self, raw: I) -> (FlatRecord, CleaningStats)
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut stats = CleaningStats {
            rows: 1,
            ..Default::default()
        };
        let mut record = FlatRecord::new();

        for (column, text) in raw {
            if DROPPED_COLUMNS.contains(&column) {
                continue;
            }

            let trimmed = text.trim();
            let value = if self.placeholders.contains(trimmed) {
                if !trimmed.is_empty() {
                    stats.placeholder_cells += 1;
                }
                None
            } else {
                Some(trimmed)
            };

            match column {
                columns::QUANTITY => {
                    let (magnitude, unit) = self.split_quantity(value);
                    record.set(columns::QUANTITY_NUMERIC, magnitude);
                    record.set(columns::QUANTITY_UNIT, unit);
                }
                c if columns::MULTI_VALUED.contains(&c) => {
                    record.set(c, split_multi_valued(value));
                }
                c if c == columns::NUTRISCORE_SCORE || columns::NUTRIENTS.contains(&c) => {
                    record.set(c, clean_number(value, &mut stats));
                }
                columns::NOVA_GROUP => {
                    let group = clean_number(value, &mut stats).and_then(|n| {
                        if n.fract() == 0.0 && NOVA_GROUPS.contains(&(n as i32)) {
                            Some(n as i64)
                        } else {
                            stats.out_of_domain_values += 1;
                            None
                        }
                    });
                    record.set(column, group);
                }
                columns::NUTRISCORE_GRADE => {
                    let grade = clean_text(value).map(|g| g.to_lowercase()).and_then(|g| {
                        if NUTRISCORE_GRADES.contains(&g.as_str()) {
                            Some(g)
                        } else {
                            stats.out_of_domain_values += 1;
                            None
                        }
                    });
                    record.set(column, grade);
                }
                c if TEXT_COLUMNS.contains(&c) => {
                    record.set(c, clean_text(value).map(str::to_string));
                }
                // The code is kept as text; retention is the normalizer's call
                c => {
                    record.set(c, value.map(str::to_string));
                }
            }
        }

        (record, stats)
    }

    /// Clean every row of a headed CSV export.
    ///
    /// # Errors
    /// Malformed CSV (ragged rows, invalid UTF-8, I/O) aborts the pass.
    pub fn clean_csv<R: Read>(&self, reader: R) -> Result<(FlatTable, CleaningStats), PipelineError> {
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers = reader.headers()?.clone();

        let mut rows = Vec::new();
        let mut stats = CleaningStats::default();
        for result in reader.records() {
            let raw = result?;
            let (record, row_stats) = self.clean_record(headers.iter().zip(raw.iter()));
            stats.absorb(row_stats);
            rows.push(record);
        }

        tracing::info!(
            "Cleaned {} rows ({} placeholders, {} unparseable numbers, {} negative values nulled)",
            stats.rows,
            stats.placeholder_cells,
            stats.unparseable_numbers,
            stats.negative_values
        );
        Ok((FlatTable::new(rows), stats))
    }

    fn split_quantity(&self, value: Option<&str>) -> (Option<f64>, Option<String>) {
        let Some(captures) = value.and_then(|v| self.quantity.captures(v)) else {
            return (None, None);
        };
        let magnitude = captures.get(1).and_then(|m| m.as_str().parse::<f64>().ok());
        let unit = captures.get(2).map(|m| m.as_str().trim().to_string());
        (magnitude, unit)
    }
}

/// Trimmed text, with the literal `nan` of a stringified null treated as missing.
fn clean_text(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty() && *v != "nan")
}

/// Split a comma-separated cell into a list of trimmed, non-empty items.
fn split_multi_valued(value: Option<&str>) -> FieldValue {
    let items = value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty() && *item != "nan")
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    FieldValue::list_of(items)
}

/// Parse, round to 3 decimals, and null out negatives.
fn clean_number(value: Option<&str>, stats: &mut CleaningStats) -> Option<f64> {
    let text = value?;
    let Some(n) = text.parse::<f64>().ok().filter(|n| n.is_finite()) else {
        if text != "nan" {
            stats.unparseable_numbers += 1;
        }
        return None;
    };
    if n < 0.0 {
        stats.negative_values += 1;
        return None;
    }
    Some((n * 1000.0).round() / 1000.0)
}
