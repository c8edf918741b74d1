//! Junction tables linking products to dimension surrogate keys.

use std::collections::BTreeSet;

use indexmap::IndexSet;

use crate::extraction::Extractor;
use crate::normalize::decompose::RetentionFilter;
use crate::record::FlatTable;
use crate::tables::{Dimension, Junction, JunctionRow};

/// Build the junction table for `dimension`'s kind.
///
/// Only rows passing the retention filter contribute edges, so every
/// `product_code` in the result names a product row. Values repeated within a
/// cell, or across rows sharing a natural key, yield a single edge.
///
/// A value with no surrogate key means the dimension was not built from the
/// same table. That is a logic defect: debug builds panic, release builds log
/// it and drop the edge. The second return value counts such misses.
pub fn build_junction(
    table: &FlatTable,
    dimension: &Dimension,
    filter: &RetentionFilter,
) -> (Junction, usize) {
    let kind = dimension.kind();
    let mut edges = IndexSet::new();
    let mut misses = 0;

    for record in table.rows() {
        let Some(code) = filter.natural_key(record) else {
            continue;
        };

        let values: BTreeSet<String> = record.list(kind.source_column()).into_iter().collect();
        for value in values {
            match dimension.id_of(&value) {
                Some(id) => {
                    edges.insert(JunctionRow {
                        product_code: code.clone(),
                        dimension_id: id,
                    });
                }
                None => {
                    misses += 1;
                    tracing::error!(
                        "No {} id for value '{}' on product {}",
                        kind.name_column(),
                        value,
                        code
                    );
                    debug_assert!(
                        false,
                        "{} value '{}' missing from its dimension table",
                        kind, value
                    );
                }
            }
        }
    }

    let junction = Junction {
        kind,
        rows: edges.into_iter().collect(),
    };
    (junction, misses)
}
