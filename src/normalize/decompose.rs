//! Entity decomposition: the core product table and the dimension tables.

use std::collections::{BTreeSet, HashSet};

use crate::extraction::Extractor;
use crate::record::{columns, FlatTable};
use crate::tables::{Dimension, DimensionKind, Product, NOVA_GROUPS, NUTRISCORE_GRADES};

/// The retention rule shared by every normalization step: a row survives iff
/// its natural key canonicalizes to a non-missing string.
#[derive(Debug, Clone)]
pub struct RetentionFilter {
    sentinels: Vec<String>,
}

impl RetentionFilter {
    pub fn new(sentinels: Vec<String>) -> Self {
        Self { sentinels }
    }

    /// Canonical natural key of `record`, or `None` if the row is dropped.
    pub fn natural_key<E: Extractor>(&self, record: &E) -> Option<String> {
        record.natural_key(columns::CODE, &self.sentinels)
    }
}

/// Counters from product extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProductExtraction {
    /// Rows rejected by the retention filter.
    pub dropped: usize,
    /// Retained rows whose key was already taken by an earlier row.
    pub duplicate_keys: usize,
    /// Grade or processing-group cells outside their domain, stored as null.
    pub out_of_domain: usize,
}

/// Project the product-level columns of every retained row.
///
/// The first row carrying a given natural key wins; later rows with the same
/// key are counted and skipped so the table holds one row per key.
///
/// `nutriscore_grade` is lowercased and `nova_group` must be integral; values
/// outside the stored domains become null and are counted, so input that
/// skipped the field normalizer still satisfies the table constraints.
pub fn extract_products(
    table: &FlatTable,
    filter: &RetentionFilter,
) -> (Vec<Product>, ProductExtraction) {
    let mut products = Vec::with_capacity(table.len());
    let mut seen = HashSet::new();
    let mut counts = ProductExtraction::default();

    for record in table.rows() {
        let Some(code) = filter.natural_key(record) else {
            counts.dropped += 1;
            continue;
        };
        if !seen.insert(code.clone()) {
            counts.duplicate_keys += 1;
            continue;
        }

        products.push(Product {
            code,
            product_name: record.text(columns::PRODUCT_NAME),
            quantity_numeric: record.number(columns::QUANTITY_NUMERIC),
            quantity_unit: record.text(columns::QUANTITY_UNIT),
            image_url: record.text(columns::IMAGE_URL),
            ingredients_text: record.text(columns::INGREDIENTS_TEXT),
            nutriscore_score: record.number(columns::NUTRISCORE_SCORE),
            nutriscore_grade: nutriscore_grade(record, &mut counts.out_of_domain),
            nova_group: nova_group(record, &mut counts.out_of_domain),
            pnns_groups_2: record.text(columns::PNNS_GROUPS_2),
        });
    }

    (products, counts)
}

fn nutriscore_grade<E: Extractor>(record: &E, out_of_domain: &mut usize) -> Option<String> {
    let grade = record.text(columns::NUTRISCORE_GRADE)?.to_lowercase();
    if NUTRISCORE_GRADES.contains(&grade.as_str()) {
        Some(grade)
    } else {
        *out_of_domain += 1;
        None
    }
}

fn nova_group<E: Extractor>(record: &E, out_of_domain: &mut usize) -> Option<i32> {
    record.number(columns::NOVA_GROUP)?;
    match record.integer(columns::NOVA_GROUP) {
        Some(group) if NOVA_GROUPS.contains(&group) => Some(group),
        _ => {
            *out_of_domain += 1;
            None
        }
    }
}

/// Collect the distinct values of `kind`'s column across all rows and assign
/// surrogate keys in lexical order.
///
/// Rows are not passed through the retention filter first, so a value seen
/// only on a dropped row still receives a key (an orphan dimension row).
pub fn build_dimension(table: &FlatTable, kind: DimensionKind) -> Dimension {
    let values: BTreeSet<String> = table
        .rows()
        .iter()
        .flat_map(|record| record.list(kind.source_column()))
        .collect();

    Dimension::from_ordered_values(kind, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::FieldValue;
    use crate::extraction::default_missing_key_sentinels;
    use crate::record::FlatRecord;

    fn filter() -> RetentionFilter {
        RetentionFilter::new(default_missing_key_sentinels())
    }

    #[test]
    fn test_products_follow_retention_filter() {
        let table = FlatTable::new(vec![
            FlatRecord::new().with("code", "001").with("product_name", "Cola"),
            FlatRecord::new().with("code", "nan").with("product_name", "Mystery"),
            FlatRecord::new().with("product_name", "No code"),
            FlatRecord::new().with("code", FieldValue::Float(f64::NAN)),
        ]);

        let (products, counts) = extract_products(&table, &filter());

        assert_eq!(products.len(), 1);
        assert_eq!(products[0].code, "001");
        assert_eq!(products[0].product_name.as_deref(), Some("Cola"));
        assert_eq!(counts.dropped, 3);
    }

    #[test]
    fn test_duplicate_keys_keep_first_row() {
        let table = FlatTable::new(vec![
            FlatRecord::new().with("code", "001").with("product_name", "First"),
            FlatRecord::new().with("code", " 001").with("product_name", "Second"),
        ]);

        let (products, counts) = extract_products(&table, &filter());

        assert_eq!(products.len(), 1);
        assert_eq!(products[0].product_name.as_deref(), Some("First"));
        assert_eq!(counts.duplicate_keys, 1);
    }

    #[test]
    fn test_product_columns_are_typed() {
        let table = FlatTable::new(vec![FlatRecord::new()
            .with("code", "002")
            .with("quantity_numeric", 330.0)
            .with("quantity_unit", "ml")
            .with("nutriscore_score", "14")
            .with("nutriscore_grade", "e")
            .with("nova_group", FieldValue::Float(4.0))
            .with("pnns_groups_2", "Sweetened beverages")]);

        let (products, _) = extract_products(&table, &filter());
        let product = &products[0];

        assert_eq!(product.quantity_numeric, Some(330.0));
        assert_eq!(product.quantity_unit.as_deref(), Some("ml"));
        assert_eq!(product.nutriscore_score, Some(14.0));
        assert_eq!(product.nutriscore_grade.as_deref(), Some("e"));
        assert_eq!(product.nova_group, Some(4));
        assert_eq!(product.image_url, None);
    }

    #[test]
    fn test_out_of_domain_grade_and_group_are_nulled() {
        let table = FlatTable::new(vec![
            FlatRecord::new().with("code", "001").with("nova_group", 7i64),
            FlatRecord::new().with("code", "002").with("nutriscore_grade", " E "),
            FlatRecord::new()
                .with("code", "003")
                .with("nutriscore_grade", "z")
                .with("nova_group", 2.5),
            FlatRecord::new().with("code", "004").with("nova_group", "not a number"),
        ]);

        let (products, counts) = extract_products(&table, &filter());

        assert_eq!(products[0].nova_group, None);
        assert_eq!(products[1].nutriscore_grade.as_deref(), Some("e"));
        assert_eq!(products[2].nutriscore_grade, None);
        assert_eq!(products[2].nova_group, None);
        assert_eq!(products[3].nova_group, None);
        assert_eq!(counts.out_of_domain, 3);
    }

    #[test]
    fn test_dimension_is_sorted_union_of_trimmed_values() {
        let table = FlatTable::new(vec![
            FlatRecord::new()
                .with("code", "001")
                .with("brands", FieldValue::list_of([" Zest", "Acme"])),
            FlatRecord::new()
                .with("code", "nan")
                .with("brands", FieldValue::list_of(["Orphan", "Acme "])),
            FlatRecord::new().with("code", "003").with("brands", "not a list"),
        ]);

        let brands = build_dimension(&table, DimensionKind::Brand);

        let rows: Vec<(i32, &str)> = brands.rows().collect();
        assert_eq!(rows, vec![(1, "Acme"), (2, "Orphan"), (3, "Zest")]);
    }
}
