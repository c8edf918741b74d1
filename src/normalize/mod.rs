//! Third-normal-form decomposition of the cleaned flat table.
//!
//! One in-memory pass produces every relation before anything is written:
//!
//! 1. [`decompose`]: the `products` table (retention filter applied) and the
//!    four dimension tables with lexically assigned surrogate keys.
//! 2. [`relationships`]: one junction table per dimension.
//! 3. [`nutrition`]: the one-to-one `nutrition_facts` satellite.
//!
//! Each step borrows the flat table read-only and returns owned tables.

pub mod decompose;
pub mod nutrition;
pub mod relationships;

use indexmap::IndexMap;
use serde::Serialize;

use crate::config::NormalizeConfig;
use crate::entity::Entity;
use crate::record::FlatTable;
use crate::tables::{
    Dimension, DimensionKind, Junction, NutritionFacts, Product, TableBatch, TableName,
};

pub use decompose::{build_dimension, extract_products, RetentionFilter};
pub use nutrition::extract_nutrition;
pub use relationships::build_junction;

/// Aggregate counters of a normalization pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeStats {
    pub input_rows: usize,
    pub products: usize,
    pub dropped_rows: usize,
    pub duplicate_keys: usize,
    pub out_of_domain_values: usize,
    pub nutrition_rows: usize,
    pub dimension_values: IndexMap<DimensionKind, usize>,
    pub junction_rows: IndexMap<DimensionKind, usize>,
    pub mapping_misses: usize,
}

/// Every relation produced by [`normalize`].
#[derive(Debug, Clone)]
pub struct NormalizedTables {
    pub products: Vec<Product>,
    pub dimensions: Vec<Dimension>,
    pub junctions: Vec<Junction>,
    pub nutrition_facts: Vec<NutritionFacts>,
    pub stats: NormalizeStats,
}

impl NormalizedTables {
    pub fn dimension(&self, kind: DimensionKind) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.kind() == kind)
    }

    pub fn junction(&self, kind: DimensionKind) -> Option<&Junction> {
        self.junctions.iter().find(|j| j.kind == kind)
    }

    /// Borrowed view of one relation.
    pub fn batch(&self, table: TableName) -> Option<TableBatch<'_>> {
        let batch = match table {
            TableName::Products => TableBatch::Products(&self.products),
            TableName::NutritionFacts => TableBatch::NutritionFacts(&self.nutrition_facts),
            TableName::Brands => TableBatch::Dimension(self.dimension(DimensionKind::Brand)?),
            TableName::Categories => {
                TableBatch::Dimension(self.dimension(DimensionKind::Category)?)
            }
            TableName::Countries => TableBatch::Dimension(self.dimension(DimensionKind::Country)?),
            TableName::Labels => TableBatch::Dimension(self.dimension(DimensionKind::Label)?),
            TableName::ProductBrands => TableBatch::Junction(self.junction(DimensionKind::Brand)?),
            TableName::ProductCategories => {
                TableBatch::Junction(self.junction(DimensionKind::Category)?)
            }
            TableName::ProductCountries => {
                TableBatch::Junction(self.junction(DimensionKind::Country)?)
            }
            TableName::ProductLabels => TableBatch::Junction(self.junction(DimensionKind::Label)?),
        };
        Some(batch)
    }

    /// Row count of one relation.
    pub fn row_count(&self, table: TableName) -> usize {
        self.batch(table).map(|b| b.len()).unwrap_or(0)
    }
}

/// Decompose `table` into the ten relations.
///
/// # Arguments
/// * `table` - Cleaned flat table; absent columns read as missing everywhere
/// * `config` - Retention filter settings
///
/// # Returns
/// Owned tables plus counters; this step never fails.
///
/// # Example
/// ```
/// use foodfacts::{normalize, FieldValue, FlatRecord, FlatTable, NormalizeConfig};
///
/// let table = FlatTable::new(vec![FlatRecord::new()
///     .with("code", "001")
///     .with("brands", FieldValue::list_of(["Acme", "Acme"]))]);
///
/// let tables = normalize(&table, &NormalizeConfig::default());
/// assert_eq!(tables.products.len(), 1);
/// assert_eq!(tables.stats.junction_rows[&foodfacts::DimensionKind::Brand], 1);
/// ```
pub fn normalize(table: &FlatTable, config: &NormalizeConfig) -> NormalizedTables {
    let filter = RetentionFilter::new(config.missing_key_sentinels.clone());
    let mut stats = NormalizeStats {
        input_rows: table.len(),
        ..Default::default()
    };

    let (products, extraction) = extract_products(table, &filter);
    stats.products = products.len();
    stats.dropped_rows = extraction.dropped;
    stats.duplicate_keys = extraction.duplicate_keys;
    stats.out_of_domain_values = extraction.out_of_domain;
    tracing::info!("Created 'products' table: {} rows", products.len());
    if extraction.dropped > 0 {
        tracing::warn!(
            "Dropped {} of {} rows without a valid product code",
            extraction.dropped,
            table.len()
        );
    }
    if extraction.duplicate_keys > 0 {
        tracing::warn!(
            "Skipped {} rows repeating an earlier product code",
            extraction.duplicate_keys
        );
    }

    if extraction.out_of_domain > 0 {
        tracing::warn!(
            "Nulled {} grade or processing-group values outside their domain",
            extraction.out_of_domain
        );
    }

    let mut dimensions = Vec::with_capacity(DimensionKind::ALL.len());
    let mut junctions = Vec::with_capacity(DimensionKind::ALL.len());
    for kind in DimensionKind::ALL {
        let dimension = build_dimension(table, kind);
        tracing::info!("Created '{}' table: {} unique values", kind, dimension.len());

        let (junction, misses) = build_junction(table, &dimension, &filter);
        tracing::info!(
            "Created '{}' junction table: {} relationships",
            kind.junction_table(),
            junction.len()
        );

        stats.dimension_values.insert(kind, dimension.len());
        stats.junction_rows.insert(kind, junction.len());
        stats.mapping_misses += misses;
        dimensions.push(dimension);
        junctions.push(junction);
    }

    let nutrition_facts = extract_nutrition(table, &filter);
    stats.nutrition_rows = nutrition_facts.len();
    tracing::info!("Created 'nutrition_facts' table: {} rows", nutrition_facts.len());
    debug_assert!(
        nutrition_facts
            .iter()
            .map(Entity::product_code)
            .eq(products.iter().map(Entity::product_code)),
        "nutrition_facts must pair one-to-one with products"
    );

    NormalizedTables {
        products,
        dimensions,
        junctions,
        nutrition_facts,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::FieldValue;
    use crate::record::FlatRecord;

    fn sample() -> FlatTable {
        FlatTable::new(vec![
            FlatRecord::new()
                .with("code", "001")
                .with("brands", FieldValue::list_of(["Acme"]))
                .with("categories_en", FieldValue::list_of(["Sodas", "Beverages"])),
            FlatRecord::new()
                .with("code", "nan")
                .with("brands", FieldValue::list_of(["X"])),
            FlatRecord::new()
                .with("code", "002")
                .with("labels_en", FieldValue::list_of(["Organic"])),
        ])
    }

    #[test]
    fn test_normalize_counts() {
        let tables = normalize(&sample(), &NormalizeConfig::default());

        assert_eq!(tables.stats.input_rows, 3);
        assert_eq!(tables.stats.products, 2);
        assert_eq!(tables.stats.dropped_rows, 1);
        assert_eq!(tables.stats.nutrition_rows, 2);
        assert_eq!(tables.stats.dimension_values[&DimensionKind::Brand], 2);
        assert_eq!(tables.stats.junction_rows[&DimensionKind::Brand], 1);
        assert_eq!(tables.stats.junction_rows[&DimensionKind::Category], 2);
        assert_eq!(tables.stats.junction_rows[&DimensionKind::Country], 0);
        assert_eq!(tables.stats.mapping_misses, 0);
    }

    #[test]
    fn test_every_table_has_a_batch() {
        let tables = normalize(&sample(), &NormalizeConfig::default());

        for table in TableName::ALL {
            let batch = tables.batch(table).unwrap();
            assert_eq!(batch.table(), table);
        }
        assert_eq!(tables.row_count(TableName::Categories), 2);
        assert_eq!(tables.row_count(TableName::ProductLabels), 1);
    }

    #[test]
    fn test_custom_sentinels() {
        let table = FlatTable::new(vec![
            FlatRecord::new().with("code", "000"),
            FlatRecord::new().with("code", "nan"),
        ]);
        let config = NormalizeConfig {
            missing_key_sentinels: vec!["000".to_string()],
        };

        let tables = normalize(&table, &config);

        let codes: Vec<&str> = tables.products.iter().map(|p| p.code.as_str()).collect();
        assert_eq!(codes, vec!["nan"]);
    }
}
