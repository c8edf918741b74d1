//! The ten normalized relations and their row types.
//!
//! Every table is an owned value produced once by the normalizer and only
//! read afterwards; sinks receive borrowed [`TableBatch`] views.

use std::fmt;
use std::ops::RangeInclusive;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::record::columns;

/// Nutrition grades accepted by `products.nutriscore_grade`, lowercase.
pub const NUTRISCORE_GRADES: &[&str] = &["a", "b", "c", "d", "e"];

/// Processing classifications accepted by `products.nova_group`.
pub const NOVA_GROUPS: RangeInclusive<i32> = 1..=4;

/// Names of the persisted relations, declared in load order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableName {
    Products,
    Brands,
    Categories,
    Countries,
    Labels,
    NutritionFacts,
    ProductBrands,
    ProductCategories,
    ProductCountries,
    ProductLabels,
}

impl TableName {
    pub const ALL: [TableName; 10] = [
        TableName::Products,
        TableName::Brands,
        TableName::Categories,
        TableName::Countries,
        TableName::Labels,
        TableName::NutritionFacts,
        TableName::ProductBrands,
        TableName::ProductCategories,
        TableName::ProductCountries,
        TableName::ProductLabels,
    ];

    /// Storage name of the relation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TableName::Products => "products",
            TableName::Brands => "brands",
            TableName::Categories => "categories",
            TableName::Countries => "countries",
            TableName::Labels => "labels",
            TableName::NutritionFacts => "nutrition_facts",
            TableName::ProductBrands => "product_brands",
            TableName::ProductCategories => "product_categories",
            TableName::ProductCountries => "product_countries",
            TableName::ProductLabels => "product_labels",
        }
    }

    /// Relations this one holds foreign keys into.
    pub fn depends_on(&self) -> &'static [TableName] {
        match self {
            TableName::Products
            | TableName::Brands
            | TableName::Categories
            | TableName::Countries
            | TableName::Labels => &[],
            TableName::NutritionFacts => &[TableName::Products],
            TableName::ProductBrands => &[TableName::Products, TableName::Brands],
            TableName::ProductCategories => &[TableName::Products, TableName::Categories],
            TableName::ProductCountries => &[TableName::Products, TableName::Countries],
            TableName::ProductLabels => &[TableName::Products, TableName::Labels],
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four structurally identical many-to-many dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionKind {
    Brand,
    Category,
    Country,
    Label,
}

impl DimensionKind {
    pub const ALL: [DimensionKind; 4] = [
        DimensionKind::Brand,
        DimensionKind::Category,
        DimensionKind::Country,
        DimensionKind::Label,
    ];

    /// Multi-valued column of the flat table feeding this dimension.
    pub fn source_column(&self) -> &'static str {
        match self {
            DimensionKind::Brand => columns::BRANDS,
            DimensionKind::Category => columns::CATEGORIES,
            DimensionKind::Country => columns::COUNTRIES,
            DimensionKind::Label => columns::LABELS,
        }
    }

    pub fn table(&self) -> TableName {
        match self {
            DimensionKind::Brand => TableName::Brands,
            DimensionKind::Category => TableName::Categories,
            DimensionKind::Country => TableName::Countries,
            DimensionKind::Label => TableName::Labels,
        }
    }

    pub fn junction_table(&self) -> TableName {
        match self {
            DimensionKind::Brand => TableName::ProductBrands,
            DimensionKind::Category => TableName::ProductCategories,
            DimensionKind::Country => TableName::ProductCountries,
            DimensionKind::Label => TableName::ProductLabels,
        }
    }

    /// Surrogate key column, shared by the dimension and its junction.
    pub fn id_column(&self) -> &'static str {
        match self {
            DimensionKind::Brand => "brand_id",
            DimensionKind::Category => "category_id",
            DimensionKind::Country => "country_id",
            DimensionKind::Label => "label_id",
        }
    }

    pub fn name_column(&self) -> &'static str {
        match self {
            DimensionKind::Brand => "brand_name",
            DimensionKind::Category => "category_name",
            DimensionKind::Country => "country_name",
            DimensionKind::Label => "label_name",
        }
    }
}

impl fmt::Display for DimensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table().as_str())
    }
}

/// Core entity row, one per retained natural key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub code: String,
    pub product_name: Option<String>,
    pub quantity_numeric: Option<f64>,
    pub quantity_unit: Option<String>,
    pub image_url: Option<String>,
    pub ingredients_text: Option<String>,
    pub nutriscore_score: Option<f64>,
    pub nutriscore_grade: Option<String>,
    pub nova_group: Option<i32>,
    pub pnns_groups_2: Option<String>,
}

impl Entity for Product {
    const TABLE: TableName = TableName::Products;

    fn product_code(&self) -> &str {
        &self.code
    }
}

/// One-to-one nutrition satellite, keyed by the product's natural key.
///
/// Field names are the storage names (`energy-kcal_100g` is stored as
/// `energy_kcal_100g`, `saturated-fat_100g` as `saturated_fat_100g`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionFacts {
    pub product_code: String,
    pub energy_kcal_100g: Option<f64>,
    pub fat_100g: Option<f64>,
    pub saturated_fat_100g: Option<f64>,
    pub carbohydrates_100g: Option<f64>,
    pub sugars_100g: Option<f64>,
    pub fiber_100g: Option<f64>,
    pub proteins_100g: Option<f64>,
    pub salt_100g: Option<f64>,
    pub sodium_100g: Option<f64>,
}

impl Entity for NutritionFacts {
    const TABLE: TableName = TableName::NutritionFacts;

    fn product_code(&self) -> &str {
        &self.product_code
    }
}

/// Distinct values of one dimension with their surrogate keys.
///
/// Iteration order is key order: ids are dense, start at 1 and follow the
/// map's insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct Dimension {
    kind: DimensionKind,
    ids: IndexMap<String, i32>,
}

impl Dimension {
    /// Assign ids 1..=n to `values` in the order given. Duplicates keep
    /// their first id.
    pub fn from_ordered_values<I>(kind: DimensionKind, values: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut ids = IndexMap::new();
        for value in values {
            let next = ids.len() as i32 + 1;
            ids.entry(value).or_insert(next);
        }
        Self { kind, ids }
    }

    pub fn kind(&self) -> DimensionKind {
        self.kind
    }

    pub fn id_of(&self, value: &str) -> Option<i32> {
        self.ids.get(value).copied()
    }

    /// `(surrogate_key, value)` pairs in key order.
    pub fn rows(&self) -> impl Iterator<Item = (i32, &str)> + '_ {
        self.ids.iter().map(|(value, id)| (*id, value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// One many-to-many edge between a product and a dimension value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JunctionRow {
    pub product_code: String,
    pub dimension_id: i32,
}

/// Junction table of one dimension kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Junction {
    pub kind: DimensionKind,
    pub rows: Vec<JunctionRow>,
}

impl Junction {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Borrowed view of one relation, handed to a sink.
#[derive(Debug, Clone, Copy)]
pub enum TableBatch<'a> {
    Products(&'a [Product]),
    Dimension(&'a Dimension),
    NutritionFacts(&'a [NutritionFacts]),
    Junction(&'a Junction),
}

impl<'a> TableBatch<'a> {
    pub fn table(&self) -> TableName {
        match self {
            TableBatch::Products(_) => TableName::Products,
            TableBatch::Dimension(dimension) => dimension.kind().table(),
            TableBatch::NutritionFacts(_) => TableName::NutritionFacts,
            TableBatch::Junction(junction) => junction.kind.junction_table(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            TableBatch::Products(rows) => rows.len(),
            TableBatch::Dimension(dimension) => dimension.len(),
            TableBatch::NutritionFacts(rows) => rows.len(),
            TableBatch::Junction(junction) => junction.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_kinds_wire_to_tables() {
        assert_eq!(DimensionKind::Category.source_column(), "categories_en");
        assert_eq!(DimensionKind::Category.table(), TableName::Categories);
        assert_eq!(DimensionKind::Category.junction_table(), TableName::ProductCategories);
        assert_eq!(
            TableName::ProductCategories.depends_on(),
            &[TableName::Products, TableName::Categories]
        );
    }

    #[test]
    fn test_dimension_ids_are_dense() {
        let dimension = Dimension::from_ordered_values(
            DimensionKind::Brand,
            ["Acme", "Bolt", "Acme", "Cask"].map(String::from),
        );

        assert_eq!(dimension.len(), 3);
        assert_eq!(dimension.id_of("Acme"), Some(1));
        assert_eq!(dimension.id_of("Cask"), Some(3));
        assert_eq!(dimension.id_of("Zed"), None);
        let ids: Vec<i32> = dimension.rows().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
