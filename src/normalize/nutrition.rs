//! The one-to-one nutrition satellite.

use std::collections::HashSet;

use crate::extraction::Extractor;
use crate::normalize::decompose::RetentionFilter;
use crate::record::{columns, FlatTable};
use crate::tables::NutritionFacts;

/// Project the nutrient columns of every retained row, keyed by
/// `product_code`.
///
/// A row is produced even when every nutrient is missing. Unparseable
/// nutrient cells become `None`. Duplicate keys keep the first row, matching
/// the product table.
pub fn extract_nutrition(table: &FlatTable, filter: &RetentionFilter) -> Vec<NutritionFacts> {
    let mut facts = Vec::with_capacity(table.len());
    let mut seen = HashSet::new();

    for record in table.rows() {
        let Some(product_code) = filter.natural_key(record) else {
            continue;
        };
        if !seen.insert(product_code.clone()) {
            continue;
        }

        facts.push(NutritionFacts {
            product_code,
            energy_kcal_100g: record.number(columns::ENERGY_KCAL),
            fat_100g: record.number(columns::FAT),
            saturated_fat_100g: record.number(columns::SATURATED_FAT),
            carbohydrates_100g: record.number(columns::CARBOHYDRATES),
            sugars_100g: record.number(columns::SUGARS),
            fiber_100g: record.number(columns::FIBER),
            proteins_100g: record.number(columns::PROTEINS),
            salt_100g: record.number(columns::SALT),
            sodium_100g: record.number(columns::SODIUM),
        });
    }

    facts
}
