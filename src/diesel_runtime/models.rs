//! Insertable Diesel models borrowing from the normalized tables.

use diesel::prelude::*;

use super::schema::*;
use crate::tables::{JunctionRow, NutritionFacts, Product};

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = products)]
#[diesel(treat_none_as_default_value = false)]
pub struct NewProduct<'a> {
    pub code: &'a str,
    pub product_name: Option<&'a str>,
    pub quantity_numeric: Option<f64>,
    pub quantity_unit: Option<&'a str>,
    pub image_url: Option<&'a str>,
    pub ingredients_text: Option<&'a str>,
    pub nutriscore_score: Option<f64>,
    pub nutriscore_grade: Option<&'a str>,
    pub nova_group: Option<i32>,
    pub pnns_groups_2: Option<&'a str>,
}

impl<'a> From<&'a Product> for NewProduct<'a> {
    fn from(p: &'a Product) -> Self {
        NewProduct {
            code: &p.code,
            product_name: p.product_name.as_deref(),
            quantity_numeric: p.quantity_numeric,
            quantity_unit: p.quantity_unit.as_deref(),
            image_url: p.image_url.as_deref(),
            ingredients_text: p.ingredients_text.as_deref(),
            nutriscore_score: p.nutriscore_score,
            nutriscore_grade: p.nutriscore_grade.as_deref(),
            nova_group: p.nova_group,
            pnns_groups_2: p.pnns_groups_2.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = nutrition_facts)]
#[diesel(treat_none_as_default_value = false)]
pub struct NewNutritionFacts<'a> {
    pub product_code: &'a str,
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

impl<'a> From<&'a NutritionFacts> for NewNutritionFacts<'a> {
    fn from(n: &'a NutritionFacts) -> Self {
        NewNutritionFacts {
            product_code: &n.product_code,
            energy_kcal_100g: n.energy_kcal_100g,
            fat_100g: n.fat_100g,
            saturated_fat_100g: n.saturated_fat_100g,
            carbohydrates_100g: n.carbohydrates_100g,
            sugars_100g: n.sugars_100g,
            fiber_100g: n.fiber_100g,
            proteins_100g: n.proteins_100g,
            salt_100g: n.salt_100g,
            sodium_100g: n.sodium_100g,
        }
    }
}

/// Declares the insertable row of a dimension table and of its junction table.
macro_rules! dimension_models {
    ($row:ident, $dim_table:ident, $id:ident, $name:ident, $edge:ident, $edge_table:ident) => {
        #[derive(Debug, Clone, Insertable)]
        #[diesel(table_name = $dim_table)]
        pub struct $row<'a> {
            pub $id: i32,
            pub $name: &'a str,
        }

        impl<'a> From<(i32, &'a str)> for $row<'a> {
            fn from((id, name): (i32, &'a str)) -> Self {
                $row { $id: id, $name: name }
            }
        }

        #[derive(Debug, Clone, Insertable)]
        #[diesel(table_name = $edge_table)]
        pub struct $edge<'a> {
            pub product_code: &'a str,
            pub $id: i32,
        }

        impl<'a> From<&'a JunctionRow> for $edge<'a> {
            fn from(row: &'a JunctionRow) -> Self {
                $edge {
                    product_code: &row.product_code,
                    $id: row.dimension_id,
                }
            }
        }
    };
}

dimension_models!(NewBrand, brands, brand_id, brand_name, NewProductBrand, product_brands);
dimension_models!(NewCategory, categories, category_id, category_name, NewProductCategory, product_categories);
dimension_models!(NewCountry, countries, country_id, country_name, NewProductCountry, product_countries);
dimension_models!(NewLabel, labels, label_id, label_name, NewProductLabel, product_labels);
