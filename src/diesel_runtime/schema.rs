// Relational schema of the normalized tables; kept in sync with bootstrap.rs.

diesel::table! {
    products (code) {
        code -> Text,
        product_name -> Nullable<Text>,
        quantity_numeric -> Nullable<Double>,
        quantity_unit -> Nullable<Text>,
        image_url -> Nullable<Text>,
        ingredients_text -> Nullable<Text>,
        nutriscore_score -> Nullable<Double>,
        nutriscore_grade -> Nullable<Text>,
        nova_group -> Nullable<Integer>,
        pnns_groups_2 -> Nullable<Text>,
    }
}

diesel::table! {
    brands (brand_id) {
        brand_id -> Integer,
        brand_name -> Text,
    }
}

diesel::table! {
    categories (category_id) {
        category_id -> Integer,
        category_name -> Text,
    }
}

diesel::table! {
    countries (country_id) {
        country_id -> Integer,
        country_name -> Text,
    }
}

diesel::table! {
    labels (label_id) {
        label_id -> Integer,
        label_name -> Text,
    }
}

diesel::table! {
    nutrition_facts (product_code) {
        product_code -> Text,
        energy_kcal_100g -> Nullable<Double>,
        fat_100g -> Nullable<Double>,
        saturated_fat_100g -> Nullable<Double>,
        carbohydrates_100g -> Nullable<Double>,
        sugars_100g -> Nullable<Double>,
        fiber_100g -> Nullable<Double>,
        proteins_100g -> Nullable<Double>,
        salt_100g -> Nullable<Double>,
        sodium_100g -> Nullable<Double>,
    }
}

diesel::table! {
    product_brands (product_code, brand_id) {
        product_code -> Text,
        brand_id -> Integer,
    }
}

diesel::table! {
    product_categories (product_code, category_id) {
        product_code -> Text,
        category_id -> Integer,
    }
}

diesel::table! {
    product_countries (product_code, country_id) {
        product_code -> Text,
        country_id -> Integer,
    }
}

diesel::table! {
    product_labels (product_code, label_id) {
        product_code -> Text,
        label_id -> Integer,
    }
}

diesel::joinable!(nutrition_facts -> products (product_code));
diesel::joinable!(product_brands -> products (product_code));
diesel::joinable!(product_brands -> brands (brand_id));
diesel::joinable!(product_categories -> products (product_code));
diesel::joinable!(product_categories -> categories (category_id));
diesel::joinable!(product_countries -> products (product_code));
diesel::joinable!(product_countries -> countries (country_id));
diesel::joinable!(product_labels -> products (product_code));
diesel::joinable!(product_labels -> labels (label_id));

diesel::allow_tables_to_appear_in_same_query!(
    products,
    brands,
    categories,
    countries,
    labels,
    nutrition_facts,
    product_brands,
    product_categories,
    product_countries,
    product_labels,
);
