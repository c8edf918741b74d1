//! Idempotent DDL for the normalized schema.
//!
//! The statements stick to types both backends accept: `DOUBLE PRECISION`
//! gets REAL affinity on SQLite.

use diesel::prelude::*;

use super::database::DbConnection;

/// `CREATE TABLE` statements in foreign-key order.
pub const CREATE_TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS products (
        code TEXT PRIMARY KEY,
        product_name TEXT,
        quantity_numeric DOUBLE PRECISION,
        quantity_unit TEXT,
        image_url TEXT,
        ingredients_text TEXT,
        nutriscore_score DOUBLE PRECISION,
        nutriscore_grade TEXT CHECK (nutriscore_grade IN ('a', 'b', 'c', 'd', 'e')),
        nova_group INTEGER CHECK (nova_group BETWEEN 1 AND 4),
        pnns_groups_2 TEXT
    )"#,
    r#"
    CREATE TABLE IF NOT EXISTS brands (
        brand_id INTEGER PRIMARY KEY,
        brand_name TEXT NOT NULL UNIQUE
    )"#,
    r#"
    CREATE TABLE IF NOT EXISTS categories (
        category_id INTEGER PRIMARY KEY,
        category_name TEXT NOT NULL UNIQUE
    )"#,
    r#"
    CREATE TABLE IF NOT EXISTS countries (
        country_id INTEGER PRIMARY KEY,
        country_name TEXT NOT NULL UNIQUE
    )"#,
    r#"
    CREATE TABLE IF NOT EXISTS labels (
        label_id INTEGER PRIMARY KEY,
        label_name TEXT NOT NULL UNIQUE
    )"#,
    r#"
    CREATE TABLE IF NOT EXISTS nutrition_facts (
        product_code TEXT PRIMARY KEY REFERENCES products (code),
        energy_kcal_100g DOUBLE PRECISION,
        fat_100g DOUBLE PRECISION,
        saturated_fat_100g DOUBLE PRECISION,
        carbohydrates_100g DOUBLE PRECISION,
        sugars_100g DOUBLE PRECISION,
        fiber_100g DOUBLE PRECISION,
        proteins_100g DOUBLE PRECISION,
        salt_100g DOUBLE PRECISION,
        sodium_100g DOUBLE PRECISION
    )"#,
    r#"
    CREATE TABLE IF NOT EXISTS product_brands (
        product_code TEXT NOT NULL REFERENCES products (code),
        brand_id INTEGER NOT NULL REFERENCES brands (brand_id),
        PRIMARY KEY (product_code, brand_id)
    )"#,
    r#"
    CREATE TABLE IF NOT EXISTS product_categories (
        product_code TEXT NOT NULL REFERENCES products (code),
        category_id INTEGER NOT NULL REFERENCES categories (category_id),
        PRIMARY KEY (product_code, category_id)
    )"#,
    r#"
    CREATE TABLE IF NOT EXISTS product_countries (
        product_code TEXT NOT NULL REFERENCES products (code),
        country_id INTEGER NOT NULL REFERENCES countries (country_id),
        PRIMARY KEY (product_code, country_id)
    )"#,
    r#"
    CREATE TABLE IF NOT EXISTS product_labels (
        product_code TEXT NOT NULL REFERENCES products (code),
        label_id INTEGER NOT NULL REFERENCES labels (label_id),
        PRIMARY KEY (product_code, label_id)
    )"#,
];

/// Ensure database tables exist
pub fn ensure_tables(conn: &mut DbConnection) -> QueryResult<()> {
    tracing::info!("Ensuring database tables exist...");

    for statement in CREATE_TABLES {
        diesel::sql_query(*statement).execute(conn)?;
    }

    tracing::info!("All tables ensured");
    Ok(())
}
