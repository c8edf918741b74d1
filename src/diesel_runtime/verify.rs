//! Post-load sanity queries against the written tables.

use diesel::dsl::{avg, count_star};
use diesel::prelude::*;
use indexmap::IndexMap;
use serde::Serialize;

use super::database::DbConnection;
use super::schema;
use crate::tables::TableName;

/// Summary of what ended up in the database.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VerificationReport {
    /// Row count per relation, in load order.
    pub table_counts: IndexMap<TableName, i64>,
    /// Products that have a nutrition row.
    pub products_with_nutrition: i64,
    /// Mean nutrition score over products that have one.
    pub average_nutriscore: Option<f64>,
    /// Products per nutrition grade, ordered by grade.
    pub grade_distribution: Vec<(String, i64)>,
}

impl VerificationReport {
    pub fn count(&self, table: TableName) -> i64 {
        self.table_counts.get(&table).copied().unwrap_or(0)
    }
}

fn count_rows(conn: &mut DbConnection, table: TableName) -> QueryResult<i64> {
    macro_rules! count {
        ($table:path) => {
            $table.count().get_result::<i64>(conn)
        };
    }

    match table {
        TableName::Products => count!(schema::products::table),
        TableName::Brands => count!(schema::brands::table),
        TableName::Categories => count!(schema::categories::table),
        TableName::Countries => count!(schema::countries::table),
        TableName::Labels => count!(schema::labels::table),
        TableName::NutritionFacts => count!(schema::nutrition_facts::table),
        TableName::ProductBrands => count!(schema::product_brands::table),
        TableName::ProductCategories => count!(schema::product_categories::table),
        TableName::ProductCountries => count!(schema::product_countries::table),
        TableName::ProductLabels => count!(schema::product_labels::table),
    }
}

/// Run the verification queries.
pub fn verify(conn: &mut DbConnection) -> QueryResult<VerificationReport> {
    use schema::products::dsl::*;

    let mut report = VerificationReport::default();

    for table in crate::load::load_order() {
        let rows = count_rows(conn, table)?;
        tracing::debug!("{}: {} rows", table, rows);
        report.table_counts.insert(table, rows);
    }

    report.products_with_nutrition = products
        .inner_join(schema::nutrition_facts::table)
        .count()
        .get_result(conn)?;

    report.average_nutriscore = products
        .select(avg(nutriscore_score))
        .first::<Option<f64>>(conn)?;

    report.grade_distribution = products
        .filter(nutriscore_grade.is_not_null())
        .group_by(nutriscore_grade)
        .select((nutriscore_grade, count_star()))
        .order_by(nutriscore_grade)
        .load::<(Option<String>, i64)>(conn)?
        .into_iter()
        .filter_map(|(grade, n)| grade.map(|g| (g, n)))
        .collect();

    tracing::info!(
        "Verified {} products ({} with nutrition facts)",
        report.count(TableName::Products),
        report.products_with_nutrition
    );
    Ok(report)
}

#[cfg(all(test, feature = "sqlite", not(feature = "postgres")))]
mod tests {
    use super::*;
    use crate::diesel_runtime::{ensure_tables, establish};

    #[test]
    fn test_verify_empty_database() {
        let mut conn = establish(":memory:").unwrap();
        ensure_tables(&mut conn).unwrap();

        let report = verify(&mut conn).unwrap();
        assert_eq!(report.table_counts.len(), TableName::ALL.len());
        assert_eq!(report.count(TableName::Products), 0);
        assert_eq!(report.products_with_nutrition, 0);
        assert_eq!(report.average_nutriscore, None);
        assert!(report.grade_distribution.is_empty());
    }

    #[test]
    fn test_verify_grade_distribution() {
        let mut conn = establish(":memory:").unwrap();
        ensure_tables(&mut conn).unwrap();
        diesel::sql_query(
            "INSERT INTO products (code, nutriscore_score, nutriscore_grade) VALUES \
             ('001', 2.0, 'a'), ('002', 10.0, 'c'), ('003', 12.0, 'c'), ('004', NULL, NULL)",
        )
        .execute(&mut conn)
        .unwrap();
        diesel::sql_query("INSERT INTO nutrition_facts (product_code, fat_100g) VALUES ('002', 1.5)")
            .execute(&mut conn)
            .unwrap();

        let report = verify(&mut conn).unwrap();
        assert_eq!(report.count(TableName::Products), 4);
        assert_eq!(report.products_with_nutrition, 1);
        assert_eq!(report.average_nutriscore, Some(8.0));
        assert_eq!(
            report.grade_distribution,
            vec![("a".to_string(), 1), ("c".to_string(), 2)]
        );
    }
}
