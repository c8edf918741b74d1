//! Bulk append of normalized tables through Diesel.

use diesel::prelude::*;

use super::database::DbConnection;
use super::models::*;
use super::schema;
use crate::error::SinkError;
use crate::load::TableSink;
use crate::tables::{DimensionKind, TableBatch};

/// Insert `$records` into `$table` in chunks of `$batch_size` rows,
/// evaluating to the number of rows inserted.
macro_rules! insert_chunked {
    ($conn:expr, $table:expr, $records:expr, $batch_size:expr) => {{
        let mut written = 0usize;
        for chunk in $records.chunks($batch_size) {
            written += diesel::insert_into($table).values(chunk).execute($conn)?;
        }
        written
    }};
}

/// Writes each table inside its own transaction, so a failing table leaves
/// no partial rows behind while earlier tables stay committed.
pub struct DieselSink<'c> {
    conn: &'c mut DbConnection,
    batch_size: usize,
}

impl<'c> DieselSink<'c> {
    /// `batch_size` is the number of rows per INSERT statement (at least 1).
    pub fn new(conn: &'c mut DbConnection, batch_size: usize) -> Self {
        Self {
            conn,
            batch_size: batch_size.max(1),
        }
    }
}

impl TableSink for DieselSink<'_> {
    fn append(&mut self, batch: TableBatch<'_>) -> Result<usize, SinkError> {
        let size = self.batch_size;

        let written = self.conn.transaction::<usize, diesel::result::Error, _>(|conn| {
            let written = match batch {
                TableBatch::Products(rows) => {
                    let records: Vec<NewProduct> = rows.iter().map(NewProduct::from).collect();
                    insert_chunked!(conn, schema::products::table, records, size)
                }
                TableBatch::NutritionFacts(rows) => {
                    let records: Vec<NewNutritionFacts> =
                        rows.iter().map(NewNutritionFacts::from).collect();
                    insert_chunked!(conn, schema::nutrition_facts::table, records, size)
                }
                TableBatch::Dimension(dimension) => match dimension.kind() {
                    DimensionKind::Brand => {
                        let records: Vec<NewBrand> = dimension.rows().map(NewBrand::from).collect();
                        insert_chunked!(conn, schema::brands::table, records, size)
                    }
                    DimensionKind::Category => {
                        let records: Vec<NewCategory> =
                            dimension.rows().map(NewCategory::from).collect();
                        insert_chunked!(conn, schema::categories::table, records, size)
                    }
                    DimensionKind::Country => {
                        let records: Vec<NewCountry> =
                            dimension.rows().map(NewCountry::from).collect();
                        insert_chunked!(conn, schema::countries::table, records, size)
                    }
                    DimensionKind::Label => {
                        let records: Vec<NewLabel> = dimension.rows().map(NewLabel::from).collect();
                        insert_chunked!(conn, schema::labels::table, records, size)
                    }
                },
                TableBatch::Junction(junction) => match junction.kind {
                    DimensionKind::Brand => {
                        let records: Vec<NewProductBrand> =
                            junction.rows.iter().map(NewProductBrand::from).collect();
                        insert_chunked!(conn, schema::product_brands::table, records, size)
                    }
                    DimensionKind::Category => {
                        let records: Vec<NewProductCategory> =
                            junction.rows.iter().map(NewProductCategory::from).collect();
                        insert_chunked!(conn, schema::product_categories::table, records, size)
                    }
                    DimensionKind::Country => {
                        let records: Vec<NewProductCountry> =
                            junction.rows.iter().map(NewProductCountry::from).collect();
                        insert_chunked!(conn, schema::product_countries::table, records, size)
                    }
                    DimensionKind::Label => {
                        let records: Vec<NewProductLabel> =
                            junction.rows.iter().map(NewProductLabel::from).collect();
                        insert_chunked!(conn, schema::product_labels::table, records, size)
                    }
                },
            };
            Ok(written)
        })?;

        tracing::debug!("Wrote {} rows to '{}'", written, batch.table());
        Ok(written)
    }
}
