//! # Foodfacts: Open Food Facts normalization pipeline
//!
//! Turns a flat, denormalized product export into ten third-normal-form
//! relations and bulk-loads them into a relational database.
//!
//! ## Stages
//!
//! - **Cleaning** ([`FieldNormalizer`]): placeholder substitution, quantity
//!   splitting, numeric coercion and splitting of the comma-separated
//!   multi-valued columns into lists
//! - **Normalization** ([`normalize()`]): the `products` core table, four
//!   dimension tables with surrogate keys, four junction tables and the
//!   one-to-one `nutrition_facts` satellite
//! - **Loading** ([`load()`]): writes every relation through a [`TableSink`] in
//!   foreign-key order ([`DieselSink`] for PostgreSQL/SQLite, [`NdjsonSink`]
//!   for file exports)
//!
//! ## Example
//!
//! ```no_run
//! use foodfacts::{load, normalize, FieldNormalizer, PipelineConfig};
//! use foodfacts::diesel_runtime::{ensure_tables, establish, DieselSink};
//!
//! # fn main() -> Result<(), foodfacts::PipelineError> {
//! let config = PipelineConfig::load(None)?;
//! let cleaner = FieldNormalizer::new(&config.cleaning)?;
//! let (flat, _) = cleaner.clean_csv(std::fs::File::open("products.csv")?)?;
//!
//! let tables = normalize(&flat, &config.normalize);
//!
//! let mut conn = establish(&config.database_url(None))?;
//! ensure_tables(&mut conn).map_err(foodfacts::SinkError::from)?;
//! let report = load(&tables, DieselSink::new(&mut conn, config.database.batch_size))?;
//! println!("{} rows written", report.total_rows());
//! # Ok(())
//! # }
//! ```

// Core modules
pub mod entity;
pub mod extraction;
pub mod record;
pub mod tables;

// Pipeline stages
pub mod cleaning;
pub mod normalize;
pub mod load;
pub mod serialization;

// Diesel ORM runtime infrastructure
pub mod diesel_runtime;

pub mod config;
pub mod error;

// Re-export key types
pub use entity::{Entity, FieldValue};
pub use extraction::Extractor;
pub use record::{columns, FlatRecord, FlatTable};
pub use tables::{
    Dimension, DimensionKind, Junction, JunctionRow, NutritionFacts, Product, TableBatch, TableName,
};

pub use cleaning::{CleaningStats, FieldNormalizer};
pub use normalize::{normalize, NormalizeStats, NormalizedTables};
pub use load::{load, load_order, LoadReport, TableSink};
pub use serialization::{NdjsonSink, NdjsonWriter, RunManifest};

pub use config::{CleaningConfig, NormalizeConfig, PipelineConfig};
pub use error::{LoadError, PipelineError, SinkError};

// Re-export diesel_runtime types
pub use diesel_runtime::{ensure_tables, verify, Database, DatabaseConfig, DieselSink, VerificationReport};
