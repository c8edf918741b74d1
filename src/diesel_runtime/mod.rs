//! Diesel ORM runtime infrastructure
//!
//! Connection pooling, the relational schema of the ten normalized tables,
//! and the [`DieselSink`] that loads them.
//!
//! # Features
//!
//! - `sqlite` (default): bundled SQLite backend
//! - `postgres`: PostgreSQL backend; wins when both are enabled

pub mod bootstrap;
pub mod database;
pub mod models;
pub mod schema;
pub mod sink;
pub mod verify;

// Re-export key types
pub use bootstrap::ensure_tables;
pub use database::{establish, Database, DatabaseConfig, DbConnection, Pool, PooledConnection};
pub use sink::DieselSink;
pub use verify::{verify, VerificationReport};
