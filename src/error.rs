//! Error types for the pipeline.
//!
//! Data anomalies (missing keys, unparseable numbers) are not errors; they are
//! absorbed by the transform and only counted. What remains here is I/O,
//! configuration and persistence.

use thiserror::Error;

use crate::tables::TableName;

/// Failure of a single table write inside a sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A load aborted at `table`. Tables written before it stay in place.
#[derive(Debug, Error)]
#[error("failed to load table '{table}': {source}")]
pub struct LoadError {
    pub table: TableName,
    #[source]
    pub source: SinkError,
}

/// Top-level error of a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid record on line {line}: {source}")]
    Record {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("database connection error: {0}")]
    Connection(String),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error(transparent)]
    Load(#[from] LoadError),
}
