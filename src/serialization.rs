//! File export of normalized tables.
//!
//! [`NdjsonSink`] writes one `<table>.ndjson` file per relation using the
//! storage column names, so the export mirrors what a database load would
//! hold. A [`RunManifest`] records what produced the files.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::cleaning::CleaningStats;
use crate::entity::Entity;
use crate::error::SinkError;
use crate::load::{LoadReport, TableSink};
use crate::normalize::NormalizeStats;
use crate::tables::TableBatch;

/// NDJSON (Newline Delimited JSON) writer
///
/// Writes rows as NDJSON, one JSON object per line.
pub struct NdjsonWriter<W: Write> {
    writer: W,
    lines: usize,
}

impl<W: Write> NdjsonWriter<W> {
    /// Create a new NDJSON writer
    pub fn new(writer: W) -> Self {
        Self { writer, lines: 0 }
    }

    /// Write a single row as an NDJSON line
    pub fn write<T: Serialize>(&mut self, row: &T) -> Result<(), SinkError> {
        let json = serde_json::to_string(row)?;
        writeln!(self.writer, "{}", json)?;
        self.lines += 1;
        Ok(())
    }

    /// Write product-keyed rows
    pub fn write_entities<T: Entity>(&mut self, rows: &[T]) -> Result<(), SinkError> {
        for row in rows {
            self.writer.write_all(row.to_ndjson_line()?.as_bytes())?;
            self.lines += 1;
        }
        tracing::debug!("Wrote {} '{}' rows", rows.len(), T::TABLE);
        Ok(())
    }

    /// Lines written so far
    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Flush the underlying writer
    pub fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Writes each relation to `<dir>/<table>.ndjson`.
///
/// Appending the same table twice appends to its file, so a re-run into a
/// non-empty directory duplicates rows just as a database append would.
pub struct NdjsonSink {
    dir: PathBuf,
}

impl NdjsonSink {
    /// Create the sink, creating `dir` if needed.
    pub fn create<P: AsRef<Path>>(dir: P) -> Result<Self, SinkError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn open(&self, name: &str) -> Result<NdjsonWriter<BufWriter<File>>, SinkError> {
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join(format!("{}.ndjson", name)))?;
        Ok(NdjsonWriter::new(BufWriter::new(file)))
    }
}

impl TableSink for NdjsonSink {
    fn append(&mut self, batch: TableBatch<'_>) -> Result<usize, SinkError> {
        let mut writer = self.open(batch.table().as_str())?;

        match batch {
            TableBatch::Products(rows) => writer.write_entities(rows)?,
            TableBatch::NutritionFacts(rows) => writer.write_entities(rows)?,
            TableBatch::Dimension(dimension) => {
                let kind = dimension.kind();
                for (id, name) in dimension.rows() {
                    writer.write(&json!({
                        kind.id_column(): id,
                        kind.name_column(): name,
                    }))?;
                }
            }
            TableBatch::Junction(junction) => {
                let kind = junction.kind;
                for row in &junction.rows {
                    writer.write(&json!({
                        "product_code": row.product_code,
                        kind.id_column(): row.dimension_id,
                    }))?;
                }
            }
        }

        writer.flush()?;
        Ok(writer.lines())
    }
}

/// Provenance of one pipeline run, written next to an export.
#[derive(Debug, Clone, Serialize)]
pub struct RunManifest {
    pub run_id: Uuid,
    pub input: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub cleaning: Option<CleaningStats>,
    pub normalize: Option<NormalizeStats>,
    pub load: Option<LoadReport>,
}

impl RunManifest {
    pub fn start(input: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            input: input.into(),
            started_at: Utc::now(),
            finished_at: None,
            cleaning: None,
            normalize: None,
            load: None,
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Write as pretty JSON to `<dir>/manifest.json`, creating `dir` if needed.
    pub fn write_to<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf, SinkError> {
        fs::create_dir_all(dir.as_ref())?;
        let path = dir.as_ref().join("manifest.json");
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json)?;
        Ok(path)
    }
}
