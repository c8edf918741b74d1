//! Load orchestration: write every relation in foreign-key order.
//!
//! The order is derived from [`TableName::depends_on`] with Kahn's algorithm,
//! so a table is only written once everything it references is in place. A
//! failed write aborts the run; tables already written are left as they are.

use std::collections::{HashMap, VecDeque};

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{LoadError, SinkError};
use crate::normalize::NormalizedTables;
use crate::tables::{TableBatch, TableName};

/// Destination for normalized tables.
///
/// Implementations perform an append-only bulk write of one relation and
/// return the number of rows written.
pub trait TableSink {
    fn append(&mut self, batch: TableBatch<'_>) -> Result<usize, SinkError>;
}

impl<S: TableSink + ?Sized> TableSink for &mut S {
    fn append(&mut self, batch: TableBatch<'_>) -> Result<usize, SinkError> {
        (**self).append(batch)
    }
}

/// Rows written per table, in write order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub tables: IndexMap<TableName, usize>,
}

impl LoadReport {
    pub fn rows(&self, table: TableName) -> Option<usize> {
        self.tables.get(&table).copied()
    }

    pub fn total_rows(&self) -> usize {
        self.tables.values().sum()
    }
}

/// Compute the write order of all relations.
///
/// Tables become ready once every dependency is written; among ready tables
/// the declaration order of [`TableName::ALL`] breaks ties. This yields the
/// core table first, then the dimensions, then the satellite, then the
/// junctions.
pub fn load_order() -> Vec<TableName> {
    compute_order(&TableName::ALL, |table| table.depends_on())
}

/// Kahn's algorithm over an explicit node list.
///
/// Nodes caught in a cycle (or depending on a node outside `nodes`) are never
/// emitted, so a short result means the graph is not loadable.
fn compute_order<F>(nodes: &[TableName], dependencies: F) -> Vec<TableName>
where
    F: Fn(&TableName) -> &'static [TableName],
{
    let mut in_degree: HashMap<TableName, usize> = HashMap::new();
    let mut dependents: HashMap<TableName, Vec<TableName>> = HashMap::new();

    for node in nodes {
        let deps = dependencies(node);
        in_degree.insert(*node, deps.len());
        for dep in deps {
            dependents.entry(*dep).or_default().push(*node);
        }
    }

    let mut ready: VecDeque<TableName> = nodes
        .iter()
        .filter(|n| in_degree.get(n) == Some(&0))
        .copied()
        .collect();
    let mut order = Vec::with_capacity(nodes.len());

    while let Some(node) = ready.pop_front() {
        order.push(node);

        let mut unlocked = Vec::new();
        for dependent in dependents.get(&node).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(dependent) {
                *degree -= 1;
                if *degree == 0 {
                    unlocked.push(*dependent);
                }
            }
        }
        // Keep declaration order among newly ready tables
        unlocked.sort_by_key(|t| nodes.iter().position(|n| n == t));
        ready.extend(unlocked);
    }

    order
}

/// Write every relation of `tables` into `sink` in dependency order.
///
/// # Errors
/// Stops at the first failing table and returns it with the sink's error.
/// Later tables are not attempted.
pub fn load<S: TableSink>(tables: &NormalizedTables, mut sink: S) -> Result<LoadReport, LoadError> {
    let mut report = LoadReport::default();

    for table in load_order() {
        let Some(batch) = tables.batch(table) else {
            continue;
        };

        match sink.append(batch) {
            Ok(rows) => {
                tracing::info!("Ingested {} rows into '{}'", rows, table);
                report.tables.insert(table, rows);
            }
            Err(source) => {
                tracing::error!("Error ingesting '{}': {}", table, source);
                return Err(LoadError { table, source });
            }
        }
    }

    tracing::info!(
        "Data ingestion complete: {} rows across {} tables",
        report.total_rows(),
        report.tables.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NormalizeConfig;
    use crate::entity::FieldValue;
    use crate::normalize::normalize;
    use crate::record::{FlatRecord, FlatTable};

    /// Records writes and fails on a chosen table.
    #[derive(Default)]
    struct RecordingSink {
        written: Vec<TableName>,
        fail_on: Option<TableName>,
    }

    impl TableSink for RecordingSink {
        fn append(&mut self, batch: TableBatch<'_>) -> Result<usize, SinkError> {
            if Some(batch.table()) == self.fail_on {
                return Err(SinkError::Io(std::io::Error::other("constraint violation")));
            }
            self.written.push(batch.table());
            Ok(batch.len())
        }
    }

    fn tables() -> NormalizedTables {
        let table = FlatTable::new(vec![FlatRecord::new()
            .with("code", "001")
            .with("brands", FieldValue::list_of(["Acme"]))]);
        normalize(&table, &NormalizeConfig::default())
    }

    #[test]
    fn test_load_order_respects_dependencies() {
        let order = load_order();

        assert_eq!(
            order,
            vec![
                TableName::Products,
                TableName::Brands,
                TableName::Categories,
                TableName::Countries,
                TableName::Labels,
                TableName::NutritionFacts,
                TableName::ProductBrands,
                TableName::ProductCategories,
                TableName::ProductCountries,
                TableName::ProductLabels,
            ]
        );
        for (position, table) in order.iter().enumerate() {
            for dep in table.depends_on() {
                let dep_position = order.iter().position(|t| t == dep).unwrap();
                assert!(dep_position < position, "{} loaded before {}", table, dep);
            }
        }
    }

    #[test]
    fn test_cycle_leaves_nodes_unordered() {
        fn cyclic(table: &TableName) -> &'static [TableName] {
            match table {
                TableName::Brands => &[TableName::Labels],
                TableName::Labels => &[TableName::Brands],
                _ => &[],
            }
        }

        let order = compute_order(&[TableName::Products, TableName::Brands, TableName::Labels], cyclic);
        assert_eq!(order, vec![TableName::Products]);
    }

    #[test]
    fn test_load_reports_every_table() {
        let mut sink = RecordingSink::default();

        let report = load(&tables(), &mut sink).unwrap();

        assert_eq!(sink.written, load_order());
        assert_eq!(report.tables.len(), 10);
        assert_eq!(report.rows(TableName::Products), Some(1));
        assert_eq!(report.rows(TableName::ProductBrands), Some(1));
        assert_eq!(report.rows(TableName::Labels), Some(0));
    }

    #[test]
    fn test_failure_aborts_remaining_tables() {
        let mut sink = RecordingSink {
            fail_on: Some(TableName::NutritionFacts),
            ..Default::default()
        };

        let err = load(&tables(), &mut sink).unwrap_err();

        assert_eq!(err.table, TableName::NutritionFacts);
        assert!(err.to_string().contains("nutrition_facts"));
        assert_eq!(
            sink.written,
            vec![
                TableName::Products,
                TableName::Brands,
                TableName::Categories,
                TableName::Countries,
                TableName::Labels,
            ]
        );
    }

    #[test]
    fn test_core_table_failure_attempts_nothing_else() {
        let mut sink = RecordingSink {
            fail_on: Some(TableName::Products),
            ..Default::default()
        };

        let err = load(&tables(), &mut sink).unwrap_err();

        assert_eq!(err.table, TableName::Products);
        assert!(sink.written.is_empty());
    }
}
