//! Markdown table pipeline
//!
//! Agent answers are markdown. Any pipe-delimited tables embedded in them are
//! pulled out as structured tables, rendered as grids and exported as CSV.
//!
//! MARKDOWN → EXTRACT (state machine) → PARSE REGION → RENDER / EXPORT

pub mod export;
pub mod extractor;
pub mod region;

pub use export::{
    export_file_name, render_collection, to_csv_bytes, RenderedTable, TableExport, TableLayout,
    TableSection, TableView, CSV_MIME,
};
pub use extractor::{extract_tables, ExtractOptions, Extraction, TableExtractor, TableWarning};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One data row: column name → cell, in column order.
pub type Row = IndexMap<String, String>;

/// A table recovered from a markdown region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Sequential label ("Table 1", "Table 2", ...) in document order
    pub label: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Cell lookup by row index and column name
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        self.rows.get(row)?.get(column).map(String::as_str)
    }

    /// Rows as positional records aligned with `columns`.
    pub fn records(&self) -> impl Iterator<Item = Vec<&str>> + '_ {
        self.rows.iter().map(move |row| {
            self.columns
                .iter()
                .map(|column| row.get(column).map(String::as_str).unwrap_or(""))
                .collect()
        })
    }
}

/// Label → table, insertion ordered. Labels are never reused within one
/// document, so keys are unique by construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableCollection {
    tables: IndexMap<String, Table>,
}

impl TableCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, table: Table) {
        self.tables.insert(table.label.clone(), table);
    }

    pub fn get(&self, label: &str) -> Option<&Table> {
        self.tables.get(label)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Table)> {
        self.tables.iter().map(|(label, table)| (label.as_str(), table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table(label: &str) -> Table {
        let mut row = Row::new();
        row.insert("Metric".to_string(), "Price".to_string());
        row.insert("Value".to_string(), "$150".to_string());

        Table {
            label: label.to_string(),
            columns: vec!["Metric".to_string(), "Value".to_string()],
            rows: vec![row],
        }
    }

    #[test]
    fn test_collection_preserves_insertion_order() {
        let mut tables = TableCollection::new();
        tables.insert(sample_table("Table 2"));
        tables.insert(sample_table("Table 1"));

        let labels: Vec<&str> = tables.labels().collect();
        assert_eq!(labels, vec!["Table 2", "Table 1"]);
        assert_eq!(tables.len(), 2);
    }

    #[test]
    fn test_records_follow_column_order() {
        let table = sample_table("Table 1");
        let records: Vec<Vec<&str>> = table.records().collect();

        assert_eq!(records, vec![vec!["Price", "$150"]]);
        assert_eq!(table.cell(0, "Value"), Some("$150"));
        assert_eq!(table.cell(1, "Value"), None);
    }

    #[test]
    fn test_collection_serializes_as_ordered_object() {
        let mut tables = TableCollection::new();
        tables.insert(sample_table("Table 1"));

        let json = serde_json::to_value(&tables).unwrap();
        assert_eq!(json["Table 1"]["columns"][0], "Metric");
        assert_eq!(json["Table 1"]["rows"][0]["Value"], "$150");
    }
}
