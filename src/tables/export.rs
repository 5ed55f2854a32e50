//! Rendering and CSV export of extracted tables

use crate::error::ResearchError;
use crate::tables::{Table, TableCollection};
use crate::Result;
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const CSV_MIME: &str = "text/csv";

/// Display-ready grid: headers plus rows in original order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedTable {
    pub label: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RenderedTable {
    pub fn from_table(table: &Table) -> Self {
        Self {
            label: table.label.clone(),
            headers: table.columns.clone(),
            rows: table
                .records()
                .map(|record| record.into_iter().map(str::to_string).collect())
                .collect(),
        }
    }
}

impl fmt::Display for RenderedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        write_grid_line(f, &self.headers, &widths)?;
        let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
        writeln!(f, "|-{}-|", rule.join("-|-"))?;
        for row in &self.rows {
            write_grid_line(f, row, &widths)?;
        }
        Ok(())
    }
}

fn write_grid_line(f: &mut fmt::Formatter<'_>, cells: &[String], widths: &[usize]) -> fmt::Result {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{:<width$}", cell, width = width))
        .collect();
    writeln!(f, "| {} |", padded.join(" | "))
}

/// Downloadable CSV for one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableExport {
    pub label: String,
    pub file_name: String,
    pub mime: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl TableExport {
    pub fn from_table(table: &Table) -> Result<Self> {
        Ok(Self {
            label: table.label.clone(),
            file_name: export_file_name(&table.label),
            mime: CSV_MIME.to_string(),
            bytes: to_csv_bytes(table)?,
        })
    }
}

/// `"Table 1"` → `"table_1.csv"`
pub fn export_file_name(label: &str) -> String {
    format!("{}.csv", label.to_lowercase().replace(' ', "_"))
}

/// Serialize a table as comma-separated UTF-8: header row first, rows in
/// order, no index column.
pub fn to_csv_bytes(table: &Table) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new().from_writer(Vec::<u8>::new());
    writer.write_record(&table.columns)?;
    for record in table.records() {
        writer.write_record(&record)?;
    }
    writer.flush()?;

    writer
        .into_inner()
        .map_err(|e| ResearchError::Export(format!("CSV buffer flush failed: {}", e.error())))
}

/// One table in a view: its grid and its export control
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSection {
    pub table: RenderedTable,
    pub export: TableExport,
}

/// Single flat section for one table, one tab per table otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableLayout {
    Single,
    Tabbed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableView {
    pub layout: TableLayout,
    pub sections: Vec<TableSection>,
}

impl TableView {
    pub fn tab_names(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.table.label.as_str()).collect()
    }

    pub fn export(&self, file_name: &str) -> Option<&TableExport> {
        self.sections
            .iter()
            .map(|s| &s.export)
            .find(|e| e.file_name == file_name)
    }
}

impl fmt::Display for TableView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.layout == TableLayout::Tabbed {
            let tabs: Vec<String> = self.tab_names().iter().map(|n| format!("[{}]", n)).collect();
            writeln!(f, "{}", tabs.join(" "))?;
        }

        for section in &self.sections {
            writeln!(f)?;
            writeln!(f, "#### {}", section.table.label)?;
            write!(f, "{}", section.table)?;
            writeln!(f, "Download {} as CSV: {}", section.table.label, section.export.file_name)?;
        }
        Ok(())
    }
}

/// Render every table and build its export. Returns `None` when the
/// collection is empty.
pub fn render_collection(tables: &TableCollection) -> Result<Option<TableView>> {
    if tables.is_empty() {
        return Ok(None);
    }

    let layout = if tables.len() == 1 {
        TableLayout::Single
    } else {
        TableLayout::Tabbed
    };

    let sections = tables
        .iter()
        .map(|(_, table)| -> Result<TableSection> {
            Ok(TableSection {
                table: RenderedTable::from_table(table),
                export: TableExport::from_table(table)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Some(TableView { layout, sections }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::{extract_tables, Row};
    use csv::ReaderBuilder;
    use pretty_assertions::assert_eq;

    fn table(label: &str, columns: &[&str], rows: &[&[&str]]) -> Table {
        Table {
            label: label.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .map(|cells| {
                    columns
                        .iter()
                        .zip(cells.iter())
                        .map(|(c, v)| (c.to_string(), v.to_string()))
                        .collect::<Row>()
                })
                .collect(),
        }
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name("Table 1"), "table_1.csv");
        assert_eq!(export_file_name("Table 12"), "table_12.csv");
        assert_eq!(export_file_name("Peer Comparison"), "peer_comparison.csv");
    }

    #[test]
    fn test_csv_has_header_and_no_index() {
        let t = table("Table 1", &["Metric", "Value"], &[&["Price", "$150"], &["P/E", "25x"]]);

        let csv = String::from_utf8(to_csv_bytes(&t).unwrap()).unwrap();
        assert_eq!(csv, "Metric,Value\nPrice,$150\nP/E,25x\n");
    }

    #[test]
    fn test_csv_quotes_commas() {
        let t = table("Table 1", &["Metric", "Value"], &[&["Market Cap", "$2,950B"]]);

        let csv = String::from_utf8(to_csv_bytes(&t).unwrap()).unwrap();
        assert_eq!(csv, "Metric,Value\nMarket Cap,\"$2,950B\"\n");
    }

    #[test]
    fn test_csv_round_trip() {
        let markdown = "\
| Company | Market Cap | Revenue Growth |
|---|---|---|
| Apple | $2,950B | 2.1% |
| Microsoft | $3,100B | 15.2% |
end";
        let extraction = extract_tables(markdown);
        let original = extraction.tables.get("Table 1").unwrap();

        let bytes = to_csv_bytes(original).unwrap();
        let mut reader = ReaderBuilder::new().from_reader(bytes.as_slice());

        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, original.columns);

        let rows: Vec<Row> = reader
            .records()
            .map(|r| {
                headers
                    .iter()
                    .cloned()
                    .zip(r.unwrap().iter().map(String::from))
                    .collect()
            })
            .collect();
        assert_eq!(rows, original.rows);
    }

    #[test]
    fn test_single_table_layout() {
        let extraction = extract_tables("| A | B |\n| 1 | 2 |\ntext");

        let view = render_collection(&extraction.tables).unwrap().unwrap();
        assert_eq!(view.layout, TableLayout::Single);
        assert_eq!(view.sections[0].export.file_name, "table_1.csv");
        assert_eq!(view.sections[0].export.mime, "text/csv");
    }

    #[test]
    fn test_multiple_tables_are_tabbed() {
        let extraction = extract_tables("| A | B |\n| 1 | 2 |\ntext\n| C |\n| 3 |\ntext");

        let view = render_collection(&extraction.tables).unwrap().unwrap();
        assert_eq!(view.layout, TableLayout::Tabbed);
        assert_eq!(view.tab_names(), vec!["Table 1", "Table 2"]);
        assert!(view.export("table_2.csv").is_some());
        assert!(view.export("table_3.csv").is_none());
    }

    #[test]
    fn test_empty_collection_renders_nothing() {
        assert!(render_collection(&TableCollection::new()).unwrap().is_none());
    }

    #[test]
    fn test_grid_display() {
        let t = table("Table 1", &["Metric", "Value"], &[&["Price", "$150"]]);

        let grid = RenderedTable::from_table(&t).to_string();
        assert_eq!(
            grid,
            "| Metric | Value |\n|--------|-------|\n| Price  | $150  |\n"
        );
    }
}
