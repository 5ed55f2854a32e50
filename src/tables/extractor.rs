//! Table extractor
//!
//! Single forward pass over the markdown lines driven by an explicit
//! two-state machine. Every line is classified, fed to [`transition`], and the
//! returned [`Action`] is applied to the region buffer.
//!
//! | state          | event          | next           | action          |
//! |----------------|----------------|----------------|-----------------|
//! | Outside        | row            | InsideRegion   | collect         |
//! | InsideRegion   | row            | InsideRegion   | collect         |
//! | any            | separator      | unchanged      | skip            |
//! | InsideRegion   | text           | Outside        | close region    |
//! | Outside        | text           | Outside        | ignore          |
//! | InsideRegion   | end of input   | Outside        | drop (or flush) |
//! | Outside        | end of input   | Outside        | ignore          |

use crate::tables::region::parse_region;
use crate::tables::{Table, TableCollection};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const ROW_PREFIX: char = '|';
const SEPARATOR_MARKER: &str = "---";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Outside,
    InsideRegion,
}

/// What a single markdown line looks like to the scanner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Header or data row: starts with `|`, no `---`
    Row,
    /// Header separator such as `|---|---|`
    Separator,
    /// Anything not starting with `|`
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanEvent {
    Line(LineKind),
    EndOfInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Collect,
    Skip,
    Ignore,
    /// Region terminated by a non-table line: parse it
    CloseRegion,
    /// Input ended inside a region and the region is discarded
    DropTrailing,
    /// Input ended inside a region and the region is parsed anyway
    FlushTrailing,
}

impl LineKind {
    pub fn classify(line: &str) -> Self {
        if !line.starts_with(ROW_PREFIX) {
            LineKind::Text
        } else if line.contains(SEPARATOR_MARKER) {
            LineKind::Separator
        } else {
            LineKind::Row
        }
    }
}

/// The scanner's transition table.
pub fn transition(
    state: ScanState,
    event: ScanEvent,
    flush_trailing_region: bool,
) -> (ScanState, Action) {
    use ScanState::*;

    match (state, event) {
        (_, ScanEvent::Line(LineKind::Row)) => (InsideRegion, Action::Collect),
        (state, ScanEvent::Line(LineKind::Separator)) => (state, Action::Skip),
        (InsideRegion, ScanEvent::Line(LineKind::Text)) => (Outside, Action::CloseRegion),
        (Outside, ScanEvent::Line(LineKind::Text)) => (Outside, Action::Ignore),
        (InsideRegion, ScanEvent::EndOfInput) if flush_trailing_region => {
            (Outside, Action::FlushTrailing)
        }
        (InsideRegion, ScanEvent::EndOfInput) => (Outside, Action::DropTrailing),
        (Outside, ScanEvent::EndOfInput) => (Outside, Action::Ignore),
    }
}

/// Extraction behaviour switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractOptions {
    /// Parse a table that runs to the end of the document instead of
    /// dropping it.
    #[serde(default)]
    pub flush_trailing_region: bool,
}

/// A region that failed to parse. Non-fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableWarning {
    /// 1-based line number of the first row of the region
    pub line: usize,
    pub message: String,
}

/// Result of one extraction call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    pub tables: TableCollection,
    pub warnings: Vec<TableWarning>,
}

pub struct TableExtractor {
    options: ExtractOptions,
}

impl TableExtractor {
    pub fn new(options: ExtractOptions) -> Self {
        Self { options }
    }

    /// Extract every table in `markdown`, labelling them in document order.
    pub fn extract(&self, markdown: &str) -> Extraction {
        let mut scan = Scan::default();

        // A final `\n` yields one trailing empty line, which closes an open
        // region like any other text line.
        for (index, line) in markdown.split('\n').enumerate() {
            let line = line.strip_suffix('\r').unwrap_or(line);
            let event = ScanEvent::Line(LineKind::classify(line));
            let (next, action) = transition(scan.state, event, self.options.flush_trailing_region);
            scan.state = next;

            match action {
                Action::Collect => {
                    if scan.region.is_empty() {
                        scan.region_start = index + 1;
                    }
                    scan.region.push(line);
                }
                Action::CloseRegion => scan.close_region(),
                // trailing actions only follow EndOfInput
                _ => {}
            }
        }

        let (next, action) =
            transition(scan.state, ScanEvent::EndOfInput, self.options.flush_trailing_region);
        scan.state = next;

        match action {
            Action::FlushTrailing => scan.close_region(),
            Action::DropTrailing => {
                debug!(
                    line = scan.region_start,
                    rows = scan.region.len(),
                    "Dropping unterminated table region at end of document"
                );
                scan.region.clear();
            }
            _ => {}
        }

        Extraction {
            tables: scan.tables,
            warnings: scan.warnings,
        }
    }
}

impl Default for TableExtractor {
    fn default() -> Self {
        Self::new(ExtractOptions::default())
    }
}

/// Extract tables with default options.
pub fn extract_tables(markdown: &str) -> Extraction {
    TableExtractor::default().extract(markdown)
}

/// Mutable state of one pass
struct Scan<'a> {
    state: ScanState,
    region: Vec<&'a str>,
    region_start: usize,
    label_counter: usize,
    tables: TableCollection,
    warnings: Vec<TableWarning>,
}

impl Default for Scan<'_> {
    fn default() -> Self {
        Self {
            state: ScanState::Outside,
            region: Vec::new(),
            region_start: 0,
            label_counter: 1,
            tables: TableCollection::new(),
            warnings: Vec::new(),
        }
    }
}

impl<'a> Scan<'a> {
    /// Parse the buffered region and clear it whatever the outcome.
    fn close_region(&mut self) {
        if self.region.is_empty() {
            return;
        }

        match parse_region(self.region.as_slice()) {
            Ok(parsed) => {
                let table = Table {
                    label: format!("Table {}", self.label_counter),
                    columns: parsed.columns,
                    rows: parsed.rows,
                };
                self.label_counter += 1;

                debug!(
                    label = %table.label,
                    columns = table.column_count(),
                    rows = table.row_count(),
                    "Extracted table"
                );

                self.tables.insert(table);
            }
            Err(e) => {
                warn!("{} (region starting at line {})", e, self.region_start);
                self.warnings.push(TableWarning {
                    line: self.region_start,
                    message: e.to_string(),
                });
            }
        }

        self.region.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PRICE_TABLE: &str = "\
| Metric | Value |
|---|---|
| Price | $150 |
| P/E | 25x |
Some trailing prose.";

    #[test]
    fn test_single_table_scenario() {
        let extraction = extract_tables(PRICE_TABLE);

        assert_eq!(extraction.tables.len(), 1);
        assert!(extraction.warnings.is_empty());

        let table = extraction.tables.get("Table 1").unwrap();
        assert_eq!(table.columns, vec!["Metric", "Value"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.cell(0, "Metric"), Some("Price"));
        assert_eq!(table.cell(0, "Value"), Some("$150"));
        assert_eq!(table.cell(1, "Metric"), Some("P/E"));
        assert_eq!(table.cell(1, "Value"), Some("25x"));
    }

    #[test]
    fn test_two_tables_labelled_in_document_order() {
        let markdown = "\
## Valuation

| Ticker | P/E |
|--------|-----|
| AAPL | 29.1x |
| MSFT | 34.5x |

Microsoft trades at a premium.

| Ticker | Revenue Growth |
|--------|----------------|
| AAPL | 2.1% |

Source: company filings.";

        let extraction = extract_tables(markdown);
        let labels: Vec<&str> = extraction.tables.labels().collect();

        assert_eq!(labels, vec!["Table 1", "Table 2"]);
        assert_eq!(extraction.tables.get("Table 1").unwrap().row_count(), 2);
        assert_eq!(
            extraction.tables.get("Table 2").unwrap().columns,
            vec!["Ticker", "Revenue Growth"]
        );
    }

    #[test]
    fn test_no_pipe_lines_yields_nothing() {
        let extraction = extract_tables("Apple reported strong earnings.\n\n- Revenue up 5%\n");

        assert!(extraction.tables.is_empty());
        assert!(extraction.warnings.is_empty());
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let first = extract_tables(PRICE_TABLE);
        let second = extract_tables(PRICE_TABLE);

        assert_eq!(first, second);
    }

    #[test]
    fn test_trailing_table_is_dropped_by_default() {
        let markdown = "Summary below.\n| Metric | Value |\n|---|---|\n| Price | $150 |";

        let extraction = extract_tables(markdown);
        assert!(extraction.tables.is_empty());
        assert!(extraction.warnings.is_empty());
    }

    #[test]
    fn test_final_newline_closes_trailing_table() {
        let extraction = extract_tables("| A | B |\n|---|---|\n| 1 | 2 |\n");

        let table = extraction.tables.get("Table 1").unwrap();
        assert_eq!(table.columns, vec!["A", "B"]);
        assert_eq!(table.cell(0, "B"), Some("2"));

        let unterminated = extract_tables("| A | B |\n|---|---|\n| 1 | 2 |");
        assert!(unterminated.tables.is_empty());
    }

    #[test]
    fn test_price_table_ending_in_newline() {
        let markdown = "| Metric | Value |\n|---|---|\n| Price | $150 |\n| P/E | 25x |\n";

        let extraction = extract_tables(markdown);
        let table = extraction.tables.get("Table 1").unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_count(), 2);
    }

    #[test]
    fn test_crlf_line_endings() {
        let markdown = "| Metric | Value |\r\n|---|---|\r\n| Price | $150 |\r\nSome prose.\r\n";

        let extraction = extract_tables(markdown);
        let table = extraction.tables.get("Table 1").unwrap();
        assert_eq!(table.columns, vec!["Metric", "Value"]);
        assert_eq!(table.cell(0, "Value"), Some("$150"));
        assert!(extraction.warnings.is_empty());
    }

    #[test]
    fn test_trailing_table_is_kept_when_flushing() {
        let markdown = "Summary below.\n| Metric | Value |\n|---|---|\n| Price | $150 |";
        let extractor = TableExtractor::new(ExtractOptions {
            flush_trailing_region: true,
        });

        let extraction = extractor.extract(markdown);
        let table = extraction.tables.get("Table 1").unwrap();
        assert_eq!(table.cell(0, "Value"), Some("$150"));
    }

    #[test]
    fn test_parse_failure_warns_and_keeps_counter() {
        let markdown = "\
| A | B |
| 1 | 2 | 3 |
broken table above

| Ticker | Price |
| AAPL | 150 |
end";

        let extraction = extract_tables(markdown);

        assert_eq!(extraction.warnings.len(), 1);
        assert_eq!(extraction.warnings[0].line, 1);
        assert!(extraction.warnings[0].message.starts_with("Couldn't parse table"));

        let labels: Vec<&str> = extraction.tables.labels().collect();
        assert_eq!(labels, vec!["Table 1"]);
        assert_eq!(
            extraction.tables.get("Table 1").unwrap().cell(0, "Ticker"),
            Some("AAPL")
        );
    }

    #[test]
    fn test_separator_row_does_not_close_region() {
        let markdown = "| A | B |\n|---|---|\n| 1 | 2 |\n|---|---|\n| 3 | 4 |\n\n";

        let extraction = extract_tables(markdown);
        assert_eq!(extraction.tables.get("Table 1").unwrap().row_count(), 2);
    }

    #[test]
    fn test_blank_line_terminates_region() {
        let markdown = "| A | B |\n| 1 | 2 |\n\n| C | D |\n| 3 | 4 |\ndone";

        let extraction = extract_tables(markdown);
        assert_eq!(extraction.tables.len(), 2);
        assert_eq!(extraction.tables.get("Table 2").unwrap().columns, vec!["C", "D"]);
    }

    #[test]
    fn test_indented_table_is_not_recognized() {
        let extraction = extract_tables("  | A | B |\n  | 1 | 2 |\ntext");
        assert!(extraction.tables.is_empty());
    }

    #[test]
    fn test_transition_table() {
        use ScanState::*;

        let row = ScanEvent::Line(LineKind::Row);
        let sep = ScanEvent::Line(LineKind::Separator);
        let text = ScanEvent::Line(LineKind::Text);

        assert_eq!(transition(Outside, row, false), (InsideRegion, Action::Collect));
        assert_eq!(transition(InsideRegion, sep, false), (InsideRegion, Action::Skip));
        assert_eq!(transition(Outside, sep, false), (Outside, Action::Skip));
        assert_eq!(transition(InsideRegion, text, false), (Outside, Action::CloseRegion));
        assert_eq!(transition(Outside, text, false), (Outside, Action::Ignore));
        assert_eq!(
            transition(InsideRegion, ScanEvent::EndOfInput, false),
            (Outside, Action::DropTrailing)
        );
        assert_eq!(
            transition(InsideRegion, ScanEvent::EndOfInput, true),
            (Outside, Action::FlushTrailing)
        );
    }

    #[test]
    fn test_line_classification() {
        assert_eq!(LineKind::classify("| a | b |"), LineKind::Row);
        assert_eq!(LineKind::classify("|:---|---:|"), LineKind::Separator);
        assert_eq!(LineKind::classify("| --- dashes in a cell |"), LineKind::Separator);
        assert_eq!(LineKind::classify("plain text"), LineKind::Text);
        assert_eq!(LineKind::classify(""), LineKind::Text);
    }
}
