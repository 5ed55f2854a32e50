//! Region parsing
//!
//! Turns the raw `|`-prefixed lines of one table region into columns and rows.
//! The region is read as `|`-separated values with the first line as header.

use crate::error::ResearchError;
use crate::tables::Row;
use crate::Result;
use csv::{ReaderBuilder, StringRecord};
use std::collections::HashSet;

const FIELD_DELIMITER: u8 = b'|';
const PLACEHOLDER_PREFIX: &str = "Unnamed";

/// Columns and rows of a region, before a label is assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRegion {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

/// Parse the collected lines of one region.
///
/// Fails with [`ResearchError::RegionParse`] when a data row carries more
/// fields than the header. Short rows are padded with blank cells.
pub fn parse_region<S: AsRef<str>>(lines: &[S]) -> Result<ParsedRegion> {
    let content = lines
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("\n");

    let mut reader = ReaderBuilder::new()
        .delimiter(FIELD_DELIMITER)
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(content.as_bytes());

    let mut records = reader.records();

    let header = match records.next() {
        Some(record) => record.map_err(region_error)?,
        None => return Err(ResearchError::RegionParse("region is empty".to_string())),
    };
    let names = header_names(&header);

    let mut body: Vec<Vec<String>> = Vec::new();
    for (index, record) in records.enumerate() {
        let record = record.map_err(region_error)?;

        if record.len() > names.len() {
            return Err(ResearchError::RegionParse(format!(
                "expected {} fields in line {}, saw {}",
                names.len(),
                index + 2,
                record.len()
            )));
        }

        let mut cells: Vec<String> = record.iter().map(|f| f.trim().to_string()).collect();
        cells.resize(names.len(), String::new());
        body.push(cells);
    }

    // Keep a column only if it has content in at least one row and a real
    // header. A header-only region therefore keeps no columns.
    let kept: Vec<usize> = (0..names.len())
        .filter(|&i| body.iter().any(|cells| !cells[i].is_empty()))
        .filter(|&i| !names[i].starts_with(PLACEHOLDER_PREFIX))
        .collect();

    let columns: Vec<String> = kept.iter().map(|&i| names[i].clone()).collect();

    let rows = body
        .into_iter()
        .map(|mut cells| {
            kept.iter()
                .map(|&i| (names[i].clone(), std::mem::take(&mut cells[i])))
                .collect::<Row>()
        })
        .collect();

    Ok(ParsedRegion { columns, rows })
}

/// Trimmed header names. Blank headers get an `Unnamed: {index}` placeholder
/// and repeated names get `.1`, `.2`, ... suffixes so every name is unique.
fn header_names(header: &StringRecord) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();

    header
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let base = match field.trim() {
                "" => format!("{}: {}", PLACEHOLDER_PREFIX, index),
                name => name.to_string(),
            };

            let mut name = base.clone();
            let mut suffix = 0;
            while used.contains(&name) {
                suffix += 1;
                name = format!("{}.{}", base, suffix);
            }
            used.insert(name.clone());
            name
        })
        .collect()
}

fn region_error(e: csv::Error) -> ResearchError {
    ResearchError::RegionParse(e.to_string())
}
