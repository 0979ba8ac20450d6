//! Spreadsheet parsing.
//!
//! Reads the first worksheet of a workbook into a [`ParsedTable`]. The
//! container (OOXML zip or legacy OLE) is sniffed from the bytes, so a file's
//! extension does not decide which reader is used.

use crate::models::{CellValue, ParsedTable};
use calamine::{Data, Range, Reader, open_workbook_auto_from_rs};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::io::Cursor;
use thiserror::Error;

/// Why a staged file could not be read as a spreadsheet
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("file is empty")]
    Empty,

    #[error("workbook contains no worksheets")]
    NoWorksheets,

    #[error("{0}")]
    Workbook(String),
}

impl From<calamine::Error> for ParseError {
    fn from(e: calamine::Error) -> Self {
        ParseError::Workbook(e.to_string())
    }
}

/// Parse an in-memory spreadsheet
pub fn parse_spreadsheet_bytes(bytes: &[u8]) -> Result<ParsedTable, ParseError> {
    if bytes.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(ParseError::NoWorksheets)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ParseError::NoWorksheets)??;

    Ok(table_from_range(sheet_name, &range))
}

/// First row becomes the header, the rest are data rows
fn table_from_range(sheet_name: String, range: &Range<Data>) -> ParsedTable {
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return ParsedTable {
            sheet_name,
            ..ParsedTable::default()
        };
    };

    let columns = column_names(header);
    let width = columns.len();
    let rows = rows
        .map(|row| {
            let mut cells: Vec<CellValue> = row.iter().map(convert_cell).collect();
            cells.resize(width, CellValue::Empty);
            cells
        })
        .collect();

    ParsedTable {
        sheet_name,
        columns,
        rows,
    }
}

/// Header labels; blanks become `Unnamed: <index>` and repeats get a `.N` suffix
fn column_names(header: &[Data]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();

    header
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            let label = convert_cell(cell).to_string();
            let base = if label.trim().is_empty() {
                format!("Unnamed: {}", idx)
            } else {
                label
            };

            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{}.{}", base, count)
            };
            *count += 1;
            name
        })
        .collect()
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::String(s.clone()),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) if dt.is_duration() => CellValue::Duration(dt.as_f64()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) => CellValue::DateTime(value),
            None => CellValue::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) => parse_iso_datetime(s)
            .map(CellValue::DateTime)
            .unwrap_or_else(|| CellValue::String(s.clone())),
        Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Error(e) => CellValue::Error(e.to_string()),
    }
}

fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    s.parse::<NaiveDateTime>()
        .ok()
        .or_else(|| s.parse::<NaiveDate>().ok().and_then(|d| d.and_hms_opt(0, 0, 0)))
}
