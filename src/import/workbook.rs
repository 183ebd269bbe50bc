use anyhow::{Context, Result, anyhow, bail};
use calamine::{Data, ExcelDateTime, Range, Reader, open_workbook_auto_from_rs};
use chrono::Datelike;
use log::{debug, info};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

use super::dates::{ISO_FORMAT, MAX_EXCEL_SERIAL};

/// File extensions accepted by the import before any parsing is attempted
pub const SUPPORTED_EXTENSIONS: &[&str] = &["xlsx", "xls"];

/// Header used for columns whose first-row cell is blank
const EMPTY_HEADER: &str = "__EMPTY";

/// A loosely-typed spreadsheet cell.
///
/// Absent and blank cells are represented as an empty `Text`, so callers
/// never need to special-case a missing value.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Text(String::new())
    }
}

impl CellValue {
    /// Render the cell as text; integral numbers print without a fraction
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Text(text) => text.clone(),
            CellValue::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => {
                format!("{}", *n as i64)
            }
            CellValue::Number(n) => n.to_string(),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Text(text) => text.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

/// One data row keyed by the sheet's header names
pub type Row = HashMap<String, CellValue>;

/// A named worksheet with at least one data row
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl Sheet {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }
}

/// Reject anything that is not an Excel workbook by its extension
pub fn ensure_supported_extension(path: &Path) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .unwrap_or_default();

    if SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(())
    } else {
        bail!(
            "Unsupported file type '{}': expected an .xlsx or .xls workbook",
            path.display()
        )
    }
}

/// Read every non-empty sheet of the workbook at `path`
pub fn read_workbook_file<P: AsRef<Path>>(path: P) -> Result<Vec<Sheet>> {
    let path = path.as_ref();
    ensure_supported_extension(path)?;

    let bytes = std::fs::read(path)
        .with_context(|| format!("Could not read file {}", path.display()))?;

    let sheets = read_workbook_bytes(bytes)?;
    info!("Read {} sheet(s) with data from {}", sheets.len(), path.display());
    Ok(sheets)
}

/// Parse an in-memory workbook.
///
/// Either the whole sheet list is returned or an error is; a workbook that
/// fails halfway never yields a partial list.
pub fn read_workbook_bytes(bytes: Vec<u8>) -> Result<Vec<Sheet>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| anyhow!("Could not read file: {}", e))?;

    let sheet_names = workbook.sheet_names().to_owned();
    let mut sheets = Vec::with_capacity(sheet_names.len());

    for sheet_name in sheet_names {
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| anyhow!("Could not read file: sheet '{}': {}", sheet_name, e))?;

        let sheet = sheet_from_range(&sheet_name, &range);
        if sheet.rows.is_empty() {
            debug!("Skipping sheet '{}': no data rows", sheet_name);
            continue;
        }

        debug!(
            "Sheet '{}': {} rows, {} columns",
            sheet.name,
            sheet.row_count(),
            sheet.column_count()
        );
        sheets.push(sheet);
    }

    Ok(sheets)
}

fn sheet_from_range(sheet_name: &str, range: &Range<Data>) -> Sheet {
    let mut rows_iter = range.rows();

    let headers = match rows_iter.next() {
        Some(first_row) => header_names(first_row),
        None => Vec::new(),
    };

    let mut rows = Vec::new();
    for cells in rows_iter {
        let values: Vec<CellValue> = cells.iter().map(cell_value).collect();
        if values.iter().all(CellValue::is_blank) {
            continue;
        }

        let row: Row = headers
            .iter()
            .enumerate()
            .map(|(idx, header)| {
                let value = values.get(idx).cloned().unwrap_or_default();
                (header.clone(), value)
            })
            .collect();
        rows.push(row);
    }

    Sheet {
        name: sheet_name.to_string(),
        headers,
        rows,
    }
}

/// Headers are taken verbatim; blank ones become `__EMPTY`, repeats get a `_N` suffix
fn header_names(first_row: &[Data]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();

    first_row
        .iter()
        .map(|cell| {
            let raw = cell_value(cell).as_text();
            let base = if raw.trim().is_empty() {
                EMPTY_HEADER.to_string()
            } else {
                raw
            };

            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{}_{}", base, count)
            };
            *count += 1;
            name
        })
        .collect()
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Text(b.to_string()),
        Data::DateTime(dt) => date_cell(dt),
        Data::DateTimeIso(s) => CellValue::Text(s.clone()),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        _ => CellValue::default(),
    }
}

/// Date-formatted cells become ISO text so the workbook's date system (1900 or 1904) is applied here
fn date_cell(dt: &ExcelDateTime) -> CellValue {
    let serial = dt.as_f64();
    let in_range = serial.is_finite() && (0.0..=MAX_EXCEL_SERIAL).contains(&serial);
    match dt.as_datetime() {
        Some(datetime) if in_range && dt.is_datetime() && datetime.year() <= 9999 => {
            CellValue::Text(datetime.date().format(ISO_FORMAT).to_string())
        }
        _ => CellValue::Number(serial),
    }
}
