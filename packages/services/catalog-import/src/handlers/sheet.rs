use std::collections::HashMap;
use std::sync::Arc;

use crate::handlers::{CsvHandler, XlsxHandler};
use crate::models::*;

/// Raw cell content, independent of the file format it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

static EMPTY_CELL: CellValue = CellValue::Empty;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Csv,
    Xlsx,
}

impl SheetFormat {
    /// Format implied by a file name, if it is one we read.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".csv") {
            Some(SheetFormat::Csv)
        } else if lower.ends_with(".xlsx") {
            Some(SheetFormat::Xlsx)
        } else {
            None
        }
    }

    /// Format implied by an upload's MIME type.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
        match essence.as_str() {
            "text/csv" | "application/csv" | "text/plain" => Some(SheetFormat::Csv),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            | "application/octet-stream"
            | "application/ocete-stream" => Some(SheetFormat::Xlsx),
            _ => None,
        }
    }
}

/// One sheet row with header-keyed lookup. `number` is 1-based; row 1 is the
/// header row when the sheet has one.
#[derive(Debug, Clone)]
pub struct Row {
    number: usize,
    columns: Arc<HashMap<String, usize>>,
    values: Vec<CellValue>,
}

impl Row {
    pub fn new(number: usize, columns: Arc<HashMap<String, usize>>, values: Vec<CellValue>) -> Self {
        Self { number, columns, values }
    }

    pub fn number(&self) -> usize { self.number }

    /// Cell under `header`; unknown headers and short rows read as empty.
    pub fn cell(&self, header: &str) -> &CellValue {
        self.columns
            .get(header)
            .and_then(|&i| self.values.get(i))
            .unwrap_or(&EMPTY_CELL)
    }

    /// Display string of the cell; blank cells are `None`.
    pub fn string(&self, header: &str) -> Option<String> {
        let s = match self.cell(header) {
            CellValue::Empty => return None,
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Bool(b) => b.to_string(),
        };
        (!s.is_empty()).then_some(s)
    }

    /// Numeric value of the cell. Zero, blanks and unparseable text are `None`.
    pub fn number_value(&self, header: &str) -> Option<f64> {
        let n = match self.cell(header) {
            CellValue::Empty => return None,
            CellValue::Number(n) => *n,
            CellValue::Bool(b) => if *b { 1.0 } else { 0.0 },
            CellValue::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        (n.is_finite() && n != 0.0).then_some(n)
    }

    /// Boolean cells, or `TRUE` / `FALSE` text in any case.
    pub fn boolean(&self, header: &str) -> Option<bool> {
        match self.cell(header) {
            CellValue::Bool(b) => Some(*b),
            CellValue::Text(s) => match s.trim().to_ascii_uppercase().as_str() {
                "TRUE" => Some(true),
                "FALSE" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

/// A loaded sheet: every row (header included) in file order.
#[derive(Debug, Clone)]
pub struct Worksheet {
    headers: Vec<String>,
    rows: Vec<Row>,
}

impl Worksheet {
    /// Build from raw rows. With `has_header`, the first row names the columns;
    /// otherwise columns are named `column_0`, `column_1`, ...
    pub fn from_grid(grid: Vec<Vec<CellValue>>, has_header: bool) -> Self {
        let width = grid.iter().map(|r| r.len()).max().unwrap_or(0);
        let headers: Vec<String> = match (has_header, grid.first()) {
            (true, Some(first)) => first
                .iter()
                .enumerate()
                .map(|(i, c)| match c {
                    CellValue::Text(s) => s.trim().to_string(),
                    CellValue::Number(n) => n.to_string(),
                    CellValue::Bool(b) => b.to_string(),
                    CellValue::Empty => format!("column_{}", i),
                })
                .collect(),
            _ => (0..width).map(|i| format!("column_{}", i)).collect(),
        };

        let mut columns = HashMap::with_capacity(headers.len());
        for (i, h) in headers.iter().enumerate() {
            // first occurrence wins for duplicated headers
            columns.entry(h.clone()).or_insert(i);
        }
        let columns = Arc::new(columns);

        let rows = grid
            .into_iter()
            .enumerate()
            .map(|(i, values)| Row::new(i + 1, columns.clone(), values))
            .collect();

        Self { headers, rows }
    }

    /// Parse an in-memory upload. `.csv` names are read as CSV, everything
    /// else as XLSX.
    pub fn from_bytes(bytes: &[u8], file_name: &str, has_header: bool) -> Result<Self> {
        let format = SheetFormat::from_file_name(file_name).unwrap_or(SheetFormat::Xlsx);
        let sheet = Self::parse(bytes, format, has_header)?;
        tracing::debug!(file_name = %file_name, row_count = sheet.rows.len(), "Loaded worksheet");
        Ok(sheet)
    }

    pub fn parse(bytes: &[u8], format: SheetFormat, has_header: bool) -> Result<Self> {
        let grid = match format {
            SheetFormat::Csv => CsvHandler::new().parse(bytes)?,
            SheetFormat::Xlsx => XlsxHandler::new().parse(bytes)?,
        };
        Ok(Self::from_grid(grid, has_header))
    }

    pub fn headers(&self) -> &[String] { &self.headers }

    pub fn len(&self) -> usize { self.rows.len() }

    pub fn is_empty(&self) -> bool { self.rows.is_empty() }
}

impl IntoIterator for Worksheet {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter { self.rows.into_iter() }
}
