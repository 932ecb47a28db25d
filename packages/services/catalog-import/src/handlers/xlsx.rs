use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};

use crate::handlers::CellValue;
use crate::models::*;

/// Reads the first worksheet of an XLSX workbook into raw rows.
#[derive(Default)]
pub struct XlsxHandler;

impl XlsxHandler {
    pub fn new() -> Self { Self }

    pub fn parse(&self, bytes: &[u8]) -> Result<Vec<Vec<CellValue>>> {
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes.to_vec()))?;
        let range = match workbook.worksheet_range_at(0) {
            Some(range) => range?,
            None => return Err(ImportError::XlsxParsing("workbook has no worksheets".to_string())),
        };

        let rows: Vec<Vec<CellValue>> = range
            .rows()
            .map(|row| row.iter().map(to_cell).collect())
            .collect();

        tracing::debug!(record_count = rows.len(), "Parsed XLSX data");
        Ok(rows)
    }
}

fn to_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) if s.is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(v) => CellValue::Number(*v),
        Data::Int(v) => CellValue::Number(*v as f64),
        Data::Bool(v) => CellValue::Bool(*v),
        Data::DateTime(v) => CellValue::Number(v.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}
