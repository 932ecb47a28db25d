use ::csv::ReaderBuilder;

use crate::handlers::CellValue;
use crate::models::*;

/// Reads CSV text into raw rows. Every field is text; empty fields are `Empty`.
pub struct CsvHandler {
    delimiter: u8,
}

impl Default for CsvHandler {
    fn default() -> Self { Self::new() }
}

impl CsvHandler {
    pub fn new() -> Self { Self::with_delimiter(b',') }

    pub fn with_delimiter(delimiter: u8) -> Self { Self { delimiter } }

    pub fn parse(&self, bytes: &[u8]) -> Result<Vec<Vec<CellValue>>> {
        // header handling is left to Worksheet so row numbers stay sheet-accurate
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(strip_bom(bytes));

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let row = record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        CellValue::Empty
                    } else {
                        CellValue::Text(field.to_string())
                    }
                })
                .collect();
            rows.push(row);
        }

        tracing::debug!(record_count = rows.len(), "Parsed CSV data");
        Ok(rows)
    }
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes)
}
