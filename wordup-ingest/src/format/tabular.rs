//! Spreadsheet word lists (`.xlsx`)
//!
//! Only the first sheet is read. Cells are flattened row by row, left to
//! right; empty and whitespace-only cells are dropped.

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use std::io::Cursor;

use super::{FormatParser, Parsed};
use crate::error::IngestError;

/// Parser for `.xlsx` workbooks
pub struct TabularParser;

impl FormatParser for TabularParser {
    fn parse(&self, bytes: &[u8]) -> Result<Parsed, IngestError> {
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))
            .map_err(|e| IngestError::Format(format!("unreadable workbook: {}", e)))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| IngestError::Format("workbook has no sheets".to_string()))?
            .map_err(|e| IngestError::Format(format!("unreadable sheet: {}", e)))?;

        let words = range
            .rows()
            .flat_map(|row| row.iter())
            .filter_map(cell_text)
            .collect();

        Ok(Parsed::Words(words))
    }
}

fn cell_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::Empty | Data::Error(_) => return None,
        Data::String(s) => s.trim().to_string(),
        other => other.to_string().trim().to_string(),
    };

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    fn words(parsed: Parsed) -> Vec<String> {
        match parsed {
            Parsed::Words(words) => words,
            other => panic!("expected words, got {:?}", other),
        }
    }

    #[test]
    fn test_cells_flattened_row_major() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "apple").unwrap();
        sheet.write_string(0, 2, "  banana ").unwrap();
        sheet.write_string(1, 1, "cherry").unwrap();
        sheet.write_string(2, 0, "   ").unwrap();
        sheet.write_string(3, 0, "date").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let parsed = TabularParser.parse(&bytes).unwrap();
        assert_eq!(words(parsed), vec!["apple", "banana", "cherry", "date"]);
    }

    #[test]
    fn test_only_first_sheet_is_read() {
        let mut workbook = Workbook::new();
        workbook.add_worksheet().write_string(0, 0, "first").unwrap();
        workbook.add_worksheet().write_string(0, 0, "second").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let parsed = TabularParser.parse(&bytes).unwrap();
        assert_eq!(words(parsed), vec!["first"]);
    }

    #[test]
    fn test_garbage_is_format_error() {
        let result = TabularParser.parse(b"apple\nbanana\n");
        assert!(matches!(result, Err(IngestError::Format(_))));
    }
}
