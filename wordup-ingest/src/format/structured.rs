//! Pre-built entry arrays (`.json`)

use serde_json::Value;
use wordup_common::Entry;

use super::{FormatParser, Parsed};
use crate::error::IngestError;
use crate::validator;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Parser for `.json` uploads that already carry entries
pub struct StructuredParser;

impl FormatParser for StructuredParser {
    fn parse(&self, bytes: &[u8]) -> Result<Parsed, IngestError> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| IngestError::Format(format!("invalid JSON: {}", e)))?;

        validator::check(&value)
            .map_err(|violation| IngestError::Format(violation.to_string()))?;

        let entries: Vec<Entry> = serde_json::from_value(value)
            .map_err(|e| IngestError::Format(format!("not an entry array: {}", e)))?;

        Ok(Parsed::Entries(entries))
    }
}
