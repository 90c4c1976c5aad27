//! Plain word lists: one word per line

use super::{FormatParser, Parsed};
use crate::error::IngestError;

/// Parser for `.txt` word lists
pub struct LinesParser;

impl FormatParser for LinesParser {
    fn parse(&self, bytes: &[u8]) -> Result<Parsed, IngestError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| IngestError::Format(format!("word list is not valid UTF-8: {}", e)))?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        let words = text
            .split(['\n', '\r'])
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Parsed::Words(words))
    }
}
