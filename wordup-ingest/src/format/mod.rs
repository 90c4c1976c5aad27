//! Upload format detection and parsing
//!
//! The set of formats is closed: plain word lists, spreadsheets, and
//! pre-built entry arrays. Each has a parser implementing [`FormatParser`];
//! [`FormatTag::parser`] selects it.

pub mod lines;
pub mod structured;
pub mod tabular;

use serde::Serialize;
use std::path::Path;
use wordup_common::Entry;

use crate::error::IngestError;

/// Declared input format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatTag {
    /// One word per line (`.txt`)
    Lines,
    /// First sheet of a workbook (`.xlsx`)
    Tabular,
    /// JSON array of entries (`.json`)
    Structured,
}

/// Output of a format parser
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed {
    /// Raw word tokens in input order, still to be enriched
    Words(Vec<String>),
    /// Complete entries that bypass enrichment
    Entries(Vec<Entry>),
}

impl Parsed {
    pub fn len(&self) -> usize {
        match self {
            Parsed::Words(words) => words.len(),
            Parsed::Entries(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parse contract shared by all formats
pub trait FormatParser: Send + Sync {
    /// Turn an in-memory byte buffer into words or entries
    fn parse(&self, bytes: &[u8]) -> Result<Parsed, IngestError>;
}

static LINES: lines::LinesParser = lines::LinesParser;
static TABULAR: tabular::TabularParser = tabular::TabularParser;
static STRUCTURED: structured::StructuredParser = structured::StructuredParser;

impl FormatTag {
    /// Map an uploaded file name to its format by extension
    pub fn from_filename(filename: &str) -> Result<Self, IngestError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("txt") => Ok(FormatTag::Lines),
            Some("xlsx") => Ok(FormatTag::Tabular),
            Some("json") => Ok(FormatTag::Structured),
            _ => Err(IngestError::UnsupportedFormat(format!(
                "'{}' (expected .txt, .xlsx or .json)",
                filename
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FormatTag::Lines => "lines",
            FormatTag::Tabular => "tabular",
            FormatTag::Structured => "structured",
        }
    }

    /// Parser implementing this format
    pub fn parser(&self) -> &'static dyn FormatParser {
        match self {
            FormatTag::Lines => &LINES,
            FormatTag::Tabular => &TABULAR,
            FormatTag::Structured => &STRUCTURED,
        }
    }
}

impl std::str::FromStr for FormatTag {
    type Err = IngestError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "lines" => Ok(FormatTag::Lines),
            "tabular" => Ok(FormatTag::Tabular),
            "structured" => Ok(FormatTag::Structured),
            other => Err(IngestError::UnsupportedFormat(format!("tag '{}'", other))),
        }
    }
}

impl std::fmt::Display for FormatTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse `bytes` according to a format tag
pub fn parse(bytes: &[u8], tag: &str) -> Result<Parsed, IngestError> {
    let format: FormatTag = tag.parse()?;
    format.parser().parse(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_filename() {
        assert_eq!(FormatTag::from_filename("words.txt").unwrap(), FormatTag::Lines);
        assert_eq!(FormatTag::from_filename("Book1.XLSX").unwrap(), FormatTag::Tabular);
        assert_eq!(FormatTag::from_filename("dict.json").unwrap(), FormatTag::Structured);
    }

    #[test]
    fn test_from_filename_rejects_unknown() {
        for name in ["words.csv", "README", "archive.tar.gz", "xlsx"] {
            assert!(
                matches!(FormatTag::from_filename(name), Err(IngestError::UnsupportedFormat(_))),
                "{} should be rejected",
                name
            );
        }
    }

    #[test]
    fn test_parse_unknown_tag() {
        let result = parse(b"apple", "csv");
        assert!(matches!(result, Err(IngestError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_parse_dispatches_by_tag() {
        let parsed = parse(b"apple\nbanana", "lines").unwrap();
        assert_eq!(parsed, Parsed::Words(vec!["apple".into(), "banana".into()]));

        let parsed = parse(br#"[{"name":"zeta","trans":["n. z"]}]"#, "structured").unwrap();
        assert!(matches!(parsed, Parsed::Entries(ref e) if e.len() == 1));
    }
}
