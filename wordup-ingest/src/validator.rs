//! Shape validation for entry collections
//!
//! A candidate passes when it is an array whose elements are objects with a
//! string `name` and a `trans` array of strings. Phonetic fields are not
//! required; older records may lack them.

use serde_json::Value;
use std::fmt;
use wordup_common::Entry;

/// First shape violation found in a candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// Offending element, `None` when the candidate itself is wrong
    pub index: Option<usize>,
    pub reason: String,
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "entry {}: {}", index, self.reason),
            None => f.write_str(&self.reason),
        }
    }
}

impl std::error::Error for SchemaViolation {}

/// True when `candidate` has the canonical collection shape
pub fn validate(candidate: &Value) -> bool {
    check(candidate).is_ok()
}

/// Like [`validate`], reporting where the shape breaks
pub fn check(candidate: &Value) -> Result<(), SchemaViolation> {
    let elements = candidate.as_array().ok_or_else(|| SchemaViolation {
        index: None,
        reason: "expected an array of entries".to_string(),
    })?;

    for (index, element) in elements.iter().enumerate() {
        let violation = |reason: &str| SchemaViolation {
            index: Some(index),
            reason: reason.to_string(),
        };

        let object = element
            .as_object()
            .ok_or_else(|| violation("expected an object"))?;

        match object.get("name") {
            Some(Value::String(_)) => {}
            _ => return Err(violation("'name' must be a string")),
        }

        match object.get("trans") {
            Some(Value::Array(trans)) if trans.iter().all(Value::is_string) => {}
            Some(Value::Array(_)) => {
                return Err(violation("every element of 'trans' must be a string"))
            }
            _ => return Err(violation("'trans' must be an array")),
        }
    }

    Ok(())
}

/// Entry-level invariants checked before persisting
///
/// Beyond the shape, a persisted entry needs a non-empty name and at least
/// one translation.
pub fn check_entries(entries: &[Entry]) -> Result<(), SchemaViolation> {
    let value = serde_json::to_value(entries).map_err(|e| SchemaViolation {
        index: None,
        reason: format!("entries do not serialize: {}", e),
    })?;
    check(&value)?;

    for (index, entry) in entries.iter().enumerate() {
        if entry.name.trim().is_empty() {
            return Err(SchemaViolation {
                index: Some(index),
                reason: "'name' must not be empty".to_string(),
            });
        }
        if entry.trans.is_empty() {
            return Err(SchemaViolation {
                index: Some(index),
                reason: "'trans' must contain at least one translation".to_string(),
            });
        }
    }

    Ok(())
}
