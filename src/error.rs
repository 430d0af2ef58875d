//! Error types shared across the selection and column engines.
//!
//! Setup-time errors (malformed spec text, schema mismatches) abort handler
//! construction before any record is processed. Per-record conditions (an
//! addressed segment missing from a message, a cell that does not parse as
//! its declared type) are not errors and never surface here.

use std::fmt;

/// Error raised while parsing or validating a selection rule or column spec.
#[derive(Debug, Clone, PartialEq)]
pub enum SpecError {
    /// Spec text does not match the grammar.
    Syntax {
        /// The offending selector or column entry, verbatim.
        spec: String,
        reason: String,
    },
    /// Column name absent from the target table's schema.
    UnknownColumn {
        column: String,
        table: String,
        valid: Vec<String>,
    },
    /// Two column entries resolved to the same name or flat-row index.
    DuplicateColumn { column: String },
}

impl fmt::Display for SpecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecError::Syntax { spec, reason } => {
                write!(f, "Invalid spec '{}': {}", spec, reason)
            }
            SpecError::UnknownColumn {
                column,
                table,
                valid,
            } => {
                write!(
                    f,
                    "Column '{}' does not exist in target table '{}', valid columns are: {}",
                    column,
                    table,
                    valid.join(", ")
                )
            }
            SpecError::DuplicateColumn { column } => {
                write!(f, "Duplicate column definition '{}'", column)
            }
        }
    }
}

impl std::error::Error for SpecError {}

/// Error raised by external store operations (schema query, stored procedure).
///
/// Store calls are not retried; callers decide whether a failure aborts setup
/// or is logged and skipped.
#[derive(Debug)]
pub enum StoreError {
    Connection { target: String, reason: String },
    Query { query: String, reason: String },
    Procedure { name: String, reason: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Connection { target, reason } => {
                write!(f, "Cannot connect to '{}': {}", target, reason)
            }
            StoreError::Query { query, reason } => {
                write!(f, "Query '{}' failed: {}", query, reason)
            }
            StoreError::Procedure { name, reason } => {
                write!(f, "Stored procedure '{}' failed: {}", name, reason)
            }
        }
    }
}

impl std::error::Error for StoreError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_error_reports_offending_text() {
        let err = SpecError::Syntax {
            spec: "PID".to_string(),
            reason: "missing field index".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("PID"));
        assert!(message.contains("missing field index"));
    }

    #[test]
    fn unknown_column_lists_valid_names() {
        let err = SpecError::UnknownColumn {
            column: "AGE".to_string(),
            table: "PATIENTS".to_string(),
            valid: vec!["ID".to_string(), "NAME".to_string()],
        };
        let message = err.to_string();
        assert!(message.contains("AGE"));
        assert!(message.contains("PATIENTS"));
        assert!(message.contains("ID, NAME"));
    }
}
