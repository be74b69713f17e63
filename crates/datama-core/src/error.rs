//! # Error Types
//!
//! Domain errors for datama-core.
//!
//! ```text
//! CoreError    (this file)      - table names, row decoding
//! ClientError  (datama-client)  - config, HTTP, backend
//! SyncError    (datama-sync)    - application state lifecycle
//! ```

use thiserror::Error;

/// Core domain errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Table name is not one of the five synced tables.
    #[error("Unknown table: '{0}'. Valid tables: customer, employee, item, receipt, payment")]
    UnknownTable(String),

    /// Backend returned something other than a JSON array of objects.
    #[error("Malformed rows for table {table}: {reason}")]
    MalformedRows { table: String, reason: String },
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::UnknownTable("orders".to_string());
        assert!(err.to_string().starts_with("Unknown table: 'orders'"));

        let err = CoreError::MalformedRows {
            table: "item".to_string(),
            reason: "expected array".to_string(),
        };
        assert_eq!(err.to_string(), "Malformed rows for table item: expected array");
    }
}
