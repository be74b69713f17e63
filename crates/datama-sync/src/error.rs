//! # Sync Error Types

use datama_client::ClientError;
use datama_core::Table;
use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    /// The client handle could not be built. Fatal at startup.
    #[error("Client bootstrap failed: {0}")]
    Bootstrap(#[from] ClientError),

    /// One or more collections failed to load.
    #[error("Initial sync incomplete, failed tables: {}", table_list(.failed))]
    Incomplete { failed: Vec<Table> },
}

fn table_list(tables: &[Table]) -> String {
    tables
        .iter()
        .map(Table::name)
        .collect::<Vec<_>>()
        .join(", ")
}

impl SyncError {
    /// Returns true if this error stops the process from starting.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SyncError::Bootstrap(_))
    }
}
