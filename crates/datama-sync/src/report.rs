//! # Fetch Report
//!
//! Per-collection outcome of one `fetch_all` run. Every table gets an entry;
//! a failure in one never hides the result of another.

use datama_client::ClientError;
use datama_core::Table;
use std::time::Duration;

use crate::error::{SyncError, SyncResult};

/// Outcome for a single table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableOutcome {
    pub table: Table,
    /// Number of rows installed, or why the fetch failed.
    pub result: Result<usize, ClientError>,
}

/// Outcome of a full `fetch_all`.
#[derive(Debug, Clone, Default)]
pub struct FetchReport {
    outcomes: Vec<TableOutcome>,
    elapsed: Duration,
}

impl FetchReport {
    pub(crate) fn new(outcomes: Vec<TableOutcome>, elapsed: Duration) -> Self {
        FetchReport { outcomes, elapsed }
    }

    /// Outcomes in [`Table::ALL`] order.
    pub fn outcomes(&self) -> &[TableOutcome] {
        &self.outcomes
    }

    pub fn outcome(&self, table: Table) -> Option<&TableOutcome> {
        self.outcomes.iter().find(|o| o.table == table)
    }

    /// Rows installed for `table`, or `None` if its fetch failed.
    pub fn rows_loaded(&self, table: Table) -> Option<usize> {
        self.outcome(table).and_then(|o| o.result.as_ref().ok().copied())
    }

    pub fn failures(&self) -> impl Iterator<Item = (Table, &ClientError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.table, e)))
    }

    pub fn failed_tables(&self) -> Vec<Table> {
        self.failures().map(|(table, _)| table).collect()
    }

    /// True when every table loaded.
    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    /// Total rows installed across all successful tables.
    pub fn total_rows(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .sum()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Converts a partial load into [`SyncError::Incomplete`].
    pub fn into_result(self) -> SyncResult<Self> {
        if self.is_complete() {
            Ok(self)
        } else {
            Err(SyncError::Incomplete {
                failed: self.failed_tables(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> FetchReport {
        FetchReport::new(
            vec![
                TableOutcome {
                    table: Table::Customer,
                    result: Ok(3),
                },
                TableOutcome {
                    table: Table::Employee,
                    result: Ok(0),
                },
                TableOutcome {
                    table: Table::Item,
                    result: Err(ClientError::Timeout(30)),
                },
            ],
            Duration::from_millis(12),
        )
    }

    #[test]
    fn test_partial_report() {
        let report = report();
        assert!(!report.is_complete());
        assert_eq!(report.rows_loaded(Table::Customer), Some(3));
        assert_eq!(report.rows_loaded(Table::Employee), Some(0));
        assert_eq!(report.rows_loaded(Table::Item), None);
        assert_eq!(report.failed_tables(), vec![Table::Item]);
        assert_eq!(report.total_rows(), 3);
    }

    #[test]
    fn test_into_result() {
        match report().into_result() {
            Err(SyncError::Incomplete { failed }) => assert_eq!(failed, vec![Table::Item]),
            other => panic!("unexpected: {other:?}"),
        }

        let complete = FetchReport::new(
            vec![TableOutcome {
                table: Table::Payment,
                result: Ok(1),
            }],
            Duration::ZERO,
        );
        assert!(complete.into_result().is_ok());
    }
}
