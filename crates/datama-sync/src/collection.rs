//! # Observable Collections
//!
//! One collection per synced table. Each holds the full current snapshot of
//! the table and notifies subscribers whenever it changes.
//!
//! ## Update Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   fetch ok   ──► replace(rows)      rows := new rows (no merge)         │
//! │                                     synced_at := now                    │
//! │                                     last_error := None                  │
//! │                                                                         │
//! │   fetch err  ──► record_error(e)    rows unchanged                      │
//! │                                     last_error := Some(e)               │
//! │                                                                         │
//! │   Both notify every watch::Receiver from subscribe().                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use datama_client::ClientError;
use datama_core::{Row, Table};
use std::sync::Arc;
use tokio::sync::watch;

/// Point-in-time view of a collection.
#[derive(Debug, Clone, Default)]
pub struct CollectionSnapshot {
    /// Rows in the order the backend returned them.
    pub rows: Arc<Vec<Row>>,

    /// When `rows` was last replaced by a successful fetch.
    pub synced_at: Option<DateTime<Utc>>,

    /// Error from the most recent fetch, if it failed.
    pub last_error: Option<ClientError>,
}

impl CollectionSnapshot {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// True once at least one fetch has succeeded.
    pub fn is_loaded(&self) -> bool {
        self.synced_at.is_some()
    }
}

/// An observable, replace-only container for one table's rows.
#[derive(Debug)]
pub struct Collection {
    table: Table,
    tx: watch::Sender<CollectionSnapshot>,
}

impl Collection {
    /// Creates an empty collection for `table`.
    pub fn new(table: Table) -> Self {
        let (tx, _) = watch::channel(CollectionSnapshot::default());
        Collection { table, tx }
    }

    pub fn table(&self) -> Table {
        self.table
    }

    /// Current rows. Cheap: shares the underlying vector.
    pub fn rows(&self) -> Arc<Vec<Row>> {
        self.tx.borrow().rows.clone()
    }

    pub fn snapshot(&self) -> CollectionSnapshot {
        self.tx.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.tx.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.borrow().is_empty()
    }

    /// Subscribes to every future replace or error.
    pub fn subscribe(&self) -> watch::Receiver<CollectionSnapshot> {
        self.tx.subscribe()
    }

    /// Discards the current rows and installs `rows`.
    pub(crate) fn replace(&self, rows: Vec<Row>) {
        let rows = Arc::new(rows);
        self.tx.send_modify(|snapshot| {
            snapshot.rows = rows;
            snapshot.synced_at = Some(Utc::now());
            snapshot.last_error = None;
        });
    }

    /// Records a failed fetch without touching the rows.
    pub(crate) fn record_error(&self, error: ClientError) {
        self.tx.send_modify(|snapshot| {
            snapshot.last_error = Some(error);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(id: i64) -> Row {
        json!({ "id": id }).as_object().cloned().unwrap()
    }

    #[test]
    fn test_starts_empty() {
        let collection = Collection::new(Table::Customer);
        assert_eq!(collection.table(), Table::Customer);
        assert!(collection.is_empty());
        assert!(!collection.snapshot().is_loaded());
    }

    #[test]
    fn test_replace_discards_previous_rows() {
        let collection = Collection::new(Table::Item);
        collection.replace(vec![row(1), row(2), row(3)]);
        collection.replace(vec![row(9)]);

        let rows = collection.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], 9);
        assert!(collection.snapshot().is_loaded());
    }

    #[test]
    fn test_error_keeps_rows() {
        let collection = Collection::new(Table::Receipt);
        collection.replace(vec![row(1)]);
        collection.record_error(ClientError::Timeout(30));

        let snapshot = collection.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.last_error, Some(ClientError::Timeout(30)));

        collection.replace(vec![]);
        assert!(collection.snapshot().last_error.is_none());
    }

    #[tokio::test]
    async fn test_subscribers_see_replace() {
        let collection = Collection::new(Table::Payment);
        let mut rx = collection.subscribe();

        collection.replace(vec![row(4), row(5)]);

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().len(), 2);
    }
}
