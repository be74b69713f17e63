//! # Application State
//!
//! Owns the client handle and the store for the lifetime of the process.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  AppState::initialize(config)                                           │
//! │     ├─ SupabaseClient::new      (fails fast on missing URL/key)         │
//! │     ├─ client.current_user()    (local session, no network)             │
//! │     └─ Store::new(user)         (five empty collections)                │
//! │                                                                         │
//! │  state.fetch_all().await        (any number of times)                   │
//! │     ├─ customer ─┐                                                      │
//! │     ├─ employee ─┤                                                      │
//! │     ├─ item ─────┼─ concurrent select_all, each applied on arrival     │
//! │     ├─ receipt ──┤                                                      │
//! │     └─ payment ──┘                                                      │
//! │                                                                         │
//! │  state.shutdown()               (closes every subscriber)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use datama_client::{ClientConfig, ClientResult, SupabaseClient, TableSource};
use datama_core::{Row, Table, User};
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::error::SyncResult;
use crate::report::{FetchReport, TableOutcome};
use crate::store::Store;

/// Client handle plus the store it feeds.
pub struct AppState {
    source: Arc<dyn TableSource>,
    store: Store,
}

impl AppState {
    /// Bootstraps the client from `config` and creates an empty store.
    ///
    /// The current user is read once here from the client's auth state.
    pub fn initialize(config: ClientConfig) -> SyncResult<Self> {
        let client = SupabaseClient::new(config)?;
        let user = client.current_user();
        Ok(Self::with_source(Arc::new(client), user))
    }

    /// Builds the state around any table source.
    pub fn with_source(source: Arc<dyn TableSource>, user: Option<User>) -> Self {
        match &user {
            Some(user) => info!(user = %user.display_name(), "Application state created"),
            None => info!("Application state created without a signed-in user"),
        }

        AppState {
            source,
            store: Store::new(user),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn current_user(&self) -> Option<User> {
        self.store.current_user()
    }

    /// Reloads every collection from the backend.
    ///
    /// Each table is queried independently. A successful query replaces its
    /// collection in full; a failed one leaves the collection's rows as they
    /// were and records the error on it. Never returns early.
    pub async fn fetch_all(&self) -> FetchReport {
        let started = Instant::now();
        info!("Fetching all collections");

        let outcomes = join_all(Table::ALL.map(|table| async move {
            let result = self.source.select_all(table).await;
            self.apply(table, result)
        }))
        .await;

        let report = FetchReport::new(outcomes, started.elapsed());
        if report.is_complete() {
            info!(
                rows = report.total_rows(),
                elapsed_ms = report.elapsed().as_millis() as u64,
                "All collections loaded"
            );
        } else {
            warn!(
                failed = ?report.failed_tables(),
                rows = report.total_rows(),
                "Some collections failed to load"
            );
        }
        report
    }

    fn apply(&self, table: Table, result: ClientResult<Vec<Row>>) -> TableOutcome {
        let collection = self.store.collection(table);
        let result = match result {
            Ok(rows) => {
                let count = rows.len();
                collection.replace(rows);
                info!(%table, rows = count, "Collection replaced");
                Ok(count)
            }
            Err(e) => {
                warn!(
                    %table,
                    error = %e,
                    retryable = e.is_retryable(),
                    kept_rows = collection.len(),
                    "Collection fetch failed"
                );
                collection.record_error(e.clone());
                Err(e)
            }
        };

        TableOutcome { table, result }
    }

    /// Tears down the state. Subscribers observe their channels closing.
    pub fn shutdown(self) {
        info!("Application state shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use datama_client::ClientError;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory backend whose contents can change between fetches.
    #[derive(Default)]
    struct FakeBackend {
        tables: Mutex<HashMap<Table, ClientResult<Vec<Row>>>>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl FakeBackend {
        fn set(&self, table: Table, result: ClientResult<Vec<Row>>) {
            self.tables.lock().unwrap().insert(table, result);
        }
    }

    #[async_trait]
    impl TableSource for FakeBackend {
        async fn select_all(&self, table: Table) -> ClientResult<Vec<Row>> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            self.tables
                .lock()
                .unwrap()
                .get(&table)
                .cloned()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn rows(ids: &[i64]) -> Vec<Row> {
        ids.iter()
            .map(|id| json!({ "id": id }).as_object().cloned().unwrap())
            .collect()
    }

    fn ids(state: &AppState, table: Table) -> Vec<i64> {
        state
            .store()
            .collection(table)
            .rows()
            .iter()
            .map(|r| r["id"].as_i64().unwrap())
            .collect()
    }

    fn state(backend: &Arc<FakeBackend>) -> AppState {
        AppState::with_source(backend.clone(), None)
    }

    #[tokio::test]
    async fn test_scenario_three_customers_no_employees() {
        let backend = Arc::new(FakeBackend::default());
        backend.set(Table::Customer, Ok(rows(&[7, 2, 5])));
        backend.set(Table::Employee, Ok(rows(&[])));
        let state = state(&backend);

        let report = state.fetch_all().await;

        assert!(report.is_complete());
        assert_eq!(ids(&state, Table::Customer), [7, 2, 5]);
        assert!(state.store().employees().is_empty());
        assert!(state.store().employees().snapshot().is_loaded());
        assert_eq!(report.rows_loaded(Table::Customer), Some(3));
        assert_eq!(report.outcomes().len(), 5);
    }

    #[tokio::test]
    async fn test_second_fetch_replaces_not_merges() {
        let backend = Arc::new(FakeBackend::default());
        backend.set(Table::Item, Ok(rows(&[1, 2, 3])));
        backend.set(Table::Receipt, Ok(rows(&[10])));
        let state = state(&backend);
        state.fetch_all().await;

        backend.set(Table::Item, Ok(rows(&[4])));
        backend.set(Table::Receipt, Ok(rows(&[])));
        state.fetch_all().await;

        assert_eq!(ids(&state, Table::Item), [4]);
        assert!(ids(&state, Table::Receipt).is_empty());
    }

    #[tokio::test]
    async fn test_one_failure_does_not_block_others() {
        let backend = Arc::new(FakeBackend::default());
        backend.set(Table::Customer, Ok(rows(&[1])));
        backend.set(Table::Item, Ok(rows(&[100, 101])));
        let state = state(&backend);
        state.fetch_all().await;

        backend.set(Table::Customer, Ok(rows(&[1, 2])));
        backend.set(Table::Employee, Ok(rows(&[8])));
        backend.set(
            Table::Item,
            Err(ClientError::from_response(Table::Item, 500, "boom")),
        );
        backend.set(Table::Receipt, Ok(rows(&[30])));
        backend.set(Table::Payment, Ok(rows(&[40, 41])));

        let report = state.fetch_all().await;

        assert_eq!(report.failed_tables(), vec![Table::Item]);
        assert_eq!(ids(&state, Table::Customer), [1, 2]);
        assert_eq!(ids(&state, Table::Employee), [8]);
        assert_eq!(ids(&state, Table::Receipt), [30]);
        assert_eq!(ids(&state, Table::Payment), [40, 41]);

        // Failed collection keeps its last good rows and records why.
        let items = state.store().items().snapshot();
        assert_eq!(items.len(), 2);
        assert!(matches!(
            items.last_error,
            Some(ClientError::Query { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_unchanged_backend_is_idempotent() {
        let backend = Arc::new(FakeBackend::default());
        for (i, table) in Table::ALL.into_iter().enumerate() {
            backend.set(table, Ok(rows(&[i as i64, 50 + i as i64])));
        }
        let state = state(&backend);

        state.fetch_all().await;
        let first: Vec<Vec<i64>> = Table::ALL.iter().map(|t| ids(&state, *t)).collect();
        state.fetch_all().await;
        let second: Vec<Vec<i64>> = Table::ALL.iter().map(|t| ids(&state, *t)).collect();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_queries_run_concurrently() {
        let backend = Arc::new(FakeBackend::default());
        let state = state(&backend);

        state.fetch_all().await;

        assert!(backend.peak.load(Ordering::SeqCst) > 1);
    }

    #[tokio::test]
    async fn test_observers_notified_on_fetch() {
        let backend = Arc::new(FakeBackend::default());
        backend.set(Table::Payment, Ok(rows(&[1, 2, 3])));
        let state = state(&backend);
        let mut payments = state.store().payments().subscribe();

        state.fetch_all().await;

        payments.changed().await.unwrap();
        assert_eq!(payments.borrow().len(), 3);
    }

    #[tokio::test]
    async fn test_shutdown_closes_subscribers() {
        let backend = Arc::new(FakeBackend::default());
        let state = state(&backend);
        let mut customers = state.store().customers().subscribe();
        let mut user = state.store().subscribe_user();

        state.shutdown();

        assert!(customers.changed().await.is_err());
        assert!(user.changed().await.is_err());
    }

    #[test]
    fn test_initialize_fails_without_credentials() {
        let err = AppState::initialize(ClientConfig::new("https://abc.supabase.co", ""))
            .err()
            .unwrap();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_initialize_reads_user_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let session_path = dir.path().join("session.json");
        std::fs::write(
            &session_path,
            json!({
                "access_token": "user-jwt",
                "user": {
                    "id": "6f1c2d9e-8a4b-4c4e-9f7a-2b3c4d5e6f70",
                    "email": "clerk@example.com"
                }
            })
            .to_string(),
        )
        .unwrap();

        // Nothing listens on this port.
        let mut config = ClientConfig::new("http://127.0.0.1:9", "anon-key");
        config.auth.session_path = Some(session_path);

        let state = AppState::initialize(config).unwrap();
        assert_eq!(
            state.current_user().and_then(|u| u.email),
            Some("clerk@example.com".to_string())
        );
        assert!(state.store().customers().is_empty());
    }

    #[test]
    fn test_initialize_without_session_has_no_user() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ClientConfig::new("https://abc.supabase.co", "anon-key");
        config.auth.session_path = Some(dir.path().join("missing.json"));

        let state = AppState::initialize(config).unwrap();
        assert!(state.current_user().is_none());
    }
}
