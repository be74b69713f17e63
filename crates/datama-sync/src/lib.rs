//! # datama-sync: Application State and Initial Sync
//!
//! Holds the five entity collections and the current user, and loads every
//! collection from the backend in one call.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   TableSource (SupabaseClient)                                          │
//! │        │  select_all × 5, concurrent                                    │
//! │        ▼                                                                │
//! │   AppState::fetch_all ──► Store ──► Collection::replace / record_error  │
//! │        │                              │                                 │
//! │        ▼                              ▼                                 │
//! │   FetchReport                   watch::Receiver<CollectionSnapshot>     │
//! │   (per-table outcome)           (UI / other consumers)                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`state`] - `AppState` lifecycle and `fetch_all`
//! - [`store`] - The five collections plus current user
//! - [`collection`] - Observable replace-only collection
//! - [`report`] - Per-table fetch outcomes
//! - [`error`] - Sync error types

pub mod collection;
pub mod error;
pub mod report;
pub mod state;
pub mod store;

pub use collection::{Collection, CollectionSnapshot};
pub use error::{SyncError, SyncResult};
pub use report::{FetchReport, TableOutcome};
pub use state::AppState;
pub use store::Store;
