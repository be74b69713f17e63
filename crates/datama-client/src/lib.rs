//! # datama-client: Client Bootstrap
//!
//! Turns configuration into a handle on the hosted backend, and reads every
//! row of a table through it.
//!
//! ## Bootstrap Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ClientConfig::load ──► validate ──► SupabaseClient::new                │
//! │   (file + env)            │             │                               │
//! │                           │             ├─► AuthState::load (session)   │
//! │              missing URL/key?           └─► reqwest::Client (no I/O)    │
//! │                           │                                             │
//! │                           ▼                                             │
//! │                 ClientError::MissingCredential (fatal)                  │
//! │                                                                         │
//! │  Later: TableSource::select_all(table) ──► GET /rest/v1/{table}         │
//! │                                            (retry on transient errors)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Configuration (TOML file, environment, validation)
//! - [`auth`] - Persisted session and current user
//! - [`client`] - `SupabaseClient` and the `TableSource` trait
//! - [`retry`] - Backoff policy for transient failures
//! - [`error`] - Client error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use datama_client::{ClientConfig, SupabaseClient, TableSource};
//! use datama_core::Table;
//!
//! let client = SupabaseClient::new(ClientConfig::load(None)?)?;
//! let customers = client.select_all(Table::Customer).await?;
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod retry;

pub use auth::{AuthState, Session};
pub use client::{SupabaseClient, TableSource};
pub use config::{AuthSettings, BackendSettings, ClientConfig, HttpSettings, KEY_VAR, URL_VAR};
pub use error::{ClientError, ClientResult};
pub use retry::RetryPolicy;
