//! # datama-core: Domain Types for Datama
//!
//! Pure types shared by the client and the sync layer. Nothing in this crate
//! touches the network or the file system.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Datama Data Flow                               │
//! │                                                                         │
//! │   Environment ──► datama-client ──► datama-sync ──► observers           │
//! │                        │                 │                              │
//! │                        └────────┬────────┘                              │
//! │                                 ▼                                       │
//! │                  ★ datama-core (THIS CRATE) ★                          │
//! │                                                                         │
//! │        ┌───────────┐   ┌───────────┐   ┌───────────┐                   │
//! │        │   Table   │   │    Row    │   │   User    │                   │
//! │        │ customer  │   │ JSON map  │   │ id, email │                   │
//! │        │ employee  │   │ (untyped) │   │ role      │                   │
//! │        │ item ...  │   └───────────┘   └───────────┘                   │
//! │        └───────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - `Table`, `Row`, `User`
//! - [`error`] - Domain error types

pub mod error;
pub mod types;

pub use error::{CoreError, CoreResult};
pub use types::*;
