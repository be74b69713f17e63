//! # Auth State
//!
//! Holds the persisted session the client was started with and answers
//! "who is signed in" without a network call.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   session.json ──► Session::read ──► AuthState::from_session            │
//! │        │                                   │                            │
//! │   missing file                       expired? ──yes──► anonymous        │
//! │   malformed file ─────────────────────────►│                            │
//! │        │                                   no                           │
//! │        ▼                                   ▼                            │
//! │    anonymous                     signed in (user + bearer token)        │
//! │                                                                         │
//! │   Anonymous requests use the API key as the bearer token.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, TimeZone, Utc};
use datama_core::User;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{ClientError, ClientResult};

// =============================================================================
// Session
// =============================================================================

/// A session persisted by a previous sign-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// JWT sent as the bearer token.
    pub access_token: String,

    #[serde(default)]
    pub refresh_token: Option<String>,

    #[serde(default)]
    pub token_type: Option<String>,

    /// Expiry as unix seconds. Sessions without one never expire locally.
    #[serde(default)]
    pub expires_at: Option<i64>,

    pub user: User,
}

impl Session {
    /// Reads a session file. A missing file is `Ok(None)`.
    pub fn read(path: &Path) -> ClientResult<Option<Session>> {
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(path)?;
        let session = serde_json::from_str(&contents).map_err(|e| {
            ClientError::ConfigLoadFailed(format!(
                "session file {} is malformed: {}",
                path.display(),
                e
            ))
        })?;

        Ok(Some(session))
    }

    /// Expiry as a timestamp, if the session carries one.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
    }

    /// Returns true if the session has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().map(|at| at <= now).unwrap_or(false)
    }
}

// =============================================================================
// Auth State
// =============================================================================

/// The client's view of who is signed in.
#[derive(Debug, Clone, Default)]
pub struct AuthState {
    session: Option<Session>,
}

impl AuthState {
    /// No signed-in user; requests carry the API key only.
    pub fn anonymous() -> Self {
        AuthState { session: None }
    }

    /// Adopts `session` unless it has already expired.
    pub fn from_session(session: Session) -> Self {
        Self::from_session_at(session, Utc::now())
    }

    fn from_session_at(session: Session, now: DateTime<Utc>) -> Self {
        if session.is_expired_at(now) {
            info!(
                user = %session.user.display_name(),
                expires_at = ?session.expires_at(),
                "Persisted session has expired, continuing anonymously"
            );
            return Self::anonymous();
        }

        AuthState {
            session: Some(session),
        }
    }

    /// Loads the auth state from a session file.
    ///
    /// Never fails: unreadable or malformed sessions are logged and
    /// treated as signed out.
    pub fn load(path: &Path) -> Self {
        match Session::read(path) {
            Ok(Some(session)) => {
                let state = Self::from_session(session);
                if let Some(user) = state.current_user() {
                    info!(user = %user.display_name(), "Restored session");
                }
                state
            }
            Ok(None) => {
                debug!(?path, "No persisted session");
                Self::anonymous()
            }
            Err(e) => {
                warn!(?path, error = %e, "Ignoring unreadable session");
                Self::anonymous()
            }
        }
    }

    /// The signed-in user, if any.
    pub fn current_user(&self) -> Option<&User> {
        self.session.as_ref().map(|s| &s.user)
    }

    /// Access token to send as bearer, if signed in.
    pub fn access_token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.access_token.as_str())
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }
}
