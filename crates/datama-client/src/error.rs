//! # Client Error Types
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Client Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Backend             │ │
//! │  │  (fatal)        │  │   (retryable)   │  │                         │ │
//! │  │  MissingCred.   │  │  Connection     │  │  Query (HTTP status)    │ │
//! │  │  InvalidUrl     │  │  Timeout        │  │  Decode                 │ │
//! │  │  InvalidConfig  │  │  Http           │  │  Core (row shape)       │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use datama_core::{CoreError, Table};
use serde::Deserialize;
use thiserror::Error;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors raised while bootstrapping the client or querying the backend.
///
/// Variants carry strings rather than source errors so that reports can be
/// cloned and handed to every observer of a collection.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// A required credential is missing or empty.
    #[error("{var} is not set. Supabase URL and key are required, check your environment")]
    MissingCredential { var: &'static str },

    /// Endpoint URL does not parse or is not http(s).
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Any other failure inside the HTTP client.
    #[error("HTTP error: {0}")]
    Http(String),

    // =========================================================================
    // Backend Errors
    // =========================================================================
    /// The backend answered with a non-success status.
    #[error("Query on {table} failed with HTTP {status}: {message}")]
    Query {
        table: Table,
        status: u16,
        message: String,
        code: Option<String>,
    },

    /// Response body was not valid JSON.
    #[error("Failed to decode {table} response: {reason}")]
    Decode { table: Table, reason: String },

    #[error(transparent)]
    Core(#[from] CoreError),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

/// Error body returned by the REST layer on failure.
#[derive(Debug, Default, Deserialize)]
struct RestErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    hint: Option<String>,
}

impl ClientError {
    /// Builds a [`ClientError::Query`] from a failed response.
    ///
    /// Uses the REST error body when it decodes, otherwise the raw text.
    pub fn from_response(table: Table, status: u16, body: &str) -> Self {
        let message = match serde_json::from_str::<RestErrorBody>(body) {
            Ok(parsed) => {
                let mut message = parsed
                    .message
                    .unwrap_or_else(|| fallback_message(status, body));
                if let Some(details) = parsed.details.filter(|d| !d.is_empty()) {
                    message = format!("{} ({})", message, details);
                }
                if let Some(hint) = parsed.hint.filter(|h| !h.is_empty()) {
                    message = format!("{}; hint: {}", message, hint);
                }
                return ClientError::Query {
                    table,
                    status,
                    message,
                    code: parsed.code,
                };
            }
            Err(_) => fallback_message(status, body),
        };

        ClientError::Query {
            table,
            status,
            message,
            code: None,
        }
    }

    /// Returns true if the request may succeed when repeated.
    ///
    /// ## Retryable
    /// - Connection failures and timeouts
    /// - HTTP 408, 429, 500, 502, 503, 504
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::ConnectionFailed(_) | ClientError::Timeout(_) => true,
            ClientError::Query { status, .. } => {
                matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
            }
            _ => false,
        }
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ClientError::MissingCredential { .. }
                | ClientError::InvalidUrl(_)
                | ClientError::InvalidConfig(_)
                | ClientError::ConfigLoadFailed(_)
        )
    }
}

fn fallback_message(status: u16, body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("empty response body (status {})", status)
    } else {
        trimmed.chars().take(200).collect()
    }
}
