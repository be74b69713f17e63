//! # Supabase Client
//!
//! The client handle used for every query against the hosted backend.
//!
//! ## Request Shape
//! ```text
//! GET {url}/rest/v1/{table}?select=*
//!   apikey:         <api key>
//!   Authorization:  Bearer <session access token | api key>
//!   Accept-Profile: <schema>
//!   Accept:         application/json
//! ```
//!
//! Construction validates the configuration and builds the HTTP client but
//! never sends a request. Bad credentials only show up on the first query.

use async_trait::async_trait;
use datama_core::{rows_from_value, Row, Table, User};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::auth::AuthState;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::retry::RetryPolicy;

// =============================================================================
// Table Source
// =============================================================================

/// Anything that can return every row of a table.
///
/// Implemented by [`SupabaseClient`]; tests substitute in-memory sources.
#[async_trait]
pub trait TableSource: Send + Sync {
    /// Reads all rows of `table`, unfiltered, in the order the source returns them.
    async fn select_all(&self, table: Table) -> ClientResult<Vec<Row>>;
}

// =============================================================================
// Supabase Client
// =============================================================================

/// Handle to the hosted backend. Cheap to clone.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: reqwest::Client,
    endpoint: Url,
    rest_url: Url,
    auth: AuthState,
    retry: RetryPolicy,
    timeout: Duration,
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("endpoint", &self.inner.endpoint.as_str())
            .field("signed_in", &self.inner.auth.is_signed_in())
            .finish_non_exhaustive()
    }
}

impl SupabaseClient {
    /// Bootstraps the client from `config`.
    ///
    /// Fails if the URL or API key is missing or empty. The persisted session
    /// (if any) is loaded here so [`current_user`](Self::current_user) is
    /// answerable immediately.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        config.validate()?;
        let auth = config
            .session_path()
            .map(|path| AuthState::load(&path))
            .unwrap_or_default();
        Self::with_auth(config, auth)
    }

    /// Bootstraps the client with an explicit auth state.
    pub fn with_auth(config: ClientConfig, auth: AuthState) -> ClientResult<Self> {
        config.validate()?;

        let endpoint = config.endpoint()?;
        let rest_url = rest_base(&endpoint)?;
        let timeout = Duration::from_secs(config.http.timeout_secs);
        let headers = default_headers(&config, &auth)?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .user_agent(concat!("datama/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Http(e.to_string()))?;

        info!(
            endpoint = %endpoint,
            schema = %config.backend.schema,
            signed_in = auth.is_signed_in(),
            "Supabase client initialized"
        );

        Ok(SupabaseClient {
            inner: Arc::new(Inner {
                http,
                endpoint,
                rest_url,
                auth,
                retry: RetryPolicy::from_settings(&config.http),
                timeout,
            }),
        })
    }

    /// Reads the API endpoint and key from the environment and bootstraps.
    pub fn from_env() -> ClientResult<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }

    /// The signed-in user, read from local auth state only.
    pub fn current_user(&self) -> Option<User> {
        self.inner.auth.current_user().cloned()
    }

    pub fn auth(&self) -> &AuthState {
        &self.inner.auth
    }

    /// URL for a select-all on `table`.
    pub fn table_url(&self, table: Table) -> ClientResult<Url> {
        let mut url = self.inner.rest_url.join(table.name())?;
        url.query_pairs_mut().append_pair("select", "*");
        Ok(url)
    }

    async fn select_once(&self, table: Table) -> ClientResult<Vec<Row>> {
        let url = self.table_url(table)?;
        debug!(%table, %url, "Selecting all rows");

        let response = self
            .inner
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    debug!(%table, status = status.as_u16(), error = %e, "Error body unreadable");
                    String::new()
                }
            };
            return Err(ClientError::from_response(table, status.as_u16(), &body));
        }

        let bytes = response.bytes().await.map_err(|e| self.body_error(e))?;
        let body: Value = serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode {
            table,
            reason: e.to_string(),
        })?;

        Ok(rows_from_value(table, body)?)
    }

    fn send_error(&self, err: reqwest::Error) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout(self.inner.timeout.as_secs())
        } else if err.is_connect() {
            ClientError::ConnectionFailed(err.to_string())
        } else {
            ClientError::Http(err.to_string())
        }
    }

    /// A 2xx body that could not be read in full is a transport fault.
    fn body_error(&self, err: reqwest::Error) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout(self.inner.timeout.as_secs())
        } else {
            ClientError::ConnectionFailed(format!("response body interrupted: {}", err))
        }
    }
}

#[async_trait]
impl TableSource for SupabaseClient {
    async fn select_all(&self, table: Table) -> ClientResult<Vec<Row>> {
        let rows = self
            .inner
            .retry
            .run(table, || self.select_once(table))
            .await?;
        debug!(%table, rows = rows.len(), "Select complete");
        Ok(rows)
    }
}

/// `{endpoint}/rest/v1/`, keeping any path prefix on the endpoint.
fn rest_base(endpoint: &Url) -> ClientResult<Url> {
    let mut base = endpoint.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.set_query(None);
    Ok(base.join("rest/v1/")?)
}

fn default_headers(config: &ClientConfig, auth: &AuthState) -> ClientResult<HeaderMap> {
    let key = config.backend.api_key.trim();
    let bearer = auth.access_token().unwrap_or(key);

    let mut api_key = HeaderValue::from_str(key).map_err(|_| {
        ClientError::InvalidConfig("API key contains characters not allowed in a header".into())
    })?;
    api_key.set_sensitive(true);

    let mut authorization = HeaderValue::from_str(&format!("Bearer {}", bearer))
        .map_err(|_| ClientError::InvalidConfig("access token is not a valid header".into()))?;
    authorization.set_sensitive(true);

    let profile = HeaderValue::from_str(config.backend.schema.trim())
        .map_err(|_| ClientError::InvalidConfig("schema is not a valid header".into()))?;

    let mut headers = HeaderMap::new();
    headers.insert("apikey", api_key);
    headers.insert(AUTHORIZATION, authorization);
    headers.insert("accept-profile", profile);
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    Ok(headers)
}
