//! # Client Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SUPABASE_URL=https://abc.supabase.co                               │
//! │     SUPABASE_KEY=<anon key>                                            │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/datama/config.toml (Linux)                               │
//! │     ~/Library/Application Support/com.datama.datama/config.toml (macOS)│
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     No URL, no key: validation fails unless one of the above sets them │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Only the `SUPABASE_URL` / `SUPABASE_KEY` pair is read. The
//! `VITE_SUPABASE_URL` / `VITE_SUPABASE_ANON_KEY` pair is ignored; when it is
//! present and the canonical pair is not, a warning is logged.
//!
//! ## Configuration File Format
//! ```toml
//! [backend]
//! url = "https://abc.supabase.co"
//! api_key = "eyJhbGciOi..."
//! schema = "public"
//!
//! [http]
//! timeout_secs = 30
//! max_retries = 2
//! initial_backoff_ms = 200
//! max_backoff_secs = 5
//!
//! [auth]
//! session_path = "/var/lib/datama/session.json"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ClientError, ClientResult};

/// Environment variable holding the endpoint URL.
pub const URL_VAR: &str = "SUPABASE_URL";

/// Environment variable holding the API key.
pub const KEY_VAR: &str = "SUPABASE_KEY";

const LEGACY_URL_VAR: &str = "VITE_SUPABASE_URL";
const LEGACY_KEY_VAR: &str = "VITE_SUPABASE_ANON_KEY";

// =============================================================================
// Backend Settings
// =============================================================================

/// Where the backend lives and how to identify to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Project URL, e.g. `https://abc.supabase.co`.
    #[serde(default)]
    pub url: String,

    /// Project API key (anon or service key).
    #[serde(default)]
    pub api_key: String,

    /// Database schema the REST layer reads from.
    #[serde(default = "default_schema")]
    pub schema: String,
}

fn default_schema() -> String {
    "public".to_string()
}

impl Default for BackendSettings {
    fn default() -> Self {
        BackendSettings {
            url: String::new(),
            api_key: String::new(),
            schema: default_schema(),
        }
    }
}

// =============================================================================
// HTTP Settings
// =============================================================================

/// Request timeout and retry schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Retries for transient failures. 0 disables retry.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// First backoff delay (milliseconds).
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    /// Backoff ceiling (seconds).
    #[serde(default = "default_max_backoff")]
    pub max_backoff_secs: u64,
}

fn default_timeout() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    2
}
fn default_initial_backoff() -> u64 {
    200
}
fn default_max_backoff() -> u64 {
    5
}

impl Default for HttpSettings {
    fn default() -> Self {
        HttpSettings {
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_secs: default_max_backoff(),
        }
    }
}

// =============================================================================
// Auth Settings
// =============================================================================

/// Persisted session location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthSettings {
    /// Session file. Falls back to the platform data dir when unset.
    #[serde(default)]
    pub session_path: Option<PathBuf>,
}

// =============================================================================
// Client Configuration
// =============================================================================

/// Complete client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub backend: BackendSettings,

    #[serde(default)]
    pub http: HttpSettings,

    #[serde(default)]
    pub auth: AuthSettings,
}

impl ClientConfig {
    /// Creates a config from explicit credentials and default settings.
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        ClientConfig {
            backend: BackendSettings {
                url: url.into(),
                api_key: api_key.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Reads configuration from the process environment only.
    pub fn from_env() -> ClientResult<Self> {
        let mut config = Self::default();
        config.apply_overrides_from(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (config.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ClientResult<Self> {
        let path = config_path.or_else(Self::default_config_path);
        Self::load_with(path.as_deref(), |key| std::env::var(key).ok())
    }

    fn load_with<F>(path: Option<&Path>, lookup: F) -> ClientResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = path {
            if path.exists() {
                info!(?path, "Loading client config from file");
                let contents = std::fs::read_to_string(path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using environment only");
            }
        }

        config.apply_overrides_from(lookup);
        config.validate()?;

        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// Both credentials must be non-empty and the URL must be absolute
    /// http(s). Nothing here talks to the backend.
    pub fn validate(&self) -> ClientResult<()> {
        if self.backend.url.trim().is_empty() {
            return Err(ClientError::MissingCredential { var: URL_VAR });
        }

        if self.backend.api_key.trim().is_empty() {
            return Err(ClientError::MissingCredential { var: KEY_VAR });
        }

        self.endpoint()?;

        if self.backend.schema.trim().is_empty() {
            return Err(ClientError::InvalidConfig("schema must not be empty".into()));
        }

        if self.http.timeout_secs == 0 {
            return Err(ClientError::InvalidConfig(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Parses the endpoint URL.
    pub fn endpoint(&self) -> ClientResult<Url> {
        let url = Url::parse(self.backend.url.trim())?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ClientError::InvalidUrl(format!(
                "URL must use http:// or https://, got {}://",
                other
            ))),
        }
    }

    /// Session file to read the current user from, if any location is known.
    pub fn session_path(&self) -> Option<PathBuf> {
        self.auth.session_path.clone().or_else(|| {
            directories::ProjectDirs::from("com", "datama", "datama")
                .map(|dirs| dirs.data_dir().join("session.json"))
        })
    }

    fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup(URL_VAR);
        let key = lookup(KEY_VAR);

        if legacy_vars_only(&lookup) {
            warn!(
                legacy = %format!("{}/{}", LEGACY_URL_VAR, LEGACY_KEY_VAR),
                expected = %format!("{}/{}", URL_VAR, KEY_VAR),
                "Ignoring legacy Supabase variables; rename them"
            );
        }

        if let Some(url) = url {
            debug!(url = %url, "Overriding endpoint URL from environment");
            self.backend.url = url;
        }

        if let Some(key) = key {
            self.backend.api_key = key;
        }

        if let Some(schema) = lookup("SUPABASE_SCHEMA") {
            self.backend.schema = schema;
        }

        if let Some(timeout) = lookup("SUPABASE_TIMEOUT_SECS") {
            match timeout.parse::<u64>() {
                Ok(secs) => self.http.timeout_secs = secs,
                Err(_) => warn!(value = %timeout, "Ignoring invalid SUPABASE_TIMEOUT_SECS"),
            }
        }

        if let Some(retries) = lookup("SUPABASE_MAX_RETRIES") {
            match retries.parse::<u32>() {
                Ok(n) => self.http.max_retries = n,
                Err(_) => warn!(value = %retries, "Ignoring invalid SUPABASE_MAX_RETRIES"),
            }
        }

        if let Some(path) = lookup("SUPABASE_SESSION_PATH") {
            self.auth.session_path = Some(PathBuf::from(path));
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "datama", "datama")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

/// True when only the `VITE_`-prefixed credentials are set.
fn legacy_vars_only<F>(lookup: &F) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    lookup(URL_VAR).is_none()
        && lookup(KEY_VAR).is_none()
        && (lookup(LEGACY_URL_VAR).is_some() || lookup(LEGACY_KEY_VAR).is_some())
}
