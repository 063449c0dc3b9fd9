use std::fmt;
use std::time::Duration;

use crate::error::{ReconError, Result};

pub const ENDPOINT_VAR: &str = "AZURE_ENDPOINT";
pub const KEY_VAR: &str = "AZURE_KEY";

pub const DEFAULT_TOLERANCE: f64 = 10.0;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
const DEFAULT_MAX_POLLS: u32 = 60;

fn load_env() {
    let _ = dotenvy::dotenv();
}

/// Credentials and timing for the document intelligence service.
///
/// Built once at startup and handed to the client; nothing below reads the
/// environment again.
#[derive(Clone)]
pub struct AzureConfig {
    pub endpoint: String,
    pub key: String,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
    pub max_polls: u32,
}

impl AzureConfig {
    pub fn new(endpoint: impl Into<String>, key: impl Into<String>) -> Self {
        let endpoint: String = endpoint.into();
        Self {
            endpoint: endpoint.trim().trim_end_matches('/').to_string(),
            key: key.into().trim().to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_polls: DEFAULT_MAX_POLLS,
        }
    }

    /// Load `AZURE_ENDPOINT` / `AZURE_KEY`, reading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        load_env();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`AzureConfig::from_env`] with a caller-supplied variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &str| -> Result<String> {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ReconError::Config(format!("{} not set in environment or .env", name)))
        };
        let endpoint = require(ENDPOINT_VAR)?;
        let key = require(KEY_VAR)?;
        if !endpoint.trim().starts_with("http://") && !endpoint.trim().starts_with("https://") {
            return Err(ReconError::Config(format!(
                "{} must be an http(s) URL, got '{}'",
                ENDPOINT_VAR,
                endpoint.trim()
            )));
        }
        Ok(Self::new(endpoint, key))
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_polls(mut self, max_polls: u32) -> Self {
        self.max_polls = max_polls;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

// Keep the key out of logs.
impl fmt::Debug for AzureConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureConfig")
            .field("endpoint", &self.endpoint)
            .field("key", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .field("poll_interval", &self.poll_interval)
            .field("max_polls", &self.max_polls)
            .finish()
    }
}

/// "configured" when both credentials are present and non-blank, else "not_configured".
pub fn credentials_status() -> &'static str {
    match AzureConfig::from_env() {
        Ok(_) => "configured",
        Err(_) => "not_configured",
    }
}

/// Largest absolute difference still counted as a match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance(f64);

impl Tolerance {
    pub fn new(value: f64) -> Result<Self> {
        if value.is_finite() && value >= 0.0 {
            Ok(Self(value))
        } else {
            Err(ReconError::InvalidTolerance(value))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn allows(self, difference: f64) -> bool {
        difference.abs() <= self.0
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self(DEFAULT_TOLERANCE)
    }
}

impl fmt::Display for Tolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
