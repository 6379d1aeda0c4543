//! Remote endpoint configuration from environment variables.

use std::time::Duration;

/// Where the hosted note store lives and how to reach it.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteConfig {
    /// Base URL, e.g. `https://project.example.co` (no trailing slash).
    pub url: String,
    /// Public API key sent with every request.
    pub anon_key: String,
    pub timeout: Duration,
}

const DEFAULT_TIMEOUT_SECS: u64 = 10;

impl RemoteConfig {
    pub fn new(url: &str, anon_key: &str) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read `NOTES_REMOTE_URL`, `NOTES_REMOTE_ANON_KEY` and the optional
    /// `NOTES_REMOTE_TIMEOUT_SECS`, loading a `.env` file first if present.
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let url = get("NOTES_REMOTE_URL").ok_or("NOTES_REMOTE_URL not set")?;
        let anon_key = get("NOTES_REMOTE_ANON_KEY").ok_or("NOTES_REMOTE_ANON_KEY not set")?;
        let timeout_secs = match get("NOTES_REMOTE_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|e| format!("NOTES_REMOTE_TIMEOUT_SECS: {e}"))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self::new(&url, &anon_key).with_timeout(Duration::from_secs(timeout_secs)))
    }
}
