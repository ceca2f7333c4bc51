use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{FetchError, Result};

/// Delay strategy applied between a failed attempt and the next one.
///
/// The base delay is always the per-attempt timeout.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backoff {
    /// Wait `timeout` before every retry.
    #[default]
    Flat,
    /// Wait `timeout * n²` after the n-th attempt (1-based).
    Quadratic,
}

impl Backoff {
    /// Delay to wait after attempt number `attempt` (1 = first attempt).
    pub fn delay(self, base: Duration, attempt: u32) -> Duration {
        match self {
            Self::Flat => base,
            Self::Quadratic => {
                let n = attempt.max(1);
                base.saturating_mul(n.saturating_mul(n))
            }
        }
    }
}

impl std::str::FromStr for Backoff {
    type Err = FetchError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "flat" => Ok(Self::Flat),
            "quadratic" => Ok(Self::Quadratic),
            other => Err(FetchError::Config(format!(
                "unknown backoff strategy '{other}', expected 'flat' or 'quadratic'"
            ))),
        }
    }
}

/// Configures attempt count, timeout and backoff behavior.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherOptions {
    /// Maximum number of attempts per fetch, including the first.
    pub max_tries: usize,
    /// Per-attempt timeout in milliseconds. Also the base backoff delay.
    pub timeout_ms: u64,
    /// Backoff strategy between attempts.
    pub backoff: Backoff,
}

impl Default for FetcherOptions {
    fn default() -> Self {
        Self {
            max_tries: 10,
            timeout_ms: 30_000,
            backoff: Backoff::Flat,
        }
    }
}

impl FetcherOptions {
    /// Per-attempt timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Delay to wait after the given 1-based attempt.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.backoff.delay(self.timeout(), attempt)
    }

    /// Rejects option sets the fetcher cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_tries == 0 {
            return Err(FetchError::Config("max_tries must be greater than 0".to_owned()));
        }
        if self.timeout_ms == 0 {
            return Err(FetchError::Config("timeout_ms must be greater than 0".to_owned()));
        }
        Ok(())
    }

    /// Builds options from environment variables, falling back to defaults.
    ///
    /// Reads (all optional):
    /// - `RELIABLE_GET_MAX_TRIES` — attempts per fetch
    /// - `RELIABLE_GET_TIMEOUT_MS` — per-attempt timeout in milliseconds
    /// - `RELIABLE_GET_BACKOFF` — `flat` or `quadratic`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut options = Self::default();

        if let Some(raw) = lookup("RELIABLE_GET_MAX_TRIES") {
            options.max_tries = raw.trim().parse().map_err(|err| {
                FetchError::Config(format!("RELIABLE_GET_MAX_TRIES '{raw}': {err}"))
            })?;
        }
        if let Some(raw) = lookup("RELIABLE_GET_TIMEOUT_MS") {
            options.timeout_ms = raw.trim().parse().map_err(|err| {
                FetchError::Config(format!("RELIABLE_GET_TIMEOUT_MS '{raw}': {err}"))
            })?;
        }
        if let Some(raw) = lookup("RELIABLE_GET_BACKOFF") {
            options.backoff = raw.parse()?;
        }

        options.validate()?;
        Ok(options)
    }
}
