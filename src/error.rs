/// Error type returned by this crate.
///
/// Per-attempt failures (timeouts, 5xx, decode problems) never show up here:
/// they are written to the audit log and drive the retry loop. Only errors
/// that leave the fetcher unable to operate are surfaced.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Audit log could not be opened, read, written or synced.
    #[error("audit log error: {0}")]
    Log(#[from] std::io::Error),
    /// Record appended after the audit log was closed.
    #[error("audit log is closed")]
    LogClosed,
    /// Invalid fetcher configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// HTTP client could not be constructed.
    #[error("http client error: {0}")]
    Client(reqwest::Error),
}
