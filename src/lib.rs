//! `reliable-get` issues HTTP GET requests with bounded retries, paced
//! backoff and a durable audit trail of every attempt.
//!
//! - [`ReliableFetcher::fetch`] runs the retry loop and returns the decoded
//!   [`Payload`], or `None` once all attempts are exhausted.
//! - [`AuditLog`] owns the `;`-delimited log file and the call-id counter,
//!   which survives process restarts.

mod audit;
mod classify;
mod error;
mod fetcher;
mod options;
mod payload;
mod record;
mod transport;

pub use audit::AuditLog;
pub use classify::{classify_status, FailureKind, StatusClass};
pub use error::FetchError;
pub use fetcher::ReliableFetcher;
pub use options::{Backoff, FetcherOptions};
pub use payload::Payload;
pub use record::{header_line, AttemptRecord, LOG_COLUMNS};
pub use transport::{HttpClient, HttpResponse, ReqwestClient, TransportError};

pub type Result<T> = std::result::Result<T, FetchError>;
