use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use tokio::time::sleep;

use crate::classify::{classify_status, FailureKind, StatusClass};
use crate::transport::{HttpClient, HttpResponse, ReqwestClient};
use crate::{AttemptRecord, AuditLog, FetcherOptions, Payload, Result};

/// Performs GET requests with bounded retries, backoff and one audit row
/// per attempt.
///
/// Cloning is cheap: clones share the audit log and, with the default
/// transport, the connection pool.
#[derive(Clone)]
pub struct ReliableFetcher<C = ReqwestClient> {
    client: C,
    log: Arc<AuditLog>,
    options: FetcherOptions,
}

impl<C> fmt::Debug for ReliableFetcher<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReliableFetcher")
            .field("log", &self.log.path())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// What a single attempt produced, before it is written to the log.
enum Attempt {
    Success {
        response: HttpResponse,
        payload: Payload,
    },
    Failed {
        kind: FailureKind,
        response: Option<HttpResponse>,
    },
}

impl ReliableFetcher<ReqwestClient> {
    /// Creates a fetcher with default options over a fresh reqwest client.
    ///
    /// The audit log at `logfile` is created, truncated (`overwrite`) or
    /// appended to.
    pub fn new(logfile: impl AsRef<Path>, overwrite: bool) -> Result<Self> {
        Self::with_options(logfile, overwrite, FetcherOptions::default())
    }

    /// Creates a fetcher with explicit options over a fresh reqwest client.
    pub fn with_options(
        logfile: impl AsRef<Path>,
        overwrite: bool,
        options: FetcherOptions,
    ) -> Result<Self> {
        options.validate()?;
        let client = ReqwestClient::new()?;
        let log = AuditLog::open(logfile, overwrite)?;
        Ok(Self {
            client,
            log: Arc::new(log),
            options,
        })
    }
}

impl<C: HttpClient> ReliableFetcher<C> {
    /// Assembles a fetcher from a custom transport and a (possibly shared) log.
    pub fn from_parts(client: C, log: Arc<AuditLog>, options: FetcherOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            client,
            log,
            options,
        })
    }

    pub fn log(&self) -> &Arc<AuditLog> {
        &self.log
    }

    pub fn options(&self) -> &FetcherOptions {
        &self.options
    }

    /// Fetches `url`, retrying transient failures.
    ///
    /// Returns `Ok(Some(payload))` on the first response below 500 and
    /// `Ok(None)` once every attempt has failed. Per-attempt failures only
    /// show up in the audit log; `Err` means the log itself failed.
    pub async fn fetch(&self, url: &str, project: &str) -> Result<Option<Payload>> {
        let max_tries = self.options.max_tries;
        let timeout = self.options.timeout();

        for attempt in 1..=max_tries {
            let started_at = unix_now();
            let clock = Instant::now();

            let outcome = match self.client.get(url, timeout).await {
                Ok(response) => Self::evaluate(response),
                Err(err) => Attempt::Failed {
                    kind: FailureKind::from(&err),
                    response: None,
                },
            };
            let elapsed = clock.elapsed().as_secs_f64();

            let record = |call_id: u64| AttemptRecord {
                call_id,
                project: project.to_owned(),
                started_at,
                elapsed,
                url: url.to_owned(),
                redirect_url: String::new(),
                response_size: 0,
                response_code: None,
                success: false,
                error: String::new(),
            };

            let kind = match outcome {
                Attempt::Success { response, payload } => {
                    let call_id = self.log.append_next(|call_id| AttemptRecord {
                        redirect_url: response.final_url.clone(),
                        response_size: payload.size(),
                        response_code: Some(response.status),
                        success: true,
                        ..record(call_id)
                    })?;

                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        call_id,
                        url,
                        project,
                        attempt,
                        status = response.status,
                        "fetch succeeded"
                    );
                    #[cfg(not(feature = "tracing"))]
                    let _ = call_id;

                    return Ok(Some(payload));
                }
                Attempt::Failed { kind, response } => {
                    let call_id = self.log.append_next(|call_id| AttemptRecord {
                        redirect_url: response
                            .as_ref()
                            .map(|response| response.final_url.clone())
                            .unwrap_or_default(),
                        response_code: response.as_ref().map(|response| response.status),
                        error: kind.log_text(),
                        ..record(call_id)
                    })?;

                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        call_id,
                        url,
                        project,
                        attempt,
                        max_tries,
                        error = %kind.log_text(),
                        "fetch attempt failed"
                    );
                    #[cfg(not(feature = "tracing"))]
                    let _ = call_id;

                    kind
                }
            };

            if !kind.is_retryable() || attempt == max_tries {
                break;
            }

            let attempt_number = u32::try_from(attempt).unwrap_or(u32::MAX);
            let delay = self.options.backoff_delay(attempt_number);

            #[cfg(feature = "tracing")]
            tracing::debug!(url, "retrying after {} ms", delay.as_millis());

            sleep(delay).await;
        }

        #[cfg(feature = "tracing")]
        tracing::warn!(url, project, max_tries, "fetch exhausted all attempts");

        Ok(None)
    }

    fn evaluate(mut response: HttpResponse) -> Attempt {
        if classify_status(response.status) == StatusClass::ServerError {
            return Attempt::Failed {
                kind: FailureKind::Server(response.status),
                response: Some(response),
            };
        }

        let body = std::mem::take(&mut response.body);
        match Payload::decode(response.content_type.as_deref(), body) {
            Ok(payload) => Attempt::Success { response, payload },
            Err(err) => Attempt::Failed {
                kind: FailureKind::Decode(err.to_string()),
                response: Some(response),
            },
        }
    }
}

fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0.0, |elapsed| elapsed.as_secs_f64())
}
