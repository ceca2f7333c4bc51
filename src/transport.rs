use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::time::Duration;

use reqwest::header;

use crate::{FetchError, Result};

/// A response as seen by the retry loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// URL after following redirects.
    pub final_url: String,
    /// Raw `Content-Type` header value, if present.
    pub content_type: Option<String>,
    pub body: String,
}

/// Failure raised by an [`HttpClient`] before a full response was read.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Connection could not be established or was dropped.
    #[error("connection error: {0}")]
    Connect(String),
    /// Request exceeded its timeout.
    #[error("request timed out")]
    Timeout,
    /// Anything else, with the full diagnostic chain.
    #[error("{0}")]
    Other(String),
}

/// The HTTP capability the fetcher builds on.
///
/// Implementations must be safe to share across concurrent fetches; the
/// reqwest implementation shares one connection pool.
pub trait HttpClient: Send + Sync {
    /// Issues a GET, follows redirects and reads the whole body as text.
    fn get(
        &self,
        url: &str,
        timeout: Duration,
    ) -> impl Future<Output = std::result::Result<HttpResponse, TransportError>> + Send;
}

/// [`HttpClient`] backed by `reqwest`.
#[derive(Clone, Default)]
pub struct ReqwestClient {
    http: reqwest::Client,
}

impl fmt::Debug for ReqwestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReqwestClient").finish_non_exhaustive()
    }
}

impl ReqwestClient {
    /// Creates a client with reqwest's defaults (redirects followed, pooled connections).
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { http })
    }

    /// Wraps an existing, possibly customized, reqwest client.
    pub fn from_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl HttpClient for ReqwestClient {
    async fn get(
        &self,
        url: &str,
        timeout: Duration,
    ) -> std::result::Result<HttpResponse, TransportError> {
        let response = self
            .http
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response.text().await.map_err(map_reqwest_error)?;

        Ok(HttpResponse {
            status,
            final_url,
            content_type,
            body,
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connect(error_chain(&err))
    } else {
        TransportError::Other(error_chain(&err))
    }
}

/// Renders an error and all of its sources as `outer: cause: root`.
pub(crate) fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !text.ends_with(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}
