//! Classify attempt outcomes for logging and retry decisions.

use crate::TransportError;

/// How a received status code is handled.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StatusClass {
    /// Anything below 500: the payload goes back to the caller.
    Success,
    /// 5xx: logged as a failure and retried.
    ServerError,
}

/// Classify an HTTP status code.
pub fn classify_status(code: u16) -> StatusClass {
    if code >= 500 {
        StatusClass::ServerError
    } else {
        StatusClass::Success
    }
}

/// Closed set of reasons an attempt did not produce a payload.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FailureKind {
    /// Connection could not be established or was dropped.
    Connection,
    /// The attempt hit its timeout.
    Timeout,
    /// Server answered with a 5xx status.
    Server(u16),
    /// Response arrived but its body could not be decoded.
    Decode(String),
    /// Unclassified failure, with the full diagnostic text.
    Other(String),
}

impl FailureKind {
    /// Text written to the `error` column of the audit log.
    pub fn log_text(&self) -> String {
        match self {
            Self::Connection => "Connection error".to_owned(),
            Self::Timeout => "Timeout error".to_owned(),
            Self::Server(code) => format!("Server error {code}"),
            Self::Decode(detail) => format!("Decode error: {detail}"),
            Self::Other(detail) => detail.clone(),
        }
    }

    /// Whether the fetcher tries again after this failure.
    ///
    /// Every kind is retried, decode and unclassified failures included.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection | Self::Timeout | Self::Server(_) => true,
            Self::Decode(_) | Self::Other(_) => true,
        }
    }
}

impl From<&TransportError> for FailureKind {
    fn from(err: &TransportError) -> Self {
        match err {
            TransportError::Connect(_) => Self::Connection,
            TransportError::Timeout => Self::Timeout,
            TransportError::Other(detail) => Self::Other(detail.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_5xx_is_server_error() {
        assert_eq!(classify_status(500), StatusClass::ServerError);
        assert_eq!(classify_status(503), StatusClass::ServerError);
        assert_eq!(classify_status(599), StatusClass::ServerError);
    }

    #[test]
    fn status_below_500_is_terminal_success() {
        assert_eq!(classify_status(200), StatusClass::Success);
        assert_eq!(classify_status(301), StatusClass::Success);
        assert_eq!(classify_status(404), StatusClass::Success);
        assert_eq!(classify_status(429), StatusClass::Success);
    }

    #[test]
    fn transport_errors_map_to_kinds() {
        assert_eq!(
            FailureKind::from(&TransportError::Connect("refused".to_owned())),
            FailureKind::Connection
        );
        assert_eq!(
            FailureKind::from(&TransportError::Timeout),
            FailureKind::Timeout
        );
        assert_eq!(
            FailureKind::from(&TransportError::Other("bad chunk".to_owned())),
            FailureKind::Other("bad chunk".to_owned())
        );
    }

    #[test]
    fn log_text_matches_audit_vocabulary() {
        assert_eq!(FailureKind::Connection.log_text(), "Connection error");
        assert_eq!(FailureKind::Timeout.log_text(), "Timeout error");
        assert_eq!(FailureKind::Server(502).log_text(), "Server error 502");
        assert_eq!(
            FailureKind::Decode("expected value at line 1".to_owned()).log_text(),
            "Decode error: expected value at line 1"
        );
        assert_eq!(FailureKind::Other("boom".to_owned()).log_text(), "boom");
    }

    #[test]
    fn all_kinds_are_retried() {
        assert!(FailureKind::Connection.is_retryable());
        assert!(FailureKind::Timeout.is_retryable());
        assert!(FailureKind::Server(500).is_retryable());
        assert!(FailureKind::Decode(String::new()).is_retryable());
        assert!(FailureKind::Other(String::new()).is_retryable());
    }
}
