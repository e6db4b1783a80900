use thiserror::Error;

/// Centralized error type for zoetrope-net.
#[derive(Debug, Error, Clone)]
pub enum NetError {
    /// Transport-level failure (DNS, connect, TLS, body read).
    #[error("HTTP request failed: {0}")]
    Http(String),
    /// Non-success status code.
    #[error("HTTP {status} for URL: {url}")]
    HttpStatus { status: u16, url: String },
    #[error("Timeout")]
    Timeout,
    #[error("Request failed after {max_retries} retries: {source}")]
    RetryExhausted {
        max_retries: u32,
        source: Box<NetError>,
    },
}

impl NetError {
    pub fn http_status(status: u16, url: String) -> Self {
        Self::HttpStatus { status, url }
    }

    pub fn timeout() -> Self {
        Self::Timeout
    }

    pub fn http<S: Into<String>>(msg: S) -> Self {
        Self::Http(msg.into())
    }

    /// Whether a retry layer should attempt this request again.
    pub fn is_retryable(&self) -> bool {
        match self {
            NetError::Http(msg) => {
                // Transport errors carry no status; fall back to message
                // patterns for the transient classes reqwest reports.
                msg.contains("timeout") || msg.contains("connection") || msg.contains("network")
            }
            NetError::Timeout => true,
            NetError::HttpStatus { status, .. } => {
                *status >= 500 || *status == 429 || *status == 408
            }
            NetError::RetryExhausted { .. } => false,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, NetError::Timeout)
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            NetError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for NetError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            return Self::Timeout;
        }
        Self::Http(error.to_string())
    }
}

pub type NetResult<T> = Result<T, NetError>;

#[cfg(test)]
mod tests {
    use rstest::*;

    use super::*;

    #[rstest]
    #[case::timeout(NetError::Timeout, true)]
    #[case::server_error(NetError::http_status(500, "http://x/".into()), true)]
    #[case::bad_gateway(NetError::http_status(502, "http://x/".into()), true)]
    #[case::too_many_requests(NetError::http_status(429, "http://x/".into()), true)]
    #[case::request_timeout(NetError::http_status(408, "http://x/".into()), true)]
    #[case::not_found(NetError::http_status(404, "http://x/".into()), false)]
    #[case::range_not_satisfiable(NetError::http_status(416, "http://x/".into()), false)]
    #[case::transient_transport(NetError::http("connection reset"), true)]
    #[case::opaque_transport(NetError::http("invalid body"), false)]
    fn retryability(#[case] error: NetError, #[case] expected: bool) {
        assert_eq!(error.is_retryable(), expected);
    }

    #[rstest]
    fn exhausted_is_terminal() {
        let error = NetError::RetryExhausted {
            max_retries: 3,
            source: Box::new(NetError::Timeout),
        };
        assert!(!error.is_retryable());
        assert!(error.to_string().contains("after 3 retries"));
    }

    #[rstest]
    fn status_code_accessor() {
        assert_eq!(
            NetError::http_status(416, "http://x/".into()).status_code(),
            Some(416)
        );
        assert_eq!(NetError::Timeout.status_code(), None);
    }
}
