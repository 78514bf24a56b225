//! Error types for Spindle

/// Result type alias using [`Error`]
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Main error type for Spindle
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP engine errors
    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    /// Request target that cannot be parsed as a URI path
    #[error("Malformed request target '{target}': {reason}")]
    MalformedTarget {
        /// The raw request target
        target: String,
        /// Why it was rejected
        reason: String,
    },

    /// Header name or value that cannot be represented on the wire
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Cookie rejected by the strict encoder
    #[error("Cookie encoding failed for '{name}': {reason}")]
    CookieEncoding {
        /// Cookie name
        name: String,
        /// Rule that was violated
        reason: String,
    },

    /// Response headers were already sent
    #[error("Response headers have already been sent")]
    HeadersCommitted,

    /// Response reached its terminal state
    #[error("Response is already complete")]
    ResponseComplete,

    /// The peer or the underlying writer went away
    #[error("Connection closed")]
    ConnectionClosed,

    /// An error that carries the HTTP status it should be answered with
    #[error("HTTP status {0}")]
    Status(http::StatusCode),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// TLS setup or handshake error
    #[error("TLS error: {0}")]
    Tls(String),

    /// Feature deliberately left unimplemented
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// No response converter accepted a handler result
    #[error("No response converter for result: {0}")]
    UnhandledResult(String),

    /// Runtime error
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP builder error
    #[error("HTTP error: {0}")]
    HttpError(#[from] http::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error (should not happen in production)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Convert error to HTTP status code
    pub fn to_status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            Error::Http(_) | Error::MalformedTarget { .. } | Error::InvalidHeader(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::Status(status) => *status,
            Error::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Create a malformed target error
    pub fn malformed_target(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedTarget {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Create a cookie encoding error
    pub fn cookie_encoding(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::CookieEncoding {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error means the peer is no longer reachable
    pub fn is_closed(&self) -> bool {
        match self {
            Error::ConnectionClosed => true,
            Error::Http(e) => e.is_closed() || e.is_canceled(),
            Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::NotConnected
            ),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            Error::malformed_target("/hello%", "bad escape").to_status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::Status(StatusCode::IM_A_TEAPOT).to_status_code(),
            StatusCode::IM_A_TEAPOT
        );
        assert_eq!(
            Error::Config("bad".to_string()).to_status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_cookie_encoding_error() {
        let err = Error::cookie_encoding("session", "illegal character ';' in value");
        assert!(matches!(err, Error::CookieEncoding { .. }));
        assert!(err.to_string().contains("session"));
    }

    #[test]
    fn test_is_closed() {
        assert!(Error::ConnectionClosed.is_closed());
        assert!(Error::Io(std::io::ErrorKind::BrokenPipe.into()).is_closed());
        assert!(!Error::ResponseComplete.is_closed());
    }
}
