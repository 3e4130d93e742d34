//! Error types for the envelope client.
//!
//! # Design
//! Only transport-level faults are errors. A response the server sent, with
//! any status or body, is normalized into a `ResponseEnvelope` instead, so
//! "the server said no" never shows up here.

use std::io;

use thiserror::Error;

/// Faults raised while getting a response from the transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request URI (or the base URI it was resolved against) is invalid.
    #[error("Invalid URI: {0}")]
    InvalidUri(String),
    /// The request could not be assembled from the given options.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    /// Could not connect to the remote host.
    #[error("Connection error: {0}")]
    Connection(String),
    /// Request timeout
    #[error("Request timeout")]
    Timeout,
    /// The transport could not be constructed.
    #[error("Transport build error: {0}")]
    Build(String),
    /// I/O failure while reading the response.
    #[error("I/O error: {0}")]
    Io(String),
    /// Other error
    #[error("{0}")]
    Other(String),
}

impl From<url::ParseError> for TransportError {
    fn from(err: url::ParseError) -> Self {
        TransportError::InvalidUri(err.to_string())
    }
}

impl From<ureq::Error> for TransportError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Timeout(_) => TransportError::Timeout,
            e @ (ureq::Error::HostNotFound | ureq::Error::ConnectionFailed) => {
                TransportError::Connection(e.to_string())
            }
            ureq::Error::BadUri(uri) => TransportError::InvalidUri(uri),
            ureq::Error::Http(e) => TransportError::InvalidRequest(e.to_string()),
            ureq::Error::Io(e) => e.into(),
            other => TransportError::Other(other.to_string()),
        }
    }
}

impl From<io::Error> for TransportError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut => TransportError::Timeout,
            io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected => TransportError::Connection(err.to_string()),
            _ => TransportError::Io(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_builder() {
            TransportError::InvalidRequest(err.to_string())
        } else if err.is_connect() {
            TransportError::Connection(err.to_string())
        } else if err.is_body() || err.is_decode() {
            TransportError::Io(err.to_string())
        } else {
            TransportError::Other(err.to_string())
        }
    }
}

/// Errors raised while loading a `ClientConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable holds a value that cannot be parsed.
    #[error("Invalid value for {key}: {value}")]
    InvalidValue {
        /// Variable name
        key: &'static str,
        /// Raw value
        value: String,
    },
    /// The configuration document is not valid JSON for `ClientConfig`.
    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_display() {
        assert_eq!(TransportError::Timeout.to_string(), "Request timeout");
        assert_eq!(
            TransportError::Connection("connection refused".to_string()).to_string(),
            "Connection error: connection refused"
        );
        assert_eq!(
            TransportError::InvalidUri("relative URL without a base".to_string()).to_string(),
            "Invalid URI: relative URL without a base"
        );
    }

    #[test]
    fn url_parse_error_becomes_invalid_uri() {
        let err: TransportError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, TransportError::InvalidUri(_)));
    }

    #[test]
    fn refused_io_error_is_a_connection_fault() {
        let err: TransportError = io::Error::from(io::ErrorKind::ConnectionRefused).into();
        assert!(matches!(err, TransportError::Connection(_)));

        let err: TransportError = io::Error::from(io::ErrorKind::TimedOut).into();
        assert!(matches!(err, TransportError::Timeout));
    }

    #[test]
    fn config_error_display() {
        let err = ConfigError::InvalidValue {
            key: "ENVELOPE_CLIENT_TIMEOUT_SECS",
            value: "soon".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid value for ENVELOPE_CLIENT_TIMEOUT_SECS: soon");
    }
}
