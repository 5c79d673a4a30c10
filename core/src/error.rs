// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use http::StatusCode;
use std::fmt;
use thiserror::Error;

/// The error type for cosync operations
#[derive(Error, Debug)]
#[error("{message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
    status: Option<StatusCode>,
    #[source]
    source: Option<anyhow::Error>,
}

/// The kind of error that occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required configuration field is missing or empty.
    ///
    /// Always detected before any network round-trip.
    ConfigIncomplete,

    /// The configured provider is not one we know how to talk to.
    UnsupportedProvider,

    /// Credentials exist but are invalid or malformed.
    CredentialInvalid,

    /// Request cannot be signed (bad uri, bad header value, bad clock).
    RequestInvalid,

    /// Input could not be decoded (base64, utf-8).
    Encoding,

    /// The transport failed before a response was received.
    Network,

    /// The remote returned a non-success status.
    HttpStatus,

    /// The persisted cache blob could not be parsed.
    CacheCorrupt,

    /// Unexpected errors (I/O and everything else).
    Unexpected,
}

impl Error {
    /// Create a new error with the given kind and message
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            source: None,
        }
    }

    /// Add a source error
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Get the HTTP status carried by an [`ErrorKind::HttpStatus`] error.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Check if retrying the same operation later could succeed.
    ///
    /// Network failures and server side (5xx) statuses are retryable,
    /// everything else needs a change from the caller first. This is
    /// advisory: nothing in cosync retries on its own.
    pub fn is_retryable(&self) -> bool {
        match self.kind {
            ErrorKind::Network => true,
            ErrorKind::HttpStatus => self.status.is_some_and(|s| s.is_server_error()),
            _ => false,
        }
    }
}

// Convenience constructors
impl Error {
    /// Create a config incomplete error
    pub fn config_incomplete(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigIncomplete, message)
    }

    /// Create an unsupported provider error
    pub fn unsupported_provider(provider: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::UnsupportedProvider,
            format!("unsupported storage provider: {provider}"),
        )
    }

    /// Create a credential invalid error
    pub fn credential_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CredentialInvalid, message)
    }

    /// Create a request invalid error
    pub fn request_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RequestInvalid, message)
    }

    /// Create an encoding error
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Encoding, message)
    }

    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    /// Create an http status error that keeps the status code and the
    /// response body text.
    pub fn http_status(status: StatusCode, body: impl AsRef<str>) -> Self {
        let mut err = Self::new(
            ErrorKind::HttpStatus,
            format!("status {}: {}", status.as_u16(), body.as_ref()),
        );
        err.status = Some(status);
        err
    }

    /// Create a cache corrupt error
    pub fn cache_corrupt(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CacheCorrupt, message)
    }

    /// Create an unexpected error
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unexpected, message)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::ConfigIncomplete => write!(f, "incomplete configuration"),
            ErrorKind::UnsupportedProvider => write!(f, "unsupported provider"),
            ErrorKind::CredentialInvalid => write!(f, "invalid credentials"),
            ErrorKind::RequestInvalid => write!(f, "invalid request"),
            ErrorKind::Encoding => write!(f, "encoding error"),
            ErrorKind::Network => write!(f, "network error"),
            ErrorKind::HttpStatus => write!(f, "unexpected http status"),
            ErrorKind::CacheCorrupt => write!(f, "corrupt cache"),
            ErrorKind::Unexpected => write!(f, "unexpected error"),
        }
    }
}

/// Convenience type alias for Results
pub type Result<T> = std::result::Result<T, Error>;

// Common From implementations
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(err)
    }
}

impl From<std::fmt::Error> for Error {
    fn from(err: std::fmt::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::Error> for Error {
    fn from(err: http::Error) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::header::InvalidHeaderName> for Error {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::header::ToStrError> for Error {
    fn from(err: http::header::ToStrError) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::uri::InvalidUri> for Error {
    fn from(err: http::uri::InvalidUri) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::uri::InvalidUriParts> for Error {
    fn from(err: http::uri::InvalidUriParts) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Self::encoding(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_keeps_code_and_body() {
        let err = Error::http_status(StatusCode::FORBIDDEN, "<Error>SignatureDoesNotMatch</Error>");
        assert_eq!(err.kind(), ErrorKind::HttpStatus);
        assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));
        assert_eq!(
            err.to_string(),
            "status 403: <Error>SignatureDoesNotMatch</Error>"
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_retryable() {
        assert!(Error::network("connection refused").is_retryable());
        assert!(Error::http_status(StatusCode::BAD_GATEWAY, "").is_retryable());
        assert!(!Error::http_status(StatusCode::NOT_FOUND, "").is_retryable());
        assert!(!Error::config_incomplete("bucket is empty").is_retryable());
        assert!(!Error::credential_invalid("empty secret").is_retryable());
    }

    #[test]
    fn test_unsupported_provider_message() {
        let err = Error::unsupported_provider("minio");
        assert_eq!(err.kind(), ErrorKind::UnsupportedProvider);
        assert_eq!(err.to_string(), "unsupported storage provider: minio");
    }
}
