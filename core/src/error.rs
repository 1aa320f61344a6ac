//! Error types for the transit API client.
//!
//! # Design
//! Only two things can go wrong from a caller's point of view: the server
//! answered with a non-2xx status, or no usable answer arrived (transport
//! failure or a body that is not the expected JSON). Error bodies are kept raw
//! for debugging and never parsed for structured detail.

use std::error::Error as StdError;

use thiserror::Error;

/// Errors returned by `TransitClient` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned a non-2xx status.
    #[error("HTTP error! status: {status}")]
    Http { status: u16, body: String },

    /// The request never produced a response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A 2xx body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(#[from] serde_json::Error),
}

impl ApiError {
    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether repeating the same request could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Http { status, .. } => is_retryable_status(*status),
            ApiError::Transport(_) => true,
            ApiError::Deserialization(_) => false,
        }
    }
}

/// 5xx and 429 are worth another attempt; every other status is final.
pub fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

/// A failure below HTTP: DNS, connection refused, timeout, broken body stream.
#[derive(Debug, Error)]
#[error("transport error: {source}")]
pub struct TransportError {
    source: Box<dyn StdError + Send + Sync>,
    timeout: bool,
    connect: bool,
}

impl TransportError {
    pub fn new(source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self {
            source: source.into(),
            timeout: false,
            connect: false,
        }
    }

    pub fn timed_out(mut self) -> Self {
        self.timeout = true;
        self
    }

    pub fn connect_failed(mut self) -> Self {
        self.connect = true;
        self
    }

    pub fn is_timeout(&self) -> bool {
        self.timeout
    }

    pub fn is_connect(&self) -> bool {
        self.connect
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let timeout = err.is_timeout();
        let connect = err.is_connect();
        Self {
            source: Box::new(err),
            timeout,
            connect,
        }
    }
}

/// Invalid client configuration, usually from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got {value:?}")]
    InvalidValue {
        var: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("base url must start with http:// or https://, got {0:?}")]
    InvalidBaseUrl(String),

    #[error("could not build HTTP client: {0}")]
    Client(#[from] TransportError),
}
