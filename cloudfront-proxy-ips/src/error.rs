use std::{error::Error as StdError, fmt};

use derive_more::{Display, Error};

/// Stable, machine-readable category of a [`ProviderError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ErrorKind {
    /// Network failure, timeout, or non-success HTTP status.
    #[display("transport")]
    Transport,

    /// Response body was not JSON or not a JSON object.
    #[display("decode")]
    Decode,

    /// Response was a JSON object matching neither known feed shape.
    #[display("shape")]
    Shape,
}

/// Error raised by an [`HttpFetcher`](crate::HttpFetcher) implementation.
///
/// Wraps whatever the underlying HTTP client reports so that transports can be swapped without
/// changing the provider's error type.
pub struct TransportError(Box<dyn StdError + Send + Sync + 'static>);

impl TransportError {
    /// Wraps a transport-specific error.
    pub fn new(err: impl Into<Box<dyn StdError + Send + Sync + 'static>>) -> Self {
        Self(err.into())
    }

    /// Returns the wrapped error.
    pub fn into_inner(self) -> Box<dyn StdError + Send + Sync + 'static> {
        self.0
    }
}

impl fmt::Debug for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TransportError").field(&self.0).finish()
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl StdError for TransportError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

/// Failure to turn a response body into a JSON object.
#[derive(Debug, Display, Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// Body is not valid JSON.
    #[display("invalid JSON: {_0}")]
    Json(serde_json::Error),

    /// Body is valid JSON but its top-level value is not an object.
    #[display("top-level JSON value is not an object")]
    NotAMapping,
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

/// Failure to obtain IP ranges from a single endpoint.
///
/// One of these is recorded per failed endpoint; none of them abort an aggregation.
#[derive(Debug, Display, Error)]
#[non_exhaustive]
pub enum ProviderError {
    /// Request could not be completed.
    #[display("Failed to send the HTTP request to {url}: {source}")]
    Transport {
        /// Endpoint URL.
        url: String,

        /// Underlying transport failure.
        source: TransportError,
    },

    /// Request completed with a non-success status code.
    #[display("Bad response code ({status}) from the HTTP request to {url}")]
    Status {
        /// Endpoint URL.
        url: String,

        /// HTTP status code.
        status: u16,
    },

    /// Response body could not be decoded.
    #[display("Failed to decode the response from {url}: {source}")]
    Decode {
        /// Endpoint URL.
        url: String,

        /// Underlying decode failure.
        source: DecodeError,
    },

    /// Response matched neither known feed shape.
    #[display("Failed to extract IPs from the response of {url}")]
    Shape {
        /// Endpoint URL.
        url: String,
    },
}

impl ProviderError {
    /// Returns the stable category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport { .. } | Self::Status { .. } => ErrorKind::Transport,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::Shape { .. } => ErrorKind::Shape,
        }
    }

    /// Returns the URL of the endpoint that failed.
    pub fn endpoint(&self) -> &str {
        match self {
            Self::Transport { url, .. }
            | Self::Status { url, .. }
            | Self::Decode { url, .. }
            | Self::Shape { url } => url,
        }
    }
}
