//! RPC error types.

use thiserror::Error;
use tickfy_types::ErrorKind;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("HTTP error calling {endpoint} at {url}: {source}")]
    Http {
        endpoint: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} at {url} returned HTTP {status}: {body}")]
    HttpStatus {
        endpoint: String,
        url: String,
        status: u16,
        body: String,
    },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected response from {context}: {detail}")]
    InvalidResponse { context: String, detail: String },

    #[error("{0}")]
    Other(String),
}

impl RpcError {
    /// Whether retrying the same request could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { source, .. } => source.is_connect() || source.is_timeout(),
            Self::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::HttpStatus { status: 404, .. } => ErrorKind::NotFound,
            Self::Other(_) => ErrorKind::Internal,
            _ => ErrorKind::TransientIo,
        }
    }
}
