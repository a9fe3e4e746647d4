//! Node service error types.

use std::path::PathBuf;
use thiserror::Error;
use tickfy_rpc::RpcError;
use tickfy_types::ErrorKind;
use tickfy_vault::VaultError;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("node is already running")]
    AlreadyRunning,

    #[error("node is not running")]
    NotRunning,

    #[error("{what} not found at {}; install it first", path.display())]
    NotInstalled { what: &'static str, path: PathBuf },

    #[error("validator not found")]
    ValidatorNotFound,

    #[error("invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} failed: {output}")]
    Tool { tool: String, output: String },

    #[error("download of {url} failed with HTTP {status}")]
    DownloadStatus { url: String, status: u16 },

    #[error("download error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

impl NodeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyRunning | Self::NotRunning => ErrorKind::Precondition,
            Self::NotInstalled { .. } | Self::ValidatorNotFound => ErrorKind::NotFound,
            Self::InvalidInput { .. } => ErrorKind::Validation,
            Self::Spawn { .. } | Self::Tool { .. } => ErrorKind::ExternalTool,
            Self::DownloadStatus { .. } | Self::Http(_) => ErrorKind::TransientIo,
            Self::Rpc(e) => e.kind(),
            Self::Vault(e) => e.kind(),
            Self::Io { .. } | Self::Config(_) => ErrorKind::Internal,
        }
    }
}
