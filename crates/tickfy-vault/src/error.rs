//! Vault error types.

use std::path::PathBuf;
use thiserror::Error;
use tickfy_crypto::CryptoError;
use tickfy_types::ErrorKind;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    #[error("wallet already imported: {address}")]
    AlreadyImported { address: String },

    #[error("wallet not found: {0}")]
    WalletNotFound(String),

    #[error("no wallet configured")]
    NoWallet,

    #[error("stop the node before removing a wallet")]
    DaemonRunning,

    #[error("wrong password")]
    WrongPassword,

    #[error("crypto error: {0}")]
    Crypto(CryptoError),

    #[error("storage error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid store file {}: {source}", path.display())]
    InvalidFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl From<CryptoError> for VaultError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::Authentication => Self::WrongPassword,
            CryptoError::InvalidMnemonic(msg) => Self::InvalidMnemonic(msg),
            other => Self::Crypto(other),
        }
    }
}

impl VaultError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidMnemonic(_) | Self::PasswordTooShort { .. } => ErrorKind::Validation,
            Self::AlreadyImported { .. } => ErrorKind::Conflict,
            Self::WalletNotFound(_) | Self::NoWallet => ErrorKind::NotFound,
            Self::DaemonRunning => ErrorKind::Precondition,
            Self::WrongPassword => ErrorKind::Authentication,
            Self::Crypto(e) => e.kind(),
            Self::Io { .. } | Self::InvalidFile { .. } => ErrorKind::Internal,
        }
    }
}
