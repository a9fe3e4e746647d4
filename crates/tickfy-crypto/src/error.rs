//! Crypto error types.

use thiserror::Error;
use tickfy_types::ErrorKind;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("decryption failed (wrong password or corrupted data)")]
    Authentication,

    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("encryption error: {0}")]
    Encryption(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

impl CryptoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Authentication => ErrorKind::Authentication,
            Self::InvalidMnemonic(_) | Self::InvalidAddress(_) => ErrorKind::Validation,
            Self::KeyDerivation(_) | Self::Encryption(_) => ErrorKind::Internal,
        }
    }
}
