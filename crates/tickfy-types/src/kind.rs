//! Error taxonomy shared by all crates.
//!
//! Crate-level error enums stay specific; `kind()` on each of them maps a
//! failure onto one of these buckets so a front end can pick a status code or
//! exit code without matching on every variant.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed input: bad mnemonic, short password, empty moniker.
    Validation,
    /// The thing already exists (duplicate wallet import).
    Conflict,
    /// Unknown wallet id, no wallet configured, no validator record, missing binary.
    NotFound,
    /// Operation not allowed in the current state (daemon running or stopped).
    Precondition,
    /// Decryption failed. Wrong password and corrupt data are indistinguishable.
    Authentication,
    /// A shelled-out command exited non-zero.
    ExternalTool,
    /// Network fetch or download failure.
    TransientIo,
    /// Local filesystem or serialization failure.
    Internal,
}

impl ErrorKind {
    /// Short machine-readable label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Conflict => "conflict",
            Self::NotFound => "not_found",
            Self::Precondition => "precondition",
            Self::Authentication => "authentication",
            Self::ExternalTool => "external_tool",
            Self::TransientIo => "transient_io",
            Self::Internal => "internal",
        }
    }

    /// HTTP status an API layer would answer with.
    pub fn http_status(self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::Conflict => 409,
            Self::NotFound => 404,
            Self::Precondition => 409,
            Self::Authentication => 401,
            Self::ExternalTool => 502,
            Self::TransientIo => 503,
            Self::Internal => 500,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
