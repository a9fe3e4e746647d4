//! Crypto primitives for Tickfy wallets.
//!
//! Two independent pieces: a password envelope for secrets kept on disk, and
//! the mnemonic → address derivation used to identify wallets.

pub mod envelope;
pub mod error;
pub mod keys;

pub use envelope::{decrypt, encrypt, generate_salt};
pub use error::CryptoError;
pub use keys::{derive_address, generate_mnemonic, normalize_mnemonic, validate_mnemonic};
