//! Tickfy wallet vault.
//!
//! Keeps every wallet the operator created or imported in a single JSON store
//! under the data directory, with the mnemonic sealed by the wallet password.
//! One wallet is "active" and is the implicit subject of balance and validator
//! operations.
//!
//! The vault holds no in-memory state: every call re-reads the store and every
//! mutation rewrites it whole. Two processes editing the same store at the
//! same time can still lose an update; callers are expected not to do that.

pub mod error;
pub mod persist;
pub mod store;
pub mod vault;

pub use error::VaultError;
pub use store::{WalletRecord, WalletStore, WalletSummary};
pub use vault::{ActiveWallet, DaemonProbe, NewWallet, Vault, WalletList};
