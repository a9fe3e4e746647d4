//! On-disk wallet records.
//!
//! Field names are camelCase so existing `wallets.json` and `wallet.json`
//! files stay readable.

use serde::{Deserialize, Serialize};

/// One persisted wallet. `encrypted_mnemonic` is only meaningful together
/// with `salt` and the wallet password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletRecord {
    #[serde(default)]
    pub id: String,
    pub address: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub encrypted_mnemonic: String,
    #[serde(default)]
    pub salt: String,
    #[serde(default)]
    pub created_at: i64,
}

/// A wallet without its secret material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSummary {
    pub id: String,
    pub name: String,
    pub address: String,
    pub created_at: i64,
}

impl From<&WalletRecord> for WalletSummary {
    fn from(w: &WalletRecord) -> Self {
        Self {
            id: w.id.clone(),
            name: w.name.clone(),
            address: w.address.clone(),
            created_at: w.created_at,
        }
    }
}

/// The whole `wallets.json` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletStore {
    #[serde(default)]
    pub wallets: Vec<WalletRecord>,
    /// Empty string means no active wallet.
    #[serde(default)]
    pub active_wallet_id: String,
}

impl WalletStore {
    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&WalletRecord> {
        self.wallets.iter().find(|w| w.id == id)
    }

    pub fn contains_address(&self, address: &str) -> bool {
        self.wallets.iter().any(|w| w.address == address)
    }

    /// The active wallet, falling back to the first record when the pointer
    /// is empty or stale.
    pub fn active(&self) -> Option<&WalletRecord> {
        self.find(&self.active_wallet_id)
            .or_else(|| self.wallets.first())
    }

    /// Remove `id`. When it was the active wallet the pointer moves to the
    /// first remaining record, or is cleared when none remain.
    pub fn remove(&mut self, id: &str) -> Option<WalletRecord> {
        let pos = self.wallets.iter().position(|w| w.id == id)?;
        let removed = self.wallets.remove(pos);
        if self.active_wallet_id == id {
            self.active_wallet_id = self
                .wallets
                .first()
                .map(|w| w.id.clone())
                .unwrap_or_default();
        }
        Some(removed)
    }
}
