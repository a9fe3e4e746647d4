//! Tickfy chain parameters, file names, and local endpoint defaults.

// =============================================================================
// Chain
// =============================================================================

/// Chain identifier passed to `init` and every transaction.
pub const CHAIN_ID: &str = "tickfyblockchain";

/// Bech32 human-readable prefix for account addresses.
pub const ACCOUNT_HRP: &str = "tickfy";

/// SLIP-44 coin type shared with the Cosmos Hub.
pub const COIN_TYPE: u32 = 118;

/// HD path of the single key each wallet uses.
pub const DERIVATION_PATH: &str = "m/44'/118'/0'/0/0";

/// Number of micro-units in one whole token.
pub const MICRO_PER_TOKEN: u128 = 1_000_000;

/// Whole-token amount from which balances drop their decimals.
pub const INTEGER_DISPLAY_THRESHOLD: u128 = 1_000_000;

/// Display ticker.
pub const TICKER: &str = "TKFY";

/// Bank denominations carrying the staking token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Denom {
    /// Production micro denomination.
    Utkfy,
    /// Default denomination of freshly initialised dev chains.
    Stake,
}

impl Denom {
    pub const ALL: [Denom; 2] = [Denom::Utkfy, Denom::Stake];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Utkfy => "utkfy",
            Self::Stake => "stake",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == s)
    }
}

// =============================================================================
// Wallet
// =============================================================================

/// Minimum wallet password length.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Entropy of freshly generated mnemonics (24 words).
pub const MNEMONIC_ENTROPY_BYTES: usize = 32;

/// Random bytes in a per-wallet salt.
pub const SALT_BYTES: usize = 16;

/// Random bytes in a wallet id.
pub const WALLET_ID_BYTES: usize = 8;

// =============================================================================
// Node
// =============================================================================

/// Daemon binary name (without platform extension).
pub const DAEMON_NAME: &str = "tickfy-blockchaind";

/// Upgrade supervisor binary name (without platform extension).
pub const UPGRADE_SUPERVISOR_NAME: &str = "cosmovisor";

/// Upgrade supervisor release installed by default.
pub const UPGRADE_SUPERVISOR_VERSION: &str = "v1.5.0";

/// Key name the validator operator key is imported under.
pub const VALIDATOR_KEY_NAME: &str = "validator";

/// Keyring backend used for the operator key.
pub const KEYRING_BACKEND: &str = "test";

/// Daemon log lines kept in memory.
pub const LOG_CAPACITY: usize = 1000;

/// Seed peers written into a fresh `config.toml`.
pub const DEFAULT_SEEDS: &str = "seed1.tickfy.io:26656,seed2.tickfy.io:26656";

/// Release download base for the daemon binary.
pub const DAEMON_RELEASE_BASE: &str =
    "https://github.com/Tickfy/tickfy-blockchain/releases/download/v1.0.0";

/// Published network genesis.
pub const GENESIS_URL: &str =
    "https://raw.githubusercontent.com/Tickfy/tickfy-blockchain/main/network/genesis.json";

/// Release download base for the upgrade supervisor.
pub const UPGRADE_SUPERVISOR_RELEASE_BASE: &str =
    "https://github.com/cosmos/cosmos-sdk/releases/download";

/// Default local ports.
pub mod ports {
    /// CometBFT RPC (`/status`, `/net_info`).
    pub const NODE_RPC: u16 = 26657;
    /// Cosmos SDK REST API (bank balances).
    pub const NODE_API: u16 = 1317;
}

/// File names under the data directory.
pub mod files {
    /// Directory name under the user's home.
    pub const DATA_DIR_NAME: &str = ".tickfy-validator";
    pub const WALLET_STORE: &str = "wallets.json";
    pub const LEGACY_WALLET: &str = "wallet.json";
    pub const NODE_CONFIG: &str = "node-config.json";
    pub const VALIDATOR_RECORD: &str = "validator.json";
    pub const UPGRADE_SUPERVISOR_CONFIG: &str = "cosmovisor-config.json";
    pub const BIN_DIR: &str = "bin";
    pub const NODE_HOME_DIR: &str = "node";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denom_parse() {
        assert_eq!(Denom::parse("utkfy"), Some(Denom::Utkfy));
        assert_eq!(Denom::parse("stake"), Some(Denom::Stake));
        assert_eq!(Denom::parse("uatom"), None);
    }

    #[test]
    fn test_derivation_path_uses_coin_type() {
        assert!(DERIVATION_PATH.contains(&format!("/{}'/", COIN_TYPE)));
    }
}
