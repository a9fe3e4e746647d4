//! Service configuration and data-directory layout.
//!
//! ```text
//! ~/.tickfy-validator/
//!   wallets.json             vault
//!   node-config.json         written by init
//!   validator.json           written by create-validator
//!   cosmovisor-config.json   presence = wrapped supervision
//!   bin/tickfy-blockchaind
//!   bin/cosmovisor
//!   node/                    daemon home
//!     config/{genesis.json,config.toml}
//!     cosmovisor/{genesis/bin,upgrades,current}
//! ```

use crate::error::NodeError;
use std::env::consts::{ARCH, EXE_SUFFIX, OS};
use std::path::PathBuf;
use tickfy_types::constants::{
    files, CHAIN_ID, DAEMON_NAME, DAEMON_RELEASE_BASE, DEFAULT_SEEDS, GENESIS_URL,
    UPGRADE_SUPERVISOR_NAME, UPGRADE_SUPERVISOR_RELEASE_BASE, UPGRADE_SUPERVISOR_VERSION,
};

/// Everything the node service needs to know about where things live.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Root of all persisted state.
    pub data_dir: PathBuf,
    pub chain_id: String,
    pub daemon_name: String,
    /// CometBFT RPC base URL.
    pub rpc_url: String,
    /// Cosmos SDK REST base URL.
    pub api_url: String,
    /// Base URL the daemon binary is downloaded from.
    pub release_base: String,
    pub genesis_url: String,
    /// Comma-separated `host:port` seed list written into `config.toml`.
    pub seeds: String,
    pub upgrade_supervisor_version: String,
    pub upgrade_supervisor_release_base: String,
}

impl ServiceConfig {
    /// Defaults rooted at `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            chain_id: CHAIN_ID.to_string(),
            daemon_name: DAEMON_NAME.to_string(),
            rpc_url: tickfy_rpc::endpoints::node_rpc(),
            api_url: tickfy_rpc::endpoints::node_api(),
            release_base: DAEMON_RELEASE_BASE.to_string(),
            genesis_url: GENESIS_URL.to_string(),
            seeds: DEFAULT_SEEDS.to_string(),
            upgrade_supervisor_version: UPGRADE_SUPERVISOR_VERSION.to_string(),
            upgrade_supervisor_release_base: UPGRADE_SUPERVISOR_RELEASE_BASE.to_string(),
        }
    }

    /// `~/.tickfy-validator`.
    pub fn default_data_dir() -> Result<PathBuf, NodeError> {
        dirs::home_dir()
            .map(|home| home.join(files::DATA_DIR_NAME))
            .ok_or_else(|| NodeError::Config("cannot determine home directory".to_string()))
    }

    /// Defaults rooted at [`default_data_dir`](Self::default_data_dir).
    pub fn from_home() -> Result<Self, NodeError> {
        Ok(Self::new(Self::default_data_dir()?))
    }

    // ── paths ──

    pub fn bin_dir(&self) -> PathBuf {
        self.data_dir.join(files::BIN_DIR)
    }

    pub fn daemon_path(&self) -> PathBuf {
        self.bin_dir()
            .join(format!("{}{}", self.daemon_name, EXE_SUFFIX))
    }

    pub fn upgrade_supervisor_path(&self) -> PathBuf {
        self.bin_dir()
            .join(format!("{}{}", UPGRADE_SUPERVISOR_NAME, EXE_SUFFIX))
    }

    pub fn node_home(&self) -> PathBuf {
        self.data_dir.join(files::NODE_HOME_DIR)
    }

    pub fn genesis_path(&self) -> PathBuf {
        self.node_home().join("config").join("genesis.json")
    }

    pub fn config_toml_path(&self) -> PathBuf {
        self.node_home().join("config").join("config.toml")
    }

    /// `node/cosmovisor`, the upgrade supervisor's working tree.
    pub fn upgrade_root(&self) -> PathBuf {
        self.node_home().join(UPGRADE_SUPERVISOR_NAME)
    }

    pub fn node_config_path(&self) -> PathBuf {
        self.data_dir.join(files::NODE_CONFIG)
    }

    pub fn validator_path(&self) -> PathBuf {
        self.data_dir.join(files::VALIDATOR_RECORD)
    }

    pub fn upgrade_config_path(&self) -> PathBuf {
        self.data_dir.join(files::UPGRADE_SUPERVISOR_CONFIG)
    }

    // ── release assets ──

    /// Daemon download URL for the running platform.
    pub fn daemon_url(&self) -> String {
        self.daemon_url_for(OS, ARCH)
    }

    pub fn daemon_url_for(&self, os: &str, arch: &str) -> String {
        let base = self.release_base.trim_end_matches('/');
        let asset = match (os, arch) {
            ("windows", _) => format!("{}-windows-amd64.exe", self.daemon_name),
            ("macos", "aarch64") => format!("{}-darwin-arm64", self.daemon_name),
            ("macos", _) => format!("{}-darwin-amd64", self.daemon_name),
            (_, "aarch64") => format!("{}-linux-arm64", self.daemon_name),
            _ => format!("{}-linux-amd64", self.daemon_name),
        };
        format!("{}/{}", base, asset)
    }

    /// Upgrade supervisor tarball URL for the running platform.
    pub fn upgrade_supervisor_url(&self) -> String {
        self.upgrade_supervisor_url_for(OS, ARCH)
    }

    pub fn upgrade_supervisor_url_for(&self, os: &str, arch: &str) -> String {
        let version = &self.upgrade_supervisor_version;
        let target = match (os, arch) {
            ("windows", _) => "windows-amd64",
            ("macos", "aarch64") => "darwin-arm64",
            ("macos", _) => "darwin-amd64",
            (_, "aarch64") => "linux-arm64",
            _ => "linux-amd64",
        };
        // Release tags are `cosmovisor/<version>`, with the slash URL-encoded.
        format!(
            "{}/{}%2F{}/{}-{}-{}.tar.gz",
            self.upgrade_supervisor_release_base.trim_end_matches('/'),
            UPGRADE_SUPERVISOR_NAME,
            version,
            UPGRADE_SUPERVISOR_NAME,
            version,
            target
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let cfg = ServiceConfig::new("/data");
        assert_eq!(cfg.node_home(), PathBuf::from("/data/node"));
        assert_eq!(
            cfg.genesis_path(),
            PathBuf::from("/data/node/config/genesis.json")
        );
        assert_eq!(cfg.upgrade_root(), PathBuf::from("/data/node/cosmovisor"));
        assert_eq!(
            cfg.upgrade_config_path(),
            PathBuf::from("/data/cosmovisor-config.json")
        );
        assert!(cfg
            .daemon_path()
            .starts_with(PathBuf::from("/data/bin/tickfy-blockchaind")));
    }

    #[test]
    fn test_default_endpoints() {
        let cfg = ServiceConfig::new("/d");
        assert_eq!(cfg.rpc_url, "http://localhost:26657");
        assert_eq!(cfg.api_url, "http://localhost:1317");
        assert_eq!(cfg.chain_id, "tickfyblockchain");
    }

    #[test]
    fn test_daemon_urls() {
        let cfg = ServiceConfig::new("/d");
        let base = "https://github.com/Tickfy/tickfy-blockchain/releases/download/v1.0.0";
        assert_eq!(
            cfg.daemon_url_for("linux", "x86_64"),
            format!("{}/tickfy-blockchaind-linux-amd64", base)
        );
        assert_eq!(
            cfg.daemon_url_for("macos", "aarch64"),
            format!("{}/tickfy-blockchaind-darwin-arm64", base)
        );
        assert_eq!(
            cfg.daemon_url_for("windows", "x86_64"),
            format!("{}/tickfy-blockchaind-windows-amd64.exe", base)
        );
    }

    #[test]
    fn test_upgrade_supervisor_url() {
        let cfg = ServiceConfig::new("/d");
        assert_eq!(
            cfg.upgrade_supervisor_url_for("linux", "x86_64"),
            "https://github.com/cosmos/cosmos-sdk/releases/download/cosmovisor%2Fv1.5.0/cosmovisor-v1.5.0-linux-amd64.tar.gz"
        );
        assert!(cfg
            .upgrade_supervisor_url_for("macos", "x86_64")
            .ends_with("darwin-amd64.tar.gz"));
    }
}
