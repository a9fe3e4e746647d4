//! Read-only status snapshot.
//!
//! Built from marker files, the vault, the supervisor's running flag and, only
//! while the node runs, the local RPC. Nothing here fails: an unreadable
//! source just leaves its fields at their zero value.

use crate::config::ServiceConfig;
use crate::records::NodeConfig;
use serde::Serialize;
use tickfy_rpc::NodeRpc;
use tickfy_vault::{persist, Vault};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppStatus {
    pub has_wallet: bool,
    pub is_node_installed: bool,
    pub is_node_initialized: bool,
    pub is_node_running: bool,
    pub is_validator: bool,
    pub is_upgrade_supervisor_installed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moniker: Option<String>,
    pub current_block: u64,
    pub peers: u32,
}

/// Latest height and peer count. A failed height query zeroes both; a failed
/// peer query alone zeroes only the peers.
pub async fn chain_progress(node: &NodeRpc) -> (u64, u32) {
    let height = match node.latest_block_height().await {
        Ok(h) => h,
        Err(e) => {
            log::debug!("status query failed: {}", e);
            return (0, 0);
        }
    };
    let peers = node.peer_count().await.unwrap_or_else(|e| {
        log::debug!("peer query failed: {}", e);
        0
    });
    (height, peers)
}

pub async fn collect(
    config: &ServiceConfig,
    vault: &Vault,
    is_running: bool,
    node: &NodeRpc,
) -> AppStatus {
    let mut status = AppStatus {
        is_node_installed: config.daemon_path().exists(),
        is_node_initialized: config.node_config_path().exists(),
        is_validator: config.validator_path().exists(),
        is_upgrade_supervisor_installed: config.upgrade_supervisor_path().exists(),
        is_node_running: is_running,
        ..Default::default()
    };

    match vault.load() {
        Ok(store) => {
            status.has_wallet = !store.is_empty();
            status.wallet_address = store.active().map(|w| w.address.clone());
        }
        Err(e) => log::warn!("wallet store unreadable: {}", e),
    }

    match persist::read_json::<NodeConfig>(&config.node_config_path()) {
        Ok(Some(cfg)) => status.moniker = Some(cfg.moniker),
        Ok(None) => {}
        Err(e) => log::warn!("node config unreadable: {}", e),
    }

    if is_running {
        let (height, peers) = chain_progress(node).await;
        status.current_block = height;
        status.peers = peers;
    }

    status
}
