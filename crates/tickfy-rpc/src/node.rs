//! CometBFT RPC client.
//!
//! Only the two read endpoints the status view needs: `/status` for the
//! latest block height and `/net_info` for the peer count. CometBFT encodes
//! integers as decimal strings, so the typed getters parse them.

use crate::client::{RpcClient, RpcConfig};
use crate::error::RpcError;
use serde::Deserialize;
use serde_json::Value;

// =============================================================================
// Response Types
// =============================================================================

/// `result.sync_info` of `/status`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncInfo {
    #[serde(default)]
    pub latest_block_height: String,
    #[serde(default)]
    pub latest_block_hash: String,
    #[serde(default)]
    pub latest_block_time: String,
    #[serde(default)]
    pub catching_up: bool,
}

/// `result.node_info` of `/status`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub network: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub moniker: String,
}

/// `result` of `/status`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeStatus {
    #[serde(default)]
    pub node_info: NodeInfo,
    #[serde(default)]
    pub sync_info: SyncInfo,
}

/// `result` of `/net_info`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetInfo {
    #[serde(default)]
    pub listening: bool,
    #[serde(default)]
    pub n_peers: String,
}

/// Strip the JSON-RPC envelope if present.
fn unwrap_result(val: Value) -> Value {
    match val {
        Value::Object(mut map) if map.contains_key("result") => {
            map.remove("result").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn parse_decimal(context: &str, field: &str, raw: &str) -> Result<u64, RpcError> {
    raw.trim().parse().map_err(|_| RpcError::InvalidResponse {
        context: context.to_string(),
        detail: format!("{} is not a number: {:?}", field, raw),
    })
}

// =============================================================================
// Client
// =============================================================================

/// Typed client for a node's CometBFT RPC port.
pub struct NodeRpc {
    client: RpcClient,
}

impl NodeRpc {
    /// Create a client connected to the given URL.
    pub fn new(url: &str) -> Result<Self, RpcError> {
        Ok(Self {
            client: RpcClient::new(url)?,
        })
    }

    /// Create a client with full configuration.
    pub fn with_config(config: RpcConfig) -> Result<Self, RpcError> {
        Ok(Self {
            client: RpcClient::with_config(config)?,
        })
    }

    /// Get the underlying client.
    pub fn client(&self) -> &RpcClient {
        &self.client
    }

    /// Full `/status` result.
    pub async fn status(&self) -> Result<NodeStatus, RpcError> {
        let val = self.client.get("/status").await?;
        Ok(serde_json::from_value(unwrap_result(val))?)
    }

    /// Full `/net_info` result.
    pub async fn net_info(&self) -> Result<NetInfo, RpcError> {
        let val = self.client.get("/net_info").await?;
        Ok(serde_json::from_value(unwrap_result(val))?)
    }

    /// Latest committed block height.
    pub async fn latest_block_height(&self) -> Result<u64, RpcError> {
        let status = self.status().await?;
        parse_decimal("/status", "latest_block_height", &status.sync_info.latest_block_height)
    }

    /// Number of connected peers.
    pub async fn peer_count(&self) -> Result<u32, RpcError> {
        let info = self.net_info().await?;
        let peers = parse_decimal("/net_info", "n_peers", &info.n_peers)?;
        Ok(u32::try_from(peers).unwrap_or(u32::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parses_envelope() {
        let raw = serde_json::json!({
            "jsonrpc": "2.0",
            "id": -1,
            "result": {
                "node_info": { "moniker": "val-1", "network": "tickfyblockchain" },
                "sync_info": { "latest_block_height": "4821", "catching_up": false }
            }
        });
        let status: NodeStatus = serde_json::from_value(unwrap_result(raw)).unwrap();
        assert_eq!(status.node_info.moniker, "val-1");
        assert_eq!(
            parse_decimal("/status", "h", &status.sync_info.latest_block_height).unwrap(),
            4821
        );
    }

    #[test]
    fn test_bare_result_is_accepted() {
        let raw = serde_json::json!({ "listening": true, "n_peers": "7" });
        let info: NetInfo = serde_json::from_value(unwrap_result(raw)).unwrap();
        assert_eq!(info.n_peers, "7");
    }

    #[test]
    fn test_non_numeric_height_is_invalid_response() {
        let err = parse_decimal("/status", "latest_block_height", "").unwrap_err();
        assert!(matches!(err, RpcError::InvalidResponse { .. }));
    }
}
