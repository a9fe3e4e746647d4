//! Marker files written by the setup steps.
//!
//! Their presence drives the status view; their contents are informational.

use serde::{Deserialize, Serialize};

/// `node-config.json`, written once by init.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeConfig {
    pub moniker: String,
    pub chain_id: String,
    pub node_home: String,
}

/// `validator.json`. A local record of a submitted create-validator
/// transaction; nothing here is checked against the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorRecord {
    pub moniker: String,
    pub commission: String,
    pub stake: String,
    pub created_at: i64,
}

/// `cosmovisor-config.json`. Its presence switches start to wrapped mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeSupervisorConfig {
    pub installed: bool,
    pub auto_download: bool,
    pub version: String,
}
