//! Tickfy local node clients.
//!
//! Async HTTP clients for the CometBFT RPC (`/status`, `/net_info`) and the
//! Cosmos SDK REST bank module exposed by a node running on this machine.
//!
//! # Example
//!
//! ```ignore
//! use tickfy_rpc::NodeRpc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let node = NodeRpc::new("http://localhost:26657").unwrap();
//!     let height = node.latest_block_height().await.unwrap();
//!     println!("Height: {}", height);
//! }
//! ```

pub mod bank;
pub mod client;
pub mod error;
pub mod node;

pub use bank::{format_balance, Balance, BankApi};
pub use client::{RpcClient, RpcConfig};
pub use error::RpcError;
pub use node::{NodeRpc, SyncInfo};

/// Default local endpoints.
pub mod endpoints {
    use tickfy_types::constants::ports;

    pub fn node_rpc() -> String {
        format!("http://localhost:{}", ports::NODE_RPC)
    }

    pub fn node_api() -> String {
        format!("http://localhost:{}", ports::NODE_API)
    }
}
