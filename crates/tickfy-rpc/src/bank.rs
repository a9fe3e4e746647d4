//! Cosmos SDK bank REST client and balance formatting.

use crate::client::{RpcClient, RpcConfig};
use crate::error::RpcError;
use serde::{Deserialize, Serialize};
use tickfy_types::constants::{INTEGER_DISPLAY_THRESHOLD, MICRO_PER_TOKEN, TICKER};
use tickfy_types::Denom;

/// One `{denom, amount}` entry of `/cosmos/bank/v1beta1/balances/{address}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: String,
}

#[derive(Debug, Clone, Deserialize)]
struct BalancesResponse {
    #[serde(default)]
    balances: Vec<Coin>,
}

/// Staking-token balance of one account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Balance {
    /// Raw amount in micro-units.
    pub micro: u128,
    /// Whole tokens (lossy, for charts and sorting).
    pub tokens: f64,
    /// Human-readable form, e.g. `1,234.50 TKFY`.
    pub display: String,
}

impl Balance {
    pub fn from_micro(micro: u128) -> Self {
        Self {
            micro,
            tokens: micro as f64 / MICRO_PER_TOKEN as f64,
            display: format_balance(micro),
        }
    }

    pub fn zero() -> Self {
        Self::from_micro(0)
    }
}

fn group_thousands(n: u128) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Format a micro-unit amount for display.
///
/// Below one million tokens two decimals are shown (truncated, and dropped
/// entirely when both are zero); at or above it only the integer part. The
/// integer part is grouped by thousands.
pub fn format_balance(micro: u128) -> String {
    let whole = micro / MICRO_PER_TOKEN;
    let cents = (micro % MICRO_PER_TOKEN) / (MICRO_PER_TOKEN / 100);

    if whole >= INTEGER_DISPLAY_THRESHOLD || cents == 0 {
        format!("{} {}", group_thousands(whole), TICKER)
    } else {
        format!("{}.{:02} {}", group_thousands(whole), cents, TICKER)
    }
}

/// Typed client for the node's REST API.
pub struct BankApi {
    client: RpcClient,
}

impl BankApi {
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

    /// All coin balances of an address.
    pub async fn balances(&self, address: &str) -> Result<Vec<Coin>, RpcError> {
        let endpoint = format!("/cosmos/bank/v1beta1/balances/{}", address);
        let resp: BalancesResponse = self.client.get_json(&endpoint).await?;
        Ok(resp.balances)
    }

    /// Staking-token balance of an address.
    ///
    /// The first coin whose denom is a known staking denom wins; an account
    /// holding none of them has a zero balance.
    pub async fn balance(&self, address: &str) -> Result<Balance, RpcError> {
        let coins = self.balances(address).await?;
        let micro = match coins.iter().find(|c| Denom::parse(&c.denom).is_some()) {
            Some(coin) => coin.amount.trim().parse::<u128>().map_err(|_| {
                RpcError::InvalidResponse {
                    context: "bank balances".to_string(),
                    detail: format!("amount is not a number: {:?}", coin.amount),
                }
            })?,
            None => 0,
        };
        Ok(Balance::from_micro(micro))
    }
}
