//! Validator operations shelled out to the daemon CLI.
//!
//! The operator key is imported into the daemon's `test` keyring under the
//! name `validator`, from the active wallet's mnemonic.

use crate::config::ServiceConfig;
use crate::error::NodeError;
use crate::logs::LogBuffer;
use crate::records::ValidatorRecord;
use crate::tool;
use serde::Serialize;
use std::ffi::OsString;
use std::path::PathBuf;
use tickfy_types::constants::{KEYRING_BACKEND, TICKER, VALIDATOR_KEY_NAME};
use tickfy_types::Denom;
use tickfy_vault::{persist, Vault};

/// Highest commission rate the validator may ever charge.
pub const COMMISSION_MAX_RATE: &str = "0.20";
const COMMISSION_MAX: f64 = 0.20;
/// Highest daily commission change.
pub const COMMISSION_MAX_CHANGE_RATE: &str = "0.01";
/// Minimum self delegation, in micro-units.
pub const MIN_SELF_DELEGATION: &str = "1";

/// Inputs of [`create_validator`].
#[derive(Debug, Clone)]
pub struct ValidatorParams {
    pub moniker: String,
    /// Decimal rate, e.g. `0.10`.
    pub commission: String,
    /// Whole-number amount of the staking denomination.
    pub stake: String,
}

impl ValidatorParams {
    fn validate(&self) -> Result<(), NodeError> {
        if self.moniker.trim().is_empty() {
            return Err(NodeError::invalid("moniker", "must not be empty"));
        }

        match self.commission.trim().parse::<f64>() {
            Ok(rate) if (0.0..=COMMISSION_MAX).contains(&rate) => {}
            _ => {
                return Err(NodeError::invalid(
                    "commission",
                    format!("expected a rate between 0 and {}", COMMISSION_MAX_RATE),
                ))
            }
        }

        let stake = self.stake.trim();
        if stake.is_empty()
            || !stake.bytes().all(|b| b.is_ascii_digit())
            || stake.bytes().all(|b| b == b'0')
        {
            return Err(NodeError::invalid("stake", "expected a positive whole amount"));
        }
        Ok(())
    }
}

/// Display strings derived from the local validator record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StakingInfo {
    pub total_staked: String,
    pub self_delegation: String,
    pub delegations: String,
}

impl StakingInfo {
    fn from_stake(stake: &str) -> Self {
        let stake = match stake.trim() {
            "" => "0",
            s => s,
        };
        Self {
            total_staked: format!("{} {}", stake, TICKER),
            self_delegation: format!("{} {}", stake, TICKER),
            delegations: format!("0 {}", TICKER),
        }
    }
}

fn require_daemon(config: &ServiceConfig) -> Result<PathBuf, NodeError> {
    let binary = config.daemon_path();
    if !binary.exists() {
        return Err(NodeError::NotInstalled {
            what: "node binary",
            path: binary,
        });
    }
    Ok(binary)
}

/// Flags shared by every keyring-touching subcommand.
fn keyring_args(config: &ServiceConfig) -> Vec<OsString> {
    vec![
        "--home".into(),
        config.node_home().into_os_string(),
        "--keyring-backend".into(),
        KEYRING_BACKEND.into(),
    ]
}

fn create_validator_args(
    config: &ServiceConfig,
    params: &ValidatorParams,
    pubkey: &str,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "tx",
        "staking",
        "create-validator",
        "--amount",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();
    args.push(format!("{}{}", params.stake.trim(), Denom::Stake.as_str()).into());
    for (flag, value) in [
        ("--pubkey", pubkey),
        ("--moniker", params.moniker.trim()),
        ("--commission-rate", params.commission.trim()),
        ("--commission-max-rate", COMMISSION_MAX_RATE),
        ("--commission-max-change-rate", COMMISSION_MAX_CHANGE_RATE),
        ("--min-self-delegation", MIN_SELF_DELEGATION),
        ("--from", VALIDATOR_KEY_NAME),
        ("--chain-id", config.chain_id.as_str()),
    ] {
        args.push(flag.into());
        args.push(value.into());
    }
    args.extend(keyring_args(config));
    args.push("--yes".into());
    args
}

/// Import the operator key, submit create-validator, and record it locally.
pub async fn create_validator(
    config: &ServiceConfig,
    vault: &Vault,
    logs: &LogBuffer,
    params: &ValidatorParams,
    password: &str,
) -> Result<ValidatorRecord, NodeError> {
    params.validate()?;
    let (_, mnemonic) = vault.unlock_active(password)?;
    let binary = require_daemon(config)?;

    let mut add_key: Vec<OsString> = vec![
        "keys".into(),
        "add".into(),
        VALIDATOR_KEY_NAME.into(),
        "--recover".into(),
    ];
    add_key.extend(keyring_args(config));
    let stdin = format!("{}\n", mnemonic.as_str());
    let imported = tool::run(&binary, &add_key, Some(&stdin)).await?;
    if !imported.success {
        let output = imported.combined();
        if !output.contains("already exists") {
            logs.push(&format!("Key import error: {}", output));
            return Err(NodeError::Tool {
                tool: tool::tool_name(&binary),
                output,
            });
        }
    }

    let home = config.node_home();
    let shown = tool::run_checked(
        &binary,
        [
            OsString::from("tendermint"),
            "show-validator".into(),
            "--home".into(),
            home.into_os_string(),
        ],
        None,
    )
    .await?;
    let pubkey = shown.stdout.trim().to_string();

    let submitted = tool::run(&binary, create_validator_args(config, params, &pubkey), None).await?;
    if !submitted.success {
        let output = submitted.combined();
        logs.push(&format!("Create validator error: {}", output));
        return Err(NodeError::Tool {
            tool: tool::tool_name(&binary),
            output,
        });
    }

    let record = ValidatorRecord {
        moniker: params.moniker.trim().to_string(),
        commission: params.commission.trim().to_string(),
        stake: params.stake.trim().to_string(),
        created_at: chrono::Utc::now().timestamp(),
    };
    persist::write_json(&config.validator_path(), &record)?;

    log::info!("validator {} created", record.moniker);
    logs.push("Validator created successfully");
    Ok(record)
}

/// The local validator record.
pub fn validator_status(config: &ServiceConfig) -> Result<ValidatorRecord, NodeError> {
    persist::read_json(&config.validator_path())?.ok_or(NodeError::ValidatorNotFound)
}

/// Staking summary; zeros when no validator was created here.
pub fn staking_info(config: &ServiceConfig) -> Result<StakingInfo, NodeError> {
    let record: Option<ValidatorRecord> = persist::read_json(&config.validator_path())?;
    Ok(StakingInfo::from_stake(
        record.as_ref().map(|r| r.stake.as_str()).unwrap_or(""),
    ))
}

/// Withdraw all delegation rewards to the operator key.
///
/// The password is checked against the active wallet first.
pub async fn withdraw_rewards(
    config: &ServiceConfig,
    vault: &Vault,
    logs: &LogBuffer,
    password: &str,
) -> Result<(), NodeError> {
    let (wallet, _) = vault.unlock_active(password)?;
    let binary = require_daemon(config)?;

    let mut args: Vec<OsString> = [
        "tx",
        "distribution",
        "withdraw-all-rewards",
        "--from",
        VALIDATOR_KEY_NAME,
        "--chain-id",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();
    args.push(config.chain_id.clone().into());
    args.extend(keyring_args(config));
    args.push("--yes".into());

    tool::run_checked(&binary, &args, None).await?;
    logs.push(&format!("Rewards withdrawn to {}", wallet.address));
    Ok(())
}
