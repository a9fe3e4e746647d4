//! The service context a front end talks to.
//!
//! One `NodeService` per process. It owns the vault handle, the supervisor,
//! the log buffer and the HTTP clients, and picks the supervision strategy
//! when the node is started.

use crate::config::ServiceConfig;
use crate::error::NodeError;
use crate::installer;
use crate::logs::LogBuffer;
use crate::records::ValidatorRecord;
use crate::status::{self, AppStatus};
use crate::supervisor::{LaunchSpec, SupervisionMode, Supervisor};
use crate::upgrade;
use crate::validator::{self, StakingInfo, ValidatorParams};
use std::sync::Arc;
use tickfy_rpc::{BankApi, Balance, NodeRpc, RpcConfig};
use tickfy_vault::Vault;

pub struct NodeService {
    config: ServiceConfig,
    vault: Vault,
    logs: Arc<LogBuffer>,
    supervisor: Supervisor,
    node_rpc: NodeRpc,
    bank: BankApi,
    downloads: reqwest::Client,
}

impl NodeService {
    /// Open the data directory and build the clients. Starts nothing.
    pub fn new(config: ServiceConfig) -> Result<Self, NodeError> {
        let vault = Vault::open(&config.data_dir)?;
        let logs = Arc::new(LogBuffer::default());
        let supervisor = Supervisor::new(logs.clone());

        // Status polling should answer quickly even while the node boots.
        let node_rpc = NodeRpc::with_config(RpcConfig {
            url: config.rpc_url.clone(),
            retries: 0,
            ..Default::default()
        })?;
        let bank = BankApi::new(&config.api_url)?;
        let downloads = reqwest::Client::builder()
            .build()
            .map_err(|e| NodeError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            vault,
            logs,
            supervisor,
            node_rpc,
            bank,
            downloads,
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    pub fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    // =========================================================================
    // Wallets
    // =========================================================================

    /// Delete a wallet; refused while the node runs.
    pub fn delete_wallet(&self, id: &str) -> Result<(), NodeError> {
        Ok(self.vault.delete_wallet(id, &self.supervisor)?)
    }

    /// Staking-token balance of `address`, or of the active wallet.
    ///
    /// Only a missing wallet is an error. Any failure talking to the REST API
    /// reads as a zero balance.
    pub async fn balance(&self, address: Option<&str>) -> Result<Balance, NodeError> {
        let address = match address {
            Some(a) => a.to_string(),
            None => self.vault.active_wallet_info()?.address,
        };
        Ok(self.bank.balance(&address).await.unwrap_or_else(|e| {
            log::warn!("balance query failed: {}", e);
            Balance::zero()
        }))
    }

    // =========================================================================
    // Node setup
    // =========================================================================

    pub async fn install_node(&self, on_progress: &mut dyn FnMut(u8)) -> Result<bool, NodeError> {
        installer::install_node(&self.config, &self.downloads, &self.logs, on_progress).await
    }

    pub async fn init_node(&self, moniker: &str) -> Result<bool, NodeError> {
        installer::init_node(&self.config, &self.downloads, &self.logs, moniker).await
    }

    pub async fn install_upgrade_supervisor(
        &self,
        on_progress: &mut dyn FnMut(u8),
    ) -> Result<bool, NodeError> {
        upgrade::install_upgrade_supervisor(&self.config, &self.downloads, &self.logs, on_progress)
            .await
    }

    pub async fn setup_upgrade_supervisor(&self) -> Result<(), NodeError> {
        upgrade::setup_upgrade_supervisor(&self.config, &self.logs).await
    }

    pub fn is_upgrade_supervision_enabled(&self) -> bool {
        upgrade::is_enabled(&self.config)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// How the node would be launched right now.
    pub fn launch_spec(&self) -> LaunchSpec {
        let home = self.config.node_home();
        if self.is_upgrade_supervision_enabled() {
            LaunchSpec::new(self.config.upgrade_supervisor_path(), SupervisionMode::Wrapped)
                .arg("run")
                .arg("start")
                .arg("--home")
                .arg(&home)
                .env("DAEMON_NAME", self.config.daemon_name.clone())
                .env("DAEMON_HOME", home.display().to_string())
                .env("DAEMON_ALLOW_DOWNLOAD_BINARIES", "true")
                .env("DAEMON_RESTART_AFTER_UPGRADE", "true")
                .env("DAEMON_POLL_INTERVAL", "300ms")
                .env("UNSAFE_SKIP_BACKUP", "true")
        } else {
            LaunchSpec::new(self.config.daemon_path(), SupervisionMode::Direct)
                .arg("start")
                .arg("--home")
                .arg(&home)
        }
    }

    /// Start the node under the strategy the data directory calls for.
    pub fn start_node(&self) -> Result<SupervisionMode, NodeError> {
        let spec = self.launch_spec();
        if !spec.program.exists() {
            let what = match spec.mode {
                SupervisionMode::Direct => "node binary",
                SupervisionMode::Wrapped => "upgrade supervisor",
            };
            return Err(NodeError::NotInstalled {
                what,
                path: spec.program,
            });
        }
        let mode = spec.mode;
        self.supervisor.start(spec)?;
        Ok(mode)
    }

    pub fn stop_node(&self) -> Result<(), NodeError> {
        self.supervisor.stop()
    }

    pub fn is_node_running(&self) -> bool {
        self.supervisor.is_running()
    }

    /// Newest `n` log entries (all of them for `0`).
    pub fn logs(&self, n: usize) -> Vec<String> {
        self.logs.tail(n)
    }

    /// The shared log buffer, for following output as it arrives.
    pub fn log_buffer(&self) -> &Arc<LogBuffer> {
        &self.logs
    }

    pub async fn status(&self) -> AppStatus {
        status::collect(
            &self.config,
            &self.vault,
            self.supervisor.is_running(),
            &self.node_rpc,
        )
        .await
    }

    // =========================================================================
    // Validator
    // =========================================================================

    pub async fn create_validator(
        &self,
        params: &ValidatorParams,
        password: &str,
    ) -> Result<ValidatorRecord, NodeError> {
        validator::create_validator(&self.config, &self.vault, &self.logs, params, password).await
    }

    pub fn validator_status(&self) -> Result<ValidatorRecord, NodeError> {
        validator::validator_status(&self.config)
    }

    pub fn staking_info(&self) -> Result<StakingInfo, NodeError> {
        validator::staking_info(&self.config)
    }

    pub async fn withdraw_rewards(&self, password: &str) -> Result<(), NodeError> {
        validator::withdraw_rewards(&self.config, &self.vault, &self.logs, password).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    fn service(dir: &std::path::Path) -> NodeService {
        NodeService::new(ServiceConfig::new(dir)).unwrap()
    }

    #[test]
    fn test_direct_launch_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        let spec = svc.launch_spec();
        assert_eq!(spec.mode, SupervisionMode::Direct);
        assert_eq!(spec.program, svc.config().daemon_path());
        assert_eq!(
            spec.args,
            [
                OsString::from("start"),
                OsString::from("--home"),
                svc.config().node_home().into_os_string()
            ]
        );
        assert!(spec.env.is_empty());
    }

    #[test]
    fn test_wrapped_launch_when_provisioned() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        std::fs::write(svc.config().upgrade_config_path(), "{}").unwrap();

        let spec = svc.launch_spec();
        assert_eq!(spec.mode, SupervisionMode::Wrapped);
        assert_eq!(spec.program, svc.config().upgrade_supervisor_path());
        assert_eq!(spec.args[..2], [OsString::from("run"), OsString::from("start")]);

        let env = |key: &str| {
            spec.env
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(env("DAEMON_NAME"), Some("tickfy-blockchaind"));
        assert_eq!(
            env("DAEMON_HOME").map(String::from),
            Some(svc.config().node_home().display().to_string())
        );
        assert_eq!(env("DAEMON_ALLOW_DOWNLOAD_BINARIES"), Some("true"));
        assert_eq!(env("DAEMON_RESTART_AFTER_UPGRADE"), Some("true"));
        assert_eq!(env("DAEMON_POLL_INTERVAL"), Some("300ms"));
        assert_eq!(env("UNSAFE_SKIP_BACKUP"), Some("true"));
    }

    #[test]
    fn test_start_without_binary() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        let err = svc.start_node().unwrap_err();
        assert!(matches!(err, NodeError::NotInstalled { what: "node binary", .. }));
        assert!(!svc.is_node_running());
        assert!(matches!(svc.stop_node(), Err(NodeError::NotRunning)));
    }

    #[tokio::test]
    async fn test_balance_without_wallet() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        let err = svc.balance(None).await.unwrap_err();
        assert_eq!(err.kind(), tickfy_types::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_balance_unreachable_api_reads_zero() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ServiceConfig::new(dir.path());
        config.api_url = "http://127.0.0.1:9".to_string();
        let svc = NodeService::new(config).unwrap();
        svc.vault().create_wallet("main", "secret1").unwrap();

        let balance = svc.balance(None).await.unwrap();
        assert_eq!(balance.micro, 0);
        assert_eq!(balance.display, "0 TKFY");

        let explicit = svc.balance(Some("tickfy1whatever")).await.unwrap();
        assert_eq!(explicit.display, "0 TKFY");
    }
}
