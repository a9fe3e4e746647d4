//! Upgrade supervisor (cosmovisor) provisioning.
//!
//! Once `cosmovisor-config.json` exists the service starts the daemon through
//! the supervisor, which watches for on-chain upgrade plans and swaps the
//! binary under `node/cosmovisor/current`.

use crate::config::ServiceConfig;
use crate::error::NodeError;
use crate::installer::{download, make_executable};
use crate::logs::LogBuffer;
use crate::records::UpgradeSupervisorConfig;
use crate::tool;
use std::ffi::OsStr;
use std::path::Path;
use tickfy_vault::persist;

/// Whether start should wrap the daemon in the upgrade supervisor.
pub fn is_enabled(config: &ServiceConfig) -> bool {
    config.upgrade_config_path().exists()
}

/// Download and unpack the supervisor into `bin/`. Returns `false` when it
/// was already present.
pub async fn install_upgrade_supervisor(
    config: &ServiceConfig,
    client: &reqwest::Client,
    logs: &LogBuffer,
    on_progress: &mut dyn FnMut(u8),
) -> Result<bool, NodeError> {
    let binary = config.upgrade_supervisor_path();
    if binary.exists() {
        logs.push("Cosmovisor already installed");
        return Ok(false);
    }
    let bin_dir = config.bin_dir();
    tokio::fs::create_dir_all(&bin_dir)
        .await
        .map_err(|e| NodeError::io(&bin_dir, e))?;

    let url = config.upgrade_supervisor_url();
    logs.push(&format!("Downloading Cosmovisor from: {}", url));
    let tarball = bin_dir.join("cosmovisor.tar.gz");
    download(client, &url, &tarball, on_progress).await?;

    logs.push("Extracting Cosmovisor...");
    let extract = tool::run(
        Path::new("tar"),
        [
            OsStr::new("-xzf"),
            tarball.as_os_str(),
            OsStr::new("-C"),
            bin_dir.as_os_str(),
        ],
        None,
    )
    .await;
    let _ = tokio::fs::remove_file(&tarball).await;

    let extract = extract?;
    if !extract.success {
        let output = extract.combined();
        logs.push(&format!("Extract error: {}", output));
        return Err(NodeError::Tool {
            tool: "tar".to_string(),
            output,
        });
    }
    if !binary.exists() {
        return Err(NodeError::Tool {
            tool: "tar".to_string(),
            output: format!("archive did not contain {}", tool::tool_name(&binary)),
        });
    }
    make_executable(&binary).await?;

    log::info!("upgrade supervisor installed at {}", binary.display());
    logs.push("Cosmovisor installed successfully");
    Ok(true)
}

/// Lay out the supervisor tree and enable wrapped mode.
///
/// ```text
/// node/cosmovisor/
///   genesis/bin/tickfy-blockchaind
///   upgrades/
///   current -> genesis
/// ```
pub async fn setup_upgrade_supervisor(
    config: &ServiceConfig,
    logs: &LogBuffer,
) -> Result<(), NodeError> {
    let daemon = config.daemon_path();
    if !daemon.exists() {
        return Err(NodeError::NotInstalled {
            what: "node binary",
            path: daemon,
        });
    }

    let root = config.upgrade_root();
    let genesis = root.join("genesis");
    let genesis_bin = genesis.join("bin");
    let upgrades = root.join("upgrades");
    for dir in [&genesis_bin, &upgrades] {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| NodeError::io(dir, e))?;
    }

    let target = genesis_bin.join(daemon.file_name().unwrap_or(daemon.as_os_str()));
    if !target.exists() {
        tokio::fs::copy(&daemon, &target)
            .await
            .map_err(|e| NodeError::io(&target, e))?;
        make_executable(&target).await?;
        logs.push("Binary copied to cosmovisor/genesis/bin");
    }

    link_current(&root.join("current"), &genesis, logs).await;

    let record = UpgradeSupervisorConfig {
        installed: true,
        auto_download: true,
        version: config.upgrade_supervisor_version.clone(),
    };
    persist::write_json(&config.upgrade_config_path(), &record)?;

    logs.push("Cosmovisor directory structure created");
    Ok(())
}

/// Point `current` at `genesis`. Failures are logged, not returned.
async fn link_current(link: &Path, genesis: &Path, logs: &LogBuffer) {
    let _ = tokio::fs::remove_file(link).await;
    #[cfg(unix)]
    let linked = tokio::fs::symlink(genesis, link).await;
    #[cfg(not(unix))]
    let linked: std::io::Result<()> = Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "symlinks not supported on this platform",
    ));
    if let Err(e) = linked {
        logs.push(&format!("Symlink warning: {}", e));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_setup_requires_daemon() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServiceConfig::new(dir.path());
        let err = setup_upgrade_supervisor(&config, &LogBuffer::new(10))
            .await
            .unwrap_err();
        assert!(matches!(err, NodeError::NotInstalled { .. }));
        assert!(!is_enabled(&config));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_setup_lays_out_tree() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServiceConfig::new(dir.path());
        std::fs::create_dir_all(config.bin_dir()).unwrap();
        std::fs::write(config.daemon_path(), b"#!/bin/sh\n").unwrap();

        let logs = LogBuffer::new(10);
        setup_upgrade_supervisor(&config, &logs).await.unwrap();

        let root = config.upgrade_root();
        assert!(root.join("genesis/bin/tickfy-blockchaind").is_file());
        assert!(root.join("upgrades").is_dir());
        let current = std::fs::read_link(root.join("current")).unwrap();
        assert_eq!(current, root.join("genesis"));
        assert!(is_enabled(&config));

        let saved: UpgradeSupervisorConfig =
            persist::read_json(&config.upgrade_config_path()).unwrap().unwrap();
        assert!(saved.installed && saved.auto_download);
        assert_eq!(saved.version, "v1.5.0");

        // Running it again keeps the tree and the marker.
        setup_upgrade_supervisor(&config, &logs).await.unwrap();
        assert!(root.join("current").exists());
    }
}
