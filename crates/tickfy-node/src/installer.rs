//! Daemon installation and node home initialisation.

use crate::config::ServiceConfig;
use crate::error::NodeError;
use crate::logs::LogBuffer;
use crate::records::NodeConfig;
use crate::tool;
use std::ffi::OsStr;
use std::path::Path;
use tickfy_vault::persist;
use tokio::io::AsyncWriteExt;

/// Stream `url` into `dest`, reporting whole-percent progress when the
/// server announces a length. The body lands in `dest.part` first and is
/// renamed on completion. Returns the number of bytes written.
pub async fn download(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    on_progress: &mut dyn FnMut(u8),
) -> Result<u64, NodeError> {
    let mut resp = client.get(url).send().await?;
    let status = resp.status().as_u16();
    if status != 200 {
        return Err(NodeError::DownloadStatus {
            url: url.to_string(),
            status,
        });
    }

    let total = resp.content_length().filter(|&n| n > 0);
    let mut part_name = dest.as_os_str().to_os_string();
    part_name.push(".part");
    let part = Path::new(&part_name);

    let mut file = tokio::fs::File::create(part)
        .await
        .map_err(|e| NodeError::io(part, e))?;
    let mut written: u64 = 0;
    let mut last_pct: Option<u8> = None;

    let result: Result<(), NodeError> = async {
        while let Some(chunk) = resp.chunk().await? {
            file.write_all(&chunk)
                .await
                .map_err(|e| NodeError::io(part, e))?;
            written += chunk.len() as u64;
            if let Some(total) = total {
                let pct = (written.saturating_mul(100) / total).min(100) as u8;
                if last_pct != Some(pct) {
                    last_pct = Some(pct);
                    on_progress(pct);
                }
            }
        }
        file.flush().await.map_err(|e| NodeError::io(part, e))
    }
    .await;

    drop(file);
    if let Err(e) = result {
        let _ = tokio::fs::remove_file(part).await;
        return Err(e);
    }

    tokio::fs::rename(part, dest)
        .await
        .map_err(|e| NodeError::io(dest, e))?;
    Ok(written)
}

/// Mark `path` executable (0755). No-op off unix.
pub(crate) async fn make_executable(path: &Path) -> Result<(), NodeError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
            .await
            .map_err(|e| NodeError::io(path, e))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Download the daemon binary into `bin/`. Returns `false` when it was
/// already present.
pub async fn install_node(
    config: &ServiceConfig,
    client: &reqwest::Client,
    logs: &LogBuffer,
    on_progress: &mut dyn FnMut(u8),
) -> Result<bool, NodeError> {
    let binary = config.daemon_path();
    if binary.exists() {
        return Ok(false);
    }
    let bin_dir = config.bin_dir();
    tokio::fs::create_dir_all(&bin_dir)
        .await
        .map_err(|e| NodeError::io(&bin_dir, e))?;

    let url = config.daemon_url();
    logs.push(&format!("Downloading from: {}", url));
    log::info!("downloading daemon from {}", url);

    let bytes = download(client, &url, &binary, on_progress).await?;
    make_executable(&binary).await?;

    log::info!("daemon installed ({} bytes)", bytes);
    logs.push("Binary installed successfully");
    Ok(true)
}

/// Replace the first empty `seeds = ""` entry with `seeds`.
fn configure_seeds(config_toml: &str, seeds: &str) -> String {
    config_toml.replacen(r#"seeds = """#, &format!(r#"seeds = "{}""#, seeds), 1)
}

/// Initialise the node home. Returns `false` when it already had a genesis.
///
/// Genesis download and seed configuration are best effort: the daemon's own
/// `init` output is a usable, if isolated, home.
pub async fn init_node(
    config: &ServiceConfig,
    client: &reqwest::Client,
    logs: &LogBuffer,
    moniker: &str,
) -> Result<bool, NodeError> {
    let moniker = moniker.trim();
    let genesis = config.genesis_path();
    if genesis.exists() {
        return Ok(false);
    }
    if moniker.is_empty() {
        return Err(NodeError::invalid("moniker", "must not be empty"));
    }
    let binary = config.daemon_path();
    if !binary.exists() {
        return Err(NodeError::NotInstalled {
            what: "node binary",
            path: binary,
        });
    }

    let home = config.node_home();
    logs.push(&format!("Initializing node with moniker: {}", moniker));
    let init = tool::run(
        &binary,
        [
            OsStr::new("init"),
            OsStr::new(moniker),
            OsStr::new("--chain-id"),
            OsStr::new(&config.chain_id),
            OsStr::new("--home"),
            home.as_os_str(),
        ],
        None,
    )
    .await?;
    if !init.success {
        let output = init.combined();
        logs.push(&format!("Init error: {}", output));
        return Err(NodeError::Tool {
            tool: tool::tool_name(&binary),
            output,
        });
    }

    match fetch_genesis(client, &config.genesis_url).await {
        Ok(data) => match tokio::fs::write(&genesis, data).await {
            Ok(()) => logs.push("Genesis downloaded"),
            Err(e) => log::warn!("could not write genesis: {}", e),
        },
        Err(e) => log::warn!("genesis download skipped: {}", e),
    }

    let config_toml = config.config_toml_path();
    match tokio::fs::read_to_string(&config_toml).await {
        Ok(text) => {
            if let Err(e) =
                tokio::fs::write(&config_toml, configure_seeds(&text, &config.seeds)).await
            {
                log::warn!("could not update {}: {}", config_toml.display(), e);
            }
        }
        Err(e) => log::warn!("could not read {}: {}", config_toml.display(), e),
    }

    let record = NodeConfig {
        moniker: moniker.to_string(),
        chain_id: config.chain_id.clone(),
        node_home: home.display().to_string(),
    };
    persist::write_json(&config.node_config_path(), &record)?;

    logs.push("Node initialized successfully");
    Ok(true)
}

async fn fetch_genesis(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, NodeError> {
    let resp = client.get(url).send().await?;
    let status = resp.status().as_u16();
    if status != 200 {
        return Err(NodeError::DownloadStatus {
            url: url.to_string(),
            status,
        });
    }
    Ok(resp.bytes().await?.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configure_seeds_replaces_first_empty() {
        let toml = "[p2p]\nseeds = \"\"\npersistent_peers = \"\"\n";
        let out = configure_seeds(toml, "a:1,b:2");
        assert_eq!(out, "[p2p]\nseeds = \"a:1,b:2\"\npersistent_peers = \"\"\n");
    }

    #[test]
    fn test_configure_seeds_keeps_existing() {
        let toml = "seeds = \"x:1\"\n";
        assert_eq!(configure_seeds(toml, "a:1"), toml);
    }

    #[tokio::test]
    async fn test_init_requires_binary() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServiceConfig::new(dir.path());
        let logs = LogBuffer::new(10);
        let client = reqwest::Client::new();
        let err = init_node(&config, &client, &logs, "val-1").await.unwrap_err();
        assert_eq!(err.kind(), tickfy_types::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_init_rejects_empty_moniker() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServiceConfig::new(dir.path());
        let logs = LogBuffer::new(10);
        let client = reqwest::Client::new();
        let err = init_node(&config, &client, &logs, "  ").await.unwrap_err();
        assert_eq!(err.kind(), tickfy_types::ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_init_is_noop_with_genesis() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServiceConfig::new(dir.path());
        std::fs::create_dir_all(config.genesis_path().parent().unwrap()).unwrap();
        std::fs::write(config.genesis_path(), "{}").unwrap();
        let logs = LogBuffer::new(10);
        let client = reqwest::Client::new();
        assert!(!init_node(&config, &client, &logs, "").await.unwrap());
        assert!(!config.node_config_path().exists());
    }
}
