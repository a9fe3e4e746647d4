//! CLI command implementations.

use crate::AppContext;
use std::io::Write;
use std::time::Duration;
use tickfy_node::{NodeService, ValidatorParams};
use tickfy_types::constants::MIN_PASSWORD_LEN;
use tickfy_vault::Vault;

type Result = std::result::Result<(), Box<dyn std::error::Error>>;

// ─── Helpers ────────────────────────────────────────────────────────────────

fn prompt_password(prompt: &str) -> std::result::Result<String, Box<dyn std::error::Error>> {
    let pass = rpassword::prompt_password(prompt)?;
    if pass.is_empty() {
        return Err("password cannot be empty".into());
    }
    Ok(pass)
}

fn prompt_new_password() -> std::result::Result<String, Box<dyn std::error::Error>> {
    let pass = prompt_password(&format!(
        "Wallet password (at least {} characters): ",
        MIN_PASSWORD_LEN
    ))?;
    let confirm = prompt_password("Confirm password: ")?;
    if pass != confirm {
        return Err("passwords do not match".into());
    }
    Ok(pass)
}

fn open_vault(ctx: &AppContext) -> std::result::Result<Vault, Box<dyn std::error::Error>> {
    Ok(Vault::open(&ctx.config.data_dir)?)
}

fn open_service(ctx: &AppContext) -> std::result::Result<NodeService, Box<dyn std::error::Error>> {
    Ok(NodeService::new(ctx.config.clone())?)
}

/// Progress callback drawing a single updating line on stderr.
fn progress_line(label: &'static str) -> impl FnMut(u8) {
    move |pct| {
        eprint!("\r{} {:>3}%", label, pct);
        let _ = std::io::stderr().flush();
        if pct == 100 {
            eprintln!();
        }
    }
}

fn yes_no(b: bool) -> &'static str {
    if b {
        "yes"
    } else {
        "no"
    }
}

// ─── Wallets ────────────────────────────────────────────────────────────────

pub fn create_wallet(ctx: &AppContext, name: &str) -> Result {
    let vault = open_vault(ctx)?;
    let password = prompt_new_password()?;
    let created = vault.create_wallet(name, &password)?;

    println!("Wallet created: {}", created.id);
    println!("Address: {}", created.address);
    println!();
    println!("IMPORTANT: Write down your seed phrase and keep it safe!");
    println!("It is shown only once. If you lose it, you lose access to your funds.");
    println!();
    println!("Seed phrase (24 words):");
    println!("  {}", created.mnemonic.as_str());
    Ok(())
}

pub fn import_wallet(ctx: &AppContext, name: &str) -> Result {
    let vault = open_vault(ctx)?;

    println!("Enter your 24-word mnemonic seed phrase:");
    let mut mnemonic = String::new();
    std::io::stdin().read_line(&mut mnemonic)?;

    let password = prompt_new_password()?;
    let (id, address) = vault.import_wallet(name, mnemonic.trim(), &password)?;

    println!("Wallet imported: {}", id);
    println!("Address: {}", address);
    Ok(())
}

pub fn list_wallets(ctx: &AppContext) -> Result {
    let vault = open_vault(ctx)?;
    let list = vault.list_wallets()?;
    if list.wallets.is_empty() {
        println!("No wallets. Use 'wallet create' or 'wallet import'.");
        return Ok(());
    }

    // A stale pointer reads as the first wallet.
    let active = vault.active_wallet_info().ok().map(|w| w.id);
    for w in &list.wallets {
        let marker = if active.as_deref() == Some(w.id.as_str()) {
            "*"
        } else {
            " "
        };
        println!("{} {}  {:<20} {}", marker, w.id, w.name, w.address);
    }
    Ok(())
}

pub fn use_wallet(ctx: &AppContext, id: &str) -> Result {
    let vault = open_vault(ctx)?;
    vault.set_active_wallet(id)?;
    let info = vault.active_wallet_info()?;
    println!("Active wallet: {} ({})", info.name, info.address);
    Ok(())
}

pub fn delete_wallet(ctx: &AppContext, id: &str) -> Result {
    let svc = open_service(ctx)?;
    svc.delete_wallet(id)?;
    println!("Wallet {} deleted.", id);
    Ok(())
}

pub fn wallet_info(ctx: &AppContext) -> Result {
    let vault = open_vault(ctx)?;
    let info = vault.active_wallet_info()?;
    println!("Wallet:  {}", info.name);
    println!("Id:      {}", info.id);
    println!("Address: {}", info.address);
    Ok(())
}

pub fn show_seed(ctx: &AppContext, id: Option<&str>) -> Result {
    let vault = open_vault(ctx)?;
    let id = match id {
        Some(id) => id.to_string(),
        None => vault.active_wallet_info()?.id,
    };
    let password = prompt_password("Wallet password: ")?;
    let mnemonic = vault.reveal_mnemonic(&id, &password)?;
    println!("Seed phrase:");
    println!("  {}", mnemonic.as_str());
    Ok(())
}

pub async fn show_balance(ctx: &AppContext, address: Option<&str>) -> Result {
    let svc = open_service(ctx)?;
    let balance = svc.balance(address).await?;
    println!("{}", balance.display);
    Ok(())
}

// ─── Status ─────────────────────────────────────────────────────────────────

pub async fn show_status(ctx: &AppContext, json: bool) -> Result {
    let svc = open_service(ctx)?;
    let status = svc.status().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("Wallet:            {}", status.wallet_address.as_deref().unwrap_or("none"));
    println!("Node installed:    {}", yes_no(status.is_node_installed));
    println!("Node initialized:  {}", yes_no(status.is_node_initialized));
    if let Some(moniker) = &status.moniker {
        println!("Moniker:           {}", moniker);
    }
    println!("Cosmovisor:        {}", yes_no(status.is_upgrade_supervisor_installed));
    println!(
        "Upgrade mode:      {}",
        if svc.is_upgrade_supervision_enabled() {
            "cosmovisor"
        } else {
            "direct"
        }
    );
    println!("Validator:         {}", yes_no(status.is_validator));
    Ok(())
}

// ─── Node ───────────────────────────────────────────────────────────────────

pub async fn install_node(ctx: &AppContext) -> Result {
    let svc = open_service(ctx)?;
    let mut progress = progress_line("Downloading node binary");
    if svc.install_node(&mut progress).await? {
        println!("Node installed: {}", svc.config().daemon_path().display());
    } else {
        println!("Node already installed.");
    }
    Ok(())
}

pub async fn init_node(ctx: &AppContext, moniker: &str) -> Result {
    let svc = open_service(ctx)?;
    if svc.init_node(moniker).await? {
        for line in svc.logs(0) {
            println!("{}", line);
        }
        println!("Node initialized at {}", svc.config().node_home().display());
    } else {
        println!("Node already initialized.");
    }
    Ok(())
}

pub async fn run_node(ctx: &AppContext, status_interval: u64) -> Result {
    let svc = open_service(ctx)?;
    let mode = svc.start_node()?;
    println!("Node started ({}). Press Ctrl-C to stop.", mode.as_str());

    let logs = svc.log_buffer().clone();
    let mut cursor = 0;
    let mut ticker = tokio::time::interval(Duration::from_millis(250));
    let mut status_every = tokio::time::interval(Duration::from_secs(status_interval.max(1)));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = ticker.tick() => {
                let (lines, next) = logs.since(cursor);
                cursor = next;
                for line in lines {
                    println!("{}", line);
                }
                if !svc.is_node_running() {
                    let supervisor = svc.supervisor();
                    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
                    while !supervisor.is_settled() && tokio::time::Instant::now() < deadline {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                    }
                    for line in logs.since(cursor).0 {
                        println!("{}", line);
                    }
                    eprintln!("Node exited.");
                    return Ok(());
                }
            }
            _ = status_every.tick(), if status_interval > 0 => {
                let status = svc.status().await;
                eprintln!("-- height {} | peers {}", status.current_block, status.peers);
            }
        }
    }

    svc.stop_node()?;
    for line in logs.since(cursor).0 {
        println!("{}", line);
    }
    println!("Node stopped.");
    Ok(())
}

// ─── Upgrade supervisor ─────────────────────────────────────────────────────

pub async fn install_upgrade_supervisor(ctx: &AppContext) -> Result {
    let svc = open_service(ctx)?;
    let mut progress = progress_line("Downloading cosmovisor");
    if svc.install_upgrade_supervisor(&mut progress).await? {
        println!(
            "Cosmovisor installed: {}",
            svc.config().upgrade_supervisor_path().display()
        );
    } else {
        println!("Cosmovisor already installed.");
    }
    Ok(())
}

pub async fn setup_upgrade_supervisor(ctx: &AppContext) -> Result {
    let svc = open_service(ctx)?;
    svc.setup_upgrade_supervisor().await?;
    for line in svc.logs(0) {
        println!("{}", line);
    }
    println!("The node will now start under cosmovisor.");
    Ok(())
}

// ─── Validator ──────────────────────────────────────────────────────────────

pub async fn create_validator(
    ctx: &AppContext,
    moniker: String,
    commission: String,
    stake: String,
) -> Result {
    let svc = open_service(ctx)?;
    let wallet = svc.vault().active_wallet_info()?;
    println!("Using wallet {} ({})", wallet.name, wallet.address);

    let password = prompt_password("Wallet password: ")?;
    let params = ValidatorParams {
        moniker,
        commission,
        stake,
    };
    let record = svc.create_validator(&params, &password).await?;

    println!("Validator created:");
    println!("  Moniker:    {}", record.moniker);
    println!("  Commission: {}", record.commission);
    println!("  Stake:      {}", record.stake);
    Ok(())
}

pub fn validator_status(ctx: &AppContext) -> Result {
    let svc = open_service(ctx)?;
    let record = svc.validator_status()?;
    println!("Moniker:    {}", record.moniker);
    println!("Commission: {}", record.commission);
    println!("Stake:      {}", record.stake);
    println!("Created at: {}", record.created_at);
    Ok(())
}

pub fn staking_info(ctx: &AppContext) -> Result {
    let svc = open_service(ctx)?;
    let info = svc.staking_info()?;
    println!("Total staked:    {}", info.total_staked);
    println!("Self delegation: {}", info.self_delegation);
    println!("Delegations:     {}", info.delegations);
    Ok(())
}

pub async fn withdraw_rewards(ctx: &AppContext) -> Result {
    let svc = open_service(ctx)?;
    let password = prompt_password("Wallet password: ")?;
    svc.withdraw_rewards(&password).await?;
    println!("Rewards withdrawn.");
    Ok(())
}
