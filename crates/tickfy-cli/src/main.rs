use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tickfy_node::ServiceConfig;

mod commands;

/// Tickfy validator setup command-line interface.
#[derive(Parser)]
#[command(name = "tickfy-validator")]
#[command(about = "Set up and run a Tickfy validator node on this machine")]
#[command(version)]
struct Cli {
    /// Data directory (default: ~/.tickfy-validator).
    #[arg(long, env = "TICKFY_HOME")]
    data_dir: Option<PathBuf>,

    /// Node RPC URL.
    #[arg(long)]
    rpc: Option<String>,

    /// Node REST API URL.
    #[arg(long)]
    api: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage wallets.
    #[command(subcommand)]
    Wallet(WalletCommand),

    /// Show the balance of an address (default: the active wallet).
    Balance {
        /// Account address.
        address: Option<String>,
    },

    /// Show setup and node status.
    Status {
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Install, initialise and run the node.
    #[command(subcommand)]
    Node(NodeCommand),

    /// Manage the upgrade supervisor (cosmovisor).
    #[command(subcommand)]
    Upgrade(UpgradeCommand),

    /// Validator operations.
    #[command(subcommand)]
    Validator(ValidatorCommand),
}

#[derive(Subcommand)]
enum WalletCommand {
    /// Create a new wallet and make it active.
    Create {
        /// Display name.
        #[arg(long, default_value = "")]
        name: String,
    },

    /// Import a wallet from a 24-word mnemonic and make it active.
    Import {
        /// Display name.
        #[arg(long, default_value = "")]
        name: String,
    },

    /// List wallets.
    List,

    /// Make a wallet the active one.
    Use {
        /// Wallet id.
        id: String,
    },

    /// Delete a wallet.
    Delete {
        /// Wallet id.
        id: String,
    },

    /// Show the active wallet.
    Info,

    /// Show a wallet's mnemonic.
    Seed {
        /// Wallet id (default: the active wallet).
        id: Option<String>,
    },
}

#[derive(Subcommand)]
enum NodeCommand {
    /// Download the node binary.
    Install,

    /// Initialise the node home.
    Init {
        /// Node moniker.
        #[arg(long)]
        moniker: String,
    },

    /// Start the node and follow its output until Ctrl-C.
    Run {
        /// Seconds between status lines (0 disables them).
        #[arg(long, default_value = "30")]
        status_interval: u64,
    },
}

#[derive(Subcommand)]
enum UpgradeCommand {
    /// Download the upgrade supervisor.
    Install,

    /// Create its directory tree and switch the node to wrapped mode.
    Setup,
}

#[derive(Subcommand)]
enum ValidatorCommand {
    /// Register this node as a validator using the active wallet.
    Create {
        /// Validator moniker.
        #[arg(long)]
        moniker: String,

        /// Commission rate (0 to 0.20).
        #[arg(long, default_value = "0.10")]
        commission: String,

        /// Self-delegation amount.
        #[arg(long)]
        stake: String,
    },

    /// Show the local validator record.
    Status,

    /// Show staking totals.
    Staking,

    /// Withdraw all rewards.
    Withdraw,
}

/// Application context shared across commands.
struct AppContext {
    config: ServiceConfig,
}

impl AppContext {
    fn from_cli(cli: &Cli) -> Result<Self, Box<dyn std::error::Error>> {
        let mut config = match &cli.data_dir {
            Some(dir) => ServiceConfig::new(dir),
            None => ServiceConfig::from_home()?,
        };
        if let Some(url) = &cli.rpc {
            config.rpc_url = url.clone();
        }
        if let Some(url) = &cli.api {
            config.api_url = url.clone();
        }
        log::debug!("data directory: {}", config.data_dir.display());
        Ok(Self { config })
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let ctx = match AppContext::from_cli(&cli) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Wallet(cmd) => match cmd {
            WalletCommand::Create { name } => commands::create_wallet(&ctx, &name),
            WalletCommand::Import { name } => commands::import_wallet(&ctx, &name),
            WalletCommand::List => commands::list_wallets(&ctx),
            WalletCommand::Use { id } => commands::use_wallet(&ctx, &id),
            WalletCommand::Delete { id } => commands::delete_wallet(&ctx, &id),
            WalletCommand::Info => commands::wallet_info(&ctx),
            WalletCommand::Seed { id } => commands::show_seed(&ctx, id.as_deref()),
        },
        Commands::Balance { address } => commands::show_balance(&ctx, address.as_deref()).await,
        Commands::Status { json } => commands::show_status(&ctx, json).await,
        Commands::Node(cmd) => match cmd {
            NodeCommand::Install => commands::install_node(&ctx).await,
            NodeCommand::Init { moniker } => commands::init_node(&ctx, &moniker).await,
            NodeCommand::Run { status_interval } => {
                commands::run_node(&ctx, status_interval).await
            }
        },
        Commands::Upgrade(cmd) => match cmd {
            UpgradeCommand::Install => commands::install_upgrade_supervisor(&ctx).await,
            UpgradeCommand::Setup => commands::setup_upgrade_supervisor(&ctx).await,
        },
        Commands::Validator(cmd) => match cmd {
            ValidatorCommand::Create {
                moniker,
                commission,
                stake,
            } => commands::create_validator(&ctx, moniker, commission, stake).await,
            ValidatorCommand::Status => commands::validator_status(&ctx),
            ValidatorCommand::Staking => commands::staking_info(&ctx),
            ValidatorCommand::Withdraw => commands::withdraw_rewards(&ctx).await,
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
