//! mint-bot
//!
//! Mints NFTs from a public sale contract on EVM chains.
//!
//! ```text
//!   mint-bot.toml + env ──▶ config ──▶ MintBot ──▶ RpcChainClient ──▶ JSON-RPC endpoint(s)
//!                                       │   ▲
//!                wallets/*.json ──▶ keystore (Signer)
//!                                       │
//!                                       ▼
//!                      tracing · Prometheus metrics · logs/transactions_YYYYMMDD.json
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use mint_bot::blockchain::{ChainClient, GasOracle, RpcChainClient};
use mint_bot::config::networks::{self, resolve_endpoints};
use mint_bot::config::validation::validate_config;
use mint_bot::config::{load_config_unchecked, ConfigError, MintBotConfig, RunMode};
use mint_bot::keystore::{load_or_generate_key, FileStore, KeyCipher, KeyStore};
use mint_bot::lifecycle::{signals, Shutdown};
use mint_bot::minting::{quote_gas, GasCaps, MintBot, RunStatus};
use mint_bot::observability::{logging, metrics, Journal};

#[derive(Parser)]
#[command(name = "mint-bot")]
#[command(version, about = "NFT mint bot for EVM chains", long_about = None)]
struct Cli {
    /// Configuration file; missing means defaults plus environment.
    #[arg(short, long, default_value = "mint-bot.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mint until the target count succeeds
    Run {
        #[arg(short, long)]
        network: Option<String>,
        #[arg(short, long)]
        wallet: Option<String>,
        /// monitor or immediate
        #[arg(short, long)]
        mode: Option<RunMode>,
        /// Number of successful mints to stop at
        #[arg(short, long)]
        count: Option<u32>,
    },
    /// Manage encrypted wallets
    Wallet {
        #[command(subcommand)]
        action: WalletCommand,
    },
    /// Print a fresh encryption key
    Keygen,
    /// Watch gas prices
    Gas {
        #[arg(short, long)]
        network: Option<String>,
        /// Seconds between updates
        #[arg(short, long, default_value_t = 30)]
        interval: u64,
    },
}

#[derive(Subcommand)]
enum WalletCommand {
    /// Import the private key in $PRIVATE_KEY
    Add {
        name: String,
        /// Refuse the import unless the key derives this address
        #[arg(long)]
        address: Option<String>,
    },
    List,
    Show { name: String },
    Remove { name: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = load_config_unchecked(&cli.config)?;
    logging::init(&config.observability.log_level);

    match cli.command {
        Commands::Run {
            network,
            wallet,
            mode,
            count,
        } => {
            if let Some(network) = network {
                config.bot.network = network;
            }
            if wallet.is_some() {
                config.bot.wallet = wallet;
            }
            if let Some(mode) = mode {
                config.bot.mode = mode;
            }
            if let Some(count) = count {
                config.bot.target_count = count;
            }
            validate_config(&config).map_err(ConfigError::Validation)?;
            run(config).await?;
        }
        Commands::Wallet { action } => wallet_command(&config, action)?,
        Commands::Keygen => println!("{}", KeyCipher::generate()?.to_base64()),
        Commands::Gas { network, interval } => {
            let network = network.unwrap_or_else(|| config.bot.network.clone());
            watch_gas(&config, &network, Duration::from_secs(interval.max(1))).await?;
        }
    }

    Ok(())
}

async fn run(config: MintBotConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        network = %config.bot.network,
        mode = ?config.bot.mode,
        target = config.bot.target_count,
        max_gas_price_gwei = config.gas.max_gas_price_gwei,
        max_priority_fee_gwei = config.gas.max_priority_fee_gwei,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let client = connect(&config, &config.bot.network).await?;
    let key_store = open_key_store(&config)?;

    let shutdown = Shutdown::new();
    let mut bot = MintBot::new(&config, key_store, client, shutdown.subscribe())?
        .with_journal(Journal::new(&config.observability.journal_dir));
    signals::spawn_ctrl_c_handler(shutdown.clone());

    let report = bot
        .run(config.bot.mode, u64::from(config.bot.target_count))
        .await;

    tracing::info!(
        run_id = %report.run_id,
        attempts = report.attempts,
        successes = report.successes,
        target = report.target,
        status = ?report.status,
        "Run finished"
    );

    match report.status {
        RunStatus::TargetReached | RunStatus::Interrupted => Ok(()),
        RunStatus::RetryLimitReached => Err(format!(
            "retry limit reached after {} attempts ({} of {} minted)",
            report.attempts, report.successes, report.target
        )
        .into()),
    }
}

async fn connect(config: &MintBotConfig, network: &str) -> Result<Arc<dyn ChainClient>, Box<dyn std::error::Error>> {
    let endpoints = resolve_endpoints(config, network, |var| std::env::var(var).ok()).ok_or_else(|| {
        format!(
            "no RPC URL for network '{}': set [networks.{}] rpc_url or {}",
            network,
            network,
            networks::rpc_env_var(network)
        )
    })?;
    let expected_chain_id = networks::lookup(network).map(|n| n.chain_id);

    let client = RpcChainClient::connect(
        &endpoints.rpc_url,
        &endpoints.failover_urls,
        config.rpc.timeout_secs,
        expected_chain_id,
    )
    .await?;
    Ok(Arc::new(client))
}

fn open_key_store(config: &MintBotConfig) -> Result<KeyStore<FileStore>, Box<dyn std::error::Error>> {
    let (cipher, source) = load_or_generate_key(
        std::env::var(&config.keystore.key_env_var).ok(),
        Path::new(&config.keystore.key_file),
    )?;
    tracing::debug!(source = ?source, "Encryption key loaded");
    let store = FileStore::open(&config.keystore.wallets_dir)?;
    Ok(KeyStore::new(cipher, store))
}

fn wallet_command(config: &MintBotConfig, action: WalletCommand) -> Result<(), Box<dyn std::error::Error>> {
    let key_store = open_key_store(config)?;

    match action {
        WalletCommand::Add { name, address } => {
            let private_key = std::env::var("PRIVATE_KEY").map_err(|_| "PRIVATE_KEY is not set")?;
            let record = key_store.import_wallet(&name, &private_key, address.as_deref())?;
            println!("Added wallet '{}' ({})", record.name, record.address);
        }
        WalletCommand::List => {
            let wallets = key_store.list_wallets()?;
            if wallets.is_empty() {
                println!("No wallets found");
            }
            for w in wallets {
                println!(
                    "{:<16} {}  mints: {}/{}  success rate: {:.1}%  gas spent: {:.6}",
                    w.name, w.address, w.successful_mints, w.total_mints, w.success_rate, w.total_gas_spent
                );
            }
        }
        WalletCommand::Show { name } => {
            let mut record = key_store.get_wallet(&name)?;
            record.private_key_encrypted = "<encrypted>".into();
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        WalletCommand::Remove { name } => {
            key_store.remove_wallet(&name)?;
            println!("Removed wallet '{}'", name);
        }
    }

    Ok(())
}

async fn watch_gas(config: &MintBotConfig, network: &str, interval: Duration) -> Result<(), Box<dyn std::error::Error>> {
    let client = connect(config, network).await?;
    let caps = GasCaps::from(&config.gas);
    let oracle = match std::env::var("ETHERSCAN_API_KEY") {
        Ok(key) if !key.trim().is_empty() => Some(GasOracle::new(key)?),
        _ => None,
    };

    let shutdown = Shutdown::new();
    let mut signal = shutdown.subscribe();
    signals::spawn_ctrl_c_handler(shutdown.clone());

    loop {
        match client.base_fee().await {
            Ok(Some(base_fee)) => tracing::info!(base_fee_gwei = gwei(base_fee), "Base fee"),
            Ok(None) => tracing::info!("No base fee (legacy chain)"),
            Err(e) => tracing::warn!(error = %e, "Failed to fetch base fee"),
        }
        match client.gas_price().await {
            Ok(price) => tracing::info!(gas_price_gwei = gwei(price), "Gas price"),
            Err(e) => tracing::warn!(error = %e, "Failed to fetch gas price"),
        }
        match quote_gas(client.as_ref(), &caps).await {
            Ok(bid) => tracing::info!(max_price_gwei = gwei(bid.max_price_per_gas()), bid = ?bid, "Capped bid"),
            Err(e) => tracing::warn!(error = %e, "Failed to quote gas"),
        }

        if let Some(oracle) = &oracle {
            let chain_id = match networks::lookup(network) {
                Some(known) => Ok(known.chain_id),
                None => client.chain_id().await,
            };
            match chain_id {
                Ok(chain_id) => match oracle.fetch(chain_id).await {
                    Ok(quote) => tracing::info!(
                        low = %quote.safe,
                        medium = %quote.propose,
                        high = %quote.fast,
                        base_fee = quote.suggested_base_fee.as_deref().unwrap_or("n/a"),
                        "Gas oracle (gwei)"
                    ),
                    Err(e) => tracing::warn!(error = %e, "Gas oracle unavailable"),
                },
                Err(e) => tracing::warn!(error = %e, "Failed to fetch chain id"),
            }
        }

        if !signal.sleep(interval).await {
            return Ok(());
        }
    }
}

fn gwei(wei: u128) -> f64 {
    wei as f64 / 1e9
}
