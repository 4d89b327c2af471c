//! Distro CLI
//!
//! Command-line interface for the distro emission module.

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use distro_core::{Address, DistributionBatch, DistributionDate};
use distro_crypto::InstructionSigner;
use distro_economics::EmissionSchedule;
use distro_node::{load_genesis_file, rejection, write_genesis_file, DistroNode, NodeConfig};
use distro_storage::PageRequest;

#[derive(Parser)]
#[command(name = "distro")]
#[command(version)]
#[command(about = "Distro - signed, rate-limited token distribution", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "distro.toml", env = "DISTRO_CONFIG")]
    config: PathBuf,

    /// Data directory, overrides the config
    #[arg(short, long, global = true, env = "DISTRO_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new instruction signing key
    Keygen {
        /// Output directory for the key files
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Sign one distribution instruction
    Sign {
        /// Instruction date (YYYY-MM-DD)
        #[arg(long)]
        date: String,

        /// Amount in base units
        #[arg(long)]
        amount: u64,

        /// Recipient address
        #[arg(long)]
        recipient: String,

        /// Instruction nonce
        #[arg(long)]
        nonce: String,

        /// File holding the hex-encoded signing key
        #[arg(long, conflicts_with = "secret")]
        key_file: Option<PathBuf>,

        /// Hex-encoded signing key
        #[arg(long, env = "DISTRO_SIGNER_SECRET", hide_env_values = true)]
        secret: Option<String>,

        /// Print the instruction as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the emission limit of a date
    Limit {
        /// Date (YYYY-MM-DD)
        date: String,
    },

    /// Apply a distribution batch
    Distribute {
        /// Batch JSON file
        #[arg(short, long)]
        batch: PathBuf,

        /// Block time (RFC 3339), defaults to now
        #[arg(long, value_parser = parse_block_time)]
        block_time: Option<DateTime<Utc>>,
    },

    /// Query module state
    Query {
        #[command(subcommand)]
        query: QueryCommands,
    },

    /// Genesis import and export
    Genesis {
        #[command(subcommand)]
        genesis: GenesisCommands,
    },

    /// Show node information
    Info,
}

#[derive(Subcommand)]
enum QueryCommands {
    /// Total released on one date
    DailyTotal {
        /// Date (YYYY-MM-DD)
        date: String,
    },
    /// Page through recorded daily totals
    DailyTotals {
        #[arg(long, default_value_t = 0)]
        limit: u64,
        #[arg(long, default_value_t = 0)]
        offset: u64,
        /// Resume from a date returned as next key
        #[arg(long, conflicts_with = "offset")]
        key: Option<String>,
        #[arg(long)]
        count_total: bool,
        #[arg(long)]
        reverse: bool,
    },
    /// Balance of an address
    Balance {
        address: String,
    },
    /// Circulating supply
    Supply,
}

#[derive(Subcommand)]
enum GenesisCommands {
    /// Write the current genesis state
    Export {
        #[arg(short, long, default_value = "genesis.json")]
        output: PathBuf,
    },
    /// Load a genesis state or a daily total seed list
    Import {
        file: PathBuf,
    },
}

fn expand_path(path: &Path) -> PathBuf {
    if let Some(rest) = path.to_str().and_then(|s| s.strip_prefix("~/")) {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

fn parse_block_time(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("invalid block time '{}': {}", s, e))
}

fn load_config(cli: &Cli) -> anyhow::Result<NodeConfig> {
    let path = expand_path(&cli.config);
    let mut config = if path.exists() {
        NodeConfig::load(&path)?
    } else {
        NodeConfig::default()
    };
    if let Some(data_dir) = &cli.data_dir {
        config.node.data_dir = expand_path(data_dir).to_string_lossy().into_owned();
    }
    Ok(config)
}

fn load_signer(key_file: Option<&Path>, secret: Option<&str>) -> anyhow::Result<InstructionSigner> {
    let secret = match (key_file, secret) {
        (Some(path), _) => {
            let path = expand_path(path);
            std::fs::read_to_string(&path).with_context(|| format!("failed to read key {}", path.display()))?
        }
        (None, Some(secret)) => secret.to_string(),
        (None, None) => anyhow::bail!("a signing key is required (--key-file or --secret)"),
    };
    Ok(InstructionSigner::from_secret_hex(secret.trim())?)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli)?;
    distro_node::logging::init(&config.logging, cli.verbose)?;

    match cli.command {
        Commands::Keygen { output } => {
            let signer = InstructionSigner::generate();

            if let Some(output) = output {
                let output_dir = expand_path(&output);
                std::fs::create_dir_all(&output_dir)?;
                let key_path = output_dir.join("signer.key");
                let pub_path = output_dir.join("signer.pub");
                std::fs::write(&key_path, signer.secret_hex())?;
                std::fs::write(&pub_path, signer.public_key_hex())?;
                println!("Secret key: {}", key_path.display());
                println!("Public key file: {}", pub_path.display());
            } else {
                println!("Secret key: {}", signer.secret_hex());
            }
            println!("Public key: {}", signer.public_key_hex());
            println!("Address: {}", signer.address());
        }

        Commands::Sign {
            date,
            amount,
            recipient,
            nonce,
            key_file,
            secret,
            json,
        } => {
            let signer = load_signer(key_file.as_deref(), secret.as_deref())?;
            let instruction = signer.instruction(&date, amount, &recipient, nonce);
            if json {
                println!("{}", serde_json::to_string_pretty(&instruction)?);
            } else {
                println!("{}", instruction.signature);
            }
        }

        Commands::Limit { date } => {
            let date = DistributionDate::parse(&date)?;
            let params = config.validate()?;
            let schedule = EmissionSchedule::from_params(&params);

            println!("Date: {}", date);
            match schedule.period_for(&date) {
                Some(period) => println!("Halving period: {} ({} to {})", period.index, period.start, period.end),
                None => println!("Halving period: none"),
            }
            println!("Daily limit: {}{}", schedule.daily_limit(&date), params.denom);
        }

        Commands::Distribute { batch, block_time } => {
            let path = expand_path(&batch);
            let content = std::fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;
            let batch: DistributionBatch = serde_json::from_str(&content)?;
            let block_time = block_time.unwrap_or_else(Utc::now);

            let mut node = DistroNode::open(config)?;
            match node.distribute(&batch, block_time) {
                Ok(receipt) => {
                    println!("Accepted at height {}", receipt.height);
                    println!("Amount: {}{}", receipt.amount, node.params().denom);
                    println!("Minted: {}{}", receipt.minted, node.params().denom);
                    for (address, amount) in &receipt.transfers {
                        println!("  {} <- {}", address, amount);
                    }
                    for (date, total) in &receipt.daily_totals {
                        println!("  {} total {}", date, total);
                    }
                }
                Err(e) => {
                    if let Some(reason) = rejection(&e) {
                        anyhow::bail!("batch rejected [{} {}]: {}", reason.kind(), reason.code(), reason);
                    }
                    return Err(e);
                }
            }
        }

        Commands::Query { query } => {
            let node = DistroNode::open(config)?;
            let denom = node.params().denom.clone();
            match query {
                QueryCommands::DailyTotal { date } => {
                    let total = node.daily_total(&date)?.unwrap_or(0);
                    println!("{}: {}{}", date, total, denom);
                }
                QueryCommands::DailyTotals {
                    limit,
                    offset,
                    key,
                    count_total,
                    reverse,
                } => {
                    let mut request = match key {
                        Some(key) => PageRequest::with_key(key.into_bytes(), limit),
                        None => PageRequest::with_offset(offset, limit),
                    };
                    if count_total {
                        request = request.count_total();
                    }
                    if reverse {
                        request = request.reversed();
                    }

                    let page = node.daily_totals(&request)?;
                    for entry in &page.entries {
                        println!("{}: {}", entry.date, entry.formatted(&denom));
                    }
                    if let Some(next) = page.next_key {
                        println!("Next key: {}", String::from_utf8_lossy(&next));
                    }
                    if let Some(total) = page.total {
                        println!("Total: {}", total);
                    }
                }
                QueryCommands::Balance { address } => {
                    let address = Address::parse(&address)?;
                    println!("{}: {}{}", address, node.balance(&address), denom);
                }
                QueryCommands::Supply => {
                    println!("Supply: {}{}", node.total_supply(), denom);
                }
            }
        }

        Commands::Genesis { genesis } => match genesis {
            GenesisCommands::Export { output } => {
                let node = DistroNode::open(config)?;
                let path = expand_path(&output);
                write_genesis_file(&path, &node.export_genesis()?)?;
                println!("Genesis written to {}", path.display());
            }
            GenesisCommands::Import { file } => {
                let mut node = DistroNode::open(config)?;
                let genesis = load_genesis_file(&expand_path(&file), node.params())?;
                node.init_genesis(&genesis)?;
                println!(
                    "Imported {} daily totals, denom {}",
                    genesis.daily_distribution_totals.len(),
                    genesis.params.denom
                );
            }
        },

        Commands::Info => {
            let node = DistroNode::open(config)?;
            let params = node.params();
            println!("Node: {}", node.config().node.name);
            println!("Data directory: {}", node.config().data_dir().display());
            println!("Height: {}", node.height());
            println!("Denom: {}", params.denom);
            println!("Max supply: {}", params.max_supply);
            println!("Supply: {}", node.total_supply());
            println!("Start date: {}", params.distribution_start_date);
            println!("Months per halving: {}", params.months_in_halving_period);
            println!("Authorized accounts: {}", params.authorized_accounts.len());
            if params.distribution_signer_public_key.is_empty() {
                println!("Signer key: not configured");
            } else {
                println!("Signer key: {}", params.distribution_signer_public_key);
            }
        }
    }

    Ok(())
}
