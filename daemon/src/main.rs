//! vreg: operate a verifier registry persisted in LMDB.
//!
//! Every invocation opens the environment in `data_dir`, attaches the
//! registry logic configured as storage owner, runs one operation and prints
//! the emitted events followed by the result as JSON lines on stdout.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use vreg_directory::ContractDirectory;
use vreg_registry::{RegistryBuilder, RegistryEvent, RegistryLogic};
use vreg_store_lmdb::{LmdbEnvironment, LmdbRegistryStore};
use vreg_types::{Address, ShardId, StakeAmount};
use vreg_utils::LogFormat;

use crate::config::DaemonConfig;

#[derive(Parser)]
#[command(name = "vreg", about = "Verifier registry operator")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base;
    /// flags and env vars override them.
    #[arg(long, env = "VREG_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the LMDB environment.
    #[arg(long, env = "VREG_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Identity of the registry logic that owns the store.
    #[arg(long, env = "VREG_REGISTRY_ADDRESS")]
    registry_address: Option<Address>,

    /// Registry administrator.
    #[arg(long, env = "VREG_ADMIN")]
    admin: Option<Address>,

    /// Shard size for a fresh store (`init` only).
    #[arg(long, env = "VREG_VERIFIERS_PER_SHARD")]
    verifiers_per_shard: Option<u64>,

    /// Log format: "human" or "json".
    #[arg(long, env = "VREG_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Log level filter, e.g. "info" or "warn,vreg_registry=debug".
    #[arg(long, env = "VREG_LOG_LEVEL")]
    log_level: Option<String>,

    /// Identity the operation is performed as.
    #[arg(long, global = true, env = "VREG_CALLER")]
    caller: Option<Address>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the store and claim it for the configured registry address.
    Init,
    /// Register the caller as a verifier.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        location: String,
    },
    /// Change the caller's name and location.
    Update {
        #[arg(long)]
        name: String,
        #[arg(long)]
        location: String,
    },
    /// Set the caller's own active flag.
    SetActive {
        #[arg(long)]
        active: bool,
    },
    /// Set a verifier's enabled flag (administrator).
    SetEnabled {
        #[arg(long)]
        verifier: Address,
        #[arg(long)]
        enable: bool,
    },
    /// Change the shard size for future registrations (administrator).
    SetVerifiersPerShard { n: u64 },
    /// Point the registry at a stake token (administrator).
    SetToken { token: Address },
    /// Print one verifier record.
    Show { verifier: Address },
    /// Print every verifier in registration order.
    List,
    /// Print the aggregate visible stake of a shard.
    Shard { shard: ShardId },
}

#[derive(Serialize)]
struct ShardSummary {
    shard: ShardId,
    balance: StakeAmount,
}

#[derive(Serialize)]
struct StoreSummary {
    registry: Address,
    admin: Address,
    verifiers_per_shard: u64,
    token_address: Address,
    verifiers: u64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => DaemonConfig::from_toml_file(path)?,
        None => DaemonConfig::default(),
    };
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(address) = cli.registry_address {
        config.registry_address = address;
    }
    if let Some(admin) = cli.admin {
        config.admin = admin;
    }
    if let Some(n) = cli.verifiers_per_shard {
        config.params.verifiers_per_shard = n;
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    vreg_utils::init_logging(config.log_format, &config.log_level)?;

    let env = LmdbEnvironment::open(&config.data_dir, config.map_size, &config.params)
        .with_context(|| format!("opening store in {}", config.data_dir.display()))?;
    let store = Arc::new(env.registry_store());

    let caller = cli.caller;
    let require_caller = || caller.context("this command needs --caller");

    match cli.command {
        Command::Init => {
            let registry = builder(&config).deploy(Arc::clone(&store))?;
            info!(data_dir = %config.data_dir.display(), "store initialised");
            print_json(&summary(&registry)?)?;
        }
        Command::Create { name, location } => {
            let registry = attach(&config, &store)?;
            print_json(&registry.create(&require_caller()?, &name, &location)?)?;
        }
        Command::Update { name, location } => {
            let registry = attach(&config, &store)?;
            print_json(&registry.update(&require_caller()?, &name, &location)?)?;
        }
        Command::SetActive { active } => {
            let caller = require_caller()?;
            let registry = attach(&config, &store)?;
            print_json(&registry.update_active_status(&caller, &caller, active)?)?;
        }
        Command::SetEnabled { verifier, enable } => {
            let registry = attach(&config, &store)?;
            print_json(&registry.update_enable_status(&require_caller()?, &verifier, enable)?)?;
        }
        Command::SetVerifiersPerShard { n } => {
            let registry = attach(&config, &store)?;
            registry.update_verifiers_per_shard(&require_caller()?, n)?;
            print_json(&summary(&registry)?)?;
        }
        Command::SetToken { token } => {
            let registry = attach(&config, &store)?;
            registry.update_token_address(&require_caller()?, &token)?;
            print_json(&summary(&registry)?)?;
        }
        Command::Show { verifier } => {
            let registry = attach(&config, &store)?;
            match registry.verifiers(&verifier)? {
                Some(record) => print_json(&record)?,
                None => bail!("{verifier} is not a registered verifier"),
            }
        }
        Command::List => {
            let registry = attach(&config, &store)?;
            print_json(&registry.verifier_list()?)?;
        }
        Command::Shard { shard } => {
            let registry = attach(&config, &store)?;
            let balance = registry.balances_per_shard(shard)?;
            print_json(&ShardSummary { shard, balance })?;
        }
    }

    Ok(())
}

fn builder(config: &DaemonConfig) -> RegistryBuilder {
    let mut directory = ContractDirectory::new();
    let registry_entry = Named(config.registry_address, vreg_registry::REGISTRY_NAME);
    // A zero address fails later with a clearer error from the builder.
    let _ = directory.add(&registry_entry);

    RegistryBuilder::new(config.registry_address, config.admin, Arc::new(directory)).subscribe(
        Box::new(|event: &RegistryEvent| {
            if let Ok(line) = serde_json::to_string(event) {
                println!("{line}");
            }
        }),
    )
}

fn attach(
    config: &DaemonConfig,
    store: &Arc<LmdbRegistryStore>,
) -> anyhow::Result<RegistryLogic<LmdbRegistryStore>> {
    builder(config)
        .attach(Arc::clone(store))
        .context("store is not owned by the configured registry address (run `vreg init` first)")
}

fn summary(registry: &RegistryLogic<LmdbRegistryStore>) -> anyhow::Result<StoreSummary> {
    Ok(StoreSummary {
        registry: registry.address(),
        admin: registry.owner(),
        verifiers_per_shard: registry.verifiers_per_shard()?,
        token_address: registry.token_address()?,
        verifiers: registry.number_of_verifiers()?,
    })
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

/// A directory entry for a component identified only by address.
struct Named(Address, &'static str);

impl vreg_directory::Contract for Named {
    fn address(&self) -> Address {
        self.0
    }

    fn contract_name(&self) -> &str {
        self.1
    }
}
