//! # Vehicle Ledger Runtime
//!
//! Command-line host for the vehicle registry.
//!
//! ## Startup Sequence
//!
//! 1. Parse the command line
//! 2. Load configuration (environment, then flags)
//! 3. Install logging (stderr, so stdout carries only the response)
//! 4. Open the file-backed ledger
//! 5. Dispatch the invocation and print the response
//!
//! ```text
//! vl-runtime create amag garage '{"vin":"WVW1"}'
//! vl-runtime sell amag garage 99 WVW1 bobby
//! ```

mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use vl_registry::{
    FileBackedKVStore, InvocationHandler, InvocationResponse, JsonCarCodec, RegistryDependencies,
    SystemTimeSource, VehicleRegistryService,
};

use crate::config::RuntimeConfig;

/// Invoke one vehicle registry operation against the local ledger.
#[derive(Parser, Debug)]
#[command(name = "vl-runtime")]
#[command(about = "Vehicle certification and ownership registry")]
struct Cli {
    /// Ledger file (overrides VL_DATA_FILE)
    #[arg(long)]
    data_file: Option<PathBuf>,

    /// Operation name, e.g. create, register, sell
    function: String,

    /// Caller username
    username: String,

    /// Caller role: garage, dot, user or insurer
    role: String,

    /// Operation arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn init_logging(filter: &str) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_new(filter).context("Invalid log filter")?)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install tracing subscriber")?;
    Ok(())
}

fn run(cli: Cli) -> Result<InvocationResponse> {
    let mut config = RuntimeConfig::from_env().context("Failed to load configuration")?;
    if let Some(path) = cli.data_file {
        config.data_file = path;
    }
    init_logging(&config.log_filter)?;

    let kv_store = FileBackedKVStore::open(&config.data_file)
        .with_context(|| format!("Failed to open ledger at {}", config.data_file.display()))?;
    info!(
        data_file = %config.data_file.display(),
        starting_balance = config.registry.starting_balance,
        "ledger opened"
    );

    let deps = RegistryDependencies {
        kv_store,
        time_source: SystemTimeSource,
        codec: JsonCarCodec,
    };
    let mut handler = InvocationHandler::new(VehicleRegistryService::new(deps, config.registry));

    let mut args = Vec::with_capacity(cli.args.len() + 2);
    args.push(cli.username);
    args.push(cli.role);
    args.extend(cli.args);

    Ok(handler.invoke(&cli.function, &args))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(response) => match response.error {
            None => {
                match response.payload {
                    Some(bytes) => println!("{}", String::from_utf8_lossy(&bytes)),
                    None => println!("null"),
                }
                ExitCode::SUCCESS
            }
            Some(error) => {
                match serde_json::to_string(&error) {
                    Ok(json) => println!("{json}"),
                    Err(_) => println!("{}", error.message),
                }
                ExitCode::FAILURE
            }
        },
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(2)
        }
    }
}
