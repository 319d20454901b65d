use std::io::IsTerminal;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt};

use leasecp::cli::{Cli, Command, DownloadCommand};
use leasecp::config::{AppConfig, ConfigManager};
use leasecp::download::{self, Download, DownloadArgs};
use leasecp::error::{EXIT_FAILURE, Error};
use leasecp::fleet::HttpFleetClient;
use leasecp::transfer::ScpTransfer;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("Failed to initialise logging: {:#}", e);
        return ExitCode::from(EXIT_FAILURE);
    }

    let result = match cli.command {
        Command::Download(ref command) => run_download(&cli, command).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let default_directive = if verbose { "leasecp=debug" } else { "leasecp=warn" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))?;

    fmt()
        .with_env_filter(filter)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    debug!("logging initialised");
    Ok(())
}

async fn run_download(cli: &Cli, command: &DownloadCommand) -> leasecp::Result<()> {
    // Nothing may touch the fleet or the key cache on an unsupported OS
    download::ensure_supported_platform(std::env::consts::OS)?;

    let config = load_config(cli)?;
    let stack = command
        .stack
        .clone()
        .or_else(|| config.default_stack.clone())
        .ok_or_else(|| Error::Usage("No stack given; pass --stack or set default_stack".into()))?;

    let fleet = Arc::new(HttpFleetClient::new(&config.api_url, config.token()?)?);
    let pipeline = Download::new(fleet, &config.key_dir, Arc::new(ScpTransfer::default()));

    let args = DownloadArgs {
        stack,
        environment: command.environment.clone(),
        server: command.server.clone(),
        remote_path: command.remote_path.clone(),
        destination: command.destination.clone(),
    };
    pipeline.run(&args).await.map(|_| ())
}

fn load_config(cli: &Cli) -> leasecp::Result<AppConfig> {
    let manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new()?,
    };
    debug!(path = %manager.config_path().display(), "loading config");

    let mut config = manager.load_config()?;
    config.apply_env(|key| std::env::var(key).ok());
    Ok(config)
}
