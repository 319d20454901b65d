//! The download pipeline: resolve, provision key, open lease, copy.

use std::path::PathBuf;
use std::sync::Arc;

use crate::credentials::CredentialProvisioner;
use crate::error::{Error, Result};
use crate::fleet::FleetApi;
use crate::lease::AccessLeaseClient;
use crate::models::TransferRequest;
use crate::resolver;
use crate::transfer::Transfer;

/// Platforms without a usable `scp`.
const UNSUPPORTED_PLATFORMS: &[&str] = &["windows"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Start,
    Resolved,
    CredentialReady,
    AccessGranted,
    Transferred,
    Failed(String),
}

/// What the operator asked for.
#[derive(Debug, Clone)]
pub struct DownloadArgs {
    pub stack: String,
    /// Narrows `stack` when several stacks share a name.
    pub environment: Option<String>,
    pub server: String,
    pub remote_path: String,
    pub destination: Option<String>,
}

pub struct Download {
    fleet: Arc<dyn FleetApi>,
    credentials: CredentialProvisioner,
    leases: AccessLeaseClient,
    transfer: Arc<dyn Transfer>,
    platform: &'static str,
}

pub fn ensure_supported_platform(platform: &str) -> Result<()> {
    if UNSUPPORTED_PLATFORMS.contains(&platform) {
        return Err(Error::UnsupportedPlatform(capitalize(platform)));
    }
    Ok(())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl Download {
    pub fn new(
        fleet: Arc<dyn FleetApi>,
        key_dir: impl Into<PathBuf>,
        transfer: Arc<dyn Transfer>,
    ) -> Self {
        Self {
            credentials: CredentialProvisioner::new(key_dir, fleet.clone()),
            leases: AccessLeaseClient::new(fleet.clone()),
            fleet,
            transfer,
            platform: std::env::consts::OS,
        }
    }

    /// Pretend to run on another OS.
    #[cfg(test)]
    pub(crate) fn with_platform(mut self, platform: &'static str) -> Self {
        self.platform = platform;
        self
    }

    /// Runs the whole pipeline. Any failure ends the invocation.
    pub async fn run(&self, args: &DownloadArgs) -> Result<TransferRequest> {
        let mut stage = Stage::Start;
        let result = self.advance(args, &mut stage).await;
        if let Err(e) = &result {
            tracing::error!(from = ?stage, to = ?settle(&stage, &result), error = %e, "download failed");
        }
        result
    }

    async fn advance(&self, args: &DownloadArgs, stage: &mut Stage) -> Result<TransferRequest> {
        ensure_supported_platform(self.platform)?;
        validate(args)?;

        let stacks = self.fleet.stacks().await?;
        let stack = resolver::resolve_stack(&stacks, &args.stack, args.environment.as_deref())?;
        let servers = self.fleet.servers(&stack.uid).await?;
        let server = resolver::resolve(&servers, &args.server)?.clone();
        transition(stage, Stage::Resolved);
        println!("Server: {}", server.name);

        let credential = self.credentials.ensure_key(&server).await?;
        transition(stage, Stage::CredentialReady);

        println!("Opening access to {}...", server.address);
        let window = self.leases.open_access(&server.stack_uid, &server.uid).await?;
        transition(stage, Stage::AccessGranted);

        println!(
            "Connecting to {} ({}), access open until {}...",
            server.name,
            server.address,
            window.expires_at().format("%H:%M")
        );
        let request = TransferRequest::new(
            server,
            credential,
            args.remote_path.clone(),
            args.destination.clone(),
        );
        self.transfer.download(&request).await?;
        transition(stage, Stage::Transferred);

        Ok(request)
    }
}

/// Terminal stage of a run.
fn settle<T>(stage: &Stage, result: &Result<T>) -> Stage {
    match result {
        Ok(_) => stage.clone(),
        Err(e) => Stage::Failed(e.to_string()),
    }
}

fn transition(stage: &mut Stage, next: Stage) {
    tracing::debug!(from = ?stage, to = ?next, "stage");
    *stage = next;
}

fn validate(args: &DownloadArgs) -> Result<()> {
    if args.stack.trim().is_empty() {
        return Err(Error::Usage("A stack is required".into()));
    }
    if args.server.trim().is_empty() {
        return Err(Error::Usage("A server selector is required".into()));
    }
    if args.remote_path.trim().is_empty() {
        return Err(Error::Usage("A remote path is required".into()));
    }
    Ok(())
}
