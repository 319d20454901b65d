//! Runs `scp` once the firewall is open and the key is on disk.

use std::ffi::OsString;
use std::future::Future;
use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use tokio::process::{Child, Command};

use crate::error::{Error, Result};
use crate::models::TransferRequest;

/// SSH port the lease opens.
pub const SSH_PORT: u16 = 22;

const SCP_PROGRAM: &str = "scp";

#[async_trait]
pub trait Transfer: Send + Sync {
    async fn download(&self, request: &TransferRequest) -> Result<()>;
}

/// Argument vector for one download. Only the provisioned key is offered and
/// host keys are neither checked nor recorded.
pub fn scp_args(request: &TransferRequest) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-i".into(), request.credential.clone().into_os_string()];
    args.push("-r".into());
    for option in [
        "UserKnownHostsFile=/dev/null",
        "CheckHostIP=no",
        "StrictHostKeyChecking=no",
        "LogLevel=QUIET",
        "IdentitiesOnly=yes",
    ] {
        args.push("-o".into());
        args.push(option.into());
    }
    args.push("-P".into());
    args.push(SSH_PORT.to_string().into());
    args.push(request.remote_target().into());
    args.push(request.destination.clone().into());
    args
}

/// The system `scp`, attached to the operator's terminal.
#[derive(Debug, Clone)]
pub struct ScpTransfer {
    program: OsString,
}

impl Default for ScpTransfer {
    fn default() -> Self {
        Self::with_program(SCP_PROGRAM)
    }
}

impl ScpTransfer {
    /// Runs `program` with the scp argument vector instead of `scp`.
    pub fn with_program(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }
}

#[async_trait]
impl Transfer for ScpTransfer {
    async fn download(&self, request: &TransferRequest) -> Result<()> {
        let args = scp_args(request);
        tracing::info!(
            remote = %request.remote_target(),
            destination = %request.destination,
            "running scp"
        );

        let child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Transfer {
                message: format!("Failed to execute {}: {}", self.program_name(), e),
                status: None,
            })?;

        let status = supervise(child, &self.program_name(), shutdown_signal()).await?;

        if status.success() {
            tracing::info!("scp completed successfully");
            Ok(())
        } else {
            tracing::error!(%status, "scp failed");
            Err(Error::Transfer {
                message: format!("{} exited with {}", self.program_name(), status),
                status: Some(status),
            })
        }
    }
}

/// Waits for `child`, killing and reaping it if `shutdown` fires first.
async fn supervise<F>(mut child: Child, program: &str, shutdown: F) -> Result<ExitStatus>
where
    F: Future<Output = &'static str>,
{
    tokio::select! {
        status = child.wait() => status.map_err(|e| Error::Transfer {
            message: format!("Failed to wait for {}: {}", program, e),
            status: None,
        }),
        signal = shutdown => {
            tracing::warn!(signal, "interrupted, stopping {}", program);
            child.kill().await.map_err(|e| Error::Transfer {
                message: format!("Failed to stop {}: {}", program, e),
                status: None,
            })?;
            Err(Error::Transfer {
                message: format!("interrupted by {}", signal),
                status: None,
            })
        }
    }
}

/// Resolves with the signal name once the process is asked to stop.
#[cfg(unix)]
async fn shutdown_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut term, mut hup) = match (signal(SignalKind::terminate()), signal(SignalKind::hangup())) {
        (Ok(term), Ok(hup)) => (term, hup),
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "cannot watch SIGTERM/SIGHUP, only Ctrl-C stops scp");
            return ctrl_c().await;
        }
    };

    tokio::select! {
        name = ctrl_c() => name,
        _ = term.recv() => "SIGTERM",
        _ = hup.recv() => "SIGHUP",
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> &'static str {
    ctrl_c().await
}

async fn ctrl_c() -> &'static str {
    match tokio::signal::ctrl_c().await {
        Ok(()) => "SIGINT",
        Err(e) => {
            tracing::warn!(error = %e, "cannot watch Ctrl-C");
            std::future::pending().await
        }
    }
}
