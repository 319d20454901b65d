use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "leasecp", version, about = "Copy files from fleet servers over a short-lived SSH lease")]
pub struct Cli {
    /// Alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Copy a file from a remote server to your local computer.
    ///
    /// Opens the firewall for SSH from your IP address for 2 minutes,
    /// downloads the server key if you don't have it yet and copies the file
    /// with scp. The server can be given by name (or its first letters),
    /// by IP address or by role; a role picks the first server with it.
    /// Not supported on Windows.
    Download(DownloadCommand),
}

#[derive(Debug, Args)]
pub struct DownloadCommand {
    /// Stack name or uid; defaults to `default_stack` from the config
    #[arg(short, long)]
    pub stack: Option<String>,

    /// Stack environment, for stacks sharing a name (e.g. production)
    #[arg(short, long)]
    pub environment: Option<String>,

    /// Server name, name prefix, IP address or role
    #[arg(long, value_name = "SERVER")]
    pub server: String,

    /// File or directory on the server
    pub remote_path: String,

    /// Local target directory [default: .]
    pub destination: Option<String>,
}
