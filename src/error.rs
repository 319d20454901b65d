//! Error types for leasecp.

use std::process::ExitStatus;

use thiserror::Error;

/// Exit code for bad arguments and unsupported platforms.
pub const EXIT_USAGE: u8 = 2;

/// Exit code for every other failure.
pub const EXIT_FAILURE: u8 = 1;

/// Main error type for a download invocation.
#[derive(Debug, Error)]
pub enum Error {
    /// Bad or missing arguments.
    #[error("{0}")]
    Usage(String),

    /// The platform has no usable `scp`.
    #[error("Not supported on {0}")]
    UnsupportedPlatform(String),

    #[error("Stack '{0}' not found")]
    StackNotFound(String),

    /// Several stacks share the name; `--environment` tells them apart.
    #[error("Stack '{name}' exists in several environments ({}); pass --environment", .environments.join(", "))]
    AmbiguousStack {
        name: String,
        environments: Vec<String>,
    },

    /// No server matched the selector.
    #[error("Server '{selector}' not found{}", suggestion_suffix(.suggestion))]
    ServerNotFound {
        selector: String,
        suggestion: Option<String>,
    },

    /// The selector is a prefix of several server names and no role matched.
    #[error("Server '{selector}' is ambiguous, it matches: {}", .candidates.join(", "))]
    AmbiguousSelector {
        selector: String,
        candidates: Vec<String>,
    },

    /// The local key could not be read, fetched or written.
    #[error("credential error: {message}")]
    Credential { message: String },

    /// The fleet refused to open the firewall.
    #[error("Unable to open server lease")]
    LeaseDenied,

    /// The lease request itself failed.
    #[error("lease error: {message}")]
    Lease { message: String },

    /// `scp` could not be started or exited unsuccessfully.
    #[error("transfer failed: {message}")]
    Transfer {
        message: String,
        status: Option<ExitStatus>,
    },

    /// Fleet API transport or decoding failure.
    #[error("fleet API error: {message}")]
    Api { message: String },

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(name) => format!(" (did you mean '{}'?)", name),
        None => String::new(),
    }
}

impl Error {
    pub fn credential(message: impl Into<String>) -> Self {
        Error::Credential {
            message: message.into(),
        }
    }

    pub fn api(message: impl Into<String>) -> Self {
        Error::Api {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Usage(_) | Error::UnsupportedPlatform(_) => EXIT_USAGE,
            _ => EXIT_FAILURE,
        }
    }
}

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_errors_map_to_exit_two() {
        assert_eq!(Error::Usage("missing path".into()).exit_code(), 2);
        assert_eq!(Error::UnsupportedPlatform("windows".into()).exit_code(), 2);
    }

    #[test]
    fn pipeline_errors_map_to_exit_one() {
        assert_eq!(Error::LeaseDenied.exit_code(), 1);
        assert_eq!(Error::credential("denied").exit_code(), 1);
        assert_eq!(
            Error::ServerNotFound {
                selector: "x".into(),
                suggestion: None
            }
            .exit_code(),
            1
        );
    }

    #[test]
    fn not_found_message_includes_suggestion() {
        let err = Error::ServerNotFound {
            selector: "lon".into(),
            suggestion: Some("lion".into()),
        };
        assert_eq!(err.to_string(), "Server 'lon' not found (did you mean 'lion'?)");
    }
}
