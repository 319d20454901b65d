use std::path::PathBuf;

use chrono::{DateTime, Duration, Local};
use serde::{Deserialize, Serialize};

/// Local destination used when none is given.
pub const DEFAULT_DESTINATION: &str = ".";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Stack {
    pub uid: String,
    pub name: String,
    #[serde(default)]
    pub environment: Option<String>,
}

/// A managed node, as listed by the fleet API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Server {
    pub uid: String,
    pub name: String,
    pub address: String,
    pub user_name: String,
    pub stack_uid: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// Body of a lease request. Unset filters are left to the fleet's defaults.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LeaseRequest {
    pub stack_uid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_ip: Option<String>,
    pub time_to_open: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_uid: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaseResult {
    pub granted: bool,
}

/// Local record of a granted lease. The fleet enforces the expiry.
#[derive(Debug, Clone)]
pub struct AccessWindow {
    pub server_uid: String,
    pub minutes: u32,
    pub opened_at: DateTime<Local>,
}

impl AccessWindow {
    pub fn new(server_uid: impl Into<String>, minutes: u32) -> Self {
        Self {
            server_uid: server_uid.into(),
            minutes,
            opened_at: Local::now(),
        }
    }

    pub fn expires_at(&self) -> DateTime<Local> {
        self.opened_at + Duration::minutes(i64::from(self.minutes))
    }
}

/// Everything `scp` needs for one download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub server: Server,
    pub credential: PathBuf,
    pub remote_path: String,
    pub destination: String,
}

impl TransferRequest {
    pub fn new(
        server: Server,
        credential: PathBuf,
        remote_path: impl Into<String>,
        destination: Option<String>,
    ) -> Self {
        Self {
            server,
            credential,
            remote_path: remote_path.into(),
            destination: destination.unwrap_or_else(|| DEFAULT_DESTINATION.to_string()),
        }
    }

    /// `user@address:path` as understood by scp.
    pub fn remote_target(&self) -> String {
        format!(
            "{}@{}:{}",
            self.server.user_name, self.server.address, self.remote_path
        )
    }
}
