use std::sync::Arc;

use crate::error::{Error, Result};
use crate::fleet::FleetApi;
use crate::models::{AccessWindow, LeaseRequest};

/// How long the firewall stays open for a download, in minutes.
pub const LEASE_MINUTES: u32 = 2;

/// Opens a short SSH window on a single server.
pub struct AccessLeaseClient {
    fleet: Arc<dyn FleetApi>,
}

impl AccessLeaseClient {
    pub fn new(fleet: Arc<dyn FleetApi>) -> Self {
        Self { fleet }
    }

    /// Blocks until the fleet has opened the firewall. A refusal or a failed
    /// request is final; nothing is retried.
    pub async fn open_access(&self, stack_uid: &str, server_uid: &str) -> Result<AccessWindow> {
        let request = LeaseRequest {
            stack_uid: stack_uid.to_string(),
            from_ip: None,
            time_to_open: LEASE_MINUTES,
            to_port: None,
            server_uid: Some(server_uid.to_string()),
        };

        let result = self.fleet.lease(&request).await.map_err(|e| match e {
            Error::Lease { .. } => e,
            other => Error::Lease {
                message: other.to_string(),
            },
        })?;

        if !result.granted {
            tracing::warn!(server = %server_uid, "lease refused");
            return Err(Error::LeaseDenied);
        }

        let window = AccessWindow::new(server_uid, LEASE_MINUTES);
        tracing::info!(
            server = %server_uid,
            expires_at = %window.expires_at().format("%H:%M:%S"),
            "lease granted"
        );
        Ok(window)
    }
}
