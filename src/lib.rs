//! Download files from fleet servers through short-lived firewall leases.

pub mod cli;
pub mod config;
pub mod credentials;
pub mod download;
pub mod error;
pub mod fleet;
pub mod lease;
pub mod models;
pub mod resolver;
pub mod transfer;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Error, Result};
