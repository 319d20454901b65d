//! Local cache of per-server private keys.
//!
//! Keys live in `key_dir` as `leasecp_<server uid>` with mode `0600`. A fresh
//! key is written to a temp file in the same directory and renamed into place,
//! so concurrent invocations only ever see a complete file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::fleet::FleetApi;
use crate::models::Server;

const KEY_FILE_PREFIX: &str = "leasecp_";

pub struct CredentialProvisioner {
    key_dir: PathBuf,
    fleet: Arc<dyn FleetApi>,
}

impl CredentialProvisioner {
    pub fn new(key_dir: impl Into<PathBuf>, fleet: Arc<dyn FleetApi>) -> Self {
        Self {
            key_dir: key_dir.into(),
            fleet,
        }
    }

    pub fn key_path(&self, server: &Server) -> PathBuf {
        self.key_dir
            .join(format!("{}{}", KEY_FILE_PREFIX, sanitize(&server.uid)))
    }

    /// Returns a usable key for `server`, downloading it only when the cached
    /// copy is missing or unusable.
    pub async fn ensure_key(&self, server: &Server) -> Result<PathBuf> {
        let path = self.key_path(server);

        if is_valid_key_file(&path) {
            tracing::debug!(server = %server.uid, path = %path.display(), "reusing cached key");
            return Ok(path);
        }

        tracing::info!(server = %server.uid, "provisioning ssh key");
        let key = self
            .fleet
            .server_private_key(&server.stack_uid, &server.uid)
            .await
            .map_err(|e| Error::credential(format!("Failed to fetch key for {}: {}", server.name, e)))?;

        if !looks_like_private_key(&key) {
            return Err(Error::credential(format!(
                "Fleet returned an unusable key for {}",
                server.name
            )));
        }

        self.write_atomically(&path, &key).map_err(|e| {
            Error::credential(format!("Failed to write {}: {}", path.display(), e))
        })?;

        Ok(path)
    }

    fn write_atomically(&self, path: &Path, key: &str) -> std::io::Result<()> {
        create_private_dir(&self.key_dir)?;

        let mut tmp = NamedTempFile::new_in(&self.key_dir)?;
        restrict_to_owner(tmp.path(), 0o600)?;

        tmp.write_all(key.as_bytes())?;
        if !key.ends_with('\n') {
            tmp.write_all(b"\n")?;
        }
        tmp.as_file().sync_all()?;

        tmp.persist(path).map_err(|e| e.error)?;
        tracing::debug!(path = %path.display(), "key written");
        Ok(())
    }
}

/// Server uids come from the fleet; keep them from escaping `key_dir`.
fn sanitize(uid: &str) -> String {
    uid.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

fn looks_like_private_key(content: &str) -> bool {
    let content = content.trim();
    content.starts_with("-----BEGIN ") && content.contains("PRIVATE KEY-----")
}

fn is_valid_key_file(path: &Path) -> bool {
    let Ok(metadata) = fs::metadata(path) else {
        return false;
    };
    if !metadata.is_file() || metadata.len() == 0 || !has_owner_only_mode(&metadata) {
        return false;
    }
    match fs::read_to_string(path) {
        Ok(content) => looks_like_private_key(&content),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cached key unreadable");
            false
        }
    }
}

#[cfg(unix)]
fn has_owner_only_mode(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o077 == 0
}

#[cfg(not(unix))]
fn has_owner_only_mode(_metadata: &fs::Metadata) -> bool {
    true
}

#[cfg(unix)]
fn restrict_to_owner(path: &Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn restrict_to_owner(_path: &Path, _mode: u32) -> std::io::Result<()> {
    Ok(())
}

fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
        restrict_to_owner(dir, 0o700)?;
    }
    Ok(())
}
