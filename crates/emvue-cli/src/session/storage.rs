//! Token storage for persisting login state.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use emvue_core::TokenSet;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Stored session data.
///
/// The `password` field is never written by this tool, but a user may seed
/// the file with one by hand for unattended first login; it is consumed on
/// the next `emvue login`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StoredSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl StoredSession {
    /// The stored credential snapshot.
    pub fn tokens(&self) -> TokenSet {
        TokenSet {
            access_token: self.access_token.clone(),
            id_token: self.id_token.clone(),
            refresh_token: self.refresh_token.clone(),
            token_type: self.token_type.clone(),
        }
    }
}

/// Get the default token file path.
pub fn default_path() -> Result<PathBuf> {
    let dirs =
        ProjectDirs::from("", "", "emvue").context("Could not determine config directory")?;

    let data_dir = dirs.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data directory")?;

    Ok(data_dir.join("tokens.json"))
}

/// Load a stored session, if the file exists.
pub fn load(path: &Path) -> Result<Option<StoredSession>> {
    if !path.exists() {
        return Ok(None);
    }

    let json = fs::read_to_string(path).context("Failed to read token file")?;
    let stored: StoredSession = serde_json::from_str(&json).context("Invalid token file")?;
    Ok(Some(stored))
}

/// Save a credential snapshot to disk.
pub fn save(path: &Path, username: Option<&str>, tokens: &TokenSet) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create token directory")?;
    }

    let stored = StoredSession {
        username: username.map(str::to_owned),
        access_token: tokens.access_token.clone(),
        id_token: tokens.id_token.clone(),
        refresh_token: tokens.refresh_token.clone(),
        token_type: tokens.token_type.clone(),
        password: None,
    };

    let json = serde_json::to_string_pretty(&stored)?;
    fs::write(path, &json).context("Failed to write token file")?;

    // Set restrictive permissions (Unix only)
    #[cfg(unix)]
    {
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(path, perms)?;
    }

    Ok(())
}

/// Clear the stored session.
#[allow(dead_code)]
pub fn clear(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).context("Failed to remove token file")?;
    }
    Ok(())
}
