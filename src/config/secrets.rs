//! Auth token storage.
//!
//! The bearer token issued by the service at sign-in is kept outside the
//! config file, in the user's local data directory with owner-only
//! permissions.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Stored sign-in state.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredAuth {
    token: String,
    username: String,
}

/// Saves the bearer token and username, replacing any previous sign-in.
///
/// # Errors
/// - If the data directory cannot be created
/// - If the secrets file cannot be written
pub fn save_token(token: &str, username: &str) -> anyhow::Result<()> {
    let path = secrets_path()?;
    let content = toml::to_string_pretty(&StoredAuth {
        token: token.to_string(),
        username: username.to_string(),
    })?;
    fs::write(&path, content)?;
    restrict_permissions(&path)?;
    tracing::info!("Auth token saved for user '{username}'");
    Ok(())
}

/// Returns the stored bearer token, if any.
pub fn get_token() -> anyhow::Result<Option<String>> {
    Ok(read_auth()?.map(|auth| auth.token))
}

/// Returns the username recorded at sign-in, if any.
pub fn get_username() -> anyhow::Result<Option<String>> {
    Ok(read_auth()?.map(|auth| auth.username))
}

/// Removes the stored sign-in state.
pub fn clear_token() -> anyhow::Result<()> {
    let path = secrets_path()?;
    if path.exists() {
        fs::remove_file(&path)?;
        tracing::info!("Auth token cleared");
    }
    Ok(())
}

fn read_auth() -> anyhow::Result<Option<StoredAuth>> {
    let path = secrets_path()?;
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path)?;
    let auth: StoredAuth = toml::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Malformed secrets file {}: {e}", path.display()))?;
    Ok(Some(auth))
}

fn secrets_path() -> anyhow::Result<PathBuf> {
    let dir = data_dir()?;
    fs::create_dir_all(&dir)?;
    Ok(dir.join("auth.toml"))
}

/// The local data directory, also used by the report archive.
pub fn data_dir() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
    Ok(home.join(".local").join("share").join("intervox"))
}

/// Restricts the secrets file to owner read/write on Unix systems.
#[cfg(unix)]
fn restrict_permissions(path: &std::path::Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let perms = fs::Permissions::from_mode(0o600);
    fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &std::path::Path) -> anyhow::Result<()> {
    Ok(())
}
