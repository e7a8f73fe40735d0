//! Session value and client-local persistence.
//!
//! Two files live under FINQ_HOME: `session.json`, a best-effort boolean
//! hint that a user was logged in (read at startup to avoid flashing the
//! login screen), and `credentials.json`, the identity-provider token cache
//! written with restricted permissions (0600). Tokens are never logged in
//! full.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::paths;

fn now_millis_u64() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|d| u64::try_from(d.as_millis()).ok())
        .unwrap_or(u64::MAX)
}

/// Client-side record of the current authentication state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub authenticated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Session {
    pub fn unauthenticated() -> Self {
        Self {
            authenticated: false,
            user_id: None,
        }
    }

    pub fn signed_in(user_id: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            user_id: Some(user_id.into()),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::unauthenticated()
    }
}

// ============================================================================
// SessionStore
// ============================================================================

/// Persisted logged-in hint.
///
/// `load` never errors: any read or parse failure means "not logged in".
/// `save` is best-effort: a persistence failure must not block the in-memory
/// state transition, so it is logged and swallowed.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Creates a store at the default session path.
    pub fn new() -> Self {
        Self::at(paths::session_path())
    }

    /// Creates a store at a specific path (tests).
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    /// Reads the persisted flag; absent or unparseable means false.
    pub fn load(&self) -> bool {
        let Ok(contents) = fs::read_to_string(&self.path) else {
            return false;
        };
        serde_json::from_str::<bool>(&contents).unwrap_or(false)
    }

    /// Persists the flag, overwriting any prior value. Best-effort.
    pub fn save(&self, flag: bool) {
        if let Err(e) = self.try_save(flag) {
            tracing::warn!("Failed to persist session flag: {e:#}");
        }
    }

    /// Removes the persisted flag. Best-effort.
    pub fn clear(&self) {
        if let Err(e) = fs::remove_file(&self.path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!("Failed to clear session flag: {e}");
        }
    }

    fn try_save(&self, flag: bool) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        fs::write(&self.path, if flag { "true" } else { "false" })
            .with_context(|| format!("Failed to write to {}", self.path.display()))
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// CredentialCache
// ============================================================================

/// Identity-provider tokens for the signed-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    /// Expiry timestamp in milliseconds since epoch.
    pub expires: u64,
    pub user_id: String,
}

impl Credentials {
    /// Returns true if the access token is expired or about to expire.
    pub fn is_expired(&self) -> bool {
        now_millis_u64() >= self.expires
    }

    /// Computes the expiry timestamp from a provider `expires_in` value,
    /// with a 5 minute refresh buffer.
    pub fn expires_at(expires_in_secs: u64) -> u64 {
        now_millis_u64() + (expires_in_secs * 1000).saturating_sub(5 * 60 * 1000)
    }
}

/// On-disk token cache.
#[derive(Debug, Clone)]
pub struct CredentialCache {
    path: PathBuf,
}

impl CredentialCache {
    /// Creates a cache at the default credentials path.
    pub fn new() -> Self {
        Self::at(paths::credentials_path())
    }

    /// Creates a cache at a specific path (tests).
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    /// Loads cached credentials, if any.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<Option<Credentials>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read credentials from {}", self.path.display()))?;
        let creds = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse credentials from {}", self.path.display()))?;
        Ok(Some(creds))
    }

    /// Saves credentials to disk with restricted permissions (0600).
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub fn save(&self, creds: &Credentials) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents =
            serde_json::to_string_pretty(creds).context("Failed to serialize credentials")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&self.path)
                .with_context(|| format!("Failed to open {} for writing", self.path.display()))?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        #[cfg(not(unix))]
        {
            fs::write(&self.path, contents)
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        Ok(())
    }

    /// Removes cached credentials. Returns whether any existed.
    ///
    /// # Errors
    /// Returns an error if the removal fails for a reason other than absence.
    pub fn clear(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", self.path.display())),
        }
    }
}

impl Default for CredentialCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns a masked version of a token for display (first 12 chars + ...).
pub fn mask_token(token: &str) -> String {
    if token.len() <= 16 {
        return "***".to_string();
    }
    let prefix: String = token.chars().take(12).collect();
    format!("{prefix}...")
}
