//! Configuration management for finq.
//!
//! Loads configuration from ${FINQ_HOME}/config.toml, overlays FINQ_*
//! environment variables, and validates the identity settings. Missing
//! identity values are a fatal startup error: the client cannot talk to
//! either gateway without them.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Identity provider (user pool) settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Region of the user pool, e.g. "ap-south-1".
    pub region: String,
    pub user_pool_id: String,
    pub client_id: String,
    /// Hosted-UI domain for federated sign-in.
    pub oauth_domain: String,
    pub redirect_sign_in: String,
    pub redirect_sign_out: String,
    /// Endpoint override for tests; normally derived from the region.
    pub base_url: Option<String>,
}

impl IdentityConfig {
    /// Returns the identity endpoint URL.
    pub fn endpoint(&self) -> String {
        match &self.base_url {
            Some(url) => url.clone(),
            None => format!("https://cognito-idp.{}.amazonaws.com/", self.region),
        }
    }

    /// Returns the hosted-UI base URL for the federated flow.
    pub fn hosted_ui_base(&self) -> String {
        format!("https://{}", self.oauth_domain)
    }
}

/// Resource gateway settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Versioned base URL; collections hang off it.
    pub base_url: String,
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub identity: IdentityConfig,
    pub api: ApiConfig,
}

/// (env var, getter, config key) table for required identity values.
const REQUIRED: &[(&str, fn(&Config) -> &str, &str)] = &[
    ("FINQ_IDENTITY_REGION", |c| &c.identity.region, "identity.region"),
    ("FINQ_USER_POOL_ID", |c| &c.identity.user_pool_id, "identity.user_pool_id"),
    ("FINQ_CLIENT_ID", |c| &c.identity.client_id, "identity.client_id"),
    ("FINQ_OAUTH_DOMAIN", |c| &c.identity.oauth_domain, "identity.oauth_domain"),
    (
        "FINQ_REDIRECT_SIGN_IN",
        |c| &c.identity.redirect_sign_in,
        "identity.redirect_sign_in",
    ),
    (
        "FINQ_REDIRECT_SIGN_OUT",
        |c| &c.identity.redirect_sign_out,
        "identity.redirect_sign_out",
    ),
    ("FINQ_API_BASE_URL", |c| &c.api.base_url, "api.base_url"),
];

impl Config {
    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Fails when the file is unreadable or a required value is missing.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path, overlays env vars, and
    /// validates required values.
    ///
    /// # Errors
    /// Fails when the file is unreadable or a required value is missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))?
        } else {
            Config::default()
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Overlays FINQ_* environment variables onto file values.
    fn apply_env(&mut self) {
        overlay("FINQ_IDENTITY_REGION", &mut self.identity.region);
        overlay("FINQ_USER_POOL_ID", &mut self.identity.user_pool_id);
        overlay("FINQ_CLIENT_ID", &mut self.identity.client_id);
        overlay("FINQ_OAUTH_DOMAIN", &mut self.identity.oauth_domain);
        overlay("FINQ_REDIRECT_SIGN_IN", &mut self.identity.redirect_sign_in);
        overlay("FINQ_REDIRECT_SIGN_OUT", &mut self.identity.redirect_sign_out);
        overlay("FINQ_API_BASE_URL", &mut self.api.base_url);
        if let Ok(value) = std::env::var("FINQ_IDENTITY_BASE_URL")
            && !value.trim().is_empty()
        {
            self.identity.base_url = Some(value.trim().to_string());
        }
    }

    /// Checks that every required value is present and URLs are well-formed.
    fn validate(&self) -> Result<()> {
        for (env_var, get, key) in REQUIRED {
            if get(self).trim().is_empty() {
                bail!(
                    "Missing required configuration value: {key}. \
                     Set {env_var} or {key} in {}.",
                    paths::config_path().display()
                );
            }
        }
        url::Url::parse(&self.api.base_url)
            .with_context(|| format!("Invalid api.base_url: {}", self.api.base_url))?;
        url::Url::parse(&self.identity.hosted_ui_base())
            .with_context(|| format!("Invalid identity.oauth_domain: {}", self.identity.oauth_domain))?;
        if let Some(base) = &self.identity.base_url {
            url::Url::parse(base)
                .with_context(|| format!("Invalid identity.base_url: {base}"))?;
        }
        Ok(())
    }

    /// Writes the commented default template to `path`.
    ///
    /// # Errors
    /// Fails when the file already exists or cannot be written.
    pub fn init_at(path: &Path) -> Result<()> {
        if path.exists() {
            bail!("Config already exists at {}", path.display());
        }
        write_config(path, default_config_template())
    }

    /// Saves one `section.key` string value, preserving comments.
    ///
    /// Creates the file from the template when it does not exist; when it
    /// does, user values are merged into the latest template first.
    ///
    /// # Errors
    /// Fails when the file cannot be read, parsed, or written.
    pub fn save_value(path: &Path, section: &str, key: &str, value: &str) -> Result<()> {
        use toml_edit::{DocumentMut, value as toml_value};

        let contents = if path.exists() {
            let user_config = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            merge_with_template(&user_config)?
        } else {
            default_config_template().to_string()
        };

        let mut doc: DocumentMut = contents
            .parse()
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        doc[section][key] = toml_value(value);

        write_config(path, &doc.to_string())
    }
}

fn overlay(env_var: &str, target: &mut String) {
    if let Ok(value) = std::env::var(env_var) {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            *target = trimmed.to_string();
        }
    }
}

fn write_config(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, contents)
        .with_context(|| format!("Failed to write config to {}", path.display()))
}

/// Returns the default config template with comments.
///
/// Embedded from default_config.toml at compile time.
pub fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

/// Merges user config values into the default template.
///
/// Ensures new comments/sections from the template are always present while
/// preserving the user's customized values.
fn merge_with_template(user_config: &str) -> Result<String> {
    use toml_edit::DocumentMut;

    let mut doc: DocumentMut = default_config_template()
        .parse()
        .context("Failed to parse default config template")?;
    let user_doc: DocumentMut = user_config.parse().context("Failed to parse user config")?;

    merge_items(doc.as_table_mut(), user_doc.as_table());
    Ok(doc.to_string())
}

/// Recursively merges items from source table into target table.
fn merge_items(target: &mut toml_edit::Table, source: &toml_edit::Table) {
    use toml_edit::Item;

    for (key, value) in source.iter() {
        match value {
            Item::Value(v) => {
                target[key] = Item::Value(v.clone());
            }
            Item::Table(src_table) => {
                if let Some(Item::Table(target_table)) = target.get_mut(key) {
                    merge_items(target_table, src_table);
                } else {
                    target[key] = Item::Table(src_table.clone());
                }
            }
            Item::ArrayOfTables(src_arr) => {
                target[key] = Item::ArrayOfTables(src_arr.clone());
            }
            Item::None => {}
        }
    }
}

pub mod paths {
    //! Path resolution for finq configuration and data directories.
    //!
    //! FINQ_HOME resolution order:
    //! 1. FINQ_HOME environment variable (if set)
    //! 2. ~/.config/finq (default)

    use std::path::PathBuf;

    /// Returns the finq home directory.
    pub fn finq_home() -> PathBuf {
        if let Ok(home) = std::env::var("FINQ_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .map(|h| h.join(".config").join("finq"))
            .expect("Could not determine home directory")
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        finq_home().join("config.toml")
    }

    /// Returns the path to the persisted logged-in hint.
    pub fn session_path() -> PathBuf {
        finq_home().join("session.json")
    }

    /// Returns the path to the identity credential cache.
    pub fn credentials_path() -> PathBuf {
        finq_home().join("credentials.json")
    }

    /// Returns the log directory.
    pub fn logs_dir() -> PathBuf {
        finq_home().join("logs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_config() -> Config {
        Config {
            identity: IdentityConfig {
                region: "ap-south-1".to_string(),
                user_pool_id: "ap-south-1_Test1234".to_string(),
                client_id: "client-abc".to_string(),
                oauth_domain: "finq.auth.ap-south-1.amazoncognito.com".to_string(),
                redirect_sign_in: "http://localhost:3000/".to_string(),
                redirect_sign_out: "http://localhost:3000/login".to_string(),
                base_url: None,
            },
            api: ApiConfig {
                base_url: "https://gateway.example.com/dev".to_string(),
            },
        }
    }

    /// Test: a complete config validates; a blank value names the field.
    #[test]
    fn test_validate_required_values() {
        assert!(complete_config().validate().is_ok());

        let mut missing = complete_config();
        missing.identity.user_pool_id = String::new();
        let err = missing.validate().unwrap_err().to_string();
        assert!(err.contains("identity.user_pool_id"), "{err}");
        assert!(err.contains("FINQ_USER_POOL_ID"), "{err}");
    }

    /// Test: identity endpoint derives from the region, override wins.
    #[test]
    fn test_identity_endpoint() {
        let mut config = complete_config();
        assert_eq!(
            config.identity.endpoint(),
            "https://cognito-idp.ap-south-1.amazonaws.com/"
        );

        config.identity.base_url = Some("http://localhost:9229".to_string());
        assert_eq!(config.identity.endpoint(), "http://localhost:9229");
    }

    /// Test: a malformed api.base_url is rejected.
    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = complete_config();
        config.api.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    /// Test: the embedded template parses and merge preserves user values.
    #[test]
    fn test_merge_with_template() {
        let user = r#"
[identity]
region = "eu-west-1"
"#;
        let merged = merge_with_template(user).unwrap();
        assert!(merged.contains("region = \"eu-west-1\""));
        // Template-only keys survive the merge.
        assert!(merged.contains("base_url"));
    }
}
