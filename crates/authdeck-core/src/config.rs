//! Configuration management.
//!
//! Loads configuration from `${AUTHDECK_HOME:-~/.authdeck}/config.toml` with
//! sensible defaults, then applies environment overrides. CLI flags override
//! both (applied by the CLI crate after load).

use std::fs;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::auth::IdentityOptions;
use crate::auth::client::{DEFAULT_BASE_URL, DEFAULT_SECURE_TOKEN_URL};
use crate::google::GoogleOptions;

/// Google OAuth client settings for the federated flow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    /// OAuth client ID for the installed-app flow.
    pub client_id: String,
    /// Optional client secret (installed-app secrets are not confidential).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Identity Toolkit web API key.
    pub api_key: String,
    /// Identity Toolkit endpoint.
    pub base_url: String,
    /// Secure-token endpoint for refresh exchanges.
    pub secure_token_url: String,
    pub google: GoogleConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            secure_token_url: DEFAULT_SECURE_TOKEN_URL.to_string(),
            google: GoogleConfig::default(),
        }
    }
}

impl Config {
    /// Loads config from disk (defaults if absent) and applies env overrides.
    pub fn load() -> Result<Self> {
        let path = paths::config_path();
        let mut config = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            Self::from_toml(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Invalid config TOML")
    }

    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("AUTHDECK_API_KEY") {
            self.api_key = key;
        }
        if let Ok(url) = std::env::var("AUTHDECK_BASE_URL") {
            self.base_url = url;
        }
        if let Ok(url) = std::env::var("AUTHDECK_SECURE_TOKEN_URL") {
            self.secure_token_url = url;
        }
        if let Ok(id) = std::env::var("AUTHDECK_GOOGLE_CLIENT_ID") {
            self.google.client_id = id;
        }
        if let Ok(secret) = std::env::var("AUTHDECK_GOOGLE_CLIENT_SECRET") {
            self.google.client_secret = Some(secret);
        }
    }

    /// Points both identity endpoints at a local emulator (`host:port`).
    pub fn use_emulator(&mut self, host: &str) {
        self.base_url = format!("http://{host}/identitytoolkit.googleapis.com");
        self.secure_token_url = format!("http://{host}/securetoken.googleapis.com");
    }

    pub fn identity_options(&self) -> IdentityOptions {
        IdentityOptions {
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
            secure_token_url: self.secure_token_url.clone(),
        }
    }

    pub fn google_options(&self) -> GoogleOptions {
        GoogleOptions::new(
            self.google.client_id.clone(),
            self.google.client_secret.clone(),
        )
    }
}

/// Well-known paths under the app home directory.
pub mod paths {
    use std::path::PathBuf;

    /// Returns the user's home directory.
    pub fn home_dir() -> Option<PathBuf> {
        #[cfg(unix)]
        {
            std::env::var_os("HOME").map(PathBuf::from)
        }
        #[cfg(not(unix))]
        {
            std::env::var_os("USERPROFILE").map(PathBuf::from)
        }
    }

    /// App home: `$AUTHDECK_HOME` or `~/.authdeck`.
    pub fn authdeck_home() -> PathBuf {
        if let Some(home) = std::env::var_os("AUTHDECK_HOME") {
            return PathBuf::from(home);
        }
        home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".authdeck")
    }

    pub fn config_path() -> PathBuf {
        authdeck_home().join("config.toml")
    }

    pub fn log_dir() -> PathBuf {
        authdeck_home().join("logs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_target_production_endpoints() {
        let config = Config::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.secure_token_url, DEFAULT_SECURE_TOKEN_URL);
        assert!(config.api_key.is_empty());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = Config::from_toml(
            r#"
            api_key = "k1"

            [google]
            client_id = "cid"
            "#,
        )
        .expect("parse");
        assert_eq!(config.api_key, "k1");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.google.client_id, "cid");
        assert!(config.google.client_secret.is_none());
    }

    #[test]
    fn test_emulator_rewrites_both_endpoints() {
        let mut config = Config::default();
        config.use_emulator("localhost:9099");
        assert_eq!(
            config.base_url,
            "http://localhost:9099/identitytoolkit.googleapis.com"
        );
        assert_eq!(
            config.secure_token_url,
            "http://localhost:9099/securetoken.googleapis.com"
        );
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(Config::from_toml("api_key = [").is_err());
    }
}
