//! Configuration management for Skybridge
//!
//! Credentials are never hardcoded: every secret comes from the config
//! file, either inline or through a `*_file` indirection pointing at a
//! file holding just the secret.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub bluesky: BlueskyConfig,
    pub x: XConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

/// Source side: the account we log in as, and the account we watch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlueskyConfig {
    pub handle: String,
    pub app_password: Option<String>,
    pub app_password_file: Option<String>,
    pub target_account: String,
}

impl BlueskyConfig {
    /// Resolve the app password, inline value taking precedence.
    pub fn app_password(&self) -> Result<String> {
        resolve_secret(
            self.app_password.as_deref(),
            self.app_password_file.as_deref(),
            "bluesky.app_password",
        )
    }
}

/// Sink side: four-part OAuth 1.0a user-context credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XConfig {
    pub api_key: Option<String>,
    pub api_key_file: Option<String>,
    pub api_key_secret: Option<String>,
    pub api_key_secret_file: Option<String>,
    pub access_token: Option<String>,
    pub access_token_file: Option<String>,
    pub access_token_secret: Option<String>,
    pub access_token_secret_file: Option<String>,
}

impl XConfig {
    pub fn api_key(&self) -> Result<String> {
        resolve_secret(self.api_key.as_deref(), self.api_key_file.as_deref(), "x.api_key")
    }

    pub fn api_key_secret(&self) -> Result<String> {
        resolve_secret(
            self.api_key_secret.as_deref(),
            self.api_key_secret_file.as_deref(),
            "x.api_key_secret",
        )
    }

    pub fn access_token(&self) -> Result<String> {
        resolve_secret(
            self.access_token.as_deref(),
            self.access_token_file.as_deref(),
            "x.access_token",
        )
    }

    pub fn access_token_secret(&self) -> Result<String> {
        resolve_secret(
            self.access_token_secret.as_deref(),
            self.access_token_secret_file.as_deref(),
            "x.access_token_secret",
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_poll_interval")]
    pub interval_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_poll_interval(),
        }
    }
}

fn default_poll_interval() -> u64 {
    120
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_enabled")]
    pub enabled: bool,
    #[serde(default = "default_http_bind")]
    pub bind: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: default_http_enabled(),
            bind: default_http_bind(),
        }
    }
}

fn default_http_enabled() -> bool {
    true
}

fn default_http_bind() -> String {
    "127.0.0.1:8080".to_string()
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }
}

/// Read a secret from an inline value or a file holding just the secret.
fn resolve_secret(inline: Option<&str>, file: Option<&str>, field: &str) -> Result<String> {
    if let Some(value) = inline {
        if !value.trim().is_empty() {
            return Ok(value.trim().to_string());
        }
    }

    if let Some(path) = file {
        let expanded = shellexpand::tilde(path).to_string();
        let value = std::fs::read_to_string(&expanded)
            .map_err(ConfigError::ReadError)?
            .trim()
            .to_string();
        if value.is_empty() {
            return Err(ConfigError::MissingField(format!("{} (file is empty)", field)).into());
        }
        return Ok(value);
    }

    Err(ConfigError::MissingField(field.to_string()).into())
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("SKYBRIDGE_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("skybridge").join("config.toml"))
}

/// Mask a secret for log and status output: the first four characters
/// followed by a fixed-length filler, so lengths leak nothing either.
pub fn mask_secret(value: &str) -> String {
    let prefix: String = value.chars().take(4).collect();
    format!("{}********", prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    const MINIMAL_CONFIG: &str = r#"
[database]
path = "/tmp/skybridge-test/seen.db"

[bluesky]
handle = "mirror-bot.bsky.social"
app_password = "abcd-efgh-ijkl-mnop"
target_account = "someone.bsky.social"

[x]
api_key = "key"
api_key_secret = "key-secret"
access_token = "token"
access_token_secret = "token-secret"
"#;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_minimal_config_with_defaults() {
        let file = write_config(MINIMAL_CONFIG);
        let config = Config::load_from_path(&file.path().to_path_buf()).unwrap();

        assert_eq!(config.bluesky.target_account, "someone.bsky.social");
        assert_eq!(config.bluesky.app_password().unwrap(), "abcd-efgh-ijkl-mnop");
        assert_eq!(config.x.api_key().unwrap(), "key");
        assert_eq!(config.poll.interval_secs, 120);
        assert!(config.http.enabled);
        assert_eq!(config.http.bind, "127.0.0.1:8080");
    }

    #[test]
    fn test_poll_interval_override() {
        let content = format!("{}\n[poll]\ninterval_secs = 1200\n", MINIMAL_CONFIG);
        let file = write_config(&content);
        let config = Config::load_from_path(&file.path().to_path_buf()).unwrap();
        assert_eq!(config.poll.interval_secs, 1200);
    }

    #[test]
    fn test_secret_from_file() {
        let dir = TempDir::new().unwrap();
        let secret_path = dir.path().join("bsky.pass");
        std::fs::write(&secret_path, "file-password\n").unwrap();

        let config = BlueskyConfig {
            handle: "bot.bsky.social".to_string(),
            app_password: None,
            app_password_file: Some(secret_path.to_str().unwrap().to_string()),
            target_account: "someone.bsky.social".to_string(),
        };

        assert_eq!(config.app_password().unwrap(), "file-password");
    }

    #[test]
    fn test_inline_secret_takes_precedence() {
        let dir = TempDir::new().unwrap();
        let secret_path = dir.path().join("bsky.pass");
        std::fs::write(&secret_path, "from-file").unwrap();

        let config = BlueskyConfig {
            handle: "bot.bsky.social".to_string(),
            app_password: Some("inline".to_string()),
            app_password_file: Some(secret_path.to_str().unwrap().to_string()),
            target_account: "someone.bsky.social".to_string(),
        };

        assert_eq!(config.app_password().unwrap(), "inline");
    }

    #[test]
    fn test_missing_secret_is_config_error() {
        let config = XConfig {
            api_key: None,
            api_key_file: None,
            api_key_secret: None,
            api_key_secret_file: None,
            access_token: None,
            access_token_file: None,
            access_token_secret: None,
            access_token_secret_file: None,
        };

        let err = config.api_key().unwrap_err();
        assert!(err.to_string().contains("x.api_key"));
    }

    #[test]
    fn test_empty_secret_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let secret_path = dir.path().join("empty.token");
        std::fs::write(&secret_path, "   \n").unwrap();

        let config = BlueskyConfig {
            handle: "bot.bsky.social".to_string(),
            app_password: None,
            app_password_file: Some(secret_path.to_str().unwrap().to_string()),
            target_account: "someone.bsky.social".to_string(),
        };

        assert!(config.app_password().is_err());
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let file = write_config("this is not toml [");
        let result = Config::load_from_path(&file.path().to_path_buf());
        assert!(result.is_err());
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("abcd-efgh-ijkl"), "abcd********");
        assert_eq!(mask_secret("ab"), "ab********");
        assert_eq!(mask_secret(""), "********");
    }
}
