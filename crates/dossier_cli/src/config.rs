//! Configuration file support for dossier.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `DOSSIER_`, e.g., `DOSSIER_DATABASE_URL`),
//!    including those loaded from a `.env` file
//! 3. Local config file (./dossier.toml)
//! 4. User config file (~/.config/dossier/config.toml)
//! 5. Built-in defaults
//!
//! `GITHUB_TOKEN` is used when no token is configured any other way.
//!
//! Example config file:
//! ```toml
//! [database]
//! url = "sqlite://~/.local/state/dossier/dossier.db?mode=rwc"  # optional, this is the default
//!
//! [github]
//! token = "ghp_..."  # or DOSSIER_GITHUB_TOKEN / GITHUB_TOKEN
//! requests_per_second = 10
//! max_retries = 3
//! max_rate_limit_wait_secs = 900
//!
//! [sync]
//! batch_size = 5
//! batch_delay_secs = 2
//! include_docs = true
//!
//! [server]
//! host = "127.0.0.1"
//! port = 8000
//! ```

use std::path::PathBuf;
use std::time::Duration;
use std::{fs, io};

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use dossier::github::{ClientOptions, DEFAULT_API_URL, DEFAULT_MAX_RATE_LIMIT_WAIT, GITHUB_DEFAULT_RPS};
use dossier::ingest::batch::{DEFAULT_BATCH_DELAY, DEFAULT_BATCH_SIZE};
use dossier::retry::{DEFAULT_MAX_RETRIES, RetryConfig};
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "dossier";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub github: GitHubConfig,
    /// Defaults for batch syncs.
    pub sync: SyncConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Supports sqlite:// and postgres:// schemes.
    pub url: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub token: Option<String>,
    pub api_url: String,
    /// Proactive throttle; 0 disables it.
    pub requests_per_second: u32,
    pub max_retries: usize,
    pub max_rate_limit_wait_secs: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: DEFAULT_API_URL.to_string(),
            requests_per_second: GITHUB_DEFAULT_RPS,
            max_retries: DEFAULT_MAX_RETRIES,
            max_rate_limit_wait_secs: DEFAULT_MAX_RATE_LIMIT_WAIT.as_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncConfig {
    pub batch_size: usize,
    pub batch_delay_secs: u64,
    pub include_docs: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay_secs: DEFAULT_BATCH_DELAY.as_secs(),
            include_docs: true,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. Built-in defaults
    /// 2. XDG config file (~/.config/dossier/config.toml)
    /// 3. Local config file (./dossier.toml)
    /// 4. Environment variables with DOSSIER_ prefix
    ///
    /// The caller loads `.env` beforehand so its variables take part in step 4.
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        if let Some(xdg_config) = Self::default_config_path()
            && xdg_config.exists()
        {
            tracing::debug!("Loading config from {:?}", xdg_config);
            builder = builder.add_source(
                File::from(xdg_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        let local_config = PathBuf::from("dossier.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./dossier.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // DOSSIER_DATABASE_URL -> database.url
        builder = builder.add_source(
            Environment::with_prefix("DOSSIER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let mut config = match builder.build() {
            Ok(settings) => match settings.try_deserialize::<Config>() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to deserialize config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to build config: {}", e);
                Config::default()
            }
        };
        config.apply_flat_env(|key| std::env::var(key).ok());
        config
    }

    /// Single-underscore variables the nested `__` separator cannot express,
    /// plus the `GITHUB_TOKEN` fallback.
    fn apply_flat_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("DOSSIER_DATABASE_URL") {
            self.database.url = Some(url);
        }
        if let Some(token) = var("DOSSIER_GITHUB_TOKEN") {
            self.github.token = Some(token);
        }
        if self.github.token.as_deref().is_none_or(|t| t.trim().is_empty()) {
            self.github.token = var("GITHUB_TOKEN").filter(|t| !t.trim().is_empty());
        }
    }

    /// Get the database URL, falling back to the default state directory path.
    ///
    /// The `mode=rwc` parameter creates the file if it doesn't exist.
    pub fn database_url(&self) -> Option<String> {
        self.database.url.clone().or_else(|| {
            Self::default_state_dir().map(|state_dir| {
                let db_path = state_dir.join("dossier.db");
                format!("sqlite://{}?mode=rwc", db_path.display())
            })
        })
    }

    pub fn github_token(&self) -> Option<String> {
        self.github.token.clone()
    }

    /// Client options built from the `[github]` section.
    pub fn client_options(&self) -> ClientOptions {
        let retry = RetryConfig {
            max_retries: self.github.max_retries,
            ..RetryConfig::default()
        };
        ClientOptions {
            requests_per_second: Some(self.github.requests_per_second).filter(|rps| *rps > 0),
            max_rate_limit_wait: Duration::from_secs(self.github.max_rate_limit_wait_secs),
            ..ClientOptions::default()
        }
        .with_token(self.github_token())
        .with_api_url(self.github.api_url.clone())
        .with_retry(retry)
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_secs(self.sync.batch_delay_secs)
    }

    /// Render for `config show`, with the token masked.
    pub fn to_display_toml(&self) -> Result<String, toml_edit::ser::Error> {
        let mut shown = toml_edit::ser::to_document(self)?;
        if let Some(token) = self.github.token.as_deref() {
            shown["github"]["token"] = toml_edit::value(mask_token(token));
        }
        shown["database"]["url"] = toml_edit::value(self.database_url().unwrap_or_default());
        Ok(shown.to_string())
    }

    /// Get the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get the default state directory path.
    ///
    /// On Linux, this is `$XDG_STATE_HOME/dossier` or `~/.local/state/dossier`.
    /// On macOS/Windows, falls back to the data directory.
    pub fn default_state_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|dirs| {
            // state_dir() returns None on macOS/Windows
            dirs.state_dir()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| dirs.data_dir().to_path_buf())
        })
    }

    /// Save a GitHub token to the user config file.
    ///
    /// Creates the config file and parent directories if they don't exist.
    /// Only the `[github]` table is touched; formatting and comments elsewhere
    /// are preserved.
    pub fn save_github_token(token: &str) -> io::Result<PathBuf> {
        let config_path = Self::default_config_path().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                "Could not determine config directory",
            )
        })?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = if config_path.exists() {
            fs::read_to_string(&config_path)?
        } else {
            String::new()
        };
        fs::write(&config_path, set_github_token(&content, token)?)?;
        Ok(config_path)
    }
}

fn set_github_token(content: &str, token: &str) -> io::Result<String> {
    use toml_edit::{DocumentMut, value};

    let mut doc: DocumentMut = content.parse().map_err(|e| {
        io::Error::new(io::ErrorKind::InvalidData, format!("Invalid TOML: {}", e))
    })?;
    if !doc.contains_key("github") {
        doc["github"] = toml_edit::table();
    }
    doc["github"]["token"] = value(token);
    Ok(doc.to_string())
}

/// `ghp_abcdef123456` -> `ghp_…3456`.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_toml(toml_content: &str) -> Config {
        ConfigBuilder::builder()
            .add_source(config::File::from_str(toml_content, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.database.url.is_none());
        assert!(config.github.token.is_none());
        assert_eq!(config.github.api_url, DEFAULT_API_URL);
        assert_eq!(config.sync.batch_size, 5);
        assert_eq!(config.sync.batch_delay_secs, 2);
        assert!(config.sync.include_docs);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let config = from_toml(
            r#"
            [sync]
            batch_size = 10

            [server]
            port = 9000
        "#,
        );
        assert_eq!(config.sync.batch_size, 10);
        assert_eq!(config.sync.batch_delay_secs, 2);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_config_merging_order() {
        let settings = ConfigBuilder::builder()
            .add_source(config::File::from_str(
                "[github]\ntoken = \"base\"\nmax_retries = 5\n",
                FileFormat::Toml,
            ))
            .add_source(config::File::from_str(
                "[github]\ntoken = \"override\"\n",
                FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let config: Config = settings.try_deserialize().unwrap();
        assert_eq!(config.github.token.as_deref(), Some("override"));
        assert_eq!(config.github.max_retries, 5);
    }

    #[test]
    fn test_flat_env_and_github_token_fallback() {
        let env: HashMap<&str, &str> = [
            ("DOSSIER_DATABASE_URL", "sqlite::memory:"),
            ("GITHUB_TOKEN", "ghp_fallback"),
        ]
        .into();
        let mut config = Config::default();
        config.apply_flat_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.database.url.as_deref(), Some("sqlite::memory:"));
        assert_eq!(config.github.token.as_deref(), Some("ghp_fallback"));

        let env: HashMap<&str, &str> = [
            ("DOSSIER_GITHUB_TOKEN", "ghp_primary"),
            ("GITHUB_TOKEN", "ghp_fallback"),
        ]
        .into();
        let mut config = Config::default();
        config.apply_flat_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.github.token.as_deref(), Some("ghp_primary"));
    }

    #[test]
    fn test_client_options_from_config() {
        let config = from_toml(
            r#"
            [github]
            token = "ghp_x"
            requests_per_second = 0
            max_retries = 1
            max_rate_limit_wait_secs = 30
        "#,
        );
        let options = config.client_options();
        assert_eq!(options.token.as_deref(), Some("ghp_x"));
        assert_eq!(options.requests_per_second, None);
        assert_eq!(options.retry.max_retries, 1);
        assert_eq!(options.max_rate_limit_wait, Duration::from_secs(30));
    }

    #[test]
    fn test_database_url_defaults_to_state_dir() {
        let url = Config::default().database_url().unwrap();
        assert!(url.starts_with("sqlite://"));
        assert!(url.contains("dossier.db"));
        assert!(url.ends_with("?mode=rwc"));
    }

    #[test]
    fn test_set_github_token_preserves_other_tables() {
        let original = "# my settings\n[server]\nport = 9000 # custom\n";
        let updated = set_github_token(original, "ghp_new").unwrap();
        assert!(updated.contains("# my settings"));
        assert!(updated.contains("port = 9000 # custom"));
        assert!(updated.contains("[github]"));
        assert!(updated.contains("token = \"ghp_new\""));

        let replaced = set_github_token(&updated, "ghp_newer").unwrap();
        assert!(replaced.contains("ghp_newer"));
        assert!(!replaced.contains("ghp_new\""));
    }

    #[test]
    fn test_invalid_toml_is_rejected() {
        assert!(set_github_token("[github", "x").is_err());
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("ghp_abcdef123456"), "ghp_…3456");
        assert_eq!(mask_token("short"), "*****");
    }

    #[test]
    fn test_display_masks_token() {
        let mut config = Config::default();
        config.github.token = Some("ghp_abcdef123456".into());
        let shown = config.to_display_toml().unwrap();
        assert!(shown.contains("ghp_…3456"));
        assert!(!shown.contains("abcdef"));
    }
}
