//! Configuration loading from TOML files

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use vulnex_tenable::ExportSettings;

/// Global configuration for vulnex
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub export: ExportConfig,
    pub output: OutputConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(deserialize_with = "deserialize_env_var")]
    pub access_key: Option<String>,
    #[serde(deserialize_with = "deserialize_env_var")]
    pub secret_key: Option<String>,
    pub verify_ssl: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            // Both spellings seen in the wild
            base_url: std::env::var("TENABLE_BASE_URL")
                .or_else(|_| std::env::var("TENABLE_API_URL"))
                .unwrap_or_else(|_| "https://cloud.tenable.com".to_string()),
            access_key: std::env::var("TENABLE_ACCESS_KEY").ok(),
            secret_key: std::env::var("TENABLE_SECRET_KEY").ok(),
            verify_ssl: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub poll_interval_secs: u64,
    pub max_poll_attempts: u32,
    pub vm_num_assets: u32,
    pub vm_include_unlicensed: bool,
    pub was_num_assets: u32,
    pub was_include_unlicensed: bool,
    pub assets_chunk_size: u32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        let d = ExportSettings::default();
        Self {
            poll_interval_secs: d.poll_interval.as_secs(),
            max_poll_attempts: d.max_poll_attempts,
            vm_num_assets: d.vm_num_assets,
            vm_include_unlicensed: d.vm_include_unlicensed,
            was_num_assets: d.was_num_assets,
            was_include_unlicensed: d.was_include_unlicensed,
            assets_chunk_size: d.assets_chunk_size,
        }
    }
}

impl ExportConfig {
    pub fn to_settings(self) -> ExportSettings {
        ExportSettings {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            max_poll_attempts: self.max_poll_attempts,
            vm_num_assets: self.vm_num_assets,
            vm_include_unlicensed: self.vm_include_unlicensed,
            was_num_assets: self.was_num_assets,
            was_include_unlicensed: self.was_include_unlicensed,
            assets_chunk_size: self.assets_chunk_size,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub default_dir: PathBuf,
    pub compression_level: i32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_dir: PathBuf::from("."),
            compression_level: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub read_timeout: u64,
    pub max_retries: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            read_timeout: 30,
            max_retries: 5,
        }
    }
}

/// Deserialize a string that may contain environment variable reference like ${VAR}
fn deserialize_env_var<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| expand_env_var(&s)))
}

/// Expand ${VAR} to environment variable value
fn expand_env_var(s: &str) -> Option<String> {
    if let Some(var_name) = s.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        std::env::var(var_name).ok()
    } else {
        Some(s.to_string())
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./vulnex.toml (current directory)
    /// 2. ~/.config/vulnex/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        // Try current directory first
        let local_config = PathBuf::from("vulnex.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        // Try user config directory
        if let Some(config_dir) = directories::ProjectDirs::from("", "", "vulnex") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        // Return defaults if no config found
        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.output.default_dir, PathBuf::from("."));
        assert_eq!(config.output.compression_level, 3);
        assert_eq!(config.export.poll_interval_secs, 5);
        assert_eq!(config.export.max_poll_attempts, 360);
        assert!(config.api.base_url.starts_with("https://"));
    }

    #[test]
    fn expand_env_var_simple() {
        std::env::set_var("TEST_VULNEX_VAR", "test_value");
        assert_eq!(
            expand_env_var("${TEST_VULNEX_VAR}"),
            Some("test_value".to_string())
        );
        std::env::remove_var("TEST_VULNEX_VAR");
    }

    #[test]
    fn expand_env_var_literal() {
        assert_eq!(expand_env_var("literal"), Some("literal".to_string()));
    }

    #[test]
    fn expand_env_var_missing() {
        assert_eq!(expand_env_var("${NONEXISTENT_VAR_12345}"), None);
    }

    #[test]
    fn parse_config_toml() {
        let toml = r#"
[api]
base_url = "https://eu.cloud.tenable.com"
access_key = "ak"
secret_key = "sk"
verify_ssl = false

[export]
poll_interval_secs = 2
max_poll_attempts = 10
was_num_assets = 25

[output]
default_dir = "/tmp/exports"
compression_level = 5
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.api.base_url, "https://eu.cloud.tenable.com");
        assert_eq!(config.api.access_key.as_deref(), Some("ak"));
        assert!(!config.api.verify_ssl);
        assert_eq!(config.export.poll_interval_secs, 2);
        assert_eq!(config.export.max_poll_attempts, 10);
        assert_eq!(config.export.was_num_assets, 25);
        // untouched sections keep defaults
        assert_eq!(config.export.vm_num_assets, 200);
        assert_eq!(config.output.default_dir, PathBuf::from("/tmp/exports"));
        assert_eq!(config.output.compression_level, 5);
        assert_eq!(config.http.max_retries, 5);
    }

    #[test]
    fn to_settings_carries_overrides() {
        let export = ExportConfig {
            poll_interval_secs: 1,
            max_poll_attempts: 3,
            ..Default::default()
        };
        let settings = export.to_settings();
        assert_eq!(settings.poll_interval, Duration::from_secs(1));
        assert_eq!(settings.max_poll_attempts, 3);
    }
}
