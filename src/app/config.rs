use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{
    APP_NAME, DEFAULT_GENERATE_URL, ENV_PREFIX, HTTP_REQUEST_TIMEOUT_SECS, LOCAL_CONFIG_PATH,
    UI_REFRESH_INTERVAL_MS,
};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Generation endpoint
    #[serde(default)]
    pub endpoint: EndpointConfig,

    /// Where chats are stored
    #[serde(default)]
    pub storage: StorageConfig,

    /// UI configuration
    #[serde(default)]
    pub ui: UIConfig,
}

/// Generation endpoint settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// URL the history is POSTed to
    pub url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_GENERATE_URL.to_string(),
            timeout_secs: HTTP_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl EndpointConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Storage settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the stored chats; platform data dir when unset
    pub data_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Directory to store chats in
    pub fn resolve_data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => get_data_dir(),
        }
    }
}

/// UI configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UIConfig {
    /// Show the session history sidebar by default
    pub show_history: bool,
    /// Event loop tick in milliseconds
    pub tick_ms: u64,
}

impl Default for UIConfig {
    fn default() -> Self {
        Self {
            show_history: true,
            tick_ms: UI_REFRESH_INTERVAL_MS,
        }
    }
}

fn base_figment() -> Figment {
    Figment::from(Serialized::defaults(Config::default()))
}

fn with_env(figment: Figment) -> Figment {
    // PARLEY_ENDPOINT__URL -> endpoint.url; bare PARLEY_ENDPOINT belongs to the CLI
    figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["endpoint"]).split("__"))
}

/// Load configuration from multiple sources
pub fn load_config() -> Result<Config> {
    let global_config = get_config_dir()?.join("config.toml");
    let local_config = PathBuf::from(LOCAL_CONFIG_PATH);

    let mut figment = base_figment();

    // Add global config if it exists
    if global_config.exists() {
        figment = figment.merge(Toml::file(&global_config));
    }

    // Add local config if it exists
    if local_config.exists() {
        figment = figment.merge(Toml::file(&local_config));
    }

    with_env(figment)
        .extract()
        .context("Failed to load configuration")
}

/// Load configuration from an explicit file, still honoring env overrides
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        anyhow::bail!("Config file not found: {}", path.display());
    }
    with_env(base_figment().merge(Toml::file(path)))
        .extract()
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", APP_NAME)
}

fn home_fallback(sub: &str) -> Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .context("Could not determine home directory")?;
    Ok(PathBuf::from(home).join(sub).join(APP_NAME))
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = match project_dirs() {
        Some(dirs) => dirs.config_dir().to_path_buf(),
        None => home_fallback(".config")?,
    };
    std::fs::create_dir_all(&config_dir)?;
    Ok(config_dir)
}

/// Get the default directory for stored chats
pub fn get_data_dir() -> Result<PathBuf> {
    match project_dirs() {
        Some(dirs) => Ok(dirs.data_dir().to_path_buf()),
        None => home_fallback(".local/share"),
    }
}

/// Save configuration to file
pub fn save_config(config: &Config, path: Option<PathBuf>) -> Result<()> {
    let path = match path {
        Some(p) => p,
        None => get_config_dir()?.join("config.toml"),
    };

    let toml_string = toml::to_string_pretty(config)?;
    std::fs::write(&path, toml_string)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    Ok(())
}

/// Create a default configuration file if it doesn't exist
pub fn init_config() -> Result<PathBuf> {
    let config_file = get_config_dir()?.join("config.toml");

    if !config_file.exists() {
        save_config(&Config::default(), Some(config_file.clone()))?;
        println!("Created default configuration at: {}", config_file.display());
    } else {
        println!("Configuration already exists at: {}", config_file.display());
    }

    Ok(config_file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config: Config = base_figment().extract().unwrap();
        assert_eq!(config.endpoint.url, "http://127.0.0.1:5000/api/generate");
        assert_eq!(config.endpoint.timeout(), Duration::from_secs(600));
        assert_eq!(config.storage.data_dir, None);
        assert!(config.ui.show_history);
    }

    #[test]
    fn test_partial_toml_overrides() {
        let config: Config = base_figment()
            .merge(Toml::string(
                r#"
                [endpoint]
                url = "http://gen.internal:8080/api/generate"

                [storage]
                data_dir = "/tmp/parley-chats"
                "#,
            ))
            .extract()
            .unwrap();

        assert_eq!(config.endpoint.url, "http://gen.internal:8080/api/generate");
        assert_eq!(config.endpoint.timeout_secs, 600);
        assert_eq!(
            config.storage.data_dir,
            Some(PathBuf::from("/tmp/parley-chats"))
        );
    }

    #[test]
    fn test_save_then_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let mut config = Config::default();
        config.endpoint.timeout_secs = 30;
        config.ui.show_history = false;

        save_config(&config, Some(path.clone())).unwrap();
        assert_eq!(load_config_from(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        assert!(load_config_from(&temp_dir.path().join("nope.toml")).is_err());
    }
}
