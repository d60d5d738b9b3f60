use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::{
    fs::{create_dir_all, read_to_string, OpenOptions},
    io::AsyncWriteExt,
};

/// Errors that can occur while loading application configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No home directory could be resolved for the current user.
    #[error("failed to obtain user's directories")]
    DirectoriesNotFound,
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to deserialize config: {0}")]
    Deserialize(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base that relative resource paths are resolved against.
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4000".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Endpoint handing out upload destinations.
    pub resource_path: String,
    pub title: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            resource_path: "/api/products/import".to_string(),
            title: "Import Products CSV".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub auto_hide_ms: u64,
    /// Toast failed transfers too, not just failed destination requests.
    pub notify_transfer_errors: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            auto_hide_ms: 3000,
            notify_transfer_errors: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub dark_mode: bool,
    /// `#rrggbb` or `#rgb`.
    pub accent: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            dark_mode: true,
            accent: "#A159E1".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DevConfig {
    /// Serve the import endpoints from a local mock in debug builds.
    pub mock_backend: bool,
}

impl Default for DevConfig {
    fn default() -> Self {
        Self { mock_backend: true }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub import: ImportConfig,
    pub notifications: NotificationConfig,
    pub theme: ThemeConfig,
    pub dev: DevConfig,
}

fn config_path() -> Result<PathBuf, ConfigError> {
    match ProjectDirs::from("dev", "shop-admin", "product-import-admin") {
        Some(dirs) => Ok(dirs.config_dir().join("config.toml")),
        None => Err(ConfigError::DirectoriesNotFound),
    }
}

/// Loads `config.toml` from the user's config directory, writing the defaults on first run.
pub async fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path()?).await
}

pub async fn load_config_from(config_path: &Path) -> Result<Config, ConfigError> {
    log::info!("Loading configuration from {config_path:?}");
    if config_path.exists() {
        let contents = read_to_string(config_path).await?;
        return Ok(toml::from_str(&contents)?);
    }

    let config = Config::default();
    if let Some(parent) = config_path.parent() {
        create_dir_all(parent).await?;
    }

    let contents = toml::to_string_pretty(&config)?;
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(config_path)
        .await?;
    file.write_all(contents.as_bytes()).await?;
    file.sync_all().await?;

    Ok(config)
}
