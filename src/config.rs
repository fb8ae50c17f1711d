//! Configuration module for shelf.

use serde::Deserialize;
use std::path::Path;

use crate::{Result, ShelfError};

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Storage configuration: the confined root and classification policy.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Root directory all operations are confined to.
    #[serde(default = "default_root")]
    pub root: String,
    /// URL prefix used when referencing icon files in responses.
    #[serde(default = "default_icon_url")]
    pub icon_url: String,
    /// On-disk directory holding the per-extension icon files.
    #[serde(default = "default_icon_dir")]
    pub icon_dir: String,
    /// Extensions (with leading dot) allowed for upload and replace.
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
    /// Extensions (with leading dot) classified as images.
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,
    /// Maximum upload size in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
}

fn default_root() -> String {
    "data/files".to_string()
}

fn default_icon_url() -> String {
    "/static/fileicons/".to_string()
}

fn default_icon_dir() -> String {
    "static/fileicons".to_string()
}

fn default_allowed_extensions() -> Vec<String> {
    [
        ".ai", ".asx", ".avi", ".bmp", ".csv", ".dat", ".doc", ".docx", ".epub", ".fla", ".flv",
        ".gif", ".html", ".ico", ".jpeg", ".jpg", ".m4a", ".mobi", ".mov", ".mp3", ".mp4", ".mpa",
        ".mpg", ".mpp", ".pdf", ".png", ".pps", ".ppsx", ".ppt", ".pptx", ".ps", ".psd", ".qt",
        ".ra", ".ram", ".rar", ".rm", ".rtf", ".svg", ".swf", ".tif", ".txt", ".vcf", ".vsd",
        ".wav", ".wks", ".wma", ".wmv", ".wps", ".xls", ".xlsx", ".xml", ".zip",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_image_extensions() -> Vec<String> {
    [".jpg", ".png", ".jpeg", ".gif", ".bmp"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_max_upload_size() -> u64 {
    10
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            icon_url: default_icon_url(),
            icon_dir: default_icon_dir(),
            allowed_extensions: default_allowed_extensions(),
            image_extensions: default_image_extensions(),
            max_upload_size_mb: default_max_upload_size(),
        }
    }
}

impl StorageConfig {
    /// Maximum upload size in bytes.
    pub fn max_upload_size(&self) -> u64 {
        self.max_upload_size_mb * 1024 * 1024
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/shelf.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ShelfError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| ShelfError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `SHELF_ROOT`: Override the storage root directory
    pub fn apply_env_overrides(&mut self) {
        if let Ok(root) = std::env::var("SHELF_ROOT") {
            if !root.is_empty() {
                self.storage.root = root;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.storage.root.is_empty() {
            return Err(ShelfError::Config(
                "storage.root must not be empty".to_string(),
            ));
        }
        if self.storage.max_upload_size_mb == 0 {
            return Err(ShelfError::Config(
                "storage.max_upload_size_mb must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
