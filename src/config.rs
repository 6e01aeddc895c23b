use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "dayassist";
pub const DATA_DIR_ENV: &str = "DAYASSIST_DATA_DIR";

pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1/models";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("~/.local/share"))
        .join(APP_NAME)
}

fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}

fn default_model() -> String {
    DEFAULT_MODEL.into()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_output_tokens() -> u32 {
    1024
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_directory: PathBuf,
    pub api_url: String,
    pub model: String,
    pub temperature: f64,
    pub max_output_tokens: u32,
    pub debug_logging: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_directory: default_data_dir(),
            api_url: default_api_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            debug_logging: false,
        }
    }
}

impl AppConfig {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join(APP_NAME)
            .join("config.json")
    }

    /// Load from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let mut config = Self::load_from(&Self::config_path());
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            if !dir.trim().is_empty() {
                config.data_directory = PathBuf::from(dir);
            }
        }
        config
    }

    /// A missing file gives defaults silently; an unreadable one is logged.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                log::warn!("Ignoring invalid config {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}
