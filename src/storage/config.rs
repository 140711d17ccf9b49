//! Editor configuration.
//!
//! Stored as TOML in the platform data directory. A missing file yields the
//! defaults; nothing is written until [`save_config`] is called.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::workouts::types::AthleteProfile;

/// Object storage bucket serving exported workout files.
pub const DEFAULT_FILES_BASE_URL: &str = "https://zwift-workout.s3-eu-west-1.amazonaws.com";

/// Endpoint issuing signed upload URLs.
pub const DEFAULT_UPLOAD_ENDPOINT: &str = "https://www.zwiftworkout.com/.netlify/functions/upload";

/// Editor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Application version
    pub version: String,
    /// SQLite workout store, under the data directory when relative
    pub database_path: PathBuf,
    /// Key-value session cache, under the data directory when relative
    pub session_path: PathBuf,
    /// Athlete defaults for new sessions
    pub athlete: AthleteDefaults,
    /// Remote storage settings
    pub remote: RemoteSettings,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            database_path: PathBuf::from("workouts.db"),
            session_path: PathBuf::from("session.json"),
            athlete: AthleteDefaults::default(),
            remote: RemoteSettings::default(),
        }
    }
}

impl EditorConfig {
    /// Check ranges of the athlete defaults.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !AthleteProfile::validate_ftp(self.athlete.ftp_watts) {
            return Err(ConfigError::InvalidValue(format!(
                "athlete.ftp_watts must be between 50 and 600, got {}",
                self.athlete.ftp_watts
            )));
        }
        if !AthleteProfile::validate_weight(self.athlete.weight_kg) {
            return Err(ConfigError::InvalidValue(format!(
                "athlete.weight_kg must be between 30 and 200, got {}",
                self.athlete.weight_kg
            )));
        }
        Ok(())
    }

    /// Athlete profile seeded from the configured defaults.
    pub fn athlete_profile(&self) -> AthleteProfile {
        AthleteProfile {
            ftp_watts: self.athlete.ftp_watts,
            weight_kg: self.athlete.weight_kg,
            ..AthleteProfile::default()
        }
    }

    /// Database location resolved against `data_dir`.
    pub fn database_path_in(&self, data_dir: &Path) -> PathBuf {
        resolve(data_dir, &self.database_path)
    }

    /// Session cache location resolved against `data_dir`.
    pub fn session_path_in(&self, data_dir: &Path) -> PathBuf {
        resolve(data_dir, &self.session_path)
    }
}

fn resolve(data_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        data_dir.join(path)
    }
}

/// Athlete values used until the user enters their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AthleteDefaults {
    /// Functional Threshold Power in watts (50-600)
    pub ftp_watts: u16,
    /// Weight in kilograms (30-200)
    pub weight_kg: f32,
}

impl Default for AthleteDefaults {
    fn default() -> Self {
        Self {
            ftp_watts: 200,
            weight_kg: 75.0,
        }
    }
}

/// Remote storage settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteSettings {
    /// Base URL workout files are fetched from (`{base}/{id}.zwo`)
    pub files_base_url: String,
    /// URL returning a signed upload location
    pub upload_endpoint: String,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            files_base_url: DEFAULT_FILES_BASE_URL.to_string(),
            upload_endpoint: DEFAULT_UPLOAD_ENDPOINT.to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Get the application data directory.
pub fn get_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "workout-editor", "WorkoutEditor")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the configuration file path.
pub fn get_config_path() -> PathBuf {
    get_data_dir().join("config.toml")
}

/// Load configuration from the default location.
pub fn load_config() -> Result<EditorConfig, ConfigError> {
    load_config_from(&get_config_path())
}

/// Load configuration from `path`, falling back to defaults when absent.
pub fn load_config_from(path: &Path) -> Result<EditorConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No config file, using defaults");
        return Ok(EditorConfig::default());
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

    let config: EditorConfig =
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    config.validate()?;

    Ok(config)
}

/// Save configuration to the default location.
pub fn save_config(config: &EditorConfig) -> Result<(), ConfigError> {
    save_config_to(config, &get_config_path())
}

/// Save configuration to `path`, creating its parent directory.
pub fn save_config_to(config: &EditorConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
    }

    let content =
        toml::to_string_pretty(config).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

    Ok(())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}
