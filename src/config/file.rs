//! Configuration file management for intervox.
//!
//! Loads and saves application configuration from a TOML file in the user's
//! config directory.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Interview service connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the interview scoring service, e.g. `http://host:8000/api`
    pub base_url: String,
}

/// Audio capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Audio device to use. Options:
    /// - "default" for system default device
    /// - numeric index (0, 1, 2, etc.) from `intervox list-devices`
    /// - device name from `intervox list-devices`
    pub device: String,
    /// Recording sample rate in Hz (16000 recommended for speech)
    pub sample_rate: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: "default".to_string(),
            sample_rate: 16_000,
        }
    }
}

/// Interview defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InterviewConfig {
    /// Candidate name sent with interview start; empty means ask each time.
    #[serde(default)]
    pub candidate_name: String,
}

impl InterviewConfig {
    pub fn candidate_name(&self) -> Option<&str> {
        let trimmed = self.candidate_name.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntervoxConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub interview: InterviewConfig,
}

impl IntervoxConfig {
    /// Loads configuration from the user's config directory.
    ///
    /// # Errors
    /// - If the config directory cannot be determined
    /// - If the config file cannot be read
    /// - If the TOML is malformed
    pub fn load() -> anyhow::Result<Self> {
        let config_path = get_config_path()?;
        let config_content = fs::read_to_string(&config_path)?;
        let config: IntervoxConfig = toml::from_str(&config_content)?;
        Ok(config)
    }

    /// Saves configuration to the user's config directory.
    ///
    /// # Errors
    /// - If the config directory cannot be determined or created
    /// - If the file cannot be written
    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = get_config_path()?;
        let config_content = toml::to_string_pretty(self)?;
        fs::write(&config_path, config_content)?;
        tracing::info!("Configuration saved");
        Ok(())
    }
}

/// Retrieves the path to the config file, creating the directory if needed.
///
/// # Errors
/// - If the home directory cannot be determined
/// - If the config directory cannot be created
pub fn get_config_path() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
    let config_path = home.join(".config").join("intervox").join("intervox.toml");

    std::fs::create_dir_all(config_path.parent().unwrap())?;

    Ok(config_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_config_with_defaults() {
        let config: IntervoxConfig = toml::from_str(
            r#"
            [server]
            base_url = "http://localhost:8000/api"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.base_url, "http://localhost:8000/api");
        assert_eq!(config.audio.device, "default");
        assert_eq!(config.audio.sample_rate, 16_000);
        assert!(config.interview.candidate_name().is_none());
    }

    #[test]
    fn blank_candidate_name_reads_as_unset() {
        let interview = InterviewConfig {
            candidate_name: "   ".to_string(),
        };
        assert!(interview.candidate_name().is_none());

        let interview = InterviewConfig {
            candidate_name: "Dana Levi".to_string(),
        };
        assert_eq!(interview.candidate_name(), Some("Dana Levi"));
    }

    #[test]
    fn embedded_default_config_parses() {
        let config: IntervoxConfig =
            toml::from_str(include_str!("../../environments/intervox.toml")).unwrap();
        assert!(!config.server.base_url.is_empty());
    }
}
