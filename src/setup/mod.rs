//! First-run setup.
//!
//! Writes the default configuration file when none exists or when the
//! installed version is newer than the one that wrote the config.

pub mod version;

use anyhow::anyhow;

/// Embedded default configuration template.
const DEFAULT_CONFIG: &str = include_str!("../../environments/intervox.toml");

/// Current application version from Cargo.toml
const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Writes the default config file with a version prefix.
///
/// # Errors
/// Returns an error if the config directory or file cannot be written.
pub fn run_setup() -> anyhow::Result<()> {
    let config_dir = dirs::home_dir()
        .ok_or_else(|| anyhow!("Could not determine home directory"))?
        .join(".config")
        .join("intervox");
    std::fs::create_dir_all(&config_dir)?;

    let config_path = config_dir.join("intervox.toml");
    let version_line = format!(r#"config_version = "{}""#, CURRENT_VERSION);
    let full_config = format!("{}\n{}", version_line, DEFAULT_CONFIG);
    std::fs::write(&config_path, full_config)?;

    tracing::info!("Default configuration written to {}", config_path.display());
    Ok(())
}
