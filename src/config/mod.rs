//! Configuration management for intervox.
//!
//! Application settings live in a TOML file in the user's config directory;
//! the auth token is stored separately with restricted permissions in the
//! user's local data directory.

pub mod file;
pub mod secrets;

pub use file::{get_config_path, AudioConfig, IntervoxConfig, ServerConfig};
pub use secrets::{clear_token, data_dir, get_token, get_username, save_token};
