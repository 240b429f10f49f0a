//! Command handlers for the intervox CLI.

pub mod auth;
pub mod config;
pub mod history;
pub mod interview;
pub mod list_devices;
pub mod logs;
pub mod report;

pub use auth::handle_auth;
pub use config::handle_config;
pub use history::handle_history;
pub use interview::handle_interview;
pub use list_devices::handle_list_devices;
pub use logs::handle_logs;
pub use report::handle_report;
