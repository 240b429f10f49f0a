//! Terminal screens and console rendering.

pub mod error;
pub mod recording;
pub mod report;

pub use error::ErrorScreen;
pub use recording::{RecordingCommand, RecordingScreen};
pub use report::render_report;
