//! Fetch and render the evaluation report for a session.

use cliclack::spinner;

use crate::api::InterviewClient;
use crate::archive::ReportArchive;
use crate::config::{self, IntervoxConfig};

/// Fetches the report for a session id and archives it locally.
///
/// # Errors
/// - If configuration cannot be loaded
/// - If the report call fails
pub async fn handle_report(session_id: String) -> anyhow::Result<()> {
    tracing::info!("=== intervox report ===");

    let config_data = IntervoxConfig::load()?;
    let token = config::get_token().ok().flatten();
    let client = InterviewClient::new(config_data.server.base_url, token);

    let fetching = spinner();
    fetching.start("Fetching the evaluation report...");
    let report = match client.report(&session_id).await {
        Ok(report) => {
            fetching.stop("Report ready.");
            report
        }
        Err(e) => {
            fetching.error("Could not fetch the report.");
            return Err(e);
        }
    };

    crate::ui::render_report(&report, None);

    let mut archive = ReportArchive::new(&config::data_dir()?)?;
    if let Err(e) = archive.save(&session_id, None, &report, &[]) {
        tracing::warn!("Failed to archive report: {e}");
    }

    Ok(())
}
