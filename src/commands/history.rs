//! Browse archived interview reports.
//!
//! Lists the local archive, optionally pulling the server-side saved reports
//! first (`--sync`, bearer-authenticated) or rendering one stored report in
//! full (`--view`).

use console::style;

use crate::api::InterviewClient;
use crate::archive::ReportArchive;
use crate::config::{self, IntervoxConfig};

/// Shows the report archive.
///
/// # Errors
/// - If the archive cannot be opened
/// - If `--sync` or `--delete-remote` is requested and the server call fails
pub async fn handle_history(
    sync: bool,
    view: Option<i64>,
    delete_remote: Option<String>,
) -> anyhow::Result<()> {
    tracing::info!("=== intervox history ===");

    let mut archive = ReportArchive::new(&config::data_dir()?)?;

    if let Some(report_id) = delete_remote {
        let client = service_client()?;
        client.delete_saved_report(&report_id).await?;
        println!("Deleted report {report_id} on the service.");
        return Ok(());
    }

    if sync {
        let client = service_client()?;
        let reports = client.saved_reports().await?;
        for saved in &reports {
            archive.save_remote(saved)?;
        }
        println!("Synced {} report(s) from the service.", reports.len());
    }

    if let Some(id) = view {
        return view_entry(&mut archive, id);
    }

    let entries = archive.list()?;
    if entries.is_empty() {
        println!("No archived reports yet. Finish an interview to create one.");
        return Ok(());
    }

    println!();
    println!("{}", style(" Archived interview reports ").on_white().black());
    println!();
    for entry in &entries {
        let candidate = entry.candidate_name.as_deref().unwrap_or("(anonymous)");
        println!(
            "  [{}] {}  {}  {}  {}",
            style(entry.id).cyan(),
            entry.created_at.format("%Y-%m-%d %H:%M"),
            style(format!("{:.1}/10", entry.overall_score)).bold(),
            candidate,
            style(&entry.recommendation).dim(),
        );
    }
    println!();
    println!(
        "  View one in full with {}",
        style("intervox history --view <ID>").cyan()
    );

    Ok(())
}

fn service_client() -> anyhow::Result<InterviewClient> {
    let config_data = IntervoxConfig::load()?;
    let token = config::get_token().ok().flatten();
    if token.is_none() {
        println!(
            "{}",
            style("Not signed in; run 'intervox auth' to use server-side reports.").yellow()
        );
    }
    Ok(InterviewClient::new(config_data.server.base_url, token))
}

fn view_entry(archive: &mut ReportArchive, id: i64) -> anyhow::Result<()> {
    match archive.get(id)? {
        Some(entry) => {
            crate::ui::render_report(&entry.report, entry.candidate_name.as_deref());
            Ok(())
        }
        None => Err(anyhow::anyhow!(
            "No archived report with id {id}. Run 'intervox history' to list ids."
        )),
    }
}
