//! The interactive interview.
//!
//! Starts a session, runs the question/answer loop with typed or spoken
//! answers, and offers the evaluation report once the interviewer declares
//! the interview complete.

use std::path::PathBuf;

use cliclack::{confirm, input, intro, outro, spinner};
use console::style;

use crate::api::InterviewClient;
use crate::archive::ReportArchive;
use crate::config::{self, IntervoxConfig};
use crate::recording::{AudioArtifact, AudioRecorder};
use crate::session::{CvSource, SessionController, UserInput};
use crate::ui::{ErrorScreen, RecordingCommand, RecordingScreen};

/// Runs one full interview from start to completion or abandonment.
///
/// # Errors
/// - If configuration cannot be loaded
/// - If the session cannot be started
pub async fn handle_interview(cv_path: Option<PathBuf>) -> anyhow::Result<()> {
    tracing::info!("=== intervox interview started ===");

    let config_data = match IntervoxConfig::load() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("Failed to load configuration: {err}");
            let error_message = format!(
                "Configuration Error:\n\n{err}\n\nPlease check your ~/.config/intervox/intervox.toml file and try again."
            );
            let mut error_screen = ErrorScreen::new()?;
            error_screen.show_error(&error_message)?;
            error_screen.cleanup()?;
            return Err(anyhow::anyhow!("Configuration error: {err}"));
        }
    };

    // Let cliclack surface Ctrl-C as a cancelled prompt instead of a hard kill.
    ctrlc::set_handler(move || {}).expect("setting Ctrl-C handler");

    let token = config::get_token().ok().flatten();
    let client = InterviewClient::new(config_data.server.base_url.clone(), token);
    let mut controller = SessionController::new(client);

    println!();
    intro(style(" interview ").on_white().black())?;

    let candidate_name = match config_data.interview.candidate_name() {
        Some(name) => Some(name.to_string()),
        None => {
            let name: String = input("Your name (optional, Enter to skip):")
                .required(false)
                .interact()
                .map_err(|e| anyhow::anyhow!("Interview cancelled: {e}"))?;
            let name = name.trim().to_string();
            (!name.is_empty()).then_some(name)
        }
    };

    let cv = match cv_path {
        Some(path) => Some(CvSource::File(path)),
        None => {
            let paste = confirm("Paste CV text for a tailored interview?")
                .initial_value(false)
                .interact()
                .unwrap_or(false);
            if paste {
                let text: String = input("CV text:")
                    .multiline()
                    .required(false)
                    .interact()
                    .map_err(|e| anyhow::anyhow!("Interview cancelled: {e}"))?;
                let text = text.trim().to_string();
                (!text.is_empty()).then(|| CvSource::Text(text))
            } else {
                None
            }
        }
    };

    let progress = spinner();
    progress.start("Starting your interview...");
    match controller.start_session(candidate_name.as_deref(), cv).await {
        Ok(_) => progress.stop("Interview started."),
        Err(e) => {
            progress.error("Could not start the interview.");
            return Err(e);
        }
    }

    if let Some(session) = controller.session() {
        if let Some(opening) = session.transcript.last() {
            print_interviewer(&opening.content);
        }
    }

    loop {
        if controller.is_complete() {
            break;
        }

        if let Some(session) = controller.session() {
            println!(
                "{}",
                style(format!(
                    "  Question {} of 6 - {}",
                    session.phases.progress(),
                    session.phases.label()
                ))
                .dim()
            );
        }

        let answer: String = match input("Your answer (/voice to record, /quit to leave):")
            .required(false)
            .interact()
        {
            Ok(answer) => answer,
            Err(_) => {
                // Prompt cancelled (Ctrl-C / Esc): confirm abandoning.
                if abandon_confirmed()? {
                    controller.end_session().await;
                    outro("Interview abandoned.")?;
                    return Ok(());
                }
                continue;
            }
        };

        let turn = match answer.trim() {
            "/quit" => {
                if abandon_confirmed()? {
                    controller.end_session().await;
                    outro("Interview abandoned.")?;
                    return Ok(());
                }
                continue;
            }
            "/voice" => {
                let artifact = match record_answer(&config_data) {
                    Ok(Some(artifact)) => artifact,
                    Ok(None) => continue, // recording discarded
                    Err(e) => {
                        println!("  {}", style(format!("{e}")).red());
                        continue;
                    }
                };
                match UserInput::resolve("", Some(artifact)) {
                    Some(turn) => turn,
                    None => continue,
                }
            }
            text => match UserInput::resolve(text, None) {
                Some(turn) => turn,
                None => continue,
            },
        };

        let waiting = spinner();
        waiting.start("The interviewer is thinking...");
        match controller.send(turn).await {
            Ok(reply) => {
                waiting.stop("Answer sent.");
                print_interviewer(&reply.message);
            }
            Err(e) => {
                waiting.error("Could not send your answer.");
                println!("  {}", style(format!("{e} Your answer was not kept; try again.")).red());
            }
        }
    }

    outro("The interview is complete.")?;

    let fetch = confirm("Fetch your evaluation report now?")
        .initial_value(true)
        .interact()
        .unwrap_or(false);
    if fetch {
        fetch_and_render_report(&controller, candidate_name.as_deref()).await?;
    } else if let Some(session) = controller.session() {
        println!(
            "  Run {} later to fetch it.",
            style(format!("intervox report {}", session.id)).cyan()
        );
    }

    tracing::info!("=== intervox interview finished ===");
    Ok(())
}

/// Records one spoken answer, returning `None` when the user discards it.
///
/// The recorder and screen are torn down on every path out of here, so the
/// microphone is always released.
fn record_answer(config_data: &IntervoxConfig) -> anyhow::Result<Option<AudioArtifact>> {
    let mut recorder = AudioRecorder::new(
        config_data.audio.sample_rate,
        config_data.audio.device.clone(),
    );
    recorder.start()?;

    let mut screen = RecordingScreen::new()?;
    loop {
        screen.render(recorder.elapsed_secs(), &recorder.samples_snapshot())?;
        match screen.poll_input()? {
            RecordingCommand::Continue => {}
            RecordingCommand::Finish => {
                recorder.stop()?;
                break;
            }
            RecordingCommand::Cancel => {
                recorder.cancel();
                screen.cleanup()?;
                println!("  {}", style("Recording discarded.").dim());
                return Ok(None);
            }
        }
    }
    screen.cleanup()?;

    let artifact = recorder.take_artifact();
    if let Some(artifact) = &artifact {
        println!(
            "  {}",
            style(format!(
                "Recorded {}s of audio ({}).",
                artifact.duration_secs, artifact.mime
            ))
            .dim()
        );
    }
    Ok(artifact)
}

async fn fetch_and_render_report(
    controller: &SessionController,
    candidate_name: Option<&str>,
) -> anyhow::Result<()> {
    let fetching = spinner();
    fetching.start("Fetching your evaluation report...");
    let report = match controller.request_report().await {
        Ok(report) => {
            fetching.stop("Report ready.");
            report
        }
        Err(e) => {
            fetching.error("Could not fetch the report.");
            return Err(e);
        }
    };

    crate::ui::render_report(&report, candidate_name);

    // Archive locally so `intervox history` can show it later.
    if let Some(session) = controller.session() {
        match ReportArchive::new(&config::data_dir()?) {
            Ok(mut archive) => {
                if let Err(e) = archive.save(
                    &session.id,
                    candidate_name,
                    &report,
                    session.transcript.messages(),
                ) {
                    tracing::warn!("Failed to archive report: {e}");
                }
            }
            Err(e) => tracing::warn!("Failed to open report archive: {e}"),
        }
    }

    Ok(())
}

fn abandon_confirmed() -> anyhow::Result<bool> {
    Ok(confirm("Leave the interview? The session will be discarded.")
        .initial_value(false)
        .interact()
        .unwrap_or(true))
}

fn print_interviewer(message: &str) {
    println!();
    println!("  {}", style("Interviewer").bold());
    for line in message.lines() {
        println!("  {line}");
    }
    println!();
}
