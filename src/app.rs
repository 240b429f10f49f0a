//! Application orchestration and command routing.
//!
//! Handles command-line argument parsing and delegates to appropriate command
//! handlers.

use crate::commands;
use crate::logging;
use anyhow::anyhow;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use std::process;

/// Checks if setup is needed (version mismatch or missing config) and runs setup if required.
///
/// Called early in the startup sequence, before command handling:
/// 1. If the config file doesn't exist, writes the default config
/// 2. If the config version is older than the app version, rewrites defaults and logs the migration
/// 3. Otherwise does nothing
fn check_and_run_setup() -> anyhow::Result<()> {
    let config_path = crate::config::get_config_path()?;

    if !config_path.exists() {
        tracing::info!("No configuration found, writing defaults");
        crate::setup::run_setup().map_err(|e| {
            tracing::error!("Setup failed: {e}");
            anyhow!("Setup failed: {e}")
        })?;
        return Ok(());
    }

    match crate::setup::version::check_setup_needed(&config_path)? {
        Some(old_version) => {
            tracing::info!(
                "Setup needed - migrating from version {} to {}",
                old_version,
                env!("CARGO_PKG_VERSION")
            );
            crate::setup::run_setup().map_err(|e| {
                tracing::error!("Setup failed: {e}");
                anyhow!("Setup failed: {e}")
            })?;
            crate::setup::version::update_config_version(&config_path).map_err(|e| {
                tracing::error!("Failed to update config version: {e}");
                anyhow!("Failed to update config version: {e}")
            })?;
            tracing::info!(
                "Setup completed successfully - migrated to version {}",
                env!("CARGO_PKG_VERSION")
            );
        }
        None => {
            tracing::debug!("Config version up to date ({})", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

/// A terminal client for AI-scored mock interviews
#[derive(Parser)]
#[command(name = "intervox")]
#[command(version)]
#[command(about = "Terminal client for AI-scored mock interviews")]
#[command(
    long_about = "A terminal client for AI-scored mock interviews.\n\nAnswer each interviewer question by typing or by recording a spoken answer\nfrom your microphone; the service evaluates the conversation and produces a\nscored feedback report at the end.\n\nDEFAULT COMMAND:\n    If no command is specified, 'interview' is used by default.\n\nEXAMPLES:\n    # Start an interview\n    $ intervox\n\n    # Start an interview with your CV attached\n    $ intervox --cv resume.pdf\n\n    # Fetch the report for a finished session\n    $ intervox report 7f3a9c\n\n    # Browse past reports (pull server-side ones first)\n    $ intervox history --sync\n\n    # Sign in so reports sync across machines\n    $ intervox auth\n\n    # Edit configuration file\n    $ intervox config"
)]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/intervox/intervox.toml\n    Logs:               ~/.local/state/intervox/intervox.log.*"
)]
struct Cli {
    /// CV file to attach when starting the interview (interview default command)
    #[arg(long, value_name = "FILE", global = true)]
    cv: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive interview (default)
    ///
    /// Presents the interviewer's questions phase by phase. Answer by typing,
    /// or enter /voice to record a spoken answer.
    #[command(visible_alias = "i")]
    Interview,

    /// Fetch the evaluation report for a session
    ///
    /// Valid once the interview is complete. The report is also archived
    /// locally for 'intervox history'.
    #[command(visible_alias = "r")]
    Report {
        /// Session id printed at the end of the interview
        #[arg(value_name = "SESSION_ID")]
        session_id: String,
    },

    /// Browse archived interview reports
    ///
    /// Lists locally archived reports. Use --sync to pull the reports saved
    /// on the service (requires sign-in) into the local archive first.
    #[command(visible_alias = "h")]
    History {
        /// Pull server-side saved reports into the local archive first
        #[arg(long)]
        sync: bool,

        /// Render one archived report in full by its id
        #[arg(long, value_name = "ID")]
        view: Option<i64>,

        /// Delete a saved report on the service by its remote id
        #[arg(long, value_name = "REMOTE_ID")]
        delete_remote: Option<String>,
    },

    /// Sign in to the interview service
    ///
    /// Stores the bearer token used for report and history calls. Interviews
    /// themselves work without signing in.
    #[command(visible_alias = "a")]
    Auth,

    /// Open configuration file in your preferred editor
    ///
    /// Edit the service address, audio settings, and interview defaults.
    /// Uses $EDITOR environment variable or falls back to nano/vim.
    #[command(visible_alias = "c")]
    Config,

    /// List available audio input devices
    ///
    /// Shows device IDs, names, and configurations to help configure
    /// the correct input device in intervox.toml.
    #[command(name = "list-devices")]
    ListDevices,

    /// Show recent log entries from the application
    ///
    /// Display the last 50 lines of the most recent log file.
    /// Useful for troubleshooting issues.
    Logs,

    /// Generate shell completion script
    ///
    /// Generate completion script for your shell. Save the output to your
    /// shell's completion directory or source it directly.
    ///
    /// Examples:
    ///   intervox completions bash > intervox.bash
    ///   intervox completions zsh > _intervox
    ///   intervox completions fish > intervox.fish
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Runs the main application based on command-line arguments.
///
/// # Errors
/// - If setup fails
/// - If logging initialization fails
/// - If command execution fails
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Handle commands that don't need logging or config setup
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            generate(*shell, &mut Cli::command(), "intervox", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::ListDevices) => {
            return match commands::handle_list_devices() {
                Ok(()) => Ok(()),
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
        }
        Some(Commands::Logs) => {
            return match commands::handle_logs() {
                Ok(()) => Ok(()),
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
        }
        _ => {}
    }

    // Initialize logging for all other commands
    logging::init_logging()?;

    // Check if setup is needed (version check or missing config)
    check_and_run_setup()?;

    // Route to appropriate command handler
    match cli.command {
        None | Some(Commands::Interview) => {
            // Default command is interview; --cv is global so it applies with
            // or without the explicit subcommand.
            commands::handle_interview(cli.cv).await?;
        }
        Some(Commands::Report { session_id }) => {
            commands::handle_report(session_id).await?;
        }
        Some(Commands::History {
            sync,
            view,
            delete_remote,
        }) => {
            commands::handle_history(sync, view, delete_remote).await?;
        }
        Some(Commands::Auth) => {
            if let Err(e) = commands::handle_auth().await {
                // Check if it's a cancellation error (cliclack already displayed the message)
                let err_msg = e.to_string();
                if err_msg.contains("cancelled") || err_msg.contains("interrupted") {
                    process::exit(0);
                } else {
                    return Err(e);
                }
            }
        }
        Some(Commands::Config) => {
            commands::handle_config()?;
        }
        Some(Commands::Completions { .. }) | Some(Commands::ListDevices) | Some(Commands::Logs) => {
            unreachable!("These commands are handled earlier")
        }
    }

    Ok(())
}
