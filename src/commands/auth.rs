//! Service authentication.
//!
//! Signs in (or registers) against the interview service and stores the
//! returned bearer token for report and history calls. Interviews themselves
//! never require a token.

use cliclack::{input, intro, note, outro, password, select};
use console::style;

use crate::api::InterviewClient;
use crate::config::{self, IntervoxConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthAction {
    Login,
    Register,
    SignOut,
}

/// Handles sign-in, registration, and sign-out.
///
/// # Errors
/// - If configuration cannot be loaded
/// - If the service rejects the credentials
pub async fn handle_auth() -> anyhow::Result<()> {
    tracing::info!("=== intervox auth ===");

    ctrlc::set_handler(move || {}).expect("setting Ctrl-C handler");

    let config_data = IntervoxConfig::load()?;

    println!();
    intro(style(" auth ").on_white().black())?;

    if let Some(current) = config::get_username().ok().flatten() {
        note("current user", current)?;
    }

    let action: AuthAction = select("What would you like to do?")
        .item(AuthAction::Login, "Sign in", "")
        .item(AuthAction::Register, "Create an account", "")
        .item(AuthAction::SignOut, "Sign out", "forget the stored token")
        .interact()
        .map_err(|e| anyhow::anyhow!("Selection cancelled: {e}"))?;

    if action == AuthAction::SignOut {
        config::clear_token()?;
        outro("Signed out.")?;
        return Ok(());
    }

    let username: String = input("Username:")
        .interact()
        .map_err(|e| anyhow::anyhow!("Username input cancelled: {e}"))?;
    let pass: String = password("Password:")
        .interact()
        .map_err(|e| anyhow::anyhow!("Password input cancelled: {e}"))?;

    let base_url = config_data.server.base_url.clone();
    let client = InterviewClient::new(base_url.clone(), None);
    let response = match action {
        AuthAction::Login => client.login(&username, &pass).await?,
        AuthAction::Register => client.register(&username, &pass).await?,
        AuthAction::SignOut => unreachable!("handled above"),
    };

    if !response.success {
        return Err(anyhow::anyhow!(
            "The service rejected the credentials: {}",
            response.message
        ));
    }

    let token = response.token.ok_or_else(|| {
        anyhow::anyhow!("The service accepted the credentials but returned no token")
    })?;
    let username = response.username.unwrap_or(username);
    config::save_token(&token, &username)?;

    // Round-trip the stored token so a bad save surfaces now, not at the
    // first report fetch.
    let verified = InterviewClient::new(base_url, Some(token))
        .verify_token()
        .await;
    match verified {
        Ok(result) if result.valid => {}
        Ok(_) => tracing::warn!("Service reports the new token as invalid"),
        Err(e) => tracing::warn!("Could not verify the new token: {e}"),
    }

    outro(format!("Signed in as {username}."))?;

    tracing::info!("Authentication completed for user '{username}'");
    Ok(())
}
