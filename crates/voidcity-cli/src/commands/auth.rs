use std::process::ExitCode;

use voidcity_core::config::AppConfig;
use voidcity_core::session::expires_at;
use voidcity_runtime::{admin_panel, entry_route, open_session, Route, RuntimeError};

use super::{print_notices, prompt, read_line};
use crate::error::CliError;

/// Log in with a username and password.
///
/// The password prompt does not hide input. With `password_stdin` the
/// password is read from stdin with no prompt, for piping from a secret store.
pub async fn login(
    config: &AppConfig,
    username: Option<String>,
    password_stdin: bool,
) -> Result<ExitCode, CliError> {
    let session = open_session(config);
    if entry_route(&session) == Route::Admin {
        println!("Already logged in. Run `voidcity logout` first to switch accounts.");
        return Ok(ExitCode::SUCCESS);
    }

    let username = match username {
        Some(name) => name,
        None => prompt("Username: ")?,
    };
    let password = if password_stdin {
        read_line(std::io::stdin().lock())?
    } else {
        prompt("Password (input is visible): ")?
    };

    match voidcity_runtime::login(config, &session, &username, &password).await {
        Ok(()) => {
            println!("Logged in as {username}.");
            Ok(ExitCode::SUCCESS)
        }
        Err(RuntimeError::Login(message)) => {
            eprintln!("error: {message}");
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e.into()),
    }
}

pub fn logout(config: &AppConfig) -> Result<ExitCode, CliError> {
    let mut panel = admin_panel(config, open_session(config))?;
    panel.logout();
    print_notices(panel.take_notices());
    println!("Logged out.");
    Ok(ExitCode::SUCCESS)
}

pub fn status(config: &AppConfig) -> Result<ExitCode, CliError> {
    let session = open_session(config);
    println!("API:     {}", config.api.base_url);
    println!("Timeout: {}s", config.request_timeout().as_secs());
    println!("Config:  {}", AppConfig::config_path().display());

    let expiry = session.token().as_deref().and_then(expires_at);
    match entry_route(&session) {
        Route::Admin => {
            let until = expiry
                .map(|at| at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "unknown".into());
            println!("Session: logged in (expires {until})");
        }
        Route::Login => println!("Session: not logged in"),
    }
    Ok(ExitCode::SUCCESS)
}
