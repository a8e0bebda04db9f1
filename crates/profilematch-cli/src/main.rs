//! profilematch - command-line client for the profile matcher API.
//!
//! Restores the saved session on startup, then runs one command against
//! the API and prints the result as JSON.

mod cli;

use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Command};
use profilematch_core::auth::{SessionContext, SessionState};
use profilematch_core::models::{CreateProfileRequest, UpdateProfileRequest};
use profilematch_core::{ApiClient, ApiError, Config, TokenStore};

/// Initialize the tracing subscriber for logging.
/// The returned guard must be held until exit so the file writer flushes.
fn init_tracing(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("Log file path has no file name: {}", path.display()))?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    Ok(guard)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_file.as_deref())?;
    info!("profilematch starting");

    let mut config = Config::load().context("Failed to load config")?;
    let base_url = cli.api_base_url(&config);

    let tokens = TokenStore::new(config.open_store()?);
    let mut session = SessionContext::restored(tokens.clone()).await;

    let mut client = ApiClient::new(&base_url, tokens)?;
    if let Some(auth_url) = config.auth_url() {
        client = client.with_auth_url(&auth_url)?;
    }
    if let Some(token) = cli.token.clone() {
        client = client.with_token(token);
    }

    let result = run(cli.command, &mut config, &mut session, &client).await;

    if let Err(ref e) = result {
        if e.downcast_ref::<ApiError>().is_some_and(ApiError::requires_login) {
            eprintln!("Not logged in or session expired. Run `profilematch login` first.");
        }
    }
    result
}

async fn run(
    command: Command,
    config: &mut Config,
    session: &mut SessionContext,
    client: &ApiClient,
) -> Result<()> {
    match command {
        Command::Login { username } => {
            let username = match username.or_else(|| config.last_username.clone()) {
                Some(u) => u,
                None => cli::prompt("Username: ")?,
            };
            let password = rpassword::prompt_password("Password: ")
                .context("Failed to read password")?;

            // The token store is written before the session changes state
            let issued = client.authenticate(&username, &password).await?;
            session.login(issued.value.clone());

            config.last_username = Some(username);
            config.save()?;

            let minutes = issued.minutes_until_expiry(session.token_store().now_millis());
            eprintln!("Logged in. Token expires in {} minutes.", minutes);
        }
        Command::Logout => {
            session.logout().await.context("Failed to clear stored token")?;
            eprintln!("Logged out.");
        }
        Command::Status => {
            let status = match session.state() {
                SessionState::Authenticated { .. } => {
                    let stored = session.token_store().load().await?;
                    let now = session.token_store().now_millis();
                    serde_json::json!({
                        "authenticated": true,
                        "expires_at": stored.as_ref().and_then(|t| t.expires_at_utc()).map(|t| t.to_rfc3339()),
                        "minutes_until_expiry": stored.as_ref().map(|t| t.minutes_until_expiry(now)),
                    })
                }
                _ => serde_json::json!({ "authenticated": false }),
            };
            print_json(&status)?;
        }
        Command::Health => print_json(&client.check_health().await?)?,
        Command::List => print_json(&client.list_profiles().await?)?,
        Command::Get { user_id } => print_json(&client.get_profile(&user_id).await?)?,
        Command::Search { query } => print_json(&client.search_profiles(&query).await?)?,
        Command::Create {
            user_id,
            name,
            email,
            bio,
            skills,
        } => {
            let request = CreateProfileRequest {
                user_id,
                name,
                email,
                bio,
                skills,
            };
            print_json(&client.create_profile(&request).await?)?;
        }
        Command::Update {
            user_id,
            name,
            email,
            bio,
            skills,
        } => {
            let update = UpdateProfileRequest {
                name,
                email,
                bio,
                skills: (!skills.is_empty()).then_some(skills),
            };
            if update.is_empty() {
                anyhow::bail!("Nothing to update - pass at least one field");
            }
            print_json(&client.update_profile(&user_id, &update).await?)?;
        }
        Command::Delete { user_id } => print_json(&client.delete_profile(&user_id).await?)?,
    }
    Ok(())
}
