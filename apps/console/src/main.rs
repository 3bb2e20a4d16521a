use std::{
    io::{self, Write},
    sync::Arc,
    time::Duration,
};

use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use client_core::{
    DeleteConfirmation, FileCredentialStore, GateDecision, HttpDirectoryService,
    ProtectedAccessGate, RegisterFlow, SessionManager, UpdateRecordFlow, UserDirectoryViewModel,
};
use shared::domain::{UserId, UserRecord};

mod config;

#[derive(Parser, Debug)]
#[command(about = "Administer accounts on a user directory service")]
struct Cli {
    /// Overrides the configured service base URL.
    #[arg(long)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and persist the session for later commands.
    Login { username: String, password: String },
    /// Drop the persisted session.
    Logout,
    /// Create a new account.
    Register {
        username: String,
        password: String,
        email: String,
        full_name: String,
    },
    /// List users, optionally filtered.
    List {
        #[arg(long)]
        search: Option<String>,
    },
    /// Delete a user after confirmation.
    Delete {
        id: i64,
        /// Skip the interactive confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Update a user's profile fields.
    Update {
        id: i64,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let cli = Cli::parse();
    let settings = config::load_settings();
    let api_url = cli.api_url.unwrap_or(settings.api_url);

    let api = Arc::new(HttpDirectoryService::with_timeout(
        &api_url,
        Duration::from_secs(settings.request_timeout_secs),
    )?);
    let session = Arc::new(SessionManager::new(
        api.clone(),
        Arc::new(FileCredentialStore::new(&settings.credentials_path)),
    ));
    session.initialize().await;

    match cli.command {
        Command::Login { username, password } => {
            let user = session.login(&username, &password).await?;
            println!("logged in as {} <{}>", user.username, user.email);
        }
        Command::Logout => {
            session.logout().await;
            println!("logged out");
        }
        Command::Register {
            username,
            password,
            email,
            full_name,
        } => {
            let flow = RegisterFlow {
                username,
                password,
                email,
                full_name,
            };
            flow.submit(api.as_ref()).await?;
            println!("account created, you can now log in");
        }
        Command::List { search } => {
            ensure_signed_in(&session).await?;
            let view = UserDirectoryViewModel::new(api, session);
            view.load().await?;
            if let Some(query) = search {
                view.set_search(query).await;
            }
            let users = view.filtered_view().await;
            if users.is_empty() {
                println!("no users matched");
            }
            for user in users {
                println!(
                    "{:>6}  {:<20} {:<25} {}",
                    user.id.0, user.username, user.full_name, user.email
                );
            }
        }
        Command::Delete { id, yes } => {
            ensure_signed_in(&session).await?;
            let view = UserDirectoryViewModel::new(api, session);
            view.load().await?;
            let Some(target) = view
                .users()
                .await
                .into_iter()
                .find(|user| user.id == UserId(id))
            else {
                bail!("no user with id {id}");
            };

            let mut confirmation = DeleteConfirmation::default();
            confirmation.select_for_deletion(target.clone());
            if !yes && !confirmed_interactively(&target)? {
                confirmation.cancel();
                println!("aborted, nothing deleted");
                return Ok(());
            }
            confirmation.confirm(&view).await;

            if let Some(message) = view.error_message().await {
                bail!(message);
            }
            if let Some(notice) = view.notice().await {
                println!("{notice}");
            }
        }
        Command::Update {
            id,
            username,
            full_name,
            email,
        } => {
            ensure_signed_in(&session).await?;
            let view = UserDirectoryViewModel::new(api.clone(), session.clone());
            view.load().await?;
            let handoff = view
                .request_edit(UserId(id))
                .await
                .ok_or_else(|| anyhow!("no user with id {id}"))?;

            let mut flow = UpdateRecordFlow::enter(Some(handoff))
                .map_err(|_| anyhow!("no record selected for editing"))?;
            if let Some(username) = username {
                flow.username = username;
            }
            if let Some(full_name) = full_name {
                flow.full_name = full_name;
            }
            if let Some(email) = email {
                flow.email = email;
            }
            flow.submit(api.as_ref(), &session).await?;
            println!("user {} updated", flow.username);
        }
    }

    Ok(())
}

async fn ensure_signed_in(session: &Arc<SessionManager>) -> Result<()> {
    let gate = ProtectedAccessGate::new(session.clone());
    match gate.decide().await {
        GateDecision::Allow => Ok(()),
        GateDecision::RedirectToLogin => bail!("not signed in, run `console login` first"),
        GateDecision::Loading => bail!("session is still initializing"),
    }
}

fn confirmed_interactively(target: &UserRecord) -> Result<bool> {
    print!(
        "delete user '{}' <{}>? [y/N] ",
        target.username, target.email
    );
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    let answer = answer.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}
