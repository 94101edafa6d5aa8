//! Command line client for the school portal API.
//!
//! Uses the same gateway and session store as the browser front end. The
//! bearer token lives in a file between invocations; every command except
//! `login` hydrates from it first.

mod store;
mod transport;

#[cfg(test)]
#[path = "main_test.rs"]
mod main_test;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use portal::api::admin::{self, Directory, Structure};
use portal::api::common;
use portal::config::ConfigError;
use portal::forms::LoginForm;
use portal::{ApiError, Identity, Portal, PortalConfig};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use crate::store::FileCredentialStore;
use crate::transport::ReqwestTransport;

type CliPortal = Portal<ReqwestTransport, FileCredentialStore>;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("not signed in; run `portal-cli login` first")]
    NotSignedIn,
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("http client setup failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "portal-cli", about = "School portal API client")]
struct Cli {
    /// Overrides `PORTAL_API_BASE_URL`.
    #[arg(long)]
    base_url: Option<String>,

    #[arg(long, env = "PORTAL_TOKEN_FILE")]
    token_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and store the access token.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "PORTAL_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored token.
    Logout,
    /// Show the signed-in identity.
    Whoami,
    Announcements {
        #[arg(long)]
        audience: Option<String>,
    },
    /// GET any API path and print the `data` payload.
    Get { path: String },
    Members {
        #[arg(value_enum)]
        directory: DirectoryArg,
    },
    Structure {
        #[arg(value_enum)]
        kind: StructureArg,
    },
    Messages(MessagesCommand),
}

#[derive(Args, Debug)]
struct MessagesCommand {
    #[command(subcommand)]
    command: MessagesSubcommand,
}

#[derive(Subcommand, Debug)]
enum MessagesSubcommand {
    List,
    Send {
        #[arg(long)]
        thread: String,
        #[arg(long)]
        body: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum DirectoryArg {
    Students,
    Teachers,
    Accounts,
}

impl From<DirectoryArg> for Directory {
    fn from(arg: DirectoryArg) -> Self {
        match arg {
            DirectoryArg::Students => Self::Students,
            DirectoryArg::Teachers => Self::Teachers,
            DirectoryArg::Accounts => Self::Accounts,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum StructureArg {
    Sessions,
    Terms,
    Levels,
    Arms,
}

impl From<StructureArg> for Structure {
    fn from(arg: StructureArg) -> Self {
        match arg {
            StructureArg::Sessions => Self::Sessions,
            StructureArg::Terms => Self::Terms,
            StructureArg::Levels => Self::Levels,
            StructureArg::Arms => Self::Arms,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let portal = build_portal(&cli)?;

    match cli.command {
        Command::Login { email, password } => run_login(&portal, email, password).await,
        Command::Logout => {
            portal.logout();
            println!("signed out");
            Ok(())
        }
        Command::Whoami => {
            let user = require_session(&portal).await?;
            println!("{}", describe_identity(&user));
            Ok(())
        }
        Command::Announcements { audience } => run_announcements(&portal, audience.as_deref()).await,
        Command::Get { path } => run_get(&portal, &path).await,
        Command::Members { directory } => run_members(&portal, directory.into()).await,
        Command::Structure { kind } => run_structure(&portal, kind.into()).await,
        Command::Messages(messages) => run_messages(&portal, messages.command).await,
    }
}

fn build_portal(cli: &Cli) -> Result<CliPortal, CliError> {
    let mut config = PortalConfig::from_env()?;
    if let Some(url) = &cli.base_url {
        config = config.with_api_base_url(url)?;
    }
    let path = cli
        .token_file
        .clone()
        .unwrap_or_else(|| FileCredentialStore::default_path(&config.token_key));
    let transport = ReqwestTransport::new(&config)?;
    Ok(Portal::new(transport, FileCredentialStore::new(path), config))
}

/// Restore the stored session, failing when it cannot be.
async fn require_session(portal: &CliPortal) -> Result<Identity, CliError> {
    portal.hydrate().await.user.ok_or(CliError::NotSignedIn)
}

fn describe_identity(user: &Identity) -> String {
    format!("{} <{}> ({})", user.display_name(), user.email, user.role.as_str())
}

async fn run_login(portal: &CliPortal, email: String, password: String) -> Result<(), CliError> {
    let user = portal.login(&LoginForm { email, password }).await?;
    tracing::info!(role = user.role.as_str(), "signed in");
    println!("signed in as {}", describe_identity(&user));
    Ok(())
}

async fn run_announcements(portal: &CliPortal, audience: Option<&str>) -> Result<(), CliError> {
    require_session(portal).await?;
    let items = common::list_announcements(portal.gateway(), &portal.context(), audience).await?;
    if items.is_empty() {
        println!("no announcements");
    }
    for item in items {
        let date = item.publish_at.as_deref().unwrap_or("-");
        println!("[{date}] {} ({})\n    {}", item.title, item.audience, item.body);
    }
    Ok(())
}

async fn run_get(portal: &CliPortal, path: &str) -> Result<(), CliError> {
    require_session(portal).await?;
    let path = if path.starts_with('/') { path.to_owned() } else { format!("/{path}") };
    let value: Value = portal.gateway().get(&portal.context(), &path).await?;
    print_json(&value)
}

async fn run_members(portal: &CliPortal, directory: Directory) -> Result<(), CliError> {
    require_session(portal).await?;
    let members = admin::list_members(portal.gateway(), &portal.context(), directory).await?;
    for member in &members {
        println!("{}\t{}\t{}\t{}", member.id, member.full_name(), member.email, member.status.as_str());
    }
    tracing::debug!(count = members.len(), "listed members");
    Ok(())
}

async fn run_structure(portal: &CliPortal, kind: Structure) -> Result<(), CliError> {
    require_session(portal).await?;
    let items = admin::list_structure(portal.gateway(), &portal.context(), kind).await?;
    for item in items {
        let order = item.order.map(|o| o.to_string()).unwrap_or_default();
        println!("{}\t{}\t{order}", item.id, item.name);
    }
    Ok(())
}

async fn run_messages(portal: &CliPortal, command: MessagesSubcommand) -> Result<(), CliError> {
    require_session(portal).await?;
    let ctx = portal.context();
    match command {
        MessagesSubcommand::List => {
            let threads = common::list_threads(portal.gateway(), &ctx).await?;
            for thread in threads {
                println!("{}\t{} ({} messages)", thread.thread_id, thread.subject, thread.messages.len());
                for message in &thread.messages {
                    println!("    {}: {}", message.sender_name, message.body);
                }
            }
            Ok(())
        }
        MessagesSubcommand::Send { thread, body } => {
            common::send_message(portal.gateway(), &ctx, &thread, &body).await?;
            println!("sent");
            Ok(())
        }
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
