//! HTTP API for notekeeper
//!
//! Provides:
//! - Per-user note listing, creation and deletion
//! - Session-token authentication (cookie or Bearer header)
//! - Session issuing and revocation for development without an identity provider

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notes_core::{VerifiedSession, resolve};
use notes_service::config::Config;
use notes_service::sessions::FileSessionStore;
use notes_service::storage::LazyNoteStore;
use notes_service::{AppState, router};

#[derive(Parser, Debug)]
#[command(name = "notes-service")]
#[command(about = "Personal notes API")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to the data directory (config, notes, sessions)
    #[arg(long, default_value = "./data", env = "NOTES_DATA_PATH", global = true)]
    data_path: String,

    /// Port to listen on
    #[arg(long, default_value_t = 3002, env = "NOTES_PORT", global = true)]
    port: u16,

    /// Address to bind to
    #[arg(long, default_value = "0.0.0.0", env = "NOTES_BIND", global = true)]
    bind: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve,

    /// Issue a session token for a user and print it
    IssueSession {
        /// User ID the session authenticates as
        #[arg(long)]
        user: String,

        /// Session lifetime in seconds (defaults to the configured lifetime)
        #[arg(long)]
        lifetime_secs: Option<u64>,
    },

    /// Revoke a previously issued session token
    RevokeSession {
        /// The raw session token
        #[arg(long)]
        token: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (stderr, so stdout carries only command output)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "notes_service=info,notes_core=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.data_path)?;

    match cli.command {
        None | Some(Command::Serve) => serve(config, &cli.data_path, cli.port, &cli.bind).await,
        Some(Command::IssueSession {
            user,
            lifetime_secs,
        }) => {
            // Refuse ids the API would reject anyway.
            resolve(Some(&VerifiedSession::new(user.as_str())))
                .with_context(|| format!("Invalid user id: {:?}", user))?;
            let sessions = FileSessionStore::open(config.sessions_path(&cli.data_path))?;
            let lifetime = lifetime_secs.unwrap_or(config.session.session_lifetime_secs);
            let token = sessions.issue(&user, lifetime)?;
            println!("{}", token);
            Ok(())
        }
        Some(Command::RevokeSession { token }) => {
            let sessions = FileSessionStore::open(config.sessions_path(&cli.data_path))?;
            if sessions.revoke(&token)? {
                tracing::info!("Session revoked");
            } else {
                tracing::warn!("No such session");
            }
            Ok(())
        }
    }
}

async fn serve(config: Config, data_path: &str, port: u16, bind: &str) -> anyhow::Result<()> {
    let sessions = FileSessionStore::open(config.sessions_path(data_path))?;
    // Opened on the first request and shared by every request after it.
    let store = LazyNoteStore::json_file(config.notes_path(data_path));

    let state = Arc::new(AppState::new(config, Arc::new(store), Arc::new(sessions)));
    let app = router(state);

    // Parse bind address
    let addr: SocketAddr = format!("{}:{}", bind, port)
        .parse()
        .with_context(|| format!("Invalid bind address: {}:{}", bind, port))?;

    tracing::info!("Starting notes-service on {}", addr);
    tracing::info!("Data directory: {}", data_path);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Notes service shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
