use std::future::IntoFuture;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use wicket_server::api::AppState;
use wicket_server::auth::hash_credential;
use wicket_server::authorize::DownloadAuthorizer;
use wicket_server::blob_factory::create_blob_store;
use wicket_server::config::WicketConfig;
use wicket_server::session_factory::create_session_verifier;
use wicket_token::SystemClock;

/// Overrides every configured signing key when set.
const SIGNING_SECRET_ENV: &str = "WICKET_SIGNING_SECRET";

/// Wicket attachment download server.
#[derive(Parser, Debug)]
#[command(name = "wicket-server", about = "Authorized downloads of mail attachments")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "wicket.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the SHA-256 hash of a session credential for the
    /// `[[sessions.credentials]]` table. Reads the credential from stdin.
    HashCredential,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Some(Commands::HashCredential) = cli.command {
        return run_hash_credential();
    }

    // Load configuration from TOML file, or use defaults if the file does not exist.
    let config: WicketConfig = if Path::new(&cli.config).exists() {
        let contents = std::fs::read_to_string(&cli.config)?;
        toml::from_str(&contents)?
    } else {
        info!(path = %cli.config, "config file not found, using defaults");
        toml::from_str("")?
    };

    let env_secret = std::env::var(SIGNING_SECRET_ENV).ok();
    let (codec, generated) = config
        .tokens
        .codec(env_secret.as_deref())
        .map_err(|e| format!("invalid [tokens] configuration: {e}"))?;
    if generated {
        warn!(
            "no signing secret configured; using a random key, \
             download tokens will not survive a restart"
        );
    }
    info!(
        ttl_seconds = codec.ttl().num_seconds(),
        signing_kid = codec.keys().current().kid(),
        verify_keys = codec.keys().all().len(),
        "download tokens configured"
    );

    let missing_blob_id_status = config
        .download
        .missing_blob_id_status()
        .map_err(|e| format!("invalid [download] configuration: {e}"))?;

    let sessions = create_session_verifier(&config.sessions)?;
    info!(backend = %config.sessions.backend, "session verifier configured");

    let store = create_blob_store(&config.blobs).await?;

    let state = AppState {
        authorizer: Arc::new(DownloadAuthorizer::new(Arc::new(codec), sessions)),
        store,
        clock: Arc::new(SystemClock),
        missing_blob_id_status,
    };
    let app = wicket_server::api::router(state);

    let host = cli.host.unwrap_or(config.server.host);
    let port = cli.port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "wicket-server listening");

    // Serve with graceful shutdown on SIGINT / SIGTERM, bounding how long
    // in-flight downloads may keep the process alive.
    let (signalled_tx, signalled_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = signalled_tx.send(());
        })
        .into_future();

    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);
    let drain_deadline = async move {
        if signalled_rx.await.is_ok() {
            tokio::time::sleep(shutdown_timeout).await;
        } else {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        result = server => result?,
        () = drain_deadline => {
            warn!(
                timeout_secs = config.server.shutdown_timeout_seconds,
                "shutdown timeout exceeded, dropping open connections"
            );
        }
    }

    info!("wicket-server shut down");
    Ok(())
}

/// Hash a credential read from stdin for the static session table.
fn run_hash_credential() -> Result<(), Box<dyn std::error::Error>> {
    let mut raw = String::new();
    std::io::Read::read_to_string(&mut std::io::stdin(), &mut raw)?;
    let raw = raw.trim_end_matches(['\r', '\n']);
    if raw.is_empty() {
        return Err("no credential on stdin".into());
    }
    println!("{}", hash_credential(raw));
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM, then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
