//! cognito-web: web front for the cognito-session login layer

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use cognito_session::oidc::init_signing_keys;
use cognito_session::CognitoConfig;
use cognito_web::{router, AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cognito-web")]
#[command(about = "Web login and session layer for a Cognito user pool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the web server
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:3000")]
        bind: SocketAddr,

        /// Config file (defaults to $COGNITO_SESSION_CONFIG, the user config dir, then env vars)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Load the config and signing keys, then exit
    CheckConfig {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn init_tracing() {
    // RUST_LOG wins; LOG_LEVEL is the short form for the workspace crates.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        EnvFilter::new(format!(
            "cognito_web={level},cognito_session={level},audit=info"
        ))
    });

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<CognitoConfig> {
    let config = match path {
        Some(path) => CognitoConfig::from_file(&path)?,
        None => CognitoConfig::load()?,
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { bind, config } => run_serve(bind, config).await,
        Commands::CheckConfig { config } => run_check_config(config).await,
    }
}

/// Load config and keys, then serve. Keys must be in place before the listener binds.
async fn run_serve(bind: SocketAddr, config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    info!(
        user_pool = %config.user_pool_id,
        client_id = %config.client_id,
        "Loading signing keys"
    );

    // Blocking HTTP client: build and use it off the async workers
    let state = tokio::task::spawn_blocking(move || -> anyhow::Result<AppState> {
        let keys = init_signing_keys(&config)?;
        info!(keys = keys.len(), "Signing keys loaded");
        Ok(AppState::new(config, keys)?)
    })
    .await??;

    let app = router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("cognito-web listening on http://{}", bind);

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))
}

async fn run_check_config(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    println!("User pool:      {}", config.user_pool_id);
    println!("Issuer:         {}", config.issuer());
    println!("JWKS URL:       {}", config.jwks_url());
    println!("Token endpoint: {}", config.token_endpoint());
    println!("Login URL:      {}", config.login_url()?);
    if let Some(logout) = config.logout_url()? {
        println!("Logout URL:     {}", logout);
    }

    let keys = tokio::task::spawn_blocking(move || init_signing_keys(&config)).await??;

    let mut kids: Vec<&str> = keys.key_ids().collect();
    kids.sort_unstable();
    println!("Signing keys:   {}", kids.join(", "));

    Ok(())
}
