use clap::Parser;
use tracing::{info, warn};

use capsule_server::api::{self, AppState};
use capsule_server::config::CapsuleConfig;
use capsule_server::error::ServerError;
use capsule_server::telemetry;

/// Time capsule HTTP server.
#[derive(Parser, Debug)]
#[command(name = "capsule-server", about = "HTTP server for time capsules")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "capsule.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long, env = "HOST")]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Override the frontend directory.
    #[arg(long)]
    static_dir: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    telemetry::init();

    let cli = Cli::parse();
    let config = CapsuleConfig::load(&cli.config)?;

    let service = config.service_builder()?.build()?;
    info!(
        min_lead_minutes = config.capsules.min_lead_minutes,
        seeded = config.capsules.placement_seed.is_some(),
        "capsule service ready"
    );

    let mut app = api::router(AppState::new(service));
    if let Some(dir) = cli.static_dir.or(config.server.static_dir) {
        info!(dir = %dir, "serving frontend");
        app = api::with_frontend(app, dir);
    }

    // CLI / env overrides take precedence.
    let host = cli.host.unwrap_or(config.server.host);
    let port = cli.port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "capsule-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("capsule-server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
