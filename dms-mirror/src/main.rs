//! dms-mirror - Mirror DMS build artifacts into a Maven repository
//!
//! `dms-mirror run` mirrors every configured component and exits non-zero
//! if any component failed. `dms-mirror serve` runs the webhook receiver.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use dms_mirror::clients::HttpClientFactory;
use dms_mirror::mirror::{Driver, SharedConfig};
use dms_mirror::settings::{Cli, Command, MirrorArgs};
use dms_mirror::{build_router, AppState};
use dms_mirror_common::config::{ComponentsConfig, GenericComponentTemplate};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting dms-mirror v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let mut args = cli.args;
    args.absolutize_paths()
        .context("Failed to resolve configuration file paths")?;
    args.log_summary();

    let shared = load_shared_config(&args)?;
    let factory = Arc::new(HttpClientFactory::new(args));

    match cli.command {
        Command::Run => {
            let report = Driver::new(shared, factory).run().await;
            report.into_result().context("Mirroring failed")?;
            info!("Finished");
        }
        Command::Serve { ws_bind } => {
            let app = build_router(AppState::new(shared, factory));

            let listener = tokio::net::TcpListener::bind(&ws_bind)
                .await
                .with_context(|| format!("Failed to bind to {}", ws_bind))?;
            info!("dms-mirror listening on http://{}", ws_bind);
            info!("Health check: http://{}/health", ws_bind);

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
                .context("Server error")?;
            info!("Server shutdown complete");
        }
    }

    Ok(())
}

fn load_shared_config(args: &MirrorArgs) -> Result<SharedConfig> {
    info!("Reading components configuration: [{}]", args.config_file.display());
    let components = ComponentsConfig::load(&args.config_file)
        .context("Failed to load components configuration")?;
    let generic = GenericComponentTemplate::load_optional(&args.gav_template_config_file)
        .context("Failed to load generic GAV template configuration")?;

    Ok(SharedConfig::new(args.mirror_settings(), components, generic))
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
