use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use stockroom::config::{get_config, CliArgs};
use stockroom::{create_app, db, run_migrations, AppState};
use tokio::signal;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Sets up console logging, plus daily-rotated JSON logs when a directory is given
///
/// The returned guard flushes the file writer on drop and must be held for
/// the life of the process.
fn init_tracing(debug: bool, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let default_level = if debug { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer());

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "stockroom.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            registry.init();
            None
        }
    }
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables before clap reads them
    dotenv::dotenv().ok();

    let args = CliArgs::parse();
    let debug = args.debug;

    // The log directory may come from the config file, so configuration is
    // resolved under a temporary console subscriber
    let config = tracing::subscriber::with_default(tracing_subscriber::fmt().finish(), || get_config(args));
    let _guard = init_tracing(debug, config.log_dir.as_deref());

    let pool = db::init_pool(&config.database_url)
        .with_context(|| format!("Failed to open database at {}", config.database_url))?;
    {
        let mut conn = pool.get().context("Failed to get a connection for migrations")?;
        run_migrations(&mut conn)?;
    }

    let state = AppState::new(Arc::new(pool)).with_reset_token_ttl(config.reset_token_ttl()?);
    let app = create_app(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}
