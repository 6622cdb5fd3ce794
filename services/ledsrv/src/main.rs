//! LED display bridge service (ledsrv)

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use common::shutdown::shutdown_on_signal;
use ledsrv::api::{create_router, AppState};
use ledsrv::bootstrap::{self, Args};
use ledsrv::datasource::SqlDataSource;
use ledsrv::{DisplayRegistry, MonitorContext, Supervisor, TcpDisplayTransport};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = args.load_config().context("Failed to load configuration")?;
    let _log_guard = bootstrap::initialize_logging(&args, &config)?;

    info!("Starting {} v{}", bootstrap::SERVICE_NAME, env!("CARGO_PKG_VERSION"));
    let registry = Arc::new(DisplayRegistry::new(config.registry_path.clone()));

    // Validation mode: validate and exit
    if args.service.validate {
        let report = bootstrap::validate_registry(&registry).await?;
        info!(
            "Validation finished: {} valid, {} invalid display record(s)",
            report.valid.len(),
            report.invalid.len()
        );
        if !report.invalid.is_empty() {
            anyhow::bail!("{} invalid display record(s)", report.invalid.len());
        }
        return Ok(());
    }

    let source = SqlDataSource::connect_lazy(&config.database_url, config.send_timeout())
        .context("Failed to create data source")?;
    let ctx = MonitorContext {
        source: Arc::new(source),
        transport: Arc::new(TcpDisplayTransport::new(config.send_timeout())),
        registry: Arc::clone(&registry),
        empty_value: config.empty_value.clone(),
    };

    let shutdown_token = CancellationToken::new();
    let supervisor = Supervisor::start(ctx, shutdown_token.child_token()).await?;

    let server_handle = if args.no_api {
        info!("Admin API disabled");
        None
    } else {
        let addr = config.api.bind_address();
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind admin API to {}", addr))?;
        info!("Admin API listening on http://{}", addr);
        info!("Health check: http://{}/health", addr);

        let app = create_router(AppState::new(Arc::clone(&registry)));
        let server_token = shutdown_token.clone();
        Some(tokio::spawn(async move {
            let shutdown = async move { server_token.cancelled().await };
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
            {
                error!("Server error: {}", e);
            }
        }))
    };

    shutdown_on_signal(shutdown_token.clone()).await;
    supervisor.shutdown().await;
    if let Some(handle) = server_handle {
        if let Err(e) = handle.await {
            error!("Admin API task ended abnormally: {}", e);
        }
    }

    info!("{} stopped", bootstrap::SERVICE_NAME);
    Ok(())
}
