//! HTTP server lifecycle: startup, background jobs and graceful shutdown.

use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

use crate::api::create_router;
use crate::config::{Environment, Settings};
use crate::db::{establish_async_connection_pool, run_pending_migrations};
use crate::jobs::JobScheduler;
use crate::state::AppState;

pub struct Server {
    settings: Settings,
}

impl Server {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Start the server and run until a shutdown signal arrives.
    ///
    /// Steps: optional migrations, pool, state, optional job scheduler,
    /// then `axum::serve` with graceful shutdown. The scheduler is stopped
    /// after the listener has drained.
    ///
    /// # Errors
    /// - Migration or connection pool failures
    /// - Address binding errors
    /// - Server runtime errors
    pub async fn run(self) -> anyhow::Result<()> {
        let settings = self.settings;

        info!(
            app_name = %settings.application.name,
            app_version = %settings.application.version,
            environment = %Environment::from_env().as_str(),
            "Application starting"
        );
        info!(
            max_connections = settings.database.max_connections,
            min_connections = settings.database.min_connections,
            auto_migrate = settings.database.auto_migrate,
            "Database configuration loaded"
        );
        info!(
            poll_interval_secs = settings.notifications.poll_interval,
            channel_capacity = settings.notifications.channel_capacity,
            site = %settings.site.base_url,
            jobs_enabled = settings.jobs.enabled,
            "Service configuration loaded"
        );

        if settings.database.auto_migrate {
            let applied = run_pending_migrations(&settings.database.url).await?;
            info!(count = applied.len(), "Pending migrations applied");
        }

        let pool = establish_async_connection_pool(&settings.database).await?;
        info!("Database connection pool initialized");

        let scheduler_settings = settings.clone();
        let address = settings.server.address();
        let state = AppState::new(pool, settings);

        let providers = state.services.content.configured_providers();
        if providers.is_empty() {
            warn!("No LLM provider key configured, generation endpoints will fail");
        } else {
            info!(providers = ?providers, "LLM providers configured");
        }

        let scheduler = if scheduler_settings.jobs.enabled {
            let scheduler =
                JobScheduler::from_settings(state.services.clone(), &scheduler_settings).await?;
            scheduler.start().await?;
            Some(scheduler)
        } else {
            None
        };

        let router = create_router(state);

        let listener = TcpListener::bind(&address).await.map_err(|e| {
            error!(error = %e, address = %address, "Failed to bind to address");
            anyhow::anyhow!("Failed to bind to {}: {}", address, e)
        })?;
        info!(address = %address, "Server listening");

        let served = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await;

        if let Some(scheduler) = scheduler
            && let Err(e) = scheduler.stop().await
        {
            warn!(error = %e, "Job scheduler did not stop cleanly");
        }

        served?;
        info!("Server shutdown complete");
        Ok(())
    }
}

/// Waits for Ctrl+C or SIGTERM.
pub(crate) async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
