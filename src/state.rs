//! Application state for Axum web framework.

use std::sync::Arc;

use crate::config::{JwtConfig, Settings};
use crate::db::AsyncDbPool;
use crate::repositories::Repositories;
use crate::services::Services;

/// Shared handles for every request handler.
///
/// Cloning is cheap: services and the pool are reference counted and the
/// settings sit behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    /// Direct pool access for health checks
    pub db_pool: AsyncDbPool,
    pub jwt_config: JwtConfig,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Builds repositories and services on top of `pool`.
    ///
    /// # Example
    /// ```ignore
    /// let pool = establish_async_connection_pool(&settings.database).await?;
    /// let state = AppState::new(pool, settings);
    /// ```
    pub fn new(pool: AsyncDbPool, settings: Settings) -> Self {
        let services = Services::new(Repositories::new(pool.clone()), &settings);
        Self {
            services,
            db_pool: pool,
            jwt_config: settings.jwt.clone(),
            settings: Arc::new(settings),
        }
    }
}
