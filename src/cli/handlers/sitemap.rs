//! Sitemap command handler
//!
//! Renders the same document as `GET /sitemap.xml`, for static hosting.

use std::path::Path;

use tracing::info;

use crate::config::Settings;
use crate::db::establish_async_connection_pool;
use crate::error::{AppError, AppResult};
use crate::repositories::PostRepository;
use crate::services::SitemapService;

pub struct SitemapCommandHandler {
    config: Settings,
}

impl SitemapCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Writes the sitemap to `output`, or stdout when absent.
    pub async fn execute(&self, output: Option<&Path>) -> AppResult<()> {
        self.config.database.validate()?;
        self.config.site.validate()?;

        let pool = establish_async_connection_pool(&self.config.database).await?;
        let service = SitemapService::new(PostRepository::new(pool), &self.config.site.base_url);
        let xml = service.generate().await?;

        match output {
            Some(path) => {
                write_sitemap(path, &xml).await?;
                info!(path = %path.display(), bytes = xml.len(), "Sitemap written");
                println!("✓ Sitemap written to {}", path.display());
            }
            None => print!("{}", xml),
        }
        Ok(())
    }
}

async fn write_sitemap(path: &Path, xml: &str) -> AppResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| io_error(path, e))?;
    }
    tokio::fs::write(path, xml)
        .await
        .map_err(|e| io_error(path, e))
}

fn io_error(path: &Path, e: std::io::Error) -> AppError {
    AppError::Internal {
        source: anyhow::anyhow!("Failed to write sitemap to {}: {}", path.display(), e),
    }
}
