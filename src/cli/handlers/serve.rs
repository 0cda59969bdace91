//! Serve command handler

use crate::config::Settings;
use crate::error::AppResult;
use crate::server::Server;

pub struct ServeCommandHandler {
    config: Settings,
}

impl ServeCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Starts the server, or only reports the effective configuration
    /// when `dry_run` is set.
    pub async fn execute(self, dry_run: bool) -> anyhow::Result<()> {
        if dry_run {
            return Ok(self.validate_only()?);
        }
        Server::new(self.config).run().await
    }

    /// Validate configuration without starting the server
    pub fn validate_only(&self) -> AppResult<()> {
        self.config.validate()?;

        let providers: Vec<&str> = [
            ("groq", &self.config.llm.groq),
            ("gemini", &self.config.llm.gemini),
            ("openai", &self.config.llm.openai),
        ]
        .into_iter()
        .filter(|(_, provider)| provider.api_key().is_some())
        .map(|(name, _)| name)
        .collect();

        println!("✓ Configuration is valid");
        println!("✓ Server would bind to: {}", self.config.server.address());
        println!(
            "✓ Migrations on startup: {}",
            if self.config.database.auto_migrate { "yes" } else { "no" }
        );
        if providers.is_empty() {
            println!("! No LLM provider key configured");
        } else {
            println!("✓ LLM providers: {}", providers.join(", "));
        }
        if self.config.jobs.enabled {
            println!("✓ Daily post job: {}", self.config.jobs.daily_post_cron);
        }
        println!("Dry run completed successfully - configuration is ready for deployment");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Settings {
        let mut config = Settings::default();
        config.database.url = "postgres://localhost/agency_test".to_string();
        config
    }

    #[tokio::test]
    async fn test_dry_run() {
        assert!(ServeCommandHandler::new(valid_config()).execute(true).await.is_ok());
    }

    #[tokio::test]
    async fn test_dry_run_invalid_config() {
        let mut config = valid_config();
        config.server.port = 0;
        assert!(ServeCommandHandler::new(config).execute(true).await.is_err());
    }
}
