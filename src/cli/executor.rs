//! Command dispatch after parsing and configuration loading.

use super::handlers::{
    MigrateCommandHandler, ServeCommandHandler, SitemapCommandHandler, WatchCommandHandler,
};
use super::parser::{Cli, Commands};
use crate::config::Settings;
use crate::error::{AppError, AppResult};

/// Runs the parsed command; no subcommand means `serve`.
///
/// # Errors
/// Argument validation failures and whatever the handler returns
pub async fn execute_command(cli: &Cli, settings: Settings) -> anyhow::Result<()> {
    validate_command_args(cli)?;

    match &cli.command {
        Some(Commands::Serve { dry_run, .. }) => {
            ServeCommandHandler::new(settings).execute(*dry_run).await
        }
        None => ServeCommandHandler::new(settings).execute(false).await,
        Some(Commands::Migrate { dry_run, rollback }) => Ok(MigrateCommandHandler::new(settings)
            .execute(*dry_run, *rollback)
            .await?),
        Some(Commands::Sitemap { output }) => Ok(SitemapCommandHandler::new(settings)
            .execute(output.as_deref())
            .await?),
        Some(Commands::Watch {
            api_url,
            token,
            user_id,
        }) => Ok(WatchCommandHandler::new(settings)
            .execute(api_url, token, *user_id)
            .await?),
    }
}

fn validate_command_args(cli: &Cli) -> AppResult<()> {
    cli.validate().map_err(|reason| AppError::Validation {
        field: "cli_arguments".to_string(),
        reason,
    })?;

    if let Some(Commands::Migrate {
        rollback: Some(steps),
        ..
    }) = &cli.command
        && *steps > 50
    {
        eprintln!(
            "Warning: Rolling back {} migrations is a large operation. Consider using smaller steps.",
            steps
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn valid_config() -> Settings {
        let mut config = Settings::default();
        config.database.url = "postgres://localhost/agency_test".to_string();
        config
    }

    #[tokio::test]
    async fn test_serve_dry_run_does_not_bind() {
        let cli = Cli::try_parse_from(["agency-rs", "serve", "--dry-run"]).unwrap();
        assert!(execute_command(&cli, valid_config()).await.is_ok());
    }

    #[test]
    fn test_validate_plain_serve() {
        let cli = Cli::try_parse_from(["agency-rs", "serve", "--port", "8080"]).unwrap();
        assert!(validate_command_args(&cli).is_ok());
    }

    #[test]
    fn test_validate_rejects_privileged_wildcard_bind() {
        let cli = Cli {
            command: Some(Commands::Serve {
                host: Some("0.0.0.0".to_string()),
                port: Some(443),
                log_level: None,
                dry_run: false,
            }),
            config: None,
            env: None,
            verbose: false,
            quiet: false,
        };
        match validate_command_args(&cli) {
            Err(AppError::Validation { field, .. }) => assert_eq!(field, "cli_arguments"),
            other => panic!("Expected Validation, got {:?}", other),
        }
    }
}
