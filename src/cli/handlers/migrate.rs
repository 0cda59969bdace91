//! Migrate command handler
//!
//! Applies, previews or rolls back the embedded migrations.

use crate::config::Settings;
use crate::db::{pending_migrations, revert_migrations, run_pending_migrations};
use crate::error::AppResult;

pub struct MigrateCommandHandler {
    config: Settings,
}

impl MigrateCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Execute the migrate command with dry-run and rollback support
    ///
    /// # Arguments
    /// * `dry_run` - If true, lists pending migrations without applying them
    /// * `rollback` - Optional number of migrations to revert
    ///
    /// # Errors
    /// - Database configuration or connection errors
    /// - Migration execution errors
    pub async fn execute(&self, dry_run: bool, rollback: Option<u32>) -> AppResult<()> {
        self.config.database.validate()?;
        let url = &self.config.database.url;

        if dry_run {
            println!("Checking for pending migrations...");
            let pending = pending_migrations(url).await?;
            if pending.is_empty() {
                println!("✓ No pending migrations found. Database is up to date.");
            } else {
                println!("Found {} pending migration(s):", pending.len());
                for name in &pending {
                    println!("  - {}", name);
                }
                println!("Run without --dry-run to apply these migrations.");
            }
            return Ok(());
        }

        if let Some(steps) = rollback {
            println!("Rolling back {} migration(s)...", steps);
            let reverted = revert_migrations(url, steps).await?;
            for version in &reverted {
                println!("  ✓ Reverted migration: {}", version);
            }
            println!("✓ Successfully rolled back {} migration(s)", reverted.len());
        } else {
            println!("Running pending migrations...");
            let applied = run_pending_migrations(url).await?;
            if applied.is_empty() {
                println!("✓ No pending migrations to apply. Database is up to date.");
            } else {
                for version in &applied {
                    println!("  ✓ Applied migration: {}", version);
                }
                println!("✓ Successfully applied {} migration(s)", applied.len());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[tokio::test]
    async fn test_missing_database_url_fails_before_connecting() {
        let handler = MigrateCommandHandler::new(Settings::default());
        match handler.execute(true, None).await {
            Err(AppError::Configuration { key, .. }) => assert_eq!(key, "database.url"),
            other => panic!("Expected Configuration error, got {:?}", other),
        }
    }
}
