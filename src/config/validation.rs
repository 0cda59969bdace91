//! Configuration validation logic
//!
//! Each section validates itself; [`Settings::validate`] returns the first
//! failure in section order.

use crate::config::environment::Environment;
use crate::config::error::ConfigError;
use crate::config::settings::{
    DEV_JWT_SECRET, DatabaseConfig, JobsConfig, JwtConfig, LlmSettings, LoggerSettings, NotificationSettings,
    ProviderSettings, ServerConfig, Settings, SiteSettings,
};

const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

const VALID_LOG_FORMATS: &[&str] = &["full", "compact", "json"];

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::validation(
                "server.port",
                "Port must be between 1 and 65535.",
            ));
        }

        if self.host.trim().is_empty() {
            return Err(ConfigError::validation("server.host", "Host cannot be empty."));
        }

        Ok(())
    }
}

impl DatabaseConfig {
    /// # Validation Rules
    /// - URL must be a PostgreSQL connection string
    /// - Pool bounds must be positive and ordered
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.is_empty() {
            return Err(ConfigError::validation(
                "database.url",
                "Database URL is required. Set AGENCY_DATABASE__URL or database.url.",
            ));
        }

        if !["postgres://", "postgresql://"]
            .iter()
            .any(|scheme| self.url.starts_with(scheme))
        {
            return Err(ConfigError::validation(
                "database.url",
                "Expected format: postgres://[user:password@]host[:port]/database",
            ));
        }

        if self.max_connections == 0 {
            return Err(ConfigError::validation(
                "database.max_connections",
                "Max connections must be greater than 0.",
            ));
        }

        if self.min_connections > self.max_connections {
            return Err(ConfigError::validation(
                "database.min_connections",
                format!(
                    "Min connections ({}) cannot exceed max connections ({}).",
                    self.min_connections, self.max_connections
                ),
            ));
        }

        Ok(())
    }
}

impl JwtConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.len() < 32 {
            return Err(ConfigError::validation(
                "jwt.secret",
                "JWT secret should be at least 32 characters.",
            ));
        }

        if self.access_token_expiration <= 0 || self.refresh_token_expiration <= 0 {
            return Err(ConfigError::validation(
                "jwt",
                "Token expirations must be positive.",
            ));
        }

        if self.access_token_expiration >= self.refresh_token_expiration {
            return Err(ConfigError::validation(
                "jwt",
                "Refresh token expiration should be longer than access token expiration.",
            ));
        }

        Ok(())
    }
}

impl JwtConfig {
    /// Production must not sign tokens with the published development secret.
    pub fn validate_for_production(&self) -> Result<(), ConfigError> {
        if self.secret == DEV_JWT_SECRET {
            return Err(ConfigError::validation(
                "jwt.secret",
                "The development JWT secret cannot be used in production. Set AGENCY_JWT__SECRET.",
            ));
        }
        Ok(())
    }
}

impl LoggerSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Directive strings such as "agency_rs=debug,tower_http=info" are left
        // to EnvFilter; only bare levels are checked here
        let level = self.level.to_lowercase();
        if !level.contains('=') && !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::validation(
                "logger.level",
                format!(
                    "Invalid log level '{}'. Valid levels are: {}",
                    self.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            ));
        }

        if self.file.enabled && self.file.path.trim().is_empty() {
            return Err(ConfigError::validation(
                "logger.file.path",
                "File path is required when file logging is enabled.",
            ));
        }

        if !VALID_LOG_FORMATS.contains(&self.file.format.to_lowercase().as_str()) {
            return Err(ConfigError::validation(
                "logger.file.format",
                format!(
                    "Invalid log format '{}'. Valid formats are: {}",
                    self.file.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            ));
        }

        if !self.console.enabled && !self.file.enabled {
            return Err(ConfigError::validation(
                "logger",
                "At least one output (console or file) must be enabled.",
            ));
        }

        Ok(())
    }
}

impl NotificationSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval == 0 {
            return Err(ConfigError::validation(
                "notifications.poll_interval",
                "Poll interval must be at least 1 second.",
            ));
        }

        if self.request_timeout == 0 {
            return Err(ConfigError::validation(
                "notifications.request_timeout",
                "Request timeout must be at least 1 second.",
            ));
        }

        if self.retry_base_delay_ms == 0 || self.retry_base_delay_ms > self.retry_max_delay_ms {
            return Err(ConfigError::validation(
                "notifications.retry_base_delay_ms",
                "Base delay must be positive and not exceed retry_max_delay_ms.",
            ));
        }

        if self.channel_capacity == 0 {
            return Err(ConfigError::validation(
                "notifications.channel_capacity",
                "Channel capacity must be greater than 0.",
            ));
        }

        Ok(())
    }
}

impl ProviderSettings {
    fn validate(&self, name: &str) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::validation(
                format!("llm.{}.base_url", name),
                format!("Base URL '{}' must start with http:// or https://", self.base_url),
            ));
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::validation(
                format!("llm.{}.model", name),
                "Model name cannot be empty.".to_string(),
            ));
        }

        Ok(())
    }
}

impl LlmSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.groq.validate("groq")?;
        self.gemini.validate("gemini")?;
        self.openai.validate("openai")?;

        if self.timeout == 0 {
            return Err(ConfigError::validation(
                "llm.timeout",
                "Provider timeout must be at least 1 second.",
            ));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::validation(
                "llm.temperature",
                "Temperature must be between 0.0 and 2.0.",
            ));
        }

        Ok(())
    }
}

impl SiteSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::validation(
                "site.base_url",
                "Site base URL must be absolute.",
            ));
        }

        if self.base_url.ends_with('/') {
            return Err(ConfigError::validation(
                "site.base_url",
                "Site base URL must not end with '/'.",
            ));
        }

        Ok(())
    }
}

impl JobsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.daily_post_cron.split_whitespace().count() != 6 {
            return Err(ConfigError::validation(
                "jobs.daily_post_cron",
                "Cron expression needs six fields: sec min hour day month weekday.",
            ));
        }

        if self.job_timeout == 0 {
            return Err(ConfigError::validation(
                "jobs.job_timeout",
                "Job timeout must be greater than 0.",
            ));
        }

        Ok(())
    }
}

impl Settings {
    /// Validate all configuration sections, returning the first failure.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.database.validate()?;
        self.jwt.validate()?;
        self.logger.validate()?;
        self.notifications.validate()?;
        self.llm.validate()?;
        self.site.validate()?;
        self.jobs.validate()?;
        Ok(())
    }

    /// [`validate`](Self::validate) plus the checks that only apply to
    /// `environment`.
    pub fn validate_for(&self, environment: Environment) -> Result<(), ConfigError> {
        self.validate()?;
        if environment.is_production() {
            self.jwt.validate_for_production()?;
        }
        Ok(())
    }
}
