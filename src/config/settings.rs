//! Configuration settings structures
//!
//! Every section deserializes with defaults so that a partial TOML file (or
//! none beyond `default.toml`) still yields a complete [`Settings`].

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::config::error::ConfigError;
use crate::logger::{ConsoleConfig, FileConfig, LogFormat, LoggerConfig};

// ============================================================================
// Default value functions
// ============================================================================

fn default_app_name() -> String {
    "agency-rs".to_string()
}

fn default_app_version() -> String {
    crate::pkg_version().to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connection_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_path() -> String {
    "logs/agency.log".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

/// Development signing secret; refused when the environment is production
pub const DEV_JWT_SECRET: &str = "change-me-in-production-this-is-not-a-secret";

fn default_jwt_secret() -> String {
    DEV_JWT_SECRET.to_string()
}

fn default_access_token_expiration() -> i64 {
    1
}

fn default_refresh_token_expiration() -> i64 {
    24 * 7
}

fn default_poll_interval() -> u64 {
    30
}

fn default_notification_request_timeout() -> u64 {
    10
}

fn default_retry_base_delay_ms() -> u64 {
    1_000
}

fn default_retry_max_delay_ms() -> u64 {
    10_000
}

fn default_notification_max_retries() -> u32 {
    3
}

fn default_channel_capacity() -> usize {
    256
}

fn default_llm_timeout() -> u64 {
    60
}

fn default_llm_max_tokens() -> u32 {
    2048
}

fn default_llm_temperature() -> f32 {
    0.7
}

fn default_site_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_daily_topics() -> Vec<String> {
    [
        "content marketing strategy",
        "search engine optimisation",
        "social media advertising",
        "brand storytelling",
        "email marketing automation",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_daily_post_cron() -> String {
    // sec min hour day month weekday
    "0 0 9 * * *".to_string()
}

fn default_job_timeout() -> u64 {
    300
}

// ============================================================================
// Application Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    #[serde(default = "default_app_name")]
    pub name: String,

    #[serde(default = "default_app_version")]
    pub version: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            version: default_app_version(),
        }
    }
}

// ============================================================================
// Server Configuration
// ============================================================================

/// Axum HTTP server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    /// Overridden by the plain `PORT` environment variable when present
    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins allowed by CORS; empty means any origin
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

impl ServerConfig {
    /// Get the full server address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

// ============================================================================
// Database Configuration
// ============================================================================

/// Diesel database connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,

    /// Run pending migrations on `serve` startup
    #[serde(default)]
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connection_timeout: default_connection_timeout(),
            auto_migrate: false,
        }
    }
}

// ============================================================================
// JWT Configuration
// ============================================================================

/// JWT authentication configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Signing secret, supply it through `AGENCY_JWT__SECRET` in production
    #[serde(default = "default_jwt_secret")]
    pub secret: String,

    /// Access token lifetime in hours
    #[serde(default = "default_access_token_expiration")]
    pub access_token_expiration: i64,

    /// Refresh token lifetime in hours
    #[serde(default = "default_refresh_token_expiration")]
    pub refresh_token_expiration: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: default_jwt_secret(),
            access_token_expiration: default_access_token_expiration(),
            refresh_token_expiration: default_refresh_token_expiration(),
        }
    }
}

// ============================================================================
// Logger Settings
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Colours are only emitted when stdout is a terminal
    #[serde(default = "default_true")]
    pub colored: bool,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            colored: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_log_path")]
    pub path: String,

    #[serde(default = "default_true")]
    pub append: bool,

    /// One of "full", "compact", "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_log_path(),
            append: true,
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerSettings {
    /// Any `EnvFilter` directive; plain levels are validated
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub console: ConsoleSettings,

    #[serde(default)]
    pub file: FileSettings,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            console: ConsoleSettings::default(),
            file: FileSettings::default(),
        }
    }
}

impl LoggerSettings {
    /// Convert the file representation into the runtime logger configuration.
    pub fn into_logger_config(self) -> Result<LoggerConfig, ConfigError> {
        let format = self
            .file
            .format
            .parse::<LogFormat>()
            .map_err(|e| ConfigError::validation("logger.file.format", e.to_string()))?;

        let console = ConsoleConfig::new(self.console.enabled, self.console.colored);
        let file = FileConfig::new(
            self.file.enabled,
            PathBuf::from(self.file.path),
            self.file.append,
            format,
        );

        LoggerConfig::new(console, file, self.level)
            .map_err(|e| ConfigError::validation("logger", e.to_string()))
    }
}

// ============================================================================
// Notification Feed Configuration
// ============================================================================

/// Timing of the notification feed: polling, per-call timeout and the
/// capped exponential backoff applied to failed fetches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// Poll interval in seconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,

    /// Upper bound for one store call in seconds
    #[serde(default = "default_notification_request_timeout")]
    pub request_timeout: u64,

    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,

    #[serde(default = "default_notification_max_retries")]
    pub max_retries: u32,

    /// Capacity of the change-event broadcast channel
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl NotificationSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            request_timeout: default_notification_request_timeout(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
            max_retries: default_notification_max_retries(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

// ============================================================================
// LLM Provider Configuration
// ============================================================================

/// One upstream text-generation provider. A provider without an API key is
/// skipped by the fallback chain.
///
/// Fields left out of a `[llm.<provider>]` table (or a table created only by
/// an `*_API_KEY` variable) fall back to that provider's defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub base_url: String,

    #[serde(default)]
    pub model: String,
}

impl ProviderSettings {
    /// The key, when set to something other than whitespace
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    fn or_defaults(mut self, defaults: ProviderSettings) -> Self {
        if self.base_url.trim().is_empty() {
            self.base_url = defaults.base_url;
        }
        if self.model.trim().is_empty() {
            self.model = defaults.model;
        }
        self
    }
}

fn groq_provider<'de, D: Deserializer<'de>>(d: D) -> Result<ProviderSettings, D::Error> {
    ProviderSettings::deserialize(d).map(|p| p.or_defaults(default_groq()))
}

fn gemini_provider<'de, D: Deserializer<'de>>(d: D) -> Result<ProviderSettings, D::Error> {
    ProviderSettings::deserialize(d).map(|p| p.or_defaults(default_gemini()))
}

fn openai_provider<'de, D: Deserializer<'de>>(d: D) -> Result<ProviderSettings, D::Error> {
    ProviderSettings::deserialize(d).map(|p| p.or_defaults(default_openai()))
}

fn default_groq() -> ProviderSettings {
    ProviderSettings {
        api_key: None,
        base_url: "https://api.groq.com/openai/v1".to_string(),
        model: "llama-3.3-70b-versatile".to_string(),
    }
}

fn default_gemini() -> ProviderSettings {
    ProviderSettings {
        api_key: None,
        base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        model: "gemini-1.5-flash".to_string(),
    }
}

fn default_openai() -> ProviderSettings {
    ProviderSettings {
        api_key: None,
        base_url: "https://api.openai.com/v1".to_string(),
        model: "gpt-4o-mini".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(default = "default_groq", deserialize_with = "groq_provider")]
    pub groq: ProviderSettings,

    #[serde(default = "default_gemini", deserialize_with = "gemini_provider")]
    pub gemini: ProviderSettings,

    #[serde(default = "default_openai", deserialize_with = "openai_provider")]
    pub openai: ProviderSettings,

    /// Per-provider request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout: u64,

    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_llm_temperature")]
    pub temperature: f32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            groq: default_groq(),
            gemini: default_gemini(),
            openai: default_openai(),
            timeout: default_llm_timeout(),
            max_tokens: default_llm_max_tokens(),
            temperature: default_llm_temperature(),
        }
    }
}

// ============================================================================
// Site & Jobs Configuration
// ============================================================================

/// Public site information used by the sitemap and the daily post job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSettings {
    /// Absolute base URL without a trailing slash
    #[serde(default = "default_site_url")]
    pub base_url: String,

    /// Topics the daily post job rotates through
    #[serde(default = "default_daily_topics")]
    pub daily_topics: Vec<String>,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            base_url: default_site_url(),
            daily_topics: default_daily_topics(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Whether the scheduler starts with `serve`
    #[serde(default)]
    pub enabled: bool,

    /// Six-field cron expression for the daily AI post
    #[serde(default = "default_daily_post_cron")]
    pub daily_post_cron: String,

    /// Job execution timeout in seconds
    #[serde(default = "default_job_timeout")]
    pub job_timeout: u64,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            daily_post_cron: default_daily_post_cron(),
            job_timeout: default_job_timeout(),
        }
    }
}

// ============================================================================
// Main Settings Structure
// ============================================================================

/// Complete application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub application: ApplicationConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub jwt: JwtConfig,

    #[serde(default)]
    pub logger: LoggerSettings,

    #[serde(default)]
    pub notifications: NotificationSettings,

    #[serde(default)]
    pub llm: LlmSettings,

    #[serde(default)]
    pub site: SiteSettings,

    #[serde(default)]
    pub jobs: JobsConfig,
}
