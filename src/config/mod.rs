//! Configuration management
//!
//! Layered TOML files plus `AGENCY_*` environment overrides, see
//! [`loader`] for the precedence order.

pub mod environment;
pub mod error;
pub mod loader;
pub mod settings;
pub mod validation;

pub use environment::Environment;
pub use loader::ConfigLoader;
pub use settings::{
    DatabaseConfig, JobsConfig, JwtConfig, LlmSettings, NotificationSettings, ProviderSettings,
    Settings, SiteSettings,
};
