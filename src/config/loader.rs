//! Layered configuration loader
//!
//! Sources, lowest priority first:
//! 1. `default.toml` (required)
//! 2. `{environment}.toml`
//! 3. `local.toml`
//! 4. `AGENCY_*` environment variables, `__` separating nested keys
//! 5. Plain `PORT`, `GROQ_API_KEY`, `GEMINI_API_KEY`, `OPENAI_API_KEY`

use std::path::{Path, PathBuf};

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};

use crate::config::environment::Environment as AppEnvironment;
use crate::config::error::ConfigError;
use crate::config::settings::Settings;

const CONFIG_DIR_ENV: &str = "AGENCY_CONFIG_DIR";

const CONFIG_FILE_ENV: &str = "AGENCY_CONFIG_FILE";

const DEFAULT_CONFIG_DIR: &str = "config";

const ENV_PREFIX: &str = "AGENCY";

const ENV_SEPARATOR: &str = "__";

/// Unprefixed variables commonly set by hosting platforms and provider
/// dashboards, mapped onto their settings keys.
const PLAIN_ENV_OVERRIDES: &[(&str, &str)] = &[
    ("PORT", "server.port"),
    ("GROQ_API_KEY", "llm.groq.api_key"),
    ("GEMINI_API_KEY", "llm.gemini.api_key"),
    ("OPENAI_API_KEY", "llm.openai.api_key"),
];

/// Loads [`Settings`] from files and the process environment.
#[derive(Debug)]
pub struct ConfigLoader {
    config_dir: PathBuf,
    /// When set, layered loading is skipped and only this file is read
    config_file: Option<PathBuf>,
    environment: AppEnvironment,
}

impl ConfigLoader {
    /// Create a loader from `AGENCY_CONFIG_DIR`, `AGENCY_CONFIG_FILE` and
    /// `AGENCY_APP_ENV`.
    ///
    /// # Errors
    /// Returns an error if both `AGENCY_CONFIG_DIR` and `AGENCY_CONFIG_FILE`
    /// are set.
    pub fn new() -> Result<Self, ConfigError> {
        let dir_var = std::env::var(CONFIG_DIR_ENV).ok();
        let config_file = std::env::var(CONFIG_FILE_ENV).ok().map(PathBuf::from);

        if dir_var.is_some() && config_file.is_some() {
            return Err(ConfigError::mutual_exclusivity(format!(
                "{} and {} cannot both be set",
                CONFIG_DIR_ENV, CONFIG_FILE_ENV
            )));
        }

        Ok(Self {
            config_dir: dir_var
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR)),
            config_file,
            environment: AppEnvironment::from_env(),
        })
    }

    /// Create a loader that reads a single file instead of the layered directory.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            config_file: Some(path.into()),
            environment: AppEnvironment::from_env(),
        }
    }

    /// Override the environment used to pick `{environment}.toml`.
    pub fn with_environment(mut self, environment: AppEnvironment) -> Self {
        self.environment = environment;
        self
    }

    pub fn environment(&self) -> AppEnvironment {
        self.environment
    }

    /// Load, deserialize and validate the configuration.
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let settings: Settings = self.build_config()?.try_deserialize().map_err(|e| {
            ConfigError::ParseError(format!("Failed to deserialize configuration: {}", e))
        })?;

        settings.validate_for(self.environment)?;
        Ok(settings)
    }

    fn build_config(&self) -> Result<Config, ConfigError> {
        let builder = match &self.config_file {
            Some(file) => Self::add_file_source(Config::builder(), file, true)?,
            None => {
                let builder = Self::add_file_source(
                    Config::builder(),
                    &self.config_dir.join("default.toml"),
                    true,
                )?;
                let env_file = format!("{}.toml", self.environment.as_str());
                let builder =
                    Self::add_file_source(builder, &self.config_dir.join(env_file), false)?;
                Self::add_file_source(builder, &self.config_dir.join("local.toml"), false)?
            }
        };

        let builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator(ENV_SEPARATOR)
                .ignore_empty(true)
                .try_parsing(true),
        );

        Self::apply_plain_overrides(builder)?
            .build()
            .map_err(ConfigError::from)
    }

    fn add_file_source(
        builder: ConfigBuilder<DefaultState>,
        path: &Path,
        required: bool,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        if required && !path.exists() {
            return Err(ConfigError::file_not_found(path.display().to_string()));
        }

        let name = path.to_str().ok_or_else(|| {
            ConfigError::ParseError(format!("Non UTF-8 config path: {}", path.display()))
        })?;

        Ok(builder.add_source(File::new(name, FileFormat::Toml).required(required)))
    }

    fn apply_plain_overrides(
        mut builder: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        for (var, key) in PLAIN_ENV_OVERRIDES {
            let value = std::env::var(var).ok().filter(|v| !v.trim().is_empty());
            builder = builder.set_override_option(*key, value)?;
        }
        Ok(builder)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Serializes tests that touch process environment variables
    pub(crate) static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const MINIMAL: &str = r#"
[database]
url = "postgres://localhost/agency"
"#;

    fn setup_config_dir(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().expect("Failed to create temp dir");
        for (name, content) in files {
            fs::write(dir.path().join(name), content).expect("Failed to write config file");
        }
        dir
    }

    /// Sets variables for one test and restores the previous values on drop
    pub(crate) struct EnvGuard {
        saved: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        pub(crate) fn new() -> Self {
            Self { saved: Vec::new() }
        }

        pub(crate) fn set(&mut self, key: &str, value: &str) {
            self.saved.push((key.to_string(), std::env::var(key).ok()));
            unsafe { std::env::set_var(key, value) };
        }

        pub(crate) fn remove(&mut self, key: &str) {
            self.saved.push((key.to_string(), std::env::var(key).ok()));
            unsafe { std::env::remove_var(key) };
        }

        pub(crate) fn clear_overrides(&mut self) {
            for key in [
                CONFIG_DIR_ENV,
                CONFIG_FILE_ENV,
                AppEnvironment::ENV_VAR,
                "PORT",
                "GROQ_API_KEY",
                "GEMINI_API_KEY",
                "OPENAI_API_KEY",
                "AGENCY_SERVER__PORT",
                "AGENCY_JWT__SECRET",
                "AGENCY_LLM__OPENAI__MODEL",
            ] {
                self.remove(key);
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, value) in self.saved.iter().rev() {
                unsafe {
                    match value {
                        Some(v) => std::env::set_var(key, v),
                        None => std::env::remove_var(key),
                    }
                }
            }
        }
    }

    fn loader_for(dir: &TempDir) -> ConfigLoader {
        ConfigLoader {
            config_dir: dir.path().to_path_buf(),
            config_file: None,
            environment: AppEnvironment::Development,
        }
    }

    #[test]
    fn test_mutual_exclusivity() {
        let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let mut env = EnvGuard::new();
        env.clear_overrides();
        env.set(CONFIG_DIR_ENV, "/etc/agency");
        env.set(CONFIG_FILE_ENV, "/etc/agency/app.toml");

        let err = ConfigLoader::new().unwrap_err();
        assert!(matches!(err, ConfigError::MutualExclusivityError(_)));
    }

    #[test]
    fn test_missing_default_toml() {
        let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let dir = setup_config_dir(&[]);
        let err = loader_for(&dir).load().unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_layers_apply_in_order() {
        let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let mut env = EnvGuard::new();
        env.clear_overrides();

        let dir = setup_config_dir(&[
            ("default.toml", MINIMAL),
            ("development.toml", "[server]\nport = 4000\nhost = \"0.0.0.0\"\n"),
            ("local.toml", "[server]\nport = 5000\n"),
        ]);

        let settings = loader_for(&dir).load().unwrap();
        assert_eq!(settings.server.port, 5000);
        assert_eq!(settings.server.host, "0.0.0.0");
    }

    #[test]
    fn test_environment_selects_file() {
        let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let mut env = EnvGuard::new();
        env.clear_overrides();

        let dir = setup_config_dir(&[
            ("default.toml", MINIMAL),
            ("production.toml", "[notifications]\npoll_interval = 60\n"),
        ]);

        let settings = loader_for(&dir)
            .with_environment(AppEnvironment::Production)
            .load()
            .unwrap();
        assert_eq!(settings.notifications.poll_interval, 60);
    }

    #[test]
    fn test_prefixed_env_overrides_files() {
        let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let mut env = EnvGuard::new();
        env.clear_overrides();
        env.set("AGENCY_SERVER__PORT", "7000");

        let dir = setup_config_dir(&[("default.toml", MINIMAL)]);
        let settings = loader_for(&dir).load().unwrap();
        assert_eq!(settings.server.port, 7000);
    }

    #[test]
    fn test_plain_port_and_keys() {
        let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let mut env = EnvGuard::new();
        env.clear_overrides();
        env.set("PORT", "8080");
        env.set("OPENAI_API_KEY", "sk-test");

        let dir = setup_config_dir(&[("default.toml", MINIMAL)]);
        let settings = loader_for(&dir).load().unwrap();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.llm.openai.api_key(), Some("sk-test"));
        assert_eq!(settings.llm.groq.api_key(), None);
        assert_eq!(settings.llm.gemini.api_key(), None);
    }

    #[test]
    fn test_provider_key_alone_in_single_file_mode() {
        let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let mut env = EnvGuard::new();
        env.clear_overrides();
        env.set("OPENAI_API_KEY", "sk-only");
        env.set("AGENCY_LLM__OPENAI__MODEL", "gpt-4o");

        let dir = setup_config_dir(&[("agency.toml", MINIMAL)]);
        let settings = ConfigLoader::from_file(dir.path().join("agency.toml"))
            .load()
            .unwrap();
        assert_eq!(settings.llm.openai.api_key(), Some("sk-only"));
        assert_eq!(settings.llm.openai.model, "gpt-4o");
        assert_eq!(settings.llm.openai.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn test_production_needs_its_own_jwt_secret() {
        let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let mut env = EnvGuard::new();
        env.clear_overrides();

        let dir = setup_config_dir(&[("default.toml", MINIMAL)]);
        let err = loader_for(&dir)
            .with_environment(AppEnvironment::Production)
            .load()
            .unwrap_err();
        assert_eq!(err.field(), Some("jwt.secret"));

        env.set("AGENCY_JWT__SECRET", "production-secret-that-is-long-enough-123");
        let settings = loader_for(&dir)
            .with_environment(AppEnvironment::Production)
            .load()
            .unwrap();
        assert_eq!(settings.jwt.secret, "production-secret-that-is-long-enough-123");
    }

    #[test]
    fn test_single_file_mode() {
        let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let mut env = EnvGuard::new();
        env.clear_overrides();

        let dir = setup_config_dir(&[(
            "agency.toml",
            "[database]\nurl = \"postgres://db/agency\"\n[site]\nbase_url = \"https://agency.example\"\n",
        )]);
        let settings = ConfigLoader::from_file(dir.path().join("agency.toml"))
            .load()
            .unwrap();
        assert_eq!(settings.site.base_url, "https://agency.example");
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let mut env = EnvGuard::new();
        env.clear_overrides();

        let dir = setup_config_dir(&[(
            "default.toml",
            "[database]\nurl = \"postgres://localhost/agency\"\n[notifications]\npoll_interval = 0\n",
        )]);
        let err = loader_for(&dir).load().unwrap_err();
        assert_eq!(err.field(), Some("notifications.poll_interval"));
    }
}
