//! CLI argument parsing with clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::build;

/// Backend of the agency website
#[derive(Parser, Debug)]
#[command(name = "agency-rs")]
#[command(about = "Content, notification and AI-generation backend for an agency website")]
#[command(long_about = "
agency-rs serves the agency website API: blog posts and comments, the
notification inbox with its approve/reject workflow, LLM-backed content
generation and the XML sitemap.

EXAMPLES:
    # Start the server with default configuration
    agency-rs serve

    # Start server on custom host and port
    agency-rs serve --host 0.0.0.0 --port 8080

    # Check configuration without starting server
    agency-rs serve --dry-run

    # Run database migrations
    agency-rs migrate

    # Write the sitemap to a file
    agency-rs sitemap --output public/sitemap.xml

    # Follow the admin inbox of a running server
    agency-rs watch --api-url http://localhost:3000 --token $TOKEN
")]
#[command(version = build::CLAP_LONG_VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path
    ///
    /// Read only this TOML file instead of the layered `config/` directory.
    /// Environment variable overrides still apply.
    #[arg(short, long, value_name = "FILE", value_parser = super::validation::validate_config_file_path)]
    pub config: Option<PathBuf>,

    /// Override environment detection
    ///
    /// Selects `config/{environment}.toml`. Defaults to `AGENCY_APP_ENV`.
    #[arg(short, long, value_enum)]
    pub env: Option<Environment>,

    /// Enable verbose logging (debug level)
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the web server (default)
    ///
    /// Examples:
    ///   agency-rs serve                            # Start with defaults
    ///   agency-rs serve --host 0.0.0.0 --port 80   # Bind to all interfaces on port 80
    ///   agency-rs serve --dry-run                  # Validate config without starting
    Serve {
        /// Host address to bind to
        #[arg(long, value_name = "ADDRESS", value_parser = super::validation::validate_host_address)]
        host: Option<String>,

        /// Port number to listen on
        #[arg(short, long, value_name = "PORT", value_parser = super::validation::validate_port)]
        port: Option<u16>,

        /// Log level override, wins over --verbose/--quiet
        #[arg(long, value_enum)]
        log_level: Option<LogLevel>,

        /// Validate configuration and exit
        #[arg(long)]
        dry_run: bool,
    },
    /// Database migration operations
    ///
    /// Examples:
    ///   agency-rs migrate                    # Apply all pending migrations
    ///   agency-rs migrate --dry-run          # Show pending migrations without applying
    ///   agency-rs migrate --rollback 3       # Rollback the last 3 migrations
    Migrate {
        /// Show pending migrations without applying
        #[arg(long, conflicts_with = "rollback")]
        dry_run: bool,

        /// Number of migrations to rollback (1-100)
        #[arg(long, value_name = "STEPS", conflicts_with = "dry_run", value_parser = super::validation::validate_rollback_steps)]
        rollback: Option<u32>,
    },
    /// Render the XML sitemap from the database
    ///
    /// Writes to stdout unless --output is given.
    Sitemap {
        /// File to write the sitemap to
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Follow a notification inbox of a running server
    ///
    /// Keeps a live list in the terminal and accepts commands on stdin:
    /// `read ID`, `read-all`, `approve ID`, `reject ID [COMMENT]`,
    /// `delete ID`, `refresh`, `quit`.
    Watch {
        /// Server root, e.g. http://localhost:3000
        #[arg(long, value_name = "URL", value_parser = super::validation::validate_api_url)]
        api_url: String,

        /// Bearer access token
        #[arg(long, value_name = "TOKEN", env = "AGENCY_API_TOKEN", hide_env_values = true)]
        token: String,

        /// Inbox to follow; admins only, defaults to every inbox
        #[arg(long, value_name = "ID")]
        user_id: Option<i32>,
    },
}

/// Environment options
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Environment {
    #[value(name = "development", alias = "dev")]
    Development,
    #[value(name = "test")]
    Test,
    #[value(name = "staging")]
    Staging,
    #[value(name = "production", alias = "prod")]
    Production,
}

/// Log level options
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum LogLevel {
    #[value(name = "error")]
    Error,
    #[value(name = "warn", alias = "warning")]
    Warn,
    #[value(name = "info")]
    Info,
    #[value(name = "debug")]
    Debug,
    #[value(name = "trace")]
    Trace,
}

impl Cli {
    /// Argument combinations clap cannot express
    pub fn validate(&self) -> Result<(), String> {
        if let Some(Commands::Serve {
            host: Some(host),
            port: Some(port),
            ..
        }) = &self.command
            && host == "0.0.0.0"
            && *port < 1024
        {
            return Err(
                "Binding to 0.0.0.0 on a privileged port (< 1024) typically requires root privileges"
                    .to_string(),
            );
        }
        if let Some(Commands::Watch { token, .. }) = &self.command
            && token.trim().is_empty()
        {
            return Err("--token cannot be empty".to_string());
        }

        Ok(())
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => "error".to_string(),
            LogLevel::Warn => "warn".to_string(),
            LogLevel::Info => "info".to_string(),
            LogLevel::Debug => "debug".to_string(),
            LogLevel::Trace => "trace".to_string(),
        }
    }
}

impl From<Environment> for crate::config::Environment {
    fn from(env: Environment) -> Self {
        match env {
            Environment::Development => crate::config::Environment::Development,
            Environment::Test => crate::config::Environment::Test,
            Environment::Staging => crate::config::Environment::Staging,
            Environment::Production => crate::config::Environment::Production,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_behavior() {
        let cli = Cli::try_parse_from(["agency-rs"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
        assert!(cli.env.is_none());
    }

    #[test]
    fn test_serve_command() {
        let cli =
            Cli::try_parse_from(["agency-rs", "serve", "--host", "0.0.0.0", "--port", "8080"])
                .unwrap();
        match cli.command {
            Some(Commands::Serve {
                host,
                port,
                dry_run,
                ..
            }) => {
                assert_eq!(host.as_deref(), Some("0.0.0.0"));
                assert_eq!(port, Some(8080));
                assert!(!dry_run);
            }
            other => panic!("Expected Serve command, got {:?}", other),
        }
    }

    #[test]
    fn test_migrate_flags_conflict() {
        let err = Cli::try_parse_from(["agency-rs", "migrate", "--dry-run", "--rollback", "2"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_sitemap_output() {
        let cli = Cli::try_parse_from(["agency-rs", "sitemap", "-o", "out.xml"]).unwrap();
        match cli.command {
            Some(Commands::Sitemap { output }) => {
                assert_eq!(output, Some(PathBuf::from("out.xml")))
            }
            other => panic!("Expected Sitemap command, got {:?}", other),
        }
    }

    #[test]
    fn test_watch_command() {
        let cli = Cli::try_parse_from([
            "agency-rs",
            "watch",
            "--api-url",
            "http://localhost:3000",
            "--token",
            "abc",
            "--user-id",
            "4",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Watch {
                api_url,
                token,
                user_id,
            }) => {
                assert_eq!(api_url, "http://localhost:3000");
                assert_eq!(token, "abc");
                assert_eq!(user_id, Some(4));
            }
            other => panic!("Expected Watch command, got {:?}", other),
        }
    }

    #[test]
    fn test_watch_rejects_bad_url() {
        assert!(
            Cli::try_parse_from(["agency-rs", "watch", "--api-url", "ftp://x", "--token", "t"])
                .is_err()
        );
    }

    #[test]
    fn test_conflicting_verbose_quiet() {
        let err = Cli::try_parse_from(["agency-rs", "--verbose", "--quiet"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_privileged_port_on_all_interfaces() {
        let cli = Cli::try_parse_from(["agency-rs", "serve", "--host", "0.0.0.0", "--port", "80"])
            .unwrap();
        assert!(cli.validate().is_err());
    }
}
