// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI argument parsing and command definitions.
//!
//! - `serve`: Start the decision endpoint (default)
//! - `validate`: Validate the configuration file
//! - `version`: Show version information

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use vigil_config::LogConfig;

// =============================================================================
// Main CLI Structure
// =============================================================================

/// Vigil - identity-aware access decision proxy.
///
/// Sits in front of upstream services, authenticates every request against
/// the configured rule pipelines and answers allow/deny/redirect decisions.
#[derive(Parser, Debug)]
#[command(
    name = "vigil",
    author = "Sylvex <contact@sylvex.io>",
    version = vigil_core::VERSION,
    about = "Identity-aware access decision proxy",
    long_about = None,
    propagate_version = true
)]
pub struct Cli {
    /// Configuration file path
    #[arg(
        short,
        long,
        default_value = "vigil.yaml",
        env = "VIGIL_CONFIG_FILE",
        global = true
    )]
    pub config: PathBuf,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(short, long, env = "VIGIL_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Log format override (text, json, compact)
    #[arg(long, env = "VIGIL_LOG_FORMAT", global = true)]
    pub log_format: Option<LogFormat>,

    /// Enable quiet mode (warnings and errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

// =============================================================================
// Subcommands
// =============================================================================

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the decision endpoint
    ///
    /// This is the default command when no subcommand is specified.
    Serve(ServeArgs),

    /// Validate the configuration file
    ///
    /// Parses the configuration, builds every mechanism prototype and rule,
    /// and reports configuration errors without serving.
    Validate(ValidateArgs),

    /// Show detailed version information
    Version,
}

// =============================================================================
// Command Arguments
// =============================================================================

/// Arguments for the `serve` command.
#[derive(Args, Debug, Default, Clone)]
pub struct ServeArgs {
    /// Validate the configuration and exit without binding the listener
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `validate` command.
#[derive(Args, Debug, Default, Clone)]
pub struct ValidateArgs {
    /// List the configured rules after validation
    #[arg(short, long)]
    pub show_rules: bool,
}

// =============================================================================
// Enums
// =============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for structured logging
    Json,
    /// Compact format for minimal output
    Compact,
}

impl From<LogFormat> for vigil_config::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Text => vigil_config::LogFormat::Text,
            LogFormat::Json => vigil_config::LogFormat::Json,
            LogFormat::Compact => vigil_config::LogFormat::Compact,
        }
    }
}

// =============================================================================
// Helper Methods
// =============================================================================

impl Cli {
    /// Get the effective command, defaulting to `Serve` if none specified.
    pub fn effective_command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Serve(ServeArgs::default()))
    }

    /// The effective log level: quiet/verbose flags win, then the explicit
    /// override, then the configuration file.
    pub fn effective_log_level<'a>(&'a self, config: &'a LogConfig) -> &'a str {
        if self.quiet {
            "warn"
        } else if self.verbose {
            "debug"
        } else {
            self.log_level.as_deref().unwrap_or(&config.level)
        }
    }

    /// The effective log format: the CLI override wins over the
    /// configuration file.
    pub fn effective_log_format(&self, config: &LogConfig) -> vigil_config::LogFormat {
        self.log_format.map(Into::into).unwrap_or(config.format)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command() {
        let cli = Cli::parse_from(["vigil"]);
        assert!(cli.command.is_none());
        assert!(matches!(cli.effective_command(), Commands::Serve(_)));
    }

    #[test]
    fn test_serve_dry_run() {
        let cli = Cli::parse_from(["vigil", "serve", "--dry-run"]);
        if let Some(Commands::Serve(args)) = cli.command {
            assert!(args.dry_run);
        } else {
            panic!("Expected Serve command");
        }
    }

    #[test]
    fn test_config_path() {
        let cli = Cli::parse_from(["vigil", "-c", "/etc/vigil/config.yaml"]);
        assert_eq!(cli.config, PathBuf::from("/etc/vigil/config.yaml"));
    }

    #[test]
    fn test_log_level_precedence() {
        let config = LogConfig {
            level: "info".to_string(),
            ..Default::default()
        };

        let cli = Cli::parse_from(["vigil"]);
        assert_eq!(cli.effective_log_level(&config), "info");

        let cli = Cli::parse_from(["vigil", "-l", "trace"]);
        assert_eq!(cli.effective_log_level(&config), "trace");

        let cli = Cli::parse_from(["vigil", "-q"]);
        assert_eq!(cli.effective_log_level(&config), "warn");

        let cli = Cli::parse_from(["vigil", "-v"]);
        assert_eq!(cli.effective_log_level(&config), "debug");
    }

    #[test]
    fn test_log_format_override() {
        let config = LogConfig::default();

        let cli = Cli::parse_from(["vigil", "--log-format", "json"]);
        assert_eq!(
            cli.effective_log_format(&config),
            vigil_config::LogFormat::Json
        );

        let cli = Cli::parse_from(["vigil"]);
        assert_eq!(
            cli.effective_log_format(&config),
            vigil_config::LogFormat::Text
        );
    }

    #[test]
    fn test_validate_command() {
        let cli = Cli::parse_from(["vigil", "validate", "--show-rules"]);
        if let Some(Commands::Validate(args)) = cli.command {
            assert!(args.show_rules);
        } else {
            panic!("Expected Validate command");
        }
    }
}
