//! Config command - View and validate GroupTrack configuration
//!
//! Provides the `grouptrack config` CLI command which:
//! 1. Shows the effective configuration (YAML or JSON)
//! 2. Validates the configuration file and reports every error
//! 3. Prints the configuration file location

use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;
use grouptrack_core::config::Config;
use tracing::info;

use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the effective configuration
    Show,
    /// Validate the configuration file
    Validate,
    /// Print the configuration file path
    Path,
}

impl ConfigCommand {
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        match self {
            ConfigCommand::Show => execute_show(format, config_path),
            ConfigCommand::Validate => execute_validate(format, config_path),
            ConfigCommand::Path => {
                execute_path(format, config_path);
                Ok(())
            }
        }
    }
}

fn execute_show(format: OutputFormat, config_path: &Path) -> Result<()> {
    let formatter = get_formatter(format);
    let config = Config::load_or_default(config_path);

    info!(config_path = %config_path.display(), "Showing configuration");

    if format.is_json() {
        let json =
            serde_json::to_value(&config).context("Failed to serialize configuration to JSON")?;
        formatter.print_json(&json);
        return Ok(());
    }

    if config_path.exists() {
        formatter.success(&format!("Configuration ({})", config_path.display()));
    } else {
        formatter.success("Configuration (defaults, no file found)");
    }
    formatter.info("");

    let yaml =
        serde_yaml::to_string(&config).context("Failed to serialize configuration to YAML")?;
    for line in yaml.lines() {
        formatter.info(line);
    }
    Ok(())
}

fn execute_validate(format: OutputFormat, config_path: &Path) -> Result<()> {
    let formatter = get_formatter(format);

    let config = if config_path.exists() {
        match Config::load(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                let message = format!("Failed to parse configuration: {e}");
                if format.is_json() {
                    formatter.print_json(&serde_json::json!({
                        "valid": false,
                        "config_path": config_path.display().to_string(),
                        "errors": [message],
                    }));
                } else {
                    formatter.error(&message);
                    formatter.info(&format!("File: {}", config_path.display()));
                }
                anyhow::bail!("invalid configuration");
            }
        }
    } else {
        formatter.warn(&format!(
            "Configuration file not found at {}, validating defaults",
            config_path.display()
        ));
        Config::default()
    };

    info!(config_path = %config_path.display(), "Validating configuration");
    let errors = config.validate();

    if format.is_json() {
        let error_strings: Vec<String> = errors.iter().map(ToString::to_string).collect();
        formatter.print_json(&serde_json::json!({
            "valid": errors.is_empty(),
            "config_path": config_path.display().to_string(),
            "errors": error_strings,
        }));
    } else if errors.is_empty() {
        formatter.success("Configuration is valid");
        formatter.info(&format!("File: {}", config_path.display()));
    } else {
        formatter.error(&format!(
            "Configuration has {} error{}:",
            errors.len(),
            if errors.len() == 1 { "" } else { "s" }
        ));
        formatter.info(&format!("File: {}", config_path.display()));
        formatter.info("");
        for error in &errors {
            formatter.info(&format!("  {} - {}", error.field, error.message));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("invalid configuration")
    }
}

fn execute_path(format: OutputFormat, config_path: &Path) {
    if format.is_json() {
        get_formatter(format).print_json(&serde_json::json!({
            "config_path": config_path.display().to_string(),
            "exists": config_path.exists(),
        }));
    } else {
        println!("{}", config_path.display());
    }
}
