//! CLI command implementations

mod promote;
mod query;
mod register;


use serde::Serialize;
use std::path::Path;

use crate::cli::logging::init_tracing;
use crate::cli::LogLevel;
use crate::config::cli::DEFAULT_DATABASE;
use crate::config::{Cli, Command, OutputFormat, RegistryConfig};
use crate::storage::Registry;

/// Execute a CLI command based on the parsed arguments
pub fn run_command(cli: Cli) -> Result<(), String> {
    let log_level = LogLevel::from_flags(cli.verbose, cli.quiet);
    init_tracing(log_level);

    let registry = open_registry(cli.config.as_deref())?;

    match cli.command {
        Command::Register(args) => register::run_register(args, &registry, log_level),
        Command::Tag(args) => register::run_tag(args, &registry, log_level),
        Command::Promote(args) => promote::run_promote(args, &registry, log_level),
        Command::Show(args) => query::run_show(args, &registry),
        Command::List(args) => query::run_list(args, &registry),
        Command::Latest(args) => query::run_latest(args, &registry),
        Command::History(args) => query::run_history(args, &registry),
        Command::Compare(args) => query::run_compare(args, &registry),
    }
}

/// Open the registry named by `config`, or the default SQLite database
fn open_registry(config: Option<&Path>) -> Result<Registry, String> {
    let config = match config {
        Some(path) => RegistryConfig::from_yaml_file(path).map_err(|e| e.to_string())?,
        None => RegistryConfig::sqlite(DEFAULT_DATABASE),
    };
    Registry::open(&config).map_err(|e| format!("Failed to open registry: {e}"))
}

/// Serialize `value` for the structured formats; `None` means print a table
fn render<T: Serialize>(value: &T, format: OutputFormat) -> Result<Option<String>, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)
            .map(Some)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => serde_yaml::to_string(value)
            .map(Some)
            .map_err(|e| format!("YAML serialization failed: {e}")),
        OutputFormat::Table => Ok(None),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{head}…")
    }
}
