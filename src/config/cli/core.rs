//! Core CLI structures

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::types::{GoalArg, OutputFormat};
use crate::storage::ModelStage;

/// Database used when no `--config` is given
pub const DEFAULT_DATABASE: &str = "registro.db";

/// Registro: model version registry with stage promotion
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "registro")]
#[command(version)]
#[command(about = "Model version registry with archive-on-promote stage transitions")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Registry configuration file (YAML)
    #[arg(short, long, global = true, value_name = "CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Register a new version of a lineage
    Register(RegisterArgs),

    /// Set tags on an existing version
    Tag(TagArgs),

    /// Move a version into a stage
    Promote(PromoteArgs),

    /// Show one version with its tags
    Show(ShowArgs),

    /// List versions of a lineage
    List(ListArgs),

    /// Latest version per stage
    Latest(LatestArgs),

    /// Stage transition history of a lineage
    History(HistoryArgs),

    /// Compare metrics of two versions
    Compare(CompareArgs),
}

/// Arguments for the register command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct RegisterArgs {
    /// Lineage name
    pub lineage: String,

    /// Artifact location, e.g. runs:/<run-id>/model
    #[arg(required_unless_present = "run_id", conflicts_with = "run_id")]
    pub source_ref: Option<String>,

    /// Build the source reference from a tracking run id
    #[arg(long)]
    pub run_id: Option<String>,

    /// Artifact path inside the run
    #[arg(long, default_value = "model", requires = "run_id")]
    pub artifact_path: String,

    /// Tag to attach (repeatable)
    #[arg(short, long = "tag", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub tags: Vec<(String, String)>,

    /// Model metadata file (YAML)
    #[arg(short, long, value_name = "FILE")]
    pub metadata: Option<PathBuf>,

    /// Output format (table, json, yaml)
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the tag command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct TagArgs {
    /// Lineage name
    pub lineage: String,

    /// Version number
    pub version: u32,

    /// Tags to set
    #[arg(value_name = "KEY=VALUE", value_parser = parse_key_value, required = true)]
    pub tags: Vec<(String, String)>,
}

/// Arguments for the promote command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct PromoteArgs {
    /// Lineage name
    pub lineage: String,

    /// Version number
    pub version: u32,

    /// Target stage (none, staging, production, archived)
    #[arg(value_parser = parse_stage)]
    pub stage: ModelStage,

    /// Leave current holders of the stage in place
    #[arg(long)]
    pub no_archive: bool,

    /// Output format (table, json, yaml)
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the show command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ShowArgs {
    /// Lineage name
    pub lineage: String,

    /// Version number
    pub version: u32,

    /// Output format (table, json, yaml)
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the list command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ListArgs {
    /// Lineage name
    pub lineage: String,

    /// Only versions in this stage (repeatable)
    #[arg(short, long = "stage", value_parser = parse_stage)]
    pub stages: Vec<ModelStage>,

    /// Output format (table, json, yaml)
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the latest command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct LatestArgs {
    /// Lineage name
    pub lineage: String,

    /// Only this stage (repeatable, default all)
    #[arg(short, long = "stage", value_parser = parse_stage)]
    pub stages: Vec<ModelStage>,

    /// Output format (table, json, yaml)
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the history command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct HistoryArgs {
    /// Lineage name
    pub lineage: String,

    /// Output format (table, json, yaml)
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the compare command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct CompareArgs {
    /// Lineage name
    pub lineage: String,

    /// Baseline version
    pub v1: u32,

    /// Candidate version
    pub v2: u32,

    /// Whether larger (maximize) or smaller (minimize) metrics are better
    #[arg(short, long, default_value = "maximize")]
    pub goal: GoalArg,

    /// Output format (table, json, yaml)
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Parse a `KEY=VALUE` pair. The value may contain further `=`.
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("Invalid tag '{s}': expected KEY=VALUE"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("Invalid tag '{s}': key is empty"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Parse a stage name without regard to case
pub fn parse_stage(s: &str) -> Result<ModelStage, String> {
    ModelStage::ALL
        .into_iter()
        .find(|stage| stage.as_str().eq_ignore_ascii_case(s.trim()))
        .ok_or_else(|| {
            format!("Unknown stage: {s}. Valid stages: none, staging, production, archived")
        })
}

/// Parse CLI arguments from a string slice (for testing)
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}
