//! CLI value types

use crate::storage::registry::MetricGoal;

/// Output format for query commands
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" | "text" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "yaml" => Ok(OutputFormat::Yaml),
            _ => Err(format!(
                "Unknown output format: {s}. Valid formats: table, json, yaml"
            )),
        }
    }
}

/// Metric goal for the compare command
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GoalArg {
    #[default]
    Maximize,
    Minimize,
}

impl std::str::FromStr for GoalArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "maximize" | "max" => Ok(GoalArg::Maximize),
            "minimize" | "min" => Ok(GoalArg::Minimize),
            _ => Err(format!("Unknown goal: {s}. Valid goals: maximize, minimize")),
        }
    }
}

impl From<GoalArg> for MetricGoal {
    fn from(goal: GoalArg) -> Self {
        match goal {
            GoalArg::Maximize => MetricGoal::Maximize,
            GoalArg::Minimize => MetricGoal::Minimize,
        }
    }
}
