//! CLI argument parsing
//!
//! # Usage
//!
//! ```bash
//! registro register forecasting runs:/abc123/model --tag metric_mape=0.15
//! registro register forecasting --run-id abc123 --artifact-path model
//! registro promote forecasting 3 production
//! registro latest forecasting --stage production --format json
//! registro compare forecasting 2 3 --goal minimize
//! ```

mod core;
mod types;

pub use self::core::{
    parse_args, parse_key_value, parse_stage, Cli, Command, CompareArgs, HistoryArgs, LatestArgs, ListArgs,
    PromoteArgs, RegisterArgs, ShowArgs, TagArgs, DEFAULT_DATABASE,
};
pub use types::{GoalArg, OutputFormat};


#[cfg(test)]
mod property_tests;
