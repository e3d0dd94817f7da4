//! Registro CLI
//!
//! # Usage
//!
//! ```bash
//! # Register a version and tag it
//! registro register forecasting runs:/abc123/model --tag metric_mape=0.15
//!
//! # Promote, archiving the current Production holder
//! registro promote forecasting 3 production
//!
//! # Inspect
//! registro latest forecasting --stage production
//! registro history forecasting --format json
//!
//! # Use a registry configuration file
//! registro --config registry.yaml list forecasting
//! ```

use clap::Parser;
use registro::cli::{run_command, Cli};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
