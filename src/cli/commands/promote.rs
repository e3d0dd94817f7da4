//! Stage promotion command

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::cli::PromoteArgs;
use crate::storage::Registry;

use super::render;

pub fn run_promote(args: PromoteArgs, registry: &Registry, log_level: LogLevel) -> Result<(), String> {
    let archive_existing = !args.no_archive && registry.archive_existing();

    let report = registry
        .promote(&args.lineage, args.version, args.stage, archive_existing)
        .map_err(|e| format!("Failed to promote version: {e}"))?;

    if let Some(out) = render(&report, args.format)? {
        println!("{out}");
        return Ok(());
    }

    for archived in &report.archived {
        log(
            log_level,
            LogLevel::Normal,
            &format!("Archived {} v{archived}", report.lineage),
        );
    }

    let summary = if report.was_noop() {
        format!("{} v{} already in {}", report.lineage, report.version, report.to_stage)
    } else {
        format!(
            "{} v{}: {} -> {}",
            report.lineage, report.version, report.from_stage, report.to_stage
        )
    };
    log(log_level, LogLevel::Normal, &summary);
    Ok(())
}
