//! Read-only registry queries: show, list, latest, history, compare

use crate::config::cli::{CompareArgs, HistoryArgs, LatestArgs, ListArgs, ShowArgs};
use crate::storage::registry::{ArtifactVersion, ModelStage, VersionRecord};
use crate::storage::Registry;

use super::{render, truncate};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn stage_filter(stages: &[ModelStage]) -> Option<&[ModelStage]> {
    if stages.is_empty() {
        None
    } else {
        Some(stages)
    }
}

pub fn run_show(args: ShowArgs, registry: &Registry) -> Result<(), String> {
    let version = registry
        .get(&args.lineage, args.version)
        .map_err(|e| format!("Failed to get version: {e}"))?;
    let tags = registry
        .get_tags(&args.lineage, args.version)
        .map_err(|e| format!("Failed to get tags: {e}"))?;
    let record = VersionRecord { version, tags };

    if let Some(out) = render(&record, args.format)? {
        println!("{out}");
        return Ok(());
    }

    let v = &record.version;
    println!("Version: {} v{}", v.lineage, v.version);
    println!("  Source:  {}", v.source_ref);
    println!("  Stage:   {}", v.stage);
    println!("  Created: {}", v.created_at.format(TIME_FORMAT));
    if !record.tags.is_empty() {
        println!("\n  Tags ({}):", record.tags.len());
        for (key, value) in &record.tags {
            println!("    {:<24} {value}", truncate(key, 22));
        }
    }
    Ok(())
}

pub fn run_list(args: ListArgs, registry: &Registry) -> Result<(), String> {
    let versions = registry
        .list(&args.lineage, stage_filter(&args.stages))
        .map_err(|e| format!("Failed to list versions: {e}"))?;

    if let Some(out) = render(&versions, args.format)? {
        println!("{out}");
        return Ok(());
    }

    if versions.is_empty() {
        eprintln!("No versions of '{}' match", args.lineage);
        return Ok(());
    }
    print_version_table(&versions);
    println!("\n{} version(s)", versions.len());
    Ok(())
}

pub fn run_latest(args: LatestArgs, registry: &Registry) -> Result<(), String> {
    let records = registry
        .latest(&args.lineage, stage_filter(&args.stages))
        .map_err(|e| format!("Failed to get latest versions: {e}"))?;

    if let Some(out) = render(&records, args.format)? {
        println!("{out}");
        return Ok(());
    }

    if records.is_empty() {
        eprintln!("No versions of '{}' in the requested stages", args.lineage);
        return Ok(());
    }
    let versions: Vec<ArtifactVersion> = records.into_iter().map(|r| r.version).collect();
    print_version_table(&versions);
    Ok(())
}

pub fn run_history(args: HistoryArgs, registry: &Registry) -> Result<(), String> {
    let history = registry
        .history(&args.lineage)
        .map_err(|e| format!("Failed to get history: {e}"))?;

    if let Some(out) = render(&history, args.format)? {
        println!("{out}");
        return Ok(());
    }

    if history.is_empty() {
        eprintln!("No stage transitions recorded for '{}'", args.lineage);
        return Ok(());
    }

    println!("{:<20} {:<8} {:<11} {:<11} {:<16} REASON", "TIME", "VERSION", "FROM", "TO", "USER");
    println!("{}", "-".repeat(90));
    for t in &history {
        println!(
            "{:<20} {:<8} {:<11} {:<11} {:<16} {}",
            t.timestamp.format(TIME_FORMAT),
            t.version,
            t.from_stage,
            t.to_stage,
            truncate(t.user.as_deref().unwrap_or("-"), 14),
            t.reason.as_deref().unwrap_or(""),
        );
    }
    Ok(())
}

pub fn run_compare(args: CompareArgs, registry: &Registry) -> Result<(), String> {
    let comparison = registry
        .compare_versions(&args.lineage, args.v1, args.v2, args.goal.into())
        .map_err(|e| format!("Failed to compare versions: {e}"))?;

    if let Some(out) = render(&comparison, args.format)? {
        println!("{out}");
        return Ok(());
    }

    println!("{:<24} {:>14}", "METRIC", format!("v{} - v{}", comparison.v2, comparison.v1));
    println!("{}", "-".repeat(39));
    for (metric, diff) in &comparison.metric_diffs {
        println!("{:<24} {:>+14.6}", truncate(metric, 22), diff);
    }
    if !comparison.unmatched.is_empty() {
        println!("\nNot compared: {}", comparison.unmatched.join(", "));
    }
    println!("\n{}", comparison.summary);
    Ok(())
}

fn print_version_table(versions: &[ArtifactVersion]) {
    println!("{:<8} {:<11} {:<20} SOURCE", "VERSION", "STAGE", "CREATED");
    println!("{}", "-".repeat(80));
    for v in versions {
        println!(
            "{:<8} {:<11} {:<20} {}",
            v.version,
            v.stage,
            v.created_at.format(TIME_FORMAT),
            v.source_ref,
        );
    }
}
