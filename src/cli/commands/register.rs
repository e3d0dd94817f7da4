//! Register and tag commands

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::cli::{RegisterArgs, TagArgs};
use crate::storage::registry::{source_ref_for_run, ModelMetadata, Tags};
use crate::storage::Registry;

use super::render;

pub fn run_register(args: RegisterArgs, registry: &Registry, log_level: LogLevel) -> Result<(), String> {
    let source_ref = match (&args.source_ref, &args.run_id) {
        (Some(source_ref), _) => source_ref.clone(),
        (None, Some(run_id)) => source_ref_for_run(run_id, &args.artifact_path),
        (None, None) => return Err("Either SOURCE_REF or --run-id is required".to_string()),
    };

    let mut tags = match &args.metadata {
        Some(path) => load_metadata(path)?.to_tags(),
        None => Tags::new(),
    };
    tags.extend(args.tags);

    log(
        log_level,
        LogLevel::Verbose,
        &format!("Registering {source_ref} under '{}' with {} tag(s)", args.lineage, tags.len()),
    );

    let version = registry
        .register_with_metadata(&args.lineage, &source_ref, &tags)
        .map_err(|e| format!("Failed to register version: {e}"))?;

    if let Some(out) = render(&version, args.format)? {
        println!("{out}");
        return Ok(());
    }

    log(
        log_level,
        LogLevel::Normal,
        &format!("Registered {} v{} ({})", version.lineage, version.version, version.source_ref),
    );
    Ok(())
}

pub fn run_tag(args: TagArgs, registry: &Registry, log_level: LogLevel) -> Result<(), String> {
    let tags: Tags = args.tags.into_iter().collect();

    registry
        .tag_version(&args.lineage, args.version, &tags)
        .map_err(|e| format!("Failed to set tags: {e}"))?;

    log(
        log_level,
        LogLevel::Normal,
        &format!("Set {} tag(s) on {} v{}", tags.len(), args.lineage, args.version),
    );
    for (key, value) in &tags {
        log(log_level, LogLevel::Verbose, &format!("  {key} = {value}"));
    }
    Ok(())
}

fn load_metadata(path: &std::path::Path) -> Result<ModelMetadata, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read metadata file {}: {e}", path.display()))?;
    serde_yaml::from_str(&content)
        .map_err(|e| format!("Failed to parse metadata file {}: {e}", path.display()))
}
