use super::{json_pretty, load_plan, spin_fail, spin_ok, spinner, EXIT_SUCCESS};
use galaxian_core::{
    check_build_prereqs, format_missing, select_archiver, select_tool, Engine, RunPaths,
};
use galaxian_manifest::normalize_targets;
use std::path::Path;

pub fn run(
    config: &Path,
    platforms: &[String],
    tool_name: &str,
    archiver_name: &str,
    out: Option<&Path>,
    json: bool,
) -> Result<u8, String> {
    let mut plan = load_plan(config)?;
    if !platforms.is_empty() {
        plan.targets = normalize_targets(&platforms.join(","));
    }

    let tool = select_tool(tool_name).map_err(|e| e.to_string())?;
    let archiver = select_archiver(archiver_name).map_err(|e| e.to_string())?;

    // Probe the external tools up front, unless only mocks are in play.
    let real_backends = tool_name == "make" || archiver_name == "tar-lzip";
    if real_backends && std::env::var("GALAXIAN_SKIP_PREREQS").as_deref() != Ok("1") {
        let missing = check_build_prereqs();
        if !missing.is_empty() {
            return Err(format_missing(&missing));
        }
    }

    let mut paths = RunPaths::create().map_err(|e| format!("pipeline error: {e}"))?;
    if let Some(out) = out {
        std::fs::create_dir_all(out).map_err(|e| format!("pipeline error: {e}"))?;
        paths.output_dir = out.to_path_buf();
    }
    if !json {
        println!("run directory: {}", paths.output_dir.display());
    }

    let engine = Engine::new(tool, archiver);
    let pb = if json {
        None
    } else {
        Some(spinner(&format!(
            "building {} {} for {}...",
            plan.ident,
            plan.version,
            plan.targets.join(", ")
        )))
    };

    let report = match engine.run(&plan, &paths) {
        Ok(r) => {
            if let Some(ref pb) = pb {
                spin_ok(pb, "package built");
            }
            r
        }
        Err(e) => {
            if let Some(ref pb) = pb {
                spin_fail(pb, "build failed");
            }
            return Err(format!("pipeline error: {e}"));
        }
    };

    if json {
        let payload = serde_json::json!({
            "ident": plan.ident,
            "version": plan.version,
            "targets": plan.targets,
            "sources_fetched": report.sources_fetched,
            "units_built": report.units.len(),
            "archive": report.archive,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!(
            "fetched {} source(s), built {} unit(s)",
            report.sources_fetched,
            report.units.len()
        );
        println!(
            "{} {}",
            console::Style::new().green().apply_to("archive:"),
            report.archive.display()
        );
    }
    Ok(EXIT_SUCCESS)
}
