pub mod build;
pub mod plan;

use galaxian_manifest::{interpret, BuildPlan, IniDocument};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_MANIFEST_ERROR: u8 = 2;
pub const EXIT_PIPELINE_ERROR: u8 = 3;

/// Read, parse, and interpret a manifest. Any failure here aborts before
/// the pipeline has had a chance to touch the network or the filesystem.
pub fn load_plan(config: &Path) -> Result<BuildPlan, String> {
    let text = std::fs::read_to_string(config)
        .map_err(|e| format!("manifest error: failed to read {}: {e}", config.display()))?;
    let doc = IniDocument::parse(&text).map_err(|e| format!("manifest error: {e}"))?;
    interpret(&doc).map_err(|e| format!("manifest error: {e}"))
}

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .expect("valid template")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✓ {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✗ {msg}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn json_pretty_serializes_value() {
        let val = serde_json::json!({"key": "value"});
        let result = json_pretty(&val).unwrap();
        assert!(result.contains("\"key\""));
        assert!(result.contains("\"value\""));
    }

    #[test]
    fn load_plan_reports_missing_file_as_manifest_error() {
        let err = load_plan(Path::new("/no/such/galaxian.ini")).unwrap_err();
        assert!(err.starts_with("manifest error:"));
    }

    #[test]
    fn load_plan_reports_syntax_errors_with_line_numbers() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"ident=x\nver=1\ntp=GBA\nstray text\n").unwrap();
        let err = load_plan(file.path()).unwrap_err();
        assert!(err.starts_with("manifest error:"));
        assert!(err.contains("line 4"), "{err}");
    }
}
