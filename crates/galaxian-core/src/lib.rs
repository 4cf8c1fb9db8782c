//! Build orchestration for Galaxian.
//!
//! This crate implements the pipeline layer: target platform rules and
//! staging-root layout (`platform`), the pluggable external build tool seam
//! (`tool`), the run engine driving fetch → build → install → package
//! (`engine`), the output archiver (`package`), prerequisite probing
//! (`prereq`), and operator interrupt handling (`interrupt`).

pub mod engine;
pub mod interrupt;
pub mod package;
pub mod platform;
pub mod prereq;
pub mod tool;

pub use engine::{BuildUnit, Engine, RunPaths, RunReport, UnitState};
pub use interrupt::{install_signal_handler, interrupted};
pub use package::{archive_file_name, package, select_archiver, Archiver, MockArchiver, TarLzip};
pub use platform::{host_target, is_hosting, short_name, staging_root};
pub use prereq::{check_build_prereqs, format_missing, MissingPrereq};
pub use tool::{make_program, select_tool, BuildTool, Make, MockTool, ToolAction, ToolCall};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("build I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Fetch(#[from] galaxian_fetch::FetchError),
    #[error("unknown target platform token '{0}'")]
    UnknownPlatform(String),
    #[error("cannot build for hosting platform {target} from a {host} host")]
    PlatformMismatch { target: String, host: String },
    #[error("unsupported host operating system '{0}'")]
    UnknownHost(String),
    #[error("no such tool backend '{0}'")]
    NoSuchTool(String),
    #[error("build tool '{tool}' failed ({status}):\n{output}")]
    ToolFailed {
        tool: String,
        status: String,
        output: String,
    },
    #[error("archiver '{tool}' failed ({status}):\n{output}")]
    ArchiverFailed {
        tool: String,
        status: String,
        output: String,
    },
    #[error("failed to move package into place ({reason}); partial archive kept at {kept}")]
    ArchiveMove { kept: String, reason: String },
    #[error("interrupted by operator")]
    Interrupted,
}

/// Stdout and stderr of a finished child, concatenated for diagnostics.
pub(crate) fn combined_output(output: &std::process::Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.is_empty() {
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&stderr);
    }
    text
}
