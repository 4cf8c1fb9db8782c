use crate::tool::make_program;
use std::fmt;
use std::process::Command;

/// A missing external tool with actionable install instructions.
#[derive(Debug)]
pub struct MissingPrereq {
    pub name: &'static str,
    pub purpose: &'static str,
    pub install_hint: &'static str,
}

impl fmt::Display for MissingPrereq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  - {}: {} (install: {})",
            self.name, self.purpose, self.install_hint
        )
    }
}

pub(crate) fn command_exists(name: &str) -> bool {
    Command::new("which")
        .arg(name)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Check the external tools the real pipeline spawns.
/// Returns a list of missing items; empty means all prerequisites are met.
pub fn check_build_prereqs() -> Vec<MissingPrereq> {
    let mut missing = Vec::new();

    if !command_exists(make_program()) {
        missing.push(MissingPrereq {
            name: make_program(),
            purpose: "building and installing projects",
            install_hint: "apt install make | dnf install make | brew install make",
        });
    }

    if !command_exists("tar") {
        missing.push(MissingPrereq {
            name: "tar",
            purpose: "producing the package archive",
            install_hint: "part of the base system on any supported host",
        });
    }

    if !command_exists("lzip") {
        missing.push(MissingPrereq {
            name: "lzip",
            purpose: "compressing the package archive",
            install_hint: "apt install lzip | dnf install lzip | brew install lzip",
        });
    }

    missing
}

pub fn format_missing(missing: &[MissingPrereq]) -> String {
    let lines: Vec<String> = missing.iter().map(ToString::to_string).collect();
    format!("missing prerequisites:\n{}", lines.join("\n"))
}
