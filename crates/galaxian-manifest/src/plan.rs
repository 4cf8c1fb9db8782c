use crate::ini::IniDocument;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Section-name suffix marking a fetchable upstream source.
pub const SOURCE_SUFFIX: &str = ".src";
/// Section-name suffix marking a buildable project.
pub const PROJECT_SUFFIX: &str = ".proj";
/// Literal value of the `enabled` key that keeps a project in the plan.
/// Compared verbatim — the dialect never trims values.
pub const ENABLED_VALUE: &str = "1";

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("missing required global key '{0}' in manifest")]
    MissingGlobal(&'static str),
    #[error("section '{section}' is missing required key '{key}'")]
    MissingKey { section: String, key: &'static str },
}

/// What role a section plays, decided by its name suffix.
///
/// `Unknown` covers the global region and any future section kind; the
/// interpreter leaves those untouched instead of guessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind<'a> {
    Source(&'a str),
    Project(&'a str),
    Unknown,
}

impl<'a> SectionKind<'a> {
    pub fn of(name: &'a str) -> Self {
        if let Some(ident) = name.strip_suffix(SOURCE_SUFFIX) {
            SectionKind::Source(ident)
        } else if let Some(ident) = name.strip_suffix(PROJECT_SUFFIX) {
            SectionKind::Project(ident)
        } else {
            SectionKind::Unknown
        }
    }
}

/// One upstream archive to fetch and verify.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceSpec {
    pub ident: String,
    pub url: String,
    /// Expected hex SHA2-256 digest; compared case-insensitively.
    pub sha2_256sum: String,
}

/// One buildable unit inside an extracted source tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectSpec {
    pub ident: String,
    /// Ident of the source whose extracted tree hosts this project.
    pub source: String,
    /// Working directory relative to that tree.
    pub workdir: String,
}

/// Typed view of a manifest: everything the pipeline needs, nothing of the
/// raw section mapping. Pure data — constructing one has no side effects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildPlan {
    pub ident: String,
    pub version: String,
    /// Requested target platforms, uppercased, first-seen order, no dupes.
    pub targets: Vec<String>,
    pub sources: Vec<SourceSpec>,
    pub projects: Vec<ProjectSpec>,
}

/// Walk a parsed manifest into a [`BuildPlan`].
///
/// Global keys `ident`, `ver`, and `tp` are required. `*.src` sections need
/// `url` and `sha2_256sum`; `*.proj` sections need `src`, `cwd`, and
/// `enabled`, and only those with `enabled=1` are kept. Sections of any
/// other name are ignored.
pub fn interpret(doc: &IniDocument) -> Result<BuildPlan, PlanError> {
    let globals = doc.global();
    let ident = require_global(globals, "ident")?;
    let version = require_global(globals, "ver")?;
    let targets = normalize_targets(require_global(globals, "tp")?);

    let mut sources = Vec::new();
    let mut projects = Vec::new();
    for (name, pairs) in doc.sections() {
        match SectionKind::of(name) {
            SectionKind::Source(id) => {
                sources.push(SourceSpec {
                    ident: id.to_owned(),
                    url: require(pairs, name, "url")?.clone(),
                    sha2_256sum: require(pairs, name, "sha2_256sum")?.clone(),
                });
            }
            SectionKind::Project(id) => {
                let source = require(pairs, name, "src")?;
                let workdir = require(pairs, name, "cwd")?;
                let enabled = require(pairs, name, "enabled")?;
                if enabled != ENABLED_VALUE {
                    continue;
                }
                projects.push(ProjectSpec {
                    ident: id.to_owned(),
                    source: source.clone(),
                    workdir: workdir.clone(),
                });
            }
            SectionKind::Unknown => {}
        }
    }

    Ok(BuildPlan {
        ident: ident.clone(),
        version: version.clone(),
        targets,
        sources,
        projects,
    })
}

/// Comma-split, uppercase, drop empty tokens, dedupe keeping first-seen
/// order. Tokens are otherwise taken verbatim.
pub fn normalize_targets(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for token in raw.split(',') {
        let token = token.to_uppercase();
        if !token.is_empty() && !out.contains(&token) {
            out.push(token);
        }
    }
    out
}

fn require_global<'a>(
    globals: &'a BTreeMap<String, String>,
    key: &'static str,
) -> Result<&'a String, PlanError> {
    globals.get(key).ok_or(PlanError::MissingGlobal(key))
}

fn require<'a>(
    pairs: &'a BTreeMap<String, String>,
    section: &str,
    key: &'static str,
) -> Result<&'a String, PlanError> {
    pairs.get(key).ok_or_else(|| PlanError::MissingKey {
        section: section.to_owned(),
        key,
    })
}
