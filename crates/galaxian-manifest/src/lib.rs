//! Manifest parsing and interpretation for Galaxian.
//!
//! This crate defines the input layer: the strict INI-like manifest dialect
//! (`IniDocument`), section classification (`SectionKind`), and the typed
//! build plan (`BuildPlan`) consumed by the orchestration engine. Parsing is
//! pure text-to-structure work; nothing here touches the network or the
//! filesystem.

pub mod ini;
pub mod plan;

pub use ini::{IniDocument, IniError, IniSection};
pub use plan::{
    interpret, normalize_targets, BuildPlan, PlanError, ProjectSpec, SectionKind, SourceSpec,
    ENABLED_VALUE, PROJECT_SUFFIX, SOURCE_SUFFIX,
};
