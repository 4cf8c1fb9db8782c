use crate::interrupt::interrupted;
use crate::package::{package, Archiver};
use crate::platform::{host_target, staging_root};
use crate::tool::BuildTool;
use crate::CoreError;
use galaxian_fetch::fetch_verify_extract;
use galaxian_manifest::{BuildPlan, ProjectSpec};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

/// Filesystem locations of one pipeline run.
///
/// The directories persist past the process; removing them afterward is the
/// caller's responsibility, not the engine's.
#[derive(Debug, Clone)]
pub struct RunPaths {
    /// Where sources are extracted (`<dir>/<source-ident>/...`).
    pub sources_dir: PathBuf,
    /// Package tree accumulating staged installs; archived at the end.
    pub package_dir: PathBuf,
    /// Where the final archive lands.
    pub output_dir: PathBuf,
}

impl RunPaths {
    /// Fresh run directories under a new temp root.
    pub fn create() -> std::io::Result<Self> {
        let base = tempfile::Builder::new()
            .prefix("galaxian-")
            .tempdir()?
            .keep();
        Ok(Self {
            sources_dir: base.join("sources"),
            package_dir: base.join("pkg"),
            output_dir: base,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    Pending,
    ValidatingPlatform,
    Building,
    Installing,
    Done,
    Failed,
}

/// One (project, target platform) build unit and its progress.
#[derive(Debug, Clone)]
pub struct BuildUnit {
    pub project: ProjectSpec,
    pub target: String,
    pub state: UnitState,
}

/// What a completed run produced.
#[derive(Debug)]
pub struct RunReport {
    pub sources_fetched: usize,
    pub units: Vec<BuildUnit>,
    pub archive: PathBuf,
}

/// Drives the pipeline: fetch every source, build and install every
/// (project, target) unit, archive the package tree.
pub struct Engine {
    tool: Box<dyn BuildTool>,
    archiver: Box<dyn Archiver>,
}

impl Engine {
    pub fn new(tool: Box<dyn BuildTool>, archiver: Box<dyn Archiver>) -> Self {
        Self { tool, archiver }
    }

    /// Fetch, verify, and extract every source, sequentially in manifest
    /// order. The first failure aborts the run; nothing is retried.
    pub fn fetch_sources(&self, plan: &BuildPlan, paths: &RunPaths) -> Result<usize, CoreError> {
        for source in &plan.sources {
            if interrupted() {
                return Err(CoreError::Interrupted);
            }
            fetch_verify_extract(source, &paths.sources_dir)?;
        }
        Ok(plan.sources.len())
    }

    /// Build and install every unit, sequentially in manifest order.
    /// Units are independent, but any failure is fatal for the whole run.
    pub fn build_all(&self, plan: &BuildPlan, paths: &RunPaths) -> Result<Vec<BuildUnit>, CoreError> {
        let mut units: Vec<BuildUnit> = plan
            .projects
            .iter()
            .flat_map(|project| {
                plan.targets.iter().map(move |target| BuildUnit {
                    project: project.clone(),
                    target: target.clone(),
                    state: UnitState::Pending,
                })
            })
            .collect();

        for unit in &mut units {
            if interrupted() {
                return Err(CoreError::Interrupted);
            }
            self.build_unit(unit, paths)?;
        }
        Ok(units)
    }

    /// Advance one unit `Pending → ValidatingPlatform → Building →
    /// Installing → Done`, marking it `Failed` on the first error.
    fn build_unit(&self, unit: &mut BuildUnit, paths: &RunPaths) -> Result<(), CoreError> {
        info!(
            "building project '{}' for {}",
            unit.project.ident, unit.target
        );
        match self.advance_unit(unit, paths) {
            Ok(()) => {
                unit.state = UnitState::Done;
                Ok(())
            }
            Err(e) => {
                unit.state = UnitState::Failed;
                Err(e)
            }
        }
    }

    fn advance_unit(&self, unit: &mut BuildUnit, paths: &RunPaths) -> Result<(), CoreError> {
        unit.state = UnitState::ValidatingPlatform;
        // Eligibility and layout are settled before the tool is ever spawned.
        let root = staging_root(&paths.package_dir, &unit.target)?;
        fs::create_dir_all(&root)?;

        let workdir = paths
            .sources_dir
            .join(&unit.project.source)
            .join(&unit.project.workdir);
        debug!(
            "unit {}/{}: workdir {}, staging root {}",
            unit.project.ident,
            unit.target,
            workdir.display(),
            root.display()
        );

        unit.state = UnitState::Building;
        self.tool.build(&workdir, &unit.target)?;

        unit.state = UnitState::Installing;
        self.tool.install(&workdir, &unit.target, &root)?;
        Ok(())
    }

    /// The whole pipeline: fetch → build → package. Produces one archive
    /// per invocation, named for the host platform (cross-development
    /// roots nest inside the native prefix, so the one tree carries every
    /// requested target).
    pub fn run(&self, plan: &BuildPlan, paths: &RunPaths) -> Result<RunReport, CoreError> {
        let sources_fetched = self.fetch_sources(plan, paths)?;
        let units = self.build_all(plan, paths)?;

        if interrupted() {
            return Err(CoreError::Interrupted);
        }
        let archive = package(
            self.archiver.as_ref(),
            &paths.package_dir,
            &paths.output_dir,
            &plan.ident,
            &plan.version,
            host_target()?,
        )?;
        info!("package ready: {}", archive.display());

        Ok(RunReport {
            sources_fetched,
            units,
            archive,
        })
    }
}
