use crate::prereq::command_exists;
use crate::{combined_output, platform, CoreError};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::info;

/// The external archiving/compression step producing the final package.
pub trait Archiver: Send + Sync {
    fn name(&self) -> &str;

    fn available(&self) -> bool;

    /// Write an archive of the contents of `root` (paths relative to it)
    /// to `dest`.
    fn archive(&self, root: &Path, dest: &Path) -> Result<(), CoreError>;
}

/// Real backend: `tar -cf <dest> -I "lzip -9q" .` run from inside `root`.
pub struct TarLzip;

impl Archiver for TarLzip {
    fn name(&self) -> &str {
        "tar-lzip"
    }

    fn available(&self) -> bool {
        command_exists("tar") && command_exists("lzip")
    }

    fn archive(&self, root: &Path, dest: &Path) -> Result<(), CoreError> {
        let output = Command::new("tar")
            .arg("-cf")
            .arg(dest)
            .arg("-I")
            .arg("lzip -9q")
            .arg(".")
            .current_dir(root)
            .output()?;
        if !output.status.success() {
            return Err(CoreError::ArchiverFailed {
                tool: "tar".to_owned(),
                status: output.status.to_string(),
                output: combined_output(&output),
            });
        }
        Ok(())
    }
}

/// Writes a placeholder artifact instead of spawning tar. For dry runs and
/// hermetic tests.
pub struct MockArchiver;

impl Archiver for MockArchiver {
    fn name(&self) -> &str {
        "mock"
    }

    fn available(&self) -> bool {
        true
    }

    fn archive(&self, root: &Path, dest: &Path) -> Result<(), CoreError> {
        fs::write(dest, format!("mock archive of {}\n", root.display()))?;
        Ok(())
    }
}

pub fn select_archiver(name: &str) -> Result<Box<dyn Archiver>, CoreError> {
    match name {
        "tar-lzip" => Ok(Box::new(TarLzip)),
        "mock" => Ok(Box::new(MockArchiver)),
        other => Err(CoreError::NoSuchTool(other.to_owned())),
    }
}

/// Deterministic package file name: identity, version, and the target's
/// canonical short name joined by dashes, `.tar.lz` suffix.
pub fn archive_file_name(ident: &str, version: &str, short: &str) -> String {
    format!("{ident}-{version}-{short}.tar.lz")
}

/// Archive the package tree and move the result to its final name.
///
/// The archive is produced in a temporary file inside `output_dir` and
/// renamed as the very last step; if that rename fails the temporary
/// archive is kept on disk for manual recovery.
pub fn package(
    archiver: &dyn Archiver,
    root: &Path,
    output_dir: &Path,
    ident: &str,
    version: &str,
    target: &str,
) -> Result<PathBuf, CoreError> {
    let short =
        platform::short_name(target).ok_or_else(|| CoreError::UnknownPlatform(target.to_owned()))?;

    // An empty plan still ships an (empty) package tree.
    fs::create_dir_all(root)?;
    fs::create_dir_all(output_dir)?;
    let output_dir = output_dir.canonicalize()?;

    let tmp = tempfile::Builder::new()
        .prefix(".galaxian-pkg-")
        .suffix(".tar.lz")
        .tempfile_in(&output_dir)?
        .into_temp_path();
    archiver.archive(root, &tmp)?;

    let final_path = output_dir.join(archive_file_name(ident, version, short));
    info!(
        "packaging {} as {}",
        root.display(),
        final_path.display()
    );
    match tmp.persist(&final_path) {
        Ok(()) => Ok(final_path),
        Err(e) => {
            let reason = e.error.to_string();
            let kept = match e.path.keep() {
                Ok(path) => path.display().to_string(),
                Err(keep_err) => keep_err.path.display().to_string(),
            };
            Err(CoreError::ArchiveMove { kept, reason })
        }
    }
}
