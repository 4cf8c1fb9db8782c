use crate::CoreError;
use std::path::{Path, PathBuf};

/// Installation prefix inside the package tree; every staging root lives
/// under it.
pub const INSTALL_PREFIX: &str = "opt/aq";
/// Prefix subdirectory housing the cross-development roots.
pub const CROSS_DEVEL_DIR: &str = "xpdevel";

/// Canonical short name for a target platform token, used for both the
/// cross-development directory and the final archive name.
pub fn short_name(target: &str) -> Option<&'static str> {
    Some(match target {
        "DARWIN" => "darwin",
        "LINUX" => "linux64",
        "LINUX86" => "linux32",
        "LINUXARM" => "linuxarm",
        "WIN32" => "win32",
        "WIN64" => "win64",
        "GBA" => "agb",
        "IBMPC" => "ibmpc",
        "DOS" => "dos",
        "APE" => "portable",
        _ => return None,
    })
}

/// Hosting platforms must be built on a matching native host.
pub fn is_hosting(target: &str) -> bool {
    matches!(target, "DARWIN" | "LINUX")
}

/// Target platform token for the machine this process runs on.
pub fn host_target() -> Result<&'static str, CoreError> {
    match std::env::consts::OS {
        "linux" => Ok("LINUX"),
        "macos" => Ok("DARWIN"),
        "windows" => Ok("WIN32"),
        other => Err(CoreError::UnknownHost(other.to_owned())),
    }
}

/// Resolve the staging root for `target` under the package tree.
///
/// Hosting platforms install straight into the prefix and must match the
/// current host. Every other target installs into a per-target
/// cross-development root, shared by all projects built for that target.
pub fn staging_root(package_dir: &Path, target: &str) -> Result<PathBuf, CoreError> {
    let short =
        short_name(target).ok_or_else(|| CoreError::UnknownPlatform(target.to_owned()))?;
    let prefix = package_dir.join(INSTALL_PREFIX);

    if is_hosting(target) {
        let host = host_target()?;
        if host != target {
            return Err(CoreError::PlatformMismatch {
                target: target.to_owned(),
                host: host.to_owned(),
            });
        }
        Ok(prefix)
    } else {
        Ok(prefix.join(CROSS_DEVEL_DIR).join(short))
    }
}
