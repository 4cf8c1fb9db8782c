use crate::FetchError;
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Archive container formats recognized for source extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Tar,
    TarGz,
    Zip,
}

impl ArchiveFormat {
    /// Infer the format from the filename component of a fetch URL.
    pub fn from_url(url: &str) -> Result<Self, FetchError> {
        let name = url.rsplit('/').next().unwrap_or(url);
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Ok(ArchiveFormat::TarGz)
        } else if name.ends_with(".tar") {
            Ok(ArchiveFormat::Tar)
        } else if name.ends_with(".zip") {
            Ok(ArchiveFormat::Zip)
        } else {
            Err(FetchError::UnsupportedArchive(name.to_owned()))
        }
    }
}

/// Unpack a verified archive into `dest`, creating it as needed.
/// Entry paths are contained to the destination; nothing escapes it.
pub fn unpack(archive: &Path, format: ArchiveFormat, dest: &Path) -> Result<(), FetchError> {
    fs::create_dir_all(dest)?;
    debug!("unpacking {format:?} archive into {}", dest.display());

    match format {
        ArchiveFormat::Tar => {
            let file = File::open(archive)?;
            tar::Archive::new(BufReader::new(file)).unpack(dest)?;
        }
        ArchiveFormat::TarGz => {
            let file = File::open(archive)?;
            tar::Archive::new(GzDecoder::new(BufReader::new(file))).unpack(dest)?;
        }
        ArchiveFormat::Zip => unpack_zip(archive, dest)?,
    }

    Ok(())
}

fn unpack_zip(archive: &Path, dest: &Path) -> Result<(), FetchError> {
    let file = File::open(archive)?;
    let mut zip = zip::ZipArchive::new(BufReader::new(file))
        .map_err(|e| FetchError::Extract(format!("failed to open zip: {e}")))?;

    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .map_err(|e| FetchError::Extract(format!("failed to read zip entry: {e}")))?;

        let Some(rel) = entry.enclosed_name() else {
            return Err(FetchError::Extract(format!(
                "zip entry '{}' escapes the destination",
                entry.name()
            )));
        };
        let out = dest.join(rel);

        if entry.is_dir() {
            fs::create_dir_all(&out)?;
        } else {
            if let Some(parent) = out.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut outfile = File::create(&out)?;
            std::io::copy(&mut entry, &mut outfile)?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Some(mode) = entry.unix_mode() {
                    fs::set_permissions(&out, fs::Permissions::from_mode(mode))?;
                }
            }
        }
    }

    Ok(())
}
