use crate::digest::sha256_file;
use crate::extract::{unpack, ArchiveFormat};
use crate::FetchError;
use galaxian_manifest::SourceSpec;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Fetch, verify, and extract one source with a default HTTP agent.
///
/// Returns the directory the archive was extracted into
/// (`dest_dir/<ident>`).
pub fn fetch_verify_extract(source: &SourceSpec, dest_dir: &Path) -> Result<PathBuf, FetchError> {
    fetch_verify_extract_with(&ureq::Agent::new_with_defaults(), source, dest_dir)
}

/// Same as [`fetch_verify_extract`] with a caller-supplied agent.
///
/// The download lands in a temporary file inside `dest_dir`; the file is
/// removed on every exit path. Content that fails verification is never
/// extracted.
pub fn fetch_verify_extract_with(
    agent: &ureq::Agent,
    source: &SourceSpec,
    dest_dir: &Path,
) -> Result<PathBuf, FetchError> {
    // Resolve the format up front: an unsupported URL fails before any
    // network traffic.
    let format = ArchiveFormat::from_url(&source.url)?;

    fs::create_dir_all(dest_dir)?;
    let mut tmp = NamedTempFile::new_in(dest_dir)?;

    info!("fetching {}", source.url);
    let bytes = download(agent, &source.url, tmp.as_file_mut())?;
    debug!("downloaded {bytes} bytes to {}", tmp.path().display());

    let actual = sha256_file(tmp.path())?;
    if !actual.eq_ignore_ascii_case(&source.sha2_256sum) {
        // `tmp` drops here, taking the unverified download with it.
        return Err(FetchError::ChecksumMismatch {
            expected: source.sha2_256sum.clone(),
            actual,
        });
    }
    debug!("checksum verified for source '{}'", source.ident);

    let dest = dest_dir.join(&source.ident);
    unpack(tmp.path(), format, &dest)?;
    info!("extracted source '{}' into {}", source.ident, dest.display());
    Ok(dest)
}

fn download(
    agent: &ureq::Agent,
    url: &str,
    dest: &mut std::fs::File,
) -> Result<u64, FetchError> {
    let resp = match agent.get(url).call() {
        Ok(r) => r,
        Err(ureq::Error::StatusCode(code)) => {
            return Err(FetchError::Http(format!("HTTP {code} for {url}")));
        }
        Err(e) => {
            return Err(FetchError::Http(e.to_string()));
        }
    };

    let mut reader = resp.into_body().into_reader();
    Ok(std::io::copy(&mut reader, dest)?)
}
