//! Source archive acquisition for Galaxian.
//!
//! Implements the fetch → verify → extract protocol: each upstream source is
//! downloaded to a private temporary file, its SHA2-256 digest is computed in
//! a streaming pass and compared against the manifest, and only verified
//! content is ever unpacked. The temporary file is removed on every exit
//! path, success or failure.

pub mod digest;
pub mod extract;
pub mod source;

pub use digest::sha256_file;
pub use extract::{unpack, ArchiveFormat};
pub use source::{fetch_verify_extract, fetch_verify_extract_with};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("fetch I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP fetch failed: {0}")]
    Http(String),
    #[error(
        "SHA2-256 checksum mismatch: downloaded file hashed to {actual}, manifest expected {expected}"
    )]
    ChecksumMismatch { expected: String, actual: String },
    #[error("cannot infer archive format from '{0}'")]
    UnsupportedArchive(String),
    #[error("archive extraction failed: {0}")]
    Extract(String),
}
