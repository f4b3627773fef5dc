//! Writing generated files.
//!
//! Output is written to a temporary file next to the destination and then
//! renamed over it, so the destination either keeps its previous contents
//! or holds the complete new file.

use crate::error::{Error, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// What [`write_output`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The destination did not exist and was created
    Created,
    /// The destination existed with different contents and was replaced
    Updated,
    /// The destination already held identical contents
    Unchanged,
}

/// Content digest used to compare generated output with what is on disk
pub fn content_hash(contents: &[u8]) -> blake3::Hash {
    blake3::hash(contents)
}

/// Returns the digest of `path`, or `None` if it does not exist
fn existing_hash(path: &Path) -> Result<Option<blake3::Hash>> {
    match fs::read(path) {
        Ok(data) => Ok(Some(content_hash(&data))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::file_read(path, e)),
    }
}

/// Atomically writes `contents` to `dst` unless it already holds them
pub fn write_output(dst: &Path, contents: &str) -> Result<WriteOutcome> {
    let new_hash = content_hash(contents.as_bytes());
    let outcome = match existing_hash(dst)? {
        Some(old) if old == new_hash => {
            info!("{} is up to date", dst.display());
            return Ok(WriteOutcome::Unchanged);
        }
        Some(_) => WriteOutcome::Updated,
        None => WriteOutcome::Created,
    };

    let dir = match dst.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| Error::file_write(dst, e))?;
    tmp.write_all(contents.as_bytes())
        .map_err(|e| Error::file_write(dst, e))?;
    if let Some(perms) = output_permissions(dst) {
        tmp.as_file()
            .set_permissions(perms)
            .map_err(|e| Error::file_write(dst, e))?;
    }
    tmp.persist(dst).map_err(|e| Error::file_write(dst, e.error))?;

    debug!(
        "Wrote {} bytes to {} ({})",
        contents.len(),
        dst.display(),
        &new_hash.to_hex()[..8]
    );
    Ok(outcome)
}

/// Permissions for the written file: those of an existing destination, or
/// world-readable for new files instead of the temporary file's private mode.
fn output_permissions(dst: &Path) -> Option<fs::Permissions> {
    if let Ok(meta) = fs::metadata(dst) {
        return Some(meta.permissions());
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        Some(fs::Permissions::from_mode(0o644))
    }
    #[cfg(not(unix))]
    {
        None
    }
}

/// Fails with [`Error::Stale`] unless `dst` holds exactly `contents`
pub fn check_output(dst: &Path, contents: &str) -> Result<()> {
    match existing_hash(dst)? {
        Some(old) if old == content_hash(contents.as_bytes()) => Ok(()),
        _ => Err(Error::Stale {
            path: dst.to_path_buf(),
        }),
    }
}
