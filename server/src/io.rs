use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::errors::BackendError;

/// Writes `raw` to `path` through a temporary file in the same
/// directory, renaming into place so a reader never observes a
/// partially written object.
pub fn write_atomic(path: &Path, raw: &[u8]) -> Result<(), BackendError> {
    let dir = path.parent().ok_or_else(|| {
        BackendError::storage(io::Error::new(
            io::ErrorKind::Other,
            "target path has no parent directory",
        ))
    })?;

    let mut file = NamedTempFile::new_in(dir).map_err(BackendError::storage)?;
    file.write_all(raw).map_err(BackendError::storage)?;
    file.persist(path)
        .map_err(|e| BackendError::storage(e.error))?;

    Ok(())
}
