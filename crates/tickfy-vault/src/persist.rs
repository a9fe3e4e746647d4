//! Whole-file JSON persistence for the data directory.
//!
//! Files are written to a sibling temp file and renamed into place, so a crash
//! mid-write leaves either the old or the new content. On unix the files are
//! created owner-only (0600) and directories 0700.

use crate::error::VaultError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{ErrorKind as IoErrorKind, Write};
use std::path::Path;

fn io_err(path: &Path, source: std::io::Error) -> VaultError {
    VaultError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Create `dir` (and parents) with owner-only permissions.
pub fn ensure_private_dir(dir: &Path) -> Result<(), VaultError> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir).map_err(|e| io_err(dir, e))
}

/// Read and parse `path`; `Ok(None)` when the file does not exist.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, VaultError> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_err(path, e)),
    };
    serde_json::from_slice(&data)
        .map(Some)
        .map_err(|source| VaultError::InvalidFile {
            path: path.to_path_buf(),
            source,
        })
}

/// Serialize `value` as indented JSON and atomically replace `path`.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), VaultError> {
    let mut data = serde_json::to_vec_pretty(value).map_err(|source| VaultError::InvalidFile {
        path: path.to_path_buf(),
        source,
    })?;
    data.push(b'\n');

    if let Some(parent) = path.parent() {
        ensure_private_dir(parent)?;
    }

    let mut tmp_name = path.as_os_str().to_os_string();
    tmp_name.push(".tmp");
    let tmp = Path::new(&tmp_name);

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(tmp).map_err(|e| io_err(tmp, e))?;
    file.write_all(&data).map_err(|e| io_err(tmp, e))?;
    file.sync_all().map_err(|e| io_err(tmp, e))?;
    drop(file);

    fs::rename(tmp, path).map_err(|e| io_err(path, e))
}
