use crate::{error::TrackerError, store::Entry};
use std::{fs, io, path::Path};

pub const DEFAULT_MOUNTS_FILE: &str = "mounts.json";

/// Writes the whole list as `[[label, obtained], ...]`, replacing any previous file.
pub fn save(entries: &[Entry], path: &Path) -> Result<(), TrackerError> {
    let io_err = |source| TrackerError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
    }
    let raw = serde_json::to_string_pretty(entries).map_err(|source| TrackerError::Format {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, raw).map_err(io_err)
}

/// Reads the list back. A missing file is an empty list.
pub fn load(path: &Path) -> Result<Vec<Entry>, TrackerError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(TrackerError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_str(&raw).map_err(|source| TrackerError::Format {
        path: path.to_path_buf(),
        source,
    })
}
