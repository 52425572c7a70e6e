use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced by the mount store and the mounts file.
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("{field} is required")]
    Validation { field: &'static str },

    #[error("no mount selected")]
    NoSelection,

    #[error("no mount at position {index} (list has {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unreadable mount list {}: {source}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl TrackerError {
    pub fn is_index(&self) -> bool {
        matches!(
            self,
            TrackerError::NoSelection | TrackerError::IndexOutOfRange { .. }
        )
    }
}
