use std::path::PathBuf;

/// Errors related to loading and persisting the registry file.
///
/// A missing registry file on first run is *not* an error -- the store
/// returns the empty default. Everything else (unreadable file, unparsable
/// JSON, failed write/rename) is fatal for the current operation.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse registry at {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Errors related to workspace provisioning (directory + descriptor files).
///
/// Provisioning failures never abort a spawn; they are carried as data on
/// the spawn outcome so the registry entry exists even without a workspace.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize card snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}
