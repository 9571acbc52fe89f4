//! Whole-file JSON persistence for the sub-agent registry.
//!
//! The registry is small (tens of records), so every mutation rewrites the
//! entire file. Writes go to a sibling temp file which is flushed and then
//! renamed over the target, so no reader ever observes a partially written
//! registry. A missing file is the defined first-run empty state, not an
//! error; anything else propagates as [`StorageError`].
//!
//! Uses synchronous `std::fs` -- writes are small, buffered, and flushed,
//! same pattern as the notification log in `notify.rs`.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::StorageError;
use crate::registry::types::Registry;

/// Handle on the registry file. Load at construction of the manager, save
/// at the end of every mutator ("read-through, write-back").
pub struct RegistryStore {
    path: PathBuf,
}

impl RegistryStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted registry, or return the empty default if the file
    /// does not exist yet.
    pub fn load(&self) -> Result<Registry, StorageError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no registry file, starting empty");
                return Ok(Registry::default());
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&contents).map_err(|e| StorageError::Parse {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    /// Persist the full registry, creating parent directories as needed.
    ///
    /// Writes to `{file}.tmp` first, flushes, then renames over the target
    /// so a crash mid-write leaves the previous registry intact.
    pub fn save(&self, registry: &Registry) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(registry).map_err(|e| StorageError::Parse {
            path: self.path.clone(),
            message: e.to_string(),
        })?;

        let tmp = self.tmp_path();
        {
            let mut file = File::create(&tmp)?;
            file.write_all(json.as_bytes())?;
            file.write_all(b"\n")?;
            file.flush()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
