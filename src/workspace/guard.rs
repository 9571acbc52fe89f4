//! Safety guard for destructive workspace reclamation.
//!
//! `remove_dir_all` on a path taken from a JSON file is the one place this
//! crate can do real damage, so every delete and every archive move goes
//! through [`is_reclaimable`] first. The check is an explicit precondition
//! function rather than an inline string test so it can be unit-tested with
//! adversarial paths on its own.

use std::fs;
use std::io;
use std::path::Path;

/// Token every managed workspace directory name carries. Paths whose leaf
/// name lacks it are refused -- a manually edited or unrelated path must
/// never be deleted.
pub const WORKSPACE_MARKER: &str = "subagent";

/// Outcome of a guarded delete or move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReclaimOutcome {
    /// The directory was deleted or relocated.
    Reclaimed,
    /// Nothing on disk; treated as success so terminate stays idempotent.
    AlreadyAbsent,
    /// The guard refused the path; the filesystem was not touched.
    Refused,
}

/// Whether a path may be destructively reclaimed.
///
/// Requires a leaf name containing [`WORKSPACE_MARKER`] and refuses symlink
/// roots: deleting or moving through a link could reach outside the managed
/// area. Relative components like `..` have no qualifying leaf name and are
/// refused by the same check.
pub fn is_reclaimable(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if !name.contains(WORKSPACE_MARKER) {
        return false;
    }
    match fs::symlink_metadata(path) {
        Ok(meta) => !meta.file_type().is_symlink(),
        // Absent path: nothing to traverse, the name check is all we have.
        Err(_) => true,
    }
}

/// Delete a workspace directory tree behind the guard.
pub fn reclaim(path: &Path) -> io::Result<ReclaimOutcome> {
    if !is_reclaimable(path) {
        return Ok(ReclaimOutcome::Refused);
    }
    if !path.exists() {
        return Ok(ReclaimOutcome::AlreadyAbsent);
    }
    fs::remove_dir_all(path)?;
    Ok(ReclaimOutcome::Reclaimed)
}

/// Move a workspace directory into `archive_root`, preserving its name.
pub fn relocate(path: &Path, archive_root: &Path) -> io::Result<ReclaimOutcome> {
    if !is_reclaimable(path) {
        return Ok(ReclaimOutcome::Refused);
    }
    if !path.exists() {
        return Ok(ReclaimOutcome::AlreadyAbsent);
    }
    let Some(name) = path.file_name() else {
        return Ok(ReclaimOutcome::Refused);
    };
    fs::create_dir_all(archive_root)?;
    fs::rename(path, archive_root.join(name))?;
    Ok(ReclaimOutcome::Reclaimed)
}
