use std::fs;
use std::path::Path;

use tempfile::TempDir;

use foreman::workspace::guard::{is_reclaimable, reclaim, relocate, ReclaimOutcome};

// ─── Helper ───────────────────────────────────────────────────────────

fn make_root() -> TempDir {
    tempfile::tempdir().expect("failed to create temp dir")
}

// ─── ALLOWED paths ───────────────────────────────────────────────────

#[test]
fn allows_managed_workspace_directory() {
    let tmp = make_root();
    let ws = tmp.path().join("workspace-subagent_core_sa_2026_0001");
    fs::create_dir_all(&ws).unwrap();

    assert!(is_reclaimable(&ws));
}

#[test]
fn allows_absent_path_with_marker_name() {
    let tmp = make_root();
    let ws = tmp.path().join("workspace-subagent_gone");
    assert!(!ws.exists());

    assert!(is_reclaimable(&ws));
}

// ─── REFUSED paths ───────────────────────────────────────────────────

#[test]
fn refuses_leaf_name_without_marker() {
    let tmp = make_root();
    let dir = tmp.path().join("important-data");
    fs::create_dir_all(&dir).unwrap();

    assert!(!is_reclaimable(&dir));
}

#[test]
fn refuses_dotdot_traversal() {
    // `..` has no file name at all, so the marker check cannot pass.
    assert!(!is_reclaimable(Path::new("/data/workspace-subagent_x/..")));
    assert!(!is_reclaimable(Path::new("..")));
}

#[test]
fn refuses_filesystem_root() {
    assert!(!is_reclaimable(Path::new("/")));
}

#[cfg(unix)]
#[test]
fn refuses_symlinked_workspace_root() {
    let tmp = make_root();

    // Victim directory outside the managed area.
    let victim = tmp.path().join("victim");
    fs::create_dir_all(&victim).unwrap();
    fs::write(victim.join("precious.txt"), "data").unwrap();

    // Link whose name would otherwise pass the marker check.
    let link = tmp.path().join("workspace-subagent_sneaky");
    std::os::unix::fs::symlink(&victim, &link).unwrap();

    assert!(!is_reclaimable(&link));
    assert_eq!(reclaim(&link).unwrap(), ReclaimOutcome::Refused);
    assert!(victim.join("precious.txt").exists());
}

// ─── reclaim ─────────────────────────────────────────────────────────

#[test]
fn reclaim_deletes_marker_directory_tree() {
    let tmp = make_root();
    let ws = tmp.path().join("workspace-subagent_x");
    fs::create_dir_all(ws.join("badges")).unwrap();
    fs::write(ws.join("badges").join("badge.txt"), "card").unwrap();

    assert_eq!(reclaim(&ws).unwrap(), ReclaimOutcome::Reclaimed);
    assert!(!ws.exists());
}

#[test]
fn reclaim_of_absent_directory_is_success() {
    let tmp = make_root();
    let ws = tmp.path().join("workspace-subagent_gone");

    assert_eq!(reclaim(&ws).unwrap(), ReclaimOutcome::AlreadyAbsent);
}

#[test]
fn reclaim_refuses_unmanaged_directory() {
    let tmp = make_root();
    let dir = tmp.path().join("manual-edit");
    fs::create_dir_all(&dir).unwrap();

    assert_eq!(reclaim(&dir).unwrap(), ReclaimOutcome::Refused);
    assert!(dir.exists());
}

// ─── relocate ────────────────────────────────────────────────────────

#[test]
fn relocate_moves_directory_preserving_name() {
    let tmp = make_root();
    let ws = tmp.path().join("workspace-subagent_old");
    fs::create_dir_all(&ws).unwrap();
    fs::write(ws.join("report.md"), "done").unwrap();
    let archive = tmp.path().join("archive");

    assert_eq!(relocate(&ws, &archive).unwrap(), ReclaimOutcome::Reclaimed);
    assert!(!ws.exists());
    assert!(archive.join("workspace-subagent_old").join("report.md").exists());
}

#[test]
fn relocate_of_absent_directory_is_success() {
    let tmp = make_root();
    let archive = tmp.path().join("archive");

    assert_eq!(
        relocate(&tmp.path().join("workspace-subagent_gone"), &archive).unwrap(),
        ReclaimOutcome::AlreadyAbsent
    );
}

#[test]
fn relocate_refuses_unmanaged_directory() {
    let tmp = make_root();
    let dir = tmp.path().join("keep-me");
    fs::create_dir_all(&dir).unwrap();
    let archive = tmp.path().join("archive");

    assert_eq!(relocate(&dir, &archive).unwrap(), ReclaimOutcome::Refused);
    assert!(dir.exists());
    assert!(!archive.exists());
}
