use tempfile::TempDir;

use foreman::config::AppConfig;
use foreman::registry::{LifecycleManager, RegistryStore, Role};

// ─── Helpers ─────────────────────────────────────────────────────────

fn test_config(root: &std::path::Path) -> AppConfig {
    AppConfig {
        parent: "CORE".into(),
        registry_path: root.join("registry.json"),
        workspaces_root: root.join("workspaces"),
        shared_hub: root.join("hub"),
        archive_root: root.join("archive"),
        forbidden_dirs: vec![],
        default_timeout_minutes: 60,
        retention_days: 7,
    }
}

// ─── Registry file format ────────────────────────────────────────────

#[test]
fn registry_file_has_expected_top_level_shape() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path());
    let mut mgr = LifecycleManager::new(&config).unwrap();
    mgr.spawn("W-1", Role::Worker, "task", 60, None).unwrap();

    let raw = std::fs::read_to_string(&config.registry_path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();

    assert!(value["version"].is_string());
    assert!(value["subagents"].is_array());
    assert_eq!(value["id_counter"], 1);

    let record = &value["subagents"][0];
    assert!(record["employee_id"].is_string());
    assert_eq!(record["status"], "pending");
    assert_eq!(record["permissions"]["can_read_shared_hub"], true);
    assert_eq!(record["permissions"]["can_write_shared_hub"], false);
    assert!(record["lifecycle"]["spawned_at"].is_string());
}

// ─── Round trips ─────────────────────────────────────────────────────

#[test]
fn populated_registry_round_trips_identically() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path());
    {
        let mut mgr = LifecycleManager::new(&config).unwrap();
        let a = mgr.spawn("A", Role::Worker, "one", 60, None).unwrap().record.employee_id;
        mgr.spawn("B", Role::Reviewer, "two", 30, None).unwrap();
        mgr.activate(&a).unwrap();
        mgr.terminate(&a, "done").unwrap();
    }

    let store = RegistryStore::new(config.registry_path.clone());
    let loaded = store.load().unwrap();
    assert_eq!(loaded.subagents.len(), 2);
    assert_eq!(loaded.id_counter, 2);

    // save -> load -> save is a no-op on file content.
    let before = std::fs::read_to_string(&config.registry_path).unwrap();
    store.save(&loaded).unwrap();
    let after = std::fs::read_to_string(&config.registry_path).unwrap();
    assert_eq!(before, after);

    let reloaded = store.load().unwrap();
    assert_eq!(reloaded, loaded);
}

#[test]
fn record_order_is_insertion_order_across_reloads() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path());
    {
        let mut mgr = LifecycleManager::new(&config).unwrap();
        for name in ["first", "second", "third"] {
            mgr.spawn(name, Role::Worker, "task", 60, None).unwrap();
        }
    }

    let loaded = RegistryStore::new(config.registry_path).load().unwrap();
    let names: Vec<&str> = loaded.subagents.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["first", "second", "third"]);
}
