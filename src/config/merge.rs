use super::schema::{AppConfig, PartialConfig};
use std::path::PathBuf;

impl PartialConfig {
    /// Merge self with a lower-priority fallback.
    /// Self's non-None values take precedence.
    /// For forbidden_dirs: REPLACE semantics (if self has Some, use it entirely).
    pub fn with_fallback(self, fallback: PartialConfig) -> PartialConfig {
        PartialConfig {
            parent: self.parent.or(fallback.parent),
            data_root: self.data_root.or(fallback.data_root),
            default_timeout_minutes: self
                .default_timeout_minutes
                .or(fallback.default_timeout_minutes),
            retention_days: self.retention_days.or(fallback.retention_days),
            forbidden_dirs: self.forbidden_dirs.or(fallback.forbidden_dirs),
        }
    }

    /// Convert to AppConfig, filling any remaining gaps with defaults.
    /// The registry, workspaces, hub, and archive paths all hang off the
    /// resolved data root.
    pub fn finalize(self) -> AppConfig {
        let data_root = self.data_root.unwrap_or_else(default_data_root);

        AppConfig {
            parent: self.parent.unwrap_or_else(|| "core".to_string()),
            registry_path: data_root.join("subagent_registry.json"),
            workspaces_root: data_root.join("workspaces"),
            shared_hub: data_root.join("hub"),
            archive_root: data_root.join("archive").join("subagents"),
            forbidden_dirs: self.forbidden_dirs.unwrap_or_default(),
            default_timeout_minutes: self.default_timeout_minutes.unwrap_or(60),
            retention_days: self.retention_days.unwrap_or(7),
        }
    }
}

/// Platform data directory, or `./foreman-data` if it cannot be resolved.
fn default_data_root() -> PathBuf {
    directories::ProjectDirs::from("", "", "foreman")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./foreman-data"))
}
