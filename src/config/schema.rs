use serde::Deserialize;
use std::path::PathBuf;

/// The TOML file structure for foreman.toml.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    pub general: Option<GeneralConfig>,
    pub lifecycle: Option<LifecycleConfig>,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    /// Parent agent identifier issuing the cards.
    pub parent: Option<String>,
    /// Root under which registry, workspaces, hub, and archive live.
    pub data_root: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LifecycleConfig {
    pub default_timeout_minutes: Option<u64>,
    pub retention_days: Option<u32>,
    /// Sibling core workspaces sub-agents must never touch.
    pub forbidden_dirs: Option<Vec<String>>,
}

impl ConfigFile {
    pub fn to_partial(&self) -> PartialConfig {
        PartialConfig {
            parent: self.general.as_ref().and_then(|g| g.parent.clone()),
            data_root: self
                .general
                .as_ref()
                .and_then(|g| g.data_root.as_deref().map(PathBuf::from)),
            default_timeout_minutes: self
                .lifecycle
                .as_ref()
                .and_then(|l| l.default_timeout_minutes),
            retention_days: self.lifecycle.as_ref().and_then(|l| l.retention_days),
            forbidden_dirs: self.lifecycle.as_ref().and_then(|l| {
                l.forbidden_dirs
                    .as_ref()
                    .map(|dirs| dirs.iter().map(PathBuf::from).collect())
            }),
        }
    }
}

/// Fully-resolved runtime configuration. All fields have values; all
/// filesystem roots are explicit so tests can point them at a temp dir.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub parent: String,
    pub registry_path: PathBuf,
    pub workspaces_root: PathBuf,
    pub shared_hub: PathBuf,
    pub archive_root: PathBuf,
    pub forbidden_dirs: Vec<PathBuf>,
    pub default_timeout_minutes: u64,
    pub retention_days: u32,
}

/// Partial config used during merge. All fields are Option so that
/// missing fields don't override lower-priority values.
#[derive(Debug, Clone, Default)]
pub struct PartialConfig {
    pub parent: Option<String>,
    pub data_root: Option<PathBuf>,
    pub default_timeout_minutes: Option<u64>,
    pub retention_days: Option<u32>,
    pub forbidden_dirs: Option<Vec<PathBuf>>,
}
