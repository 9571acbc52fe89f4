pub mod merge;
pub mod schema;

pub use schema::*;

use crate::cli::Cli;
use anyhow::Context;
use std::path::Path;
use std::path::PathBuf;

/// Load configuration by merging CLI and file sources.
/// Precedence: CLI > config file (explicit or global) > defaults.
///
/// Missing config files are handled gracefully (defaults apply).
pub fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let file = match &cli.config {
        Some(path) => load_toml_file(path).unwrap_or_default(),
        None => load_global_config(),
    };

    let cli_partial = cli_to_partial(cli);
    Ok(cli_partial.with_fallback(file).finalize())
}

/// Load global config from the platform-specific config directory.
/// Returns empty PartialConfig if file not found.
fn load_global_config() -> PartialConfig {
    match global_config_path() {
        Some(p) => load_toml_file(&p).unwrap_or_default(),
        None => {
            tracing::debug!("Could not determine global config directory");
            PartialConfig::default()
        }
    }
}

/// Load and parse a TOML config file into a PartialConfig.
/// Returns None on file-not-found; parse errors are logged, not fatal.
fn load_toml_file(path: &Path) -> Option<PartialConfig> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            match toml::from_str::<ConfigFile>(&contents)
                .context(format!("Failed to parse {}", path.display()))
            {
                Ok(config_file) => {
                    tracing::info!("Loaded config from {}", path.display());
                    Some(config_file.to_partial())
                }
                Err(e) => {
                    tracing::warn!("Config parse error: {:#}", e);
                    None
                }
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", path.display());
            None
        }
        Err(e) => {
            tracing::warn!("Failed to read config at {}: {}", path.display(), e);
            None
        }
    }
}

/// Resolve the platform-specific global config path.
/// Linux: ~/.config/foreman/foreman.toml
/// macOS: ~/Library/Application Support/foreman/foreman.toml
fn global_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "foreman")
        .map(|dirs| dirs.config_dir().join("foreman.toml"))
}

/// Convert CLI arguments to a PartialConfig for merging.
fn cli_to_partial(cli: &Cli) -> PartialConfig {
    PartialConfig {
        parent: cli.parent.clone(),
        data_root: cli.data_root.clone(),
        ..Default::default()
    }
}
