//! Sub-agent lifecycle orchestration.
//!
//! [`LifecycleManager`] is the single owner of the in-memory registry and
//! the only code that mutates it. Every operation is a synchronous,
//! run-to-completion transition that persists the store before returning
//! ("read-through, write-back": load happens once at construction, save at
//! the end of every mutator). There is no locking -- the design assumes one
//! owning process per registry file.
//!
//! Registry mutations are the source of truth and are never rolled back by
//! downstream side-effect failures. Workspace provisioning, badge
//! rendering, and notification composition are best-effort: their failures
//! travel as data on [`SpawnOutcome`], never as errors.

use std::path::PathBuf;

use chrono::{DateTime, Datelike, Utc};

use crate::badge;
use crate::config::AppConfig;
use crate::error::{ProvisionError, StorageError};
use crate::notify::{self, NotificationPayload};
use crate::registry::store::RegistryStore;
use crate::registry::types::{
    Lifecycle, Permissions, Registry, Role, Status, SubAgentRecord, TaskSpec, WorkspaceSpec,
};
use crate::workspace::{self, guard};
use crate::workspace::guard::ReclaimOutcome;

/// Reason recorded when the expiry sweep terminates a record.
pub const EXPIRY_REASON: &str = "timeout_expired";

/// Everything a spawn produced: the registered record plus the outcome of
/// each best-effort side call. The record exists in the registry even when
/// every side call failed.
#[derive(Debug)]
pub struct SpawnOutcome {
    pub record: SubAgentRecord,
    pub provisioning: Result<(), ProvisionError>,
    pub badge: Result<PathBuf, String>,
    pub notification: Result<NotificationPayload, String>,
}

/// One entry in a [`LifecycleManager::spawn_batch`] request. Deserializes
/// from the JSON request files the CLI accepts; a missing timeout falls
/// back to the configured default.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct SpawnRequest {
    pub name: String,
    pub role: Role,
    pub description: String,
    #[serde(default)]
    pub timeout_minutes: Option<u64>,
    #[serde(default)]
    pub resources: Option<Vec<String>>,
}

/// Outcome of a batch spawn: the per-card outcomes in request order plus
/// the single grouped notification entry. `None` for an empty batch, which
/// composes no group entry at all.
#[derive(Debug)]
pub struct BatchOutcome {
    pub outcomes: Vec<SpawnOutcome>,
    pub group_notification: Option<Result<NotificationPayload, String>>,
}

pub struct LifecycleManager {
    parent: String,
    registry: Registry,
    store: RegistryStore,
    workspaces_root: PathBuf,
    shared_hub: PathBuf,
    archive_root: PathBuf,
    forbidden_dirs: Vec<PathBuf>,
    default_timeout_minutes: u64,
}

impl LifecycleManager {
    /// Load the registry and build a manager for the given parent agent.
    ///
    /// All filesystem roots come from the injected config so tests can point
    /// everything at a temporary directory.
    pub fn new(config: &AppConfig) -> Result<Self, StorageError> {
        let store = RegistryStore::new(config.registry_path.clone());
        let registry = store.load()?;
        Ok(Self {
            parent: config.parent.clone(),
            registry,
            store,
            workspaces_root: config.workspaces_root.clone(),
            shared_hub: config.shared_hub.clone(),
            archive_root: config.archive_root.clone(),
            forbidden_dirs: config.forbidden_dirs.clone(),
            default_timeout_minutes: config.default_timeout_minutes,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Allocate the next employee id: `{PARENT}-SA-{YEAR}-{NNNN}`.
    ///
    /// Increments the persisted counter by exactly one per call; the counter
    /// survives restarts and is never reused. Fails only if the registry
    /// cannot be persisted.
    fn generate_id(&mut self) -> Result<String, StorageError> {
        self.registry.id_counter += 1;
        self.store.save(&self.registry)?;
        Ok(format!(
            "{}-SA-{}-{:04}",
            self.parent.to_uppercase(),
            Utc::now().year(),
            self.registry.id_counter
        ))
    }

    /// Issue a new employee card: register the record, provision its
    /// workspace, render a badge, and compose a notification.
    ///
    /// Side effects run in that order; only the two registry writes can
    /// fail the call. Everything after them lands on the outcome as data.
    pub fn spawn(
        &mut self,
        name: &str,
        role: Role,
        task_description: &str,
        timeout_minutes: u64,
        resources: Option<Vec<String>>,
    ) -> Result<SpawnOutcome, StorageError> {
        let employee_id = self.generate_id()?;
        let now = Utc::now();

        // Out-of-range timeouts saturate to the far future instead of
        // wrapping into a deadline that is already past.
        let timeout = chrono::Duration::try_minutes(
            i64::try_from(timeout_minutes).unwrap_or(i64::MAX),
        )
        .unwrap_or(chrono::Duration::MAX);
        let deadline = now
            .checked_add_signed(timeout)
            .unwrap_or(chrono::DateTime::<Utc>::MAX_UTC);

        let workspace_path = self.workspace_path_for(&employee_id);
        let record = SubAgentRecord {
            employee_id: employee_id.clone(),
            name: name.to_string(),
            role,
            parent: self.parent.clone(),
            status: Status::Pending,
            task: TaskSpec {
                description: task_description.to_string(),
                created_at: now.to_rfc3339(),
                deadline: deadline.to_rfc3339(),
                resources_granted: resources
                    .unwrap_or_else(|| vec!["file_read".to_string(), "file_write".to_string()]),
            },
            workspace: WorkspaceSpec {
                path: workspace_path.clone(),
                allowed_dirs: vec![workspace_path, self.shared_hub.clone()],
                forbidden_dirs: self.forbidden_dirs.clone(),
                reclaimed_at: None,
            },
            permissions: Permissions::subagent(),
            lifecycle: Lifecycle::at_spawn(now.to_rfc3339()),
            termination_reason: None,
        };

        self.registry.subagents.push(record.clone());
        self.store.save(&self.registry)?;
        tracing::info!(employee_id = %employee_id, role = %role, "sub-agent registered");

        let provisioning = workspace::provision(&record);
        if let Err(e) = &provisioning {
            tracing::warn!(employee_id = %employee_id, error = %e, "workspace provisioning failed");
        }

        let badge = badge::write_badge(&record);
        if let Err(e) = &badge {
            tracing::warn!(employee_id = %employee_id, error = %e, "badge rendering failed");
        }

        let payload = notify::compose(&record, badge.as_deref().ok());
        let notification = match notify::append(&self.shared_hub, &payload) {
            Ok(()) => Ok(payload),
            Err(e) => {
                tracing::warn!(employee_id = %employee_id, error = %e, "notification logging failed");
                Err(e)
            }
        };

        Ok(SpawnOutcome {
            record,
            provisioning,
            badge,
            notification,
        })
    }

    /// Issue several cards in one call and log a single grouped
    /// notification entry on top of the per-card ones.
    ///
    /// Each request goes through [`Self::spawn`] in order, so a storage
    /// failure mid-batch leaves the earlier cards registered. The group
    /// entry is best-effort like every other notification.
    pub fn spawn_batch(
        &mut self,
        requests: Vec<SpawnRequest>,
    ) -> Result<BatchOutcome, StorageError> {
        let mut outcomes = Vec::with_capacity(requests.len());
        for req in requests {
            let timeout = req.timeout_minutes.unwrap_or(self.default_timeout_minutes);
            outcomes.push(self.spawn(&req.name, req.role, &req.description, timeout, req.resources)?);
        }

        let group_notification = if outcomes.is_empty() {
            None
        } else {
            let records: Vec<&SubAgentRecord> = outcomes.iter().map(|o| &o.record).collect();
            let payload = notify::compose_batch(&records);
            Some(match notify::append(&self.shared_hub, &payload) {
                Ok(()) => Ok(payload),
                Err(e) => {
                    tracing::warn!(error = %e, "group notification logging failed");
                    Err(e)
                }
            })
        };

        Ok(BatchOutcome {
            outcomes,
            group_notification,
        })
    }

    /// Mark a record active and stamp `activated_at`.
    ///
    /// Returns `Ok(false)` only when the id is unknown. Valid from pending
    /// or paused; a terminal record is left untouched (terminal states are
    /// never re-entered) and the call still reports the record as found.
    pub fn activate(&mut self, employee_id: &str) -> Result<bool, StorageError> {
        let Some(record) = self.find_mut(employee_id) else {
            return Ok(false);
        };

        match record.status {
            Status::Pending | Status::Paused => {
                record.status = Status::Active;
                record.lifecycle.activated_at = Some(Utc::now().to_rfc3339());
                self.store.save(&self.registry)?;
                tracing::info!(employee_id, "sub-agent activated");
            }
            Status::Active => {}
            Status::Completed | Status::Terminated => {
                tracing::warn!(
                    employee_id,
                    status = %record.status,
                    "refusing to activate a terminal record"
                );
            }
        }
        Ok(true)
    }

    /// Record a liveness signal. Pure counter + timestamp update; the
    /// deadline stays fixed at its spawn-time value.
    pub fn heartbeat(&mut self, employee_id: &str) -> Result<bool, StorageError> {
        let Some(record) = self.find_mut(employee_id) else {
            return Ok(false);
        };
        record.lifecycle.heartbeat_count += 1;
        record.lifecycle.last_heartbeat = Some(Utc::now().to_rfc3339());
        self.store.save(&self.registry)?;
        Ok(true)
    }

    /// Terminate a record and reclaim its workspace.
    ///
    /// Idempotent: terminating an already-terminated record is a no-op that
    /// still returns `true`. The state transition is persisted before any
    /// deletion; a failed deletion is logged and leaves the registry state
    /// in place, with the divergence queryable via `workspace.reclaimed_at`.
    pub fn terminate(&mut self, employee_id: &str, reason: &str) -> Result<bool, StorageError> {
        let Some(idx) = self
            .registry
            .subagents
            .iter()
            .position(|sa| sa.employee_id == employee_id)
        else {
            return Ok(false);
        };

        {
            let record = &mut self.registry.subagents[idx];
            record.status = Status::Terminated;
            if record.lifecycle.completed_at.is_none() {
                record.lifecycle.completed_at = Some(Utc::now().to_rfc3339());
            }
            record.termination_reason = Some(reason.to_string());
        }
        self.store.save(&self.registry)?;
        tracing::info!(employee_id, reason, "sub-agent terminated");

        let path = self.registry.subagents[idx].workspace.path.clone();
        match guard::reclaim(&path) {
            Ok(ReclaimOutcome::Reclaimed) => {
                self.registry.subagents[idx].workspace.reclaimed_at =
                    Some(Utc::now().to_rfc3339());
                self.store.save(&self.registry)?;
                tracing::info!(employee_id, path = %path.display(), "workspace reclaimed");
            }
            Ok(ReclaimOutcome::AlreadyAbsent) => {}
            Ok(ReclaimOutcome::Refused) => {
                tracing::warn!(
                    employee_id,
                    path = %path.display(),
                    "workspace path refused by reclamation guard, leaving on disk"
                );
            }
            Err(e) => {
                tracing::warn!(
                    employee_id,
                    path = %path.display(),
                    error = %e,
                    "workspace cleanup failed, registry state retained"
                );
            }
        }

        Ok(true)
    }

    /// Scan live records for passed deadlines.
    ///
    /// Returns the expired ids; with `auto_terminate` each one is terminated
    /// with reason [`EXPIRY_REASON`]. Records with an unparsable deadline
    /// are skipped, not treated as expired. Callers poll this; there is no
    /// internal timer.
    pub fn check_expired(&mut self, auto_terminate: bool) -> Result<Vec<String>, StorageError> {
        let now = Utc::now();
        let mut expired = Vec::new();

        for sa in &self.registry.subagents {
            if !sa.status.is_live() {
                continue;
            }
            match DateTime::parse_from_rfc3339(&sa.task.deadline) {
                Ok(deadline) if now > deadline.with_timezone(&Utc) => {
                    expired.push(sa.employee_id.clone());
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        employee_id = %sa.employee_id,
                        deadline = %sa.task.deadline,
                        error = %e,
                        "skipping record with unparsable deadline"
                    );
                }
            }
        }

        if auto_terminate {
            for id in &expired {
                tracing::info!(employee_id = %id, "auto-terminating expired sub-agent");
                self.terminate(id, EXPIRY_REASON)?;
            }
        }

        Ok(expired)
    }

    /// Move workspaces of terminated records older than `days_old` days
    /// into the archive root, preserving directory names. Registry history
    /// is kept; only `reclaimed_at` changes. Per-record failures are logged
    /// and skipped, not retried.
    pub fn archive(&mut self, days_old: u32) -> Result<Vec<String>, StorageError> {
        let cutoff = Utc::now() - chrono::Duration::days(i64::from(days_old));
        let mut archived = Vec::new();
        let mut dirty = false;

        for sa in &mut self.registry.subagents {
            if sa.status != Status::Terminated {
                continue;
            }
            let Some(completed_at) = &sa.lifecycle.completed_at else {
                continue;
            };
            let completed = match DateTime::parse_from_rfc3339(completed_at) {
                Ok(ts) => ts.with_timezone(&Utc),
                Err(e) => {
                    tracing::warn!(
                        employee_id = %sa.employee_id,
                        error = %e,
                        "skipping record with unparsable completion time"
                    );
                    continue;
                }
            };
            if completed >= cutoff {
                continue;
            }

            match guard::relocate(&sa.workspace.path, &self.archive_root) {
                Ok(ReclaimOutcome::Reclaimed) => {
                    sa.workspace.reclaimed_at = Some(Utc::now().to_rfc3339());
                    dirty = true;
                    archived.push(sa.employee_id.clone());
                    tracing::info!(employee_id = %sa.employee_id, "workspace archived");
                }
                Ok(ReclaimOutcome::AlreadyAbsent) => {}
                Ok(ReclaimOutcome::Refused) => {
                    tracing::warn!(
                        employee_id = %sa.employee_id,
                        path = %sa.workspace.path.display(),
                        "archive refused by reclamation guard"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        employee_id = %sa.employee_id,
                        error = %e,
                        "failed to archive workspace"
                    );
                }
            }
        }

        if dirty {
            self.store.save(&self.registry)?;
        }
        Ok(archived)
    }

    /// Delete still-present workspaces of terminated records -- the bulk
    /// variant of terminate's deletion half, for reconciling earlier
    /// failures. With `dry_run` the candidate set is reported and nothing
    /// on disk or in the registry changes.
    pub fn cleanup_all_terminated(&mut self, dry_run: bool) -> Result<Vec<String>, StorageError> {
        let mut cleaned = Vec::new();
        let mut dirty = false;

        for sa in &mut self.registry.subagents {
            if sa.status != Status::Terminated {
                continue;
            }
            if !sa.workspace.path.exists() {
                continue;
            }
            if dry_run {
                tracing::info!(employee_id = %sa.employee_id, "[dry-run] would clean workspace");
                cleaned.push(sa.employee_id.clone());
                continue;
            }

            match guard::reclaim(&sa.workspace.path) {
                Ok(ReclaimOutcome::Reclaimed) => {
                    sa.workspace.reclaimed_at = Some(Utc::now().to_rfc3339());
                    dirty = true;
                    cleaned.push(sa.employee_id.clone());
                    tracing::info!(employee_id = %sa.employee_id, "workspace cleaned");
                }
                Ok(ReclaimOutcome::AlreadyAbsent) => {}
                Ok(ReclaimOutcome::Refused) => {
                    tracing::warn!(
                        employee_id = %sa.employee_id,
                        path = %sa.workspace.path.display(),
                        "cleanup refused by reclamation guard"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        employee_id = %sa.employee_id,
                        error = %e,
                        "failed to clean workspace"
                    );
                }
            }
        }

        if dirty {
            self.store.save(&self.registry)?;
        }
        Ok(cleaned)
    }

    /// All records with status pending or active, in insertion order.
    pub fn list_active(&self) -> Vec<&SubAgentRecord> {
        self.registry
            .subagents
            .iter()
            .filter(|sa| matches!(sa.status, Status::Pending | Status::Active))
            .collect()
    }

    /// Point lookup by employee id.
    pub fn get_card(&self, employee_id: &str) -> Option<&SubAgentRecord> {
        self.registry
            .subagents
            .iter()
            .find(|sa| sa.employee_id == employee_id)
    }

    fn find_mut(&mut self, employee_id: &str) -> Option<&mut SubAgentRecord> {
        self.registry
            .subagents
            .iter_mut()
            .find(|sa| sa.employee_id == employee_id)
    }

    /// Workspace directory derived deterministically from the employee id.
    /// The leaf name carries the reclamation guard's marker token.
    fn workspace_path_for(&self, employee_id: &str) -> PathBuf {
        let slug = employee_id.to_lowercase().replace('-', "_");
        self.workspaces_root.join(format!("workspace-subagent_{slug}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_config(root: &std::path::Path) -> AppConfig {
        AppConfig {
            parent: "core".into(),
            registry_path: root.join("registry.json"),
            workspaces_root: root.join("workspaces"),
            shared_hub: root.join("hub"),
            archive_root: root.join("archive"),
            forbidden_dirs: vec![root.join("workspace-main")],
            default_timeout_minutes: 60,
            retention_days: 7,
        }
    }

    #[test]
    fn employee_id_embeds_parent_year_and_padded_counter() {
        let tmp = TempDir::new().unwrap();
        let mut mgr = LifecycleManager::new(&test_config(tmp.path())).unwrap();

        let outcome = mgr.spawn("W-1", Role::Worker, "task", 60, None).unwrap();
        let year = Utc::now().year();
        assert_eq!(outcome.record.employee_id, format!("CORE-SA-{year}-0001"));
    }

    #[test]
    fn workspace_leaf_name_carries_guard_marker() {
        let tmp = TempDir::new().unwrap();
        let mut mgr = LifecycleManager::new(&test_config(tmp.path())).unwrap();

        let outcome = mgr.spawn("W-1", Role::Worker, "task", 60, None).unwrap();
        let path = &outcome.record.workspace.path;
        let leaf = path.file_name().unwrap().to_string_lossy();
        assert!(leaf.contains(guard::WORKSPACE_MARKER));
        assert!(guard::is_reclaimable(path));
    }

    #[test]
    fn spawn_records_default_resources_and_sandbox() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        let mut mgr = LifecycleManager::new(&config).unwrap();

        let record = mgr.spawn("W-1", Role::Worker, "task", 60, None).unwrap().record;
        assert_eq!(record.task.resources_granted, vec!["file_read", "file_write"]);
        assert!(record.workspace.allowed_dirs.contains(&record.workspace.path));
        assert!(record.workspace.allowed_dirs.contains(&config.shared_hub));
        assert_eq!(record.workspace.forbidden_dirs, config.forbidden_dirs);
    }

    #[test]
    fn activate_refuses_terminal_but_reports_found() {
        let tmp = TempDir::new().unwrap();
        let mut mgr = LifecycleManager::new(&test_config(tmp.path())).unwrap();

        let id = mgr.spawn("W-1", Role::Worker, "task", 60, None).unwrap().record.employee_id;
        assert!(mgr.terminate(&id, "done").unwrap());

        assert!(mgr.activate(&id).unwrap());
        let card = mgr.get_card(&id).unwrap();
        assert_eq!(card.status, Status::Terminated);
        assert!(card.lifecycle.activated_at.is_none());
    }

    #[test]
    fn absurd_timeout_saturates_instead_of_wrapping() {
        let tmp = TempDir::new().unwrap();
        let mut mgr = LifecycleManager::new(&test_config(tmp.path())).unwrap();

        let record = mgr.spawn("W-1", Role::Worker, "task", u64::MAX, None).unwrap().record;
        let created = DateTime::parse_from_rfc3339(&record.task.created_at).unwrap();
        let deadline = DateTime::parse_from_rfc3339(&record.task.deadline).unwrap();
        assert!(deadline > created);

        // Far-future deadline: the sweep must not consider it expired.
        assert!(mgr.check_expired(true).unwrap().is_empty());
        assert_eq!(mgr.get_card(&record.employee_id).unwrap().status, Status::Pending);
    }

    #[test]
    fn heartbeat_does_not_touch_deadline() {
        let tmp = TempDir::new().unwrap();
        let mut mgr = LifecycleManager::new(&test_config(tmp.path())).unwrap();

        let record = mgr.spawn("W-1", Role::Worker, "task", 60, None).unwrap().record;
        assert!(mgr.heartbeat(&record.employee_id).unwrap());

        let card = mgr.get_card(&record.employee_id).unwrap();
        assert_eq!(card.task.deadline, record.task.deadline);
        assert_eq!(card.lifecycle.heartbeat_count, 1);
    }

    #[test]
    fn unknown_ids_report_not_found_without_error() {
        let tmp = TempDir::new().unwrap();
        let mut mgr = LifecycleManager::new(&test_config(tmp.path())).unwrap();

        assert!(!mgr.activate("GHOST-SA-2026-0001").unwrap());
        assert!(!mgr.heartbeat("GHOST-SA-2026-0001").unwrap());
        assert!(!mgr.terminate("GHOST-SA-2026-0001", "x").unwrap());
        assert!(mgr.get_card("GHOST-SA-2026-0001").is_none());
    }
}
