//! Type definitions for the sub-agent registry.
//!
//! These types form the shared vocabulary between the [`super::store::RegistryStore`],
//! the [`super::manager::LifecycleManager`], the badge renderer, and the CLI.
//! All of them serialize to the snake_case JSON stored in the registry file,
//! so renaming a field here is a registry format change.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Registry schema version written on first run.
pub const REGISTRY_VERSION: &str = "1.0";

/// Role a sub-agent is hired for. Closed set -- permission and badge logic
/// match exhaustively over these variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Executes a concrete task.
    Worker,
    /// Reviews or validates another agent's output.
    Reviewer,
    /// Investigates and analyzes.
    Researcher,
    /// Formats and polishes output.
    Formatter,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Worker => "worker",
            Role::Reviewer => "reviewer",
            Role::Researcher => "researcher",
            Role::Formatter => "formatter",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "worker" => Ok(Role::Worker),
            "reviewer" => Ok(Role::Reviewer),
            "researcher" => Ok(Role::Researcher),
            "formatter" => Ok(Role::Formatter),
            other => Err(format!(
                "unknown role '{other}' (expected worker, reviewer, researcher, or formatter)"
            )),
        }
    }
}

/// Lifecycle status of a sub-agent record.
///
/// `Completed` and `Terminated` are terminal: no operation transitions a
/// record out of them, ever.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Created, waiting for activation.
    Pending,
    /// Running.
    Active,
    /// Suspended; may be re-activated.
    Paused,
    /// Finished normally.
    Completed,
    /// Shut down by the parent or the expiry sweep.
    Terminated,
}

impl Status {
    /// A live record still occupies a workspace and counts against deadlines.
    pub fn is_live(&self) -> bool {
        match self {
            Status::Pending | Status::Active | Status::Paused => true,
            Status::Completed | Status::Terminated => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_live()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Active => "active",
            Status::Paused => "paused",
            Status::Completed => "completed",
            Status::Terminated => "terminated",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The task a sub-agent was spawned for, with its fixed deadline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub description: String,
    /// RFC 3339 timestamp of record creation.
    pub created_at: String,
    /// RFC 3339 timestamp; created_at + timeout. Fixed at spawn, heartbeats
    /// do not extend it.
    pub deadline: String,
    pub resources_granted: Vec<String>,
}

/// Declarative sandbox description handed to whatever executes the sub-agent.
/// Not enforced here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceSpec {
    /// Workspace root, owned exclusively by this record until reclaimed.
    pub path: PathBuf,
    /// Own workspace plus read-only shared hub.
    pub allowed_dirs: Vec<PathBuf>,
    /// Sibling core workspaces the sub-agent must not touch.
    pub forbidden_dirs: Vec<PathBuf>,
    /// Set once the directory has been physically deleted or archived.
    /// A terminated record with `None` here is the logical/physical
    /// divergence a later cleanup pass reconciles.
    #[serde(default)]
    pub reclaimed_at: Option<String>,
}

/// Fixed capability flags. Every sub-agent gets the same matrix: depth is
/// capped at one, and all external communication goes through the parent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    pub can_read_shared_hub: bool,
    pub can_write_shared_hub: bool,
    pub can_create_subagent: bool,
    pub can_modify_tickets: bool,
    pub can_call_other_agents: bool,
}

impl Permissions {
    /// The one permission matrix sub-agents are ever issued.
    pub fn subagent() -> Self {
        Self {
            can_read_shared_hub: true,
            can_write_shared_hub: false,
            can_create_subagent: false,
            can_modify_tickets: false,
            can_call_other_agents: false,
        }
    }
}

/// Timestamps and liveness counters for one record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lifecycle {
    pub spawned_at: String,
    pub activated_at: Option<String>,
    pub completed_at: Option<String>,
    pub heartbeat_count: u64,
    pub last_heartbeat: Option<String>,
}

impl Lifecycle {
    pub fn at_spawn(spawned_at: String) -> Self {
        Self {
            spawned_at,
            activated_at: None,
            completed_at: None,
            heartbeat_count: 0,
            last_heartbeat: None,
        }
    }
}

/// The central entity: one issued employee card.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubAgentRecord {
    /// `{PARENT}-SA-{YEAR}-{NNNN}`. Immutable once assigned.
    pub employee_id: String,
    pub name: String,
    pub role: Role,
    /// Owning agent identifier.
    pub parent: String,
    pub status: Status,
    pub task: TaskSpec,
    pub workspace: WorkspaceSpec,
    pub permissions: Permissions,
    pub lifecycle: Lifecycle,
    /// Set only by terminate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub termination_reason: Option<String>,
}

/// Persisted registry: schema version, insertion-ordered records, and the
/// monotonic ID counter. The counter is never derived from the list length
/// and is never reused, even after records are terminated and archived.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Registry {
    pub version: String,
    pub subagents: Vec<SubAgentRecord>,
    pub id_counter: u64,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            version: REGISTRY_VERSION.to_string(),
            subagents: Vec::new(),
            id_counter: 0,
        }
    }
}
