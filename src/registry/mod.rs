pub mod manager;
pub mod store;
pub mod types;

pub use manager::{BatchOutcome, LifecycleManager, SpawnOutcome, SpawnRequest};
pub use store::RegistryStore;
pub use types::{
    Lifecycle, Permissions, Registry, Role, Status, SubAgentRecord, TaskSpec, WorkspaceSpec,
};
