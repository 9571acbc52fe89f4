//! Workspace provisioning for freshly spawned sub-agents.
//!
//! Materializes the isolated working area described by a record's
//! [`WorkspaceSpec`]: the directory itself plus three declarative
//! descriptors -- `AGENTS.md` (identity and constraints), `TODO.md`
//! (task/progress checklist), and `CARD.json` (a snapshot of the record).
//!
//! Idempotent: re-running for an existing path overwrites the descriptors
//! and never removes unrelated files. The lifecycle manager triggers this
//! as a side effect and does not interpret the files.

pub mod guard;

use std::fs;

use crate::error::ProvisionError;
use crate::registry::types::SubAgentRecord;

/// Create the workspace directory and write the descriptor files.
pub fn provision(record: &SubAgentRecord) -> Result<(), ProvisionError> {
    let root = &record.workspace.path;
    fs::create_dir_all(root)?;

    fs::write(root.join("AGENTS.md"), identity_doc(record))?;
    fs::write(root.join("TODO.md"), checklist_doc(record))?;

    let snapshot = serde_json::to_string_pretty(record)?;
    fs::write(root.join("CARD.json"), snapshot)?;

    tracing::debug!(
        employee_id = %record.employee_id,
        path = %root.display(),
        "workspace provisioned"
    );
    Ok(())
}

fn identity_doc(record: &SubAgentRecord) -> String {
    format!(
        "# AGENTS.md - {name}\n\
         \n\
         ## Identity\n\
         - **Name**: {name}\n\
         - **Employee ID**: {id}\n\
         - **Role**: {role}\n\
         - **Parent**: {parent}\n\
         \n\
         ## Constraints\n\
         - Workspace only: {path}\n\
         - Cannot modify tickets directly\n\
         - Cannot call other agents directly\n\
         - All external communication through the parent agent\n\
         \n\
         ## Task\n\
         {task}\n",
        name = record.name,
        id = record.employee_id,
        role = record.role,
        parent = record.parent,
        path = record.workspace.path.display(),
        task = record.task.description,
    )
}

fn checklist_doc(record: &SubAgentRecord) -> String {
    format!(
        "# TODO - {name}\n\
         \n\
         ## Current Task\n\
         {task}\n\
         \n\
         ## Deadline\n\
         {deadline}\n\
         \n\
         ## Progress\n\
         - [ ] Task started\n\
         - [ ] In progress\n\
         - [ ] Completed\n",
        name = record.name,
        task = record.task.description,
        deadline = record.task.deadline,
    )
}
