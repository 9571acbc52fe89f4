//! Notification payload composition for spawned sub-agents.
//!
//! The lifecycle manager composes a structured message here and appends it
//! to `{shared_hub}/notifications.jsonl`; an external delivery channel
//! reads that log and sends the message. This crate never sends anything
//! itself.
//!
//! One JSON object per line, flushed after each append. The loader is
//! lenient and skips corrupt lines so a partial write from a crash does
//! not prevent reading the rest of the log.

use std::fs::OpenOptions;
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::registry::types::{Role, SubAgentRecord};

/// A composed message, ready for an external delivery channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPayload {
    /// RFC 3339 timestamp of composition.
    pub timestamp: String,
    /// Issued card id; comma-joined ids for a grouped batch entry.
    pub employee_id: String,
    pub message: String,
    /// Rendered badge file to attach, if one was produced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<PathBuf>,
}

/// Build the card-issued message for a freshly spawned record.
pub fn compose(record: &SubAgentRecord, badge_path: Option<&Path>) -> NotificationPayload {
    let task = &record.task.description;
    let summary: String = if task.chars().count() > 60 {
        format!("{}...", task.chars().take(60).collect::<String>())
    } else {
        task.clone()
    };
    let deadline: String = record.task.deadline.chars().take(16).collect();

    let message = format!(
        "New sub-agent card issued\n\
         \n\
         ID:       {id}\n\
         Role:     {role}\n\
         Task:     {summary}\n\
         Deadline: {deadline}\n\
         \n\
         Results will be reported to the parent agent on completion.",
        id = record.employee_id,
        role = record.role.as_str().to_uppercase(),
        deadline = deadline.replace('T', " "),
    );

    NotificationPayload {
        timestamp: chrono::Utc::now().to_rfc3339(),
        employee_id: record.employee_id.clone(),
        message,
        attachment: badge_path.map(Path::to_path_buf),
    }
}

/// Build the grouped summary message for a freshly spawned batch,
/// sectioned by role in a fixed order. No attachment; the per-card
/// entries already carry the badge paths.
pub fn compose_batch(records: &[&SubAgentRecord]) -> NotificationPayload {
    let ids: Vec<&str> = records.iter().map(|r| r.employee_id.as_str()).collect();

    let mut message = format!("Sub-agent batch issued ({} cards)\n", records.len());
    for role in [Role::Worker, Role::Reviewer, Role::Researcher, Role::Formatter] {
        let group: Vec<&&SubAgentRecord> =
            records.iter().filter(|r| r.role == role).collect();
        if group.is_empty() {
            continue;
        }
        message.push_str(&format!("\n{}:\n", role.as_str().to_uppercase()));
        for record in group {
            message.push_str(&format!("  {}  {}\n", record.employee_id, record.name));
        }
    }
    message.push_str("\nResults will be reported to the parent agent on completion.");

    NotificationPayload {
        timestamp: chrono::Utc::now().to_rfc3339(),
        employee_id: ids.join(","),
        message,
        attachment: None,
    }
}

/// Path of the notification log inside the shared hub.
pub fn log_path(shared_hub: &Path) -> PathBuf {
    shared_hub.join("notifications.jsonl")
}

/// Append a payload to the shared-hub notification log.
///
/// Creates the hub directory if needed. Error-as-String: the caller stores
/// the failure on the spawn outcome instead of propagating it.
pub fn append(shared_hub: &Path, payload: &NotificationPayload) -> Result<(), String> {
    std::fs::create_dir_all(shared_hub)
        .map_err(|e| format!("Failed to create shared hub: {e}"))?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path(shared_hub))
        .map_err(|e| format!("Failed to open notification log: {e}"))?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, payload)
        .map_err(|e| format!("Failed to serialize notification: {e}"))?;
    writer
        .write_all(b"\n")
        .map_err(|e| format!("Failed to write newline: {e}"))?;
    writer
        .flush()
        .map_err(|e| format!("Failed to flush notification log: {e}"))?;
    Ok(())
}

/// Load all notifications from the log. Missing file yields an empty list;
/// unparsable lines are skipped.
pub fn load(shared_hub: &Path) -> Vec<NotificationPayload> {
    let file = match std::fs::File::open(log_path(shared_hub)) {
        Ok(f) => f,
        Err(_) => return Vec::new(),
    };

    std::io::BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .filter_map(|line| serde_json::from_str(&line).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::types::{
        Lifecycle, Permissions, Role, Status, SubAgentRecord, TaskSpec, WorkspaceSpec,
    };
    use tempfile::TempDir;

    fn sample_record() -> SubAgentRecord {
        SubAgentRecord {
            employee_id: "CORE-SA-2026-0002".into(),
            name: "Librarian".into(),
            role: Role::Formatter,
            parent: "CORE".into(),
            status: Status::Pending,
            task: TaskSpec {
                description: "tidy the report".into(),
                created_at: "2026-08-28T10:00:00+00:00".into(),
                deadline: "2026-08-28T11:30:00+00:00".into(),
                resources_granted: vec![],
            },
            workspace: WorkspaceSpec {
                path: PathBuf::from("/tmp/workspace-subagent_core_sa_2026_0002"),
                allowed_dirs: vec![],
                forbidden_dirs: vec![],
                reclaimed_at: None,
            },
            lifecycle: Lifecycle::at_spawn("2026-08-28T10:00:00+00:00".into()),
            permissions: Permissions::subagent(),
            termination_reason: None,
        }
    }

    #[test]
    fn compose_includes_id_role_and_deadline() {
        let record = sample_record();
        let payload = compose(&record, Some(Path::new("/tmp/badge.txt")));
        assert_eq!(payload.employee_id, "CORE-SA-2026-0002");
        assert!(payload.message.contains("FORMATTER"));
        assert!(payload.message.contains("2026-08-28 11:30"));
        assert_eq!(payload.attachment.as_deref(), Some(Path::new("/tmp/badge.txt")));
    }

    fn named_record(id: &str, name: &str, role: Role) -> SubAgentRecord {
        let mut record = sample_record();
        record.employee_id = id.into();
        record.name = name.into();
        record.role = role;
        record
    }

    #[test]
    fn compose_batch_groups_records_by_role() {
        let a = named_record("CORE-SA-2026-0001", "Worker-1", Role::Worker);
        let b = named_record("CORE-SA-2026-0002", "Worker-2", Role::Worker);
        let c = named_record("CORE-SA-2026-0003", "Rev-1", Role::Reviewer);

        let payload = compose_batch(&[&a, &b, &c]);
        assert_eq!(
            payload.employee_id,
            "CORE-SA-2026-0001,CORE-SA-2026-0002,CORE-SA-2026-0003"
        );
        assert!(payload.message.contains("3 cards"));
        assert!(payload.message.contains("CORE-SA-2026-0002  Worker-2"));
        assert!(payload.message.find("WORKER:").unwrap() < payload.message.find("REVIEWER:").unwrap());
        assert!(payload.attachment.is_none());
    }

    #[test]
    fn append_and_load_round_trip() {
        let tmp = TempDir::new().unwrap();
        let hub = tmp.path().join("hub");

        let payload = compose(&sample_record(), None);
        append(&hub, &payload).unwrap();
        append(&hub, &payload).unwrap();

        let loaded = load(&hub);
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].employee_id, "CORE-SA-2026-0002");
        assert!(loaded[0].attachment.is_none());
    }

    #[test]
    fn load_skips_corrupt_lines() {
        let tmp = TempDir::new().unwrap();
        let hub = tmp.path().join("hub");
        append(&hub, &compose(&sample_record(), None)).unwrap();

        use std::io::Write as _;
        let mut f = OpenOptions::new()
            .append(true)
            .open(log_path(&hub))
            .unwrap();
        writeln!(f, "{{half a line").unwrap();
        append(&hub, &compose(&sample_record(), None)).unwrap();

        assert_eq!(load(&hub).len(), 2);
    }

    #[test]
    fn load_from_missing_hub_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(load(&tmp.path().join("nope")).is_empty());
    }
}
