//! Text badge ("employee card") rendering.
//!
//! External collaborator surface: the lifecycle manager hands it a
//! flattened [`BadgeView`] of a record and gets back either a rendered
//! string or a path to a card file written under `{workspace}/badges/`.
//! Failures are error-as-String data on the spawn outcome and never abort
//! the spawn.

use std::fs;
use std::path::PathBuf;

use crate::registry::types::SubAgentRecord;

/// Inner text width of the rendered card.
const CARD_WIDTH: usize = 60;

/// Flattened view of a record, decoupling rendering from registry types.
#[derive(Debug, Clone)]
pub struct BadgeView {
    pub name: String,
    pub employee_id: String,
    pub role: String,
    pub parent: String,
    pub status: String,
    pub task_summary: String,
    pub deadline: String,
    pub can_read_shared_hub: bool,
    pub can_write_shared_hub: bool,
    pub can_modify_tickets: bool,
    pub can_call_other_agents: bool,
}

impl BadgeView {
    pub fn from_record(record: &SubAgentRecord) -> Self {
        Self {
            name: record.name.clone(),
            employee_id: record.employee_id.clone(),
            role: record.role.as_str().to_uppercase(),
            parent: record.parent.clone(),
            status: record.status.as_str().to_uppercase(),
            task_summary: truncate(&record.task.description, 40),
            deadline: record.task.deadline.chars().take(19).collect(),
            can_read_shared_hub: record.permissions.can_read_shared_hub,
            can_write_shared_hub: record.permissions.can_write_shared_hub,
            can_modify_tickets: record.permissions.can_modify_tickets,
            can_call_other_agents: record.permissions.can_call_other_agents,
        }
    }
}

/// Render the boxed card for display.
pub fn render(view: &BadgeView) -> String {
    let bar = "=".repeat(CARD_WIDTH);
    let mut out = String::new();

    out.push_str(&format!("+{bar}+\n"));
    out.push_str(&centered("FOREMAN  ·  SUB-AGENT EMPLOYEE CARD"));
    out.push_str(&format!("+{bar}+\n"));
    out.push_str(&field("ID", &view.employee_id));
    out.push_str(&field("Name", &view.name));
    out.push_str(&field("Role", &view.role));
    out.push_str(&field("Dept", &view.parent));
    out.push_str(&field("Status", &view.status));
    out.push_str(&field("Task", &view.task_summary));
    out.push_str(&field("Expires", &view.deadline));
    out.push_str(&blank());
    out.push_str(&field("Perms", &mark("read shared hub", view.can_read_shared_hub)));
    out.push_str(&field("", &mark("write shared hub (via parent)", view.can_write_shared_hub)));
    out.push_str(&field("", &mark("modify tickets", view.can_modify_tickets)));
    out.push_str(&field("", &mark("call other agents", view.can_call_other_agents)));
    out.push_str(&blank());
    out.push_str(&centered(&barcode(&view.employee_id)));
    out.push_str(&format!("+{bar}+\n"));
    out
}

/// Render the card and write it to `{workspace}/badges/badge_{id}.txt`.
///
/// Returns the path on success; error text otherwise (the caller records
/// it, never propagates it).
pub fn write_badge(record: &SubAgentRecord) -> Result<PathBuf, String> {
    let dir = record.workspace.path.join("badges");
    fs::create_dir_all(&dir).map_err(|e| format!("Failed to create badge dir: {e}"))?;

    let filename = format!("badge_{}.txt", record.employee_id.to_lowercase());
    let path = dir.join(filename);
    let card = render(&BadgeView::from_record(record));
    fs::write(&path, card).map_err(|e| format!("Failed to write badge: {e}"))?;
    Ok(path)
}

fn field(label: &str, value: &str) -> String {
    let body = format!("  {:<9}{}", label, truncate(value, CARD_WIDTH - 12));
    format!("|{:<width$}|\n", body, width = CARD_WIDTH)
}

fn blank() -> String {
    format!("|{:width$}|\n", "", width = CARD_WIDTH)
}

fn centered(text: &str) -> String {
    let text = truncate(text, CARD_WIDTH);
    let pad = (CARD_WIDTH - text.chars().count()) / 2;
    let body = format!("{:pad$}{}", "", text);
    format!("|{:<width$}|\n", body, width = CARD_WIDTH)
}

fn mark(label: &str, granted: bool) -> String {
    format!("[{}] {label}", if granted { "x" } else { " " })
}

/// Barcode-style line derived from the id: digits widen the bars.
fn barcode(id: &str) -> String {
    let mut line = String::from("*");
    for c in id.chars() {
        if c.is_ascii_digit() {
            line.push_str("||");
        } else {
            line.push('|');
        }
    }
    line.push('*');
    truncate(&line, CARD_WIDTH)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        s.to_string()
    }
}
