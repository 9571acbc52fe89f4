use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::registry::Role;

#[derive(Parser, Debug)]
#[command(name = "foreman", version, about = "Sub-agent lifecycle and employee-card registry")]
pub struct Cli {
    /// Parent agent identifier issuing the cards
    #[arg(short, long)]
    pub parent: Option<String>,

    /// Data root holding the registry, workspaces, shared hub, and archive
    #[arg(long)]
    pub data_root: Option<PathBuf>,

    /// Path to config file (overrides default search)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Issue a new employee card and provision a workspace
    Spawn {
        /// Sub-agent name (e.g., "Scout-1")
        name: String,

        /// Role: worker, reviewer, researcher, or formatter
        role: Role,

        /// Task description
        description: String,

        /// Timeout in minutes (deadline = now + timeout)
        #[arg(long)]
        timeout: Option<u64>,

        /// Granted resource, repeatable
        #[arg(long = "resource")]
        resources: Vec<String>,
    },
    /// Issue several employee cards from a JSON request file
    SpawnBatch {
        /// JSON file holding a list of {name, role, description,
        /// timeout_minutes?, resources?} objects
        file: PathBuf,
    },
    /// Mark a pending or paused sub-agent active
    Activate { employee_id: String },
    /// Record a liveness heartbeat
    Heartbeat { employee_id: String },
    /// Terminate a sub-agent and reclaim its workspace
    Terminate {
        employee_id: String,

        /// Reason recorded on the card
        #[arg(short, long, default_value = "completed")]
        reason: String,
    },
    /// List pending and active sub-agents
    List,
    /// Show one card in full
    Show { employee_id: String },
    /// Check deadlines and terminate expired sub-agents
    Sweep {
        /// Report expired ids without terminating them
        #[arg(long)]
        report_only: bool,
    },
    /// Move workspaces of old terminated sub-agents to cold storage
    Archive {
        /// Age threshold in days (defaults to configured retention)
        #[arg(long)]
        days: Option<u32>,
    },
    /// Delete leftover workspaces of terminated sub-agents
    Cleanup {
        /// Report candidates without deleting anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Render the text badge for a card
    Badge { employee_id: String },
}
