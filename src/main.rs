use anyhow::Context;
use clap::Parser;

use foreman::badge::{self, BadgeView};
use foreman::cli::{Cli, Commands};
use foreman::config;
use foreman::registry::{LifecycleManager, SpawnRequest};

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let config = config::load_config(&cli)?;
    tracing::info!(
        parent = %config.parent,
        registry = %config.registry_path.display(),
        "Foreman starting"
    );

    let mut manager = LifecycleManager::new(&config)?;

    match cli.command {
        Commands::Spawn {
            name,
            role,
            description,
            timeout,
            resources,
        } => {
            let timeout = timeout.unwrap_or(config.default_timeout_minutes);
            let resources = if resources.is_empty() { None } else { Some(resources) };
            let outcome = manager.spawn(&name, role, &description, timeout, resources)?;

            println!("Issued card: {}", outcome.record.employee_id);
            println!("Workspace:   {}", outcome.record.workspace.path.display());
            if let Err(e) = &outcome.provisioning {
                println!("Provisioning failed (card still issued): {e}");
            }
            match &outcome.badge {
                Ok(path) => println!("Badge:       {}", path.display()),
                Err(e) => println!("Badge rendering failed: {e}"),
            }
            if let Err(e) = &outcome.notification {
                println!("Notification logging failed: {e}");
            }
        }
        Commands::SpawnBatch { file } => {
            let contents = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let requests: Vec<SpawnRequest> = serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", file.display()))?;

            let batch = manager.spawn_batch(requests)?;
            for outcome in &batch.outcomes {
                println!("Issued card: {}", outcome.record.employee_id);
            }
            match &batch.group_notification {
                Some(Ok(_)) => {
                    println!("Group notification logged ({} cards)", batch.outcomes.len())
                }
                Some(Err(e)) => println!("Group notification logging failed: {e}"),
                None => println!("Empty batch; no cards issued."),
            }
        }
        Commands::Activate { employee_id } => {
            if manager.activate(&employee_id)? {
                println!("Activated {employee_id}");
            } else {
                println!("No card found for {employee_id}");
            }
        }
        Commands::Heartbeat { employee_id } => {
            if manager.heartbeat(&employee_id)? {
                println!("Heartbeat recorded for {employee_id}");
            } else {
                println!("No card found for {employee_id}");
            }
        }
        Commands::Terminate { employee_id, reason } => {
            if manager.terminate(&employee_id, &reason)? {
                println!("Terminated {employee_id} ({reason})");
            } else {
                println!("No card found for {employee_id}");
            }
        }
        Commands::List => {
            let active = manager.list_active();
            if active.is_empty() {
                println!("No pending or active sub-agents.");
            }
            for record in active {
                println!(
                    "{}  {:<10}  {:<10}  {}",
                    record.employee_id, record.status, record.role, record.name
                );
            }
        }
        Commands::Show { employee_id } => match manager.get_card(&employee_id) {
            Some(record) => println!("{}", serde_json::to_string_pretty(record)?),
            None => println!("No card found for {employee_id}"),
        },
        Commands::Sweep { report_only } => {
            let expired = manager.check_expired(!report_only)?;
            if expired.is_empty() {
                println!("No expired sub-agents.");
            } else {
                let action = if report_only { "Expired" } else { "Terminated" };
                for id in expired {
                    println!("{action}: {id}");
                }
            }
        }
        Commands::Archive { days } => {
            let days = days.unwrap_or(config.retention_days);
            for id in manager.archive(days)? {
                println!("Archived: {id}");
            }
        }
        Commands::Cleanup { dry_run } => {
            for id in manager.cleanup_all_terminated(dry_run)? {
                if dry_run {
                    println!("Would clean: {id}");
                } else {
                    println!("Cleaned: {id}");
                }
            }
        }
        Commands::Badge { employee_id } => match manager.get_card(&employee_id) {
            Some(record) => print!("{}", badge::render(&BadgeView::from_record(record))),
            None => println!("No card found for {employee_id}"),
        },
    }

    Ok(())
}
