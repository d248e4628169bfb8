use anyhow::Result;
use quarry_menubar::discovery::{DiscoveryOutcome, DiscoverySnapshot};
use tracing::warn;

use super::AppContext;

pub async fn list_databases(ctx: &AppContext, refresh: bool) -> Result<()> {
    let discovery = ctx.discovery();

    if refresh {
        match discovery.load_databases().await {
            DiscoveryOutcome::Refreshed(_) | DiscoveryOutcome::AlreadyRunning => {}
            DiscoveryOutcome::TimedOut => println!(
                "Discovery timed out after {:?}, showing last known databases",
                discovery.timeout()
            ),
            DiscoveryOutcome::Failed(message) => {
                println!("Discovery failed ({}), showing last known databases", message)
            }
        }
    }

    print_snapshot(&discovery.snapshot());
    Ok(())
}

pub fn select_database(ctx: &AppContext, name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("Database name must not be empty");
    }

    let discovery = ctx.discovery();
    let known = discovery.available_databases();
    if !known.is_empty() && !known.iter().any(|db| db.name == name) {
        warn!("'{}' is not in the last discovered database list", name);
    }

    if discovery.select_database(name) {
        println!("Selected database '{}'", name);
    } else {
        println!("Database '{}' is already selected", name);
    }
    Ok(())
}

fn print_snapshot(snapshot: &DiscoverySnapshot) {
    if snapshot.available_databases.is_empty() {
        println!("No databases found");
    }

    for db in &snapshot.available_databases {
        let marker = if db.name == snapshot.selected_database {
            "*"
        } else {
            " "
        };
        println!(
            "{} {}: {} documents, {}",
            marker, db.name, db.document_count, db.size_description
        );
    }

    match snapshot.last_refreshed {
        Some(at) => println!("\nLast refreshed: {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
        None => println!("\nNever refreshed"),
    }
}
