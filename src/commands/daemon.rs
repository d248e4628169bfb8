use anyhow::Result;
use quarry_menubar::daemon::DaemonState;
use tracing::info;

use super::AppContext;

/// Supervise the backend, printing every state change, until Ctrl+C or
/// until the backend exits on its own
pub async fn serve(ctx: &AppContext) -> Result<()> {
    let supervisor = ctx.supervisor()?;
    let mut states = supervisor.subscribe();

    info!("Launching {}", supervisor.launch_spec());
    supervisor.start();
    let mut current = states.borrow_and_update().clone();
    println!("Backend: {}", current);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        match &current {
            DaemonState::Stopped => return Ok(()),
            DaemonState::Error(message) => anyhow::bail!("Backend failed: {}", message),
            DaemonState::Starting | DaemonState::Running { .. } => {}
        }

        tokio::select! {
            changed = states.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                current = states.borrow_and_update().clone();
                println!("Backend: {}", current);
            }
            _ = &mut ctrl_c => {
                println!("Stopping backend...");
                supervisor.stop();
                // Give the monitor a moment to deliver SIGTERM before exit
                tokio::time::sleep(ctx.config.daemon.restart_settle()).await;
                println!("Backend: {}", supervisor.state());
                return Ok(());
            }
        }
    }
}
