// File: rolegate-core/src/tasks/session_sweep.rs

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::debug;

use crate::services::discord::InteractionRouter;

pub const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// Spawns a background task that closes idle inventory views.
pub fn spawn_session_sweep_task(router: Arc<InteractionRouter>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            sleep(interval).await;
            let closed = router.sweep_sessions().await;
            if closed > 0 {
                debug!("Closed {} idle inventory views", closed);
            }
        }
    })
}
