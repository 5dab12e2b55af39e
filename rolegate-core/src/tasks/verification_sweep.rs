// File: rolegate-core/src/tasks/verification_sweep.rs

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::info;

use crate::verification::VerificationStore;

pub const VERIFICATION_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// One cleanup pass over every store. Returns the total number removed.
pub async fn run_verification_sweep(stores: &[Arc<VerificationStore>]) -> usize {
    let mut cleaned = 0;
    for store in stores {
        cleaned += store.purge_expired().await;
    }
    cleaned
}

/// Spawns a background task that drops expired verification codes.
pub fn spawn_verification_sweep_task(
    stores: Vec<Arc<VerificationStore>>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Verification cleanup running every {}s", interval.as_secs());
        loop {
            sleep(interval).await;
            run_verification_sweep(&stores).await;
        }
    })
}
