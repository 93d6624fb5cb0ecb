//! Periodic session sweep task

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::debug;

use super::SessionService;

/// Spawn the sweep loop, running until `shutdown` fires or closes
pub fn spawn_session_monitor(
    service: Arc<SessionService>,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    // tokio intervals reject a zero period
    let interval = service.options().monitor_interval.max(Duration::from_millis(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                biased;

                _ = ticker.tick() => {
                    let report = service.do_work();
                    if report.disconnected > 0 || report.removed > 0 || report.payloads_evicted > 0 {
                        debug!(
                            "Session sweep: {} disconnected, {} removed, {} wills, {} payloads evicted",
                            report.disconnected,
                            report.removed,
                            report.wills_published,
                            report.payloads_evicted
                        );
                    }
                }
                result = shutdown.recv() => {
                    match result {
                        Ok(()) => break,
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        }
        debug!("Session monitor stopped");
    })
}
