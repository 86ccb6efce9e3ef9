//! Background task applying the lifecycle rules to every post.
//!
//! Reads already close and purge lazily; the sweep keeps the table tidy
//! between reads.

use std::{sync::Arc, time::Duration};

use hiroba_core::{lifecycle::SweepReport, store::ForumStore};
use tokio::{task::JoinHandle, time::MissedTickBehavior};

/// Run one sweep, logging the outcome. Failures are logged and swallowed so
/// the next tick can try again.
pub async fn sweep_once<S: ForumStore>(store: &S) -> Option<SweepReport> {
  match store.sweep().await {
    Ok(report) => {
      if report.closed > 0 || report.purged > 0 {
        tracing::info!(closed = report.closed, purged = report.purged, "lifecycle sweep");
      }
      Some(report)
    }
    Err(e) => {
      tracing::warn!(error = %e, "lifecycle sweep failed");
      None
    }
  }
}

/// Spawn the sweeper. The first sweep runs immediately.
pub fn spawn<S: ForumStore + 'static>(store: Arc<S>, every: Duration) -> JoinHandle<()> {
  tokio::spawn(async move {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
      interval.tick().await;
      sweep_once(store.as_ref()).await;
    }
  })
}
