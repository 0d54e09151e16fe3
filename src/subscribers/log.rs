//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints events to stdout in a human-readable format.
//! This is primarily useful for development, debugging, and examples.
//!
//! ## Output format
//! ```text
//! [fired] job=ads/prod/rollup policy=kill_existing
//! [misfire] job=ads/prod/rollup reason="no job with that key was found"
//! [collision] job=ads/prod/rollup policy=kill_existing active=2
//! [kill] job=ads/prod/rollup task=ads/prod/rollup-0-17
//! [launched] job=ads/prod/rollup count=2
//! [aborted] job=ads/prod/rollup reason="cancelled"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscriber;

/// Simple stdout logging subscriber.
///
/// Enabled via the `logging` feature. Prints human-readable event
/// descriptions to stdout for debugging and demonstration purposes.
///
/// Not intended for production use - implement a custom [`Subscriber`] for
/// structured logging or metrics collection.
pub struct LogWriter;

#[async_trait]
impl Subscriber for LogWriter {
    async fn handle(&self, e: &Event) {
        match e.kind {
            EventKind::TriggerFired => {
                if let (Some(job), Some(policy)) = (&e.job, e.policy) {
                    println!("[fired] job={job} policy={policy}");
                }
            }
            EventKind::Misfired => {
                println!("[misfire] job={:?} reason={:?}", e.job, e.reason);
            }
            EventKind::ConfigRejected => {
                println!("[rejected] job={:?} reason={:?}", e.job, e.reason);
            }
            EventKind::CollisionDetected => {
                println!(
                    "[collision] job={:?} policy={:?} active={:?}",
                    e.job, e.policy, e.count
                );
            }
            EventKind::KillRequested => {
                println!("[kill] job={:?} task={:?}", e.job, e.task);
            }
            EventKind::TasksLaunched => {
                println!("[launched] job={:?} count={:?}", e.job, e.count);
            }
            EventKind::LaunchAborted => {
                println!("[aborted] job={:?} reason={:?}", e.job, e.reason);
            }
        }
    }

    fn name(&self) -> &'static str {
        "log_writer"
    }
}
