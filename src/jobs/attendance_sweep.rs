//! Periodic closing of elapsed attendance days.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::engine::HrEngine;

/// Closes every open record dated before the workplace-local today.
///
/// Returns the number of records closed.
pub fn run_attendance_sweep(engine: &HrEngine) -> usize {
    let closed = engine.attendance().sweep_elapsed_days(engine.clock().now());
    if closed > 0 {
        info!(closed, "Attendance sweep closed elapsed days");
    } else {
        debug!("Attendance sweep found nothing to close");
    }
    closed
}

/// Runs [`run_attendance_sweep`] every `every`, starting immediately.
///
/// The task runs until the returned handle is aborted or the runtime stops.
pub fn spawn_attendance_sweep(engine: HrEngine, every: Duration) -> JoinHandle<()> {
    let every = every.max(Duration::from_millis(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            run_attendance_sweep(&engine);
        }
    })
}
