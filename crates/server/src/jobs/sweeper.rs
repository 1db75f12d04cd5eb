//! Periodic overdue sweep.

use crate::state::AppState;
use database::services::booking::BookingService;
use log::{debug, error, info};
use std::time::Duration;
use tokio::{task::JoinHandle, time::MissedTickBehavior};

/// Runs [`BookingService::sweep_overdue`] every `interval` until the runtime stops
///
/// The first sweep runs immediately so bookings that fell due while the
/// server was down are picked up at startup.
pub fn spawn_overdue_sweeper(state: AppState, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            match BookingService::sweep_overdue(&state.db, &state.policy, state.now()).await {
                Ok(report) if report.failed > 0 => {
                    error!("Overdue sweep finished with failures: {report:?}")
                }
                Ok(report) if report == Default::default() => {
                    debug!("Overdue sweep found nothing to do")
                }
                Ok(report) => info!("Overdue sweep: {report:?}"),
                Err(e) => error!("Overdue sweep aborted: {e}"),
            }
        }
    })
}
