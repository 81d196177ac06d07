//! Runs the recurring transaction job in the background of the server.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use rusqlite::Connection;
use tokio::time::MissedTickBehavior;

use crate::recurring::{MaterializationSummary, materialize_for_today};

/// Generate due recurring transactions now and then once every `period`.
///
/// Failed runs are logged and the schedule carries on, the next run picks up
/// anything that was missed. Runs forever, so spawn it as a task.
pub async fn run_recurring_schedule(
    db_connection: Arc<Mutex<Connection>>,
    local_timezone: String,
    period: Duration,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        // The first tick completes immediately.
        interval.tick().await;

        let db_connection = db_connection.clone();
        let local_timezone = local_timezone.clone();
        let run = tokio::task::spawn_blocking(move || {
            run_scheduled_materialization(&db_connection, &local_timezone)
        })
        .await;

        if let Err(error) = run {
            tracing::error!("Scheduled recurring transaction run panicked: {error}");
        }
    }
}

fn run_scheduled_materialization(
    db_connection: &Mutex<Connection>,
    local_timezone: &str,
) -> Option<MaterializationSummary> {
    tracing::info!("Starting scheduled recurring transaction run");

    match materialize_for_today(db_connection, local_timezone) {
        Ok(summary) => {
            tracing::info!("Scheduled run finished: {}", summary.message());
            Some(summary)
        }
        Err(error) => {
            tracing::error!("Scheduled recurring transaction run failed: {error}");
            None
        }
    }
}
