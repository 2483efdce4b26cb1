//! Periodic evaluation of recurring schedules.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use engine::Engine;
use tokio::time::MissedTickBehavior;

/// Fire due schedules every `period`, forever.
pub async fn run(engine: Arc<Engine>, period: Duration) {
    tracing::info!("Schedule evaluator running every {}s", period.as_secs());
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        tick(&engine).await;
    }
}

async fn tick(engine: &Engine) {
    let runs = match engine.run_due_schedules(Utc::now()).await {
        Ok(runs) => runs,
        Err(err) => {
            tracing::error!("failed to load due schedules: {err}");
            return;
        }
    };

    for (schedule_id, run) in runs {
        match run {
            Ok(run) => tracing::info!(
                schedule_id,
                transaction_id = run.transaction.id,
                balance = %run.transaction.balance,
                next_run = %run.next_run,
                "schedule fired"
            ),
            Err(err) => tracing::error!(schedule_id, "schedule failed: {err}"),
        }
    }
}
