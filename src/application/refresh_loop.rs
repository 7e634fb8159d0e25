// Refresh loop - drives the engine on a timer and publishes snapshots
use crate::application::metrics_engine::MetricsEngine;
use crate::domain::dashboard::DashboardSnapshot;
use chrono::{DateTime, Local};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

pub struct RefreshLoop {
    engine: MetricsEngine,
    last_good: DashboardSnapshot,
    publisher: watch::Sender<DashboardSnapshot>,
}

impl RefreshLoop {
    pub fn new(engine: MetricsEngine, publisher: watch::Sender<DashboardSnapshot>) -> Self {
        Self {
            engine,
            last_good: DashboardSnapshot::empty(),
            publisher,
        }
    }

    /// Run one cycle and publish its snapshot. A failed cycle re-publishes
    /// the last good snapshot instead.
    pub async fn tick(&mut self, now: DateTime<Local>) -> DashboardSnapshot {
        match self.engine.refresh(now).await {
            Ok(snapshot) => self.last_good = snapshot,
            Err(e) => {
                tracing::error!("Refresh cycle failed, re-emitting previous snapshot: {}", e);
            }
        }

        self.publisher.send_replace(self.last_good.clone());
        self.last_good.clone()
    }

    pub async fn run(mut self, period: Duration) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!("Refreshing dashboard every {:?}", period);
        loop {
            interval.tick().await;
            self.tick(Local::now()).await;
        }
    }
}
