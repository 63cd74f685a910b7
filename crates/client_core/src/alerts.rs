use std::{sync::Arc, time::Duration};

use shared::protocol::LowStockAlert;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, warn};

use crate::{
    backend::InventoryBackend,
    view::{ApplyOutcome, ListView},
};

pub const DEFAULT_ALERT_POLL_INTERVAL: Duration = Duration::from_secs(30);
/// Shorter periods, zero included, are raised to this.
pub const MIN_ALERT_POLL_INTERVAL: Duration = Duration::from_millis(10);

pub type SharedAlerts = Arc<Mutex<ListView<LowStockAlert>>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertEvent {
    Refreshed { active: usize },
    Failed { message: String },
}

/// Re-fetches the active low-stock alerts on a fixed interval and applies
/// each response to the shared alert view. The first poll fires
/// immediately. Polls are not serialized: a slow response may land after a
/// newer one, and the last to arrive wins. Dropping the poller stops it.
pub struct AlertPoller {
    task: JoinHandle<()>,
    events: broadcast::Sender<AlertEvent>,
}

impl AlertPoller {
    pub fn spawn(
        backend: Arc<dyn InventoryBackend>,
        alerts: SharedAlerts,
        period: Duration,
    ) -> Self {
        let period = period.max(MIN_ALERT_POLL_INTERVAL);
        let (events, _) = broadcast::channel(64);
        let sender = events.clone();
        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                tokio::spawn(poll_once(
                    Arc::clone(&backend),
                    Arc::clone(&alerts),
                    sender.clone(),
                ));
            }
        });
        Self { task, events }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AlertEvent> {
        self.events.subscribe()
    }

    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for AlertPoller {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn poll_once(
    backend: Arc<dyn InventoryBackend>,
    alerts: SharedAlerts,
    events: broadcast::Sender<AlertEvent>,
) {
    let ticket = alerts.lock().await.begin_fetch();
    let result = backend.active_alerts().await;
    let mut view = alerts.lock().await;
    let event = match view.apply(ticket, result) {
        ApplyOutcome::Replaced => AlertEvent::Refreshed {
            active: view.items().len(),
        },
        ApplyOutcome::KeptStale | ApplyOutcome::FailedEmpty => {
            let message = view.error().unwrap_or_default().to_string();
            warn!(%message, "alert poll failed");
            AlertEvent::Failed { message }
        }
        ApplyOutcome::Ignored => {
            debug!("alert view unmounted; poll result dropped");
            return;
        }
    };
    drop(view);
    let _ = events.send(event);
}

#[cfg(test)]
#[path = "tests/alerts_tests.rs"]
mod tests;
