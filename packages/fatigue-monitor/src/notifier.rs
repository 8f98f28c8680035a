use std::time::Duration;

use chrono::{DateTime, Utc};
use fatigue_engine::DetectionSnapshot;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use crate::error::{MonitorError, Result};

const WEBHOOK_ATTEMPTS: u32 = 3;
const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);
const WEBHOOK_BACKOFF_MS: u64 = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmEvent {
    /// Frame time that authorized the alarm.
    pub timestamp: f64,
    pub level: String,
    pub score: u8,
    pub is_fatigued: bool,
    pub is_yawning: bool,
    pub is_head_down: bool,
    pub triggered_at: DateTime<Utc>,
}

impl AlarmEvent {
    pub fn from_snapshot(snapshot: &DetectionSnapshot) -> Self {
        Self {
            timestamp: snapshot.timestamp,
            level: snapshot.fatigue_level.clone(),
            score: snapshot.fatigue_score,
            is_fatigued: snapshot.is_fatigued,
            is_yawning: snapshot.is_yawning,
            is_head_down: snapshot.is_head_down,
            triggered_at: Utc::now(),
        }
    }

    pub fn reasons(&self) -> Vec<&'static str> {
        let mut reasons = Vec::new();
        if self.is_fatigued {
            reasons.push("eyes closed");
        }
        if self.is_yawning {
            reasons.push("yawning");
        }
        if self.is_head_down {
            reasons.push("head down");
        }
        reasons
    }

    fn webhook_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "text": format!(
                "[FATIGUE] {} (score {}) - {}",
                self.level,
                self.score,
                self.reasons().join(", ")
            ),
            "event": self,
        })
    }
}

/// Fire-and-forget alarm delivery on a dedicated task.
///
/// [`AlarmNotifier::notify`] never blocks the frame loop: when the queue is
/// full the event is dropped and reported as an error.
pub struct AlarmNotifier {
    sender: mpsc::Sender<AlarmEvent>,
    worker: JoinHandle<u64>,
}

impl AlarmNotifier {
    /// Must be called inside a tokio runtime.
    pub fn spawn(webhook_url: Option<String>, capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let worker = tokio::spawn(run_worker(receiver, webhook_url));
        Self { sender, worker }
    }

    pub fn notify(&self, event: AlarmEvent) -> Result<()> {
        match self.sender.try_send(event) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(event)) => {
                tracing::warn!(level = %event.level, "alarm queue full, event dropped");
                Err(MonitorError::Notify("alarm queue full".to_string()))
            }
            Err(TrySendError::Closed(_)) => {
                Err(MonitorError::Notify("alarm worker stopped".to_string()))
            }
        }
    }

    /// Closes the queue, lets the worker drain it and returns how many alarms
    /// it handled.
    pub async fn shutdown(self) -> u64 {
        drop(self.sender);
        match self.worker.await {
            Ok(handled) => handled,
            Err(e) => {
                tracing::error!(error = %e, "alarm worker panicked");
                0
            }
        }
    }
}

async fn run_worker(mut receiver: mpsc::Receiver<AlarmEvent>, webhook_url: Option<String>) -> u64 {
    let client = webhook_url.as_ref().map(|_| reqwest::Client::new());
    let mut handled = 0u64;

    while let Some(event) = receiver.recv().await {
        handled += 1;
        tracing::warn!(
            level = %event.level,
            score = event.score,
            reasons = %event.reasons().join(", "),
            timestamp = event.timestamp,
            "FATIGUE ALARM"
        );

        if let (Some(client), Some(url)) = (&client, &webhook_url) {
            if let Err(e) = send_webhook(client, url, &event).await {
                tracing::error!(error = %e, "alarm webhook gave up");
            }
        }
    }

    tracing::debug!(handled, "alarm worker stopped");
    handled
}

async fn send_webhook(client: &reqwest::Client, url: &str, event: &AlarmEvent) -> Result<()> {
    let payload = event.webhook_payload();

    for attempt in 0..WEBHOOK_ATTEMPTS {
        match client
            .post(url)
            .json(&payload)
            .timeout(WEBHOOK_TIMEOUT)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => {
                tracing::debug!("alarm webhook sent");
                return Ok(());
            }
            Ok(resp) => {
                tracing::warn!(status = %resp.status(), attempt = attempt + 1, "alarm webhook failed");
            }
            Err(e) => {
                tracing::warn!(error = %e, attempt = attempt + 1, "alarm webhook error");
            }
        }
        if attempt + 1 < WEBHOOK_ATTEMPTS {
            tokio::time::sleep(Duration::from_millis(WEBHOOK_BACKOFF_MS * (1 << attempt))).await;
        }
    }

    Err(MonitorError::Notify(format!(
        "webhook failed after {WEBHOOK_ATTEMPTS} attempts"
    )))
}
