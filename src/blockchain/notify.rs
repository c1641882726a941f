use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobOutcome {
    pub blockchain_id: String,
    pub block: i64,
    pub success: bool,
    pub error: Option<String>,
}

/// Outbound notification fired after every block attempt. Delivery problems are the
/// notifier's to log; they never fail the cycle.
#[async_trait]
pub trait JobNotifier: Send + Sync {
    async fn notify(&self, outcome: JobOutcome);
}

pub struct ChannelNotifier {
    sender: mpsc::Sender<JobOutcome>,
}

impl ChannelNotifier {
    pub fn new(sender: mpsc::Sender<JobOutcome>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl JobNotifier for ChannelNotifier {
    async fn notify(&self, outcome: JobOutcome) {
        let block = outcome.block;
        if let Err(e) = self.sender.send(outcome).await {
            error!(service = "notifier", block, "Failed to send job outcome: {}", e);
        }
    }
}
