//! Downstream routing of delivered events.

use async_trait::async_trait;
use serde::Serialize;
use statamic_webhooks::DeliveredEvent;
use tokio::sync::mpsc;

/// Events produced by one delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggeredRun {
    /// Installation that received the delivery.
    pub installation_id: String,
    /// Events to process.
    pub events: Vec<DeliveredEvent>,
}

/// Receives events for workflow processing.
///
/// Implementations must not fail the delivery: the registry has already
/// handed the events over once the request arrived.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Hands a run to the workflow runtime.
    async fn dispatch(&self, run: TriggeredRun);
}

/// Sink that forwards runs into a tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::Sender<TriggeredRun>,
}

impl ChannelSink {
    /// Creates a sink and the receiving half of its channel.
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<TriggeredRun>) {
        let (sender, receiver) = mpsc::channel(buffer);
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn dispatch(&self, run: TriggeredRun) {
        let installation_id = run.installation_id.clone();
        if self.sender.send(run).await.is_err() {
            tracing::warn!(installation = %installation_id, "Workflow runtime stopped, dropping events");
        }
    }
}
