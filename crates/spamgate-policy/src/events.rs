//! Analyzer failure notifications

use serde::Serialize;
use tokio::sync::broadcast;

/// An analyzer call that produced no verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyzerFailure {
    /// Short failure label, e.g. `timeout` or `status`
    pub kind: String,
    pub message: String,
}

/// Broadcast channel for analyzer failures
pub struct FailureBus {
    sender: broadcast::Sender<AnalyzerFailure>,
}

impl FailureBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to failures
    pub fn subscribe(&self) -> broadcast::Receiver<AnalyzerFailure> {
        self.sender.subscribe()
    }

    /// Publish a failure to all subscribers
    pub fn publish(&self, failure: AnalyzerFailure) {
        // No subscribers is fine
        let _ = self.sender.send(failure);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for FailureBus {
    fn default() -> Self {
        Self::new(256)
    }
}
