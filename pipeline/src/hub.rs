//! Real-time status fabric transport (spec §4.4): a broadcast hub every component publishes
//! status/log/stats events onto, grounded on the `broadcast::Sender<A2AMessage>` pattern in
//! `ravituringworks-generic-ai-agent`'s `a2a.rs`. `tokio::sync::broadcast` already implements
//! spec §5's backpressure rule verbatim: a lagging subscriber's oldest backlogged messages are
//! dropped rather than blocking the publisher, and the subscriber observes a `Lagged` error it
//! can simply resume past.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::status::ProcessingStatus;

/// Default broadcast channel capacity. Tuned generously since the cost of a dropped message
/// under lag is a missed optimistic-UI update, not missed data (pollers in §4.4 always see the
/// authoritative store).
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Log severity, mirrored on the wire (spec §4.4 `{type: "log", level, ...}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Informational.
    Info,
    /// Recoverable problem (degradable error, stall warning).
    Warn,
    /// Unrecoverable problem for the affected document/request.
    Error,
}

/// One event published on the hub. Every variant corresponds 1:1 to a wire message shape from
/// spec §4.4 / §6 (`WS /ws`).
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HubMessage {
    /// Sent once, immediately after a WS client connects.
    Connection {
        /// Server-assigned connection acknowledgement text.
        message: String,
    },
    /// A document's `ProcessingStatus` changed.
    StatusUpdate {
        /// Document identifier.
        doc_id: String,
        /// Current lifecycle state.
        status: crate::status::DocStatus,
        /// Free-form stage label.
        stage: String,
        /// Monotonically non-decreasing progress within a run, in `[0, 1]`.
        progress: f32,
        /// Originating filename.
        filename: String,
        /// ISO-8601 UTC timestamp of this transition.
        timestamp: String,
    },
    /// A log line, optionally scoped to a document.
    Log {
        /// Severity.
        level: LogLevel,
        /// Human-readable message.
        message: String,
        /// Document this log concerns, if any.
        #[serde(skip_serializing_if = "Option::is_none")]
        doc_id: Option<String>,
        /// ISO-8601 UTC timestamp.
        timestamp: String,
    },
    /// An upload intent was registered, before bytes necessarily finish arriving (spec §4.10),
    /// so other connected clients can optimistically render a placeholder (spec §4.4
    /// "Cross-client reconciliation").
    UploadRegistered {
        /// The (possibly provisional) document identifier.
        doc_id: String,
        /// Originating filename.
        filename: String,
    },
    /// Periodic aggregate snapshot (`docmind_vectorstore::Stats` plus active-document count).
    Stats {
        /// Visual collection row count.
        visual_count: usize,
        /// Text collection row count.
        text_count: usize,
        /// Distinct documents indexed.
        distinct_docs: usize,
        /// Documents currently processing.
        active_processing: usize,
    },
}

/// Broadcast hub every pipeline component publishes events onto; the HTTP/WS server binary
/// subscribes one receiver per connected client.
#[derive(Debug, Clone)]
pub struct Hub {
    sender: broadcast::Sender<HubMessage>,
}

impl Hub {
    /// Creates a hub with [`DEFAULT_CHANNEL_CAPACITY`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a hub with a custom channel capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event. Never blocks; if there are no subscribers the message is simply
    /// dropped (spec §5: the hub never blocks the producer).
    pub fn publish(&self, message: HubMessage) {
        let _ = self.sender.send(message);
    }

    /// Subscribes a new receiver, e.g. one per connected WebSocket client.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<HubMessage> {
        self.sender.subscribe()
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience: builds a [`HubMessage::StatusUpdate`] from a [`ProcessingStatus`] snapshot.
#[must_use]
pub fn status_update_message(status: &ProcessingStatus) -> HubMessage {
    HubMessage::StatusUpdate {
        doc_id: status.doc_id.clone(),
        status: status.status,
        stage: status.stage.clone(),
        progress: status.progress,
        filename: status.filename.clone(),
        timestamp: status.updated_at.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::DocStatus;

    #[tokio::test]
    async fn subscribers_receive_published_messages() {
        let hub = Hub::new();
        let mut rx = hub.subscribe();
        hub.publish(HubMessage::UploadRegistered {
            doc_id: "abc".to_string(),
            filename: "report.pdf".to_string(),
        });
        let message = rx.recv().await.unwrap();
        assert!(matches!(message, HubMessage::UploadRegistered { doc_id, .. } if doc_id == "abc"));
    }

    #[tokio::test]
    async fn lagging_subscriber_skips_rather_than_blocks_publisher() {
        let hub = Hub::with_capacity(2);
        let mut rx = hub.subscribe();
        for i in 0..5 {
            hub.publish(HubMessage::Log {
                level: LogLevel::Info,
                message: format!("event {i}"),
                doc_id: None,
                timestamp: "2026-01-01T00:00:00Z".to_string(),
            });
        }
        // Publisher never blocked; the lagged subscriber just observes a Lagged error once
        // it starts reading, then resumes from the oldest still-buffered message.
        let result = rx.recv().await;
        assert!(matches!(result, Err(tokio::sync::broadcast::error::RecvError::Lagged(_))));
    }

    #[test]
    fn status_update_is_serializable() {
        let status = ProcessingStatus::queued("doc1", "report.pdf");
        let message = status_update_message(&status);
        let json = serde_json::to_string(&message).unwrap();
        assert!(json.contains("\"type\":\"status_update\""));
        assert!(matches!(
            serde_json::from_str::<serde_json::Value>(&json).unwrap()["status"],
            serde_json::Value::String(ref s) if s == "queued"
        ));
    }
}
