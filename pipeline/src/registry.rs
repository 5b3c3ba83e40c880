//! Upload intent registry (spec §4.10): reserves a `doc_id` before bytes arrive, detects
//! duplicates once content is known, and tracks the final/provisional split.
//!
//! Grounded on `attachments/src/lib.rs`'s `FileCache` (`CacheEntry{content_hash, ...}`,
//! hash-comparison `is_valid`) — generalized from a per-provider upload cache keyed on
//! `(path, provider)` to a single global ledger keyed on content hash.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use sha2::{Digest, Sha256};

/// What the caller chooses to do with a detected duplicate (spec §5 duplicate policy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateAction {
    /// Leave the existing indexed document untouched.
    Skip,
    /// Re-index, replacing records under the same `doc_id` in place.
    Force,
}

/// The previously indexed document a duplicate registration collides with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingDoc {
    /// The shared `doc_id`.
    pub doc_id: String,
    /// The filename it was originally indexed under.
    pub filename: String,
}

/// Result of `register_intent` / `finalize`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterResult {
    /// Provisional (if content hash unknown) or final `doc_id`.
    pub doc_id: String,
    /// Whether a document with this final content hash is already indexed.
    pub is_duplicate: bool,
    /// The colliding document, when `is_duplicate` is true.
    pub existing_doc: Option<ExistingDoc>,
}

struct ProvisionalIntent {
    filename: String,
}

/// Computes the lowercase hex SHA-256 digest of file content — the document's `doc_id` (spec
/// §3 "`doc_id` = hex digest of file content").
#[must_use]
pub fn content_doc_id(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Computes a provisional `doc_id` from filename, expected size, and wall-clock time, per spec
/// §4.10. Not content-addressed and therefore never deduplicates by itself; it exists purely so
/// a client has a stable key to track an in-flight upload before bytes (and thus the real
/// content hash) are available.
fn provisional_doc_id(filename: &str, expected_size: u64) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(filename.as_bytes());
    hasher.update(expected_size.to_le_bytes());
    hasher.update(nanos.to_le_bytes());
    format!("{:x}", hasher.finalize())
}

/// Tracks indexed document content hashes and in-flight provisional intents.
///
/// This is the only place in the system that decides whether an upload is a duplicate; the
/// vector store itself has no notion of content identity beyond the `doc_id` it's handed.
#[derive(Debug, Default)]
pub struct UploadRegistry {
    /// `doc_id` (content hash) -> filename it was first indexed under.
    indexed: RwLock<HashMap<String, String>>,
    /// provisional `doc_id` -> the intent it was registered with.
    provisional: RwLock<HashMap<String, ProvisionalIntent>>,
}

impl UploadRegistry {
    /// Builds an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn duplicate_of(&self, doc_id: &str) -> Option<ExistingDoc> {
        self.indexed.read().get(doc_id).map(|filename| ExistingDoc {
            doc_id: doc_id.to_string(),
            filename: filename.clone(),
        })
    }

    /// Registers upload intent before bytes arrive. If `known_hash` is supplied (the client
    /// already computed the content hash), duplicate detection runs immediately against the
    /// final `doc_id`; otherwise a provisional `doc_id` is minted and duplicate detection is
    /// deferred to [`Self::finalize`].
    pub fn register_intent(
        &self,
        filename: &str,
        expected_size: u64,
        known_hash: Option<&str>,
    ) -> RegisterResult {
        if let Some(hash) = known_hash {
            let doc_id = hash.to_ascii_lowercase();
            let existing_doc = self.duplicate_of(&doc_id);
            return RegisterResult {
                is_duplicate: existing_doc.is_some(),
                doc_id,
                existing_doc,
            };
        }

        let doc_id = provisional_doc_id(filename, expected_size);
        self.provisional.write().insert(
            doc_id.clone(),
            ProvisionalIntent {
                filename: filename.to_string(),
            },
        );
        RegisterResult {
            doc_id,
            is_duplicate: false,
            existing_doc: None,
        }
    }

    /// Resolves a provisional registration once bytes are available, computing the final
    /// content-addressed `doc_id` and running duplicate detection. If `provisional_doc_id` was
    /// never registered (e.g. the client skipped intent registration and uploaded directly),
    /// this still works: it simply has no provisional filename to carry over.
    #[must_use]
    pub fn finalize(&self, provisional_doc_id: Option<&str>, bytes: &[u8]) -> RegisterResult {
        if let Some(id) = provisional_doc_id {
            self.provisional.write().remove(id);
        }
        let doc_id = content_doc_id(bytes);
        let existing_doc = self.duplicate_of(&doc_id);
        RegisterResult {
            is_duplicate: existing_doc.is_some(),
            doc_id,
            existing_doc,
        }
    }

    /// Records that `doc_id` has been successfully indexed under `filename`, making future
    /// registrations of the same content detectable as duplicates. Called by the processor on
    /// `completed`, never before — an in-flight document is not yet a valid duplicate target.
    pub fn mark_indexed(&self, doc_id: &str, filename: &str) {
        self.indexed
            .write()
            .insert(doc_id.to_string(), filename.to_string());
    }

    /// Forgets a document, e.g. after `DELETE /documents/{doc_id}` — subsequent uploads of the
    /// same content are no longer reported as duplicates.
    pub fn forget(&self, doc_id: &str) {
        self.indexed.write().remove(doc_id);
    }

    /// True if `doc_id` is known to be already indexed.
    #[must_use]
    pub fn is_indexed(&self, doc_id: &str) -> bool {
        self.indexed.read().contains_key(doc_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_hash_yields_non_duplicate_provisional_id() {
        let registry = UploadRegistry::new();
        let result = registry.register_intent("report.pdf", 1024, None);
        assert!(!result.is_duplicate);
        assert!(result.existing_doc.is_none());
        assert_eq!(result.doc_id.len(), 64);
    }

    #[test]
    fn known_hash_detects_duplicate_of_indexed_doc() {
        let registry = UploadRegistry::new();
        let bytes = b"pdf content";
        let doc_id = content_doc_id(bytes);
        registry.mark_indexed(&doc_id, "report.pdf");

        let result = registry.register_intent("report-copy.pdf", bytes.len() as u64, Some(&doc_id));
        assert!(result.is_duplicate);
        assert_eq!(result.existing_doc.unwrap().filename, "report.pdf");
    }

    #[test]
    fn finalize_detects_duplicate_by_content() {
        let registry = UploadRegistry::new();
        let bytes = b"identical bytes";
        let first = registry.finalize(None, bytes);
        assert!(!first.is_duplicate);
        registry.mark_indexed(&first.doc_id, "a.pdf");

        let second = registry.finalize(None, bytes);
        assert!(second.is_duplicate);
        assert_eq!(second.doc_id, first.doc_id);
    }

    #[test]
    fn forget_clears_duplicate_status() {
        let registry = UploadRegistry::new();
        let bytes = b"some content";
        let doc_id = content_doc_id(bytes);
        registry.mark_indexed(&doc_id, "a.pdf");
        assert!(registry.is_indexed(&doc_id));
        registry.forget(&doc_id);
        assert!(!registry.is_indexed(&doc_id));
    }

    #[test]
    fn provisional_intent_is_removed_after_finalize() {
        let registry = UploadRegistry::new();
        let intent = registry.register_intent("report.pdf", 10, None);
        assert_eq!(registry.provisional.read().len(), 1);
        registry.finalize(Some(&intent.doc_id), b"bytes");
        assert!(registry.provisional.read().is_empty());
    }
}
