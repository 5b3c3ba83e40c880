//! Document processor, real-time status fabric, and upload registry for the docmind RAG
//! service (spec §4.4, §4.6, §4.10).
//!
//! Three pieces, wired together by the server binary:
//!
//! - [`hub::Hub`] / [`status::StatusManager`]: the broadcast status fabric every component
//!   publishes onto, and the authoritative in-memory store the polling endpoints read.
//! - [`registry::UploadRegistry`]: reserves a `doc_id` before bytes arrive and detects
//!   duplicate content once they do.
//! - [`processor::DocumentProcessor`]: parses, embeds, and stores a single document, driving
//!   the status manager through its lifecycle as it goes.

pub mod error;
pub mod hub;
pub mod processor;
pub mod registry;
pub mod status;

pub use error::{PipelineError, Result};
pub use hub::{Hub, HubMessage, LogLevel};
pub use processor::{DocumentProcessor, NoRenderer, PageRenderer, ProcessOutcome};
pub use registry::{DuplicateAction, ExistingDoc, RegisterResult, UploadRegistry};
pub use status::{DocStatus, ProcessingStatus, StatusManager};
