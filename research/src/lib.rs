//! Research orchestrator for the docmind RAG service (spec §4.8, §4.9).
//!
//! Ties [`docmind_retrieval::search`] together with a numbered, budgeted context
//! ([`context::build_context`]) and a foundation [`aither_core::llm::LanguageModel`] to answer
//! natural-language questions with citations bound 1:1 to the document corpus.

pub mod citation;
pub mod context;
pub mod error;
pub mod orchestrator;
pub mod types;

pub use citation::parse_citations;
pub use context::{BuiltContext, ContextOptions, PreprocessStats, PreprocessStrategy, build_context, preprocess_context};
pub use error::{ResearchError, Result};
pub use orchestrator::ResearchOrchestrator;
pub use types::{AskRequest, Reference, ResearchMetadata, ResearchResult};
