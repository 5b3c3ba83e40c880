//! Two-stage multi-vector retrieval: ANN candidate search over [`docmind_vectorstore`]
//! collections, followed by MaxSim late-interaction reranking, with hybrid visual/text fusion.
//!
//! See [`engine::search`] for the entry point.

mod config;
mod engine;
mod error;
mod maxsim;

pub use config::{RetrievalConfig, SearchMode};
pub use engine::{search, RankedHit};
pub use error::{Result, RetrievalError};
pub use maxsim::{maxsim_score, unflatten};

pub use docmind_vectorstore::{Collection, Filters};
