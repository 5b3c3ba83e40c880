#![no_std]
//! # docmind
//!
//! Thin façade crate re-exporting [`aither_core`]'s trait layer (`LanguageModel`,
//! `MultiVectorEmbedder`, `AudioTranscriber`) for binaries that only need the trait contracts,
//! without pulling in the workspace's concrete document-pipeline crates.
//!
//! The actual RAG service lives in `docmind-server` (HTTP + WebSocket front end) and its
//! supporting crates (`docmind-docparse`, `docmind-vectorstore`, `docmind-retrieval`,
//! `docmind-pipeline`, `docmind-research`); this crate is the `#![no_std]` trait surface those
//! crates and any future provider integration build against.
//!
//! ## Example
//!
//! ```rust,no_run
//! use docmind::{LanguageModel, llm::{LLMRequest, Message, collect_text, model::Parameters}};
//! use aither_openai::OpenAI;
//!
//! async fn demo(api_key: &str) -> docmind::Result<String> {
//!     let model = OpenAI::new(api_key);
//!     let request = LLMRequest::new([
//!         Message::system("You are a creative assistant."),
//!         Message::user("Plan a day of food in Osaka."),
//!     ])
//!     .with_parameters(Parameters::default().include_reasoning(true));
//!
//!     let response = model.respond(request);
//!     let answer = collect_text(response).await?;
//!     Ok(answer)
//! }
//! ```
//!
//! ## Modules
//!
//! - [`aither_core::llm`] — language model requests, responses, and reasoning streams.
//! - [`aither_core::embedding`] — multi-vector (late-interaction) embeddings.
//! - [`aither_core::audio`] — speech transcription.

extern crate alloc;

pub use aither_core::*;

#[cfg(feature = "openai")]
pub use aither_openai as openai;

#[doc(hidden)]
/// For internal use only.
pub mod __hidden {
    pub type CowStr = alloc::borrow::Cow<'static, str>;
}
