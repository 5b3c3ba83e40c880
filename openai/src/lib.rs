//! `OpenAI` integration for the Aither framework built on top of the `zenwave`
//! HTTP client and the shared `aither-core` abstractions.
//!
//! By default this client uses the Responses API. The legacy `chat.completions`
//! endpoint is still available via [`OpenAI::builder`], but OpenAI has deprecated it.
//! If you must keep using `max_tokens`, enable the legacy compatibility flag on the builder.
//!
//! ```no_run
//! use aither_core::{LanguageModel, llm::{LLMRequest, Message}};
//! use aither_openai::OpenAI;
//! use futures_lite::StreamExt;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let model = OpenAI::new(std::env::var("OPENAI_API_KEY")?)
//!     .with_model("gpt-4o-mini");
//!
//! let request = LLMRequest::new(vec![
//!     Message::system("You are a concise assistant."),
//!     Message::user("Explain the Rust ownership model in one paragraph."),
//! ]);
//! let mut stream = model.respond(request);
//! let mut collected = String::new();
//! while let Some(event) = stream.next().await {
//!     if let Some(text) = event?.as_text() {
//!         collected.push_str(text);
//!     }
//! }
//! println!("{collected}");
//! # Ok(()) }
//! ```

mod attachments;
mod client;
mod error;
mod files;
mod mime;
mod provider;
mod request;
mod response;

pub use attachments::{resolve_messages, parse_openai_file_url};
pub use client::{ApiKind, Builder, OpenAI};
pub use error::OpenAIError;
pub use files::{FilePurpose, FilesConfig, OpenAIFile, upload_file};
pub use provider::OpenAIProvider;

mod constant;
pub use constant::*;

pub(crate) const DEFAULT_MODEL: &str = GPT5_2;
pub(crate) const DEFAULT_BASE_URL: &str = OPENAI_BASE_URL;
