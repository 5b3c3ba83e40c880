//! # aither
//!
//! **Write AI applications that work with any provider** 🚀
//!
//! `aither-core` hosts the no-std trait APIs that power the rest of the workspace: language
//! models, late-interaction multi-vector embeddings, and audio transcription. Every provider
//! crate simply implements these traits.
//!
//!
//! ```text
//! ┌─────────────────┐    ┌───────────────────────┐    ┌─────────────────┐
//! │   Your App      │───▶│    aither-core        │◀───│   Providers     │
//! │                 │    │                       │    │                 │
//! │ - Document RAG  │    │ - LanguageModel        │    │ - openai        │
//! │ - Search        │    │ - MultiVectorEmbedder  │    │ - local model   │
//! │ - Transcripts   │    │ - AudioTranscriber     │    │ - whisper       │
//! └─────────────────┘    └───────────────────────┘    └─────────────────┘
//! ```

//!
//! ## Supported AI Capabilities
//!
//! | Capability | Trait | Description |
//! |------------|-------|-------------|
//! | **Language Models** | [`LanguageModel`] | Streaming events (text, reasoning, tool calls) |
//! | **Multi-vector embeddings** | [`MultiVectorEmbedder`] | Late-interaction image/text embedding sequences |
//! | **Speech-to-Text** | [`AudioTranscriber`] | Transcribe audio to text |
//!
//! ## Examples
//!
//! ### Streaming Responses with Events
//!
//! ```rust,ignore
//! use aither_core::llm::{LanguageModel, Event, Message, LLMRequest, model::Parameters};
//! use futures_lite::StreamExt;
//!
//! async fn event_demo(model: impl LanguageModel) -> aither_core::Result {
//!     let request = LLMRequest::new([
//!         Message::user("Explain how rainbows form like I'm five."),
//!     ])
//!     .with_parameters(Parameters::default().include_reasoning(true));
//!
//!     let mut stream = model.respond(request);
//!     let mut answer = String::new();
//!
//!     while let Some(event) = stream.next().await {
//!         match event? {
//!             Event::Text(text) => answer.push_str(&text),
//!             Event::Reasoning(thought) => println!("thinking: {}", thought),
//!             Event::ToolCall(call) => println!("tool requested: {}", call.name),
//!             _ => {}
//!         }
//!     }
//!     Ok(answer)
//! }
//! ```
//!
//! ### Structured Output with Tools
//!
//! ```rust
//! use aither_core::{LanguageModel, llm::{Message, Request, Tool}};
//! use serde::{Deserialize, Serialize};
//! use schemars::JsonSchema;
//!
//! #[derive(JsonSchema, Deserialize, Serialize)]
//! struct WeatherQuery {
//!     location: String,
//!     units: Option<String>,
//! }
//!
//! struct WeatherTool;
//!
//! impl Tool for WeatherTool {
//!     const NAME: &str = "get_weather";
//!     const DESCRIPTION: &str = "Get current weather for a location";
//!     type Arguments = WeatherQuery;
//!     
//!     async fn call(&mut self, args: Self::Arguments) -> aither::Result {
//!         Ok(format!("Weather in {}: 22°C, sunny", args.location))
//!     }
//! }
//!
//! async fn weather_bot(model: impl LanguageModel) -> aither_core::Result {
//!     let request = Request::new(vec![
//!         Message::user("What's the weather like in Tokyo?")
//!     ]).with_tool(WeatherTool);
//!     
//!     // Model can now call the weather tool automatically
//!     let response: String = model.generate(request).await?;
//!     Ok(response)
//! }
//! ```
//!
//! See [`llm::tool`] for more details on using tools with language models.
//!
//! ### Late-interaction embeddings
//!
//! ```rust
//! use aither_core::MultiVectorEmbedder;
//!
//! async fn embed_chunk(model: impl MultiVectorEmbedder, text: &str) -> aither_core::Result<()> {
//!     // Each chunk becomes a (L, D) sequence; vectors[0] is the CLS/ANN key.
//!     let sequences = model.embed_texts(vec![text.to_string()]).await?;
//!     let cls = sequences[0].cls();
//!     debug_assert_eq!(cls.len(), model.dim());
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`audio`] — speech transcription trait.
//! - [`embedding`] — multi-vector late-interaction embedding trait.
//! - [`llm`] — request builders, messages, provider traits, reasoning streams.
//!
//!

#![doc(
    html_logo_url = "https://raw.githubusercontent.com/lexoliu/aither/main/logo.svg",
    html_favicon_url = "https://raw.githubusercontent.com/lexoliu/aither/main/logo.svg"
)]
#![no_std]
extern crate alloc;

/// Speech transcription.
///
/// Contains the [`AudioTranscriber`] trait used by the document parser's audio adapter.
pub mod audio;
/// Multi-vector (late-interaction) embeddings.
pub mod embedding;
pub mod llm;

use alloc::string::String;

#[doc(inline)]
pub use audio::AudioTranscriber;
#[doc(inline)]
pub use embedding::{MultiVector, MultiVectorEmbedder, Vector};
#[doc(inline)]
pub use llm::LanguageModel;

/// Result type used throughout the crate.
///
/// Type alias for [`anyhow::Result<T>`](anyhow::Result) with [`String`] as default success type.
pub type Result<T = String> = anyhow::Result<T>;

pub use anyhow::Error;
