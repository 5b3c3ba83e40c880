use alloc::{string::String, vec::Vec};
use futures_core::Stream;

/// Audio data as bytes.
///
/// Type alias for [`Vec<u8>`] representing raw audio data.
pub type Data = Vec<u8>;

/// Transcribes audio to text.
///
/// Used by the document parser's audio adapter to turn MP3/WAV files into a transcript before
/// the smart chunker attaches `section_path`/time-interval context.
///
/// # Example
///
/// ```rust,ignore
/// use aither::AudioTranscriber;
/// use futures_core::Stream;
///
/// struct MyTranscriber;
///
/// impl AudioTranscriber for MyTranscriber {
///     fn transcribe(&self, audio: &[u8]) -> impl Stream<Item = String> + Send {
///         futures_lite::stream::iter(vec!["Hello world".to_string()])
///     }
/// }
/// ```
pub trait AudioTranscriber {
    /// Transcribes audio data to text.
    ///
    /// Returns a [`Stream`] of transcribed text chunks.
    fn transcribe(&self, audio: &[u8]) -> impl Stream<Item = String> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::{string::ToString, vec};
    use futures_lite::StreamExt;

    struct MockAudioTranscriber;

    impl AudioTranscriber for MockAudioTranscriber {
        fn transcribe(&self, audio: &[u8]) -> impl Stream<Item = String> + Send {
            let text_chunks = if audio.is_empty() {
                vec![]
            } else if audio.len() < 100 {
                vec!["Short".to_string()]
            } else if audio.len() < 1000 {
                vec!["Hello".to_string(), " world".to_string()]
            } else {
                vec![
                    "This".to_string(),
                    " is".to_string(),
                    " a".to_string(),
                    " longer".to_string(),
                    " transcription".to_string(),
                ]
            };

            futures_lite::stream::iter(text_chunks)
        }
    }

    #[tokio::test]
    async fn audio_transcriber_short_audio() {
        let transcriber = MockAudioTranscriber;
        let audio_data = vec![0x01; 50];
        let mut stream = transcriber.transcribe(&audio_data);

        let mut text_chunks = Vec::new();
        while let Some(chunk) = stream.next().await {
            text_chunks.push(chunk);
        }

        assert_eq!(text_chunks.len(), 1);
        assert_eq!(text_chunks[0], "Short");
    }

    #[tokio::test]
    async fn audio_transcriber_long_audio() {
        let transcriber = MockAudioTranscriber;
        let audio_data = vec![0x01; 2000];
        let mut stream = transcriber.transcribe(&audio_data);

        let mut text_chunks = Vec::new();
        while let Some(chunk) = stream.next().await {
            text_chunks.push(chunk);
        }

        assert_eq!(text_chunks.len(), 5);
        let full_text: String = text_chunks.join("");
        assert_eq!(full_text, "This is a longer transcription");
    }

    #[tokio::test]
    async fn audio_transcriber_empty_audio() {
        let transcriber = MockAudioTranscriber;
        let audio_data = vec![];
        let mut stream = transcriber.transcribe(&audio_data);

        let mut text_chunks = Vec::new();
        while let Some(chunk) = stream.next().await {
            text_chunks.push(chunk);
        }

        assert!(text_chunks.is_empty());
    }
}
