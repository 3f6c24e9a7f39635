use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::youtube::{FetchedTranscript, TranscriptClient};
use crate::TranscriptError;

/// The record printed once per invocation.
///
/// Exactly one of `transcript`/`error` is populated, according to `success`;
/// the other serializes as JSON `null`. The constructors are the only way to
/// build one, so the invariant holds by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptRecord {
    /// Whether retrieval succeeded
    pub success: bool,

    /// Transcript text lines, present only on success
    pub transcript: Option<Vec<String>>,

    /// Failure description, present only on failure
    pub error: Option<String>,
}

impl TranscriptRecord {
    /// Successful retrieval: `transcript` populated, `error` null.
    pub fn success(lines: Vec<String>) -> Self {
        Self {
            success: true,
            transcript: Some(lines),
            error: None,
        }
    }

    /// Failed retrieval: `error` populated, `transcript` null.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            transcript: None,
            error: Some(message.into()),
        }
    }
}

/// Source of transcripts, implemented by the caption delivery client.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn fetch(
        &self,
        video_id: &str,
        languages: &[String],
    ) -> Result<FetchedTranscript, TranscriptError>;
}

#[async_trait]
impl TranscriptSource for TranscriptClient {
    async fn fetch(
        &self,
        video_id: &str,
        languages: &[String],
    ) -> Result<FetchedTranscript, TranscriptError> {
        TranscriptClient::fetch(self, video_id, languages).await
    }
}

/// Fetch the transcript for `video_id` and shape the outcome into a record.
///
/// The client lives only for this call; no state is shared across
/// invocations. One attempt, no retries.
pub async fn fetch_transcript(video_id: &str, languages: &[String]) -> TranscriptRecord {
    let client = match TranscriptClient::new() {
        Ok(client) => client,
        Err(err) => return TranscriptRecord::failure(err.to_string()),
    };

    fetch_with_source(&client, video_id, languages).await
}

/// Same as [`fetch_transcript`] with the caption source injected.
///
/// This is the single error boundary: every failure the source raises is
/// flattened into the record's `error` message, never re-raised.
pub async fn fetch_with_source(
    source: &dyn TranscriptSource,
    video_id: &str,
    languages: &[String],
) -> TranscriptRecord {
    tracing::info!("Fetching transcript for video: {}", video_id);

    match source.fetch(video_id, languages).await {
        Ok(transcript) => {
            tracing::debug!(
                "Fetched {} snippets in language {}",
                transcript.snippets.len(),
                transcript.language_code
            );
            TranscriptRecord::success(transcript.text_lines())
        }
        Err(err) => {
            tracing::debug!("Transcript fetch failed: {}", err);
            TranscriptRecord::failure(err.to_string())
        }
    }
}
