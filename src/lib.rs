//! YouTube Transcript Fetcher - a CLI tool that retrieves video transcripts
//!
//! This library fetches the transcript for a single video identifier from
//! YouTube's caption delivery and shapes the outcome into a uniform JSON
//! record: `{"success": ..., "transcript": ..., "error": ...}`. Callers parse
//! that one stdout line; everything else (track discovery, language
//! selection, caption parsing) stays internal.

pub mod cli;
pub mod fetch;
pub mod output;
pub mod youtube;

pub use cli::Cli;
pub use fetch::{fetch_transcript, TranscriptRecord, TranscriptSource};
pub use youtube::{FetchedTranscript, TranscriptClient, TranscriptSnippet};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Errors raised below the fetch boundary while talking to the caption
/// delivery. The fetcher flattens every variant into the record's single
/// `error` message; none of these types appear in the output contract.
#[derive(Debug, thiserror::Error)]
pub enum TranscriptError {
    #[error("Video is unavailable: {0}")]
    VideoUnavailable(String),

    #[error("Transcripts are disabled for this video")]
    TranscriptsDisabled,

    #[error("No transcript found for languages: {0}")]
    NoTranscriptFound(String),

    #[error("Could not find a player response in the watch page")]
    PlayerResponseMissing,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}
