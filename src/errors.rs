/*!
 * Error types for the subalign application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::fmt;

use thiserror::Error;

/// Errors that can occur when talking to a model back-end
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The model refused or could not handle the input
    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),
}

/// Errors that can occur while parsing a subtitle track
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubtitleError {
    /// A well-formed block carries a timing line that cannot be parsed
    #[error("Invalid timestamp in block {block}: {reason} (line: '{line}')")]
    InvalidTimestamp {
        /// 1-based block number within the track
        block: usize,
        /// The offending timing line
        line: String,
        /// What was wrong with it
        reason: String,
    },
}

/// Errors raised while scoring a caption pair
#[derive(Error, Debug)]
pub enum ScoringError {
    /// The embedding or entity model failed
    #[error("Model error: {0}")]
    Provider(#[from] ProviderError),

    /// The two embedding vectors cannot be compared
    #[error("Embedding dimension mismatch: {left} vs {right}")]
    DimensionMismatch {
        left: usize,
        right: usize,
    },

    /// A batch request returned the wrong number of vectors
    #[error("Embedding batch returned {received} vectors for {expected} inputs")]
    BatchSizeMismatch {
        expected: usize,
        received: usize,
    },
}

/// Which of the two tracks an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackRole {
    Source,
    Target,
}

impl fmt::Display for TrackRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackRole::Source => write!(f, "source"),
            TrackRole::Target => write!(f, "target"),
        }
    }
}

/// Errors that abort an alignment call
#[derive(Error, Debug)]
pub enum AlignError {
    /// One of the tracks failed to parse
    #[error("Failed to parse {track} track: {source}")]
    Parse {
        track: TrackRole,
        #[source]
        source: SubtitleError,
    },

    /// The scorer failed on some pair
    #[error("Scoring failed: {0}")]
    Scoring(#[from] ScoringError),
}
