/*!
 * # subalign - bilingual subtitle aligner
 *
 * A Rust library that pairs the captions of two subtitle tracks written in
 * different languages.
 *
 * ## Features
 *
 * - SRT parsing into timed captions
 * - Candidate search in a start-time window around each source caption
 * - Pair scoring from multilingual sentence embeddings plus a shared-entity bonus
 * - Greedy per-caption matching, or one-to-one matching on request
 * - JSON, bilingual SRT and TSV output
 * - ISO 639-1 and ISO 639-2 language code support
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `subtitle_processor`: SRT parsing and timestamp handling
 * - `alignment`: Scoring and matching of caption pairs:
 *   - `alignment::scorer`: Embedding similarity and entity bonus
 *   - `alignment::driver`: Windowed best-match search
 *   - `alignment::exclusive`: One-to-one assignment
 *   - `alignment::cache`: Per-text caching of model results
 * - `providers`: Embedding and entity-recognition back-ends:
 *   - `providers::ollama`: Ollama API client
 *   - `providers::heuristic`: Offline entity recognizer
 * - `output`: Result rendering
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod alignment;
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod output;
pub mod providers;
pub mod subtitle_processor;

// Re-export main types for easier usage
pub use alignment::{AlignedPair, Aligner, AlignmentReport, MatchScorer, PairScorer};
pub use app_config::Config;
pub use subtitle_processor::{parse_srt, Caption};
pub use language_utils::{language_codes_match, normalize_to_part2t, get_language_name};
pub use errors::{AlignError, ProviderError, ScoringError, SubtitleError};
