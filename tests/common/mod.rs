/*!
 * Common test utilities for the subalign test suite
 */

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use anyhow::Result;
use async_trait::async_trait;
use tempfile::TempDir;

use subalign::alignment::PairScorer;
use subalign::errors::ScoringError;
use subalign::providers::mock::{StubEmbedder, StubEntityRecognizer};
use subalign::providers::{Embedder, EntityRecognizer};

/// English track used across integration tests
pub const ENGLISH_TRACK: &str = "1
00:00:01,000 --> 00:00:03,000
Good morning.

2
00:00:05,000 --> 00:00:07,000
Where is Paris?

3
00:00:20,000 --> 00:00:22,000
Nothing matches this.
";

/// Chinese track paired with `ENGLISH_TRACK`
pub const CHINESE_TRACK: &str = "1
00:00:01,500 --> 00:00:03,000
早上好。

2
00:00:05,200 --> 00:00:07,000
巴黎在哪里？

3
00:00:40,000 --> 00:00:42,000
无关的句子。
";

/// Routes library logs to the test output, once per process
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).filter_level(log::LevelFilter::Debug).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Builds one SRT block
pub fn srt_block(index: usize, start: &str, end: &str, text: &str) -> String {
    format!("{}\n{} --> {}\n{}\n\n", index, start, end, text)
}

/// Models scoring the sample tracks: 0.9 for the greeting, 0.6 plus a shared
/// "Paris" entity for the question
pub fn sample_models() -> (Arc<dyn Embedder>, Arc<dyn EntityRecognizer>, Arc<dyn EntityRecognizer>) {
    let embedder = StubEmbedder::new(2)
        .with_pair("Good morning.", "早上好。", 0.9)
        .with_pair("Where is Paris?", "巴黎在哪里？", 0.6);
    let source = StubEntityRecognizer::new().with_entities("Where is Paris?", &["Paris"]);
    let target = StubEntityRecognizer::new().with_entities("巴黎在哪里？", &["Paris"]);

    (Arc::new(embedder), Arc::new(source), Arc::new(target))
}

/// Scorer returning fixed scores per text pair, 0 for anything else
#[derive(Debug, Default)]
pub struct TableScorer {
    scores: HashMap<(String, String), f64>,
}

impl TableScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, source: &str, target: &str, score: f64) -> Self {
        self.scores.insert((source.to_string(), target.to_string()), score);
        self
    }
}

#[async_trait]
impl PairScorer for TableScorer {
    async fn score(&self, source_text: &str, target_text: &str) -> Result<f64, ScoringError> {
        Ok(self
            .scores
            .get(&(source_text.to_string(), target_text.to_string()))
            .copied()
            .unwrap_or(0.0))
    }
}
