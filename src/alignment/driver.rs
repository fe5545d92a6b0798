/*!
 * Alignment driver.
 *
 * For each source caption, every target caption starting within the time
 * tolerance is scored, and the best one is kept if it clears the acceptance
 * threshold. Per-source searches run concurrently with order preserved.
 */

use chrono::{NaiveTime, TimeDelta};
use futures::stream::{self, StreamExt, TryStreamExt};
use log::debug;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::app_config::{AlignmentConfig, MatchStrategy};
use crate::errors::{AlignError, ScoringError, TrackRole};
use crate::subtitle_processor::{parse_srt, Caption};

use super::exclusive::{assign_exclusive, Candidate};
use super::scorer::PairScorer;
use super::AlignedPair;

// Tolerances beyond a day already cover every time of day
const MAX_TOLERANCE_MS: u64 = 86_400_000;

/// Aligns a source track against a target track
pub struct Aligner<S: PairScorer> {
    scorer: S,
    time_tolerance: TimeDelta,
    acceptance_threshold: f64,
    strategy: MatchStrategy,
    concurrency: usize,
}

impl<S: PairScorer> Aligner<S> {
    /// Create an aligner with the default window, threshold and strategy
    pub fn new(scorer: S) -> Self {
        Self::from_config(scorer, &AlignmentConfig::default())
    }

    /// Create an aligner from alignment settings
    pub fn from_config(scorer: S, config: &AlignmentConfig) -> Self {
        Self {
            scorer,
            time_tolerance: tolerance_from_ms(config.time_tolerance_ms),
            acceptance_threshold: config.acceptance_threshold,
            strategy: config.strategy,
            concurrency: config.concurrent_requests.max(1),
        }
    }

    /// Set the maximum start-time distance, in milliseconds
    pub fn with_time_tolerance_ms(mut self, tolerance_ms: u64) -> Self {
        self.time_tolerance = tolerance_from_ms(tolerance_ms);
        self
    }

    /// Set the score a match must strictly exceed
    pub fn with_acceptance_threshold(mut self, threshold: f64) -> Self {
        self.acceptance_threshold = threshold;
        self
    }

    /// Set the assignment strategy
    pub fn with_strategy(mut self, strategy: MatchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set how many source captions are searched at once
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn scorer(&self) -> &S {
        &self.scorer
    }

    pub fn strategy(&self) -> MatchStrategy {
        self.strategy
    }

    /// Parse two SRT tracks and align them
    pub async fn align(&self, source_track: &str, target_track: &str) -> Result<Vec<AlignedPair>, AlignError> {
        let sources = parse_srt(source_track).map_err(|source| AlignError::Parse {
            track: TrackRole::Source,
            source,
        })?;
        let targets = parse_srt(target_track).map_err(|source| AlignError::Parse {
            track: TrackRole::Target,
            source,
        })?;

        self.align_captions(&sources, &targets).await
    }

    /// Align two parsed tracks
    pub async fn align_captions(&self, sources: &[Caption], targets: &[Caption]) -> Result<Vec<AlignedPair>, AlignError> {
        self.align_captions_with_progress(sources, targets, |_, _| {}).await
    }

    /// Align two parsed tracks, reporting `(done, total)` after each source caption
    pub async fn align_captions_with_progress(
        &self,
        sources: &[Caption],
        targets: &[Caption],
        progress: impl Fn(usize, usize),
    ) -> Result<Vec<AlignedPair>, AlignError> {
        let total = sources.len();
        if sources.is_empty() || targets.is_empty() {
            progress(total, total);
            return Ok(Vec::new());
        }

        self.scorer.prepare(sources, targets).await?;

        let index = StartIndex::new(targets);
        let processed = AtomicUsize::new(0);
        let (index, processed, progress) = (&index, &processed, &progress);

        let searches: Vec<_> = sources
            .iter()
            .map(move |source| async move {
                let window = index.window(source.start, self.time_tolerance);
                let scores = self.score_window(source, targets, window).await?;

                let done = processed.fetch_add(1, Ordering::SeqCst) + 1;
                progress(done, total);

                Ok::<_, ScoringError>(scores)
            })
            .collect();

        let scored: Vec<Vec<(usize, f64)>> = stream::iter(searches)
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        let pairs: Vec<AlignedPair> = match self.strategy {
            MatchStrategy::Greedy => scored
                .iter()
                .enumerate()
                .filter_map(|(si, scores)| {
                    pick_best(scores, self.acceptance_threshold)
                        .map(|(ti, score)| AlignedPair::new(&sources[si], &targets[ti], score))
                })
                .collect(),
            MatchStrategy::Exclusive => {
                let threshold = self.acceptance_threshold;
                let candidates = scored
                    .into_iter()
                    .enumerate()
                    .flat_map(|(source, scores)| {
                        scores
                            .into_iter()
                            .filter(move |&(_, score)| score > threshold)
                            .map(move |(target, score)| Candidate { source, target, score })
                    })
                    .collect();

                assign_exclusive(candidates)
                    .into_iter()
                    .map(|c| AlignedPair::new(&sources[c.source], &targets[c.target], c.score))
                    .collect()
            }
        };

        debug!(
            "Matched {} of {} source captions against {} targets ({} strategy)",
            pairs.len(),
            sources.len(),
            targets.len(),
            self.strategy
        );

        Ok(pairs)
    }

    // Scores in target track order
    async fn score_window(
        &self,
        source: &Caption,
        targets: &[Caption],
        window: Vec<usize>,
    ) -> Result<Vec<(usize, f64)>, ScoringError> {
        let mut scores = Vec::with_capacity(window.len());
        for target_index in window {
            let score = self.scorer.score(&source.text, &targets[target_index].text).await?;
            scores.push((target_index, score));
        }
        Ok(scores)
    }
}

/// Best-scoring target of a window, if it clears the threshold
///
/// Only a strictly higher score replaces the current best, so the earliest
/// candidate wins ties. A score of 0 never matches.
pub fn pick_best(scores: &[(usize, f64)], threshold: f64) -> Option<(usize, f64)> {
    let mut best = None;
    let mut highest = 0.0;

    for &(target_index, score) in scores {
        if score > highest {
            highest = score;
            best = Some(target_index);
        }
    }

    best.filter(|_| highest > threshold).map(|target_index| (target_index, highest))
}

fn tolerance_from_ms(tolerance_ms: u64) -> TimeDelta {
    TimeDelta::milliseconds(tolerance_ms.min(MAX_TOLERANCE_MS) as i64)
}

/// Target positions ordered by start time
struct StartIndex<'a> {
    captions: &'a [Caption],
    by_start: Vec<usize>,
}

impl<'a> StartIndex<'a> {
    fn new(captions: &'a [Caption]) -> Self {
        let mut by_start: Vec<usize> = (0..captions.len()).collect();
        by_start.sort_by_key(|&i| captions[i].start);
        Self { captions, by_start }
    }

    // Positions starting within `tolerance` of `start`, inclusive, in track order
    fn window(&self, start: NaiveTime, tolerance: TimeDelta) -> Vec<usize> {
        let offset = |i: usize| self.captions[i].start.signed_duration_since(start);
        let lower = self.by_start.partition_point(|&i| offset(i) < -tolerance);
        let upper = self.by_start.partition_point(|&i| offset(i) <= tolerance);

        let mut window = self.by_start[lower..upper].to_vec();
        window.sort_unstable();
        window
    }
}
