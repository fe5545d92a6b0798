use anyhow::{anyhow, Context, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::alignment::{Aligner, AlignmentReport, MatchScorer};
use crate::app_config::{Config, EntityRecognizerKind};
use crate::errors::{AlignError, TrackRole};
use crate::file_utils::FileManager;
use crate::language_utils;
use crate::output;
use crate::providers::heuristic::HeuristicEntityRecognizer;
use crate::providers::ollama::{Ollama, OllamaEmbedder, OllamaEntityRecognizer};
use crate::providers::{Embedder, EntityRecognizer, NoEntityRecognizer};
use crate::subtitle_processor::{parse_srt, Caption};

// @module: Application controller for subtitle alignment

/// Outcome counts of a folder run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FolderSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Main application controller for subtitle alignment
pub struct Controller {
    // @field: App configuration
    config: Config,
    embedder: Arc<dyn Embedder>,
    source_recognizer: Arc<dyn EntityRecognizer>,
    target_recognizer: Arc<dyn EntityRecognizer>,
    // @field: Ollama client, absent when models are injected
    client: Option<Arc<Ollama>>,
}

impl Controller {
    // @method: Create a controller whose models are served by the configured Ollama endpoint
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Invalid configuration")?;

        let models = &config.models;
        let client = Arc::new(Ollama::new_with_config(
            models.endpoint.clone(),
            models.timeout_secs,
            models.retry_count,
            models.retry_backoff_ms,
        ));
        let embedder: Arc<dyn Embedder> =
            Arc::new(OllamaEmbedder::new(client.clone(), models.embedding_model.clone()));
        let source_recognizer = Self::build_recognizer(&config, &config.source_language, &client)?;
        let target_recognizer = Self::build_recognizer(&config, &config.target_language, &client)?;

        Ok(Self {
            config,
            embedder,
            source_recognizer,
            target_recognizer,
            client: Some(client),
        })
    }

    // @method: Create a controller around already constructed models
    pub fn with_models(
        config: Config,
        embedder: Arc<dyn Embedder>,
        source_recognizer: Arc<dyn EntityRecognizer>,
        target_recognizer: Arc<dyn EntityRecognizer>,
    ) -> Self {
        Self {
            config,
            embedder,
            source_recognizer,
            target_recognizer,
            client: None,
        }
    }

    fn build_recognizer(config: &Config, language: &str, client: &Arc<Ollama>) -> Result<Arc<dyn EntityRecognizer>> {
        let recognizer: Arc<dyn EntityRecognizer> = match config.models.entity_recognizer {
            EntityRecognizerKind::Heuristic => Arc::new(HeuristicEntityRecognizer::for_language(language)),
            EntityRecognizerKind::Ollama => Arc::new(OllamaEntityRecognizer::new(
                client.clone(),
                config.models.entity_model.clone(),
                language_utils::get_language_name(language)?,
            )),
            EntityRecognizerKind::None => Arc::new(NoEntityRecognizer),
        };
        Ok(recognizer)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Check that the model back-end answers, returning a description of it
    pub async fn check_connection(&self) -> Result<String> {
        let mut description = match &self.client {
            Some(client) => {
                let version = client.version().await
                    .with_context(|| format!("Failed to reach Ollama at {}", client.base_url()))?;
                format!("Ollama {} at {}", version, client.base_url())
            }
            None => "injected models".to_string(),
        };

        let vectors = self.embedder.embed(&["Hello world".to_string()]).await
            .with_context(|| format!("Embedding model {} is not usable", self.embedder.model_name()))?;
        let dimensions = vectors.first().map(Vec::len).unwrap_or_default();
        if dimensions == 0 {
            return Err(anyhow!("Embedding model {} returned no vector", self.embedder.model_name()));
        }

        description.push_str(&format!(", {} ({} dimensions)", self.embedder.model_name(), dimensions));
        Ok(description)
    }

    /// Align two subtitle files into a report
    pub async fn align_files(&self, source_file: &Path, target_file: &Path) -> Result<AlignmentReport> {
        let multi_progress = MultiProgress::new();
        self.align_files_with_progress(source_file, target_file, &multi_progress).await
    }

    async fn align_files_with_progress(
        &self,
        source_file: &Path,
        target_file: &Path,
        multi_progress: &MultiProgress,
    ) -> Result<AlignmentReport> {
        let sources = Self::load_track(source_file, TrackRole::Source)?;
        let targets = Self::load_track(target_file, TrackRole::Target)?;

        info!(
            "Aligning {} {} captions with {} {} captions",
            sources.len(),
            self.config.source_language,
            targets.len(),
            self.config.target_language
        );

        let progress_bar = multi_progress.add(ProgressBar::new(sources.len() as u64));
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} captions ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));
        progress_bar.set_message("Aligning");

        let alignment = &self.config.alignment;
        let scorer = MatchScorer::from_config(
            alignment,
            self.embedder.clone(),
            self.source_recognizer.clone(),
            self.target_recognizer.clone(),
        );
        let aligner = Aligner::from_config(scorer, alignment);

        let pb = progress_bar.clone();
        let result = aligner
            .align_captions_with_progress(&sources, &targets, move |done, _total| {
                pb.set_position(done as u64);
            })
            .await;
        progress_bar.finish_and_clear();
        let pairs = result?;

        let report = AlignmentReport::new(
            self.config.source_language.clone(),
            self.config.target_language.clone(),
            aligner.strategy(),
            aligner.scorer().embedding_model(),
            sources.len(),
            targets.len(),
            aligner.scorer().cache_stats(),
            pairs,
        );

        match report.mean_confidence() {
            Some(mean) => info!(
                "Matched {} of {} captions, {} dropped, mean confidence {:.1}%, embedding cache hit rate {:.0}%",
                report.matched,
                report.source_captions,
                report.dropped,
                mean,
                report.embedding_cache.hit_rate() * 100.0
            ),
            None => warn!("No caption of {:?} could be matched", source_file),
        }

        Ok(report)
    }

    fn load_track(path: &Path, track: TrackRole) -> Result<Vec<Caption>> {
        let content = FileManager::read_to_string(path)?;
        parse_srt(&content)
            .map_err(|source| AlignError::Parse { track, source })
            .with_context(|| format!("Failed to parse subtitle file: {:?}", path))
    }

    /// Align two files and write the result
    ///
    /// Without an explicit output path the result is written next to the source
    /// file. Returns `None` when the output already exists and `force_overwrite`
    /// is off.
    pub async fn run(
        &self,
        source_file: PathBuf,
        target_file: PathBuf,
        output_file: Option<PathBuf>,
        force_overwrite: bool,
    ) -> Result<Option<PathBuf>> {
        let multi_progress = MultiProgress::new();
        self.run_with_progress(&source_file, &target_file, output_file, &multi_progress, force_overwrite).await
    }

    async fn run_with_progress(
        &self,
        source_file: &Path,
        target_file: &Path,
        output_file: Option<PathBuf>,
        multi_progress: &MultiProgress,
        force_overwrite: bool,
    ) -> Result<Option<PathBuf>> {
        let start_time = std::time::Instant::now();

        for file in [source_file, target_file] {
            if !FileManager::file_exists(file) {
                return Err(anyhow!("Input file does not exist: {:?}", file));
            }
        }

        let output_path = output_file.unwrap_or_else(|| self.default_output_path(source_file));
        if output_path.exists() && !force_overwrite {
            warn!("Skipping {:?}, output already exists (use -f to force overwrite)", output_path);
            return Ok(None);
        }

        let report = self.align_files_with_progress(source_file, target_file, multi_progress).await?;
        let rendered = output::render(&report, self.config.output.format)?;
        FileManager::write_to_file(&output_path, &rendered)?;

        info!(
            "Success: {} ({})",
            output_path.display(),
            Self::format_duration(start_time.elapsed())
        );

        Ok(Some(output_path))
    }

    fn default_output_path(&self, source_file: &Path) -> PathBuf {
        let output_dir = source_file.parent().map(Path::to_path_buf).unwrap_or_default();
        FileManager::generate_output_path(
            source_file,
            output_dir,
            &self.config.source_language,
            &self.config.target_language,
            self.config.output.format.extension(),
        )
    }

    /// Align every source/target track pair found under a directory
    ///
    /// A failing pair is logged and counted; the remaining pairs still run.
    pub async fn run_folder(&self, input_dir: PathBuf, force_overwrite: bool) -> Result<FolderSummary> {
        let start_time = std::time::Instant::now();

        if !FileManager::dir_exists(&input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let pairs = FileManager::find_track_pairs(
            &input_dir,
            &self.config.source_language,
            &self.config.target_language,
        )?;
        if pairs.is_empty() {
            return Err(anyhow!(
                "No {}/{} subtitle pairs found in directory: {:?}",
                self.config.source_language,
                self.config.target_language,
                input_dir
            ));
        }
        debug!("Found {} track pair(s) in {:?}", pairs.len(), input_dir);

        let multi_progress = MultiProgress::new();
        let folder_pb = multi_progress.add(ProgressBar::new(pairs.len() as u64));
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        folder_pb.set_style(template_result.progress_chars("█▓▒░"));

        let mut summary = FolderSummary::default();

        for pair in &pairs {
            folder_pb.set_message(format!("Processing: {}", pair.stem));

            match self.run_with_progress(&pair.source, &pair.target, None, &multi_progress, force_overwrite).await {
                Ok(Some(_)) => summary.processed += 1,
                Ok(None) => summary.skipped += 1,
                Err(e) => {
                    error!("Error processing {}: {:#}", pair.stem, e);
                    summary.failed += 1;
                }
            }

            folder_pb.inc(1);
        }

        folder_pb.finish_with_message("Folder processing complete");

        info!(
            "Folder processing completed: {} processed, {} skipped, {} errors ({})",
            summary.processed,
            summary.skipped,
            summary.failed,
            Self::format_duration(start_time.elapsed())
        );

        Ok(summary)
    }

    // Format duration in a human-readable format
    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
