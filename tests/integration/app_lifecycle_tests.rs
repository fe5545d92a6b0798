/*!
 * Integration tests for controller runs over files and folders
 */

use anyhow::Result;
use std::sync::Arc;
use subalign::app_config::{Config, OutputFormat};
use subalign::app_controller::{Controller, FolderSummary};
use subalign::file_utils::FileManager;
use subalign::providers::mock::StubEmbedder;
use subalign::providers::NoEntityRecognizer;
use subalign::subtitle_processor::parse_srt;
use crate::common;

fn controller(format: OutputFormat) -> Controller {
    let mut config = Config::default();
    config.output.format = format;
    let (embedder, source, target) = common::sample_models();
    Controller::with_models(config, embedder, source, target)
}

/// A single run writes the report next to the source file
#[tokio::test]
async fn test_run_withDefaultOutput_shouldWriteJsonReport() -> Result<()> {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_file(temp_dir.path(), "movie.en.srt", common::ENGLISH_TRACK)?;
    let target = common::create_test_file(temp_dir.path(), "movie.zh.srt", common::CHINESE_TRACK)?;

    let written = controller(OutputFormat::Json).run(source, target, None, false).await?;

    let expected = temp_dir.path().join("movie.en-zh.aligned.json");
    assert_eq!(written, Some(expected.clone()));

    let json: serde_json::Value = serde_json::from_str(&FileManager::read_to_string(&expected)?)?;
    assert_eq!(json["matched"], 2);
    assert_eq!(json["source_captions"], 3);
    assert_eq!(json["embedding_model"], "stub-embedder");
    Ok(())
}

/// Existing outputs are kept unless forced
#[tokio::test]
async fn test_run_withExistingOutput_shouldSkipUnlessForced() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_file(temp_dir.path(), "movie.en.srt", common::ENGLISH_TRACK)?;
    let target = common::create_test_file(temp_dir.path(), "movie.zh.srt", common::CHINESE_TRACK)?;
    let output = common::create_test_file(temp_dir.path(), "pairs.srt", "keep me")?;

    let controller = controller(OutputFormat::Srt);
    let skipped = controller.run(source.clone(), target.clone(), Some(output.clone()), false).await?;
    assert_eq!(skipped, None);
    assert_eq!(FileManager::read_to_string(&output)?, "keep me");

    let written = controller.run(source, target, Some(output.clone()), true).await?;
    assert_eq!(written, Some(output.clone()));
    assert_eq!(parse_srt(&FileManager::read_to_string(&output)?)?.len(), 2);
    Ok(())
}

/// Missing inputs fail before anything is written
#[tokio::test]
async fn test_run_withMissingInput_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_file(temp_dir.path(), "movie.en.srt", common::ENGLISH_TRACK)?;

    let result = controller(OutputFormat::Json)
        .run(source, temp_dir.path().join("missing.zh.srt"), None, false)
        .await;
    assert!(result.is_err());
    assert!(!temp_dir.path().join("movie.en-zh.aligned.json").exists());
    Ok(())
}

/// A broken track fails that run with the file named
#[tokio::test]
async fn test_run_withBrokenTrack_shouldNameFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_file(temp_dir.path(), "movie.en.srt", common::ENGLISH_TRACK)?;
    let target = common::create_test_file(temp_dir.path(), "movie.zh.srt", "1\nbroken timing\ntext\n")?;

    let error = controller(OutputFormat::Json).run(source, target, None, false).await.unwrap_err();
    let message = format!("{:#}", error);
    assert!(message.contains("movie.zh.srt"));
    assert!(message.contains("target track"));
    Ok(())
}

/// Folder runs align every pair and count skips and failures
#[tokio::test]
async fn test_run_folder_withSeveralPairs_shouldSummarize() -> Result<()> {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    common::create_test_file(root, "a.en.srt", common::ENGLISH_TRACK)?;
    common::create_test_file(root, "a.zh.srt", common::CHINESE_TRACK)?;
    common::create_test_file(root, "b/b.en.srt", common::ENGLISH_TRACK)?;
    common::create_test_file(root, "b/b.zh.srt", common::CHINESE_TRACK)?;
    common::create_test_file(root, "c.en.srt", common::ENGLISH_TRACK)?;
    common::create_test_file(root, "c.zh.srt", "1\n00:00:01,000 => 00:00:02,000\nbroken\n")?;
    common::create_test_file(root, "b/b.en-zh.aligned.tsv", "old")?;

    let controller = controller(OutputFormat::Tsv);
    let summary = controller.run_folder(root.to_path_buf(), false).await?;

    assert_eq!(summary, FolderSummary { processed: 1, skipped: 1, failed: 1 });
    assert!(root.join("a.en-zh.aligned.tsv").exists());
    assert_eq!(FileManager::read_to_string(root.join("b/b.en-zh.aligned.tsv"))?, "old");
    Ok(())
}

/// Folders without pairs are an error
#[tokio::test]
async fn test_run_folder_withoutPairs_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "a.en.srt", common::ENGLISH_TRACK)?;

    assert!(controller(OutputFormat::Json).run_folder(temp_dir.path().to_path_buf(), false).await.is_err());
    Ok(())
}

/// The connection check embeds a probe text with the injected model
#[tokio::test]
async fn test_check_connection_withInjectedModels_shouldDescribeModel() -> Result<()> {
    let description = controller(OutputFormat::Json).check_connection().await?;
    assert!(description.contains("stub-embedder"));
    assert!(description.contains("2 dimensions"));

    let failing = Controller::with_models(
        Config::default(),
        Arc::new(StubEmbedder::failing()),
        Arc::new(NoEntityRecognizer),
        Arc::new(NoEntityRecognizer),
    );
    assert!(failing.check_connection().await.is_err());
    Ok(())
}

/// Controllers can be driven from synchronous code
#[test]
fn test_align_files_withBlockingRuntime_shouldReport() {
    let result = tokio_test::block_on(async {
        let temp_dir = common::create_temp_dir()?;
        let source = common::create_test_file(temp_dir.path(), "show.en.srt", common::ENGLISH_TRACK)?;
        let target = common::create_test_file(temp_dir.path(), "show.zh.srt", common::CHINESE_TRACK)?;
        controller(OutputFormat::Tsv).align_files(&source, &target).await
    });

    let report = result.unwrap();
    assert_eq!(report.matched, 2);
    assert_eq!(report.target_captions, 3);
}
