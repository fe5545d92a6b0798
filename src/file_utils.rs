use anyhow::{Result, Context};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use log::debug;

use crate::language_utils;

// @module: File and directory utilities

/// Two language tracks of the same title
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackPair {
    // @field: Title part of the file name, without language and extension
    pub stem: String,
    pub source: PathBuf,
    pub target: PathBuf,
}

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    // @generates: Output path for an aligned track pair
    // @params: source_file, output_dir, source_language, target_language, extension
    pub fn generate_output_path<P1: AsRef<Path>, P2: AsRef<Path>>(
        source_file: P1,
        output_dir: P2,
        source_language: &str,
        target_language: &str,
        extension: &str,
    ) -> PathBuf {
        let source_file = source_file.as_ref();
        let stem = source_file.file_stem().unwrap_or_default().to_string_lossy().to_string();

        // movie.en.srt -> movie
        let title = match Self::split_language_suffix(&stem) {
            Some((title, language)) if language_utils::language_codes_match(language, source_language) => {
                title.to_string()
            }
            _ => stem.clone(),
        };

        let output_filename = format!(
            "{}.{}-{}.aligned.{}",
            title, source_language, target_language, extension
        );

        output_dir.as_ref().join(output_filename)
    }

    /// Split `title.lang` into its title and language code parts
    pub fn split_language_suffix(stem: &str) -> Option<(&str, &str)> {
        let (title, language) = stem.rsplit_once('.')?;
        if title.is_empty() || language_utils::validate_language_code(language).is_err() {
            return None;
        }
        Some((title, language))
    }

    /// Find files with a specific extension in a directory
    pub fn find_files<P: AsRef<Path>>(dir: P, extension: &str) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();
        let normalized_ext = extension.trim_start_matches('.');

        for entry in WalkDir::new(dir.as_ref()).follow_links(true).sort_by_file_name() {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() {
                if let Some(ext) = path.extension() {
                    if ext.to_string_lossy().eq_ignore_ascii_case(normalized_ext) {
                        result.push(path.to_path_buf());
                    }
                }
            }
        }

        Ok(result)
    }

    /// Find `<title>.<source>.srt` / `<title>.<target>.srt` pairs under a directory
    ///
    /// Language suffixes are matched by language, so `movie.fre.srt` pairs as
    /// French. Titles with only one of the two tracks are skipped.
    pub fn find_track_pairs<P: AsRef<Path>>(
        dir: P,
        source_language: &str,
        target_language: &str,
    ) -> Result<Vec<TrackPair>> {
        let mut sources: BTreeMap<PathBuf, (String, PathBuf)> = BTreeMap::new();
        let mut targets: BTreeMap<PathBuf, PathBuf> = BTreeMap::new();

        for path in Self::find_files(dir, "srt")? {
            let stem = path.file_stem().unwrap_or_default().to_string_lossy().to_string();
            let Some((title, language)) = Self::split_language_suffix(&stem) else {
                continue;
            };
            let key = path.with_file_name(title);

            if language_utils::language_codes_match(language, source_language) {
                sources.insert(key, (title.to_string(), path.clone()));
            } else if language_utils::language_codes_match(language, target_language) {
                targets.insert(key, path.clone());
            }
        }

        let pairs: Vec<TrackPair> = sources
            .into_iter()
            .filter_map(|(key, (stem, source))| {
                let target = targets.remove(&key);
                if target.is_none() {
                    debug!("No {} track for {:?}", target_language, source);
                }
                target.map(|target| TrackPair { stem, source, target })
            })
            .collect();

        Ok(pairs)
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }
}
