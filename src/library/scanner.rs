use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::catalog::Resolver;
use super::models::{ClassificationResult, RawMatch};
use super::patterns::PatternRegistry;
use super::show_name::parse_show_name;
use crate::config::Config;
use crate::error::{Error, Result};

/// Finds episode files under an input directory and classifies them
#[derive(Debug, Clone)]
pub struct Scanner {
    registry: PatternRegistry,
    extensions: Vec<String>,
}

impl Scanner {
    pub fn new(registry: PatternRegistry, extensions: Vec<String>) -> Self {
        Self {
            registry,
            extensions,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            PatternRegistry::from_lines(&config.patterns.rules),
            config.media.extensions.clone(),
        )
    }

    fn is_media_file(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.extensions
            .iter()
            .any(|known| known.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }

    /// Media files in enumeration order, descending depth-first when `recurse` is set
    pub fn collect_files(&self, input_root: &Path, recurse: bool) -> Result<Vec<PathBuf>> {
        if !input_root.is_dir() {
            return Err(Error::InputDirNotFound(input_root.to_path_buf()));
        }

        let max_depth = if recurse { usize::MAX } else { 1 };
        let mut files = Vec::new();

        for entry in WalkDir::new(input_root).min_depth(1).max_depth(max_depth) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            if entry.file_type().is_file() && self.is_media_file(entry.path()) {
                files.push(entry.into_path());
            }
        }

        debug!(root = %input_root.display(), count = files.len(), "Collected media files");
        Ok(files)
    }

    /// Classify and resolve one file. `None` means no pattern matched.
    pub fn classify_file<R: Resolver + ?Sized>(
        &self,
        path: &Path,
        resolver: &R,
    ) -> Option<ClassificationResult> {
        let Some(raw) = self.registry.classify(path) else {
            debug!(file = %path.display(), "Skipping file, no pattern matched");
            return None;
        };
        Some(resolve(raw, resolver))
    }

    pub fn scan<R: Resolver + ?Sized>(
        &self,
        input_root: &Path,
        recurse: bool,
        resolver: &R,
    ) -> Result<Vec<ClassificationResult>> {
        let files = self.collect_files(input_root, recurse)?;
        let results: Vec<ClassificationResult> = files
            .iter()
            .filter_map(|f| self.classify_file(f, resolver))
            .collect();

        let incomplete = results.iter().filter(|r| r.is_incomplete()).count();
        info!(
            files = files.len(),
            matched = results.len(),
            incomplete,
            "Scan complete"
        );
        Ok(results)
    }
}

/// Fill in show and episode identity for a raw match. Unresolved parts stay empty.
pub fn resolve<R: Resolver + ?Sized>(raw: RawMatch, resolver: &R) -> ClassificationResult {
    let candidate = parse_show_name(&raw.show_name_fragment);
    let show = resolver.find_show(&candidate);

    let episode = show.as_ref().and_then(|show| match (raw.season, raw.episode, raw.air_date) {
        (Some(season), Some(episode), _) => resolver.find_episode(show, season, episode),
        (_, _, Some(date)) => resolver.find_episode_by_date(show, date),
        _ => None,
    });

    let mut result = ClassificationResult::from_match(raw);
    result.show = show;
    result.episode = episode;
    result.checked = !result.is_incomplete();

    if result.is_incomplete() {
        debug!(file = %result.source_file.display(), candidate = %candidate, "Could not resolve identity");
    }
    result
}
