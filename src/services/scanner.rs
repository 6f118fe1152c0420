//! Episode file scanner
//!
//! Walks a series folder to discover media files, parses season/episode
//! identifiers from filenames, and reconciles discovered files against the
//! tracked episode-file index.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};
use uuid::Uuid;
use walkdir::WalkDir;

use super::file_utils::{is_sample_file, is_video_file};
use super::filename_parser;
use crate::model::{CreateEpisodeFile, EpisodeFileRecord, SeriesRecord};
use crate::store::{EpisodeFileStore, EpisodeStore};

/// Outcome of one scan pass over a series folder
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    pub series_id: Uuid,
    /// Media files seen on disk
    pub total_files: usize,
    /// Files newly added to the index
    pub new_files: usize,
    /// Files that were already tracked
    pub already_tracked: usize,
    /// Files skipped because no season/episode could be parsed
    pub unparseable: usize,
    /// Files skipped because no known episode matched the parsed identifiers
    pub unmatched: usize,
}

/// Discovered file with parsed info
#[derive(Debug)]
struct DiscoveredFile {
    path: String,
    size: u64,
    parsed: filename_parser::ParsedEpisode,
}

/// Scanner service keeping the episode-file index consistent with disk
pub struct EpisodeFileScanner {
    episodes: Arc<dyn EpisodeStore>,
    files: Arc<dyn EpisodeFileStore>,
}

impl EpisodeFileScanner {
    pub fn new(episodes: Arc<dyn EpisodeStore>, files: Arc<dyn EpisodeFileStore>) -> Self {
        Self { episodes, files }
    }

    /// Scan a series folder and track newly discovered episode files.
    ///
    /// Unparseable and unmatched files are counted and logged, never fatal.
    /// Running the scan twice over an unchanged folder is a no-op the second
    /// time.
    pub async fn scan(&self, series: &SeriesRecord) -> Result<ScanSummary> {
        let mut summary = ScanSummary {
            series_id: series.id,
            ..Default::default()
        };

        let series_path = Path::new(&series.path);
        if !series_path.exists() {
            warn!(series = %series.name, path = %series.path, "Series path does not exist");
            return Ok(summary);
        }

        info!(series = %series.name, path = %series.path, "Scanning series folder");

        let discovered = collect_video_files(series_path);
        summary.total_files = discovered.len();

        for file in discovered {
            if self.files.get_by_path(&file.path).await?.is_some() {
                debug!(path = %file.path, "File already tracked, skipping");
                summary.already_tracked += 1;
                continue;
            }

            if !file.parsed.is_parseable() {
                warn!(path = %file.path, "Could not parse season/episode from filename");
                summary.unparseable += 1;
                continue;
            }
            let season_number = file.parsed.season_number.unwrap_or_default();

            // Match parsed identifiers against known episodes
            let mut matched = Vec::new();
            for episode_number in &file.parsed.episode_numbers {
                match self
                    .episodes
                    .get_by_number(series.id, season_number, *episode_number)
                    .await?
                {
                    Some(episode) => matched.push(episode),
                    None => {
                        debug!(
                            series = %series.name,
                            season = season_number,
                            episode = episode_number,
                            "No episode record for parsed identifier"
                        );
                    }
                }
            }

            if matched.is_empty() {
                warn!(
                    path = %file.path,
                    season = season_number,
                    "No known episode matches file, leaving it untracked"
                );
                summary.unmatched += 1;
                continue;
            }

            let record = self
                .files
                .create(CreateEpisodeFile {
                    series_id: series.id,
                    season_number,
                    path: file.path.clone(),
                    quality: file.parsed.quality.label(),
                    size_bytes: file.size as i64,
                })
                .await?;

            for episode in &matched {
                self.episodes
                    .set_episode_file(episode.id, Some(record.id))
                    .await?;
            }

            debug!(path = %file.path, episodes = matched.len(), "Tracked new episode file");
            summary.new_files += 1;
        }

        info!(
            series = %series.name,
            total = summary.total_files,
            new = summary.new_files,
            already_tracked = summary.already_tracked,
            unparseable = summary.unparseable,
            unmatched = summary.unmatched,
            "Series scan completed"
        );

        Ok(summary)
    }

    /// Remove records whose on-disk path no longer exists.
    ///
    /// Run before a rescan so repeated clean-up + scan passes over an
    /// unchanged folder converge on the same file set.
    pub async fn clean_up(&self, existing_files: &[EpisodeFileRecord]) -> Result<usize> {
        let mut removed = 0;

        for file in existing_files {
            if Path::new(&file.path).exists() {
                continue;
            }

            info!(path = %file.path, "Removing stale episode file record");
            self.episodes.detach_file(file.id).await?;
            self.files.delete(file.id).await?;
            removed += 1;
        }

        if removed > 0 {
            info!(removed = removed, "Clean-up removed stale episode files");
        }

        Ok(removed)
    }
}

/// Walk a series folder and collect recognized video files
fn collect_video_files(series_path: &Path) -> Vec<DiscoveredFile> {
    let mut files = Vec::new();

    for entry in WalkDir::new(series_path)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() || !is_video_file(path) {
            continue;
        }

        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        if is_sample_file(filename) {
            debug!(path = %path.display(), "Skipping sample file");
            continue;
        }

        files.push(DiscoveredFile {
            path: path.to_string_lossy().to_string(),
            size: entry.metadata().map(|m| m.len()).unwrap_or(0),
            parsed: filename_parser::parse_episode(filename),
        });
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    files
}
