//! Rename engine
//!
//! Computes canonical file names from a naming template and the associated
//! series/season/episode metadata, performs the filesystem rename, and
//! updates the episode-file index in the same logical step. Four
//! granularities (all, series, season, episode) funnel into one core
//! operation over a batch of files.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::file_utils::sanitize_for_filename;
use super::locks::SeriesLockMap;
use crate::model::{EpisodeFileRecord, EpisodeRecord, SeriesRecord};
use crate::store::{EpisodeFileStore, EpisodeStore, SeriesStore};

/// Why a single file's rename did not happen
#[derive(Debug, Error)]
pub enum RenameError {
    #[error("computed target collides with {0}")]
    Collision(String),
    #[error("no episode associated with file")]
    NoEpisodes,
    #[error("owning series no longer exists")]
    MissingSeries,
    #[error("filesystem rename failed: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Per-file outcome of a rename batch
#[derive(Debug)]
pub struct RenameOutcome {
    pub file_id: Uuid,
    pub original_path: String,
    /// Target path, when one could be computed
    pub new_path: Option<String>,
    /// Whether the file was actually moved (false for already-canonical)
    pub renamed: bool,
    pub error: Option<RenameError>,
}

impl RenameOutcome {
    fn unchanged(file: &EpisodeFileRecord) -> Self {
        Self {
            file_id: file.id,
            original_path: file.path.clone(),
            new_path: None,
            renamed: false,
            error: None,
        }
    }

    fn renamed(file: &EpisodeFileRecord, new_path: String) -> Self {
        Self {
            file_id: file.id,
            original_path: file.path.clone(),
            new_path: Some(new_path),
            renamed: true,
            error: None,
        }
    }

    fn failed(file: &EpisodeFileRecord, new_path: Option<String>, error: RenameError) -> Self {
        Self {
            file_id: file.id,
            original_path: file.path.clone(),
            new_path,
            renamed: false,
            error: Some(error),
        }
    }
}

/// Renames tracked episode files to the canonical layout
pub struct RenameEngine {
    series: Arc<dyn SeriesStore>,
    episodes: Arc<dyn EpisodeStore>,
    files: Arc<dyn EpisodeFileStore>,
    locks: Arc<SeriesLockMap>,
    template: String,
}

impl RenameEngine {
    pub fn new(
        series: Arc<dyn SeriesStore>,
        episodes: Arc<dyn EpisodeStore>,
        files: Arc<dyn EpisodeFileStore>,
        locks: Arc<SeriesLockMap>,
        template: String,
    ) -> Self {
        Self {
            series,
            episodes,
            files,
            locks,
            template,
        }
    }

    /// Rename every tracked episode file across all series
    pub async fn rename_all(&self) -> Result<Vec<RenameOutcome>> {
        let files = self.files.list().await?;
        Ok(self.rename_files(files).await)
    }

    /// Rename every episode file under one series
    pub async fn rename_series(&self, series_id: Uuid) -> Result<Vec<RenameOutcome>> {
        let files = self.files.list_by_series(series_id).await?;
        Ok(self.rename_files(files).await)
    }

    /// Rename every episode file in one (series, season) group
    pub async fn rename_season(
        &self,
        series_id: Uuid,
        season_number: i32,
    ) -> Result<Vec<RenameOutcome>> {
        let files = self.files.list_by_season(series_id, season_number).await?;
        Ok(self.rename_files(files).await)
    }

    /// Rename the file associated with one episode
    pub async fn rename_episode(&self, episode_id: Uuid) -> Result<Vec<RenameOutcome>> {
        let episode = self
            .episodes
            .get(episode_id)
            .await?
            .context("episode not found")?;

        let Some(file_id) = episode.episode_file_id else {
            return Ok(Vec::new());
        };
        let Some(file) = self.files.get(file_id).await? else {
            return Ok(Vec::new());
        };

        Ok(self.rename_files(vec![file]).await)
    }

    /// Core batch rename. A failure for one file is recorded in its outcome
    /// and never aborts the rest of the batch.
    pub async fn rename_files(&self, files: Vec<EpisodeFileRecord>) -> Vec<RenameOutcome> {
        let mut by_series: HashMap<Uuid, Vec<EpisodeFileRecord>> = HashMap::new();
        for file in files {
            by_series.entry(file.series_id).or_default().push(file);
        }

        let mut outcomes = Vec::new();
        for (series_id, group) in by_series {
            // Exclusive with scans of the same series
            let _section = self.locks.acquire(series_id).await;

            let series = match self.series.get(series_id).await {
                Ok(Some(series)) => series,
                Ok(None) => {
                    for file in &group {
                        outcomes.push(RenameOutcome::failed(file, None, RenameError::MissingSeries));
                    }
                    continue;
                }
                Err(e) => {
                    for file in &group {
                        outcomes.push(RenameOutcome::failed(
                            file,
                            None,
                            RenameError::Store(anyhow::anyhow!("{e}")),
                        ));
                    }
                    continue;
                }
            };

            // Targets claimed so far in this batch, for collision detection
            let mut claimed: HashSet<PathBuf> = HashSet::new();
            for file in &group {
                let outcome = self.rename_one(&series, file, &mut claimed).await;
                if let Some(error) = &outcome.error {
                    warn!(path = %file.path, error = %error, "Rename skipped");
                }
                outcomes.push(outcome);
            }
        }

        let renamed = outcomes.iter().filter(|o| o.renamed).count();
        let failed = outcomes.iter().filter(|o| o.error.is_some()).count();
        info!(
            total = outcomes.len(),
            renamed = renamed,
            failed = failed,
            "Rename batch completed"
        );

        outcomes
    }

    async fn rename_one(
        &self,
        series: &SeriesRecord,
        file: &EpisodeFileRecord,
        claimed: &mut HashSet<PathBuf>,
    ) -> RenameOutcome {
        let episodes = match self.episodes.list_by_file(file.id).await {
            Ok(episodes) => episodes,
            Err(e) => return RenameOutcome::failed(file, None, RenameError::Store(e)),
        };
        if episodes.is_empty() {
            return RenameOutcome::failed(file, None, RenameError::NoEpisodes);
        }

        let current = PathBuf::from(&file.path);
        let target = canonical_path(series, &episodes, &current, &self.template);

        if target == current {
            debug!(path = %file.path, "File already has its canonical name");
            return RenameOutcome::unchanged(file);
        }

        let target_string = target.to_string_lossy().to_string();

        // Two files resolving to the same canonical path, or an untracked
        // file already sitting at the target, only fail this file.
        if claimed.contains(&target) || target.exists() {
            return RenameOutcome::failed(
                file,
                Some(target_string.clone()),
                RenameError::Collision(target_string),
            );
        }

        if let Err(e) = self.perform_rename(&current, &target, file.id).await {
            return RenameOutcome::failed(file, Some(target_string), e);
        }

        claimed.insert(target.clone());
        info!(from = %file.path, to = %target_string, "Renamed episode file");
        RenameOutcome::renamed(file, target_string)
    }

    /// Move the file and update the index in the same logical step; the
    /// index must never point at a path that does not exist.
    async fn perform_rename(
        &self,
        current: &Path,
        target: &Path,
        file_id: Uuid,
    ) -> Result<(), RenameError> {
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::rename(current, target).await?;

        if let Err(e) = self
            .files
            .update_path(file_id, &target.to_string_lossy())
            .await
        {
            // Keep index and disk consistent even when the store write fails
            let _ = tokio::fs::rename(target, current).await;
            return Err(RenameError::Store(e));
        }

        Ok(())
    }
}

/// Compute the canonical path for a file from its series/episode metadata
fn canonical_path(
    series: &SeriesRecord,
    episodes: &[EpisodeRecord],
    current: &Path,
    template: &str,
) -> PathBuf {
    let extension = current
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("mkv");

    let season_number = episodes
        .iter()
        .map(|e| e.season_number)
        .min()
        .unwrap_or_default();

    let filename = format!(
        "{}.{}",
        apply_naming_template(template, &series.name, season_number, episodes),
        extension
    );

    Path::new(&series.path)
        .join(format!("Season {season_number:02}"))
        .join(filename)
}

/// Apply the naming template to one file's metadata.
///
/// Supported placeholders: `{show}`, `{season}`, `{season:02}`, `{episode}`,
/// `{episode:02}`, `{title}`. Multi-episode files render an episode span
/// ("01-E02") and joined titles.
fn apply_naming_template(
    template: &str,
    show_name: &str,
    season_number: i32,
    episodes: &[EpisodeRecord],
) -> String {
    let mut ordered: Vec<&EpisodeRecord> = episodes.iter().collect();
    ordered.sort_by_key(|e| (e.season_number, e.episode_number));

    let episode_span = ordered
        .iter()
        .map(|e| format!("{:02}", e.episode_number))
        .collect::<Vec<_>>()
        .join("-E");
    let episode_plain = ordered
        .iter()
        .map(|e| e.episode_number.to_string())
        .collect::<Vec<_>>()
        .join("-");

    let title = ordered
        .iter()
        .filter_map(|e| e.title.as_deref())
        .collect::<Vec<_>>()
        .join(" + ");

    let rendered = template
        .replace("{show}", &sanitize_for_filename(show_name))
        .replace("{season:02}", &format!("{season_number:02}"))
        .replace("{season}", &season_number.to_string())
        .replace("{episode:02}", &episode_span)
        .replace("{episode}", &episode_plain)
        .replace("{title}", &sanitize_for_filename(&title));

    // A missing title leaves a dangling separator behind
    rendered
        .trim_end_matches(|c: char| c == ' ' || c == '-')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn series(name: &str, path: &str) -> SeriesRecord {
        SeriesRecord {
            id: Uuid::new_v4(),
            external_id: 1,
            name: name.to_string(),
            path: path.to_string(),
            overview: None,
            status: None,
            first_aired: None,
            quality_profile_id: None,
            monitored: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn episode(season: i32, number: i32, title: Option<&str>) -> EpisodeRecord {
        EpisodeRecord {
            id: Uuid::new_v4(),
            series_id: Uuid::new_v4(),
            season_number: season,
            episode_number: number,
            title: title.map(|t| t.to_string()),
            overview: None,
            air_date: None,
            episode_file_id: None,
        }
    }

    const TEMPLATE: &str = "{show} - S{season:02}E{episode:02} - {title}";

    #[test]
    fn test_canonical_path_single_episode() {
        let series = series("Breaking Bad", "/tv/Breaking Bad");
        let episodes = vec![episode(1, 5, Some("Gray Matter"))];
        let path = canonical_path(
            &series,
            &episodes,
            Path::new("/tv/Breaking Bad/bb.105.mkv"),
            TEMPLATE,
        );
        assert_eq!(
            path,
            Path::new("/tv/Breaking Bad/Season 01/Breaking Bad - S01E05 - Gray Matter.mkv")
        );
    }

    #[test]
    fn test_canonical_path_multi_episode_span() {
        let series = series("Deep Space Nine", "/tv/DS9");
        let episodes = vec![
            episode(1, 2, Some("Emissary (2)")),
            episode(1, 1, Some("Emissary (1)")),
        ];
        let path = canonical_path(&series, &episodes, Path::new("/tv/DS9/pilot.mkv"), TEMPLATE);
        assert_eq!(
            path,
            Path::new(
                "/tv/DS9/Season 01/Deep Space Nine - S01E01-E02 - Emissary (1) + Emissary (2).mkv"
            )
        );
    }

    #[test]
    fn test_template_sanitizes_separators() {
        let rendered = apply_naming_template(
            TEMPLATE,
            "Star Trek: Deep Space Nine",
            1,
            &[episode(1, 1, Some("Emissary"))],
        );
        assert!(!rendered.contains(':'), "colon must be sanitized: {rendered}");
        assert!(!rendered.contains('/'));
    }

    #[test]
    fn test_template_missing_title_trims_separator() {
        let rendered =
            apply_naming_template(TEMPLATE, "Show", 2, &[episode(2, 9, None)]);
        assert_eq!(rendered, "Show - S02E09");
    }

    #[test]
    fn test_template_keeps_extension_from_current_path() {
        let series = series("Show", "/tv/Show");
        let episodes = vec![episode(3, 1, Some("One"))];
        let path = canonical_path(
            &series,
            &episodes,
            Path::new("/tv/Show/whatever.avi"),
            TEMPLATE,
        );
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("avi"));
    }
}
