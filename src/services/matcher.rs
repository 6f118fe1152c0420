//! Folder discovery and series matching
//!
//! [`FolderScanner`] lists subfolders of a root directory that are not yet
//! tracked as a series; [`SeriesMatcher`] resolves a folder name to an
//! external catalog candidate using fuzzy name matching.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use strsim::{jaro_winkler, normalized_levenshtein};
use tracing::{debug, warn};

use super::catalog::{CatalogCandidate, CatalogClient};
use super::filename_parser::{clean_show_name, normalize_show_name};
use crate::store::SeriesStore;

/// A folder under a configured root with no corresponding series record.
///
/// `candidate` is `None` when no confident catalog match was found; the
/// folder is still surfaced so an operator can disambiguate it manually.
#[derive(Debug, Clone)]
pub struct UnmappedFolder {
    pub path: PathBuf,
    pub candidate: Option<CatalogCandidate>,
}

/// Resolves folder names against the external catalog
pub struct SeriesMatcher {
    catalog: Arc<dyn CatalogClient>,
    threshold: f64,
}

impl SeriesMatcher {
    pub fn new(catalog: Arc<dyn CatalogClient>, threshold: f64) -> Self {
        Self { catalog, threshold }
    }

    /// Best-effort resolution of a folder path to a catalog candidate.
    ///
    /// Catalog failures degrade to `None`; the caller decides whether an
    /// unresolved folder is an error.
    pub async fn map_path_to_series(&self, path: &Path) -> Option<CatalogCandidate> {
        let folder_name = path.file_name()?.to_str()?;
        let query = clean_show_name(folder_name);
        if query.is_empty() {
            return None;
        }

        let candidates = match self.catalog.search_by_name(&query).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(folder = %folder_name, error = %e, "Catalog search failed, leaving folder unresolved");
                return None;
            }
        };

        let normalized_query = normalize_show_name(&query);
        let mut best: Option<(f64, CatalogCandidate)> = None;

        for candidate in candidates {
            let score = similarity(&normalized_query, &normalize_show_name(&candidate.name));
            debug!(
                folder = %folder_name,
                candidate = %candidate.name,
                score = score,
                "Scored catalog candidate"
            );
            if best.as_ref().is_none_or(|(s, _)| score > *s) {
                best = Some((score, candidate));
            }
        }

        match best {
            Some((score, candidate)) if score >= self.threshold => {
                debug!(folder = %folder_name, matched = %candidate.name, score = score, "Resolved folder");
                Some(candidate)
            }
            Some((score, candidate)) => {
                debug!(
                    folder = %folder_name,
                    closest = %candidate.name,
                    score = score,
                    "No confident catalog match for folder"
                );
                None
            }
            None => None,
        }
    }
}

/// Similarity between two normalized names (0.0 to 1.0)
fn similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    jaro_winkler(a, b).max(normalized_levenshtein(a, b))
}

/// Lists unmapped folders under configured roots
pub struct FolderScanner {
    series_store: Arc<dyn SeriesStore>,
    matcher: Arc<SeriesMatcher>,
}

impl FolderScanner {
    pub fn new(series_store: Arc<dyn SeriesStore>, matcher: Arc<SeriesMatcher>) -> Self {
        Self {
            series_store,
            matcher,
        }
    }

    pub fn matcher(&self) -> &SeriesMatcher {
        &self.matcher
    }

    /// List immediate subfolders of `root_path` that are not tracked as a
    /// series, each with its best catalog candidate (or `None`).
    ///
    /// Pure read; never drops a folder just because it did not resolve.
    pub async fn list_unmapped_folders(&self, root_path: &Path) -> Result<Vec<UnmappedFolder>> {
        let mut entries = tokio::fs::read_dir(root_path)
            .await
            .with_context(|| format!("root directory is not readable: {}", root_path.display()))?;

        let tracked: Vec<PathBuf> = self
            .series_store
            .list()
            .await?
            .into_iter()
            .map(|s| PathBuf::from(s.path))
            .collect();

        let mut unmapped = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            if tracked.iter().any(|t| t == &path) {
                continue;
            }

            let candidate = self.matcher.map_path_to_series(&path).await;
            unmapped.push(UnmappedFolder { path, candidate });
        }

        unmapped.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(unmapped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_similarity_exact() {
        assert_eq!(similarity("office us", "office us"), 1.0);
    }

    #[test]
    fn test_similarity_close_beats_distant() {
        let close = similarity("chicago fire", "chicago fire");
        let distant = similarity("chicago fire", "chicago pd");
        assert!(close > distant);
        assert!(distant > 0.5);
    }
}
