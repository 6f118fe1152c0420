//! Filename parser for scene-style release names
//!
//! Parses filenames like:
//! - "Chicago Fire S14E08 1080p WEB h264-ETHEL"
//! - "Star Trek- Deep Space Nine - S01E01-E02 - Emissary 960p.mkv"
//! - "The.Wire.3x08.Moral.Midgetry.720p.mkv"
//!
//! Patterns are applied in priority order; the first match wins.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Parsed episode information from a filename
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedEpisode {
    pub show_name: Option<String>,
    pub season_number: Option<i32>,
    /// One entry per episode the file covers; more than one for multi-episode
    /// files such as "S01E01-E02"
    pub episode_numbers: Vec<i32>,
    pub year: Option<i32>,
    pub quality: ParsedQuality,
    pub original_title: String,
}

impl ParsedEpisode {
    /// True when both a season and at least one episode were recognized
    pub fn is_parseable(&self) -> bool {
        self.season_number.is_some() && !self.episode_numbers.is_empty()
    }
}

/// Quality information extracted from a filename
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedQuality {
    pub resolution: Option<String>,
    pub source: Option<String>,
}

impl ParsedQuality {
    /// Render as the label stored on an episode file, e.g. "1080p WEB-DL"
    pub fn label(&self) -> Option<String> {
        match (&self.resolution, &self.source) {
            (Some(res), Some(src)) => Some(format!("{res} {src}")),
            (Some(res), None) => Some(res.clone()),
            (None, Some(src)) => Some(src.clone()),
            (None, None) => None,
        }
    }
}

// Pattern 1: S01E01, including multi-episode runs (S01E01E02, S01E01-E02)
static SXXEXX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(.*?)[\s._-]*s(\d{1,2})((?:[\s._-]*e\d{1,3})+)").unwrap()
});
static EPISODE_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)e(\d{1,3})").unwrap());

// Pattern 2: 1x01 format
static NXNN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(.*?)[\s._-]*(\d{1,2})x(\d{2,3})").unwrap());

// Pattern 3: verbose "Season 1 Episode 2"
static VERBOSE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(.*?)[\s._-]*season[\s._-]*(\d{1,2}).*?episode[\s._-]*(\d{1,3})").unwrap());

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(19\d{2}|20\d{2})\b").unwrap());
static TRAILING_YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s(]*(19\d{2}|20\d{2})[\s)]*$").unwrap());
static COUNTRY_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[\s(]*(US|UK|AU|NZ)[\s)]*$").unwrap());
static MULTI_SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static RESOLUTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(2160p|1080p|720p|480p|4K|UHD)").unwrap());

/// Parse a filename to extract episode information
pub fn parse_episode(filename: &str) -> ParsedEpisode {
    let mut result = ParsedEpisode {
        original_title: filename.to_string(),
        ..Default::default()
    };

    // Strip the extension and normalize separators for matching
    let stem = filename
        .rsplit_once('.')
        .map(|(stem, _ext)| stem)
        .unwrap_or(filename);
    let cleaned = stem.replace(['.', '_'], " ");

    if let Some(caps) = SXXEXX_RE.captures(&cleaned) {
        result.show_name = non_empty(clean_show_name(&caps[1]));
        result.season_number = caps[2].parse().ok();
        result.episode_numbers = EPISODE_RUN_RE
            .captures_iter(&caps[3])
            .filter_map(|c| c[1].parse().ok())
            .collect();
    } else if let Some(caps) = NXNN_RE.captures(&cleaned) {
        result.show_name = non_empty(clean_show_name(&caps[1]));
        result.season_number = caps[2].parse().ok();
        result.episode_numbers = caps[3].parse().ok().into_iter().collect();
    } else if let Some(caps) = VERBOSE_RE.captures(&cleaned) {
        result.show_name = non_empty(clean_show_name(&caps[1]));
        result.season_number = caps[2].parse().ok();
        result.episode_numbers = caps[3].parse().ok().into_iter().collect();
    }

    if let Some(caps) = YEAR_RE.captures(&cleaned) {
        result.year = caps[1].parse().ok();
    }

    result.quality = parse_quality(filename);

    debug!(
        filename = filename,
        show = ?result.show_name,
        season = ?result.season_number,
        episodes = ?result.episode_numbers,
        "Parsed filename"
    );

    result
}

/// Parse quality information from a filename
pub fn parse_quality(filename: &str) -> ParsedQuality {
    let upper = filename.to_uppercase();
    let mut quality = ParsedQuality::default();

    if let Some(caps) = RESOLUTION_RE.captures(filename) {
        let res = caps[1].to_uppercase();
        quality.resolution = Some(match res.as_str() {
            "4K" | "UHD" => "2160p".to_string(),
            other => other.to_lowercase(),
        });
    }

    if upper.contains("BLURAY") || upper.contains("BLU-RAY") || upper.contains("BDRIP") {
        quality.source = Some("BluRay".to_string());
    } else if upper.contains("WEB-DL") || upper.contains("WEBDL") {
        quality.source = Some("WEB-DL".to_string());
    } else if upper.contains("WEBRIP") || upper.contains("WEB RIP") {
        quality.source = Some("WEBRip".to_string());
    } else if upper.contains("HDTV") {
        quality.source = Some("HDTV".to_string());
    } else if upper.contains("DVD") {
        quality.source = Some("DVD".to_string());
    }

    quality
}

/// Clean up a show name captured ahead of the episode pattern
pub fn clean_show_name(name: &str) -> String {
    let mut cleaned = name.replace(['.', '_'], " ").replace('-', " ");

    cleaned = TRAILING_YEAR_RE.replace(&cleaned, "").to_string();
    cleaned = COUNTRY_SUFFIX_RE.replace(&cleaned, "").to_string();
    cleaned = MULTI_SPACE_RE.replace_all(&cleaned, " ").to_string();

    cleaned.trim().to_string()
}

/// Normalize a show name for comparison (case, articles, punctuation)
pub fn normalize_show_name(name: &str) -> String {
    let mut normalized = name.to_lowercase();

    for article in ["the ", "a ", "an "] {
        if normalized.starts_with(article) {
            normalized = normalized[article.len()..].to_string();
        }
    }

    normalized = normalized
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();

    MULTI_SPACE_RE
        .replace_all(&normalized, " ")
        .trim()
        .to_string()
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sxxexx() {
        let result = parse_episode("Chicago Fire S14E08 1080p WEB-DL h264-ETHEL.mkv");
        assert_eq!(result.show_name.as_deref(), Some("Chicago Fire"));
        assert_eq!(result.season_number, Some(14));
        assert_eq!(result.episode_numbers, vec![8]);
        assert_eq!(result.quality.resolution.as_deref(), Some("1080p"));
        assert_eq!(result.quality.source.as_deref(), Some("WEB-DL"));
        assert!(result.is_parseable());
    }

    #[test]
    fn test_parse_multi_episode_range() {
        let result =
            parse_episode("Star Trek- Deep Space Nine - S01E01-E02 - Emissary 960p.mkv");
        assert_eq!(result.season_number, Some(1));
        assert_eq!(result.episode_numbers, vec![1, 2]);
    }

    #[test]
    fn test_parse_multi_episode_run() {
        let result = parse_episode("Show.S02E05E06.720p.HDTV.mkv");
        assert_eq!(result.season_number, Some(2));
        assert_eq!(result.episode_numbers, vec![5, 6]);
        assert_eq!(result.quality.source.as_deref(), Some("HDTV"));
    }

    #[test]
    fn test_parse_nxnn() {
        let result = parse_episode("The.Wire.3x08.Moral.Midgetry.720p.mkv");
        assert_eq!(result.show_name.as_deref(), Some("The Wire"));
        assert_eq!(result.season_number, Some(3));
        assert_eq!(result.episode_numbers, vec![8]);
    }

    #[test]
    fn test_parse_verbose() {
        let result = parse_episode("Firefly Season 1 Episode 11 Trash.avi");
        assert_eq!(result.show_name.as_deref(), Some("Firefly"));
        assert_eq!(result.season_number, Some(1));
        assert_eq!(result.episode_numbers, vec![11]);
    }

    #[test]
    fn test_sxxexx_takes_priority_over_nxnn() {
        // "2x" inside the title must not shadow the explicit S/E marker
        let result = parse_episode("Show 2x Faster S03E04.mkv");
        assert_eq!(result.season_number, Some(3));
        assert_eq!(result.episode_numbers, vec![4]);
    }

    #[test]
    fn test_unparseable_filename() {
        let result = parse_episode("Some Random Documentary.mkv");
        assert!(!result.is_parseable());
        assert!(result.episode_numbers.is_empty());
    }

    #[test]
    fn test_year_extraction() {
        let result = parse_episode("Fallout.2024.S01E03.2160p.WEB-DL.mkv");
        assert_eq!(result.year, Some(2024));
        assert_eq!(result.quality.resolution.as_deref(), Some("2160p"));
    }

    #[test]
    fn test_clean_show_name_strips_year_and_country() {
        assert_eq!(clean_show_name("The Office (US) (2005)"), "The Office");
        assert_eq!(clean_show_name("Shameless.US"), "Shameless");
    }

    #[test]
    fn test_normalize_show_name() {
        assert_eq!(normalize_show_name("The Office (US)"), "office us");
        assert_eq!(normalize_show_name("Grey's Anatomy"), "greys anatomy");
    }

    #[test]
    fn test_quality_label() {
        let q = parse_quality("Show S01E01 1080p BluRay x264.mkv");
        assert_eq!(q.label().as_deref(), Some("1080p BluRay"));

        let none = parse_quality("Show S01E01.mkv");
        assert_eq!(none.label(), None);
    }
}
