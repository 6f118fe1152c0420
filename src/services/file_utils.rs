//! File classification and naming helpers

use std::path::Path;

/// Video file extensions we recognize
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "m4v", "mov", "wmv", "flv", "webm", "mpeg", "mpg", "ts", "m2ts",
];

/// Check if a path has a recognized video extension
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Check if a filename looks like a sample clip
pub fn is_sample_file(filename: &str) -> bool {
    filename.to_lowercase().contains("sample")
}

/// Sanitize a string for use as a file or folder name
pub fn sanitize_for_filename(name: &str) -> String {
    sanitize_filename::sanitize(name)
}

/// Path of an episode file relative to its series folder.
///
/// The series-root prefix and any leading/trailing separators are stripped;
/// an absent file renders as the empty string.
pub fn relative_episode_path(file_path: Option<&str>, series_path: &str) -> String {
    let Some(file_path) = file_path else {
        return String::new();
    };

    file_path
        .replace(series_path, "")
        .trim_matches(['/', '\\'])
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_video_file() {
        assert!(is_video_file(Path::new("/tv/Show/S01E01.mkv")));
        assert!(is_video_file(Path::new("episode.MP4")));
        assert!(!is_video_file(Path::new("episode.nfo")));
        assert!(!is_video_file(Path::new("no-extension")));
    }

    #[test]
    fn test_is_sample_file() {
        assert!(is_sample_file("sample.mkv"));
        assert!(is_sample_file("Show-SAMPLE.mkv"));
        assert!(!is_sample_file("Show.S01E01.mkv"));
    }

    #[test]
    fn test_relative_episode_path_strips_root_and_separator() {
        assert_eq!(
            relative_episode_path(
                Some("/tv/The Office (US)/Season 01/ep.mkv"),
                "/tv/The Office (US)"
            ),
            "Season 01/ep.mkv"
        );
    }

    #[test]
    fn test_relative_episode_path_absent_file() {
        assert_eq!(relative_episode_path(None, "/tv/The Office (US)"), "");
    }

    #[test]
    fn test_relative_episode_path_no_leading_separator() {
        let rel = relative_episode_path(Some("/tv/Show/Season 02/ep.mkv"), "/tv/Show");
        assert!(!rel.starts_with('/'));
        assert!(!rel.starts_with('\\'));
        assert!(!rel.contains("/tv/Show"));
    }
}
