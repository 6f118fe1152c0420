//! Engine services

pub mod catalog;
pub mod file_utils;
pub mod filename_parser;
pub mod locks;
pub mod matcher;
pub mod rate_limiter;
pub mod renamer;
pub mod scanner;
pub mod sync;

pub use catalog::{CatalogClient, StaticCatalog, TvMazeClient};
pub use locks::SeriesLockMap;
pub use matcher::{FolderScanner, SeriesMatcher, UnmappedFolder};
pub use rate_limiter::{RateLimitConfig, RateLimitedClient, RetryConfig};
pub use renamer::{RenameEngine, RenameError, RenameOutcome};
pub use scanner::{EpisodeFileScanner, ScanSummary};
pub use sync::{SeriesMapping, SyncCoordinator};
