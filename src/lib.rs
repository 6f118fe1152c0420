//! Curator engine - series sync, scan and rename for a personal media library.
//!
//! The engine reconciles folders on disk against an external metadata catalog,
//! imports newly discovered series, scans episode media files into tracked
//! records, and renames files to a canonical layout. HTTP routing and view
//! rendering live in a separate crate and consume the [`Engine`] facade.

pub mod config;
#[cfg(feature = "sqlite")]
pub mod db;
pub mod engine;
pub mod logging;
pub mod model;
pub mod services;
pub mod store;

pub use config::Config;
pub use engine::Engine;
pub use services::catalog::{
    CatalogCandidate, CatalogClient, CatalogEpisode, CatalogSeriesDetail, StaticCatalog,
    TvMazeClient,
};
pub use services::matcher::{FolderScanner, SeriesMatcher, UnmappedFolder};
pub use services::renamer::{RenameEngine, RenameError, RenameOutcome};
pub use services::scanner::{EpisodeFileScanner, ScanSummary};
pub use services::sync::{SeriesMapping, SyncCoordinator};
