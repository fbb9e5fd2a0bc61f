pub mod bulk;
pub mod config;
pub mod episode;
pub mod error;
pub mod feed;
pub mod http;
pub mod model;
pub mod progress;
pub mod reconcile;
pub mod refresh;
pub mod store;
pub mod sync;
pub mod vcs;

// Re-export main types for convenience
pub use bulk::{EpisodeSelection, candidate_state, mark_episodes, untag_episodes};
pub use config::{Config, StoreConfig};
pub use episode::{DownloadOptions, DownloadReport, download_new_episodes};
pub use error::{ConfigError, DownloadError, FeedError, StoreError, SyncError, VcsError};
pub use feed::{FeedEntry, FeedFetcher, ParsedFeed, RssFeedFetcher, is_url, parse_feed};
pub use http::{HttpClient, HttpResponse, ReqwestClient};
pub use model::{EpisodeRecord, EpisodeState, PodcastRecord, TagFilter, Tags, Transition};
pub use progress::{NoopReporter, ProgressEvent, ProgressReporter, SharedProgressReporter};
pub use reconcile::{episode_id, reconcile};
pub use refresh::{RefreshReport, refresh_podcasts, select_podcasts};
pub use store::{EpisodeFilter, Store};
pub use sync::{Operation, Session, SyncCoordinator};
pub use vcs::{GitStorage, Unversioned, VersionedStorage};
