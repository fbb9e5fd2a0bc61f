use std::sync::Arc;

/// Events emitted while refreshing feeds and downloading episodes
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// A subscription's feed is being fetched
    FetchingFeed { podcast: String, source: String },

    /// A fetched feed has been merged into the store
    FeedReconciled {
        podcast: String,
        total_episodes: usize,
        new_episodes: usize,
    },

    /// Fetching or parsing a feed failed; the subscription was left untouched
    FeedFailed { podcast: String, error: String },

    /// All requested subscriptions were processed
    RefreshCompleted {
        refreshed_count: usize,
        failed_count: usize,
        new_episodes: usize,
    },

    /// A download is starting
    DownloadStarting {
        /// Identifies the download slot (0 to max_concurrent-1)
        download_id: usize,
        episode_title: String,
        /// Index of this episode in the download queue
        episode_index: usize,
        /// Total number of episodes to download
        total_to_download: usize,
        /// Expected content length in bytes, if known
        content_length: Option<u64>,
    },

    /// Download progress update
    DownloadProgress {
        download_id: usize,
        episode_title: String,
        bytes_downloaded: u64,
        total_bytes: Option<u64>,
    },

    /// A download completed and was moved into place
    DownloadCompleted {
        download_id: usize,
        episode_title: String,
        bytes_downloaded: u64,
    },

    /// A download failed; the episode stays `new`
    DownloadFailed {
        download_id: usize,
        episode_title: String,
        error: String,
    },

    /// Leftover `.partial` files from interrupted downloads were removed
    PartialFilesCleanedUp { count: usize },

    /// All queued downloads finished
    DownloadsCompleted {
        downloaded_count: usize,
        failed_count: usize,
    },
}

/// Trait for reporting progress events.
///
/// Implementations can use this to display progress bars, log messages,
/// or collect statistics.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// A shared reference to a progress reporter
pub type SharedProgressReporter = Arc<dyn ProgressReporter>;

/// A no-op progress reporter that silently ignores all events.
/// Useful for tests or quiet mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _event: ProgressEvent) {}
}

impl NoopReporter {
    /// Create a new NoopReporter wrapped in an Arc
    pub fn shared() -> SharedProgressReporter {
        Arc::new(Self)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingReporter;
    use super::*;

    #[test]
    fn noop_reporter_accepts_events() {
        let reporter = NoopReporter::shared();
        reporter.report(ProgressEvent::FetchingFeed {
            podcast: "Foo".to_string(),
            source: "https://example.com/feed.xml".to_string(),
        });
        reporter.report(ProgressEvent::RefreshCompleted {
            refreshed_count: 1,
            failed_count: 0,
            new_episodes: 2,
        });
    }

    #[test]
    fn recording_reporter_keeps_order() {
        let reporter = RecordingReporter::shared();
        reporter.report(ProgressEvent::PartialFilesCleanedUp { count: 2 });
        reporter.report(ProgressEvent::DownloadsCompleted {
            downloaded_count: 1,
            failed_count: 0,
        });

        let events = reporter.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[0],
            ProgressEvent::PartialFilesCleanedUp { count: 2 }
        ));
    }
}
