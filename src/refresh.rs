// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::feed::{FeedFetcher, ParsedFeed};
use crate::model::{PodcastRecord, TagFilter};
use crate::progress::{ProgressEvent, SharedProgressReporter};
use crate::reconcile::reconcile;
use crate::store::Store;

/// Outcome of a batch refresh
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Podcasts whose feed was fetched and merged
    pub refreshed: Vec<String>,
    /// Podcasts whose feed could not be fetched (name, error message)
    pub failed: Vec<(String, String)>,
    /// Episodes created by this refresh across all podcasts
    pub new_episodes: usize,
}

impl RefreshReport {
    pub fn is_complete_failure(&self) -> bool {
        self.refreshed.is_empty() && !self.failed.is_empty()
    }
}

/// Resolve the podcasts a command applies to
///
/// A named podcast must exist; otherwise every podcast matching `tags` is
/// selected, in name order.
pub fn select_podcasts(
    store: &Store,
    podcast: Option<&str>,
    tags: &TagFilter,
) -> Result<Vec<String>, StoreError> {
    match podcast {
        Some(name) => Ok(vec![store.podcast(name)?.name.clone()]),
        None => Ok(store.filter(tags).map(|p| p.name.clone()).collect()),
    }
}

/// Fetch and reconcile the feeds of `names`
///
/// Feeds are processed one at a time. A failing fetch is recorded and leaves
/// that podcast untouched; the remaining podcasts are still refreshed.
pub async fn refresh_podcasts<F: FeedFetcher + ?Sized>(
    store: &mut Store,
    fetcher: &F,
    names: &[String],
    reporter: &SharedProgressReporter,
) -> RefreshReport {
    let mut report = RefreshReport::default();

    for name in names {
        let source = match store.podcast(name) {
            Ok(podcast) => podcast.feed_url.clone(),
            Err(e) => {
                warn!(podcast = %name, error = %e, "skipping refresh");
                report.failed.push((name.clone(), e.to_string()));
                continue;
            }
        };

        reporter.report(ProgressEvent::FetchingFeed {
            podcast: name.clone(),
            source: source.clone(),
        });

        let feed = match fetcher.fetch(&source).await {
            Ok(feed) => feed,
            Err(e) => {
                warn!(podcast = %name, error = %e, "feed fetch failed");
                reporter.report(ProgressEvent::FeedFailed {
                    podcast: name.clone(),
                    error: e.to_string(),
                });
                report.failed.push((name.clone(), e.to_string()));
                continue;
            }
        };

        let Ok(podcast) = store.podcast_mut(name) else {
            continue;
        };
        let added = apply_feed(podcast, feed);
        debug!(podcast = %name, new_episodes = added, "refreshed");

        reporter.report(ProgressEvent::FeedReconciled {
            podcast: name.clone(),
            total_episodes: podcast.episodes.len(),
            new_episodes: added,
        });
        report.new_episodes += added;
        report.refreshed.push(name.clone());
    }

    info!(
        refreshed = report.refreshed.len(),
        failed = report.failed.len(),
        new_episodes = report.new_episodes,
        "refresh finished"
    );
    reporter.report(ProgressEvent::RefreshCompleted {
        refreshed_count: report.refreshed.len(),
        failed_count: report.failed.len(),
        new_episodes: report.new_episodes,
    });

    report
}

/// Merge a fetched feed into `podcast`, returning the number of new episodes
fn apply_feed(podcast: &mut PodcastRecord, feed: ParsedFeed) -> usize {
    let before = podcast.episodes.len();
    let episodes = std::mem::take(&mut podcast.episodes);
    podcast.episodes = reconcile(episodes, &feed.entries);

    let title = feed.title.trim();
    if !title.is_empty() {
        podcast.title = Some(title.to_string());
    }
    podcast.refreshed_at = Some(Utc::now());

    podcast.episodes.len() - before
}
