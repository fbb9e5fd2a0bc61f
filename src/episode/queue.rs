// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::DownloadError;
use crate::http::HttpClient;
use crate::model::{EpisodeState, TagFilter, Transition};
use crate::progress::{ProgressEvent, SharedProgressReporter};
use crate::store::{EpisodeFilter, Store};

use super::download::{DownloadContext, DownloadResult, cleanup_partial_files, download_episode};
use super::filename::{episode_filename, episode_filename_with_id, podcast_download_dir};

/// Options for batch downloads
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Maximum number of episodes to download (None = all)
    pub limit: Option<usize>,
    /// Maximum number of concurrent downloads
    pub max_concurrent: usize,
    /// Only episodes whose tags match
    pub episode_tags: TagFilter,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            limit: None,
            max_concurrent: 3,
            episode_tags: TagFilter::any(),
        }
    }
}

/// Result of a batch download
#[derive(Debug, Clone, Default)]
pub struct DownloadReport {
    /// (podcast, episode id, file) of every episode now marked downloaded
    pub downloaded: Vec<(String, String, PathBuf)>,
    /// (episode title, error message) of every failed download
    pub failed: Vec<(String, String)>,
    /// Leftover partial files removed before downloading
    pub partial_files_cleaned: usize,
}

/// One queued episode download
#[derive(Debug, Clone)]
struct DownloadJob {
    podcast: String,
    episode_id: String,
    title: String,
    url: String,
    output_path: PathBuf,
}

/// Download every `new` episode of `podcasts` and mark it downloaded
///
/// Episodes are queued per podcast, newest first. A failing download leaves
/// its episode `new` and does not stop the rest of the batch. The store is
/// only modified in memory; flushing is up to the caller.
pub async fn download_new_episodes<C: HttpClient + Clone + 'static>(
    client: &C,
    store: &mut Store,
    podcasts: &[String],
    downloads_root: &Path,
    options: &DownloadOptions,
    reporter: SharedProgressReporter,
) -> DownloadReport {
    let mut report = DownloadReport::default();
    let mut jobs = Vec::new();
    let wanted = EpisodeFilter {
        tags: options.episode_tags.clone(),
        state: Some(EpisodeState::New),
    };
    let mut taken = HashSet::new();

    for name in podcasts {
        let Ok(podcast) = store.podcast(name) else {
            continue;
        };
        let dir = podcast_download_dir(downloads_root, name);
        report.partial_files_cleaned += cleanup_partial_files(&dir);

        for episode in podcast.episodes_newest_first() {
            if !wanted.matches(episode) {
                continue;
            }
            // Shared numbers or same-day titles must not share a file
            let mut output_path = dir.join(episode_filename(episode));
            if !taken.insert(output_path.clone()) {
                output_path = dir.join(episode_filename_with_id(episode));
                taken.insert(output_path.clone());
            }
            jobs.push(DownloadJob {
                podcast: name.clone(),
                episode_id: episode.id.clone(),
                title: episode.title.clone(),
                url: episode.url.clone(),
                output_path,
            });
        }
    }

    if report.partial_files_cleaned > 0 {
        reporter.report(ProgressEvent::PartialFilesCleanedUp {
            count: report.partial_files_cleaned,
        });
    }

    if let Some(limit) = options.limit {
        jobs.truncate(limit);
    }
    let total_to_download = jobs.len();

    // The slot pool limits concurrency and hands out stable slot IDs
    let max_concurrent = options.max_concurrent.max(1);
    let (slot_tx, mut slot_rx) = tokio::sync::mpsc::channel(max_concurrent);
    for slot in 0..max_concurrent {
        let _ = slot_tx.try_send(slot);
    }

    let mut handles = Vec::with_capacity(total_to_download);
    for (episode_index, job) in jobs.into_iter().enumerate() {
        // Acquire a slot before spawning so episodes start in queue order
        let Some(download_id) = slot_rx.recv().await else {
            break;
        };

        let slot_tx = slot_tx.clone();
        let client = client.clone();
        let reporter = reporter.clone();

        handles.push(tokio::spawn(async move {
            let context = DownloadContext {
                download_id,
                episode_index,
                total_to_download,
            };
            let result = run_job(&client, &job, &context, &reporter).await;
            if let Err(e) = &result {
                reporter.report(ProgressEvent::DownloadFailed {
                    download_id,
                    episode_title: job.title.clone(),
                    error: e.to_string(),
                });
            }

            let _ = slot_tx.send(download_id).await;
            (job, result)
        }));
    }

    for handle in handles {
        match handle.await {
            Ok((job, Ok(download))) => {
                match store.episode_mut(&job.podcast, &job.episode_id) {
                    Ok(episode) => {
                        episode.apply(Transition::Downloaded);
                    }
                    Err(e) => warn!(error = %e, "downloaded episode vanished from the store"),
                }
                info!(
                    podcast = %job.podcast,
                    episode = %job.episode_id,
                    hash = %download.content_hash,
                    "episode downloaded"
                );
                report
                    .downloaded
                    .push((job.podcast, job.episode_id, download.path));
            }
            Ok((job, Err(e))) => {
                warn!(podcast = %job.podcast, episode = %job.episode_id, error = %e, "download failed");
                report.failed.push((job.title, e.to_string()));
            }
            Err(e) => {
                warn!(error = %e, "download task did not finish");
                report.failed.push(("<unknown>".to_string(), e.to_string()));
            }
        }
    }

    reporter.report(ProgressEvent::DownloadsCompleted {
        downloaded_count: report.downloaded.len(),
        failed_count: report.failed.len(),
    });

    report
}

async fn run_job<C: HttpClient>(
    client: &C,
    job: &DownloadJob,
    context: &DownloadContext,
    reporter: &SharedProgressReporter,
) -> Result<DownloadResult, DownloadError> {
    if let Some(dir) = job.output_path.parent() {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| DownloadError::FileCreateFailed {
                path: dir.to_path_buf(),
                source: e,
            })?;
    }
    download_episode(
        client,
        &job.url,
        &job.title,
        &job.output_path,
        context,
        reporter,
    )
    .await
}
