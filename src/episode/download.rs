use std::path::{Path, PathBuf};

use futures::StreamExt;
use sha2::{Digest, Sha256};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::DownloadError;
use crate::http::HttpClient;
use crate::progress::{ProgressEvent, SharedProgressReporter};

/// Suffix of files that are still being written
pub const PARTIAL_SUFFIX: &str = "partial";

/// Context for tracking a download in concurrent scenarios
#[derive(Debug, Clone)]
pub struct DownloadContext {
    /// Slot ID (0 to max_concurrent-1) for progress bar management
    pub download_id: usize,
    /// Index of this episode in the download queue
    pub episode_index: usize,
    /// Total number of episodes to download
    pub total_to_download: usize,
}

/// A finished download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResult {
    pub path: PathBuf,
    pub bytes_downloaded: u64,
    /// "sha256:<hex>" of the file content
    pub content_hash: String,
}

/// Sibling path a download is streamed to before being renamed into place
pub fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(PARTIAL_SUFFIX);
    path.with_file_name(name)
}

/// Delete `.partial` files left in `dir` by interrupted downloads
///
/// Returns how many were removed. A missing directory counts as clean.
pub fn cleanup_partial_files(dir: &Path) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };

    let suffix = format!(".{PARTIAL_SUFFIX}");
    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        let is_partial = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(&suffix));
        if !is_partial {
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) => warn!(path = %path.display(), error = %e, "could not remove partial download"),
        }
    }
    removed
}

/// Download `url` to `output_path`
///
/// The body is streamed into a `.partial` sibling which is renamed to
/// `output_path` once complete, so `output_path` only ever holds a full file.
pub async fn download_episode<C: HttpClient + ?Sized>(
    client: &C,
    url: &str,
    episode_title: &str,
    output_path: &Path,
    context: &DownloadContext,
    reporter: &SharedProgressReporter,
) -> Result<DownloadResult, DownloadError> {
    let temp_path = partial_path(output_path);
    let result = stream_to_file(client, url, episode_title, &temp_path, context, reporter).await;

    let (bytes_downloaded, content_hash) = match result {
        Ok(done) => done,
        Err(e) => {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e);
        }
    };

    tokio::fs::rename(&temp_path, output_path)
        .await
        .map_err(|e| DownloadError::RenameFailed {
            from: temp_path.clone(),
            to: output_path.to_path_buf(),
            source: e,
        })?;
    debug!(path = %output_path.display(), bytes = bytes_downloaded, "download finished");

    reporter.report(ProgressEvent::DownloadCompleted {
        download_id: context.download_id,
        episode_title: episode_title.to_string(),
        bytes_downloaded,
    });

    Ok(DownloadResult {
        path: output_path.to_path_buf(),
        bytes_downloaded,
        content_hash,
    })
}

async fn stream_to_file<C: HttpClient + ?Sized>(
    client: &C,
    url: &str,
    episode_title: &str,
    path: &Path,
    context: &DownloadContext,
    reporter: &SharedProgressReporter,
) -> Result<(u64, String), DownloadError> {
    let response = client
        .get_stream(url)
        .await
        .map_err(|e| DownloadError::HttpFailed {
            url: url.to_string(),
            source: e,
        })?;

    if response.is_error() {
        return Err(DownloadError::HttpStatus {
            url: url.to_string(),
            status: response.status,
        });
    }

    reporter.report(ProgressEvent::DownloadStarting {
        download_id: context.download_id,
        episode_title: episode_title.to_string(),
        episode_index: context.episode_index,
        total_to_download: context.total_to_download,
        content_length: response.content_length,
    });

    let write_err = |e| DownloadError::FileWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    let mut file = File::create(path)
        .await
        .map_err(|e| DownloadError::FileCreateFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    let mut hasher = Sha256::new();
    let mut bytes_downloaded: u64 = 0;
    let mut stream = response.body;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| DownloadError::StreamFailed {
            url: url.to_string(),
            source: e,
        })?;

        file.write_all(&chunk).await.map_err(write_err)?;
        hasher.update(&chunk);
        bytes_downloaded += chunk.len() as u64;

        reporter.report(ProgressEvent::DownloadProgress {
            download_id: context.download_id,
            episode_title: episode_title.to_string(),
            bytes_downloaded,
            total_bytes: response.content_length,
        });
    }

    file.flush().await.map_err(write_err)?;
    file.sync_all().await.map_err(write_err)?;

    Ok((bytes_downloaded, format!("sha256:{:x}", hasher.finalize())))
}
