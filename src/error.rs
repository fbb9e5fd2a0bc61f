// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when fetching or parsing RSS feeds
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Failed to fetch feed from {url}: {source}")]
    FetchFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to read feed file {path}: {source}")]
    FileReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse RSS feed: {0}")]
    ParseFailed(#[from] rss::Error),

    #[error("Invalid feed URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Episode '{title}' has no enclosure (audio file)")]
    MissingEnclosure { title: String },

    #[error("Episode '{title}' has no guid, link or enclosure to identify it")]
    MissingIdentifier { title: String },
}

/// Errors that can occur during episode downloads
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("HTTP request failed for {url}: {source}")]
    HttpFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Failed to create file {path}: {source}")]
    FileCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write to file {path}: {source}")]
    FileWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Stream error while downloading {url}: {source}")]
    StreamFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to move {from} into place at {to}: {source}")]
    RenameFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by the podcast store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store has not been set up at {0}. See the `init` command.")]
    StoreNotFound(PathBuf),

    #[error("Store already initialized: {0}")]
    StoreExists(PathBuf),

    #[error("Store file {path} is corrupt: {reason}")]
    StoreCorrupt { path: PathBuf, reason: String },

    #[error("Podcast not found: {0}")]
    PodcastNotFound(String),

    #[error("Episode not found: {podcast} -> {episode}")]
    EpisodeNotFound { podcast: String, episode: String },

    #[error("Podcast with name already exists: {0}")]
    DuplicateName(String),

    #[error("Failed to read store file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write store file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create directory {path}: {source}")]
    CreateDirectoryFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize store: {0}")]
    SerializeFailed(#[source] serde_json::Error),
}

impl StoreError {
    /// Whether this error names a podcast or episode that could not be resolved
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::PodcastNotFound(_) | StoreError::EpisodeNotFound { .. }
        )
    }
}

/// Errors reported by the versioned-storage backend
#[derive(Error, Debug)]
pub enum VcsError {
    #[error("Merge conflict while pulling: {0}")]
    Conflict(String),

    #[error("Remote error: {0}")]
    Remote(String),

    #[error("git {command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("Failed to run git {command}: {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Top-level errors for store-mutating commands
#[derive(Error, Debug)]
pub enum SyncError {
    #[error(
        "Pulling remote changes produced a conflict; resolve it manually in the store \
         (e.g. with `pod-store git status`) and retry: {0}"
    )]
    Conflict(String),

    #[error("Push failed: {0}")]
    Remote(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Version control error: {0}")]
    Vcs(VcsError),
}

impl From<VcsError> for SyncError {
    fn from(err: VcsError) -> Self {
        match err {
            VcsError::Conflict(detail) => SyncError::Conflict(detail),
            VcsError::Remote(detail) => SyncError::Remote(detail),
            other => SyncError::Vcs(other),
        }
    }
}

/// Errors that can occur while loading the configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not determine the home directory")]
    NoHomeDir,

    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
