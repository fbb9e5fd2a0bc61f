// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::model::{EpisodeRecord, EpisodeState, PodcastRecord, TagFilter};

/// Suffix of the temporary file a flush writes before renaming it into place
const TEMP_SUFFIX: &str = "tmp";

/// Episode-level predicate used by [`Store::filter_episodes`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpisodeFilter {
    pub tags: TagFilter,
    pub state: Option<EpisodeState>,
}

impl EpisodeFilter {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn in_state(state: EpisodeState) -> Self {
        Self {
            tags: TagFilter::any(),
            state: Some(state),
        }
    }

    pub fn matches(&self, episode: &EpisodeRecord) -> bool {
        self.state.is_none_or(|s| episode.state() == s) && self.tags.matches(&episode.tags)
    }
}

/// All tracked podcasts, loaded from and flushed to one JSON file
///
/// Memory and disk agree at two points only: after [`Store::open`] and after
/// [`Store::flush`].
#[derive(Debug)]
pub struct Store {
    config: StoreConfig,
    podcasts: BTreeMap<String, PodcastRecord>,
}

impl Store {
    /// Create an empty store at the configured location
    pub fn init(config: &StoreConfig) -> Result<Self, StoreError> {
        let path = config.file_path();
        if path.exists() {
            return Err(StoreError::StoreExists(config.root.clone()));
        }

        std::fs::create_dir_all(&config.root).map_err(|e| StoreError::CreateDirectoryFailed {
            path: config.root.clone(),
            source: e,
        })?;

        let store = Self {
            config: config.clone(),
            podcasts: BTreeMap::new(),
        };
        store.flush()?;
        info!(path = %path.display(), "initialized store");
        Ok(store)
    }

    /// Load the store from disk
    ///
    /// Removes a leftover temporary file from an interrupted flush.
    pub fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        let podcasts = load_podcasts(config)?;
        debug!(podcasts = podcasts.len(), "opened store");
        Ok(Self {
            config: config.clone(),
            podcasts,
        })
    }

    /// Discard in-memory state and load again from disk
    pub fn reload(&mut self) -> Result<(), StoreError> {
        self.podcasts = load_podcasts(&self.config)?;
        Ok(())
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.podcasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.podcasts.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.podcasts.contains_key(name)
    }

    /// Subscribe to a new podcast with an empty episode set
    pub fn add_podcast(
        &mut self,
        name: &str,
        feed_url: &str,
    ) -> Result<&mut PodcastRecord, StoreError> {
        if self.podcasts.contains_key(name) {
            return Err(StoreError::DuplicateName(name.to_string()));
        }
        Ok(self
            .podcasts
            .entry(name.to_string())
            .or_insert_with(|| PodcastRecord::new(name, feed_url)))
    }

    /// Unsubscribe; the podcast disappears from the store file on the next flush
    pub fn remove_podcast(&mut self, name: &str) -> Result<PodcastRecord, StoreError> {
        self.podcasts
            .remove(name)
            .ok_or_else(|| StoreError::PodcastNotFound(name.to_string()))
    }

    /// Move a podcast to a new name. Either both keys change or neither does.
    pub fn rename_podcast(&mut self, old: &str, new: &str) -> Result<(), StoreError> {
        if self.podcasts.contains_key(new) {
            return Err(StoreError::DuplicateName(new.to_string()));
        }
        let mut podcast = self.remove_podcast(old)?;
        podcast.name = new.to_string();
        self.podcasts.insert(new.to_string(), podcast);
        Ok(())
    }

    pub fn podcast(&self, name: &str) -> Result<&PodcastRecord, StoreError> {
        self.podcasts
            .get(name)
            .ok_or_else(|| StoreError::PodcastNotFound(name.to_string()))
    }

    pub fn podcast_mut(&mut self, name: &str) -> Result<&mut PodcastRecord, StoreError> {
        self.podcasts
            .get_mut(name)
            .ok_or_else(|| StoreError::PodcastNotFound(name.to_string()))
    }

    pub fn episode_mut(
        &mut self,
        podcast: &str,
        episode: &str,
    ) -> Result<&mut EpisodeRecord, StoreError> {
        self.podcast_mut(podcast)?
            .episode_mut(episode)
            .ok_or_else(|| StoreError::EpisodeNotFound {
                podcast: podcast.to_string(),
                episode: episode.to_string(),
            })
    }

    /// All podcasts ordered by name
    pub fn podcasts(&self) -> impl Iterator<Item = &PodcastRecord> {
        self.podcasts.values()
    }

    /// Podcasts whose tags satisfy `filter`
    pub fn filter<'a>(
        &'a self,
        filter: &'a TagFilter,
    ) -> impl Iterator<Item = &'a PodcastRecord> + 'a {
        self.podcasts.values().filter(move |p| filter.matches(&p.tags))
    }

    /// Episodes matching `episodes` within podcasts matching `podcasts`
    ///
    /// Podcasts come in name order, each podcast's episodes newest first.
    pub fn filter_episodes<'s, 'f>(
        &'s self,
        podcasts: &'f TagFilter,
        episodes: &'f EpisodeFilter,
    ) -> impl Iterator<Item = (&'s PodcastRecord, &'s EpisodeRecord)> {
        self.podcasts
            .values()
            .filter(move |p| podcasts.matches(&p.tags))
            .flat_map(move |podcast| {
                podcast
                    .episodes_newest_first()
                    .into_iter()
                    .filter(move |e| episodes.matches(e))
                    .map(move |e| (podcast, e))
            })
    }

    /// Persist the full store as one write
    ///
    /// The data goes to a temporary sibling first and is renamed over the store
    /// file only once completely written, so a crash leaves either the old or
    /// the new store on disk.
    pub fn flush(&self) -> Result<(), StoreError> {
        let temp = self.write_temp()?;
        let path = self.config.file_path();
        std::fs::rename(&temp, &path).map_err(|e| StoreError::WriteFailed { path, source: e })?;
        debug!(podcasts = self.podcasts.len(), "flushed store");
        Ok(())
    }

    fn write_temp(&self) -> Result<PathBuf, StoreError> {
        let mut json =
            serde_json::to_string_pretty(&self.podcasts).map_err(StoreError::SerializeFailed)?;
        json.push('\n');

        let temp = temp_path(&self.config.file_path());
        let write_err = |e| StoreError::WriteFailed {
            path: temp.clone(),
            source: e,
        };

        let mut file = File::create(&temp).map_err(write_err)?;
        file.write_all(json.as_bytes()).map_err(write_err)?;
        file.sync_all().map_err(write_err)?;
        Ok(temp)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(TEMP_SUFFIX);
    path.with_file_name(name)
}

fn load_podcasts(config: &StoreConfig) -> Result<BTreeMap<String, PodcastRecord>, StoreError> {
    let path = config.file_path();

    let temp = temp_path(&path);
    if temp.exists() {
        match std::fs::remove_file(&temp) {
            Ok(()) => warn!(path = %temp.display(), "removed leftover file from an interrupted write"),
            Err(e) => warn!(path = %temp.display(), error = %e, "could not remove leftover temp file"),
        }
    }

    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StoreError::StoreNotFound(config.root.clone()));
        }
        Err(e) => return Err(StoreError::ReadFailed { path, source: e }),
    };

    let podcasts: BTreeMap<String, PodcastRecord> =
        serde_json::from_str(&content).map_err(|e| StoreError::StoreCorrupt {
            path: path.clone(),
            reason: e.to_string(),
        })?;

    for (name, podcast) in &podcasts {
        if &podcast.name != name {
            return Err(StoreError::StoreCorrupt {
                path,
                reason: format!("podcast stored under '{name}' is named '{}'", podcast.name),
            });
        }
        if let Some((id, _)) = podcast.episodes.iter().find(|(id, e)| **id != e.id) {
            return Err(StoreError::StoreCorrupt {
                path,
                reason: format!("episode key '{id}' of '{name}' does not match its id"),
            });
        }
    }

    Ok(podcasts)
}
