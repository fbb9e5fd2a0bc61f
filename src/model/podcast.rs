// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::episode::{EpisodeRecord, EpisodeState};
use super::tags::Tags;

/// Episodes of a podcast keyed by their stable id
pub type Episodes = BTreeMap<String, EpisodeRecord>;

/// One tracked subscription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodcastRecord {
    /// User-assigned name, unique within the store
    pub name: String,
    /// HTTP(S) feed URL or path to a local feed file
    pub feed_url: String,
    /// Title as reported by the feed on the last refresh
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub tags: Tags,
    #[serde(default)]
    pub episodes: Episodes,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl PodcastRecord {
    pub fn new(name: impl Into<String>, feed_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            feed_url: feed_url.into(),
            title: None,
            tags: Tags::new(),
            episodes: Episodes::new(),
            created_at: Utc::now(),
            refreshed_at: None,
        }
    }

    pub fn episode(&self, id: &str) -> Option<&EpisodeRecord> {
        self.episodes.get(id)
    }

    pub fn episode_mut(&mut self, id: &str) -> Option<&mut EpisodeRecord> {
        self.episodes.get_mut(id)
    }

    /// Episodes ordered for presentation: newest publication first,
    /// undated episodes last.
    pub fn episodes_newest_first(&self) -> Vec<&EpisodeRecord> {
        let mut episodes: Vec<_> = self.episodes.values().collect();
        episodes.sort_by_key(|e| (e.published_at.is_none(), Reverse(e.published_at)));
        episodes
    }

    pub fn count_in_state(&self, state: EpisodeState) -> usize {
        self.episodes.values().filter(|e| e.state() == state).count()
    }

    pub fn has_new_episodes(&self) -> bool {
        self.episodes.values().any(EpisodeRecord::is_new)
    }
}
