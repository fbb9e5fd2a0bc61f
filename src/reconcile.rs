// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Merging freshly fetched feed entries into stored episodes.
//!
//! The feed is the source of truth for episode metadata (title, download URL,
//! publication date, description). The store is the source of truth for
//! everything the user did: state and tags are never touched here. Episodes
//! that disappear from the feed are kept.

use std::collections::BTreeMap;

use chrono::Utc;
use sha2::{Digest, Sha256};

use crate::feed::FeedEntry;
use crate::model::{EpisodeRecord, Episodes};

/// Number of hex characters kept from the identity hash
const EPISODE_ID_LENGTH: usize = 12;

/// Derive the stable store id of a feed entry from its guid/link/enclosure
///
/// The id never depends on the entry's position in the feed, so re-fetching a
/// reordered or trimmed feed maps entries back to the same episodes.
pub fn episode_id(entry: &FeedEntry) -> String {
    let digest = Sha256::digest(entry.identity().trim().as_bytes());
    let hex = format!("{digest:x}");
    hex[..EPISODE_ID_LENGTH].to_string()
}

/// Merge `fetched` into `existing` and return the merged episode set
///
/// - known ids keep their state and tags; metadata is refreshed from the feed
/// - unknown ids become `New` episodes without tags
/// - ids missing from `fetched` are retained unchanged
/// - duplicate ids within `fetched` resolve to the last occurrence
pub fn reconcile(mut existing: Episodes, fetched: &[FeedEntry]) -> Episodes {
    let mut latest: BTreeMap<String, &FeedEntry> = BTreeMap::new();
    for entry in fetched {
        latest.insert(episode_id(entry), entry);
    }

    for (id, entry) in latest {
        match existing.get_mut(&id) {
            Some(episode) => refresh_metadata(episode, entry),
            None => {
                let mut episode = EpisodeRecord::new(id.clone(), "", "");
                refresh_metadata(&mut episode, entry);
                existing.insert(id, episode);
            }
        }
    }

    existing
}

fn refresh_metadata(episode: &mut EpisodeRecord, entry: &FeedEntry) {
    episode.title = entry.title.clone();
    episode.url = entry.enclosure_url.clone();
    episode.published_at = entry.published_at.map(|dt| dt.with_timezone(&Utc));
    episode.description = entry.description.clone();
    episode.episode_number = entry.episode_number;
}
