// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use tracing::debug;

use crate::error::StoreError;
use crate::model::{EpisodeRecord, EpisodeState, PodcastRecord, TagFilter, Transition};
use crate::store::{EpisodeFilter, Store};

/// Which episodes a listing or bulk command applies to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpisodeSelection {
    /// Restrict to one podcast; podcast tags are ignored when set
    pub podcast: Option<String>,
    pub podcast_tags: TagFilter,
    pub episodes: EpisodeFilter,
}

impl EpisodeSelection {
    /// Matching episodes, grouped by podcast in name order and newest first
    ///
    /// A named podcast must exist.
    pub fn select<'s>(
        &self,
        store: &'s Store,
    ) -> Result<Vec<(&'s PodcastRecord, &'s EpisodeRecord)>, StoreError> {
        let any = TagFilter::any();
        let podcast_tags = match &self.podcast {
            Some(name) => {
                store.podcast(name)?;
                &any
            }
            None => &self.podcast_tags,
        };

        Ok(store
            .filter_episodes(podcast_tags, &self.episodes)
            .filter(|(p, _)| self.podcast.as_ref().is_none_or(|name| &p.name == name))
            .collect())
    }

    fn ids(&self, store: &Store) -> Result<Vec<(String, String)>, StoreError> {
        Ok(self
            .select(store)?
            .into_iter()
            .map(|(p, e)| (p.name.clone(), e.id.clone()))
            .collect())
    }
}

/// State an episode must be in for a bulk `transition` to pick it up
///
/// Bulk marking only reaches episodes that are still waiting, bulk unmarking
/// only marked ones. Marking listened applies to every selected episode.
pub fn candidate_state(transition: Transition) -> Option<EpisodeState> {
    match transition {
        Transition::Mark | Transition::Downloaded => Some(EpisodeState::New),
        Transition::Unmark => Some(EpisodeState::Marked),
        Transition::Listened => None,
    }
}

/// Apply `transition` to every selected episode
///
/// Returns (podcast, episode id) of the episodes whose state changed.
pub fn mark_episodes(
    store: &mut Store,
    selection: &EpisodeSelection,
    transition: Transition,
) -> Result<Vec<(String, String)>, StoreError> {
    let mut changed = Vec::new();
    for (podcast, episode) in selection.ids(store)? {
        if store.episode_mut(&podcast, &episode)?.apply(transition) {
            changed.push((podcast, episode));
        }
    }
    debug!(?transition, count = changed.len(), "marked episodes");
    Ok(changed)
}

/// Remove `tag` from every selected episode carrying it
pub fn untag_episodes(
    store: &mut Store,
    selection: &EpisodeSelection,
    tag: &str,
) -> Result<Vec<(String, String)>, StoreError> {
    let mut changed = Vec::new();
    for (podcast, episode) in selection.ids(store)? {
        if store.episode_mut(&podcast, &episode)?.tags.remove(tag) {
            changed.push((podcast, episode));
        }
    }
    debug!(tag, count = changed.len(), "untagged episodes");
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use chrono::{TimeZone, Utc};
    use tempfile::{TempDir, tempdir};

    fn add_episode(store: &mut Store, podcast: &str, id: &str, day: u32, tags: &[&str]) {
        let mut episode = EpisodeRecord::new(id, id, format!("https://example.com/{id}.mp3"));
        episode.published_at = Some(Utc.with_ymd_and_hms(2024, 3, day, 8, 0, 0).unwrap());
        for tag in tags {
            episode.tags.insert(*tag);
        }
        store
            .podcast_mut(podcast)
            .unwrap()
            .episodes
            .insert(id.to_string(), episode);
    }

    /// "news" (tagged daily) with n1..n3 and "talk" with t1, t2
    fn store() -> (TempDir, Store) {
        let dir = tempdir().unwrap();
        let mut store = Store::init(&StoreConfig::new(dir.path())).unwrap();
        store
            .add_podcast("news", "https://example.com/news.xml")
            .unwrap()
            .tags
            .insert("daily");
        store.add_podcast("talk", "https://example.com/talk.xml").unwrap();
        add_episode(&mut store, "news", "n1", 1, &["queue"]);
        add_episode(&mut store, "news", "n2", 2, &[]);
        add_episode(&mut store, "news", "n3", 3, &["queue"]);
        add_episode(&mut store, "talk", "t1", 1, &["queue"]);
        add_episode(&mut store, "talk", "t2", 2, &[]);
        (dir, store)
    }

    fn selected(store: &Store, selection: &EpisodeSelection) -> Vec<String> {
        selection
            .select(store)
            .unwrap()
            .into_iter()
            .map(|(_, e)| e.id.clone())
            .collect()
    }

    #[test]
    fn episode_tags_select_across_podcasts_newest_first() {
        let (_dir, store) = store();
        let selection = EpisodeSelection {
            episodes: EpisodeFilter {
                tags: TagFilter::any().tagged("queue"),
                state: None,
            },
            ..Default::default()
        };

        assert_eq!(selected(&store, &selection), vec!["n3", "n1", "t1"]);
    }

    #[test]
    fn podcast_and_episode_tags_combine() {
        let (_dir, store) = store();
        let selection = EpisodeSelection {
            podcast_tags: TagFilter::any().untagged("daily"),
            episodes: EpisodeFilter {
                tags: TagFilter::any().untagged("queue"),
                state: None,
            },
            ..Default::default()
        };

        assert_eq!(selected(&store, &selection), vec!["t2"]);
    }

    #[test]
    fn named_podcast_ignores_podcast_tags() {
        let (_dir, store) = store();
        let selection = EpisodeSelection {
            podcast: Some("news".to_string()),
            podcast_tags: TagFilter::any().untagged("daily"),
            episodes: EpisodeFilter::any(),
        };

        assert_eq!(selected(&store, &selection), vec!["n3", "n2", "n1"]);
    }

    #[test]
    fn unknown_podcast_is_not_found() {
        let (_dir, store) = store();
        let selection = EpisodeSelection {
            podcast: Some("ghost".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            selection.select(&store),
            Err(StoreError::PodcastNotFound(_))
        ));
    }

    #[test]
    fn bulk_mark_respects_the_state_filter() {
        let (_dir, mut store) = store();
        store.episode_mut("talk", "t2").unwrap().apply(Transition::Mark);
        let selection = EpisodeSelection {
            episodes: EpisodeFilter::in_state(EpisodeState::New),
            ..Default::default()
        };

        let changed = mark_episodes(&mut store, &selection, Transition::Listened).unwrap();

        assert_eq!(changed.len(), 4);
        assert_eq!(
            store.podcast("news").unwrap().count_in_state(EpisodeState::Listened),
            3
        );
        let talk = store.podcast("talk").unwrap();
        assert_eq!(talk.episode("t1").unwrap().state(), EpisodeState::Listened);
        assert_eq!(talk.episode("t2").unwrap().state(), EpisodeState::Marked);
    }

    #[test]
    fn bulk_unmark_restores_marked_episodes_only() {
        let (_dir, mut store) = store();
        store.episode_mut("news", "n1").unwrap().apply(Transition::Mark);
        store.episode_mut("news", "n2").unwrap().apply(Transition::Listened);
        let selection = EpisodeSelection {
            episodes: EpisodeFilter::in_state(EpisodeState::Marked),
            ..Default::default()
        };
        assert_eq!(
            candidate_state(Transition::Unmark),
            Some(EpisodeState::Marked)
        );

        let changed = mark_episodes(&mut store, &selection, Transition::Unmark).unwrap();

        assert_eq!(changed, vec![("news".to_string(), "n1".to_string())]);
        let news = store.podcast("news").unwrap();
        assert_eq!(news.episode("n1").unwrap().state(), EpisodeState::New);
        assert_eq!(news.episode("n2").unwrap().state(), EpisodeState::Listened);
    }

    #[test]
    fn bulk_mark_is_idempotent() {
        let (_dir, mut store) = store();
        let selection = EpisodeSelection {
            podcast: Some("talk".to_string()),
            ..Default::default()
        };

        assert_eq!(
            mark_episodes(&mut store, &selection, Transition::Mark)
                .unwrap()
                .len(),
            2
        );
        assert!(
            mark_episodes(&mut store, &selection, Transition::Mark)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn untag_episodes_removes_tag_from_selected_podcast_only() {
        let (_dir, mut store) = store();
        let selection = EpisodeSelection {
            podcast: Some("news".to_string()),
            ..Default::default()
        };

        let changed = untag_episodes(&mut store, &selection, "queue").unwrap();

        assert_eq!(
            changed,
            vec![
                ("news".to_string(), "n3".to_string()),
                ("news".to_string(), "n1".to_string()),
            ]
        );
        assert!(!store.podcast("news").unwrap().episode("n1").unwrap().tags.contains("queue"));
        assert!(store.podcast("talk").unwrap().episode("t1").unwrap().tags.contains("queue"));
    }
}
