// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::tags::Tags;

/// Lifecycle marker of a tracked episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EpisodeState {
    New,
    Downloaded,
    Listened,
    /// The user decided not to listen to this episode
    Marked,
}

impl EpisodeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EpisodeState::New => "new",
            EpisodeState::Downloaded => "downloaded",
            EpisodeState::Listened => "listened",
            EpisodeState::Marked => "marked",
        }
    }
}

impl fmt::Display for EpisodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A state change requested by a command or by a completed download
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Downloaded,
    Listened,
    Mark,
    Unmark,
}

impl Transition {
    pub const ALL: [Transition; 4] = [
        Transition::Downloaded,
        Transition::Listened,
        Transition::Mark,
        Transition::Unmark,
    ];
}

/// One tracked episode of a podcast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub id: String,
    pub title: String,
    /// Download location of the audio file
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode_number: Option<u32>,
    state: EpisodeState,
    /// State to restore when a `Marked` episode is unmarked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    marked_from: Option<EpisodeState>,
    #[serde(default)]
    pub tags: Tags,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloaded_at: Option<DateTime<Utc>>,
}

impl EpisodeRecord {
    /// Create a fresh episode in the `New` state with no tags
    pub fn new(id: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: url.into(),
            published_at: None,
            description: None,
            episode_number: None,
            state: EpisodeState::New,
            marked_from: None,
            tags: Tags::new(),
            created_at: Utc::now(),
            downloaded_at: None,
        }
    }

    pub fn state(&self) -> EpisodeState {
        self.state
    }

    pub fn is_new(&self) -> bool {
        self.state == EpisodeState::New
    }

    /// Apply a transition. Re-applying a transition is a no-op.
    ///
    /// Returns whether anything changed.
    pub fn apply(&mut self, transition: Transition) -> bool {
        let before = (self.state, self.marked_from, self.downloaded_at);

        match transition {
            Transition::Downloaded => {
                match self.state {
                    EpisodeState::New => self.state = EpisodeState::Downloaded,
                    EpisodeState::Marked if self.marked_from == Some(EpisodeState::New) => {
                        self.marked_from = Some(EpisodeState::Downloaded);
                    }
                    _ => {}
                }
                if self.downloaded_at.is_none() {
                    self.downloaded_at = Some(Utc::now());
                }
            }
            Transition::Listened => {
                self.state = EpisodeState::Listened;
                self.marked_from = None;
            }
            Transition::Mark => {
                if self.state != EpisodeState::Marked {
                    self.marked_from = Some(self.state);
                    self.state = EpisodeState::Marked;
                }
            }
            Transition::Unmark => {
                if self.state == EpisodeState::Marked {
                    self.state = self.marked_from.take().unwrap_or(EpisodeState::New);
                }
            }
        }

        before != (self.state, self.marked_from, self.downloaded_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn episode_in(state: EpisodeState) -> EpisodeRecord {
        let mut episode = EpisodeRecord::new("ep", "Episode", "https://example.com/ep.mp3");
        match state {
            EpisodeState::New => {}
            EpisodeState::Downloaded => {
                episode.apply(Transition::Downloaded);
            }
            EpisodeState::Listened => {
                episode.apply(Transition::Listened);
            }
            EpisodeState::Marked => {
                episode.apply(Transition::Mark);
            }
        }
        episode
    }

    const ALL_STATES: [EpisodeState; 4] = [
        EpisodeState::New,
        EpisodeState::Downloaded,
        EpisodeState::Listened,
        EpisodeState::Marked,
    ];

    #[test]
    fn new_episode_starts_new_without_tags() {
        let episode = EpisodeRecord::new("a", "A", "https://example.com/a.mp3");
        assert_eq!(episode.state(), EpisodeState::New);
        assert!(episode.tags.is_empty());
        assert!(episode.downloaded_at.is_none());
    }

    #[test]
    fn every_transition_is_idempotent_from_every_state() {
        for state in ALL_STATES {
            for transition in Transition::ALL {
                let mut once = episode_in(state);
                once.apply(transition);

                let mut twice = once.clone();
                let changed = twice.apply(transition);

                assert!(!changed, "{transition:?} from {state:?} changed on re-apply");
                assert_eq!(once, twice, "{transition:?} from {state:?}");
            }
        }
    }

    #[test]
    fn download_moves_new_to_downloaded() {
        let mut episode = episode_in(EpisodeState::New);
        assert!(episode.apply(Transition::Downloaded));
        assert_eq!(episode.state(), EpisodeState::Downloaded);
        assert!(episode.downloaded_at.is_some());
    }

    #[test]
    fn download_keeps_listened() {
        let mut episode = episode_in(EpisodeState::Listened);
        episode.apply(Transition::Downloaded);
        assert_eq!(episode.state(), EpisodeState::Listened);
    }

    #[test]
    fn listened_is_reachable_from_new_and_downloaded() {
        for state in [EpisodeState::New, EpisodeState::Downloaded] {
            let mut episode = episode_in(state);
            episode.apply(Transition::Listened);
            assert_eq!(episode.state(), EpisodeState::Listened);
        }
    }

    #[test]
    fn mark_is_reversible_to_prior_state() {
        for state in [
            EpisodeState::New,
            EpisodeState::Downloaded,
            EpisodeState::Listened,
        ] {
            let mut episode = episode_in(state);
            episode.apply(Transition::Mark);
            assert_eq!(episode.state(), EpisodeState::Marked);

            episode.apply(Transition::Unmark);
            assert_eq!(episode.state(), state);
        }
    }

    #[test]
    fn download_while_marked_advances_the_remembered_state() {
        let mut episode = episode_in(EpisodeState::Marked);
        episode.apply(Transition::Downloaded);
        assert_eq!(episode.state(), EpisodeState::Marked);

        episode.apply(Transition::Unmark);
        assert_eq!(episode.state(), EpisodeState::Downloaded);
    }

    #[test]
    fn listening_clears_the_mark() {
        let mut episode = episode_in(EpisodeState::Marked);
        episode.apply(Transition::Listened);
        assert_eq!(episode.state(), EpisodeState::Listened);

        assert!(!episode.apply(Transition::Unmark));
        assert_eq!(episode.state(), EpisodeState::Listened);
    }

    #[test]
    fn marked_state_survives_serialization() {
        let mut episode = episode_in(EpisodeState::Downloaded);
        episode.apply(Transition::Mark);

        let json = serde_json::to_string(&episode).unwrap();
        assert!(json.contains(r#""state":"marked""#));
        assert!(json.contains(r#""marked_from":"downloaded""#));

        let mut restored: EpisodeRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, episode);
        restored.apply(Transition::Unmark);
        assert_eq!(restored.state(), EpisodeState::Downloaded);
    }
}
