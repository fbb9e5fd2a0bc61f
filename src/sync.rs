// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::error::SyncError;
use crate::model::Transition;
use crate::store::Store;
use crate::vcs::VersionedStorage;

/// A store-mutating command, used to describe the resulting commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    AddPodcast {
        name: String,
    },
    RemovePodcast {
        name: String,
    },
    RenamePodcast {
        old: String,
        new: String,
    },
    Refresh {
        podcast: Option<String>,
    },
    Download {
        podcast: Option<String>,
    },
    MarkEpisode {
        podcast: String,
        episode: String,
        transition: Transition,
    },
    MarkEpisodes {
        podcast: Option<String>,
        transition: Transition,
    },
    Tag {
        podcast: String,
        episode: Option<String>,
        tag: String,
        removed: bool,
    },
    UntagEpisodes {
        podcast: Option<String>,
        tag: String,
    },
}

fn scope(podcast: &Option<String>) -> String {
    match podcast {
        Some(name) => format!("'{name}'"),
        None => "all podcasts".to_string(),
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::AddPodcast { name } => write!(f, "Added podcast: {name}."),
            Operation::RemovePodcast { name } => write!(f, "Removed podcast: {name}."),
            Operation::RenamePodcast { old, new } => {
                write!(f, "Renamed podcast: {old} -> {new}.")
            }
            Operation::Refresh { podcast } => write!(f, "Refreshed {}.", scope(podcast)),
            Operation::Download { podcast } => {
                write!(f, "Downloaded new episodes for {}.", scope(podcast))
            }
            Operation::MarkEpisode {
                podcast,
                episode,
                transition,
            } => match transition {
                Transition::Unmark => write!(f, "Unmarked episode {episode} of '{podcast}'."),
                Transition::Listened => {
                    write!(f, "Marked episode {episode} of '{podcast}' as listened.")
                }
                Transition::Mark => write!(f, "Marked episode {episode} of '{podcast}' as marked."),
                Transition::Downloaded => {
                    write!(f, "Marked episode {episode} of '{podcast}' as downloaded.")
                }
            },
            Operation::MarkEpisodes {
                podcast,
                transition,
            } => {
                let target = scope(podcast);
                match transition {
                    Transition::Unmark => write!(f, "Unmarked episodes of {target}."),
                    Transition::Listened => {
                        write!(f, "Marked episodes of {target} as listened.")
                    }
                    Transition::Mark => write!(f, "Marked episodes of {target} as marked."),
                    Transition::Downloaded => {
                        write!(f, "Marked episodes of {target} as downloaded.")
                    }
                }
            }
            Operation::UntagEpisodes { podcast, tag } => {
                let target = podcast
                    .as_deref()
                    .map_or_else(|| "all".to_string(), |name| format!("'{name}'"));
                write!(f, "Untagged {target} podcast episodes -> {tag}.")
            }
            Operation::Tag {
                podcast,
                episode,
                tag,
                removed,
            } => {
                let verb = if *removed { "Untagged" } else { "Tagged" };
                match episode {
                    Some(id) => write!(f, "{verb} '{podcast}', episode {id} -> {tag}."),
                    None => write!(f, "{verb} '{podcast}' -> {tag}."),
                }
            }
        }
    }
}

/// Runs store mutations inside a pull → mutate → flush → commit envelope
///
/// Pushing is never implicit; call [`SyncCoordinator::push`] to publish
/// accumulated commits.
pub struct SyncCoordinator<V> {
    config: StoreConfig,
    storage: V,
}

impl<V: VersionedStorage> SyncCoordinator<V> {
    pub fn new(config: StoreConfig, storage: V) -> Self {
        Self { config, storage }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn storage(&self) -> &V {
        &self.storage
    }

    /// Pull remote changes and open the store from the merged working copy
    ///
    /// A merge conflict aborts here, before any mutation can happen.
    pub fn begin(&self) -> Result<Session<'_, V>, SyncError> {
        self.storage.pull().map_err(|e| {
            warn!(error = %e, "pull failed, aborting command");
            SyncError::from(e)
        })?;
        let store = Store::open(&self.config)?;
        Ok(Session {
            coordinator: self,
            store,
        })
    }

    /// Run `body` against a freshly pulled store and commit its changes
    ///
    /// If `body` fails nothing is flushed or committed.
    pub fn run<T, E, F>(&self, operation: &Operation, body: F) -> Result<T, E>
    where
        F: FnOnce(&mut Store) -> Result<T, E>,
        E: From<SyncError>,
    {
        let mut session = self.begin()?;
        let value = body(session.store_mut())?;
        session.commit(operation)?;
        Ok(value)
    }

    /// Publish local commits
    pub fn push(&self) -> Result<(), SyncError> {
        self.storage.push()?;
        Ok(())
    }
}

/// An open store inside the sync envelope
///
/// Dropping a session without calling [`Session::commit`] discards its
/// in-memory changes.
pub struct Session<'a, V> {
    coordinator: &'a SyncCoordinator<V>,
    store: Store,
}

impl<V: VersionedStorage> Session<'_, V> {
    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    /// Flush the store and commit it with a message describing `operation`
    pub fn commit(self, operation: &Operation) -> Result<Store, SyncError> {
        self.store.flush()?;
        let message = operation.to_string();
        debug!(%message, "committing");
        self.coordinator.storage.commit(&message)?;
        Ok(self.store)
    }
}
