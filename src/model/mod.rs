mod episode;
mod podcast;
mod tags;

pub use episode::{EpisodeRecord, EpisodeState, Transition};
pub use podcast::{Episodes, PodcastRecord};
pub use tags::{TagFilter, Tags};
