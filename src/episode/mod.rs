mod download;
mod filename;
mod queue;

pub use download::{
    DownloadContext, DownloadResult, cleanup_partial_files, download_episode, partial_path,
};
pub use filename::{
    audio_extension, episode_filename, episode_filename_stem, episode_filename_with_id,
    podcast_download_dir,
};
pub use queue::{DownloadOptions, DownloadReport, download_new_episodes};
