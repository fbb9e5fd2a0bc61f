use std::path::{Path, PathBuf};

use crate::model::EpisodeRecord;

/// Maximum length for the title portion of a filename
const MAX_TITLE_LENGTH: usize = 100;

const AUDIO_EXTENSIONS: [&str; 8] = ["mp3", "m4a", "mp4", "aac", "ogg", "opus", "wav", "flac"];

/// Directory episodes of `podcast` are downloaded into
pub fn podcast_download_dir(downloads_root: &Path, podcast: &str) -> PathBuf {
    let name = sanitize_filename::sanitize(podcast);
    let name = if name.trim().is_empty() {
        "podcast".to_string()
    } else {
        name
    };
    downloads_root.join(name)
}

/// Filename stem for an episode, without extension
///
/// Episodes numbered by their feed sort by that number ("0042-title"),
/// otherwise by publication date ("2024-01-15-title", "undated-title").
pub fn episode_filename_stem(episode: &EpisodeRecord) -> String {
    let prefix = match (episode.episode_number, episode.published_at) {
        (Some(number), _) => format!("{number:04}"),
        (None, Some(date)) => date.format("%Y-%m-%d").to_string(),
        (None, None) => "undated".to_string(),
    };

    let title = clean_title(&episode.title);
    if title.is_empty() {
        format!("{prefix}-{}", episode.id)
    } else {
        format!("{prefix}-{title}")
    }
}

/// Audio extension taken from the download URL, `mp3` when unknown
pub fn audio_extension(episode: &EpisodeRecord) -> String {
    url::Url::parse(&episode.url)
        .ok()
        .and_then(|url| {
            url.path_segments()
                .and_then(|mut segments| segments.next_back())
                .and_then(|file| file.rsplit_once('.'))
                .map(|(_, ext)| ext.to_lowercase())
        })
        .filter(|ext| AUDIO_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or_else(|| "mp3".to_string())
}

pub fn episode_filename(episode: &EpisodeRecord) -> String {
    format!(
        "{}.{}",
        episode_filename_stem(episode),
        audio_extension(episode)
    )
}

/// Filename with the episode id appended to the stem, for episodes whose
/// plain filename is already taken
pub fn episode_filename_with_id(episode: &EpisodeRecord) -> String {
    format!(
        "{}-{}.{}",
        episode_filename_stem(episode),
        episode.id,
        audio_extension(episode)
    )
}

/// Lowercase the title, turn everything but ASCII letters and digits into
/// single dashes, and cut it at a dash near `MAX_TITLE_LENGTH`.
fn clean_title(title: &str) -> String {
    let mut cleaned = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            cleaned.push(c.to_ascii_lowercase());
        } else if !cleaned.ends_with('-') {
            cleaned.push('-');
        }
    }
    let cleaned = cleaned.trim_matches('-');

    if cleaned.len() <= MAX_TITLE_LENGTH {
        return cleaned.to_string();
    }

    let truncated = &cleaned[..MAX_TITLE_LENGTH];
    match truncated.rfind('-') {
        Some(pos) if pos > MAX_TITLE_LENGTH / 2 => truncated[..pos].to_string(),
        _ => truncated.trim_end_matches('-').to_string(),
    }
}
