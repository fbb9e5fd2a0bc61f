use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use console::Emoji;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use pod_store::{
    Config, DownloadOptions, EpisodeFilter, EpisodeRecord, EpisodeSelection, EpisodeState,
    GitStorage, NoopReporter, Operation, PodcastRecord, ProgressEvent, ProgressReporter,
    ReqwestClient, RssFeedFetcher, SharedProgressReporter, Store, SyncCoordinator, TagFilter,
    Transition, Unversioned, VersionedStorage, bulk, download_new_episodes, mark_episodes,
    refresh_podcasts, select_podcasts, untag_episodes,
};

// Emoji with fallback for terminals without Unicode support
static MICROPHONE: Emoji<'_, '_> = Emoji("🎙️  ", "");
static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "[~] ");
static HEADPHONES: Emoji<'_, '_> = Emoji("🎧 ", "[i] ");
static DOWNLOAD: Emoji<'_, '_> = Emoji("📥 ", "[v] ");
static SUCCESS: Emoji<'_, '_> = Emoji("✅ ", "[+] ");
static FAILURE: Emoji<'_, '_> = Emoji("❌ ", "[!] ");
static PARTY: Emoji<'_, '_> = Emoji("🎉 ", "[*] ");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "x ");

/// Track podcast subscriptions and episode state in a git-synchronized store
#[derive(Parser, Debug)]
#[command(name = "pod-store")]
#[command(about = "Track podcast subscriptions and episode state in a git-synchronized store")]
#[command(version)]
struct Cli {
    /// Store directory (overrides config file and POD_STORE_PATH)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Config file (default: ~/.config/pod-store/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Push the store after a successful command
    #[arg(long, global = true)]
    push: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - suppress progress output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new store
    Init {
        /// Track the store with git
        #[arg(long)]
        git: bool,
        /// Remote to add as `origin` (implies --git)
        #[arg(long)]
        git_url: Option<String>,
    },

    /// Subscribe to a podcast and fetch its episodes
    Add {
        name: String,
        /// RSS feed URL or path to local RSS file
        feed: String,
    },

    /// Unsubscribe from a podcast
    Rm { name: String },

    /// Rename a podcast
    Mv { old: String, new: String },

    /// Fetch feeds and merge new episodes
    Refresh {
        #[arg(short, long)]
        podcast: Option<String>,
        #[command(flatten)]
        tags: TagArgs,
    },

    /// List podcasts with new episodes, or episodes
    ///
    /// Naming a podcast or filtering by episode tags lists episodes.
    Ls {
        /// List episodes instead of podcasts
        #[arg(short, long)]
        episodes: bool,
        #[arg(short, long)]
        podcast: Option<String>,
        /// Everything, not only new episodes
        #[arg(short, long)]
        all: bool,
        #[command(flatten)]
        tags: TagArgs,
        #[command(flatten)]
        episode_tags: EpisodeTagArgs,
    },

    /// Change the state of one episode, or of many with --bulk
    Mark {
        #[arg(value_enum)]
        state: MarkState,
        /// Podcast of the episode; limits --bulk to this podcast
        #[arg(required_unless_present = "bulk")]
        podcast: Option<String>,
        #[arg(required_unless_present = "bulk", conflicts_with = "bulk")]
        episode: Option<String>,
        /// Mark every selected episode
        #[arg(long)]
        bulk: bool,
        #[command(flatten)]
        tags: TagArgs,
        #[command(flatten)]
        episode_tags: EpisodeTagArgs,
    },

    /// Tag a podcast, or one of its episodes
    Tag {
        podcast: String,
        tag: String,
        #[arg(short, long)]
        episode: Option<String>,
    },

    /// Remove a tag from a podcast, or one of its episodes
    Untag {
        podcast: String,
        tag: String,
        #[arg(short, long)]
        episode: Option<String>,
    },

    /// Remove a tag from every episode carrying it
    UntagEpisodes {
        tag: String,
        #[arg(short, long)]
        podcast: Option<String>,
        #[command(flatten)]
        tags: TagArgs,
        #[command(flatten)]
        episode_tags: EpisodeTagArgs,
    },

    /// Download new episodes
    Download {
        #[arg(short, long)]
        podcast: Option<String>,
        #[command(flatten)]
        tags: TagArgs,
        #[command(flatten)]
        episode_tags: EpisodeTagArgs,
        /// Maximum number of episodes to download
        #[arg(short, long)]
        limit: Option<usize>,
        /// Maximum number of concurrent downloads
        #[arg(short = 'c', long, default_value = "3")]
        concurrent: usize,
    },

    /// Push local commits to the remote
    Push,

    /// Run git inside the store directory
    Git {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        args: Vec<String>,
    },
}

#[derive(Args, Debug, Default)]
struct TagArgs {
    /// Only podcasts with this tag (repeatable)
    #[arg(short = 't', long = "tagged")]
    tagged: Vec<String>,
    /// Only podcasts without this tag (repeatable)
    #[arg(short = 'T', long = "untagged")]
    untagged: Vec<String>,
}

impl TagArgs {
    fn filter(&self) -> TagFilter {
        tag_filter(&self.tagged, &self.untagged)
    }
}

#[derive(Args, Debug, Default)]
struct EpisodeTagArgs {
    /// Only episodes with this tag (repeatable)
    #[arg(long = "episode-tagged", value_name = "TAG")]
    tagged: Vec<String>,
    /// Only episodes without this tag (repeatable)
    #[arg(long = "episode-untagged", value_name = "TAG")]
    untagged: Vec<String>,
}

impl EpisodeTagArgs {
    fn filter(&self) -> TagFilter {
        tag_filter(&self.tagged, &self.untagged)
    }

    fn is_empty(&self) -> bool {
        self.tagged.is_empty() && self.untagged.is_empty()
    }
}

fn tag_filter(tagged: &[String], untagged: &[String]) -> TagFilter {
    let filter = tagged
        .iter()
        .fold(TagFilter::any(), |f, t| f.tagged(t.as_str()));
    untagged.iter().fold(filter, |f, t| f.untagged(t.as_str()))
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum MarkState {
    Listened,
    Marked,
    Unmarked,
}

impl MarkState {
    fn as_str(self) -> &'static str {
        match self {
            MarkState::Listened => "listened",
            MarkState::Marked => "marked",
            MarkState::Unmarked => "unmarked",
        }
    }
}

impl From<MarkState> for Transition {
    fn from(state: MarkState) -> Self {
        match state {
            MarkState::Listened => Transition::Listened,
            MarkState::Marked => Transition::Mark,
            MarkState::Unmarked => Transition::Unmark,
        }
    }
}

/// Progress reporter using indicatif for terminal output
struct IndicatifReporter {
    multi: MultiProgress,
    bars: Mutex<HashMap<usize, ProgressBar>>,
    main_bar: ProgressBar,
}

impl IndicatifReporter {
    fn new() -> Self {
        let multi = MultiProgress::new();

        let main_style = ProgressStyle::default_spinner()
            .template("{spinner:.green} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());

        let main_bar = multi.add(ProgressBar::new_spinner());
        main_bar.set_style(main_style);
        main_bar.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            multi,
            bars: Mutex::new(HashMap::new()),
            main_bar,
        }
    }

    fn get_or_create_bar(&self, download_id: usize) -> ProgressBar {
        let Ok(mut bars) = self.bars.lock() else {
            return ProgressBar::hidden();
        };

        if let Some(bar) = bars.get(&download_id) {
            return bar.clone();
        }

        let style = ProgressStyle::default_bar()
            .template(&format!(
                "  {DOWNLOAD}[{{bar:30.cyan/blue}}] {{bytes}}/{{total_bytes}} {{wide_msg}}"
            ))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");

        let bar = self.multi.add(ProgressBar::new(0));
        bar.set_style(style);
        bars.insert(download_id, bar.clone());
        bar
    }

    fn finish_bar(&self, download_id: usize) {
        if let Ok(mut bars) = self.bars.lock()
            && let Some(bar) = bars.remove(&download_id)
        {
            bar.finish_and_clear();
        }
    }
}

impl ProgressReporter for IndicatifReporter {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::FetchingFeed { podcast, source } => {
                self.main_bar.set_message(format!(
                    "{SEARCH}Fetching {}: {}",
                    podcast.bold(),
                    source.cyan()
                ));
            }

            ProgressEvent::FeedReconciled {
                podcast,
                total_episodes,
                new_episodes,
            } => {
                self.main_bar.println(format!(
                    "{HEADPHONES}{} • {} episodes total, {} new",
                    podcast.bold().green(),
                    total_episodes.to_string().cyan(),
                    new_episodes.to_string().yellow()
                ));
            }

            ProgressEvent::FeedFailed { podcast, error } => {
                self.main_bar.println(format!(
                    "{FAILURE}{} - {}",
                    podcast.red().bold(),
                    error.red()
                ));
            }

            ProgressEvent::RefreshCompleted {
                refreshed_count,
                failed_count,
                new_episodes,
            } => {
                self.main_bar.finish_and_clear();
                println!(
                    "\n{PARTY}{} {} refreshed, {} new episodes, {} failed",
                    "Refresh complete:".bold().green(),
                    refreshed_count.to_string().green().bold(),
                    new_episodes.to_string().yellow(),
                    colored_count(failed_count)
                );
            }

            ProgressEvent::DownloadStarting {
                download_id,
                episode_title,
                episode_index,
                total_to_download,
                content_length,
            } => {
                let bar = self.get_or_create_bar(download_id);
                bar.set_length(content_length.unwrap_or(0));
                bar.set_position(0);
                bar.set_message(format!(
                    "[{}/{}] {}",
                    (episode_index + 1).to_string().cyan(),
                    total_to_download.to_string().cyan(),
                    truncate_title(&episode_title, 40)
                ));
            }

            ProgressEvent::DownloadProgress {
                download_id,
                bytes_downloaded,
                total_bytes,
                ..
            } => {
                let bar = self.get_or_create_bar(download_id);
                if let Some(total) = total_bytes {
                    bar.set_length(total);
                }
                bar.set_position(bytes_downloaded);
            }

            ProgressEvent::DownloadCompleted {
                download_id,
                episode_title,
                ..
            } => {
                self.main_bar.println(format!(
                    "{SUCCESS}{}",
                    truncate_title(&episode_title, 60).green()
                ));
                self.finish_bar(download_id);
            }

            ProgressEvent::DownloadFailed {
                download_id,
                episode_title,
                error,
            } => {
                self.main_bar.println(format!(
                    "{FAILURE}{} - {}",
                    truncate_title(&episode_title, 30).red(),
                    error.red()
                ));
                self.finish_bar(download_id);
            }

            ProgressEvent::PartialFilesCleanedUp { count } => {
                self.main_bar.println(format!(
                    "{} removed {count} incomplete download(s)",
                    "Cleanup:".dimmed()
                ));
            }

            ProgressEvent::DownloadsCompleted {
                downloaded_count,
                failed_count,
            } => {
                self.main_bar.finish_and_clear();
                println!(
                    "\n{PARTY}{} {} downloaded, {} failed",
                    "Download complete:".bold().green(),
                    downloaded_count.to_string().green().bold(),
                    colored_count(failed_count)
                );
            }
        }
    }
}

fn colored_count(count: usize) -> colored::ColoredString {
    if count > 0 {
        count.to_string().red().bold()
    } else {
        count.to_string().green()
    }
}

fn truncate_title(title: &str, max_len: usize) -> String {
    if title.chars().count() <= max_len {
        title.to_string()
    } else {
        let cut: String = title.chars().take(max_len.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

/// Everything a command needs, resolved once from config and flags
struct App {
    config: Config,
    coordinator: SyncCoordinator<Box<dyn VersionedStorage>>,
    client: ReqwestClient,
    reporter: SharedProgressReporter,
    quiet: bool,
}

impl App {
    fn new(config: Config, quiet: bool) -> Result<Self> {
        let store_config = config.store();
        let storage: Box<dyn VersionedStorage> = if GitStorage::is_repository(&store_config.root) {
            Box::new(GitStorage::new(&store_config.root))
        } else {
            Box::new(Unversioned)
        };
        let client = ReqwestClient::with_timeout(config.request_timeout())
            .context("Failed to set up the HTTP client")?;
        let reporter: SharedProgressReporter = if quiet {
            NoopReporter::shared()
        } else {
            Arc::new(IndicatifReporter::new())
        };

        Ok(Self {
            coordinator: SyncCoordinator::new(store_config, storage),
            config,
            client,
            reporter,
            quiet,
        })
    }

    fn say(&self, message: impl std::fmt::Display) {
        if !self.quiet {
            println!("{message}");
        }
    }

    fn git(&self) -> Result<GitStorage> {
        let root = &self.config.store_path;
        if !GitStorage::is_repository(root) {
            bail!("The store at {} is not tracked with git", root.display());
        }
        Ok(GitStorage::new(root))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(store) = cli.store {
        config.store_path = store;
    }

    if let Command::Init { git, git_url } = &cli.command {
        return init(&config, *git, git_url.as_deref(), cli.quiet);
    }

    let app = App::new(config, cli.quiet)?;
    let mutated = run(&app, cli.command).await?;

    if mutated && cli.push {
        app.coordinator.push().context("Failed to push the store")?;
        app.say(format!("{SUCCESS}Pushed store changes."));
    }

    Ok(())
}

fn init(config: &Config, git: bool, git_url: Option<&str>, quiet: bool) -> Result<()> {
    let store_config = config.store();
    Store::init(&store_config).context("Failed to create the store")?;

    if git || git_url.is_some() {
        let storage = GitStorage::init(&store_config.root, git_url)
            .context("Failed to set up git in the store")?;
        storage
            .commit("Initialized store.")
            .context("Failed to commit the new store")?;
    }

    if !quiet {
        println!(
            "\n{MICROPHONE}{} {}",
            "Store created:".bold().green(),
            store_config.file_path().display().to_string().cyan()
        );
        println!(
            "Episodes will be downloaded to {}\n",
            config.downloads_path.display().to_string().cyan()
        );
    }
    Ok(())
}

/// Run a command; returns whether the store was changed and committed
async fn run(app: &App, command: Command) -> Result<bool> {
    match command {
        Command::Init { .. } => Ok(false),

        Command::Add { name, feed } => {
            let fetcher = RssFeedFetcher::new(app.client.clone());
            let mut session = app.coordinator.begin()?;
            session.store_mut().add_podcast(&name, &feed)?;
            let report = refresh_podcasts(
                session.store_mut(),
                &fetcher,
                std::slice::from_ref(&name),
                &app.reporter,
            )
            .await;
            session.commit(&Operation::AddPodcast { name: name.clone() })?;

            if report.failed.is_empty() {
                app.say(format!("{SUCCESS}Added podcast: {}", name.bold()));
            } else {
                app.say(format!(
                    "{FAILURE}Added podcast {}, but its feed could not be fetched yet",
                    name.bold()
                ));
            }
            Ok(true)
        }

        Command::Rm { name } => {
            app.coordinator.run(
                &Operation::RemovePodcast { name: name.clone() },
                |store| -> Result<()> {
                    store.remove_podcast(&name)?;
                    Ok(())
                },
            )?;
            app.say(format!("{SUCCESS}Removed podcast: {}", name.bold()));
            Ok(true)
        }

        Command::Mv { old, new } => {
            app.coordinator.run(
                &Operation::RenamePodcast {
                    old: old.clone(),
                    new: new.clone(),
                },
                |store| -> Result<()> {
                    store.rename_podcast(&old, &new)?;
                    Ok(())
                },
            )?;
            app.say(format!("{SUCCESS}Renamed {} -> {}", old.bold(), new.bold()));
            Ok(true)
        }

        Command::Refresh { podcast, tags } => {
            let fetcher = RssFeedFetcher::new(app.client.clone());
            let mut session = app.coordinator.begin()?;
            let names = select_podcasts(session.store(), podcast.as_deref(), &tags.filter())?;
            let report = refresh_podcasts(session.store_mut(), &fetcher, &names, &app.reporter).await;
            session.commit(&Operation::Refresh { podcast })?;

            print_failures(app, "Failed feeds:", &report.failed);
            if report.is_complete_failure() {
                bail!("No feed could be refreshed");
            }
            Ok(true)
        }

        Command::Ls {
            episodes,
            podcast,
            all,
            tags,
            episode_tags,
        } => {
            // Listing reads the working copy as is, without pulling
            let store = Store::open(app.coordinator.config())?;
            if episodes || podcast.is_some() || !episode_tags.is_empty() {
                let selection = EpisodeSelection {
                    podcast,
                    podcast_tags: tags.filter(),
                    episodes: EpisodeFilter {
                        tags: episode_tags.filter(),
                        state: (!all).then_some(EpisodeState::New),
                    },
                };
                list_episodes(&selection.select(&store)?);
            } else {
                for name in select_podcasts(&store, None, &tags.filter())? {
                    let record = store.podcast(&name)?;
                    if all || record.has_new_episodes() {
                        list_podcast(record);
                    }
                }
            }
            Ok(false)
        }

        Command::Mark {
            state,
            podcast,
            bulk: true,
            tags,
            episode_tags,
            ..
        } => {
            let transition = Transition::from(state);
            let selection = EpisodeSelection {
                podcast: podcast.clone(),
                podcast_tags: tags.filter(),
                episodes: EpisodeFilter {
                    tags: episode_tags.filter(),
                    state: bulk::candidate_state(transition),
                },
            };
            let changed = app.coordinator.run(
                &Operation::MarkEpisodes {
                    podcast,
                    transition,
                },
                |store| -> Result<_> { Ok(mark_episodes(store, &selection, transition)?) },
            )?;
            app.say(format!(
                "{SUCCESS}{} episode(s) now {}",
                changed.len().to_string().bold(),
                state.as_str()
            ));
            Ok(true)
        }

        Command::Mark {
            state,
            podcast,
            episode,
            ..
        } => {
            let (Some(podcast), Some(episode)) = (podcast, episode) else {
                bail!("Name a podcast and an episode, or use --bulk");
            };
            let transition = Transition::from(state);
            let changed = app.coordinator.run(
                &Operation::MarkEpisode {
                    podcast: podcast.clone(),
                    episode: episode.clone(),
                    transition,
                },
                |store| -> Result<bool> {
                    Ok(store.episode_mut(&podcast, &episode)?.apply(transition))
                },
            )?;
            let word = state.as_str();
            if changed {
                app.say(format!("{SUCCESS}Episode {} is now {word}", episode.bold()));
            } else {
                app.say(format!("Episode {} was already {word}", episode.bold()).dimmed());
            }
            Ok(true)
        }

        Command::Tag {
            podcast,
            tag,
            episode,
        } => tag_command(app, podcast, tag, episode, false),

        Command::Untag {
            podcast,
            tag,
            episode,
        } => tag_command(app, podcast, tag, episode, true),

        Command::UntagEpisodes {
            tag,
            podcast,
            tags,
            episode_tags,
        } => {
            let selection = EpisodeSelection {
                podcast: podcast.clone(),
                podcast_tags: tags.filter(),
                episodes: EpisodeFilter {
                    tags: episode_tags.filter().tagged(tag.as_str()),
                    state: None,
                },
            };
            let changed = app.coordinator.run(
                &Operation::UntagEpisodes {
                    podcast,
                    tag: tag.clone(),
                },
                |store| -> Result<_> { Ok(untag_episodes(store, &selection, &tag)?) },
            )?;
            app.say(format!(
                "{SUCCESS}Removed {} from {} episode(s)",
                tag.bold(),
                changed.len().to_string().bold()
            ));
            Ok(true)
        }

        Command::Download {
            podcast,
            tags,
            episode_tags,
            limit,
            concurrent,
        } => {
            let mut session = app.coordinator.begin()?;
            let names = select_podcasts(session.store(), podcast.as_deref(), &tags.filter())?;
            let options = DownloadOptions {
                limit,
                max_concurrent: concurrent,
                episode_tags: episode_tags.filter(),
            };
            let report = download_new_episodes(
                &app.client,
                session.store_mut(),
                &names,
                &app.config.downloads_path,
                &options,
                app.reporter.clone(),
            )
            .await;
            session.commit(&Operation::Download { podcast })?;

            print_failures(app, "Failed episodes:", &report.failed);
            if report.downloaded.is_empty() && !report.failed.is_empty() {
                bail!("No episode could be downloaded");
            }
            Ok(true)
        }

        Command::Push => {
            app.coordinator.push().context("Failed to push the store")?;
            app.say(format!("{SUCCESS}Pushed store changes."));
            Ok(false)
        }

        Command::Git { args } => {
            let args: Vec<&str> = args.iter().map(String::as_str).collect();
            let output = app.git()?.run(&args)?;
            print!("{output}");
            Ok(false)
        }
    }
}

fn tag_command(
    app: &App,
    podcast: String,
    tag: String,
    episode: Option<String>,
    removed: bool,
) -> Result<bool> {
    let operation = Operation::Tag {
        podcast: podcast.clone(),
        episode: episode.clone(),
        tag: tag.clone(),
        removed,
    };

    let changed = app.coordinator.run(&operation, |store| -> Result<bool> {
        let tags = match &episode {
            Some(id) => &mut store.episode_mut(&podcast, id)?.tags,
            None => &mut store.podcast_mut(&podcast)?.tags,
        };
        Ok(if removed {
            tags.remove(&tag)
        } else {
            tags.insert(tag.as_str())
        })
    })?;

    if changed {
        app.say(format!("{SUCCESS}{operation}"));
    } else {
        app.say(format!("Nothing to do: {operation}").dimmed());
    }
    Ok(true)
}

fn print_failures(app: &App, heading: &str, failures: &[(String, String)]) {
    if app.quiet || failures.is_empty() {
        return;
    }
    println!("\n{}", heading.red().bold());
    for (name, error) in failures {
        println!("  {CROSS}{} - {}", name.yellow(), error.dimmed());
    }
}

fn format_tags<'a>(tags: impl Iterator<Item = &'a str>) -> String {
    let tags: Vec<&str> = tags.collect();
    if tags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", tags.join(", ")).dimmed().to_string()
    }
}

fn list_podcast(podcast: &PodcastRecord) {
    let new = podcast.count_in_state(pod_store::EpisodeState::New);
    let title = podcast
        .title
        .as_deref()
        .filter(|t| *t != podcast.name)
        .map(|t| format!(" ({t})").dimmed().to_string())
        .unwrap_or_default();
    println!(
        "{}{title}{} {}",
        podcast.name.bold(),
        format_tags(podcast.tags.iter()),
        format!("[{new} new]").yellow()
    );
}

fn list_episodes(selected: &[(&PodcastRecord, &EpisodeRecord)]) {
    let mut current: Option<&str> = None;
    for (podcast, episode) in selected {
        if current != Some(podcast.name.as_str()) {
            println!("{}", podcast.name.bold().magenta());
            current = Some(podcast.name.as_str());
        }
        let date = episode
            .published_at
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "undated".to_string());
        println!(
            "  {} {:<10} {} {}{}",
            episode.id.cyan(),
            episode.state().to_string(),
            date.dimmed(),
            truncate_title(&episode.title, 60),
            format_tags(episode.tags.iter())
        );
    }
}
