//! Main entry point for the plexy CLI application.

use std::path::PathBuf;

use chrono::Utc;
use clap::{Args as ClapArgs, Parser, Subcommand};
use log::{debug, info, warn};

use plexy::api::PlexClient;
use plexy::apply;
use plexy::config::Config;
use plexy::error::Result;
use plexy::language::Language;
use plexy::library;
use plexy::types::{Age, AudioCodec, SubtitleCodec, Title, WatchingPreference};
use plexy::ui;

/// Command-line arguments for plexy.
#[derive(Parser, Debug)]
#[command(
    name = "plexy",
    version,
    about = "Set default audio and subtitle tracks on a Plex server",
    long_about = "Walk Plex libraries and select, for every movie and episode, the audio and \
                  subtitle tracks that match how you like to watch."
)]
struct Args {
    /// Plex server URL, e.g. http://localhost:32400
    #[arg(short, long)]
    url: Option<String>,

    /// Plex authentication token
    #[arg(short, long)]
    token: Option<String>,

    /// Config file (TOML, JSON or YAML); defaults to the user config dir
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log verbosity level: 0=error, 1=warn, 2=info, 3=debug, 4=trace
    #[arg(long, default_value_t = 2)]
    log: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply watching preferences to the matching movies and episodes
    Preferences(PreferencesArgs),
}

#[derive(ClapArgs, Debug)]
struct PreferencesArgs {
    /// Library to use (repeatable); all libraries when omitted
    #[arg(short = 'L', long = "library")]
    libraries: Vec<String>,

    /// Title filter, e.g. "Avatar (2009)" or "The Boys s02e03" (repeatable)
    #[arg(short = 't', long = "title", value_parser = parse_title)]
    titles: Vec<Title>,

    /// Desired language as an IETF tag, e.g. en or pt-BR
    #[arg(short, long, value_parser = parse_language)]
    language: Option<Language>,

    /// Accepted audio codec (repeatable)
    #[arg(short = 'a', long = "audio-codec", value_enum)]
    audio_codecs: Vec<AudioCodec>,

    /// Excluded audio codec (repeatable)
    #[arg(short = 'A', long = "excluded-audio-codec", value_enum)]
    excluded_audio_codecs: Vec<AudioCodec>,

    /// Accepted subtitle codec (repeatable)
    #[arg(short = 's', long = "subtitle-codec", value_enum)]
    subtitle_codecs: Vec<SubtitleCodec>,

    /// Excluded subtitle codec (repeatable)
    #[arg(short = 'S', long = "excluded-subtitle-codec", value_enum)]
    excluded_subtitle_codecs: Vec<SubtitleCodec>,

    /// Only items added within this age, e.g. 12h, 2d, 1w
    #[arg(short, long, value_parser = parse_age)]
    newer: Option<Age>,

    /// Only items added before this age
    #[arg(short, long, value_parser = parse_age)]
    older: Option<Age>,

    /// List every change, not only the counts
    #[arg(short, long)]
    full_summary: bool,

    /// Leave partially watched items alone
    #[arg(long)]
    skip_watching: bool,

    /// Keep the current tracks when they are as good as the best match
    #[arg(long)]
    keep_selected: bool,

    /// Select subtitles even when the audio is in the desired language
    #[arg(long)]
    force_subtitles: bool,

    /// Show what would change without saving anything
    #[arg(long)]
    dry_run: bool,

    /// Debug logging; hides the progress bar
    #[arg(long)]
    debug: bool,

    /// How you like to watch
    #[arg(value_enum)]
    watching_preference: Option<WatchingPreference>,
}

fn parse_title(value: &str) -> std::result::Result<Title, String> {
    value.parse().map_err(|e: plexy::error::AppError| e.to_string())
}

fn parse_language(value: &str) -> std::result::Result<Language, String> {
    Language::from_ietf(value).map_err(|e| e.to_string())
}

fn parse_age(value: &str) -> std::result::Result<Age, String> {
    value.parse().map_err(|e: plexy::error::AppError| e.to_string())
}

impl Args {
    /// The command line expressed as a config layer.
    fn to_config(&self) -> Config {
        let Command::Preferences(prefs) = &self.command;
        Config {
            url: self.url.clone(),
            token: self.token.clone(),
            library: prefs.libraries.clone(),
            title: prefs.titles.clone(),
            language: prefs.language.clone(),
            watching_preference: prefs.watching_preference,
            audio_codec: prefs.audio_codecs.clone(),
            excluded_audio_codec: prefs.excluded_audio_codecs.clone(),
            subtitle_codec: prefs.subtitle_codecs.clone(),
            excluded_subtitle_codec: prefs.excluded_subtitle_codecs.clone(),
            newer: prefs.newer.clone(),
            older: prefs.older.clone(),
            full_summary: prefs.full_summary,
            skip_watching: prefs.skip_watching,
            keep_selected: prefs.keep_selected,
            force_subtitles: prefs.force_subtitles,
            dry_run: prefs.dry_run,
        }
    }

    fn debug(&self) -> bool {
        let Command::Preferences(prefs) = &self.command;
        prefs.debug
    }
}

fn load_file_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Ok(Config::load().unwrap_or_else(|e| {
            warn!("Failed to load config: {}. Using defaults.", e);
            Config::default()
        })),
    }
}

async fn run(args: &Args) -> Result<()> {
    let config = load_file_config(args.config.as_ref())?
        .merge(args.to_config())
        .resolve()?;
    debug!("Using {:?}", config.settings);

    let client = PlexClient::connect(&config.settings).await?;

    let videos = library::search(&client, &config.criteria, Utc::now()).await?;
    if videos.is_empty() {
        println!("{}", ui::no_video_line(&config.criteria));
        return Ok(());
    }
    info!("Found {} videos {}", videos.len(), config.criteria);

    let bar = ui::progress_bar(videos.len() as u64, args.debug());
    let summary = apply::apply_all(
        &client,
        &videos,
        &config.preferences,
        config.dry_run,
        |video| {
            bar.set_message(video.to_display());
            bar.inc(1);
        },
    )
    .await;
    bar.finish_and_clear();
    let summary = summary?;

    for line in ui::count_lines(&summary) {
        println!("{}", line);
    }
    for change in summary.changes() {
        println!("{}", ui::change_line(change));
    }
    if config.dry_run {
        println!("Dry run: nothing was saved");
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug() {
        log::LevelFilter::Debug
    } else {
        match args.log {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Warn,
            2 => log::LevelFilter::Info,
            3 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .format_target(false)
        .init();

    debug!("Log level set to {:?}", log_level);

    if let Err(e) = run(&args).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
