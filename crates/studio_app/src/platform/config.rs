use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use studio_engine::{ClientSettings, EngineConfig, FetchSettings, VideoFlowSettings};
use studio_logging::LogDestination;

pub(crate) const LOG_FILENAME: &str = "studio.log";

/// Design studio and code review assistant backed by the Gemini API.
#[derive(Debug, Parser)]
#[command(name = "studio", version)]
pub(crate) struct Cli {
    /// API key for the generative-language service
    #[arg(long, env = "API_KEY", hide_env_values = true, default_value = "")]
    pub api_key: String,

    /// Base URL of the generative-language service
    #[arg(
        long,
        env = "STUDIO_API_BASE",
        default_value = "https://generativelanguage.googleapis.com"
    )]
    pub api_base: String,

    /// Directory for the gallery store and the log file
    #[arg(long, env = "STUDIO_DATA_DIR", default_value = ".studio")]
    pub data_dir: PathBuf,

    /// Where log output goes
    #[arg(long, value_enum, default_value_t = LogTarget::File)]
    pub log: LogTarget,

    /// Log verbosity: error, warn, info, debug or trace
    #[arg(long, default_value = "info")]
    pub log_level: LevelFilter,

    /// Also write the conversation as an HTML transcript to this file
    #[arg(long)]
    pub html: Option<PathBuf>,

    /// Render replies as escaped preformatted text instead of markdown
    #[arg(long)]
    pub plain_markdown: bool,

    #[arg(long, default_value_t = 10)]
    pub poll_interval_secs: u64,

    #[arg(long, default_value_t = 7)]
    pub caption_interval_secs: u64,

    /// Give up on a request after this many seconds
    #[arg(long)]
    pub max_wait_secs: Option<u64>,

    /// Save every produced image or video to the gallery
    #[arg(long)]
    pub save: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Generate four images from a prompt
    Images { prompt: String },
    /// Edit the masked area of an image
    Edit {
        #[arg(long)]
        image: PathBuf,
        #[arg(long)]
        mask: PathBuf,
        prompt: String,
    },
    /// Generate a video from a prompt
    Video { prompt: String },
    /// Chat with the design assistant, one message per input line
    Chat,
    /// Search-grounded design inspiration
    Inspire { prompt: String },
    /// Review a source file
    Review {
        /// One of the supported language values, e.g. rust or python
        #[arg(long)]
        language: String,
        file: PathBuf,
    },
    /// Manage saved media
    Gallery {
        #[command(subcommand)]
        command: GalleryCommand,
    },
}

#[derive(Debug, Subcommand)]
pub(crate) enum GalleryCommand {
    /// List saved items, newest first
    List,
    /// Remove the item at a 1-based position from `list`
    Remove { position: usize },
    /// Write all items as media files into a directory
    Export { dir: PathBuf },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum LogTarget {
    Terminal,
    File,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::File => LogDestination::File,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

impl Cli {
    pub(crate) fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILENAME)
    }

    pub(crate) fn max_wait(&self) -> Option<Duration> {
        self.max_wait_secs.map(Duration::from_secs)
    }

    pub(crate) fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            client: ClientSettings {
                api_base: self.api_base.clone(),
                api_key: self.api_key.clone(),
                ..ClientSettings::default()
            },
            fetch: FetchSettings::default(),
            video: VideoFlowSettings {
                poll_interval: Duration::from_secs(self.poll_interval_secs),
                caption_interval: Duration::from_secs(self.caption_interval_secs),
            },
        }
    }
}
