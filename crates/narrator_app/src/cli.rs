//! Command line surface of the `narrator` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// Turn documents into audiobooks with a remote text-to-speech service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// RON config file (defaults to ./narrator.ron when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Service origin, e.g. http://localhost:8000
    #[arg(long, global = true)]
    pub origin: Option<String>,

    /// Directory for downloaded audio and the generation history
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Where log lines go
    #[arg(long, global = true)]
    pub log: Option<LogTarget>,

    /// Log debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate an audiobook and wait for it to finish
    Generate(GenerateCommand),

    /// List the models the service offers
    Models,

    /// Show previously completed generations
    History,
}

#[derive(Args, Debug)]
pub struct GenerateCommand {
    #[command(flatten)]
    pub source: TextSource,

    /// Model id; a catalog id or any Hugging Face model id
    #[arg(short, long)]
    pub model: Option<String>,

    /// Save the finished audio into the output directory
    #[arg(short, long)]
    pub download: bool,

    /// New attempts after the progress stream drops without a result
    #[arg(long)]
    pub retries: Option<u32>,

    /// Give up on an attempt after this many seconds without progress
    #[arg(long)]
    pub idle_timeout: Option<u64>,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct TextSource {
    /// Document to upload for extraction (.pdf, .epub or .txt)
    #[arg(long)]
    pub document: Option<PathBuf>,

    /// Local UTF-8 file used as-is
    #[arg(long)]
    pub text_file: Option<PathBuf>,

    /// Text given inline
    #[arg(long)]
    pub text: Option<String>,
}

#[derive(ValueEnum, Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    #[default]
    Terminal,
    File,
    Both,
}

impl From<LogTarget> for narrator_logging::LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::Terminal => narrator_logging::LogDestination::Terminal,
            LogTarget::File => narrator_logging::LogDestination::File,
            LogTarget::Both => narrator_logging::LogDestination::Both,
        }
    }
}
