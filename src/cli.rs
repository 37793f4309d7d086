use crate::core::parse_video_ids;
use crate::error::{Error, Result};
use clap::Parser;
use std::path::PathBuf;

pub const USAGE: &str = "Usage: reviewreel <comma-separated-video-ids>\n       reviewreel --discover\n       reviewreel --leaderboard";

#[derive(Parser, Debug)]
#[command(name = "reviewreel")]
#[command(about = "Food review finder: transcribe creator videos and classify them with an LLM")]
#[command(version = "0.1.0")]
pub struct Cli {
    /// Comma-separated video IDs to transcribe and classify
    pub video_ids: Option<String>,

    /// List feed videos that are not in the processed ledger yet
    #[arg(long, conflicts_with = "video_ids")]
    pub discover: bool,

    /// Show the review ledger ranked by score
    #[arg(long, conflicts_with_all = ["video_ids", "discover"])]
    pub leaderboard: bool,

    /// Creator handle (overrides REVIEWREEL_HANDLE)
    #[arg(long)]
    pub handle: Option<String>,

    /// Processed-ids ledger file
    #[arg(long, value_name = "PATH")]
    pub processed: Option<PathBuf>,

    /// Review ledger file
    #[arg(long, value_name = "PATH")]
    pub reviews: Option<PathBuf>,

    /// Write both ledgers after every video instead of once at the end
    #[arg(long)]
    pub checkpoint: bool,

    /// Ask the model for a JSON object response (provider support required)
    #[arg(long)]
    pub json_mode: bool,
}

#[derive(Debug, PartialEq)]
pub enum Mode {
    Discover,
    Leaderboard,
    Process(Vec<String>),
}

impl Cli {
    pub fn mode(&self) -> Result<Mode> {
        match (&self.video_ids, self.discover, self.leaderboard) {
            (None, true, false) => Ok(Mode::Discover),
            (None, false, true) => Ok(Mode::Leaderboard),
            (Some(list), false, false) => Ok(Mode::Process(parse_video_ids(list)?)),
            (None, false, false) => Err(Error::custom("missing video IDs")),
            _ => Err(Error::custom(
                "video IDs, --discover and --leaderboard are mutually exclusive",
            )),
        }
    }
}
