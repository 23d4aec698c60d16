// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the `inspect` and `stats` subcommands and their flags.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::application::inspect_use_case::InspectConfig;
use crate::application::stats_use_case::StatsConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Assemble one sample and print it as JSON
    Inspect(InspectArgs),

    /// Report question length and vocabulary coverage for an imdb
    Stats(StatsArgs),
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Dataset params JSON (vocab files, T_encoder, layout options)
    #[arg(long)]
    pub params: PathBuf,

    /// imdb JSON file
    #[arg(long)]
    pub imdb: PathBuf,

    /// Feature directory; repeat for multiple feature slots
    #[arg(long = "feature-dir", required = true)]
    pub feature_dirs: Vec<PathBuf>,

    /// Example index to assemble
    #[arg(long, default_value_t = 0)]
    pub index: usize,

    /// Seed for the valid-answer draw
    #[arg(long)]
    pub seed: Option<u64>,

    /// Attach the raw imdb record to the output
    #[arg(long)]
    pub verbose: bool,

    /// Raw question to encode in place of the record's tokens
    #[arg(long)]
    pub question: Option<String>,

    #[arg(long)]
    pub pretty: bool,
}

/// The application layer never sees clap types.
impl From<InspectArgs> for InspectConfig {
    fn from(a: InspectArgs) -> Self {
        InspectConfig {
            params_file:  a.params,
            imdb_file:    a.imdb,
            feature_dirs: a.feature_dirs,
            index:        a.index,
            seed:         a.seed,
            verbose:      a.verbose,
            question:     a.question,
        }
    }
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Dataset params JSON
    #[arg(long)]
    pub params: PathBuf,

    /// imdb JSON file
    #[arg(long)]
    pub imdb: PathBuf,

    #[arg(long)]
    pub pretty: bool,
}

impl From<StatsArgs> for StatsConfig {
    fn from(a: StatsArgs) -> Self {
        StatsConfig {
            params_file: a.params,
            imdb_file:   a.imdb,
        }
    }
}
