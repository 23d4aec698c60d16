// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// clap and delegates to Layer 2 (application).
//
// Two commands are supported:
//   1. `inspect` — assembles one sample and prints it as JSON
//   2. `stats`   — reports vocabulary coverage for an imdb

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, InspectArgs, StatsArgs};

#[derive(Parser, Debug)]
#[command(
    name = "vqa-dataset",
    version,
    about = "Assemble VQA training samples from an imdb, vocabularies and image features."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case. This layer only routes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Inspect(args) => Self::run_inspect(args),
            Commands::Stats(args)   => Self::run_stats(args),
        }
    }

    fn run_inspect(args: InspectArgs) -> Result<()> {
        use crate::application::inspect_use_case::InspectUseCase;

        tracing::info!("Inspecting example {} of {}", args.index, args.imdb.display());

        let pretty = args.pretty;
        let sample = InspectUseCase::new(args.into()).execute()?;
        print_json(&sample, pretty)
    }

    fn run_stats(args: StatsArgs) -> Result<()> {
        use crate::application::stats_use_case::StatsUseCase;

        let pretty = args.pretty;
        let stats = StatsUseCase::new(args.into()).execute()?;
        print_json(&stats, pretty)
    }
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{text}");
    Ok(())
}
