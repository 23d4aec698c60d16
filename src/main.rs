use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use vqa_dataset::cli::Cli;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("vqa_dataset=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    Cli::parse().run()
}
