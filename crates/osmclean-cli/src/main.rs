use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "osmclean",
    version,
    about = "Remove OSM nodes carrying marker tags, writing <INPUT>.clean.osm"
)]
struct Args {
    /// OSM XML file to clean
    #[arg(value_name = "INPUT")]
    input: PathBuf,
    /// Which tags mark a node for removal
    #[arg(short, long, value_enum, default_value_t = RuleArg::Fixme)]
    rule: RuleArg,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RuleArg {
    /// fixme="streamdeck-osmapper #..."
    Fixme,
    /// name="<icon>.png<N>"
    Name,
}

impl From<RuleArg> for osmclean::Preset {
    fn from(value: RuleArg) -> Self {
        match value {
            RuleArg::Fixme => osmclean::Preset::Fixme,
            RuleArg::Name => osmclean::Preset::Name,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let rule = osmclean::Preset::from(args.rule)
        .rule()
        .context("failed to build cleanup rule")?;
    info!("Cleaning {} ({rule})", args.input.display());

    let outcome = osmclean::clean_file(&args.input, &rule)
        .with_context(|| format!("failed to clean {}", args.input.display()))?;

    info!(
        "Removed {} node(s), wrote {}",
        outcome.report.removed,
        outcome.output.display()
    );
    Ok(())
}
