mod cli;
mod report;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use saltmatch_compute::{match_events, PeakMatcher};
use saltmatch_core::config::load_dotenv;
use saltmatch_core::{MatchConfig, TruthTable};
use saltmatch_ingest::ParquetImporter;

use crate::cli::{CliArgs, Command, InputArgs, PeakArgs};
use crate::report::{print_summary, write_outputs, MatchedOutput};

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    load_dotenv();
    let args = CliArgs::parse();
    let config = args.resolve_config();
    config.log_summary();

    match &args.command {
        Command::Events(inputs) => run_events(inputs, &config),
        Command::Peaks(peak_args) => run_peaks(peak_args, &config),
    }
}

fn load_truth(inputs: &InputArgs, config: &MatchConfig, for_peaks: bool) -> Result<TruthTable> {
    let dense = config.ingest.require_dense_events;
    let table = if for_peaks {
        ParquetImporter::import_truth_for_peaks(&inputs.truth, &inputs.matches, dense)
    } else {
        ParquetImporter::import_truth(&inputs.truth, &inputs.matches, dense)
    };
    table.with_context(|| format!("failed to load truth from {}", inputs.truth.display()))
}

fn run_events(inputs: &InputArgs, config: &MatchConfig) -> Result<()> {
    let table = load_truth(inputs, config, false)?;
    let simu = ParquetImporter::import_events(&inputs.simu).with_context(|| {
        format!("failed to load simulated events from {}", inputs.simu.display())
    })?;
    let salt = ParquetImporter::import_events(&inputs.salt).with_context(|| {
        format!("failed to load salted events from {}", inputs.salt.display())
    })?;

    info!("Matching salted events to simulated events");
    let pairs =
        match_events(&table, &simu.records, &salt.records).context("event matching failed")?;

    write_outputs(
        &config.output.dir,
        &MatchedOutput {
            salted: &salt.batch,
            simulated: &simu.batch,
            salted_rows: &pairs.salted_rows,
            simulated_rows: &pairs.simulated_rows,
            summary: &pairs.summary,
        },
        config,
    )?;
    print_summary(&pairs.summary);
    Ok(())
}

fn run_peaks(args: &PeakArgs, config: &MatchConfig) -> Result<()> {
    let inputs = &args.inputs;
    let table = load_truth(inputs, config, true)?;
    let simu = ParquetImporter::import_peaks(&inputs.simu).with_context(|| {
        format!("failed to load simulated peaks from {}", inputs.simu.display())
    })?;
    let salt = ParquetImporter::import_peaks(&inputs.salt).with_context(|| {
        format!("failed to load salted peaks from {}", inputs.salt.display())
    })?;

    info!("Matching salted {} peaks to simulated peaks", config.peaks.component);
    let matcher = PeakMatcher::new(config.peaks.clone());
    let pairs = matcher
        .run(&table, &simu.records, &salt.records)
        .context("peak matching failed")?;

    write_outputs(
        &config.output.dir,
        &MatchedOutput {
            salted: &salt.batch,
            simulated: &simu.batch,
            salted_rows: &pairs.salted_rows,
            simulated_rows: &pairs.simulated_rows,
            summary: &pairs.summary,
        },
        config,
    )?;
    print_summary(&pairs.summary);
    Ok(())
}
