use std::path::Path;

use anyhow::{Context, Result};
use arrow::record_batch::RecordBatch;
use tracing::info;

use saltmatch_compute::MatchSummary;
use saltmatch_core::MatchConfig;
use saltmatch_ingest::ParquetExporter;

pub const SALTED_FILE: &str = "salted_matched.parquet";
pub const SIMULATED_FILE: &str = "simulated_matched.parquet";
pub const ROWS_FILE: &str = "matched_rows.parquet";
pub const SUMMARY_FILE: &str = "summary.json";

/// Full-width tables and the aligned rows selected from them.
pub struct MatchedOutput<'a> {
    pub salted: &'a RecordBatch,
    pub simulated: &'a RecordBatch,
    pub salted_rows: &'a [usize],
    pub simulated_rows: &'a [usize],
    pub summary: &'a MatchSummary,
}

pub fn summary_json(summary: &MatchSummary, config: &MatchConfig) -> serde_json::Value {
    serde_json::json!({
        "config": config.summary(),
        "summary": summary,
        "salt_efficiency": summary.salt_efficiency(),
    })
}

pub fn write_outputs(dir: &Path, output: &MatchedOutput<'_>, config: &MatchConfig) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;

    ParquetExporter::write_rows(&dir.join(SALTED_FILE), output.salted, output.salted_rows)
        .context("failed to write salted matches")?;
    ParquetExporter::write_rows(
        &dir.join(SIMULATED_FILE),
        output.simulated,
        output.simulated_rows,
    )
    .context("failed to write simulated matches")?;
    ParquetExporter::write_index_pairs(
        &dir.join(ROWS_FILE),
        output.salted_rows,
        output.simulated_rows,
    )
    .context("failed to write matched row positions")?;

    let json = serde_json::to_string_pretty(&summary_json(output.summary, config))?;
    std::fs::write(dir.join(SUMMARY_FILE), json)
        .with_context(|| format!("failed to write {}", SUMMARY_FILE))?;

    info!("Wrote {} matched pairs to {}", output.salted_rows.len(), dir.display());
    Ok(())
}

pub fn print_summary(summary: &MatchSummary) {
    println!("level:              {:?}", summary.level);
    println!(
        "truth rows:         {} ({} clean in {} events)",
        summary.truth_rows, summary.clean_truth_rows, summary.clean_truth_events
    );
    for report in &summary.filters {
        println!(
            "  {:<17} -{} rows ({:.2}%)",
            report.filter,
            report.rows_removed,
            report.percent_removed()
        );
    }
    println!("simulated matched:  {}/{}", summary.matched_to_truth, summary.truth_references);
    println!(
        "salted matched:     {}/{} ({:.1}%)",
        summary.matched_to_simu,
        summary.matched_to_truth,
        summary.salt_efficiency() * 100.0
    );
    println!("elapsed:            {} ms", summary.elapsed_ms);
}
