use std::path::Path;

use arrow::compute::concat_batches;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tracing::{debug, info};

use saltmatch_core::{
    ComponentType, EventRecord, MatchError, MatchIndex, MatchRecord, Outcome, PeakRecord, Result,
    TruthRecord, TruthTable,
};

use crate::columns::{float_column, has_column, int_column, string_column, uint_column};

/// Typed records read from a Parquet file, next to the full Arrow batch so
/// matched rows can be exported with every original column.
#[derive(Debug, Clone)]
pub struct LoadedTable<R> {
    pub records: Vec<R>,
    pub batch: RecordBatch,
}

impl<R> LoadedTable<R> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub struct ParquetImporter;

impl ParquetImporter {
    /// Read every row group of a Parquet file into a single batch.
    pub fn read_batch(path: &Path) -> Result<RecordBatch> {
        let file = std::fs::File::open(path).map_err(MatchError::Io)?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)
            .map_err(|e| MatchError::Parquet(e.to_string()))?;
        let schema = builder.schema().clone();

        let reader = builder.build().map_err(|e| MatchError::Parquet(e.to_string()))?;
        let batches = reader
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| MatchError::Arrow(e.to_string()))?;

        debug!(path = %path.display(), batches = batches.len(), "Read Parquet file");
        concat_batches(&schema, &batches).map_err(|e| MatchError::Arrow(e.to_string()))
    }

    /// Load the truth table and its match table for event matching.
    ///
    /// `matched_to` is optional; when absent every row is not found. With
    /// `require_dense` the event numbers must run from 1 without gaps.
    pub fn import_truth(
        truth_path: &Path,
        match_path: &Path,
        require_dense: bool,
    ) -> Result<TruthTable> {
        Self::load_truth(truth_path, match_path, require_dense, false)
    }

    /// Load the truth table and its match table for peak matching.
    ///
    /// Peak matching reindexes through `matched_to`, so the column must be
    /// present.
    pub fn import_truth_for_peaks(
        truth_path: &Path,
        match_path: &Path,
        require_dense: bool,
    ) -> Result<TruthTable> {
        Self::load_truth(truth_path, match_path, require_dense, true)
    }

    fn load_truth(
        truth_path: &Path,
        match_path: &Path,
        require_dense: bool,
        require_matched_to: bool,
    ) -> Result<TruthTable> {
        let truth_batch = Self::read_batch(truth_path)?;
        let match_batch = Self::read_batch(match_path)?;

        let truth = truth_records(&truth_batch)?;
        let matches = match_records(&match_batch, require_matched_to)?;
        let table = TruthTable::new(truth, matches)?;
        if require_dense {
            table.check_dense()?;
        }

        info!(
            "Imported {} truth rows in {} events from {}",
            table.len(),
            table.group_count(),
            truth_path.display()
        );
        Ok(table)
    }

    /// Load an event-level reconstruction table.
    pub fn import_events(path: &Path) -> Result<LoadedTable<EventRecord>> {
        let batch = Self::read_batch(path)?;
        let s1_time = int_column(&batch, "s1_time")?;
        let s1_endtime = int_column(&batch, "s1_endtime")?;
        let s2_time = int_column(&batch, "s2_time")?;
        let s2_endtime = int_column(&batch, "s2_endtime")?;

        let records: Vec<EventRecord> = (0..batch.num_rows())
            .map(|i| EventRecord {
                s1_time: s1_time[i],
                s1_endtime: s1_endtime[i],
                s2_time: s2_time[i],
                s2_endtime: s2_endtime[i],
            })
            .collect();

        info!("Imported {} events from {}", records.len(), path.display());
        Ok(LoadedTable { records, batch })
    }

    /// Load a peak-level reconstruction table.
    pub fn import_peaks(path: &Path) -> Result<LoadedTable<PeakRecord>> {
        let batch = Self::read_batch(path)?;
        let time = int_column(&batch, "time")?;
        let endtime = int_column(&batch, "endtime")?;
        let area = float_column(&batch, "area")?;
        let kind = int_column(&batch, "type")?;

        let records: Vec<PeakRecord> = (0..batch.num_rows())
            .map(|i| PeakRecord {
                time: time[i],
                endtime: endtime[i],
                area: area[i],
                kind: ComponentType::from_code(kind[i]),
            })
            .collect();

        info!("Imported {} peaks from {}", records.len(), path.display());
        Ok(LoadedTable { records, batch })
    }
}

fn truth_records(batch: &RecordBatch) -> Result<Vec<TruthRecord>> {
    let event_number = int_column(batch, "event_number")?;
    let kind = int_column(batch, "type")?;
    let time = int_column(batch, "time")?;
    let endtime = int_column(batch, "endtime")?;
    let n_photon = uint_column(batch, "n_photon")?;
    let n_electron = uint_column(batch, "n_electron")?;

    (0..batch.num_rows())
        .map(|row| {
            let value = event_number[row];
            if value < 1 {
                return Err(MatchError::InvalidEventNumber { row, value });
            }
            Ok(TruthRecord {
                event_number: value as u64,
                kind: ComponentType::from_code(kind[row]),
                time: time[row],
                endtime: endtime[row],
                n_photon: n_photon[row],
                n_electron: n_electron[row],
            })
        })
        .collect()
}

fn match_records(batch: &RecordBatch, require_matched_to: bool) -> Result<Vec<MatchRecord>> {
    let outcome = string_column(batch, "outcome")?;
    let matched_to = if require_matched_to || has_column(batch, "matched_to") {
        Some(int_column(batch, "matched_to")?)
    } else {
        None
    };

    Ok(outcome
        .iter()
        .enumerate()
        .map(|(row, raw)| {
            let record = MatchRecord::new(Outcome::parse(raw));
            match &matched_to {
                Some(indices) => record.with_matched_to(MatchIndex::from_raw(indices[row])),
                None => record,
            }
        })
        .collect())
}
