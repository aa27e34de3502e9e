//! Parquet import/export through real files in a scratch directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{ArrayRef, Float32Array, Int32Array, Int64Array, StringArray};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use uuid::Uuid;

use saltmatch_core::{ComponentType, MatchError, MatchIndex, Outcome};
use saltmatch_ingest::{ParquetExporter, ParquetImporter};

struct ScratchDir(PathBuf);

impl ScratchDir {
    fn new() -> Self {
        let dir = std::env::temp_dir().join(format!("saltmatch-ingest-test-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        Self(dir)
    }

    fn path(&self, name: &str) -> PathBuf {
        self.0.join(name)
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

fn batch(columns: Vec<(&str, ArrayRef)>) -> RecordBatch {
    let fields: Vec<Field> = columns
        .iter()
        .map(|(name, array)| Field::new(*name, array.data_type().clone(), false))
        .collect();
    let arrays = columns.into_iter().map(|(_, a)| a).collect();
    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).unwrap()
}

fn write(path: &Path, batch: &RecordBatch) {
    ParquetExporter::write_rows(path, batch, &(0..batch.num_rows()).collect::<Vec<_>>()).unwrap();
}

fn truth_batch(event_numbers: Vec<i64>) -> RecordBatch {
    let n = event_numbers.len();
    let kinds: Vec<i32> = (0..n).map(|i| if i % 2 == 0 { 1 } else { 2 }).collect();
    let time = Int64Array::from_iter_values((0..n as i64).map(|i| i * 1_000));
    let endtime = Int64Array::from_iter_values((0..n as i64).map(|i| i * 1_000 + 500));
    batch(vec![
        ("event_number", Arc::new(Int64Array::from(event_numbers)) as ArrayRef),
        ("type", Arc::new(Int32Array::from(kinds))),
        ("time", Arc::new(time)),
        ("endtime", Arc::new(endtime)),
        ("n_photon", Arc::new(Int32Array::from(vec![10; n]))),
        ("n_electron", Arc::new(Int32Array::from(vec![4; n]))),
    ])
}

#[test]
fn truth_and_match_tables_load() {
    let dir = ScratchDir::new();
    let truth = dir.path("truth.parquet");
    let matches = dir.path("match.parquet");

    write(&truth, &truth_batch(vec![1, 1, 2, 2]));
    write(
        &matches,
        &batch(vec![
            (
                "outcome",
                Arc::new(StringArray::from(vec!["found", "lost", " found ", "split"])) as ArrayRef,
            ),
            ("matched_to", Arc::new(Int64Array::from(vec![0, -99999, 1, 2]))),
        ]),
    );

    let table = ParquetImporter::import_truth(&truth, &matches, true).unwrap();
    assert_eq!(table.len(), 4);
    assert_eq!(table.group_count(), 2);
    assert_eq!(table.truth()[1].kind, ComponentType::S2);
    assert_eq!(table.truth()[3].endtime, 3_500);
    assert_eq!(table.matches()[0].outcome, Outcome::Found);
    assert_eq!(table.matches()[1].matched_to, MatchIndex::NotFound);
    assert_eq!(table.matches()[2].outcome, Outcome::Other(" found ".to_string()));
    assert_eq!(table.matches()[3].outcome, Outcome::Split);
}

#[test]
fn matched_to_is_optional() {
    let dir = ScratchDir::new();
    let truth = dir.path("truth.parquet");
    let matches = dir.path("match.parquet");

    write(&truth, &truth_batch(vec![1, 1]));
    write(
        &matches,
        &batch(vec![("outcome", Arc::new(StringArray::from(vec!["found", "found"])) as ArrayRef)]),
    );

    let table = ParquetImporter::import_truth(&truth, &matches, true).unwrap();
    assert!(table.matches().iter().all(|m| m.matched_to == MatchIndex::NotFound));
}

#[test]
fn peak_truth_requires_matched_to() {
    let dir = ScratchDir::new();
    let truth = dir.path("truth.parquet");
    let matches = dir.path("match.parquet");

    write(&truth, &truth_batch(vec![1, 1]));
    write(
        &matches,
        &batch(vec![("outcome", Arc::new(StringArray::from(vec!["found", "found"])) as ArrayRef)]),
    );

    let err = ParquetImporter::import_truth_for_peaks(&truth, &matches, true).unwrap_err();
    assert!(matches!(err, MatchError::MissingColumn(c) if c == "matched_to"));

    write(
        &matches,
        &batch(vec![
            ("outcome", Arc::new(StringArray::from(vec!["found", "found"])) as ArrayRef),
            ("matched_to", Arc::new(Int64Array::from(vec![0, 1]))),
        ]),
    );
    let table = ParquetImporter::import_truth_for_peaks(&truth, &matches, true).unwrap();
    assert_eq!(table.matches()[1].matched_to, MatchIndex::Found(1));
}

#[test]
fn gaps_rejected_only_when_dense_required() {
    let dir = ScratchDir::new();
    let truth = dir.path("truth.parquet");
    let matches = dir.path("match.parquet");

    write(&truth, &truth_batch(vec![1, 1, 3, 3]));
    write(
        &matches,
        &batch(vec![("outcome", Arc::new(StringArray::from(vec!["found"; 4])) as ArrayRef)]),
    );

    let err = ParquetImporter::import_truth(&truth, &matches, true).unwrap_err();
    assert!(matches!(err, MatchError::EventNumberGap { expected: 2, found: 3 }));
    assert!(ParquetImporter::import_truth(&truth, &matches, false).is_ok());
}

#[test]
fn zero_event_number_rejected() {
    let dir = ScratchDir::new();
    let truth = dir.path("truth.parquet");
    let matches = dir.path("match.parquet");

    write(&truth, &truth_batch(vec![0, 0]));
    write(
        &matches,
        &batch(vec![("outcome", Arc::new(StringArray::from(vec!["found"; 2])) as ArrayRef)]),
    );

    let err = ParquetImporter::import_truth(&truth, &matches, false).unwrap_err();
    assert!(matches!(err, MatchError::InvalidEventNumber { row: 0, value: 0 }));
}

#[test]
fn peaks_load_and_matched_rows_export_in_order() {
    let dir = ScratchDir::new();
    let peaks = dir.path("peaks.parquet");

    write(
        &peaks,
        &batch(vec![
            ("time", Arc::new(Int64Array::from(vec![0, 100, 200])) as ArrayRef),
            ("endtime", Arc::new(Int64Array::from(vec![50, 150, 250]))),
            ("area", Arc::new(Float32Array::from(vec![1.0, 20.5, 300.0]))),
            ("type", Arc::new(Int32Array::from(vec![1, 2, 0]))),
            ("extra", Arc::new(StringArray::from(vec!["a", "b", "c"]))),
        ]),
    );

    let loaded = ParquetImporter::import_peaks(&peaks).unwrap();
    assert_eq!(loaded.len(), 3);
    assert_eq!(loaded.records[1].area, 20.5);
    assert_eq!(loaded.records[2].kind, ComponentType::Other(0));

    let out = dir.path("out/selected.parquet");
    let written = ParquetExporter::write_rows(&out, &loaded.batch, &[2, 0]).unwrap();
    assert_eq!(written, 2);

    let back = ParquetImporter::read_batch(&out).unwrap();
    assert_eq!(back.num_columns(), 5, "all original columns kept");
    let reloaded = ParquetImporter::import_peaks(&out).unwrap();
    assert_eq!(reloaded.records[0].time, 200);
    assert_eq!(reloaded.records[1].time, 0);
}

#[test]
fn export_rejects_out_of_range_rows() {
    let dir = ScratchDir::new();
    let b = batch(vec![("time", Arc::new(Int64Array::from(vec![1, 2])) as ArrayRef)]);
    let err = ParquetExporter::write_rows(&dir.path("x.parquet"), &b, &[0, 5]).unwrap_err();
    assert!(matches!(err, MatchError::IndexOutOfRange { row: 1, index: 5, len: 2 }));
}

#[test]
fn events_missing_column_is_typed_error() {
    let dir = ScratchDir::new();
    let events = dir.path("events.parquet");
    write(
        &events,
        &batch(vec![
            ("s1_time", Arc::new(Int64Array::from(vec![1])) as ArrayRef),
            ("s1_endtime", Arc::new(Int64Array::from(vec![2]))),
            ("s2_time", Arc::new(Int64Array::from(vec![3]))),
        ]),
    );
    let err = ParquetImporter::import_events(&events).unwrap_err();
    assert!(matches!(err, MatchError::MissingColumn(c) if c == "s2_endtime"));
}

#[test]
fn index_pairs_written() {
    let dir = ScratchDir::new();
    let path = dir.path("pairs.parquet");
    ParquetExporter::write_index_pairs(&path, &[4, 1], &[0, 2]).unwrap();
    let back = ParquetImporter::read_batch(&path).unwrap();
    assert_eq!(back.num_rows(), 2);
    assert_eq!(back.schema().field(0).name(), "salted_row");
}
