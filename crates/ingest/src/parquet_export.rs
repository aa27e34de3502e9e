use std::fs;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Int64Array, UInt64Array};
use arrow::compute::take_record_batch;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use tracing::debug;

use saltmatch_core::{MatchError, Result};

pub struct ParquetExporter;

impl ParquetExporter {
    /// Write the selected rows of `batch`, in the given order, with all of
    /// its columns.
    pub fn write_rows(path: &Path, batch: &RecordBatch, rows: &[usize]) -> Result<usize> {
        if let Some((row, &index)) = rows.iter().enumerate().find(|(_, &r)| r >= batch.num_rows()) {
            return Err(MatchError::IndexOutOfRange {
                row,
                index,
                len: batch.num_rows(),
            });
        }
        let indices = UInt64Array::from_iter_values(rows.iter().map(|&r| r as u64));
        let selected =
            take_record_batch(batch, &indices).map_err(|e| MatchError::Arrow(e.to_string()))?;
        Self::write_batch(path, &selected)?;
        Ok(selected.num_rows())
    }

    /// Write the aligned row positions of a matched pair set as two columns.
    pub fn write_index_pairs(
        path: &Path,
        salted_rows: &[usize],
        simulated_rows: &[usize],
    ) -> Result<()> {
        if salted_rows.len() != simulated_rows.len() {
            return Err(MatchError::LengthMismatch {
                truth: simulated_rows.len(),
                matches: salted_rows.len(),
            });
        }
        let schema = Arc::new(Schema::new(vec![
            Field::new("salted_row", DataType::Int64, false),
            Field::new("simulated_row", DataType::Int64, false),
        ]));
        let column = |rows: &[usize]| -> ArrayRef {
            Arc::new(Int64Array::from_iter_values(rows.iter().map(|&r| r as i64)))
        };
        let batch = RecordBatch::try_new(schema, vec![column(salted_rows), column(simulated_rows)])
            .map_err(|e| MatchError::Arrow(e.to_string()))?;
        Self::write_batch(path, &batch)
    }

    fn write_batch(path: &Path, batch: &RecordBatch) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let props = WriterProperties::builder()
            .set_compression(Compression::ZSTD(Default::default()))
            .build();

        let file = fs::File::create(path)?;
        let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
            .map_err(|e| MatchError::Parquet(e.to_string()))?;
        writer
            .write(batch)
            .map_err(|e| MatchError::Parquet(e.to_string()))?;
        writer
            .close()
            .map_err(|e| MatchError::Parquet(e.to_string()))?;

        debug!(path = %path.display(), rows = batch.num_rows(), "Wrote Parquet file");
        Ok(())
    }
}
