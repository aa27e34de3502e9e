//! Typed column extraction from Arrow record batches.
//!
//! Integer columns of any width are widened to `i64`, float columns to
//! `f64`. Nulls are rejected: every input table is dense.

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use arrow::record_batch::RecordBatch;

use saltmatch_core::{MatchError, Result};

fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef> {
    let idx = batch
        .schema()
        .index_of(name)
        .map_err(|_| MatchError::MissingColumn(name.to_string()))?;
    Ok(batch.column(idx))
}

pub fn has_column(batch: &RecordBatch, name: &str) -> bool {
    batch.schema().index_of(name).is_ok()
}

fn reject_nulls(array: &dyn Array, name: &str) -> Result<()> {
    if array.null_count() == 0 {
        return Ok(());
    }
    let row = (0..array.len()).find(|&i| array.is_null(i)).unwrap_or(0);
    Err(MatchError::NullValue {
        column: name.to_string(),
        row,
    })
}

fn wrong_type(name: &str, expected: &str, actual: &DataType) -> MatchError {
    MatchError::ColumnType {
        column: name.to_string(),
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}

/// Read an integer column as `i64`.
pub fn int_column(batch: &RecordBatch, name: &str) -> Result<Vec<i64>> {
    let array = column(batch, name)?;
    if !array.data_type().is_integer() {
        return Err(wrong_type(name, "integer", array.data_type()));
    }
    reject_nulls(array.as_ref(), name)?;

    let widened = cast(array, &DataType::Int64).map_err(|e| MatchError::Arrow(e.to_string()))?;
    Ok(widened.as_primitive::<Int64Type>().values().to_vec())
}

/// Read an integer column that must not hold negative values.
pub fn uint_column(batch: &RecordBatch, name: &str) -> Result<Vec<u64>> {
    int_column(batch, name)?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            u64::try_from(value).map_err(|_| MatchError::NegativeValue {
                column: name.to_string(),
                row,
                value,
            })
        })
        .collect()
}

/// Read a numeric column as `f64`.
pub fn float_column(batch: &RecordBatch, name: &str) -> Result<Vec<f64>> {
    let array = column(batch, name)?;
    let data_type = array.data_type();
    if !(data_type.is_floating() || data_type.is_integer()) {
        return Err(wrong_type(name, "float", data_type));
    }
    reject_nulls(array.as_ref(), name)?;

    let widened = cast(array, &DataType::Float64).map_err(|e| MatchError::Arrow(e.to_string()))?;
    Ok(widened.as_primitive::<Float64Type>().values().to_vec())
}

/// Read a string column.
pub fn string_column(batch: &RecordBatch, name: &str) -> Result<Vec<String>> {
    let array = column(batch, name)?;
    let utf8 = match array.data_type() {
        DataType::Utf8 => array.clone(),
        DataType::LargeUtf8 | DataType::Utf8View => {
            cast(array, &DataType::Utf8).map_err(|e| MatchError::Arrow(e.to_string()))?
        }
        other => return Err(wrong_type(name, "string", other)),
    };
    reject_nulls(utf8.as_ref(), name)?;

    Ok(utf8
        .as_string::<i32>()
        .iter()
        .map(|v| v.unwrap_or_default().to_string())
        .collect())
}
