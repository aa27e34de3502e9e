//! Parquet boundary for salt matching: typed loading of the truth, match,
//! simulated and salted tables, and export of matched subsets.

pub mod columns;
pub mod parquet_export;
pub mod parquet_import;

pub use parquet_export::ParquetExporter;
pub use parquet_import::{LoadedTable, ParquetImporter};
