use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parquet error: {0}")]
    Parquet(String),

    #[error("Arrow error: {0}")]
    Arrow(String),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Column '{column}' has wrong type: expected {expected}, got {actual}")]
    ColumnType {
        column: String,
        expected: String,
        actual: String,
    },

    #[error("Column '{column}' has a null value at row {row}")]
    NullValue { column: String, row: usize },

    #[error("Column '{column}' has a negative value {value} at row {row}")]
    NegativeValue {
        column: String,
        row: usize,
        value: i64,
    },

    #[error("Truth and match tables are not row-aligned: {truth} truth rows vs {matches} match rows")]
    LengthMismatch { truth: usize, matches: usize },

    #[error("Invalid event_number {value} at row {row}: event numbers start at 1")]
    InvalidEventNumber { row: usize, value: i64 },

    #[error("event_number out of order at row {row}: {found} follows {previous}")]
    UnorderedEventNumber {
        row: usize,
        previous: u64,
        found: u64,
    },

    #[error("event_number gap: expected {expected}, found {found}")]
    EventNumberGap { expected: u64, found: u64 },

    #[error("Event {event_number} is malformed: {s1} S1 rows and {s2} S2 rows, expected one of each")]
    MalformedGroup {
        event_number: u64,
        s1: usize,
        s2: usize,
    },

    #[error("Multiple candidates {candidates:?} overlap reference record {reference}")]
    AmbiguousMatch {
        reference: usize,
        candidates: Vec<usize>,
    },

    #[error("matched_to index {index} at row {row} is out of range for a table of {len} rows")]
    IndexOutOfRange { row: usize, index: usize, len: usize },

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, MatchError>;
