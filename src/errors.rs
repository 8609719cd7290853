use std::io;

use thiserror::Error;

/// All the ways the fragtrim library can fail.
/// Note that a sequence without a fragment is not an error, see `extract::extract_fragment`.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{0} marker must not be empty")]
    EmptyMarker(&'static str),

    #[error("minimum length ({min}) is larger than maximum length ({max})")]
    InvertedLengthBounds { min: usize, max: usize },

    #[error("sequence file cannot be parsed: {0}")]
    Parse(String),

    #[error("record \"{0}\" has no quality scores, demultiplexing requires FASTQ input")]
    MissingQuality(String),

    #[error("unknown table format \"{0}\", expected one of csv, tsv, txt")]
    UnknownTableFormat(String),

    #[error("out of order write: {0}")]
    OrderedWrite(String),

    #[error("worker pool stopped before all records were processed")]
    WorkerPool,

    #[error("IO")]
    Io(#[from] io::Error),

    #[error("table output failed")]
    Csv(#[from] csv::Error),

    #[error("JSON output failed")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
