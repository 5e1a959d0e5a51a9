//! Error kinds. Every one of them aborts the run.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Result type for fallible I/O around the simulation
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level failures of a run
#[derive(Error, Debug)]
pub enum Error {
    /// Wrong command-line usage
    #[error("{0}")]
    Usage(String),

    /// The input file could not be read
    #[error("could not open input file {path}: {source}")]
    InputOpen {
        /// Requested input path
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: io::Error,
    },

    /// The input file is malformed
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The parameters are incomplete or out of range
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The result file could not be created or written
    #[error("could not write output file {path}: {source}")]
    OutputWrite {
        /// Requested output path
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: io::Error,
    },
}

/// Malformed parameter file
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// A token where a parameter tag was expected is not one
    #[error("line {line}: unknown parameter '{tag}'")]
    UnknownTag {
        /// 1-based line number
        line: usize,
        /// Offending token
        tag: String,
    },

    /// A parameter value is not a non-negative integer
    #[error("line {line}: malformed value '{token}' for parameter {tag}")]
    MalformedNumber {
        /// 1-based line number
        line: usize,
        /// Parameter being read
        tag: char,
        /// Offending token
        token: String,
    },

    /// A tag is not followed by a value
    #[error("line {line}: parameter {tag} has no value")]
    MissingValue {
        /// 1-based line number
        line: usize,
        /// Parameter being read
        tag: char,
    },

    /// A backoff window of zero slots
    #[error("line {line}: backoff window must be positive")]
    ZeroWindow {
        /// 1-based line number
        line: usize,
    },
}

/// Parameters that are missing or cannot be simulated
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A required tag never appeared
    #[error("missing parameter {0}")]
    Missing(char),

    /// `N` is zero
    #[error("station count N must be at least 1")]
    NoStations,

    /// `L` is zero
    #[error("transmission duration L must be at least 1")]
    ZeroDuration,

    /// A numeric value does not fit the simulation's integer types
    #[error("parameter {0} is out of range")]
    OutOfRange(char),
}
