//! Fatal conditions of the pipeline.
//!
//! Soft conditions (low statistics, unmatchable angles) never appear here:
//! they are handled where they arise.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The HDF5 library refused to open, read or write something
    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),

    /// Plain file I/O, e.g. writing the output table
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unparseable configuration file
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// Parseable configuration whose values cannot be used
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A distribution which must exist in a container is absent
    #[error("distribution `{0}` not found in input")]
    MissingDistribution(String),

    /// A distribution exists but is 1-D where 2-D was expected, or vice versa
    #[error("distribution `{name}` has {found} dimension(s), expected {expected}")]
    WrongDimensions { name: String, expected: usize, found: usize },

    /// A stored distribution which cannot be interpreted
    #[error("malformed distribution: {0}")]
    Malformed(String),

    /// Two distribution sets (or two distributions) cannot be added bin by bin
    #[error("cannot merge distributions: {0}")]
    Incompatible(String),
}

pub type Result<T> = std::result::Result<T, Error>;
