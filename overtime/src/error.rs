use datafusion::error::DataFusionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The time window cannot produce a finite sequence of buckets.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The counter named here never supplied a `count` implementation.
    #[error("{0}: count is not implemented")]
    NotImplemented(String),

    /// Store failure, passed through as is.
    #[error(transparent)]
    DataFusion(#[from] DataFusionError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
