use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Raised by the vector math routines when the two inputs disagree in length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VectorError {
    #[error("vectors must have the same length (left has {left}, right has {right})")]
    LengthMismatch { left: usize, right: usize },
}

#[derive(Debug, Error)]
pub enum SimplifyError {
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unknown similarity metric '{0}'")]
    UnknownMetric(String),

    #[error("unknown replacement policy '{0}'")]
    UnknownPolicy(String),
}

pub type Result<T, E = SimplifyError> = std::result::Result<T, E>;
