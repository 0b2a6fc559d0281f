//! Error types for the location index.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexError>;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("cannot create location index: {0}")]
    InvalidGraphBounds(String),

    #[error("spatial key of {0} bits does not fit into 64 bits, raise the tile resolution")]
    KeySpaceOverflow(u32),

    #[error("incorrect location index version, expected {expected} but found {found}")]
    VersionMismatch { expected: i32, found: i32 },

    #[error("location index was opened with an incorrect graph: {stored} vs. {computed}")]
    ChecksumMismatch { stored: i32, computed: i32 },

    #[error("{0}")]
    LifecycleViolation(&'static str),

    #[error("problem while storing location index ({context})")]
    ConstructionFailure {
        context: String,
        #[source]
        source: Box<IndexError>,
    },

    #[error("unexpected end of file")]
    UnexpectedEof,

    #[error("invalid store format")]
    InvalidFormat,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
