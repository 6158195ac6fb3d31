use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SegyError>;

/// Errors surfaced by the SEG-Y codec and trace store.
///
/// Structural violations (bad lengths, bad indices, bad format codes) are
/// always reported to the caller; the only silent coercions are the two
/// documented legacy fallbacks (16/32-bit samples-per-trace, revision
/// normalization), which are logged instead.
#[derive(Debug, Error)]
pub enum SegyError {
    #[error("malformed SEG-Y data: {0}")]
    Format(String),

    #[error("unsupported data sample format code {0}")]
    UnsupportedSampleFormat(i16),

    #[error("trace index {index} out of range, file contains {count} traces")]
    IndexOutOfRange { index: u64, count: u64 },

    #[error("trace holds {actual} samples, file is fixed at {expected} per trace")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("operation on a closed file")]
    Closed,

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
