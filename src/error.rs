use std::io;

use thiserror::Error;

/// Result type used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by sources, sinks, and pipes.
#[derive(Error, Debug)]
pub enum Error {
    /// The stream has been closed.
    #[error("stream closed")]
    Closed,

    /// The stream was constructed without an underlying stream.
    #[error("underlying stream unavailable")]
    Unattached,

    /// The reading end of a pipe has gone away.
    #[error("broken pipe")]
    BrokenPipe,

    /// A pipe endpoint was used before being connected.
    #[error("pipe not connected")]
    NotConnected,

    /// A pipe endpoint was connected twice.
    #[error("pipe already connected")]
    AlreadyConnected,

    /// `reset` was called without a preceding `mark`.
    #[error("mark not set")]
    MarkNotSet,

    /// The marked data was discarded because the read limit was exceeded.
    #[error("mark invalidated")]
    MarkInvalidated,

    /// The stream ended in the middle of a value.
    #[error("unexpected end of stream")]
    UnexpectedEof,

    /// Encoded data could not be decoded, or a value could not be encoded.
    #[error("malformed data: {0}")]
    Malformed(String),

    /// A buffer capacity of zero was requested.
    #[error("invalid buffer size: {0}")]
    InvalidBufferSize(usize),

    /// An `offset`/`len` pair does not fit inside the given slice.
    #[error("range {offset}..{offset}+{len} out of bounds for length {capacity}")]
    OutOfBounds {
        /// Requested start offset.
        offset: usize,
        /// Requested length.
        len: usize,
        /// Length of the slice.
        capacity: usize,
    },

    /// A required stream reference is missing.
    #[error("missing {0}")]
    NullArgument(&'static str),

    /// An error reported by an underlying `std::io` stream.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Broad classes of [`Error`].
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ErrorCategory {
    /// Stream state or underlying I/O failures.
    Io,
    /// A constructor argument was rejected.
    InvalidArgument,
    /// An offset or length fell outside a slice.
    Bounds,
    /// A required stream reference was missing.
    NullArgument,
}

impl Error {
    /// Classify this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidBufferSize(_) => ErrorCategory::InvalidArgument,
            Self::OutOfBounds { .. } => ErrorCategory::Bounds,
            Self::NullArgument(_) => ErrorCategory::NullArgument,
            _ => ErrorCategory::Io,
        }
    }

    /// Shorthand for `self.category() == ErrorCategory::Io`.
    #[inline]
    pub fn is_io(&self) -> bool {
        self.category() == ErrorCategory::Io
    }
}

impl From<Error> for io::Error {
    fn from(error: Error) -> Self {
        let kind = match &error {
            Error::Io(e) => e.kind(),
            Error::BrokenPipe => io::ErrorKind::BrokenPipe,
            Error::NotConnected => io::ErrorKind::NotConnected,
            Error::AlreadyConnected => io::ErrorKind::AlreadyExists,
            Error::UnexpectedEof => io::ErrorKind::UnexpectedEof,
            Error::Malformed(_) => io::ErrorKind::InvalidData,
            Error::InvalidBufferSize(_) | Error::OutOfBounds { .. } | Error::NullArgument(_) => {
                io::ErrorKind::InvalidInput
            }
            Error::Closed | Error::Unattached | Error::MarkNotSet | Error::MarkInvalidated => {
                io::ErrorKind::Other
            }
        };
        match error {
            Error::Io(e) => e,
            other => io::Error::new(kind, other),
        }
    }
}

/// Check that `offset..offset + len` lies within a slice of length `capacity`.
pub(crate) fn check_range(offset: usize, len: usize, capacity: usize) -> Result<()> {
    match offset.checked_add(len) {
        Some(end) if end <= capacity => Ok(()),
        _ => Err(Error::OutOfBounds {
            offset,
            len,
            capacity,
        }),
    }
}
