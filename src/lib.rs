//! Buffered and piped streams of bytes and characters.
//!
//! [`BufferedSource`] and [`BufferedSink`] put a fixed-size buffer in front
//! of any [`Source`] or [`Sink`], with bounded `mark`/`reset` on the reading
//! side and write-through of large writes on the writing side.
//! [`pipe`] connects a [`PipeWriter`] on one thread to a [`PipeReader`] on
//! another through a bounded ring buffer.

#![deny(missing_docs)]

mod buffered_sink;
mod buffered_source;
mod data;
mod error;
pub mod pipe;
mod sink;
mod slice_source;
mod source;
mod status;
mod std_sink;
mod std_source;
#[cfg(feature = "text")]
mod text;
mod vec_sink;

pub use buffered_sink::BufferedSink;
pub use buffered_source::{BufferedSource, DEFAULT_BUFFER_SIZE};
pub use data::{DataSinkExt, DataSourceExt, MAX_UTF_LEN};
pub use error::{Error, ErrorCategory, Result};
pub use pipe::{pipe, pipe_with_capacity, PipeReader, PipeWriter, DEFAULT_PIPE_SIZE};
pub use sink::{default_write_all, Sink};
pub use slice_source::SliceSource;
pub use source::{
    default_read_exact, default_read_one, default_read_to_end, default_skip, Source,
};
pub use status::{ReadOutcome, Readiness, Status};
pub use std_sink::StdSink;
pub use std_source::StdSource;
#[cfg(feature = "text")]
pub use text::{Lines, StrSource};
pub use vec_sink::VecSink;
