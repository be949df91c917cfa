use crate::{Error, ReadOutcome, Result, Status};
use std::io;

/// Chunk size used by the default `skip` and `read_to_end` loops.
const SCRATCH_SIZE: usize = 1024;

/// A readable stream of units, like [`std::io::Read`] but generic over the
/// unit type and reporting end-of-stream through [`ReadOutcome`].
///
/// A read into a non-empty buffer either produces at least one unit, blocks
/// until it can, or reports `Status::End`.
pub trait Source {
    /// The element type: `u8` for byte streams, `char` for character streams.
    type Unit: Copy + Default;

    /// Read up to `buf.len()` units.
    fn read_outcome(&mut self, buf: &mut [Self::Unit]) -> Result<ReadOutcome>;

    /// The number of units that can be read without blocking.
    fn available(&self) -> Result<usize> {
        Ok(0)
    }

    /// Discard up to `n` units, returning how many were discarded.
    fn skip(&mut self, n: usize) -> Result<usize> {
        default_skip(self, n)
    }

    /// Release the stream. Further reads fail or report the end.
    fn close(&mut self) -> Result<()>;

    /// Read a single unit, or `None` at the end of the stream.
    fn read_one(&mut self) -> Result<Option<Self::Unit>> {
        default_read_one(self)
    }

    /// Like [`std::io::Read::read_exact`].
    fn read_exact(&mut self, buf: &mut [Self::Unit]) -> Result<()> {
        default_read_exact(self, buf)
    }

    /// Like [`std::io::Read::read_to_end`].
    fn read_to_end(&mut self, buf: &mut Vec<Self::Unit>) -> Result<usize> {
        default_read_to_end(self, buf)
    }
}

impl<S: Source + ?Sized> Source for &mut S {
    type Unit = S::Unit;

    #[inline]
    fn read_outcome(&mut self, buf: &mut [Self::Unit]) -> Result<ReadOutcome> {
        (**self).read_outcome(buf)
    }

    #[inline]
    fn available(&self) -> Result<usize> {
        (**self).available()
    }

    #[inline]
    fn skip(&mut self, n: usize) -> Result<usize> {
        (**self).skip(n)
    }

    #[inline]
    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// Default implementation of `Source::read_one`.
pub fn default_read_one<Inner: Source + ?Sized>(inner: &mut Inner) -> Result<Option<Inner::Unit>> {
    let mut one = [Inner::Unit::default()];
    loop {
        let outcome = inner.read_outcome(&mut one)?;
        if outcome.size == 1 {
            return Ok(Some(one[0]));
        }
        if outcome.status.is_end() {
            return Ok(None);
        }
    }
}

/// Default implementation of `Source::skip`.
pub fn default_skip<Inner: Source + ?Sized>(inner: &mut Inner, n: usize) -> Result<usize> {
    if n == 0 {
        return Ok(0);
    }
    let mut scratch = vec![Inner::Unit::default(); n.min(SCRATCH_SIZE)];
    let mut skipped = 0;
    while skipped < n {
        let want = (n - skipped).min(scratch.len());
        let ReadOutcome { size, status } = inner.read_outcome(&mut scratch[..want])?;
        skipped += size;
        if status.is_end() {
            break;
        }
    }
    Ok(skipped)
}

/// Default implementation of `Source::read_exact`.
pub fn default_read_exact<Inner: Source + ?Sized>(
    inner: &mut Inner,
    mut buf: &mut [Inner::Unit],
) -> Result<()> {
    while !buf.is_empty() {
        match inner.read_outcome(buf) {
            Ok(ReadOutcome { size, status }) => {
                let t = buf;
                buf = &mut t[size..];
                if status.is_end() {
                    break;
                }
            }
            Err(Error::Io(ref e)) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }

    if buf.is_empty() {
        Ok(())
    } else {
        Err(Error::UnexpectedEof)
    }
}

/// Default implementation of `Source::read_to_end`.
pub fn default_read_to_end<Inner: Source + ?Sized>(
    inner: &mut Inner,
    buf: &mut Vec<Inner::Unit>,
) -> Result<usize> {
    let start_len = buf.len();
    loop {
        let read_pos = buf.len();
        buf.resize(read_pos + SCRATCH_SIZE, Inner::Unit::default());

        match inner.read_outcome(&mut buf[read_pos..]) {
            Ok(ReadOutcome { size, status }) => {
                buf.truncate(read_pos + size);
                if let Status::End = status {
                    return Ok(buf.len() - start_len);
                }
            }
            Err(Error::Io(ref e)) if e.kind() == io::ErrorKind::Interrupted => {
                buf.truncate(read_pos);
            }
            Err(e) => {
                buf.truncate(start_len);
                return Err(e);
            }
        }
    }
}
