use crate::{error::check_range, Error, ReadOutcome, Result, Source};
use log::{debug, trace};
use std::io;

/// Buffer capacity used when none is given.
pub const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Where a `reset` would rewind to.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Mark {
    /// `mark` has not been called.
    Unset,

    /// Units from `position` onward are being retained, until more than
    /// `limit` of them have been read and the buffer needs refilling.
    Valid { position: usize, limit: usize },

    /// The retained units were discarded by a refill.
    Invalidated,
}

/// A `Source` which reads from an inner `Source` in large chunks and
/// supports `mark`/`reset` within a bounded lookahead window.
///
/// A `BufferedSource` may be constructed without an inner source (see
/// [`BufferedSource::unattached`]); construction always succeeds, and each
/// operation that needs the inner source fails with [`Error::Unattached`].
///
/// Failure precedence is the same for every operation: a closed stream
/// reports [`Error::Closed`] first, then range arguments are checked, and
/// only then is the inner source consulted.
pub struct BufferedSource<S: Source> {
    /// The wrapped stream.
    inner: Option<S>,

    /// Buffered units live in `buf[position..count]`.
    buf: Vec<S::Unit>,
    position: usize,
    count: usize,

    mark: Mark,
    closed: bool,
}

impl<S: Source> BufferedSource<S> {
    /// Construct a new `BufferedSource` wrapping `inner` with a buffer of
    /// [`DEFAULT_BUFFER_SIZE`] units.
    pub fn new(inner: S) -> Self {
        Self::build(Some(inner), DEFAULT_BUFFER_SIZE)
    }

    /// Construct a new `BufferedSource` wrapping `inner` with a buffer of
    /// `capacity` units. Fails if `capacity` is zero.
    pub fn with_capacity(capacity: usize, inner: S) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidBufferSize(capacity));
        }
        Ok(Self::build(Some(inner), capacity))
    }

    /// Construct a `BufferedSource` with no inner source.
    pub fn unattached() -> Self {
        Self::build(None, DEFAULT_BUFFER_SIZE)
    }

    fn build(inner: Option<S>, capacity: usize) -> Self {
        Self {
            inner,
            buf: vec![S::Unit::default(); capacity],
            position: 0,
            count: 0,
            mark: Mark::Unset,
            closed: false,
        }
    }

    /// Gets a reference to the underlying source.
    ///
    /// This type does not expose the ability to get a mutable reference to
    /// the underlying source because that could corrupt the buffer.
    pub fn get_ref(&self) -> Option<&S> {
        self.inner.as_ref()
    }

    /// Unwraps this `BufferedSource`, returning the underlying source.
    ///
    /// Any buffered units are lost.
    pub fn into_inner(self) -> Option<S> {
        self.inner
    }

    /// The current size of the internal buffer. This starts out as the
    /// construction capacity and may grow to honor a `mark` limit.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// The number of units buffered and not yet read.
    pub fn buffered(&self) -> usize {
        self.count - self.position
    }

    /// Remember the current position so that `reset` can return to it, as
    /// long as no more than `limit` units are read before the buffer next
    /// needs refilling.
    pub fn mark(&mut self, limit: usize) {
        self.mark = Mark::Valid {
            position: self.position,
            limit,
        };
    }

    /// Rewind to the position saved by `mark`.
    pub fn reset(&mut self) -> Result<()> {
        self.ensure_open()?;
        match self.mark {
            Mark::Unset => Err(Error::MarkNotSet),
            Mark::Invalidated => Err(Error::MarkInvalidated),
            Mark::Valid { position, .. } => {
                self.position = position;
                Ok(())
            }
        }
    }

    /// Read the next unit, or `None` at the end of the stream.
    pub fn read_one(&mut self) -> Result<Option<S::Unit>> {
        match self.peek_one()? {
            Some(unit) => {
                self.position += 1;
                Ok(Some(unit))
            }
            None => Ok(None),
        }
    }

    /// Return the next unit without consuming it.
    pub fn peek_one(&mut self) -> Result<Option<S::Unit>> {
        self.ensure_open()?;
        while self.position >= self.count {
            let outcome = self.fill()?;
            if self.position >= self.count && outcome.status.is_end() {
                return Ok(None);
            }
        }
        Ok(Some(self.buf[self.position]))
    }

    /// Read up to `len` units into `buf[offset..offset + len]`.
    ///
    /// Buffered units are handed out first. When nothing is buffered, no
    /// mark is active, and the remaining request is at least as large as
    /// the buffer, the inner source reads straight into `buf`.
    pub fn read_range(
        &mut self,
        buf: &mut [S::Unit],
        offset: usize,
        len: usize,
    ) -> Result<ReadOutcome> {
        self.ensure_open()?;
        check_range(offset, len, buf.len())?;
        if len == 0 {
            return Ok(ReadOutcome::ready(0));
        }
        if self.inner.is_none() {
            return Err(Error::Unattached);
        }

        let dst = &mut buf[offset..offset + len];
        let mut done = 0;
        if self.position < self.count {
            done = self.copy_buffered(dst);
            if done == len {
                return Ok(ReadOutcome::ready(done));
            }
            if self.inner_available()? == 0 {
                return Ok(ReadOutcome::lull(done));
            }
        }

        loop {
            let marked = matches!(self.mark, Mark::Valid { .. });
            if !marked && len - done >= self.buf.len() {
                let inner = self.inner.as_mut().ok_or(Error::Unattached)?;
                let outcome = inner.read_outcome(&mut dst[done..])?;
                trace!("read {} units directly, bypassing the buffer", outcome.size);
                done += outcome.size;
                if outcome.status.is_end() {
                    return Ok(ReadOutcome::end(done));
                }
            } else {
                let outcome = self.fill()?;
                if self.position >= self.count && outcome.status.is_end() {
                    return Ok(ReadOutcome::end(done));
                }
                done += self.copy_buffered(&mut dst[done..]);
            }

            if done == len {
                return Ok(ReadOutcome::ready(done));
            }
            if done > 0 && self.inner_available()? == 0 {
                return Ok(ReadOutcome::lull(done));
            }
        }
    }

    /// Discard up to `n` units, returning how many were discarded.
    pub fn skip(&mut self, n: usize) -> Result<usize> {
        self.ensure_open()?;
        if n == 0 {
            return Ok(0);
        }
        if self.inner.is_none() {
            return Err(Error::Unattached);
        }

        if self.count - self.position >= n {
            self.position += n;
            return Ok(n);
        }
        let mut skipped = self.count - self.position;
        self.position = self.count;

        if let Mark::Valid { limit, .. } = self.mark {
            if n <= limit {
                self.fill()?;
                if self.position >= self.count {
                    return Ok(skipped);
                }
                if self.count - self.position >= n - skipped {
                    self.position += n - skipped;
                    return Ok(n);
                }
                skipped += self.count - self.position;
                self.position = self.count;
                return Ok(skipped);
            }
            self.mark = Mark::Invalidated;
        }

        let inner = self.inner.as_mut().ok_or(Error::Unattached)?;
        Ok(skipped + inner.skip(n - skipped)?)
    }

    /// The number of units that can be read without blocking: everything
    /// buffered plus whatever the inner source reports.
    pub fn available(&self) -> Result<usize> {
        self.ensure_open()?;
        Ok(self.buffered().saturating_add(self.inner_available()?))
    }

    /// Close the inner source and release the buffer. Closing an already
    /// closed stream does nothing.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.buf = Vec::new();
        self.position = 0;
        self.count = 0;
        self.mark = Mark::Unset;
        debug!("buffered source closed");
        match self.inner.as_mut() {
            Some(inner) => inner.close(),
            None => Ok(()),
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(Error::Closed)
        } else {
            Ok(())
        }
    }

    fn inner_available(&self) -> Result<usize> {
        self.inner
            .as_ref()
            .ok_or(Error::Unattached)
            .and_then(|inner| inner.available())
    }

    /// Copy buffered units into `dst`, returning how many were copied.
    fn copy_buffered(&mut self, dst: &mut [S::Unit]) -> usize {
        let n = dst.len().min(self.count - self.position);
        dst[..n].copy_from_slice(&self.buf[self.position..self.position + n]);
        self.position += n;
        n
    }

    /// Refill the buffer from the inner source, preserving marked units if
    /// the mark is still within its limit.
    fn fill(&mut self) -> Result<ReadOutcome> {
        if self.inner.is_none() {
            return Err(Error::Unattached);
        }

        match self.mark {
            Mark::Valid { position, limit } if self.position - position < limit => {
                if position == 0 && limit > self.buf.len() {
                    let grown = limit.min(self.buf.len().saturating_mul(2));
                    trace!("growing buffer from {} to {} units", self.buf.len(), grown);
                    self.buf.resize(grown, S::Unit::default());
                } else if position > 0 {
                    trace!("shifting {} marked units to the buffer start", self.count - position);
                    self.buf.copy_within(position.., 0);
                }
                self.position -= position;
                self.count = self.position;
                self.mark = Mark::Valid { position: 0, limit };

                let start = self.position;
                let inner = self.inner.as_mut().ok_or(Error::Unattached)?;
                let outcome = inner.read_outcome(&mut self.buf[start..])?;
                self.count = start + outcome.size;
                Ok(outcome)
            }
            _ => {
                let inner = self.inner.as_mut().ok_or(Error::Unattached)?;
                let outcome = inner.read_outcome(&mut self.buf)?;
                if outcome.size > 0 {
                    trace!("refilled buffer with {} units", outcome.size);
                    if let Mark::Valid { .. } = self.mark {
                        self.mark = Mark::Invalidated;
                    }
                    self.position = 0;
                    self.count = outcome.size;
                }
                Ok(outcome)
            }
        }
    }
}

impl<S: Source> Source for BufferedSource<S> {
    type Unit = S::Unit;

    #[inline]
    fn read_outcome(&mut self, buf: &mut [S::Unit]) -> Result<ReadOutcome> {
        let len = buf.len();
        self.read_range(buf, 0, len)
    }

    #[inline]
    fn available(&self) -> Result<usize> {
        BufferedSource::available(self)
    }

    #[inline]
    fn skip(&mut self, n: usize) -> Result<usize> {
        BufferedSource::skip(self, n)
    }

    #[inline]
    fn close(&mut self) -> Result<()> {
        BufferedSource::close(self)
    }

    #[inline]
    fn read_one(&mut self) -> Result<Option<S::Unit>> {
        BufferedSource::read_one(self)
    }
}

impl<S: Source<Unit = u8>> io::Read for BufferedSource<S> {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let len = buf.len();
        Ok(self.read_range(buf, 0, len)?.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorCategory, SliceSource};
    use rstest::rstest;

    fn bytes(n: usize) -> Vec<u8> {
        (0..n).map(|i| (i % 251) as u8).collect()
    }

    fn read_n<S: Source>(source: &mut BufferedSource<S>, n: usize) -> Vec<S::Unit> {
        (0..n)
            .map(|_| source.read_one().unwrap().expect("unexpected end"))
            .collect()
    }

    #[test]
    fn reads_everything_in_order() {
        let data = bytes(100);
        let mut source = BufferedSource::with_capacity(7, SliceSource::new(&data[..])).unwrap();
        assert_eq!(read_n(&mut source, 100), data);
        assert_eq!(source.read_one().unwrap(), None);
        assert_eq!(source.read_one().unwrap(), None);
    }

    #[test]
    fn reset_replays_marked_units_across_refills() {
        let data = bytes(1000);
        let mut source = BufferedSource::with_capacity(16, SliceSource::new(&data[..])).unwrap();
        read_n(&mut source, 5);
        source.mark(40);
        let first = read_n(&mut source, 30);
        assert_eq!(first, &data[5..35]);
        source.reset().unwrap();
        assert_eq!(read_n(&mut source, 30), first);
        assert_eq!(source.capacity(), 32);
    }

    #[test]
    fn mark_accepts_max_limit() {
        let data = bytes(50);
        let mut source = BufferedSource::with_capacity(4, SliceSource::new(&data[..])).unwrap();
        source.mark(usize::MAX);
        let first = read_n(&mut source, 10);
        source.reset().unwrap();
        assert_eq!(read_n(&mut source, 10), first);
        assert_eq!(read_n(&mut source, 40), &data[10..]);
    }

    #[test]
    fn reset_without_mark() {
        let mut source = BufferedSource::new(SliceSource::new(b"abc".as_ref()));
        assert!(matches!(source.reset(), Err(Error::MarkNotSet)));
    }

    #[test]
    fn refill_past_limit_invalidates_mark() {
        let mut source =
            BufferedSource::with_capacity(4, SliceSource::new(b"abcdefghij".as_ref())).unwrap();
        source.mark(2);
        assert_eq!(read_n(&mut source, 4), b"abcd");
        assert_eq!(source.read_one().unwrap(), Some(b'e'));
        let err = source.reset().unwrap_err();
        assert!(matches!(err, Error::MarkInvalidated));
        assert!(err.is_io());
    }

    #[test]
    fn reset_after_close() {
        let mut source = BufferedSource::new(SliceSource::new(b"abc".as_ref()));
        source.mark(10);
        source.close().unwrap();
        assert!(matches!(source.reset(), Err(Error::Closed)));
        assert!(matches!(source.read_one(), Err(Error::Closed)));
    }

    #[test]
    fn available_fails_once_closed() {
        let mut source = BufferedSource::new(SliceSource::new(b"hello".as_ref()));
        assert_eq!(source.available().unwrap(), 5);
        assert_eq!(source.read_one().unwrap(), Some(b'h'));
        assert_eq!(source.available().unwrap(), 4);
        source.close().unwrap();
        assert!(source.available().unwrap_err().is_io());
        source.close().unwrap();
    }

    #[test]
    fn unattached_defers_errors() {
        let mut source = BufferedSource::<SliceSource<u8>>::unattached();
        assert_eq!(source.skip(0).unwrap(), 0);
        assert!(matches!(source.skip(1), Err(Error::Unattached)));
        assert!(matches!(source.read_one(), Err(Error::Unattached)));
        assert!(source.available().unwrap_err().is_io());
        let mut buf = [0; 4];
        assert!(matches!(
            source.read_range(&mut buf, 0, 4),
            Err(Error::Unattached)
        ));
        assert_eq!(source.read_range(&mut buf, 0, 0).unwrap().size, 0);
        source.close().unwrap();
    }

    #[test]
    fn large_reads_bypass_the_buffer() {
        let data = bytes(20);
        let mut source = BufferedSource::with_capacity(4, SliceSource::new(&data[..])).unwrap();
        let mut buf = [0; 20];
        let outcome = source.read_range(&mut buf, 0, 20).unwrap();
        assert_eq!(outcome.size, 20);
        assert_eq!(&buf[..], &data[..]);
        assert_eq!(source.buffered(), 0);
        assert!(source.read_range(&mut buf, 0, 20).unwrap().is_eof());
    }

    #[test]
    fn small_reads_go_through_the_buffer() {
        let data = bytes(20);
        let mut source = BufferedSource::with_capacity(8, SliceSource::new(&data[..])).unwrap();
        let mut buf = [0; 10];
        let outcome = source.read_range(&mut buf, 2, 3).unwrap();
        assert_eq!(outcome.size, 3);
        assert_eq!(&buf[2..5], &data[..3]);
        assert_eq!(source.buffered(), 5);
    }

    #[test]
    fn skip_within_and_beyond_buffer() {
        let data = bytes(100);
        let mut source = BufferedSource::with_capacity(10, SliceSource::new(&data[..])).unwrap();
        assert_eq!(source.read_one().unwrap(), Some(data[0]));
        assert_eq!(source.skip(4).unwrap(), 4);
        assert_eq!(source.read_one().unwrap(), Some(data[5]));
        assert_eq!(source.skip(50).unwrap(), 50);
        assert_eq!(source.read_one().unwrap(), Some(data[56]));
        assert_eq!(source.skip(1000).unwrap(), 43);
        assert_eq!(source.read_one().unwrap(), None);
    }

    #[test]
    fn skip_inside_mark_window_keeps_mark() {
        let data = bytes(100);
        let mut source = BufferedSource::with_capacity(10, SliceSource::new(&data[..])).unwrap();
        source.mark(30);
        assert_eq!(source.skip(15).unwrap(), 15);
        source.reset().unwrap();
        assert_eq!(source.read_one().unwrap(), Some(data[0]));
    }

    #[test]
    fn skip_past_mark_limit_invalidates_mark() {
        let data = bytes(100);
        let mut source = BufferedSource::with_capacity(10, SliceSource::new(&data[..])).unwrap();
        source.mark(5);
        assert_eq!(source.skip(20).unwrap(), 20);
        assert!(matches!(source.reset(), Err(Error::MarkInvalidated)));
        assert_eq!(source.read_one().unwrap(), Some(data[20]));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let result = BufferedSource::with_capacity(0, SliceSource::new(b"x".as_ref()));
        assert_eq!(
            result.err().map(|e| e.category()),
            Some(ErrorCategory::InvalidArgument)
        );
    }

    #[rstest]
    #[case(0, 11)]
    #[case(1, 10)]
    #[case(10, 1)]
    #[case(11, 0)]
    #[case(usize::MAX, 1)]
    fn out_of_bounds_ranges(#[case] offset: usize, #[case] len: usize) {
        let mut source = BufferedSource::new(SliceSource::new(b"abc".as_ref()));
        let mut buf = [0; 10];
        let err = source.read_range(&mut buf, offset, len).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Bounds);

        source.close().unwrap();
        let err = source.read_range(&mut buf, offset, len).unwrap_err();
        assert!(matches!(err, Error::Closed));
    }

    #[test]
    fn unit_is_generic() {
        let text: Vec<char> = "héllo".chars().collect();
        let mut source = BufferedSource::with_capacity(2, SliceSource::new(&text[..])).unwrap();
        source.mark(3);
        assert_eq!(read_n(&mut source, 3), vec!['h', 'é', 'l']);
        source.reset().unwrap();
        let mut all = Vec::new();
        source.read_to_end(&mut all).unwrap();
        assert_eq!(all, text);
    }
}
