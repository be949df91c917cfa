use crate::{error::check_range, Error, Result, Sink, DEFAULT_BUFFER_SIZE};
use log::{debug, trace, warn};
use std::io;

/// A `Sink` which collects small writes into a fixed-size buffer and hands
/// them to an inner `Sink` in larger chunks.
///
/// Writes at least as large as the buffer bypass it: pending units are
/// flushed first, then the new units go straight to the inner sink. A write
/// that doesn't fit in the remaining space flushes pending units before
/// being buffered. The buffer is left full between calls only after a
/// failed flush, and the next write retries that flush first.
///
/// Like [`BufferedSource`](crate::BufferedSource), a `BufferedSink` may be
/// constructed without an inner sink; operations that must reach the sink
/// then fail with [`Error::NullArgument`].
pub struct BufferedSink<S: Sink> {
    inner: Option<S>,
    buf: Vec<S::Unit>,
    capacity: usize,
    closed: bool,
}

impl<S: Sink> BufferedSink<S> {
    /// Construct a new `BufferedSink` wrapping `inner` with a buffer of
    /// [`DEFAULT_BUFFER_SIZE`] units.
    pub fn new(inner: S) -> Self {
        Self::build(Some(inner), DEFAULT_BUFFER_SIZE)
    }

    /// Construct a new `BufferedSink` wrapping `inner` with a buffer of
    /// `capacity` units. Fails if `capacity` is zero.
    pub fn with_capacity(capacity: usize, inner: S) -> Result<Self> {
        Self::checked(Some(inner), capacity)
    }

    /// Construct a `BufferedSink` with no inner sink.
    pub fn unattached() -> Self {
        Self::build(None, DEFAULT_BUFFER_SIZE)
    }

    /// Construct a `BufferedSink` with no inner sink and a buffer of
    /// `capacity` units. Fails if `capacity` is zero.
    pub fn unattached_with_capacity(capacity: usize) -> Result<Self> {
        Self::checked(None, capacity)
    }

    fn checked(inner: Option<S>, capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidBufferSize(capacity));
        }
        Ok(Self::build(inner, capacity))
    }

    fn build(inner: Option<S>, capacity: usize) -> Self {
        Self {
            inner,
            buf: Vec::with_capacity(capacity),
            capacity,
            closed: false,
        }
    }

    /// Gets a reference to the underlying sink.
    pub fn get_ref(&self) -> Option<&S> {
        self.inner.as_ref()
    }

    /// Gets a mutable reference to the underlying sink.
    ///
    /// It is inadvisable to directly write to the underlying sink.
    pub fn get_mut(&mut self) -> Option<&mut S> {
        self.inner.as_mut()
    }

    /// Flush pending units and return the underlying sink.
    pub fn into_inner(mut self) -> Result<S> {
        self.flush_buffer()?;
        self.inner.take().ok_or(Error::NullArgument("sink"))
    }

    /// The buffer size chosen at construction.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The number of units written but not yet passed to the inner sink.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Append one unit, flushing the buffer if that fills it.
    pub fn write_one(&mut self, unit: S::Unit) -> Result<()> {
        self.ensure_open()?;
        // A failed flush leaves the buffer full.
        if self.buf.len() >= self.capacity {
            self.flush_buffer()?;
        }
        self.buf.push(unit);
        if self.buf.len() == self.capacity {
            self.flush_buffer()?;
        }
        Ok(())
    }

    /// Write `buf[offset..offset + len]`.
    pub fn write_range(&mut self, buf: &[S::Unit], offset: usize, len: usize) -> Result<()> {
        self.ensure_open()?;
        check_range(offset, len, buf.len())?;
        let src = &buf[offset..offset + len];

        if len >= self.capacity {
            self.flush_buffer()?;
            let inner = self.inner.as_mut().ok_or(Error::NullArgument("sink"))?;
            trace!("writing {} units directly, bypassing the buffer", len);
            return inner.write_all(src);
        }

        if len > self.capacity.saturating_sub(self.buf.len()) {
            self.flush_buffer()?;
        }
        self.buf.extend_from_slice(src);
        if self.buf.len() == self.capacity {
            self.flush_buffer()?;
        }
        Ok(())
    }

    /// Pass pending units to the inner sink and flush it. Flushing a closed
    /// stream does nothing.
    pub fn flush(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.flush_buffer()?;
        self.inner
            .as_mut()
            .ok_or(Error::NullArgument("sink"))?
            .flush()
    }

    /// Flush, close the inner sink, and release the buffer. The stream is
    /// closed afterwards even if flushing fails.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        let flushed = self.flush();
        self.closed = true;
        self.buf = Vec::new();
        debug!("buffered sink closed");
        let closed = match self.inner.as_mut() {
            Some(inner) => inner.close(),
            None => Ok(()),
        };
        flushed.and(closed)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(Error::Closed)
        } else {
            Ok(())
        }
    }

    fn flush_buffer(&mut self) -> Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let inner = self.inner.as_mut().ok_or(Error::NullArgument("sink"))?;
        trace!("flushing {} buffered units", self.buf.len());
        inner.write_all(&self.buf)?;
        self.buf.clear();
        Ok(())
    }
}

impl<S: Sink> Drop for BufferedSink<S> {
    fn drop(&mut self) {
        if !self.closed && self.inner.is_some() {
            if let Err(e) = self.flush_buffer() {
                warn!("dropping {} unflushed units: {}", self.buf.len(), e);
            }
        }
    }
}

impl<S: Sink> Sink for BufferedSink<S> {
    type Unit = S::Unit;

    #[inline]
    fn write(&mut self, buf: &[S::Unit]) -> Result<usize> {
        self.write_range(buf, 0, buf.len())?;
        Ok(buf.len())
    }

    #[inline]
    fn flush(&mut self) -> Result<()> {
        BufferedSink::flush(self)
    }

    #[inline]
    fn close(&mut self) -> Result<()> {
        BufferedSink::close(self)
    }

    #[inline]
    fn write_one(&mut self, unit: S::Unit) -> Result<()> {
        BufferedSink::write_one(self, unit)
    }

    #[inline]
    fn write_all(&mut self, buf: &[S::Unit]) -> Result<()> {
        self.write_range(buf, 0, buf.len())
    }
}

impl<S: Sink<Unit = u8>> io::Write for BufferedSink<S> {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(Sink::write(self, buf)?)
    }

    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        Ok(BufferedSink::flush(self)?)
    }
}
