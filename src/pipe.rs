//! A bounded in-memory pipe between a writing thread and a reading thread.
//!
//! Both ends share a ring buffer guarded by one mutex. Readers wait on a
//! data-ready condition and writers on a space-ready condition; each side
//! wakes the other after making progress. Closing or dropping either end
//! wakes the other as well, so a writer blocked on a full pipe whose reader
//! goes away fails with [`Error::BrokenPipe`], and a reader blocked on an
//! empty pipe whose writer goes away sees the end of the stream.

use crate::{Error, ReadOutcome, Result, Sink, Source};
use log::debug;
use parking_lot::{Condvar, Mutex};
use std::{io, sync::Arc};

/// Ring capacity used when none is given.
pub const DEFAULT_PIPE_SIZE: usize = 1024;

/// Fixed-capacity circular buffer plus connection state.
struct Ring<T> {
    buf: Box<[T]>,
    read_pos: usize,
    len: usize,
    connected: bool,
    reader_closed: bool,
    writer_closed: bool,
}

impl<T: Copy> Ring<T> {
    fn capacity(&self) -> usize {
        self.buf.len()
    }

    fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Copy as much of `src` as fits, returning how much was copied.
    fn push(&mut self, src: &[T]) -> usize {
        let n = src.len().min(self.capacity() - self.len);
        let write_pos = (self.read_pos + self.len) % self.capacity();
        let first = n.min(self.capacity() - write_pos);
        self.buf[write_pos..write_pos + first].copy_from_slice(&src[..first]);
        self.buf[..n - first].copy_from_slice(&src[first..n]);
        self.len += n;
        n
    }

    /// Move up to `dst.len()` units out, returning how many were moved.
    fn pop(&mut self, dst: &mut [T]) -> usize {
        let n = dst.len().min(self.len);
        let first = n.min(self.capacity() - self.read_pos);
        dst[..first].copy_from_slice(&self.buf[self.read_pos..self.read_pos + first]);
        dst[first..n].copy_from_slice(&self.buf[..n - first]);
        self.read_pos = (self.read_pos + n) % self.capacity();
        self.len -= n;
        n
    }
}

struct Shared<T> {
    ring: Mutex<Ring<T>>,
    data_ready: Condvar,
    space_ready: Condvar,
}

impl<T> Shared<T> {
    /// Discard buffered units and wake both sides.
    fn close_reader(&self) {
        let mut ring = self.ring.lock();
        ring.reader_closed = true;
        ring.len = 0;
        self.space_ready.notify_all();
        self.data_ready.notify_all();
        debug!("pipe reader closed");
    }

    /// Let the reader drain what is left and then see the end.
    fn close_writer(&self) {
        self.ring.lock().writer_closed = true;
        self.data_ready.notify_all();
        debug!("pipe writer closed");
    }
}

/// Create a connected pipe with a ring of [`DEFAULT_PIPE_SIZE`] units.
pub fn pipe<T: Copy + Default>() -> (PipeWriter<T>, PipeReader<T>) {
    let reader = PipeReader::new();
    let writer = PipeWriter::attached(&reader);
    (writer, reader)
}

/// Create a connected pipe with a ring of `capacity` units. Fails if
/// `capacity` is zero.
pub fn pipe_with_capacity<T: Copy + Default>(
    capacity: usize,
) -> Result<(PipeWriter<T>, PipeReader<T>)> {
    let reader = PipeReader::with_capacity(capacity)?;
    let writer = PipeWriter::attached(&reader);
    Ok((writer, reader))
}

/// The reading end of a pipe. It owns the ring buffer.
pub struct PipeReader<T> {
    shared: Arc<Shared<T>>,
    closed: bool,
}

impl<T: Copy + Default> PipeReader<T> {
    /// Construct an unconnected reader with a ring of
    /// [`DEFAULT_PIPE_SIZE`] units.
    pub fn new() -> Self {
        Self::build(DEFAULT_PIPE_SIZE)
    }

    /// Construct an unconnected reader with a ring of `capacity` units.
    /// Fails if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidBufferSize(capacity));
        }
        Ok(Self::build(capacity))
    }

    fn build(capacity: usize) -> Self {
        let ring = Ring {
            buf: vec![T::default(); capacity].into_boxed_slice(),
            read_pos: 0,
            len: 0,
            connected: false,
            reader_closed: false,
            writer_closed: false,
        };
        Self {
            shared: Arc::new(Shared {
                ring: Mutex::new(ring),
                data_ready: Condvar::new(),
                space_ready: Condvar::new(),
            }),
            closed: false,
        }
    }

    /// Connect `writer` to this reader.
    pub fn connect(&self, writer: &mut PipeWriter<T>) -> Result<()> {
        writer.connect(self)
    }

    /// The ring capacity.
    pub fn capacity(&self) -> usize {
        self.shared.ring.lock().capacity()
    }

    /// The number of units waiting in the ring. Zero when unconnected or
    /// closed.
    pub fn available(&self) -> usize {
        let ring = self.shared.ring.lock();
        if !ring.connected || ring.reader_closed {
            return 0;
        }
        ring.len
    }

    /// Read at least one unit into `buf`, blocking until data arrives or the
    /// writer closes. Returns `Status::End` once the writer has closed and
    /// the ring is drained.
    pub fn read_outcome(&mut self, buf: &mut [T]) -> Result<ReadOutcome> {
        let shared = &*self.shared;
        let mut ring = shared.ring.lock();
        if self.closed {
            return Err(Error::Closed);
        }
        if !ring.connected {
            return Err(Error::NotConnected);
        }
        if buf.is_empty() {
            return Ok(ReadOutcome::ready(0));
        }

        while ring.len == 0 {
            if ring.writer_closed {
                return Ok(ReadOutcome::end(0));
            }
            shared.data_ready.wait(&mut ring);
        }
        let n = ring.pop(buf);
        shared.space_ready.notify_all();

        Ok(if ring.len > 0 {
            ReadOutcome::ready(n)
        } else if ring.writer_closed {
            ReadOutcome::end(n)
        } else {
            ReadOutcome::lull(n)
        })
    }

    /// Close the reader, discarding anything still in the ring. A writer
    /// blocked on a full ring wakes up with [`Error::BrokenPipe`].
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.shared.close_reader();
    }
}

impl<T: Copy + Default> Default for PipeReader<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for PipeReader<T> {
    fn drop(&mut self) {
        if !self.closed {
            self.shared.close_reader();
        }
    }
}

impl<T: Copy + Default> Source for PipeReader<T> {
    type Unit = T;

    #[inline]
    fn read_outcome(&mut self, buf: &mut [T]) -> Result<ReadOutcome> {
        PipeReader::read_outcome(self, buf)
    }

    #[inline]
    fn available(&self) -> Result<usize> {
        Ok(PipeReader::available(self))
    }

    #[inline]
    fn close(&mut self) -> Result<()> {
        PipeReader::close(self);
        Ok(())
    }
}

impl io::Read for PipeReader<u8> {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.read_outcome(buf)?.size)
    }
}

/// The writing end of a pipe.
pub struct PipeWriter<T> {
    target: Option<Arc<Shared<T>>>,
    closed: bool,
}

impl<T: Copy + Default> PipeWriter<T> {
    /// Construct an unconnected writer.
    pub fn new() -> Self {
        Self {
            target: None,
            closed: false,
        }
    }

    fn attached(reader: &PipeReader<T>) -> Self {
        reader.shared.ring.lock().connected = true;
        Self {
            target: Some(Arc::clone(&reader.shared)),
            closed: false,
        }
    }

    /// Connect this writer to `reader`. Each end may be connected once.
    pub fn connect(&mut self, reader: &PipeReader<T>) -> Result<()> {
        if self.closed {
            return Err(Error::Closed);
        }
        if self.target.is_some() {
            return Err(Error::AlreadyConnected);
        }
        {
            let mut ring = reader.shared.ring.lock();
            if ring.reader_closed {
                return Err(Error::Closed);
            }
            if ring.connected {
                return Err(Error::AlreadyConnected);
            }
            ring.connected = true;
        }
        self.target = Some(Arc::clone(&reader.shared));
        debug!("pipe connected");
        Ok(())
    }

    /// True once `connect` has succeeded.
    pub fn is_connected(&self) -> bool {
        self.target.is_some()
    }

    /// Write all of `buf`, blocking while the ring is full.
    pub fn write(&mut self, buf: &[T]) -> Result<usize> {
        if self.closed {
            return Err(Error::Closed);
        }
        let shared = self.target.as_deref().ok_or(Error::NotConnected)?;
        let mut ring = shared.ring.lock();

        let mut written = 0;
        while written < buf.len() {
            if ring.reader_closed {
                debug!("pipe broken after {} of {} units", written, buf.len());
                return Err(Error::BrokenPipe);
            }
            if ring.is_full() {
                shared.space_ready.wait(&mut ring);
                continue;
            }
            written += ring.push(&buf[written..]);
            shared.data_ready.notify_all();
        }
        Ok(written)
    }

    /// Does nothing: `write` hands every unit to the reader before it
    /// returns.
    pub fn flush(&mut self) {}

    /// Close the writer. The reader drains what is left and then sees the end
    /// of the stream.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Some(shared) = self.target.as_deref() {
            shared.close_writer();
        }
    }
}

impl<T: Copy + Default> Default for PipeWriter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for PipeWriter<T> {
    fn drop(&mut self) {
        if let (false, Some(shared)) = (self.closed, self.target.as_deref()) {
            shared.close_writer();
        }
    }
}

impl<T: Copy + Default> Sink for PipeWriter<T> {
    type Unit = T;

    #[inline]
    fn write(&mut self, buf: &[T]) -> Result<usize> {
        PipeWriter::write(self, buf)
    }

    #[inline]
    fn flush(&mut self) -> Result<()> {
        PipeWriter::flush(self);
        Ok(())
    }

    #[inline]
    fn close(&mut self) -> Result<()> {
        PipeWriter::close(self);
        Ok(())
    }
}

impl io::Write for PipeWriter<u8> {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(PipeWriter::write(self, buf)?)
    }

    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        PipeWriter::flush(self);
        Ok(())
    }
}
