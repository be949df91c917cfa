use crate::{Error, Result, Sink};
use std::io;

/// A `Sink` which appends everything written to it to a `Vec`.
#[derive(Debug, Default)]
pub struct VecSink<T> {
    vec: Vec<T>,
    closed: bool,
}

impl<T: Copy + Default> VecSink<T> {
    /// Construct an empty `VecSink`.
    pub fn new() -> Self {
        Self {
            vec: Vec::new(),
            closed: false,
        }
    }

    /// Everything written so far.
    pub fn as_slice(&self) -> &[T] {
        &self.vec
    }

    /// The number of units written so far.
    pub fn len(&self) -> usize {
        self.vec.len()
    }

    /// True if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.vec.is_empty()
    }

    /// Return the collected units.
    pub fn into_inner(self) -> Vec<T> {
        self.vec
    }
}

impl VecSink<char> {
    /// Everything written so far, as a `String`.
    pub fn to_text(&self) -> String {
        self.vec.iter().collect()
    }
}

impl<T: Copy + Default> Sink for VecSink<T> {
    type Unit = T;

    #[inline]
    fn write(&mut self, buf: &[T]) -> Result<usize> {
        if self.closed {
            return Err(Error::Closed);
        }
        self.vec.extend_from_slice(buf);
        Ok(buf.len())
    }

    #[inline]
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    #[inline]
    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

impl io::Write for VecSink<u8> {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(Sink::write(self, buf)?)
    }

    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
