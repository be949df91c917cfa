use crate::{ReadOutcome, Result, Source};
use std::io;

/// Adapts a `&[T]` to implement `Source`.
pub struct SliceSource<'slice, T> {
    slice: &'slice [T],
    ended: bool,
}

impl<'slice, T: Copy + Default> SliceSource<'slice, T> {
    /// Construct a new `SliceSource` which wraps `slice`.
    pub fn new(slice: &'slice [T]) -> Self {
        Self {
            slice,
            ended: false,
        }
    }

    /// The units not yet read.
    pub fn remaining(&self) -> &'slice [T] {
        self.slice
    }
}

impl<'slice, T: Copy + Default> Source for SliceSource<'slice, T> {
    type Unit = T;

    #[inline]
    fn read_outcome(&mut self, buf: &mut [T]) -> Result<ReadOutcome> {
        if self.ended {
            return Ok(ReadOutcome::end(0));
        }

        let size = buf.len().min(self.slice.len());
        let (head, tail) = self.slice.split_at(size);
        buf[..size].copy_from_slice(head);
        self.slice = tail;
        Ok(ReadOutcome::ready_or_not(
            size,
            buf.is_empty() || !self.slice.is_empty(),
        ))
    }

    #[inline]
    fn available(&self) -> Result<usize> {
        if self.ended {
            return Ok(0);
        }
        Ok(self.slice.len())
    }

    #[inline]
    fn skip(&mut self, n: usize) -> Result<usize> {
        if self.ended {
            return Ok(0);
        }
        let n = n.min(self.slice.len());
        self.slice = &self.slice[n..];
        Ok(n)
    }

    #[inline]
    fn close(&mut self) -> Result<()> {
        self.ended = true;
        Ok(())
    }
}

impl<'slice> io::Read for SliceSource<'slice, u8> {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.read_outcome(buf)?.size)
    }
}
