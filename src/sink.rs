use crate::{Error, Result};
use std::io;

/// A writable stream of units, like [`std::io::Write`] but generic over the
/// unit type and with an explicit `close`.
pub trait Sink {
    /// The element type: `u8` for byte streams, `char` for character streams.
    type Unit: Copy + Default;

    /// Like [`std::io::Write::write`].
    fn write(&mut self, buf: &[Self::Unit]) -> Result<usize>;

    /// Push any units held by this stream or its inner streams onward.
    fn flush(&mut self) -> Result<()>;

    /// Flush, then release the stream. Further writes fail.
    fn close(&mut self) -> Result<()>;

    /// Write a single unit.
    fn write_one(&mut self, unit: Self::Unit) -> Result<()> {
        self.write_all(&[unit])
    }

    /// Like [`std::io::Write::write_all`].
    fn write_all(&mut self, buf: &[Self::Unit]) -> Result<()> {
        default_write_all(self, buf)
    }
}

impl<S: Sink + ?Sized> Sink for &mut S {
    type Unit = S::Unit;

    #[inline]
    fn write(&mut self, buf: &[Self::Unit]) -> Result<usize> {
        (**self).write(buf)
    }

    #[inline]
    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    #[inline]
    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    #[inline]
    fn write_all(&mut self, buf: &[Self::Unit]) -> Result<()> {
        (**self).write_all(buf)
    }
}

/// Default implementation of `Sink::write_all`.
pub fn default_write_all<Inner: Sink + ?Sized>(
    inner: &mut Inner,
    mut buf: &[Inner::Unit],
) -> Result<()> {
    while !buf.is_empty() {
        match inner.write(buf) {
            Ok(0) => {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "failed to write whole buffer",
                )));
            }
            Ok(n) => buf = &buf[n..],
            Err(Error::Io(ref e)) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
