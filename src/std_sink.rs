use crate::{Error, Result, Sink};
use std::io;

/// Adapts a [`std::io::Write`] to implement [`Sink`].
pub struct StdSink<Inner: io::Write> {
    inner: Inner,
    ended: bool,
}

impl<Inner: io::Write> StdSink<Inner> {
    /// Construct a new instance of `StdSink` wrapping `inner`.
    pub fn new(inner: Inner) -> Self {
        Self {
            inner,
            ended: false,
        }
    }

    /// Gets a reference to the underlying writer.
    pub fn get_ref(&self) -> &Inner {
        &self.inner
    }

    /// Gets a mutable reference to the underlying writer.
    ///
    /// It is inadvisable to directly write to the underlying writer.
    pub fn get_mut(&mut self) -> &mut Inner {
        &mut self.inner
    }
}

impl<Inner: io::Write> Sink for StdSink<Inner> {
    type Unit = u8;

    #[inline]
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        if self.ended {
            return Err(Error::Closed);
        }
        Ok(self.inner.write(buf)?)
    }

    #[inline]
    fn flush(&mut self) -> Result<()> {
        if self.ended {
            return Err(Error::Closed);
        }
        Ok(self.inner.flush()?)
    }

    #[inline]
    fn close(&mut self) -> Result<()> {
        if self.ended {
            return Ok(());
        }
        self.ended = true;
        Ok(self.inner.flush()?)
    }

    #[inline]
    fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        if self.ended {
            return Err(Error::Closed);
        }
        Ok(self.inner.write_all(buf)?)
    }
}

#[test]
fn test_std_sink() {
    let mut sink = StdSink::new(Vec::new());
    sink.write_all(b"hello").unwrap();
    sink.close().unwrap();
    assert!(matches!(sink.write_all(b"!"), Err(Error::Closed)));
    assert_eq!(sink.get_ref(), b"hello");
}
