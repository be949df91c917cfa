use crate::{Error, ReadOutcome, Result, Source};
#[cfg(unix)]
use std::os::unix::io::{AsRawFd, RawFd};
use std::io;

/// Adapts an `io::Read` to implement `Source`.
pub struct StdSource<Inner: io::Read> {
    inner: Inner,
    #[cfg(unix)]
    fd: Option<RawFd>,
    ended: bool,
}

#[cfg(unix)]
impl<Inner: io::Read + AsRawFd> StdSource<Inner> {
    /// Construct a new `StdSource` which wraps `inner`, which implements
    /// `AsRawFd`, so that `available` can ask the OS how many bytes are
    /// pending.
    pub fn new(inner: Inner) -> Self {
        let fd = inner.as_raw_fd();
        Self {
            inner,
            fd: Some(fd),
            ended: false,
        }
    }
}

#[cfg(not(unix))]
impl<Inner: io::Read> StdSource<Inner> {
    /// Construct a new `StdSource` which wraps `inner`.
    pub fn new(inner: Inner) -> Self {
        StdSource::generic(inner)
    }
}

impl<Inner: io::Read> StdSource<Inner> {
    /// Construct a new `StdSource` which wraps `inner` with generic settings.
    /// `available` always reports zero.
    pub fn generic(inner: Inner) -> Self {
        Self {
            inner,
            #[cfg(unix)]
            fd: None,
            ended: false,
        }
    }

    /// Gets a reference to the underlying reader.
    pub fn get_ref(&self) -> &Inner {
        &self.inner
    }
}

impl<Inner: io::Read> Source for StdSource<Inner> {
    type Unit = u8;

    #[inline]
    fn read_outcome(&mut self, buf: &mut [u8]) -> Result<ReadOutcome> {
        if self.ended {
            return Ok(ReadOutcome::end(0));
        }
        match self.inner.read(buf) {
            Ok(0) if !buf.is_empty() => {
                self.ended = true;
                Ok(ReadOutcome::end(0))
            }
            Ok(size) => Ok(ReadOutcome::ready(size)),
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => Ok(ReadOutcome::ready(0)),
            Err(e) => Err(Error::Io(e)),
        }
    }

    fn available(&self) -> Result<usize> {
        if self.ended {
            return Ok(0);
        }
        #[cfg(unix)]
        if let Some(fd) = self.fd {
            return pending_bytes(fd);
        }
        Ok(0)
    }

    #[inline]
    fn close(&mut self) -> Result<()> {
        self.ended = true;
        Ok(())
    }
}

#[cfg(unix)]
fn pending_bytes(fd: RawFd) -> Result<usize> {
    let mut pending: libc::c_int = 0;
    let rc = unsafe { libc::ioctl(fd, libc::FIONREAD, &mut pending) };
    if rc == 0 {
        Ok(pending.max(0) as usize)
    } else {
        // Regular files and some devices don't support `FIONREAD`.
        Ok(0)
    }
}

#[test]
fn test_std_source() {
    let mut input = io::Cursor::new(b"hello world");
    let mut source = StdSource::generic(&mut input);
    let mut v = Vec::new();
    source.read_to_end(&mut v).unwrap();
    assert_eq!(v, b"hello world");
    assert_eq!(source.available().unwrap(), 0);
}

#[cfg(unix)]
#[test]
fn test_std_source_available() {
    use crate::BufferedSource;
    use std::{io::Write, os::unix::net::UnixStream};

    let (mut tx, rx) = UnixStream::pair().unwrap();
    tx.write_all(b"0123456789").unwrap();

    let source = StdSource::new(rx);
    assert_eq!(source.available().unwrap(), 10);

    let mut buffered = BufferedSource::with_capacity(4, source).unwrap();
    assert_eq!(buffered.read_one().unwrap(), Some(b'0'));
    assert_eq!(buffered.buffered(), 3);
    assert_eq!(buffered.get_ref().unwrap().available().unwrap(), 6);
    assert_eq!(buffered.available().unwrap(), 9);
}
