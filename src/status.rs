/// What is known about a stream in the future.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Status {
    /// The stream remains open.
    Open(Readiness),

    /// The stream has ended. No more units will be transmitted.
    End,
}

impl Status {
    /// Return `Status::Open` with readiness state `Ready`.
    #[inline]
    pub fn ready() -> Self {
        Self::Open(Readiness::Ready)
    }

    /// Return either `Status::Open` with readiness state `Ready` or
    /// `Status::End`.
    #[inline]
    pub fn ready_or_not(ready: bool) -> Self {
        if ready {
            Self::Open(Readiness::Ready)
        } else {
            Self::End
        }
    }

    /// Shorthand for testing equality with `Status::End`.
    #[inline]
    pub fn is_end(&self) -> bool {
        *self == Self::End
    }
}

/// Whether a stream is ready or in a temporary lull. Most users can
/// ignore this.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Readiness {
    /// There may be more units waiting to be read.
    Ready,

    /// Nothing more is waiting to be read right now, though more may arrive
    /// later, as with a drained pipe whose writer is still open.
    Lull,
}

/// Information returned after a successful read.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReadOutcome {
    /// The number of units read.
    pub size: usize,

    /// What to expect from future reads from the stream.
    pub status: Status,
}

impl ReadOutcome {
    /// Data was read on a stream which remains open.
    #[inline]
    pub fn ready(size: usize) -> Self {
        Self {
            size,
            status: Status::ready(),
        }
    }

    /// Data was read on a stream which may or may not remain open.
    #[inline]
    pub fn ready_or_not(size: usize, ready: bool) -> Self {
        Self {
            size,
            status: Status::ready_or_not(ready),
        }
    }

    /// Data was read on a stream which is now closed.
    #[inline]
    pub fn end(size: usize) -> Self {
        Self {
            size,
            status: Status::End,
        }
    }

    /// Data was read on a stream which is now at a lull.
    #[inline]
    pub fn lull(size: usize) -> Self {
        Self {
            size,
            status: Status::Open(Readiness::Lull),
        }
    }

    /// True when nothing was read and nothing more ever will be.
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.size == 0 && self.status.is_end()
    }
}
