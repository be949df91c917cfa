use crate::{BufferedSink, BufferedSource, ReadOutcome, Result, Sink, Source};

/// A `Source` of the `char`s of a string.
pub struct StrSource {
    chars: Vec<char>,
    position: usize,
    ended: bool,
}

impl StrSource {
    /// Construct a new `StrSource` which reads the scalar values of `s`.
    pub fn new(s: &str) -> Self {
        Self {
            chars: s.chars().collect(),
            position: 0,
            ended: false,
        }
    }
}

impl Source for StrSource {
    type Unit = char;

    fn read_outcome(&mut self, buf: &mut [char]) -> Result<ReadOutcome> {
        if self.ended {
            return Ok(ReadOutcome::end(0));
        }
        let rest = &self.chars[self.position..];
        let size = buf.len().min(rest.len());
        buf[..size].copy_from_slice(&rest[..size]);
        self.position += size;
        Ok(ReadOutcome::ready_or_not(
            size,
            buf.is_empty() || self.position < self.chars.len(),
        ))
    }

    fn available(&self) -> Result<usize> {
        if self.ended {
            return Ok(0);
        }
        Ok(self.chars.len() - self.position)
    }

    fn close(&mut self) -> Result<()> {
        self.ended = true;
        Ok(())
    }
}

impl<S: Source<Unit = char>> BufferedSource<S> {
    /// Read a line of text. A line ends with `'\n'`, `'\r'`, or `"\r\n"`;
    /// the terminator is not included. Returns `None` at the end of the
    /// stream.
    pub fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        loop {
            match self.read_one()? {
                None if line.is_empty() => return Ok(None),
                None | Some('\n') => return Ok(Some(line)),
                Some('\r') => {
                    if self.peek_one()? == Some('\n') {
                        self.read_one()?;
                    }
                    return Ok(Some(line));
                }
                Some(c) => line.push(c),
            }
        }
    }

    /// An iterator over the remaining lines.
    pub fn lines(&mut self) -> Lines<'_, S> {
        Lines { source: self }
    }
}

/// Iterator returned by [`BufferedSource::lines`].
pub struct Lines<'a, S: Source<Unit = char>> {
    source: &'a mut BufferedSource<S>,
}

impl<'a, S: Source<Unit = char>> Iterator for Lines<'a, S> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.source.read_line().transpose()
    }
}

impl<S: Sink<Unit = char>> BufferedSink<S> {
    /// Write the scalar values of `s`.
    pub fn write_str(&mut self, s: &str) -> Result<()> {
        let chars: Vec<char> = s.chars().collect();
        self.write_range(&chars, 0, chars.len())
    }

    /// Write a line separator.
    pub fn new_line(&mut self) -> Result<()> {
        self.write_one('\n')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VecSink;

    #[test]
    fn splits_on_every_terminator() {
        let mut source = BufferedSource::new(StrSource::new("a\nb\r\nc\rd"));
        let lines: Vec<String> = source.lines().collect::<Result<_>>().unwrap();
        assert_eq!(lines, ["a", "b", "c", "d"]);
        assert_eq!(source.read_line().unwrap(), None);
    }

    #[test]
    fn crlf_across_a_refill() {
        let mut source = BufferedSource::with_capacity(2, StrSource::new("x\r\ny")).unwrap();
        assert_eq!(source.read_line().unwrap().as_deref(), Some("x"));
        assert_eq!(source.read_line().unwrap().as_deref(), Some("y"));
        assert_eq!(source.read_line().unwrap(), None);
    }

    #[test]
    fn empty_lines() {
        let mut source = BufferedSource::new(StrSource::new("\n\nz\n"));
        assert_eq!(source.read_line().unwrap().as_deref(), Some(""));
        assert_eq!(source.read_line().unwrap().as_deref(), Some(""));
        assert_eq!(source.read_line().unwrap().as_deref(), Some("z"));
        assert_eq!(source.read_line().unwrap(), None);
    }

    #[test]
    fn writes_text() {
        let mut sink = BufferedSink::with_capacity(4, VecSink::<char>::new()).unwrap();
        sink.write_str("héllo").unwrap();
        sink.new_line().unwrap();
        sink.write_str("wörld").unwrap();
        sink.flush().unwrap();
        assert_eq!(sink.get_ref().unwrap().to_text(), "héllo\nwörld");
    }
}
