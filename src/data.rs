//! Big-endian primitive values and length-prefixed strings over byte
//! streams.
//!
//! Strings use the "modified UTF-8" form: a `u16` byte count followed by
//! UTF-16 code units, each encoded in one to three bytes, with U+0000 taking
//! two bytes so that the encoded form never contains a zero byte.

use crate::{Error, Result, Sink, Source};

/// The largest encoded string `write_utf` accepts.
pub const MAX_UTF_LEN: usize = u16::MAX as usize;

/// Decoding methods for any byte `Source`.
pub trait DataSourceExt: Source<Unit = u8> {
    /// Read one byte; any nonzero value is `true`.
    fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    /// Read one byte.
    fn read_u8(&mut self) -> Result<u8> {
        Ok(read_array::<_, 1>(self)?[0])
    }

    /// Read one byte as a signed value.
    fn read_i8(&mut self) -> Result<i8> {
        Ok(i8::from_be_bytes(read_array(self)?))
    }

    /// Read a big-endian `u16`.
    fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(read_array(self)?))
    }

    /// Read a big-endian `i16`.
    fn read_i16(&mut self) -> Result<i16> {
        Ok(i16::from_be_bytes(read_array(self)?))
    }

    /// Read a big-endian `i32`.
    fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_be_bytes(read_array(self)?))
    }

    /// Read a big-endian `i64`.
    fn read_i64(&mut self) -> Result<i64> {
        Ok(i64::from_be_bytes(read_array(self)?))
    }

    /// Read a big-endian IEEE 754 `f32`.
    fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(u32::from_be_bytes(read_array(self)?)))
    }

    /// Read a big-endian IEEE 754 `f64`.
    fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_bits(u64::from_be_bytes(read_array(self)?)))
    }

    /// Read a length-prefixed modified UTF-8 string.
    fn read_utf(&mut self) -> Result<String> {
        let len = usize::from(self.read_u16()?);
        let mut bytes = vec![0; len];
        Source::read_exact(self, &mut bytes)?;
        decode_modified_utf8(&bytes)
    }
}

impl<S: Source<Unit = u8> + ?Sized> DataSourceExt for S {}

/// Encoding methods for any byte `Sink`.
pub trait DataSinkExt: Sink<Unit = u8> {
    /// Write `1` for `true`, `0` for `false`.
    fn write_bool(&mut self, v: bool) -> Result<()> {
        self.write_u8(v as u8)
    }

    /// Write one byte.
    fn write_u8(&mut self, v: u8) -> Result<()> {
        self.write_all(&[v])
    }

    /// Write one signed byte.
    fn write_i8(&mut self, v: i8) -> Result<()> {
        self.write_all(&v.to_be_bytes())
    }

    /// Write a big-endian `u16`.
    fn write_u16(&mut self, v: u16) -> Result<()> {
        self.write_all(&v.to_be_bytes())
    }

    /// Write a big-endian `i16`.
    fn write_i16(&mut self, v: i16) -> Result<()> {
        self.write_all(&v.to_be_bytes())
    }

    /// Write a big-endian `i32`.
    fn write_i32(&mut self, v: i32) -> Result<()> {
        self.write_all(&v.to_be_bytes())
    }

    /// Write a big-endian `i64`.
    fn write_i64(&mut self, v: i64) -> Result<()> {
        self.write_all(&v.to_be_bytes())
    }

    /// Write a big-endian IEEE 754 `f32`.
    fn write_f32(&mut self, v: f32) -> Result<()> {
        self.write_all(&v.to_bits().to_be_bytes())
    }

    /// Write a big-endian IEEE 754 `f64`.
    fn write_f64(&mut self, v: f64) -> Result<()> {
        self.write_all(&v.to_bits().to_be_bytes())
    }

    /// Write `s` as a length-prefixed modified UTF-8 string. Fails if the
    /// encoded form is longer than [`MAX_UTF_LEN`] bytes; nothing is written
    /// in that case.
    fn write_utf(&mut self, s: &str) -> Result<()> {
        let encoded = encode_modified_utf8(s);
        if encoded.len() > MAX_UTF_LEN {
            return Err(Error::Malformed(format!(
                "encoded string too long: {} bytes",
                encoded.len()
            )));
        }
        self.write_u16(encoded.len() as u16)?;
        self.write_all(&encoded)
    }
}

impl<S: Sink<Unit = u8> + ?Sized> DataSinkExt for S {}

fn read_array<S: Source<Unit = u8> + ?Sized, const N: usize>(source: &mut S) -> Result<[u8; N]> {
    let mut bytes = [0; N];
    Source::read_exact(source, &mut bytes)?;
    Ok(bytes)
}

fn encode_modified_utf8(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    for unit in s.encode_utf16() {
        match unit {
            0x0001..=0x007f => out.push(unit as u8),
            0x0000 | 0x0080..=0x07ff => {
                out.push(0xc0 | (unit >> 6) as u8);
                out.push(0x80 | (unit & 0x3f) as u8);
            }
            _ => {
                out.push(0xe0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3f) as u8);
                out.push(0x80 | (unit & 0x3f) as u8);
            }
        }
    }
    out
}

fn decode_modified_utf8(bytes: &[u8]) -> Result<String> {
    let mut units = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let lead = u16::from(bytes[i]);
        match bytes[i] >> 4 {
            0x0..=0x7 => {
                units.push(lead);
                i += 1;
            }
            0xc | 0xd => {
                let b = continuation(bytes, i + 1)?;
                units.push(((lead & 0x1f) << 6) | b);
                i += 2;
            }
            0xe => {
                let b = continuation(bytes, i + 1)?;
                let c = continuation(bytes, i + 2)?;
                units.push(((lead & 0x0f) << 12) | (b << 6) | c);
                i += 3;
            }
            _ => {
                return Err(Error::Malformed(format!(
                    "invalid lead byte {:#04x} at {}",
                    bytes[i], i
                )))
            }
        }
    }
    String::from_utf16(&units).map_err(|e| Error::Malformed(e.to_string()))
}

fn continuation(bytes: &[u8], i: usize) -> Result<u16> {
    match bytes.get(i) {
        Some(&b) if b & 0xc0 == 0x80 => Ok(u16::from(b & 0x3f)),
        Some(&b) => Err(Error::Malformed(format!(
            "invalid continuation byte {:#04x} at {}",
            b, i
        ))),
        None => Err(Error::Malformed("truncated character".to_string())),
    }
}
