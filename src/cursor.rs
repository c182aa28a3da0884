//! Forward-only big-endian reader that counts what it consumes.

use crate::boxes::FourCC;
use crate::parser::{DecodeError, Result};
use byteorder::{BigEndian, ReadBytesExt};
use std::io::{self, Read};

/// Sequential reader over a byte source.
///
/// Every successful read advances [`ByteCursor::consumed`]. A failed read
/// leaves the counter where the field started, so truncation errors point at
/// the exact field boundary.
pub struct ByteCursor<'a> {
    inner: &'a mut dyn Read,
    consumed: u64,
}

impl<'a> ByteCursor<'a> {
    pub fn new(inner: &'a mut dyn Read) -> Self {
        Self { inner, consumed: 0 }
    }

    /// Like [`ByteCursor::new`], for a source already positioned at `offset`.
    /// Offsets in errors are then absolute.
    pub fn with_offset(inner: &'a mut dyn Read, offset: u64) -> Self {
        Self { inner, consumed: offset }
    }

    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let r = self.inner.read_u8();
        self.track(1, r)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let r = self.inner.read_u16::<BigEndian>();
        self.track(2, r)
    }

    pub fn read_u24(&mut self) -> Result<u32> {
        let r = self.inner.read_u24::<BigEndian>();
        self.track(3, r)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let r = self.inner.read_u32::<BigEndian>();
        self.track(4, r)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let r = self.inner.read_i32::<BigEndian>();
        self.track(4, r)
    }

    pub fn read_tag(&mut self) -> Result<FourCC> {
        let mut typ = [0u8; 4];
        let r = self.inner.read_exact(&mut typ);
        self.track(4, r)?;
        Ok(FourCC(typ))
    }

    /// Read exactly `n` bytes.
    ///
    /// The buffer grows with the data actually delivered, so a bogus length
    /// field cannot force a large allocation up front.
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        let got = (&mut *self.inner).take(n as u64).read_to_end(&mut buf);
        match got {
            Ok(len) if len == n => {
                self.consumed += n as u64;
                Ok(buf)
            }
            Ok(_) => Err(DecodeError::TruncatedInput { offset: self.consumed, needed: n }),
            Err(e) => Err(e.into()),
        }
    }

    fn track<T>(&mut self, needed: usize, res: io::Result<T>) -> Result<T> {
        match res {
            Ok(v) => {
                self.consumed += needed as u64;
                Ok(v)
            }
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                Err(DecodeError::TruncatedInput { offset: self.consumed, needed })
            }
            Err(e) => Err(e.into()),
        }
    }
}
