//! Octet buffer shared by the codecs
//!
//! `Buf` is the cursor every decoder reads from and every encoder writes to.
//! Reads and writes use independent indices, so a test (or the transport
//! glue) can write a record and then decode it from the same buffer.
//!
//! # Example
//! ```ignore
//! use ril_icc::buf::Buf;
//!
//! let mut buf = Buf::new();
//! buf.write_u8(0x81);
//! buf.write_u8(0x10);
//! assert_eq!(buf.read_u8().unwrap(), 0x81);
//! buf.seek_incoming(-1).unwrap();
//! assert_eq!(buf.read_u8().unwrap(), 0x81);
//! ```

mod parcel;

pub use parcel::{Parcel, ParcelSink, request};

use log::warn;
use thiserror::Error;

/// Errors raised by cursor movement
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BufError {
    #[error("Read of {wanted} octet(s) at index {index} overruns buffer of {len} octets")]
    Overrun { index: usize, wanted: usize, len: usize },

    #[error("Seek by {delta} from index {index} leaves buffer of {len} octets")]
    InvalidSeek { index: usize, delta: isize, len: usize },
}

/// Growable octet buffer with separate read and write cursors
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buf {
    data: Vec<u8>,
    read_index: usize,
    write_index: usize,
}

impl Buf {
    /// Two zero octets terminate every framed string.
    pub const STRING_DELIMITER_SIZE: usize = 2;

    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer whose contents are ready to be read
    pub fn from_octets(octets: impl Into<Vec<u8>>) -> Self {
        let data = octets.into();
        let write_index = data.len();
        Self {
            data,
            read_index: 0,
            write_index,
        }
    }

    /// Total number of octets held
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Octets left between the read cursor and the end of the data
    pub fn remaining(&self) -> usize {
        self.data.len() - self.read_index
    }

    pub fn read_index(&self) -> usize {
        self.read_index
    }

    pub fn write_index(&self) -> usize {
        self.write_index
    }

    /// All octets written so far
    pub fn as_octets(&self) -> &[u8] {
        &self.data
    }

    pub fn into_octets(self) -> Vec<u8> {
        self.data
    }

    fn ensure(&self, wanted: usize) -> Result<(), BufError> {
        if self.read_index + wanted > self.data.len() {
            return Err(BufError::Overrun {
                index: self.read_index,
                wanted,
                len: self.data.len(),
            });
        }
        Ok(())
    }

    /// Look at the next octet without consuming it
    pub fn peek_u8(&self) -> Result<u8, BufError> {
        self.ensure(1)?;
        Ok(self.data[self.read_index])
    }

    pub fn read_u8(&mut self) -> Result<u8, BufError> {
        self.ensure(1)?;
        let value = self.data[self.read_index];
        self.read_index += 1;
        Ok(value)
    }

    /// Two octets in network order, as used inside SIM records
    pub fn read_u16_be(&mut self) -> Result<u16, BufError> {
        let hi = self.read_u8()? as u16;
        let lo = self.read_u8()? as u16;
        Ok((hi << 8) | lo)
    }

    /// Parcel integers are little-endian.
    pub fn read_u32(&mut self) -> Result<u32, BufError> {
        self.ensure(4)?;
        let i = self.read_index;
        let value = u32::from_le_bytes([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]);
        self.read_index += 4;
        Ok(value)
    }

    /// Read `count` octets as an owned vector
    pub fn read_octets(&mut self, count: usize) -> Result<Vec<u8>, BufError> {
        self.ensure(count)?;
        let start = self.read_index;
        self.read_index += count;
        Ok(self.data[start..start + count].to_vec())
    }

    /// Move the read cursor forward (positive) or backward (negative)
    pub fn seek_incoming(&mut self, delta: isize) -> Result<(), BufError> {
        let target = self.read_index as isize + delta;
        if target < 0 || target as usize > self.data.len() {
            return Err(BufError::InvalidSeek {
                index: self.read_index,
                delta,
                len: self.data.len(),
            });
        }
        self.read_index = target as usize;
        Ok(())
    }

    /// Skip `count` octets
    pub fn skip(&mut self, count: usize) -> Result<(), BufError> {
        self.seek_incoming(count as isize)
    }

    /// Write one octet at the write cursor, overwriting or appending
    pub fn write_u8(&mut self, value: u8) {
        if self.write_index < self.data.len() {
            self.data[self.write_index] = value;
        } else {
            self.data.push(value);
        }
        self.write_index += 1;
    }

    pub fn write_u16_be(&mut self, value: u16) {
        self.write_u8((value >> 8) as u8);
        self.write_u8(value as u8);
    }

    pub fn write_u32(&mut self, value: u32) {
        for octet in value.to_le_bytes() {
            self.write_u8(octet);
        }
    }

    pub fn write_octets(&mut self, octets: &[u8]) {
        for &octet in octets {
            self.write_u8(octet);
        }
    }

    /// Write the size of a framed string.
    ///
    /// The size counts hex digits, two per octet.
    pub fn write_string_size(&mut self, octets: usize) {
        self.write_u32((octets * 2) as u32);
    }

    /// Read the size of a framed string, in hex digits
    pub fn read_string_size(&mut self) -> Result<usize, BufError> {
        Ok(self.read_u32()? as usize)
    }

    pub fn write_string_delimiter(&mut self) {
        for _ in 0..Self::STRING_DELIMITER_SIZE {
            self.write_u8(0);
        }
    }

    /// Consume the delimiter that follows a framed string.
    ///
    /// A non-zero delimiter means the decoder and the writer disagree on the
    /// string length; it is logged and decoding carries on.
    pub fn read_string_delimiter(&mut self, size: usize) -> Result<(), BufError> {
        let delimiter = self.read_octets(Self::STRING_DELIMITER_SIZE)?;
        if delimiter.iter().any(|&b| b != 0) {
            warn!("Unexpected string delimiter {:02X?} after {} hex digits", delimiter, size);
        }
        Ok(())
    }

    /// Write `octets` framed as a string: size, payload, delimiter
    pub fn write_framed(&mut self, octets: &[u8]) {
        self.write_string_size(octets.len());
        self.write_octets(octets);
        self.write_string_delimiter();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_after_write() {
        let mut buf = Buf::new();
        buf.write_u8(0x12);
        buf.write_u16_be(0x3456);
        assert_eq!(buf.read_u8().unwrap(), 0x12);
        assert_eq!(buf.read_u16_be().unwrap(), 0x3456);
        assert_eq!(buf.remaining(), 0);
    }

    #[test]
    fn test_overrun_is_error() {
        let mut buf = Buf::from_octets(vec![0x01]);
        assert_eq!(buf.read_u8().unwrap(), 0x01);
        assert_eq!(
            buf.read_u8(),
            Err(BufError::Overrun { index: 1, wanted: 1, len: 1 })
        );
    }

    #[test]
    fn test_seek_incoming() {
        let mut buf = Buf::from_octets(hex::decode("0A0B0C").unwrap());
        buf.seek_incoming(2).unwrap();
        assert_eq!(buf.read_u8().unwrap(), 0x0C);
        buf.seek_incoming(-3).unwrap();
        assert_eq!(buf.read_u8().unwrap(), 0x0A);
        assert!(buf.seek_incoming(-2).is_err());
        assert!(buf.seek_incoming(3).is_err());
    }

    #[test]
    fn test_u32_little_endian() {
        let mut buf = Buf::new();
        buf.write_u32(0x0102_0304);
        assert_eq!(buf.as_octets(), &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(buf.read_u32().unwrap(), 0x0102_0304);
    }

    #[test]
    fn test_framed_string() {
        let mut buf = Buf::new();
        buf.write_framed(&[0xDE, 0xAD]);
        let size = buf.read_string_size().unwrap();
        assert_eq!(size, 4);
        assert_eq!(buf.read_octets(size / 2).unwrap(), vec![0xDE, 0xAD]);
        buf.read_string_delimiter(size).unwrap();
        assert_eq!(buf.remaining(), 0);

        let mut buf = Buf::new();
        buf.write_string_delimiter();
        assert_eq!(buf.as_octets(), &[0x00, 0x00]);
    }
}
