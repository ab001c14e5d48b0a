//! Component A: bounds-checked big/little-endian fixed-width integer reads
//! over a byte slice.
//!
//! Every reader here takes a buffer and an offset and fails with
//! [`Error::Bounds`](crate::error::Error::Bounds) rather than panicking if
//! the read would run past the end of the buffer. Nothing here allocates or
//! copies; every decoder in this crate is built on top of these primitives
//! instead of indexing slices directly.

use crate::error::{Error, Result};
use byteorder::{BigEndian, ByteOrder, LittleEndian};

/// Fail unless `buf` has at least `len` bytes.
pub fn require_len(buf: &[u8], len: usize) -> Result<()> {
    if buf.len() < len {
        Err(Error::bounds(
            buf.len(),
            format!("expected at least {} bytes, got {}", len, buf.len()),
        ))
    } else {
        Ok(())
    }
}

/// Slice `buf[start..end]`, bounds-checked.
pub fn slice<'a>(buf: &'a [u8], start: usize, end: usize) -> Result<&'a [u8]> {
    if end < start || buf.len() < end {
        return Err(Error::bounds(
            buf.len(),
            format!("cannot slice [{}..{}] from {} bytes", start, end, buf.len()),
        ));
    }
    Ok(&buf[start..end])
}

macro_rules! read_fns {
    ($read_be:ident, $read_le:ident, $ty:ty, $width:expr, $method:ident) => {
        #[doc = "Read a big-endian value at `offset`."]
        pub fn $read_be(buf: &[u8], offset: usize) -> Result<$ty> {
            require_len(&buf[offset.min(buf.len())..], $width).map_err(|_| {
                Error::bounds(
                    offset,
                    format!("need {} bytes at offset {}, have {}", $width, offset, buf.len()),
                )
            })?;
            Ok(BigEndian::$method(&buf[offset..offset + $width]))
        }

        #[doc = "Read a little-endian value at `offset`."]
        pub fn $read_le(buf: &[u8], offset: usize) -> Result<$ty> {
            require_len(&buf[offset.min(buf.len())..], $width).map_err(|_| {
                Error::bounds(
                    offset,
                    format!("need {} bytes at offset {}, have {}", $width, offset, buf.len()),
                )
            })?;
            Ok(LittleEndian::$method(&buf[offset..offset + $width]))
        }
    };
}

read_fns!(read_u16_be, read_u16_le, u16, 2, read_u16);
read_fns!(read_u32_be, read_u32_le, u32, 4, read_u32);
read_fns!(read_u64_be, read_u64_le, u64, 8, read_u64);

/// Read a single byte at `offset`.
pub fn read_u8(buf: &[u8], offset: usize) -> Result<u8> {
    buf.get(offset).copied().ok_or_else(|| {
        Error::bounds(offset, format!("need 1 byte at offset {}, have {}", offset, buf.len()))
    })
}

/// Read an unsigned value of the given width (1/2/4/8) in the given
/// endianness. Used by readers that only know their field width at runtime
/// (e.g. the capture-file iterators, which pick endianness from the magic
/// number).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Endianness {
    Big,
    Little,
}

impl Endianness {
    pub fn read_u16(self, buf: &[u8], offset: usize) -> Result<u16> {
        match self {
            Endianness::Big => read_u16_be(buf, offset),
            Endianness::Little => read_u16_le(buf, offset),
        }
    }

    pub fn read_u32(self, buf: &[u8], offset: usize) -> Result<u32> {
        match self {
            Endianness::Big => read_u32_be(buf, offset),
            Endianness::Little => read_u32_le(buf, offset),
        }
    }

    pub fn read_u64(self, buf: &[u8], offset: usize) -> Result<u64> {
        match self {
            Endianness::Big => read_u64_be(buf, offset),
            Endianness::Little => read_u64_le(buf, offset),
        }
    }
}

/// Round `n` up to the next multiple of 4, as required by pcap-ng block and
/// option padding.
pub fn pad4(n: usize) -> usize {
    (n + 3) & !3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_big_and_little_endian() {
        let buf = [0x00, 0x01, 0x02, 0x03];
        assert_eq!(read_u16_be(&buf, 0).unwrap(), 0x0001);
        assert_eq!(read_u16_le(&buf, 0).unwrap(), 0x0100);
        assert_eq!(read_u32_be(&buf, 0).unwrap(), 0x0001_0203);
        assert_eq!(read_u32_le(&buf, 0).unwrap(), 0x0302_0100);
    }

    #[test]
    fn rejects_out_of_bounds_reads() {
        let buf = [0u8; 3];
        assert!(read_u32_be(&buf, 0).is_err());
        assert!(read_u16_be(&buf, 2).is_err());
        assert!(read_u8(&buf, 3).is_err());
    }

    #[test]
    fn pad4_rounds_up() {
        assert_eq!(pad4(0), 0);
        assert_eq!(pad4(1), 4);
        assert_eq!(pad4(4), 4);
        assert_eq!(pad4(5), 8);
    }
}
