//! Component D: the classic capture format — a 24-byte global header
//! followed by a stream of 16-byte record headers + packet bytes.

use tracing::{error, warn};

use crate::bytes::{read_u32_be, Endianness};
use crate::capture::{PerPacketUnit, Timestamp};

const GLOBAL_HEADER_LEN: usize = 24;
const RECORD_HEADER_LEN: usize = 16;

const MAGIC_MICRO_BE: u32 = 0xA1B2_C3D4;
const MAGIC_NANO_BE: u32 = 0xA1B2_3C4D;
const MAGIC_MICRO_LE: u32 = 0xD4C3_B2A1;
const MAGIC_NANO_LE: u32 = 0x4D3C_B2A1;

/// Iterates [`PerPacketUnit`]s out of a classic-format capture buffer.
pub struct ClassicIter<'a> {
    buf: &'a [u8],
    cursor: usize,
    endianness: Endianness,
    subsecond_units_per_second: u32,
    link_type: u16,
    done: bool,
}

/// Begin iterating a classic-format capture held entirely in `bytes`.
///
/// If the global header's magic doesn't match any recognized value, the
/// returned iterator yields nothing (logged at `error!`, per §7's "inability
/// to resynchronize").
pub fn iterate_classic(bytes: &[u8]) -> ClassicIter<'_> {
    if bytes.len() < GLOBAL_HEADER_LEN {
        error!(available = bytes.len(), "capture too short for a global header");
        return ClassicIter {
            buf: bytes,
            cursor: 0,
            endianness: Endianness::Big,
            subsecond_units_per_second: 1_000_000,
            link_type: 0,
            done: true,
        };
    }
    let magic = match read_u32_be(bytes, 0) {
        Ok(m) => m,
        Err(_) => unreachable!("length already checked"),
    };
    let (endianness, subsecond_units_per_second) = match magic {
        MAGIC_MICRO_BE => (Endianness::Big, 1_000_000),
        MAGIC_NANO_BE => (Endianness::Big, 1_000_000_000),
        MAGIC_MICRO_LE => (Endianness::Little, 1_000_000),
        MAGIC_NANO_LE => (Endianness::Little, 1_000_000_000),
        _ => {
            error!(magic, "unrecognized classic capture magic number");
            return ClassicIter {
                buf: bytes,
                cursor: 0,
                endianness: Endianness::Big,
                subsecond_units_per_second: 1_000_000,
                link_type: 0,
                done: true,
            };
        }
    };
    let link_type = endianness.read_u32(bytes, 20).unwrap_or(0) as u16;
    ClassicIter {
        buf: bytes,
        cursor: GLOBAL_HEADER_LEN,
        endianness,
        subsecond_units_per_second,
        link_type,
        done: false,
    }
}

impl<'a> ClassicIter<'a> {
    fn read_record(&mut self) -> Option<PerPacketUnit<'a>> {
        let start = self.cursor;
        if self.buf.len() - start < RECORD_HEADER_LEN {
            warn!(offset = start, "truncated record header; ending iteration");
            self.done = true;
            return None;
        }
        let ts_sec = self.endianness.read_u32(self.buf, start).ok()? as i64;
        let ts_subsec = self.endianness.read_u32(self.buf, start + 4).ok()?;
        let incl_len = self.endianness.read_u32(self.buf, start + 8).ok()?;
        let orig_len = self.endianness.read_u32(self.buf, start + 12).ok()?;

        let data_start = start + RECORD_HEADER_LEN;
        let data_end = data_start + incl_len as usize;
        if data_end > self.buf.len() {
            warn!(
                offset = start,
                incl_len, "record declares more bytes than remain; ending iteration"
            );
            self.done = true;
            return None;
        }

        self.cursor = data_end;
        Some(PerPacketUnit {
            timestamp: Timestamp {
                seconds: ts_sec,
                subsecond: ts_subsec,
                subsecond_units_per_second: self.subsecond_units_per_second,
            },
            captured_length: incl_len,
            original_length: orig_len,
            packet_bytes: &self.buf[data_start..data_end],
            link_type: self.link_type,
            interface_id: 0,
            interface_name: None,
            interface_description: None,
        })
    }
}

impl<'a> Iterator for ClassicIter<'a> {
    type Item = PerPacketUnit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.cursor >= self.buf.len() {
            return None;
        }
        self.read_record()
    }
}
