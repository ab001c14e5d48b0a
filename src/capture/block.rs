//! Component E: the block-structured (pcap-ng) capture format.

use tracing::{debug, info, warn};

use crate::bytes::{pad4, read_u32_be, Endianness};
use crate::capture::{PerPacketUnit, Timestamp};
use crate::error::{Error, Result};
use crate::tlv::{self, Tlv};

const SHB_TYPE: u32 = 0x0A0D_0D0A;
const IDB_TYPE: u32 = 0x0000_0001;
const PACKET_OBSOLETE_TYPE: u32 = 0x0000_0002;
const SPB_TYPE: u32 = 0x0000_0003;
const NRB_TYPE: u32 = 0x0000_0004;
const ISB_TYPE: u32 = 0x0000_0005;
const EPB_TYPE: u32 = 0x0000_0006;

const BYTE_ORDER_MAGIC_BE: u32 = 0x1A2B_3C4D;
const BYTE_ORDER_MAGIC_SWAPPED: u32 = 0x4D3C_2B1A;

const OPT_INTERFACE_NAME: u16 = 2;
const OPT_INTERFACE_DESCRIPTION: u16 = 3;

const MIN_BLOCK_LEN: usize = 12;

#[derive(Clone, Debug)]
struct InterfaceDescriptor {
    link_type: u16,
    name: Option<String>,
    description: Option<String>,
}

enum FrameError {
    /// Couldn't even read a 12-byte generic header at the current offset.
    HeaderUnreadable,
    /// The generic header was readable but inconsistent (bad length, a
    /// mismatched leading/trailing length, or a non-SHB first block).
    Invalid { total_length: Option<usize> },
}

/// Iterates [`PerPacketUnit`]s out of a block-structured (pcap-ng) capture
/// buffer, maintaining section endianness and the interface table across
/// blocks.
pub struct BlockIter<'a> {
    buf: &'a [u8],
    cursor: usize,
    endianness: Endianness,
    section_seen: bool,
    interfaces: Vec<InterfaceDescriptor>,
    done: bool,
}

pub fn iterate_block(bytes: &[u8]) -> BlockIter<'_> {
    BlockIter {
        buf: bytes,
        cursor: 0,
        endianness: Endianness::Big,
        section_seen: false,
        interfaces: Vec::new(),
        done: false,
    }
}

impl<'a> BlockIter<'a> {
    fn read_one_block(&mut self) -> std::result::Result<Option<PerPacketUnit<'a>>, FrameError> {
        let buf = self.buf;
        let start = self.cursor;
        if buf.len() < start + MIN_BLOCK_LEN {
            return Err(FrameError::HeaderUnreadable);
        }

        let type_guess = self
            .endianness
            .read_u32(buf, start)
            .map_err(|_| FrameError::HeaderUnreadable)?;

        let mut endianness = self.endianness;
        if type_guess == SHB_TYPE {
            endianness = match detect_byte_order(buf, start + 8) {
                Some(e) => e,
                None => return Err(FrameError::Invalid { total_length: None }),
            };
        } else if !self.section_seen {
            return Err(FrameError::Invalid { total_length: None });
        }

        let block_type = endianness
            .read_u32(buf, start)
            .map_err(|_| FrameError::HeaderUnreadable)?;
        let total_length = endianness
            .read_u32(buf, start + 4)
            .map_err(|_| FrameError::HeaderUnreadable)? as usize;
        if total_length < MIN_BLOCK_LEN || start + total_length > buf.len() {
            return Err(FrameError::Invalid { total_length: None });
        }
        let trailing = endianness
            .read_u32(buf, start + total_length - 4)
            .map_err(|_| FrameError::Invalid {
                total_length: Some(total_length),
            })?;
        if trailing as usize != total_length {
            return Err(FrameError::Invalid {
                total_length: Some(total_length),
            });
        }

        self.endianness = endianness;
        self.section_seen = true;
        let body = &buf[start + 8..start + total_length - 4];
        let next_cursor = start + total_length;

        let outcome = self.dispatch(block_type, body, endianness);
        self.cursor = next_cursor;
        match outcome {
            Ok(unit) => Ok(unit),
            Err(e) => {
                warn!(offset = start, block_type, error = %e, "skipping block with unparseable body");
                Ok(None)
            }
        }
    }

    fn dispatch(
        &mut self,
        block_type: u32,
        body: &'a [u8],
        endianness: Endianness,
    ) -> Result<Option<PerPacketUnit<'a>>> {
        match block_type {
            SHB_TYPE => {
                info!("section header block: resetting interface table");
                self.interfaces.clear();
                Ok(None)
            }
            IDB_TYPE => {
                let descriptor = parse_idb(body, endianness)?;
                info!(
                    interface_id = self.interfaces.len(),
                    link_type = descriptor.link_type,
                    "registered interface"
                );
                self.interfaces.push(descriptor);
                Ok(None)
            }
            EPB_TYPE => parse_epb(body, endianness, &self.interfaces).map(Some),
            NRB_TYPE => {
                parse_nrb(body, endianness)?;
                debug!("parsed name resolution block");
                Ok(None)
            }
            PACKET_OBSOLETE_TYPE => {
                validate_obsolete_packet(body, endianness)?;
                warn!("obsolete Packet block present; skipping (superseded by Enhanced Packet)");
                Ok(None)
            }
            SPB_TYPE | ISB_TYPE => {
                debug!(block_type, "block body not interpreted by this core");
                Ok(None)
            }
            other => {
                warn!(block_type = other, "unknown block type; skipping");
                Ok(None)
            }
        }
    }
}

impl<'a> Iterator for BlockIter<'a> {
    type Item = PerPacketUnit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done || self.cursor >= self.buf.len() {
                return None;
            }
            match self.read_one_block() {
                Ok(Some(unit)) => return Some(unit),
                Ok(None) => continue,
                Err(FrameError::HeaderUnreadable) => {
                    warn!(offset = self.cursor, "could not read generic block header; resyncing");
                    self.cursor += 4;
                }
                Err(FrameError::Invalid { total_length }) => {
                    warn!(offset = self.cursor, "malformed block");
                    match total_length {
                        Some(len) => self.cursor += len,
                        None => {
                            warn!("cannot resynchronize; ending iteration");
                            self.done = true;
                        }
                    }
                }
            }
        }
    }
}

fn detect_byte_order(buf: &[u8], offset: usize) -> Option<Endianness> {
    match read_u32_be(buf, offset) {
        Ok(BYTE_ORDER_MAGIC_BE) => Some(Endianness::Big),
        Ok(BYTE_ORDER_MAGIC_SWAPPED) => Some(Endianness::Little),
        _ => None,
    }
}

fn parse_idb(body: &[u8], endianness: Endianness) -> Result<InterfaceDescriptor> {
    if body.len() < 8 {
        return Err(Error::format(0, "interface description block too short"));
    }
    let link_type = endianness.read_u16(body, 0)?;
    let options = tlv::walk_options(&body[8..], endianness)?;
    Ok(InterfaceDescriptor {
        link_type,
        name: find_option_str(&options, OPT_INTERFACE_NAME),
        description: find_option_str(&options, OPT_INTERFACE_DESCRIPTION),
    })
}

fn find_option_str(options: &[Tlv<'_>], code: u16) -> Option<String> {
    tlv::find_option(options, code).map(|value| String::from_utf8_lossy(value).into_owned())
}

fn parse_epb<'a>(
    body: &'a [u8],
    endianness: Endianness,
    interfaces: &[InterfaceDescriptor],
) -> Result<PerPacketUnit<'a>> {
    if body.len() < 20 {
        return Err(Error::format(0, "enhanced packet block too short"));
    }
    let interface_id = endianness.read_u32(body, 0)?;
    let ts_high = endianness.read_u32(body, 4)?;
    let ts_low = endianness.read_u32(body, 8)?;
    let captured_length = endianness.read_u32(body, 12)?;
    let original_length = endianness.read_u32(body, 16)?;

    let descriptor = interfaces.get(interface_id as usize).ok_or_else(|| {
        Error::format(
            0,
            format!("enhanced packet block references unknown interface {}", interface_id),
        )
    })?;

    let data_start = 20;
    let data_end = data_start + captured_length as usize;
    if data_end > body.len() {
        return Err(Error::format(
            data_start,
            "enhanced packet block captured_len runs past block body",
        ));
    }
    let packet_bytes = &body[data_start..data_end];

    let ticks = ((ts_high as u64) << 32) | ts_low as u64;
    Ok(PerPacketUnit {
        timestamp: Timestamp::from_ticks(ticks, 1_000_000),
        captured_length,
        original_length,
        packet_bytes,
        link_type: descriptor.link_type,
        interface_id,
        interface_name: descriptor.name.clone(),
        interface_description: descriptor.description.clone(),
    })
}

fn parse_nrb(body: &[u8], endianness: Endianness) -> Result<()> {
    let (_records, consumed) = tlv::walk_terminated(body, endianness)?;
    tlv::walk_options(&body[consumed..], endianness)?;
    Ok(())
}

fn validate_obsolete_packet(body: &[u8], endianness: Endianness) -> Result<()> {
    // interface_id:2, drops_count:2, ts_high:4, ts_low:4, captured_len:4,
    // original_len:4, packet_data:(captured_len, padded), options (§4.E.1).
    if body.len() < 20 {
        return Err(Error::format(0, "obsolete packet block too short"));
    }
    let captured_length = endianness.read_u32(body, 12)? as usize;
    let data_start = 20;
    let data_end = data_start + pad4(captured_length);
    if data_end > body.len() {
        return Err(Error::format(
            data_start,
            "obsolete packet block captured_len runs past block body",
        ));
    }
    Ok(())
}
