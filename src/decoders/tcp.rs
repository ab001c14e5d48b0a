//! TCP — 20-byte minimum header.

use crate::bytes::{read_u16_be, read_u32_be, require_len};
use crate::error::{Error, Result};
use crate::id::Id;
use crate::layer::{DecodeConfig, DecodeContext, Decoder, Layer, LayerData};

const MIN_HEADER_LEN: usize = 20;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct TcpFlags {
    pub ns: bool,
    pub cwr: bool,
    pub ece: bool,
    pub urg: bool,
    pub ack: bool,
    pub psh: bool,
    pub rst: bool,
    pub syn: bool,
    pub fin: bool,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TcpHeader<'a> {
    pub source_port: u16,
    pub destination_port: u16,
    pub sequence_number: u32,
    pub ack_number: u32,
    pub data_offset: u8,
    pub flags: TcpFlags,
    pub window: u16,
    pub checksum: u16,
    pub urgent_pointer: u16,
    pub options: &'a [u8],
}

pub struct TcpDecoder;

impl Decoder for TcpDecoder {
    fn name(&self) -> &'static str {
        "TCP"
    }

    fn decode<'a>(
        &self,
        buf: &'a [u8],
        _config: DecodeConfig,
        _ctx: Option<&DecodeContext>,
    ) -> Result<Option<Layer<'a>>> {
        if require_len(buf, MIN_HEADER_LEN).is_err() {
            return Ok(None);
        }
        let source_port = read_u16_be(buf, 0)?;
        let destination_port = read_u16_be(buf, 2)?;
        let sequence_number = read_u32_be(buf, 4)?;
        let ack_number = read_u32_be(buf, 8)?;
        let offset_flags_hi = buf[12];
        let data_offset = offset_flags_hi >> 4;
        if data_offset < 5 {
            return Err(Error::structural(
                12,
                format!("data offset {} is below the minimum of 5", data_offset),
            ));
        }
        let header_length = data_offset as usize * 4;
        if require_len(buf, header_length).is_err() {
            return Err(Error::bounds(
                buf.len(),
                format!(
                    "data offset declares a {}-byte header but only {} bytes available",
                    header_length,
                    buf.len()
                ),
            ));
        }
        let ns = offset_flags_hi & 0x01 != 0;
        let flags_lo = buf[13];
        let flags = TcpFlags {
            ns,
            cwr: flags_lo & 0x80 != 0,
            ece: flags_lo & 0x40 != 0,
            urg: flags_lo & 0x20 != 0,
            ack: flags_lo & 0x10 != 0,
            psh: flags_lo & 0x08 != 0,
            rst: flags_lo & 0x04 != 0,
            syn: flags_lo & 0x02 != 0,
            fin: flags_lo & 0x01 != 0,
        };
        let window = read_u16_be(buf, 14)?;
        let checksum = read_u16_be(buf, 16)?;
        let urgent_pointer = read_u16_be(buf, 18)?;
        let options = &buf[MIN_HEADER_LEN..header_length];

        let header = TcpHeader {
            source_port,
            destination_port,
            sequence_number,
            ack_number,
            data_offset,
            flags,
            window,
            checksum,
            urgent_pointer,
            options,
        };
        let payload = &buf[header_length..];
        Ok(Some(Layer::new(
            self.name(),
            header_length,
            LayerData::Tcp(header),
            buf,
            payload,
        )))
    }

    fn next_protocol(&self, _decoded: &LayerData<'_>) -> Option<Id> {
        // Application dispatch is by port and belongs to the caller (§4.I).
        None
    }
}
