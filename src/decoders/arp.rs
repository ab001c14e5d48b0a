//! ARP — RFC 826.

use crate::addr::{format_hex, format_ipv4, format_mac};
use crate::bytes::{read_u16_be, require_len};
use crate::error::Result;
use crate::id::Id;
use crate::layer::{DecodeConfig, DecodeContext, Decoder, Layer, LayerData};

const FIXED_LEN: usize = 8;

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ArpHeader {
    pub hardware_type: u16,
    pub protocol_type: u16,
    pub hardware_len: u8,
    pub protocol_len: u8,
    pub opcode: u16,
    pub sender_hardware_addr: String,
    pub sender_protocol_addr: String,
    pub target_hardware_addr: String,
    pub target_protocol_addr: String,
}

pub struct ArpDecoder;

impl Decoder for ArpDecoder {
    fn name(&self) -> &'static str {
        "ARP"
    }

    fn decode<'a>(
        &self,
        buf: &'a [u8],
        _config: DecodeConfig,
        _ctx: Option<&DecodeContext>,
    ) -> Result<Option<Layer<'a>>> {
        if require_len(buf, FIXED_LEN).is_err() {
            return Ok(None);
        }
        let hardware_type = read_u16_be(buf, 0)?;
        let protocol_type = read_u16_be(buf, 2)?;
        let hardware_len = buf[4];
        let protocol_len = buf[5];
        let opcode = read_u16_be(buf, 6)?;

        let hlen = hardware_len as usize;
        let plen = protocol_len as usize;
        let total = FIXED_LEN + 2 * hlen + 2 * plen;
        if require_len(buf, total).is_err() {
            return Ok(None);
        }

        let render_hw = |addr: &[u8]| {
            if hardware_type == 1 && hlen == 6 {
                format_mac(addr)
            } else {
                format_hex(addr)
            }
        };
        let render_proto = |addr: &[u8]| {
            if protocol_type == 0x0800 && plen == 4 {
                format_ipv4(addr)
            } else {
                format_hex(addr)
            }
        };

        let mut off = FIXED_LEN;
        let sender_hardware_addr = render_hw(&buf[off..off + hlen]);
        off += hlen;
        let sender_protocol_addr = render_proto(&buf[off..off + plen]);
        off += plen;
        let target_hardware_addr = render_hw(&buf[off..off + hlen]);
        off += hlen;
        let target_protocol_addr = render_proto(&buf[off..off + plen]);
        off += plen;

        let header = ArpHeader {
            hardware_type,
            protocol_type,
            hardware_len,
            protocol_len,
            opcode,
            sender_hardware_addr,
            sender_protocol_addr,
            target_hardware_addr,
            target_protocol_addr,
        };
        let payload = &buf[off..];
        Ok(Some(Layer::new(
            self.name(),
            off,
            LayerData::Arp(header),
            buf,
            payload,
        )))
    }

    fn next_protocol(&self, _decoded: &LayerData<'_>) -> Option<Id> {
        None
    }
}
