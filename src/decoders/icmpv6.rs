//! ICMPv6 — header framing only; the body is opaque to this core (§4.I).

use crate::bytes::{read_u16_be, require_len};
use crate::error::Result;
use crate::id::Id;
use crate::layer::{DecodeConfig, DecodeContext, Decoder, Layer, LayerData};

const HEADER_LEN: usize = 4;

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Icmpv6Header<'a> {
    pub icmp_type: u8,
    pub code: u8,
    pub checksum: u16,
    pub body: &'a [u8],
}

pub struct Icmpv6Decoder;

impl Decoder for Icmpv6Decoder {
    fn name(&self) -> &'static str {
        "ICMPv6"
    }

    fn decode<'a>(
        &self,
        buf: &'a [u8],
        _config: DecodeConfig,
        _ctx: Option<&DecodeContext>,
    ) -> Result<Option<Layer<'a>>> {
        if require_len(buf, HEADER_LEN).is_err() {
            return Ok(None);
        }
        let header = Icmpv6Header {
            icmp_type: buf[0],
            code: buf[1],
            checksum: read_u16_be(buf, 2)?,
            body: &buf[HEADER_LEN..],
        };
        let payload = &buf[buf.len()..];
        Ok(Some(Layer::new(
            self.name(),
            buf.len(),
            LayerData::Icmpv6(header),
            buf,
            payload,
        )))
    }

    fn next_protocol(&self, _decoded: &LayerData<'_>) -> Option<Id> {
        None
    }
}
