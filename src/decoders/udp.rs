//! UDP — 8-byte fixed header.

use crate::bytes::{read_u16_be, require_len};
use crate::error::{Error, Result};
use crate::id::Id;
use crate::layer::{DecodeConfig, DecodeContext, Decoder, Layer, LayerData};

const HEADER_LEN: usize = 8;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct UdpHeader {
    pub source_port: u16,
    pub destination_port: u16,
    pub length: u16,
    pub checksum: u16,
}

pub struct UdpDecoder;

impl Decoder for UdpDecoder {
    fn name(&self) -> &'static str {
        "UDP"
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
        let source_port = read_u16_be(buf, 0)?;
        let destination_port = read_u16_be(buf, 2)?;
        let length = read_u16_be(buf, 4)?;
        let checksum = read_u16_be(buf, 6)?;
        if (length as usize) < HEADER_LEN {
            return Err(Error::structural(
                4,
                format!("UDP length {} is below the minimum of 8", length),
            ));
        }
        if length as usize > buf.len() {
            return Err(Error::structural(
                4,
                format!(
                    "UDP length {} exceeds the {} bytes available",
                    length,
                    buf.len()
                ),
            ));
        }
        let header = UdpHeader {
            source_port,
            destination_port,
            length,
            checksum,
        };
        let payload = &buf[HEADER_LEN..length as usize];
        Ok(Some(Layer::new(
            self.name(),
            HEADER_LEN,
            LayerData::Udp(header),
            buf,
            payload,
        )))
    }

    fn next_protocol(&self, _decoded: &LayerData<'_>) -> Option<Id> {
        None
    }
}
