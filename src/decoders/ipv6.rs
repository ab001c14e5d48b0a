//! IPv6, including extension-header traversal.

use crate::addr::format_ipv6;
use crate::bytes::{read_u16_be, read_u32_be, require_len};
use crate::error::{Error, Result};
use crate::id::Id;
use crate::layer::{DecodeConfig, DecodeContext, Decoder, Layer, LayerData};

const FIXED_HEADER_LEN: usize = 40;

/// Next-header values that name an extension header rather than an upper
/// layer protocol, and therefore cause traversal to continue.
fn is_extension_header(next_header: u8) -> bool {
    matches!(next_header, 0 | 43 | 44 | 60 | 51 | 50 | 135 | 139 | 140 | 253 | 254)
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Ipv6ExtensionHeader<'a> {
    pub header_type: u8,
    pub next_header: u8,
    pub data: &'a [u8],
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Ipv6Header<'a> {
    pub version: u8,
    pub traffic_class: u8,
    pub flow_label: u32,
    pub payload_length: u16,
    pub next_header: u8,
    pub hop_limit: u8,
    pub source: String,
    pub destination: String,
    pub source_bytes: [u8; 16],
    pub destination_bytes: [u8; 16],
    pub extension_headers: Vec<Ipv6ExtensionHeader<'a>>,
}

pub struct Ipv6Decoder;

impl Decoder for Ipv6Decoder {
    fn name(&self) -> &'static str {
        "IPv6"
    }

    fn decode<'a>(
        &self,
        buf: &'a [u8],
        _config: DecodeConfig,
        _ctx: Option<&DecodeContext>,
    ) -> Result<Option<Layer<'a>>> {
        if require_len(buf, FIXED_HEADER_LEN).is_err() {
            return Ok(None);
        }
        let version = buf[0] >> 4;
        if version != 6 {
            return Ok(None);
        }
        let version_class_flow = read_u32_be(buf, 0)?;
        let traffic_class = ((version_class_flow >> 20) & 0xff) as u8;
        let flow_label = version_class_flow & 0x000f_ffff;
        let payload_length = read_u16_be(buf, 4)?;
        let mut next_header = buf[6];
        let hop_limit = buf[7];
        let mut source_bytes = [0u8; 16];
        source_bytes.copy_from_slice(&buf[8..24]);
        let mut destination_bytes = [0u8; 16];
        destination_bytes.copy_from_slice(&buf[24..40]);

        let mut offset = FIXED_HEADER_LEN;
        let mut extension_headers = Vec::new();
        let available = (payload_length as usize)
            .min(buf.len().saturating_sub(FIXED_HEADER_LEN))
            + FIXED_HEADER_LEN;
        let available = available.min(buf.len());

        while is_extension_header(next_header) {
            if offset + 2 > available {
                return Err(Error::structural(
                    offset,
                    "extension header truncated before its length field",
                ));
            }
            let this_next_header = buf[offset];
            let header_ext_len = buf[offset + 1] as usize;
            let ext_len = (header_ext_len + 1) * 8;
            if offset + ext_len > available {
                return Err(Error::structural(
                    offset,
                    "extension header length runs past payload_length",
                ));
            }
            extension_headers.push(Ipv6ExtensionHeader {
                header_type: next_header,
                next_header: this_next_header,
                data: &buf[offset + 2..offset + ext_len],
            });
            next_header = this_next_header;
            offset += ext_len;
        }

        let header = Ipv6Header {
            version,
            traffic_class,
            flow_label,
            payload_length,
            next_header,
            hop_limit,
            source: format_ipv6(&source_bytes),
            destination: format_ipv6(&destination_bytes),
            source_bytes,
            destination_bytes,
            extension_headers,
        };
        let payload = &buf[offset..available];
        Ok(Some(Layer::new(
            self.name(),
            offset,
            LayerData::Ipv6(header),
            buf,
            payload,
        )))
    }

    fn next_protocol(&self, decoded: &LayerData<'_>) -> Option<Id> {
        match decoded {
            LayerData::Ipv6(h) => Some(Id::Int(u32::from(h.next_header))),
            _ => None,
        }
    }
}
