//! IPv4.

use tracing::warn;

use crate::addr::format_ipv4;
use crate::bytes::{read_u16_be, require_len};
use crate::error::{Error, Result};
use crate::id::Id;
use crate::layer::{DecodeConfig, DecodeContext, Decoder, Layer, LayerData};

const MIN_HEADER_LEN: usize = 20;

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Ipv4Header<'a> {
    pub version: u8,
    pub ihl: u8,
    pub dscp: u8,
    pub ecn: u8,
    pub total_length: u16,
    pub identification: u16,
    pub flags: u8,
    pub fragment_offset: u16,
    pub ttl: u8,
    pub protocol: u8,
    pub checksum: u16,
    pub source: String,
    pub destination: String,
    pub source_bytes: [u8; 4],
    pub destination_bytes: [u8; 4],
    pub options: &'a [u8],
}

pub struct Ipv4Decoder;

impl Decoder for Ipv4Decoder {
    fn name(&self) -> &'static str {
        "IPv4"
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
        let version = buf[0] >> 4;
        if version != 4 {
            return Ok(None);
        }
        let ihl = buf[0] & 0x0f;
        if ihl < 5 {
            return Err(Error::structural(
                0,
                format!("IHL {} is below the minimum of 5", ihl),
            ));
        }
        let header_length = ihl as usize * 4;
        if require_len(buf, header_length).is_err() {
            return Err(Error::bounds(
                buf.len(),
                format!("IHL declares a {}-byte header but only {} bytes available", header_length, buf.len()),
            ));
        }

        let dscp_ecn = buf[1];
        let total_length = read_u16_be(buf, 2)?;
        let identification = read_u16_be(buf, 4)?;
        let flags_frag = read_u16_be(buf, 6)?;
        let ttl = buf[8];
        let protocol = buf[9];
        let checksum = read_u16_be(buf, 10)?;
        let mut source_bytes = [0u8; 4];
        source_bytes.copy_from_slice(&buf[12..16]);
        let mut destination_bytes = [0u8; 4];
        destination_bytes.copy_from_slice(&buf[16..20]);

        let options = &buf[MIN_HEADER_LEN..header_length];

        let available_after_header = buf.len() - header_length;
        let declared_payload = (total_length as usize).saturating_sub(header_length);
        let payload_len = if total_length as usize > buf.len() {
            warn!(
                declared_total_length = total_length,
                available = buf.len(),
                "IPv4 total_length exceeds available bytes; truncating payload"
            );
            available_after_header
        } else {
            declared_payload.min(available_after_header)
        };
        let payload = &buf[header_length..header_length + payload_len];

        let header = Ipv4Header {
            version,
            ihl,
            dscp: dscp_ecn >> 2,
            ecn: dscp_ecn & 0x03,
            total_length,
            identification,
            flags: (flags_frag >> 13) as u8,
            fragment_offset: flags_frag & 0x1fff,
            ttl,
            protocol,
            checksum,
            source: format_ipv4(&source_bytes),
            destination: format_ipv4(&destination_bytes),
            source_bytes,
            destination_bytes,
            options,
        };
        Ok(Some(Layer::new(
            self.name(),
            header_length,
            LayerData::Ipv4(header),
            buf,
            payload,
        )))
    }

    fn next_protocol(&self, decoded: &LayerData<'_>) -> Option<Id> {
        match decoded {
            LayerData::Ipv4(h) => Some(Id::Int(u32::from(h.protocol))),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_header(total_length: u16, protocol: u8) -> Vec<u8> {
        let mut buf = vec![0u8; 20];
        buf[0] = 0x45; // version 4, ihl 5
        buf[1] = 0;
        buf[2..4].copy_from_slice(&total_length.to_be_bytes());
        buf[8] = 64; // ttl
        buf[9] = protocol;
        buf[12..16].copy_from_slice(&[192, 168, 1, 1]);
        buf[16..20].copy_from_slice(&[192, 168, 1, 2]);
        buf
    }

    #[test]
    fn payload_bounded_by_total_length() {
        let mut buf = base_header(28, 17);
        buf.extend_from_slice(&[0u8; 20]); // extra bytes beyond total_length
        let layer = Ipv4Decoder
            .decode(&buf, DecodeConfig::default(), None)
            .unwrap()
            .unwrap();
        assert_eq!(layer.header_length, 20);
        assert_eq!(layer.payload.len(), 8);
    }

    #[test]
    fn ihl_below_five_is_structural_error() {
        let mut buf = base_header(20, 17);
        buf[0] = 0x44; // ihl=4
        assert!(Ipv4Decoder
            .decode(&buf, DecodeConfig::default(), None)
            .is_err());
    }

    #[test]
    fn non_version_4_is_not_applicable() {
        let mut buf = base_header(20, 17);
        buf[0] = 0x65; // version 6
        assert!(Ipv4Decoder
            .decode(&buf, DecodeConfig::default(), None)
            .unwrap()
            .is_none());
    }

    #[test]
    fn protocol_is_successor_identifier() {
        let buf = base_header(20, 6);
        let layer = Ipv4Decoder
            .decode(&buf, DecodeConfig::default(), None)
            .unwrap()
            .unwrap();
        assert_eq!(Ipv4Decoder.next_protocol(&layer.data), Some(Id::Int(6)));
    }
}
