//! Ethernet II — 14-byte fixed header.

use crate::addr::format_mac;
use crate::bytes::{read_u16_be, require_len};
use crate::error::Result;
use crate::id::Id;
use crate::layer::{DecodeConfig, DecodeContext, Decoder, Layer, LayerData};

const HEADER_LEN: usize = 14;

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct EthernetHeader {
    pub destination_mac: String,
    pub source_mac: String,
    pub ethertype: u16,
}

pub struct EthernetDecoder;

impl Decoder for EthernetDecoder {
    fn name(&self) -> &'static str {
        "Ethernet II"
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
        let header = EthernetHeader {
            destination_mac: format_mac(&buf[0..6]),
            source_mac: format_mac(&buf[6..12]),
            ethertype: read_u16_be(buf, 12)?,
        };
        let payload = &buf[HEADER_LEN..];
        Ok(Some(Layer::new(
            self.name(),
            HEADER_LEN,
            LayerData::Ethernet(header),
            buf,
            payload,
        )))
    }

    fn next_protocol(&self, decoded: &LayerData<'_>) -> Option<Id> {
        match decoded {
            LayerData::Ethernet(h) => Some(Id::Int(u32::from(h.ethertype))),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(ethertype: u16) -> Vec<u8> {
        let mut f = vec![0xffu8; 6]; // dst
        f.extend_from_slice(&[0x00, 0x50, 0x56, 0xc0, 0x00, 0x08]); // src
        f.extend_from_slice(&ethertype.to_be_bytes());
        f.extend_from_slice(b"payload");
        f
    }

    #[test]
    fn decodes_header_and_reports_ethertype_as_successor() {
        let f = frame(0x0800);
        let layer = EthernetDecoder
            .decode(&f, DecodeConfig::default(), None)
            .unwrap()
            .unwrap();
        assert_eq!(layer.header_length, 14);
        assert_eq!(layer.payload, b"payload");
        match &layer.data {
            LayerData::Ethernet(h) => {
                assert_eq!(h.destination_mac, "ff:ff:ff:ff:ff:ff");
                assert_eq!(h.source_mac, "00:50:56:c0:00:08");
                assert_eq!(h.ethertype, 0x0800);
            }
            _ => panic!("wrong variant"),
        }
        assert_eq!(
            EthernetDecoder.next_protocol(&layer.data),
            Some(Id::Int(0x0800))
        );
    }

    #[test]
    fn too_short_is_not_applicable() {
        let buf = [0u8; 10];
        assert!(EthernetDecoder
            .decode(&buf, DecodeConfig::default(), None)
            .unwrap()
            .is_none());
    }
}
