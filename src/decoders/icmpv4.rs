//! ICMPv4.
//!
//! The message occupies the whole of its input buffer — ICMPv4 has no
//! length field of its own, so there is nothing left over for a successor
//! decoder (§4.I: "Successor = none").

use crate::addr::format_ipv4;
use crate::bytes::{read_u16_be, read_u32_be, require_len};
use crate::checksum;
use crate::error::{Error, Result};
use crate::id::Id;
use crate::layer::{DecodeConfig, DecodeContext, Decoder, Layer, LayerData};

const BASE_HEADER_LEN: usize = 4;

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Icmpv4Body<'a> {
    Echo {
        identifier: u16,
        sequence: u16,
        data: &'a [u8],
    },
    DestinationUnreachable {
        next_hop_mtu: Option<u16>,
        original_datagram: &'a [u8],
    },
    TimeExceeded {
        original_datagram: &'a [u8],
    },
    Redirect {
        gateway: String,
        original_datagram: &'a [u8],
    },
    ParameterProblem {
        pointer: u8,
        original_datagram: &'a [u8],
    },
    Timestamp {
        identifier: u16,
        sequence: u16,
        originate_timestamp: u32,
        receive_timestamp: u32,
        transmit_timestamp: u32,
    },
    AddressMask {
        identifier: u16,
        sequence: u16,
        mask: String,
    },
    RouterAdvertisement {
        lifetime: u16,
        entries: Vec<(String, u32)>,
    },
    RouterSolicitation,
    Raw(&'a [u8]),
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Icmpv4Header<'a> {
    pub icmp_type: u8,
    pub code: u8,
    pub checksum: u16,
    pub body: Icmpv4Body<'a>,
}

pub struct Icmpv4Decoder;

impl Decoder for Icmpv4Decoder {
    fn name(&self) -> &'static str {
        "ICMPv4"
    }

    fn decode<'a>(
        &self,
        buf: &'a [u8],
        config: DecodeConfig,
        _ctx: Option<&DecodeContext>,
    ) -> Result<Option<Layer<'a>>> {
        if require_len(buf, BASE_HEADER_LEN).is_err() {
            return Ok(None);
        }
        if config.validate_checksums && !checksum::validate(buf) {
            return Err(Error::structural(0, "ICMPv4 checksum mismatch"));
        }

        let icmp_type = buf[0];
        let code = buf[1];
        let checksum_field = read_u16_be(buf, 2)?;
        let rest = &buf[BASE_HEADER_LEN..];

        let body = match icmp_type {
            0 | 8 => parse_echo(rest)?,
            3 => parse_dest_unreachable(code, rest)?,
            11 => Icmpv4Body::TimeExceeded {
                original_datagram: skip_unused(rest),
            },
            5 => parse_redirect(rest)?,
            12 => parse_parameter_problem(rest)?,
            13 | 14 => parse_timestamp(rest)?,
            17 | 18 => parse_address_mask(rest)?,
            9 => parse_router_advertisement(rest)?,
            10 => Icmpv4Body::RouterSolicitation,
            _ => Icmpv4Body::Raw(rest),
        };

        let header = Icmpv4Header {
            icmp_type,
            code,
            checksum: checksum_field,
            body,
        };
        let payload = &buf[buf.len()..];
        Ok(Some(Layer::new(
            self.name(),
            buf.len(),
            LayerData::Icmpv4(header),
            buf,
            payload,
        )))
    }

    fn next_protocol(&self, _decoded: &LayerData<'_>) -> Option<Id> {
        None
    }
}

/// The first 4 bytes of the "unused"/ROHC field that precede the original
/// datagram in several ICMP error messages.
fn skip_unused(rest: &[u8]) -> &[u8] {
    if rest.len() >= 4 {
        &rest[4..]
    } else {
        &rest[rest.len()..]
    }
}

fn parse_echo(rest: &[u8]) -> Result<Icmpv4Body<'_>> {
    if require_len(rest, 4).is_err() {
        return Ok(Icmpv4Body::Raw(rest));
    }
    Ok(Icmpv4Body::Echo {
        identifier: read_u16_be(rest, 0)?,
        sequence: read_u16_be(rest, 2)?,
        data: &rest[4..],
    })
}

fn parse_dest_unreachable(code: u8, rest: &[u8]) -> Result<Icmpv4Body<'_>> {
    if require_len(rest, 4).is_err() {
        return Ok(Icmpv4Body::Raw(rest));
    }
    // code 4: "fragmentation needed and DF set" carries the next-hop MTU in
    // the low 16 bits of the 4-byte "unused" field; other codes leave it 0.
    let next_hop_mtu = if code == 4 {
        Some(read_u16_be(rest, 2)?)
    } else {
        None
    };
    Ok(Icmpv4Body::DestinationUnreachable {
        next_hop_mtu,
        original_datagram: &rest[4..],
    })
}

fn parse_redirect(rest: &[u8]) -> Result<Icmpv4Body<'_>> {
    if require_len(rest, 4).is_err() {
        return Ok(Icmpv4Body::Raw(rest));
    }
    Ok(Icmpv4Body::Redirect {
        gateway: format_ipv4(&rest[0..4]),
        original_datagram: &rest[4..],
    })
}

fn parse_parameter_problem(rest: &[u8]) -> Result<Icmpv4Body<'_>> {
    if require_len(rest, 4).is_err() {
        return Ok(Icmpv4Body::Raw(rest));
    }
    Ok(Icmpv4Body::ParameterProblem {
        pointer: rest[0],
        original_datagram: &rest[4..],
    })
}

fn parse_timestamp(rest: &[u8]) -> Result<Icmpv4Body<'_>> {
    if require_len(rest, 16).is_err() {
        return Ok(Icmpv4Body::Raw(rest));
    }
    Ok(Icmpv4Body::Timestamp {
        identifier: read_u16_be(rest, 0)?,
        sequence: read_u16_be(rest, 2)?,
        originate_timestamp: read_u32_be(rest, 4)?,
        receive_timestamp: read_u32_be(rest, 8)?,
        transmit_timestamp: read_u32_be(rest, 12)?,
    })
}

fn parse_address_mask(rest: &[u8]) -> Result<Icmpv4Body<'_>> {
    if require_len(rest, 8).is_err() {
        return Ok(Icmpv4Body::Raw(rest));
    }
    Ok(Icmpv4Body::AddressMask {
        identifier: read_u16_be(rest, 0)?,
        sequence: read_u16_be(rest, 2)?,
        mask: format_ipv4(&rest[4..8]),
    })
}

fn parse_router_advertisement(rest: &[u8]) -> Result<Icmpv4Body<'_>> {
    if require_len(rest, 4).is_err() {
        return Ok(Icmpv4Body::Raw(rest));
    }
    let num_addrs = rest[0] as usize;
    let addr_entry_size = rest[1];
    if addr_entry_size != 2 {
        return Err(Error::structural(
            1,
            format!(
                "router advertisement address entry size must be 2, got {}",
                addr_entry_size
            ),
        ));
    }
    let lifetime = read_u16_be(rest, 2)?;
    let mut entries = Vec::with_capacity(num_addrs);
    let mut offset = 4;
    for _ in 0..num_addrs {
        if require_len(rest, offset + 8).is_err() {
            return Err(Error::bounds(
                offset,
                "router advertisement entry runs past end of message",
            ));
        }
        let addr = format_ipv4(&rest[offset..offset + 4]);
        let preference = read_u32_be(rest, offset + 4)?;
        entries.push((addr, preference));
        offset += 8;
    }
    Ok(Icmpv4Body::RouterAdvertisement { lifetime, entries })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_checksum(mut bytes: Vec<u8>) -> Vec<u8> {
        bytes[2] = 0;
        bytes[3] = 0;
        let csum = checksum::internet_checksum(&bytes);
        bytes[2] = (csum >> 8) as u8;
        bytes[3] = (csum & 0xff) as u8;
        bytes
    }

    #[test]
    fn valid_checksum_decodes_echo_request() {
        let mut bytes = vec![8u8, 0, 0, 0]; // type 8, code 0
        bytes.extend_from_slice(&1234u16.to_be_bytes());
        bytes.extend_from_slice(&1u16.to_be_bytes());
        bytes.extend_from_slice(b"ping-data");
        let bytes = with_checksum(bytes);

        let layer = Icmpv4Decoder
            .decode(&bytes, DecodeConfig::default(), None)
            .unwrap()
            .unwrap();
        assert_eq!(layer.header_length, bytes.len());
        assert!(layer.payload.is_empty());
        match &layer.data {
            LayerData::Icmpv4(h) => match &h.body {
                Icmpv4Body::Echo {
                    identifier,
                    sequence,
                    data,
                } => {
                    assert_eq!(*identifier, 1234);
                    assert_eq!(*sequence, 1);
                    assert_eq!(*data, b"ping-data");
                }
                _ => panic!("wrong body"),
            },
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn mutated_byte_breaks_checksum_validation() {
        let mut bytes = vec![8u8, 0, 0, 0];
        bytes.extend_from_slice(&1234u16.to_be_bytes());
        bytes.extend_from_slice(&1u16.to_be_bytes());
        let mut bytes = with_checksum(bytes);
        bytes[4] ^= 0xff;
        assert!(Icmpv4Decoder
            .decode(&bytes, DecodeConfig::default(), None)
            .is_err());
    }

    #[test]
    fn checksum_validation_can_be_disabled() {
        let mut bytes = vec![8u8, 0, 0, 0];
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        // checksum field left as 0/0, which is wrong for this payload.
        let config = DecodeConfig {
            validate_checksums: false,
        };
        assert!(Icmpv4Decoder.decode(&bytes, config, None).unwrap().is_some());
    }

    #[test]
    fn router_advertisement_rejects_bad_entry_size() {
        let mut bytes = vec![9u8, 0, 0, 0, 1, 3, 0, 0];
        bytes.extend_from_slice(&[10, 0, 0, 1]);
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        let bytes = with_checksum(bytes);
        assert!(Icmpv4Decoder
            .decode(&bytes, DecodeConfig::default(), None)
            .is_err());
    }
}
