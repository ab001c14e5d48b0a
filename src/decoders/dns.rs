//! DNS — RFC 1035, including label-compression name parsing and
//! type-directed RDATA interpretation for class `IN`.

use std::collections::HashSet;

use crate::addr::{format_ipv4, format_ipv6};
use crate::bytes::{read_u16_be, read_u32_be, read_u8, require_len};
use crate::error::{Error, Result};
use crate::id::Id;
use crate::layer::{DecodeConfig, DecodeContext, Decoder, Layer, LayerData};

const HEADER_LEN: usize = 12;
const MAX_NAME_OCTETS: usize = 255;
const MAX_LABEL_OCTETS: usize = 63;
/// Pointer-chain depth bound (§3: "at least 10").
const MAX_POINTER_DEPTH: usize = 10;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DnsFlags {
    pub qr: bool,
    pub opcode: u8,
    pub authoritative_answer: bool,
    pub truncated: bool,
    pub recursion_desired: bool,
    pub recursion_available: bool,
    pub z: u8,
    pub rcode: u8,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct DnsQuestion {
    pub qname: String,
    pub qtype: u16,
    pub qclass: u16,
}

#[derive(Clone, PartialEq, Debug)]
pub enum DnsRData {
    A(String),
    Aaaa(String),
    Cname(String),
    Ns(String),
    Ptr(String),
    Mx { preference: u16, exchange: String },
    Txt(Vec<String>),
    Soa {
        mname: String,
        rname: String,
        serial: u32,
        refresh: u32,
        retry: u32,
        expire: u32,
        minimum: u32,
    },
    Raw(Vec<u8>),
}

#[derive(Clone, PartialEq, Debug)]
pub struct DnsRecord {
    pub name: String,
    pub rtype: u16,
    pub rclass: u16,
    pub ttl: u32,
    pub rdata: DnsRData,
}

#[derive(Clone, PartialEq, Debug)]
pub struct DnsMessage {
    pub transaction_id: u16,
    pub flags: DnsFlags,
    pub questions: Vec<DnsQuestion>,
    pub answers: Vec<DnsRecord>,
    pub authorities: Vec<DnsRecord>,
    pub additionals: Vec<DnsRecord>,
}

pub struct DnsDecoder;

impl Decoder for DnsDecoder {
    fn name(&self) -> &'static str {
        "DNS"
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
        let transaction_id = read_u16_be(buf, 0)?;
        let raw_flags = read_u16_be(buf, 2)?;
        let flags = DnsFlags {
            qr: raw_flags & 0x8000 != 0,
            opcode: ((raw_flags >> 11) & 0x0f) as u8,
            authoritative_answer: raw_flags & 0x0400 != 0,
            truncated: raw_flags & 0x0200 != 0,
            recursion_desired: raw_flags & 0x0100 != 0,
            recursion_available: raw_flags & 0x0080 != 0,
            z: ((raw_flags >> 4) & 0x07) as u8,
            rcode: (raw_flags & 0x0f) as u8,
        };
        let qdcount = read_u16_be(buf, 4)?;
        let ancount = read_u16_be(buf, 6)?;
        let nscount = read_u16_be(buf, 8)?;
        let arcount = read_u16_be(buf, 10)?;

        let mut cursor = HEADER_LEN;
        let mut questions = Vec::with_capacity(qdcount as usize);
        for _ in 0..qdcount {
            let (qname, consumed) = parse_name(buf, cursor)?;
            cursor += consumed;
            let qtype = read_u16_be(buf, cursor)?;
            let qclass = read_u16_be(buf, cursor + 2)?;
            cursor += 4;
            questions.push(DnsQuestion {
                qname,
                qtype,
                qclass,
            });
        }

        let answers = parse_records(buf, &mut cursor, ancount)?;
        let authorities = parse_records(buf, &mut cursor, nscount)?;
        let additionals = parse_records(buf, &mut cursor, arcount)?;

        let message = DnsMessage {
            transaction_id,
            flags,
            questions,
            answers,
            authorities,
            additionals,
        };
        let payload = &buf[cursor..];
        Ok(Some(Layer::new(
            self.name(),
            cursor,
            LayerData::Dns(message),
            buf,
            payload,
        )))
    }

    fn next_protocol(&self, _decoded: &LayerData<'_>) -> Option<Id> {
        None
    }
}

fn parse_records(buf: &[u8], cursor: &mut usize, count: u16) -> Result<Vec<DnsRecord>> {
    let mut records = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let (name, consumed) = parse_name(buf, *cursor)?;
        *cursor += consumed;
        let rtype = read_u16_be(buf, *cursor)?;
        let rclass = read_u16_be(buf, *cursor + 2)?;
        let ttl = read_u32_be(buf, *cursor + 4)?;
        let rdlength = read_u16_be(buf, *cursor + 8)? as usize;
        *cursor += 10;
        require_len(buf, *cursor + rdlength).map_err(|_| {
            Error::bounds(*cursor, "RDATA runs past end of DNS message")
        })?;
        let rdata_bytes = &buf[*cursor..*cursor + rdlength];
        let rdata = if rclass == 1 {
            parse_rdata(buf, *cursor, rtype, rdata_bytes)
                .unwrap_or_else(|_| DnsRData::Raw(rdata_bytes.to_vec()))
        } else {
            DnsRData::Raw(rdata_bytes.to_vec())
        };
        *cursor += rdlength;
        records.push(DnsRecord {
            name,
            rtype,
            rclass,
            ttl,
            rdata,
        });
    }
    Ok(records)
}

fn parse_rdata(msg: &[u8], rdata_offset: usize, rtype: u16, rdata: &[u8]) -> Result<DnsRData> {
    match rtype {
        1 => {
            require_len(rdata, 4)?;
            Ok(DnsRData::A(format_ipv4(&rdata[0..4])))
        }
        28 => {
            require_len(rdata, 16)?;
            Ok(DnsRData::Aaaa(format_ipv6(&rdata[0..16])))
        }
        5 => Ok(DnsRData::Cname(parse_name(msg, rdata_offset)?.0)),
        2 => Ok(DnsRData::Ns(parse_name(msg, rdata_offset)?.0)),
        12 => Ok(DnsRData::Ptr(parse_name(msg, rdata_offset)?.0)),
        15 => {
            require_len(rdata, 2)?;
            let preference = read_u16_be(rdata, 0)?;
            let exchange = parse_name(msg, rdata_offset + 2)?.0;
            Ok(DnsRData::Mx {
                preference,
                exchange,
            })
        }
        16 => Ok(DnsRData::Txt(parse_txt(rdata)?)),
        6 => {
            let (mname, consumed) = parse_name(msg, rdata_offset)?;
            let after_mname = rdata_offset + consumed;
            let (rname, consumed2) = parse_name(msg, after_mname)?;
            let tail = after_mname + consumed2;
            require_len(msg, tail + 20)?;
            Ok(DnsRData::Soa {
                mname,
                rname,
                serial: read_u32_be(msg, tail)?,
                refresh: read_u32_be(msg, tail + 4)?,
                retry: read_u32_be(msg, tail + 8)?,
                expire: read_u32_be(msg, tail + 12)?,
                minimum: read_u32_be(msg, tail + 16)?,
            })
        }
        _ => Ok(DnsRData::Raw(rdata.to_vec())),
    }
}

fn parse_txt(rdata: &[u8]) -> Result<Vec<String>> {
    let mut strings = Vec::new();
    let mut offset = 0;
    while offset < rdata.len() {
        let len = rdata[offset] as usize;
        offset += 1;
        require_len(rdata, offset + len)?;
        strings.push(String::from_utf8_lossy(&rdata[offset..offset + len]).into_owned());
        offset += len;
    }
    Ok(strings)
}

/// Parse a (possibly compressed) domain name starting at `start` within the
/// whole DNS message `msg`.
///
/// Returns `(dotted_name, consumed)`. `consumed` is the number of bytes the
/// *current record* should advance by — i.e. up through the label(s) read
/// before the first compression pointer (or through the terminating zero
/// byte, if no pointer is used) — deliberately distinct from how far
/// resolving the name recursed into earlier parts of the message. A
/// resource-record parser advances its cursor by `consumed`, not by the
/// total bytes touched while chasing pointers (§9 design note).
fn parse_name(msg: &[u8], start: usize) -> Result<(String, usize)> {
    let mut labels = Vec::new();
    let mut offset = start;
    let mut consumed_in_record: Option<usize> = None;
    let mut depth = 0usize;
    let mut visited_pointers: HashSet<usize> = HashSet::new();
    let mut total_octets = 0usize;

    loop {
        let len_byte = read_u8(msg, offset)?;
        match len_byte & 0xC0 {
            0x00 => {
                let label_len = (len_byte & 0x3F) as usize;
                if label_len == 0 {
                    if consumed_in_record.is_none() {
                        consumed_in_record = Some(offset + 1 - start);
                    }
                    break;
                }
                if label_len > MAX_LABEL_OCTETS {
                    return Err(Error::structural(
                        offset,
                        format!("DNS label of {} octets exceeds the 63-octet maximum", label_len),
                    ));
                }
                let label_start = offset + 1;
                require_len(msg, label_start + label_len).map_err(|_| {
                    Error::bounds(label_start, "DNS label runs past end of message")
                })?;
                labels.push(String::from_utf8_lossy(&msg[label_start..label_start + label_len]).into_owned());
                total_octets += 1 + label_len;
                if total_octets > MAX_NAME_OCTETS {
                    return Err(Error::structural(
                        offset,
                        "DNS name exceeds 255 octets on the wire",
                    ));
                }
                offset = label_start + label_len;
            }
            0xC0 => {
                if !visited_pointers.insert(offset) {
                    return Err(Error::structural(offset, "name compression loop detected"));
                }
                let second_byte = read_u8(msg, offset + 1)?;
                let pointer_target = (((len_byte & 0x3F) as usize) << 8) | second_byte as usize;
                if consumed_in_record.is_none() {
                    consumed_in_record = Some(offset + 2 - start);
                }
                depth += 1;
                if depth > MAX_POINTER_DEPTH {
                    return Err(Error::structural(
                        offset,
                        format!("name compression pointer chain exceeds depth {}", MAX_POINTER_DEPTH),
                    ));
                }
                if pointer_target >= msg.len() {
                    return Err(Error::bounds(
                        pointer_target,
                        "compression pointer targets beyond end of message",
                    ));
                }
                offset = pointer_target;
            }
            _ => {
                return Err(Error::structural(
                    offset,
                    "reserved DNS label length pattern (top bits 01/10)",
                ));
            }
        }
    }

    Ok((labels.join("."), consumed_in_record.unwrap_or(offset - start)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_name(labels: &[&str]) -> Vec<u8> {
        let mut out = Vec::new();
        for label in labels {
            out.push(label.len() as u8);
            out.extend_from_slice(label.as_bytes());
        }
        out.push(0);
        out
    }

    fn query_message(name: &[&str], qtype: u16) -> Vec<u8> {
        let mut buf = vec![0x12, 0x34, 0x01, 0x00]; // id=0x1234, flags RD
        buf.extend_from_slice(&1u16.to_be_bytes()); // qdcount
        buf.extend_from_slice(&[0, 0, 0, 0, 0, 0]); // an/ns/ar counts
        buf.extend_from_slice(&encode_name(name));
        buf.extend_from_slice(&qtype.to_be_bytes());
        buf.extend_from_slice(&1u16.to_be_bytes()); // qclass IN
        buf
    }

    #[test]
    fn decodes_a_record_query() {
        let buf = query_message(&["www", "example", "com"], 1);
        let layer = DnsDecoder
            .decode(&buf, DecodeConfig::default(), None)
            .unwrap()
            .unwrap();
        match &layer.data {
            LayerData::Dns(msg) => {
                assert_eq!(msg.transaction_id, 0x1234);
                assert!(!msg.flags.qr);
                assert_eq!(msg.questions.len(), 1);
                assert_eq!(msg.questions[0].qname, "www.example.com");
                assert_eq!(msg.questions[0].qtype, 1);
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn self_referencing_pointer_is_a_compression_loop() {
        // Header (12 bytes) then a pointer at offset 12 pointing at itself.
        let mut buf = vec![0u8; 12];
        buf[4..6].copy_from_slice(&1u16.to_be_bytes()); // qdcount=1
        buf.extend_from_slice(&[0xC0, 0x0C]); // pointer to offset 12
        buf.extend_from_slice(&[0, 1, 0, 1]); // qtype/qclass (never reached)
        let err = DnsDecoder
            .decode(&buf, DecodeConfig::default(), None)
            .unwrap_err();
        match err {
            Error::Structural { message, .. } => assert!(message.contains("loop")),
            _ => panic!("expected structural error"),
        }
    }

    #[test]
    fn resolves_a_compression_pointer_to_an_earlier_name() {
        let mut buf = vec![0u8; 12];
        buf[4..6].copy_from_slice(&0u16.to_be_bytes());
        buf[6..8].copy_from_slice(&1u16.to_be_bytes()); // ancount=1
        let name_offset = buf.len();
        buf.extend_from_slice(&encode_name(&["example", "com"]));
        // answer: pointer to name_offset, type A, class IN, ttl, rdlength=4, rdata
        buf.extend_from_slice(&[0xC0, name_offset as u8]);
        buf.extend_from_slice(&1u16.to_be_bytes()); // type A
        buf.extend_from_slice(&1u16.to_be_bytes()); // class IN
        buf.extend_from_slice(&300u32.to_be_bytes()); // ttl
        buf.extend_from_slice(&4u16.to_be_bytes()); // rdlength
        buf.extend_from_slice(&[93, 184, 216, 34]);

        let layer = DnsDecoder
            .decode(&buf, DecodeConfig::default(), None)
            .unwrap()
            .unwrap();
        match &layer.data {
            LayerData::Dns(msg) => {
                assert_eq!(msg.answers.len(), 1);
                assert_eq!(msg.answers[0].name, "example.com");
                match &msg.answers[0].rdata {
                    DnsRData::A(addr) => assert_eq!(addr, "93.184.216.34"),
                    _ => panic!("wrong rdata"),
                }
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn label_over_63_bytes_is_structural_error() {
        let mut buf = vec![0u8; 12];
        buf[4..6].copy_from_slice(&1u16.to_be_bytes());
        buf.push(64); // invalid label length
        buf.extend_from_slice(&[b'a'; 64]);
        buf.push(0);
        buf.extend_from_slice(&[0, 1, 0, 1]);
        assert!(DnsDecoder
            .decode(&buf, DecodeConfig::default(), None)
            .is_err());
    }

    #[test]
    fn txt_record_splits_length_prefixed_strings() {
        let mut rdata = Vec::new();
        rdata.push(5u8);
        rdata.extend_from_slice(b"hello");
        rdata.push(5u8);
        rdata.extend_from_slice(b"world");
        let strings = parse_txt(&rdata).unwrap();
        assert_eq!(strings, vec!["hello".to_string(), "world".to_string()]);
    }
}
