//! Component F: the single polymorphic contract every protocol decoder
//! satisfies, plus the structured output it produces.

use crate::decoders::arp::ArpHeader;
use crate::decoders::dns::DnsMessage;
use crate::decoders::ethernet::EthernetHeader;
use crate::decoders::http::HttpMessage;
use crate::decoders::icmpv4::Icmpv4Header;
use crate::decoders::icmpv6::Icmpv6Header;
use crate::decoders::ipv4::Ipv4Header;
use crate::decoders::ipv6::Ipv6Header;
use crate::decoders::tcp::TcpHeader;
use crate::decoders::udp::UdpHeader;
use crate::error::Result;
use crate::id::Id;

/// The structured interpretation carried by a [`Layer`], tagged by protocol.
///
/// This is the "tagged variant of layer outputs" from the design notes: a
/// single sum type lets the driver (component H) hold a homogeneous list of
/// layers while callers match on `data` to get at protocol-specific fields.
#[derive(Clone, PartialEq, Debug)]
pub enum LayerData<'a> {
    Ethernet(EthernetHeader),
    Arp(ArpHeader),
    Ipv4(Ipv4Header<'a>),
    Ipv6(Ipv6Header<'a>),
    Icmpv4(Icmpv4Header<'a>),
    Icmpv6(Icmpv6Header<'a>),
    Tcp(TcpHeader<'a>),
    Udp(UdpHeader),
    Dns(DnsMessage),
    Http(HttpMessage<'a>),
    /// Terminal layer appended by the driver when no decoder claims the
    /// remaining bytes.
    Raw,
}

/// One decoded protocol instance within a packet.
#[derive(Clone, PartialEq, Debug)]
pub struct Layer<'a> {
    pub protocol_name: &'static str,
    /// Number of bytes the decoder consumed from the head of `bytes`.
    pub header_length: usize,
    pub data: LayerData<'a>,
    /// `bytes[header_length..]` — not yet further decoded.
    pub payload: &'a [u8],
    /// The full span of the input this decoder was given, clipped to
    /// `header_length + payload.len()` (§3 invariant: `len(bytes) ==
    /// header_length + len(payload)` always holds by construction).
    pub bytes: &'a [u8],
}

impl<'a> Layer<'a> {
    /// Build a layer from a decoder's input buffer, header length, and
    /// payload slice. `bytes` is derived rather than taken as a parameter so
    /// the §3 invariant can't be violated by a decoder passing mismatched
    /// values.
    pub fn new(
        protocol_name: &'static str,
        header_length: usize,
        data: LayerData<'a>,
        input: &'a [u8],
        payload: &'a [u8],
    ) -> Layer<'a> {
        let span = header_length + payload.len();
        Layer {
            protocol_name,
            header_length,
            data,
            payload,
            bytes: &input[..span.min(input.len())],
        }
    }

    pub fn raw(input: &'a [u8]) -> Layer<'a> {
        Layer {
            protocol_name: "Raw",
            header_length: 0,
            data: LayerData::Raw,
            payload: &input[input.len()..],
            bytes: input,
        }
    }
}

/// Metadata forwarded by an outer layer to help an inner decoder, e.g. an IP
/// pseudo-header for a downstream transport-layer checksum. Decoders that
/// don't need context simply ignore it.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct DecodeContext {
    pub pseudo_header: Option<PseudoHeader>,
}

/// The IPv4/IPv6 pseudo-header used by TCP/UDP checksum validation. Carried
/// as plain owned data (16 bytes at most) rather than a slice, since it's
/// synthesized by the IP decoder rather than sliced from the packet.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PseudoHeader {
    pub source: [u8; 16],
    pub destination: [u8; 16],
    pub is_ipv6: bool,
    pub protocol: u8,
    pub length: u32,
}

/// Runtime configuration for decoding (§1A). The only knob exposed today is
/// whether checksum validation runs when enough context is available; it is
/// a plain struct field rather than an environment variable or CLI flag, per
/// §6 ("Deliberately out of scope: ... command-line argument handling").
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DecodeConfig {
    pub validate_checksums: bool,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        DecodeConfig {
            validate_checksums: true,
        }
    }
}

/// The contract every protocol decoder satisfies.
///
/// `decode` returns:
/// - `Ok(Some(layer))` on success,
/// - `Ok(None)` when the buffer cannot plausibly be this protocol (the
///   dispatcher should try a different decoder, though in practice the
///   registry holds at most one decoder per identifier),
/// - `Err(_)` when the buffer begins as this protocol but is malformed
///   beyond recovery.
pub trait Decoder: Send + Sync {
    /// Short ASCII label, e.g. `"IPv4"`.
    fn name(&self) -> &'static str;

    fn decode<'a>(
        &self,
        buf: &'a [u8],
        config: DecodeConfig,
        ctx: Option<&DecodeContext>,
    ) -> Result<Option<Layer<'a>>>;

    /// The identifier of the protocol encapsulated by `decoded`, or `None`
    /// for a terminal layer.
    fn next_protocol(&self, decoded: &LayerData<'_>) -> Option<Id>;
}
