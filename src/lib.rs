//! A pure, synchronous packet-capture reader and protocol decoder.
//!
//! Two capture formats are supported — classic pcap ([`capture::classic`])
//! and block-structured pcap-ng ([`capture::block`]) — both exposed as
//! [`std::iter::Iterator`]s over a borrowed byte buffer yielding
//! [`capture::PerPacketUnit`]s. Decoding a captured frame is a separate step:
//! build a [`Registry`] (or use [`Registry::with_defaults`]), then call
//! [`decode_packet`] with the frame's link-type as the starting identifier.
//!
//! The crate does no I/O and reads no environment; callers own reading the
//! capture into memory and configuring a `tracing` subscriber if they want
//! to see the `debug!`/`info!`/`warn!`/`error!` events the iterators and
//! decoders emit.
//!
//! ```
//! use pktlayers::capture::classic::iterate_classic;
//! use pktlayers::{decode_packet, id::well_known, DecodeConfig, Registry};
//!
//! # let capture_bytes: &[u8] = &[];
//! let registry = Registry::with_defaults();
//! for unit in iterate_classic(capture_bytes) {
//!     let packet = decode_packet(
//!         unit.packet_bytes,
//!         well_known::LINK_TYPE_ETHERNET,
//!         &registry,
//!         DecodeConfig::default(),
//!         unit,
//!     );
//!     let _ = packet.fully_decoded();
//! }
//! ```

pub mod addr;
pub mod bytes;
pub mod capture;
pub mod checksum;
pub mod decoders;
pub mod driver;
pub mod error;
pub mod id;
pub mod layer;
pub mod registry;
pub mod tlv;

pub use capture::block::iterate_block;
pub use capture::classic::iterate_classic;
pub use capture::{PerPacketUnit, Timestamp};
pub use driver::{decode_packet, DecodedPacket};
pub use error::{Error, Result};
pub use id::Id;
pub use layer::{DecodeConfig, DecodeContext, Decoder, Layer, LayerData, PseudoHeader};
pub use registry::Registry;
