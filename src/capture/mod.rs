//! Shared per-packet-unit representation emitted by both file iterators
//! (components D and E).

pub mod block;
pub mod classic;

/// Timestamp attached to a per-packet unit.
///
/// The classic format always gives seconds + a sub-second offset (micro- or
/// nanoseconds, per the global header's magic). The block format gives a
/// single 64-bit tick count whose unit is interface-defined (conventionally
/// microseconds); [`Timestamp::from_ticks`] splits it back into
/// seconds/sub-second parts under that assumption so both formats expose the
/// same shape to callers.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Timestamp {
    pub seconds: i64,
    pub subsecond: u32,
    /// Divisor implied by `subsecond`: `1_000_000` for microseconds,
    /// `1_000_000_000` for nanoseconds.
    pub subsecond_units_per_second: u32,
}

impl Timestamp {
    pub fn from_ticks(ticks: u64, units_per_second: u32) -> Timestamp {
        let units_per_second = units_per_second.max(1);
        Timestamp {
            seconds: (ticks / units_per_second as u64) as i64,
            subsecond: (ticks % units_per_second as u64) as u32,
            subsecond_units_per_second: units_per_second,
        }
    }
}

/// One captured frame, as produced by either file iterator.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PerPacketUnit<'a> {
    pub timestamp: Timestamp,
    pub captured_length: u32,
    pub original_length: u32,
    pub packet_bytes: &'a [u8],
    pub link_type: u16,
    pub interface_id: u32,
    pub interface_name: Option<String>,
    pub interface_description: Option<String>,
}
