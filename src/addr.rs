//! Component B: canonical string rendering of MAC, IPv4 and IPv6 addresses.

use std::fmt::Write as _;

/// Render a 6-byte MAC address as colon-separated lowercase hex, e.g.
/// `"00:50:56:c0:00:08"`.
///
/// Panics if `bytes` is not exactly 6 bytes long; callers always slice a
/// known-length field before calling this.
pub fn format_mac(bytes: &[u8]) -> String {
    assert_eq!(bytes.len(), 6, "MAC address must be 6 bytes");
    let mut s = String::with_capacity(17);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            s.push(':');
        }
        let _ = write!(s, "{:02x}", b);
    }
    s
}

/// Render a 4-byte address as dotted-quad, e.g. `"192.168.1.1"`.
pub fn format_ipv4(bytes: &[u8]) -> String {
    assert_eq!(bytes.len(), 4, "IPv4 address must be 4 bytes");
    format!("{}.{}.{}.{}", bytes[0], bytes[1], bytes[2], bytes[3])
}

/// Render a 16-byte address as canonical colon-hex IPv6, using
/// [`std::net::Ipv6Addr`]'s `Display` impl (which already implements
/// zero-compression per RFC 5952).
pub fn format_ipv6(bytes: &[u8]) -> String {
    assert_eq!(bytes.len(), 16, "IPv6 address must be 16 bytes");
    let mut octets = [0u8; 16];
    octets.copy_from_slice(bytes);
    std::net::Ipv6Addr::from(octets).to_string()
}

/// Render an address of arbitrary length as lowercase hex bytes separated by
/// colons, used as a fallback for ARP hardware/protocol address lengths that
/// don't match a known address family.
pub fn format_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            s.push(':');
        }
        let _ = write!(s, "{:02x}", b);
    }
    s
}
