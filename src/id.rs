//! Heterogeneous identifier keys (§9 design note): a protocol identifier is
//! either a machine integer (EtherType, IP protocol number, link-type) or a
//! short symbolic string (used by decoders that live outside the usual
//! numeric namespaces, e.g. DNS/HTTP dispatched by port rather than by a
//! registered wire-format tag). Modelling this as a sum avoids parsing
//! strings at dispatch time and keeps `Registry` keyed by a single hashable
//! type.

use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Id {
    Int(u32),
    Sym(&'static str),
}

impl Id {
    pub fn int(v: impl Into<u32>) -> Id {
        Id::Int(v.into())
    }

    pub fn sym(s: &'static str) -> Id {
        Id::Sym(s)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Int(v) => write!(f, "{:#x}", v),
            Id::Sym(s) => write!(f, "{}", s),
        }
    }
}

impl From<u32> for Id {
    fn from(v: u32) -> Id {
        Id::Int(v)
    }
}

impl From<u16> for Id {
    fn from(v: u16) -> Id {
        Id::Int(v as u32)
    }
}

impl From<u8> for Id {
    fn from(v: u8) -> Id {
        Id::Int(v as u32)
    }
}

impl From<&'static str> for Id {
    fn from(s: &'static str) -> Id {
        Id::Sym(s)
    }
}

/// Well-known identifiers used by the default decoder registrations
/// (§4.G.1).
pub mod well_known {
    use super::Id;

    pub const LINK_TYPE_ETHERNET: Id = Id::Int(1);

    pub const ETHERTYPE_IPV4: Id = Id::Int(0x0800);
    pub const ETHERTYPE_ARP: Id = Id::Int(0x0806);
    pub const ETHERTYPE_IPV6: Id = Id::Int(0x86DD);

    pub const IP_PROTO_ICMPV4: Id = Id::Int(1);
    pub const IP_PROTO_TCP: Id = Id::Int(6);
    pub const IP_PROTO_UDP: Id = Id::Int(17);
    pub const IP_PROTO_ICMPV6: Id = Id::Int(58);

    pub const APP_DNS: Id = Id::Sym("dns");
    pub const APP_HTTP: Id = Id::Sym("http");
}
