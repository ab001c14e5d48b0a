//! Component G: maps `(identifier -> prioritized decoder list)`.

use std::collections::HashMap;

use crate::decoders;
use crate::id::{well_known, Id};
use crate::layer::Decoder;

struct Entry {
    priority: u32,
    order: usize,
    decoder: Box<dyn Decoder>,
}

/// Maps a protocol identifier to the decoders registered for it, ordered by
/// ascending priority with ties broken by registration order (first
/// registered wins).
#[derive(Default)]
pub struct Registry {
    entries: HashMap<Id, Vec<Entry>>,
    next_order: usize,
}

impl Registry {
    pub fn new() -> Registry {
        Registry {
            entries: HashMap::new(),
            next_order: 0,
        }
    }

    /// Register `decoder` for `identifier` at `priority` (lower wins).
    /// Re-sorts the identifier's decoder list stably by ascending priority;
    /// among equal priorities, the earlier `register` call stays first.
    pub fn register(&mut self, identifier: Id, decoder: Box<dyn Decoder>, priority: u32) {
        let order = self.next_order;
        self.next_order += 1;
        let list = self.entries.entry(identifier).or_default();
        list.push(Entry {
            priority,
            order,
            decoder,
        });
        list.sort_by(|a, b| a.priority.cmp(&b.priority).then(a.order.cmp(&b.order)));
    }

    /// Return the highest-priority decoder for `identifier`, or `None` if
    /// nothing is registered for it.
    pub fn get(&self, identifier: Id) -> Option<&dyn Decoder> {
        self.entries
            .get(&identifier)
            .and_then(|list| list.first())
            .map(|e| e.decoder.as_ref())
    }

    /// A registry pre-populated with the eleven §4.I decoders, keyed the way
    /// §4.H looks them up: link-type for Ethernet II, EtherType for
    /// ARP/IPv4/IPv6, IP protocol number for ICMPv4/ICMPv6/TCP/UDP, and the
    /// symbolic keys `"dns"`/`"http"` for the two application decoders (the
    /// core does not perform port-based application dispatch itself — a
    /// caller that wants DNS/HTTP decoding looks up the symbolic identifier
    /// explicitly once it knows the port matched).
    pub fn with_defaults() -> Registry {
        let mut reg = Registry::new();
        reg.register(
            well_known::LINK_TYPE_ETHERNET,
            Box::new(decoders::ethernet::EthernetDecoder),
            0,
        );
        reg.register(well_known::ETHERTYPE_ARP, Box::new(decoders::arp::ArpDecoder), 0);
        reg.register(
            well_known::ETHERTYPE_IPV4,
            Box::new(decoders::ipv4::Ipv4Decoder),
            0,
        );
        reg.register(
            well_known::ETHERTYPE_IPV6,
            Box::new(decoders::ipv6::Ipv6Decoder),
            0,
        );
        reg.register(
            well_known::IP_PROTO_ICMPV4,
            Box::new(decoders::icmpv4::Icmpv4Decoder),
            0,
        );
        reg.register(
            well_known::IP_PROTO_ICMPV6,
            Box::new(decoders::icmpv6::Icmpv6Decoder),
            0,
        );
        reg.register(well_known::IP_PROTO_TCP, Box::new(decoders::tcp::TcpDecoder), 0);
        reg.register(well_known::IP_PROTO_UDP, Box::new(decoders::udp::UdpDecoder), 0);
        reg.register(well_known::APP_DNS, Box::new(decoders::dns::DnsDecoder), 0);
        reg.register(well_known::APP_HTTP, Box::new(decoders::http::HttpDecoder), 0);
        reg
    }
}
