//! Root server hints.

use descent_proto::Name;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

// ============================================================================
// IANA Root Servers
// ============================================================================

/// A root server entry.
#[derive(Debug, Clone, Copy)]
struct RootServer {
    name: &'static str,
    ipv4: Ipv4Addr,
    ipv6: Ipv6Addr,
}

const fn v6(segments: [u16; 8]) -> Ipv6Addr {
    Ipv6Addr::new(
        segments[0], segments[1], segments[2], segments[3], segments[4], segments[5], segments[6],
        segments[7],
    )
}

/// The IANA root servers.
static IANA_ROOT_SERVERS: &[RootServer] = &[
    RootServer {
        name: "a.root-servers.net",
        ipv4: Ipv4Addr::new(198, 41, 0, 4),
        ipv6: v6([0x2001, 0x503, 0xba3e, 0, 0, 0, 0x2, 0x30]),
    },
    RootServer {
        name: "b.root-servers.net",
        ipv4: Ipv4Addr::new(170, 247, 170, 2),
        ipv6: v6([0x2801, 0x1b8, 0x10, 0, 0, 0, 0, 0xb]),
    },
    RootServer {
        name: "c.root-servers.net",
        ipv4: Ipv4Addr::new(192, 33, 4, 12),
        ipv6: v6([0x2001, 0x500, 0x2, 0, 0, 0, 0, 0xc]),
    },
    RootServer {
        name: "d.root-servers.net",
        ipv4: Ipv4Addr::new(199, 7, 91, 13),
        ipv6: v6([0x2001, 0x500, 0x2d, 0, 0, 0, 0, 0xd]),
    },
    RootServer {
        name: "e.root-servers.net",
        ipv4: Ipv4Addr::new(192, 203, 230, 10),
        ipv6: v6([0x2001, 0x500, 0xa8, 0, 0, 0, 0, 0xe]),
    },
    RootServer {
        name: "f.root-servers.net",
        ipv4: Ipv4Addr::new(192, 5, 5, 241),
        ipv6: v6([0x2001, 0x500, 0x2f, 0, 0, 0, 0, 0xf]),
    },
    RootServer {
        name: "g.root-servers.net",
        ipv4: Ipv4Addr::new(192, 112, 36, 4),
        ipv6: v6([0x2001, 0x500, 0x12, 0, 0, 0, 0, 0xd0d]),
    },
    RootServer {
        name: "h.root-servers.net",
        ipv4: Ipv4Addr::new(198, 97, 190, 53),
        ipv6: v6([0x2001, 0x500, 0x1, 0, 0, 0, 0, 0x53]),
    },
    RootServer {
        name: "i.root-servers.net",
        ipv4: Ipv4Addr::new(192, 36, 148, 17),
        ipv6: v6([0x2001, 0x7fe, 0, 0, 0, 0, 0, 0x53]),
    },
    RootServer {
        name: "j.root-servers.net",
        ipv4: Ipv4Addr::new(192, 58, 128, 30),
        ipv6: v6([0x2001, 0x503, 0xc27, 0, 0, 0, 0x2, 0x30]),
    },
    RootServer {
        name: "k.root-servers.net",
        ipv4: Ipv4Addr::new(193, 0, 14, 129),
        ipv6: v6([0x2001, 0x7fd, 0, 0, 0, 0, 0, 0x1]),
    },
    RootServer {
        name: "l.root-servers.net",
        ipv4: Ipv4Addr::new(199, 7, 83, 42),
        ipv6: v6([0x2001, 0x500, 0x9f, 0, 0, 0, 0, 0x42]),
    },
    RootServer {
        name: "m.root-servers.net",
        ipv4: Ipv4Addr::new(202, 12, 27, 33),
        ipv6: v6([0x2001, 0xdc3, 0, 0, 0, 0, 0, 0x35]),
    },
];

// ============================================================================
// Root Hints
// ============================================================================

/// Nameservers the resolver starts every resolution from.
///
/// Entries keep their insertion order; that is the order servers are tried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootHints {
    servers: Vec<(Name, Vec<IpAddr>)>,
}

impl RootHints {
    /// Creates hints from `(name, address)` pairs. Addresses sharing a name
    /// are grouped under one server.
    pub fn new<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Name, IpAddr)>,
    {
        let mut servers: Vec<(Name, Vec<IpAddr>)> = Vec::new();
        for (name, addr) in entries {
            match servers.iter_mut().find(|(n, _)| *n == name) {
                Some((_, addrs)) => {
                    if !addrs.contains(&addr) {
                        addrs.push(addr);
                    }
                }
                None => servers.push((name, vec![addr])),
            }
        }
        Self { servers }
    }

    /// Returns the 13 IANA root servers with their IPv4 and IPv6 addresses.
    pub fn iana() -> Self {
        Self::new(IANA_ROOT_SERVERS.iter().flat_map(|rs| {
            let name = Name::from_str(rs.name).unwrap_or_else(|_| Name::root());
            [
                (name.clone(), IpAddr::V4(rs.ipv4)),
                (name, IpAddr::V6(rs.ipv6)),
            ]
        }))
    }

    /// Returns the servers and their addresses.
    pub fn servers(&self) -> &[(Name, Vec<IpAddr>)] {
        &self.servers
    }

    /// Returns the number of servers.
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    /// Returns true if there are no servers.
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}

impl Default for RootHints {
    fn default() -> Self {
        Self::iana()
    }
}
