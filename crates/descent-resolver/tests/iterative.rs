//! Iterative resolution against an in-memory world of zones.
//!
//! Each zone is served by one address; the mock transport plays the
//! authoritative server for whatever zone lives at the queried address:
//! - Referrals for names below a zone cut, with glue from the same zone
//! - Authoritative answers, CNAMEs, NODATA and NXDOMAIN with an SOA
//! - Optional misbehaviour per server (truncation, hanging, self-referral)

use std::collections::{HashMap, HashSet};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::time::Instant;

use descent_cache::{CacheConfig, CacheLookup, ManualClock, ZoneCache};
use descent_proto::rdata::SOA;
use descent_proto::{
    HeaderFlags, Message, Name, RecordClass, RecordType, ResourceRecord, ResponseCode,
};
use descent_resolver::{
    IterativeResolver, ResolverConfig, ResolverError, RootHints, Transport, TransportError,
};

// ============================================================================
// Zone World
// ============================================================================

const ROOT_ADDR: Ipv4Addr = Ipv4Addr::new(198, 41, 0, 4);

fn name(s: &str) -> Name {
    Name::from_str(s).unwrap()
}

fn a(owner: &str, ip: &str) -> ResourceRecord {
    ResourceRecord::a(name(owner), 3600, ip.parse().unwrap())
}

fn ns(owner: &str, target: &str) -> ResourceRecord {
    ResourceRecord::ns(name(owner), 3600, name(target))
}

fn cname(owner: &str, target: &str) -> ResourceRecord {
    ResourceRecord::cname(name(owner), 3600, name(target))
}

struct Zone {
    apex: Name,
    records: Vec<ResourceRecord>,
    soa: ResourceRecord,
    refer_to_self: bool,
}

impl Zone {
    fn new(apex: &str, records: Vec<ResourceRecord>) -> Self {
        let apex = name(apex);
        let mname = apex.prepend_label(b"ns").unwrap();
        let rname = apex.prepend_label(b"hostmaster").unwrap();
        let soa = ResourceRecord::soa(
            apex.clone(),
            3600,
            SOA::new(mname, rname, 1, 7200, 900, 1_209_600, 300),
        );
        Self {
            apex,
            records,
            soa,
            refer_to_self: false,
        }
    }

    fn answer(&self, query: &Message) -> Message {
        let question = query.question().unwrap().clone();
        let qname = &question.qname;
        let mut response = Message::builder()
            .id(query.id())
            .flag(HeaderFlags::QR, true)
            .question(question.clone());

        if self.refer_to_self {
            let own_ns = self
                .records
                .iter()
                .filter(|r| r.rtype() == RecordType::NS && r.name() == &self.apex);
            for record in own_ns {
                response = response.authority(record.clone());
            }
            return response.build();
        }

        let cut = self
            .records
            .iter()
            .filter(|r| r.rtype() == RecordType::NS && r.name() != &self.apex)
            .map(|r| r.name())
            .filter(|owner| qname.is_subdomain_of(owner))
            .max_by_key(|owner| owner.label_count());

        if let Some(cut) = cut {
            let delegation: Vec<&ResourceRecord> = self
                .records
                .iter()
                .filter(|r| r.rtype() == RecordType::NS && r.name() == cut)
                .collect();
            for record in &delegation {
                response = response.authority((*record).clone());
                let target = record.rdata().as_ns().unwrap();
                for glue in self.records.iter().filter(|r| {
                    r.name() == target && matches!(r.rtype(), RecordType::A | RecordType::AAAA)
                }) {
                    response = response.additional(glue.clone());
                }
            }
            return response.build();
        }

        let response = response.flag(HeaderFlags::AA, true);
        let exact: Vec<&ResourceRecord> = self
            .records
            .iter()
            .filter(|r| r.matches(qname, question.qtype, question.qclass))
            .collect();
        if !exact.is_empty() {
            return exact
                .into_iter()
                .fold(response, |b, r| b.answer(r.clone()))
                .build();
        }

        if let Some(alias) = self
            .records
            .iter()
            .find(|r| r.name() == qname && r.rtype() == RecordType::CNAME)
        {
            return response.answer(alias.clone()).build();
        }

        let exists = self.records.iter().any(|r| r.name().is_subdomain_of(qname));
        let response = response.authority(self.soa.clone());
        if exists {
            response.build()
        } else {
            response.rcode(ResponseCode::NXDomain).build()
        }
    }
}

/// Transport serving a set of zones, one per address.
struct ZoneWorld {
    zones: HashMap<IpAddr, Zone>,
    truncate_udp: HashSet<IpAddr>,
    hang: HashSet<IpAddr>,
    max_steps: usize,
    queries: AtomicUsize,
    tcp_queries: AtomicUsize,
}

impl ZoneWorld {
    fn new() -> Self {
        Self {
            zones: HashMap::new(),
            truncate_udp: HashSet::new(),
            hang: HashSet::new(),
            max_steps: 64,
            queries: AtomicUsize::new(0),
            tcp_queries: AtomicUsize::new(0),
        }
    }

    fn root(self, records: Vec<ResourceRecord>) -> Self {
        self.zone(".", &ROOT_ADDR.to_string(), records)
    }

    fn zone(mut self, apex: &str, addr: &str, records: Vec<ResourceRecord>) -> Self {
        self.zones.insert(addr.parse().unwrap(), Zone::new(apex, records));
        self
    }

    fn with_zone(mut self, addr: &str, f: impl FnOnce(&mut Zone)) -> Self {
        f(self.zones.get_mut(&addr.parse::<IpAddr>().unwrap()).unwrap());
        self
    }

    fn truncating(mut self, addr: &str) -> Self {
        self.truncate_udp.insert(addr.parse().unwrap());
        self
    }

    fn hanging(mut self, addr: &str) -> Self {
        self.hang.insert(addr.parse().unwrap());
        self
    }

    fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ZoneWorld {
    async fn send(
        &self,
        server: SocketAddr,
        query: &[u8],
        reliable: bool,
        _deadline: Instant,
    ) -> Result<Bytes, TransportError> {
        assert_eq!(server.port(), 53);
        let step = self.queries.fetch_add(1, Ordering::SeqCst) + 1;
        if step > self.max_steps {
            return Err(TransportError::Closed);
        }
        if reliable {
            self.tcp_queries.fetch_add(1, Ordering::SeqCst);
        }
        if self.hang.contains(&server.ip()) {
            return std::future::pending().await;
        }

        let query = Message::parse(query).unwrap();
        assert!(!query.header().flags.contains(HeaderFlags::RD));
        assert!(query.edns().is_some());

        let Some(zone) = self.zones.get(&server.ip()) else {
            return Err(std::io::Error::from(std::io::ErrorKind::ConnectionRefused).into());
        };

        let response = if !reliable && self.truncate_udp.contains(&server.ip()) {
            Message::builder()
                .id(query.id())
                .flag(HeaderFlags::QR, true)
                .flag(HeaderFlags::TC, true)
                .question(query.question().unwrap().clone())
                .build()
        } else {
            zone.answer(&query)
        };
        Ok(response.to_wire().unwrap())
    }
}

fn hints() -> RootHints {
    RootHints::new([(name("a.root-servers.net"), IpAddr::V4(ROOT_ADDR))])
}

fn resolver(world: Arc<ZoneWorld>, config: ResolverConfig, cache: Arc<ZoneCache>) -> IterativeResolver {
    IterativeResolver::new(config, cache, world).with_root_hints(hints())
}

fn no_cache() -> Arc<ZoneCache> {
    Arc::new(ZoneCache::new(CacheConfig {
        capacity: 0,
        ..CacheConfig::default()
    }))
}

fn example_world() -> ZoneWorld {
    ZoneWorld::new()
        .root(vec![ns("com", "ns.com"), a("ns.com", "1.1.1.1")])
        .zone(
            "com",
            "1.1.1.1",
            vec![
                ns("example.com", "ns.example.com"),
                a("ns.example.com", "1.1.1.2"),
            ],
        )
        .zone(
            "example.com",
            "1.1.1.2",
            vec![
                a("www.example.com", "1.1.1.3"),
                cname("alias.example.com", "www.example.com"),
            ],
        )
}

fn addresses(message: &Message) -> Vec<IpAddr> {
    message.addresses().collect()
}

// ============================================================================
// Delegation
// ============================================================================

#[tokio::test]
async fn test_basic_delegation() {
    let world = Arc::new(example_world());
    let resolver = resolver(world.clone(), ResolverConfig::default(), no_cache());

    let result = resolver
        .resolve_name(&name("www.example.com"), RecordType::A)
        .await
        .unwrap();

    let answers = result.message.answers();
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0].rtype(), RecordType::A);
    assert_eq!(addresses(&result.message), vec![IpAddr::from([1, 1, 1, 3])]);
    assert_eq!(result.server, Some("1.1.1.2:53".parse().unwrap()));
    assert!(!result.from_cache);
    assert!(!result.truncated);
    assert!(result.validation.is_none());

    assert_eq!(world.queries(), 3);
    let stats = resolver.stats().snapshot();
    assert_eq!(stats.referrals_followed, 2);
    assert_eq!(stats.queries_sent, 3);
}

#[tokio::test]
async fn test_cached_answer_skips_network() {
    let world = Arc::new(example_world());
    let cache = Arc::new(ZoneCache::new(CacheConfig::default()));
    let resolver = resolver(world.clone(), ResolverConfig::default(), cache);

    let first = resolver
        .resolve_name(&name("www.example.com"), RecordType::A)
        .await
        .unwrap();
    assert!(!first.from_cache);
    let sent = world.queries();

    let second = resolver
        .resolve_name(&name("www.example.com"), RecordType::A)
        .await
        .unwrap();
    assert!(second.from_cache);
    assert_eq!(second.server, None);
    assert_eq!(addresses(&second.message), vec![IpAddr::from([1, 1, 1, 3])]);
    assert_eq!(world.queries(), sent);
}

#[tokio::test]
async fn test_referral_data_is_not_a_cached_answer() {
    // The parent's glue says 1.1.1.2; the child zone itself says 9.9.9.9
    let world = Arc::new(
        example_world().with_zone("1.1.1.2", |zone| {
            zone.records.push(ns("example.com", "ns.example.com"));
            zone.records.push(a("ns.example.com", "9.9.9.9"));
        }),
    );
    let cache = Arc::new(ZoneCache::new(CacheConfig::default()));
    let resolver = resolver(world.clone(), ResolverConfig::default(), cache.clone());

    resolver
        .resolve_name(&name("www.example.com"), RecordType::A)
        .await
        .unwrap();
    assert!(matches!(
        cache.get_entry(&name("ns.example.com"), RecordType::A, RecordClass::IN),
        Some(CacheLookup::Delegation(_))
    ));
    let sent = world.queries();

    // Parent-side NS set is not an answer; the child is asked
    let zone_ns = resolver
        .resolve_name(&name("example.com"), RecordType::NS)
        .await
        .unwrap();
    assert!(!zone_ns.from_cache);
    assert_eq!(zone_ns.server, Some("1.1.1.2:53".parse().unwrap()));
    assert_eq!(world.queries(), sent + 1);

    // Glue is not an answer either
    let glue = resolver
        .resolve_name(&name("ns.example.com"), RecordType::A)
        .await
        .unwrap();
    assert!(!glue.from_cache);
    assert_eq!(addresses(&glue.message), vec![IpAddr::from([9, 9, 9, 9])]);
    assert_eq!(world.queries(), sent + 2);

    // The authoritative answer replaced the glue
    let cached = resolver
        .resolve_name(&name("ns.example.com"), RecordType::A)
        .await
        .unwrap();
    assert!(cached.from_cache);
    assert_eq!(addresses(&cached.message), vec![IpAddr::from([9, 9, 9, 9])]);
    assert_eq!(world.queries(), sent + 2);
}

#[tokio::test]
async fn test_cached_delegation_is_reused() {
    let world = Arc::new(example_world());
    let cache = Arc::new(ZoneCache::new(CacheConfig::default()));
    let resolver = resolver(world.clone(), ResolverConfig::default(), cache);

    resolver
        .resolve_name(&name("www.example.com"), RecordType::A)
        .await
        .unwrap();
    let sent = world.queries();

    // Starts at the cached example.com delegation
    let result = resolver
        .resolve_name(&name("missing.example.com"), RecordType::A)
        .await
        .unwrap();
    assert_eq!(result.rcode(), ResponseCode::NXDomain);
    assert_eq!(world.queries(), sent + 1);
}

#[tokio::test]
async fn test_loop_detected() {
    let world = Arc::new(
        ZoneWorld::new()
            .root(vec![
                ns("a", "a.ns"),
                ns("b", "b.ns"),
                a("a.ns", "1.1.1.1"),
                a("b.ns", "1.1.1.2"),
            ])
            .zone("a", "1.1.1.1", vec![ns("test.a", "a.test.b")])
            .zone("b", "1.1.1.2", vec![ns("test.b", "b.test.a")]),
    );
    let resolver = resolver(world.clone(), ResolverConfig::default(), no_cache());

    let err = resolver
        .resolve_name(&name("www.test.a"), RecordType::A)
        .await
        .unwrap_err();
    assert!(
        matches!(err, ResolverError::LoopDetected { .. }),
        "unexpected error: {err}"
    );
    assert!(world.queries() < world.max_steps);
}

#[tokio::test]
async fn test_loop_detected_with_cache() {
    let world = Arc::new(
        ZoneWorld::new()
            .root(vec![
                ns("a", "a.ns"),
                ns("b", "b.ns"),
                a("a.ns", "1.1.1.1"),
                a("b.ns", "1.1.1.2"),
            ])
            .zone("a", "1.1.1.1", vec![ns("test.a", "a.test.b")])
            .zone("b", "1.1.1.2", vec![ns("test.b", "b.test.a")]),
    );
    let cache = Arc::new(ZoneCache::new(CacheConfig::default()));
    let resolver = resolver(world.clone(), ResolverConfig::default(), cache);

    let err = resolver
        .resolve_name(&name("www.test.a"), RecordType::A)
        .await
        .unwrap_err();
    assert!(matches!(err, ResolverError::LoopDetected { .. }));
    assert!(world.queries() < world.max_steps);
}

#[tokio::test]
async fn test_nameserver_without_glue() {
    let world = Arc::new(
        ZoneWorld::new()
            .root(vec![
                ns("com", "ns.com"),
                ns("net", "ns.net"),
                a("ns.com", "1.1.1.1"),
                a("ns.net", "1.1.2.1"),
            ])
            .zone("com", "1.1.1.1", vec![ns("example.com", "example.ns.net")])
            .zone("net", "1.1.2.1", vec![a("example.ns.net", "1.1.2.2")])
            .zone("example.com", "1.1.2.2", vec![a("www.example.com", "1.1.1.3")]),
    );
    let resolver = resolver(world.clone(), ResolverConfig::default(), no_cache());

    let result = resolver
        .resolve_name(&name("www.example.com"), RecordType::A)
        .await
        .unwrap();
    assert_eq!(result.message.answers().len(), 1);
    assert_eq!(addresses(&result.message), vec![IpAddr::from([1, 1, 1, 3])]);
    assert_eq!(result.server, Some("1.1.2.2:53".parse().unwrap()));
}

#[tokio::test]
async fn test_referral_to_same_zone_rejected() {
    let world = Arc::new(
        example_world().with_zone("1.1.1.1", |zone| {
            zone.records.push(ns("com", "ns.com"));
            zone.refer_to_self = true;
        }),
    );
    let resolver = resolver(world.clone(), ResolverConfig::default(), no_cache());

    let err = resolver
        .resolve_name(&name("www.example.com"), RecordType::A)
        .await
        .unwrap_err();
    match err {
        ResolverError::ResolutionFailed { name: failed, reason } => {
            assert_eq!(failed, name("www.example.com"));
            assert!(reason.contains("does not lead toward"), "{reason}");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(resolver.stats().snapshot().server_failures, 1);
}

// ============================================================================
// Negative Answers
// ============================================================================

#[tokio::test]
async fn test_nxdomain_cached_with_soa_minimum() {
    let world = Arc::new(example_world());
    let clock = Arc::new(ManualClock::new());
    let cache = Arc::new(ZoneCache::with_clock(CacheConfig::default(), clock.clone()));
    let resolver = resolver(world.clone(), ResolverConfig::default(), cache.clone());

    let result = resolver
        .resolve_name(&name("nope.example.com"), RecordType::A)
        .await
        .unwrap();
    assert_eq!(result.rcode(), ResponseCode::NXDomain);
    assert!(result.is_negative());
    assert_eq!(result.message.authority().len(), 1);
    assert_eq!(result.message.authority()[0].rtype(), RecordType::SOA);

    // min(SOA TTL 3600, MINIMUM 300)
    assert_eq!(
        cache.get_entry(&name("nope.example.com"), RecordType::A, RecordClass::IN),
        Some(CacheLookup::Negative {
            rcode: ResponseCode::NXDomain,
            remaining_ttl: 300,
        })
    );

    let sent = world.queries();
    let again = resolver
        .resolve_name(&name("nope.example.com"), RecordType::A)
        .await
        .unwrap();
    assert!(again.from_cache);
    assert_eq!(again.rcode(), ResponseCode::NXDomain);
    assert_eq!(world.queries(), sent);

    clock.advance(Duration::from_secs(301));
    let expired = resolver
        .resolve_name(&name("nope.example.com"), RecordType::A)
        .await
        .unwrap();
    assert!(!expired.from_cache);
    assert!(world.queries() > sent);
}

#[tokio::test]
async fn test_nodata() {
    let world = Arc::new(example_world());
    let cache = Arc::new(ZoneCache::new(CacheConfig::default()));
    let resolver = resolver(world.clone(), ResolverConfig::default(), cache.clone());

    let result = resolver
        .resolve_name(&name("www.example.com"), RecordType::AAAA)
        .await
        .unwrap();
    assert_eq!(result.rcode(), ResponseCode::NoError);
    assert!(result.message.answers().is_empty());
    assert!(result.is_negative());
    assert!(matches!(
        cache.get_entry(&name("www.example.com"), RecordType::AAAA, RecordClass::IN),
        Some(CacheLookup::Negative {
            rcode: ResponseCode::NoError,
            ..
        })
    ));
}

// ============================================================================
// Transport Behaviour
// ============================================================================

#[tokio::test]
async fn test_truncation_retries_over_tcp() {
    let world = Arc::new(example_world().truncating("1.1.1.2"));
    let resolver = resolver(world.clone(), ResolverConfig::default(), no_cache());

    let result = resolver
        .resolve_name(&name("www.example.com"), RecordType::A)
        .await
        .unwrap();
    assert!(result.truncated);
    assert!(!result.message.is_truncated());
    assert_eq!(addresses(&result.message), vec![IpAddr::from([1, 1, 1, 3])]);
    assert_eq!(world.tcp_queries.load(Ordering::SeqCst), 1);
    assert_eq!(resolver.stats().snapshot().truncation_retries, 1);
}

#[tokio::test]
async fn test_hanging_server_times_out() {
    let world = Arc::new(example_world().hanging("1.1.1.2"));
    let config = ResolverConfig {
        query_timeout: Duration::from_secs(5),
        total_timeout: Duration::from_millis(200),
        ..ResolverConfig::default()
    };
    let resolver = resolver(world, config, no_cache());

    let err = resolver
        .resolve_name(&name("www.example.com"), RecordType::A)
        .await
        .unwrap_err();
    assert!(matches!(err, ResolverError::Timeout), "unexpected error: {err}");
}

#[tokio::test]
async fn test_slow_server_fails_over() {
    let world = Arc::new(
        ZoneWorld::new()
            .root(vec![ns("com", "ns.com"), a("ns.com", "1.1.1.1")])
            .zone(
                "com",
                "1.1.1.1",
                vec![
                    ns("example.com", "ns1.example.com"),
                    ns("example.com", "ns2.example.com"),
                    a("ns1.example.com", "1.1.1.2"),
                    a("ns2.example.com", "1.1.1.4"),
                ],
            )
            .zone("example.com", "1.1.1.2", vec![a("www.example.com", "1.1.1.3")])
            .zone("example.com", "1.1.1.4", vec![a("www.example.com", "1.1.1.3")])
            .hanging("1.1.1.2"),
    );
    let config = ResolverConfig {
        query_timeout: Duration::from_millis(100),
        total_timeout: Duration::from_secs(5),
        ..ResolverConfig::default()
    };
    let resolver = resolver(world, config, no_cache());

    let result = resolver
        .resolve_name(&name("www.example.com"), RecordType::A)
        .await
        .unwrap();
    assert_eq!(result.server, Some("1.1.1.4:53".parse().unwrap()));
    assert_eq!(resolver.stats().snapshot().server_failures, 1);
}

// ============================================================================
// CNAME Chasing
// ============================================================================

#[tokio::test]
async fn test_cname_followed_from_root() {
    let world = Arc::new(example_world());
    let resolver = resolver(world.clone(), ResolverConfig::default(), no_cache());

    let result = resolver
        .resolve_name(&name("alias.example.com"), RecordType::A)
        .await
        .unwrap();
    let answers = result.message.answers();
    assert_eq!(answers.len(), 2);
    assert_eq!(answers[0].rtype(), RecordType::CNAME);
    assert_eq!(answers[1].name(), &name("www.example.com"));
    assert_eq!(
        result.message.question().unwrap().qname,
        name("alias.example.com")
    );
    // 3 queries for the alias, 3 more restarting at the root for the target
    assert_eq!(world.queries(), 6);
}

#[tokio::test]
async fn test_cname_chain_too_long() {
    let chain: Vec<ResourceRecord> = (0..6)
        .map(|i| {
            cname(
                &format!("c{i}.example.com"),
                &format!("c{}.example.com", i + 1),
            )
        })
        .collect();
    let world = Arc::new(
        ZoneWorld::new()
            .root(vec![ns("com", "ns.com"), a("ns.com", "1.1.1.1")])
            .zone(
                "com",
                "1.1.1.1",
                vec![
                    ns("example.com", "ns.example.com"),
                    a("ns.example.com", "1.1.1.2"),
                ],
            )
            .zone("example.com", "1.1.1.2", chain),
    );
    let config = ResolverConfig {
        max_cname_chain: 3,
        ..ResolverConfig::default()
    };
    let resolver = resolver(world, config, Arc::new(ZoneCache::new(CacheConfig::default())));

    let err = resolver
        .resolve_name(&name("c0.example.com"), RecordType::A)
        .await
        .unwrap_err();
    assert!(matches!(err, ResolverError::CnameChainTooLong { limit: 3 }));
}
