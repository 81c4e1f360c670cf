//! Iterative resolver implementation.
//!
//! Resolution starts at the closest cached delegation for the query name
//! (the root hints when nothing is cached) and follows referrals zone by
//! zone until a server answers authoritatively or proves the name does not
//! exist.
//!
//! ## Guards
//!
//! - Every `(zone, server, question)` triple is queried at most once per
//!   resolution; nested nameserver lookups share the set, so a referral
//!   cycle through unglued nameservers surfaces as
//!   [`ResolverError::LoopDetected`]
//! - Referrals must move strictly down the tree toward the query name
//! - CNAME chains and total referrals are bounded by configuration
//! - A single deadline covers the resolution and its nested lookups

use std::collections::{HashSet, VecDeque};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt};
use tokio::time::{Instant, timeout_at};
use tracing::{debug, instrument, trace, warn};

use descent_cache::{CacheLookup, ZoneCache};
use descent_dnssec::{DnssecVerifier, ValidationResult};
use descent_proto::rdata::RData;
use descent_proto::{
    Edns, HeaderFlags, Message, Name, Question, RecordClass, RecordType, ResourceRecord,
    ResponseCode,
};

use crate::hints::RootHints;
use crate::stats::ResolverStats;
use crate::transport::{Transport, TransportError};
use crate::{QueryResult, ResolverConfig, ResolverError, Result};

/// Port nameservers are queried on.
const DNS_PORT: u16 = 53;

// ============================================================================
// Resolution State
// ============================================================================

/// State shared by a resolution and all of its nested lookups.
#[derive(Debug)]
struct ResolutionState {
    /// Deadline for the whole resolution.
    deadline: Instant,

    /// `(zone apex, server, question)` triples already queried.
    visited: HashSet<(Name, Name, Question)>,

    /// Referrals followed so far.
    referrals: u8,
}

impl ResolutionState {
    fn new(deadline: Instant) -> Self {
        Self {
            deadline,
            visited: HashSet::new(),
            referrals: 0,
        }
    }

    /// Records a query to `server` for `zone`.
    fn visit(&mut self, zone: &Name, server: &Name, question: &Question) -> Result<()> {
        if self
            .visited
            .insert((zone.clone(), server.clone(), question.clone()))
        {
            Ok(())
        } else {
            Err(ResolverError::LoopDetected {
                zone: zone.clone(),
                server: server.clone(),
            })
        }
    }
}

/// Per-question progress: the name currently chased and the CNAMEs that
/// led to it.
#[derive(Debug)]
struct Lookup {
    question: Question,
    qname: Name,
    chain: Vec<ResourceRecord>,
}

impl Lookup {
    fn new(question: Question) -> Self {
        Self {
            qname: question.qname.clone(),
            question,
            chain: Vec::new(),
        }
    }

    /// The question sent to nameservers for the current name.
    fn current(&self) -> Question {
        Question::with_class(self.qname.clone(), self.question.qtype, self.question.qclass)
    }

    fn follow_cname(&mut self, record: ResourceRecord, target: Name, limit: u8) -> Result<()> {
        if self.chain.len() >= usize::from(limit) {
            return Err(ResolverError::CnameChainTooLong { limit });
        }
        trace!(from = %self.qname, to = %target, "following CNAME");
        self.chain.push(record);
        self.qname = target;
        Ok(())
    }
}

/// A nameserver for the zone being queried.
#[derive(Debug, Clone)]
struct Candidate {
    name: Name,
    /// Glue or cached addresses; empty means a nested lookup is needed.
    addresses: Vec<IpAddr>,
}

/// What a response tells the resolver to do next.
#[derive(Debug)]
enum Step {
    /// Final answer records for the current name.
    Answer(Vec<ResourceRecord>),
    /// The response ended in a CNAME pointing elsewhere; restart.
    Restart,
    /// Descend into a child zone.
    Referral { zone: Name, candidates: Vec<Candidate> },
    /// NXDOMAIN or NODATA, with the SOA that came with it.
    Negative {
        rcode: ResponseCode,
        soa: Option<ResourceRecord>,
    },
}

/// One completed exchange with a server.
#[derive(Debug)]
struct Exchange {
    message: Message,
    server: SocketAddr,
    truncated: bool,
}

// ============================================================================
// Iterative Resolver
// ============================================================================

/// Iterative DNS resolver.
///
/// Cheap to share behind an `Arc`; concurrent resolutions only meet in the
/// cache.
pub struct IterativeResolver {
    config: ResolverConfig,
    cache: Arc<ZoneCache>,
    transport: Arc<dyn Transport>,
    hints: RootHints,
    verifier: Option<Arc<dyn DnssecVerifier>>,
    stats: Arc<ResolverStats>,
}

impl std::fmt::Debug for IterativeResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IterativeResolver")
            .field("config", &self.config)
            .field("hints", &self.hints.len())
            .field("verifier", &self.verifier.is_some())
            .finish_non_exhaustive()
    }
}

impl IterativeResolver {
    /// Creates a resolver starting from the IANA root servers.
    pub fn new(config: ResolverConfig, cache: Arc<ZoneCache>, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            cache,
            transport,
            hints: RootHints::iana(),
            verifier: None,
            stats: Arc::new(ResolverStats::new()),
        }
    }

    /// Replaces the root hints.
    pub fn with_root_hints(mut self, hints: RootHints) -> Self {
        self.hints = hints;
        self
    }

    /// Enables DNSSEC verification of final answers. Queries then set the
    /// DO bit.
    pub fn with_verifier(mut self, verifier: Arc<dyn DnssecVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Returns the resolver configuration.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Returns the shared cache.
    pub fn cache(&self) -> &Arc<ZoneCache> {
        &self.cache
    }

    /// Returns the resolver counters.
    pub fn stats(&self) -> &ResolverStats {
        &self.stats
    }

    /// Resolves `name` for `rtype` in class IN.
    pub async fn resolve_name(&self, name: &Name, rtype: RecordType) -> Result<QueryResult> {
        self.resolve(&Question::new(name.clone(), rtype)).await
    }

    /// Resolves a question.
    ///
    /// # Errors
    ///
    /// - [`ResolverError::LoopDetected`], [`ResolverError::CnameChainTooLong`],
    ///   [`ResolverError::ReferralLimitExceeded`] and [`ResolverError::Timeout`]
    ///   abort immediately
    /// - [`ResolverError::ResolutionFailed`] once every candidate server of a
    ///   zone has failed
    #[instrument(skip(self), fields(qname = %question.qname, qtype = %question.qtype))]
    pub async fn resolve(&self, question: &Question) -> Result<QueryResult> {
        ResolverStats::incr(&self.stats.resolutions);
        let deadline = Instant::now() + self.config.total_timeout;
        let mut state = ResolutionState::new(deadline);

        let result = self.resolve_question(question.clone(), &mut state).await;
        match &result {
            Ok(res) => debug!(
                rcode = %res.rcode(),
                answers = res.message.answers().len(),
                from_cache = res.from_cache,
                "resolved"
            ),
            Err(e) => warn!(error = %e, "resolution failed"),
        }
        result
    }

    /// Resolves one question within a resolution.
    ///
    /// Boxed because nameserver address lookups recurse into it.
    fn resolve_question<'a>(
        &'a self,
        question: Question,
        state: &'a mut ResolutionState,
    ) -> BoxFuture<'a, Result<QueryResult>> {
        async move {
            let mut lookup = Lookup::new(question);

            'restart: loop {
                if let Some(result) = self.answer_from_cache(&mut lookup)? {
                    return Ok(result);
                }

                let (mut apex, candidates) = self.closest_delegation(&lookup.qname, lookup.question.qclass);
                let mut candidates: VecDeque<Candidate> = candidates.into();
                let mut last_error: Option<ResolverError> = None;

                loop {
                    let Some(candidate) = candidates.pop_front() else {
                        let reason = last_error.map_or_else(
                            || format!("no nameservers for {apex}"),
                            |e| e.to_string(),
                        );
                        return Err(ResolverError::ResolutionFailed {
                            name: lookup.qname.clone(),
                            reason,
                        });
                    };

                    let query = lookup.current();
                    state.visit(&apex, &candidate.name, &query)?;

                    let addresses = match self.candidate_addresses(&candidate, state).await {
                        Ok(addresses) if !addresses.is_empty() => addresses,
                        Ok(_) => {
                            debug!(server = %candidate.name, "nameserver has no address");
                            last_error = Some(ResolverError::ResolutionFailed {
                                name: candidate.name.clone(),
                                reason: "no address".into(),
                            });
                            continue;
                        }
                        Err(e) if e.is_recoverable() => {
                            debug!(server = %candidate.name, error = %e, "nameserver address lookup failed");
                            last_error = Some(e);
                            continue;
                        }
                        Err(e) => return Err(e),
                    };

                    let outcome = self
                        .query_candidate(&candidate, &addresses, &query, state)
                        .await
                        .and_then(|exchange| {
                            let step = self.classify(&exchange.message, &apex, &mut lookup)?;
                            Ok((step, exchange))
                        });

                    let (step, exchange) = match outcome {
                        Ok(step) => step,
                        Err(e) if e.is_recoverable() => {
                            ResolverStats::incr(&self.stats.server_failures);
                            debug!(zone = %apex, server = %candidate.name, error = %e, "server failed");
                            last_error = Some(e);
                            continue;
                        }
                        Err(e) => return Err(e),
                    };

                    match step {
                        Step::Answer(records) => {
                            self.cache.put(lookup.chain.iter().chain(&records));
                            return Ok(self.finish_answer(lookup, records, exchange));
                        }
                        Step::Restart => {
                            self.cache.put(&lookup.chain);
                            continue 'restart;
                        }
                        Step::Referral { zone, candidates: next } => {
                            state.referrals = state.referrals.saturating_add(1);
                            if state.referrals > self.config.max_referrals {
                                return Err(ResolverError::ReferralLimitExceeded {
                                    limit: self.config.max_referrals,
                                });
                            }
                            ResolverStats::incr(&self.stats.referrals_followed);
                            debug!(from = %apex, to = %zone, servers = next.len(), "following referral");
                            apex = zone;
                            candidates = next.into();
                            last_error = None;
                        }
                        Step::Negative { rcode, soa } => {
                            self.cache.put(&lookup.chain);
                            return Ok(self.finish_negative(lookup, rcode, soa, exchange));
                        }
                    }
                }
            }
        }
        .boxed()
    }

    // ========================================================================
    // Cache
    // ========================================================================

    /// Answers from the cache, chasing cached CNAMEs. Delegation data from
    /// referrals is never used as an answer.
    fn answer_from_cache(&self, lookup: &mut Lookup) -> Result<Option<QueryResult>> {
        let qtype = lookup.question.qtype;
        let qclass = lookup.question.qclass;

        loop {
            match self.cache.get_entry(&lookup.qname, qtype, qclass) {
                Some(CacheLookup::Positive(records)) => {
                    ResolverStats::incr(&self.stats.cache_hits);
                    trace!(qname = %lookup.qname, "answered from cache");
                    let validation = self.validate(&records);
                    let message = build_response(&lookup.question, ResponseCode::NoError, &lookup.chain, &records, None);
                    return Ok(Some(QueryResult {
                        message,
                        server: None,
                        truncated: false,
                        from_cache: true,
                        validation,
                    }));
                }
                Some(CacheLookup::Negative { rcode, remaining_ttl }) => {
                    ResolverStats::incr(&self.stats.cache_hits);
                    trace!(qname = %lookup.qname, %rcode, remaining_ttl, "negative answer from cache");
                    let message = build_response(&lookup.question, rcode, &lookup.chain, &[], None);
                    return Ok(Some(QueryResult {
                        message,
                        server: None,
                        truncated: false,
                        from_cache: true,
                        validation: None,
                    }));
                }
                // Referral NS and glue only steer the walk
                Some(CacheLookup::Delegation(_)) | None => {}
            }

            if qtype == RecordType::CNAME {
                return Ok(None);
            }
            let cname = self
                .cache
                .get(&lookup.qname, RecordType::CNAME, qclass)
                .into_iter()
                .find_map(|r| r.rdata().as_cname().cloned().map(|target| (r, target)));
            match cname {
                Some((record, target)) => {
                    lookup.follow_cname(record, target, self.config.max_cname_chain)?;
                }
                None => return Ok(None),
            }
        }
    }

    /// Finds the deepest cached delegation above `qname`, falling back to
    /// the root hints.
    fn closest_delegation(&self, qname: &Name, qclass: RecordClass) -> (Name, Vec<Candidate>) {
        let mut zone = qname.clone();
        while !zone.is_root() {
            let ns: Vec<Candidate> = self
                .cache
                .get(&zone, RecordType::NS, qclass)
                .iter()
                .filter_map(|r| r.rdata().as_ns())
                .map(|name| Candidate {
                    name: name.clone(),
                    addresses: self.cached_addresses(name),
                })
                .collect();
            if !ns.is_empty() {
                trace!(%zone, servers = ns.len(), "starting from cached delegation");
                return (zone, ns);
            }
            zone = match zone.parent() {
                Some(parent) => parent,
                None => break,
            };
        }

        let candidates = self
            .hints
            .servers()
            .iter()
            .map(|(name, addresses)| Candidate {
                name: name.clone(),
                addresses: addresses.clone(),
            })
            .collect();
        (Name::root(), candidates)
    }

    fn cached_addresses(&self, name: &Name) -> Vec<IpAddr> {
        let mut records = self.cache.get(name, RecordType::A, RecordClass::IN);
        records.extend(self.cache.get(name, RecordType::AAAA, RecordClass::IN));
        records.iter().filter_map(|r| r.rdata().as_ip()).collect()
    }

    // ========================================================================
    // Nameserver addresses
    // ========================================================================

    /// Returns the addresses to try for a candidate: glue, then cache, then
    /// a nested lookup sharing this resolution's guards.
    async fn candidate_addresses(
        &self,
        candidate: &Candidate,
        state: &mut ResolutionState,
    ) -> Result<Vec<IpAddr>> {
        let mut addresses = if !candidate.addresses.is_empty() {
            candidate.addresses.clone()
        } else {
            let cached = self.cached_addresses(&candidate.name);
            if cached.is_empty() {
                self.lookup_addresses(&candidate.name, state).await?
            } else {
                cached
            }
        };

        if self.config.prefer_ipv6 {
            addresses.sort_by_key(|ip| ip.is_ipv4());
        } else {
            addresses.sort_by_key(|ip| ip.is_ipv6());
        }
        Ok(addresses)
    }

    async fn lookup_addresses(&self, name: &Name, state: &mut ResolutionState) -> Result<Vec<IpAddr>> {
        trace!(ns = %name, "resolving nameserver address");
        let first = if self.config.prefer_ipv6 {
            [RecordType::AAAA, RecordType::A]
        } else {
            [RecordType::A, RecordType::AAAA]
        };

        let mut last_error = None;
        for rtype in first {
            match self
                .resolve_question(Question::new(name.clone(), rtype), state)
                .await
            {
                Ok(result) => {
                    let addresses: Vec<IpAddr> = result.message.addresses().collect();
                    if !addresses.is_empty() {
                        return Ok(addresses);
                    }
                }
                Err(e) if e.is_recoverable() => last_error = Some(e),
                Err(e) => return Err(e),
            }
        }
        match last_error {
            Some(e) => Err(e),
            None => Ok(Vec::new()),
        }
    }

    // ========================================================================
    // Exchanges
    // ========================================================================

    /// Queries each address of a candidate until one produces a usable
    /// response.
    async fn query_candidate(
        &self,
        candidate: &Candidate,
        addresses: &[IpAddr],
        question: &Question,
        state: &ResolutionState,
    ) -> Result<Exchange> {
        let mut last_error = None;
        for &ip in addresses {
            let server = SocketAddr::new(ip, DNS_PORT);
            match self.exchange(server, question, state).await {
                Ok(exchange) => return Ok(exchange),
                Err(e) if e.is_recoverable() => {
                    trace!(ns = %candidate.name, %server, error = %e, "address failed");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_error.unwrap_or_else(|| ResolverError::format("no addresses")))
    }

    /// Sends one question to one server, retrying over TCP on truncation.
    async fn exchange(&self, server: SocketAddr, question: &Question, state: &ResolutionState) -> Result<Exchange> {
        let mut query = Message::query(question.clone());
        query.set_id(rand::random());
        query.set_edns(Some(
            Edns::new(self.config.udp_payload_size).with_dnssec_ok(self.verifier.is_some()),
        ));
        let wire = query.to_wire()?;

        let bytes = self.send(server, &wire, false, state).await?;
        let mut message = check_response(&query, &bytes)?;
        let mut truncated = false;

        if message.is_truncated() {
            ResolverStats::incr(&self.stats.truncation_retries);
            debug!(%server, "truncated response, retrying over TCP");
            truncated = true;
            let bytes = self.send(server, &wire, true, state).await?;
            message = check_response(&query, &bytes)?;
        }

        match message.rcode() {
            ResponseCode::NoError | ResponseCode::NXDomain => Ok(Exchange {
                message,
                server,
                truncated,
            }),
            rcode => Err(ResolverError::ServerError { server, rcode }),
        }
    }

    async fn send(&self, server: SocketAddr, wire: &[u8], reliable: bool, state: &ResolutionState) -> Result<Bytes> {
        let now = Instant::now();
        if now >= state.deadline {
            return Err(ResolverError::Timeout);
        }
        let query_deadline = (now + self.config.query_timeout).min(state.deadline);
        let overall = query_deadline >= state.deadline;

        ResolverStats::incr(&self.stats.queries_sent);
        trace!(%server, reliable, "sending query");

        match timeout_at(query_deadline, self.transport.send(server, wire, reliable, query_deadline)).await {
            Ok(Ok(bytes)) => Ok(bytes),
            Ok(Err(TransportError::Timeout)) | Err(_) if overall => Err(ResolverError::Timeout),
            Ok(Err(e)) => Err(ResolverError::Network(e)),
            Err(_) => Err(ResolverError::Network(TransportError::Timeout)),
        }
    }

    // ========================================================================
    // Classification
    // ========================================================================

    fn classify(&self, response: &Message, apex: &Name, lookup: &mut Lookup) -> Result<Step> {
        let qtype = lookup.question.qtype;
        let qclass = lookup.question.qclass;
        let asked = lookup.qname.clone();

        loop {
            let answers: Vec<ResourceRecord> = response
                .answers()
                .iter()
                .filter(|r| r.matches(&lookup.qname, qtype, qclass) || covers(r, &lookup.qname, qtype))
                .cloned()
                .collect();
            if answers.iter().any(|r| r.rtype() == qtype) {
                return Ok(Step::Answer(answers));
            }

            if qtype == RecordType::CNAME {
                break;
            }
            let cname = response
                .answers()
                .iter()
                .filter(|r| r.name() == &lookup.qname)
                .find_map(|r| r.rdata().as_cname().cloned().map(|target| (r.clone(), target)));
            match cname {
                Some((record, target)) => {
                    lookup.follow_cname(record, target, self.config.max_cname_chain)?;
                }
                None => break,
            }
        }

        let soa = response
            .authority()
            .iter()
            .find(|r| r.rtype() == RecordType::SOA && lookup.qname.is_subdomain_of(r.name()))
            .cloned();

        if response.is_nxdomain() {
            return Ok(Step::Negative {
                rcode: ResponseCode::NXDomain,
                soa,
            });
        }

        if lookup.qname != asked {
            // The chain left what this server can speak for
            return Ok(match soa {
                Some(soa) => Step::Negative {
                    rcode: ResponseCode::NoError,
                    soa: Some(soa),
                },
                None => Step::Restart,
            });
        }

        if soa.is_some() {
            return Ok(Step::Negative {
                rcode: ResponseCode::NoError,
                soa,
            });
        }

        if response.authority().iter().any(|r| r.rtype() == RecordType::NS) {
            return self.referral(response, apex, &lookup.qname);
        }

        Ok(Step::Negative {
            rcode: ResponseCode::NoError,
            soa: None,
        })
    }

    /// Validates a referral and collects its nameservers and glue.
    fn referral(&self, response: &Message, apex: &Name, qname: &Name) -> Result<Step> {
        let zone = response
            .authority()
            .iter()
            .find(|r| r.rtype() == RecordType::NS)
            .map(|r| r.name().clone())
            .ok_or_else(|| ResolverError::format("referral without NS records"))?;

        if !zone.is_strict_subdomain_of(apex) || !qname.is_subdomain_of(&zone) {
            return Err(ResolverError::format(format!(
                "referral to {zone} from {apex} does not lead toward {qname}"
            )));
        }

        let ns_records: Vec<ResourceRecord> = response
            .authority()
            .iter()
            .filter(|r| r.rtype() == RecordType::NS && r.name() == &zone)
            .cloned()
            .collect();

        let mut candidates = Vec::with_capacity(ns_records.len());
        let mut glue = Vec::new();
        for nsdname in ns_records.iter().filter_map(|r| r.rdata().as_ns()) {
            // Only the delegating zone may vouch for addresses
            let addresses: Vec<IpAddr> = if nsdname.is_subdomain_of(apex) {
                response
                    .additional()
                    .iter()
                    .filter(|r| r.name() == nsdname)
                    .filter_map(|r| {
                        let ip = r.rdata().as_ip()?;
                        glue.push(r.clone());
                        Some(ip)
                    })
                    .collect()
            } else {
                Vec::new()
            };

            if addresses.is_empty() && nsdname.is_subdomain_of(&zone) {
                debug!(ns = %nsdname, %zone, "in-zone nameserver without glue");
                continue;
            }
            candidates.push(Candidate {
                name: nsdname.clone(),
                addresses,
            });
        }

        if candidates.is_empty() {
            return Err(ResolverError::format(format!("no usable nameservers for {zone}")));
        }

        self.cache.put_delegation(&ns_records);
        self.cache.put_delegation(&glue);
        Ok(Step::Referral { zone, candidates })
    }

    // ========================================================================
    // Results
    // ========================================================================

    fn finish_answer(&self, lookup: Lookup, records: Vec<ResourceRecord>, exchange: Exchange) -> QueryResult {
        let validation = self.validate(&records);
        let message = build_response(
            &lookup.question,
            ResponseCode::NoError,
            &lookup.chain,
            &records,
            None,
        );
        QueryResult {
            message,
            server: Some(exchange.server),
            truncated: exchange.truncated,
            from_cache: false,
            validation,
        }
    }

    fn finish_negative(
        &self,
        lookup: Lookup,
        rcode: ResponseCode,
        soa: Option<ResourceRecord>,
        exchange: Exchange,
    ) -> QueryResult {
        if let Some(soa_record) = &soa {
            if let Some(data) = soa_record.rdata().as_soa() {
                let ttl = soa_record.ttl().min(data.minimum());
                self.cache.put_negative(
                    &lookup.qname,
                    lookup.question.qtype,
                    lookup.question.qclass,
                    ttl,
                    rcode,
                );
            }
        }

        let message = build_response(&lookup.question, rcode, &lookup.chain, &[], soa);
        QueryResult {
            message,
            server: Some(exchange.server),
            truncated: exchange.truncated,
            from_cache: false,
            validation: None,
        }
    }

    /// Runs the verifier over answer records, using DNSKEYs of the signer
    /// found in the cache.
    fn validate(&self, records: &[ResourceRecord]) -> Option<ValidationResult> {
        let verifier = self.verifier.as_ref()?;
        let keys: Vec<_> = records
            .iter()
            .find_map(|r| match r.rdata() {
                RData::RRSIG(sig) => Some(sig.signer().clone()),
                _ => None,
            })
            .map(|signer| {
                self.cache
                    .get(&signer, RecordType::DNSKEY, RecordClass::IN)
                    .iter()
                    .filter_map(|r| r.rdata().as_dnskey().cloned())
                    .collect()
            })
            .unwrap_or_default();
        Some(verifier.verify(records, &keys))
    }
}

/// Returns true if `record` is an RRSIG over `qname`/`qtype`.
fn covers(record: &ResourceRecord, qname: &Name, qtype: RecordType) -> bool {
    match record.rdata() {
        RData::RRSIG(sig) => record.name() == qname && sig.type_covered() == qtype,
        _ => false,
    }
}

/// Decodes a response and checks it belongs to `query`.
fn check_response(query: &Message, bytes: &[u8]) -> Result<Message> {
    let response = Message::parse(bytes)?;
    if response.id() != query.id() {
        return Err(ResolverError::format(format!(
            "response id {} does not match query id {}",
            response.id(),
            query.id()
        )));
    }
    if !response.is_response() {
        return Err(ResolverError::format("QR bit clear in response"));
    }
    if response.question() != query.question() {
        return Err(ResolverError::format("response question does not match query"));
    }
    Ok(response)
}

fn build_response(
    question: &Question,
    rcode: ResponseCode,
    chain: &[ResourceRecord],
    answers: &[ResourceRecord],
    soa: Option<ResourceRecord>,
) -> Message {
    let mut builder = Message::builder()
        .flag(HeaderFlags::QR, true)
        .rcode(rcode)
        .question(question.clone());
    for record in chain.iter().chain(answers) {
        builder = builder.answer(record.clone());
    }
    if let Some(soa) = soa {
        builder = builder.authority(soa);
    }
    builder.build()
}
