//! DNS message codec.
//!
//! [`Message`] is the decoded form of a complete DNS message. Section counts
//! are never stored: they are read from the header on decode and derived
//! from the section lengths on encode. The OPT pseudo-RR lives in
//! [`Message::edns`] rather than in the additional section.

use crate::edns::Edns;
use crate::error::{Error, Result};
use crate::header::{HEADER_SIZE, Header, HeaderFlags, SectionCounts};
use crate::name::{CompressionTable, Name};
use crate::opcode::OpCode;
use crate::question::Question;
use crate::rcode::ResponseCode;
use crate::record::{ResourceRecord, SectionEntry};
use crate::rtype::RecordType;
use crate::wire::WireReader;
use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// A complete DNS message.
///
/// DNS messages consist of:
/// - A fixed 12-byte header
/// - A question section (queries)
/// - An answer section (responses to queries)
/// - An authority section (NS records for referrals, SOA for negative answers)
/// - An additional section (glue and other related records)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Message {
    header: Header,
    questions: Vec<Question>,
    answers: Vec<ResourceRecord>,
    authority: Vec<ResourceRecord>,
    /// The additional section, OPT excluded.
    additional: Vec<ResourceRecord>,
    edns: Option<Edns>,
}

impl Message {
    /// Starts building a message.
    pub fn builder() -> MessageBuilder {
        MessageBuilder::new()
    }

    /// Creates a query with a single question, ID 0 and every flag clear.
    pub fn query(question: Question) -> Self {
        Self {
            questions: vec![question],
            ..Self::default()
        }
    }

    // =========================================================================
    // Header accessors
    // =========================================================================

    /// Returns the message header.
    #[inline]
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Returns the message ID.
    #[inline]
    pub fn id(&self) -> u16 {
        self.header.id
    }

    /// Sets the message ID.
    pub fn set_id(&mut self, id: u16) {
        self.header.id = id;
    }

    /// Returns the opcode.
    #[inline]
    pub fn opcode(&self) -> OpCode {
        self.header.opcode
    }

    /// Returns the full response code, extended bits included.
    #[inline]
    pub fn rcode(&self) -> ResponseCode {
        self.header.rcode
    }

    /// Sets the response code. An extended code adds EDNS if absent.
    pub fn set_rcode(&mut self, rcode: ResponseCode) {
        self.header.rcode = rcode;
        self.sync_extended_rcode();
    }

    /// Sets or clears a header flag.
    pub fn set_flag(&mut self, flag: HeaderFlags, value: bool) {
        self.header.flags.set(flag, value);
    }

    /// Returns true if this is a response.
    #[inline]
    pub fn is_response(&self) -> bool {
        self.header.is_response()
    }

    /// Returns true if the sender truncated the message (TC bit).
    #[inline]
    pub fn is_truncated(&self) -> bool {
        self.header.is_truncated()
    }

    /// Returns true if the answer is authoritative (AA bit).
    #[inline]
    pub fn is_authoritative(&self) -> bool {
        self.header.is_authoritative()
    }

    // =========================================================================
    // Sections
    // =========================================================================

    /// Returns the question section.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Returns the first question.
    pub fn question(&self) -> Option<&Question> {
        self.questions.first()
    }

    /// Returns the answer section.
    pub fn answers(&self) -> &[ResourceRecord] {
        &self.answers
    }

    /// Returns the authority section.
    pub fn authority(&self) -> &[ResourceRecord] {
        &self.authority
    }

    /// Returns the additional section, OPT excluded.
    pub fn additional(&self) -> &[ResourceRecord] {
        &self.additional
    }

    /// Returns the EDNS parameters, if the message carries an OPT record.
    pub fn edns(&self) -> Option<&Edns> {
        self.edns.as_ref()
    }

    /// Replaces the EDNS parameters.
    pub fn set_edns(&mut self, edns: Option<Edns>) {
        self.edns = edns;
        self.sync_extended_rcode();
    }

    /// Appends an answer record.
    pub fn add_answer(&mut self, record: ResourceRecord) {
        self.answers.push(record);
    }

    /// Appends an authority record.
    pub fn add_authority(&mut self, record: ResourceRecord) {
        self.authority.push(record);
    }

    /// Appends an additional record.
    pub fn add_additional(&mut self, record: ResourceRecord) {
        self.additional.push(record);
    }

    fn sync_extended_rcode(&mut self) {
        let extended = self.header.rcode.extended_rcode();
        if extended != 0 && self.edns.is_none() {
            self.edns = Some(Edns::default());
        }
        if let Some(edns) = &mut self.edns {
            edns.set_extended_rcode(extended);
        }
    }

    // =========================================================================
    // Response helpers
    // =========================================================================

    /// Returns true if this is an NXDOMAIN response.
    pub fn is_nxdomain(&self) -> bool {
        self.rcode().is_nxdomain()
    }

    /// Returns true for NOERROR with an empty answer section.
    pub fn is_nodata(&self) -> bool {
        self.rcode().is_success() && self.answers.is_empty()
    }

    /// Returns true if this response is a referral (no answers, NS records
    /// in the authority section).
    pub fn is_referral(&self) -> bool {
        self.answers.is_empty()
            && self
                .authority
                .iter()
                .any(|r| r.rtype() == RecordType::NS)
    }

    /// Returns answer records of a specific type.
    pub fn answers_of_type(&self, rtype: RecordType) -> impl Iterator<Item = &ResourceRecord> {
        self.answers.iter().filter(move |r| r.rtype() == rtype)
    }

    /// Returns the CNAME target for `owner` in the answer section.
    pub fn cname_target(&self, owner: &Name) -> Option<&Name> {
        self.answers
            .iter()
            .filter(|r| r.name() == owner)
            .find_map(|r| r.rdata().as_cname())
    }

    /// Returns the A and AAAA addresses in the answer section.
    pub fn addresses(&self) -> impl Iterator<Item = IpAddr> + '_ {
        self.answers.iter().filter_map(|r| r.rdata().as_ip())
    }

    // =========================================================================
    // Wire format
    // =========================================================================

    /// Decodes a message.
    ///
    /// # Errors
    ///
    /// - A truncation error when a section declares more entries than the
    ///   buffer holds
    /// - A format error for a set Z bit, a bad name, an OPT record outside
    ///   the additional section, or more than one OPT record
    /// - A malformed-record error when RDATA does not fit its type
    pub fn parse(data: &[u8]) -> Result<Self> {
        let (mut header, counts) = Header::parse(data)?;
        let mut reader = WireReader::new(data);
        reader.read_bytes(HEADER_SIZE)?;

        let mut questions = Vec::with_capacity(usize::from(counts.qd_count));
        for parsed in 0..counts.qd_count {
            let question = Question::parse(&mut reader)
                .map_err(|e| truncated_section(e, "question", counts.qd_count, parsed))?;
            questions.push(question);
        }

        let mut edns = None;
        let answers = parse_section(&mut reader, "answer", counts.an_count, &mut edns)?;
        let authority = parse_section(&mut reader, "authority", counts.ns_count, &mut edns)?;
        let additional = parse_section(&mut reader, "additional", counts.ar_count, &mut edns)?;

        if let Some(edns) = &edns {
            header.rcode =
                ResponseCode::from_parts(header.rcode.header_rcode(), edns.extended_rcode());
        }

        Ok(Self {
            header,
            questions,
            answers,
            authority,
            additional,
            edns,
        })
    }

    /// Encodes the message, appending to `buf`.
    ///
    /// All names share one compression table; pointers are relative to the
    /// start of `buf`, so it should be empty.
    pub fn write_to(&self, buf: &mut BytesMut) -> Result<()> {
        let ar_count = self.additional.len() + usize::from(self.edns.is_some());
        let counts = SectionCounts {
            qd_count: section_count("question", self.questions.len())?,
            an_count: section_count("answer", self.answers.len())?,
            ns_count: section_count("authority", self.authority.len())?,
            ar_count: section_count("additional", ar_count)?,
        };

        self.header.write_to(counts, buf);

        let mut table = CompressionTable::new();
        for question in &self.questions {
            question.write_to(buf, &mut table);
        }
        for record in self
            .answers
            .iter()
            .chain(&self.authority)
            .chain(&self.additional)
        {
            record.write_to(buf, &mut table);
        }
        if let Some(edns) = &self.edns {
            edns.write_opt(self.header.rcode.extended_rcode(), buf);
        }

        if buf.len() > crate::MAX_MESSAGE_SIZE {
            return Err(Error::MessageTooLarge {
                size: buf.len(),
                max_size: crate::MAX_MESSAGE_SIZE,
            });
        }
        Ok(())
    }

    /// Encodes the message into a fresh buffer.
    pub fn to_wire(&self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(crate::MAX_UDP_MESSAGE_SIZE);
        self.write_to(&mut buf)?;
        Ok(buf.freeze())
    }
}

fn parse_section(
    reader: &mut WireReader<'_>,
    section: &'static str,
    declared: u16,
    edns: &mut Option<Edns>,
) -> Result<Vec<ResourceRecord>> {
    let mut records = Vec::with_capacity(usize::from(declared));
    for parsed in 0..declared {
        let entry = ResourceRecord::parse_entry(reader)
            .map_err(|e| truncated_section(e, section, declared, parsed))?;
        match entry {
            SectionEntry::Record(record) => records.push(record),
            SectionEntry::Opt(_) if section != "additional" => {
                return Err(Error::OptInWrongSection { section });
            }
            SectionEntry::Opt(_) if edns.is_some() => return Err(Error::MultipleOptRecords),
            SectionEntry::Opt(opt) => *edns = Some(opt),
        }
    }
    Ok(records)
}

fn truncated_section(err: Error, section: &'static str, declared: u16, parsed: u16) -> Error {
    match err {
        Error::UnexpectedEof { .. } => Error::TruncatedSection {
            section,
            declared,
            parsed,
        },
        other => other,
    }
}

fn section_count(section: &'static str, count: usize) -> Result<u16> {
    u16::try_from(count).map_err(|_| Error::TooManyRecords { section, count })
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, ";; ->>HEADER<<- {}", self.header)?;

        if let Some(edns) = &self.edns {
            writeln!(f, "\n;; OPT PSEUDOSECTION:\n{edns}")?;
        }

        writeln!(f, "\n;; QUESTION SECTION:")?;
        for q in &self.questions {
            writeln!(f, "{q}")?;
        }

        for (title, records) in [
            ("ANSWER", &self.answers),
            ("AUTHORITY", &self.authority),
            ("ADDITIONAL", &self.additional),
        ] {
            if !records.is_empty() {
                writeln!(f, "\n;; {title} SECTION:")?;
                for r in records {
                    writeln!(f, "{r}")?;
                }
            }
        }

        Ok(())
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`Message`].
///
/// Flags default to clear, opcode to QUERY and rcode to NOERROR. Setting an
/// extended rcode adds EDNS so the upper bits have somewhere to go.
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    message: Message,
}

impl MessageBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the message ID.
    #[must_use]
    pub fn id(mut self, id: u16) -> Self {
        self.message.header.id = id;
        self
    }

    /// Sets or clears a header flag.
    #[must_use]
    pub fn flag(mut self, flag: HeaderFlags, value: bool) -> Self {
        self.message.header.flags.set(flag, value);
        self
    }

    /// Sets the opcode.
    #[must_use]
    pub fn opcode(mut self, opcode: OpCode) -> Self {
        self.message.header.opcode = opcode;
        self
    }

    /// Sets the response code.
    #[must_use]
    pub fn rcode(mut self, rcode: ResponseCode) -> Self {
        self.message.header.rcode = rcode;
        self
    }

    /// Appends a question.
    #[must_use]
    pub fn question(mut self, question: Question) -> Self {
        self.message.questions.push(question);
        self
    }

    /// Appends an answer record.
    #[must_use]
    pub fn answer(mut self, record: ResourceRecord) -> Self {
        self.message.answers.push(record);
        self
    }

    /// Appends an authority record.
    #[must_use]
    pub fn authority(mut self, record: ResourceRecord) -> Self {
        self.message.authority.push(record);
        self
    }

    /// Appends an additional record.
    #[must_use]
    pub fn additional(mut self, record: ResourceRecord) -> Self {
        self.message.additional.push(record);
        self
    }

    /// Attaches EDNS parameters.
    #[must_use]
    pub fn edns(mut self, edns: Edns) -> Self {
        self.message.edns = Some(edns);
        self
    }

    /// Finishes the message.
    pub fn build(mut self) -> Message {
        self.message.sync_extended_rcode();
        self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordClass;
    use crate::rdata::{self, RData};
    use bytes::BufMut;
    use std::net::Ipv4Addr;
    use std::str::FromStr;

    fn name(s: &str) -> Name {
        Name::from_str(s).unwrap()
    }

    fn referral() -> Message {
        Message::builder()
            .id(0xBEEF)
            .flag(HeaderFlags::QR, true)
            .question(Question::a(name("www.example.com")))
            .authority(ResourceRecord::ns(name("example.com"), 172800, name("ns1.example.com")))
            .authority(ResourceRecord::ns(name("example.com"), 172800, name("ns2.example.com")))
            .additional(ResourceRecord::a(name("ns1.example.com"), 172800, Ipv4Addr::new(192, 0, 2, 53)))
            .edns(Edns::new(1232).with_dnssec_ok(true))
            .build()
    }

    #[test]
    fn test_query_defaults() {
        let msg = Message::query(Question::a(name("example.com")));
        assert_eq!(msg.id(), 0);
        assert!(msg.header().flags.is_empty());
        assert!(msg.edns().is_none());

        let wire = msg.to_wire().unwrap();
        assert_eq!(&wire[..12], &[0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_message_roundtrip() {
        let original = referral();
        let wire = original.to_wire().unwrap();
        let parsed = Message::parse(&wire).unwrap();

        assert_eq!(parsed, original);
        assert!(parsed.is_referral());
        assert_eq!(parsed.additional().len(), 1);
        assert!(parsed.edns().unwrap().dnssec_ok());
        // OPT is counted in ARCOUNT.
        assert_eq!(&wire[10..12], &[0, 2]);
    }

    #[test]
    fn test_compression_shrinks_message() {
        let owner = name("www.example.com");
        let msg = Message::builder()
            .question(Question::a(owner.clone()))
            .answer(ResourceRecord::a(owner.clone(), 60, Ipv4Addr::new(192, 0, 2, 1)))
            .answer(ResourceRecord::a(owner.clone(), 60, Ipv4Addr::new(192, 0, 2, 2)))
            .answer(ResourceRecord::a(owner, 60, Ipv4Addr::new(192, 0, 2, 3)))
            .build();

        // header + question(17 + 4) + 3 * (pointer + fixed + address)
        assert_eq!(msg.to_wire().unwrap().len(), 12 + 21 + 3 * (2 + 10 + 4));
    }

    #[test]
    fn test_owner_case_survives_roundtrip() {
        let msg = Message::builder()
            .question(Question::a(name("www.example.com")))
            .answer(ResourceRecord::a(name("WWW.Example.COM"), 60, Ipv4Addr::new(192, 0, 2, 1)))
            .build();
        let parsed = Message::parse(&msg.to_wire().unwrap()).unwrap();

        assert_eq!(parsed.questions()[0].qname.to_string(), "www.example.com.");
        assert_eq!(parsed.answers()[0].name().to_string(), "WWW.Example.COM.");
    }

    #[test]
    fn test_section_order_preserved() {
        let msg = Message::builder()
            .answer(ResourceRecord::a(name("b.example"), 1, Ipv4Addr::new(10, 0, 0, 2)))
            .answer(ResourceRecord::a(name("a.example"), 1, Ipv4Addr::new(10, 0, 0, 1)))
            .build();
        let parsed = Message::parse(&msg.to_wire().unwrap()).unwrap();
        let owners: Vec<String> = parsed.answers().iter().map(|r| r.name().to_string()).collect();
        assert_eq!(owners, ["b.example.", "a.example."]);
    }

    #[test]
    fn test_truncated_section() {
        let wire = referral().to_wire().unwrap();
        let err = Message::parse(&wire[..40]).unwrap_err();
        assert!(err.is_truncated());

        let mut header_only = BytesMut::new();
        Header::new(1).write_to(
            SectionCounts {
                an_count: 1,
                ..SectionCounts::default()
            },
            &mut header_only,
        );
        let err = Message::parse(&header_only).unwrap_err();
        assert_eq!(
            err,
            Error::TruncatedSection {
                section: "answer",
                declared: 1,
                parsed: 0
            }
        );
    }

    #[test]
    fn test_reserved_flag_rejected() {
        let mut wire = BytesMut::from(&Message::query(Question::a(name("a.example"))).to_wire().unwrap()[..]);
        wire[3] |= 0x40;
        assert!(matches!(
            Message::parse(&wire),
            Err(Error::ReservedFlagSet { .. })
        ));
    }

    #[test]
    fn test_multiple_opt_rejected() {
        let msg = Message::builder()
            .question(Question::a(name("a.example")))
            .edns(Edns::default())
            .build();
        let mut wire = BytesMut::from(&msg.to_wire().unwrap()[..]);
        Edns::default().write_opt(0, &mut wire);
        wire[11] = 2;

        assert_eq!(Message::parse(&wire), Err(Error::MultipleOptRecords));
    }

    #[test]
    fn test_opt_in_answer_rejected() {
        let mut wire = BytesMut::new();
        Header::new(7).write_to(
            SectionCounts {
                an_count: 1,
                ..SectionCounts::default()
            },
            &mut wire,
        );
        Edns::default().write_opt(0, &mut wire);

        assert_eq!(
            Message::parse(&wire),
            Err(Error::OptInWrongSection { section: "answer" })
        );
    }

    #[test]
    fn test_extended_rcode_merged() {
        let msg = Message::builder()
            .flag(HeaderFlags::QR, true)
            .rcode(ResponseCode::BadVers)
            .build();
        assert!(msg.edns().is_some());

        let wire = msg.to_wire().unwrap();
        // Header carries only the low four bits.
        assert_eq!(wire[3] & 0x0F, 0);

        let parsed = Message::parse(&wire).unwrap();
        assert_eq!(parsed.rcode(), ResponseCode::BadVers);
        assert_eq!(parsed, msg);
    }

    #[test]
    fn test_forward_pointer_in_question() {
        let mut wire = BytesMut::new();
        Header::new(1).write_to(
            SectionCounts {
                qd_count: 1,
                ..SectionCounts::default()
            },
            &mut wire,
        );
        wire.put_u16(0xC000 | 20);
        wire.put_u16(1);
        wire.put_u16(1);

        assert!(matches!(
            Message::parse(&wire),
            Err(Error::CompressionLoop { offset: 12, target: 20 })
        ));
    }

    #[test]
    fn test_soa_rdata_compressed_against_owner() {
        let soa = rdata::SOA::new(
            name("ns.example.com"),
            name("hostmaster.example.com"),
            1,
            7200,
            3600,
            1209600,
            300,
        );
        let msg = Message::builder()
            .flag(HeaderFlags::QR, true)
            .rcode(ResponseCode::NXDomain)
            .question(Question::a(name("missing.example.com")))
            .authority(ResourceRecord::soa(name("example.com"), 300, soa.clone()))
            .build();

        let parsed = Message::parse(&msg.to_wire().unwrap()).unwrap();
        assert!(parsed.is_nxdomain());
        let record = &parsed.authority()[0];
        assert_eq!(record.rclass(), RecordClass::IN);
        assert_eq!(record.rdata(), &RData::SOA(soa));
    }

    #[test]
    fn test_cname_target() {
        let msg = Message::builder()
            .answer(ResourceRecord::cname(name("www.example.com"), 60, name("web.example.net")))
            .build();
        assert_eq!(
            msg.cname_target(&name("WWW.example.com")),
            Some(&name("web.example.net"))
        );
        assert_eq!(msg.cname_target(&name("example.com")), None);
    }
}
