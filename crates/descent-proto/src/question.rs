//! DNS question section.
//!
//! Each question has a domain name, query type, and query class.

use crate::class::RecordClass;
use crate::error::Result;
use crate::name::{CompressionTable, Name};
use crate::rtype::RecordType;
use crate::wire::WireReader;
use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A DNS question.
///
/// # Wire Format
///
/// ```text
///                                 1  1  1  1  1  1
///   0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// /                     QNAME                     /
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                     QTYPE                     |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                     QCLASS                    |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Question {
    /// The domain name being queried.
    pub qname: Name,

    /// The type of record being requested.
    pub qtype: RecordType,

    /// The class of the query.
    pub qclass: RecordClass,
}

impl Question {
    /// Creates a new question in class IN.
    #[inline]
    pub fn new(qname: Name, qtype: RecordType) -> Self {
        Self::with_class(qname, qtype, RecordClass::IN)
    }

    /// Creates a new question with an explicit class.
    #[inline]
    pub fn with_class(qname: Name, qtype: RecordType, qclass: RecordClass) -> Self {
        Self {
            qname,
            qtype,
            qclass,
        }
    }

    /// Creates a question for an A record lookup.
    #[inline]
    pub fn a(name: Name) -> Self {
        Self::new(name, RecordType::A)
    }

    /// Creates a question for an AAAA record lookup.
    #[inline]
    pub fn aaaa(name: Name) -> Self {
        Self::new(name, RecordType::AAAA)
    }

    /// Creates a question for an NS record lookup.
    #[inline]
    pub fn ns(name: Name) -> Self {
        Self::new(name, RecordType::NS)
    }

    /// Returns true if this is an A or AAAA query.
    #[inline]
    pub fn is_address_query(&self) -> bool {
        matches!(self.qtype, RecordType::A | RecordType::AAAA)
    }

    /// Reads a question at the reader's position.
    pub fn parse(reader: &mut WireReader<'_>) -> Result<Self> {
        let qname = reader.read_name()?;
        let qtype = RecordType::from_u16(reader.read_u16()?);
        let qclass = RecordClass::from_u16(reader.read_u16()?);
        Ok(Self {
            qname,
            qtype,
            qclass,
        })
    }

    /// Returns the uncompressed wire format length of this question.
    pub fn wire_len(&self) -> usize {
        self.qname.wire_len() + 4
    }

    /// Writes the question, compressing the name against `table`.
    pub fn write_to(&self, buf: &mut BytesMut, table: &mut CompressionTable) {
        self.qname.write_compressed(buf, table);
        buf.put_u16(self.qtype.to_u16());
        buf.put_u16(self.qclass.to_u16());
    }

    /// Returns true if a record with this owner, type and class answers
    /// the question (ANY matches every type and class).
    pub fn is_answered_by(&self, name: &Name, rtype: RecordType, rclass: RecordClass) -> bool {
        &self.qname == name
            && (self.qclass == rclass || self.qclass == RecordClass::ANY)
            && (self.qtype == rtype || self.qtype == RecordType::ANY)
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ";{}\t\t{}\t{}", self.qname, self.qclass, self.qtype)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_question_wire() {
        let q = Question::a(Name::from_str("example.com").unwrap());
        let mut buf = BytesMut::new();
        q.write_to(&mut buf, &mut CompressionTable::new());
        assert_eq!(buf.len(), q.wire_len());
        assert_eq!(&buf[buf.len() - 4..], &[0, 1, 0, 1]);

        let parsed = Question::parse(&mut WireReader::new(&buf)).unwrap();
        assert_eq!(parsed, q);
    }

    #[test]
    fn test_truncated_question() {
        let q = Question::aaaa(Name::from_str("example.com").unwrap());
        let mut buf = BytesMut::new();
        q.write_to(&mut buf, &mut CompressionTable::new());
        let err = Question::parse(&mut WireReader::new(&buf[..buf.len() - 1])).unwrap_err();
        assert!(err.is_truncated());
    }

    #[test]
    fn test_is_answered_by() {
        let name = Name::from_str("example.com").unwrap();
        let q = Question::a(name.clone());
        let upper = Name::from_str("EXAMPLE.com").unwrap();

        assert!(q.is_answered_by(&upper, RecordType::A, RecordClass::IN));
        assert!(!q.is_answered_by(&name, RecordType::AAAA, RecordClass::IN));
        assert!(!q.is_answered_by(&name, RecordType::A, RecordClass::CH));

        let any = Question::new(name.clone(), RecordType::ANY);
        assert!(any.is_answered_by(&name, RecordType::MX, RecordClass::IN));
    }

    #[test]
    fn test_question_display() {
        let q = Question::new(Name::from_str("example.com").unwrap(), RecordType::MX);
        assert_eq!(q.to_string(), ";example.com.\t\tIN\tMX");
    }
}
