//! Name-based record types (NS, CNAME, PTR, DNAME, MX).

use crate::error::Result;
use crate::name::{CompressionTable, Name};
use crate::wire::WireReader;
use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Defines a record type whose payload is a single domain name.
macro_rules! single_name_rdata {
    ($(#[$doc:meta])* $ty:ident, $field:ident, compress = true) => {
        single_name_rdata!(@define $(#[$doc])* $ty, $field);

        impl $ty {
            /// Writes the record to wire format, compressing the name.
            pub fn write_to(&self, buf: &mut BytesMut, table: &mut CompressionTable) {
                self.$field.write_compressed(buf, table);
            }
        }
    };
    ($(#[$doc:meta])* $ty:ident, $field:ident, compress = false) => {
        single_name_rdata!(@define $(#[$doc])* $ty, $field);

        impl $ty {
            /// Writes the record to wire format. The name is never compressed.
            pub fn write_to(&self, buf: &mut BytesMut) {
                self.$field.write_wire(buf);
            }
        }
    };
    (@define $(#[$doc:meta])* $ty:ident, $field:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[allow(clippy::upper_case_acronyms)]
        pub struct $ty {
            $field: Name,
        }

        impl $ty {
            /// Creates a new record.
            #[inline]
            pub fn new($field: Name) -> Self {
                Self { $field }
            }

            /// Returns the domain name carried by the record.
            #[inline]
            pub fn $field(&self) -> &Name {
                &self.$field
            }

            /// Parses the record; the name may be compressed.
            pub fn parse(reader: &mut WireReader<'_>) -> Result<Self> {
                Ok(Self {
                    $field: reader.read_name()?,
                })
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.$field)
            }
        }
    };
}

single_name_rdata! {
    /// NS record - authoritative name server (RFC 1035).
    NS, nsdname, compress = true
}

single_name_rdata! {
    /// CNAME record - canonical name for an alias (RFC 1035).
    CNAME, target, compress = true
}

single_name_rdata! {
    /// PTR record - domain name pointer (RFC 1035).
    PTR, ptrdname, compress = true
}

single_name_rdata! {
    /// DNAME record - redirection of a subtree (RFC 6672).
    DNAME, target, compress = false
}

/// MX record - mail exchange (RFC 1035).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MX {
    /// Lower values are preferred.
    preference: u16,
    exchange: Name,
}

impl MX {
    /// Creates a new MX record.
    #[inline]
    pub fn new(preference: u16, exchange: Name) -> Self {
        Self {
            preference,
            exchange,
        }
    }

    /// Returns the preference value.
    #[inline]
    pub const fn preference(&self) -> u16 {
        self.preference
    }

    /// Returns the mail exchange host.
    #[inline]
    pub fn exchange(&self) -> &Name {
        &self.exchange
    }

    /// Parses an MX record.
    pub fn parse(reader: &mut WireReader<'_>) -> Result<Self> {
        let preference = reader.read_u16()?;
        let exchange = reader.read_name()?;
        Ok(Self::new(preference, exchange))
    }

    /// Writes the MX record to wire format, compressing the exchange.
    pub fn write_to(&self, buf: &mut BytesMut, table: &mut CompressionTable) {
        buf.put_u16(self.preference);
        self.exchange.write_compressed(buf, table);
    }
}

impl fmt::Display for MX {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.preference, self.exchange)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_mx_wire() {
        let mx = MX::new(5, Name::from_str("gmail-smtp-in.l.google.com").unwrap());
        let mut buf = BytesMut::new();
        mx.write_to(&mut buf, &mut CompressionTable::new());
        assert_eq!(&buf[..2], &[0, 5]);

        let parsed = MX::parse(&mut WireReader::new(&buf)).unwrap();
        assert_eq!(parsed, mx);
        assert_eq!(parsed.to_string(), "5 gmail-smtp-in.l.google.com.");
    }

    #[test]
    fn test_dname_is_not_compressed() {
        let target = Name::from_str("example.net").unwrap();
        let mut table = CompressionTable::new();
        let mut buf = BytesMut::new();
        target.write_compressed(&mut buf, &mut table);

        let before = buf.len();
        DNAME::new(target.clone()).write_to(&mut buf);
        assert_eq!(buf.len() - before, target.wire_len());
    }

    #[test]
    fn test_ns_accessor() {
        let ns = NS::new(Name::from_str("a.gtld-servers.net").unwrap());
        assert_eq!(ns.nsdname().to_string(), "a.gtld-servers.net.");
    }
}
