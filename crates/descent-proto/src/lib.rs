//! # Descent DNS Protocol Library
//!
//! This crate provides the DNS wire format used by the descent resolver:
//! domain names, resource records, and complete messages, following RFC 1035
//! and its extensions.
//!
//! ## Features
//!
//! - **RFC 1035 message codec** with name compression on encode and
//!   strictly-backward pointer validation on decode
//! - **Open record type registry**: unknown types round-trip as opaque bytes
//! - **EDNS0 support** (RFC 6891) with the OPT pseudo-RR lifted into
//!   [`Message::edns`]
//! - **DNSSEC record types** (DNSKEY, DS, RRSIG, NSEC, NSEC3)
//!
//! ## Example
//!
//! ```rust
//! use descent_proto::{Message, Name, Question, RecordType};
//! use std::str::FromStr;
//!
//! let query = Message::query(Question::new(
//!     Name::from_str("www.example.com.").unwrap(),
//!     RecordType::A,
//! ));
//!
//! let wire = query.to_wire().unwrap();
//! let decoded = Message::parse(&wire).unwrap();
//! assert_eq!(decoded, query);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]

pub mod class;
pub mod edns;
pub mod error;
pub mod header;
pub mod message;
pub mod name;
pub mod opcode;
pub mod question;
pub mod rcode;
pub mod rdata;
pub mod record;
pub mod rtype;
pub mod wire;

// Re-exports for convenience
pub use class::RecordClass;
pub use edns::{Edns, EdnsOption};
pub use error::{Error, ErrorKind, Result};
pub use header::{Header, HeaderFlags};
pub use message::{Message, MessageBuilder};
pub use name::{CompressionTable, Name};
pub use opcode::OpCode;
pub use question::Question;
pub use rcode::ResponseCode;
pub use rdata::RData;
pub use record::ResourceRecord;
pub use rtype::RecordType;

/// Maximum length of a DNS label (63 bytes per RFC 1035)
pub const MAX_LABEL_LENGTH: usize = 63;

/// Maximum length of a domain name (255 bytes per RFC 1035)
pub const MAX_NAME_LENGTH: usize = 255;

/// Maximum size of a UDP DNS message without EDNS0 (512 bytes per RFC 1035)
pub const MAX_UDP_MESSAGE_SIZE: usize = 512;

/// Default EDNS0 UDP payload size advertised by queries.
pub const DEFAULT_EDNS_UDP_SIZE: u16 = 1232;

/// Maximum size of any DNS message (TCP length prefix is 16 bits).
pub const MAX_MESSAGE_SIZE: usize = 65535;

/// Largest offset a compression pointer can reference (14 bits).
pub const MAX_POINTER_OFFSET: usize = 0x3FFF;

/// DNS port (53)
pub const DNS_PORT: u16 = 53;
