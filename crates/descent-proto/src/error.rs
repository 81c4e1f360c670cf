//! DNS protocol error types.
//!
//! Every failure the codec can produce belongs to one of three categories,
//! reported by [`Error::kind`]:
//!
//! - [`ErrorKind::Format`]: the framing itself is invalid (bad name encoding,
//!   compression loops, reserved header bits, duplicate OPT records)
//! - [`ErrorKind::MalformedRecord`]: a record's RDATA does not fit its type
//! - [`ErrorKind::TruncatedMessage`]: the buffer ends before the declared
//!   contents do

use thiserror::Error;

/// Result type alias for DNS protocol operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of a protocol error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed wire framing (FORMERR).
    Format,
    /// A record payload is invalid for its declared type.
    MalformedRecord,
    /// The message is shorter than its header and length fields require.
    TruncatedMessage,
}

/// DNS protocol errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // =========================================================================
    // Wire Format Parsing Errors
    // =========================================================================
    /// Unexpected end of data while parsing.
    #[error("unexpected end of data at offset {offset}")]
    UnexpectedEof {
        /// Byte offset where EOF was encountered.
        offset: usize,
    },

    /// A section holds fewer entries than the header declares.
    #[error("truncated message: {section} section declares {declared} entries, only {parsed} present")]
    TruncatedSection {
        /// Section name.
        section: &'static str,
        /// Count from the header.
        declared: u16,
        /// Entries that could be read.
        parsed: u16,
    },

    /// Invalid data encountered during parsing.
    #[error("invalid data at offset {offset}: {message}")]
    InvalidData {
        /// Byte offset of the invalid data.
        offset: usize,
        /// Description of the error.
        message: String,
    },

    /// The reserved Z bit of the header flags is set.
    #[error("reserved header flag bit is set (flags 0x{flags:04X})")]
    ReservedFlagSet {
        /// Raw flags word.
        flags: u16,
    },

    // =========================================================================
    // Domain Name Errors
    // =========================================================================
    /// Label exceeds maximum length of 63 bytes.
    #[error("label too long: {length} bytes exceeds maximum of 63")]
    LabelTooLong {
        /// Actual label length.
        length: usize,
    },

    /// Domain name exceeds maximum length of 255 bytes.
    #[error("name too long: {length} bytes exceeds maximum of 255")]
    NameTooLong {
        /// Actual name length in wire format.
        length: usize,
    },

    /// Empty label in the middle of a domain name.
    #[error("empty label at position {position} (only allowed at end for root)")]
    EmptyLabel {
        /// Character position of the empty label.
        position: usize,
    },

    /// Malformed escape sequence in presentation format.
    #[error("invalid escape sequence at position {position} in {text:?}")]
    InvalidEscape {
        /// The text being parsed.
        text: String,
        /// Character position of the backslash.
        position: usize,
    },

    /// Label type bits `01` or `10` (extended / reserved label types).
    #[error("unsupported label type 0x{byte:02X} at offset {offset}")]
    InvalidLabelType {
        /// Offset of the length byte.
        offset: usize,
        /// The length byte.
        byte: u8,
    },

    /// A compression pointer that does not point strictly backward.
    #[error("compression loop: pointer at offset {offset} targets {target}")]
    CompressionLoop {
        /// Offset of the pointer.
        offset: usize,
        /// Target offset the pointer references.
        target: usize,
    },

    // =========================================================================
    // Record Type/Class Errors
    // =========================================================================
    /// Unknown record type mnemonic.
    #[error("unknown record type: {value}")]
    InvalidRecordType {
        /// The text that failed to parse.
        value: String,
    },

    /// Unknown record class mnemonic.
    #[error("unknown record class: {value}")]
    InvalidRecordClass {
        /// The text that failed to parse.
        value: String,
    },

    // =========================================================================
    // RDATA Errors
    // =========================================================================
    /// RDATA length does not match what the type requires.
    #[error("RDATA length mismatch for {rtype}: expected {expected}, got {actual}")]
    RDataLengthMismatch {
        /// Record type.
        rtype: String,
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// Invalid RDATA content.
    #[error("invalid RDATA for {rtype}: {message}")]
    InvalidRData {
        /// Record type.
        rtype: String,
        /// Error description.
        message: String,
    },

    // =========================================================================
    // EDNS Errors
    // =========================================================================
    /// Invalid EDNS option.
    #[error("invalid EDNS option {code}: {message}")]
    InvalidEdnsOption {
        /// Option code.
        code: u16,
        /// Error description.
        message: String,
    },

    /// Multiple OPT records in message.
    #[error("multiple OPT records in message (only one allowed)")]
    MultipleOptRecords,

    /// OPT record in a section other than additional.
    #[error("OPT record found in {section} section (must be in additional)")]
    OptInWrongSection {
        /// Section where OPT was found.
        section: &'static str,
    },

    // =========================================================================
    // Encoding Errors
    // =========================================================================
    /// Encoded message exceeds the maximum size.
    #[error("message too large: {size} bytes exceeds maximum of {max_size}")]
    MessageTooLarge {
        /// Actual message size.
        size: usize,
        /// Maximum allowed size.
        max_size: usize,
    },

    /// A section holds more entries than a 16-bit count can express.
    #[error("too many entries in {section} section: {count}")]
    TooManyRecords {
        /// Section name.
        section: &'static str,
        /// Number of entries.
        count: usize,
    },
}

impl Error {
    /// Creates a new `UnexpectedEof` error.
    #[inline]
    pub fn unexpected_eof(offset: usize) -> Self {
        Self::UnexpectedEof { offset }
    }

    /// Creates a new `InvalidData` error.
    #[inline]
    pub fn invalid_data(offset: usize, message: impl Into<String>) -> Self {
        Self::InvalidData {
            offset,
            message: message.into(),
        }
    }

    /// Creates a new `LabelTooLong` error.
    #[inline]
    pub fn label_too_long(length: usize) -> Self {
        Self::LabelTooLong { length }
    }

    /// Creates a new `NameTooLong` error.
    #[inline]
    pub fn name_too_long(length: usize) -> Self {
        Self::NameTooLong { length }
    }

    /// Creates a new `RDataLengthMismatch` error.
    #[inline]
    pub fn rdata_length(rtype: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::RDataLengthMismatch {
            rtype: rtype.into(),
            expected,
            actual,
        }
    }

    /// Creates a new `InvalidRData` error.
    #[inline]
    pub fn invalid_rdata(rtype: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRData {
            rtype: rtype.into(),
            message: message.into(),
        }
    }

    /// Creates a new `InvalidEdnsOption` error.
    #[inline]
    pub fn invalid_edns_option(code: u16, message: impl Into<String>) -> Self {
        Self::InvalidEdnsOption {
            code,
            message: message.into(),
        }
    }

    /// Returns the category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnexpectedEof { .. } | Self::TruncatedSection { .. } => {
                ErrorKind::TruncatedMessage
            }
            Self::RDataLengthMismatch { .. }
            | Self::InvalidRData { .. }
            | Self::InvalidEdnsOption { .. } => ErrorKind::MalformedRecord,
            _ => ErrorKind::Format,
        }
    }

    /// Returns true if this error indicates a format error (FORMERR).
    #[inline]
    pub fn is_format_error(&self) -> bool {
        self.kind() == ErrorKind::Format
    }

    /// Returns true if a record payload was invalid for its type.
    #[inline]
    pub fn is_malformed_record(&self) -> bool {
        self.kind() == ErrorKind::MalformedRecord
    }

    /// Returns true if the input ended before its declared contents.
    #[inline]
    pub fn is_truncated(&self) -> bool {
        self.kind() == ErrorKind::TruncatedMessage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::label_too_long(64);
        assert_eq!(
            err.to_string(),
            "label too long: 64 bytes exceeds maximum of 63"
        );

        let err = Error::rdata_length("A", 4, 5);
        assert_eq!(
            err.to_string(),
            "RDATA length mismatch for A: expected 4, got 5"
        );

        let err = Error::CompressionLoop {
            offset: 12,
            target: 12,
        };
        assert_eq!(
            err.to_string(),
            "compression loop: pointer at offset 12 targets 12"
        );
    }

    #[test]
    fn test_error_classification() {
        assert!(Error::unexpected_eof(10).is_truncated());
        assert!(
            Error::TruncatedSection {
                section: "answer",
                declared: 2,
                parsed: 1
            }
            .is_truncated()
        );
        assert!(Error::CompressionLoop { offset: 0, target: 4 }.is_format_error());
        assert!(Error::ReservedFlagSet { flags: 0x0040 }.is_format_error());
        assert!(Error::MultipleOptRecords.is_format_error());
        assert!(Error::rdata_length("AAAA", 16, 4).is_malformed_record());
        assert!(Error::invalid_rdata("MX", "name overruns RDATA").is_malformed_record());
    }
}
