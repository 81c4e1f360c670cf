//! DNSSEC record types (DNSKEY, DS, RRSIG, NSEC, NSEC3).
//!
//! These are decoded so they survive a parse/encode cycle and so the
//! validation helpers in `descent-dnssec` can work on typed fields. No
//! signature checking happens here.

use crate::error::{Error, Result};
use crate::name::Name;
use crate::rtype::RecordType;
use crate::wire::{WireReader, key_tag_checksum};
use bytes::{BufMut, BytesMut};
use data_encoding::{BASE32HEX_NOPAD, BASE64, HEXLOWER};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// Type Bitmap
// =============================================================================

/// Windowed type bitmap shared by NSEC and NSEC3 (RFC 4034 §4.1.2).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeBitmap {
    wire: Vec<u8>,
}

impl TypeBitmap {
    /// Builds a bitmap covering the given types.
    pub fn from_types<I>(types: I) -> Self
    where
        I: IntoIterator<Item = RecordType>,
    {
        let mut windows: BTreeMap<u8, Vec<u8>> = BTreeMap::new();
        for rtype in types {
            let code = rtype.to_u16();
            let low = usize::from(code & 0xFF);
            let bits = windows.entry((code >> 8) as u8).or_default();
            if bits.len() <= low / 8 {
                bits.resize(low / 8 + 1, 0);
            }
            bits[low / 8] |= 0x80 >> (low % 8);
        }

        let mut wire = Vec::new();
        for (window, bits) in windows {
            Self::push_window(&mut wire, window, &bits);
        }
        Self { wire }
    }

    fn push_window(wire: &mut Vec<u8>, window: u8, bits: &[u8]) {
        wire.push(window);
        wire.push(bits.len() as u8);
        wire.extend_from_slice(bits);
    }

    /// Reads and validates a bitmap that runs to the end of the reader.
    pub fn parse(reader: &mut WireReader<'_>, rtype: &str) -> Result<Self> {
        let wire = reader.read_rest();
        let mut pos = 0;
        let mut last_window: Option<u8> = None;
        while pos < wire.len() {
            if pos + 2 > wire.len() {
                return Err(Error::invalid_rdata(rtype, "truncated type bitmap window"));
            }
            let window = wire[pos];
            let len = usize::from(wire[pos + 1]);
            if len == 0 || len > 32 {
                return Err(Error::invalid_rdata(
                    rtype,
                    format!("invalid bitmap length {len}"),
                ));
            }
            if last_window.is_some_and(|last| window <= last) {
                return Err(Error::invalid_rdata(rtype, "bitmap windows out of order"));
            }
            if pos + 2 + len > wire.len() {
                return Err(Error::invalid_rdata(rtype, "truncated type bitmap window"));
            }
            last_window = Some(window);
            pos += 2 + len;
        }
        Ok(Self {
            wire: wire.to_vec(),
        })
    }

    /// Returns the raw wire form.
    pub fn as_bytes(&self) -> &[u8] {
        &self.wire
    }

    /// Returns the record types present in the bitmap, in ascending order.
    pub fn types(&self) -> Vec<RecordType> {
        let mut types = Vec::new();
        let mut pos = 0;
        while pos + 2 <= self.wire.len() {
            let window = u16::from(self.wire[pos]);
            let len = usize::from(self.wire[pos + 1]);
            pos += 2;
            let Some(bits) = self.wire.get(pos..pos + len) else {
                break;
            };
            for (byte_idx, &byte) in bits.iter().enumerate() {
                for bit in 0..8u16 {
                    if byte & (0x80 >> bit) != 0 {
                        let code = window * 256 + byte_idx as u16 * 8 + bit;
                        types.push(RecordType::from_u16(code));
                    }
                }
            }
            pos += len;
        }
        types
    }

    /// Returns true if `rtype` is present.
    pub fn contains(&self, rtype: RecordType) -> bool {
        let code = rtype.to_u16();
        let (window, low) = ((code >> 8) as u8, usize::from(code & 0xFF));
        let mut pos = 0;
        while pos + 2 <= self.wire.len() {
            let len = usize::from(self.wire[pos + 1]);
            if self.wire[pos] == window {
                return self
                    .wire
                    .get(pos + 2 + low / 8)
                    .filter(|_| low / 8 < len)
                    .is_some_and(|byte| byte & (0x80 >> (low % 8)) != 0);
            }
            pos += 2 + len;
        }
        false
    }

    fn write_to(&self, buf: &mut BytesMut) {
        buf.extend_from_slice(&self.wire);
    }
}

impl fmt::Display for TypeBitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, rtype) in self.types().into_iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{rtype}")?;
        }
        Ok(())
    }
}

// =============================================================================
// DNSKEY
// =============================================================================

/// DNSKEY record - DNS public key (RFC 4034).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DNSKEY {
    flags: u16,
    /// Must be 3.
    protocol: u8,
    algorithm: u8,
    public_key: Vec<u8>,
    /// Computed once at construction.
    key_tag: u16,
}

impl DNSKEY {
    /// Secure Entry Point flag bit.
    pub const FLAG_SECURE_ENTRY_POINT: u16 = 0x0001;
    /// Revoked flag bit (RFC 5011).
    pub const FLAG_REVOKE: u16 = 0x0080;
    /// Zone Key flag bit.
    pub const FLAG_ZONE: u16 = 0x0100;
    /// The only valid protocol value.
    pub const PROTOCOL: u8 = 3;

    /// Creates a new DNSKEY record.
    pub fn new(flags: u16, protocol: u8, algorithm: u8, public_key: impl Into<Vec<u8>>) -> Self {
        let public_key = public_key.into();
        let mut rdata = Vec::with_capacity(4 + public_key.len());
        rdata.extend_from_slice(&flags.to_be_bytes());
        rdata.extend_from_slice(&[protocol, algorithm]);
        rdata.extend_from_slice(&public_key);

        Self {
            flags,
            protocol,
            algorithm,
            public_key,
            key_tag: key_tag_checksum(&rdata),
        }
    }

    /// Returns the flags.
    #[inline]
    pub const fn flags(&self) -> u16 {
        self.flags
    }

    /// Returns true if the zone key bit is set.
    #[inline]
    pub const fn is_zone_key(&self) -> bool {
        self.flags & Self::FLAG_ZONE != 0
    }

    /// Returns true if this is a secure entry point (KSK).
    #[inline]
    pub const fn is_secure_entry_point(&self) -> bool {
        self.flags & Self::FLAG_SECURE_ENTRY_POINT != 0
    }

    /// Returns true if the key has been revoked.
    #[inline]
    pub const fn is_revoked(&self) -> bool {
        self.flags & Self::FLAG_REVOKE != 0
    }

    /// Returns the protocol.
    #[inline]
    pub const fn protocol(&self) -> u8 {
        self.protocol
    }

    /// Returns the algorithm number.
    #[inline]
    pub const fn algorithm(&self) -> u8 {
        self.algorithm
    }

    /// Returns the public key data.
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// Returns the key tag (RFC 4034 Appendix B).
    #[inline]
    pub const fn key_tag(&self) -> u16 {
        self.key_tag
    }

    /// Parses a DNSKEY record.
    pub fn parse(reader: &mut WireReader<'_>) -> Result<Self> {
        let flags = reader.read_u16()?;
        let protocol = reader.read_u8()?;
        let algorithm = reader.read_u8()?;
        Ok(Self::new(flags, protocol, algorithm, reader.read_rest()))
    }

    /// Writes the DNSKEY record to wire format.
    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.put_u16(self.flags);
        buf.put_u8(self.protocol);
        buf.put_u8(self.algorithm);
        buf.extend_from_slice(&self.public_key);
    }
}

impl fmt::Display for DNSKEY {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} ; key id = {}",
            self.flags,
            self.protocol,
            self.algorithm,
            BASE64.encode(&self.public_key),
            self.key_tag
        )
    }
}

// =============================================================================
// DS
// =============================================================================

/// DS record - delegation signer (RFC 4034).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DS {
    key_tag: u16,
    algorithm: u8,
    digest_type: u8,
    digest: Vec<u8>,
}

impl DS {
    /// SHA-1 digest type.
    pub const DIGEST_SHA1: u8 = 1;
    /// SHA-256 digest type.
    pub const DIGEST_SHA256: u8 = 2;
    /// SHA-384 digest type.
    pub const DIGEST_SHA384: u8 = 4;

    /// Creates a new DS record.
    pub fn new(key_tag: u16, algorithm: u8, digest_type: u8, digest: impl Into<Vec<u8>>) -> Self {
        Self {
            key_tag,
            algorithm,
            digest_type,
            digest: digest.into(),
        }
    }

    /// Returns the key tag of the referenced DNSKEY.
    #[inline]
    pub const fn key_tag(&self) -> u16 {
        self.key_tag
    }

    /// Returns the algorithm number.
    #[inline]
    pub const fn algorithm(&self) -> u8 {
        self.algorithm
    }

    /// Returns the digest type.
    #[inline]
    pub const fn digest_type(&self) -> u8 {
        self.digest_type
    }

    /// Returns the digest.
    pub fn digest(&self) -> &[u8] {
        &self.digest
    }

    /// Parses a DS record.
    pub fn parse(reader: &mut WireReader<'_>) -> Result<Self> {
        let key_tag = reader.read_u16()?;
        let algorithm = reader.read_u8()?;
        let digest_type = reader.read_u8()?;
        Ok(Self::new(key_tag, algorithm, digest_type, reader.read_rest()))
    }

    /// Writes the DS record to wire format.
    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.put_u16(self.key_tag);
        buf.put_u8(self.algorithm);
        buf.put_u8(self.digest_type);
        buf.extend_from_slice(&self.digest);
    }
}

impl fmt::Display for DS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.key_tag,
            self.algorithm,
            self.digest_type,
            HEXLOWER.encode(&self.digest).to_uppercase()
        )
    }
}

// =============================================================================
// RRSIG
// =============================================================================

/// RRSIG record - signature over an RRset (RFC 4034).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RRSIG {
    type_covered: RecordType,
    algorithm: u8,
    /// Label count of the original owner name, wildcards excluded.
    labels: u8,
    original_ttl: u32,
    /// Seconds since the epoch, serial-number arithmetic.
    expiration: u32,
    inception: u32,
    key_tag: u16,
    signer: Name,
    signature: Vec<u8>,
}

impl RRSIG {
    /// Creates a new RRSIG record.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        type_covered: RecordType,
        algorithm: u8,
        labels: u8,
        original_ttl: u32,
        expiration: u32,
        inception: u32,
        key_tag: u16,
        signer: Name,
        signature: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            type_covered,
            algorithm,
            labels,
            original_ttl,
            expiration,
            inception,
            key_tag,
            signer,
            signature: signature.into(),
        }
    }

    /// Returns the type covered by this signature.
    #[inline]
    pub const fn type_covered(&self) -> RecordType {
        self.type_covered
    }

    /// Returns the algorithm number.
    #[inline]
    pub const fn algorithm(&self) -> u8 {
        self.algorithm
    }

    /// Returns the label count.
    #[inline]
    pub const fn labels(&self) -> u8 {
        self.labels
    }

    /// Returns the original TTL.
    #[inline]
    pub const fn original_ttl(&self) -> u32 {
        self.original_ttl
    }

    /// Returns the expiration time.
    #[inline]
    pub const fn expiration(&self) -> u32 {
        self.expiration
    }

    /// Returns the inception time.
    #[inline]
    pub const fn inception(&self) -> u32 {
        self.inception
    }

    /// Returns the key tag of the signing key.
    #[inline]
    pub const fn key_tag(&self) -> u16 {
        self.key_tag
    }

    /// Returns the signer's name.
    #[inline]
    pub fn signer(&self) -> &Name {
        &self.signer
    }

    /// Returns the signature data.
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Returns true if `now` lies within the validity window.
    pub fn is_valid_at(&self, now: u32) -> bool {
        now >= self.inception && now <= self.expiration
    }

    /// Parses an RRSIG record.
    pub fn parse(reader: &mut WireReader<'_>) -> Result<Self> {
        let type_covered = RecordType::from_u16(reader.read_u16()?);
        let algorithm = reader.read_u8()?;
        let labels = reader.read_u8()?;
        let original_ttl = reader.read_u32()?;
        let expiration = reader.read_u32()?;
        let inception = reader.read_u32()?;
        let key_tag = reader.read_u16()?;
        let signer = reader.read_name()?;
        let signature = reader.read_rest().to_vec();

        Ok(Self {
            type_covered,
            algorithm,
            labels,
            original_ttl,
            expiration,
            inception,
            key_tag,
            signer,
            signature,
        })
    }

    /// Writes the RRSIG record. The signer name is never compressed.
    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.put_u16(self.type_covered.to_u16());
        buf.put_u8(self.algorithm);
        buf.put_u8(self.labels);
        buf.put_u32(self.original_ttl);
        buf.put_u32(self.expiration);
        buf.put_u32(self.inception);
        buf.put_u16(self.key_tag);
        self.signer.write_wire(buf);
        buf.extend_from_slice(&self.signature);
    }
}

impl fmt::Display for RRSIG {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {} {} {} {}",
            self.type_covered,
            self.algorithm,
            self.labels,
            self.original_ttl,
            self.expiration,
            self.inception,
            self.key_tag,
            self.signer,
            BASE64.encode(&self.signature)
        )
    }
}

// =============================================================================
// NSEC / NSEC3
// =============================================================================

/// NSEC record - next secure name (RFC 4034).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NSEC {
    next_name: Name,
    types: TypeBitmap,
}

impl NSEC {
    /// Creates a new NSEC record.
    pub fn new(next_name: Name, types: TypeBitmap) -> Self {
        Self { next_name, types }
    }

    /// Returns the next owner name in canonical order.
    pub fn next_name(&self) -> &Name {
        &self.next_name
    }

    /// Returns the type bitmap.
    pub fn types(&self) -> &TypeBitmap {
        &self.types
    }

    /// Parses an NSEC record.
    pub fn parse(reader: &mut WireReader<'_>) -> Result<Self> {
        let next_name = reader.read_name()?;
        let types = TypeBitmap::parse(reader, "NSEC")?;
        Ok(Self::new(next_name, types))
    }

    /// Writes the NSEC record. The next name is never compressed.
    pub fn write_to(&self, buf: &mut BytesMut) {
        self.next_name.write_wire(buf);
        self.types.write_to(buf);
    }
}

impl fmt::Display for NSEC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.next_name, self.types)
    }
}

/// NSEC3 record - hashed next secure name (RFC 5155).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NSEC3 {
    hash_algorithm: u8,
    flags: u8,
    iterations: u16,
    salt: Vec<u8>,
    next_hashed: Vec<u8>,
    types: TypeBitmap,
}

impl NSEC3 {
    /// Opt-out flag bit.
    pub const FLAG_OPT_OUT: u8 = 0x01;

    /// Creates a new NSEC3 record.
    pub fn new(
        hash_algorithm: u8,
        flags: u8,
        iterations: u16,
        salt: impl Into<Vec<u8>>,
        next_hashed: impl Into<Vec<u8>>,
        types: TypeBitmap,
    ) -> Self {
        Self {
            hash_algorithm,
            flags,
            iterations,
            salt: salt.into(),
            next_hashed: next_hashed.into(),
            types,
        }
    }

    /// Returns the hash algorithm (1 = SHA-1).
    #[inline]
    pub const fn hash_algorithm(&self) -> u8 {
        self.hash_algorithm
    }

    /// Returns true if the opt-out flag is set.
    #[inline]
    pub const fn is_opt_out(&self) -> bool {
        self.flags & Self::FLAG_OPT_OUT != 0
    }

    /// Returns the number of extra hash iterations.
    #[inline]
    pub const fn iterations(&self) -> u16 {
        self.iterations
    }

    /// Returns the salt.
    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    /// Returns the next hashed owner name (raw digest).
    pub fn next_hashed(&self) -> &[u8] {
        &self.next_hashed
    }

    /// Returns the type bitmap.
    pub fn types(&self) -> &TypeBitmap {
        &self.types
    }

    /// Parses an NSEC3 record.
    pub fn parse(reader: &mut WireReader<'_>) -> Result<Self> {
        let hash_algorithm = reader.read_u8()?;
        let flags = reader.read_u8()?;
        let iterations = reader.read_u16()?;
        let salt = reader.read_character_string()?.to_vec();
        let next_hashed = reader.read_character_string()?.to_vec();
        if next_hashed.is_empty() {
            return Err(Error::invalid_rdata("NSEC3", "empty next hashed owner"));
        }
        let types = TypeBitmap::parse(reader, "NSEC3")?;
        Ok(Self::new(
            hash_algorithm,
            flags,
            iterations,
            salt,
            next_hashed,
            types,
        ))
    }

    /// Writes the NSEC3 record to wire format.
    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.put_u8(self.hash_algorithm);
        buf.put_u8(self.flags);
        buf.put_u16(self.iterations);
        buf.put_u8(self.salt.len() as u8);
        buf.extend_from_slice(&self.salt);
        buf.put_u8(self.next_hashed.len() as u8);
        buf.extend_from_slice(&self.next_hashed);
        self.types.write_to(buf);
    }
}

impl fmt::Display for NSEC3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let salt = if self.salt.is_empty() {
            "-".to_string()
        } else {
            HEXLOWER.encode(&self.salt).to_uppercase()
        };
        write!(
            f,
            "{} {} {} {} {} {}",
            self.hash_algorithm,
            self.flags,
            self.iterations,
            salt,
            BASE32HEX_NOPAD.encode(&self.next_hashed),
            self.types
        )
    }
}
