//! # Descent DNSSEC Helpers
//!
//! The resolver treats DNSSEC validation as a pluggable step: a
//! [`DnssecVerifier`] receives the records of a final answer plus whatever
//! DNSKEYs are available and reports a [`ValidationResult`]. This crate
//! defines that seam and the building blocks a verifier needs:
//!
//! - **Key tags** (RFC 4034 Appendix B)
//! - **DS digests** over a zone's DNSKEY (SHA-1, SHA-256, SHA-384)
//! - **NSEC denial** checks using canonical name ordering
//! - **NSEC3 hashing** (RFC 5155)
//! - [`KeyTagVerifier`], a structural verifier that matches RRSIGs to keys
//!   by tag, algorithm and validity window without checking signatures
//!
//! Building a chain of trust from the root is out of scope.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::BytesMut;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384};
use thiserror::Error;
use tracing::{debug, trace};

use descent_proto::{
    Name, RecordType, ResourceRecord,
    rdata::{DNSKEY, DS, NSEC, RData, RRSIG},
    wire::key_tag_checksum,
};

// ============================================================================
// Error Types
// ============================================================================

/// Errors produced by the DNSSEC helpers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DnssecError {
    /// The DS digest type is not supported.
    #[error("unsupported digest algorithm: {0}")]
    UnsupportedDigestAlgorithm(u8),

    /// The NSEC3 hash algorithm is not supported.
    #[error("unsupported NSEC3 hash algorithm: {0}")]
    UnsupportedHashAlgorithm(u8),

    /// NSEC records do not prove the claimed non-existence.
    #[error("denial of existence validation failed: {0}")]
    DenialFailed(String),
}

/// Result type for DNSSEC helpers.
pub type Result<T> = std::result::Result<T, DnssecError>;

// ============================================================================
// Validation Result
// ============================================================================

/// The security status of a set of records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// Signatures matched the supplied keys.
    Secure,

    /// The records are unsigned.
    Insecure,

    /// Validation failed; the string says why.
    Bogus(String),

    /// Nothing to validate against (no keys available).
    Indeterminate,
}

impl ValidationResult {
    /// Returns true if the result indicates the data is secure.
    pub fn is_secure(&self) -> bool {
        matches!(self, Self::Secure)
    }

    /// Returns true if the data is unsigned.
    pub fn is_insecure(&self) -> bool {
        matches!(self, Self::Insecure)
    }

    /// Returns true if the result indicates validation failure.
    pub fn is_bogus(&self) -> bool {
        matches!(self, Self::Bogus(_))
    }

    /// Returns the bogus reason if this is a Bogus result.
    pub fn bogus_reason(&self) -> Option<&str> {
        match self {
            Self::Bogus(reason) => Some(reason),
            _ => None,
        }
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Secure => write!(f, "SECURE"),
            Self::Insecure => write!(f, "INSECURE"),
            Self::Bogus(reason) => write!(f, "BOGUS: {reason}"),
            Self::Indeterminate => write!(f, "INDETERMINATE"),
        }
    }
}

/// Pluggable validation step run on a resolver's final answer.
pub trait DnssecVerifier: Send + Sync {
    /// Validates `records` (answer RRsets with their RRSIGs) against `keys`.
    fn verify(&self, records: &[ResourceRecord], keys: &[DNSKEY]) -> ValidationResult;
}

// ============================================================================
// Key Tags and DS Digests
// ============================================================================

/// Calculates the key tag for DNSKEY fields (RFC 4034 Appendix B).
pub fn calculate_key_tag(flags: u16, protocol: u8, algorithm: u8, public_key: &[u8]) -> u16 {
    let mut rdata = Vec::with_capacity(4 + public_key.len());
    rdata.extend_from_slice(&flags.to_be_bytes());
    rdata.extend_from_slice(&[protocol, algorithm]);
    rdata.extend_from_slice(public_key);
    key_tag_checksum(&rdata)
}

/// Computes the digest a DS record for `dnskey` at `zone` would carry.
///
/// The input is the canonical (lowercased) owner name followed by the
/// DNSKEY RDATA.
///
/// # Errors
///
/// Fails for digest types other than 1 (SHA-1), 2 (SHA-256) and 4 (SHA-384).
pub fn compute_ds_digest(zone: &Name, dnskey: &DNSKEY, digest_type: u8) -> Result<Vec<u8>> {
    let mut data = BytesMut::new();
    zone.to_lowercase().write_wire(&mut data);
    dnskey.write_to(&mut data);

    match digest_type {
        DS::DIGEST_SHA1 => Ok(Sha1::digest(&data).to_vec()),
        DS::DIGEST_SHA256 => Ok(Sha256::digest(&data).to_vec()),
        DS::DIGEST_SHA384 => Ok(Sha384::digest(&data).to_vec()),
        other => Err(DnssecError::UnsupportedDigestAlgorithm(other)),
    }
}

/// Creates a DS record for a DNSKEY.
pub fn create_ds_from_dnskey(zone: &Name, dnskey: &DNSKEY, digest_type: u8) -> Result<DS> {
    let digest = compute_ds_digest(zone, dnskey, digest_type)?;
    Ok(DS::new(
        dnskey.key_tag(),
        dnskey.algorithm(),
        digest_type,
        digest,
    ))
}

/// Returns true if `ds` refers to `dnskey` at `zone`.
pub fn ds_matches_dnskey(ds: &DS, dnskey: &DNSKEY, zone: &Name) -> bool {
    ds.key_tag() == dnskey.key_tag()
        && ds.algorithm() == dnskey.algorithm()
        && compute_ds_digest(zone, dnskey, ds.digest_type())
            .is_ok_and(|digest| digest == ds.digest())
}

// ============================================================================
// Denial of Existence
// ============================================================================

/// Returns true if `name` falls strictly between an NSEC record's owner and
/// its next name in canonical order.
///
/// The last NSEC of a zone points back at the apex, so when `next` is an
/// ancestor of (or equal to) `owner` the interval wraps: every name after
/// `owner` is covered.
pub fn nsec_matches(name: &Name, owner: &Name, next: &Name) -> bool {
    if owner.is_subdomain_of(next) {
        name > owner
    } else {
        owner < name && name < next
    }
}

/// Returns true if the NSEC type bitmap lists `rtype`.
pub fn nsec_covers_type(nsec: &NSEC, rtype: RecordType) -> bool {
    nsec.types().contains(rtype)
}

/// Checks that an NSEC record owned by `owner` proves that `qname`/`qtype`
/// does not exist.
///
/// Either the name is covered by the NSEC interval (NXDOMAIN) or the owner
/// is the name itself and the bitmap lacks the type (NODATA).
pub fn verify_nsec_denial(owner: &Name, nsec: &NSEC, qname: &Name, qtype: RecordType) -> Result<()> {
    if owner == qname {
        if nsec_covers_type(nsec, qtype) {
            return Err(DnssecError::DenialFailed(format!(
                "NSEC at {owner} lists {qtype}"
            )));
        }
        return Ok(());
    }
    if nsec_matches(qname, owner, nsec.next_name()) {
        return Ok(());
    }
    Err(DnssecError::DenialFailed(format!(
        "{qname} is outside NSEC interval {owner} -> {}",
        nsec.next_name()
    )))
}

/// Computes the NSEC3 hash of a name (RFC 5155 §5).
///
/// # Errors
///
/// Only hash algorithm 1 (SHA-1) is defined.
pub fn compute_nsec3_hash(name: &Name, hash_algorithm: u8, salt: &[u8], iterations: u16) -> Result<Vec<u8>> {
    if hash_algorithm != 1 {
        return Err(DnssecError::UnsupportedHashAlgorithm(hash_algorithm));
    }

    let mut wire = BytesMut::new();
    name.to_lowercase().write_wire(&mut wire);

    let mut hash = Sha1::new().chain_update(&wire).chain_update(salt).finalize().to_vec();
    for _ in 0..iterations {
        hash = Sha1::new().chain_update(&hash).chain_update(salt).finalize().to_vec();
    }
    Ok(hash)
}

// ============================================================================
// Structural Verifier
// ============================================================================

/// Verifier that checks RRSIG bookkeeping but not the signatures themselves.
///
/// Every RRset must carry an RRSIG whose key tag and algorithm match a
/// non-revoked zone key and whose validity window contains the current
/// time. Useful for wiring and testing; it offers no cryptographic
/// assurance.
#[derive(Debug, Clone, Default)]
pub struct KeyTagVerifier {
    /// Fixed "now" as seconds since the epoch. `None` reads the system clock.
    now: Option<u32>,
}

impl KeyTagVerifier {
    /// Creates a verifier that uses the system clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a verifier pinned to a point in time.
    pub fn at(now: u32) -> Self {
        Self { now: Some(now) }
    }

    fn now(&self) -> u32 {
        self.now.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |d| d.as_secs() as u32)
        })
    }

    fn check_rrsig(&self, rrsig: &RRSIG, keys: &[DNSKEY], now: u32) -> std::result::Result<(), String> {
        if !rrsig.is_valid_at(now) {
            return Err(format!(
                "RRSIG by {} outside validity window {}..{}",
                rrsig.signer(),
                rrsig.inception(),
                rrsig.expiration()
            ));
        }
        let matched = keys.iter().any(|key| {
            key.key_tag() == rrsig.key_tag()
                && key.algorithm() == rrsig.algorithm()
                && key.protocol() == DNSKEY::PROTOCOL
                && key.is_zone_key()
                && !key.is_revoked()
        });
        if matched {
            Ok(())
        } else {
            Err(format!("no DNSKEY matches key tag {}", rrsig.key_tag()))
        }
    }
}

impl DnssecVerifier for KeyTagVerifier {
    fn verify(&self, records: &[ResourceRecord], keys: &[DNSKEY]) -> ValidationResult {
        let rrsigs: Vec<(&Name, &RRSIG)> = records
            .iter()
            .filter_map(|r| match r.rdata() {
                RData::RRSIG(sig) => Some((r.name(), sig)),
                _ => None,
            })
            .collect();

        if rrsigs.is_empty() {
            trace!("no RRSIG records, answer is unsigned");
            return ValidationResult::Insecure;
        }
        if keys.is_empty() {
            return ValidationResult::Indeterminate;
        }

        let now = self.now();
        let mut rrsets: Vec<(&Name, RecordType)> = Vec::new();
        for record in records.iter().filter(|r| r.rtype() != RecordType::RRSIG) {
            let key = (record.name(), record.rtype());
            if !rrsets.contains(&key) {
                rrsets.push(key);
            }
        }

        for (owner, rtype) in rrsets {
            let covering: Vec<&RRSIG> = rrsigs
                .iter()
                .filter(|(name, sig)| *name == owner && sig.type_covered() == rtype)
                .map(|(_, sig)| *sig)
                .collect();
            if covering.is_empty() {
                return ValidationResult::Bogus(format!("missing RRSIG for {owner} {rtype}"));
            }

            let mut last_error = String::new();
            let valid = covering.iter().any(|sig| match self.check_rrsig(sig, keys, now) {
                Ok(()) => true,
                Err(reason) => {
                    last_error = reason;
                    false
                }
            });
            if !valid {
                debug!(%owner, %rtype, reason = %last_error, "RRset failed validation");
                return ValidationResult::Bogus(last_error);
            }
        }

        ValidationResult::Secure
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_encoding::{BASE64, HEXUPPER};
    use descent_proto::rdata::TypeBitmap;
    use std::net::Ipv4Addr;
    use std::str::FromStr;

    fn name(s: &str) -> Name {
        Name::from_str(s).unwrap()
    }

    #[test]
    fn test_nsec_matches() {
        assert!(nsec_matches(&name("example.com"), &name("com"), &name("com")));
        assert!(nsec_matches(&name("example.com"), &name("e.com"), &name("f.com")));
        assert!(nsec_matches(&name("example.com"), &name("be"), &name("de")));
        assert!(nsec_matches(
            &name("nsec.example.com"),
            &name("example.com"),
            &name("www.example.com")
        ));

        assert!(!nsec_matches(&name("example.com"), &name("a.com"), &name("example.com")));
        assert!(!nsec_matches(&name("example.com"), &name("example1.com"), &name("example2.com")));
        assert!(!nsec_matches(&name("example.com"), &name("test.com"), &name("xxx.com")));
        assert!(!nsec_matches(&name("example.com"), &name("xxx.com"), &name("test.com")));
        assert!(!nsec_matches(&name("example.com"), &name("aaa.com"), &name("bbb.com")));
        assert!(!nsec_matches(&name("www.example.com"), &name("example2.com"), &name("example3.com")));
        assert!(!nsec_matches(
            &name("test.nsec.example.com"),
            &name("nsec.example.com"),
            &name("a.nsec.example.com")
        ));
        assert!(!nsec_matches(
            &name("test.nsec.example.com"),
            &name("test.nsec.example.com"),
            &name("a.example.com")
        ));
        assert!(!nsec_matches(
            &name("www.example.com"),
            &name("example.com"),
            &name("nsec.example.com")
        ));
        assert!(!nsec_matches(
            &name("example.com"),
            &name("nsec.example.com"),
            &name("www.example.com")
        ));
    }

    #[test]
    fn test_verify_nsec_denial() {
        let nsec = NSEC::new(
            name("www.example.com"),
            TypeBitmap::from_types([
                RecordType::A,
                RecordType::NS,
                RecordType::SOA,
                RecordType::TXT,
                RecordType::AAAA,
                RecordType::RRSIG,
                RecordType::NSEC,
                RecordType::DNSKEY,
            ]),
        );
        let owner = name("example.com");

        assert!(verify_nsec_denial(&owner, &nsec, &name("nsec.example.com"), RecordType::A).is_ok());
        assert!(verify_nsec_denial(&owner, &nsec, &name("example.com"), RecordType::PTR).is_ok());
        assert!(verify_nsec_denial(&owner, &nsec, &name("www.example.com"), RecordType::A).is_err());
        assert!(verify_nsec_denial(&owner, &nsec, &name("example.com"), RecordType::NS).is_err());
        assert!(nsec_covers_type(&nsec, RecordType::DNSKEY));
    }

    #[test]
    fn test_key_tag_matches_dnskey() {
        let key = DNSKEY::new(256, 3, 8, vec![0x03, 0x01, 0x00, 0x01, 0xAB, 0xCD]);
        assert_eq!(
            calculate_key_tag(256, 3, 8, key.public_key()),
            key.key_tag()
        );
    }

    #[test]
    fn test_ds_digest_rfc4034_example() {
        // RFC 4034 §5.4: DNSKEY and DS for dskey.example.com.
        let public_key = BASE64
            .decode(
                b"AQOeiiR0GOMYkDshWoSKz9XzfwJr1AYtsmx3TGkJaNXVbfi/2pHm822aJ5iI9BMzNXxeYCmZDRD99WYwYqUSdjMmmAphXdvxegXd/M5+X7OrzKBaMbCVdFLUUh6DhweJBjEVv5f2wwjM9XzcnOf+EPbtG9DMBmADjFDc2w/rljwvFw==",
            )
            .unwrap();
        let key = DNSKEY::new(256, 3, 5, public_key);
        assert_eq!(key.key_tag(), 60485);

        let digest = compute_ds_digest(&name("dskey.example.com"), &key, DS::DIGEST_SHA1).unwrap();
        assert_eq!(
            HEXUPPER.encode(&digest),
            "2BB183AF5F22588179A53B0A98631FAD1A292118"
        );

        let ds = create_ds_from_dnskey(&name("DSKEY.example.com"), &key, DS::DIGEST_SHA1).unwrap();
        assert!(ds_matches_dnskey(&ds, &key, &name("dskey.example.com")));
        assert_eq!(
            compute_ds_digest(&name("dskey.example.com"), &key, 3),
            Err(DnssecError::UnsupportedDigestAlgorithm(3))
        );
    }

    #[test]
    fn test_nsec3_hash_rfc5155_example() {
        // RFC 5155 Appendix A: H(example) with salt aabbccdd, 12 iterations.
        let salt = [0xAA, 0xBB, 0xCC, 0xDD];
        let hash = compute_nsec3_hash(&name("example"), 1, &salt, 12).unwrap();
        assert_eq!(
            data_encoding::BASE32HEX_NOPAD.encode(&hash).to_lowercase(),
            "0p9mhaveqvm6t7vbl5lop2u3t2rp3tom"
        );
        assert!(compute_nsec3_hash(&name("example"), 2, &salt, 0).is_err());
    }

    fn signed_answer(key_tag: u16) -> Vec<ResourceRecord> {
        let owner = name("www.example.com");
        let sig = RRSIG::new(
            RecordType::A,
            13,
            3,
            300,
            2_000,
            1_000,
            key_tag,
            name("example.com"),
            vec![0u8; 64],
        );
        vec![
            ResourceRecord::a(owner.clone(), 300, Ipv4Addr::new(192, 0, 2, 1)),
            ResourceRecord::new(owner, descent_proto::RecordClass::IN, 300, RData::RRSIG(sig)),
        ]
    }

    #[test]
    fn test_key_tag_verifier() {
        let key = DNSKEY::new(DNSKEY::FLAG_ZONE, 3, 13, vec![7u8; 64]);
        let verifier = KeyTagVerifier::at(1_500);

        assert_eq!(
            verifier.verify(&signed_answer(key.key_tag()), std::slice::from_ref(&key)),
            ValidationResult::Secure
        );
        assert!(verifier.verify(&signed_answer(key.key_tag().wrapping_add(1)), &[key.clone()]).is_bogus());
        assert!(KeyTagVerifier::at(3_000).verify(&signed_answer(key.key_tag()), &[key.clone()]).is_bogus());
        assert_eq!(
            verifier.verify(&signed_answer(key.key_tag()), &[]),
            ValidationResult::Indeterminate
        );

        let unsigned = vec![ResourceRecord::a(name("a.example"), 60, Ipv4Addr::LOCALHOST)];
        assert!(verifier.verify(&unsigned, &[key]).is_insecure());
    }

    #[test]
    fn test_missing_rrsig_is_bogus() {
        let key = DNSKEY::new(DNSKEY::FLAG_ZONE, 3, 13, vec![7u8; 64]);
        let mut records = signed_answer(key.key_tag());
        records.push(ResourceRecord::aaaa(
            name("www.example.com"),
            300,
            "2001:db8::1".parse().unwrap(),
        ));
        let result = KeyTagVerifier::at(1_500).verify(&records, &[key]);
        assert_eq!(result.bogus_reason(), Some("missing RRSIG for www.example.com. AAAA"));
    }
}
