//! Cache key implementation.

use descent_proto::{Name, Question, RecordClass, RecordType};
use std::fmt;

/// Cache key for an RRset: owner name, type and class.
///
/// The name is stored lowercased so keys hash identically regardless of
/// the case a server happened to use.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    name: Name,
    rtype: RecordType,
    rclass: RecordClass,
}

impl CacheKey {
    /// Creates a new cache key.
    pub fn new(name: &Name, rtype: RecordType, rclass: RecordClass) -> Self {
        Self {
            name: name.to_lowercase(),
            rtype,
            rclass,
        }
    }

    /// Creates a cache key from a question.
    pub fn from_question(question: &Question) -> Self {
        Self::new(&question.qname, question.qtype, question.qclass)
    }

    /// Returns the domain name.
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Returns the record type.
    pub fn rtype(&self) -> RecordType {
        self.rtype
    }

    /// Returns the record class.
    pub fn rclass(&self) -> RecordClass {
        self.rclass
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.rclass, self.rtype)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    use std::str::FromStr;

    #[test]
    fn test_cache_key_case_insensitive() {
        let key1 = CacheKey::new(
            &Name::from_str("example.com").unwrap(),
            RecordType::A,
            RecordClass::IN,
        );
        let key2 = CacheKey::new(
            &Name::from_str("EXAMPLE.COM").unwrap(),
            RecordType::A,
            RecordClass::IN,
        );
        assert_eq!(key1, key2);

        let mut h1 = DefaultHasher::new();
        let mut h2 = DefaultHasher::new();
        key1.hash(&mut h1);
        key2.hash(&mut h2);
        assert_eq!(h1.finish(), h2.finish());
    }

    #[test]
    fn test_cache_key_type_distinct() {
        let name = Name::from_str("example.com").unwrap();
        assert_ne!(
            CacheKey::new(&name, RecordType::A, RecordClass::IN),
            CacheKey::new(&name, RecordType::AAAA, RecordClass::IN)
        );
    }
}
