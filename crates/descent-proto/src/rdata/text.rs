//! Text record (TXT).

use crate::error::{Error, Result};
use crate::wire::WireReader;
use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length of a single character-string.
const MAX_STRING_LENGTH: usize = 255;

/// TXT record - one or more character-strings (RFC 1035).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TXT {
    strings: Vec<Vec<u8>>,
}

impl TXT {
    /// Creates a TXT record from its character-strings.
    ///
    /// # Errors
    ///
    /// Returns an error if the record is empty or any string exceeds 255 bytes.
    pub fn new(strings: Vec<Vec<u8>>) -> Result<Self> {
        if strings.is_empty() {
            return Err(Error::invalid_rdata("TXT", "at least one string is required"));
        }
        if let Some(long) = strings.iter().find(|s| s.len() > MAX_STRING_LENGTH) {
            return Err(Error::invalid_rdata(
                "TXT",
                format!("string of {} bytes exceeds {MAX_STRING_LENGTH}", long.len()),
            ));
        }
        Ok(Self { strings })
    }

    /// Creates a TXT record from a single text value, splitting it into
    /// 255-byte chunks.
    pub fn from_text(text: &str) -> Self {
        let bytes = text.as_bytes();
        let strings = if bytes.is_empty() {
            vec![Vec::new()]
        } else {
            bytes
                .chunks(MAX_STRING_LENGTH)
                .map(<[u8]>::to_vec)
                .collect()
        };
        Self { strings }
    }

    /// Returns the character-strings.
    #[inline]
    pub fn strings(&self) -> &[Vec<u8>] {
        &self.strings
    }

    /// Returns the strings concatenated, lossily decoded as UTF-8.
    pub fn text(&self) -> String {
        let joined: Vec<u8> = self.strings.concat();
        String::from_utf8_lossy(&joined).into_owned()
    }

    /// Parses a TXT record. Consumes the reader to its end.
    pub fn parse(reader: &mut WireReader<'_>) -> Result<Self> {
        let mut strings = Vec::new();
        while !reader.is_empty() {
            strings.push(reader.read_character_string()?.to_vec());
        }
        if strings.is_empty() {
            return Err(Error::invalid_rdata("TXT", "empty RDATA"));
        }
        Ok(Self { strings })
    }

    /// Writes the TXT record to wire format.
    pub fn write_to(&self, buf: &mut BytesMut) {
        for s in &self.strings {
            buf.put_u8(s.len() as u8);
            buf.extend_from_slice(s);
        }
    }
}

impl fmt::Display for TXT {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, s) in self.strings.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str("\"")?;
            for &b in s {
                match b {
                    b'"' | b'\\' => write!(f, "\\{}", b as char)?,
                    0x20..=0x7e => write!(f, "{}", b as char)?,
                    _ => write!(f, "\\{b:03}")?,
                }
            }
            f.write_str("\"")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_txt_multiple_strings() {
        let txt = TXT::new(vec![b"v=spf1".to_vec(), b"-all".to_vec()]).unwrap();
        let mut buf = BytesMut::new();
        txt.write_to(&mut buf);
        assert_eq!(buf.len(), 1 + 6 + 1 + 4);

        let parsed = TXT::parse(&mut WireReader::new(&buf)).unwrap();
        assert_eq!(parsed.strings().len(), 2);
        assert_eq!(parsed.text(), "v=spf1-all");
    }

    #[test]
    fn test_txt_rejects_long_string() {
        assert!(TXT::new(vec![vec![b'x'; 256]]).is_err());
        assert!(TXT::new(Vec::new()).is_err());
    }

    #[test]
    fn test_txt_from_text_chunks() {
        let long = "a".repeat(300);
        let txt = TXT::from_text(&long);
        assert_eq!(txt.strings().len(), 2);
        assert_eq!(txt.strings()[0].len(), 255);
        assert_eq!(txt.text(), long);
    }

    #[test]
    fn test_txt_display_escapes() {
        let txt = TXT::new(vec![b"say \"hi\"".to_vec(), vec![0x07]]).unwrap();
        assert_eq!(txt.to_string(), r#""say \"hi\"" "\007""#);
    }

    #[test]
    fn test_txt_truncated_string() {
        let data = [5, b'a', b'b'];
        assert!(TXT::parse(&mut WireReader::new(&data)).is_err());
    }
}
