//! EDNS(0) support (RFC 6891).
//!
//! The OPT pseudo-RR is never exposed as a record: the message codec lifts
//! it out of the additional section into an [`Edns`] value and synthesizes
//! it again on encode.

use crate::error::{Error, Result};
use crate::wire::WireReader;
use bytes::{BufMut, BytesMut};
use data_encoding::HEXLOWER;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::net::IpAddr;

/// NSID option code (RFC 5001).
pub const OPTION_NSID: u16 = 3;
/// Client subnet option code (RFC 7871).
pub const OPTION_CLIENT_SUBNET: u16 = 8;
/// Cookie option code (RFC 7873).
pub const OPTION_COOKIE: u16 = 10;
/// Padding option code (RFC 7830).
pub const OPTION_PADDING: u16 = 12;

/// DO bit in the OPT TTL field.
const DO_BIT: u32 = 0x0000_8000;

/// EDNS option value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdnsOption {
    /// Name server identifier. Empty in queries.
    Nsid(Vec<u8>),

    /// Client subnet information.
    ClientSubnet {
        /// Address family (1 = IPv4, 2 = IPv6).
        family: u16,
        /// Source prefix length.
        source_prefix: u8,
        /// Scope prefix length.
        scope_prefix: u8,
        /// Address truncated to the source prefix.
        address: Vec<u8>,
    },

    /// DNS cookie.
    Cookie {
        /// Client cookie, always 8 bytes.
        client: [u8; 8],
        /// Server cookie, 8 to 32 bytes when present.
        server: Option<Vec<u8>>,
    },

    /// Padding of the given length.
    Padding(u16),

    /// Any other option, kept verbatim.
    Unknown {
        /// Option code.
        code: u16,
        /// Option payload.
        data: Vec<u8>,
    },
}

impl EdnsOption {
    /// Builds a client subnet option for `addr/prefix`.
    pub fn client_subnet(addr: IpAddr, source_prefix: u8) -> Self {
        let (family, octets, max) = match addr {
            IpAddr::V4(v4) => (1, v4.octets().to_vec(), 32),
            IpAddr::V6(v6) => (2, v6.octets().to_vec(), 128),
        };
        let prefix = source_prefix.min(max);
        let len = usize::from(prefix).div_ceil(8);
        let mut address = octets[..len].to_vec();
        if prefix % 8 != 0 {
            if let Some(last) = address.last_mut() {
                *last &= 0xFF << (8 - prefix % 8);
            }
        }
        Self::ClientSubnet {
            family,
            source_prefix: prefix,
            scope_prefix: 0,
            address,
        }
    }

    /// Returns the option code.
    pub fn code(&self) -> u16 {
        match self {
            Self::Nsid(_) => OPTION_NSID,
            Self::ClientSubnet { .. } => OPTION_CLIENT_SUBNET,
            Self::Cookie { .. } => OPTION_COOKIE,
            Self::Padding(_) => OPTION_PADDING,
            Self::Unknown { code, .. } => *code,
        }
    }

    /// Parses one option at the reader's position.
    pub fn parse(reader: &mut WireReader<'_>) -> Result<Self> {
        let code = reader.read_u16()?;
        let length = usize::from(reader.read_u16()?);
        let data = reader
            .read_bytes(length)
            .map_err(|_| Error::invalid_edns_option(code, "option overruns OPT RDATA"))?;

        Ok(match code {
            OPTION_NSID => Self::Nsid(data.to_vec()),
            OPTION_CLIENT_SUBNET => {
                if data.len() < 4 {
                    return Err(Error::invalid_edns_option(code, "client subnet too short"));
                }
                Self::ClientSubnet {
                    family: u16::from_be_bytes([data[0], data[1]]),
                    source_prefix: data[2],
                    scope_prefix: data[3],
                    address: data[4..].to_vec(),
                }
            }
            OPTION_COOKIE => {
                if data.len() != 8 && !(16..=40).contains(&data.len()) {
                    return Err(Error::invalid_edns_option(
                        code,
                        format!("cookie length {} is invalid", data.len()),
                    ));
                }
                let mut client = [0u8; 8];
                client.copy_from_slice(&data[..8]);
                let server = (data.len() > 8).then(|| data[8..].to_vec());
                Self::Cookie { client, server }
            }
            OPTION_PADDING => Self::Padding(length as u16),
            _ => Self::Unknown {
                code,
                data: data.to_vec(),
            },
        })
    }

    /// Writes the option, including its code and length.
    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.put_u16(self.code());
        match self {
            Self::Nsid(data) | Self::Unknown { data, .. } => {
                buf.put_u16(data.len() as u16);
                buf.extend_from_slice(data);
            }
            Self::ClientSubnet {
                family,
                source_prefix,
                scope_prefix,
                address,
            } => {
                buf.put_u16((4 + address.len()) as u16);
                buf.put_u16(*family);
                buf.put_u8(*source_prefix);
                buf.put_u8(*scope_prefix);
                buf.extend_from_slice(address);
            }
            Self::Cookie { client, server } => {
                let server = server.as_deref().unwrap_or_default();
                buf.put_u16((8 + server.len()) as u16);
                buf.extend_from_slice(client);
                buf.extend_from_slice(server);
            }
            Self::Padding(len) => {
                buf.put_u16(*len);
                buf.put_bytes(0, usize::from(*len));
            }
        }
    }
}

impl fmt::Display for EdnsOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nsid(data) => write!(f, "NSID: {}", String::from_utf8_lossy(data)),
            Self::ClientSubnet {
                source_prefix,
                scope_prefix,
                address,
                ..
            } => write!(
                f,
                "CLIENT-SUBNET: {}/{source_prefix}/{scope_prefix}",
                HEXLOWER.encode(address)
            ),
            Self::Cookie { client, server } => {
                write!(f, "COOKIE: {}", HEXLOWER.encode(client))?;
                if let Some(server) = server {
                    write!(f, "{}", HEXLOWER.encode(server))?;
                }
                Ok(())
            }
            Self::Padding(len) => write!(f, "PADDING: {len} bytes"),
            Self::Unknown { code, data } => {
                write!(f, "OPT{code}: {}", HEXLOWER.encode(data))
            }
        }
    }
}

/// EDNS(0) parameters carried by an OPT pseudo-RR.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edns {
    udp_size: u16,
    /// Upper 8 bits of the 12-bit response code.
    extended_rcode: u8,
    version: u8,
    dnssec_ok: bool,
    options: SmallVec<[EdnsOption; 2]>,
}

impl Default for Edns {
    fn default() -> Self {
        Self::new(crate::DEFAULT_EDNS_UDP_SIZE)
    }
}

impl Edns {
    /// Creates EDNS(0) parameters advertising `udp_size`.
    pub fn new(udp_size: u16) -> Self {
        Self {
            udp_size,
            extended_rcode: 0,
            version: 0,
            dnssec_ok: false,
            options: SmallVec::new(),
        }
    }

    /// Sets the DO bit.
    #[must_use]
    pub fn with_dnssec_ok(mut self, dnssec_ok: bool) -> Self {
        self.dnssec_ok = dnssec_ok;
        self
    }

    /// Adds an option.
    #[must_use]
    pub fn with_option(mut self, option: EdnsOption) -> Self {
        self.options.push(option);
        self
    }

    /// Returns the advertised UDP payload size. Values below 512 are
    /// treated as 512.
    #[inline]
    pub fn udp_size(&self) -> u16 {
        self.udp_size.max(crate::MAX_UDP_MESSAGE_SIZE as u16)
    }

    /// Returns the extended RCODE bits.
    #[inline]
    pub const fn extended_rcode(&self) -> u8 {
        self.extended_rcode
    }

    /// Sets the extended RCODE bits.
    pub fn set_extended_rcode(&mut self, rcode: u8) {
        self.extended_rcode = rcode;
    }

    /// Returns the EDNS version.
    #[inline]
    pub const fn version(&self) -> u8 {
        self.version
    }

    /// Returns true if the DO bit is set.
    #[inline]
    pub const fn dnssec_ok(&self) -> bool {
        self.dnssec_ok
    }

    /// Returns the options in wire order.
    pub fn options(&self) -> &[EdnsOption] {
        &self.options
    }

    /// Returns the first option with the given code.
    pub fn option(&self, code: u16) -> Option<&EdnsOption> {
        self.options.iter().find(|o| o.code() == code)
    }

    /// Rebuilds EDNS parameters from the CLASS, TTL and RDATA of an OPT
    /// record.
    pub fn from_opt(class: u16, ttl: u32, rdata: &mut WireReader<'_>) -> Result<Self> {
        let mut options = SmallVec::new();
        while !rdata.is_empty() {
            options.push(EdnsOption::parse(rdata)?);
        }
        Ok(Self {
            udp_size: class,
            extended_rcode: (ttl >> 24) as u8,
            version: (ttl >> 16) as u8,
            dnssec_ok: ttl & DO_BIT != 0,
            options,
        })
    }

    /// Writes a complete OPT record (root owner, type 41). `extended_rcode`
    /// comes from the message so the header and OPT never disagree.
    pub fn write_opt(&self, extended_rcode: u8, buf: &mut BytesMut) {
        buf.put_u8(0);
        buf.put_u16(crate::RecordType::OPT.to_u16());
        buf.put_u16(self.udp_size);
        let mut ttl = u32::from(extended_rcode) << 24 | u32::from(self.version) << 16;
        if self.dnssec_ok {
            ttl |= DO_BIT;
        }
        buf.put_u32(ttl);

        let len_pos = buf.len();
        buf.put_u16(0);
        for option in &self.options {
            option.write_to(buf);
        }
        let rdlength = (buf.len() - len_pos - 2) as u16;
        buf[len_pos..len_pos + 2].copy_from_slice(&rdlength.to_be_bytes());
    }
}

impl fmt::Display for Edns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "; EDNS: version: {}, flags:", self.version)?;
        if self.dnssec_ok {
            f.write_str(" do")?;
        }
        write!(f, "; udp: {}", self.udp_size)?;
        for option in &self.options {
            write!(f, "\n; {option}")?;
        }
        Ok(())
    }
}
