// ── IPv4 network type ──

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An IPv4 network in CIDR form, host bits cleared.
///
/// Serializes as `"10.1.0.0/24"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ipv4Net {
    addr: Ipv4Addr,
    prefix_len: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetParseError {
    #[error("invalid IPv4 address: {0}")]
    Address(String),
    #[error("invalid prefix length: {0}")]
    Prefix(String),
    #[error("non-contiguous netmask: {0}")]
    Mask(Ipv4Addr),
}

impl Ipv4Net {
    /// Network containing `addr` with the given prefix length.
    pub fn new(addr: Ipv4Addr, prefix_len: u8) -> Result<Self, NetParseError> {
        if prefix_len > 32 {
            return Err(NetParseError::Prefix(prefix_len.to_string()));
        }
        let mask = prefix_mask(prefix_len);
        Ok(Self {
            addr: Ipv4Addr::from(u32::from(addr) & mask),
            prefix_len,
        })
    }

    /// Network containing `addr` under a dotted netmask (`255.255.255.0`).
    pub fn from_addr_mask(addr: Ipv4Addr, mask: Ipv4Addr) -> Result<Self, NetParseError> {
        let bits = u32::from(mask);
        let prefix_len = bits.leading_ones();
        if bits.checked_shl(prefix_len).unwrap_or(0) != 0 {
            return Err(NetParseError::Mask(mask));
        }
        // leading_ones() of a u32 is at most 32
        let prefix_len = u8::try_from(prefix_len).map_err(|_| NetParseError::Mask(mask))?;
        Self::new(addr, prefix_len)
    }

    pub fn network(&self) -> Ipv4Addr {
        self.addr
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        u32::from(ip) & prefix_mask(self.prefix_len) == u32::from(self.addr)
    }
}

fn prefix_mask(prefix_len: u8) -> u32 {
    u32::MAX
        .checked_shl(32 - u32::from(prefix_len))
        .unwrap_or(0)
}

impl fmt::Display for Ipv4Net {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix_len)
    }
}

impl FromStr for Ipv4Net {
    type Err = NetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, prefix) = s.trim().split_once('/').unwrap_or((s.trim(), "32"));
        let addr: Ipv4Addr = addr
            .parse()
            .map_err(|_| NetParseError::Address(addr.to_owned()))?;
        let prefix_len: u8 = prefix
            .parse()
            .map_err(|_| NetParseError::Prefix(prefix.to_owned()))?;
        Self::new(addr, prefix_len)
    }
}

impl TryFrom<String> for Ipv4Net {
    type Error = NetParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Ipv4Net> for String {
    fn from(net: Ipv4Net) -> Self {
        net.to_string()
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_form_clears_host_bits() {
        let net = Ipv4Net::from_addr_mask(
            Ipv4Addr::new(10, 1, 2, 77),
            Ipv4Addr::new(255, 255, 255, 0),
        )
        .unwrap();
        assert_eq!(net.to_string(), "10.1.2.0/24");
        assert!(net.contains(Ipv4Addr::new(10, 1, 2, 1)));
        assert!(!net.contains(Ipv4Addr::new(10, 1, 3, 1)));
    }

    #[test]
    fn non_contiguous_mask_is_rejected() {
        let err = Ipv4Net::from_addr_mask(
            Ipv4Addr::new(10, 0, 0, 1),
            Ipv4Addr::new(255, 0, 255, 0),
        );
        assert!(matches!(err, Err(NetParseError::Mask(_))));
    }

    #[test]
    fn zero_and_host_masks() {
        let any = Ipv4Net::from_addr_mask(Ipv4Addr::new(1, 2, 3, 4), Ipv4Addr::UNSPECIFIED).unwrap();
        assert_eq!(any.to_string(), "0.0.0.0/0");

        let host: Ipv4Net = "192.0.2.9".parse().unwrap();
        assert_eq!(host.prefix_len(), 32);
    }

    #[test]
    fn serializes_as_string() {
        let net: Ipv4Net = "172.16.0.0/12".parse().unwrap();
        assert_eq!(serde_json::to_value(net).unwrap(), "172.16.0.0/12");
        let back: Ipv4Net = serde_json::from_value(serde_json::json!("172.16.0.0/12")).unwrap();
        assert_eq!(back, net);
    }
}
