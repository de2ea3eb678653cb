//! IPv4 address and subnet arithmetic.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex_lite::Regex;
use serde::Serialize;

use crate::bits::mask;
use crate::error::{Result, ToolboxError};

static DOTTED_QUAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,3})\.(\d{1,3})\.(\d{1,3})\.(\d{1,3})$").unwrap()
});

/// RFC 1918 private address ranges.
pub const PRIVATE_SUBNETS: [&str; 3] = ["10.0.0.0/8", "172.16.0.0/12", "192.168.0.0/16"];

/// Returns true if `addr` is a well-formed dotted-quad IPv4 address.
pub fn is_valid(addr: &str) -> bool {
    addr.parse::<Address>().is_ok()
}

/// An IPv4 address stored as its 32-bit integer value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(u32);

impl Address {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    /// The address as an integer.
    pub fn value(self) -> u32 {
        self.0
    }

    /// The four octets, most significant first.
    pub fn octets(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    /// Whether the address falls in one of the [`PRIVATE_SUBNETS`].
    pub fn is_private(self) -> bool {
        PRIVATE_SUBNETS.iter().any(|cidr| {
            cidr.parse::<Ipv4Network>()
                .map(|net| net.contains(self))
                .unwrap_or(false)
        })
    }
}

impl From<u32> for Address {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Address {
    type Error = ToolboxError;

    fn try_from(value: u64) -> Result<Self> {
        u32::try_from(value)
            .map(Address)
            .map_err(|_| ToolboxError::InvalidInput(format!("Invalid IPv4 integer {}", value)))
    }
}

impl FromStr for Address {
    type Err = ToolboxError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ToolboxError::InvalidInput(format!("Invalid IPv4 string '{}'", s));
        let caps = DOTTED_QUAD.captures(s).ok_or_else(invalid)?;

        let mut value = 0u32;
        for i in 1..=4 {
            let octet: u8 = caps[i].parse().map_err(|_| invalid())?;
            value = (value << 8) | octet as u32;
        }
        Ok(Address(value))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.octets();
        write!(f, "{}.{}.{}.{}", a, b, c, d)
    }
}

impl std::ops::BitAnd for Address {
    type Output = Address;

    fn bitand(self, rhs: Self) -> Self::Output {
        Address(self.0 & rhs.0)
    }
}

impl std::ops::BitOr for Address {
    type Output = Address;

    fn bitor(self, rhs: Self) -> Self::Output {
        Address(self.0 | rhs.0)
    }
}

/// A contiguous subnet mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subnet {
    prefix: u8,
}

impl Subnet {
    /// Build a mask from a prefix length in 0..=32.
    pub fn from_cidr(prefix: u32) -> Result<Self> {
        if prefix > 32 {
            return Err(ToolboxError::InvalidInput(format!(
                "Invalid IPv4 CIDR '{}' must be between 0 and 32",
                prefix
            )));
        }
        Ok(Self {
            prefix: prefix as u8,
        })
    }

    pub fn prefix(self) -> u8 {
        self.prefix
    }

    /// The netmask, e.g. `255.255.255.0` for /24.
    pub fn mask(self) -> Address {
        let host_bits = 32 - self.prefix as u32;
        Address((mask(32) as u32) ^ (mask(host_bits) as u32))
    }

    /// The inverted netmask, e.g. `0.0.0.255` for /24.
    pub fn wildcard(self) -> Address {
        Address(mask(32 - self.prefix as u32) as u32)
    }

    pub fn network_address(self, addr: Address) -> Address {
        addr & self.mask()
    }

    pub fn broadcast_address(self, addr: Address) -> Address {
        self.network_address(addr) | self.wildcard()
    }
}

/// An address together with the subnet it lives in (`a.b.c.d/p`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Network {
    pub address: Address,
    pub subnet: Subnet,
}

impl Ipv4Network {
    pub fn new(address: Address, prefix: u32) -> Result<Self> {
        Ok(Self {
            address,
            subnet: Subnet::from_cidr(prefix)?,
        })
    }

    pub fn network_address(&self) -> Address {
        self.subnet.network_address(self.address)
    }

    pub fn broadcast_address(&self) -> Address {
        self.subnet.broadcast_address(self.address)
    }

    /// True if `addr` shares this network's network address.
    pub fn contains(&self, addr: Address) -> bool {
        self.subnet.network_address(addr) == self.network_address()
    }

    /// Number of assignable host addresses. /31 links have two, a /32 has one.
    pub fn usable_addresses(&self) -> u32 {
        match self.subnet.prefix() {
            32 => 1,
            31 => 2,
            p => (mask(32 - p as u32) as u32) - 1,
        }
    }

    pub fn first_usable(&self) -> Address {
        match self.subnet.prefix() {
            32 => self.address,
            31 => self.network_address(),
            _ => Address(self.network_address().0 + 1),
        }
    }

    pub fn last_usable(&self) -> Address {
        match self.subnet.prefix() {
            32 => self.address,
            31 => self.broadcast_address(),
            _ => Address(self.broadcast_address().0 - 1),
        }
    }

    /// Flatten the derived values into a serializable summary.
    pub fn summary(&self) -> NetworkSummary {
        NetworkSummary {
            address: self.address.to_string(),
            subnet_mask: self.subnet.mask().to_string(),
            network: self.network_address().to_string(),
            broadcast: self.broadcast_address().to_string(),
            usable_addresses: self.usable_addresses(),
            wildcard_mask: self.subnet.wildcard().to_string(),
            first_usable: self.first_usable().to_string(),
            last_usable: self.last_usable().to_string(),
            private: self.address.is_private(),
        }
    }
}

impl FromStr for Ipv4Network {
    type Err = ToolboxError;

    fn from_str(s: &str) -> Result<Self> {
        let (addr, prefix) = s.split_once('/').ok_or_else(|| {
            ToolboxError::InvalidInput("Address must be in CIDR notation 0.0.0.0/0".to_string())
        })?;
        let prefix: u32 = prefix.trim().parse().map_err(|_| {
            ToolboxError::InvalidInput(format!(
                "Invalid IPv4 CIDR '{}' must be between 0 and 32",
                prefix
            ))
        })?;
        Ipv4Network::new(addr.trim().parse()?, prefix)
    }
}

impl fmt::Display for Ipv4Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.subnet.prefix())
    }
}

/// Derived values for an [`Ipv4Network`], in display order.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NetworkSummary {
    pub address: String,
    pub subnet_mask: String,
    pub network: String,
    pub broadcast: String,
    pub usable_addresses: u32,
    pub wildcard_mask: String,
    pub first_usable: String,
    pub last_usable: String,
    pub private: bool,
}

/// A single summary value, used for table rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryValue {
    Text(String),
    Count(u32),
    Flag(bool),
}

impl NetworkSummary {
    /// Key/value pairs in field order, keys as they appear in JSON.
    pub fn entries(&self) -> Vec<(&'static str, SummaryValue)> {
        vec![
            ("address", SummaryValue::Text(self.address.clone())),
            ("subnet_mask", SummaryValue::Text(self.subnet_mask.clone())),
            ("network", SummaryValue::Text(self.network.clone())),
            ("broadcast", SummaryValue::Text(self.broadcast.clone())),
            ("usable_addresses", SummaryValue::Count(self.usable_addresses)),
            ("wildcard_mask", SummaryValue::Text(self.wildcard_mask.clone())),
            ("first_usable", SummaryValue::Text(self.first_usable.clone())),
            ("last_usable", SummaryValue::Text(self.last_usable.clone())),
            ("private", SummaryValue::Flag(self.private)),
        ]
    }
}

/// Parse `a.b.c.d/p` and summarize it.
pub fn describe(cidr: &str) -> Result<NetworkSummary> {
    let network: Ipv4Network = cidr.parse()?;
    log::debug!("Parsed IPv4 network; network={}", network);
    Ok(network.summary())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv4_address_validity() {
        assert!(is_valid("255.255.255.255"));
        assert!(is_valid("0.0.0.0"));
        assert!(is_valid("192.168.1.1"));
        assert!(is_valid("10.0.0.1"));
        assert!(is_valid("172.16.0.1"));

        assert!(!is_valid("255.255.255.255.255"));
        assert!(!is_valid("255.255.255"));
        assert!(!is_valid("1.1.1.-1"));
        assert!(!is_valid("-1.1.1.1"));
        assert!(!is_valid("256.1.1.1"));
        assert!(!is_valid("1.1.1.1000"));
        assert!(!is_valid(""));
    }

    #[test]
    fn test_ipv4_address_integer() {
        assert_eq!("0.0.0.0".parse::<Address>().unwrap().value(), 0);
        assert_eq!(
            "255.255.255.255".parse::<Address>().unwrap().value() as u64,
            mask(32)
        );
        assert!(Address::try_from(1u64 << 32).is_err());
        assert_eq!(Address::try_from(16_909_060u64).unwrap().to_string(), "1.2.3.4");
    }

    #[test]
    fn test_ipv4_address_string() {
        assert_eq!("1.1.1.1".parse::<Address>().unwrap().to_string(), "1.1.1.1");
        assert_eq!(Address::new(0xC0A8_0001).octets(), [192, 168, 0, 1]);
    }

    #[test]
    fn test_ipv4_network_config() {
        let net: Ipv4Network = "192.168.0.1/24".parse().unwrap();
        assert_eq!(net.network_address().to_string(), "192.168.0.0");
        assert_eq!(net.broadcast_address().to_string(), "192.168.0.255");
        assert_eq!(net.usable_addresses(), 254);
        assert!(net.contains("192.168.0.123".parse().unwrap()));
        assert!(!net.contains("192.168.1.1".parse().unwrap()));
    }

    #[test]
    fn test_subnet_masks() {
        assert_eq!(Subnet::from_cidr(0).unwrap().mask().to_string(), "0.0.0.0");
        assert_eq!(Subnet::from_cidr(8).unwrap().mask().to_string(), "255.0.0.0");
        assert_eq!(Subnet::from_cidr(20).unwrap().mask().to_string(), "255.255.240.0");
        assert_eq!(Subnet::from_cidr(32).unwrap().mask().to_string(), "255.255.255.255");
        assert_eq!(Subnet::from_cidr(20).unwrap().wildcard().to_string(), "0.0.15.255");
        assert!(Subnet::from_cidr(33).is_err());
    }

    #[test]
    fn test_edge_prefixes() {
        let host: Ipv4Network = "10.1.2.3/32".parse().unwrap();
        assert_eq!(host.usable_addresses(), 1);
        assert_eq!(host.first_usable(), host.address);
        assert_eq!(host.last_usable(), host.address);

        let link: Ipv4Network = "10.1.2.3/31".parse().unwrap();
        assert_eq!(link.usable_addresses(), 2);
        assert_eq!(link.first_usable().to_string(), "10.1.2.2");
        assert_eq!(link.last_usable().to_string(), "10.1.2.3");

        let all: Ipv4Network = "8.8.8.8/0".parse().unwrap();
        assert_eq!(all.usable_addresses(), u32::MAX - 1);
        assert_eq!(all.network_address().to_string(), "0.0.0.0");
        assert_eq!(all.broadcast_address().to_string(), "255.255.255.255");
    }

    #[test]
    fn test_network_parse_errors() {
        let err = "192.168.0.1".parse::<Ipv4Network>().unwrap_err();
        assert!(err.to_string().contains("CIDR notation"));
        let err = "192.168.0.1/40".parse::<Ipv4Network>().unwrap_err();
        assert!(err.to_string().contains("between 0 and 32"));
        assert!("192.168.0.1/abc".parse::<Ipv4Network>().is_err());
        assert!("999.168.0.1/24".parse::<Ipv4Network>().is_err());
    }

    #[test]
    fn test_private_ranges() {
        assert!("10.20.30.40".parse::<Address>().unwrap().is_private());
        assert!("172.31.255.1".parse::<Address>().unwrap().is_private());
        assert!(!"172.32.0.1".parse::<Address>().unwrap().is_private());
        assert!("192.168.5.5".parse::<Address>().unwrap().is_private());
        assert!(!"8.8.8.8".parse::<Address>().unwrap().is_private());
    }

    #[test]
    fn test_summary_json_key_order() {
        let summary = describe("172.16.5.4/20").unwrap();
        assert_eq!(summary.network, "172.16.0.0");
        assert_eq!(summary.broadcast, "172.16.15.255");
        assert_eq!(summary.first_usable, "172.16.0.1");
        assert_eq!(summary.last_usable, "172.16.15.254");
        assert_eq!(summary.usable_addresses, 4094);
        assert!(summary.private);

        let json = serde_json::to_string(&summary).unwrap();
        let address_pos = json.find("\"address\"").unwrap();
        let private_pos = json.find("\"private\"").unwrap();
        assert!(address_pos < private_pos);

        let keys: Vec<_> = summary.entries().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys.first(), Some(&"address"));
        assert_eq!(keys.last(), Some(&"private"));
    }
}
