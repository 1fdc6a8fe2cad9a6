use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use crate::errors::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum AddressFamily {
    #[strum(serialize = "IPv4")]
    Inet,
    #[strum(serialize = "IPv6")]
    Inet6,
}

impl AddressFamily {
    pub const fn width_bytes(self) -> usize {
        match self {
            Self::Inet => 4,
            Self::Inet6 => 16,
        }
    }

    pub const fn width_bits(self) -> u8 {
        match self {
            Self::Inet => 32,
            Self::Inet6 => 128,
        }
    }
}

/// Numeric network-layer address. Only ever produced from numeric text or kernel images, never from name resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkAddress {
    V4(Ipv4Addr),
    V6(Ipv6Addr),
}

impl NetworkAddress {
    /// Parses a numeric IPv4 or IPv6 literal. Host names are rejected without any lookup.
    pub fn from_text(text: &str) -> Result<Self, Error> {
        text.parse::<IpAddr>()
            .map(Self::from)
            .map_err(|source| Error::InvalidAddress { text: text.to_owned(), source: Some(source) })
    }

    pub fn family(&self) -> AddressFamily {
        match self {
            Self::V4(_) => AddressFamily::Inet,
            Self::V6(_) => AddressFamily::Inet6,
        }
    }
}

impl FromStr for NetworkAddress {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::from_text(text)
    }
}

impl From<IpAddr> for NetworkAddress {
    fn from(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(ip) => Self::V4(ip),
            IpAddr::V6(ip) => Self::V6(ip),
        }
    }
}

impl From<NetworkAddress> for IpAddr {
    fn from(address: NetworkAddress) -> Self {
        match address {
            NetworkAddress::V4(ip) => IpAddr::V4(ip),
            NetworkAddress::V6(ip) => IpAddr::V6(ip),
        }
    }
}

// Canonical form: dotted quad for IPv4, RFC 5952 compressed form for IPv6.
impl fmt::Display for NetworkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V4(ip) => ip.fmt(f),
            Self::V6(ip) => ip.fmt(f),
        }
    }
}

/// Network mask of one address family. Masks built here are always a contiguous run of one-bits from the most significant bit. Masks taken from kernel images are kept as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NetworkMask {
    family: AddressFamily,
    octets: [u8; 16],
}

impl NetworkMask {
    pub fn from_prefix_len(family: AddressFamily, plen: u8) -> Result<Self, Error> {
        if plen > family.width_bits() {
            return Err(Error::InvalidPrefixLength { family, plen });
        }
        let mut octets = [0u8; 16];
        let mut remaining = plen;
        for octet in &mut octets[..family.width_bytes()] {
            if remaining >= 8 {
                *octet = 0xff;
                remaining -= 8;
                continue;
            }
            if remaining > 0 {
                *octet = 0xff << (8 - remaining);
            }
            break;
        }
        Ok(Self { family, octets })
    }

    /// Takes a mask in address form, e.g. the netmask of a kernel routing entry.
    pub fn from_address(address: NetworkAddress) -> Self {
        let mut octets = [0u8; 16];
        match address {
            NetworkAddress::V4(ip) => octets[..4].copy_from_slice(&ip.octets()),
            NetworkAddress::V6(ip) => octets.copy_from_slice(&ip.octets()),
        }
        Self { family: address.family(), octets }
    }

    /// Takes mask octets as found in a kernel image. Octets past the family's width are ignored.
    pub fn from_octets(family: AddressFamily, octets: [u8; 16]) -> Self {
        let width = family.width_bytes();
        let mut masked = [0u8; 16];
        masked[..width].copy_from_slice(&octets[..width]);
        Self { family, octets: masked }
    }

    /// Counts leading one-bits: whole `0xff` octets, then the leading ones of the first other octet. Bits after that octet are not inspected, so a non-contiguous mask is undercounted rather than rejected.
    pub fn prefix_len(&self) -> u8 {
        let mut plen = 0;
        for &octet in self.octets() {
            if octet == 0xff {
                plen += 8;
                continue;
            }
            plen += octet.leading_ones() as u8;
            break;
        }
        plen
    }

    pub fn family(&self) -> AddressFamily {
        self.family
    }

    pub fn octets(&self) -> &[u8] {
        &self.octets[..self.family.width_bytes()]
    }

    pub fn to_address(&self) -> NetworkAddress {
        match self.family {
            AddressFamily::Inet => {
                let [a, b, c, d, ..] = self.octets;
                NetworkAddress::V4(Ipv4Addr::new(a, b, c, d))
            }
            AddressFamily::Inet6 => NetworkAddress::V6(Ipv6Addr::from(self.octets)),
        }
    }
}

impl fmt::Display for NetworkMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_address().fmt(f)
    }
}
