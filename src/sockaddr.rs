//! Kernel socket-address images (`sockaddr_in`, `sockaddr_in6`) in the BSD layout, which prefixes every address with its own length and family octets.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use bytes::BufMut;
use thiserror::Error;

use crate::address::{AddressFamily, NetworkAddress, NetworkMask};
use crate::errors::Error;

pub const AF_INET: u8 = 2;
// FreeBSD numbering. Images built on other hosts use it too, so tests see the same bytes everywhere.
pub const AF_INET6: u8 = 28;

#[cfg(target_os = "freebsd")]
static_assertions::const_assert_eq!(AF_INET as libc::c_int, libc::AF_INET);
#[cfg(target_os = "freebsd")]
static_assertions::const_assert_eq!(AF_INET6 as libc::c_int, libc::AF_INET6);

pub const SOCKADDR_IN_LEN: usize = 16;
pub const SOCKADDR_IN6_LEN: usize = 28;

impl AddressFamily {
    pub const fn sa_family(self) -> u8 {
        match self {
            Self::Inet => AF_INET,
            Self::Inet6 => AF_INET6,
        }
    }

    pub const fn sockaddr_len(self) -> usize {
        match self {
            Self::Inet => SOCKADDR_IN_LEN,
            Self::Inet6 => SOCKADDR_IN6_LEN,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SockAddr {
    Inet { addr: Ipv4Addr, port: u16 },
    Inet6 { addr: Ipv6Addr, port: u16, flowinfo: u32, scope_id: u32 },
    /// Any family this crate does not interpret. `data` is everything after the length and family octets.
    Other { family: u8, data: Vec<u8> },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SockAddrParseError {
    #[error("socket address image is shorter than its header")]
    MissingHeader,
    #[error("socket address image declares {declared} bytes but only {available} are available")]
    Truncated { declared: usize, available: usize },
    #[error("socket address of family {family} declares {declared} bytes, expected {expected}")]
    BadLength { family: u8, declared: usize, expected: usize },
}

impl SockAddr {
    pub fn from_address(address: NetworkAddress) -> Self {
        match address {
            NetworkAddress::V4(addr) => Self::Inet { addr, port: 0 },
            NetworkAddress::V6(addr) => Self::Inet6 { addr, port: 0, flowinfo: 0, scope_id: 0 },
        }
    }

    /// Masks travel in the full-size image of their family.
    pub fn from_mask(mask: &NetworkMask) -> Self {
        Self::from_address(mask.to_address())
    }

    pub fn from_socket_addr(socket_addr: SocketAddr) -> Self {
        match socket_addr {
            SocketAddr::V4(v4) => Self::Inet { addr: *v4.ip(), port: v4.port() },
            SocketAddr::V6(v6) => Self::Inet6 { addr: *v6.ip(), port: v6.port(), flowinfo: v6.flowinfo(), scope_id: v6.scope_id() },
        }
    }

    pub fn family(&self) -> u8 {
        match self {
            Self::Inet { .. } => AF_INET,
            Self::Inet6 { .. } => AF_INET6,
            Self::Other { family, .. } => *family,
        }
    }

    /// Value of the leading `sa_len` octet, i.e. the unpadded image size.
    pub fn sa_len(&self) -> usize {
        match self {
            Self::Inet { .. } => SOCKADDR_IN_LEN,
            Self::Inet6 { .. } => SOCKADDR_IN6_LEN,
            Self::Other { data, .. } => 2 + data.len(),
        }
    }

    pub fn to_address(&self) -> Option<NetworkAddress> {
        match self {
            Self::Inet { addr, .. } => Some(NetworkAddress::V4(*addr)),
            Self::Inet6 { addr, .. } => Some(NetworkAddress::V6(*addr)),
            Self::Other { .. } => None,
        }
    }

    pub fn to_text(&self) -> Result<String, Error> {
        self.to_address().map(|address| address.to_string()).ok_or(Error::UnsupportedFamily { family: self.family() })
    }

    /// Transport port in host order, 0 for families without one.
    pub fn port(&self) -> u16 {
        match self {
            Self::Inet { port, .. } | Self::Inet6 { port, .. } => *port,
            Self::Other { .. } => 0,
        }
    }

    pub fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.sa_len() as u8);
        buf.put_u8(self.family());
        match self {
            Self::Inet { addr, port } => {
                buf.put_u16(*port);
                buf.put_slice(&addr.octets());
                buf.put_bytes(0, 8);
            }
            Self::Inet6 { addr, port, flowinfo, scope_id } => {
                buf.put_u16(*port);
                buf.put_u32(*flowinfo);
                buf.put_slice(&addr.octets());
                buf.put_u32_ne(*scope_id);
            }
            Self::Other { data, .. } => buf.put_slice(data),
        }
    }

    /// Parses one image from the start of `bytes`. Trailing bytes (e.g. alignment padding) are ignored. An IPv4 or IPv6 image shorter than its full size is zero-filled, as the kernel trims trailing zero octets.
    pub fn parse(bytes: &[u8]) -> Result<Self, SockAddrParseError> {
        let [declared, family, ..] = *bytes else {
            return Err(SockAddrParseError::MissingHeader);
        };
        let declared = usize::from(declared);
        if declared < 2 {
            return Err(SockAddrParseError::MissingHeader);
        }
        let image = bytes.get(..declared).ok_or(SockAddrParseError::Truncated { declared, available: bytes.len() })?;
        match family {
            AF_INET => {
                let image = zero_filled(image, family, SOCKADDR_IN_LEN)?;
                let port = u16::from_be_bytes([image[2], image[3]]);
                let addr = Ipv4Addr::new(image[4], image[5], image[6], image[7]);
                Ok(Self::Inet { addr, port })
            }
            AF_INET6 => {
                let image = zero_filled(image, family, SOCKADDR_IN6_LEN)?;
                let port = u16::from_be_bytes([image[2], image[3]]);
                let flowinfo = u32::from_be_bytes([image[4], image[5], image[6], image[7]]);
                let mut octets = [0u8; 16];
                octets.copy_from_slice(&image[8..24]);
                let scope_id = u32::from_ne_bytes([image[24], image[25], image[26], image[27]]);
                Ok(Self::Inet6 { addr: Ipv6Addr::from(octets), port, flowinfo, scope_id })
            }
            family => Ok(Self::Other { family, data: image[2..].to_vec() }),
        }
    }

    /// Parses a netmask image of a known family, e.g. the `RTA_NETMASK` slot of a routing message.
    ///
    /// The kernel leaves the family octet of masks unset and trims them after their last non-zero octet, so only `sa_len` is trusted. An empty image or one with `sa_len` 0 is the zero-length mask.
    pub fn parse_mask(bytes: &[u8], family: AddressFamily) -> Result<NetworkMask, SockAddrParseError> {
        let mut octets = [0u8; 16];
        let declared = usize::from(bytes.first().copied().unwrap_or(0));
        if declared == 0 {
            return Ok(NetworkMask::from_octets(family, octets));
        }
        let expected = family.sockaddr_len();
        if declared > expected {
            return Err(SockAddrParseError::BadLength { family: family.sa_family(), declared, expected });
        }
        let image = bytes.get(..declared).ok_or(SockAddrParseError::Truncated { declared, available: bytes.len() })?;
        let offset = match family {
            AddressFamily::Inet => 4,
            AddressFamily::Inet6 => 8,
        };
        let end = declared.min(offset + family.width_bytes());
        if end > offset {
            octets[..end - offset].copy_from_slice(&image[offset..end]);
        }
        Ok(NetworkMask::from_octets(family, octets))
    }
}

fn zero_filled(image: &[u8], family: u8, expected: usize) -> Result<[u8; SOCKADDR_IN6_LEN], SockAddrParseError> {
    if image.len() > expected {
        return Err(SockAddrParseError::BadLength { family, declared: image.len(), expected });
    }
    let mut full = [0u8; SOCKADDR_IN6_LEN];
    full[..image.len()].copy_from_slice(image);
    Ok(full)
}
