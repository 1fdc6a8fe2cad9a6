//! Fixed-size interface-control request images (`ifreq`, `ifaliasreq`, `in6_aliasreq`) and their ioctl request numbers.

use std::fmt;
use std::mem::size_of;

use bytes::BytesMut;

use crate::address::{AddressFamily, NetworkAddress, NetworkMask};
use crate::errors::Error;
use crate::sockaddr::{SOCKADDR_IN_LEN, SOCKADDR_IN6_LEN, SockAddr};
use crate::wire::WireBuilder;

/// `IFNAMSIZ`, terminator included.
pub const IFNAMSIZ: usize = 16;

pub const ND6_INFINITE_LIFETIME: u32 = u32::MAX;

#[cfg(target_os = "freebsd")]
const TIME_T_LEN: usize = size_of::<libc::time_t>();
#[cfg(not(target_os = "freebsd"))]
const TIME_T_LEN: usize = size_of::<i64>();

const SOCKADDR_LEN: usize = 16;

pub const IFREQ_LEN: usize = IFNAMSIZ + 16;
pub const IFALIASREQ_LEN: usize = IFNAMSIZ + 3 * SOCKADDR_LEN + size_of::<i32>();
pub const IN6_ALIASREQ_LEN: usize = {
    // name, addr, dstaddr, prefixmask, flags
    let before_lifetime = IFNAMSIZ + 3 * SOCKADDR_IN6_LEN + size_of::<i32>();
    // expire, preferred, vltime, pltime
    let lifetime = (2 * TIME_T_LEN + 2 * size_of::<u32>()).next_multiple_of(TIME_T_LEN);
    (before_lifetime.next_multiple_of(TIME_T_LEN) + lifetime + size_of::<i32>()).next_multiple_of(TIME_T_LEN)
};

static_assertions::const_assert!(SOCKADDR_IN_LEN == SOCKADDR_LEN);
#[cfg(target_pointer_width = "64")]
static_assertions::const_assert_eq!(IN6_ALIASREQ_LEN, 136);

pub type IoctlRequest = u64;

const IOCPARM_MASK: IoctlRequest = 0x1fff;
const IOC_OUT: IoctlRequest = 0x4000_0000;
const IOC_IN: IoctlRequest = 0x8000_0000;
const IOC_INOUT: IoctlRequest = IOC_IN | IOC_OUT;

/// BSD `_IOC` encoding. The parameter size is part of the request number, so an image of the wrong size is refused by the kernel instead of being misread.
pub const fn ioc(direction: IoctlRequest, group: u8, num: u8, len: usize) -> IoctlRequest {
    direction | ((len as IoctlRequest & IOCPARM_MASK) << 16) | ((group as IoctlRequest) << 8) | num as IoctlRequest
}

pub const SIOCIFCREATE: IoctlRequest = ioc(IOC_INOUT, b'i', 122, IFREQ_LEN);
pub const SIOCIFDESTROY: IoctlRequest = ioc(IOC_IN, b'i', 121, IFREQ_LEN);
pub const SIOCAIFADDR: IoctlRequest = ioc(IOC_IN, b'i', 43, IFALIASREQ_LEN);
pub const SIOCSIFPHYADDR: IoctlRequest = ioc(IOC_IN, b'i', 70, IFALIASREQ_LEN);
pub const SIOCAIFADDR_IN6: IoctlRequest = ioc(IOC_IN, b'i', 27, IN6_ALIASREQ_LEN);
pub const SIOCSIFPHYADDR_IN6: IoctlRequest = ioc(IOC_IN, b'i', 70, IN6_ALIASREQ_LEN);

/// Operating-system interface name such as `gif0` or `tun3`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InterfaceName(String);

impl InterfaceName {
    pub const MAX_LEN: usize = IFNAMSIZ - 1;

    pub fn new(name: &str) -> Result<Self, Error> {
        let invalid = |reason| Error::InvalidInterfaceName { name: name.to_owned(), reason };
        if name.is_empty() {
            return Err(invalid("empty"));
        }
        if name.len() > Self::MAX_LEN {
            return Err(invalid("longer than 15 bytes"));
        }
        if name.bytes().any(|b| b == 0 || b == b'/' || b.is_ascii_whitespace()) {
            return Err(invalid("contains NUL, '/' or whitespace"));
        }
        Ok(Self(name.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Any name containing `tun` (`tun0`, `stun0`, `mytun`) is a no-peer tunnel.
    pub fn kind(&self) -> InterfaceKind {
        if self.0.contains("tun") { InterfaceKind::NoPeerTunnel } else { InterfaceKind::PointToPoint }
    }
}

impl fmt::Display for InterfaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumIs)]
pub enum InterfaceKind {
    /// Layer-3 tunnel whose peer is reached through a userland file descriptor; it has no kernel-side endpoint pair.
    NoPeerTunnel,
    /// Encapsulating tunnel (`gif`, `gre`, ...) that needs its outer local/remote endpoints.
    PointToPoint,
}

/// Outer local/remote address pair of a point-to-point tunnel. Both ends share one family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TunnelEndpoints {
    local: NetworkAddress,
    remote: NetworkAddress,
}

impl TunnelEndpoints {
    pub fn new(local: NetworkAddress, remote: NetworkAddress) -> Result<Self, Error> {
        if local.family() != remote.family() {
            return Err(Error::AddressFamilyMismatch { local, remote });
        }
        Ok(Self { local, remote })
    }

    pub fn from_text(local: &str, remote: &str) -> Result<Self, Error> {
        Self::new(NetworkAddress::from_text(local)?, NetworkAddress::from_text(remote)?)
    }

    pub fn local(&self) -> NetworkAddress {
        self.local
    }

    pub fn remote(&self) -> NetworkAddress {
        self.remote
    }

    pub fn family(&self) -> AddressFamily {
        self.local.family()
    }
}

/// What a control request asks of the kernel, kept next to its binary image for logging and inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    Create { name: InterfaceName },
    Destroy { name: InterfaceName },
    SetTunnelEndpoints { name: InterfaceName, endpoints: TunnelEndpoints },
    AddAddress { name: InterfaceName, address: NetworkAddress, mask: NetworkMask },
}

impl ControlCommand {
    pub fn name(&self) -> &InterfaceName {
        match self {
            Self::Create { name } | Self::Destroy { name } => name,
            Self::SetTunnelEndpoints { name, .. } | Self::AddAddress { name, .. } => name,
        }
    }
}

/// Binary image of one interface-control ioctl together with its request number.
#[derive(Debug)]
pub struct ControlRequest {
    command: ControlCommand,
    request: IoctlRequest,
    image: BytesMut,
}

impl ControlRequest {
    pub fn create(name: &InterfaceName) -> Self {
        Self { command: ControlCommand::Create { name: name.clone() }, request: SIOCIFCREATE, image: ifreq(name) }
    }

    pub fn destroy(name: &InterfaceName) -> Self {
        Self { command: ControlCommand::Destroy { name: name.clone() }, request: SIOCIFDESTROY, image: ifreq(name) }
    }

    pub fn set_tunnel_endpoints(name: &InterfaceName, endpoints: TunnelEndpoints) -> Self {
        let local = SockAddr::from_address(endpoints.local);
        let remote = SockAddr::from_address(endpoints.remote);
        let (request, image) = match endpoints.family() {
            AddressFamily::Inet => (SIOCSIFPHYADDR, ifaliasreq(name, &local, Some(&remote), None)),
            AddressFamily::Inet6 => (SIOCSIFPHYADDR_IN6, in6_aliasreq(name, &local, Some(&remote), None)),
        };
        Self { command: ControlCommand::SetTunnelEndpoints { name: name.clone(), endpoints }, request, image }
    }

    /// Adds `address` with `mask` to the interface. IPv6 addresses never expire.
    pub fn add_address(name: &InterfaceName, address: NetworkAddress, mask: NetworkMask) -> Result<Self, Error> {
        if mask.family() != address.family() {
            return Err(Error::UnsupportedFamily { family: mask.family().sa_family() });
        }
        let addr = SockAddr::from_address(address);
        let mask_image = SockAddr::from_mask(&mask);
        let (request, image) = match address.family() {
            AddressFamily::Inet => (SIOCAIFADDR, ifaliasreq(name, &addr, None, Some(&mask_image))),
            AddressFamily::Inet6 => (SIOCAIFADDR_IN6, in6_aliasreq(name, &addr, None, Some(&mask_image))),
        };
        Ok(Self { command: ControlCommand::AddAddress { name: name.clone(), address, mask }, request, image })
    }

    pub fn command(&self) -> &ControlCommand {
        &self.command
    }

    pub fn request(&self) -> IoctlRequest {
        self.request
    }

    pub fn image(&self) -> &[u8] {
        &self.image
    }

    /// The kernel may write results back into the image (e.g. the unit number chosen by `SIOCIFCREATE`).
    pub fn image_mut(&mut self) -> &mut [u8] {
        &mut self.image
    }
}

fn ifreq(name: &InterfaceName) -> BytesMut {
    let mut builder = WireBuilder::with_capacity(IFREQ_LEN);
    builder.put_name(name.as_str(), IFNAMSIZ);
    builder.put_zeroes(IFREQ_LEN - IFNAMSIZ);
    builder.finish()
}

// Unused address slots are all-zero, i.e. `sa_len == 0`.
fn put_slot(builder: &mut WireBuilder, sockaddr: Option<&SockAddr>, width: usize) {
    let start = builder.len();
    if let Some(sockaddr) = sockaddr {
        builder.put_sockaddr(sockaddr);
    }
    builder.put_zeroes(start + width - builder.len());
}

fn ifaliasreq(name: &InterfaceName, addr: &SockAddr, peer: Option<&SockAddr>, mask: Option<&SockAddr>) -> BytesMut {
    let mut builder = WireBuilder::with_capacity(IFALIASREQ_LEN);
    builder.put_name(name.as_str(), IFNAMSIZ);
    put_slot(&mut builder, Some(addr), SOCKADDR_LEN);
    put_slot(&mut builder, peer, SOCKADDR_LEN);
    put_slot(&mut builder, mask, SOCKADDR_LEN);
    // ifra_vhid
    builder.put_i32(0);
    debug_assert_eq!(builder.len(), IFALIASREQ_LEN);
    builder.finish()
}

fn in6_aliasreq(name: &InterfaceName, addr: &SockAddr, peer: Option<&SockAddr>, mask: Option<&SockAddr>) -> BytesMut {
    let mut builder = WireBuilder::with_capacity(IN6_ALIASREQ_LEN);
    builder.put_name(name.as_str(), IFNAMSIZ);
    put_slot(&mut builder, Some(addr), SOCKADDR_IN6_LEN);
    put_slot(&mut builder, peer, SOCKADDR_IN6_LEN);
    put_slot(&mut builder, mask, SOCKADDR_IN6_LEN);
    // ifra_flags
    builder.put_i32(0);
    builder.align_to(TIME_T_LEN);
    // ia6t_expire, ia6t_preferred
    builder.put_zeroes(2 * TIME_T_LEN);
    builder.put_u32(ND6_INFINITE_LIFETIME);
    builder.put_u32(ND6_INFINITE_LIFETIME);
    builder.align_to(TIME_T_LEN);
    // ifra_vhid
    builder.put_i32(0);
    builder.align_to(TIME_T_LEN);
    debug_assert_eq!(builder.len(), IN6_ALIASREQ_LEN);
    builder.finish()
}
