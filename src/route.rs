//! Routing-socket messages (`rt_msghdr` followed by word-aligned socket addresses) and their transmission.

use std::io;
use std::process;

use bytes::Bytes;

use crate::address::{AddressFamily, NetworkAddress, NetworkMask};
use crate::errors::{ChannelKind, Error};
use crate::kernel::{Kernel, RoutingChannel};
use crate::sockaddr::SockAddr;
use crate::wire::{WORD, WireBuilder, align_word};

pub const RTM_VERSION: u8 = 5;
pub const RTM_ADD: u8 = 0x1;
pub const RTM_DELETE: u8 = 0x2;

pub const RTF_UP: i32 = 0x1;
pub const RTF_GATEWAY: i32 = 0x2;

pub const RTA_DST: i32 = 0x1;
pub const RTA_GATEWAY: i32 = 0x2;
pub const RTA_NETMASK: i32 = 0x4;

// Fourteen `u_long`s.
const RT_METRICS_LEN: usize = 14 * WORD;
// msglen, version, type, index, spare, then six `int`s, then `u_long inits`.
pub const RT_MSGHDR_LEN: usize = 8 + 6 * 4 + WORD + RT_METRICS_LEN;

#[cfg(target_pointer_width = "64")]
static_assertions::const_assert_eq!(RT_MSGHDR_LEN, 152);

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum RouteOp {
    Add,
    Delete,
}

impl RouteOp {
    pub const fn rtm_type(self) -> u8 {
        match self {
            Self::Add => RTM_ADD,
            Self::Delete => RTM_DELETE,
        }
    }

    /// Kernel answer that already means the requested end state holds.
    fn settled_errno(self) -> i32 {
        match self {
            Self::Add => libc::EEXIST,
            Self::Delete => libc::ESRCH,
        }
    }
}

/// Destination prefix reached through a gateway. Only IPv6 routes can be expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteEntry {
    destination: NetworkAddress,
    mask: NetworkMask,
    gateway: NetworkAddress,
}

impl RouteEntry {
    pub fn new(destination: NetworkAddress, mask: NetworkMask, gateway: NetworkAddress) -> Result<Self, Error> {
        for family in [destination.family(), mask.family(), gateway.family()] {
            if family != AddressFamily::Inet6 {
                return Err(Error::UnsupportedFamily { family: family.sa_family() });
            }
        }
        Ok(Self { destination, mask, gateway })
    }

    pub fn destination(&self) -> NetworkAddress {
        self.destination
    }

    pub fn mask(&self) -> NetworkMask {
        self.mask
    }

    pub fn gateway(&self) -> NetworkAddress {
        self.gateway
    }

    pub fn prefix_len(&self) -> u8 {
        self.mask.prefix_len()
    }
}

/// Complete wire image of one routing-socket request.
#[derive(Debug, Clone)]
pub struct RouteMessage {
    op: RouteOp,
    entry: RouteEntry,
    bytes: Bytes,
}

impl RouteMessage {
    /// Header, then destination, gateway and netmask in that order, each padded to the native word. The header length field holds the exact total.
    pub fn build(op: RouteOp, entry: RouteEntry, pid: i32) -> Self {
        let addresses = [
            SockAddr::from_address(entry.destination),
            SockAddr::from_address(entry.gateway),
            SockAddr::from_mask(&entry.mask),
        ];
        let capacity = RT_MSGHDR_LEN + addresses.iter().map(|address| align_word(address.sa_len())).sum::<usize>();
        let mut builder = WireBuilder::with_capacity(capacity);

        // rtm_msglen, patched once the addresses are in
        builder.put_u16(0);
        builder.put_u8(RTM_VERSION);
        builder.put_u8(op.rtm_type());
        // rtm_index, _rtm_spare1
        builder.put_u16(0);
        builder.put_u16(0);
        builder.put_i32(RTF_UP | RTF_GATEWAY);
        builder.put_i32(RTA_DST | RTA_GATEWAY | RTA_NETMASK);
        builder.put_i32(pid);
        // rtm_seq, rtm_errno, rtm_fmask
        builder.put_i32(0);
        builder.put_i32(0);
        builder.put_i32(0);
        // rtm_inits
        builder.put_zeroes(WORD);
        builder.put_zeroes(RT_METRICS_LEN);
        debug_assert_eq!(builder.len(), RT_MSGHDR_LEN);

        for address in &addresses {
            builder.put_sockaddr_aligned(address);
        }
        let len = builder.len();
        builder.set_u16(0, len as u16);
        debug_assert_eq!(len, capacity);

        Self { op, entry, bytes: builder.finish().freeze() }
    }

    pub fn op(&self) -> RouteOp {
        self.op
    }

    pub fn entry(&self) -> &RouteEntry {
        &self.entry
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Installs `entry`. An existing identical route counts as success.
pub fn add_route<K: Kernel>(kernel: &K, entry: RouteEntry) -> Result<(), Error> {
    apply(kernel, RouteOp::Add, entry).map_err(|error| match error {
        Failure::Open(source) => Error::ChannelOpenFailed { channel: ChannelKind::Routing, source },
        Failure::Send(source) => Error::RouteAddFailed { destination: entry.destination, plen: entry.prefix_len(), source },
    })
}

/// Removes `entry`. A route that does not exist counts as success.
pub fn delete_route<K: Kernel>(kernel: &K, entry: RouteEntry) -> Result<(), Error> {
    apply(kernel, RouteOp::Delete, entry).map_err(|error| match error {
        Failure::Open(source) => Error::ChannelOpenFailed { channel: ChannelKind::Routing, source },
        Failure::Send(source) => Error::RouteDeleteFailed { destination: entry.destination, plen: entry.prefix_len(), source },
    })
}

enum Failure {
    Open(io::Error),
    Send(io::Error),
}

fn apply<K: Kernel>(kernel: &K, op: RouteOp, entry: RouteEntry) -> Result<(), Failure> {
    let message = RouteMessage::build(op, entry, process::id() as i32);
    let mut channel = kernel.open_routing().map_err(Failure::Open)?;
    match send(&mut channel, &message) {
        Ok(()) => {
            tracing::info!(message_id = "Hq3vW0cT", %op, destination = %entry.destination, plen = entry.prefix_len(), gateway = %entry.gateway, "route updated");
            Ok(())
        }
        Err(error) if error.raw_os_error() == Some(op.settled_errno()) => {
            tracing::info!(message_id = "u7LbQe4m", %op, ?error, destination = %entry.destination, plen = entry.prefix_len(), "route already in requested state");
            Ok(())
        }
        Err(error) => {
            tracing::error!(message_id = "N2xkJr8s", %op, ?error, destination = %entry.destination, plen = entry.prefix_len(), "routing socket rejected message");
            Err(Failure::Send(error))
        }
    }
}

fn send(channel: &mut impl RoutingChannel, message: &RouteMessage) -> io::Result<()> {
    let written = channel.send(message)?;
    if written != message.len() {
        return Err(io::Error::new(io::ErrorKind::WriteZero, format!("routing socket took {written} of {} bytes", message.len())));
    }
    Ok(())
}
