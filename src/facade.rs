use crate::address::{NetworkAddress, NetworkMask};
use crate::control::{InterfaceKind, InterfaceName, TunnelEndpoints};
use crate::errors::Error;
use crate::interface;
use crate::kernel::{Kernel, SystemKernel};
use crate::route::{self, RouteEntry};

/// Entry point for configuring tunnel interfaces, their addresses and routes from textual input.
///
/// Every operation validates all of its input before touching the kernel, opens its own short-lived channel and reports at most one error. There is no rollback: an interface whose endpoint assignment failed stays in place and can be recreated or destroyed by name.
#[derive(Debug, Default)]
pub struct NetConfig<K = SystemKernel> {
    kernel: K,
}

impl NetConfig<SystemKernel> {
    pub fn system() -> Self {
        Self::new(SystemKernel)
    }
}

impl<K: Kernel> NetConfig<K> {
    pub fn new(kernel: K) -> Self {
        Self { kernel }
    }

    /// Creates `name`, replacing a stale interface of the same name. Point-to-point tunnels also get the `local`/`remote` endpoint pair; interfaces whose name contains `tun` ignore both.
    pub fn create_interface(&self, name: &str, local: &str, remote: &str) -> Result<(), Error> {
        let name = InterfaceName::new(name)?;
        let endpoints = match name.kind() {
            InterfaceKind::NoPeerTunnel => {
                tracing::debug!(message_id = "Lx8cTj3w", %name, "no endpoint pair for this interface kind");
                None
            }
            InterfaceKind::PointToPoint => Some(TunnelEndpoints::from_text(local, remote)?),
        };
        interface::create_interface(&self.kernel, &name, endpoints)
    }

    pub fn create_address(&self, name: &str, address: &str, plen: u8) -> Result<(), Error> {
        let name = InterfaceName::new(name)?;
        let address = NetworkAddress::from_text(address)?;
        let mask = NetworkMask::from_prefix_len(address.family(), plen)?;
        interface::assign_address(&self.kernel, &name, address, mask)
    }

    pub fn delete_interface(&self, name: &str) -> Result<(), Error> {
        let name = InterfaceName::new(name)?;
        interface::destroy_interface(&self.kernel, &name)
    }

    /// Routes `destination`/`plen` via `next_hop`. Succeeds if the route already exists.
    pub fn create_route(&self, destination: &str, plen: u8, next_hop: &str) -> Result<(), Error> {
        route::add_route(&self.kernel, route_entry(destination, plen, next_hop)?)
    }

    /// Removes the route to `destination`/`plen` via `next_hop`. Succeeds if there is no such route.
    pub fn delete_route(&self, destination: &str, plen: u8, next_hop: &str) -> Result<(), Error> {
        route::delete_route(&self.kernel, route_entry(destination, plen, next_hop)?)
    }
}

fn route_entry(destination: &str, plen: u8, next_hop: &str) -> Result<RouteEntry, Error> {
    let destination = NetworkAddress::from_text(destination)?;
    let mask = NetworkMask::from_prefix_len(destination.family(), plen)?;
    let gateway = NetworkAddress::from_text(next_hop)?;
    RouteEntry::new(destination, mask, gateway)
}
