//! Interface lifecycle against the interface-control channel: create (with stale-interface recovery), tunnel endpoint and address assignment, destroy.

use std::io;

use crate::address::{AddressFamily, NetworkAddress, NetworkMask};
use crate::control::{ControlRequest, InterfaceName, TunnelEndpoints};
use crate::errors::{ChannelKind, Error};
use crate::kernel::{ControlChannel, Kernel};

fn open<K: Kernel>(kernel: &K, family: AddressFamily) -> Result<K::Control, Error> {
    kernel.open_control(family).map_err(|source| {
        tracing::error!(message_id = "f4KcV9pa", ?source, %family, "failed to open interface control socket");
        Error::ChannelOpenFailed { channel: ChannelKind::Control(family), source }
    })
}

/// Creates `name` and, given endpoints, binds the tunnel's outer addresses to it.
///
/// An interface left over from an earlier run is destroyed and created again. A failed endpoint assignment leaves the new interface in place.
pub fn create_interface<K: Kernel>(kernel: &K, name: &InterfaceName, endpoints: Option<TunnelEndpoints>) -> Result<(), Error> {
    let family = endpoints.map_or(AddressFamily::Inet, |endpoints| endpoints.family());
    let mut channel = open(kernel, family)?;

    create(&mut channel, name).map_err(|source| Error::InterfaceCreateFailed { name: name.to_string(), source })?;
    tracing::info!(message_id = "Zp1sGk7d", %name, "interface created");

    let Some(endpoints) = endpoints else {
        return Ok(());
    };
    channel.submit(&mut ControlRequest::set_tunnel_endpoints(name, endpoints)).map_err(|source| {
        tracing::error!(message_id = "b8TnWq2L", ?source, %name, ?endpoints, "failed to set tunnel endpoints, keeping interface");
        Error::AddressAssignFailed { name: name.to_string(), address: endpoints.local(), source }
    })?;
    tracing::info!(message_id = "rM5yHc0x", %name, local = %endpoints.local(), remote = %endpoints.remote(), "tunnel endpoints set");
    Ok(())
}

fn create(channel: &mut impl ControlChannel, name: &InterfaceName) -> io::Result<()> {
    match channel.submit(&mut ControlRequest::create(name)) {
        Err(error) if error.kind() == io::ErrorKind::AlreadyExists => {
            tracing::warn!(message_id = "K0gzPe6u", %name, "interface already exists, recreating");
            channel.submit(&mut ControlRequest::destroy(name))?;
            channel.submit(&mut ControlRequest::create(name))
        }
        result => result,
    }
}

/// Adds `address`/`mask` to `name`. IPv6 addresses get infinite valid and preferred lifetimes.
pub fn assign_address<K: Kernel>(kernel: &K, name: &InterfaceName, address: NetworkAddress, mask: NetworkMask) -> Result<(), Error> {
    let mut request = ControlRequest::add_address(name, address, mask)?;
    let mut channel = open(kernel, address.family())?;
    channel.submit(&mut request).map_err(|source| {
        tracing::error!(message_id = "Vd3oXy5j", ?source, %name, %address, plen = mask.prefix_len(), "failed to assign address");
        Error::AddressAssignFailed { name: name.to_string(), address, source }
    })?;
    tracing::info!(message_id = "hC7eRt1n", %name, %address, plen = mask.prefix_len(), "address assigned");
    Ok(())
}

/// Destroys `name`. A missing interface is an error; callers are expected to only destroy what they created.
pub fn destroy_interface<K: Kernel>(kernel: &K, name: &InterfaceName) -> Result<(), Error> {
    let mut channel = open(kernel, AddressFamily::Inet)?;
    channel.submit(&mut ControlRequest::destroy(name)).map_err(|source| {
        tracing::error!(message_id = "pW6aNf2z", ?source, %name, "failed to destroy interface");
        Error::InterfaceDeleteFailed { name: name.to_string(), source }
    })?;
    tracing::info!(message_id = "e9QsLm4b", %name, "interface destroyed");
    Ok(())
}
