//! In-memory kernel with an interface table and a routing table, answering with the errno values a BSD kernel uses.

use std::cell::{RefCell, RefMut};
use std::collections::BTreeSet;
use std::io;
use std::rc::Rc;

use crate::address::{AddressFamily, NetworkAddress, NetworkMask};
use crate::control::{ControlCommand, ControlRequest, IoctlRequest, TunnelEndpoints};
use crate::kernel::{ControlChannel, Kernel, RoutingChannel};
use crate::route::{RouteEntry, RouteMessage, RouteOp};

#[derive(Debug, Clone)]
pub struct ControlRecord {
    pub family: AddressFamily,
    pub command: ControlCommand,
    pub request: IoctlRequest,
    pub image: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct KernelState {
    pub interfaces: BTreeSet<String>,
    pub endpoints: Vec<(String, TunnelEndpoints)>,
    pub addresses: Vec<(String, NetworkAddress, NetworkMask)>,
    pub routes: Vec<RouteEntry>,

    pub control_log: Vec<ControlRecord>,
    pub route_log: Vec<RouteMessage>,
    pub open_channels: usize,
    pub channels_opened: usize,

    pub refuse_open: bool,
    pub fail_destroy: Option<i32>,
    pub fail_endpoints: Option<i32>,
    pub fail_route: Option<i32>,
    pub short_write: bool,
}

impl KernelState {
    pub fn commands(&self) -> Vec<ControlCommand> {
        self.control_log.iter().map(|record| record.command.clone()).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeKernel {
    state: Rc<RefCell<KernelState>>,
}

impl FakeKernel {
    pub fn with_interfaces(names: &[&str]) -> Self {
        let kernel = Self::default();
        kernel.state().interfaces.extend(names.iter().map(|name| name.to_string()));
        kernel
    }

    pub fn state(&self) -> RefMut<'_, KernelState> {
        self.state.borrow_mut()
    }

    fn open(&self, family: AddressFamily) -> io::Result<FakeChannel> {
        let mut state = self.state();
        if state.refuse_open {
            return Err(io::Error::from_raw_os_error(libc::EMFILE));
        }
        state.open_channels += 1;
        state.channels_opened += 1;
        Ok(FakeChannel { family, state: self.state.clone() })
    }
}

#[derive(Debug)]
pub struct FakeChannel {
    family: AddressFamily,
    state: Rc<RefCell<KernelState>>,
}

impl Drop for FakeChannel {
    fn drop(&mut self) {
        self.state.borrow_mut().open_channels -= 1;
    }
}

impl Kernel for FakeKernel {
    type Control = FakeChannel;
    type Routing = FakeChannel;

    fn open_control(&self, family: AddressFamily) -> io::Result<FakeChannel> {
        self.open(family)
    }

    fn open_routing(&self) -> io::Result<FakeChannel> {
        self.open(AddressFamily::Inet6)
    }
}

fn errno<T>(code: i32) -> io::Result<T> {
    Err(io::Error::from_raw_os_error(code))
}

impl ControlChannel for FakeChannel {
    fn submit(&mut self, request: &mut ControlRequest) -> io::Result<()> {
        let mut state = self.state.borrow_mut();
        state.control_log.push(ControlRecord {
            family: self.family,
            command: request.command().clone(),
            request: request.request(),
            image: request.image().to_vec(),
        });
        match request.command() {
            ControlCommand::Create { name } => {
                if !state.interfaces.insert(name.to_string()) {
                    return errno(libc::EEXIST);
                }
            }
            ControlCommand::Destroy { name } => {
                if let Some(code) = state.fail_destroy {
                    return errno(code);
                }
                if !state.interfaces.remove(name.as_str()) {
                    return errno(libc::ENXIO);
                }
                state.endpoints.retain(|(interface, _)| interface != name.as_str());
                state.addresses.retain(|(interface, ..)| interface != name.as_str());
            }
            ControlCommand::SetTunnelEndpoints { name, endpoints } => {
                if let Some(code) = state.fail_endpoints {
                    return errno(code);
                }
                if !state.interfaces.contains(name.as_str()) {
                    return errno(libc::ENXIO);
                }
                state.endpoints.push((name.to_string(), *endpoints));
            }
            ControlCommand::AddAddress { name, address, mask } => {
                if !state.interfaces.contains(name.as_str()) {
                    return errno(libc::ENXIO);
                }
                state.addresses.push((name.to_string(), *address, *mask));
            }
        }
        Ok(())
    }
}

impl RoutingChannel for FakeChannel {
    fn send(&mut self, message: &RouteMessage) -> io::Result<usize> {
        let mut state = self.state.borrow_mut();
        state.route_log.push(message.clone());
        if let Some(code) = state.fail_route {
            return errno(code);
        }
        if state.short_write {
            return Ok(message.len() / 2);
        }
        let entry = *message.entry();
        let existing = state.routes.iter().position(|route| route.destination() == entry.destination() && route.mask() == entry.mask());
        match (message.op(), existing) {
            (RouteOp::Add, Some(_)) => return errno(libc::EEXIST),
            (RouteOp::Add, None) => state.routes.push(entry),
            (RouteOp::Delete, Some(index)) => {
                state.routes.remove(index);
            }
            (RouteOp::Delete, None) => return errno(libc::ESRCH),
        }
        Ok(message.len())
    }
}
