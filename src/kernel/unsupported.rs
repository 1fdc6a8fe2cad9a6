use std::io;

use crate::address::AddressFamily;
use crate::control::ControlRequest;
use crate::kernel::{ControlChannel, Kernel, RoutingChannel};
use crate::route::RouteMessage;

/// Stand-in on hosts other than FreeBSD, whose request layouts this crate does not build. Every channel fails to open, which callers see as `ChannelOpenFailed`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemKernel;

#[derive(Debug)]
pub enum NoChannel {}

impl Kernel for SystemKernel {
    type Control = NoChannel;
    type Routing = NoChannel;

    fn open_control(&self, _family: AddressFamily) -> io::Result<NoChannel> {
        Err(unsupported())
    }

    fn open_routing(&self) -> io::Result<NoChannel> {
        Err(unsupported())
    }
}

impl ControlChannel for NoChannel {
    fn submit(&mut self, _request: &mut ControlRequest) -> io::Result<()> {
        match *self {}
    }
}

impl RoutingChannel for NoChannel {
    fn send(&mut self, _message: &RouteMessage) -> io::Result<usize> {
        match *self {}
    }
}

fn unsupported() -> io::Error {
    io::Error::new(io::ErrorKind::Unsupported, "interface and routing control needs FreeBSD")
}
