//! Seam between the request builders and the kernel. Everything above this module is platform independent.

#[cfg(target_os = "freebsd")]
mod bsd;
#[cfg(not(target_os = "freebsd"))]
mod unsupported;

use std::io;

#[cfg(target_os = "freebsd")]
pub use bsd::{SystemChannel, SystemKernel};
#[cfg(not(target_os = "freebsd"))]
pub use unsupported::{NoChannel, SystemKernel};

use crate::address::AddressFamily;
use crate::control::ControlRequest;
use crate::route::RouteMessage;

/// Path for fixed-size interface-control requests. Closed when dropped.
pub trait ControlChannel {
    /// Issues one request. The kernel may write results back into the request image.
    fn submit(&mut self, request: &mut ControlRequest) -> io::Result<()>;
}

/// Path for variable-length routing messages. Closed when dropped.
pub trait RoutingChannel {
    /// Writes one message and returns the number of bytes the kernel accepted.
    fn send(&mut self, message: &RouteMessage) -> io::Result<usize>;
}

pub trait Kernel {
    type Control: ControlChannel;
    type Routing: RoutingChannel;

    /// Opens a control channel on a socket of `family`.
    fn open_control(&self, family: AddressFamily) -> io::Result<Self::Control>;

    fn open_routing(&self) -> io::Result<Self::Routing>;
}
