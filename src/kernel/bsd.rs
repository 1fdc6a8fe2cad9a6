use std::io;
use std::os::fd::AsRawFd;

use socket2::{Domain, Socket, Type};

use crate::address::AddressFamily;
use crate::control::ControlRequest;
use crate::kernel::{ControlChannel, Kernel, RoutingChannel};
use crate::route::RouteMessage;

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemKernel;

/// Datagram socket (control) or raw `PF_ROUTE` socket (routing). The descriptor is closed when the channel is dropped.
#[derive(Debug)]
pub struct SystemChannel {
    socket: Socket,
}

impl Kernel for SystemKernel {
    type Control = SystemChannel;
    type Routing = SystemChannel;

    fn open_control(&self, family: AddressFamily) -> io::Result<SystemChannel> {
        let domain = match family {
            AddressFamily::Inet => Domain::IPV4,
            AddressFamily::Inet6 => Domain::IPV6,
        };
        Ok(SystemChannel { socket: Socket::new(domain, Type::DGRAM, None)? })
    }

    fn open_routing(&self) -> io::Result<SystemChannel> {
        Ok(SystemChannel { socket: Socket::new(Domain::from(libc::PF_ROUTE), Type::RAW, None)? })
    }
}

impl ControlChannel for SystemChannel {
    fn submit(&mut self, request: &mut ControlRequest) -> io::Result<()> {
        let code = request.request() as libc::c_ulong;
        let image = request.image_mut();
        // SAFETY: `code` encodes the image size, so the kernel copies at most `image.len()` bytes in and out of the buffer, which outlives the call.
        let result = unsafe { libc::ioctl(self.socket.as_raw_fd(), code, image.as_mut_ptr()) };
        if result == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

impl RoutingChannel for SystemChannel {
    fn send(&mut self, message: &RouteMessage) -> io::Result<usize> {
        self.socket.send(message.as_bytes())
    }
}
