pub mod address;
pub mod control;
pub mod errors;
pub mod facade;
pub mod interface;
pub mod kernel;
pub mod logging;
pub mod route;
pub mod session;
pub mod sockaddr;
pub mod wire;

#[cfg(test)]
mod fake_kernel;
#[cfg(test)]
mod sockaddr_test;

pub use errors::{Error, ErrorCode};
pub use facade::NetConfig;
pub use session::Session;
