use std::fmt;
use std::io;
use std::net::AddrParseError;

use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;
use thiserror::Error;

use crate::address::{AddressFamily, NetworkAddress};

/// Result codes handed to callers that only need to branch on the failure kind, e.g. a supervising daemon or a shell script consuming the CLI exit output.
///
/// Every `Error` maps to exactly one code. Codes are stable identifiers; add new variants instead of renaming existing ones.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, IntoStaticStr, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ErrorCode {
    AddressAssignFailed,
    AddressFamilyMismatch,
    ChannelOpenFailed,
    InterfaceCreateFailed,
    InterfaceDeleteFailed,
    InvalidAddress,
    InvalidInterfaceName,
    InvalidPrefixLength,
    RouteAddFailed,
    RouteDeleteFailed,
    UnsupportedFamily,
}

impl ErrorCode {
    pub fn as_static_str(&self) -> &'static str {
        self.into()
    }
}

impl From<&Error> for ErrorCode {
    fn from(error: &Error) -> Self {
        tracing::debug!(message_id = "q8ZrTc2e", ?error, "deriving result code for: {}", error);
        match error {
            Error::AddressAssignFailed { .. } => Self::AddressAssignFailed,
            Error::AddressFamilyMismatch { .. } => Self::AddressFamilyMismatch,
            Error::ChannelOpenFailed { .. } => Self::ChannelOpenFailed,
            Error::InterfaceCreateFailed { .. } => Self::InterfaceCreateFailed,
            Error::InterfaceDeleteFailed { .. } => Self::InterfaceDeleteFailed,
            Error::InvalidAddress { .. } => Self::InvalidAddress,
            Error::InvalidInterfaceName { .. } => Self::InvalidInterfaceName,
            Error::InvalidPrefixLength { .. } => Self::InvalidPrefixLength,
            Error::RouteAddFailed { .. } => Self::RouteAddFailed,
            Error::RouteDeleteFailed { .. } => Self::RouteDeleteFailed,
            Error::UnsupportedFamily { .. } => Self::UnsupportedFamily,
        }
    }
}

/// Kernel communication path an operation needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Control(AddressFamily),
    Routing,
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Control(family) => write!(f, "{family} interface control"),
            Self::Routing => f.write_str("routing"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to open {channel} channel: {source}")]
    ChannelOpenFailed {
        channel: ChannelKind,
        #[source]
        source: io::Error,
    },
    #[error("invalid numeric address {text:?}")]
    InvalidAddress {
        text: String,
        #[source]
        source: Option<AddrParseError>,
    },
    #[error("prefix length {plen} exceeds the {family} address width")]
    InvalidPrefixLength { family: AddressFamily, plen: u8 },
    #[error("invalid interface name {name:?}: {reason}")]
    InvalidInterfaceName { name: String, reason: &'static str },
    #[error("point-to-point endpoints {local} and {remote} are of different address families")]
    AddressFamilyMismatch { local: NetworkAddress, remote: NetworkAddress },
    #[error("failed to create interface {name}: {source}")]
    InterfaceCreateFailed {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to delete interface {name}: {source}")]
    InterfaceDeleteFailed {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to assign {address} to interface {name}: {source}")]
    AddressAssignFailed {
        name: String,
        address: NetworkAddress,
        #[source]
        source: io::Error,
    },
    #[error("failed to add route to {destination}/{plen}: {source}")]
    RouteAddFailed {
        destination: NetworkAddress,
        plen: u8,
        #[source]
        source: io::Error,
    },
    #[error("failed to delete route to {destination}/{plen}: {source}")]
    RouteDeleteFailed {
        destination: NetworkAddress,
        plen: u8,
        #[source]
        source: io::Error,
    },
    #[error("address family {family} is not supported here")]
    UnsupportedFamily { family: u8 },
}

impl Error {
    pub fn code(&self) -> ErrorCode {
        self.into()
    }
}
