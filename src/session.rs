use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::Error;
use crate::facade::NetConfig;
use crate::kernel::Kernel;

/// Everything needed to bring one tunnel up or down.
///
/// ```json
/// {
///   "interface": "gif0",
///   "tunnelLocal": "192.0.2.1",
///   "tunnelRemote": "198.51.100.7",
///   "address": "2001:db8:1::2",
///   "addressPrefixLen": 64,
///   "routeDestination": "2001:db8:100::",
///   "routePrefixLen": 48,
///   "routeNextHop": "2001:db8:1::1"
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub interface: String,
    #[serde(default)]
    pub tunnel_local: String,
    #[serde(default)]
    pub tunnel_remote: String,
    pub address: String,
    pub address_prefix_len: u8,
    pub route_destination: String,
    pub route_prefix_len: u8,
    pub route_next_hop: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionLoadError {
    #[error("could not read session file: {0}")]
    Read(#[from] io::Error),
    #[error("could not parse session file: {0}")]
    Parse(#[from] serde_json::Error),
}

impl Session {
    pub fn load(path: &Path) -> Result<Self, SessionLoadError> {
        let content = fs::read(path).inspect_err(|error| {
            tracing::error!(message_id = "Sd0jWv3k", ?error, path = %path.display(), "failed to read session file");
        })?;
        let session = serde_json::from_slice(&content).inspect_err(|error| {
            tracing::error!(message_id = "G5tyBn8r", ?error, path = %path.display(), "failed to parse session file");
        })?;
        Ok(session)
    }

    /// Interface, then address, then route. Stops at the first failure without undoing earlier steps.
    pub fn activate<K: Kernel>(&self, net: &NetConfig<K>) -> Result<(), Error> {
        net.create_interface(&self.interface, &self.tunnel_local, &self.tunnel_remote)?;
        net.create_address(&self.interface, &self.address, self.address_prefix_len)?;
        net.create_route(&self.route_destination, self.route_prefix_len, &self.route_next_hop)?;
        tracing::info!(message_id = "Fj4mKx9e", interface = %self.interface, remote = %self.tunnel_remote, "tunnel session established");
        Ok(())
    }

    /// Route, then interface. Stops at the first failure.
    pub fn deactivate<K: Kernel>(&self, net: &NetConfig<K>) -> Result<(), Error> {
        net.delete_route(&self.route_destination, self.route_prefix_len, &self.route_next_hop)?;
        net.delete_interface(&self.interface)?;
        tracing::info!(message_id = "oT2wYc6h", interface = %self.interface, remote = %self.tunnel_remote, "tunnel session removed");
        Ok(())
    }
}
