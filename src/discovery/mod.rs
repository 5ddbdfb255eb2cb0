//! How a node learns where the control plane is and which CA to trust.
//!
//! Discovery is a closed set of strategies. Adding one means adding a variant here, and
//! the compiler then points at every place that has to handle it.

mod endpoints;
mod gossip;
mod out_of_band;

use crate::cert::CaCertificate;
use crate::error::Result;
use crate::types::Role;
use serde::{Deserialize, Serialize};

pub use endpoints::split_endpoints;
pub use gossip::GossipDiscovery;
pub use out_of_band::OutOfBandDiscovery;

/// Wire version tag carried by every discovery variant.
pub const API_VERSION: &str = "v1alpha1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryBase {
    api_version: String,
    role: Role,
}

impl DiscoveryBase {
    pub fn new(role: Role) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            role,
        }
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub fn role(&self) -> Role {
        self.role
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Discovery {
    OutOfBand(OutOfBandDiscovery),
    Gossip(GossipDiscovery),
}

impl Discovery {
    /// Starts any long-running process the strategy needs. Not required before
    /// `discover` for strategies that have none.
    pub fn start(&self) -> Result<()> {
        match self {
            Discovery::OutOfBand(d) => d.start(),
            Discovery::Gossip(d) => d.start(),
        }
    }

    /// Resolves the API server endpoints, in order, and the CA to trust.
    pub fn discover(&self) -> Result<(Vec<String>, CaCertificate)> {
        match self {
            Discovery::OutOfBand(d) => d.discover(),
            Discovery::Gossip(d) => d.discover(),
        }
    }

    pub fn base(&self) -> &DiscoveryBase {
        match self {
            Discovery::OutOfBand(d) => &d.base,
            Discovery::Gossip(d) => &d.base,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Discovery::OutOfBand(_) => "out-of-band",
            Discovery::Gossip(_) => "gossip",
        }
    }
}
