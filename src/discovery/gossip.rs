// src/discovery/gossip.rs
use super::DiscoveryBase;
use crate::cert::CaCertificate;
use crate::error::{BootstrapError, Result};
use serde::{Deserialize, Serialize};

/// Peer-to-peer discovery seeded by a shared token.
///
/// The membership protocol does not exist yet. Token and peers are carried through
/// configuration so they are in place once it does; until then every operation fails
/// with `NotImplemented` instead of returning empty results.
// TODO persist gossip state to disk so clusters can recover after a reboot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GossipDiscovery {
    #[serde(flatten)]
    pub base: DiscoveryBase,
    pub token: String,
    #[serde(with = "super::endpoints::comma_separated")]
    pub peers: Vec<String>,
}

impl GossipDiscovery {
    pub fn start(&self) -> Result<()> {
        Err(BootstrapError::NotImplemented("gossip discovery start"))
    }

    pub fn discover(&self) -> Result<(Vec<String>, CaCertificate)> {
        Err(BootstrapError::NotImplemented("gossip discovery"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    fn gossip() -> GossipDiscovery {
        GossipDiscovery {
            base: DiscoveryBase::new(Role::Node),
            token: "abcdef.0123456789abcdef".to_string(),
            peers: vec!["10.0.0.1:7946".to_string(), "10.0.0.2:7946".to_string()],
        }
    }

    #[test]
    fn discover_fails_loudly() {
        let err = gossip().discover().unwrap_err();

        assert!(matches!(err, BootstrapError::NotImplemented(_)));
        assert_eq!(err.to_string(), "gossip discovery is not implemented yet");
    }

    #[test]
    fn start_is_not_implemented() {
        assert!(matches!(
            gossip().start(),
            Err(BootstrapError::NotImplemented(_))
        ));
    }
}
