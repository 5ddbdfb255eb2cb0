// types.rs
use crate::discovery::{split_endpoints, Discovery, DiscoveryBase, GossipDiscovery, OutOfBandDiscovery};
use crate::error::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::{fmt, net::IpAddr, path::PathBuf};

/// On the master, assume the API server is reachable locally.
pub const MASTER_API_SERVER_URLS: &str = "http://127.0.0.1:8080/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Master,
    Node,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Master => write!(f, "master"),
            Role::Node => write!(f, "node"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum DiscoveryKind {
    #[default]
    OutOfBand,
    Gossip,
}

/// Raw option values as the operator supplied them. Empty means "not given".
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOptions {
    pub kind: DiscoveryKind,
    pub api_server_urls: String,
    pub ca_cert_file: String,
    pub api_server_dns_name: Option<String>,
    pub listen_ip: Option<IpAddr>,
    pub token: String,
    pub peers: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapParameters {
    pub role: Role,
    pub discovery: Discovery,
}

impl BootstrapParameters {
    /// Builds the parameters for one invocation. Required fields are checked where they
    /// are used, not here, so the operator gets a message naming the missing flag.
    pub fn assemble(role: Role, options: DiscoveryOptions) -> Self {
        let base = DiscoveryBase::new(role);
        let discovery = match options.kind {
            DiscoveryKind::OutOfBand => Discovery::OutOfBand(OutOfBandDiscovery {
                base,
                api_server_urls: split_endpoints(&options.api_server_urls),
                ca_cert_file: PathBuf::from(options.ca_cert_file),
                api_server_dns_name: options.api_server_dns_name.filter(|s| !s.is_empty()),
                listen_ip: options.listen_ip,
            }),
            DiscoveryKind::Gossip => Discovery::Gossip(GossipDiscovery {
                base,
                token: options.token,
                peers: split_endpoints(&options.peers),
            }),
        };
        Self { role, discovery }
    }

    /// Replaces the active strategy wholesale; nothing from the previous one survives.
    pub fn with_discovery(self, discovery: Discovery) -> Self {
        Self {
            role: self.role,
            discovery,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oob_options() -> DiscoveryOptions {
        DiscoveryOptions {
            api_server_urls: "https://10.0.0.1:6443/,https://10.0.0.2:6443/".to_string(),
            ca_cert_file: "/tmp/ca.der".to_string(),
            listen_ip: Some("10.0.0.9".parse().unwrap()),
            ..DiscoveryOptions::default()
        }
    }

    #[test]
    fn assembles_out_of_band_variant() {
        let params = BootstrapParameters::assemble(Role::Node, oob_options());

        match &params.discovery {
            Discovery::OutOfBand(d) => {
                assert_eq!(d.base.role(), Role::Node);
                assert_eq!(
                    d.api_server_urls,
                    vec!["https://10.0.0.1:6443/", "https://10.0.0.2:6443/"]
                );
                assert_eq!(d.ca_cert_file, PathBuf::from("/tmp/ca.der"));
                assert_eq!(d.listen_ip, Some("10.0.0.9".parse().unwrap()));
            }
            other => panic!("unexpected variant {:?}", other),
        }
    }

    #[test]
    fn listen_ip_does_not_touch_urls() {
        let params = BootstrapParameters::assemble(
            Role::Node,
            DiscoveryOptions {
                listen_ip: Some("10.0.0.9".parse().unwrap()),
                ..DiscoveryOptions::default()
            },
        );

        let Discovery::OutOfBand(d) = &params.discovery else {
            panic!("expected out-of-band discovery");
        };
        assert!(d.api_server_urls.is_empty());
    }

    #[test]
    fn assembles_gossip_variant_with_token_and_peers() {
        let params = BootstrapParameters::assemble(
            Role::Node,
            DiscoveryOptions {
                kind: DiscoveryKind::Gossip,
                token: "abc.def".to_string(),
                peers: "10.0.0.1:7946,10.0.0.2:7946".to_string(),
                ..DiscoveryOptions::default()
            },
        );

        let Discovery::Gossip(d) = &params.discovery else {
            panic!("expected gossip discovery");
        };
        assert_eq!(d.token, "abc.def");
        assert_eq!(d.peers.len(), 2);
    }

    #[test]
    fn replacing_discovery_discards_the_old_variant() {
        let params = BootstrapParameters::assemble(Role::Node, oob_options());
        let gossip = BootstrapParameters::assemble(
            Role::Node,
            DiscoveryOptions {
                kind: DiscoveryKind::Gossip,
                ..DiscoveryOptions::default()
            },
        )
        .discovery;

        let replaced = params.with_discovery(gossip.clone());

        assert_eq!(replaced.discovery, gossip);
        assert_eq!(replaced.role, Role::Node);
    }

    #[test]
    fn json_dump_carries_wire_fields() {
        let json = BootstrapParameters::assemble(Role::Node, oob_options())
            .to_json()
            .unwrap();
        assert!(json.contains("\"apiVersion\": \"v1alpha1\""));
        assert!(json.contains("https://10.0.0.1:6443/,https://10.0.0.2:6443/"));
    }
}
