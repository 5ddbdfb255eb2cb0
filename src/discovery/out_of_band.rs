// src/discovery/out_of_band.rs
use super::DiscoveryBase;
use crate::cert::CaCertificate;
use crate::error::{BootstrapError, Result};
use serde::{Deserialize, Serialize};
use std::{fs, net::IpAddr, path::PathBuf};

/// Trust material handed to the node by the operator, e.g. a scp'd CA file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutOfBandDiscovery {
    #[serde(flatten)]
    pub base: DiscoveryBase,
    #[serde(rename = "apiServerURLs", with = "super::endpoints::comma_separated")]
    pub api_server_urls: Vec<String>,
    pub ca_cert_file: PathBuf,
    /// Master only: extra subjectAltName for the API server certificate.
    #[serde(rename = "apiServerDNSName", default, skip_serializing_if = "Option::is_none")]
    pub api_server_dns_name: Option<String>,
    #[serde(rename = "listenIP", default, skip_serializing_if = "Option::is_none")]
    pub listen_ip: Option<IpAddr>,
}

impl OutOfBandDiscovery {
    /// Everything is known up front, so there is nothing to run.
    pub fn start(&self) -> Result<()> {
        Ok(())
    }

    /// Reads and parses the CA file on every call; a failed read is not retried.
    pub fn discover(&self) -> Result<(Vec<String>, CaCertificate)> {
        let raw = fs::read(&self.ca_cert_file).map_err(|e| {
            BootstrapError::io(
                format!("reading CA certificate {}", self.ca_cert_file.display()),
                e,
            )
        })?;
        let ca = CaCertificate::parse(raw, &self.ca_cert_file)?;
        Ok((self.api_server_urls.clone(), ca))
    }
}
