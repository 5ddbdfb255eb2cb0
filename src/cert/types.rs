// cert/types.rs
use std::net::IpAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum CertificateType {
    APIServer,
    KubeletClient,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AltName {
    Dns(String),
    Ip(IpAddr),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExtendedKeyUsage {
    ServerAuth,
    ClientAuth,
}

#[derive(Debug, Clone)]
pub struct CertificateConfig {
    pub cert_type: CertificateType,
    pub common_name: String,
    pub organization: Option<String>,
    pub validity_days: u32,
    pub key_size: u32,
    /// `<stem>.crt` and `<stem>.key` inside the PKI directory.
    pub file_stem: String,
    pub alt_names: Vec<AltName>,
    pub extended_key_usage: Vec<ExtendedKeyUsage>,
}

impl CertificateConfig {
    pub fn cert_path(&self, pki_dir: &std::path::Path) -> PathBuf {
        pki_dir.join(format!("{}.crt", self.file_stem))
    }

    pub fn key_path(&self, pki_dir: &std::path::Path) -> PathBuf {
        pki_dir.join(format!("{}.key", self.file_stem))
    }
}
