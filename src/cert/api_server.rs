// src/cert/api_server.rs
use super::types::{AltName, CertificateConfig, ExtendedKeyUsage};
use super::types::CertificateType;
use std::net::{IpAddr, Ipv4Addr};

pub struct ApiServerCertGenerator {
    dns_name: Option<String>,
    listen_ip: Option<IpAddr>,
}

impl ApiServerCertGenerator {
    pub fn new(dns_name: Option<String>, listen_ip: Option<IpAddr>) -> Self {
        Self {
            dns_name,
            listen_ip,
        }
    }

    pub fn get_config(&self, validity_days: u32, key_size: u32) -> CertificateConfig {
        let mut alt_names = vec![
            AltName::Dns("kubernetes".to_string()),
            AltName::Dns("kubernetes.default".to_string()),
            AltName::Dns("kubernetes.default.svc".to_string()),
            AltName::Dns("kubernetes.default.svc.cluster.local".to_string()),
            AltName::Ip(IpAddr::V4(Ipv4Addr::LOCALHOST)),
        ];
        if let Some(dns) = &self.dns_name {
            alt_names.push(AltName::Dns(dns.clone()));
        }
        if let Some(ip) = self.listen_ip {
            alt_names.push(AltName::Ip(ip));
        }

        CertificateConfig {
            cert_type: CertificateType::APIServer,
            common_name: "kube-apiserver".to_string(),
            organization: None,
            validity_days,
            key_size,
            file_stem: "apiserver".to_string(),
            alt_names,
            extended_key_usage: vec![ExtendedKeyUsage::ServerAuth],
        }
    }
}
