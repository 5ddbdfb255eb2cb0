use super::types::{CertificateConfig, CertificateType, ExtendedKeyUsage};

// src/cert/kubelet.rs
pub struct KubeletClientCertGenerator;

impl KubeletClientCertGenerator {
    pub fn get_config(node_name: &str, validity_days: u32, key_size: u32) -> CertificateConfig {
        CertificateConfig {
            cert_type: CertificateType::KubeletClient,
            common_name: format!("system:node:{}", node_name),
            organization: Some("system:nodes".to_string()),
            validity_days,
            key_size,
            file_stem: "kubelet".to_string(),
            alt_names: vec![],
            extended_key_usage: vec![ExtendedKeyUsage::ClientAuth],
        }
    }
}
