// config/types.rs
use serde::{Deserialize, Serialize};
use std::{fs, io, path::PathBuf};

/// Node-local settings shared by both bootstrap roles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BootstrapConfig {
    pub manifest_dir: String,
    pub pki_dir: String,
    /// Where the kubelet's kubeconfig lives. Same path on masters and nodes.
    pub kubeconfig_path: String,
    pub cluster_name: String,
    pub node_name: String,
    pub image_repository: String,
    pub kubernetes_version: String,
    pub service_cluster_ip_range: String,
    pub secure_port: u16,
    pub insecure_port: u16,
    pub ca_validity_days: u32,
    pub cert_validity_days: u32,
    pub key_size: u32,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            manifest_dir: "/etc/kubernetes/manifests".to_string(),
            pki_dir: "/etc/kubernetes/pki".to_string(),
            kubeconfig_path: "/etc/kubernetes/kubelet.conf".to_string(),
            cluster_name: "kubernetes".to_string(),
            node_name: "kubernetes-master".to_string(),
            image_repository: "gcr.io/google_containers".to_string(),
            kubernetes_version: "v1.4.0".to_string(),
            service_cluster_ip_range: "10.16.0.0/12".to_string(),
            secure_port: 443,
            insecure_port: 8080,
            ca_validity_days: 3650,
            cert_validity_days: 375,
            key_size: 2048,
        }
    }
}

impl BootstrapConfig {
    pub fn load_from_file(path: &str) -> io::Result<Self> {
        let config_str = fs::read_to_string(expand(path))?;
        serde_json::from_str(&config_str).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    pub fn save_to_file(&self, path: &str) -> io::Result<()> {
        let config_str = serde_json::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(expand(path), config_str)
    }

    pub fn validate(&self) -> io::Result<()> {
        for (name, value) in [
            ("manifest_dir", &self.manifest_dir),
            ("pki_dir", &self.pki_dir),
            ("kubeconfig_path", &self.kubeconfig_path),
            ("cluster_name", &self.cluster_name),
            ("node_name", &self.node_name),
        ] {
            if value.trim().is_empty() {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} must not be empty", name),
                ));
            }
        }
        if self.key_size < 2048 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("key_size {} is below the 2048-bit minimum", self.key_size),
            ));
        }
        if self.ca_validity_days == 0 || self.cert_validity_days == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "certificate validity must be at least one day",
            ));
        }
        Ok(())
    }

    pub fn manifest_dir(&self) -> PathBuf {
        expand(&self.manifest_dir)
    }

    pub fn pki_dir(&self) -> PathBuf {
        expand(&self.pki_dir)
    }

    pub fn kubeconfig_path(&self) -> PathBuf {
        expand(&self.kubeconfig_path)
    }

    pub fn ca_cert_path(&self) -> PathBuf {
        self.pki_dir().join("ca.crt")
    }
}

/// Expands `~` the same way for flags and config values.
pub fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}
