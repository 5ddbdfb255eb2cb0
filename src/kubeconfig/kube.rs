use crate::cert::CaCertificate;
use crate::error::{BootstrapError, Result};
use crate::utils::logging::Logger;
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct KubeConfig {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub clusters: Vec<NamedCluster>,
    pub users: Vec<NamedUser>,
    pub contexts: Vec<NamedContext>,
    pub current_context: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedCluster {
    pub name: String,
    pub cluster: ClusterConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClusterConfig {
    pub server: String,
    pub certificate_authority_data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedUser {
    pub name: String,
    pub user: UserConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UserConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_certificate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedContext {
    pub name: String,
    pub context: ContextConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextConfig {
    pub cluster: String,
    pub user: String,
}

/// Client certificate the kubelet presents. Nodes have none until TLS bootstrap.
#[derive(Debug, Clone, PartialEq)]
pub struct KubeletCredentials {
    pub client_certificate: PathBuf,
    pub client_key: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub enum KubeconfigWrite {
    Written(PathBuf),
    /// A config was already present and was left untouched.
    AlreadyExists(PathBuf),
}

const KUBELET_USER: &str = "kubelet";

pub struct KubeConfigGenerator {
    cluster_name: String,
    kubeconfig_path: PathBuf,
}

impl KubeConfigGenerator {
    pub fn new(cluster_name: String, kubeconfig_path: PathBuf) -> Self {
        Self {
            cluster_name,
            kubeconfig_path,
        }
    }

    fn cluster_entry_name(&self, index: usize) -> String {
        if index == 0 {
            self.cluster_name.clone()
        } else {
            format!("{}-{}", self.cluster_name, index)
        }
    }

    /// One cluster entry per endpoint, in endpoint order; the context uses the first.
    pub fn build(
        &self,
        endpoints: &[String],
        ca: &CaCertificate,
        credentials: Option<&KubeletCredentials>,
    ) -> Result<KubeConfig> {
        let ca_data = general_purpose::STANDARD.encode(ca.to_pem()?);

        let clusters = endpoints
            .iter()
            .enumerate()
            .map(|(i, server)| NamedCluster {
                name: self.cluster_entry_name(i),
                cluster: ClusterConfig {
                    server: server.clone(),
                    certificate_authority_data: ca_data.clone(),
                },
            })
            .collect();

        let user = credentials
            .map(|c| UserConfig {
                client_certificate: Some(c.client_certificate.display().to_string()),
                client_key: Some(c.client_key.display().to_string()),
            })
            .unwrap_or_default();

        let context_name = format!("{}@{}", KUBELET_USER, self.cluster_name);

        Ok(KubeConfig {
            api_version: "v1".to_string(),
            kind: "Config".to_string(),
            clusters,
            users: vec![NamedUser {
                name: KUBELET_USER.to_string(),
                user,
            }],
            contexts: vec![NamedContext {
                name: context_name.clone(),
                context: ContextConfig {
                    cluster: self.cluster_entry_name(0),
                    user: KUBELET_USER.to_string(),
                },
            }],
            current_context: context_name,
        })
    }

    /// Writes the kubeconfig unless something is already at the target path.
    ///
    /// Presence alone is the guard; an existing file is never compared or rewritten. The
    /// file is opened with exclusive create, so of two racing writers only one wins.
    pub fn write_if_not_exists(
        &self,
        endpoints: &[String],
        ca: CaCertificate,
        credentials: Option<&KubeletCredentials>,
        logger: &mut dyn Logger,
    ) -> Result<KubeconfigWrite> {
        let path = self.kubeconfig_path.as_path();
        if endpoints.is_empty() {
            return Err(BootstrapError::Config(
                "no API server endpoints to write into kubeconfig".to_string(),
            ));
        }

        let yaml = serde_yaml::to_string(&self.build(endpoints, &ca, credentials)?)?;
        drop(ca);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| BootstrapError::io(format!("creating {}", parent.display()), e))?;
        }

        let mut file = match open_exclusive(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                logger.log(&format!(
                    "Kubeconfig already exists at {}. Leaving it untouched.",
                    path.display()
                ));
                return Ok(KubeconfigWrite::AlreadyExists(path.to_path_buf()));
            }
            Err(e) => {
                return Err(BootstrapError::io(format!("creating {}", path.display()), e));
            }
        };

        if let Err(e) = file.write_all(yaml.as_bytes()).and_then(|_| file.sync_all()) {
            drop(file);
            return Err(discard_partial(path, e, logger));
        }

        logger.log(&format!("Kubeconfig written to {}", path.display()));
        Ok(KubeconfigWrite::Written(path.to_path_buf()))
    }
}

/// A half-written file would pass the existence guard on the next run, so it has to go.
/// When it can't be removed the operator is told to delete it by hand.
fn discard_partial(path: &Path, write_error: io::Error, logger: &mut dyn Logger) -> BootstrapError {
    match fs::remove_file(path) {
        Ok(()) => BootstrapError::io(format!("writing {}", path.display()), write_error),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            BootstrapError::io(format!("writing {}", path.display()), write_error)
        }
        Err(cleanup) => {
            logger.log(&format!(
                "Unable to remove partial kubeconfig {}: {}",
                path.display(),
                cleanup
            ));
            BootstrapError::io(
                format!(
                    "writing {} (partial file left behind, remove it before re-running: {})",
                    path.display(),
                    cleanup
                ),
                write_error,
            )
        }
    }
}

fn open_exclusive(path: &Path) -> io::Result<fs::File> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::openssl::self_signed_ca;
    use crate::utils::logging::testing::MemoryLogger;

    fn ca() -> CaCertificate {
        let (cert, _) = self_signed_ca("kubernetes", 2048, 1).unwrap();
        CaCertificate::from_der(cert.to_der().unwrap()).unwrap()
    }

    fn endpoints() -> Vec<String> {
        vec![
            "https://10.0.0.1:6443/".to_string(),
            "https://10.0.0.2:6443/".to_string(),
        ]
    }

    #[test]
    fn writes_one_cluster_per_endpoint_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("etc/kubelet.conf");
        let generator = KubeConfigGenerator::new("kubernetes".to_string(), path.clone());
        let ca = ca();
        let expected_data = general_purpose::STANDARD.encode(ca.to_pem().unwrap());
        let mut logger = MemoryLogger::default();

        let outcome = generator
            .write_if_not_exists(&endpoints(), ca, None, &mut logger)
            .unwrap();

        assert_eq!(outcome, KubeconfigWrite::Written(path.clone()));
        let config: KubeConfig = serde_yaml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let servers: Vec<_> = config.clusters.iter().map(|c| c.cluster.server.as_str()).collect();
        assert_eq!(servers, vec!["https://10.0.0.1:6443/", "https://10.0.0.2:6443/"]);
        assert_eq!(config.clusters[1].name, "kubernetes-1");
        assert!(config
            .clusters
            .iter()
            .all(|c| c.cluster.certificate_authority_data == expected_data));
        assert_eq!(config.current_context, "kubelet@kubernetes");
        assert_eq!(config.users[0].user, UserConfig::default());
    }

    #[test]
    fn existing_file_is_left_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kubelet.conf");
        fs::write(&path, "hand-edited: true\n").unwrap();
        let generator = KubeConfigGenerator::new("kubernetes".to_string(), path.clone());
        let mut logger = MemoryLogger::default();

        let outcome = generator
            .write_if_not_exists(&endpoints(), ca(), None, &mut logger)
            .unwrap();

        assert_eq!(outcome, KubeconfigWrite::AlreadyExists(path.clone()));
        assert_eq!(fs::read_to_string(&path).unwrap(), "hand-edited: true\n");
    }

    #[test]
    fn master_credentials_are_referenced() {
        let generator = KubeConfigGenerator::new("kubernetes".to_string(), PathBuf::from("unused"));
        let credentials = KubeletCredentials {
            client_certificate: PathBuf::from("/etc/kubernetes/pki/kubelet.crt"),
            client_key: PathBuf::from("/etc/kubernetes/pki/kubelet.key"),
        };

        let config = generator
            .build(&endpoints()[..1], &ca(), Some(&credentials))
            .unwrap();

        assert_eq!(
            config.users[0].user.client_certificate.as_deref(),
            Some("/etc/kubernetes/pki/kubelet.crt")
        );
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("client-key: /etc/kubernetes/pki/kubelet.key"));
        assert!(yaml.contains("current-context:"));
        assert!(yaml.contains("certificate-authority-data:"));
    }

    #[test]
    fn unwritable_location_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "").unwrap();
        let generator =
            KubeConfigGenerator::new("kubernetes".to_string(), blocker.join("kubelet.conf"));
        let mut logger = MemoryLogger::default();

        let err = generator
            .write_if_not_exists(&endpoints(), ca(), None, &mut logger)
            .unwrap_err();

        assert!(matches!(err, BootstrapError::Io { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn written_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kubelet.conf");
        let generator = KubeConfigGenerator::new("kubernetes".to_string(), path.clone());
        let mut logger = MemoryLogger::default();

        generator
            .write_if_not_exists(&endpoints(), ca(), None, &mut logger)
            .unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn partial_file_is_removed_after_failed_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kubelet.conf");
        fs::write(&path, "apiVersion: v1\ncl").unwrap();
        let mut logger = MemoryLogger::default();

        let err = discard_partial(&path, io::Error::new(io::ErrorKind::Other, "disk full"), &mut logger);

        assert!(!path.exists());
        assert_eq!(err.to_string(), format!("writing {}: disk full", path.display()));
    }

    #[test]
    fn failed_cleanup_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        // remove_file refuses directories, standing in for a file that can't be deleted.
        let path = dir.path().join("kubelet.conf");
        fs::create_dir(&path).unwrap();
        let mut logger = MemoryLogger::default();

        let err = discard_partial(&path, io::Error::new(io::ErrorKind::Other, "disk full"), &mut logger);

        assert!(err.to_string().contains("partial file left behind"));
        assert!(err.to_string().ends_with("disk full"));
        assert!(logger.contains("Unable to remove partial kubeconfig"));
    }
}
