//! Static pod manifests for the control plane. The kubelet picks these up from the
//! manifest directory and runs them without a scheduler.

mod pod;

use crate::error::{BootstrapError, Result};
use crate::utils::logging::Logger;
use pod::{Container, Pod, Volume};
use std::{
    fs,
    net::IpAddr,
    path::{Path, PathBuf},
};

const ETCD_IMAGE_TAG: &str = "2.2.5";
const ETCD_DATA_DIR: &str = "/var/lib/etcd";
const ETCD_URL: &str = "http://127.0.0.1:2379";

#[derive(Debug, Clone)]
pub struct ManifestRequest {
    pub manifest_dir: PathBuf,
    pub pki_dir: PathBuf,
    pub cluster_name: String,
    pub image_repository: String,
    pub kubernetes_version: String,
    pub service_cluster_ip_range: String,
    pub secure_port: u16,
    pub insecure_port: u16,
    pub advertise_address: Option<IpAddr>,
}

pub trait ManifestWriter {
    /// Returns the paths written, in the order they were written.
    fn write_manifests(&self, request: &ManifestRequest, logger: &mut dyn Logger) -> Result<Vec<PathBuf>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct StaticPodManifests;

impl StaticPodManifests {
    fn hyperkube_image(request: &ManifestRequest) -> String {
        format!(
            "{}/hyperkube-amd64:{}",
            request.image_repository, request.kubernetes_version
        )
    }

    fn pki_file(request: &ManifestRequest, name: &str) -> String {
        request.pki_dir.join(name).display().to_string()
    }

    fn local_master(request: &ManifestRequest) -> String {
        format!("--master=http://127.0.0.1:{}", request.insecure_port)
    }

    pub fn pods(request: &ManifestRequest) -> Vec<Pod> {
        let pki_path = request.pki_dir.display().to_string();

        let (etcd_volume, etcd_mount) = Volume::host_dir("etcd", ETCD_DATA_DIR);
        let etcd = Pod::static_pod(
            "etcd",
            Container {
                name: "etcd".to_string(),
                image: format!("{}/etcd-amd64:{}", request.image_repository, ETCD_IMAGE_TAG),
                command: vec![
                    "etcd".to_string(),
                    format!("--listen-client-urls={}", ETCD_URL),
                    format!("--advertise-client-urls={}", ETCD_URL),
                    format!("--data-dir={}", ETCD_DATA_DIR),
                ],
                volume_mounts: vec![etcd_mount],
            },
            vec![etcd_volume],
        );

        let mut apiserver_command = vec![
            "/hyperkube".to_string(),
            "apiserver".to_string(),
            format!("--etcd-servers={}", ETCD_URL),
            format!("--service-cluster-ip-range={}", request.service_cluster_ip_range),
            format!("--secure-port={}", request.secure_port),
            format!("--insecure-port={}", request.insecure_port),
            "--insecure-bind-address=127.0.0.1".to_string(),
            format!("--client-ca-file={}", Self::pki_file(request, "ca.crt")),
            format!("--tls-cert-file={}", Self::pki_file(request, "apiserver.crt")),
            format!("--tls-private-key-file={}", Self::pki_file(request, "apiserver.key")),
            "--allow-privileged=true".to_string(),
        ];
        if let Some(ip) = request.advertise_address {
            apiserver_command.push(format!("--advertise-address={}", ip));
        }
        let (pki_volume, pki_mount) = Volume::host_dir("pki", &pki_path);
        let apiserver = Pod::static_pod(
            "kube-apiserver",
            Container {
                name: "kube-apiserver".to_string(),
                image: Self::hyperkube_image(request),
                command: apiserver_command,
                volume_mounts: vec![pki_mount],
            },
            vec![pki_volume],
        );

        let (pki_volume, pki_mount) = Volume::host_dir("pki", &pki_path);
        let controller_manager = Pod::static_pod(
            "kube-controller-manager",
            Container {
                name: "kube-controller-manager".to_string(),
                image: Self::hyperkube_image(request),
                command: vec![
                    "/hyperkube".to_string(),
                    "controller-manager".to_string(),
                    Self::local_master(request),
                    format!("--cluster-name={}", request.cluster_name),
                    format!("--root-ca-file={}", Self::pki_file(request, "ca.crt")),
                    format!(
                        "--service-account-private-key-file={}",
                        Self::pki_file(request, "apiserver.key")
                    ),
                    format!("--cluster-signing-cert-file={}", Self::pki_file(request, "ca.crt")),
                    format!("--cluster-signing-key-file={}", Self::pki_file(request, "ca.key")),
                ],
                volume_mounts: vec![pki_mount],
            },
            vec![pki_volume],
        );

        let scheduler = Pod::static_pod(
            "kube-scheduler",
            Container {
                name: "kube-scheduler".to_string(),
                image: Self::hyperkube_image(request),
                command: vec![
                    "/hyperkube".to_string(),
                    "scheduler".to_string(),
                    Self::local_master(request),
                ],
                volume_mounts: vec![],
            },
            vec![],
        );

        vec![etcd, apiserver, controller_manager, scheduler]
    }
}

impl ManifestWriter for StaticPodManifests {
    fn write_manifests(&self, request: &ManifestRequest, logger: &mut dyn Logger) -> Result<Vec<PathBuf>> {
        let dir: &Path = &request.manifest_dir;
        logger.log(&format!("Writing static pod manifests to {}", dir.display()));
        fs::create_dir_all(dir)
            .map_err(|e| BootstrapError::io(format!("creating {}", dir.display()), e))?;

        let mut written = Vec::new();
        for pod in Self::pods(request) {
            let path = dir.join(format!("{}.yaml", pod.metadata.name));
            let yaml = serde_yaml::to_string(&pod)?;
            fs::write(&path, yaml)
                .map_err(|e| BootstrapError::io(format!("writing {}", path.display()), e))?;
            logger.debug_log(&format!("Wrote {}", path.display()));
            written.push(path);
        }

        Ok(written)
    }
}
