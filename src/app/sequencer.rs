// src/app/sequencer.rs
use crate::cert::{PkiGenerator, PkiRequest};
use crate::config::BootstrapConfig;
use crate::discovery::Discovery;
use crate::error::BootstrapError;
use crate::kubeconfig::{KubeConfigGenerator, KubeconfigWrite, KubeletCredentials};
use crate::manifests::{ManifestRequest, ManifestWriter};
use crate::types::{BootstrapParameters, Role};
use crate::utils::logging::Logger;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    StaticPodManifests,
    Pki,
    Discovery,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::StaticPodManifests => write!(f, "static pod manifests"),
            Step::Pki => write!(f, "PKI generation"),
            Step::Discovery => write!(f, "discovery"),
        }
    }
}

/// How far a bootstrap run got.
#[derive(Debug)]
pub enum SequenceOutcome {
    Complete {
        role: Role,
        kubeconfig: KubeconfigWrite,
        /// Where the master put the CA operators must copy to their nodes.
        ca_cert_path: Option<PathBuf>,
    },
    /// Earlier steps made real progress, only the kubeconfig write failed.
    Degraded {
        role: Role,
        warning: BootstrapError,
        completed: Vec<Step>,
        ca_cert_path: Option<PathBuf>,
    },
    Fatal(BootstrapError),
}

pub struct ProvisioningSequencer<'a> {
    config: &'a BootstrapConfig,
    manifests: &'a dyn ManifestWriter,
    pki: &'a dyn PkiGenerator,
    logger: Box<dyn Logger>,
}

impl<'a> ProvisioningSequencer<'a> {
    pub fn new(
        config: &'a BootstrapConfig,
        manifests: &'a dyn ManifestWriter,
        pki: &'a dyn PkiGenerator,
        logger: Box<dyn Logger>,
    ) -> Self {
        Self {
            config,
            manifests,
            pki,
            logger,
        }
    }

    pub fn run(&mut self, params: BootstrapParameters) -> SequenceOutcome {
        match params.to_json() {
            Ok(json) => self.logger.debug_log(&format!("Bootstrap parameters: {}", json)),
            Err(e) => self.logger.debug_log(&format!("Unable to render parameters: {}", e)),
        }

        let base = params.discovery.base();
        self.logger.debug_log(&format!(
            "Using {} discovery ({}) for role {}",
            params.discovery.name(),
            base.api_version(),
            base.role()
        ));

        match params.role {
            Role::Master => self.init_master(params.discovery),
            Role::Node => self.join_node(params.discovery),
        }
    }

    fn kubeconfig_generator(&self) -> KubeConfigGenerator {
        KubeConfigGenerator::new(self.config.cluster_name.clone(), self.config.kubeconfig_path())
    }

    /// Manifests, then PKI, then the kubelet kubeconfig. The first two abort on error.
    pub fn init_master(&mut self, discovery: Discovery) -> SequenceOutcome {
        let Discovery::OutOfBand(discovery) = discovery else {
            return SequenceOutcome::Fatal(BootstrapError::NotImplemented(
                "master bootstrap with gossip discovery",
            ));
        };
        let mut completed = Vec::new();

        let manifest_request = ManifestRequest {
            manifest_dir: self.config.manifest_dir(),
            pki_dir: self.config.pki_dir(),
            cluster_name: self.config.cluster_name.clone(),
            image_repository: self.config.image_repository.clone(),
            kubernetes_version: self.config.kubernetes_version.clone(),
            service_cluster_ip_range: self.config.service_cluster_ip_range.clone(),
            secure_port: self.config.secure_port,
            insecure_port: self.config.insecure_port,
            advertise_address: discovery.listen_ip,
        };
        if let Err(e) = self
            .manifests
            .write_manifests(&manifest_request, self.logger.as_mut())
        {
            self.logger.log(&format!("Failed to write static pod manifests: {}", e));
            return SequenceOutcome::Fatal(e);
        }
        completed.push(Step::StaticPodManifests);

        let pki_request = PkiRequest {
            pki_dir: self.config.pki_dir(),
            ca_common_name: self.config.cluster_name.clone(),
            node_name: self.config.node_name.clone(),
            api_dns_name: discovery.api_server_dns_name.clone(),
            listen_ip: discovery.listen_ip,
            ca_validity_days: self.config.ca_validity_days,
            cert_validity_days: self.config.cert_validity_days,
            key_size: self.config.key_size,
        };
        let bundle = match self.pki.generate(&pki_request, self.logger.as_mut()) {
            Ok(bundle) => bundle,
            Err(e) => {
                self.logger.log(&format!("Failed to generate PKI: {}", e));
                return SequenceOutcome::Fatal(e);
            }
        };
        completed.push(Step::Pki);
        self.logger
            .debug_log(&format!("Wrote {} new PKI file(s)", bundle.written.len()));
        self.logger.log(&format!(
            "CA {} ready at {} (sha256 {})",
            bundle.ca.subject,
            bundle.ca_cert_path.display(),
            bundle.ca.fingerprint
        ));

        let credentials = KubeletCredentials {
            client_certificate: bundle.kubelet_cert_path.clone(),
            client_key: bundle.kubelet_key_path.clone(),
        };
        let ca_cert_path = bundle.ca_cert_path.clone();
        match self.kubeconfig_generator().write_if_not_exists(
            &discovery.api_server_urls,
            bundle.ca,
            Some(&credentials),
            self.logger.as_mut(),
        ) {
            Ok(kubeconfig) => SequenceOutcome::Complete {
                role: Role::Master,
                kubeconfig,
                ca_cert_path: Some(ca_cert_path),
            },
            Err(e) => {
                self.logger.log(&format!("Unable to write kubeconfig: {}", e));
                SequenceOutcome::Degraded {
                    role: Role::Master,
                    warning: e,
                    completed,
                    ca_cert_path: Some(ca_cert_path),
                }
            }
        }
    }

    /// Checks required flags, discovers the cluster, then writes the kubelet kubeconfig.
    pub fn join_node(&mut self, discovery: Discovery) -> SequenceOutcome {
        if let Discovery::OutOfBand(oob) = &discovery {
            if oob.ca_cert_file.as_os_str().is_empty() {
                return SequenceOutcome::Fatal(BootstrapError::missing("--ca-cert-file"));
            }
            if oob.api_server_urls.is_empty() {
                return SequenceOutcome::Fatal(BootstrapError::missing("--api-server-urls"));
            }
            if let Some(ip) = oob.listen_ip {
                self.logger.log(&format!("Kubelet will listen on {}", ip));
            }
        }

        self.logger
            .log(&format!("Discovering cluster using {} discovery", discovery.name()));
        let discovered = discovery.start().and_then(|_| discovery.discover());
        let (endpoints, ca) = match discovered {
            Ok(found) => found,
            Err(e) => {
                self.logger.log(&format!("Discovery failed: {}", e));
                return SequenceOutcome::Fatal(e);
            }
        };
        self.logger.log(&format!(
            "Discovered {} API server endpoint(s), CA {} (sha256 {})",
            endpoints.len(),
            ca.subject,
            ca.fingerprint
        ));
        if !ca.is_ca {
            self.logger
                .log(&format!("Warning: {} is not marked as a CA certificate", ca.subject));
        }
        if ca.not_after < chrono::Utc::now() {
            self.logger
                .log(&format!("Warning: CA certificate expired at {}", ca.not_after));
        }

        match self
            .kubeconfig_generator()
            .write_if_not_exists(&endpoints, ca, None, self.logger.as_mut())
        {
            Ok(kubeconfig) => SequenceOutcome::Complete {
                role: Role::Node,
                kubeconfig,
                ca_cert_path: None,
            },
            Err(e) => {
                self.logger.log(&format!("Unable to write kubeconfig: {}", e));
                SequenceOutcome::Degraded {
                    role: Role::Node,
                    warning: e,
                    completed: vec![Step::Discovery],
                    ca_cert_path: None,
                }
            }
        }
    }
}
