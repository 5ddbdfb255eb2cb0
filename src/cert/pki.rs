// src/cert/pki.rs
use super::{
    api_server::ApiServerCertGenerator,
    ca::generate_or_load_ca,
    kubelet::KubeletClientCertGenerator,
    material::CaCertificate,
    openssl::{read_certificate, sign_certificate, write_certificate, write_private_key},
    types::CertificateConfig,
};
use crate::error::Result;
use crate::utils::logging::Logger;
use openssl::{
    pkey::{PKey, Private},
    x509::X509,
};
use std::{
    net::IpAddr,
    path::{Path, PathBuf},
};

/// Inputs for generating the master's trust material.
#[derive(Debug, Clone)]
pub struct PkiRequest {
    pub pki_dir: PathBuf,
    pub ca_common_name: String,
    pub node_name: String,
    pub api_dns_name: Option<String>,
    pub listen_ip: Option<IpAddr>,
    pub ca_validity_days: u32,
    pub cert_validity_days: u32,
    pub key_size: u32,
}

#[derive(Debug, Clone)]
pub struct PkiBundle {
    pub ca: CaCertificate,
    pub ca_cert_path: PathBuf,
    pub kubelet_cert_path: PathBuf,
    pub kubelet_key_path: PathBuf,
    /// Files created during this run; pre-existing ones are left out.
    pub written: Vec<PathBuf>,
}

/// Produces the CA and the master's own certificates.
pub trait PkiGenerator {
    fn generate(&self, request: &PkiRequest, logger: &mut dyn Logger) -> Result<PkiBundle>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct OpensslPki;

impl OpensslPki {
    /// Returns whether the pair was written. An existing pair is kept only while the
    /// current CA still verifies it.
    fn ensure_signed(
        &self,
        config: &CertificateConfig,
        pki_dir: &Path,
        ca: &X509,
        ca_key: &PKey<Private>,
        logger: &mut dyn Logger,
    ) -> Result<bool> {
        let cert_path = config.cert_path(pki_dir);
        let key_path = config.key_path(pki_dir);

        if cert_path.exists() && key_path.exists() {
            let ca_public = ca.public_key()?;
            match read_certificate(&cert_path) {
                Ok(existing) if existing.verify(&ca_public)? => {
                    logger.log(&format!(
                        "{} certificate already exists. Skipping creation.",
                        config.common_name
                    ));
                    return Ok(false);
                }
                Ok(_) => logger.log(&format!(
                    "{} certificate was not issued by the current CA, regenerating",
                    config.common_name
                )),
                Err(e) => logger.log(&format!(
                    "Existing {} certificate is unusable ({}), regenerating",
                    config.common_name, e
                )),
            }
        }

        logger.log(&format!("Generating certificate for {}", config.common_name));
        logger.debug_log(&format!("cert_type {:?}", config.cert_type));
        let (cert, key) = sign_certificate(config, ca, ca_key)?;
        write_private_key(&key_path, &key, logger)?;
        write_certificate(&cert_path, &cert, logger)?;
        Ok(true)
    }
}

impl PkiGenerator for OpensslPki {
    fn generate(&self, request: &PkiRequest, logger: &mut dyn Logger) -> Result<PkiBundle> {
        let pki_dir = request.pki_dir.as_path();
        let ca_cert_path = pki_dir.join("ca.crt");
        let ca_existed = ca_cert_path.exists() && pki_dir.join("ca.key").exists();

        let (ca, ca_key) = generate_or_load_ca(
            pki_dir,
            &request.ca_common_name,
            request.key_size,
            request.ca_validity_days,
            logger,
        )?;

        let mut written = Vec::new();
        if !ca_existed {
            written.push(ca_cert_path.clone());
            written.push(pki_dir.join("ca.key"));
        }

        let api_server = ApiServerCertGenerator::new(request.api_dns_name.clone(), request.listen_ip)
            .get_config(request.cert_validity_days, request.key_size);
        let kubelet = KubeletClientCertGenerator::get_config(
            &request.node_name,
            request.cert_validity_days,
            request.key_size,
        );

        for config in [&api_server, &kubelet] {
            if self.ensure_signed(config, pki_dir, &ca, &ca_key, logger)? {
                written.push(config.cert_path(pki_dir));
                written.push(config.key_path(pki_dir));
            }
        }

        Ok(PkiBundle {
            ca: CaCertificate::from_der(ca.to_der()?)?,
            ca_cert_path,
            kubelet_cert_path: kubelet.cert_path(pki_dir),
            kubelet_key_path: kubelet.key_path(pki_dir),
            written,
        })
    }
}
