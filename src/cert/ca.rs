use super::openssl::{
    read_certificate, read_private_key, self_signed_ca, write_certificate, write_private_key,
};
use crate::error::{BootstrapError, Result};
use crate::utils::logging::Logger;
use openssl::{
    pkey::{PKey, Private},
    x509::X509,
};
use std::{fs, path::Path};

/// Loads the CA from `pki_dir` when both halves exist, otherwise creates it.
///
/// An existing CA may already be trusted by running workloads, so it is never replaced.
pub fn generate_or_load_ca(
    pki_dir: &Path,
    common_name: &str,
    key_size: u32,
    validity_days: u32,
    logger: &mut dyn Logger,
) -> Result<(X509, PKey<Private>)> {
    let cert_path = pki_dir.join("ca.crt");
    let key_path = pki_dir.join("ca.key");

    if cert_path.exists() && key_path.exists() {
        logger.log("CA certificate files already exist. Skipping creation.");
        return Ok((read_certificate(&cert_path)?, read_private_key(&key_path)?));
    }

    logger.log("Generating Kubernetes CA certificate...");
    fs::create_dir_all(pki_dir)
        .map_err(|e| BootstrapError::io(format!("creating {}", pki_dir.display()), e))?;

    let (cert, key) = self_signed_ca(common_name, key_size, validity_days)?;
    write_private_key(&key_path, &key, logger)?;
    write_certificate(&cert_path, &cert, logger)?;

    logger.log("Kubernetes CA certificate generated successfully");
    Ok((cert, key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::logging::testing::MemoryLogger;

    #[test]
    fn existing_ca_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let mut logger = MemoryLogger::default();

        let (first, _) = generate_or_load_ca(dir.path(), "kubernetes", 2048, 10, &mut logger).unwrap();
        let before = fs::read(dir.path().join("ca.crt")).unwrap();
        let (second, _) = generate_or_load_ca(dir.path(), "kubernetes", 2048, 10, &mut logger).unwrap();

        assert_eq!(first.to_der().unwrap(), second.to_der().unwrap());
        assert_eq!(fs::read(dir.path().join("ca.crt")).unwrap(), before);
        assert!(logger.contains("Skipping creation"));
    }

    #[test]
    fn lone_certificate_without_key_is_regenerated() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("ca.crt"), "stale").unwrap();
        let mut logger = MemoryLogger::default();

        generate_or_load_ca(dir.path(), "kubernetes", 2048, 10, &mut logger).unwrap();

        assert!(dir.path().join("ca.key").exists());
        assert_ne!(fs::read(dir.path().join("ca.crt")).unwrap(), b"stale");
    }
}
