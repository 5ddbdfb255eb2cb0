// src/cert/openssl.rs
use super::types::{AltName, CertificateConfig, ExtendedKeyUsage};
use crate::error::{BootstrapError, Result};
use crate::utils::logging::Logger;
use openssl::{
    asn1::Asn1Time,
    bn::{BigNum, MsbOption},
    error::ErrorStack,
    hash::MessageDigest,
    pkey::{PKey, Private},
    rsa::Rsa,
    x509::{
        extension::{
            AuthorityKeyIdentifier, BasicConstraints, ExtendedKeyUsage as ExtKeyUsage, KeyUsage,
            SubjectAlternativeName, SubjectKeyIdentifier,
        },
        X509Name, X509NameBuilder, X509,
    },
};
use std::{fs, path::Path};

pub fn generate_private_key(key_size: u32) -> std::result::Result<PKey<Private>, ErrorStack> {
    let rsa = Rsa::generate(key_size)?;
    PKey::from_rsa(rsa)
}

fn build_name(common_name: &str, organization: Option<&str>) -> std::result::Result<X509Name, ErrorStack> {
    let mut name = X509NameBuilder::new()?;
    if let Some(org) = organization {
        name.append_entry_by_text("O", org)?;
    }
    name.append_entry_by_text("CN", common_name)?;
    Ok(name.build())
}

fn random_serial() -> std::result::Result<openssl::asn1::Asn1Integer, ErrorStack> {
    let mut serial = BigNum::new()?;
    serial.rand(159, MsbOption::MAYBE_ZERO, false)?;
    serial.to_asn1_integer()
}

pub fn self_signed_ca(
    common_name: &str,
    key_size: u32,
    validity_days: u32,
) -> std::result::Result<(X509, PKey<Private>), ErrorStack> {
    let key = generate_private_key(key_size)?;
    let name = build_name(common_name, None)?;

    let mut builder = X509::builder()?;
    builder.set_version(2)?;
    let serial = random_serial()?;
    builder.set_serial_number(&serial)?;
    builder.set_subject_name(&name)?;
    builder.set_issuer_name(&name)?;
    builder.set_pubkey(&key)?;
    let not_before = Asn1Time::days_from_now(0)?;
    builder.set_not_before(&not_before)?;
    let not_after = Asn1Time::days_from_now(validity_days)?;
    builder.set_not_after(&not_after)?;

    builder.append_extension(BasicConstraints::new().critical().ca().build()?)?;
    builder.append_extension(
        KeyUsage::new()
            .critical()
            .key_cert_sign()
            .crl_sign()
            .digital_signature()
            .build()?,
    )?;
    let ski = SubjectKeyIdentifier::new().build(&builder.x509v3_context(None, None))?;
    builder.append_extension(ski)?;

    builder.sign(&key, MessageDigest::sha256())?;
    Ok((builder.build(), key))
}

pub fn sign_certificate(
    config: &CertificateConfig,
    ca_cert: &X509,
    ca_key: &PKey<Private>,
) -> std::result::Result<(X509, PKey<Private>), ErrorStack> {
    let key = generate_private_key(config.key_size)?;
    let name = build_name(&config.common_name, config.organization.as_deref())?;

    let mut builder = X509::builder()?;
    builder.set_version(2)?;
    let serial = random_serial()?;
    builder.set_serial_number(&serial)?;
    builder.set_subject_name(&name)?;
    builder.set_issuer_name(ca_cert.subject_name())?;
    builder.set_pubkey(&key)?;
    let not_before = Asn1Time::days_from_now(0)?;
    builder.set_not_before(&not_before)?;
    let not_after = Asn1Time::days_from_now(config.validity_days)?;
    builder.set_not_after(&not_after)?;

    builder.append_extension(BasicConstraints::new().build()?)?;
    builder.append_extension(
        KeyUsage::new()
            .critical()
            .digital_signature()
            .key_encipherment()
            .build()?,
    )?;

    if !config.extended_key_usage.is_empty() {
        let mut eku = ExtKeyUsage::new();
        for usage in &config.extended_key_usage {
            match usage {
                ExtendedKeyUsage::ServerAuth => eku.server_auth(),
                ExtendedKeyUsage::ClientAuth => eku.client_auth(),
            };
        }
        builder.append_extension(eku.build()?)?;
    }

    if !config.alt_names.is_empty() {
        let mut san = SubjectAlternativeName::new();
        for alt in &config.alt_names {
            match alt {
                AltName::Dns(dns) => san.dns(dns),
                AltName::Ip(ip) => san.ip(&ip.to_string()),
            };
        }
        let san = san.build(&builder.x509v3_context(Some(ca_cert), None))?;
        builder.append_extension(san)?;
    }

    let aki = AuthorityKeyIdentifier::new()
        .keyid(true)
        .build(&builder.x509v3_context(Some(ca_cert), None))?;
    builder.append_extension(aki)?;

    builder.sign(ca_key, MessageDigest::sha256())?;
    Ok((builder.build(), key))
}

pub fn write_certificate(path: &Path, cert: &X509, logger: &mut dyn Logger) -> Result<()> {
    logger.debug_log(&format!("Writing certificate: {}", path.display()));
    let pem = cert.to_pem()?;
    fs::write(path, pem)
        .map_err(|e| BootstrapError::io(format!("writing {}", path.display()), e))
}

pub fn write_private_key(path: &Path, key: &PKey<Private>, logger: &mut dyn Logger) -> Result<()> {
    logger.debug_log(&format!("Writing private key: {}", path.display()));
    let pem = key.private_key_to_pem_pkcs8()?;
    fs::write(path, pem)
        .map_err(|e| BootstrapError::io(format!("writing {}", path.display()), e))?;

    // Set proper permissions
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .map_err(|e| BootstrapError::io(format!("restricting {}", path.display()), e))?;
    }

    Ok(())
}

pub fn read_certificate(path: &Path) -> Result<X509> {
    let pem = fs::read(path).map_err(|e| BootstrapError::io(format!("reading {}", path.display()), e))?;
    X509::from_pem(&pem).map_err(|e| BootstrapError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

pub fn read_private_key(path: &Path) -> Result<PKey<Private>> {
    let pem = fs::read(path).map_err(|e| BootstrapError::io(format!("reading {}", path.display()), e))?;
    PKey::private_key_from_pem(&pem).map_err(|e| BootstrapError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
