// src/cert/material.rs
use crate::error::{BootstrapError, Result};
use chrono::{DateTime, TimeZone, Utc};
use std::path::Path;
use x509_parser::prelude::{FromDer, ParsedExtension, X509Certificate};

const PEM_HEADER: &[u8] = b"-----BEGIN CERTIFICATE-----";

/// A parsed CA certificate together with the bytes it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct CaCertificate {
    pub raw: Vec<u8>,
    pub der: Vec<u8>,
    pub subject: String,
    pub not_after: DateTime<Utc>,
    pub is_ca: bool,
    /// SHA-256 over the DER encoding, hex encoded.
    pub fingerprint: String,
}

impl CaCertificate {
    /// DER is the canonical input. PEM is only accepted when the certificate header is
    /// present; anything else is decoded as DER.
    pub fn parse(raw: Vec<u8>, origin: &Path) -> Result<Self> {
        let parse_error = |reason: String| BootstrapError::Parse {
            path: origin.to_path_buf(),
            reason,
        };

        let der = if raw.starts_with(PEM_HEADER) {
            openssl::x509::X509::from_pem(&raw)
                .and_then(|cert| cert.to_der())
                .map_err(|e| parse_error(format!("invalid PEM certificate: {}", e)))?
        } else {
            raw.clone()
        };

        let (remainder, cert) = X509Certificate::from_der(&der)
            .map_err(|e| parse_error(format!("invalid DER certificate: {}", e)))?;
        if !remainder.is_empty() {
            return Err(parse_error(format!(
                "{} trailing byte(s) after the certificate",
                remainder.len()
            )));
        }

        let not_after = Utc
            .timestamp_opt(cert.validity().not_after.timestamp(), 0)
            .single()
            .ok_or_else(|| parse_error("invalid not_after timestamp".to_string()))?;

        let is_ca = cert
            .extensions()
            .iter()
            .find_map(|ext| match ext.parsed_extension() {
                ParsedExtension::BasicConstraints(bc) => Some(bc.ca),
                _ => None,
            })
            .unwrap_or(false);

        let subject = cert.subject().to_string();
        let fingerprint = hex::encode(openssl::hash::hash(
            openssl::hash::MessageDigest::sha256(),
            &der,
        )?);

        Ok(Self {
            raw,
            der,
            subject,
            not_after,
            is_ca,
            fingerprint,
        })
    }

    pub fn from_der(der: Vec<u8>) -> Result<Self> {
        Self::parse(der, Path::new("<generated>"))
    }

    /// PEM text of the certificate, regardless of how it was read.
    pub fn to_pem(&self) -> Result<Vec<u8>> {
        Ok(openssl::x509::X509::from_der(&self.der)?.to_pem()?)
    }
}
