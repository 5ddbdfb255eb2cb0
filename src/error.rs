// src/error.rs
use std::{io, path::PathBuf};
use thiserror::Error;

/// Everything that can stop a bootstrap step.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// A flag the chosen role needs was left empty. Reported to the operator as-is.
    #[error("Must specify {flag} (see --help)")]
    MissingRequiredField { flag: &'static str },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("unable to parse certificate {}: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("{0} is not implemented yet")]
    NotImplemented(&'static str),

    #[error("PKI generation failed: {0}")]
    Pki(#[from] openssl::error::ErrorStack),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl BootstrapError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn missing(flag: &'static str) -> Self {
        Self::MissingRequiredField { flag }
    }

    /// Missing flags are operator mistakes: the command prints them and exits cleanly.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Self::MissingRequiredField { .. })
    }
}

impl From<serde_json::Error> for BootstrapError {
    fn from(error: serde_json::Error) -> Self {
        BootstrapError::Serialization(error.to_string())
    }
}

impl From<serde_yaml::Error> for BootstrapError {
    fn from(error: serde_yaml::Error) -> Self {
        BootstrapError::Serialization(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BootstrapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_names_the_flag() {
        let err = BootstrapError::missing("--ca-cert-file");
        assert_eq!(err.to_string(), "Must specify --ca-cert-file (see --help)");
        assert!(err.is_user_facing());
    }

    #[test]
    fn io_error_keeps_context_and_source() {
        let err = BootstrapError::io(
            "writing /etc/kubernetes/pki/ca.crt",
            io::Error::new(io::ErrorKind::Other, "disk full"),
        );
        assert_eq!(err.to_string(), "writing /etc/kubernetes/pki/ca.crt: disk full");
        assert!(!err.is_user_facing());
    }
}
