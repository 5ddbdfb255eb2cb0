use super::{report, ProvisioningSequencer};
use crate::cert::OpensslPki;
use crate::config::BootstrapConfig;
use crate::error::{BootstrapError, Result};
use crate::manifests::StaticPodManifests;
use crate::types::{BootstrapParameters, DiscoveryOptions, Role, MASTER_API_SERVER_URLS};
use crate::utils::logging::{FileLogger, Logger, MultiLogger, StderrLogger};
use std::io::Write;

/// One `manual bootstrap` command, already parsed.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub role: Role,
    pub options: DiscoveryOptions,
    pub config_path: Option<String>,
    pub log_file: Option<String>,
    pub debug: bool,
}

fn load_config(path: Option<&str>) -> Result<BootstrapConfig> {
    let config = match path {
        Some(path) => BootstrapConfig::load_from_file(path)
            .map_err(|e| BootstrapError::Config(format!("{}: {}", path, e)))?,
        None => BootstrapConfig::default(),
    };
    config
        .validate()
        .map_err(|e| BootstrapError::Config(e.to_string()))?;
    Ok(config)
}

fn build_logger(log_file: Option<&str>, debug: bool) -> Result<Box<dyn Logger>> {
    let mut logger = MultiLogger::new().with(Box::new(StderrLogger::new(debug)));
    if let Some(path) = log_file {
        let file = FileLogger::new(path, debug)
            .map_err(|e| BootstrapError::io(format!("opening log file {}", path), e))?;
        logger = logger.with(Box::new(file));
    }
    Ok(Box::new(logger))
}

/// The master talks to its own API server and trusts the CA it is about to create.
fn master_defaults(mut options: DiscoveryOptions, config: &BootstrapConfig) -> DiscoveryOptions {
    if options.api_server_urls.trim().is_empty() {
        options.api_server_urls = MASTER_API_SERVER_URLS.to_string();
    }
    if options.ca_cert_file.is_empty() {
        options.ca_cert_file = config.ca_cert_path().display().to_string();
    }
    options
}

pub fn run_bootstrap(invocation: Invocation, out: &mut dyn Write) -> Result<()> {
    let config = load_config(invocation.config_path.as_deref())?;
    let mut logger = build_logger(invocation.log_file.as_deref(), invocation.debug)?;
    logger.log(&format!("Starting manual bootstrap as {}", invocation.role));

    let options = match invocation.role {
        Role::Master => master_defaults(invocation.options, &config),
        Role::Node => invocation.options,
    };
    let params = BootstrapParameters::assemble(invocation.role, options);

    let outcome =
        ProvisioningSequencer::new(&config, &StaticPodManifests, &OpensslPki, logger).run(params);
    report(outcome, out)
}
