// src/main.rs
mod app;
mod cert;
mod config;
mod discovery;
mod error;
mod kubeconfig;
mod manifests;
mod types;
mod utils;

use app::{run_bootstrap, Invocation};
use clap::{Args, Parser, Subcommand};
use std::{io, net::IpAddr, process::ExitCode};
use types::{DiscoveryKind, DiscoveryOptions, Role};

#[derive(Parser)]
#[command(name = "kubeadm", author, version, about = "Bootstrap a Kubernetes cluster", long_about = None)]
pub struct Cli {
    /// Bootstrap settings file (JSON); built-in defaults are used when absent
    #[arg(short, long, global = true)]
    pub config: Option<String>,
    /// Also append log lines to this file
    #[arg(long, global = true)]
    pub log_file: Option<String>,
    #[arg(short, long, global = true)]
    pub debug: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Advanced, less-automated functionality, for power users.
    Manual {
        #[command(subcommand)]
        command: ManualCommand,
    },
}

#[derive(Subcommand)]
pub enum ManualCommand {
    /// Manually bootstrap a cluster 'out-of-band', by generating and distributing a CA
    /// certificate to all your servers and specifying a (list of) API server URLs.
    Bootstrap {
        #[command(subcommand)]
        command: BootstrapCommand,
    },
}

#[derive(Subcommand)]
pub enum BootstrapCommand {
    /// Manually bootstrap a master 'out-of-band'. Creates TLS certificates and sets up
    /// static pods for Kubernetes master components.
    InitMaster(InitMasterArgs),
    /// Manually bootstrap a node 'out-of-band', joining it into a cluster with an extant
    /// control plane.
    JoinNode(JoinNodeArgs),
}

#[derive(Args)]
pub struct InitMasterArgs {
    /// (optional) DNS name for the API server, encoded into subjectAltName in the
    /// generated TLS certificates
    #[arg(long, default_value = "")]
    pub api_dns_name: String,
    /// (optional) IP address for the API server to advertise, rather than autodetect
    #[arg(long)]
    pub listen_ip: Option<IpAddr>,
    /// Comma separated list of API server URLs the local kubelet should use
    #[arg(long, default_value = "")]
    pub api_server_urls: String,
}

#[derive(Args)]
pub struct JoinNodeArgs {
    /// Path to the CA cert file, DER encoded (PEM is also detected). The same CA cert
    /// must be distributed to all servers.
    #[arg(long, default_value = "")]
    pub ca_cert_file: String,
    /// Comma separated list of API server URLs. Typically this might be just
    /// https://<address-of-master>:8080/
    #[arg(long, default_value = "")]
    pub api_server_urls: String,
    /// (optional) IP address to listen on, in case autodetection fails.
    #[arg(long)]
    pub listen_ip: Option<IpAddr>,
    #[arg(long, value_enum, default_value_t = DiscoveryKind::OutOfBand)]
    pub discovery: DiscoveryKind,
    /// Shared secret for gossip discovery
    #[arg(long, default_value = "")]
    pub token: String,
    /// Comma separated gossip peer addresses
    #[arg(long, default_value = "")]
    pub peers: String,
}

impl Cli {
    fn into_invocation(self) -> Invocation {
        let Command::Manual {
            command: ManualCommand::Bootstrap { command },
        } = self.command;

        let (role, options) = match command {
            BootstrapCommand::InitMaster(args) => (
                Role::Master,
                DiscoveryOptions {
                    api_server_urls: args.api_server_urls,
                    api_server_dns_name: Some(args.api_dns_name),
                    listen_ip: args.listen_ip,
                    ..DiscoveryOptions::default()
                },
            ),
            BootstrapCommand::JoinNode(args) => (
                Role::Node,
                DiscoveryOptions {
                    kind: args.discovery,
                    api_server_urls: args.api_server_urls,
                    ca_cert_file: args.ca_cert_file,
                    api_server_dns_name: None,
                    listen_ip: args.listen_ip,
                    token: args.token,
                    peers: args.peers,
                },
            ),
        };

        Invocation {
            role,
            options,
            config_path: self.config,
            log_file: self.log_file,
            debug: self.debug,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let mut stdout = io::stdout();

    match run_bootstrap(cli.into_invocation(), &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn join_node_flags_map_to_their_own_fields() {
        let cli = Cli::parse_from([
            "kubeadm",
            "manual",
            "bootstrap",
            "join-node",
            "--ca-cert-file=/tmp/ca.der",
            "--api-server-urls=https://10.0.0.1:6443/,https://10.0.0.2:6443/",
            "--listen-ip=10.0.0.7",
        ]);

        let invocation = cli.into_invocation();

        assert_eq!(invocation.role, Role::Node);
        assert_eq!(invocation.options.ca_cert_file, "/tmp/ca.der");
        assert_eq!(
            invocation.options.api_server_urls,
            "https://10.0.0.1:6443/,https://10.0.0.2:6443/"
        );
        assert_eq!(invocation.options.listen_ip, Some("10.0.0.7".parse().unwrap()));
    }

    #[test]
    fn init_master_accepts_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "kubeadm",
            "manual",
            "bootstrap",
            "init-master",
            "--api-dns-name=api.example.com",
            "--debug",
            "--config=/tmp/bootstrap.json",
        ]);

        let invocation = cli.into_invocation();

        assert_eq!(invocation.role, Role::Master);
        assert!(invocation.debug);
        assert_eq!(invocation.config_path.as_deref(), Some("/tmp/bootstrap.json"));
        assert_eq!(
            invocation.options.api_server_dns_name.as_deref(),
            Some("api.example.com")
        );
    }

    #[test]
    fn gossip_options_are_threaded_through() {
        let cli = Cli::parse_from([
            "kubeadm",
            "manual",
            "bootstrap",
            "join-node",
            "--discovery=gossip",
            "--token=abc.def",
            "--peers=10.0.0.1:7946,10.0.0.2:7946",
        ]);

        let options = cli.into_invocation().options;

        assert_eq!(options.kind, DiscoveryKind::Gossip);
        assert_eq!(options.token, "abc.def");
        assert_eq!(options.peers, "10.0.0.1:7946,10.0.0.2:7946");
    }
}
