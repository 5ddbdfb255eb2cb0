use super::sequencer::SequenceOutcome;
use crate::error::BootstrapError;
use crate::kubeconfig::KubeconfigWrite;
use crate::types::Role;
use std::io::{self, Write};
use std::path::Path;

fn join_instructions(ca_cert_path: &Path) -> String {
    format!(
        "CA cert is written to {}. Please scp this to all your nodes before running:\n    \
         kubeadm manual bootstrap join-node --ca-cert-file <path-to-ca-cert> --api-server-urls http://<ip-of-master>:8080/\n",
        ca_cert_path.display()
    )
}

/// Prints what the operator needs to know about a finished run.
///
/// Returns the error for fatal outcomes the command should fail with. Missing flags are
/// printed here and not returned, so the command exits cleanly.
pub fn report(outcome: SequenceOutcome, out: &mut dyn Write) -> Result<(), BootstrapError> {
    let write_err = |e: io::Error| BootstrapError::io("writing to operator output", e);

    match outcome {
        SequenceOutcome::Complete {
            role,
            kubeconfig,
            ca_cert_path,
        } => {
            if let KubeconfigWrite::AlreadyExists(path) = &kubeconfig {
                writeln!(out, "Kubeconfig already present at {}, leaving it in place.", path.display())
                    .map_err(write_err)?;
            }
            match role {
                Role::Master => {
                    let written = match kubeconfig {
                        KubeconfigWrite::Written(_) => "Static pods written and kubelet's kubeconfig written.",
                        KubeconfigWrite::AlreadyExists(_) => "Static pods written, existing kubelet kubeconfig kept.",
                    };
                    write!(
                        out,
                        "{}\n\
                         Kubelet should be able to start soon (try systemctl restart kubelet or equivalent if it doesn't).\n",
                        written
                    )
                    .map_err(write_err)?;
                    if let Some(path) = ca_cert_path {
                        write!(out, "{}", join_instructions(&path)).map_err(write_err)?;
                    }
                }
                Role::Node => {
                    write!(
                        out,
                        "Kubelet started with given arguments, it should attempt TLS bootstrap now.\n\
                         Run 'kubectl get nodes' on the master to see it join.\n"
                    )
                    .map_err(write_err)?;
                }
            }
            Ok(())
        }
        SequenceOutcome::Degraded {
            role,
            warning,
            completed,
            ca_cert_path,
        } => {
            // PKI already finished, so nodes can still be joined once the kubeconfig is fixed.
            if let Some(path) = ca_cert_path {
                write!(out, "{}", join_instructions(&path)).map_err(write_err)?;
            }
            let done: Vec<String> = completed.iter().map(|s| s.to_string()).collect();
            write!(
                out,
                "Unable to write config for {}:\n{}\nCompleted steps: {}. Fix the problem above and re-run; finished steps are kept.\n",
                role,
                warning,
                done.join(", ")
            )
            .map_err(write_err)?;
            Ok(())
        }
        SequenceOutcome::Fatal(e) if e.is_user_facing() => {
            writeln!(out, "{}", e).map_err(write_err)?;
            Ok(())
        }
        SequenceOutcome::Fatal(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::sequencer::Step;
    use std::path::PathBuf;

    fn render(outcome: SequenceOutcome) -> (String, Result<(), BootstrapError>) {
        let mut out = Vec::new();
        let result = report(outcome, &mut out);
        (String::from_utf8(out).unwrap(), result)
    }

    #[test]
    fn node_success_message() {
        let (text, result) = render(SequenceOutcome::Complete {
            role: Role::Node,
            kubeconfig: KubeconfigWrite::Written(PathBuf::from("/etc/kubernetes/kubelet.conf")),
            ca_cert_path: None,
        });

        assert!(result.is_ok());
        assert!(text.starts_with("Kubelet started with given arguments"));
    }

    #[test]
    fn master_success_names_the_ca_path() {
        let (text, result) = render(SequenceOutcome::Complete {
            role: Role::Master,
            kubeconfig: KubeconfigWrite::Written(PathBuf::from("/etc/kubernetes/kubelet.conf")),
            ca_cert_path: Some(PathBuf::from("/etc/kubernetes/pki/ca.crt")),
        });

        assert!(result.is_ok());
        assert!(text.contains("CA cert is written to /etc/kubernetes/pki/ca.crt"));
        assert!(text.contains("kubeadm manual bootstrap join-node --ca-cert-file"));
    }

    #[test]
    fn degraded_is_a_warning_not_an_error() {
        let (text, result) = render(SequenceOutcome::Degraded {
            role: Role::Master,
            warning: BootstrapError::io(
                "creating /etc/kubernetes",
                io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
            ),
            completed: vec![Step::StaticPodManifests, Step::Pki],
            ca_cert_path: Some(PathBuf::from("/etc/kubernetes/pki/ca.crt")),
        });

        assert!(result.is_ok());
        assert!(text.starts_with("CA cert is written to /etc/kubernetes/pki/ca.crt"));
        assert!(text.contains("Unable to write config for master:\ncreating /etc/kubernetes"));
        assert!(text.contains("static pod manifests, PKI generation"));
    }

    #[test]
    fn degraded_node_has_no_join_instructions() {
        let (text, result) = render(SequenceOutcome::Degraded {
            role: Role::Node,
            warning: BootstrapError::io(
                "creating /etc/kubernetes",
                io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
            ),
            completed: vec![Step::Discovery],
            ca_cert_path: None,
        });

        assert!(result.is_ok());
        assert!(text.starts_with("Unable to write config for node:\n"));
        assert!(!text.contains("CA cert is written to"));
    }

    #[test]
    fn master_rerun_does_not_claim_kubeconfig_was_written() {
        let (text, result) = render(SequenceOutcome::Complete {
            role: Role::Master,
            kubeconfig: KubeconfigWrite::AlreadyExists(PathBuf::from("/etc/kubernetes/kubelet.conf")),
            ca_cert_path: Some(PathBuf::from("/etc/kubernetes/pki/ca.crt")),
        });

        assert!(result.is_ok());
        assert!(text.starts_with("Kubeconfig already present at /etc/kubernetes/kubelet.conf"));
        assert!(text.contains("existing kubelet kubeconfig kept"));
        assert!(!text.contains("kubeconfig written"));
    }

    #[test]
    fn missing_flag_is_printed_and_exits_cleanly() {
        let (text, result) = render(SequenceOutcome::Fatal(BootstrapError::missing(
            "--api-server-urls",
        )));

        assert!(result.is_ok());
        assert_eq!(text, "Must specify --api-server-urls (see --help)\n");
    }

    #[test]
    fn other_fatal_errors_propagate() {
        let (text, result) = render(SequenceOutcome::Fatal(BootstrapError::NotImplemented(
            "gossip discovery",
        )));

        assert!(text.is_empty());
        assert!(matches!(result, Err(BootstrapError::NotImplemented(_))));
    }
}
