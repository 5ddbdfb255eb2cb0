mod kube;

pub use kube::{KubeConfigGenerator, KubeconfigWrite, KubeletCredentials};
