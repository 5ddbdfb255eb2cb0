// src/manifests/pod.rs
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pod {
    pub api_version: String,
    pub kind: String,
    pub metadata: Metadata,
    pub spec: PodSpec,
}

#[derive(Debug, Serialize)]
pub struct Metadata {
    pub name: String,
    pub namespace: String,
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PodSpec {
    pub host_network: bool,
    pub containers: Vec<Container>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub name: String,
    pub image: String,
    pub command: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub volume_mounts: Vec<VolumeMount>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeMount {
    pub name: String,
    pub mount_path: String,
    pub read_only: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    pub name: String,
    pub host_path: HostPath,
}

#[derive(Debug, Serialize)]
pub struct HostPath {
    pub path: String,
}

impl Pod {
    pub fn static_pod(name: &str, container: Container, volumes: Vec<Volume>) -> Self {
        let mut labels = BTreeMap::new();
        labels.insert("component".to_string(), name.to_string());
        labels.insert("tier".to_string(), "control-plane".to_string());

        Self {
            api_version: "v1".to_string(),
            kind: "Pod".to_string(),
            metadata: Metadata {
                name: name.to_string(),
                namespace: "kube-system".to_string(),
                labels,
            },
            spec: PodSpec {
                host_network: true,
                containers: vec![container],
                volumes,
            },
        }
    }
}

impl Volume {
    pub fn host_dir(name: &str, path: &str) -> (Volume, VolumeMount) {
        (
            Volume {
                name: name.to_string(),
                host_path: HostPath {
                    path: path.to_string(),
                },
            },
            VolumeMount {
                name: name.to_string(),
                mount_path: path.to_string(),
                read_only: false,
            },
        )
    }
}
