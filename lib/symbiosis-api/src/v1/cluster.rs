use serde::{Deserialize, Serialize};
use std::fmt;

use super::node_pool::NodePool;

/// Request body for creating a cluster
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterInput {
    /// Cluster name, unique within the team
    pub name: String,

    /// Region slug (e.g., "eu-germany-1")
    pub region: String,

    /// Kubernetes version or "latest"
    pub kube_version: String,

    /// Node pools created together with the control plane
    #[serde(default)]
    pub nodes: Vec<ClusterNodePoolInput>,

    /// Add-on configuration
    #[serde(default)]
    pub configuration: ClusterConfiguration,

    /// Deploy a replicated control plane
    #[serde(default)]
    pub is_highly_available: bool,
}

/// Inline node pool in a cluster create request
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterNodePoolInput {
    pub node_type_name: String,
    pub quantity: u32,
}

/// Cluster add-on switches
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfiguration {
    #[serde(default)]
    pub enable_nginx_ingress: bool,
    #[serde(default)]
    pub enable_csi_driver: bool,
}

/// Response to a successful cluster create
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterCreated {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Cluster as returned by describe
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    #[serde(default)]
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub state: ClusterState,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kube_version: Option<String>,

    /// Kubernetes API server address, set once the control plane is up
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_server_endpoint: Option<String>,

    #[serde(default)]
    pub is_highly_available: bool,

    #[serde(default)]
    pub node_pools: Vec<NodePool>,
}

/// Credentials for reaching the cluster's API server
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterIdentity {
    #[serde(default)]
    pub certificate_pem: String,
    #[serde(default)]
    pub cluster_certificate_authority_pem: String,
    #[serde(default)]
    pub private_key_pem: String,
    #[serde(default)]
    pub kube_config: String,
}

impl fmt::Debug for ClusterIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterIdentity")
            .field("certificate_pem", &"<redacted>")
            .field("cluster_certificate_authority_pem", &"<redacted>")
            .field("private_key_pem", &"<redacted>")
            .field("kube_config", &"<redacted>")
            .finish()
    }
}

/// One page of the cluster listing
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterList {
    #[serde(default, alias = "clusters")]
    pub content: Vec<Cluster>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_elements: Option<u64>,
}

/// Cluster lifecycle state
///
/// Unrecognised states are kept verbatim so they can be reported while polling.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ClusterState {
    #[default]
    Pending,
    Active,
    DeleteInProgress,
    Failed,
    Other(String),
}

impl ClusterState {
    pub fn as_str(&self) -> &str {
        match self {
            ClusterState::Pending => "PENDING",
            ClusterState::Active => "ACTIVE",
            ClusterState::DeleteInProgress => "DELETE_IN_PROGRESS",
            ClusterState::Failed => "FAILED",
            ClusterState::Other(s) => s,
        }
    }
}

impl From<String> for ClusterState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "PENDING" => ClusterState::Pending,
            "ACTIVE" => ClusterState::Active,
            "DELETE_IN_PROGRESS" => ClusterState::DeleteInProgress,
            "FAILED" => ClusterState::Failed,
            _ => ClusterState::Other(s),
        }
    }
}

impl From<ClusterState> for String {
    fn from(state: ClusterState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for ClusterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
