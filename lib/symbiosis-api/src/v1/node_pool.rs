use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Request body for creating a node pool
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePoolInput {
    pub name: String,
    pub cluster_name: String,
    pub node_type_name: String,
    pub quantity: u32,
    #[serde(default)]
    pub labels: Vec<NodeLabel>,
    #[serde(default)]
    pub taints: Vec<NodeTaint>,
    #[serde(default)]
    pub autoscaling: AutoscalingSettings,
}

/// Response to a successful node pool create
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodePoolCreated {
    #[serde(alias = "ID", alias = "nodePoolId")]
    pub id: String,
}

/// In-place patch of a node pool
///
/// Only the members that are set are sent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePoolUpdateInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoscaling: Option<AutoscalingSettings>,
}

impl NodePoolUpdateInput {
    pub fn is_empty(&self) -> bool {
        self.quantity.is_none() && self.autoscaling.is_none()
    }
}

/// Node pool as returned by describe
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePool {
    #[serde(alias = "ID")]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub cluster_name: String,

    pub node_type_name: String,

    /// Set for the pool hosting the control plane
    #[serde(default)]
    pub is_master: bool,

    #[serde(default)]
    pub desired_quantity: u32,

    #[serde(default)]
    pub labels: Vec<NodeLabel>,

    /// The API may return `null` here
    #[serde(default)]
    pub taints: Option<Vec<NodeTaint>>,

    #[serde(default)]
    pub autoscaling: AutoscalingSettings,
}

/// Kubernetes label applied to every node of a pool
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeLabel {
    pub key: String,
    pub value: String,
}

/// Kubernetes taint applied to every node of a pool
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeTaint {
    pub key: String,
    pub value: String,
    pub effect: SchedulerEffect,
}

/// Taint effect
/// See: https://kubernetes.io/docs/concepts/scheduling-eviction/taint-and-toleration/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SchedulerEffect {
    NoSchedule,
    PreferNoSchedule,
    NoExecute,
}

impl SchedulerEffect {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchedulerEffect::NoSchedule => "NoSchedule",
            SchedulerEffect::PreferNoSchedule => "PreferNoSchedule",
            SchedulerEffect::NoExecute => "NoExecute",
        }
    }
}

impl fmt::Display for SchedulerEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchedulerEffect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NoSchedule" => Ok(SchedulerEffect::NoSchedule),
            "PreferNoSchedule" => Ok(SchedulerEffect::PreferNoSchedule),
            "NoExecute" => Ok(SchedulerEffect::NoExecute),
            other => Err(format!(
                "invalid taint effect {other:?}, expected NoSchedule, PreferNoSchedule or NoExecute"
            )),
        }
    }
}

/// Cluster autoscaler bounds for a pool
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoscalingSettings {
    pub enabled: bool,
    pub min_size: u32,
    pub max_size: u32,
}
