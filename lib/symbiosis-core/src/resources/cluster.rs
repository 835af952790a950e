use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use symbiosis_api::{Cluster, ClusterConfiguration, ClusterIdentity, ClusterInput, ClusterState};
use symbiosis_client::{Deleted, SymbiosisApi};
use tracing::debug;

use super::node_pool::ObservedNodePool;
use crate::error::{Action, ReconcileError, Result, ValidationError};
use crate::mapper::{self, expand_cluster_nodes};
use crate::reconciler::{ManagedResource, Reconciler};

fn latest() -> String {
    "latest".to_string()
}

/// Node pool declared inline with its cluster
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterNodeSpec {
    pub node_type: String,
    pub quantity: i64,
}

/// Desired cluster, every field is an identity field
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClusterSpec {
    pub name: String,
    pub region: String,
    #[serde(default = "latest")]
    pub kube_version: String,
    #[serde(default)]
    pub is_highly_available: bool,
    #[serde(default)]
    pub nodes: Vec<ClusterNodeSpec>,
    #[serde(default)]
    pub configuration: ClusterConfiguration,
}

/// Cluster as last observed, with its credentials once they are available
#[derive(Clone, Debug, PartialEq)]
pub struct ObservedCluster {
    pub id: String,
    pub name: String,
    pub state: ClusterState,
    pub region: Option<String>,
    pub kube_version: Option<String>,
    pub api_server_endpoint: Option<String>,
    pub is_highly_available: bool,
    /// Summaries embedded in the cluster describe, possibly without name, labels or taints
    pub node_pools: Vec<ObservedNodePool>,
    pub identity: Option<ClusterIdentity>,
}

impl From<Cluster> for ObservedCluster {
    fn from(cluster: Cluster) -> Self {
        Self {
            id: cluster.id,
            name: cluster.name,
            state: cluster.state,
            region: cluster.region,
            kube_version: cluster.kube_version,
            api_server_endpoint: cluster.api_server_endpoint,
            is_highly_available: cluster.is_highly_available,
            node_pools: cluster.node_pools.into_iter().map(ObservedNodePool::from).collect(),
            identity: None,
        }
    }
}

pub struct ClusterResource;

pub type ClusterReconciler = Reconciler<ClusterResource>;

#[async_trait]
impl ManagedResource for ClusterResource {
    type Spec = ClusterSpec;
    type Key = String;
    type CreateRequest = ClusterInput;
    type Observed = ObservedCluster;
    type Patch = Infallible;

    const KIND: &'static str = "cluster";

    fn label(spec: &ClusterSpec) -> String {
        spec.name.clone()
    }

    fn create_request(spec: &ClusterSpec) -> std::result::Result<ClusterInput, ValidationError> {
        mapper::non_empty("name", &spec.name)?;
        mapper::non_empty("region", &spec.region)?;
        mapper::non_empty("kube_version", &spec.kube_version)?;

        Ok(ClusterInput {
            name: spec.name.clone(),
            region: spec.region.clone(),
            kube_version: spec.kube_version.clone(),
            nodes: expand_cluster_nodes(&spec.nodes)?,
            configuration: spec.configuration.clone(),
            is_highly_available: spec.is_highly_available,
        })
    }

    async fn submit(api: &dyn SymbiosisApi, request: &ClusterInput) -> symbiosis_client::Result<String> {
        let created = api.create_cluster(request).await?;
        debug!("Cluster {} was assigned id {}", created.name, created.id);
        if created.name.is_empty() {
            return Ok(request.name.clone());
        }
        Ok(created.name)
    }

    async fn describe(api: &dyn SymbiosisApi, name: &String) -> symbiosis_client::Result<Option<ObservedCluster>> {
        Ok(api.describe_cluster(name).await?.map(ObservedCluster::from))
    }

    async fn observe(api: &dyn SymbiosisApi, name: &String) -> symbiosis_client::Result<Option<ObservedCluster>> {
        let Some(mut cluster) = Self::describe(api, name).await? else {
            return Ok(None);
        };
        cluster.identity = api.cluster_identity(name).await?;
        Ok(Some(cluster))
    }

    fn changes(current: &ClusterSpec, desired: &ClusterSpec) -> std::result::Result<Vec<Infallible>, ValidationError> {
        let field = if current.name != desired.name {
            "name"
        } else if current.region != desired.region {
            "region"
        } else if current.kube_version != desired.kube_version {
            "kube_version"
        } else if current.is_highly_available != desired.is_highly_available {
            "is_highly_available"
        } else if current.nodes != desired.nodes {
            "nodes"
        } else if current.configuration != desired.configuration {
            "configuration"
        } else {
            return Ok(Vec::new());
        };
        Err(ValidationError::ImmutableField { field })
    }

    async fn apply_patch(_api: &dyn SymbiosisApi, _name: &String, patch: &Infallible) -> symbiosis_client::Result<()> {
        match *patch {}
    }

    async fn delete(api: &dyn SymbiosisApi, name: &String) -> symbiosis_client::Result<Deleted> {
        api.delete_cluster(name).await
    }

    fn state(cluster: &ObservedCluster) -> String {
        cluster.state.to_string()
    }

    fn is_converged(cluster: &ObservedCluster) -> bool {
        cluster.state == ClusterState::Active
    }
}

/// Look up an existing cluster by name, together with its identity
///
/// Unlike [`Reconciler::read`], an absent cluster is an error.
pub async fn describe_cluster_data(api: &dyn SymbiosisApi, name: &str) -> Result<ObservedCluster> {
    let name = name.to_string();
    ClusterResource::observe(api, &name)
        .await
        .map_err(|source| ReconcileError::Client {
            kind: ClusterResource::KIND,
            key: name.clone(),
            action: Action::Read,
            source,
        })?
        .ok_or(ReconcileError::NotFound {
            kind: ClusterResource::KIND,
            key: name,
        })
}
