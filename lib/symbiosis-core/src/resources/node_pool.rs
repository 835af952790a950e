use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use symbiosis_api::{NodePool, NodePoolInput, NodePoolUpdateInput};
use symbiosis_client::{Deleted, SymbiosisApi};

use crate::error::ValidationError;
use crate::mapper::{
    self, expand_autoscaling, expand_labels, expand_taints, flatten_autoscaling, flatten_labels,
    flatten_taints, Autoscaling, Taint,
};
use crate::reconciler::{ManagedResource, Reconciler};

/// Desired node pool
///
/// `name`, `cluster`, `node_type`, `labels` and `taints` are identity fields.
/// `quantity` and `autoscaling` can be patched in place.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodePoolSpec {
    pub name: String,
    pub cluster: String,
    pub node_type: String,
    pub quantity: i64,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub taints: Vec<Taint>,
    #[serde(default)]
    pub autoscaling: Option<Autoscaling>,
}

/// Node pool as last observed
#[derive(Clone, Debug, PartialEq)]
pub struct ObservedNodePool {
    pub id: String,
    pub name: String,
    pub cluster: String,
    pub node_type: String,
    pub quantity: u32,
    pub labels: BTreeMap<String, String>,
    pub taints: Vec<Taint>,
    pub autoscaling: Option<Autoscaling>,
    pub is_master: bool,
}

impl ObservedNodePool {
    /// Declared form of the observed attributes, for drift detection
    pub fn as_spec(&self) -> NodePoolSpec {
        NodePoolSpec {
            name: self.name.clone(),
            cluster: self.cluster.clone(),
            node_type: self.node_type.clone(),
            quantity: i64::from(self.quantity),
            labels: self.labels.clone(),
            taints: self.taints.clone(),
            autoscaling: self.autoscaling.clone(),
        }
    }
}

impl From<NodePool> for ObservedNodePool {
    fn from(pool: NodePool) -> Self {
        Self {
            labels: flatten_labels(&pool.labels),
            taints: flatten_taints(pool.taints.as_deref()),
            autoscaling: flatten_autoscaling(&pool.autoscaling),
            id: pool.id,
            name: pool.name,
            cluster: pool.cluster_name,
            node_type: pool.node_type_name,
            quantity: pool.desired_quantity,
            is_master: pool.is_master,
        }
    }
}

pub struct NodePoolResource;

pub type NodePoolReconciler = Reconciler<NodePoolResource>;

fn sorted(taints: &[Taint]) -> Vec<&Taint> {
    let mut taints: Vec<&Taint> = taints.iter().collect();
    taints.sort();
    taints
}

#[async_trait]
impl ManagedResource for NodePoolResource {
    type Spec = NodePoolSpec;
    type Key = String;
    type CreateRequest = NodePoolInput;
    type Observed = ObservedNodePool;
    type Patch = NodePoolUpdateInput;

    const KIND: &'static str = "node pool";

    fn label(spec: &NodePoolSpec) -> String {
        format!("{}/{}", spec.cluster, spec.name)
    }

    fn create_request(spec: &NodePoolSpec) -> Result<NodePoolInput, ValidationError> {
        mapper::non_empty("name", &spec.name)?;
        mapper::non_empty("cluster", &spec.cluster)?;
        mapper::non_empty("node_type", &spec.node_type)?;
        let quantity = mapper::quantity(spec.quantity)?;
        mapper::validate_autoscaling(spec.autoscaling.as_ref())?;

        Ok(NodePoolInput {
            name: spec.name.clone(),
            cluster_name: spec.cluster.clone(),
            node_type_name: spec.node_type.clone(),
            quantity,
            labels: expand_labels(&spec.labels),
            taints: expand_taints(&spec.taints),
            autoscaling: expand_autoscaling(spec.autoscaling.as_ref()),
        })
    }

    async fn submit(api: &dyn SymbiosisApi, request: &NodePoolInput) -> symbiosis_client::Result<String> {
        api.create_node_pool(request).await.map(|created| created.id)
    }

    async fn describe(api: &dyn SymbiosisApi, id: &String) -> symbiosis_client::Result<Option<ObservedNodePool>> {
        Ok(api.describe_node_pool(id).await?.map(ObservedNodePool::from))
    }

    /// Quantity and autoscaling travel together as a single patch
    fn changes(current: &NodePoolSpec, desired: &NodePoolSpec) -> Result<Vec<NodePoolUpdateInput>, ValidationError> {
        if current.name != desired.name {
            return Err(ValidationError::ImmutableField { field: "name" });
        }
        if current.cluster != desired.cluster {
            return Err(ValidationError::ImmutableField { field: "cluster" });
        }
        if current.node_type != desired.node_type {
            return Err(ValidationError::ImmutableField { field: "node_type" });
        }
        if current.labels != desired.labels {
            return Err(ValidationError::ImmutableField { field: "labels" });
        }
        if sorted(&current.taints) != sorted(&desired.taints) {
            return Err(ValidationError::ImmutableField { field: "taints" });
        }

        let mut patch = NodePoolUpdateInput::default();
        if current.quantity != desired.quantity {
            patch.quantity = Some(mapper::quantity(desired.quantity)?);
        }
        let desired_autoscaling = expand_autoscaling(desired.autoscaling.as_ref());
        if expand_autoscaling(current.autoscaling.as_ref()) != desired_autoscaling {
            mapper::validate_autoscaling(desired.autoscaling.as_ref())?;
            patch.autoscaling = Some(desired_autoscaling);
        }

        if patch.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![patch])
    }

    async fn apply_patch(api: &dyn SymbiosisApi, id: &String, patch: &NodePoolUpdateInput) -> symbiosis_client::Result<()> {
        api.update_node_pool(id, patch).await
    }

    async fn delete(api: &dyn SymbiosisApi, id: &String) -> symbiosis_client::Result<Deleted> {
        api.delete_node_pool(id).await
    }
}
