use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use symbiosis_api::ServiceAccount;
use symbiosis_client::{Deleted, SymbiosisApi};

use crate::error::ValidationError;
use crate::mapper;
use crate::reconciler::{ManagedResource, Reconciler};

/// Desired service account of the calling user in a cluster
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAccountSpec {
    pub cluster_name: String,
}

/// Service accounts are addressed through their cluster
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ServiceAccountKey {
    pub cluster: String,
    pub id: String,
}

impl fmt::Display for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.cluster, self.id)
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct ObservedServiceAccount {
    pub id: String,
    pub cluster_name: String,
    pub token: String,
    pub cluster_ca_certificate: String,
    pub kube_config: String,
}

impl fmt::Debug for ObservedServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservedServiceAccount")
            .field("id", &self.id)
            .field("cluster_name", &self.cluster_name)
            .finish_non_exhaustive()
    }
}

impl ObservedServiceAccount {
    fn from_wire(cluster: &str, account: ServiceAccount) -> Self {
        Self {
            id: account.id,
            cluster_name: cluster.to_string(),
            token: account.service_account_token,
            cluster_ca_certificate: account.cluster_certificate_authority,
            kube_config: account.kube_config,
        }
    }
}

pub struct ServiceAccountResource;

pub type ServiceAccountReconciler = Reconciler<ServiceAccountResource>;

#[async_trait]
impl ManagedResource for ServiceAccountResource {
    type Spec = ServiceAccountSpec;
    type Key = ServiceAccountKey;
    /// Name of the owning cluster
    type CreateRequest = String;
    type Observed = ObservedServiceAccount;
    type Patch = Infallible;

    const KIND: &'static str = "service account";

    fn label(spec: &ServiceAccountSpec) -> String {
        spec.cluster_name.clone()
    }

    fn create_request(spec: &ServiceAccountSpec) -> Result<String, ValidationError> {
        mapper::non_empty("cluster_name", &spec.cluster_name)?;
        Ok(spec.cluster_name.clone())
    }

    async fn submit(api: &dyn SymbiosisApi, cluster: &String) -> symbiosis_client::Result<ServiceAccountKey> {
        let account = api.create_service_account(cluster).await?;
        Ok(ServiceAccountKey {
            cluster: cluster.clone(),
            id: account.id,
        })
    }

    async fn describe(
        api: &dyn SymbiosisApi,
        key: &ServiceAccountKey,
    ) -> symbiosis_client::Result<Option<ObservedServiceAccount>> {
        let account = api.describe_service_account(&key.cluster, &key.id).await?;
        Ok(account.map(|a| ObservedServiceAccount::from_wire(&key.cluster, a)))
    }

    fn changes(current: &ServiceAccountSpec, desired: &ServiceAccountSpec) -> Result<Vec<Infallible>, ValidationError> {
        if current.cluster_name != desired.cluster_name {
            return Err(ValidationError::ImmutableField { field: "cluster_name" });
        }
        Ok(Vec::new())
    }

    async fn apply_patch(_api: &dyn SymbiosisApi, _key: &ServiceAccountKey, patch: &Infallible) -> symbiosis_client::Result<()> {
        match *patch {}
    }

    async fn delete(api: &dyn SymbiosisApi, key: &ServiceAccountKey) -> symbiosis_client::Result<Deleted> {
        api.delete_service_account(&key.cluster, &key.id).await
    }
}
