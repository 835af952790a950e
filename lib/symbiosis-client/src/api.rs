//! Typed operations of the Symbiosis API

use async_trait::async_trait;
use reqwest::Method;
use symbiosis_api::v1::paths;
use symbiosis_api::{
    Cluster, ClusterCreated, ClusterIdentity, ClusterInput, ClusterList, NodePool,
    NodePoolCreated, NodePoolInput, NodePoolUpdateInput, ServiceAccount, TeamMember,
    TeamMemberInvite, TeamMemberRoleUpdate,
};
use tracing::debug;

use crate::client::SymbiosisClient;
use crate::error::Result;

/// Outcome of a delete call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Deleted {
    /// The API accepted the delete
    Accepted,
    /// The entity did not exist
    AlreadyAbsent,
}

impl From<bool> for Deleted {
    fn from(existed: bool) -> Self {
        if existed {
            Deleted::Accepted
        } else {
            Deleted::AlreadyAbsent
        }
    }
}

/// Typed Symbiosis API surface
///
/// Describe operations return `Ok(None)` for a 404. Every other non-2xx status is an error.
#[async_trait]
pub trait SymbiosisApi: Send + Sync {
    async fn list_clusters(&self) -> Result<ClusterList>;
    async fn create_cluster(&self, input: &ClusterInput) -> Result<ClusterCreated>;
    async fn describe_cluster(&self, name: &str) -> Result<Option<Cluster>>;
    async fn cluster_identity(&self, name: &str) -> Result<Option<ClusterIdentity>>;
    async fn delete_cluster(&self, name: &str) -> Result<Deleted>;

    async fn create_node_pool(&self, input: &NodePoolInput) -> Result<NodePoolCreated>;
    async fn describe_node_pool(&self, id: &str) -> Result<Option<NodePool>>;
    async fn update_node_pool(&self, id: &str, input: &NodePoolUpdateInput) -> Result<()>;
    async fn delete_node_pool(&self, id: &str) -> Result<Deleted>;

    async fn invite_team_members(&self, input: &TeamMemberInvite) -> Result<()>;
    async fn describe_team_member(&self, email: &str) -> Result<Option<TeamMember>>;
    async fn describe_team_invitation(&self, email: &str) -> Result<Option<TeamMember>>;
    async fn update_team_member_role(&self, email: &str, input: &TeamMemberRoleUpdate) -> Result<()>;
    /// Removes an accepted member or revokes a pending invitation
    async fn delete_team_member(&self, email: &str) -> Result<Deleted>;

    async fn create_service_account(&self, cluster: &str) -> Result<ServiceAccount>;
    async fn describe_service_account(&self, cluster: &str, id: &str) -> Result<Option<ServiceAccount>>;
    async fn delete_service_account(&self, cluster: &str, id: &str) -> Result<Deleted>;
}

#[async_trait]
impl SymbiosisApi for SymbiosisClient {
    async fn list_clusters(&self) -> Result<ClusterList> {
        self.probe().await
    }

    async fn create_cluster(&self, input: &ClusterInput) -> Result<ClusterCreated> {
        debug!("Creating cluster {} in {}", input.name, input.region);
        self.send_json_or_default(Method::POST, &paths::clusters(), input).await
    }

    async fn describe_cluster(&self, name: &str) -> Result<Option<Cluster>> {
        self.get(&paths::cluster(name)).await
    }

    async fn cluster_identity(&self, name: &str) -> Result<Option<ClusterIdentity>> {
        self.get(&paths::cluster_identity(name)).await
    }

    async fn delete_cluster(&self, name: &str) -> Result<Deleted> {
        debug!("Deleting cluster {}", name);
        self.delete(&paths::cluster(name)).await.map(Deleted::from)
    }

    async fn create_node_pool(&self, input: &NodePoolInput) -> Result<NodePoolCreated> {
        debug!(
            "Creating node pool {} with type {} for cluster {}",
            input.name, input.node_type_name, input.cluster_name
        );
        self.send_json(Method::POST, &paths::node_pools(), input).await
    }

    async fn describe_node_pool(&self, id: &str) -> Result<Option<NodePool>> {
        self.get(&paths::node_pool(id)).await
    }

    async fn update_node_pool(&self, id: &str, input: &NodePoolUpdateInput) -> Result<()> {
        debug!("Updating node pool {}: {:?}", id, input);
        self.send_unit(Method::PUT, &paths::node_pool(id), Some(input)).await
    }

    async fn delete_node_pool(&self, id: &str) -> Result<Deleted> {
        debug!("Deleting node pool {}", id);
        self.delete(&paths::node_pool(id)).await.map(Deleted::from)
    }

    async fn invite_team_members(&self, input: &TeamMemberInvite) -> Result<()> {
        debug!("Inviting {:?} as {}", input.emails, input.role);
        self.send_unit(Method::POST, &paths::team_invitations(), Some(input)).await
    }

    async fn describe_team_member(&self, email: &str) -> Result<Option<TeamMember>> {
        self.get(&paths::team_member(email)).await
    }

    async fn describe_team_invitation(&self, email: &str) -> Result<Option<TeamMember>> {
        self.get(&paths::team_invitation(email)).await
    }

    async fn update_team_member_role(&self, email: &str, input: &TeamMemberRoleUpdate) -> Result<()> {
        debug!("Changing role of {} to {}", email, input.role);
        self.send_unit(Method::POST, &paths::team_member(email), Some(input)).await
    }

    async fn delete_team_member(&self, email: &str) -> Result<Deleted> {
        debug!("Removing team member {}", email);
        self.delete(&paths::team_member(email)).await.map(Deleted::from)
    }

    async fn create_service_account(&self, cluster: &str) -> Result<ServiceAccount> {
        debug!("Creating service account in cluster {}", cluster);
        self.send_json(Method::POST, &paths::service_accounts(cluster), &serde_json::json!({}))
            .await
    }

    async fn describe_service_account(&self, cluster: &str, id: &str) -> Result<Option<ServiceAccount>> {
        self.get(&paths::service_account(cluster, id)).await
    }

    async fn delete_service_account(&self, cluster: &str, id: &str) -> Result<Deleted> {
        debug!("Deleting service account {} in cluster {}", id, cluster);
        self.delete(&paths::service_account(cluster, id)).await.map(Deleted::from)
    }
}
