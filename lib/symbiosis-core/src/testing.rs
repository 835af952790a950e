//! Scripted in-memory `SymbiosisApi` for reconciler tests

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use symbiosis_api::{
    ApiError, Cluster, ClusterCreated, ClusterIdentity, ClusterInput, ClusterList, ClusterState,
    NodePool, NodePoolCreated, NodePoolInput, NodePoolUpdateInput, ServiceAccount, TeamMember,
    TeamMemberInvite, TeamMemberRoleUpdate,
};
use symbiosis_client::{Deleted, Result, SymbiosisApi};

/// One scripted response
#[derive(Clone, Debug)]
pub(crate) enum Reply<T> {
    Ok(T),
    Absent,
    Fail(ApiError),
}

/// Replies handed out in order, the last one repeats forever
#[derive(Debug)]
struct Script<T> {
    replies: VecDeque<Reply<T>>,
}

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self {
            replies: VecDeque::new(),
        }
    }
}

impl<T: Clone> Script<T> {
    fn next(&mut self) -> Reply<T> {
        if self.replies.len() > 1 {
            return self.replies.pop_front().unwrap_or(Reply::Absent);
        }
        self.replies.front().cloned().unwrap_or(Reply::Absent)
    }

    fn describe(&mut self) -> Result<Option<T>> {
        match self.next() {
            Reply::Ok(value) => Ok(Some(value)),
            Reply::Absent => Ok(None),
            Reply::Fail(e) => Err(e.into()),
        }
    }
}

impl Script<()> {
    fn delete(&mut self) -> Result<Deleted> {
        match self.next() {
            Reply::Ok(()) => Ok(Deleted::Accepted),
            Reply::Absent => Ok(Deleted::AlreadyAbsent),
            Reply::Fail(e) => Err(e.into()),
        }
    }

    fn write(&mut self) -> Result<()> {
        match self.next() {
            Reply::Fail(e) => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Every call the fake received, with its arguments
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Call {
    ListClusters,
    CreateCluster(ClusterInput),
    DescribeCluster(String),
    ClusterIdentity(String),
    DeleteCluster(String),
    CreateNodePool(NodePoolInput),
    DescribeNodePool(String),
    UpdateNodePool(String, NodePoolUpdateInput),
    DeleteNodePool(String),
    InviteTeamMembers(TeamMemberInvite),
    DescribeTeamMember(String),
    DescribeTeamInvitation(String),
    UpdateTeamMemberRole(String, TeamMemberRoleUpdate),
    DeleteTeamMember(String),
    CreateServiceAccount(String),
    DescribeServiceAccount(String, String),
    DeleteServiceAccount(String, String),
}

#[derive(Default)]
struct State {
    calls: Vec<Call>,
    clusters: Script<Cluster>,
    identities: Script<ClusterIdentity>,
    node_pools: Script<NodePool>,
    members: Script<TeamMember>,
    invitations: Script<TeamMember>,
    service_accounts: Script<ServiceAccount>,
    creates: Script<()>,
    updates: Script<()>,
    deletes: Script<()>,
}

#[derive(Default)]
pub(crate) struct FakeApi {
    state: Mutex<State>,
}

impl FakeApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn script(mut self, f: impl FnOnce(&mut State)) -> Self {
        f(self.state.get_mut().unwrap());
        self
    }

    pub(crate) fn with_clusters(self, replies: Vec<Reply<Cluster>>) -> Self {
        self.script(|s| s.clusters.replies = replies.into())
    }

    pub(crate) fn with_identity(self, identity: ClusterIdentity) -> Self {
        self.script(|s| s.identities.replies = vec![Reply::Ok(identity)].into())
    }

    pub(crate) fn with_node_pools(self, replies: Vec<Reply<NodePool>>) -> Self {
        self.script(|s| s.node_pools.replies = replies.into())
    }

    pub(crate) fn with_members(self, replies: Vec<Reply<TeamMember>>) -> Self {
        self.script(|s| s.members.replies = replies.into())
    }

    pub(crate) fn with_invitations(self, replies: Vec<Reply<TeamMember>>) -> Self {
        self.script(|s| s.invitations.replies = replies.into())
    }

    pub(crate) fn with_service_accounts(self, replies: Vec<Reply<ServiceAccount>>) -> Self {
        self.script(|s| s.service_accounts.replies = replies.into())
    }

    /// `Ok` accepts a delete, `Absent` reports the entity as already gone
    pub(crate) fn with_deletes(self, replies: Vec<Reply<()>>) -> Self {
        self.script(|s| s.deletes.replies = replies.into())
    }

    pub(crate) fn failing_creates(self, error: ApiError) -> Self {
        self.script(|s| s.creates.replies = vec![Reply::Fail(error)].into())
    }

    pub(crate) fn failing_updates(self, error: ApiError) -> Self {
        self.script(|s| s.updates.replies = vec![Reply::Fail(error)].into())
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Calls other than describes and lists
    pub(crate) fn writes(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| {
                !matches!(
                    c,
                    Call::ListClusters
                        | Call::DescribeCluster(_)
                        | Call::ClusterIdentity(_)
                        | Call::DescribeNodePool(_)
                        | Call::DescribeTeamMember(_)
                        | Call::DescribeTeamInvitation(_)
                        | Call::DescribeServiceAccount(..)
                )
            })
            .collect()
    }

    fn record<T>(&self, call: Call, f: impl FnOnce(&mut State) -> T) -> T {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        f(&mut state)
    }
}

pub(crate) fn api_error(status: u16, error_type: &str) -> ApiError {
    ApiError {
        status,
        error_type: error_type.to_string(),
        message: format!("{} from fake", error_type),
        path: "/".to_string(),
    }
}

pub(crate) fn cluster(name: &str, state: ClusterState) -> Cluster {
    Cluster {
        id: format!("id-{}", name),
        name: name.to_string(),
        state,
        region: Some("eu-germany-1".to_string()),
        kube_version: Some("1.28".to_string()),
        ..Default::default()
    }
}

#[async_trait]
impl SymbiosisApi for FakeApi {
    async fn list_clusters(&self) -> Result<ClusterList> {
        self.record(Call::ListClusters, |_| Ok(ClusterList::default()))
    }

    async fn create_cluster(&self, input: &ClusterInput) -> Result<ClusterCreated> {
        self.record(Call::CreateCluster(input.clone()), |s| {
            s.creates.write()?;
            Ok(ClusterCreated {
                id: format!("id-{}", input.name),
                name: input.name.clone(),
            })
        })
    }

    async fn describe_cluster(&self, name: &str) -> Result<Option<Cluster>> {
        self.record(Call::DescribeCluster(name.to_string()), |s| s.clusters.describe())
    }

    async fn cluster_identity(&self, name: &str) -> Result<Option<ClusterIdentity>> {
        self.record(Call::ClusterIdentity(name.to_string()), |s| s.identities.describe())
    }

    async fn delete_cluster(&self, name: &str) -> Result<Deleted> {
        self.record(Call::DeleteCluster(name.to_string()), |s| s.deletes.delete())
    }

    async fn create_node_pool(&self, input: &NodePoolInput) -> Result<NodePoolCreated> {
        self.record(Call::CreateNodePool(input.clone()), |s| {
            s.creates.write()?;
            Ok(NodePoolCreated {
                id: format!("np-{}", input.name),
            })
        })
    }

    async fn describe_node_pool(&self, id: &str) -> Result<Option<NodePool>> {
        self.record(Call::DescribeNodePool(id.to_string()), |s| s.node_pools.describe())
    }

    async fn update_node_pool(&self, id: &str, input: &NodePoolUpdateInput) -> Result<()> {
        self.record(Call::UpdateNodePool(id.to_string(), input.clone()), |s| s.updates.write())
    }

    async fn delete_node_pool(&self, id: &str) -> Result<Deleted> {
        self.record(Call::DeleteNodePool(id.to_string()), |s| s.deletes.delete())
    }

    async fn invite_team_members(&self, input: &TeamMemberInvite) -> Result<()> {
        self.record(Call::InviteTeamMembers(input.clone()), |s| s.creates.write())
    }

    async fn describe_team_member(&self, email: &str) -> Result<Option<TeamMember>> {
        self.record(Call::DescribeTeamMember(email.to_string()), |s| s.members.describe())
    }

    async fn describe_team_invitation(&self, email: &str) -> Result<Option<TeamMember>> {
        self.record(Call::DescribeTeamInvitation(email.to_string()), |s| s.invitations.describe())
    }

    async fn update_team_member_role(&self, email: &str, input: &TeamMemberRoleUpdate) -> Result<()> {
        self.record(Call::UpdateTeamMemberRole(email.to_string(), input.clone()), |s| {
            s.updates.write()
        })
    }

    async fn delete_team_member(&self, email: &str) -> Result<Deleted> {
        self.record(Call::DeleteTeamMember(email.to_string()), |s| s.deletes.delete())
    }

    async fn create_service_account(&self, cluster: &str) -> Result<ServiceAccount> {
        self.record(Call::CreateServiceAccount(cluster.to_string()), |s| {
            s.creates.write()?;
            Ok(ServiceAccount {
                id: "sa-1".to_string(),
                service_account_token: "token".to_string(),
                cluster_certificate_authority: "ca".to_string(),
                kube_config: "kubeconfig".to_string(),
            })
        })
    }

    async fn describe_service_account(&self, cluster: &str, id: &str) -> Result<Option<ServiceAccount>> {
        self.record(
            Call::DescribeServiceAccount(cluster.to_string(), id.to_string()),
            |s| s.service_accounts.describe(),
        )
    }

    async fn delete_service_account(&self, cluster: &str, id: &str) -> Result<Deleted> {
        self.record(
            Call::DeleteServiceAccount(cluster.to_string(), id.to_string()),
            |s| s.deletes.delete(),
        )
    }
}
