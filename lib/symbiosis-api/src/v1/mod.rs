/// API version v1 of the Symbiosis REST API

pub mod cluster;
pub mod node_pool;
pub mod team_member;
pub mod service_account;
pub mod error;
pub mod paths;

pub use cluster::{
    Cluster, ClusterConfiguration, ClusterCreated, ClusterIdentity, ClusterInput, ClusterList,
    ClusterNodePoolInput, ClusterState,
};
pub use node_pool::{
    AutoscalingSettings, NodeLabel, NodePool, NodePoolCreated, NodePoolInput, NodePoolUpdateInput,
    NodeTaint, SchedulerEffect,
};
pub use team_member::{TeamMember, TeamMemberInvite, TeamMemberRoleUpdate};
pub use service_account::ServiceAccount;
pub use error::ApiError;

/// Default public endpoint of the Symbiosis API
pub const DEFAULT_ENDPOINT: &str = "https://api.symbiosis.host";
/// Header carrying the API key on every request
pub const API_KEY_HEADER: &str = "X-Auth-ApiKey";
