//! Symbiosis management API payload types
//!
//! This library defines the request and response shapes of the Symbiosis REST API:
//! - Cluster: Kubernetes control planes, their identity material and inline node pools
//! - NodePool: Groups of worker nodes attached to a cluster
//! - TeamMember: Accepted members and pending invitations of the owning team
//! - ServiceAccount: Per-user cluster service accounts
//! - ApiError: The structured error payload returned for non-2xx responses

pub mod v1;

pub use v1::{
    ApiError, AutoscalingSettings, Cluster, ClusterConfiguration, ClusterCreated, ClusterIdentity,
    ClusterInput, ClusterList, ClusterNodePoolInput, ClusterState, NodeLabel, NodePool,
    NodePoolCreated, NodePoolInput, NodePoolUpdateInput, NodeTaint, SchedulerEffect,
    ServiceAccount, TeamMember, TeamMemberInvite, TeamMemberRoleUpdate,
};
