//! Declarative reconciliation of Symbiosis resources
//!
//! This library provides:
//! - Attribute mapping between declared specs and API payloads
//! - A bounded poll-until-converged loop for asynchronous API operations
//! - One generic `Reconciler` driving per-resource strategies for clusters,
//!   node pools, team members and service accounts

pub mod error;
pub mod lookup;
pub mod mapper;
pub mod poll;
pub mod reconciler;
pub mod resources;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Action, ReconcileError, Result, ValidationError};
pub use mapper::{Autoscaling, Taint};
pub use poll::{Backoff, Convergence, PollError, Probe, Wait};
pub use reconciler::{Created, ManagedResource, Reconciler};
pub use resources::cluster::{
    describe_cluster_data, ClusterNodeSpec, ClusterReconciler, ClusterResource, ClusterSpec,
    ObservedCluster,
};
pub use resources::node_pool::{NodePoolReconciler, NodePoolResource, NodePoolSpec, ObservedNodePool};
pub use resources::service_account::{
    ObservedServiceAccount, ServiceAccountKey, ServiceAccountReconciler, ServiceAccountResource,
    ServiceAccountSpec,
};
pub use resources::team_member::{
    ObservedTeamMember, TeamMemberReconciler, TeamMemberResource, TeamMemberSpec, TeamRole,
};
