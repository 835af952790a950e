//! Per-entity strategies for [`crate::Reconciler`]

pub mod cluster;
pub mod node_pool;
pub mod service_account;
pub mod team_member;
