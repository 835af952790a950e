use anyhow::{Context, Result};
use std::fmt;
use std::sync::Arc;
use symbiosis_client::{Deleted, SymbiosisApi};
use symbiosis_core::{
    ClusterReconciler, ClusterSpec, Convergence, NodePoolReconciler, NodePoolSpec, ObservedCluster,
    ObservedNodePool, ReconcileError, TeamMemberReconciler, TeamMemberSpec, ValidationError,
};
use tracing::{info, warn};

use crate::manifest::Manifest;

/// What an apply or destroy run did
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub created: usize,
    pub updated: usize,
    pub recreated: usize,
    pub unchanged: usize,
    pub deleted: usize,
    pub absent: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} recreated, {} unchanged, {} deleted, {} already absent",
            self.created, self.updated, self.recreated, self.unchanged, self.deleted, self.absent
        )
    }
}

impl Summary {
    fn record_delete(&mut self, deleted: Deleted) {
        match deleted {
            Deleted::Accepted => self.deleted += 1,
            Deleted::AlreadyAbsent => self.absent += 1,
        }
    }
}

/// Drives the reconcilers over a manifest
pub struct Applier {
    clusters: ClusterReconciler,
    node_pools: NodePoolReconciler,
    members: TeamMemberReconciler,
}

impl Applier {
    pub fn new(api: Arc<dyn SymbiosisApi>, convergence: Convergence) -> Self {
        Self {
            clusters: ClusterReconciler::new(api.clone()).with_convergence(convergence.clone()),
            node_pools: NodePoolReconciler::new(api.clone()).with_convergence(convergence.clone()),
            members: TeamMemberReconciler::new(api).with_convergence(convergence),
        }
    }

    pub async fn apply(&self, manifest: &Manifest) -> Result<Summary> {
        let mut summary = Summary::default();

        for cluster in &manifest.clusters {
            let observed = self.ensure_cluster(cluster, &mut summary).await?;
            for pool in manifest.node_pools_of(&cluster.name) {
                self.apply_node_pool(pool, observed.as_ref(), &mut summary)
                    .await
                    .with_context(|| format!("Failed to apply node pool {}/{}", pool.cluster, pool.name))?;
            }
        }

        for member in &manifest.team_members {
            self.apply_team_member(member, &mut summary).await?;
        }

        Ok(summary)
    }

    async fn ensure_cluster(&self, spec: &ClusterSpec, summary: &mut Summary) -> Result<Option<ObservedCluster>> {
        if let Some(observed) = self.clusters.read(&spec.name).await? {
            if observed.region.as_deref().is_some_and(|r| r != spec.region) {
                warn!(
                    "Cluster {} runs in {} but is declared in {}, it has to be recreated by hand",
                    spec.name,
                    observed.region.as_deref().unwrap_or_default(),
                    spec.region
                );
            }
            summary.unchanged += 1;
            return Ok(Some(observed));
        }

        let created = self.clusters.create(spec).await?;
        summary.created += 1;
        Ok(created.observed)
    }

    /// Full describe of the declared pool
    ///
    /// The pools embedded in a cluster describe are summaries that may lack name, labels and taints,
    /// so they only supply candidate ids.
    async fn find_node_pool(&self, cluster: Option<&ObservedCluster>, name: &str) -> Result<Option<ObservedNodePool>> {
        let Some(cluster) = cluster else {
            return Ok(None);
        };
        let candidates = cluster
            .node_pools
            .iter()
            .filter(|p| !p.is_master && (p.name.is_empty() || p.name == name));
        for summary in candidates {
            if let Some(pool) = self.node_pools.read(&summary.id).await? {
                if pool.name == name {
                    return Ok(Some(pool));
                }
            }
        }
        Ok(None)
    }

    async fn apply_node_pool(
        &self,
        desired: &NodePoolSpec,
        cluster: Option<&ObservedCluster>,
        summary: &mut Summary,
    ) -> Result<()> {
        let Some(current) = self.find_node_pool(cluster, &desired.name).await? else {
            self.node_pools.create(desired).await?;
            summary.created += 1;
            return Ok(());
        };

        match self.node_pools.update(&current.id, &current.as_spec(), desired).await {
            Ok(0) => summary.unchanged += 1,
            Ok(_) => summary.updated += 1,
            Err(ReconcileError::Validation {
                source: ValidationError::ImmutableField { field },
                ..
            }) => {
                info!("Node pool {} changed {}, recreating it", current.id, field);
                self.node_pools.delete(&current.id).await?;
                self.node_pools.create(desired).await?;
                summary.recreated += 1;
            }
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    async fn apply_team_member(&self, desired: &TeamMemberSpec, summary: &mut Summary) -> Result<()> {
        let Some(observed) = self.members.read(&desired.email).await? else {
            self.members.create(desired).await?;
            summary.created += 1;
            return Ok(());
        };

        let current = observed
            .as_spec()
            .with_context(|| format!("Team member {} has an unexpected role", desired.email))?;
        match self.members.update(&desired.email, &current, desired).await? {
            0 => summary.unchanged += 1,
            _ => summary.updated += 1,
        }
        Ok(())
    }

    /// Delete node pools, then team members, then clusters
    pub async fn destroy(&self, manifest: &Manifest) -> Result<Summary> {
        let mut summary = Summary::default();

        let mut observed = Vec::with_capacity(manifest.clusters.len());
        for cluster in &manifest.clusters {
            observed.push(self.clusters.read(&cluster.name).await?);
        }

        for (cluster, current) in manifest.clusters.iter().zip(&observed) {
            for pool in manifest.node_pools_of(&cluster.name) {
                match self.find_node_pool(current.as_ref(), &pool.name).await? {
                    Some(found) => summary.record_delete(self.node_pools.delete(&found.id).await?),
                    None => summary.absent += 1,
                }
            }
        }

        for member in &manifest.team_members {
            summary.record_delete(self.members.delete(&member.email).await?);
        }

        for cluster in &manifest.clusters {
            summary.record_delete(self.clusters.delete(&cluster.name).await?);
        }

        Ok(summary)
    }
}
