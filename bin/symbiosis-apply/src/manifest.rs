use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use symbiosis_core::{ClusterSpec, NodePoolSpec, TeamMemberSpec};

/// Desired state read from a YAML file
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub clusters: Vec<ClusterSpec>,
    #[serde(default)]
    pub node_pools: Vec<NodePoolSpec>,
    #[serde(default)]
    pub team_members: Vec<TeamMemberSpec>,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        Self::from_yaml(&raw).with_context(|| format!("Invalid manifest {}", path.display()))
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        let manifest: Manifest = serde_yaml::from_str(raw)?;
        manifest.check_references()?;
        Ok(manifest)
    }

    /// Node pools declared for one cluster
    pub fn node_pools_of<'a>(&'a self, cluster: &'a str) -> impl Iterator<Item = &'a NodePoolSpec> + 'a {
        self.node_pools.iter().filter(move |p| p.cluster == cluster)
    }

    fn check_references(&self) -> Result<()> {
        let mut clusters = HashSet::new();
        for cluster in &self.clusters {
            if !clusters.insert(cluster.name.as_str()) {
                bail!("cluster {} is declared twice", cluster.name);
            }
        }

        let mut pools = HashSet::new();
        for pool in &self.node_pools {
            if !clusters.contains(pool.cluster.as_str()) {
                bail!("node pool {} refers to undeclared cluster {}", pool.name, pool.cluster);
            }
            if !pools.insert((pool.cluster.as_str(), pool.name.as_str())) {
                bail!("node pool {}/{} is declared twice", pool.cluster, pool.name);
            }
        }

        let mut emails = HashSet::new();
        for member in &self.team_members {
            if !emails.insert(member.email.as_str()) {
                bail!("team member {} is declared twice", member.email);
            }
        }
        Ok(())
    }
}
