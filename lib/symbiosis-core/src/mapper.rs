//! Conversion between declared attributes and API payload shapes
//!
//! `expand_*` turns the declared representation into the wire shape and
//! `flatten_*` turns an API response back into the declared representation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use symbiosis_api::{AutoscalingSettings, ClusterNodePoolInput, NodeLabel, NodeTaint, SchedulerEffect};

use crate::error::ValidationError;
use crate::resources::cluster::ClusterNodeSpec;

/// Smallest autoscaling lower bound the API accepts
pub const MIN_AUTOSCALING_SIZE: u32 = 2;
/// Largest autoscaling upper bound the API accepts
pub const MAX_AUTOSCALING_SIZE: u32 = 100;

/// Declared node taint
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Taint {
    pub key: String,
    pub value: String,
    pub effect: SchedulerEffect,
}

/// Declared autoscaling block
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Autoscaling {
    pub enabled: bool,
    pub min_size: u32,
    pub max_size: u32,
}

pub fn expand_labels(labels: &BTreeMap<String, String>) -> Vec<NodeLabel> {
    labels
        .iter()
        .map(|(key, value)| NodeLabel {
            key: key.clone(),
            value: value.clone(),
        })
        .collect()
}

pub fn flatten_labels(labels: &[NodeLabel]) -> BTreeMap<String, String> {
    labels
        .iter()
        .map(|l| (l.key.clone(), l.value.clone()))
        .collect()
}

pub fn expand_taints(taints: &[Taint]) -> Vec<NodeTaint> {
    taints
        .iter()
        .map(|t| NodeTaint {
            key: t.key.clone(),
            value: t.value.clone(),
            effect: t.effect,
        })
        .collect()
}

/// A missing taint list flattens to an empty one
pub fn flatten_taints(taints: Option<&[NodeTaint]>) -> Vec<Taint> {
    taints
        .unwrap_or_default()
        .iter()
        .map(|t| Taint {
            key: t.key.clone(),
            value: t.value.clone(),
            effect: t.effect,
        })
        .collect()
}

/// An absent block expands to the disabled, zero-bounds payload
pub fn expand_autoscaling(autoscaling: Option<&Autoscaling>) -> AutoscalingSettings {
    match autoscaling {
        Some(a) => AutoscalingSettings {
            enabled: a.enabled,
            min_size: a.min_size,
            max_size: a.max_size,
        },
        None => AutoscalingSettings::default(),
    }
}

/// The disabled, zero-bounds payload flattens to no block at all
pub fn flatten_autoscaling(settings: &AutoscalingSettings) -> Option<Autoscaling> {
    if *settings == AutoscalingSettings::default() {
        return None;
    }
    Some(Autoscaling {
        enabled: settings.enabled,
        min_size: settings.min_size,
        max_size: settings.max_size,
    })
}

pub fn expand_cluster_nodes(nodes: &[ClusterNodeSpec]) -> Result<Vec<ClusterNodePoolInput>, ValidationError> {
    nodes
        .iter()
        .map(|n| {
            non_empty("node_type", &n.node_type)?;
            Ok(ClusterNodePoolInput {
                node_type_name: n.node_type.clone(),
                quantity: quantity(n.quantity)?,
            })
        })
        .collect()
}

/// Node counts have to be positive
pub fn quantity(quantity: i64) -> Result<u32, ValidationError> {
    if quantity <= 0 {
        return Err(ValidationError::NonPositiveQuantity(quantity));
    }
    u32::try_from(quantity).map_err(|_| ValidationError::QuantityOutOfRange(quantity))
}

pub fn validate_autoscaling(autoscaling: Option<&Autoscaling>) -> Result<(), ValidationError> {
    let Some(a) = autoscaling else {
        return Ok(());
    };
    if !a.enabled {
        return Ok(());
    }
    if a.min_size < MIN_AUTOSCALING_SIZE {
        return Err(ValidationError::AutoscalingBounds(format!(
            "min_size must be at least {}, got {}",
            MIN_AUTOSCALING_SIZE, a.min_size
        )));
    }
    if a.max_size > MAX_AUTOSCALING_SIZE {
        return Err(ValidationError::AutoscalingBounds(format!(
            "max_size must be at most {}, got {}",
            MAX_AUTOSCALING_SIZE, a.max_size
        )));
    }
    if a.min_size > a.max_size {
        return Err(ValidationError::AutoscalingBounds(format!(
            "min_size {} exceeds max_size {}",
            a.min_size, a.max_size
        )));
    }
    Ok(())
}

pub(crate) fn non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(())
}
