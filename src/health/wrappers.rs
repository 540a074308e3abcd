//! Thin per-resource-kind wrappers around [`super::HealthPolicy`].
//!
//! Deep inheritance hierarchies collapse to a single struct with composed
//! configuration; per-resource specialisations (data node vs disk) are
//! just wrappers translating `is_down()` to a domain enum. Composition,
//! not inheritance: these types hold a `HealthPolicy`, they don't
//! subclass one.

use super::{HealthPolicy, HealthPolicyConfig};

/// Routing-facing view of a resource's health: the two states a caller
/// actually branches on, as opposed to the policy's internal
/// down/hard-down distinction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceAvailability {
    Available,
    Unavailable,
}

impl From<bool> for ResourceAvailability {
    fn from(is_down: bool) -> Self {
        if is_down {
            ResourceAvailability::Unavailable
        } else {
            ResourceAvailability::Available
        }
    }
}

/// Health tracking for a data node resource.
pub struct DataNodeHealth {
    policy: HealthPolicy,
}

impl DataNodeHealth {
    pub fn new(node_id: impl Into<String>, config: HealthPolicyConfig) -> Self {
        Self { policy: HealthPolicy::new(node_id, config) }
    }

    pub fn on_error(&self) {
        self.policy.on_error();
    }

    pub fn availability(&self) -> ResourceAvailability {
        self.policy.is_down().into()
    }

    pub fn policy(&self) -> &HealthPolicy {
        &self.policy
    }
}

/// Health tracking for a disk resource.
pub struct DiskHealth {
    policy: HealthPolicy,
}

impl DiskHealth {
    pub fn new(disk_id: impl Into<String>, config: HealthPolicyConfig) -> Self {
        Self { policy: HealthPolicy::new(disk_id, config) }
    }

    pub fn on_error(&self) {
        self.policy.on_error();
    }

    pub fn availability(&self) -> ResourceAvailability {
        self.policy.is_down().into()
    }

    pub fn policy(&self) -> &HealthPolicy {
        &self.policy
    }
}
