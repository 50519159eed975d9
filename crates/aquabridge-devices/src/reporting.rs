//! Reporting configurator.
//!
//! Derives the attribute-report subscriptions and endpoint-to-coordinator
//! bindings a device needs, purely from its profile. The derivations are
//! idempotent: calling them twice yields the same ordered set, so the
//! transport collaborator can retry freely. The only runtime state is the
//! per-device bind tracker.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use aquabridge_zcl::{AttributeId, ClusterId};

use crate::capability::{CapabilityDescriptor, CapabilityKind, EntityCategory};
use crate::profile::DeviceProfile;

/// Interval/threshold contract governing when a device proactively reports
/// an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportingPolicy {
    /// Minimum seconds between reports
    pub min_interval: u16,
    /// Maximum seconds between reports (heartbeat)
    pub max_interval: u16,
    /// Minimum raw-unit change that triggers a report
    pub reportable_change: u32,
}

impl ReportingPolicy {
    pub const fn new(min_interval: u16, max_interval: u16, reportable_change: u32) -> Self {
        Self {
            min_interval,
            max_interval,
            reportable_change,
        }
    }
}

/// Default reporting policies by capability kind, used when a descriptor
/// carries no explicit policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportingDefaults {
    /// Scaled numeric sensors: report on change, heartbeat hourly
    pub sensor: ReportingPolicy,
    /// Switch state: report immediately on change
    pub switch: ReportingPolicy,
}

impl Default for ReportingDefaults {
    fn default() -> Self {
        Self {
            sensor: ReportingPolicy::new(10, 3600, 1),
            switch: ReportingPolicy::new(0, 3600, 1),
        }
    }
}

impl ReportingDefaults {
    /// The policy for a capability, if it is reported at all.
    ///
    /// Diagnostic sensors and switches are subscribed; config-category
    /// capabilities and setpoints are read back on demand instead. An
    /// explicit per-descriptor policy always wins.
    pub fn policy_for(&self, descriptor: &CapabilityDescriptor) -> Option<ReportingPolicy> {
        if let Some(policy) = descriptor.reporting {
            return Some(policy);
        }
        if !descriptor.is_reportable() || descriptor.category != EntityCategory::Diagnostic {
            return None;
        }
        match descriptor.kind {
            CapabilityKind::Sensor { .. } => Some(self.sensor),
            CapabilityKind::Switch => Some(self.switch),
            CapabilityKind::Setpoint { .. } => None,
        }
    }
}

/// One endpoint's required cluster bindings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointBinding {
    pub endpoint: u8,
    pub clusters: Vec<ClusterId>,
}

/// One attribute-report subscription request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSubscription {
    pub endpoint: u8,
    pub cluster: ClusterId,
    pub attribute: AttributeId,
    pub policy: ReportingPolicy,
}

/// Derive the endpoint-to-coordinator bindings a profile requires.
///
/// Per endpoint: the device's base clusters plus every cluster referenced
/// by a capability scoped to that endpoint. Output is sorted by endpoint
/// and cluster and carries no duplicates.
pub fn bindings_for(profile: &DeviceProfile) -> Vec<EndpointBinding> {
    let mut grouped: BTreeMap<u8, BTreeSet<ClusterId>> = BTreeMap::new();

    for (_, physical) in profile.endpoint_map().iter() {
        let entry = grouped.entry(physical).or_default();
        entry.extend(profile.base_clusters().iter().copied());
    }

    for capability in profile.capabilities() {
        // Endpoint resolution was validated at profile load.
        if let Ok(physical) = profile.endpoint_map().resolve(&capability.endpoint) {
            grouped.entry(physical).or_default().insert(capability.cluster);
        }
    }

    grouped
        .into_iter()
        .filter(|(_, clusters)| !clusters.is_empty())
        .map(|(endpoint, clusters)| EndpointBinding {
            endpoint,
            clusters: clusters.into_iter().collect(),
        })
        .collect()
}

/// Derive the attribute-report subscriptions a profile requires, using
/// `defaults` for descriptors without an explicit policy.
pub fn report_subscriptions_for(
    profile: &DeviceProfile,
    defaults: &ReportingDefaults,
) -> Vec<ReportSubscription> {
    let mut subscriptions: BTreeMap<(u8, ClusterId, AttributeId), ReportSubscription> =
        BTreeMap::new();

    for capability in profile.capabilities() {
        let Some(policy) = defaults.policy_for(capability) else {
            continue;
        };
        let Ok(physical) = profile.endpoint_map().resolve(&capability.endpoint) else {
            continue;
        };
        subscriptions
            .entry((physical, capability.cluster, capability.attribute))
            .or_insert(ReportSubscription {
                endpoint: physical,
                cluster: capability.cluster,
                attribute: capability.attribute,
                policy,
            });
    }

    subscriptions.into_values().collect()
}

/// Bind progress of one (endpoint, cluster) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindState {
    #[default]
    Unbound,
    BindRequested,
    Bound,
}

/// Per-device bind state machine over the profile's binding set.
///
/// The tracker records progress only; the binding set itself is re-derived
/// from the profile on demand, so a cancelled or failed bind can simply be
/// re-requested with identical parameters.
#[derive(Debug, Clone)]
pub struct BindingTracker {
    states: BTreeMap<(u8, ClusterId), BindState>,
}

impl BindingTracker {
    /// Seed the tracker with every (endpoint, cluster) pair the profile
    /// requires, all unbound.
    pub fn for_profile(profile: &DeviceProfile) -> Self {
        let states = bindings_for(profile)
            .into_iter()
            .flat_map(|binding| {
                let endpoint = binding.endpoint;
                binding
                    .clusters
                    .into_iter()
                    .map(move |cluster| ((endpoint, cluster), BindState::Unbound))
            })
            .collect();
        Self { states }
    }

    /// Current state of a pair. Pairs outside the profile's binding set
    /// report `Unbound`.
    pub fn state(&self, endpoint: u8, cluster: ClusterId) -> BindState {
        self.states
            .get(&(endpoint, cluster))
            .copied()
            .unwrap_or_default()
    }

    /// Record that a bind request was issued. Returns whether the pair
    /// transitioned; re-requesting an in-flight or bound pair is a no-op.
    pub fn mark_requested(&mut self, endpoint: u8, cluster: ClusterId) -> bool {
        match self.states.get_mut(&(endpoint, cluster)) {
            Some(state @ BindState::Unbound) => {
                *state = BindState::BindRequested;
                debug!("Bind requested: endpoint {} cluster {}", endpoint, cluster);
                true
            }
            _ => false,
        }
    }

    /// Record a bind confirmation from the transport collaborator.
    pub fn confirm(&mut self, endpoint: u8, cluster: ClusterId) -> bool {
        match self.states.get_mut(&(endpoint, cluster)) {
            Some(state @ BindState::BindRequested) => {
                *state = BindState::Bound;
                debug!("Bind confirmed: endpoint {} cluster {}", endpoint, cluster);
                true
            }
            _ => false,
        }
    }

    /// Record a bind failure; the pair returns to `Unbound` so the
    /// collaborator can retry on its own policy.
    pub fn fail(&mut self, endpoint: u8, cluster: ClusterId) {
        if let Some(state) = self.states.get_mut(&(endpoint, cluster)) {
            warn!("Bind failed: endpoint {} cluster {}", endpoint, cluster);
            *state = BindState::Unbound;
        }
    }

    /// Pairs not yet bound, in order.
    pub fn pending(&self) -> Vec<(u8, ClusterId)> {
        self.states
            .iter()
            .filter(|(_, state)| **state != BindState::Bound)
            .map(|(pair, _)| *pair)
            .collect()
    }

    pub fn is_fully_bound(&self) -> bool {
        self.states.values().all(|s| *s == BindState::Bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin;

    #[test]
    fn test_bindings_idempotent_and_sorted() {
        let profile = builtin::pool_management().unwrap();
        let first = bindings_for(&profile);
        let second = bindings_for(&profile);
        assert_eq!(first, second);

        let endpoints: Vec<u8> = first.iter().map(|b| b.endpoint).collect();
        let mut sorted = endpoints.clone();
        sorted.sort_unstable();
        assert_eq!(endpoints, sorted);

        for binding in &first {
            let mut clusters = binding.clusters.clone();
            clusters.sort();
            clusters.dedup();
            assert_eq!(binding.clusters, clusters);
        }
    }

    #[test]
    fn test_subscriptions_cover_diagnostic_sensors_only() {
        let profile = builtin::pool_management().unwrap();
        let defaults = ReportingDefaults::default();
        let subscriptions = report_subscriptions_for(&profile, &defaults);

        // The pH sensor is subscribed with the profile's explicit policy.
        let ph = subscriptions
            .iter()
            .find(|s| s.cluster == builtin::clusters::PH)
            .unwrap();
        assert_eq!(ph.policy, ReportingPolicy::new(10, 3600, 1));

        // No subscription targets a setpoint attribute.
        assert!(subscriptions
            .iter()
            .all(|s| s.attribute != builtin::clusters::ATTR_TARGET_VALUE));
    }

    #[test]
    fn test_bind_state_machine() {
        let profile = builtin::pool_monitor().unwrap();
        let mut tracker = BindingTracker::for_profile(&profile);
        let (endpoint, cluster) = tracker.pending()[0];

        assert_eq!(tracker.state(endpoint, cluster), BindState::Unbound);
        assert!(tracker.mark_requested(endpoint, cluster));
        // Re-request while in flight is a no-op.
        assert!(!tracker.mark_requested(endpoint, cluster));
        assert_eq!(tracker.state(endpoint, cluster), BindState::BindRequested);

        assert!(tracker.confirm(endpoint, cluster));
        assert_eq!(tracker.state(endpoint, cluster), BindState::Bound);
        // Confirming twice is a no-op.
        assert!(!tracker.confirm(endpoint, cluster));
    }

    #[test]
    fn test_bind_failure_returns_to_unbound() {
        let profile = builtin::pool_monitor().unwrap();
        let mut tracker = BindingTracker::for_profile(&profile);
        let (endpoint, cluster) = tracker.pending()[0];

        tracker.mark_requested(endpoint, cluster);
        tracker.fail(endpoint, cluster);
        assert_eq!(tracker.state(endpoint, cluster), BindState::Unbound);
        assert!(!tracker.is_fully_bound());
    }

    #[test]
    fn test_confirm_out_of_order_is_rejected() {
        let profile = builtin::pool_monitor().unwrap();
        let mut tracker = BindingTracker::for_profile(&profile);
        let (endpoint, cluster) = tracker.pending()[0];

        // Confirmation without a request does not transition.
        assert!(!tracker.confirm(endpoint, cluster));
        assert_eq!(tracker.state(endpoint, cluster), BindState::Unbound);
    }
}
