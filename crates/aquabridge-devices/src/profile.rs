//! Device profiles and the profile catalog.
//!
//! A `DeviceProfile` is the immutable aggregate describing one device
//! model: its custom clusters, capability table, endpoint map and base
//! clusters. Profiles are constructed once through the builder — which
//! performs every load-time validation — and shared read-only for the
//! device's lifetime. The `ProfileCatalog` looks profiles up by the model
//! identifier a joining device presents.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use aquabridge_zcl::{AttributeId, ClusterDefinition, ClusterId, ClusterRegistry, WireType};

use crate::capability::{
    CapabilityDescriptor, CapabilityKind, GatewayError, GatewayResult, SemanticValue,
};
use crate::convert::{decode_attribute, encode_write, SemanticReading, WireWriteCommand};
use crate::endpoint::EndpointMap;

/// Immutable description of one device model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    model_ids: BTreeSet<String>,
    registry: ClusterRegistry,
    capabilities: Vec<CapabilityDescriptor>,
    endpoint_map: EndpointMap,
    base_clusters: Vec<ClusterId>,
}

impl DeviceProfile {
    pub fn builder() -> DeviceProfileBuilder {
        DeviceProfileBuilder::new()
    }

    /// Model identifiers this profile matches.
    pub fn model_ids(&self) -> impl Iterator<Item = &str> {
        self.model_ids.iter().map(|s| s.as_str())
    }

    pub fn matches_model(&self, model_id: &str) -> bool {
        self.model_ids.contains(model_id)
    }

    pub fn registry(&self) -> &ClusterRegistry {
        &self.registry
    }

    pub fn capabilities(&self) -> &[CapabilityDescriptor] {
        &self.capabilities
    }

    pub fn endpoint_map(&self) -> &EndpointMap {
        &self.endpoint_map
    }

    /// Clusters bound on every mapped endpoint regardless of capabilities.
    pub fn base_clusters(&self) -> &[ClusterId] {
        &self.base_clusters
    }

    /// The physical endpoints this profile expects the device to present.
    pub fn physical_endpoints(&self) -> Vec<u8> {
        self.endpoint_map.physical_endpoints()
    }

    /// Look up a capability by logical endpoint and name.
    pub fn capability(&self, endpoint: &str, name: &str) -> Option<&CapabilityDescriptor> {
        self.capabilities
            .iter()
            .find(|c| c.endpoint == endpoint && c.name == name)
    }

    /// Capabilities eligible to decode reports from a physical endpoint.
    pub fn capabilities_for(&self, physical_endpoint: u8) -> Vec<&CapabilityDescriptor> {
        self.capabilities
            .iter()
            .filter(|c| {
                self.endpoint_map
                    .resolve(&c.endpoint)
                    .map(|p| p == physical_endpoint)
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Decode one inbound attribute report into semantic readings.
    ///
    /// The registry resolves the attribute first; an unregistered pair is
    /// an error the caller logs and skips. A registered attribute with no
    /// capability mapped on that endpoint yields zero readings — partial
    /// reports are normal and must not fail the decode pass.
    pub fn decode_report(
        &self,
        physical_endpoint: u8,
        cluster: ClusterId,
        attribute: AttributeId,
        raw: i64,
    ) -> GatewayResult<Vec<SemanticReading>> {
        let wire_type = self.registry.resolve(cluster, attribute)?;
        if !wire_type.contains(raw) {
            // Still decoded: readings are telemetry, absence is worse.
            warn!(
                "Raw value {} does not fit wire type {} (cluster {}, attribute {})",
                raw, wire_type, cluster, attribute
            );
        }

        Ok(self
            .capabilities_for(physical_endpoint)
            .into_iter()
            .filter(|c| c.cluster == cluster && c.attribute == attribute)
            .map(|c| decode_attribute(c, raw))
            .collect())
    }

    /// Validate and encode an application write into a wire command.
    pub fn build_write(
        &self,
        logical_endpoint: &str,
        capability_name: &str,
        value: &SemanticValue,
    ) -> GatewayResult<WireWriteCommand> {
        let physical = self.endpoint_map.resolve(logical_endpoint)?;
        let descriptor = self
            .capability(logical_endpoint, capability_name)
            .ok_or_else(|| GatewayError::UnknownCapability {
                endpoint: logical_endpoint.to_string(),
                capability: capability_name.to_string(),
            })?;
        let wire_type = self
            .registry
            .resolve(descriptor.cluster, descriptor.attribute)?;

        encode_write(descriptor, physical, wire_type, value)
    }
}

/// Builder performing every load-time validation of a profile.
#[derive(Debug, Default)]
pub struct DeviceProfileBuilder {
    model_ids: BTreeSet<String>,
    clusters: Vec<ClusterDefinition>,
    capabilities: Vec<CapabilityDescriptor>,
    endpoint_map: EndpointMap,
    base_clusters: Vec<ClusterId>,
}

impl DeviceProfileBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a model identifier this profile matches.
    pub fn model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_ids.insert(model_id.into());
        self
    }

    /// Declare a custom cluster.
    pub fn cluster(mut self, cluster: ClusterDefinition) -> Self {
        self.clusters.push(cluster);
        self
    }

    /// Declare a capability.
    pub fn capability(mut self, descriptor: CapabilityDescriptor) -> Self {
        self.capabilities.push(descriptor);
        self
    }

    /// Map a logical endpoint name to a physical endpoint number.
    pub fn endpoint(mut self, logical: impl Into<String>, physical: u8) -> Self {
        self.endpoint_map.insert(logical, physical);
        self
    }

    /// Add a cluster bound on every mapped endpoint.
    pub fn base_cluster(mut self, cluster: ClusterId) -> Self {
        self.base_clusters.push(cluster);
        self
    }

    /// Validate the declarations and build the immutable profile.
    ///
    /// Errors here are fatal to the profile: a duplicate cluster id, a
    /// capability referencing an unregistered attribute or an unmapped
    /// logical endpoint, an invariant-violating descriptor, or a capability
    /// kind incompatible with its attribute's wire type.
    pub fn build(self) -> GatewayResult<DeviceProfile> {
        if self.model_ids.is_empty() {
            return Err(GatewayError::InvalidProfile(
                "profile declares no model identifier".to_string(),
            ));
        }

        let mut registry = ClusterRegistry::with_standard();
        for cluster in self.clusters {
            registry.register(cluster)?;
        }

        let mut seen = BTreeSet::new();
        for capability in &self.capabilities {
            capability.validate()?;

            if !seen.insert((capability.endpoint.clone(), capability.name.clone())) {
                return Err(GatewayError::InvalidProfile(format!(
                    "capability '{}' declared twice on endpoint '{}'",
                    capability.name, capability.endpoint
                )));
            }

            // Unresolved logical names are a configuration error now, not
            // at runtime.
            self.endpoint_map.resolve(&capability.endpoint)?;

            let wire_type = registry.resolve(capability.cluster, capability.attribute)?;
            check_kind_compatibility(capability, wire_type)?;
        }

        debug!(
            "Loaded profile for {:?}: {} clusters, {} capabilities, {} endpoints",
            self.model_ids,
            registry.len(),
            self.capabilities.len(),
            self.endpoint_map.len()
        );

        Ok(DeviceProfile {
            model_ids: self.model_ids,
            registry,
            capabilities: self.capabilities,
            endpoint_map: self.endpoint_map,
            base_clusters: self.base_clusters,
        })
    }
}

fn check_kind_compatibility(
    capability: &CapabilityDescriptor,
    wire_type: WireType,
) -> GatewayResult<()> {
    let compatible = match capability.kind {
        CapabilityKind::Switch => matches!(wire_type, WireType::Bool | WireType::Enum8),
        CapabilityKind::Sensor { .. } | CapabilityKind::Setpoint { .. } => {
            wire_type != WireType::Bool
        }
    };
    if compatible {
        Ok(())
    } else {
        Err(GatewayError::InvalidDescriptor {
            capability: capability.name.clone(),
            reason: format!("kind is incompatible with wire type {}", wire_type),
        })
    }
}

/// Model-identifier lookup of loaded profiles.
///
/// Registration happens once at gateway startup (or on first encounter of
/// a new model); lookups are concurrent and read-only afterwards.
#[derive(Debug, Default)]
pub struct ProfileCatalog {
    profiles: RwLock<HashMap<String, Arc<DeviceProfile>>>,
}

impl ProfileCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a profile under every model identifier it declares.
    ///
    /// Fails with [`GatewayError::DuplicateProfile`] if any of its model
    /// identifiers is already taken; in that case nothing is registered.
    pub async fn register(&self, profile: DeviceProfile) -> GatewayResult<Arc<DeviceProfile>> {
        let mut profiles = self.profiles.write().await;

        for model_id in profile.model_ids() {
            if profiles.contains_key(model_id) {
                return Err(GatewayError::DuplicateProfile(model_id.to_string()));
            }
        }

        let profile = Arc::new(profile);
        for model_id in profile.model_ids() {
            profiles.insert(model_id.to_string(), Arc::clone(&profile));
        }
        Ok(profile)
    }

    /// Look up the profile matching a model identifier.
    pub async fn match_model(&self, model_id: &str) -> Option<Arc<DeviceProfile>> {
        self.profiles.read().await.get(model_id).cloned()
    }

    /// Registered model identifiers, sorted.
    pub async fn model_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.profiles.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn len(&self) -> usize {
        self.profiles.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.profiles.read().await.is_empty()
    }
}
