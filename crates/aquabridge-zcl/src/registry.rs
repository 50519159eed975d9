//! Per-profile cluster registry.
//!
//! The registry holds every cluster a device profile is willing to decode:
//! the standard ZCL clusters the gateway understands out of the box plus
//! the manufacturer-specific clusters a profile declares. Registration is
//! a one-time, load-time step; lookups at runtime are read-only.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use tracing::{debug, warn};

use crate::cluster::ClusterDefinition;
use crate::types::{AttributeId, ClusterId, WireType};

/// Manufacturer-reserved cluster id range custom clusters are expected to
/// be drawn from.
pub const MANUFACTURER_CLUSTER_RANGE: RangeInclusive<u16> = 0xFD00..=0xFDFF;

/// Well-known standard cluster and attribute ids used by shipped profiles.
pub mod standard {
    use crate::types::{AttributeId, ClusterId};

    pub const BASIC: ClusterId = ClusterId(0x0000);
    pub const ON_OFF: ClusterId = ClusterId(0x0006);
    pub const LEVEL_CONTROL: ClusterId = ClusterId(0x0008);
    pub const TEMPERATURE_MEASUREMENT: ClusterId = ClusterId(0x0402);

    pub const ATTR_ZCL_VERSION: AttributeId = AttributeId(0x0000);
    pub const ATTR_POWER_SOURCE: AttributeId = AttributeId(0x0007);
    pub const ATTR_ON_OFF: AttributeId = AttributeId(0x0000);
    pub const ATTR_CURRENT_LEVEL: AttributeId = AttributeId(0x0000);
    pub const ATTR_MEASURED_VALUE: AttributeId = AttributeId(0x0000);
}

/// Errors produced by the cluster registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ZclError {
    /// A cluster id was registered twice for the same profile.
    #[error("Duplicate cluster: {0}")]
    DuplicateCluster(ClusterId),

    /// A (cluster, attribute) pair is not registered. Also covers the
    /// cluster itself being unknown, which makes every pair under it
    /// unknown.
    #[error("Unknown attribute: cluster {cluster}, attribute {attribute}")]
    UnknownAttribute {
        cluster: ClusterId,
        attribute: AttributeId,
    },
}

pub type ZclResult<T> = Result<T, ZclError>;

/// Registry of the clusters one device profile will decode.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ClusterRegistry {
    clusters: BTreeMap<ClusterId, ClusterDefinition>,
}

impl ClusterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-seeded with the standard clusters the gateway
    /// decodes for every device.
    pub fn with_standard() -> Self {
        let clusters = standard_clusters()
            .into_iter()
            .map(|c| (c.id, c))
            .collect();
        Self { clusters }
    }

    /// Register a cluster definition.
    ///
    /// Fails with [`ZclError::DuplicateCluster`] if the id is already
    /// registered. Ids outside the manufacturer-reserved range are accepted
    /// but logged, since shipped profiles draw custom ids from that range.
    pub fn register(&mut self, cluster: ClusterDefinition) -> ZclResult<()> {
        if self.clusters.contains_key(&cluster.id) {
            return Err(ZclError::DuplicateCluster(cluster.id));
        }

        if !MANUFACTURER_CLUSTER_RANGE.contains(&cluster.id.0)
            && !is_standard_cluster(cluster.id)
        {
            warn!(
                "Custom cluster {} ('{}') is outside the manufacturer range 0x{:04X}..=0x{:04X}",
                cluster.id,
                cluster.name,
                MANUFACTURER_CLUSTER_RANGE.start(),
                MANUFACTURER_CLUSTER_RANGE.end()
            );
        }

        debug!(
            "Registered cluster {} ('{}') with {} attributes",
            cluster.id,
            cluster.name,
            cluster.len()
        );
        self.clusters.insert(cluster.id, cluster);
        Ok(())
    }

    /// Resolve the wire type of a (cluster, attribute) pair.
    pub fn resolve(&self, cluster: ClusterId, attribute: AttributeId) -> ZclResult<WireType> {
        self.clusters
            .get(&cluster)
            .and_then(|c| c.attribute(attribute))
            .map(|a| a.wire_type)
            .ok_or(ZclError::UnknownAttribute { cluster, attribute })
    }

    /// Whether a cluster id is registered.
    pub fn contains(&self, cluster: ClusterId) -> bool {
        self.clusters.contains_key(&cluster)
    }

    /// Look up a cluster definition.
    pub fn get(&self, cluster: ClusterId) -> Option<&ClusterDefinition> {
        self.clusters.get(&cluster)
    }

    /// Iterate registered clusters in id order.
    pub fn iter(&self) -> impl Iterator<Item = &ClusterDefinition> {
        self.clusters.values()
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}

fn is_standard_cluster(id: ClusterId) -> bool {
    matches!(
        id,
        standard::BASIC
            | standard::ON_OFF
            | standard::LEVEL_CONTROL
            | standard::TEMPERATURE_MEASUREMENT
    )
}

/// Definitions of the standard clusters shipped profiles rely on.
fn standard_clusters() -> Vec<ClusterDefinition> {
    vec![
        ClusterDefinition::new(standard::BASIC, "basic")
            .with_attribute(standard::ATTR_ZCL_VERSION, "zcl_version", WireType::U8)
            .with_attribute(standard::ATTR_POWER_SOURCE, "power_source", WireType::Enum8),
        ClusterDefinition::new(standard::ON_OFF, "on_off")
            .with_attribute(standard::ATTR_ON_OFF, "on_off", WireType::Bool),
        ClusterDefinition::new(standard::LEVEL_CONTROL, "level_control")
            .with_attribute(standard::ATTR_CURRENT_LEVEL, "current_level", WireType::U8),
        ClusterDefinition::new(standard::TEMPERATURE_MEASUREMENT, "temperature_measurement")
            .with_attribute(standard::ATTR_MEASURED_VALUE, "measured_value", WireType::I16)
            .with_attribute(0x0001u16, "min_measured_value", WireType::I16)
            .with_attribute(0x0002u16, "max_measured_value", WireType::I16),
    ]
}
