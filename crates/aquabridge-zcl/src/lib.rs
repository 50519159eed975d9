//! Wire-level attribute model for the aquabridge gateway.
//!
//! This crate holds the protocol-side vocabulary the capability-mapping
//! layer is built on: ZCL wire types, cluster and attribute definitions,
//! and the per-profile cluster registry that decides which attributes the
//! gateway will attempt to decode for a device.
//!
//! Nothing in here touches the network. Definitions are declarative data,
//! registered once at profile load time and immutable afterwards.

pub mod cluster;
pub mod registry;
pub mod types;

pub use cluster::{AttributeDefinition, ClusterDefinition};
pub use registry::{standard, ClusterRegistry, ZclError, ZclResult, MANUFACTURER_CLUSTER_RANGE};
pub use types::{AttributeId, ClusterId, WireType};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
