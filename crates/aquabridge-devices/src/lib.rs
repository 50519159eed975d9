//! Capability-mapping layer for the aquabridge protocol gateway.
//!
//! Translates a device's low-level wire representation (clusters and numeric
//! attributes) into semantic, typed capabilities (sensors, setpoints,
//! switches) and application-issued commands back into wire writes.
//!
//! ## Architecture
//!
//! - **DeviceProfile**: immutable aggregate of clusters, capabilities and
//!   the endpoint map for one device model
//! - **ProfileCatalog**: model-identifier lookup of loaded profiles
//! - **DeviceGateway**: boundary surface the host runtime calls — attach,
//!   attribute-report hook, write hook, binding derivations
//! - **Converters**: pure decode/encode between raw attribute payloads and
//!   semantic values
//!
//! ```text
//! wire report ──→ ClusterRegistry ──→ decode ──→ CapabilityDescriptor ──→ SemanticReading
//! wire write  ←── EndpointMap     ←── encode ←── CapabilityDescriptor ←── command
//! ```
//!
//! Everything below the attribute level (joining, transport, pub/sub
//! delivery, persistence) belongs to the host runtime, not this crate.

pub mod builtin;
pub mod capability;
pub mod convert;
pub mod endpoint;
pub mod profile;
pub mod reporting;
pub mod service;

// Re-exports for convenience
pub use capability::{
    CapabilityDescriptor, CapabilityKind, Direction, EntityCategory, GatewayError, GatewayResult,
    SemanticValue,
};
pub use convert::{ReadingAnnotation, SemanticReading, WireWriteCommand};
pub use endpoint::EndpointMap;
pub use profile::{DeviceProfile, DeviceProfileBuilder, ProfileCatalog};
pub use reporting::{
    bindings_for, report_subscriptions_for, BindState, BindingTracker, EndpointBinding,
    ReportSubscription, ReportingDefaults, ReportingPolicy,
};
pub use service::{DeviceGateway, DeviceId, DeviceInstance};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
