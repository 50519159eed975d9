//! Integration tests for cluster registry serialization.
//!
//! Profiles are declarative data; their cluster tables must survive a trip
//! through JSON unchanged so they can be stored and shipped as files.

use aquabridge_zcl::{ClusterDefinition, ClusterRegistry, ClusterId, WireType};

fn sample_registry() -> ClusterRegistry {
    let mut registry = ClusterRegistry::with_standard();
    registry
        .register(
            ClusterDefinition::new(0xFD1Au16, "chlorine_measurement")
                .with_attribute(0x0000u16, "measured_value", WireType::U16)
                .with_attribute(0x0001u16, "min_measured_value", WireType::U16)
                .with_attribute(0x0002u16, "max_measured_value", WireType::U16)
                .with_attribute(0x0003u16, "target_value", WireType::U16),
        )
        .unwrap();
    registry
}

#[test]
fn test_registry_json_round_trip() {
    let registry = sample_registry();

    let json = serde_json::to_string(&registry).unwrap();
    let back: ClusterRegistry = serde_json::from_str(&json).unwrap();

    assert_eq!(back, registry);
    assert!(back.contains(ClusterId(0xFD1A)));
}

#[test]
fn test_registry_lookup_after_round_trip() {
    let json = serde_json::to_string(&sample_registry()).unwrap();
    let back: ClusterRegistry = serde_json::from_str(&json).unwrap();

    let cluster = back.get(ClusterId(0xFD1A)).unwrap();
    assert_eq!(cluster.name, "chlorine_measurement");
    assert_eq!(cluster.len(), 4);
    assert_eq!(
        cluster.attribute_by_name("target_value").unwrap().wire_type,
        WireType::U16
    );
}
