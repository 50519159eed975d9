//! End-to-end tests of the gateway surface: attach, report decoding,
//! command encoding and the binding/report-subscription derivations, using
//! the built-in pool-management profile.

use std::sync::Arc;

use aquabridge_devices::builtin::{self, clusters};
use aquabridge_devices::{
    BindState, DeviceGateway, DeviceId, GatewayError, ProfileCatalog, ReadingAnnotation,
    SemanticValue,
};
use aquabridge_zcl::{standard, AttributeId, ClusterId};

async fn attached_gateway() -> (DeviceGateway, DeviceId) {
    let catalog = Arc::new(ProfileCatalog::new());
    catalog
        .register(builtin::pool_management().unwrap())
        .await
        .unwrap();
    let gateway = DeviceGateway::new(catalog);
    let id = gateway
        .attach_device("Pool.Management", 0x4A21, &[1, 2, 3, 4, 5])
        .await
        .unwrap();
    (gateway, id)
}

#[tokio::test]
async fn test_ph_report_decodes_to_semantic_reading() {
    let (gateway, id) = attached_gateway().await;

    let readings =
        gateway.on_attribute_report(id, 3, clusters::PH, clusters::ATTR_MEASURED_VALUE, 720);
    assert_eq!(readings.len(), 1);
    assert_eq!(readings[0].capability, "ph");
    assert_eq!(readings[0].endpoint, "ph");
    assert_eq!(readings[0].value, SemanticValue::Float(7.2));
    assert!(readings[0].annotation.is_none());
}

#[tokio::test]
async fn test_out_of_range_reading_is_flagged_not_dropped() {
    let (gateway, id) = attached_gateway().await;

    let readings =
        gateway.on_attribute_report(id, 3, clusters::PH, clusters::ATTR_MEASURED_VALUE, 950);
    assert_eq!(readings.len(), 1);
    assert_eq!(readings[0].value, SemanticValue::Float(9.5));
    assert_eq!(
        readings[0].annotation,
        Some(ReadingAnnotation::OutOfRange { min: 7.0, max: 7.4 })
    );
}

#[tokio::test]
async fn test_unmapped_attribute_yields_no_emissions() {
    let (gateway, id) = attached_gateway().await;

    // min_measured_value is registered but no capability maps it: the
    // report is simply silent for this device.
    let readings =
        gateway.on_attribute_report(id, 3, clusters::PH, clusters::ATTR_MIN_MEASURED_VALUE, 690);
    assert!(readings.is_empty());
}

#[tokio::test]
async fn test_unknown_cluster_report_is_skipped_without_panic() {
    let (gateway, id) = attached_gateway().await;

    let readings = gateway.on_attribute_report(id, 4, ClusterId(0xFD77), AttributeId(0), 140);
    assert!(readings.is_empty());

    // Other reports keep decoding afterwards.
    let readings =
        gateway.on_attribute_report(id, 4, clusters::CHLORINE, clusters::ATTR_MEASURED_VALUE, 140);
    assert_eq!(readings.len(), 1);
    assert_eq!(readings[0].value, SemanticValue::Float(1.4));
}

#[tokio::test]
async fn test_setpoint_write_validation() {
    let (gateway, id) = attached_gateway().await;

    // On-grid value encodes to raw hundredths.
    let cmd = gateway
        .build_write(id, "ph", "ph_target", &SemanticValue::Float(7.01))
        .unwrap();
    assert_eq!(cmd.endpoint, 3);
    assert_eq!(cmd.cluster, clusters::PH);
    assert_eq!(cmd.attribute, clusters::ATTR_TARGET_VALUE);
    assert_eq!(cmd.raw, 701);

    // Off-grid value is rejected before anything is transmitted.
    let err = gateway
        .build_write(id, "ph", "ph_target", &SemanticValue::Float(7.005))
        .unwrap_err();
    assert!(matches!(err, GatewayError::InvalidStep { .. }));

    // Out-of-range value likewise.
    let err = gateway
        .build_write(id, "ph", "ph_target", &SemanticValue::Float(9.0))
        .unwrap_err();
    assert!(matches!(err, GatewayError::OutOfRange { .. }));

    // Read-only capabilities reject writes outright.
    let err = gateway
        .build_write(id, "ph", "ph", &SemanticValue::Float(7.2))
        .unwrap_err();
    assert_eq!(err, GatewayError::NotWritable("ph".to_string()));
}

#[tokio::test]
async fn test_bindings_cover_all_probe_endpoints() {
    let (gateway, id) = attached_gateway().await;

    let first = gateway.bindings(id).unwrap();
    let second = gateway.bindings(id).unwrap();
    assert_eq!(first, second);

    let endpoints: Vec<u8> = first.iter().map(|b| b.endpoint).collect();
    assert_eq!(endpoints, vec![1, 2, 3, 4, 5]);

    let ph_binding = first.iter().find(|b| b.endpoint == 3).unwrap();
    assert!(ph_binding.clusters.contains(&clusters::PH));
    assert!(ph_binding.clusters.contains(&standard::ON_OFF));
    assert!(ph_binding.clusters.contains(&standard::LEVEL_CONTROL));
    // Base cluster present on every endpoint.
    assert!(first
        .iter()
        .all(|b| b.clusters.contains(&standard::BASIC)));
}

#[tokio::test]
async fn test_bind_confirmation_releases_report_subscriptions() {
    let (gateway, id) = attached_gateway().await;
    let device = gateway.device(id).unwrap();

    assert_eq!(device.bind_state(3, clusters::PH).await, BindState::Unbound);

    gateway.note_bind_requested(id, 3, clusters::PH).await.unwrap();
    assert_eq!(
        device.bind_state(3, clusters::PH).await,
        BindState::BindRequested
    );

    let subscriptions = gateway.confirm_bind(id, 3, clusters::PH).await.unwrap();
    assert_eq!(subscriptions.len(), 1);
    assert_eq!(subscriptions[0].attribute, clusters::ATTR_MEASURED_VALUE);
    assert_eq!(subscriptions[0].policy.min_interval, 10);
    assert_eq!(subscriptions[0].policy.max_interval, 3600);
    assert_eq!(subscriptions[0].policy.reportable_change, 1);
    assert_eq!(device.bind_state(3, clusters::PH).await, BindState::Bound);

    // A confirmation that was never requested releases nothing.
    let subscriptions = gateway
        .confirm_bind(id, 4, clusters::CHLORINE)
        .await
        .unwrap();
    assert!(subscriptions.is_empty());
}

#[tokio::test]
async fn test_bind_failure_allows_identical_retry() {
    let (gateway, id) = attached_gateway().await;
    let device = gateway.device(id).unwrap();

    gateway.note_bind_requested(id, 2, standard::ON_OFF).await.unwrap();
    gateway.fail_bind(id, 2, standard::ON_OFF).await.unwrap();
    assert_eq!(
        device.bind_state(2, standard::ON_OFF).await,
        BindState::Unbound
    );

    // The derivation is unchanged, so the collaborator can retry with the
    // exact same request set.
    let before = gateway.bindings(id).unwrap();
    gateway.note_bind_requested(id, 2, standard::ON_OFF).await.unwrap();
    let after = gateway.bindings(id).unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_subscriptions_exclude_config_and_setpoints() {
    let (gateway, id) = attached_gateway().await;

    let subscriptions = gateway.report_subscriptions(id).unwrap();
    assert!(!subscriptions.is_empty());

    // No setpoint attribute is ever subscribed.
    assert!(subscriptions
        .iter()
        .all(|s| s.attribute != clusters::ATTR_TARGET_VALUE));
    assert!(subscriptions
        .iter()
        .all(|s| s.cluster != clusters::CALIBRATION));

    // The pump switch reports on change.
    let pump = subscriptions
        .iter()
        .find(|s| s.endpoint == 2 && s.cluster == standard::ON_OFF)
        .unwrap();
    assert_eq!(pump.policy.min_interval, 0);
}
