//! Pool gateway demo.
//!
//! Walks the capability-mapping surface end to end:
//! 1. Load the built-in pool-management profile into the catalog
//! 2. Attach a device as the host runtime would after interview
//! 3. Derive its bindings and report subscriptions
//! 4. Decode attribute reports and build validated writes

use std::sync::Arc;

use aquabridge_devices::builtin::{self, clusters};
use aquabridge_devices::{DeviceGateway, ProfileCatalog, SemanticValue};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    println!("=== Aquabridge Pool Gateway Demo ===\n");

    // Profiles are loaded once, at startup.
    let catalog = Arc::new(ProfileCatalog::new());
    catalog.register(builtin::pool_management()?).await?;
    catalog.register(builtin::pool_monitor()?).await?;
    println!("Loaded profiles: {:?}\n", catalog.model_ids().await);

    // The join/interview collaborator hands us the model id and endpoints.
    let gateway = DeviceGateway::new(catalog);
    let device = gateway
        .attach_device("Pool.Management", 0x4A21, &[1, 2, 3, 4, 5])
        .await?;
    println!("Attached device {}\n", device);

    // Binding and report-subscription sets for the transport collaborator.
    println!("--- Bindings ---");
    for binding in gateway.bindings(device)? {
        println!("endpoint {} -> {:?}", binding.endpoint, binding.clusters);
    }
    println!("\n--- Report subscriptions ---");
    for sub in gateway.report_subscriptions(device)? {
        println!(
            "endpoint {} cluster {} attribute {}: every {}..{}s on change {}",
            sub.endpoint,
            sub.cluster,
            sub.attribute,
            sub.policy.min_interval,
            sub.policy.max_interval,
            sub.policy.reportable_change
        );
    }

    // Inbound reports, as the transport collaborator would deliver them.
    println!("\n--- Inbound reports ---");
    for (endpoint, cluster, raw) in [
        (3, clusters::PH, 720),
        (4, clusters::CHLORINE, 140),
        (3, clusters::PH, 950),
    ] {
        for reading in
            gateway.on_attribute_report(device, endpoint, cluster, clusters::ATTR_MEASURED_VALUE, raw)
        {
            println!(
                "{} = {:?} {} {}",
                reading.capability,
                reading.value,
                reading.unit.as_deref().unwrap_or(""),
                if reading.is_out_of_range() {
                    "(out of range!)"
                } else {
                    ""
                }
            );
        }
    }

    // Outbound commands from the application layer.
    println!("\n--- Outbound commands ---");
    let cmd = gateway.build_write(device, "ph", "ph_target", &SemanticValue::Float(7.2))?;
    println!("set ph_target=7.2 -> {:?}", cmd);

    let cmd = gateway.build_write(device, "pump", "pump", &SemanticValue::Boolean(true))?;
    println!("set pump=on -> {:?}", cmd);

    match gateway.build_write(device, "ph", "ph_target", &SemanticValue::Float(7.005)) {
        Err(e) => println!("set ph_target=7.005 rejected: {}", e),
        Ok(_) => unreachable!("off-grid value must be rejected"),
    }

    Ok(())
}
