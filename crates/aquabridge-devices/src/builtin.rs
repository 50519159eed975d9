//! Built-in device profiles.
//!
//! Profiles for the pool-management device family. These are the reference
//! users of the capability model: custom measurement clusters in the
//! manufacturer range, one logical endpoint per probe, scaled-hundredths
//! readings and step-limited targets.

use aquabridge_zcl::{standard, ClusterDefinition, ClusterId, WireType};

use crate::capability::{CapabilityDescriptor, EntityCategory, GatewayResult};
use crate::profile::DeviceProfile;
use crate::reporting::ReportingPolicy;

/// Cluster and attribute ids of the pool-management device family.
pub mod clusters {
    use aquabridge_zcl::{AttributeId, ClusterId};

    /// pH measurement cluster
    pub const PH: ClusterId = ClusterId(0xFD09);
    /// Chlorine measurement cluster
    pub const CHLORINE: ClusterId = ClusterId(0xFD1A);
    /// Probe calibration cluster
    pub const CALIBRATION: ClusterId = ClusterId(0xFD40);

    /// Current measured value, scaled hundredths
    pub const ATTR_MEASURED_VALUE: AttributeId = AttributeId(0x0000);
    /// Lowest value seen since power-up
    pub const ATTR_MIN_MEASURED_VALUE: AttributeId = AttributeId(0x0001);
    /// Highest value seen since power-up
    pub const ATTR_MAX_MEASURED_VALUE: AttributeId = AttributeId(0x0002);
    /// Regulation target, scaled hundredths
    pub const ATTR_TARGET_VALUE: AttributeId = AttributeId(0x0003);

    pub const ATTR_PH_REFERENCE_LOW: AttributeId = AttributeId(0x0000);
    pub const ATTR_PH_REFERENCE_MID: AttributeId = AttributeId(0x0001);
    pub const ATTR_PH_REFERENCE_HIGH: AttributeId = AttributeId(0x0002);
    pub const ATTR_TEMPERATURE_OFFSET: AttributeId = AttributeId(0x0003);
}

/// Reporting used for water-chemistry readings: at most every 10 seconds,
/// at least hourly, on any raw-unit change.
const CHEMISTRY_REPORTING: ReportingPolicy = ReportingPolicy::new(10, 3600, 1);

fn measurement_cluster(id: ClusterId, name: &str) -> ClusterDefinition {
    ClusterDefinition::new(id, name)
        .with_attribute(clusters::ATTR_MEASURED_VALUE, "measured_value", WireType::U16)
        .with_attribute(
            clusters::ATTR_MIN_MEASURED_VALUE,
            "min_measured_value",
            WireType::U16,
        )
        .with_attribute(
            clusters::ATTR_MAX_MEASURED_VALUE,
            "max_measured_value",
            WireType::U16,
        )
        .with_attribute(clusters::ATTR_TARGET_VALUE, "target_value", WireType::U16)
}

fn calibration_cluster() -> ClusterDefinition {
    ClusterDefinition::new(clusters::CALIBRATION, "calibration")
        .with_attribute(
            clusters::ATTR_PH_REFERENCE_LOW,
            "ph_reference_low",
            WireType::U16,
        )
        .with_attribute(
            clusters::ATTR_PH_REFERENCE_MID,
            "ph_reference_mid",
            WireType::U16,
        )
        .with_attribute(
            clusters::ATTR_PH_REFERENCE_HIGH,
            "ph_reference_high",
            WireType::U16,
        )
        .with_attribute(
            clusters::ATTR_TEMPERATURE_OFFSET,
            "temperature_offset",
            WireType::I16,
        )
}

/// Profile for the full pool-management unit: dosing pump, pH and chlorine
/// probes with regulation targets, reservoir deposit levels and probe
/// calibration.
pub fn pool_management() -> GatewayResult<DeviceProfile> {
    DeviceProfile::builder()
        .model_id("Pool.Management")
        .cluster(measurement_cluster(clusters::PH, "ph_measurement"))
        .cluster(measurement_cluster(clusters::CHLORINE, "chlorine_measurement"))
        .cluster(calibration_cluster())
        .endpoint("water", 1)
        .endpoint("pump", 2)
        .endpoint("ph", 3)
        .endpoint("chlorine", 4)
        .endpoint("algaecide", 5)
        .base_cluster(standard::BASIC)
        // Water temperature, hundredths of a degree.
        .capability(
            CapabilityDescriptor::sensor(
                "temperature",
                "water",
                standard::TEMPERATURE_MEASUREMENT,
                standard::ATTR_MEASURED_VALUE,
                -10.0,
                60.0,
                100.0,
            )
            .with_unit("°C"),
        )
        // Probe calibration, written during commissioning.
        .capability(CapabilityDescriptor::setpoint(
            "ph_reference_low",
            "water",
            clusters::CALIBRATION,
            clusters::ATTR_PH_REFERENCE_LOW,
            0.0,
            14.0,
            100.0,
            0.01,
        ))
        .capability(CapabilityDescriptor::setpoint(
            "ph_reference_mid",
            "water",
            clusters::CALIBRATION,
            clusters::ATTR_PH_REFERENCE_MID,
            0.0,
            14.0,
            100.0,
            0.01,
        ))
        .capability(CapabilityDescriptor::setpoint(
            "ph_reference_high",
            "water",
            clusters::CALIBRATION,
            clusters::ATTR_PH_REFERENCE_HIGH,
            0.0,
            14.0,
            100.0,
            0.01,
        ))
        .capability(
            CapabilityDescriptor::setpoint(
                "temperature_offset",
                "water",
                clusters::CALIBRATION,
                clusters::ATTR_TEMPERATURE_OFFSET,
                -5.0,
                5.0,
                100.0,
                0.01,
            )
            .with_unit("°C"),
        )
        // Circulation pump relay.
        .capability(CapabilityDescriptor::switch(
            "pump",
            "pump",
            standard::ON_OFF,
            standard::ATTR_ON_OFF,
        ))
        // pH probe: acceptable band, regulation target, probe enable and
        // acid reservoir level.
        .capability(
            CapabilityDescriptor::sensor(
                "ph",
                "ph",
                clusters::PH,
                clusters::ATTR_MEASURED_VALUE,
                7.0,
                7.4,
                100.0,
            )
            .with_reporting(CHEMISTRY_REPORTING),
        )
        .capability(CapabilityDescriptor::setpoint(
            "ph_target",
            "ph",
            clusters::PH,
            clusters::ATTR_TARGET_VALUE,
            6.8,
            7.6,
            100.0,
            0.01,
        ))
        .capability(
            CapabilityDescriptor::switch(
                "ph_enabled",
                "ph",
                standard::ON_OFF,
                standard::ATTR_ON_OFF,
            )
            .with_category(EntityCategory::Config),
        )
        .capability(
            CapabilityDescriptor::sensor(
                "ph_deposit",
                "ph",
                standard::LEVEL_CONTROL,
                standard::ATTR_CURRENT_LEVEL,
                0.0,
                100.0,
                1.0,
            )
            .with_unit("%"),
        )
        // Chlorine probe, same shape as pH.
        .capability(
            CapabilityDescriptor::sensor(
                "chlorine",
                "chlorine",
                clusters::CHLORINE,
                clusters::ATTR_MEASURED_VALUE,
                1.0,
                3.0,
                100.0,
            )
            .with_unit("mg/L")
            .with_reporting(CHEMISTRY_REPORTING),
        )
        .capability(
            CapabilityDescriptor::setpoint(
                "chlorine_target",
                "chlorine",
                clusters::CHLORINE,
                clusters::ATTR_TARGET_VALUE,
                0.5,
                3.0,
                100.0,
                0.01,
            )
            .with_unit("mg/L"),
        )
        .capability(
            CapabilityDescriptor::switch(
                "chlorine_enabled",
                "chlorine",
                standard::ON_OFF,
                standard::ATTR_ON_OFF,
            )
            .with_category(EntityCategory::Config),
        )
        .capability(
            CapabilityDescriptor::sensor(
                "chlorine_deposit",
                "chlorine",
                standard::LEVEL_CONTROL,
                standard::ATTR_CURRENT_LEVEL,
                0.0,
                100.0,
                1.0,
            )
            .with_unit("%"),
        )
        // Algaecide reservoir: deposit level and dosing enable only, no
        // measurement probe.
        .capability(
            CapabilityDescriptor::sensor(
                "algaecide_deposit",
                "algaecide",
                standard::LEVEL_CONTROL,
                standard::ATTR_CURRENT_LEVEL,
                0.0,
                100.0,
                1.0,
            )
            .with_unit("%"),
        )
        .capability(
            CapabilityDescriptor::switch(
                "algaecide_enabled",
                "algaecide",
                standard::ON_OFF,
                standard::ATTR_ON_OFF,
            )
            .with_category(EntityCategory::Config),
        )
        .build()
}

/// Profile for the measurement-only monitor variant: no pump, no targets,
/// wide sensor ranges. Follows the same scaling convention as
/// [`pool_management`]: fractional quantities in hundredths, percentage
/// levels unscaled.
pub fn pool_monitor() -> GatewayResult<DeviceProfile> {
    DeviceProfile::builder()
        .model_id("Pool.Monitor")
        .cluster(measurement_cluster(clusters::PH, "ph_measurement"))
        .cluster(measurement_cluster(clusters::CHLORINE, "chlorine_measurement"))
        .endpoint("water", 1)
        .endpoint("ph", 2)
        .endpoint("chlorine", 3)
        .capability(
            CapabilityDescriptor::sensor(
                "temperature",
                "water",
                standard::TEMPERATURE_MEASUREMENT,
                standard::ATTR_MEASURED_VALUE,
                -10.0,
                60.0,
                100.0,
            )
            .with_unit("°C"),
        )
        .capability(
            CapabilityDescriptor::sensor(
                "ph",
                "ph",
                clusters::PH,
                clusters::ATTR_MEASURED_VALUE,
                0.0,
                14.0,
                100.0,
            )
            .with_reporting(CHEMISTRY_REPORTING),
        )
        .capability(
            CapabilityDescriptor::sensor(
                "chlorine",
                "chlorine",
                clusters::CHLORINE,
                clusters::ATTR_MEASURED_VALUE,
                0.0,
                5.0,
                100.0,
            )
            .with_unit("mg/L")
            .with_reporting(CHEMISTRY_REPORTING),
        )
        .build()
}
