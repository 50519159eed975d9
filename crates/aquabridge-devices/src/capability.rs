//! Semantic capability model.
//!
//! A capability is one application-facing feature of a device — a readable
//! sensor, a settable target, a binary actuator — bound to a single
//! cluster/attribute pair together with its scaling and range contract.
//! Capabilities are declarative data operated on by a generic decode/encode
//! engine, not per-device code branches.

use serde::{Deserialize, Serialize};

use aquabridge_zcl::{AttributeId, ClusterId, ZclError};

use crate::reporting::ReportingPolicy;
use crate::service::DeviceId;

/// A decoded, application-facing value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SemanticValue {
    Float(f64),
    Integer(i64),
    Boolean(bool),
}

impl SemanticValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Float(_) => "float",
            Self::Integer(_) => "integer",
            Self::Boolean(_) => "boolean",
        }
    }
}

impl From<f64> for SemanticValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<i64> for SemanticValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<bool> for SemanticValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

/// Whether a capability is surfaced as operational telemetry or as device
/// configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityCategory {
    Diagnostic,
    Config,
}

/// Access direction of a capability, derived from its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    ReadOnly,
    Writable,
}

/// The semantic contract of a capability.
///
/// `scale` converts between wire and semantic units: `semantic = raw / scale`.
/// All shipped profiles use exact powers of ten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CapabilityKind {
    /// Read-only scaled numeric reading
    Sensor { min: f64, max: f64, scale: f64 },
    /// Writable scaled numeric target with a step grid
    Setpoint {
        min: f64,
        max: f64,
        scale: f64,
        step: f64,
    },
    /// Writable boolean actuator
    Switch,
}

/// Declarative description of one semantic capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityDescriptor {
    /// Capability identifier, unique per logical endpoint
    pub name: String,
    /// Logical endpoint this capability is scoped to
    pub endpoint: String,
    /// Cluster carrying the backing attribute
    pub cluster: ClusterId,
    /// Backing attribute
    pub attribute: AttributeId,
    /// Unit of measurement
    pub unit: Option<String>,
    /// Entity category
    pub category: EntityCategory,
    /// Explicit reporting policy; falls back to the gateway defaults table
    pub reporting: Option<ReportingPolicy>,
    /// Semantic contract
    pub kind: CapabilityKind,
}

impl CapabilityDescriptor {
    /// Declare a read-only scaled sensor. Defaults to the diagnostic
    /// category.
    pub fn sensor(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        cluster: ClusterId,
        attribute: AttributeId,
        min: f64,
        max: f64,
        scale: f64,
    ) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            cluster,
            attribute,
            unit: None,
            category: EntityCategory::Diagnostic,
            reporting: None,
            kind: CapabilityKind::Sensor { min, max, scale },
        }
    }

    /// Declare a writable scaled setpoint. Defaults to the config category.
    pub fn setpoint(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        cluster: ClusterId,
        attribute: AttributeId,
        min: f64,
        max: f64,
        scale: f64,
        step: f64,
    ) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            cluster,
            attribute,
            unit: None,
            category: EntityCategory::Config,
            reporting: None,
            kind: CapabilityKind::Setpoint {
                min,
                max,
                scale,
                step,
            },
        }
    }

    /// Declare a writable boolean switch. Defaults to the diagnostic
    /// category (switch state is operational telemetry).
    pub fn switch(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        cluster: ClusterId,
        attribute: AttributeId,
    ) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            cluster,
            attribute,
            unit: None,
            category: EntityCategory::Diagnostic,
            reporting: None,
            kind: CapabilityKind::Switch,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_category(mut self, category: EntityCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_reporting(mut self, policy: ReportingPolicy) -> Self {
        self.reporting = Some(policy);
        self
    }

    /// Access direction derived from the kind.
    pub fn direction(&self) -> Direction {
        match self.kind {
            CapabilityKind::Sensor { .. } => Direction::ReadOnly,
            CapabilityKind::Setpoint { .. } | CapabilityKind::Switch => Direction::Writable,
        }
    }

    pub fn is_writable(&self) -> bool {
        self.direction() == Direction::Writable
    }

    /// Whether this capability kind produces attribute reports (sensors and
    /// switches do; setpoints are read back on demand).
    pub fn is_reportable(&self) -> bool {
        matches!(
            self.kind,
            CapabilityKind::Sensor { .. } | CapabilityKind::Switch
        )
    }

    /// Check the descriptor's declared invariants.
    pub fn validate(&self) -> GatewayResult<()> {
        let fail = |reason: String| {
            Err(GatewayError::InvalidDescriptor {
                capability: self.name.clone(),
                reason,
            })
        };

        match self.kind {
            CapabilityKind::Sensor { min, max, scale } => {
                if min > max {
                    return fail(format!("min {} exceeds max {}", min, max));
                }
                if scale <= 0.0 {
                    return fail(format!("scale {} is not positive", scale));
                }
            }
            CapabilityKind::Setpoint {
                min,
                max,
                scale,
                step,
            } => {
                if min > max {
                    return fail(format!("min {} exceeds max {}", min, max));
                }
                if scale <= 0.0 {
                    return fail(format!("scale {} is not positive", scale));
                }
                if step <= 0.0 {
                    return fail(format!("step {} is not positive", step));
                }
            }
            CapabilityKind::Switch => {}
        }
        Ok(())
    }
}

/// Errors that can occur in the capability-mapping layer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GatewayError {
    /// Wire-level registry error (duplicate cluster, unknown attribute)
    #[error(transparent)]
    Zcl(#[from] ZclError),

    /// A capability references a logical endpoint the profile does not map
    #[error("Unknown endpoint: '{0}'")]
    UnknownEndpoint(String),

    /// A write value falls outside the capability's semantic range
    #[error("Value {value} out of range [{min}, {max}] for '{capability}'")]
    OutOfRange {
        capability: String,
        value: f64,
        min: f64,
        max: f64,
    },

    /// A write value does not sit on the capability's step grid
    #[error("Value {value} not reachable from {min} with step {step} for '{capability}'")]
    InvalidStep {
        capability: String,
        value: f64,
        min: f64,
        step: f64,
    },

    /// Write attempted against a read-only capability
    #[error("Capability '{0}' is not writable")]
    NotWritable(String),

    /// Device presented at interview does not match its profile
    #[error("Profile mismatch for model '{model}': {reason}")]
    ProfileMismatch { model: String, reason: String },

    /// A profile is already registered for one of the model identifiers
    #[error("Profile already registered for model '{0}'")]
    DuplicateProfile(String),

    /// No profile matches the model identifier
    #[error("No profile matches model '{0}'")]
    UnsupportedModel(String),

    /// Device id not attached to this gateway
    #[error("Device not found: {0}")]
    UnknownDevice(DeviceId),

    /// Capability name not declared on the logical endpoint
    #[error("Unknown capability '{capability}' on endpoint '{endpoint}'")]
    UnknownCapability {
        endpoint: String,
        capability: String,
    },

    /// A descriptor violates its declared invariants
    #[error("Invalid descriptor '{capability}': {reason}")]
    InvalidDescriptor { capability: String, reason: String },

    /// A write value's type does not match the capability kind
    #[error("Invalid value for '{capability}': {reason}")]
    InvalidValue { capability: String, reason: String },

    /// Profile-level declaration error at load time
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;
    use aquabridge_zcl::standard;

    #[test]
    fn test_semantic_value_conversions() {
        assert_eq!(SemanticValue::Float(7.2).as_f64(), Some(7.2));
        assert_eq!(SemanticValue::Integer(42).as_f64(), Some(42.0));
        assert_eq!(SemanticValue::Boolean(true).as_bool(), Some(true));
        assert_eq!(SemanticValue::Boolean(true).as_f64(), None);
    }

    #[test]
    fn test_direction_derived_from_kind() {
        let sensor = CapabilityDescriptor::sensor(
            "ph",
            "ph",
            ClusterId(0xFD09),
            AttributeId(0),
            7.0,
            7.4,
            100.0,
        );
        assert_eq!(sensor.direction(), Direction::ReadOnly);
        assert!(!sensor.is_writable());
        assert!(sensor.is_reportable());

        let target = CapabilityDescriptor::setpoint(
            "ph_target",
            "ph",
            ClusterId(0xFD09),
            AttributeId(3),
            6.8,
            7.6,
            100.0,
            0.01,
        );
        assert_eq!(target.direction(), Direction::Writable);
        assert!(!target.is_reportable());

        let pump = CapabilityDescriptor::switch("pump", "pump", standard::ON_OFF, AttributeId(0));
        assert!(pump.is_writable());
        assert!(pump.is_reportable());
    }

    #[test]
    fn test_invariant_validation() {
        let inverted = CapabilityDescriptor::sensor(
            "bad",
            "ph",
            ClusterId(0xFD09),
            AttributeId(0),
            7.4,
            7.0,
            100.0,
        );
        assert!(matches!(
            inverted.validate(),
            Err(GatewayError::InvalidDescriptor { .. })
        ));

        let zero_scale = CapabilityDescriptor::sensor(
            "bad",
            "ph",
            ClusterId(0xFD09),
            AttributeId(0),
            0.0,
            14.0,
            0.0,
        );
        assert!(zero_scale.validate().is_err());

        let zero_step = CapabilityDescriptor::setpoint(
            "bad",
            "ph",
            ClusterId(0xFD09),
            AttributeId(3),
            6.8,
            7.6,
            100.0,
            0.0,
        );
        assert!(zero_step.validate().is_err());
    }

    #[test]
    fn test_descriptor_serde_round_trip() {
        let descriptor = CapabilityDescriptor::setpoint(
            "chlorine_target",
            "chlorine",
            ClusterId(0xFD1A),
            AttributeId(3),
            0.5,
            3.0,
            100.0,
            0.01,
        )
        .with_unit("mg/L");

        let json = serde_json::to_string(&descriptor).unwrap();
        let back: CapabilityDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, descriptor);
    }
}
