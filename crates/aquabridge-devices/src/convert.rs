//! Inbound/outbound converters.
//!
//! Pure, stateless translation between raw attribute payloads and semantic
//! values. Decode scales a wire integer into the capability's semantic
//! units; encode validates an application value against the capability's
//! range and step contract and produces the wire write. Both consult only
//! immutable profile data, so they may run concurrently without
//! coordination.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use aquabridge_zcl::{AttributeId, ClusterId, WireType};

use crate::capability::{
    CapabilityDescriptor, CapabilityKind, EntityCategory, GatewayError, GatewayResult,
    SemanticValue,
};

/// Tolerance for the setpoint step-grid check.
const STEP_TOLERANCE: f64 = 1e-9;

/// Annotation attached to a reading instead of suppressing it.
///
/// Readings are diagnostic telemetry; a dropped reading is indistinguishable
/// from a dead device, so out-of-range values are flagged, never discarded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReadingAnnotation {
    OutOfRange { min: f64, max: f64 },
}

/// A decoded semantic reading emitted to the application layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticReading {
    /// Capability that produced the reading
    pub capability: String,
    /// Logical endpoint the capability is scoped to
    pub endpoint: String,
    /// Decoded value
    pub value: SemanticValue,
    /// Unit of measurement
    pub unit: Option<String>,
    /// Entity category
    pub category: EntityCategory,
    /// Range annotation, if the value violated the semantic range
    pub annotation: Option<ReadingAnnotation>,
    /// Decode timestamp
    pub observed_at: DateTime<Utc>,
}

impl SemanticReading {
    pub fn is_out_of_range(&self) -> bool {
        self.annotation.is_some()
    }
}

/// A validated attribute write ready for transmission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireWriteCommand {
    /// Physical destination endpoint
    pub endpoint: u8,
    /// Destination cluster
    pub cluster: ClusterId,
    /// Destination attribute
    pub attribute: AttributeId,
    /// Raw payload value
    pub raw: i64,
    /// On-wire type of the payload
    pub wire_type: WireType,
}

/// Decode a raw attribute payload through a capability descriptor.
///
/// Numeric kinds scale by `raw / scale`; switches decode `raw != 0`. A
/// value outside the semantic range is emitted with an
/// [`ReadingAnnotation::OutOfRange`] annotation and a warning.
pub fn decode_attribute(descriptor: &CapabilityDescriptor, raw: i64) -> SemanticReading {
    let (value, annotation) = match descriptor.kind {
        CapabilityKind::Sensor { min, max, scale }
        | CapabilityKind::Setpoint {
            min, max, scale, ..
        } => {
            let semantic = raw as f64 / scale;
            let annotation = if semantic < min || semantic > max {
                warn!(
                    "Reading '{}' = {} outside [{}, {}] (raw {})",
                    descriptor.name, semantic, min, max, raw
                );
                Some(ReadingAnnotation::OutOfRange { min, max })
            } else {
                None
            };
            (SemanticValue::Float(semantic), annotation)
        }
        CapabilityKind::Switch => (SemanticValue::Boolean(raw != 0), None),
    };

    SemanticReading {
        capability: descriptor.name.clone(),
        endpoint: descriptor.endpoint.clone(),
        value,
        unit: descriptor.unit.clone(),
        category: descriptor.category,
        annotation,
        observed_at: Utc::now(),
    }
}

/// Encode a semantic write through a capability descriptor.
///
/// Validates direction, range and step grid; rounds `semantic * scale` to
/// the nearest integer, ties away from zero, and checks the result against
/// the wire type's bounds. No partial write is ever produced.
pub fn encode_write(
    descriptor: &CapabilityDescriptor,
    physical_endpoint: u8,
    wire_type: WireType,
    value: &SemanticValue,
) -> GatewayResult<WireWriteCommand> {
    let raw = match descriptor.kind {
        CapabilityKind::Sensor { .. } => {
            return Err(GatewayError::NotWritable(descriptor.name.clone()));
        }
        CapabilityKind::Setpoint {
            min,
            max,
            scale,
            step,
        } => {
            let semantic = value
                .as_f64()
                .ok_or_else(|| GatewayError::InvalidValue {
                    capability: descriptor.name.clone(),
                    reason: format!("expected a numeric value, got {}", value.type_name()),
                })?;

            if semantic < min || semantic > max {
                return Err(GatewayError::OutOfRange {
                    capability: descriptor.name.clone(),
                    value: semantic,
                    min,
                    max,
                });
            }

            if !on_step_grid(semantic, min, step) {
                return Err(GatewayError::InvalidStep {
                    capability: descriptor.name.clone(),
                    value: semantic,
                    min,
                    step,
                });
            }

            (semantic * scale).round() as i64
        }
        CapabilityKind::Switch => {
            let on = value
                .as_bool()
                .ok_or_else(|| GatewayError::InvalidValue {
                    capability: descriptor.name.clone(),
                    reason: format!("expected a boolean value, got {}", value.type_name()),
                })?;
            i64::from(on)
        }
    };

    if !wire_type.contains(raw) {
        let (min, max) = wire_type.bounds();
        return Err(GatewayError::OutOfRange {
            capability: descriptor.name.clone(),
            value: raw as f64,
            min: min as f64,
            max: max as f64,
        });
    }

    Ok(WireWriteCommand {
        endpoint: physical_endpoint,
        cluster: descriptor.cluster,
        attribute: descriptor.attribute,
        raw,
        wire_type,
    })
}

/// Whether `value` is reachable as `min + k * step` within tolerance.
fn on_step_grid(value: f64, min: f64, step: f64) -> bool {
    let k = ((value - min) / step).round();
    (min + k * step - value).abs() <= STEP_TOLERANCE
}
