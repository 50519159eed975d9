//! Gateway device service.
//!
//! The boundary surface the host runtime drives: attach a device once its
//! model identifier is known, feed attribute reports in, build validated
//! wire writes out, and derive the binding/report-subscription sets the
//! transport collaborator needs during interview. Each attached device
//! owns its instance state exclusively; profiles stay shared and
//! immutable.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use aquabridge_zcl::{AttributeId, ClusterId};

use crate::capability::{GatewayError, GatewayResult, SemanticValue};
use crate::convert::{SemanticReading, WireWriteCommand};
use crate::profile::{DeviceProfile, ProfileCatalog};
use crate::reporting::{
    bindings_for, report_subscriptions_for, BindState, BindingTracker, EndpointBinding,
    ReportSubscription, ReportingDefaults,
};

/// Unique identifier the gateway assigns to an attached device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId(pub Uuid);

impl DeviceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for DeviceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Runtime state of one attached device.
#[derive(Debug)]
pub struct DeviceInstance {
    pub id: DeviceId,
    /// Model identifier the device presented at interview
    pub model_id: String,
    /// Current network short address
    pub short_address: u16,
    pub profile: Arc<DeviceProfile>,
    pub attached_at: DateTime<Utc>,
    /// Bind progress, owned exclusively by this instance
    bindings: Mutex<BindingTracker>,
}

impl DeviceInstance {
    /// Current bind state of one (endpoint, cluster) pair.
    pub async fn bind_state(&self, endpoint: u8, cluster: ClusterId) -> BindState {
        self.bindings.lock().await.state(endpoint, cluster)
    }

    /// Whether every required pair is bound.
    pub async fn is_fully_bound(&self) -> bool {
        self.bindings.lock().await.is_fully_bound()
    }
}

/// The capability-mapping gateway surface.
pub struct DeviceGateway {
    catalog: Arc<ProfileCatalog>,
    devices: DashMap<DeviceId, Arc<DeviceInstance>>,
    defaults: ReportingDefaults,
}

impl DeviceGateway {
    pub fn new(catalog: Arc<ProfileCatalog>) -> Self {
        Self::with_defaults(catalog, ReportingDefaults::default())
    }

    /// Create a gateway with a non-default reporting policy table.
    pub fn with_defaults(catalog: Arc<ProfileCatalog>, defaults: ReportingDefaults) -> Self {
        Self {
            catalog,
            devices: DashMap::new(),
            defaults,
        }
    }

    /// Attach a device whose interview produced a model identifier and its
    /// set of physical endpoints.
    ///
    /// Fails with [`GatewayError::UnsupportedModel`] when no profile
    /// matches, and with [`GatewayError::ProfileMismatch`] when the device
    /// presents fewer endpoints than the profile declares — that error is
    /// fatal for the device and surfaced to the operator, never retried
    /// here.
    pub async fn attach_device(
        &self,
        model_id: &str,
        short_address: u16,
        interviewed_endpoints: &[u8],
    ) -> GatewayResult<DeviceId> {
        let profile = self
            .catalog
            .match_model(model_id)
            .await
            .ok_or_else(|| GatewayError::UnsupportedModel(model_id.to_string()))?;

        let missing: Vec<u8> = profile
            .physical_endpoints()
            .into_iter()
            .filter(|e| !interviewed_endpoints.contains(e))
            .collect();
        if !missing.is_empty() {
            return Err(GatewayError::ProfileMismatch {
                model: model_id.to_string(),
                reason: format!("device does not present endpoints {:?}", missing),
            });
        }

        let instance = Arc::new(DeviceInstance {
            id: DeviceId::new(),
            model_id: model_id.to_string(),
            short_address,
            bindings: Mutex::new(BindingTracker::for_profile(&profile)),
            profile,
            attached_at: Utc::now(),
        });

        info!(
            "Attached device {} (model '{}', short address 0x{:04X})",
            instance.id, model_id, short_address
        );
        let id = instance.id;
        self.devices.insert(id, instance);
        Ok(id)
    }

    /// Detach a device (the host runtime saw it leave the network).
    pub fn detach_device(&self, id: DeviceId) -> GatewayResult<()> {
        self.devices
            .remove(&id)
            .map(|_| debug!("Detached device {}", id))
            .ok_or(GatewayError::UnknownDevice(id))
    }

    /// Look up an attached device.
    pub fn device(&self, id: DeviceId) -> GatewayResult<Arc<DeviceInstance>> {
        self.devices
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(GatewayError::UnknownDevice(id))
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// Inbound report hook, called by the transport collaborator for every
    /// received attribute report.
    ///
    /// Decode problems (unknown device, unregistered attribute) are logged
    /// and that single report is skipped; they never abort processing of
    /// other reports.
    pub fn on_attribute_report(
        &self,
        id: DeviceId,
        physical_endpoint: u8,
        cluster: ClusterId,
        attribute: AttributeId,
        raw: i64,
    ) -> Vec<SemanticReading> {
        let instance = match self.device(id) {
            Ok(instance) => instance,
            Err(e) => {
                warn!("Skipping report: {}", e);
                return Vec::new();
            }
        };

        match instance
            .profile
            .decode_report(physical_endpoint, cluster, attribute, raw)
        {
            Ok(readings) => {
                trace!(
                    "Decoded {} reading(s) from device {} endpoint {} cluster {}",
                    readings.len(),
                    id,
                    physical_endpoint,
                    cluster
                );
                readings
            }
            Err(e) => {
                warn!("Skipping report from device {}: {}", id, e);
                Vec::new()
            }
        }
    }

    /// Outbound command hook, called by the application layer to set a
    /// writable capability. Validation errors come back synchronously; no
    /// partial write is ever transmitted.
    pub fn build_write(
        &self,
        id: DeviceId,
        logical_endpoint: &str,
        capability_name: &str,
        value: &SemanticValue,
    ) -> GatewayResult<WireWriteCommand> {
        let instance = self.device(id)?;
        instance
            .profile
            .build_write(logical_endpoint, capability_name, value)
    }

    /// The endpoint bindings the transport collaborator must establish for
    /// a device. Pure derivation from the profile; safe to call repeatedly.
    pub fn bindings(&self, id: DeviceId) -> GatewayResult<Vec<EndpointBinding>> {
        Ok(bindings_for(&self.device(id)?.profile))
    }

    /// The attribute-report subscriptions for a device.
    pub fn report_subscriptions(&self, id: DeviceId) -> GatewayResult<Vec<ReportSubscription>> {
        Ok(report_subscriptions_for(
            &self.device(id)?.profile,
            &self.defaults,
        ))
    }

    /// Record that the collaborator issued a bind request for a pair.
    pub async fn note_bind_requested(
        &self,
        id: DeviceId,
        endpoint: u8,
        cluster: ClusterId,
    ) -> GatewayResult<()> {
        let instance = self.device(id)?;
        let mut tracker = instance.bindings.lock().await;
        tracker.mark_requested(endpoint, cluster);
        Ok(())
    }

    /// Record a bind confirmation and return the report subscriptions to
    /// issue for that (endpoint, cluster) pair.
    pub async fn confirm_bind(
        &self,
        id: DeviceId,
        endpoint: u8,
        cluster: ClusterId,
    ) -> GatewayResult<Vec<ReportSubscription>> {
        let instance = self.device(id)?;
        let confirmed = {
            let mut tracker = instance.bindings.lock().await;
            tracker.confirm(endpoint, cluster)
        };
        if !confirmed {
            return Ok(Vec::new());
        }

        Ok(
            report_subscriptions_for(&instance.profile, &self.defaults)
                .into_iter()
                .filter(|s| s.endpoint == endpoint && s.cluster == cluster)
                .collect(),
        )
    }

    /// Record a bind failure; the pair becomes requestable again. Retry
    /// policy belongs to the collaborator.
    pub async fn fail_bind(
        &self,
        id: DeviceId,
        endpoint: u8,
        cluster: ClusterId,
    ) -> GatewayResult<()> {
        let instance = self.device(id)?;
        let mut tracker = instance.bindings.lock().await;
        tracker.fail(endpoint, cluster);
        Ok(())
    }
}
