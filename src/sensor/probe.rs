//! Capability probing.
//!
//! A group counts as supported only when every one of its sensors is present.
//! A device that carries some inertial sensors but not all of them is treated
//! as having no motion tier at all.

use crate::sensor::platform::{ProbeError, SensorPlatform};
use crate::sensor::types::{GroupId, SensorType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Read-only view of which sensors the device carries.
#[derive(Clone)]
pub struct CapabilityProbe {
    platform: Arc<dyn SensorPlatform>,
}

impl CapabilityProbe {
    pub fn new(platform: Arc<dyn SensorPlatform>) -> Self {
        Self { platform }
    }

    /// Ask the framework whether `sensor` exists on this device.
    pub fn is_supported(&self, sensor: SensorType) -> Result<bool, ProbeError> {
        self.platform
            .is_supported(sensor)
            .map_err(|source| ProbeError { sensor, source })
    }

    /// Strict AND over the group's sensors. Query failures count as absent.
    pub fn group_supported(&self, group: GroupId) -> bool {
        for &sensor in group.sensors() {
            match self.is_supported(sensor) {
                Ok(true) => {}
                Ok(false) => {
                    tracing::warn!(%group, %sensor, "sensor not present, group unsupported");
                    return false;
                }
                Err(e) => {
                    tracing::error!(%group, error = %e, "capability query failed, group unsupported");
                    return false;
                }
            }
        }
        tracing::debug!(%group, "all group sensors present");
        true
    }

    /// Full per-sensor and per-group report.
    pub fn capabilities(&self) -> DeviceCapabilities {
        let mut sensors = BTreeMap::new();
        for sensor in SensorType::ALL {
            let status = match self.is_supported(sensor) {
                Ok(true) => SensorStatus::Present,
                Ok(false) => SensorStatus::Absent,
                Err(e) => SensorStatus::QueryFailed(e.source.to_string()),
            };
            sensors.insert(sensor, status);
        }

        let groups = GroupId::ALL
            .into_iter()
            .map(|g| {
                let supported = g
                    .sensors()
                    .iter()
                    .all(|s| matches!(sensors.get(s), Some(SensorStatus::Present)));
                (g, supported)
            })
            .collect();

        DeviceCapabilities { sensors, groups }
    }
}

/// Availability of one sensor as reported by the framework.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SensorStatus {
    Present,
    Absent,
    QueryFailed(String),
}

/// Snapshot of the device's sensor capabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceCapabilities {
    pub sensors: BTreeMap<SensorType, SensorStatus>,
    pub groups: BTreeMap<GroupId, bool>,
}

impl DeviceCapabilities {
    pub fn group_supported(&self, group: GroupId) -> bool {
        self.groups.get(&group).copied().unwrap_or(false)
    }
}
