//! Handle registry: one opened default sensor per kind for the process lifetime.

use crate::sensor::platform::{PlatformError, RawSensor, SensorPlatform};
use crate::sensor::types::{GroupId, SensorType};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// An opened sensor instance.
///
/// Owned by the [`HandleRegistry`]; listeners only ever borrow it.
#[derive(Debug, PartialEq, Eq)]
pub struct SensorHandle {
    sensor: SensorType,
    raw: RawSensor,
}

impl SensorHandle {
    pub fn sensor(&self) -> SensorType {
        self.sensor
    }

    pub fn raw(&self) -> RawSensor {
        self.raw
    }
}

/// A sensor failed to open.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to open {sensor}: {reason}")]
pub struct OpenError {
    pub sensor: SensorType,
    #[source]
    pub reason: PlatformError,
}

/// One or more sensors of a group failed to open.
///
/// Every member is attempted, so this lists all failures and the sensors
/// that did open.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "{group} group: {} of {} sensors failed to open ({})",
    .failures.len(),
    .group.sensors().len(),
    sensor_names(.failures)
)]
pub struct GroupOpenError {
    pub group: GroupId,
    pub failures: Vec<OpenError>,
    pub opened: Vec<SensorType>,
}

impl GroupOpenError {
    /// First failure in group order.
    pub fn first(&self) -> Option<&OpenError> {
        self.failures.first()
    }

    pub fn failed_sensors(&self) -> Vec<SensorType> {
        self.failures.iter().map(|f| f.sensor).collect()
    }

    /// True when some members opened and some did not.
    pub fn is_partial(&self) -> bool {
        !self.opened.is_empty()
    }
}

fn sensor_names(failures: &[OpenError]) -> String {
    failures
        .iter()
        .map(|f| f.sensor.name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Stores the opened handle of every sensor kind.
pub struct HandleRegistry {
    platform: Arc<dyn SensorPlatform>,
    handles: HashMap<SensorType, SensorHandle>,
}

impl HandleRegistry {
    pub fn new(platform: Arc<dyn SensorPlatform>) -> Self {
        Self {
            platform,
            handles: HashMap::new(),
        }
    }

    /// Open the default instance of `sensor`, or return the stored one.
    pub fn open(&mut self, sensor: SensorType) -> Result<&SensorHandle, OpenError> {
        if !self.handles.contains_key(&sensor) {
            let raw = self
                .platform
                .default_sensor(sensor)
                .map_err(|reason| OpenError { sensor, reason })?;
            tracing::info!(%sensor, "sensor opened");
            self.handles.insert(sensor, SensorHandle { sensor, raw });
        }
        self.handles
            .get(&sensor)
            .ok_or(OpenError {
                sensor,
                reason: PlatformError::InvalidHandle,
            })
    }

    /// Open every member of `group`, continuing past failures.
    pub fn open_group(&mut self, group: GroupId) -> Result<Vec<&SensorHandle>, GroupOpenError> {
        let mut failures = Vec::new();
        let mut opened = Vec::new();

        for &sensor in group.sensors() {
            match self.open(sensor) {
                Ok(_) => opened.push(sensor),
                Err(e) => {
                    tracing::error!(%group, error = %e, "sensor open failed");
                    failures.push(e);
                }
            }
        }

        if !failures.is_empty() {
            return Err(GroupOpenError {
                group,
                failures,
                opened,
            });
        }

        Ok(group
            .sensors()
            .iter()
            .filter_map(|s| self.handles.get(s))
            .collect())
    }

    pub fn get(&self, sensor: SensorType) -> Option<&SensorHandle> {
        self.handles.get(&sensor)
    }

    pub fn is_open(&self, sensor: SensorType) -> bool {
        self.handles.contains_key(&sensor)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Drop every handle. Only called when the subsystem is torn down.
    pub fn release_all(&mut self) {
        let count = self.handles.len();
        self.handles.clear();
        tracing::debug!(count, "sensor handles released");
    }
}
