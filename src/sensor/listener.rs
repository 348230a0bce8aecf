//! Group listeners.
//!
//! One [`GroupListener`] exists per [`GroupId`]. It owns one framework listener
//! per member sensor and fans every reading into a single bounded channel, so
//! consumers only ever deal with one receiver per group.

use crate::sensor::platform::{PlatformError, RawListener, SensorPlatform};
use crate::sensor::registry::SensorHandle;
use crate::sensor::types::{GroupId, SensorReading, SensorType};
use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Default capacity of a group's reading channel.
pub const DEFAULT_READING_CAPACITY: usize = 10_000;

/// Lifecycle of a group listener.
///
/// `Started` implies `Created`; there is no way to represent a started but
/// uncreated listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListenerState {
    Uninitialized,
    Created,
    Started,
}

impl ListenerState {
    pub fn is_created(self) -> bool {
        !matches!(self, ListenerState::Uninitialized)
    }

    pub fn is_started(self) -> bool {
        matches!(self, ListenerState::Started)
    }
}

/// Errors raised while creating or starting a group listener.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListenerError {
    #[error("{group} listener has no handles to subscribe to")]
    NoHandles { group: GroupId },
    #[error("handle for {sensor} does not belong to the {group} group")]
    ForeignHandle { group: GroupId, sensor: SensorType },
    #[error("{group} listener is missing a handle for {sensor}")]
    MissingHandle { group: GroupId, sensor: SensorType },
    #[error("{group} listener must be created before it is started")]
    NotCreated { group: GroupId },
    #[error("failed to create {group} listener for {sensor}: {source}")]
    Create {
        group: GroupId,
        sensor: SensorType,
        #[source]
        source: PlatformError,
    },
    #[error("failed to start {group} listener for {sensor}: {source}")]
    Start {
        group: GroupId,
        sensor: SensorType,
        #[source]
        source: PlatformError,
    },
}

/// The per-group subscription object.
pub struct GroupListener {
    group: GroupId,
    platform: Arc<dyn SensorPlatform>,
    state: ListenerState,
    /// Framework listeners in group order
    members: Vec<(SensorType, RawListener)>,
    sender: Sender<SensorReading>,
    receiver: Receiver<SensorReading>,
}

impl GroupListener {
    pub fn new(group: GroupId, platform: Arc<dyn SensorPlatform>) -> Self {
        Self::with_capacity(group, platform, DEFAULT_READING_CAPACITY)
    }

    /// Create a listener whose reading channel holds at most `capacity` readings.
    pub fn with_capacity(group: GroupId, platform: Arc<dyn SensorPlatform>, capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        Self {
            group,
            platform,
            state: ListenerState::Uninitialized,
            members: Vec::new(),
            sender,
            receiver,
        }
    }

    pub fn group(&self) -> GroupId {
        self.group
    }

    pub fn state(&self) -> ListenerState {
        self.state
    }

    /// Bind one framework listener to each of the group's handles.
    ///
    /// All or nothing: if any framework listener cannot be created, the ones
    /// already created are released and the state stays `Uninitialized`.
    pub fn create(&mut self, handles: &[&SensorHandle]) -> Result<(), ListenerError> {
        if self.state.is_created() {
            tracing::debug!(group = %self.group, "listener already created");
            return Ok(());
        }
        self.validate(handles)?;

        let mut members = Vec::with_capacity(handles.len());
        for handle in handles {
            match self.platform.create_listener(handle.raw()) {
                Ok(raw) => members.push((handle.sensor(), raw)),
                Err(source) => {
                    for (sensor, raw) in members {
                        if let Err(e) = self.platform.destroy_listener(raw) {
                            tracing::warn!(group = %self.group, %sensor, error = %e, "rollback destroy failed");
                        }
                    }
                    return Err(ListenerError::Create {
                        group: self.group,
                        sensor: handle.sensor(),
                        source,
                    });
                }
            }
        }

        self.members = members;
        self.state = ListenerState::Created;
        tracing::info!(group = %self.group, sensors = self.members.len(), "listener created");
        Ok(())
    }

    /// Subscribe every member sensor to reading delivery.
    pub fn start(&mut self) -> Result<(), ListenerError> {
        match self.state {
            ListenerState::Uninitialized => {
                return Err(ListenerError::NotCreated { group: self.group })
            }
            ListenerState::Started => {
                tracing::debug!(group = %self.group, "listener already started");
                return Ok(());
            }
            ListenerState::Created => {}
        }

        for (i, &(sensor, raw)) in self.members.iter().enumerate() {
            if let Err(source) = self.platform.start_listener(raw, self.sender.clone()) {
                for &(started, raw) in &self.members[..i] {
                    if let Err(e) = self.platform.stop_listener(raw) {
                        tracing::warn!(group = %self.group, sensor = %started, error = %e, "rollback stop failed");
                    }
                }
                return Err(ListenerError::Start {
                    group: self.group,
                    sensor,
                    source,
                });
            }
        }

        self.state = ListenerState::Started;
        tracing::info!(group = %self.group, "listener started");
        Ok(())
    }

    /// Stop reading delivery. No-op unless started.
    pub fn stop(&mut self) {
        if !self.state.is_started() {
            return;
        }
        for &(sensor, raw) in &self.members {
            if let Err(e) = self.platform.stop_listener(raw) {
                tracing::warn!(group = %self.group, %sensor, error = %e, "failed to stop sensor listener");
            }
        }
        self.state = ListenerState::Created;
        tracing::info!(group = %self.group, "listener stopped");
    }

    /// Release every framework listener. Safe on an uninitialized listener.
    pub fn destroy(&mut self) {
        if !self.state.is_created() {
            return;
        }
        self.stop();
        for (sensor, raw) in self.members.drain(..) {
            if let Err(e) = self.platform.destroy_listener(raw) {
                tracing::error!(group = %self.group, %sensor, error = %e, "failed to release sensor listener");
            }
        }
        self.state = ListenerState::Uninitialized;
        tracing::info!(group = %self.group, "listener destroyed");
    }

    /// Group-level reading channel.
    pub fn receiver(&self) -> &Receiver<SensorReading> {
        &self.receiver
    }

    /// Try to receive a reading without blocking.
    pub fn try_recv(&self) -> Option<SensorReading> {
        self.receiver.try_recv().ok()
    }

    fn validate(&self, handles: &[&SensorHandle]) -> Result<(), ListenerError> {
        if handles.is_empty() {
            return Err(ListenerError::NoHandles { group: self.group });
        }
        if let Some(h) = handles.iter().find(|h| h.sensor().group() != self.group) {
            return Err(ListenerError::ForeignHandle {
                group: self.group,
                sensor: h.sensor(),
            });
        }
        for &sensor in self.group.sensors() {
            if !handles.iter().any(|h| h.sensor() == sensor) {
                return Err(ListenerError::MissingHandle {
                    group: self.group,
                    sensor,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::registry::HandleRegistry;
    use crate::simulated::{DeviceProfile, SimulatedDevice};
    use std::time::Duration;

    fn setup(profile: DeviceProfile) -> (Arc<SimulatedDevice>, HandleRegistry) {
        let device = Arc::new(SimulatedDevice::initialized(profile));
        let registry = HandleRegistry::new(device.clone());
        (device, registry)
    }

    #[test]
    fn test_lifecycle_transitions() {
        let (device, mut registry) = setup(DeviceProfile::default());
        let mut listener = GroupListener::new(GroupId::Vital, device.clone());
        assert_eq!(listener.state(), ListenerState::Uninitialized);

        let handles = registry.open_group(GroupId::Vital).unwrap();
        listener.create(&handles).unwrap();
        assert_eq!(listener.state(), ListenerState::Created);

        listener.start().unwrap();
        assert_eq!(listener.state(), ListenerState::Started);

        listener.stop();
        assert_eq!(listener.state(), ListenerState::Created);

        listener.destroy();
        assert_eq!(listener.state(), ListenerState::Uninitialized);
        assert_eq!(device.stats().listeners_alive, 0);
    }

    #[test]
    fn test_create_and_start_are_idempotent() {
        let (device, mut registry) = setup(DeviceProfile::default());
        let mut listener = GroupListener::new(GroupId::Ambient, device.clone());

        let handles = registry.open_group(GroupId::Ambient).unwrap();
        listener.create(&handles).unwrap();
        listener.create(&handles).unwrap();
        listener.start().unwrap();
        listener.start().unwrap();

        let stats = device.stats();
        assert_eq!(stats.listener_creates, 4);
        assert_eq!(stats.listener_starts, 4);
        listener.destroy();
    }

    #[test]
    fn test_start_requires_create() {
        let (device, _) = setup(DeviceProfile::default());
        let mut listener = GroupListener::new(GroupId::Motion, device);

        assert_eq!(
            listener.start(),
            Err(ListenerError::NotCreated {
                group: GroupId::Motion
            })
        );
    }

    #[test]
    fn test_stop_and_destroy_on_uninitialized_are_noops() {
        let (device, _) = setup(DeviceProfile::default());
        let mut listener = GroupListener::new(GroupId::Motion, device.clone());

        listener.stop();
        listener.destroy();

        assert_eq!(listener.state(), ListenerState::Uninitialized);
        let stats = device.stats();
        assert_eq!(stats.listener_stops, 0);
        assert_eq!(stats.listener_destroys, 0);
    }

    #[test]
    fn test_create_rejects_incomplete_handle_set() {
        let (device, mut registry) = setup(DeviceProfile::default());
        let mut listener = GroupListener::new(GroupId::Vital, device);

        let handle = registry.open(SensorType::HeartRate).unwrap();
        let err = listener.create(&[handle]).unwrap_err();

        assert_eq!(
            err,
            ListenerError::MissingHandle {
                group: GroupId::Vital,
                sensor: SensorType::HeartRateLed
            }
        );
        assert_eq!(listener.state(), ListenerState::Uninitialized);
    }

    #[test]
    fn test_create_failure_rolls_back() {
        let profile = DeviceProfile::default().with_listen_failure(SensorType::StepCounter);
        let (device, mut registry) = setup(profile);
        let mut listener = GroupListener::new(GroupId::Ambient, device.clone());

        let handles = registry.open_group(GroupId::Ambient).unwrap();
        let err = listener.create(&handles).unwrap_err();

        assert!(matches!(
            err,
            ListenerError::Create {
                sensor: SensorType::StepCounter,
                ..
            }
        ));
        assert_eq!(listener.state(), ListenerState::Uninitialized);
        assert_eq!(device.stats().listeners_alive, 0);
    }

    #[test]
    fn test_start_failure_stays_created() {
        let profile = DeviceProfile::default().with_start_failure(SensorType::Gravity);
        let (device, mut registry) = setup(profile);
        let mut listener = GroupListener::new(GroupId::Motion, device.clone());

        let handles = registry.open_group(GroupId::Motion).unwrap();
        listener.create(&handles).unwrap();
        let err = listener.start().unwrap_err();

        assert!(matches!(
            err,
            ListenerError::Start {
                sensor: SensorType::Gravity,
                ..
            }
        ));
        assert_eq!(listener.state(), ListenerState::Created);
        // the accelerometer started first and was rolled back
        assert_eq!(device.stats().listener_stops, 1);
    }

    #[test]
    fn test_readings_fan_into_group_channel() {
        let (device, mut registry) = setup(DeviceProfile::default());
        let mut listener = GroupListener::new(GroupId::Vital, device.clone());

        let handles = registry.open_group(GroupId::Vital).unwrap();
        listener.create(&handles).unwrap();
        listener.start().unwrap();

        assert_eq!(device.emit_readings(), 2);
        let first = listener
            .receiver()
            .recv_timeout(Duration::from_secs(1))
            .unwrap();
        let second = listener.try_recv().unwrap();
        assert_eq!(first.sensor, SensorType::HeartRate);
        assert_eq!(second.sensor, SensorType::HeartRateLed);
        assert_eq!(first.group(), GroupId::Vital);

        listener.stop();
        assert_eq!(device.emit_readings(), 0);
        listener.destroy();
    }
}
