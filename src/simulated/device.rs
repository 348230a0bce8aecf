//! Simulated sensor framework.
//!
//! Behaves like a real framework driven by a [`DeviceProfile`]: default
//! sensors have stable identifiers, listeners are numbered in creation order,
//! and readings are pushed with `try_send` so a full channel drops them.

use crate::sensor::platform::{
    PlatformError, RawListener, RawSensor, ReadingSink, SensorPlatform,
};
use crate::sensor::types::{SensorReading, SensorType};
use crate::simulated::profile::DeviceProfile;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Call counters, for tests and the CLI summary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceStats {
    pub probes: u64,
    pub opens: u64,
    pub listener_creates: u64,
    pub listener_starts: u64,
    pub listener_stops: u64,
    pub listener_destroys: u64,
    /// Listeners created and not yet destroyed
    pub listeners_alive: usize,
    pub readings_delivered: u64,
}

#[derive(Debug)]
struct ListenerSlot {
    sensor: SensorType,
    sink: Option<ReadingSink>,
}

#[derive(Debug, Default)]
struct DeviceState {
    initialized: bool,
    next_listener: u64,
    listeners: BTreeMap<u64, ListenerSlot>,
    stats: DeviceStats,
}

/// A sensor framework backed by a [`DeviceProfile`].
#[derive(Debug)]
pub struct SimulatedDevice {
    profile: DeviceProfile,
    state: Mutex<DeviceState>,
}

impl SimulatedDevice {
    pub fn new(profile: DeviceProfile) -> Self {
        Self {
            profile,
            state: Mutex::new(DeviceState::default()),
        }
    }

    /// A device whose framework is already up, as after subsystem startup.
    pub fn initialized(profile: DeviceProfile) -> Self {
        let device = Self::new(profile);
        if device.initialize().is_err() {
            tracing::warn!("simulated framework is offline");
        }
        device
    }

    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    pub fn stats(&self) -> DeviceStats {
        self.lock().stats.clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.lock().initialized
    }

    /// Push one synthetic reading from every started listener.
    ///
    /// Returns how many readings were accepted by their channels.
    pub fn emit_readings(&self) -> usize {
        let mut state = self.lock();
        let mut delivered = 0;
        for slot in state.listeners.values() {
            if let Some(sink) = &slot.sink {
                let reading = SensorReading::new(slot.sensor, synthetic_values(slot.sensor));
                if sink.try_send(reading).is_ok() {
                    delivered += 1;
                }
            }
        }
        state.stats.readings_delivered += delivered as u64;
        delivered
    }

    /// Emit readings from a background thread every `interval` until the
    /// returned pump is stopped or dropped.
    pub fn spawn_pump(device: Arc<SimulatedDevice>, interval: Duration) -> ReadingPump {
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        let handle = thread::spawn(move || {
            while flag.load(Ordering::SeqCst) {
                device.emit_readings();
                thread::sleep(interval);
            }
        });
        ReadingPump {
            running,
            handle: Some(handle),
        }
    }

    fn lock(&self) -> MutexGuard<'_, DeviceState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn ensure_up(&self, state: &DeviceState) -> Result<(), PlatformError> {
        if self.profile.framework_offline || !state.initialized {
            return Err(PlatformError::Unavailable(
                "sensor framework not initialized".to_string(),
            ));
        }
        Ok(())
    }
}

impl SensorPlatform for SimulatedDevice {
    fn initialize(&self) -> Result<(), PlatformError> {
        if self.profile.framework_offline {
            return Err(PlatformError::Unavailable(
                "sensor service did not respond".to_string(),
            ));
        }
        self.lock().initialized = true;
        Ok(())
    }

    fn shutdown(&self) {
        let mut state = self.lock();
        state.initialized = false;
        for slot in state.listeners.values_mut() {
            slot.sink = None;
        }
    }

    fn is_supported(&self, sensor: SensorType) -> Result<bool, PlatformError> {
        let mut state = self.lock();
        state.stats.probes += 1;
        if self.profile.probe_failures.contains(&sensor) {
            return Err(PlatformError::Driver(format!("{sensor} query timed out")));
        }
        Ok(!self.profile.missing.contains(&sensor))
    }

    fn default_sensor(&self, sensor: SensorType) -> Result<RawSensor, PlatformError> {
        let mut state = self.lock();
        self.ensure_up(&state)?;
        state.stats.opens += 1;
        if self.profile.missing.contains(&sensor) {
            return Err(PlatformError::NotSupported);
        }
        if self.profile.open_failures.contains(&sensor) {
            return Err(PlatformError::Busy);
        }
        Ok(raw_sensor(sensor))
    }

    fn create_listener(&self, sensor: RawSensor) -> Result<RawListener, PlatformError> {
        let mut state = self.lock();
        self.ensure_up(&state)?;
        state.stats.listener_creates += 1;
        let kind = sensor_for(sensor).ok_or(PlatformError::InvalidHandle)?;
        if self.profile.listen_failures.contains(&kind) {
            return Err(PlatformError::ResourceExhausted);
        }
        state.next_listener += 1;
        let id = state.next_listener;
        state.listeners.insert(
            id,
            ListenerSlot {
                sensor: kind,
                sink: None,
            },
        );
        state.stats.listeners_alive = state.listeners.len();
        Ok(RawListener(id))
    }

    fn start_listener(&self, listener: RawListener, sink: ReadingSink) -> Result<(), PlatformError> {
        let mut state = self.lock();
        self.ensure_up(&state)?;
        state.stats.listener_starts += 1;
        let fails = {
            let slot = state
                .listeners
                .get(&listener.0)
                .ok_or(PlatformError::InvalidHandle)?;
            self.profile.start_failures.contains(&slot.sensor)
        };
        if fails {
            return Err(PlatformError::Driver("listener refused to start".to_string()));
        }
        if let Some(slot) = state.listeners.get_mut(&listener.0) {
            slot.sink = Some(sink);
        }
        Ok(())
    }

    fn stop_listener(&self, listener: RawListener) -> Result<(), PlatformError> {
        let mut state = self.lock();
        state.stats.listener_stops += 1;
        let slot = state
            .listeners
            .get_mut(&listener.0)
            .ok_or(PlatformError::InvalidHandle)?;
        slot.sink = None;
        Ok(())
    }

    fn destroy_listener(&self, listener: RawListener) -> Result<(), PlatformError> {
        let mut state = self.lock();
        state.stats.listener_destroys += 1;
        state
            .listeners
            .remove(&listener.0)
            .ok_or(PlatformError::InvalidHandle)?;
        state.stats.listeners_alive = state.listeners.len();
        Ok(())
    }
}

/// Background reading generator returned by [`SimulatedDevice::spawn_pump`].
pub struct ReadingPump {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ReadingPump {
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ReadingPump {
    fn drop(&mut self) {
        self.stop();
    }
}

// Default sensors get fixed identifiers so reopening yields the same handle.
fn raw_sensor(sensor: SensorType) -> RawSensor {
    let index = SensorType::ALL
        .iter()
        .position(|s| *s == sensor)
        .unwrap_or_default();
    RawSensor(index as u64 + 1)
}

fn sensor_for(raw: RawSensor) -> Option<SensorType> {
    let index = usize::try_from(raw.0).ok()?.checked_sub(1)?;
    SensorType::ALL.get(index).copied()
}

fn synthetic_values(sensor: SensorType) -> Vec<f32> {
    match sensor {
        SensorType::HeartRate => vec![72.0],
        SensorType::HeartRateLed => vec![4096.0],
        SensorType::Accelerometer => vec![0.0, 0.0, 9.81],
        SensorType::Gravity => vec![0.0, 0.0, 9.81],
        SensorType::GyroscopeVector => vec![0.0, 0.0, 0.0, 1.0],
        SensorType::Gyroscope => vec![0.0, 0.0, 0.0],
        SensorType::LinearAcceleration => vec![0.0, 0.0, 0.0],
        SensorType::Light => vec![320.0],
        SensorType::StepCounter => vec![0.0],
        SensorType::Pressure => vec![1013.25],
        SensorType::SleepMonitor => vec![0.0],
    }
}
