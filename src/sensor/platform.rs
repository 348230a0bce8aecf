//! The boundary to the device sensor framework.
//!
//! Backends implement [`SensorPlatform`]; the rest of the crate only speaks in
//! terms of the raw identifiers defined here.

use crate::sensor::types::{SensorReading, SensorType};
use crossbeam_channel::Sender;
use thiserror::Error;

/// Framework identifier of an opened default sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawSensor(pub u64);

/// Framework identifier of a per-sensor listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawListener(pub u64);

/// Where a started listener pushes its readings.
///
/// Backends must use `try_send` so a slow consumer never blocks the
/// framework's delivery thread.
pub type ReadingSink = Sender<SensorReading>;

/// Errors reported by the sensor framework.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    #[error("sensor framework unavailable: {0}")]
    Unavailable(String),
    #[error("sensor not present on this device")]
    NotSupported,
    #[error("sensor is busy")]
    Busy,
    #[error("permission denied by the sensor framework")]
    PermissionDenied,
    #[error("invalid handle")]
    InvalidHandle,
    #[error("out of listener resources")]
    ResourceExhausted,
    #[error("driver error: {0}")]
    Driver(String),
}

/// Capability query failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("capability query for {sensor} failed: {source}")]
pub struct ProbeError {
    pub sensor: SensorType,
    #[source]
    pub source: PlatformError,
}

/// Operations the device sensor framework offers.
///
/// Callbacks and readings may be produced on threads owned by the backend,
/// hence the `Send + Sync` bound.
pub trait SensorPlatform: Send + Sync {
    /// Bring the framework up. Called once when the subsystem is built.
    fn initialize(&self) -> Result<(), PlatformError> {
        Ok(())
    }

    /// Release the framework as a whole. Called once at teardown.
    fn shutdown(&self) {}

    /// Whether the device carries this sensor.
    fn is_supported(&self, sensor: SensorType) -> Result<bool, PlatformError>;

    /// Fetch the default instance of a sensor kind.
    fn default_sensor(&self, sensor: SensorType) -> Result<RawSensor, PlatformError>;

    /// Create a listener bound to an opened sensor.
    fn create_listener(&self, sensor: RawSensor) -> Result<RawListener, PlatformError>;

    /// Begin delivering readings of the listener's sensor into `sink`.
    fn start_listener(&self, listener: RawListener, sink: ReadingSink)
        -> Result<(), PlatformError>;

    /// Stop delivering readings.
    fn stop_listener(&self, listener: RawListener) -> Result<(), PlatformError>;

    /// Release a listener.
    fn destroy_listener(&self, listener: RawListener) -> Result<(), PlatformError>;
}
