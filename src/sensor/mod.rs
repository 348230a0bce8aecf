//! Sensor access for the Synheart Wear Agent.
//!
//! This module wraps the platform sensor framework: capability probing,
//! handle management, and per-group listeners feeding a reading channel.

pub mod listener;
pub mod platform;
pub mod probe;
pub mod registry;
pub mod types;

// Re-export commonly used types
pub use listener::{GroupListener, ListenerError, ListenerState, DEFAULT_READING_CAPACITY};
pub use platform::{
    PlatformError, ProbeError, RawListener, RawSensor, ReadingSink, SensorPlatform,
};
pub use probe::{CapabilityProbe, DeviceCapabilities, SensorStatus};
pub use registry::{GroupOpenError, HandleRegistry, OpenError, SensorHandle};
pub use types::{GroupId, SensorReading, SensorType, UsabilityResult};
