//! Sensor kinds, sensor groups and the readings delivered by started listeners.
//!
//! The group table is the single place that decides which physical sensors
//! belong to which capability tier. Everything else iterates it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A physical sensor kind exposed by the device sensor framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SensorType {
    HeartRate,
    HeartRateLed,
    Accelerometer,
    Gravity,
    GyroscopeVector,
    Gyroscope,
    LinearAcceleration,
    Light,
    StepCounter,
    Pressure,
    SleepMonitor,
}

impl SensorType {
    /// Every sensor kind, in group order.
    pub const ALL: [SensorType; 11] = [
        SensorType::HeartRate,
        SensorType::HeartRateLed,
        SensorType::Accelerometer,
        SensorType::Gravity,
        SensorType::GyroscopeVector,
        SensorType::Gyroscope,
        SensorType::LinearAcceleration,
        SensorType::Light,
        SensorType::StepCounter,
        SensorType::Pressure,
        SensorType::SleepMonitor,
    ];

    /// Stable short name used in logs and profiles.
    pub fn name(self) -> &'static str {
        match self {
            SensorType::HeartRate => "heart-rate",
            SensorType::HeartRateLed => "heart-rate-led",
            SensorType::Accelerometer => "accelerometer",
            SensorType::Gravity => "gravity",
            SensorType::GyroscopeVector => "gyroscope-vector",
            SensorType::Gyroscope => "gyroscope",
            SensorType::LinearAcceleration => "linear-acceleration",
            SensorType::Light => "light",
            SensorType::StepCounter => "step-counter",
            SensorType::Pressure => "pressure",
            SensorType::SleepMonitor => "sleep-monitor",
        }
    }

    /// The group this sensor is acquired with.
    pub fn group(self) -> GroupId {
        match self {
            SensorType::HeartRate | SensorType::HeartRateLed => GroupId::Vital,
            SensorType::Accelerometer
            | SensorType::Gravity
            | SensorType::GyroscopeVector
            | SensorType::Gyroscope
            | SensorType::LinearAcceleration => GroupId::Motion,
            SensorType::Light
            | SensorType::StepCounter
            | SensorType::Pressure
            | SensorType::SleepMonitor => GroupId::Ambient,
        }
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of sensors that is gated and acquired together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupId {
    /// Heart-rate class sensors
    Vital,
    /// Inertial sensors
    Motion,
    /// Environmental sensors
    Ambient,
}

const VITAL_SENSORS: &[SensorType] = &[SensorType::HeartRate, SensorType::HeartRateLed];

const MOTION_SENSORS: &[SensorType] = &[
    SensorType::Accelerometer,
    SensorType::Gravity,
    SensorType::GyroscopeVector,
    SensorType::Gyroscope,
    SensorType::LinearAcceleration,
];

const AMBIENT_SENSORS: &[SensorType] = &[
    SensorType::Light,
    SensorType::StepCounter,
    SensorType::Pressure,
    SensorType::SleepMonitor,
];

impl GroupId {
    /// All groups in acquisition order. Teardown walks this in reverse.
    pub const ALL: [GroupId; 3] = [GroupId::Vital, GroupId::Motion, GroupId::Ambient];

    /// The ordered sensor members of this group.
    pub fn sensors(self) -> &'static [SensorType] {
        match self {
            GroupId::Vital => VITAL_SENSORS,
            GroupId::Motion => MOTION_SENSORS,
            GroupId::Ambient => AMBIENT_SENSORS,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            GroupId::Vital => "vital",
            GroupId::Motion => "motion",
            GroupId::Ambient => "ambient",
        }
    }

    /// Position in [`GroupId::ALL`], used to index per-group arrays.
    pub(crate) fn index(self) -> usize {
        match self {
            GroupId::Vital => 0,
            GroupId::Motion => 1,
            GroupId::Ambient => 2,
        }
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single reading delivered by a started listener.
///
/// Values are passed through exactly as the sensor framework reports them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Sensor that produced the reading
    pub sensor: SensorType,
    /// Time the reading was delivered
    pub timestamp: DateTime<Utc>,
    /// Raw channel values (axis, intensity, count...)
    pub values: Vec<f32>,
}

impl SensorReading {
    pub fn new(sensor: SensorType, values: Vec<f32>) -> Self {
        Self {
            sensor,
            timestamp: Utc::now(),
            values,
        }
    }

    /// The group whose listener delivers this reading.
    pub fn group(&self) -> GroupId {
        self.sensor.group()
    }
}

/// Per-group usability after an activation cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsabilityResult {
    pub vital: bool,
    pub motion: bool,
    pub ambient: bool,
}

impl UsabilityResult {
    pub fn get(&self, group: GroupId) -> bool {
        match group {
            GroupId::Vital => self.vital,
            GroupId::Motion => self.motion,
            GroupId::Ambient => self.ambient,
        }
    }

    pub fn set(&mut self, group: GroupId, usable: bool) {
        match group {
            GroupId::Vital => self.vital = usable,
            GroupId::Motion => self.motion = usable,
            GroupId::Ambient => self.ambient = usable,
        }
    }

    /// True when every group is usable.
    pub fn all(&self) -> bool {
        self.vital && self.motion && self.ambient
    }
}

impl fmt::Display for UsabilityResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = |b: bool| if b { "usable" } else { "unusable" };
        write!(
            f,
            "vital: {}, motion: {}, ambient: {}",
            mark(self.vital),
            mark(self.motion),
            mark(self.ambient)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_sensor_belongs_to_exactly_one_group() {
        for sensor in SensorType::ALL {
            let owners: Vec<_> = GroupId::ALL
                .into_iter()
                .filter(|g| g.sensors().contains(&sensor))
                .collect();
            assert_eq!(owners.len(), 1, "{sensor} should have one group");
            assert_eq!(owners[0], sensor.group());
        }
    }

    #[test]
    fn test_group_sizes() {
        assert_eq!(GroupId::Vital.sensors().len(), 2);
        assert_eq!(GroupId::Motion.sensors().len(), 5);
        assert_eq!(GroupId::Ambient.sensors().len(), 4);
    }

    #[test]
    fn test_sensor_type_serializes_kebab_case() {
        let json = serde_json::to_string(&SensorType::GyroscopeVector).unwrap();
        assert_eq!(json, "\"gyroscope-vector\"");
        assert_eq!(SensorType::GyroscopeVector.to_string(), "gyroscope-vector");
    }

    #[test]
    fn test_usability_accessors() {
        let mut result = UsabilityResult::default();
        assert!(!result.all());
        for group in GroupId::ALL {
            result.set(group, true);
        }
        assert!(result.all());
        result.set(GroupId::Motion, false);
        assert!(!result.get(GroupId::Motion));
        assert!(result.get(GroupId::Ambient));
    }
}
