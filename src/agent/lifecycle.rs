//! Lifecycle entry points.
//!
//! The host calls [`SensorAgent::on_activated`] each time the app comes to the
//! foreground, [`SensorAgent::on_deactivated`] when it leaves, and
//! [`SensorAgent::on_terminate`] once before exit.

use crate::agent::orchestrator::AcquisitionOrchestrator;
use crate::agent::subsystem::{SensorSubsystem, SubsystemError};
use crate::config::Config;
use crate::permission::{PermissionGate, PrivacyAuthority};
use crate::sensor::{GroupId, SensorPlatform, SensorReading, UsabilityResult};
use crate::transparency::SharedTransparencyLog;
use crossbeam_channel::Receiver;
use std::sync::Arc;
use uuid::Uuid;

/// The sensor agent as seen by the process lifecycle.
pub struct SensorAgent {
    session_id: Uuid,
    orchestrator: AcquisitionOrchestrator,
}

impl SensorAgent {
    /// Bring up the sensor subsystem. The only fatal error of the agent.
    pub fn new(
        platform: Arc<dyn SensorPlatform>,
        authority: Arc<dyn PrivacyAuthority>,
        config: &Config,
        log: SharedTransparencyLog,
    ) -> Result<Self, SubsystemError> {
        let session_id = Uuid::new_v4();
        let subsystem = SensorSubsystem::new(platform, config.reading_capacity)?;
        let gate = PermissionGate::new(authority, config.privileges.clone());
        tracing::info!(session = %session_id, "sensor agent created");

        Ok(Self {
            session_id,
            orchestrator: AcquisitionOrchestrator::new(subsystem, gate, log),
        })
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn orchestrator(&self) -> &AcquisitionOrchestrator {
        &self.orchestrator
    }

    /// The app became active.
    pub fn on_activated(&self) -> UsabilityResult {
        let result = self.orchestrator.ensure_sensors_active();
        tracing::info!(session = %self.session_id, %result, "activated");
        result
    }

    /// The app went to the background. Sensors keep running.
    pub fn on_deactivated(&self) {
        tracing::info!(session = %self.session_id, "deactivated, sensors left running");
    }

    /// Release every sensor resource. Later calls and late consent answers
    /// are ignored.
    pub fn on_terminate(&self) {
        if self.orchestrator.finalize() {
            tracing::info!(session = %self.session_id, "terminated");
        } else {
            tracing::debug!(session = %self.session_id, "already terminated");
        }
    }

    /// Readings of `group`, available once the group is started.
    pub fn readings(&self, group: GroupId) -> Receiver<SensorReading> {
        self.orchestrator.readings(group)
    }

    pub fn usability(&self) -> UsabilityResult {
        self.orchestrator.usability()
    }
}

impl Drop for SensorAgent {
    fn drop(&mut self) {
        self.on_terminate();
    }
}
