//! The sensor subsystem: everything the agent owns on the sensor framework.

use crate::sensor::{
    CapabilityProbe, GroupId, GroupListener, GroupOpenError, HandleRegistry, ListenerError,
    PlatformError, SensorPlatform,
};
use std::sync::Arc;
use thiserror::Error;

/// The sensor framework could not be brought up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubsystemError {
    #[error("sensor framework failed to initialize: {0}")]
    Platform(#[from] PlatformError),
}

/// Why a group could not be brought to the started state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcquireError {
    #[error(transparent)]
    Open(#[from] GroupOpenError),
    #[error(transparent)]
    Listener(#[from] ListenerError),
}

/// Platform handle, handle registry and one listener per group.
pub struct SensorSubsystem {
    platform: Arc<dyn SensorPlatform>,
    probe: CapabilityProbe,
    registry: HandleRegistry,
    /// Indexed by group
    listeners: [GroupListener; 3],
    torn_down: bool,
}

impl SensorSubsystem {
    /// Initialize the framework and build the registry and listeners.
    pub fn new(platform: Arc<dyn SensorPlatform>, capacity: usize) -> Result<Self, SubsystemError> {
        platform.initialize()?;
        let listener = |group| GroupListener::with_capacity(group, platform.clone(), capacity);

        Ok(Self {
            probe: CapabilityProbe::new(platform.clone()),
            registry: HandleRegistry::new(platform.clone()),
            listeners: [
                listener(GroupId::Vital),
                listener(GroupId::Motion),
                listener(GroupId::Ambient),
            ],
            platform,
            torn_down: false,
        })
    }

    pub fn probe(&self) -> &CapabilityProbe {
        &self.probe
    }

    pub fn registry(&self) -> &HandleRegistry {
        &self.registry
    }

    pub fn listener(&self, group: GroupId) -> &GroupListener {
        &self.listeners[group.index()]
    }

    /// Open the group's sensors, then create and start its listener.
    pub fn acquire(&mut self, group: GroupId) -> Result<(), AcquireError> {
        let handles = self.registry.open_group(group)?;
        let listener = &mut self.listeners[group.index()];
        listener.create(&handles)?;
        listener.start()?;
        Ok(())
    }

    /// Stop and destroy every listener, newest group first, then release the
    /// handles and the framework. Runs once.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        for listener in self.listeners.iter_mut().rev() {
            listener.stop();
            listener.destroy();
        }
        self.registry.release_all();
        self.platform.shutdown();
        self.torn_down = true;
        tracing::info!("sensor subsystem torn down");
    }
}
