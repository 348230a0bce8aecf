//! The acquisition agent: subsystem ownership, the permission-gated
//! acquisition state machine, and the lifecycle entry points.

pub mod lifecycle;
pub mod orchestrator;
pub mod subsystem;

pub use lifecycle::SensorAgent;
pub use orchestrator::AcquisitionOrchestrator;
pub use subsystem::{AcquireError, SensorSubsystem, SubsystemError};
