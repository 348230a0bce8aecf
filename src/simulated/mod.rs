//! Simulated wearable backend.
//!
//! Implements both platform seams from a [`DeviceProfile`], so the agent runs
//! on any host and every failure path can be exercised in tests.

pub mod device;
pub mod privacy;
pub mod profile;

// Re-export commonly used types
pub use device::{DeviceStats, ReadingPump, SimulatedDevice};
pub use privacy::{PromptMode, SimulatedPrivacy};
pub use profile::{DeviceProfile, ProfileError, PromptProfile, ScopeValues};
