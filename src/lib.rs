//! Synheart Wear Agent - permission-gated sensor acquisition for wearables.
//!
//! This library decides, every time the host app becomes active, which of the
//! wearable's sensor groups may be opened, asks the user for consent when the
//! decision is still open, and drives each group through
//! open → listen → start exactly once.
//!
//! # Privacy Guarantees
//!
//! - **Consent first**: no sensor is opened before its privacy scope is granted
//! - **Ask once**: a declined prompt is never shown again in the same session
//! - **Pass-through**: readings are delivered untouched and never stored
//! - **Transparency**: every prompt and acquisition is counted and auditable
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Synheart Wear Agent                      │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐    ┌──────────────┐    ┌──────────────┐    │
//! │  │  Lifecycle   │──▶│ Orchestrator │──▶│  Permission  │    │
//! │  │ (SensorAgent)│    │  (per group) │◀──│     Gate     │    │
//! │  └──────────────┘    └──────────────┘    └──────────────┘    │
//! │                             │                                │
//! │              ┌──────────────┼──────────────┐                 │
//! │              ▼              ▼              ▼                 │
//! │       ┌────────────┐ ┌────────────┐ ┌────────────┐           │
//! │       │ Capability │ │   Handle   │ │   Group    │──▶ readings
//! │       │   Probe    │ │  Registry  │ │ Listeners  │           │
//! │       └────────────┘ └────────────┘ └────────────┘           │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use synheart_wear_agent::{
//!     simulated::{DeviceProfile, PromptMode, SimulatedDevice, SimulatedPrivacy},
//!     transparency::create_shared_log,
//!     Config, SensorAgent,
//! };
//!
//! let profile = DeviceProfile::default();
//! let device = Arc::new(SimulatedDevice::new(profile.clone()));
//! let privacy = Arc::new(SimulatedPrivacy::new(&profile, PromptMode::from_profile(&profile)));
//!
//! let agent = SensorAgent::new(device, privacy, &Config::default(), create_shared_log())
//!     .expect("sensor framework unavailable");
//!
//! // Undetermined consent: prompts are shown and groups come up once granted
//! let usability = agent.on_activated();
//! println!("{usability}");
//! ```

pub mod agent;
pub mod config;
pub mod permission;
pub mod sensor;
pub mod simulated;
pub mod transparency;

// Re-export key types at crate root for convenience
pub use agent::{AcquisitionOrchestrator, SensorAgent, SensorSubsystem, SubsystemError};
pub use config::{Config, ConfigError};
pub use permission::{ConsentOutcome, ConsentState, PrivacyAuthority, PrivacyScope};
pub use sensor::{GroupId, SensorPlatform, SensorReading, SensorType, UsabilityResult};
pub use transparency::{SharedTransparencyLog, TransparencyLog, TransparencyStats};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Privacy declaration that can be displayed to users.
pub const PRIVACY_DECLARATION: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║            SYNHEART WEAR AGENT - PRIVACY DECLARATION             ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  This agent opens your wearable's sensors only with consent.     ║
║                                                                  ║
║  ✓ WHAT WE ASK FOR:                                              ║
║    • Vital sensors (heart rate) under the vital permission       ║
║    • Motion sensors (accelerometer, gyroscope) and ambient       ║
║      sensors (light, steps, pressure, sleep) under one shared    ║
║      storage permission                                          ║
║                                                                  ║
║  ✗ WHAT WE NEVER DO:                                             ║
║    • Open a sensor before its permission is granted              ║
║    • Ask again after you declined, in the same session           ║
║    • Store or process sensor readings                            ║
║                                                                  ║
║  You can view what the agent did anytime with:                   ║
║    synheart-wear status                                          ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;
