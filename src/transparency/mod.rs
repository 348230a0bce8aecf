//! Transparency module for the Synheart Wear Agent.
//!
//! Tracks what the agent does with sensors and consent so the user can
//! audit it with `synheart-wear status`.

pub mod log;

// Re-export commonly used types
pub use log::{
    create_shared_log, create_shared_log_with_persistence, SharedTransparencyLog, TransparencyLog,
    TransparencyStats,
};
