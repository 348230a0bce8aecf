//! Consent handling for the Synheart Wear Agent.
//!
//! Sensor data is only read after the user granted the scope gating it.

pub mod gate;
pub mod scope;

// Re-export commonly used types
pub use gate::{GateError, PermissionGate, RequestStatus, ScopePrivileges};
pub use scope::{
    AuthorityError, ConsentCallback, ConsentOutcome, ConsentState, PrivacyAuthority,
    PrivacyScope, STORAGE_PRIVILEGE, VITAL_PRIVILEGE,
};
