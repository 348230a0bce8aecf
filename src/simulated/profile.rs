//! Device profiles for the simulated backend.
//!
//! A profile describes which sensors a device carries, which ones misbehave,
//! and how the user answers consent prompts. Profiles are plain JSON so a
//! scenario can be written by hand and passed to `synheart-wear run --profile`.

use crate::permission::{ConsentOutcome, ConsentState, PrivacyScope};
use crate::sensor::SensorType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;

/// Errors loading or saving a device profile.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Consent per scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeValues<T> {
    pub vital: T,
    pub storage: T,
}

impl<T: Copy> ScopeValues<T> {
    pub fn get(&self, scope: PrivacyScope) -> T {
        match scope {
            PrivacyScope::Vital => self.vital,
            PrivacyScope::Storage => self.storage,
        }
    }

    pub fn set(&mut self, scope: PrivacyScope, value: T) {
        match scope {
            PrivacyScope::Vital => self.vital = value,
            PrivacyScope::Storage => self.storage = value,
        }
    }
}

/// How the simulated user answers consent prompts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptProfile {
    /// Answer given to each scope's prompt
    pub answers: ScopeValues<ConsentOutcome>,
    /// Time the user takes to answer, in milliseconds
    pub delay_ms: u64,
}

impl Default for PromptProfile {
    fn default() -> Self {
        Self {
            answers: ScopeValues {
                vital: ConsentOutcome::AllowedForever,
                storage: ConsentOutcome::AllowedForever,
            },
            delay_ms: 500,
        }
    }
}

/// A simulated wearable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceProfile {
    /// Sensors the device does not carry
    pub missing: BTreeSet<SensorType>,
    /// Sensors whose capability query errors out
    pub probe_failures: BTreeSet<SensorType>,
    /// Sensors present but failing to open
    pub open_failures: BTreeSet<SensorType>,
    /// Sensors for which no listener can be created
    pub listen_failures: BTreeSet<SensorType>,
    /// Sensors whose listener refuses to start
    pub start_failures: BTreeSet<SensorType>,
    /// Consent already on record when the process starts
    pub consent: ScopeValues<ConsentState>,
    pub prompt: PromptProfile,
    /// The privacy service cannot be reached
    pub authority_offline: bool,
    /// The sensor framework fails to initialize
    pub framework_offline: bool,
    /// Interval between synthetic readings, in milliseconds
    pub reading_interval_ms: u64,
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self {
            missing: BTreeSet::new(),
            probe_failures: BTreeSet::new(),
            open_failures: BTreeSet::new(),
            listen_failures: BTreeSet::new(),
            start_failures: BTreeSet::new(),
            consent: ScopeValues {
                vital: ConsentState::Undetermined,
                storage: ConsentState::Undetermined,
            },
            prompt: PromptProfile::default(),
            authority_offline: false,
            framework_offline: false,
            reading_interval_ms: 1000,
        }
    }
}

impl DeviceProfile {
    /// A fully equipped device that already holds every grant.
    pub fn all_allowed() -> Self {
        Self::default()
            .with_consent(PrivacyScope::Vital, ConsentState::Allowed)
            .with_consent(PrivacyScope::Storage, ConsentState::Allowed)
    }

    pub fn load(path: &Path) -> Result<Self, ProfileError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ProfileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn without_sensor(mut self, sensor: SensorType) -> Self {
        self.missing.insert(sensor);
        self
    }

    pub fn with_probe_failure(mut self, sensor: SensorType) -> Self {
        self.probe_failures.insert(sensor);
        self
    }

    pub fn with_open_failure(mut self, sensor: SensorType) -> Self {
        self.open_failures.insert(sensor);
        self
    }

    pub fn with_listen_failure(mut self, sensor: SensorType) -> Self {
        self.listen_failures.insert(sensor);
        self
    }

    pub fn with_start_failure(mut self, sensor: SensorType) -> Self {
        self.start_failures.insert(sensor);
        self
    }

    pub fn with_consent(mut self, scope: PrivacyScope, state: ConsentState) -> Self {
        self.consent.set(scope, state);
        self
    }

    pub fn with_prompt_answer(mut self, scope: PrivacyScope, outcome: ConsentOutcome) -> Self {
        self.prompt.answers.set(scope, outcome);
        self
    }

    pub fn with_prompt_delay_ms(mut self, delay_ms: u64) -> Self {
        self.prompt.delay_ms = delay_ms;
        self
    }

    pub fn with_authority_offline(mut self) -> Self {
        self.authority_offline = true;
        self
    }

    pub fn with_framework_offline(mut self) -> Self {
        self.framework_offline = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile() {
        let profile = DeviceProfile::default();
        assert!(profile.missing.is_empty());
        assert_eq!(profile.consent.vital, ConsentState::Undetermined);
        assert_eq!(
            profile.prompt.answers.get(PrivacyScope::Storage),
            ConsentOutcome::AllowedForever
        );
    }

    #[test]
    fn test_partial_profile_json_fills_defaults() {
        let json = r#"{ "missing": ["pressure"], "consent": { "vital": "denied", "storage": "allowed" } }"#;
        let profile: DeviceProfile = serde_json::from_str(json).unwrap();

        assert!(profile.missing.contains(&SensorType::Pressure));
        assert_eq!(profile.consent.get(PrivacyScope::Vital), ConsentState::Denied);
        assert_eq!(profile.reading_interval_ms, 1000);
        assert!(!profile.authority_offline);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir()
            .join("synheart-wear-profile-test")
            .join("profile.json");
        let profile = DeviceProfile::default()
            .with_open_failure(SensorType::Gyroscope)
            .with_prompt_answer(PrivacyScope::Vital, ConsentOutcome::DeniedOnce);

        profile.save(&path).unwrap();
        let loaded = DeviceProfile::load(&path).unwrap();
        assert_eq!(loaded, profile);

        let _ = std::fs::remove_file(&path);
    }
}
