//! Transparency log.
//!
//! Counts what the agent did with the user's sensors and consent: readings
//! passed through per group, prompts shown, how they were answered, and how
//! many acquisitions succeeded or failed. No reading values are kept.

use crate::sensor::GroupId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Transparency statistics for the current session.
#[derive(Debug)]
pub struct TransparencyLog {
    /// Readings delivered per group, indexed by group
    readings: [AtomicU64; 3],
    /// Consent prompts issued
    consent_prompts: AtomicU64,
    /// Prompts answered with a grant
    consent_grants: AtomicU64,
    /// Prompts answered with anything else
    consent_declines: AtomicU64,
    /// Groups brought to the started state
    acquisitions: AtomicU64,
    /// Acquisition attempts that left a group unusable
    acquisition_failures: AtomicU64,
    session_start: DateTime<Utc>,
    persist_path: Option<PathBuf>,
}

impl TransparencyLog {
    pub fn new() -> Self {
        Self {
            readings: Default::default(),
            consent_prompts: AtomicU64::new(0),
            consent_grants: AtomicU64::new(0),
            consent_declines: AtomicU64::new(0),
            acquisitions: AtomicU64::new(0),
            acquisition_failures: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a transparency log that continues from the stats stored at `path`.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        if let Err(e) = log.load() {
            tracing::warn!(error = %e, "could not load previous transparency stats");
        }

        log
    }

    pub fn record_readings(&self, group: GroupId, count: u64) {
        self.readings[group.index()].fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_consent_prompt(&self) {
        self.consent_prompts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_consent_grant(&self) {
        self.consent_grants.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_consent_decline(&self) {
        self.consent_declines.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_acquisition(&self) {
        self.acquisitions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_acquisition_failure(&self) {
        self.acquisition_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> TransparencyStats {
        let readings = |g: GroupId| self.readings[g.index()].load(Ordering::Relaxed);
        TransparencyStats {
            vital_readings: readings(GroupId::Vital),
            motion_readings: readings(GroupId::Motion),
            ambient_readings: readings(GroupId::Ambient),
            consent_prompts: self.consent_prompts.load(Ordering::Relaxed),
            consent_grants: self.consent_grants.load(Ordering::Relaxed),
            consent_declines: self.consent_declines.load(Ordering::Relaxed),
            acquisitions: self.acquisitions.load(Ordering::Relaxed),
            acquisition_failures: self.acquisition_failures.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Session Statistics:\n\
             - Vital readings passed through: {}\n\
             - Motion readings passed through: {}\n\
             - Ambient readings passed through: {}\n\
             - Consent prompts shown: {} ({} granted, {} declined)\n\
             - Sensor groups acquired: {}\n\
             - Failed acquisitions: {}\n\
             - Session duration: {} seconds\n\
             \n\
             Privacy Guarantee:\n\
             - Sensors are opened only after consent\n\
             - Declined prompts are never repeated in the same session\n\
             - Reading values are not stored",
            stats.vital_readings,
            stats.motion_readings,
            stats.ambient_readings,
            stats.consent_prompts,
            stats.consent_grants,
            stats.consent_declines,
            stats.acquisitions,
            stats.acquisition_failures,
            stats.session_duration_secs
        )
    }

    /// Save stats to disk. No-op without a persistence path.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                readings: [
                    stats.vital_readings,
                    stats.motion_readings,
                    stats.ambient_readings,
                ],
                consent_prompts: stats.consent_prompts,
                consent_grants: stats.consent_grants,
                consent_declines: stats.consent_declines,
                acquisitions: stats.acquisitions,
                acquisition_failures: stats.acquisition_failures,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;
            std::fs::write(path, json)?;
        }
        Ok(())
    }

    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                for (counter, value) in self.readings.iter().zip(persisted.readings) {
                    counter.store(value, Ordering::Relaxed);
                }
                self.consent_prompts
                    .store(persisted.consent_prompts, Ordering::Relaxed);
                self.consent_grants
                    .store(persisted.consent_grants, Ordering::Relaxed);
                self.consent_declines
                    .store(persisted.consent_declines, Ordering::Relaxed);
                self.acquisitions
                    .store(persisted.acquisitions, Ordering::Relaxed);
                self.acquisition_failures
                    .store(persisted.acquisition_failures, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    /// Reset all counters.
    pub fn reset(&self) {
        for counter in &self.readings {
            counter.store(0, Ordering::Relaxed);
        }
        self.consent_prompts.store(0, Ordering::Relaxed);
        self.consent_grants.store(0, Ordering::Relaxed);
        self.consent_declines.store(0, Ordering::Relaxed);
        self.acquisitions.store(0, Ordering::Relaxed);
        self.acquisition_failures.store(0, Ordering::Relaxed);
    }
}

impl Default for TransparencyLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of transparency statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransparencyStats {
    pub vital_readings: u64,
    pub motion_readings: u64,
    pub ambient_readings: u64,
    pub consent_prompts: u64,
    pub consent_grants: u64,
    pub consent_declines: u64,
    pub acquisitions: u64,
    pub acquisition_failures: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Stats format for persistence.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    /// Vital, motion, ambient
    readings: [u64; 3],
    consent_prompts: u64,
    consent_grants: u64,
    consent_declines: u64,
    acquisitions: u64,
    acquisition_failures: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared transparency log.
pub type SharedTransparencyLog = Arc<TransparencyLog>;

pub fn create_shared_log() -> SharedTransparencyLog {
    Arc::new(TransparencyLog::new())
}

pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedTransparencyLog {
    Arc::new(TransparencyLog::with_persistence(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readings_counted_per_group() {
        let log = TransparencyLog::new();

        log.record_readings(GroupId::Vital, 3);
        log.record_readings(GroupId::Ambient, 1);
        log.record_readings(GroupId::Vital, 2);

        let stats = log.stats();
        assert_eq!(stats.vital_readings, 5);
        assert_eq!(stats.motion_readings, 0);
        assert_eq!(stats.ambient_readings, 1);
    }

    #[test]
    fn test_transparency_log_reset() {
        let log = TransparencyLog::new();

        log.record_readings(GroupId::Motion, 100);
        log.record_consent_prompt();
        log.record_consent_decline();
        log.record_acquisition_failure();
        log.reset();

        let stats = log.stats();
        assert_eq!(stats.motion_readings, 0);
        assert_eq!(stats.consent_prompts, 0);
        assert_eq!(stats.consent_declines, 0);
        assert_eq!(stats.acquisition_failures, 0);
    }

    #[test]
    fn test_persistence_round_trip() {
        let path = std::env::temp_dir()
            .join("synheart-wear-transparency-test")
            .join("transparency.json");
        let _ = std::fs::remove_file(&path);

        let log = TransparencyLog::with_persistence(path.clone());
        log.record_consent_prompt();
        log.record_consent_grant();
        log.record_acquisition();
        log.record_readings(GroupId::Motion, 7);
        log.save().unwrap();

        let restored = TransparencyLog::with_persistence(path.clone());
        let stats = restored.stats();
        assert_eq!(stats.consent_prompts, 1);
        assert_eq!(stats.consent_grants, 1);
        assert_eq!(stats.acquisitions, 1);
        assert_eq!(stats.motion_readings, 7);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_summary_format() {
        let log = TransparencyLog::new();
        let summary = log.summary();

        assert!(summary.contains("Vital readings"));
        assert!(summary.contains("Consent prompts shown"));
        assert!(summary.contains("Privacy Guarantee"));
        assert!(summary.contains("opened only after consent"));
    }
}
