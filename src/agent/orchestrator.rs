//! Acquisition orchestrator.
//!
//! Runs on every activation and decides, per group, whether its sensors may be
//! acquired. Consent answers arrive on platform threads and resume the same
//! acquisition routine the foreground path uses.
//!
//! All mutable state lives in one [`Core`] behind a mutex. The foreground path
//! and consent callbacks both lock it, so a group is never acquired twice
//! concurrently. Consent requests are issued only after the lock is released.

use crate::agent::subsystem::SensorSubsystem;
use crate::permission::{ConsentOutcome, ConsentState, PermissionGate, PrivacyScope, RequestStatus};
use crate::sensor::{GroupId, ListenerState, SensorReading, UsabilityResult};
use crate::transparency::SharedTransparencyLog;
use crossbeam_channel::Receiver;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

struct Core {
    subsystem: SensorSubsystem,
    /// Probe result per group; capabilities do not change while running
    supported: [Option<bool>; 3],
    /// Set once a group is fully started; never cleared
    launched: [bool; 3],
    /// Whether the group's scope was granted when it was last acquired
    allowed: [bool; 3],
    finalized: bool,
}

impl Core {
    /// Groups of `scope` still waiting for acquisition. Launched groups are
    /// skipped; unsupported groups are dropped. Each group is probed once.
    fn pending_groups(&mut self, scope: PrivacyScope) -> Vec<GroupId> {
        let mut pending = Vec::new();
        for &group in scope.groups() {
            if self.launched[group.index()] {
                continue;
            }
            let supported = match self.supported[group.index()] {
                Some(supported) => {
                    if !supported {
                        tracing::debug!(%group, "group not supported, skipped");
                    }
                    supported
                }
                None => {
                    let supported = self.subsystem.probe().group_supported(group);
                    self.supported[group.index()] = Some(supported);
                    if !supported {
                        tracing::warn!(%group, "group not supported on this device");
                    }
                    supported
                }
            };
            if supported {
                pending.push(group);
            }
        }
        pending
    }

    /// Acquire each group of an allowed scope: open, create, start.
    fn acquire_scope(&mut self, scope: PrivacyScope, groups: &[GroupId], log: &SharedTransparencyLog) {
        for &group in groups {
            if self.launched[group.index()] {
                continue;
            }
            self.allowed[group.index()] = true;
            match self.subsystem.acquire(group) {
                Ok(()) => {
                    self.launched[group.index()] = true;
                    log.record_acquisition();
                    tracing::info!(%group, %scope, "sensor group acquired");
                }
                Err(e) => {
                    log.record_acquisition_failure();
                    tracing::error!(%group, %scope, error = %e, "sensor group unusable");
                }
            }
        }
    }

    /// Mark the unlaunched groups of a refused scope as not allowed.
    /// Launched groups keep running and stay usable.
    fn refuse_scope(&mut self, scope: PrivacyScope) {
        for &group in scope.groups() {
            if !self.launched[group.index()] {
                self.allowed[group.index()] = false;
            }
        }
    }

    fn is_usable(&self, group: GroupId) -> bool {
        self.supported[group.index()] == Some(true)
            && self.subsystem.listener(group).state().is_started()
            && self.allowed[group.index()]
    }

    fn usability(&self) -> UsabilityResult {
        let mut result = UsabilityResult::default();
        if self.finalized {
            return result;
        }
        for group in GroupId::ALL {
            result.set(group, self.is_usable(group));
        }
        result
    }
}

/// Drives permission-gated acquisition of the three sensor groups.
pub struct AcquisitionOrchestrator {
    core: Arc<Mutex<Core>>,
    gate: PermissionGate,
    log: SharedTransparencyLog,
}

impl AcquisitionOrchestrator {
    pub fn new(subsystem: SensorSubsystem, gate: PermissionGate, log: SharedTransparencyLog) -> Self {
        Self {
            core: Arc::new(Mutex::new(Core {
                subsystem,
                supported: [None; 3],
                launched: [false; 3],
                allowed: [false; 3],
                finalized: false,
            })),
            gate,
            log,
        }
    }

    /// Bring every permitted, supported group up. Safe to call repeatedly.
    ///
    /// Groups whose consent is undetermined trigger a prompt and stay
    /// unusable until the answer arrives; [`usability`](Self::usability)
    /// reflects acquisitions made by that answer.
    pub fn ensure_sensors_active(&self) -> UsabilityResult {
        let mut prompts = Vec::new();
        let result = {
            let mut core = lock(&self.core);
            if core.finalized {
                tracing::warn!("activation after terminate ignored");
                return core.usability();
            }

            for scope in PrivacyScope::ALL {
                let groups = core.pending_groups(scope);
                if groups.is_empty() {
                    continue;
                }
                match self.gate.check(scope) {
                    Ok(ConsentState::Allowed) => core.acquire_scope(scope, &groups, &self.log),
                    Ok(ConsentState::Denied) => {
                        core.refuse_scope(scope);
                        tracing::info!(%scope, "consent denied, sensors stay closed");
                    }
                    Ok(ConsentState::Undetermined) if self.gate.was_declined(scope) => {
                        core.refuse_scope(scope);
                        tracing::info!(%scope, "consent declined earlier in this session, not asking again");
                    }
                    Ok(ConsentState::Undetermined) => prompts.push(scope),
                    Err(e) => tracing::error!(error = %e, "consent check failed"),
                }
            }
            core.usability()
        };

        for scope in prompts {
            self.request_consent(scope);
        }
        result
    }

    fn request_consent(&self, scope: PrivacyScope) {
        let core = Arc::downgrade(&self.core);
        let log = self.log.clone();
        let status = self
            .gate
            .request(scope, move |outcome| on_consent(&core, scope, outcome, &log));

        match status {
            Ok(RequestStatus::Requested) => self.log.record_consent_prompt(),
            Ok(RequestStatus::AlreadyPending) => {
                tracing::debug!(%scope, "consent prompt still showing")
            }
            Err(e) => tracing::error!(error = %e, "consent request failed"),
        }
    }

    /// Current usability, including acquisitions made by consent callbacks.
    pub fn usability(&self) -> UsabilityResult {
        lock(&self.core).usability()
    }

    pub fn listener_state(&self, group: GroupId) -> ListenerState {
        lock(&self.core).subsystem.listener(group).state()
    }

    pub fn is_launched(&self, group: GroupId) -> bool {
        lock(&self.core).launched[group.index()]
    }

    /// Receiver for the group's readings.
    pub fn readings(&self, group: GroupId) -> Receiver<SensorReading> {
        lock(&self.core).subsystem.listener(group).receiver().clone()
    }

    pub fn gate(&self) -> &PermissionGate {
        &self.gate
    }

    /// Tear the subsystem down and ignore every later callback.
    ///
    /// Returns false if already finalized.
    pub fn finalize(&self) -> bool {
        let mut core = lock(&self.core);
        if core.finalized {
            return false;
        }
        core.subsystem.teardown();
        core.finalized = true;
        true
    }

    pub fn is_finalized(&self) -> bool {
        lock(&self.core).finalized
    }
}

/// Consent answer handler. Runs on the platform's thread.
fn on_consent(
    core: &Weak<Mutex<Core>>,
    scope: PrivacyScope,
    outcome: ConsentOutcome,
    log: &SharedTransparencyLog,
) {
    let Some(core) = core.upgrade() else {
        tracing::debug!(%scope, ?outcome, "consent answered after agent was dropped");
        return;
    };
    let mut core = lock(&core);
    if core.finalized {
        tracing::debug!(%scope, ?outcome, "consent answered after terminate, ignored");
        return;
    }

    if outcome.is_allowed() {
        log.record_consent_grant();
        tracing::info!(%scope, "consent granted");
        let groups = core.pending_groups(scope);
        core.acquire_scope(scope, &groups, log);
    } else {
        log.record_consent_decline();
        core.refuse_scope(scope);
        tracing::info!(%scope, ?outcome, "consent not granted, sensors stay closed");
    }
}

fn lock(core: &Mutex<Core>) -> MutexGuard<'_, Core> {
    core.lock().unwrap_or_else(|e| e.into_inner())
}
