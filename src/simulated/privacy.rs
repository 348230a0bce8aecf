//! Simulated platform privacy authority.
//!
//! Holds the consent record for the two privileges and at most one pending
//! prompt per privilege. Prompts are answered either by the test driving the
//! simulation ([`PromptMode::Manual`]) or by a background thread after the
//! profile's delay ([`PromptMode::Auto`]).

use crate::permission::gate::ScopePrivileges;
use crate::permission::scope::{
    AuthorityError, ConsentCallback, ConsentOutcome, ConsentState, PrivacyAuthority, PrivacyScope,
};
use crate::simulated::profile::{DeviceProfile, ScopeValues};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

/// How prompts get answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMode {
    /// Prompts stay open until [`SimulatedPrivacy::respond`] is called.
    Manual,
    /// Prompts are answered with the profile's answer after `delay`.
    Auto { delay: Duration },
}

impl PromptMode {
    pub fn from_profile(profile: &DeviceProfile) -> Self {
        PromptMode::Auto {
            delay: Duration::from_millis(profile.prompt.delay_ms),
        }
    }
}

struct PrivacyState {
    consent: ScopeValues<ConsentState>,
    pending: [Option<ConsentCallback>; 2],
    requests: [u64; 2],
    checks: [u64; 2],
}

/// A privacy authority backed by a [`DeviceProfile`].
pub struct SimulatedPrivacy {
    privileges: ScopePrivileges,
    answers: ScopeValues<ConsentOutcome>,
    offline: bool,
    mode: PromptMode,
    state: Arc<Mutex<PrivacyState>>,
}

impl SimulatedPrivacy {
    pub fn new(profile: &DeviceProfile, mode: PromptMode) -> Self {
        Self::with_privileges(profile, mode, ScopePrivileges::default())
    }

    pub fn with_privileges(
        profile: &DeviceProfile,
        mode: PromptMode,
        privileges: ScopePrivileges,
    ) -> Self {
        Self {
            privileges,
            answers: profile.prompt.answers,
            offline: profile.authority_offline,
            mode,
            state: Arc::new(Mutex::new(PrivacyState {
                consent: profile.consent,
                pending: [None, None],
                requests: [0; 2],
                checks: [0; 2],
            })),
        }
    }

    /// Answer the pending prompt for `scope`.
    ///
    /// Returns false when no prompt was pending.
    pub fn respond(&self, scope: PrivacyScope, outcome: ConsentOutcome) -> bool {
        respond(&self.state, scope, outcome)
    }

    /// Change the consent record outside of a prompt, as the user does from
    /// the system settings.
    pub fn set_consent(&self, scope: PrivacyScope, consent: ConsentState) {
        lock(&self.state).consent.set(scope, consent);
    }

    pub fn consent(&self, scope: PrivacyScope) -> ConsentState {
        lock(&self.state).consent.get(scope)
    }

    pub fn has_pending(&self, scope: PrivacyScope) -> bool {
        lock(&self.state).pending[scope.index()].is_some()
    }

    /// Number of `request` calls received for `scope`, including refused ones.
    pub fn request_count(&self, scope: PrivacyScope) -> u64 {
        lock(&self.state).requests[scope.index()]
    }

    pub fn check_count(&self, scope: PrivacyScope) -> u64 {
        lock(&self.state).checks[scope.index()]
    }

    fn scope_for(&self, privilege: &str) -> Result<PrivacyScope, AuthorityError> {
        PrivacyScope::ALL
            .into_iter()
            .find(|s| self.privileges.privilege(*s) == privilege)
            .ok_or_else(|| AuthorityError::UnknownPrivilege(privilege.to_string()))
    }

    fn ensure_online(&self) -> Result<(), AuthorityError> {
        if self.offline {
            return Err(AuthorityError::Unavailable(
                "privacy service not running".to_string(),
            ));
        }
        Ok(())
    }
}

impl PrivacyAuthority for SimulatedPrivacy {
    fn check(&self, privilege: &str) -> Result<ConsentState, AuthorityError> {
        self.ensure_online()?;
        let scope = self.scope_for(privilege)?;
        let mut state = lock(&self.state);
        state.checks[scope.index()] += 1;
        Ok(state.consent.get(scope))
    }

    fn request(&self, privilege: &str, on_result: ConsentCallback) -> Result<(), AuthorityError> {
        self.ensure_online()?;
        let scope = self.scope_for(privilege)?;
        {
            let mut state = lock(&self.state);
            state.requests[scope.index()] += 1;
            let slot = &mut state.pending[scope.index()];
            if slot.is_some() {
                return Err(AuthorityError::AlreadyInProgress);
            }
            *slot = Some(on_result);
        }

        if let PromptMode::Auto { delay } = self.mode {
            let state = Arc::clone(&self.state);
            let answer = self.answers.get(scope);
            thread::spawn(move || {
                thread::sleep(delay);
                respond(&state, scope, answer);
            });
        }
        Ok(())
    }
}

fn respond(state: &Mutex<PrivacyState>, scope: PrivacyScope, outcome: ConsentOutcome) -> bool {
    let callback = {
        let mut state = lock(state);
        let callback = state.pending[scope.index()].take();
        if callback.is_some() {
            match outcome {
                ConsentOutcome::AllowedForever => state.consent.set(scope, ConsentState::Allowed),
                ConsentOutcome::DeniedForever => state.consent.set(scope, ConsentState::Denied),
                // the user will be asked again next time
                ConsentOutcome::DeniedOnce | ConsentOutcome::Error => {}
            }
        }
        callback
    };

    match callback {
        Some(callback) => {
            callback(outcome);
            true
        }
        None => false,
    }
}

fn lock(state: &Mutex<PrivacyState>) -> MutexGuard<'_, PrivacyState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}
