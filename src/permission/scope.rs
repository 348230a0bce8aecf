//! Privacy scopes and the platform privacy authority they are checked against.

use crate::sensor::types::GroupId;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Privilege identifier gating the vital group.
pub const VITAL_PRIVILEGE: &str = "sensor-vital";

/// Privilege identifier gating the motion and ambient groups.
pub const STORAGE_PRIVILEGE: &str = "sensor-storage";

/// A consent category.
///
/// `Storage` covers both the motion and the ambient group with one grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrivacyScope {
    Vital,
    Storage,
}

impl PrivacyScope {
    pub const ALL: [PrivacyScope; 2] = [PrivacyScope::Vital, PrivacyScope::Storage];

    /// Groups gated by this scope, in acquisition order.
    pub fn groups(self) -> &'static [GroupId] {
        match self {
            PrivacyScope::Vital => &[GroupId::Vital],
            PrivacyScope::Storage => &[GroupId::Motion, GroupId::Ambient],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PrivacyScope::Vital => "vital",
            PrivacyScope::Storage => "storage",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            PrivacyScope::Vital => 0,
            PrivacyScope::Storage => 1,
        }
    }
}

impl fmt::Display for PrivacyScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl GroupId {
    /// The scope whose consent gates this group.
    pub fn scope(self) -> PrivacyScope {
        match self {
            GroupId::Vital => PrivacyScope::Vital,
            GroupId::Motion | GroupId::Ambient => PrivacyScope::Storage,
        }
    }
}

/// Current consent for a privilege, as the platform reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConsentState {
    Allowed,
    Denied,
    /// The user has to be asked.
    Undetermined,
}

/// Answer delivered by a consent prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConsentOutcome {
    AllowedForever,
    DeniedForever,
    DeniedOnce,
    /// The consent flow itself failed; distinct from an explicit deny.
    Error,
}

impl ConsentOutcome {
    pub fn is_allowed(self) -> bool {
        matches!(self, ConsentOutcome::AllowedForever)
    }
}

/// One-shot consent callback. Invoked on a thread chosen by the platform.
pub type ConsentCallback = Box<dyn FnOnce(ConsentOutcome) + Send + 'static>;

/// Errors returned by the platform privacy authority.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorityError {
    /// A prompt for this privilege is already showing.
    #[error("a consent request is already in progress")]
    AlreadyInProgress,
    #[error("unknown privilege {0:?}")]
    UnknownPrivilege(String),
    #[error("privacy service unavailable: {0}")]
    Unavailable(String),
}

/// The platform component that owns consent decisions.
pub trait PrivacyAuthority: Send + Sync {
    /// Synchronously read the current consent for `privilege`.
    fn check(&self, privilege: &str) -> Result<ConsentState, AuthorityError>;

    /// Show a consent prompt. Must return without waiting for the user; the
    /// answer is delivered by invoking `on_result` exactly once, after this
    /// call has returned.
    fn request(&self, privilege: &str, on_result: ConsentCallback) -> Result<(), AuthorityError>;
}
