//! Permission gate: consent checks and asynchronous consent requests per scope.
//!
//! The gate keeps a small book per scope: whether a prompt is outstanding and
//! what the last prompt answered. A scope whose prompt answered anything other
//! than "allow" is declined for the rest of the process run and is never
//! prompted again.

use crate::permission::scope::{
    AuthorityError, ConsentOutcome, ConsentState, PrivacyAuthority, PrivacyScope,
    STORAGE_PRIVILEGE, VITAL_PRIVILEGE,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Privilege identifiers used for each scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopePrivileges {
    pub vital: String,
    pub storage: String,
}

impl Default for ScopePrivileges {
    fn default() -> Self {
        Self {
            vital: VITAL_PRIVILEGE.to_string(),
            storage: STORAGE_PRIVILEGE.to_string(),
        }
    }
}

impl ScopePrivileges {
    pub fn privilege(&self, scope: PrivacyScope) -> &str {
        match scope {
            PrivacyScope::Vital => &self.vital,
            PrivacyScope::Storage => &self.storage,
        }
    }
}

/// The consent subsystem could not be reached.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("consent subsystem unreachable for {scope} scope: {source}")]
pub struct GateError {
    pub scope: PrivacyScope,
    #[source]
    pub source: AuthorityError,
}

/// What happened to a consent request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    /// A new prompt was issued.
    Requested,
    /// A prompt for this scope was already showing; its callback is still due.
    AlreadyPending,
}

#[derive(Debug, Default, Clone, Copy)]
struct ScopeBook {
    pending: bool,
    resolution: Option<ConsentOutcome>,
}

/// Checks and requests consent for the two privacy scopes.
#[derive(Clone)]
pub struct PermissionGate {
    authority: Arc<dyn PrivacyAuthority>,
    privileges: ScopePrivileges,
    books: Arc<Mutex<[ScopeBook; 2]>>,
}

impl PermissionGate {
    pub fn new(authority: Arc<dyn PrivacyAuthority>, privileges: ScopePrivileges) -> Self {
        Self {
            authority,
            privileges,
            books: Arc::new(Mutex::new([ScopeBook::default(); 2])),
        }
    }

    pub fn privileges(&self) -> &ScopePrivileges {
        &self.privileges
    }

    /// Synchronously read the current consent for `scope`.
    pub fn check(&self, scope: PrivacyScope) -> Result<ConsentState, GateError> {
        self.authority
            .check(self.privileges.privilege(scope))
            .map_err(|source| GateError { scope, source })
    }

    /// Ask the user for consent. Returns immediately.
    ///
    /// `on_result` runs once, on the platform's thread, when the user answers.
    /// If a prompt is already showing, the platform keeps the earlier callback
    /// and `on_result` is dropped without being called.
    pub fn request<F>(&self, scope: PrivacyScope, on_result: F) -> Result<RequestStatus, GateError>
    where
        F: FnOnce(ConsentOutcome) + Send + 'static,
    {
        let was_pending = {
            let mut books = lock(&self.books);
            let book = &mut books[scope.index()];
            std::mem::replace(&mut book.pending, true)
        };

        let books = Arc::clone(&self.books);
        let callback = Box::new(move |outcome: ConsentOutcome| {
            {
                let mut books = lock(&books);
                let book = &mut books[scope.index()];
                book.pending = false;
                book.resolution = Some(outcome);
            }
            on_result(outcome);
        });

        match self
            .authority
            .request(self.privileges.privilege(scope), callback)
        {
            Ok(()) => {
                tracing::info!(%scope, "consent requested");
                Ok(RequestStatus::Requested)
            }
            Err(AuthorityError::AlreadyInProgress) => {
                tracing::debug!(%scope, "consent request already in progress");
                Ok(RequestStatus::AlreadyPending)
            }
            Err(source) => {
                lock(&self.books)[scope.index()].pending = was_pending;
                Err(GateError { scope, source })
            }
        }
    }

    /// Whether a prompt for `scope` is outstanding.
    pub fn is_pending(&self, scope: PrivacyScope) -> bool {
        lock(&self.books)[scope.index()].pending
    }

    /// The answer delivered for `scope` in this process run, if any.
    pub fn resolution(&self, scope: PrivacyScope) -> Option<ConsentOutcome> {
        lock(&self.books)[scope.index()].resolution
    }

    /// True when a prompt for `scope` answered with anything but "allow".
    pub fn was_declined(&self, scope: PrivacyScope) -> bool {
        matches!(self.resolution(scope), Some(outcome) if !outcome.is_allowed())
    }
}

/// Lock the book table, recovering from a poisoned lock. The books are plain
/// flags, so a panic elsewhere cannot leave them half-updated.
fn lock(books: &Mutex<[ScopeBook; 2]>) -> MutexGuard<'_, [ScopeBook; 2]> {
    books.lock().unwrap_or_else(|e| e.into_inner())
}
