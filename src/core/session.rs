//! Credential session cache
//!
//! Validating a credential against the identity service is a network
//! round-trip; the session cache performs it at most once per distinct
//! credential for the lifetime of the process. Failed validations are
//! cached too, so a bad credential does not cause a validation storm.
//! Sessions live only in memory and are never written to disk.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::core::remote::CredentialValidator;
use crate::error::CatalogError;

/// A user credential, used only as a lookup key into the session cache
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credential {
    /// Account identity (user name or email)
    pub identity: String,
    /// Account secret
    pub secret: String,
}

impl Credential {
    pub fn new(identity: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            secret: secret.into(),
        }
    }
}

// The secret must never reach logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("identity", &self.identity)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// A cached record that a credential has been checked
#[derive(Debug)]
pub struct UserSession {
    /// The credential this session was created for
    pub credential: Credential,
    /// Whether the identity service accepted the credential
    pub validated: bool,
}

/// In-memory registry of validated credential sessions
///
/// Safe for concurrent use from parallel resolutions. Two simultaneous
/// `get_or_validate` calls for the same new credential may both validate;
/// the race is benign (validation is idempotent) and the last writer wins.
#[derive(Debug, Default)]
pub struct SessionCache {
    sessions: RwLock<HashMap<Credential, Arc<UserSession>>>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the existing session for `credential`, or validate it once
    /// and register a new session
    ///
    /// A validation failure still produces (and caches) a session, with
    /// `validated = false`; callers must check the flag before using the
    /// session for downloads.
    pub async fn get_or_validate(
        &self,
        validator: &dyn CredentialValidator,
        credential: &Credential,
    ) -> Result<Arc<UserSession>, CatalogError> {
        if let Some(session) = self.read().get(credential).cloned() {
            debug!("Reusing session for '{}'", credential.identity);
            return Ok(session);
        }

        // Validate outside the lock; network calls must not block readers.
        let validated = validator.validate(credential).await?;
        debug!(
            "Validated credential for '{}': {validated}",
            credential.identity
        );

        let session = Arc::new(UserSession {
            credential: credential.clone(),
            validated,
        });
        self.write().insert(credential.clone(), session.clone());
        Ok(session)
    }

    /// Remove `session` from the registry
    ///
    /// Compare-and-remove: the registered session is evicted only if it is
    /// the same object as the one supplied, so a stale caller cannot evict
    /// a session that has since been replaced. Returns whether a session
    /// was removed.
    pub fn remove(&self, session: &Arc<UserSession>) -> bool {
        let mut guard = self.write();
        match guard.get(&session.credential) {
            Some(current) if Arc::ptr_eq(current, session) => {
                guard.remove(&session.credential);
                true
            }
            _ => false,
        }
    }

    /// Number of registered sessions
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<Credential, Arc<UserSession>>> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<Credential, Arc<UserSession>>> {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
