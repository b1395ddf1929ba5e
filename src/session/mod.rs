//! The signed-in session.
//!
//! [`SessionManager`] is the one place that knows the bearer token. The API
//! client asks it for the token before every request and reports back when
//! the service rejects it. [`SessionManager::invalidate`] is the only path
//! that drops credentials, so a locally detected expiry and a 401 from the
//! service end up with the same cleanup and a single notification.

mod store;

pub use store::{FileSessionStore, MemorySessionStore, SESSION_FILE, SessionStore};

#[cfg(test)]
pub use store::MockSessionStore;

use anyhow::Result;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use crate::domain::model::User;
use crate::http::{ApiError, is_token_expired};

/// Credential and user record of the signed-in account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Session {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default, rename = "isDemo")]
    pub is_demo: bool,
    #[serde(default, rename = "bannerURL")]
    pub banner_url: Option<String>,
    #[serde(default, rename = "profileURL")]
    pub profile_url: Option<String>,
}

impl Session {
    /// True when a token is present and has not expired.
    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !is_token_expired(t))
    }
}

/// Why the credentials were dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidationReason {
    /// The token's own `exp` claim has passed.
    TokenExpired,
    /// The service answered 401.
    Unauthorized,
}

impl fmt::Display for InvalidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidationReason::TokenExpired => write!(f, "token expired"),
            InvalidationReason::Unauthorized => write!(f, "rejected by server"),
        }
    }
}

pub type InvalidationCallback = Box<dyn Fn(InvalidationReason) + Send + Sync>;

pub struct SessionManager {
    state: Mutex<Session>,
    store: Box<dyn SessionStore>,
    on_invalidated: Option<InvalidationCallback>,
}

impl SessionManager {
    /// Starts from an empty session backed by `store`.
    pub fn new(store: Box<dyn SessionStore>) -> Self {
        Self {
            state: Mutex::new(Session::default()),
            store,
            on_invalidated: None,
        }
    }

    /// Starts from whatever `store` holds.
    pub fn load(store: Box<dyn SessionStore>) -> Result<Self> {
        let session = store.load()?;
        debug!(
            "Loaded session (token: {}, demo: {})",
            session.token.is_some(),
            session.is_demo
        );
        Ok(Self {
            state: Mutex::new(session),
            store,
            on_invalidated: None,
        })
    }

    /// An empty session that is never persisted.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemorySessionStore::new()))
    }

    /// Registers the callback fired when credentials are dropped.
    pub fn on_session_invalidated(
        mut self,
        callback: impl Fn(InvalidationReason) + Send + Sync + 'static,
    ) -> Self {
        self.on_invalidated = Some(Box::new(callback));
        self
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> Session {
        self.lock().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.lock().token.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.lock().user.clone()
    }

    pub fn is_demo(&self) -> bool {
        self.lock().is_demo
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock().is_authenticated()
    }

    /// Stores the credential returned by a successful login or signup.
    #[tracing::instrument(skip(self, token, user))]
    pub fn establish(&self, token: String, user: User, is_demo: bool) -> Result<()> {
        let snapshot = {
            let mut state = self.lock();
            state.token = Some(token);
            state.user = Some(user);
            state.is_demo = is_demo;
            state.clone()
        };
        info!(
            "Signed in as {}",
            snapshot.user.as_ref().map(User::display_name).unwrap_or("")
        );
        self.store.save(&snapshot)
    }

    /// Replaces the user record and the cached image URLs after a profile update.
    pub fn update_profile(
        &self,
        user: Option<User>,
        profile_url: Option<String>,
        banner_url: Option<String>,
    ) -> Result<()> {
        let snapshot = {
            let mut state = self.lock();
            if let Some(user) = user {
                state.user = Some(user);
            }
            state.profile_url = profile_url;
            state.banner_url = banner_url;
            state.clone()
        };
        self.store.save(&snapshot)
    }

    /// Fails with `TokenExpired` if the stored token has expired, dropping it first.
    pub fn ensure_fresh(&self) -> Result<(), ApiError> {
        let expired = self.lock().token.as_deref().is_some_and(is_token_expired);
        if expired {
            self.invalidate(InvalidationReason::TokenExpired);
            return Err(ApiError::token_expired());
        }
        Ok(())
    }

    /// Drops token, user and demo flag.
    ///
    /// Returns false if there was no token to drop; the callback only fires
    /// when something was actually cleared, so repeated calls are harmless.
    #[tracing::instrument(skip(self))]
    pub fn invalidate(&self, reason: InvalidationReason) -> bool {
        let snapshot = {
            let mut state = self.lock();
            if state.token.is_none() {
                return false;
            }
            state.token = None;
            state.user = None;
            state.is_demo = false;
            state.clone()
        };

        warn!("Session invalidated: {}", reason);
        if let Err(e) = self.store.save(&snapshot) {
            warn!("Failed to persist invalidated session: {:#}", e);
        }
        if let Some(callback) = &self.on_invalidated {
            callback(reason);
        }
        true
    }

    /// Forgets everything about the session, cached image URLs included.
    #[tracing::instrument(skip(self))]
    pub fn logout(&self) -> Result<()> {
        *self.lock() = Session::default();
        self.store.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::token::tests::token_expiring_in;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn user() -> User {
        User {
            id: "3".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            ..Default::default()
        }
    }

    fn signed_in(token: String) -> Session {
        Session {
            token: Some(token),
            user: Some(user()),
            is_demo: true,
            banner_url: Some("banner.png".to_string()),
            profile_url: None,
        }
    }

    #[test]
    fn test_establish_persists() {
        let mut store = MockSessionStore::new();
        store
            .expect_save()
            .withf(|s| s.token.as_deref() == Some("tok") && !s.is_demo)
            .times(1)
            .returning(|_| Ok(()));

        let manager = SessionManager::new(Box::new(store));
        manager
            .establish("tok".to_string(), user(), false)
            .unwrap();

        assert_eq!(manager.token().as_deref(), Some("tok"));
        assert_eq!(manager.user(), Some(user()));
    }

    #[test]
    fn test_ensure_fresh_with_valid_token() {
        let store = MemorySessionStore::with_session(signed_in(token_expiring_in(3600)));
        let manager = SessionManager::load(Box::new(store)).unwrap();

        assert!(manager.ensure_fresh().is_ok());
        assert!(manager.is_authenticated());
    }

    #[test]
    fn test_ensure_fresh_without_token() {
        let manager = SessionManager::in_memory();
        assert!(manager.ensure_fresh().is_ok());
        assert!(!manager.is_authenticated());
    }

    #[test]
    fn test_ensure_fresh_drops_expired_token() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);

        let mut store = MockSessionStore::new();
        let expired = signed_in(token_expiring_in(-60));
        store.expect_load().returning(move || Ok(expired.clone()));
        store
            .expect_save()
            .withf(|s| s.token.is_none() && s.user.is_none() && !s.is_demo)
            .times(1)
            .returning(|_| Ok(()));

        let manager = SessionManager::load(Box::new(store))
            .unwrap()
            .on_session_invalidated(move |reason| {
                assert_eq!(reason, InvalidationReason::TokenExpired);
                calls_clone.fetch_add(1, Ordering::SeqCst);
            });

        let err = manager.ensure_fresh().unwrap_err();
        assert_eq!(err.code(), crate::http::ErrorCode::TokenExpired);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let session = manager.snapshot();
        assert_eq!(session.token, None);
        assert_eq!(session.user, None);
        assert!(!session.is_demo);
        // Image URLs survive, only the credential is dropped.
        assert_eq!(session.banner_url.as_deref(), Some("banner.png"));
    }

    #[test]
    fn test_invalidate_is_idempotent() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        let store = MemorySessionStore::with_session(signed_in(token_expiring_in(3600)));
        let manager = SessionManager::load(Box::new(store))
            .unwrap()
            .on_session_invalidated(move |_| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
            });

        assert!(manager.invalidate(InvalidationReason::Unauthorized));
        assert!(!manager.invalidate(InvalidationReason::Unauthorized));
        assert!(!manager.invalidate(InvalidationReason::TokenExpired));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_invalidate_survives_store_failure() {
        let mut store = MockSessionStore::new();
        let session = signed_in(token_expiring_in(3600));
        store.expect_load().returning(move || Ok(session.clone()));
        store
            .expect_save()
            .returning(|_| Err(anyhow::anyhow!("disk full")));

        let manager = SessionManager::load(Box::new(store)).unwrap();
        assert!(manager.invalidate(InvalidationReason::Unauthorized));
        assert_eq!(manager.token(), None);
    }

    #[test]
    fn test_update_profile_keeps_user_when_absent() {
        let manager = SessionManager::load(Box::new(MemorySessionStore::with_session(
            signed_in(token_expiring_in(3600)),
        )))
        .unwrap();

        manager
            .update_profile(None, Some("p.png".to_string()), None)
            .unwrap();

        let session = manager.snapshot();
        assert_eq!(session.user, Some(user()));
        assert_eq!(session.profile_url.as_deref(), Some("p.png"));
        assert_eq!(session.banner_url, None);
    }

    #[test]
    fn test_logout_clears_everything() {
        let mut store = MockSessionStore::new();
        store.expect_clear().times(1).returning(|| Ok(()));
        let manager = SessionManager::new(Box::new(store));
        manager.logout().unwrap();
        assert_eq!(manager.snapshot(), Session::default());
    }

    #[test]
    fn test_session_json_keys() {
        let json = serde_json::to_value(signed_in("t".to_string())).unwrap();
        assert_eq!(json["token"], "t");
        assert_eq!(json["isDemo"], true);
        assert_eq!(json["bannerURL"], "banner.png");
        assert!(json.get("profileURL").is_some());
        assert_eq!(json["user"]["email"], "ada@example.com");
    }
}
