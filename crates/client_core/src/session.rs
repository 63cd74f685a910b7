use std::sync::Arc;

use shared::{
    domain::{Role, UserId},
    error::{ApiError, ErrorCode},
    protocol::{LoginRequest, NewUser, User, UserUpdate},
};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::{
    backend::InventoryBackend,
    credential_store::{CredentialStore, StoredCredential},
};

/// Who is using the client right now.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Session {
    /// Startup state until the stored credential has been checked.
    #[default]
    Resolving,
    Authenticated(User),
    Anonymous,
}

impl Session {
    pub fn is_resolving(&self) -> bool {
        matches!(self, Self::Resolving)
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn role(&self) -> Option<&Role> {
        self.user().and_then(|user| user.role.as_ref())
    }
}

/// Owns the session. Views read snapshots or subscribe; only this type writes.
pub struct SessionManager {
    backend: Arc<dyn InventoryBackend>,
    store: Arc<dyn CredentialStore>,
    state: watch::Sender<Session>,
}

impl SessionManager {
    pub fn new(backend: Arc<dyn InventoryBackend>, store: Arc<dyn CredentialStore>) -> Self {
        let (state, _) = watch::channel(Session::Resolving);
        Self {
            backend,
            store,
            state,
        }
    }

    pub fn backend(&self) -> &Arc<dyn InventoryBackend> {
        &self.backend
    }

    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().user().cloned()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Resolves once the session has left `Resolving`.
    pub async fn wait_until_resolved(&self) -> Session {
        let mut rx = self.state.subscribe();
        let resolved = rx
            .wait_for(|session| !session.is_resolving())
            .await
            .map(|session| session.clone());
        match resolved {
            Ok(session) => session,
            Err(_) => self.snapshot(),
        }
    }

    /// Startup transition: revalidates the stored credential against the
    /// backend. Every failure path ends `Anonymous` with the snapshot cleared.
    pub async fn resolve(&self) -> Session {
        let stored = match self.store.load() {
            Ok(stored) => stored,
            Err(err) => {
                warn!(error = %err, "discarding unreadable credential snapshot");
                None
            }
        };

        let Some(stored) = stored else {
            info!("no stored credential; session is anonymous");
            return self.reset();
        };

        self.backend.set_token(stored.token.clone());
        match self.backend.user_by_email(&stored.user.email).await {
            Ok(user) => {
                info!(user_id = %user.id, "restored session from stored credential");
                self.authenticate(user)
            }
            Err(err) => {
                warn!(
                    email = %stored.user.email,
                    code = ?err.code,
                    "stored credential rejected; clearing it"
                );
                self.reset()
            }
        }
    }

    /// Returns `None` for any rejected login; the caller shows a generic
    /// invalid-credentials message. The password never leaves this call.
    pub async fn login(&self, email: &str, password: &str) -> Option<User> {
        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let response = match self.backend.login(&request).await {
            Ok(response) => response,
            Err(err) => {
                info!(email = %request.email, code = ?err.code, "login rejected");
                return None;
            }
        };

        let previous_token = self.backend.token();
        self.backend.set_token(response.token.clone());
        let user = self.fetch_user_details(&response.email).await;
        if user.is_none() {
            self.backend.set_token(previous_token);
        }
        user
    }

    /// Creates an account. Does not authenticate.
    pub async fn signup(&self, new_user: &NewUser) -> Option<User> {
        match self.backend.signup(new_user).await {
            Ok(user) => {
                info!(user_id = %user.id, "account created");
                Some(user)
            }
            Err(err) => {
                warn!(email = %new_user.email, code = ?err.code, "signup failed");
                None
            }
        }
    }

    /// Re-reads the profile from the backend. On failure the current session
    /// is left as it was.
    pub async fn fetch_user_details(&self, email: &str) -> Option<User> {
        match self.backend.user_by_email(email).await {
            Ok(user) => {
                self.authenticate(user.clone());
                Some(user)
            }
            Err(err) => {
                warn!(%email, code = ?err.code, "fetching user details failed");
                None
            }
        }
    }

    pub async fn update_profile(&self, id: UserId, update: &UserUpdate) -> Result<User, ApiError> {
        if self.current_user().is_some_and(|user| user.id != id) {
            return Err(ApiError::new(
                ErrorCode::Unauthorized,
                "You can only update your own profile.",
            ));
        }
        self.backend.update_user(id, update).await?;
        let user = self.backend.user_by_email(&update.email).await?;
        self.authenticate(user.clone());
        info!(user_id = %user.id, "profile updated");
        Ok(user)
    }

    pub fn logout(&self) {
        if let Some(user) = self.current_user() {
            info!(user_id = %user.id, "logging out");
        }
        self.reset();
    }

    fn authenticate(&self, user: User) -> Session {
        let credential = StoredCredential {
            user: user.clone(),
            token: self.backend.token(),
        };
        if let Err(err) = self.store.save(&credential) {
            warn!(error = %err, "failed to persist credential snapshot");
        }
        let session = Session::Authenticated(user);
        self.state.send_replace(session.clone());
        session
    }

    fn reset(&self) -> Session {
        self.backend.set_token(None);
        if let Err(err) = self.store.clear() {
            warn!(error = %err, "failed to clear credential snapshot");
        }
        self.state.send_replace(Session::Anonymous);
        Session::Anonymous
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
