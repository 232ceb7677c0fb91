//! Login, sign-up and logout on top of [`AuthSessionMachine`].

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;
use tracing::{info, warn};

use super::machine::AuthSessionMachine;
use super::model::{
    AccessDecision, AuthState, EventOutcome, Identity, Metadata, Role, Session, SessionEvent,
    META_USERNAME,
};
use super::provider::IdentityProvider;
use crate::clock::Clock;
use crate::error::AuthError;

/// Auth operations exposed to the facade.
///
/// Session state changes arrive exclusively through
/// [`apply_session_event`](Self::apply_session_event); `login` only asks the
/// provider and returns its answer.
pub struct AuthService {
    provider: Arc<dyn IdentityProvider>,
    clock: Arc<dyn Clock>,
    machine: RwLock<AuthSessionMachine>,
}

impl AuthService {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        clock: Arc<dyn Clock>,
        machine: AuthSessionMachine,
    ) -> Self {
        Self {
            provider,
            clock,
            machine: RwLock::new(machine),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, AuthSessionMachine> {
        self.machine.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, AuthSessionMachine> {
        self.machine.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        validate_credentials(email, password)?;
        let session = self
            .provider
            .sign_in_with_password(email.trim(), password)
            .await?;
        info!(user_id = %session.identity.id, "Signed in");
        Ok(session)
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> Result<(), AuthError> {
        validate_credentials(email, password)?;
        let username = validate_username(username)?;

        let mut metadata = Metadata::new();
        metadata.insert(META_USERNAME.to_string(), Value::String(username));
        self.provider
            .sign_up(email.trim(), password, metadata)
            .await?;
        info!(email = %email.trim(), "Account created");
        Ok(())
    }

    /// Signs out remotely, then always clears local state. The remote error,
    /// if any, is returned after the cleanup.
    pub async fn logout(&self) -> Result<(), AuthError> {
        let remote = self.provider.sign_out().await;
        if let Err(err) = &remote {
            warn!(error = %err, "Remote sign-out failed, clearing local state anyway");
        }
        self.write().clear_local();
        remote
    }

    pub async fn update_username(&self, username: &str) -> Result<Identity, AuthError> {
        let username = validate_username(username)?;
        self.require_identity()?;

        let mut patch = Metadata::new();
        patch.insert(META_USERNAME.to_string(), Value::String(username));
        let identity = self.provider.update_user(patch).await?;
        self.write().replace_identity(identity.clone());
        Ok(identity)
    }

    pub fn apply_session_event(&self, event: SessionEvent) -> EventOutcome {
        let now = self.clock.now();
        self.write().apply_event(event, now)
    }

    pub fn mark_stream_closed(&self) {
        self.write().mark_stream_closed();
    }

    pub fn current_role(&self) -> Role {
        self.read().current_role()
    }

    pub fn state(&self) -> AuthState {
        self.read().state()
    }

    pub fn is_loading(&self) -> bool {
        self.read().is_loading()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.read().identity().cloned()
    }

    pub fn session(&self) -> Option<Session> {
        self.read().session().cloned()
    }

    pub fn request_privileged_access(&self) -> AccessDecision {
        self.write().request_privileged_access()
    }

    pub fn submit_admin_challenge(&self, password: &str) -> Result<(), AuthError> {
        self.write().submit_challenge(password)
    }

    pub fn cancel_admin_challenge(&self) {
        self.write().cancel_challenge();
    }

    pub fn replace_identity(&self, identity: Identity) -> bool {
        self.write().replace_identity(identity)
    }

    pub fn require_identity(&self) -> Result<Identity, AuthError> {
        self.identity().ok_or(AuthError::NotAuthenticated)
    }

    pub fn is_admin(&self) -> bool {
        self.current_role() == Role::Admin
    }
}

fn validate_credentials(email: &str, password: &str) -> Result<(), AuthError> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AuthError::InvalidInput(format!(
            "'{}' is not a valid email address",
            email
        )));
    }
    if password.is_empty() {
        return Err(AuthError::InvalidInput("password must not be empty".into()));
    }
    Ok(())
}

fn validate_username(username: &str) -> Result<String, AuthError> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        return Err(AuthError::InvalidInput("username must not be empty".into()));
    }
    Ok(trimmed.to_string())
}
