//! In-process identity provider for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use zara_core::auth::{
    Identity, IdentityProvider, Metadata, Session, SessionEvent, SessionEventKind,
};
use zara_core::error::AuthError;

struct Account {
    password: String,
    identity: Identity,
}

#[derive(Default)]
struct Inner {
    accounts: HashMap<String, Account>,
    current: Option<Session>,
    sequence: u64,
    subscribers: Vec<mpsc::UnboundedSender<SessionEvent>>,
    fail_updates: bool,
    fail_sign_out: bool,
}

impl Inner {
    fn emit(&mut self, kind: SessionEventKind) {
        self.sequence += 1;
        let event = SessionEvent::new(self.sequence, kind, self.current.clone());
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
}

/// Accounts live in memory; every session change is pushed to all
/// subscribers before the triggering call returns.
#[derive(Default)]
pub struct MockIdentityProvider {
    inner: Mutex<Inner>,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(self, id: &str, email: &str, password: &str) -> Self {
        self.inner.lock().unwrap().accounts.insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                identity: Identity::new(id, email),
            },
        );
        self
    }

    /// Replaces an account's stored metadata, as another device would.
    pub fn set_metadata(&self, email: &str, metadata: Metadata) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(account) = inner.accounts.get_mut(email) {
            account.identity.metadata = metadata;
        }
    }

    pub fn metadata(&self, email: &str) -> Metadata {
        self.inner
            .lock()
            .unwrap()
            .accounts
            .get(email)
            .map(|account| account.identity.metadata.clone())
            .unwrap_or_default()
    }

    pub fn set_fail_updates(&self, fail: bool) {
        self.inner.lock().unwrap().fail_updates = fail;
    }

    pub fn set_fail_sign_out(&self, fail: bool) {
        self.inner.lock().unwrap().fail_sign_out = fail;
    }

    /// Server-side invalidation of the current session.
    pub fn revoke_session(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.current = None;
        inner.emit(SessionEventKind::SignedOut);
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let mut inner = self.inner.lock().unwrap();
        let identity = match inner.accounts.get(email) {
            Some(account) if account.password == password => account.identity.clone(),
            _ => return Err(AuthError::InvalidCredentials),
        };
        let session = Session::new(identity, format!("token-{}", inner.sequence + 1));
        inner.current = Some(session.clone());
        inner.emit(SessionEventKind::SignedIn);
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: Metadata,
    ) -> Result<(), AuthError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.accounts.contains_key(email) {
            return Err(AuthError::SignUpRejected("User already registered".into()));
        }
        if password.len() < 6 {
            return Err(AuthError::SignUpRejected(
                "Password should be at least 6 characters".into(),
            ));
        }
        let id = format!("user-{}", inner.accounts.len() + 1);
        inner.accounts.insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                identity: Identity::new(id, email).with_metadata(metadata),
            },
        );
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_sign_out {
            return Err(AuthError::Network("connection reset".into()));
        }
        inner.current = None;
        inner.emit(SessionEventKind::SignedOut);
        Ok(())
    }

    async fn update_user(&self, patch: Metadata) -> Result<Identity, AuthError> {
        tokio::task::yield_now().await;
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_updates {
            return Err(AuthError::Network("update rejected".into()));
        }
        let email = match &inner.current {
            Some(session) => session.identity.email.clone(),
            None => return Err(AuthError::NotAuthenticated),
        };
        let Some(account) = inner.accounts.get_mut(&email) else {
            return Err(AuthError::NotAuthenticated);
        };
        account.identity.metadata.extend(patch);
        let identity = account.identity.clone();

        if let Some(session) = inner.current.as_mut() {
            session.identity = identity.clone();
        }
        inner.emit(SessionEventKind::UserUpdated);
        Ok(identity)
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<SessionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock().unwrap();
        inner.sequence += 1;
        let initial = SessionEvent::new(
            inner.sequence,
            SessionEventKind::InitialSession,
            inner.current.clone(),
        );
        if tx.send(initial).is_ok() {
            inner.subscribers.push(tx);
        }
        rx
    }
}
