//! Identity and session models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Free-form user metadata held by the identity provider.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Metadata key holding the user's display name.
pub const META_USERNAME: &str = "username";
/// Metadata key holding the remaining generation credits for the day.
pub const META_GENERATION_COUNT: &str = "generation_count";
/// Metadata key holding the `YYYY-MM-DD` date of the last credit reset.
pub const META_LAST_GENERATION_DATE: &str = "last_generation_date";

/// A remotely issued user identity.
///
/// This is a cached copy and may be stale relative to the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Identity {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn username(&self) -> Option<&str> {
        self.metadata
            .get(META_USERNAME)
            .and_then(|value| value.as_str())
            .filter(|name| !name.trim().is_empty())
    }

    /// Username if set, otherwise the local part of the email.
    pub fn display_name(&self) -> String {
        match self.username() {
            Some(name) => name.to_string(),
            None => self
                .email
                .split('@')
                .next()
                .unwrap_or_default()
                .to_string(),
        }
    }
}

/// An authenticated session with the identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub identity: Identity,
    pub access_token: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(identity: Identity, access_token: impl Into<String>) -> Self {
        Self {
            identity,
            access_token: access_token.into(),
            expires_at: None,
        }
    }

    pub fn expiring_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

/// Kind of session change pushed by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEventKind {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

/// A session change notification.
///
/// `sequence` increases monotonically per provider subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    pub sequence: u64,
    pub kind: SessionEventKind,
    pub session: Option<Session>,
}

impl SessionEvent {
    pub fn new(sequence: u64, kind: SessionEventKind, session: Option<Session>) -> Self {
        Self {
            sequence,
            kind,
            session,
        }
    }
}

/// Role of the current user, always derived and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Anonymous,
    User,
    Admin,
}

/// Privilege level inside an authenticated session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Elevation {
    User,
    /// Ordinary user asked for admin access and must answer the challenge.
    ChallengePending,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Loading,
    Anonymous,
    Authenticated(Elevation),
}

impl AuthState {
    pub fn role(self) -> Role {
        match self {
            AuthState::Loading | AuthState::Anonymous => Role::Anonymous,
            AuthState::Authenticated(Elevation::Admin) => Role::Admin,
            AuthState::Authenticated(_) => Role::User,
        }
    }
}

/// Answer to a request for privileged access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Granted,
    ChallengeRequired,
    Denied,
}

/// Result of feeding a session event to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// The event was older than one already applied and was dropped.
    Stale,
    Applied {
        identity_changed: bool,
        authenticated: bool,
    },
}
