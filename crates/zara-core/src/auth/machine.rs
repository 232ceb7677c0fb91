//! The session/role state machine.
//!
//! Pure and synchronous: it never performs I/O, so `current_role` can be
//! answered at any time without awaiting anything. Remote calls live in
//! [`AuthService`](super::AuthService), which feeds this machine.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::challenge::AdminChallenge;
use super::model::{
    AccessDecision, AuthState, Elevation, EventOutcome, Identity, Role, Session, SessionEvent,
};
use crate::error::AuthError;

#[derive(Debug)]
pub struct AuthSessionMachine {
    /// Lowercased, trimmed admin address.
    admin_email: Option<String>,
    challenge: Option<AdminChallenge>,
    state: AuthState,
    session: Option<Session>,
    last_sequence: Option<u64>,
    /// Identity id that passed the admin challenge during the current session.
    challenge_passed_by: Option<String>,
    failed_challenges: u32,
}

impl AuthSessionMachine {
    pub fn new(admin_email: Option<&str>, challenge: Option<AdminChallenge>) -> Self {
        Self {
            admin_email: admin_email
                .map(normalize_email)
                .filter(|email| !email.is_empty()),
            challenge,
            state: AuthState::Loading,
            session: None,
            last_sequence: None,
            challenge_passed_by: None,
            failed_challenges: 0,
        }
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn current_role(&self) -> Role {
        self.state.role()
    }

    /// True until the first session event has been applied.
    pub fn is_loading(&self) -> bool {
        self.state == AuthState::Loading
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.session.as_ref().map(|session| &session.identity)
    }

    pub fn failed_challenges(&self) -> u32 {
        self.failed_challenges
    }

    pub fn is_admin_email(&self, email: &str) -> bool {
        self.admin_email
            .as_deref()
            .is_some_and(|admin| admin == normalize_email(email))
    }

    /// Applies a provider session event.
    ///
    /// Events whose sequence is not greater than the last applied one are
    /// dropped. An expired session is treated as no session.
    pub fn apply_event(&mut self, event: SessionEvent, now: DateTime<Utc>) -> EventOutcome {
        if let Some(last) = self.last_sequence {
            if event.sequence <= last {
                debug!(
                    sequence = event.sequence,
                    last_applied = last,
                    kind = ?event.kind,
                    "Ignoring stale session event"
                );
                return EventOutcome::Stale;
            }
        }
        self.last_sequence = Some(event.sequence);

        let session = match event.session {
            Some(session) if session.is_expired_at(now) => {
                info!(user_id = %session.identity.id, "Session expired, treating as signed out");
                None
            }
            other => other,
        };

        let previous_id = self.identity().map(|identity| identity.id.clone());
        let next_id = session.as_ref().map(|s| s.identity.id.clone());
        let identity_changed = previous_id != next_id;

        if identity_changed {
            self.challenge_passed_by = None;
            self.failed_challenges = 0;
        }

        let previous_state = self.state;
        self.state = match &session {
            None => AuthState::Anonymous,
            Some(session) => {
                let elevation = if self.is_admin_email(&session.identity.email)
                    || self.challenge_passed_by.as_deref() == Some(session.identity.id.as_str())
                {
                    Elevation::Admin
                } else if !identity_changed
                    && previous_state == AuthState::Authenticated(Elevation::ChallengePending)
                {
                    Elevation::ChallengePending
                } else {
                    Elevation::User
                };
                AuthState::Authenticated(elevation)
            }
        };
        let authenticated = session.is_some();
        self.session = session;

        if previous_state != self.state || identity_changed {
            info!(
                kind = ?event.kind,
                from = ?previous_state,
                to = ?self.state,
                user_id = ?self.identity().map(|identity| identity.id.as_str()),
                "Auth state changed"
            );
        }

        EventOutcome::Applied {
            identity_changed,
            authenticated,
        }
    }

    /// Ends loading when the event stream closes before delivering anything.
    pub fn mark_stream_closed(&mut self) {
        if self.is_loading() {
            warn!("Session stream closed before the first event, assuming anonymous");
            self.state = AuthState::Anonymous;
        }
    }

    pub fn request_privileged_access(&mut self) -> AccessDecision {
        match self.state {
            AuthState::Authenticated(Elevation::Admin) => AccessDecision::Granted,
            AuthState::Authenticated(_) => {
                self.state = AuthState::Authenticated(Elevation::ChallengePending);
                debug!("Admin challenge requested");
                AccessDecision::ChallengeRequired
            }
            AuthState::Loading | AuthState::Anonymous => AccessDecision::Denied,
        }
    }

    /// Checks the admin password for the pending challenge.
    ///
    /// A failure keeps the challenge pending.
    pub fn submit_challenge(&mut self, candidate: &str) -> Result<(), AuthError> {
        if self.state != AuthState::Authenticated(Elevation::ChallengePending) {
            return Err(AuthError::NoChallengePending);
        }
        let Some(user_id) = self.identity().map(|identity| identity.id.clone()) else {
            return Err(AuthError::NotAuthenticated);
        };

        let passed = match &self.challenge {
            Some(challenge) => challenge.verify(candidate),
            None => {
                warn!("Admin challenge submitted but no challenge digest is configured");
                false
            }
        };

        if passed {
            self.state = AuthState::Authenticated(Elevation::Admin);
            self.challenge_passed_by = Some(user_id.clone());
            self.failed_challenges = 0;
            info!(user_id = %user_id, "Admin challenge passed");
            Ok(())
        } else {
            self.failed_challenges += 1;
            warn!(
                user_id = %user_id,
                failures = self.failed_challenges,
                "Admin challenge failed"
            );
            Err(AuthError::ChallengeFailed)
        }
    }

    pub fn cancel_challenge(&mut self) {
        if self.state == AuthState::Authenticated(Elevation::ChallengePending) {
            self.state = AuthState::Authenticated(Elevation::User);
        }
    }

    /// Drops the session and any elevation. Used on logout.
    pub fn clear_local(&mut self) {
        if self.session.is_some() || self.state != AuthState::Anonymous {
            info!(from = ?self.state, "Clearing local session");
        }
        self.session = None;
        self.challenge_passed_by = None;
        self.failed_challenges = 0;
        self.state = AuthState::Anonymous;
    }

    /// Refreshes the cached identity when it belongs to the current session.
    pub fn replace_identity(&mut self, identity: Identity) -> bool {
        match self.session.as_mut() {
            Some(session) if session.identity.id == identity.id => {
                session.identity = identity;
                true
            }
            _ => false,
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
