//! Remote identity provider seam.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::model::{Identity, Metadata, Session, SessionEvent};
use crate::error::AuthError;

/// The remote authentication service (email/password accounts plus a
/// per-user metadata blob).
///
/// Implementations push every session change, including the initial one,
/// to each subscriber in order with increasing sequence numbers.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in_with_password(&self, email: &str, password: &str)
    -> Result<Session, AuthError>;

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: Metadata,
    ) -> Result<(), AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Merges `patch` into the current user's metadata and returns the
    /// updated identity.
    async fn update_user(&self, patch: Metadata) -> Result<Identity, AuthError>;

    /// Opens a session-change stream. The first event describes the current
    /// session (or its absence).
    fn subscribe(&self) -> mpsc::UnboundedReceiver<SessionEvent>;
}
