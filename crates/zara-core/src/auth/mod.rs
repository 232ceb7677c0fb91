//! Authentication and authorization domain.
//!
//! # Module Structure
//!
//! - `model`: identity, session, role and session-event types
//! - `challenge`: hashed admin password check
//! - `machine`: the pure session/role state machine
//! - `provider`: the remote identity provider seam
//! - `service`: login/sign-up/logout contract on top of the machine

mod challenge;
mod machine;
mod model;
mod provider;
mod service;

pub use challenge::AdminChallenge;
pub use machine::AuthSessionMachine;
pub use model::{
    AccessDecision, AuthState, Elevation, EventOutcome, Identity, Metadata, Role, Session,
    SessionEvent, SessionEventKind, META_GENERATION_COUNT, META_LAST_GENERATION_DATE,
    META_USERNAME,
};
pub use provider::IdentityProvider;
pub use service::AuthService;
