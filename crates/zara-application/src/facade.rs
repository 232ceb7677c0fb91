//! Composition root: the single surface UI code talks to.
//!
//! The facade owns one instance of every service, feeds identity-provider
//! session events into the auth machine and keeps the credit ledger in step
//! with the signed-in identity.

use std::sync::Arc;

use anyhow::Context;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use zara_core::announcement::{Announcement, AnnouncementDraft, Comment, CommentAuthor};
use zara_core::auth::{
    AccessDecision, AdminChallenge, AuthService, AuthSessionMachine, AuthState, EventOutcome,
    Identity, IdentityProvider, Role, Session, SessionEvent,
};
use zara_core::clock::{Clock, SystemClock};
use zara_core::config::HubConfig;
use zara_core::credit::{Consumption, CreditConfig, CreditLedger, SyncOutcome};
use zara_core::error::{AuthError, CoreError, Result};
use zara_core::generation::{AspectRatio, ImageRequest, compose_prompt};
use zara_core::persona::{CreatePersonaRequest, Persona};
use zara_core::state::StateRepository;
use zara_infrastructure::{
    ConfigService, FileBackend, HubPaths, PersistentStore, StoreAnnouncementRepository,
    StorePersonaRepository, StoreStateRepository,
};

use crate::announcement_board::AnnouncementBoard;
use crate::logging::init_tracing;
use crate::persona_catalog::PersonaCatalog;

pub struct CoreFacade {
    provider: Arc<dyn IdentityProvider>,
    auth: AuthService,
    ledger: CreditLedger,
    personas: PersonaCatalog,
    board: AnnouncementBoard,
    state: Arc<dyn StateRepository>,
}

impl CoreFacade {
    /// Loads `config.toml` from the config directory and bootstraps on it.
    pub async fn open(provider: Arc<dyn IdentityProvider>) -> anyhow::Result<Arc<Self>> {
        let config = ConfigService::load()
            .await
            .context("Failed to load the hub configuration")?;
        Self::bootstrap(config, provider).await
    }

    /// Installs the configured log filter, then builds the facade on the
    /// file store under the configured data directory.
    pub async fn bootstrap(
        config: HubConfig,
        provider: Arc<dyn IdentityProvider>,
    ) -> anyhow::Result<Arc<Self>> {
        init_tracing(&config.log_level);
        let store_dir =
            HubPaths::store_dir(&config).context("Failed to resolve the storage directory")?;
        info!(path = %store_dir.display(), "Opening hub store");

        let store = PersistentStore::new(Arc::new(FileBackend::new(store_dir)));
        let facade = Self::with_store(&config, provider, store, Arc::new(SystemClock))
            .await
            .context("Failed to initialise the hub core")?;
        Ok(Arc::new(facade))
    }

    pub async fn with_store(
        config: &HubConfig,
        provider: Arc<dyn IdentityProvider>,
        store: PersistentStore,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let challenge = config
            .admin_challenge_sha256
            .as_deref()
            .map(AdminChallenge::from_hex_digest)
            .transpose()?;
        if challenge.is_none() {
            warn!("No admin challenge digest configured, password elevation is disabled");
        }
        let machine = AuthSessionMachine::new(Some(&config.admin_email), challenge);

        let state: Arc<dyn StateRepository> = Arc::new(StoreStateRepository::new(store.clone()));
        let credit_config = state
            .get_credit_config(config.default_credit_config())
            .await;

        let personas = PersonaCatalog::new(
            Arc::new(StorePersonaRepository::new(store.clone())?),
            clock.clone(),
        );
        personas.load().await;

        let board = AnnouncementBoard::new(
            Arc::new(StoreAnnouncementRepository::new(store)?),
            state.clone(),
            clock.clone(),
        );
        board.load().await;

        Ok(Self {
            auth: AuthService::new(provider.clone(), clock.clone(), machine),
            ledger: CreditLedger::new(provider.clone(), clock, credit_config),
            provider,
            personas,
            board,
            state,
        })
    }

    /// Subscribes to session changes and applies the first one before
    /// returning. Later events are handled by the returned task.
    pub async fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let mut events = self.provider.subscribe();
        match events.recv().await {
            Some(event) => self.handle_session_event(event).await,
            None => {
                warn!("Session stream closed before the first event");
                self.auth.mark_stream_closed();
            }
        }

        let facade = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                facade.handle_session_event(event).await;
            }
            debug!("Session stream closed");
        })
    }

    pub async fn handle_session_event(&self, event: SessionEvent) {
        match self.auth.apply_session_event(event) {
            EventOutcome::Stale => {}
            EventOutcome::Applied {
                authenticated: true,
                ..
            } => {
                let Some(identity) = self.auth.identity() else {
                    return;
                };
                if let SyncOutcome::Reset {
                    identity: Some(updated),
                    ..
                } = self.ledger.sync(&identity).await
                {
                    self.auth.replace_identity(updated);
                }
            }
            EventOutcome::Applied {
                authenticated: false,
                ..
            } => self.ledger.clear().await,
        }
    }

    // ============================================================================
    // Auth
    // ============================================================================

    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        Ok(self.auth.login(email, password).await?)
    }

    pub async fn sign_up(&self, email: &str, password: &str, username: &str) -> Result<()> {
        Ok(self.auth.sign_up(email, password, username).await?)
    }

    /// Local state is cleared even when the remote sign-out fails.
    pub async fn logout(&self) -> Result<()> {
        let remote = self.auth.logout().await;
        self.ledger.clear().await;
        Ok(remote?)
    }

    pub async fn update_username(&self, username: &str) -> Result<Identity> {
        Ok(self.auth.update_username(username).await?)
    }

    pub fn current_role(&self) -> Role {
        self.auth.current_role()
    }

    pub fn auth_state(&self) -> AuthState {
        self.auth.state()
    }

    pub fn is_auth_loading(&self) -> bool {
        self.auth.is_loading()
    }

    pub fn current_identity(&self) -> Option<Identity> {
        self.auth.identity()
    }

    pub fn request_privileged_access(&self) -> AccessDecision {
        self.auth.request_privileged_access()
    }

    pub fn submit_admin_challenge(&self, password: &str) -> Result<()> {
        Ok(self.auth.submit_admin_challenge(password)?)
    }

    pub fn cancel_admin_challenge(&self) {
        self.auth.cancel_admin_challenge();
    }

    // ============================================================================
    // Credits
    // ============================================================================

    /// Spends one generation credit. `Ok(false)` means none was available.
    pub async fn consume_credit(&self) -> Result<bool> {
        match self.ledger.consume().await? {
            Consumption::Granted { identity, .. } => {
                self.auth.replace_identity(identity);
                Ok(true)
            }
            other => Ok(other.is_granted()),
        }
    }

    pub async fn remaining_credits(&self) -> Option<u32> {
        self.ledger.remaining().await
    }

    pub fn credit_config(&self) -> CreditConfig {
        self.ledger.config()
    }

    pub fn is_generations_loading(&self) -> bool {
        self.ledger.is_loading()
    }

    pub async fn set_daily_limit(&self, daily_limit: u32) -> Result<()> {
        self.require_admin()?;
        let next = CreditConfig {
            daily_limit,
            ..self.ledger.config()
        };
        self.save_credit_config(next).await?;
        self.ledger.set_daily_limit(daily_limit);
        Ok(())
    }

    pub async fn set_limit_enabled(&self, enabled: bool) -> Result<()> {
        self.require_admin()?;
        let next = CreditConfig {
            limit_enabled: enabled,
            ..self.ledger.config()
        };
        self.save_credit_config(next).await?;
        self.ledger.set_limit_enabled(enabled);
        Ok(())
    }

    async fn save_credit_config(&self, config: CreditConfig) -> Result<()> {
        self.state.save_credit_config(config).await.map_err(|err| {
            warn!(error = %err, "Failed to save credit settings");
            CoreError::save_failed(err.to_string())
        })
    }

    /// Consumes a credit and builds the request for an image persona.
    ///
    /// Returns `Ok(None)` when no credit was available.
    pub async fn prepare_image_generation(
        &self,
        persona_id: &str,
        prompt: &str,
        style: Option<&str>,
        aspect_ratio: AspectRatio,
    ) -> Result<Option<ImageRequest>> {
        self.require_user()?;
        if prompt.trim().is_empty() {
            return Err(CoreError::invalid_input("prompt must not be empty"));
        }
        let persona = self
            .personas
            .get_by_id(persona_id)
            .await
            .ok_or_else(|| CoreError::not_found("Persona", persona_id))?;
        let Some(model) = persona.model() else {
            return Err(CoreError::invalid_input(format!(
                "persona '{}' does not generate images",
                persona.name
            )));
        };

        if !self.consume_credit().await? {
            info!(persona_id, "Image generation refused, no credits left");
            return Ok(None);
        }
        let full_prompt = compose_prompt(prompt, style, &persona.system_prompt);
        Ok(Some(ImageRequest::new(full_prompt, model, aspect_ratio)))
    }

    // ============================================================================
    // Personas
    // ============================================================================

    pub async fn list_personas(&self) -> Vec<Persona> {
        self.personas.list().await
    }

    pub async fn get_persona(&self, id: &str) -> Option<Persona> {
        self.personas.get_by_id(id).await
    }

    pub async fn create_persona(&self, request: CreatePersonaRequest) -> Result<Persona> {
        self.require_user()?;
        self.personas.create(request).await
    }

    pub async fn update_persona(&self, persona: Persona) -> Result<bool> {
        self.require_user()?;
        self.personas.update(persona).await
    }

    pub async fn delete_persona(&self, id: &str) -> Result<bool> {
        self.require_user()?;
        self.personas.delete(id).await
    }

    pub async fn import_personas(&self, raw: &Value) -> Result<usize> {
        self.require_user()?;
        self.personas.import(raw).await
    }

    // ============================================================================
    // Announcements
    // ============================================================================

    pub async fn list_announcements(&self) -> Vec<Announcement> {
        self.board.list().await
    }

    pub async fn add_announcement(&self, draft: AnnouncementDraft) -> Result<Announcement> {
        self.require_admin()?;
        self.board.add_announcement(draft).await
    }

    pub async fn update_announcement(
        &self,
        id: &str,
        draft: AnnouncementDraft,
    ) -> Result<Announcement> {
        self.require_admin()?;
        self.board.update_announcement(id, draft).await
    }

    pub async fn delete_announcement(&self, id: &str) -> Result<()> {
        self.require_admin()?;
        self.board.delete_announcement(id).await
    }

    pub async fn toggle_like(&self, announcement_id: &str) -> Result<Announcement> {
        let identity = self.require_user()?;
        self.board.toggle_like(announcement_id, &identity.id).await
    }

    pub async fn add_comment(&self, announcement_id: &str, text: &str) -> Result<Comment> {
        let author = self.comment_author()?;
        self.board
            .add_top_level_comment(announcement_id, &author, text)
            .await
    }

    pub async fn add_reply(
        &self,
        announcement_id: &str,
        parent_id: &str,
        text: &str,
    ) -> Result<Comment> {
        let author = self.comment_author()?;
        self.board
            .add_reply(announcement_id, parent_id, &author, text)
            .await
    }

    pub async fn has_new_announcements(&self) -> bool {
        self.board.has_new(self.auth.identity().is_some()).await
    }

    pub async fn mark_announcements_as_seen(&self) -> Result<()> {
        self.board.mark_all_seen().await
    }

    // ============================================================================
    // Guards
    // ============================================================================

    fn require_user(&self) -> Result<Identity> {
        Ok(self.auth.require_identity()?)
    }

    fn require_admin(&self) -> Result<()> {
        match self.auth.current_role() {
            Role::Admin => Ok(()),
            Role::User => Err(CoreError::permission_denied("admin role required")),
            Role::Anonymous => Err(AuthError::NotAuthenticated.into()),
        }
    }

    fn comment_author(&self) -> Result<CommentAuthor> {
        let identity = self.require_user()?;
        Ok(CommentAuthor {
            name: identity.display_name(),
            id: identity.id,
            is_admin: self.auth.is_admin(),
        })
    }
}
