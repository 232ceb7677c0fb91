//! Per-user daily credit ledger.
//!
//! The identity provider's metadata is the source of truth. Local state is
//! only updated after a remote write succeeds, except for the daily reset,
//! which is kept locally even when the write fails.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::model::{CreditConfig, CreditState};
use crate::auth::{Identity, IdentityProvider};
use crate::clock::Clock;
use crate::error::AuthError;

/// Result of [`CreditLedger::sync`].
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// The cached metadata is for today and was adopted as is.
    Cached(CreditState),
    /// Credits were reset to the daily limit. `identity` is the updated
    /// identity when the remote write succeeded.
    Reset {
        state: CreditState,
        identity: Option<Identity>,
    },
}

/// Result of [`CreditLedger::consume`].
#[derive(Debug, Clone, PartialEq)]
pub enum Consumption {
    /// Limits are disabled; nothing was recorded.
    Unlimited,
    Granted { remaining: u32, identity: Identity },
    Exhausted,
    /// No authenticated user has credit state loaded.
    Unauthenticated,
}

impl Consumption {
    pub fn is_granted(&self) -> bool {
        matches!(self, Consumption::Unlimited | Consumption::Granted { .. })
    }
}

pub struct CreditLedger {
    provider: Arc<dyn IdentityProvider>,
    clock: Arc<dyn Clock>,
    config: RwLock<CreditConfig>,
    /// Reset-then-consume runs under this lock as one unit.
    held: Mutex<Option<HeldCredits>>,
    in_flight: AtomicUsize,
}

/// Credits of the signed-in user as last confirmed by this process.
#[derive(Debug, Clone)]
struct HeldCredits {
    user_id: String,
    state: CreditState,
}

/// Marks the ledger busy for as long as it is alive.
struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl CreditLedger {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        clock: Arc<dyn Clock>,
        config: CreditConfig,
    ) -> Self {
        Self {
            provider,
            clock,
            config: RwLock::new(config),
            held: Mutex::new(None),
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> CreditConfig {
        *self.config.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Takes effect at the next reset; today's count is left alone.
    pub fn set_daily_limit(&self, daily_limit: u32) {
        self.config
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .daily_limit = daily_limit;
        info!(daily_limit, "Daily generation limit changed");
    }

    pub fn set_limit_enabled(&self, enabled: bool) {
        self.config
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .limit_enabled = enabled;
        info!(enabled, "Generation limit toggled");
    }

    /// True while a sync or consume is in progress.
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub async fn remaining(&self) -> Option<u32> {
        self.state().await.map(|state| state.count)
    }

    pub async fn state(&self) -> Option<CreditState> {
        self.held.lock().await.as_ref().map(|held| held.state)
    }

    pub async fn clear(&self) {
        *self.held.lock().await = None;
        debug!("Credit state cleared");
    }

    /// Adopts the identity's cached credits, resetting them when they are
    /// from another day or missing.
    ///
    /// The identity may be an old snapshot. While this user already holds
    /// credits for today, the count only ever goes down: the lower of the
    /// held and cached counts wins and stale metadata never triggers a
    /// second reset.
    pub async fn sync(&self, identity: &Identity) -> SyncOutcome {
        let _loading = LoadingGuard::enter(&self.in_flight);
        let mut guard = self.held.lock().await;
        let today = self.clock.today();
        let cached = CreditState::from_metadata(&identity.metadata)
            .filter(|cached| cached.is_current(today));

        if let Some(held) = guard
            .as_mut()
            .filter(|held| held.user_id == identity.id && held.state.is_current(today))
        {
            if let Some(cached) = cached {
                held.state.count = held.state.count.min(cached.count);
            }
            debug!(user_id = %identity.id, count = held.state.count, "Keeping held credits");
            return SyncOutcome::Cached(held.state);
        }

        if let Some(cached) = cached {
            *guard = Some(HeldCredits {
                user_id: identity.id.clone(),
                state: cached,
            });
            debug!(user_id = %identity.id, count = cached.count, "Using cached credits");
            return SyncOutcome::Cached(cached);
        }

        let fresh = CreditState::fresh(self.config().daily_limit, today);
        *guard = Some(HeldCredits {
            user_id: identity.id.clone(),
            state: fresh,
        });
        info!(user_id = %identity.id, count = fresh.count, date = %today, "Daily credits reset");

        match self.provider.update_user(fresh.to_metadata_patch()).await {
            Ok(updated) => SyncOutcome::Reset {
                state: fresh,
                identity: Some(updated),
            },
            Err(err) => {
                warn!(user_id = %identity.id, error = %err, "Failed to persist credit reset, keeping local reset");
                SyncOutcome::Reset {
                    state: fresh,
                    identity: None,
                }
            }
        }
    }

    /// Spends one credit.
    ///
    /// The remote write happens first; on failure nothing is consumed and
    /// the error is returned.
    pub async fn consume(&self) -> Result<Consumption, AuthError> {
        let config = self.config();
        if !config.limit_enabled {
            return Ok(Consumption::Unlimited);
        }

        let _loading = LoadingGuard::enter(&self.in_flight);
        let mut guard = self.held.lock().await;
        let Some(held) = guard.as_mut() else {
            return Ok(Consumption::Unauthenticated);
        };

        let today = self.clock.today();
        if !held.state.is_current(today) {
            held.state = CreditState::fresh(config.daily_limit, today);
            info!(count = held.state.count, date = %today, "Day rolled over, credits reset");
        }

        if held.state.count == 0 {
            debug!("No generation credits left today");
            return Ok(Consumption::Exhausted);
        }

        let next = CreditState {
            count: held.state.count - 1,
            last_reset_date: held.state.last_reset_date,
        };
        match self.provider.update_user(next.to_metadata_patch()).await {
            Ok(identity) => {
                held.state = next;
                debug!(remaining = next.count, "Generation credit consumed");
                Ok(Consumption::Granted {
                    remaining: next.count,
                    identity,
                })
            }
            Err(err) => {
                warn!(error = %err, "Failed to record credit usage, nothing consumed");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;
    use chrono::NaiveDate;
    use serde_json::json;
    use tokio::sync::mpsc;

    use super::*;
    use crate::auth::{Metadata, Session, SessionEvent};
    use crate::clock::FixedClock;

    /// Records metadata patches; optionally fails them.
    #[derive(Default)]
    struct MetadataStore {
        metadata: StdMutex<Metadata>,
        fail: StdMutex<bool>,
        writes: AtomicUsize,
    }

    #[async_trait]
    impl IdentityProvider for MetadataStore {
        async fn sign_in_with_password(&self, _: &str, _: &str) -> Result<Session, AuthError> {
            Err(AuthError::InvalidCredentials)
        }

        async fn sign_up(&self, _: &str, _: &str, _: Metadata) -> Result<(), AuthError> {
            Ok(())
        }

        async fn sign_out(&self) -> Result<(), AuthError> {
            Ok(())
        }

        async fn update_user(&self, patch: Metadata) -> Result<Identity, AuthError> {
            // Give other consumers a chance to interleave
            tokio::task::yield_now().await;
            if *self.fail.lock().unwrap() {
                return Err(AuthError::Network("unreachable".into()));
            }
            self.writes.fetch_add(1, Ordering::SeqCst);
            let mut metadata = self.metadata.lock().unwrap();
            metadata.extend(patch);
            Ok(Identity::new("u1", "bob@x.io").with_metadata(metadata.clone()))
        }

        fn subscribe(&self) -> mpsc::UnboundedReceiver<SessionEvent> {
            mpsc::unbounded_channel().1
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn setup(limit: u32) -> (Arc<MetadataStore>, Arc<FixedClock>, CreditLedger) {
        let store = Arc::new(MetadataStore::default());
        let clock = Arc::new(FixedClock::at_date(day(10)));
        let ledger = CreditLedger::new(
            store.clone(),
            clock.clone(),
            CreditConfig {
                daily_limit: limit,
                limit_enabled: true,
            },
        );
        (store, clock, ledger)
    }

    fn identity_with(metadata: serde_json::Value) -> Identity {
        Identity::new("u1", "bob@x.io").with_metadata(metadata.as_object().cloned().unwrap())
    }

    #[tokio::test]
    async fn test_exact_quota_exhaustion() {
        let (store, _clock, ledger) = setup(3);
        ledger.sync(&Identity::new("u1", "bob@x.io")).await;

        let mut granted = 0;
        for _ in 0..5 {
            if ledger.consume().await.unwrap().is_granted() {
                granted += 1;
            }
        }
        assert_eq!(granted, 3);
        assert_eq!(ledger.remaining().await, Some(0));
        assert_eq!(ledger.consume().await.unwrap(), Consumption::Exhausted);
        // one reset write plus three consumes
        assert_eq!(store.writes.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_concurrent_consumes_never_overspend() {
        let (_store, _clock, ledger) = setup(2);
        let ledger = Arc::new(ledger);
        ledger.sync(&Identity::new("u1", "bob@x.io")).await;

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let ledger = ledger.clone();
                tokio::spawn(async move { ledger.consume().await.unwrap().is_granted() })
            })
            .collect();

        let mut granted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                granted += 1;
            }
        }
        assert_eq!(granted, 2);
        assert_eq!(ledger.remaining().await, Some(0));
    }

    #[tokio::test]
    async fn test_day_boundary_resets_without_rollover() {
        let (_store, clock, ledger) = setup(5);
        let outcome = ledger
            .sync(&identity_with(json!({
                "generation_count": 2,
                "last_generation_date": "2024-05-09"
            })))
            .await;
        assert!(matches!(outcome, SyncOutcome::Reset { state, .. } if state.count == 5));

        // Same day: cached metadata is kept
        let outcome = ledger
            .sync(&identity_with(json!({
                "generation_count": 1,
                "last_generation_date": "2024-05-10"
            })))
            .await;
        assert_eq!(
            outcome,
            SyncOutcome::Cached(CreditState {
                count: 1,
                last_reset_date: day(10)
            })
        );

        // Crossing midnight between sync and consume resets to the limit, not 1 + 5
        clock.advance(chrono::Duration::days(1));
        let consumed = ledger.consume().await.unwrap();
        assert!(matches!(consumed, Consumption::Granted { remaining: 4, .. }));
        assert_eq!(
            ledger.state().await,
            Some(CreditState {
                count: 4,
                last_reset_date: day(11)
            })
        );
    }

    #[tokio::test]
    async fn test_stale_snapshot_never_raises_count() {
        let (_store, _clock, ledger) = setup(3);
        let before = identity_with(json!({
            "generation_count": 3,
            "last_generation_date": "2024-05-10"
        }));
        ledger.sync(&before).await;
        for _ in 0..3 {
            ledger.consume().await.unwrap();
        }

        let outcome = ledger.sync(&before).await;
        assert!(matches!(outcome, SyncOutcome::Cached(state) if state.count == 0));
        assert_eq!(ledger.consume().await.unwrap(), Consumption::Exhausted);

        // yesterday's metadata must not mint a second reset today
        let yesterday = identity_with(json!({
            "generation_count": 3,
            "last_generation_date": "2024-05-09"
        }));
        ledger.sync(&yesterday).await;
        assert_eq!(ledger.remaining().await, Some(0));
    }

    #[tokio::test]
    async fn test_lower_count_from_another_device_is_adopted() {
        let (_store, _clock, ledger) = setup(3);
        ledger.sync(&Identity::new("u1", "bob@x.io")).await;
        ledger
            .sync(&identity_with(json!({
                "generation_count": 1,
                "last_generation_date": "2024-05-10"
            })))
            .await;
        assert_eq!(ledger.remaining().await, Some(1));
    }

    #[tokio::test]
    async fn test_switching_user_adopts_their_credits() {
        let (_store, _clock, ledger) = setup(3);
        ledger.sync(&Identity::new("u1", "bob@x.io")).await;
        for _ in 0..3 {
            ledger.consume().await.unwrap();
        }

        let eve = Identity::new("u2", "eve@x.io").with_metadata(
            json!({ "generation_count": 2, "last_generation_date": "2024-05-10" })
                .as_object()
                .cloned()
                .unwrap(),
        );
        ledger.sync(&eve).await;
        assert_eq!(ledger.remaining().await, Some(2));
    }

    #[tokio::test]
    async fn test_remote_failure_consumes_nothing() {
        let (store, _clock, ledger) = setup(3);
        ledger.sync(&Identity::new("u1", "bob@x.io")).await;
        *store.fail.lock().unwrap() = true;

        let err = ledger.consume().await.unwrap_err();
        assert!(matches!(err, AuthError::Network(_)));
        assert_eq!(ledger.remaining().await, Some(3));
        assert!(!ledger.is_loading());
    }

    #[tokio::test]
    async fn test_failed_reset_write_keeps_local_reset() {
        let (store, _clock, ledger) = setup(4);
        *store.fail.lock().unwrap() = true;

        let outcome = ledger.sync(&Identity::new("u1", "bob@x.io")).await;
        assert!(matches!(outcome, SyncOutcome::Reset { identity: None, .. }));
        assert_eq!(ledger.remaining().await, Some(4));
        assert!(!ledger.is_loading());
    }

    #[tokio::test]
    async fn test_disabled_limit_is_unlimited() {
        let (store, _clock, ledger) = setup(0);
        ledger.set_limit_enabled(false);
        assert_eq!(ledger.consume().await.unwrap(), Consumption::Unlimited);
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_consume_without_session() {
        let (_store, _clock, ledger) = setup(3);
        assert_eq!(ledger.consume().await.unwrap(), Consumption::Unauthenticated);

        ledger.sync(&Identity::new("u1", "bob@x.io")).await;
        ledger.clear().await;
        assert_eq!(ledger.consume().await.unwrap(), Consumption::Unauthenticated);
    }

    #[tokio::test]
    async fn test_limit_change_applies_at_next_reset() {
        let (_store, clock, ledger) = setup(3);
        ledger.sync(&Identity::new("u1", "bob@x.io")).await;
        ledger.set_daily_limit(20);
        assert_eq!(ledger.remaining().await, Some(3));

        clock.advance(chrono::Duration::days(1));
        ledger.consume().await.unwrap();
        assert_eq!(ledger.remaining().await, Some(19));
    }
}
