use chrono::Utc;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::AbortHandle;

use super::api::AuthApi;
use super::claims::{self, Claims};
use super::store::{Session, SessionStore};
use super::types::RefreshOutcome;
use crate::error::{ApiError, Result};
use crate::routes::{Navigation, LOGIN_ROUTE};

/// How long before expiry the access token is renewed
pub const DEFAULT_RENEWAL_MARGIN: Duration = Duration::from_secs(120);

/// Shortest wait before renewing a token that was issued inside the margin
const MIN_RENEWAL_DELAY: Duration = Duration::from_secs(5);

type SharedRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

/// What [`SessionManager::schedule_renewal`] did
#[derive(Debug, Clone, PartialEq)]
pub enum RenewalSchedule {
    /// One-shot timer armed to fire after the given delay
    Armed(Duration),

    /// Expiry is inside the margin, renewal started right away
    RenewingNow,

    /// Nothing stored, the user was logged out
    NoSession,
}

/// What [`SessionManager::resume`] found at start-up
#[derive(Debug, Clone, PartialEq)]
pub enum ResumeOutcome {
    /// No stored credential pair
    NoSession,

    /// Access token had expired, an immediate renewal was attempted
    Renewed(RefreshOutcome),

    /// Access token still valid, renewal scheduled
    Scheduled(RenewalSchedule),
}

struct ScheduledRenewal {
    generation: u64,
    handle: AbortHandle,
}

struct Inner {
    store: SessionStore,
    api: AuthApi,
    navigation: Navigation,
    renewal_margin: Duration,

    /// At most one armed renewal timer
    timer: Mutex<Option<ScheduledRenewal>>,
    timer_generation: AtomicU64,

    /// Refresh every concurrent caller awaits
    in_flight: Mutex<Option<SharedRefresh>>,
}

/// Session lifecycle manager.
///
/// Single authority over the stored session: tracks expiry, renews the access
/// token ahead of time, and logs the user out when renewal is impossible.
/// Clones share state.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionManager {
    pub fn new(
        store: SessionStore,
        api: AuthApi,
        navigation: Navigation,
        renewal_margin: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                api,
                navigation,
                renewal_margin,
                timer: Mutex::new(None),
                timer_generation: AtomicU64::new(0),
                in_flight: Mutex::new(None),
            }),
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.inner.store
    }

    pub fn navigation(&self) -> &Navigation {
        &self.inner.navigation
    }

    /// True when no expiry is stored or it has been reached
    pub fn is_expired(&self) -> bool {
        match self.inner.store.expires_at_ms() {
            None => true,
            Some(expires_at_ms) => now_ms() >= expires_at_ms,
        }
    }

    /// True when the stored refresh token decodes and has not expired
    pub fn is_refresh_valid(&self) -> bool {
        let Some(refresh_token) = self.inner.store.refresh_token() else {
            return false;
        };

        match claims::decode(&refresh_token) {
            Ok(claims) => {
                let valid = !claims.is_expired_at(now_ms());
                tracing::debug!(valid, "Checked refresh token");
                valid
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to decode refresh token");
                false
            }
        }
    }

    /// Claims of the stored access token
    fn access_claims(&self) -> Option<Claims> {
        let access_token = self.inner.store.access_token()?;
        match claims::decode(&access_token) {
            Ok(claims) => Some(claims),
            Err(e) => {
                tracing::error!(error = %e, "Failed to decode access token");
                None
            }
        }
    }

    /// Role claim of the stored access token
    pub fn role(&self) -> Option<String> {
        self.access_claims()?.role
    }

    /// Subject claim of the stored access token
    pub fn username(&self) -> Option<String> {
        self.access_claims()?.sub
    }

    /// Log in and start the renewal chain
    pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
        let pair = self.inner.api.login(username, password).await?;
        let session = self
            .inner
            .store
            .save(&pair.access_token, &pair.refresh_token)
            .map_err(ApiError::Credential)?;

        tracing::info!(username = %username, "Login successful");
        self.schedule_renewal();
        Ok(session)
    }

    /// Start-up check of a session left in storage
    pub async fn resume(&self) -> ResumeOutcome {
        let store = &self.inner.store;
        if store.access_token().is_none() || store.refresh_token().is_none() {
            return ResumeOutcome::NoSession;
        }

        if self.is_expired() {
            tracing::warn!("Stored access token expired, renewing now");
            ResumeOutcome::Renewed(self.renew().await)
        } else {
            ResumeOutcome::Scheduled(self.schedule_renewal())
        }
    }

    /// Arm the renewal timer for the stored expiry, replacing any armed timer.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn schedule_renewal(&self) -> RenewalSchedule {
        self.schedule(false)
    }

    /// After a renewal a token already inside the margin is not renewed again
    /// right away; the timer is armed at half its remaining lifetime instead,
    /// never sooner than [`MIN_RENEWAL_DELAY`].
    fn schedule(&self, after_renewal: bool) -> RenewalSchedule {
        self.cancel_scheduled_renewal();

        let Some(expires_at_ms) = self.inner.store.expires_at_ms() else {
            tracing::error!("Token expiry not found, logging out");
            self.logout();
            return RenewalSchedule::NoSession;
        };

        let margin_ms = i64::try_from(self.inner.renewal_margin.as_millis()).unwrap_or(i64::MAX);
        let remaining_ms = expires_at_ms.saturating_sub(now_ms());
        let until_renewal_ms = remaining_ms.saturating_sub(margin_ms);

        if until_renewal_ms > 0 {
            return self.arm(Duration::from_millis(until_renewal_ms as u64));
        }

        if after_renewal {
            let delay = Duration::from_millis((remaining_ms / 2).max(0) as u64)
                .max(MIN_RENEWAL_DELAY);
            tracing::warn!(
                remaining_ms,
                margin_ms,
                delay_ms = delay.as_millis() as u64,
                "Renewed access token expires within the renewal margin, delaying next renewal"
            );
            return self.arm(delay);
        }

        tracing::warn!("Access token close to expiry, renewing now");
        let this = self.clone();
        tokio::spawn(async move {
            this.renew().await;
        });
        RenewalSchedule::RenewingNow
    }

    /// Replace the armed timer with one that renews after `delay`
    fn arm(&self, delay: Duration) -> RenewalSchedule {
        let generation = self.inner.timer_generation.fetch_add(1, Ordering::Relaxed) + 1;

        // Held until the handle is stored so the task cannot wake before its slot exists
        let mut slot = lock(&self.inner.timer);
        let this = self.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if this.release_timer(generation) {
                this.renew().await;
            }
        });
        let previous = slot.replace(ScheduledRenewal {
            generation,
            handle: task.abort_handle(),
        });
        drop(slot);

        if let Some(previous) = previous {
            previous.handle.abort();
        }

        tracing::debug!(delay_ms = delay.as_millis() as u64, "Token renewal scheduled");
        RenewalSchedule::Armed(delay)
    }

    /// Whether a renewal timer is currently armed
    pub fn has_scheduled_renewal(&self) -> bool {
        lock(&self.inner.timer).is_some()
    }

    fn cancel_scheduled_renewal(&self) {
        if let Some(scheduled) = lock(&self.inner.timer).take() {
            scheduled.handle.abort();
        }
    }

    /// Called by a fired timer. False if the timer was superseded meanwhile.
    fn release_timer(&self, generation: u64) -> bool {
        let mut slot = lock(&self.inner.timer);
        match slot.as_ref() {
            Some(scheduled) if scheduled.generation == generation => {
                slot.take();
                true
            }
            _ => false,
        }
    }

    /// Refresh the access token and, on success, schedule the next renewal
    pub async fn renew(&self) -> RefreshOutcome {
        tracing::info!("Renewing access token ahead of expiry");
        let outcome = self.refresh().await;
        if outcome.is_renewed() {
            tracing::info!("Access token renewed");
            self.schedule(true);
        }
        outcome
    }

    /// Obtain a new access token with the stored refresh token.
    ///
    /// Concurrent callers share a single request. The request runs on its own
    /// task, so it completes and its result is stored even if every caller
    /// stops waiting. On any failure the session is cleared and the user is
    /// sent to the login route once.
    pub async fn refresh(&self) -> RefreshOutcome {
        let flight = {
            let mut slot = lock(&self.inner.in_flight);
            match slot.as_ref() {
                Some(existing) => {
                    tracing::debug!("Joining in-flight token refresh");
                    existing.clone()
                }
                None => {
                    // Slot stays locked until the flight is stored, so the task
                    // cannot clear it first
                    let this = self.clone();
                    let task = tokio::spawn(async move {
                        let outcome = this.refresh_once().await;
                        lock(&this.inner.in_flight).take();
                        outcome
                    });

                    let this = self.clone();
                    let flight = async move {
                        match task.await {
                            Ok(outcome) => outcome,
                            Err(e) => {
                                tracing::error!(error = %e, "Token refresh task failed");
                                lock(&this.inner.in_flight).take();
                                RefreshOutcome::Network(e.to_string())
                            }
                        }
                    }
                    .boxed()
                    .shared();
                    *slot = Some(flight.clone());
                    flight
                }
            }
        };

        flight.await
    }

    /// Whether a refresh request is currently outstanding
    pub fn is_refreshing(&self) -> bool {
        lock(&self.inner.in_flight).is_some()
    }

    async fn refresh_once(&self) -> RefreshOutcome {
        let outcome = self.request_access_token().await;
        if !outcome.is_renewed() {
            tracing::error!(outcome = ?outcome, "Token renewal failed, logging out");
            self.logout();
        }
        outcome
    }

    async fn request_access_token(&self) -> RefreshOutcome {
        let Some(refresh_token) = self.inner.store.refresh_token() else {
            return RefreshOutcome::NoSession;
        };

        if !self.is_refresh_valid() {
            return RefreshOutcome::RefreshExpired;
        }

        match self.inner.api.refresh_token(&refresh_token).await {
            Ok(access_token) => match self.inner.store.save(&access_token, &refresh_token) {
                Ok(_) => RefreshOutcome::Renewed(access_token),
                Err(e) => RefreshOutcome::InvalidCredential(e.to_string()),
            },
            Err(ApiError::Network(e)) => RefreshOutcome::Network(e.to_string()),
            Err(e) => match e.status() {
                Some(status) => RefreshOutcome::Rejected { status },
                None => RefreshOutcome::InvalidCredential(e.to_string()),
            },
        }
    }

    /// Clear the session and go to the login route
    pub fn logout(&self) {
        self.inner.store.clear();
        self.cancel_scheduled_renewal();
        self.inner.navigation.replace(LOGIN_ROUTE);
        tracing::info!("Session cleared, redirected to login");
    }
}
