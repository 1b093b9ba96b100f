//! Email-verification flow controller.
//!
//! Owns the verification state machine for one signed-in identity: a
//! repeating auto-poll task that re-checks the provider's confirmation
//! flag, a cooldown countdown gating resend requests, and the single-flight
//! guards that serialize user-triggered actions against both timers.
//!
//! One controller instance per sign-in session; attempt counters never
//! survive the instance. [`VerificationFlowController::dispose`] (or drop)
//! cancels both tasks, and a network call still in flight at that point can
//! no longer mutate state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tokio::task::JoinHandle;
use tokio::time::{self, Duration, Instant, MissedTickBehavior};

use crate::{
    config::OnboardingConfig,
    error::ErrorKind,
    gateway::{Identity, IdentityGateway},
    OnboardingHooks,
};

/// One-shot user-facing notices produced by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// The confirmation flag transitioned to verified.
    EmailVerified,
    /// A verification email was sent.
    EmailSent,
}

/// Snapshot of the verification state machine.
///
/// `is_checking` and `is_resending` are exposed so callers can disable the
/// matching controls while an operation is in flight.
#[derive(Debug, Clone)]
pub struct VerificationState {
    /// Whether the provider has confirmed the email.
    pub is_verified: bool,
    /// A confirmation check is in flight.
    pub is_checking: bool,
    /// A resend request is in flight.
    pub is_resending: bool,
    /// Accepted resends so far; increases by exactly one per successful send.
    pub resend_attempts: u32,
    /// When the last accepted resend happened.
    pub last_resend_at: Option<Instant>,
    /// Whole seconds left on the resend cooldown.
    pub cooldown_remaining_secs: u64,
    /// Derived: cooldown elapsed and attempt budget not exhausted.
    pub can_resend: bool,
    /// Whether the auto-poll task is allowed to issue checks.
    pub auto_poll_enabled: bool,
    /// Most recent recoverable failure, classified.
    pub last_error: Option<ErrorKind>,
    /// Most recent notice.
    pub last_notice: Option<NoticeKind>,
}

impl VerificationState {
    fn initial(email_confirmed: bool, max_attempts: u32) -> Self {
        Self {
            is_verified: email_confirmed,
            is_checking: false,
            is_resending: false,
            resend_attempts: 0,
            last_resend_at: None,
            cooldown_remaining_secs: 0,
            can_resend: max_attempts > 0,
            auto_poll_enabled: !email_confirmed,
            last_error: None,
            last_notice: None,
        }
    }

    /// Recompute the derived cooldown fields from the last resend stamp.
    fn cooldown_update(&mut self, cooldown: Duration, max_attempts: u32, now: Instant) {
        self.cooldown_remaining_secs = match self.last_resend_at {
            Some(stamp) => cooldown_remaining_secs(cooldown, now.saturating_duration_since(stamp)),
            None => 0,
        };
        self.can_resend =
            self.cooldown_remaining_secs == 0 && self.resend_attempts < max_attempts;
    }
}

/// Whole seconds left on a cooldown, rounded up.
fn cooldown_remaining_secs(cooldown: Duration, elapsed: Duration) -> u64 {
    let left_ms = cooldown.as_millis().saturating_sub(elapsed.as_millis());
    (left_ms.div_ceil(1000)) as u64
}

struct Shared {
    identity: Identity,
    state: VerificationState,
}

struct Inner<G, H> {
    gateway: G,
    hooks: H,
    resend_cooldown: Duration,
    max_attempts: u32,
    /// Cleared by dispose; every resolution handler re-checks it before
    /// touching state, so a stale in-flight call cannot resurrect a
    /// disposed controller.
    active: AtomicBool,
    shared: Mutex<Shared>,
    poll_task: Mutex<Option<JoinHandle<()>>>,
    cooldown_task: Mutex<Option<JoinHandle<()>>>,
}

/// Verification state machine bound to one identity.
///
/// Created via [`crate::Onboarding::verification`] or
/// [`VerificationFlowController::start`]. Callers should issue one immediate
/// [`check_now`](Self::check_now) after construction so an email confirmed
/// before the controller existed is picked up without waiting for a poll
/// tick.
pub struct VerificationFlowController<G: IdentityGateway, H: OnboardingHooks = ()> {
    inner: Arc<Inner<G, H>>,
}

impl<G: IdentityGateway, H: OnboardingHooks> VerificationFlowController<G, H> {
    /// Bind a controller to `identity` and arm auto-polling when the email
    /// is still unconfirmed.
    ///
    /// Must be called from within a tokio runtime; the poll task is spawned
    /// here.
    pub fn start(gateway: G, hooks: H, config: &OnboardingConfig, identity: Identity) -> Self {
        let state = VerificationState::initial(identity.email_confirmed, config.max_resend_attempts);
        let needs_poll = !identity.email_confirmed;

        let inner = Arc::new(Inner {
            gateway,
            hooks,
            resend_cooldown: config.resend_cooldown,
            max_attempts: config.max_resend_attempts,
            active: AtomicBool::new(true),
            shared: Mutex::new(Shared { identity, state }),
            poll_task: Mutex::new(None),
            cooldown_task: Mutex::new(None),
        });

        if needs_poll {
            let handle = tokio::spawn(poll_run(Arc::downgrade(&inner), config.poll_interval));
            *inner.poll_task.lock().unwrap() = Some(handle);
        }

        Self { inner }
    }

    /// Check the provider's confirmation flag once.
    ///
    /// Single-flight: when a check is already in flight this returns the
    /// current verdict immediately, with no side effects. Otherwise the
    /// identity is reloaded, `is_verified` is updated from the fresh
    /// snapshot, and a success notice is set only on the transition into
    /// verified. Failures are classified into `last_error`; the controller
    /// stays usable.
    ///
    /// Returns the resulting `is_verified` value.
    pub async fn check_now(&self) -> bool {
        self.inner.check_now().await
    }

    /// Request another verification email.
    ///
    /// Single-flight: a call arriving while one is in flight is dropped
    /// silently. Refused with `CooldownActive` or `MaxAttemptsReached` in
    /// `last_error` when the budget or cooldown forbids a send. On success
    /// the attempt counter increases by exactly one and the cooldown
    /// countdown restarts.
    pub async fn resend(&self) {
        resend(&self.inner).await;
    }

    /// Manually arm or disarm auto-polling. Counters are unaffected.
    ///
    /// Once verified the flag is pinned false; re-arming requires a new
    /// controller instance.
    pub fn set_auto_poll(&self, enabled: bool) {
        let mut shared = self.inner.shared.lock().unwrap();
        if shared.state.is_verified {
            shared.state.auto_poll_enabled = false;
            return;
        }
        shared.state.auto_poll_enabled = enabled;
    }

    /// Snapshot the current state, with cooldown fields recomputed to the
    /// present instant.
    pub fn state(&self) -> VerificationState {
        let mut shared = self.inner.shared.lock().unwrap();
        if self.inner.active.load(Ordering::SeqCst) {
            let (cooldown, max) = (self.inner.resend_cooldown, self.inner.max_attempts);
            shared.state.cooldown_update(cooldown, max, Instant::now());
        }
        shared.state.clone()
    }

    /// Current identity snapshot (replaced wholesale on each reload).
    pub fn identity(&self) -> Identity {
        self.inner.shared.lock().unwrap().identity.clone()
    }

    /// Cancel both timers. Idempotent.
    ///
    /// After this returns no further state mutation occurs, even if an
    /// in-flight network call resolves later.
    pub fn dispose(&self) {
        if !self.inner.active.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(handle) = self.inner.poll_task.lock().unwrap().take() {
            handle.abort();
        }
        if let Some(handle) = self.inner.cooldown_task.lock().unwrap().take() {
            handle.abort();
        }
        tracing::debug!("verification controller disposed");
    }
}

impl<G: IdentityGateway, H: OnboardingHooks> Drop for VerificationFlowController<G, H> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<G: IdentityGateway, H: OnboardingHooks> Inner<G, H> {
    async fn check_now(&self) -> bool {
        let identity = {
            let mut shared = self.shared.lock().unwrap();
            if shared.state.is_verified {
                // Terminal for this instance; no provider round-trip.
                return true;
            }
            if shared.state.is_checking {
                return false;
            }
            shared.state.is_checking = true;
            shared.identity.clone()
        };

        let result = self.gateway.reload(&identity).await;

        if !self.active.load(Ordering::SeqCst) {
            // Disposed while the reload was in flight.
            return false;
        }

        let verified_identity = {
            let mut shared = self.shared.lock().unwrap();
            shared.state.is_checking = false;
            match result {
                Ok(fresh) => {
                    let was_verified = shared.state.is_verified;
                    shared.state.is_verified = fresh.email_confirmed;
                    shared.identity = fresh;
                    if shared.state.is_verified {
                        shared.state.auto_poll_enabled = false;
                        shared.state.last_error = None;
                        if !was_verified {
                            shared.state.last_notice = Some(NoticeKind::EmailVerified);
                            Some(shared.identity.clone())
                        } else {
                            None
                        }
                    } else {
                        None
                    }
                }
                Err(err) => {
                    shared.state.last_error = Some(err.kind());
                    None
                }
            }
        };

        if let Some(identity) = verified_identity {
            tracing::debug!(user = %identity.id, "email confirmed, auto-poll stopped");
            self.hooks.on_verified(&identity).await;
            return true;
        }

        self.shared.lock().unwrap().state.is_verified
    }
}

async fn resend<G: IdentityGateway, H: OnboardingHooks>(inner: &Arc<Inner<G, H>>) {
    let identity = {
        let mut shared = inner.shared.lock().unwrap();
        if shared.state.is_resending {
            // Dropped silently: rapid repeated interaction must not queue
            // duplicate sends.
            return;
        }
        shared
            .state
            .cooldown_update(inner.resend_cooldown, inner.max_attempts, Instant::now());
        if shared.state.resend_attempts >= inner.max_attempts {
            shared.state.last_error = Some(ErrorKind::MaxAttemptsReached);
            return;
        }
        if shared.state.cooldown_remaining_secs > 0 {
            shared.state.last_error = Some(ErrorKind::CooldownActive);
            return;
        }
        shared.state.is_resending = true;
        shared.identity.clone()
    };

    let result = inner.gateway.request_verification_email(&identity).await;

    if !inner.active.load(Ordering::SeqCst) {
        return;
    }

    let mut shared = inner.shared.lock().unwrap();
    shared.state.is_resending = false;
    match result {
        Ok(()) => {
            shared.state.resend_attempts += 1;
            shared.state.last_resend_at = Some(Instant::now());
            shared
                .state
                .cooldown_update(inner.resend_cooldown, inner.max_attempts, Instant::now());
            shared.state.last_notice = Some(NoticeKind::EmailSent);
            shared.state.last_error = None;
            drop(shared);
            cooldown_arm(inner);
        }
        Err(err) => {
            tracing::debug!(code = %err.code, "verification email send failed");
            shared.state.last_error = Some(err.kind());
        }
    }
}

/// Spawn the cooldown countdown unless one is already running.
///
/// The countdown recomputes from `last_resend_at` on every tick, so a task
/// that outlives one cooldown into the next still reports correct values.
fn cooldown_arm<G: IdentityGateway, H: OnboardingHooks>(inner: &Arc<Inner<G, H>>) {
    let mut slot = inner.cooldown_task.lock().unwrap();
    let running = slot.as_ref().is_some_and(|handle| !handle.is_finished());
    if !running {
        *slot = Some(tokio::spawn(cooldown_run(Arc::downgrade(inner))));
    }
}

/// Repeating 1-second countdown; stops itself once the cooldown reaches 0.
async fn cooldown_run<G: IdentityGateway, H: OnboardingHooks>(weak: Weak<Inner<G, H>>) {
    let mut tick = time::interval(Duration::from_secs(1));
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tick.tick().await;
        let Some(inner) = weak.upgrade() else {
            break;
        };
        if !inner.active.load(Ordering::SeqCst) {
            break;
        }
        let mut shared = inner.shared.lock().unwrap();
        shared
            .state
            .cooldown_update(inner.resend_cooldown, inner.max_attempts, Instant::now());
        if shared.state.cooldown_remaining_secs == 0 {
            break;
        }
    }
}

/// Repeating poll; each tick is a no-op while a check is in flight or
/// auto-poll is disarmed, and the loop ends the moment verification is
/// observed.
async fn poll_run<G: IdentityGateway, H: OnboardingHooks>(
    weak: Weak<Inner<G, H>>,
    period: Duration,
) {
    let mut tick = time::interval(period);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The interval fires once immediately; the caller-side immediate check
    // covers that slot.
    tick.tick().await;
    loop {
        tick.tick().await;
        let Some(inner) = weak.upgrade() else {
            break;
        };
        if !inner.active.load(Ordering::SeqCst) {
            break;
        }
        {
            let shared = inner.shared.lock().unwrap();
            if shared.state.is_verified {
                break;
            }
            if !shared.state.auto_poll_enabled || shared.state.is_checking {
                continue;
            }
        }
        if inner.check_now().await {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeGateway;
    use uuid::Uuid;

    fn test_config() -> OnboardingConfig {
        OnboardingConfig::default()
    }

    fn unconfirmed_identity() -> Identity {
        Identity {
            id: Uuid::new_v4(),
            email: "user@example.com".to_string(),
            email_confirmed: false,
            display_name: None,
        }
    }

    fn controller(
        gateway: &FakeGateway,
        config: &OnboardingConfig,
    ) -> Arc<VerificationFlowController<FakeGateway>> {
        let identity = unconfirmed_identity();
        gateway.seed_identity(identity.clone());
        Arc::new(VerificationFlowController::start(
            gateway.clone(),
            (),
            config,
            identity,
        ))
    }

    /// Let spawned tasks run without advancing the paused clock.
    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[test]
    fn cooldown_remaining_rounds_up() {
        let cooldown = Duration::from_secs(60);
        assert_eq!(cooldown_remaining_secs(cooldown, Duration::from_secs(0)), 60);
        assert_eq!(
            cooldown_remaining_secs(cooldown, Duration::from_millis(59_001)),
            1
        );
        assert_eq!(cooldown_remaining_secs(cooldown, Duration::from_secs(60)), 0);
        assert_eq!(cooldown_remaining_secs(cooldown, Duration::from_secs(90)), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn confirmed_before_mount_needs_no_poll_tick() {
        let gateway = FakeGateway::new();
        let config = test_config();
        let ctl = controller(&gateway, &config);

        // Provider confirmed while the controller did not exist yet; the
        // caller-side immediate check picks it up without any tick.
        gateway.set_confirmed(true);
        assert!(ctl.check_now().await);

        let state = ctl.state();
        assert!(state.is_verified);
        assert!(!state.auto_poll_enabled);
        assert_eq!(state.last_notice, Some(NoticeKind::EmailVerified));
        assert_eq!(gateway.reload_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn poll_detects_confirmation_and_stops() {
        let gateway = FakeGateway::new();
        let config = test_config();
        let ctl = controller(&gateway, &config);
        // Let the poll task arm its timer before the clock moves.
        settle().await;

        assert!(!ctl.check_now().await);
        assert_eq!(gateway.reload_calls(), 1);

        gateway.set_confirmed(true);
        time::advance(config.poll_interval).await;
        settle().await;

        let state = ctl.state();
        assert!(state.is_verified);
        assert!(!state.auto_poll_enabled);
        assert_eq!(state.last_notice, Some(NoticeKind::EmailVerified));
        assert_eq!(gateway.reload_calls(), 2);

        // Loop is gone: further ticks issue no checks.
        time::advance(config.poll_interval * 4).await;
        settle().await;
        assert_eq!(gateway.reload_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn notice_is_set_only_on_the_transition() {
        let gateway = FakeGateway::new();
        let config = test_config();
        let ctl = controller(&gateway, &config);

        gateway.set_confirmed(true);
        assert!(ctl.check_now().await);
        assert_eq!(ctl.state().last_notice, Some(NoticeKind::EmailVerified));

        // Repeated checks on a verified controller do not touch the provider
        // and preserve the existing notice.
        assert!(ctl.check_now().await);
        assert_eq!(gateway.reload_calls(), 1);
        assert_eq!(ctl.state().last_notice, Some(NoticeKind::EmailVerified));
    }

    #[tokio::test(start_paused = true)]
    async fn check_is_single_flight() {
        let gateway = FakeGateway::new();
        let config = test_config();
        let ctl = controller(&gateway, &config);

        gateway.hold_reloads();
        let background = {
            let ctl = ctl.clone();
            tokio::spawn(async move { ctl.check_now().await })
        };
        settle().await;
        assert!(ctl.state().is_checking);

        // Second call returns immediately without a second reload.
        assert!(!ctl.check_now().await);
        assert_eq!(gateway.reload_calls(), 1);

        gateway.release_reloads();
        background.await.expect("check task");
        assert!(!ctl.state().is_checking);
        assert_eq!(gateway.reload_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn poll_tick_is_noop_while_check_in_flight() {
        let gateway = FakeGateway::new();
        let config = test_config();
        let ctl = controller(&gateway, &config);
        settle().await;

        gateway.hold_reloads();
        let background = {
            let ctl = ctl.clone();
            tokio::spawn(async move { ctl.check_now().await })
        };
        settle().await;
        assert_eq!(gateway.reload_calls(), 1);

        // Timer keeps ticking but must not schedule an overlapping check.
        time::advance(config.poll_interval).await;
        settle().await;
        time::advance(config.poll_interval).await;
        settle().await;
        assert_eq!(gateway.reload_calls(), 1);

        gateway.release_reloads();
        background.await.expect("check task");
    }

    #[tokio::test(start_paused = true)]
    async fn auto_poll_toggle_mutes_and_resumes_ticks() {
        let gateway = FakeGateway::new();
        let config = test_config();
        let ctl = controller(&gateway, &config);
        settle().await;

        ctl.set_auto_poll(false);
        time::advance(config.poll_interval * 3).await;
        settle().await;
        assert_eq!(gateway.reload_calls(), 0);

        ctl.set_auto_poll(true);
        time::advance(config.poll_interval).await;
        settle().await;
        assert_eq!(gateway.reload_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn check_failure_is_classified_and_recoverable() {
        let gateway = FakeGateway::new();
        let config = test_config();
        let ctl = controller(&gateway, &config);

        gateway.fail_next_reload("auth/network-request-failed");
        assert!(!ctl.check_now().await);
        let state = ctl.state();
        assert_eq!(state.last_error, Some(ErrorKind::NetworkFailure));
        assert!(!state.is_checking);

        // Controller stays usable once the flag has cleared.
        gateway.set_confirmed(true);
        assert!(ctl.check_now().await);
    }

    #[tokio::test(start_paused = true)]
    async fn resend_success_starts_cooldown() {
        let gateway = FakeGateway::new();
        let config = test_config();
        let ctl = controller(&gateway, &config);

        ctl.resend().await;
        let state = ctl.state();
        assert_eq!(state.resend_attempts, 1);
        assert_eq!(state.cooldown_remaining_secs, 60);
        assert!(!state.can_resend);
        assert_eq!(state.last_notice, Some(NoticeKind::EmailSent));
        assert_eq!(gateway.send_calls(), 1);

        time::advance(Duration::from_secs(30)).await;
        settle().await;
        let state = ctl.state();
        assert_eq!(state.cooldown_remaining_secs, 30);
        assert!(!state.can_resend);

        // Refused mid-cooldown; counters untouched.
        ctl.resend().await;
        let state = ctl.state();
        assert_eq!(state.last_error, Some(ErrorKind::CooldownActive));
        assert_eq!(state.resend_attempts, 1);
        assert_eq!(gateway.send_calls(), 1);

        time::advance(Duration::from_secs(31)).await;
        settle().await;
        let state = ctl.state();
        assert_eq!(state.cooldown_remaining_secs, 0);
        assert!(state.can_resend);

        ctl.resend().await;
        assert_eq!(ctl.state().resend_attempts, 2);
        assert_eq!(gateway.send_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn resend_budget_is_a_hard_ceiling() {
        let gateway = FakeGateway::new();
        let config = OnboardingConfig {
            max_resend_attempts: 2,
            ..test_config()
        };
        let ctl = controller(&gateway, &config);

        ctl.resend().await;
        time::advance(Duration::from_secs(61)).await;
        settle().await;
        ctl.resend().await;
        assert_eq!(ctl.state().resend_attempts, 2);

        time::advance(Duration::from_secs(61)).await;
        settle().await;
        ctl.resend().await;

        let state = ctl.state();
        assert_eq!(state.resend_attempts, 2);
        assert_eq!(state.last_error, Some(ErrorKind::MaxAttemptsReached));
        assert!(!state.can_resend);
        assert_eq!(gateway.send_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn resend_while_in_flight_is_dropped_silently() {
        let gateway = FakeGateway::new();
        let config = test_config();
        let ctl = controller(&gateway, &config);

        gateway.hold_sends();
        let background = {
            let ctl = ctl.clone();
            tokio::spawn(async move { ctl.resend().await })
        };
        settle().await;
        assert!(ctl.state().is_resending);

        // Concurrent call: no error surfaced, no counters touched.
        ctl.resend().await;
        let state = ctl.state();
        assert_eq!(state.resend_attempts, 0);
        assert!(state.last_resend_at.is_none());
        assert_eq!(state.last_error, None);

        gateway.release_sends();
        background.await.expect("resend task");
        let state = ctl.state();
        assert_eq!(state.resend_attempts, 1);
        assert_eq!(gateway.send_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn resend_failure_keeps_counters() {
        let gateway = FakeGateway::new();
        let config = test_config();
        let ctl = controller(&gateway, &config);

        gateway.fail_next_send("auth/quota-exceeded");
        ctl.resend().await;

        let state = ctl.state();
        assert_eq!(state.last_error, Some(ErrorKind::QuotaExceeded));
        assert_eq!(state.resend_attempts, 0);
        assert!(state.last_resend_at.is_none());
        assert!(state.can_resend);
    }

    #[tokio::test(start_paused = true)]
    async fn verified_pins_auto_poll_off() {
        let gateway = FakeGateway::new();
        let config = test_config();
        let ctl = controller(&gateway, &config);

        gateway.set_confirmed(true);
        assert!(ctl.check_now().await);
        assert!(!ctl.state().auto_poll_enabled);

        ctl.set_auto_poll(true);
        assert!(!ctl.state().auto_poll_enabled);
    }

    #[tokio::test(start_paused = true)]
    async fn dispose_freezes_state_under_delayed_resolution() {
        let gateway = FakeGateway::new();
        let config = test_config();
        let ctl = controller(&gateway, &config);

        gateway.set_confirmed(true);
        gateway.hold_reloads();
        let background = {
            let ctl = ctl.clone();
            tokio::spawn(async move { ctl.check_now().await })
        };
        settle().await;
        assert_eq!(gateway.reload_calls(), 1);

        ctl.dispose();
        gateway.release_reloads();
        let verdict = background.await.expect("check task");

        // The stale resolution must not resurrect the disposed controller.
        assert!(!verdict);
        let state = ctl.state();
        assert!(!state.is_verified);
        assert_eq!(state.last_notice, None);

        // No timer fires after dispose.
        time::advance(config.poll_interval * 10).await;
        settle().await;
        assert_eq!(gateway.reload_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dispose_is_idempotent() {
        let gateway = FakeGateway::new();
        let config = test_config();
        let ctl = controller(&gateway, &config);

        ctl.dispose();
        ctl.dispose();
        assert_eq!(gateway.reload_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_cancels_the_poll_task() {
        let gateway = FakeGateway::new();
        let config = test_config();
        let ctl = controller(&gateway, &config);

        drop(ctl);
        time::advance(config.poll_interval * 4).await;
        settle().await;
        assert_eq!(gateway.reload_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_controller_resets_counters() {
        let gateway = FakeGateway::new();
        let config = test_config();
        let ctl = controller(&gateway, &config);

        ctl.resend().await;
        assert_eq!(ctl.state().resend_attempts, 1);
        ctl.dispose();

        // New sign-in session, new controller: budget starts over.
        let next = controller(&gateway, &config);
        assert_eq!(next.state().resend_attempts, 0);
        assert!(next.state().can_resend);
    }
}
