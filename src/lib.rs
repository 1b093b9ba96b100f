//! # onboarding
//!
//! Account onboarding flows for services backed by an external identity
//! provider: registration, email-verification polling with rate-limited
//! resends, idempotent profile bootstrap, and post-auth redirect decisions.
//!
//! ## Features
//!
//! - **Verification flow controller** with auto-polling, a resend cooldown,
//!   and an attempt budget, safe under any interleaving of timers and user
//!   actions
//! - **Trait seams** ([`IdentityGateway`], [`ProfileStore`]) so any
//!   provider or database plugs in
//! - **Lifecycle hooks** for sign-up/sign-in/verified events
//! - **Closed error taxonomy** with user-safe messages; provider codes
//!   never leak
//! - **In-process fakes** in [`testing`] for driving the flows in tests
//!
//! ## Quick Start
//!
//! First, implement [`IdentityGateway`] for your provider and
//! [`ProfileStore`] for your database:
//!
//! ```rust,ignore
//! use onboarding::{IdentityGateway, ProfileStore};
//!
//! #[derive(Clone)]
//! struct MyProvider { /* http client */ }
//!
//! impl IdentityGateway for MyProvider {
//!     // ... implement methods
//! }
//! ```
//!
//! Then create an [`Onboarding`] instance and run the flows:
//!
//! ```rust,ignore
//! use onboarding::{Onboarding, OnboardingConfig, redirect_resolve};
//!
//! let onboarding = Onboarding::new(OnboardingConfig::from_env()?, provider, store)?;
//!
//! let registration = onboarding
//!     .register("user@example.com", "SecurePass123", Some("Ada"))
//!     .await?;
//!
//! // Bind a verification controller and pick it up immediately in case the
//! // email was confirmed before this code ran.
//! let controller = onboarding.verification(registration.identity);
//! controller.check_now().await;
//!
//! // Later, from a UI event:
//! controller.resend().await;
//!
//! // Once controller.state().is_verified:
//! let destination = redirect_resolve(
//!     Some(&controller.identity()),
//!     Some(&registration.profile),
//!     pending_intent.as_deref(),
//! );
//! ```
//!
//! ## Hooks
//!
//! Use hooks to run custom logic on lifecycle events:
//!
//! ```rust,ignore
//! use onboarding::{Identity, OnboardingHooks};
//!
//! #[derive(Clone)]
//! struct MyHooks;
//!
//! impl OnboardingHooks for MyHooks {
//!     fn on_verified(&self, identity: &Identity) -> impl std::future::Future<Output = ()> + Send {
//!         let user_id = identity.id;
//!         async move {
//!             // Unlock the account's workspace, enqueue a welcome email, ...
//!             println!("{user_id} confirmed their email");
//!         }
//!     }
//! }
//!
//! let onboarding = Onboarding::new(config, provider, store)?.with_hooks(MyHooks);
//! ```

mod config;
mod controller;
mod email;
mod error;
mod gateway;
mod password;
mod profile;
mod redirect;

pub mod flows;
pub mod testing;

use std::future::Future;
use std::sync::Arc;

pub use config::{ConfigError, OnboardingConfig};
pub use controller::{NoticeKind, VerificationFlowController, VerificationState};
pub use email::email_normalize;
pub use error::{ErrorKind, OnboardingError, ProviderError};
pub use flows::Registration;
pub use gateway::{Identity, IdentityGateway, IdentityListener, IdentitySubscription};
pub use password::password_validate;
pub use profile::{ProfileRecord, ProfileRole, ProfileStore, profile_ensure};
pub use redirect::{Destination, redirect_resolve};

/// Hooks for onboarding lifecycle events.
///
/// Implement this trait to run custom logic after lifecycle events, such as
/// provisioning resources on sign-up or unlocking features once the email
/// is verified.
///
/// # Example
///
/// ```rust,ignore
/// use onboarding::{Identity, OnboardingHooks};
///
/// #[derive(Clone)]
/// struct MyHooks;
///
/// impl OnboardingHooks for MyHooks {
///     fn on_sign_up(&self, identity: &Identity) -> impl std::future::Future<Output = ()> + Send {
///         let user_id = identity.id;
///         async move { println!("{user_id} signed up!"); }
///     }
/// }
/// ```
pub trait OnboardingHooks: Send + Sync + Clone + 'static {
    /// Called after an account is created.
    fn on_sign_up(&self, _identity: &Identity) -> impl Future<Output = ()> + Send {
        async {}
    }

    /// Called after an account signs in.
    fn on_sign_in(&self, _identity: &Identity) -> impl Future<Output = ()> + Send {
        async {}
    }

    /// Called once per controller instance when the confirmation flag
    /// transitions to verified.
    fn on_verified(&self, _identity: &Identity) -> impl Future<Output = ()> + Send {
        async {}
    }
}

impl OnboardingHooks for () {}

/// Account onboarding entry point. Cheap to clone.
///
/// # Type Parameters
///
/// - `G`: The identity provider implementing [`IdentityGateway`]
/// - `P`: The profile store implementing [`ProfileStore`]
/// - `H`: Optional hooks implementing [`OnboardingHooks`] (defaults to `()`)
///
/// Construct one per application (not per request); every sign-in or
/// sign-up then gets its own [`VerificationFlowController`] via
/// [`Onboarding::verification`], so controllers never share mutable state.
#[derive(Clone)]
pub struct Onboarding<G: IdentityGateway, P: ProfileStore, H: OnboardingHooks = ()> {
    config: Arc<OnboardingConfig>,
    gateway: G,
    profiles: P,
    hooks: H,
}

impl<G: IdentityGateway, P: ProfileStore> Onboarding<G, P, ()> {
    /// Create an onboarding instance with default (no-op) hooks.
    pub fn new(config: OnboardingConfig, gateway: G, profiles: P) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            gateway,
            profiles,
            hooks: (),
        })
    }
}

impl<G: IdentityGateway, P: ProfileStore, H: OnboardingHooks> Onboarding<G, P, H> {
    /// Attach custom lifecycle hooks.
    pub fn with_hooks<NewH: OnboardingHooks>(self, hooks: NewH) -> Onboarding<G, P, NewH> {
        Onboarding {
            config: self.config,
            gateway: self.gateway,
            profiles: self.profiles,
            hooks,
        }
    }

    /// Bind a fresh verification controller to `identity`.
    ///
    /// One controller per sign-in session; attempt counters start at zero.
    /// Callers should follow up with one immediate
    /// [`check_now`](VerificationFlowController::check_now) so a
    /// confirmation that happened before the controller existed is observed
    /// without waiting for a poll tick.
    pub fn verification(&self, identity: Identity) -> VerificationFlowController<G, H> {
        VerificationFlowController::start(
            self.gateway.clone(),
            self.hooks.clone(),
            &self.config,
            identity,
        )
    }

    /// Returns a reference to the onboarding configuration.
    pub fn config(&self) -> &OnboardingConfig {
        &self.config
    }

    /// Returns a reference to the identity gateway.
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Returns a reference to the profile store.
    pub fn profiles(&self) -> &P {
        &self.profiles
    }

    pub(crate) fn hooks(&self) -> &H {
        &self.hooks
    }
}
