//! Identity-provider contract.
//!
//! This module defines the trait seam between the onboarding flows and the
//! external identity provider, so the same flows run against any provider
//! binding (or the in-process fake in [`crate::testing`]).

use std::future::Future;
use uuid::Uuid;

use crate::error::ProviderError;

/// Immutable snapshot of the provider's view of an account.
///
/// Snapshots are only replaced wholesale, never field-mutated: the single
/// refresh path is [`IdentityGateway::reload`], which returns a fresh value.
///
/// # Example
///
/// ```rust,ignore
/// use onboarding::Identity;
/// use uuid::Uuid;
///
/// let identity = Identity {
///     id: Uuid::new_v4(),
///     email: "user@example.com".to_string(),
///     email_confirmed: false,
///     display_name: Some("Ada".to_string()),
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Provider-assigned account id.
    pub id: Uuid,
    /// Account email address.
    pub email: String,
    /// Whether the provider has verified the email address.
    pub email_confirmed: bool,
    /// Optional display name.
    pub display_name: Option<String>,
}

/// Listener invoked synchronously on every identity change event.
///
/// Receives the new identity on sign-in and token refresh, `None` on
/// sign-out.
pub type IdentityListener = Box<dyn Fn(Option<&Identity>) + Send + Sync>;

/// Handle for an identity-change subscription.
///
/// Dropping the handle (or calling [`IdentitySubscription::unsubscribe`])
/// detaches the listener.
pub struct IdentitySubscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl IdentitySubscription {
    /// Wrap a cancellation closure provided by a gateway implementation.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Detach the listener now instead of waiting for drop.
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for IdentitySubscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for IdentitySubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentitySubscription")
            .field("attached", &self.cancel.is_some())
            .finish()
    }
}

/// Contract over the external identity provider.
///
/// Implement this trait to bind the onboarding flows to a concrete provider.
/// Every operation may fail with a [`ProviderError`]; the flows classify
/// those into the closed [`crate::ErrorKind`] taxonomy.
///
/// # Example
///
/// ```rust,ignore
/// use onboarding::{Identity, IdentityGateway, IdentityListener, IdentitySubscription, ProviderError};
///
/// #[derive(Clone)]
/// struct MyProvider { /* http client, cached identity */ }
///
/// impl IdentityGateway for MyProvider {
///     async fn register(
///         &self,
///         email: &str,
///         password: &str,
///         display_name: Option<&str>,
///     ) -> Result<Identity, ProviderError> {
///         // Call the provider's sign-up endpoint
///         todo!()
///     }
///     // ... implement remaining methods
/// }
/// ```
pub trait IdentityGateway: Clone + Send + Sync + 'static {
    /// Create a new account.
    ///
    /// On success the provider has already sent exactly one verification
    /// email; callers must not trigger another send as part of
    /// registration. Fails with `auth/email-already-in-use`,
    /// `auth/weak-password`, `auth/invalid-email`, or
    /// `auth/network-request-failed`.
    fn register(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> impl Future<Output = Result<Identity, ProviderError>> + Send;

    /// Authenticate with email and password.
    ///
    /// Fails with `auth/user-not-found`, `auth/wrong-password`,
    /// `auth/user-disabled`, `auth/too-many-requests`, or
    /// `auth/network-request-failed`.
    fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Identity, ProviderError>> + Send;

    /// Sign out the current identity.
    ///
    /// Best-effort: implementations must clear their local identity cache
    /// even when the remote call fails.
    fn sign_out(&self) -> impl Future<Output = Result<(), ProviderError>> + Send;

    /// Ask the provider to send a verification email for `identity`.
    ///
    /// Fails with `auth/quota-exceeded`, `auth/unauthorized-domain`,
    /// `auth/network-request-failed`, or `auth/no-current-user`.
    fn request_verification_email(
        &self,
        identity: &Identity,
    ) -> impl Future<Output = Result<(), ProviderError>> + Send;

    /// Re-fetch the authoritative snapshot for `identity`.
    ///
    /// The returned value carries the provider's current confirmation flag.
    /// Fails with `auth/network-request-failed` or `auth/user-disabled`.
    fn reload(
        &self,
        identity: &Identity,
    ) -> impl Future<Output = Result<Identity, ProviderError>> + Send;

    /// Register a listener for identity change events (sign-in, sign-out,
    /// token refresh). Fan-out is synchronous per change event.
    fn subscribe(&self, listener: IdentityListener) -> IdentitySubscription;
}
