//! Sign-in flow.

use crate::{
    Onboarding, OnboardingHooks,
    email::email_normalize,
    error::OnboardingError,
    gateway::{Identity, IdentityGateway},
    profile::{ProfileStore, profile_login_stamp},
};

impl<G, P, H> Onboarding<G, P, H>
where
    G: IdentityGateway,
    P: ProfileStore,
    H: OnboardingHooks,
{
    /// Authenticate an existing account.
    ///
    /// On success the profile's `last_login_at` is stamped best-effort: the
    /// account/profile pair already exists, so a failed stamp is logged and
    /// swallowed rather than failing the sign-in. The `on_sign_in` hook
    /// fires after authentication succeeds.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, OnboardingError> {
        let email = email_normalize(email)?;

        let identity = self.gateway().authenticate(&email, password).await?;

        if let Err(err) = profile_login_stamp(self.profiles(), identity.id).await {
            tracing::warn!(user = %identity.id, error = %err, "failed to stamp last login");
        }

        self.hooks().on_sign_in(&identity).await;
        tracing::debug!(user = %identity.id, "signed in");

        Ok(identity)
    }
}
