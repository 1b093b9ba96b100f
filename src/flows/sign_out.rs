//! Sign-out flow.

use crate::{
    Onboarding, OnboardingHooks,
    gateway::IdentityGateway,
    profile::ProfileStore,
};

impl<G, P, H> Onboarding<G, P, H>
where
    G: IdentityGateway,
    P: ProfileStore,
    H: OnboardingHooks,
{
    /// Sign out the current identity.
    ///
    /// Best-effort: the gateway clears its local identity cache regardless
    /// of the remote outcome, so a failed remote call is logged and
    /// swallowed. Any live verification controller belongs to the session
    /// being torn down and should be disposed (or dropped) by its owner.
    pub async fn sign_out(&self) {
        if let Err(err) = self.gateway().sign_out().await {
            tracing::error!(code = %err.code, "remote sign-out failed");
        }
    }
}
