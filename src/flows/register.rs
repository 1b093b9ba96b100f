//! Registration flow.

use crate::{
    Onboarding, OnboardingHooks,
    email::email_normalize,
    error::OnboardingError,
    gateway::{Identity, IdentityGateway},
    password::password_validate,
    profile::{ProfileRecord, ProfileStore, profile_ensure},
};

/// Outcome of a successful registration.
#[derive(Debug, Clone)]
pub struct Registration {
    /// Fresh identity; the email starts unconfirmed.
    pub identity: Identity,
    /// Profile record materialized for the identity.
    pub profile: ProfileRecord,
}

impl<G, P, H> Onboarding<G, P, H>
where
    G: IdentityGateway,
    P: ProfileStore,
    H: OnboardingHooks,
{
    /// Register a new account.
    ///
    /// The email and password are validated locally before the provider is
    /// called; provider-side registration sends the first verification
    /// email itself. The profile record is then materialized idempotently —
    /// a bootstrap failure is fatal and propagates, since an identity
    /// without a profile is not a state the rest of the system can reason
    /// about. The `on_sign_up` hook fires only after both succeeded.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<Registration, OnboardingError> {
        let email = email_normalize(email)?;
        password_validate(password, self.config())?;

        let identity = self
            .gateway()
            .register(&email, password, display_name)
            .await?;

        let profile = profile_ensure(self.profiles(), &identity, display_name).await?;

        self.hooks().on_sign_up(&identity).await;
        tracing::debug!(user = %identity.id, "account registered");

        Ok(Registration { identity, profile })
    }
}

#[cfg(test)]
mod tests {
    use crate::error::{ErrorKind, OnboardingError};
    use crate::profile::ProfileStore;
    use crate::testing::{FakeGateway, MemoryProfileStore};
    use crate::{Onboarding, OnboardingConfig};

    fn onboarding() -> (
        Onboarding<FakeGateway, MemoryProfileStore>,
        FakeGateway,
        MemoryProfileStore,
    ) {
        let gateway = FakeGateway::new();
        let profiles = MemoryProfileStore::new();
        let onboarding = Onboarding::new(
            OnboardingConfig::default(),
            gateway.clone(),
            profiles.clone(),
        )
        .expect("valid config");
        (onboarding, gateway, profiles)
    }

    #[tokio::test]
    async fn register_creates_identity_and_profile() {
        let (onboarding, gateway, profiles) = onboarding();

        let registration = onboarding
            .register("Ada@Example.com", "SecurePass123", Some("Ada"))
            .await
            .expect("registration");

        // Email reached the provider normalized.
        assert_eq!(registration.identity.email, "ada@example.com");
        assert_eq!(registration.profile.uid, registration.identity.id);
        assert_eq!(profiles.write_count(), 1);

        // Exactly one verification email, sent by the provider itself.
        assert_eq!(gateway.send_calls(), 1);

        let stored = profiles
            .get(registration.identity.id)
            .await
            .expect("store read")
            .expect("profile exists");
        assert_eq!(stored.display_name.as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn register_rejects_invalid_email_locally() {
        let (onboarding, gateway, _profiles) = onboarding();

        let result = onboarding.register("not-an-email", "SecurePass123", None).await;
        assert_eq!(result.unwrap_err(), OnboardingError::InvalidEmail);
        assert_eq!(gateway.send_calls(), 0);
    }

    #[tokio::test]
    async fn register_rejects_weak_password_locally() {
        let (onboarding, gateway, _profiles) = onboarding();

        let result = onboarding.register("ada@example.com", "short", None).await;
        assert!(matches!(result, Err(OnboardingError::WeakPassword(_))));
        assert_eq!(gateway.send_calls(), 0);
    }

    #[tokio::test]
    async fn register_classifies_duplicate_email() {
        let (onboarding, _gateway, _profiles) = onboarding();

        onboarding
            .register("ada@example.com", "SecurePass123", None)
            .await
            .expect("first registration");
        let result = onboarding
            .register("ada@example.com", "SecurePass123", None)
            .await;

        assert_eq!(
            result.unwrap_err(),
            OnboardingError::Provider(ErrorKind::EmailInUse)
        );
    }

    #[tokio::test]
    async fn register_fails_when_profile_bootstrap_fails() {
        let (onboarding, _gateway, profiles) = onboarding();
        profiles.fail_next_put();

        let result = onboarding
            .register("ada@example.com", "SecurePass123", None)
            .await;

        assert!(matches!(result, Err(OnboardingError::ProfileStore(_))));
    }
}
