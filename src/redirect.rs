//! Post-authentication destination decision.

use crate::{gateway::Identity, profile::ProfileRecord};

/// Navigation target chosen once the auth flow settles.
///
/// Performing the navigation is the caller's concern; this crate only picks
/// the destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// No identity: back to sign-in.
    SignIn,
    /// Signed in but unconfirmed: the verify-email screen.
    VerifyEmail,
    /// Confirmed but the profile is missing required fields.
    ProfileSetup,
    /// Everything settled, no pending intent.
    Home,
    /// The caller-supplied redirect intent.
    Custom(String),
}

/// Compute where the caller should navigate after an auth state change.
///
/// Pure function over its inputs. The checks form a strict priority chain
/// evaluated as a sequential short-circuit: a later destination is only
/// reachable when every earlier check passes, so no two destinations can
/// apply at once.
pub fn redirect_resolve(
    identity: Option<&Identity>,
    profile: Option<&ProfileRecord>,
    pending_intent: Option<&str>,
) -> Destination {
    let Some(identity) = identity else {
        return Destination::SignIn;
    };

    if !identity.email_confirmed {
        return Destination::VerifyEmail;
    }

    if !profile.is_some_and(ProfileRecord::is_complete) {
        return Destination::ProfileSetup;
    }

    if let Some(intent) = pending_intent {
        return Destination::Custom(intent.to_owned());
    }

    Destination::Home
}
