//! Error taxonomy and provider error classification.

use thiserror::Error;

/// Closed taxonomy of account and verification failures.
///
/// The `Display` text of each variant is the user-safe message; callers can
/// render it directly without ever exposing a provider-internal code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("An account with this email already exists")]
    EmailInUse,

    #[error("Password does not meet the security requirements")]
    WeakPassword,

    #[error("Email address is not valid")]
    InvalidEmail,

    #[error("No account found for this email")]
    UserNotFound,

    #[error("Incorrect password")]
    WrongPassword,

    #[error("This account has been disabled")]
    UserDisabled,

    #[error("Too many attempts, please try again later")]
    TooManyAttempts,

    #[error("Verification email limit reached, please try again later")]
    QuotaExceeded,

    #[error("Verification emails are not allowed from this domain")]
    DomainNotAuthorized,

    #[error("Network error, please check your connection and try again")]
    NetworkFailure,

    #[error("Please wait before requesting another verification email")]
    CooldownActive,

    #[error("No more verification emails can be sent for this session")]
    MaxAttemptsReached,

    #[error("No account is currently signed in")]
    NoActiveIdentity,

    #[error("Something went wrong, please try again")]
    Unknown,
}

impl ErrorKind {
    /// Map a provider error code onto the closed taxonomy.
    ///
    /// Total over all inputs: codes outside the mapping fold into
    /// [`ErrorKind::Unknown`]. Never panics.
    pub fn classify(code: &str) -> Self {
        match code {
            "auth/email-already-in-use" => Self::EmailInUse,
            "auth/weak-password" => Self::WeakPassword,
            "auth/invalid-email" => Self::InvalidEmail,
            "auth/user-not-found" => Self::UserNotFound,
            "auth/wrong-password" | "auth/invalid-credential" => Self::WrongPassword,
            "auth/user-disabled" => Self::UserDisabled,
            "auth/too-many-requests" => Self::TooManyAttempts,
            "auth/quota-exceeded" => Self::QuotaExceeded,
            "auth/unauthorized-domain" | "auth/unauthorized-continue-uri" => {
                Self::DomainNotAuthorized
            }
            "auth/network-request-failed" => Self::NetworkFailure,
            "auth/no-current-user" => Self::NoActiveIdentity,
            _ => Self::Unknown,
        }
    }
}

/// Raw failure reported by the identity provider.
///
/// Carries the provider-internal code verbatim; consumers classify it with
/// [`ProviderError::kind`] before showing anything to a user.
#[derive(Debug, Clone, Error)]
#[error("provider error {code}: {message}")]
pub struct ProviderError {
    /// Provider-internal error code (e.g. `auth/quota-exceeded`).
    pub code: String,
    /// Provider-internal diagnostic message. Not user-safe.
    pub message: String,
}

impl ProviderError {
    /// Create a provider error from a code and diagnostic message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Classify this error into the closed [`ErrorKind`] taxonomy.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::classify(&self.code)
    }
}

/// Errors surfaced by the registration, sign-in, and sign-out flows.
///
/// Provider failures arrive here already classified; the raw code is logged
/// at the conversion site and does not travel further.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OnboardingError {
    /// Local validation rejected the email before the provider was called.
    #[error("Email address is not valid")]
    InvalidEmail,

    /// Local validation rejected the password before the provider was called.
    #[error("Password too weak: {0}")]
    WeakPassword(String),

    /// Classified identity-provider failure.
    #[error("{0}")]
    Provider(ErrorKind),

    /// The profile store failed. Fatal during registration: an identity
    /// without a profile record is not a state the rest of the system can
    /// reason about.
    #[error("profile store error: {0}")]
    ProfileStore(String),
}

impl OnboardingError {
    /// Wrap a profile store error, logging the original for operators.
    pub(crate) fn store<E: std::error::Error>(err: E) -> Self {
        tracing::error!(error = %err, "profile store operation failed");
        Self::ProfileStore(err.to_string())
    }
}

impl From<ProviderError> for OnboardingError {
    fn from(err: ProviderError) -> Self {
        tracing::debug!(code = %err.code, "classifying provider error");
        Self::Provider(err.kind())
    }
}
