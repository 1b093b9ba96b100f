//! Local password policy checks.
//!
//! Hashing and credential storage belong to the identity provider; this
//! module only rejects obviously weak passwords before a provider
//! round-trip is spent on them.

use crate::{config::OnboardingConfig, error::OnboardingError};

/// Validate password strength based on configuration
pub fn password_validate(password: &str, config: &OnboardingConfig) -> Result<(), OnboardingError> {
    if password.len() < config.password_min_length {
        return Err(OnboardingError::WeakPassword(format!(
            "Password must be at least {} characters",
            config.password_min_length
        )));
    }

    if password.len() > config.password_max_length {
        return Err(OnboardingError::WeakPassword(format!(
            "Password must not exceed {} characters",
            config.password_max_length
        )));
    }

    if config.password_require_letter && !password.chars().any(|c| c.is_alphabetic()) {
        return Err(OnboardingError::WeakPassword(
            "Password must contain at least one letter".to_string(),
        ));
    }

    if config.password_require_number && !password.chars().any(|c| c.is_numeric()) {
        return Err(OnboardingError::WeakPassword(
            "Password must contain at least one number".to_string(),
        ));
    }

    Ok(())
}
