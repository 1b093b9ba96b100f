//! Email validation and normalization.

use crate::error::OnboardingError;
use email_address::EmailAddress;
use std::str::FromStr;

/// Validate and normalize an email address before it reaches the provider.
///
/// - Trims whitespace
/// - Validates RFC 5322 compliance
/// - Lowercases the address for consistent lookups
///
/// Returns the normalized email string, or [`OnboardingError::InvalidEmail`].
pub fn email_normalize(email: &str) -> Result<String, OnboardingError> {
    let trimmed = email.trim();

    let parsed = EmailAddress::from_str(trimmed).map_err(|_| OnboardingError::InvalidEmail)?;

    // Only the domain is case-insensitive per RFC, but providers treat the
    // local part the same way, so lowercase the whole address.
    Ok(parsed.as_str().to_lowercase())
}
