use std::time::Duration;
use thiserror::Error;

/// Errors when loading or validating onboarding configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Configuration failed validation checks.
    #[error("invalid onboarding config: {0}")]
    Invalid(String),
}

/// Onboarding configuration
#[derive(Debug, Clone)]
pub struct OnboardingConfig {
    /// Pause enforced between accepted resend requests (default: 60 seconds)
    pub resend_cooldown: Duration,

    /// Verification emails allowed per controller lifetime (default: 5)
    pub max_resend_attempts: u32,

    /// Period of the confirmation auto-poll (default: 3 seconds)
    pub poll_interval: Duration,

    /// Minimum password length (default: 8)
    pub password_min_length: usize,

    /// Maximum password length (default: 128)
    pub password_max_length: usize,

    /// Whether passwords must contain at least one letter (default: true)
    pub password_require_letter: bool,

    /// Whether passwords must contain at least one number (default: true)
    pub password_require_number: bool,
}

impl Default for OnboardingConfig {
    fn default() -> Self {
        Self {
            resend_cooldown: Duration::from_secs(60),
            max_resend_attempts: 5,
            poll_interval: Duration::from_secs(3),
            password_min_length: 8,
            password_max_length: 128,
            password_require_letter: true,
            password_require_number: true,
        }
    }
}

impl OnboardingConfig {
    /// Build onboarding config from environment variables.
    ///
    /// Recognized variables, all optional with `Default` fallbacks:
    /// - `ONBOARDING_RESEND_COOLDOWN_SECS`
    /// - `ONBOARDING_MAX_RESEND_ATTEMPTS`
    /// - `ONBOARDING_POLL_INTERVAL_SECS`
    /// - `ONBOARDING_PASSWORD_MIN_LENGTH`
    /// - `ONBOARDING_PASSWORD_MAX_LENGTH`
    /// - `ONBOARDING_PASSWORD_REQUIRE_LETTER`
    /// - `ONBOARDING_PASSWORD_REQUIRE_NUMBER`
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        cfg.resend_cooldown = Duration::from_secs(env_var_parse_or_default(
            "ONBOARDING_RESEND_COOLDOWN_SECS",
            cfg.resend_cooldown.as_secs(),
            "u64",
        )?);
        cfg.max_resend_attempts = env_var_parse_or_default(
            "ONBOARDING_MAX_RESEND_ATTEMPTS",
            cfg.max_resend_attempts,
            "u32",
        )?;
        cfg.poll_interval = Duration::from_secs(env_var_parse_or_default(
            "ONBOARDING_POLL_INTERVAL_SECS",
            cfg.poll_interval.as_secs(),
            "u64",
        )?);
        cfg.password_min_length = env_var_parse_or_default(
            "ONBOARDING_PASSWORD_MIN_LENGTH",
            cfg.password_min_length,
            "usize",
        )?;
        cfg.password_max_length = env_var_parse_or_default(
            "ONBOARDING_PASSWORD_MAX_LENGTH",
            cfg.password_max_length,
            "usize",
        )?;
        cfg.password_require_letter = env_var_bool_or_default(
            "ONBOARDING_PASSWORD_REQUIRE_LETTER",
            cfg.password_require_letter,
        )?;
        cfg.password_require_number = env_var_bool_or_default(
            "ONBOARDING_PASSWORD_REQUIRE_NUMBER",
            cfg.password_require_number,
        )?;

        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval.as_secs() == 0 {
            return Err(ConfigError::Invalid(
                "Poll interval must be greater than 0".to_string(),
            ));
        }

        if self.max_resend_attempts == 0 {
            return Err(ConfigError::Invalid(
                "Max resend attempts must be greater than 0".to_string(),
            ));
        }

        if self.password_min_length == 0 {
            return Err(ConfigError::Invalid(
                "Minimum password length must be greater than 0".to_string(),
            ));
        }

        if self.password_max_length < self.password_min_length {
            return Err(ConfigError::Invalid(
                "Maximum password length must be greater than or equal to minimum password length"
                    .to_string(),
            ));
        }

        Ok(())
    }
}

fn env_var_optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_var_parse_or_default<T: std::str::FromStr>(
    key: &str,
    default: T,
    type_name: &str,
) -> Result<T, ConfigError> {
    match env_var_optional(key) {
        Some(v) => v
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid(format!("{key} must be a valid {type_name}"))),
        _ => Ok(default),
    }
}

fn env_var_bool_or_default(key: &str, default: bool) -> Result<bool, ConfigError> {
    match env_var_optional(key) {
        Some(v) => match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid(format!(
                "{key} must be a valid boolean"
            ))),
        },
        _ => Ok(default),
    }
}
