//! Identity Config

use clap::Args;
use jiff::SignedDuration;

use spareline_app::domain::identity::records::IdentitySettings;

/// Token lifetimes and login code limits.
#[derive(Debug, Args)]
pub struct IdentityConfig {
    /// Lifetime of anonymous visitor tokens, in days
    #[arg(long, env = "ANONYMOUS_TOKEN_TTL_DAYS", default_value_t = 365)]
    pub anonymous_token_ttl_days: u32,

    /// Lifetime of sessions, in days
    #[arg(long, env = "SESSION_TTL_DAYS", default_value_t = 30)]
    pub session_ttl_days: u32,

    /// Lifetime of login codes, in seconds
    #[arg(long, env = "OTP_TTL_SECONDS", default_value_t = 300)]
    pub otp_ttl_seconds: u32,

    /// Wrong guesses allowed per login code
    #[arg(long, env = "OTP_MAX_ATTEMPTS", default_value_t = 5)]
    pub otp_max_attempts: u32,
}

impl IdentityConfig {
    /// Settings for the identity service.
    #[must_use]
    pub fn settings(&self) -> IdentitySettings {
        IdentitySettings {
            anonymous_token_ttl: days(self.anonymous_token_ttl_days),
            session_ttl: days(self.session_ttl_days),
            otp_ttl: SignedDuration::from_secs(i64::from(self.otp_ttl_seconds)),
            otp_max_attempts: self.otp_max_attempts,
        }
    }
}

fn days(days: u32) -> SignedDuration {
    SignedDuration::from_hours(i64::from(days) * 24)
}
