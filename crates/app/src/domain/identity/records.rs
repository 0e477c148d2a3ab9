//! Identity Records

use jiff::{SignedDuration, Timestamp};
use spareline::{
    identity::{AuthenticatedUser, Identity, Role},
    uuids::{AnonymousUuid, TypedUuid, UserUuid},
};

/// Session UUID
pub type SessionUuid = TypedUuid<SessionRecord>;

/// OTP code UUID
pub type OtpCodeUuid = TypedUuid<OtpCodeRecord>;

/// Token lifetimes and OTP limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentitySettings {
    pub anonymous_token_ttl: SignedDuration,
    pub session_ttl: SignedDuration,
    pub otp_ttl: SignedDuration,
    pub otp_max_attempts: u32,
}

impl Default for IdentitySettings {
    fn default() -> Self {
        Self {
            anonymous_token_ttl: SignedDuration::from_hours(365 * 24),
            session_ttl: SignedDuration::from_hours(30 * 24),
            otp_ttl: SignedDuration::from_secs(300),
            otp_max_attempts: 5,
        }
    }
}

/// User Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub uuid: UserUuid,
    pub phone: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Role,
    pub created_at: Timestamp,
}

impl UserRecord {
    #[must_use]
    pub fn authenticated(&self) -> AuthenticatedUser {
        AuthenticatedUser {
            uuid: self.uuid,
            phone: self.phone.clone(),
            role: self.role,
        }
    }
}

/// Anonymous User Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnonymousUserRecord {
    pub uuid: AnonymousUuid,
    pub token_hash: String,
    pub expires_at: Timestamp,
    pub retired_at: Option<Timestamp>,
    pub merged_into_user_uuid: Option<UserUuid>,
}

/// Session Record, joined with its user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub uuid: SessionUuid,
    pub token_hash: String,
    pub expires_at: Timestamp,
    pub user: AuthenticatedUser,
}

/// OTP Code Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpCodeRecord {
    pub uuid: OtpCodeUuid,
    pub phone: String,
    pub code_hash: String,
    pub attempts: u32,
    pub expires_at: Timestamp,
}

/// A resolved request identity, with the token to hand back when one was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub identity: Identity,
    pub issued_anonymous_token: Option<String>,
}

/// Sent login code details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpChallenge {
    pub phone: String,
    pub expires_at: Timestamp,
}

/// A new session, with the one-time raw token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: Timestamp,
    pub user: AuthenticatedUser,
    pub merged_anonymous: bool,
}
