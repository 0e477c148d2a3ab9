//! Identity Service

use std::sync::Arc;

use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};
use mockall::automock;
use spareline::{
    cart,
    identity::{self, AnonymousVisitor, AuthenticatedUser, Identity, Owner, Resolution, Role},
    phone,
    uuids::{AnonymousUuid, UserUuid},
};
use sqlx::{Postgres, Transaction};
use tracing::{Span, debug, info, warn};

use crate::{
    database::Db,
    domain::{
        carts::repositories::{PgCartItemsRepository, PgCartsRepository},
        favorites::repository::PgFavoritesRepository,
        identity::{
            IdentityServiceError,
            otp::{self, OtpDelivery},
            records::{
                IdentitySettings, IssuedSession, OtpChallenge, ResolvedIdentity, SessionUuid,
                UserRecord,
            },
            repositories::{
                PgAnonymousUsersRepository, PgOtpCodesRepository, PgSessionsRepository,
                PgUsersRepository,
            },
            tokens::{TokenKind, format_token, generate_secret, parse_token},
        },
    },
};

#[derive(Clone)]
pub struct PgIdentityService {
    db: Db,
    settings: IdentitySettings,
    delivery: Arc<dyn OtpDelivery>,
    anonymous: PgAnonymousUsersRepository,
    users: PgUsersRepository,
    sessions: PgSessionsRepository,
    otp_codes: PgOtpCodesRepository,
    carts: PgCartsRepository,
    cart_items: PgCartItemsRepository,
    favorites: PgFavoritesRepository,
}

impl std::fmt::Debug for PgIdentityService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgIdentityService")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

fn expiry(now: Timestamp, ttl: SignedDuration) -> Result<Timestamp, IdentityServiceError> {
    now.checked_add(ttl).map_err(IdentityServiceError::Lifetime)
}

fn is_code_shaped(code: &str) -> bool {
    code.len() == otp::OTP_DIGITS && code.chars().all(|c| c.is_ascii_digit())
}

impl PgIdentityService {
    #[must_use]
    pub fn new(db: Db, settings: IdentitySettings, delivery: Arc<dyn OtpDelivery>) -> Self {
        Self {
            db,
            settings,
            delivery,
            anonymous: PgAnonymousUsersRepository::new(),
            users: PgUsersRepository::new(),
            sessions: PgSessionsRepository::new(),
            otp_codes: PgOtpCodesRepository::new(),
            carts: PgCartsRepository::new(),
            cart_items: PgCartItemsRepository::new(),
            favorites: PgFavoritesRepository::new(),
        }
    }

    /// The signed-in user behind `token`, if the session is live.
    async fn verify_session(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        token: &str,
        now: Timestamp,
    ) -> Result<Option<AuthenticatedUser>, IdentityServiceError> {
        let Ok(parsed) = parse_token(TokenKind::Session, token) else {
            debug!("ignoring malformed session token");
            return Ok(None);
        };

        let uuid = SessionUuid::from_uuid(parsed.uuid);

        let Some(session) = self.sessions.find_active(tx, uuid, now).await? else {
            return Ok(None);
        };

        if session.token_hash != parsed.secret.digest() {
            return Ok(None);
        }

        self.sessions.touch(tx, uuid, now).await?;

        Ok(Some(session.user))
    }

    /// The anonymous visitor behind `token`, unless it is unknown, expired or retired.
    async fn verify_anonymous(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        token: &str,
        now: Timestamp,
    ) -> Result<Option<AnonymousVisitor>, IdentityServiceError> {
        let Ok(parsed) = parse_token(TokenKind::Anonymous, token) else {
            debug!("ignoring malformed anonymous token");
            return Ok(None);
        };

        let uuid = AnonymousUuid::from_uuid(parsed.uuid);

        let Some(record) = self.anonymous.find(tx, uuid).await? else {
            return Ok(None);
        };

        let valid = record.retired_at.is_none()
            && record.expires_at > now
            && record.token_hash == parsed.secret.digest();

        Ok(valid.then_some(AnonymousVisitor { uuid }))
    }

    async fn issue_anonymous(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        now: Timestamp,
    ) -> Result<(AnonymousVisitor, String), IdentityServiceError> {
        let uuid = AnonymousUuid::new();
        let secret = generate_secret();
        let expires_at = expiry(now, self.settings.anonymous_token_ttl)?;

        self.anonymous
            .create(tx, uuid, &secret.digest(), expires_at)
            .await?;

        let token = format_token(TokenKind::Anonymous, uuid.into_uuid(), &secret);

        Ok((AnonymousVisitor { uuid }, token))
    }

    /// Move the anonymous cart and favorites over to `user` and retire the visitor.
    ///
    /// Returns `false` when the visitor was already retired.
    async fn merge_anonymous(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        anonymous: AnonymousUuid,
        user: UserUuid,
        now: Timestamp,
    ) -> Result<bool, IdentityServiceError> {
        let Some(visitor) = self.anonymous.lock(tx, anonymous).await? else {
            return Ok(false);
        };

        if visitor.retired_at.is_some() {
            return Ok(false);
        }

        if let Some(source) = self.carts.lock(tx, Owner::Anonymous(anonymous)).await? {
            match self.carts.lock(tx, Owner::User(user)).await? {
                None => self.carts.reassign(tx, source.uuid, user).await?,
                Some(target) => {
                    let target_lines = self.cart_items.quantities(tx, target.uuid).await?;
                    let source_lines = self.cart_items.quantities(tx, source.uuid).await?;

                    let merged = cart::merge_lines(&target_lines, &source_lines);

                    for (key, quantity) in merged {
                        self.cart_items.put(tx, target.uuid, key, quantity).await?;
                    }

                    if target.promo_code.is_none() && source.promo_code.is_some() {
                        self.carts
                            .set_promo_code(tx, target.uuid, source.promo_code.as_deref())
                            .await?;
                    }

                    self.carts.delete(tx, source.uuid).await?;
                }
            }
        }

        let favorites = self.favorites.merge(tx, anonymous, user).await?;

        let retired = self.anonymous.retire(tx, anonymous, user, now).await?;

        debug!(favorites, "merged anonymous favorites");

        Ok(retired)
    }
}

#[async_trait]
impl IdentityService for PgIdentityService {
    #[tracing::instrument(
        name = "identity.service.resolve",
        skip(self, session_token, anonymous_token),
        fields(
            identity = tracing::field::Empty,
            has_session_token = session_token.is_some(),
            has_anonymous_token = anonymous_token.is_some()
        ),
        err
    )]
    async fn resolve(
        &self,
        session_token: Option<String>,
        anonymous_token: Option<String>,
    ) -> Result<ResolvedIdentity, IdentityServiceError> {
        let now = Timestamp::now();

        let mut tx = self.db.begin().await?;

        let session = match session_token.as_deref() {
            Some(token) => self.verify_session(&mut tx, token, now).await?,
            None => None,
        };

        // a live session makes the anonymous token irrelevant
        let anonymous = match (&session, anonymous_token.as_deref()) {
            (None, Some(token)) => self.verify_anonymous(&mut tx, token, now).await?,
            _ => None,
        };

        let resolved = match identity::resolve(session, anonymous) {
            Resolution::Resolved(identity) => ResolvedIdentity {
                identity,
                issued_anonymous_token: None,
            },
            Resolution::IssueAnonymous => {
                let (visitor, token) = self.issue_anonymous(&mut tx, now).await?;

                info!(anonymous_uuid = %visitor.uuid, "issued anonymous identity");

                ResolvedIdentity {
                    identity: Identity::Anonymous(visitor),
                    issued_anonymous_token: Some(token),
                }
            }
        };

        tx.commit().await?;

        let kind = match &resolved.identity {
            Identity::Authenticated(_) => "user",
            Identity::Anonymous(_) => "anonymous",
        };

        Span::current().record("identity", kind);

        Ok(resolved)
    }

    #[tracing::instrument(
        name = "identity.service.send_otp",
        skip(self, phone),
        fields(phone = tracing::field::Empty),
        err
    )]
    async fn send_otp(&self, phone: String) -> Result<OtpChallenge, IdentityServiceError> {
        let phone = phone::normalize(&phone)?;
        let now = Timestamp::now();

        Span::current().record("phone", tracing::field::display(&phone));

        let code = otp::generate_code();
        let expires_at = expiry(now, self.settings.otp_ttl)?;

        let mut tx = self.db.begin().await?;

        self.otp_codes
            .replace(&mut tx, &phone, &otp::code_digest(&phone, &code), now, expires_at)
            .await?;

        tx.commit().await?;

        self.delivery.deliver(&phone, &code).await;

        Ok(OtpChallenge { phone, expires_at })
    }

    #[tracing::instrument(
        name = "identity.service.verify_otp",
        skip(self, phone, code, identity),
        fields(
            phone = tracing::field::Empty,
            user_uuid = tracing::field::Empty,
            merged_anonymous = tracing::field::Empty
        ),
        err
    )]
    async fn verify_otp(
        &self,
        phone: String,
        code: String,
        identity: Identity,
    ) -> Result<IssuedSession, IdentityServiceError> {
        let phone = phone::normalize(&phone)?;
        let code = code.trim();
        let now = Timestamp::now();

        let span = Span::current();

        span.record("phone", tracing::field::display(&phone));

        let mut tx = self.db.begin().await?;

        let challenge = self
            .otp_codes
            .lock_latest(&mut tx, &phone, now)
            .await?
            .ok_or(IdentityServiceError::InvalidCode)?;

        if challenge.attempts >= self.settings.otp_max_attempts {
            return Err(IdentityServiceError::TooManyAttempts);
        }

        if !is_code_shaped(code) || challenge.code_hash != otp::code_digest(&phone, code) {
            self.otp_codes.record_attempt(&mut tx, challenge.uuid).await?;

            // the failed attempt must count even though the call fails
            tx.commit().await?;

            warn!(attempts = challenge.attempts + 1, "login code mismatch");

            return Err(IdentityServiceError::InvalidCode);
        }

        self.otp_codes.consume(&mut tx, challenge.uuid, now).await?;

        let user = self.users.find_or_create(&mut tx, &phone, None).await?;

        span.record("user_uuid", tracing::field::display(user.uuid));

        let session_uuid = SessionUuid::new();
        let secret = generate_secret();
        let expires_at = expiry(now, self.settings.session_ttl)?;

        self.sessions
            .create(&mut tx, session_uuid, user.uuid, &secret.digest(), expires_at)
            .await?;

        let merged_anonymous = match identity {
            Identity::Anonymous(visitor) => {
                self.merge_anonymous(&mut tx, visitor.uuid, user.uuid, now)
                    .await?
            }
            Identity::Authenticated(_) => false,
        };

        span.record("merged_anonymous", merged_anonymous);

        tx.commit().await?;

        info!(user_uuid = %user.uuid, merged_anonymous, "issued session");

        Ok(IssuedSession {
            token: format_token(TokenKind::Session, session_uuid.into_uuid(), &secret),
            expires_at,
            user: user.authenticated(),
            merged_anonymous,
        })
    }

    #[tracing::instrument(
        name = "identity.service.set_role",
        skip(self, phone),
        fields(phone = tracing::field::Empty, role = role.as_str()),
        err
    )]
    async fn set_role(&self, phone: String, role: Role) -> Result<UserRecord, IdentityServiceError> {
        let phone = phone::normalize(&phone)?;

        Span::current().record("phone", tracing::field::display(&phone));

        let mut tx = self.db.begin().await?;

        let user = self.users.set_role(&mut tx, &phone, role).await?;

        tx.commit().await?;

        info!(user_uuid = %user.uuid, role = role.as_str(), "changed user role");

        Ok(user)
    }
}

#[automock]
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Resolve the request identity from its presented tokens.
    ///
    /// Invalid tokens are ignored. When nothing valid is presented a new anonymous
    /// identity is issued and its token returned with the result.
    async fn resolve(
        &self,
        session_token: Option<String>,
        anonymous_token: Option<String>,
    ) -> Result<ResolvedIdentity, IdentityServiceError>;

    /// Send a one-time login code to `phone`.
    async fn send_otp(&self, phone: String) -> Result<OtpChallenge, IdentityServiceError>;

    /// Check a login code and open a session, merging the anonymous identity's cart
    /// and favorites into the user.
    async fn verify_otp(
        &self,
        phone: String,
        code: String,
        identity: Identity,
    ) -> Result<IssuedSession, IdentityServiceError>;

    async fn set_role(&self, phone: String, role: Role) -> Result<UserRecord, IdentityServiceError>;
}
