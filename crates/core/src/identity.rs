//! Identities
//!
//! A request is served on behalf of exactly one identity: an authenticated user or an
//! anonymous visitor. Carts and favorites are owned by one of the two, never both.

use std::{fmt, str::FromStr};

use thiserror::Error;

use crate::uuids::{AnonymousUuid, UserUuid};

/// Role of an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Storefront customer.
    Customer,

    /// Sales manager: offers, manager orders, order statuses.
    Manager,

    /// Administrator: everything a manager can do.
    Admin,
}

/// Unknown role name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl Role {
    /// Database and wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Manager => "manager",
            Self::Admin => "admin",
        }
    }

    /// Whether the role may use back-office operations.
    #[must_use]
    pub const fn is_staff(self) -> bool {
        matches!(self, Self::Manager | Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "customer" => Ok(Self::Customer),
            "manager" => Ok(Self::Manager),
            "admin" => Ok(Self::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// A user proven by a valid session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// User identifier
    pub uuid: UserUuid,

    /// Normalised phone number
    pub phone: String,

    /// Role
    pub role: Role,
}

/// A visitor known only by an anonymous token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnonymousVisitor {
    /// Anonymous identifier
    pub uuid: AnonymousUuid,
}

/// The resolved actor behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// Signed-in user.
    Authenticated(AuthenticatedUser),

    /// Anonymous visitor.
    Anonymous(AnonymousVisitor),
}

impl Identity {
    /// Owner of the aggregates this identity reads and writes.
    #[must_use]
    pub fn owner(&self) -> Owner {
        match self {
            Self::Authenticated(user) => Owner::User(user.uuid),
            Self::Anonymous(visitor) => Owner::Anonymous(visitor.uuid),
        }
    }

    /// The authenticated user, if any.
    #[must_use]
    pub fn user(&self) -> Option<&AuthenticatedUser> {
        match self {
            Self::Authenticated(user) => Some(user),
            Self::Anonymous(_) => None,
        }
    }

    /// The authenticated user when they hold a staff role.
    #[must_use]
    pub fn staff(&self) -> Option<&AuthenticatedUser> {
        self.user().filter(|user| user.role.is_staff())
    }
}

/// Owner of a cart or favorites list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Owner {
    /// Owned by a registered user.
    User(UserUuid),

    /// Owned by an anonymous visitor.
    Anonymous(AnonymousUuid),
}

impl Owner {
    /// The user part, for binding the `user_uuid` column.
    #[must_use]
    pub const fn user_uuid(self) -> Option<UserUuid> {
        match self {
            Self::User(uuid) => Some(uuid),
            Self::Anonymous(_) => None,
        }
    }

    /// The anonymous part, for binding the `anonymous_uuid` column.
    #[must_use]
    pub const fn anonymous_uuid(self) -> Option<AnonymousUuid> {
        match self {
            Self::User(_) => None,
            Self::Anonymous(uuid) => Some(uuid),
        }
    }
}

impl From<UserUuid> for Owner {
    fn from(value: UserUuid) -> Self {
        Self::User(value)
    }
}

impl From<AnonymousUuid> for Owner {
    fn from(value: AnonymousUuid) -> Self {
        Self::Anonymous(value)
    }
}

/// Outcome of checking a request's credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Use this identity.
    Resolved(Identity),

    /// Nothing valid was presented; a fresh anonymous identity must be issued.
    IssueAnonymous,
}

/// Pick the identity for a request.
///
/// `session` and `anonymous` are the results of verifying the presented tokens; an
/// invalid token arrives here as `None`. A valid session always wins.
#[must_use]
pub fn resolve(
    session: Option<AuthenticatedUser>,
    anonymous: Option<AnonymousVisitor>,
) -> Resolution {
    match (session, anonymous) {
        (Some(user), _) => Resolution::Resolved(Identity::Authenticated(user)),
        (None, Some(visitor)) => Resolution::Resolved(Identity::Anonymous(visitor)),
        (None, None) => Resolution::IssueAnonymous,
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn user(role: Role) -> AuthenticatedUser {
        AuthenticatedUser {
            uuid: UserUuid::new(),
            phone: "+79990001122".to_string(),
            role,
        }
    }

    #[test]
    fn session_wins_over_anonymous_token() {
        let user = user(Role::Customer);
        let visitor = AnonymousVisitor {
            uuid: AnonymousUuid::new(),
        };

        let resolution = resolve(Some(user.clone()), Some(visitor));

        assert_eq!(
            resolution,
            Resolution::Resolved(Identity::Authenticated(user))
        );
    }

    #[test]
    fn anonymous_token_is_used_without_session() {
        let visitor = AnonymousVisitor {
            uuid: AnonymousUuid::new(),
        };

        assert_eq!(
            resolve(None, Some(visitor)),
            Resolution::Resolved(Identity::Anonymous(visitor))
        );
    }

    #[test]
    fn nothing_valid_issues_anonymous_identity() {
        assert_eq!(resolve(None, None), Resolution::IssueAnonymous);
    }

    #[test]
    fn owner_follows_identity() {
        let customer = user(Role::Customer);
        let uuid = customer.uuid;
        let identity = Identity::Authenticated(customer);

        assert_eq!(identity.owner(), Owner::User(uuid));
        assert_eq!(identity.owner().user_uuid(), Some(uuid));
        assert_eq!(identity.owner().anonymous_uuid(), None);
        assert!(identity.staff().is_none(), "customers are not staff");
    }

    #[test]
    fn staff_roles() -> TestResult {
        assert!(Identity::Authenticated(user(Role::Manager)).staff().is_some());
        assert!(Identity::Authenticated(user(Role::Admin)).staff().is_some());
        assert_eq!("manager".parse::<Role>()?, Role::Manager);
        assert!("root".parse::<Role>().is_err());

        Ok(())
    }
}
