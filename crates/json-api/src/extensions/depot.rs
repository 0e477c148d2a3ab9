//! Depot helper extensions.

use std::any::Any;

use salvo::prelude::{Depot, StatusError};
use spareline::identity::{AuthenticatedUser, Identity};

/// Typed access to what the hoops put in the depot.
pub(crate) trait DepotExt {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, StatusError>;

    fn insert_identity(&mut self, identity: Identity);

    /// The resolved request identity.
    fn identity_or_500(&self) -> Result<&Identity, StatusError>;

    /// The signed-in user, or 401 for anonymous visitors.
    fn user_or_401(&self) -> Result<&AuthenticatedUser, StatusError>;

    /// The signed-in staff member: 401 for anonymous visitors, 403 for customers.
    fn staff_or_403(&self) -> Result<&AuthenticatedUser, StatusError>;
}

impl DepotExt for Depot {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, StatusError> {
        self.obtain::<T>()
            .map_err(|_ignored| StatusError::internal_server_error())
    }

    fn insert_identity(&mut self, identity: Identity) {
        self.inject(identity);
    }

    fn identity_or_500(&self) -> Result<&Identity, StatusError> {
        self.obtain_or_500::<Identity>()
    }

    fn user_or_401(&self) -> Result<&AuthenticatedUser, StatusError> {
        self.identity_or_500()?
            .user()
            .ok_or_else(|| StatusError::unauthorized().brief("Sign in required"))
    }

    fn staff_or_403(&self) -> Result<&AuthenticatedUser, StatusError> {
        let user = self.user_or_401()?;

        if user.role.is_staff() {
            Ok(user)
        } else {
            Err(StatusError::forbidden().brief("Managers only"))
        }
    }
}
