//! Offers
//!
//! An offer is a one-off listing a manager creates while negotiating with a customer.
//! It is purchasable while active and ends through expiry, deactivation, cancellation
//! or being consumed by an order.

use jiff::Timestamp;
use thiserror::Error;

use crate::{
    cart::Availability,
    errors::{ValidationError, optional_text, required_text},
    identity::{AuthenticatedUser, Role},
    uuids::{ProductUuid, UserUuid},
};

const NAME_MAX: usize = 200;
const DESCRIPTION_MAX: usize = 2_000;

/// Lifecycle flags of an offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OfferState {
    /// Manager-controlled switch.
    pub is_active: bool,

    /// Set once the offer is cancelled; never cleared.
    pub is_cancelled: bool,

    /// End of the purchase window.
    pub expires_at: Option<Timestamp>,

    /// Set when an order consumed the offer.
    pub consumed_at: Option<Timestamp>,
}

impl OfferState {
    /// Whether the offer may be carted or ordered at `now`.
    #[must_use]
    pub fn availability(&self, now: Timestamp) -> Availability {
        if self.is_cancelled {
            Availability::Cancelled
        } else if self.consumed_at.is_some() {
            Availability::Consumed
        } else if !self.is_active {
            Availability::Inactive
        } else if self.expires_at.is_some_and(|expires_at| expires_at <= now) {
            Availability::Expired
        } else {
            Availability::Available
        }
    }
}

/// Reasons a manager may not change an offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OfferChangeError {
    /// The offer belongs to another manager.
    #[error("offer belongs to another manager")]
    NotOwner,

    /// Cancelled and consumed offers are final.
    #[error("offer is {} and can no longer change", .0.as_str())]
    Closed(Availability),
}

/// Check that `actor` may update, deactivate or cancel an offer created by `owner`.
///
/// Admins may change any offer; managers only their own.
///
/// # Errors
///
/// Returns [`OfferChangeError`] when the change is not allowed.
pub fn check_change(
    actor: &AuthenticatedUser,
    owner: UserUuid,
    state: &OfferState,
) -> Result<(), OfferChangeError> {
    if actor.role != Role::Admin && actor.uuid != owner {
        return Err(OfferChangeError::NotOwner);
    }

    if state.is_cancelled {
        return Err(OfferChangeError::Closed(Availability::Cancelled));
    }

    if state.consumed_at.is_some() {
        return Err(OfferChangeError::Closed(Availability::Consumed));
    }

    Ok(())
}

/// Offer fields a manager supplies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOffer {
    /// Catalog product the offer is based on, if any.
    pub product: Option<ProductUuid>,

    /// Customer the offer is negotiated with, if any.
    pub customer: Option<UserUuid>,

    /// Display name.
    pub name: String,

    /// Free-form description.
    pub description: Option<String>,

    /// Price in kopecks.
    pub price: u64,

    /// Crossed-out reference price in kopecks.
    pub old_price: Option<u64>,

    /// Promised delivery time in days.
    pub delivery_days: Option<u32>,

    /// Genuine manufacturer part.
    pub is_original: bool,

    /// Aftermarket replacement part.
    pub is_analog: bool,

    /// End of the purchase window.
    pub expires_at: Option<Timestamp>,
}

impl NewOffer {
    /// Normalise and check every field.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found, field by field.
    pub fn validate(self, now: Timestamp) -> Result<Self, ValidationError> {
        let name = required_text("name", &self.name, NAME_MAX)?;
        let description = optional_text("description", self.description.as_deref(), DESCRIPTION_MAX)?;

        if self.price == 0 {
            return Err(ValidationError::NotPositive { field: "price" });
        }

        if self.old_price == Some(0) {
            return Err(ValidationError::NotPositive { field: "old_price" });
        }

        if self.is_original && self.is_analog {
            return Err(ValidationError::OriginalAndAnalog);
        }

        if self.expires_at.is_some_and(|expires_at| expires_at <= now) {
            return Err(ValidationError::NotInFuture {
                field: "expires_at",
            });
        }

        Ok(Self {
            name,
            description,
            ..self
        })
    }
}

/// Partial update of an offer: every set field overrides the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OfferUpdate {
    /// New display name.
    pub name: Option<String>,

    /// New description.
    pub description: Option<String>,

    /// New price in kopecks.
    pub price: Option<u64>,

    /// New reference price in kopecks.
    pub old_price: Option<u64>,

    /// New delivery time in days.
    pub delivery_days: Option<u32>,

    /// New original flag.
    pub is_original: Option<bool>,

    /// New analog flag.
    pub is_analog: Option<bool>,

    /// New end of the purchase window.
    pub expires_at: Option<Timestamp>,
}

impl OfferUpdate {
    /// Overlay this update on `current` and validate the result.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] of the merged offer.
    pub fn apply(self, current: NewOffer, now: Timestamp) -> Result<NewOffer, ValidationError> {
        NewOffer {
            product: current.product,
            customer: current.customer,
            name: self.name.unwrap_or(current.name),
            description: self.description.or(current.description),
            price: self.price.unwrap_or(current.price),
            old_price: self.old_price.or(current.old_price),
            delivery_days: self.delivery_days.or(current.delivery_days),
            is_original: self.is_original.unwrap_or(current.is_original),
            is_analog: self.is_analog.unwrap_or(current.is_analog),
            expires_at: self.expires_at.or(current.expires_at),
        }
        .validate(now)
    }
}
