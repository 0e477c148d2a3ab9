//! Typed Uuids

use std::{
    cmp::Ordering,
    fmt::{Debug, Display, Formatter, Result as FmtResult},
    hash::{Hash, Hasher},
    marker::PhantomData,
};

use uuid::Uuid;

/// A [`Uuid`] tagged with the kind of entity it identifies.
pub struct TypedUuid<T>(Uuid, PhantomData<T>);

impl<T> TypedUuid<T> {
    /// Generate a new time-ordered (v7) identifier.
    #[must_use]
    pub fn new() -> Self {
        Self::from_uuid(Uuid::now_v7())
    }

    /// Wrap an existing [`Uuid`].
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid, PhantomData)
    }

    /// Unwrap into the raw [`Uuid`].
    #[must_use]
    pub const fn into_uuid(self) -> Uuid {
        self.0
    }
}

impl<T> Default for TypedUuid<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for TypedUuid<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for TypedUuid<T> {}

impl<T> Debug for TypedUuid<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Debug::fmt(&self.0, f)
    }
}

impl<T> Display for TypedUuid<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.0, f)
    }
}

impl<T> PartialEq for TypedUuid<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T> Eq for TypedUuid<T> {}

impl<T> Hash for TypedUuid<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<T> PartialOrd for TypedUuid<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for TypedUuid<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl<T> From<Uuid> for TypedUuid<T> {
    fn from(value: Uuid) -> Self {
        Self::from_uuid(value)
    }
}

impl<T> From<TypedUuid<T>> for Uuid {
    fn from(value: TypedUuid<T>) -> Self {
        value.into_uuid()
    }
}

/// Catalog product
#[derive(Debug)]
pub enum Product {}

/// Manager-created offer
#[derive(Debug)]
pub enum Offer {}

/// Registered user
#[derive(Debug)]
pub enum User {}

/// Anonymous visitor
#[derive(Debug)]
pub enum Anonymous {}

/// Catalog category
#[derive(Debug)]
pub enum Category {}

/// Catalog brand
#[derive(Debug)]
pub enum Brand {}

/// Filterable product attribute
#[derive(Debug)]
pub enum Attribute {}

/// Selectable attribute option
#[derive(Debug)]
pub enum AttributeOption {}

/// Promo code
#[derive(Debug)]
pub enum PromoCode {}

/// Delivery method
#[derive(Debug)]
pub enum DeliveryMethod {}

/// Payment method
#[derive(Debug)]
pub enum PaymentMethod {}

/// Order status
#[derive(Debug)]
pub enum OrderStatus {}

/// Product UUID
pub type ProductUuid = TypedUuid<Product>;

/// Offer UUID
pub type OfferUuid = TypedUuid<Offer>;

/// User UUID
pub type UserUuid = TypedUuid<User>;

/// Anonymous visitor UUID
pub type AnonymousUuid = TypedUuid<Anonymous>;

/// Category UUID
pub type CategoryUuid = TypedUuid<Category>;

/// Brand UUID
pub type BrandUuid = TypedUuid<Brand>;

/// Attribute UUID
pub type AttributeUuid = TypedUuid<Attribute>;

/// Attribute option UUID
pub type AttributeOptionUuid = TypedUuid<AttributeOption>;

/// Promo code UUID
pub type PromoCodeUuid = TypedUuid<PromoCode>;

/// Delivery method UUID
pub type DeliveryMethodUuid = TypedUuid<DeliveryMethod>;

/// Payment method UUID
pub type PaymentMethodUuid = TypedUuid<PaymentMethod>;

/// Order status UUID
pub type OrderStatusUuid = TypedUuid<OrderStatus>;
