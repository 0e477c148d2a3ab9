//! Cart
//!
//! Prices a cart from live product and offer data. Nothing here is frozen: unit prices
//! are read each time, and lines whose source became unusable are reported rather
//! than dropped.

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use rustc_hash::FxHashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    errors::{ErrorKind, ValidationError},
    offers::OfferState,
    pricing::{self, PricingError},
    promo::PromoCodeInfo,
    uuids::{OfferUuid, ProductUuid},
};

/// Which catalog entity a cart line points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CartLineKey {
    /// Catalog product.
    Product(ProductUuid),

    /// Manager offer.
    Offer(OfferUuid),
}

impl CartLineKey {
    /// Reference kind.
    #[must_use]
    pub const fn kind(self) -> LineKind {
        match self {
            Self::Product(_) => LineKind::Product,
            Self::Offer(_) => LineKind::Offer,
        }
    }

    /// Raw identifier of the referenced entity.
    #[must_use]
    pub const fn uuid(self) -> Uuid {
        match self {
            Self::Product(uuid) => uuid.into_uuid(),
            Self::Offer(uuid) => uuid.into_uuid(),
        }
    }

    /// Rebuild a key from its parts.
    #[must_use]
    pub fn from_parts(kind: LineKind, uuid: Uuid) -> Self {
        match kind {
            LineKind::Product => Self::Product(uuid.into()),
            LineKind::Offer => Self::Offer(uuid.into()),
        }
    }

    /// The product part, for binding the `product_uuid` column.
    #[must_use]
    pub const fn product(self) -> Option<ProductUuid> {
        match self {
            Self::Product(uuid) => Some(uuid),
            Self::Offer(_) => None,
        }
    }

    /// The offer part, for binding the `offer_uuid` column.
    #[must_use]
    pub const fn offer(self) -> Option<OfferUuid> {
        match self {
            Self::Product(_) => None,
            Self::Offer(uuid) => Some(uuid),
        }
    }
}

impl fmt::Display for CartLineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind().as_str(), self.uuid())
    }
}

/// Kind of cart line reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineKind {
    /// Catalog product.
    Product,

    /// Manager offer.
    Offer,
}

/// Unknown line kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown item kind: {0}")]
pub struct UnknownLineKind(pub String);

impl LineKind {
    /// Path and wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Offer => "offer",
        }
    }
}

impl FromStr for LineKind {
    type Err = UnknownLineKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "product" | "products" => Ok(Self::Product),
            "offer" | "offers" => Ok(Self::Offer),
            other => Err(UnknownLineKind(other.to_string())),
        }
    }
}

/// Whether a line's source can currently be bought.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Availability {
    /// Purchasable.
    Available,

    /// Product or offer switched off.
    Inactive,

    /// Product is listed but has no stock.
    OutOfStock,

    /// Offer purchase window has passed.
    Expired,

    /// Offer was cancelled.
    Cancelled,

    /// Offer was already bought.
    Consumed,

    /// The referenced row no longer exists.
    Missing,
}

impl Availability {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Inactive => "inactive",
            Self::OutOfStock => "out_of_stock",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
            Self::Consumed => "consumed",
            Self::Missing => "missing",
        }
    }

    /// Whether the line can be bought.
    #[must_use]
    pub const fn is_available(self) -> bool {
        matches!(self, Self::Available)
    }

    /// How an attempt to use an unavailable source is reported.
    #[must_use]
    pub const fn error_kind(self) -> ErrorKind {
        match self {
            Self::Missing => ErrorKind::NotFound,
            _ => ErrorKind::Unavailable,
        }
    }
}

/// Pricing-relevant view of a catalog product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSnapshot {
    /// Product identifier
    pub uuid: ProductUuid,

    /// Display name
    pub name: String,

    /// List price in kopecks
    pub price: u64,

    /// Whether the product is on sale
    pub is_active: bool,

    /// Whether the product can be shipped now
    pub in_stock: bool,

    /// Promo codes never discount this product
    pub exclude_from_promo_codes: bool,
}

impl ProductSnapshot {
    /// Switched-off products are inactive; active ones still need stock.
    #[must_use]
    pub const fn availability(&self) -> Availability {
        if !self.is_active {
            Availability::Inactive
        } else if !self.in_stock {
            Availability::OutOfStock
        } else {
            Availability::Available
        }
    }
}

/// Pricing-relevant view of an offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferSnapshot {
    /// Offer identifier
    pub uuid: OfferUuid,

    /// Display name
    pub name: String,

    /// Offer price in kopecks
    pub price: u64,

    /// Lifecycle flags
    pub state: OfferState,
}

/// Where a line's price comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineSource {
    /// The referenced product.
    Product(ProductSnapshot),

    /// The referenced offer.
    Offer(OfferSnapshot),

    /// The referenced row is gone.
    Missing,
}

impl LineSource {
    /// Availability of the source at `now`.
    #[must_use]
    pub fn availability(&self, now: Timestamp) -> Availability {
        match self {
            Self::Product(product) => product.availability(),
            Self::Offer(offer) => offer.state.availability(now),
            Self::Missing => Availability::Missing,
        }
    }

    fn name(&self) -> Option<&str> {
        match self {
            Self::Product(product) => Some(&product.name),
            Self::Offer(offer) => Some(&offer.name),
            Self::Missing => None,
        }
    }

    fn price(&self) -> Option<u64> {
        match self {
            Self::Product(product) => Some(product.price),
            Self::Offer(offer) => Some(offer.price),
            Self::Missing => None,
        }
    }

    fn promo_eligible(&self) -> bool {
        match self {
            Self::Product(product) => !product.exclude_from_promo_codes,
            Self::Offer(_) => true,
            Self::Missing => false,
        }
    }
}

/// A stored cart line joined with its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    /// Line key
    pub key: CartLineKey,

    /// Requested quantity
    pub quantity: u32,

    /// Live source data
    pub source: LineSource,
}

/// A cart line with its live price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    /// Line key
    pub key: CartLineKey,

    /// Source name, if the source still exists
    pub name: Option<String>,

    /// Requested quantity
    pub quantity: u32,

    /// Current unit price, if the source still exists
    pub unit_price: Option<u64>,

    /// `unit_price × quantity`, or zero for unavailable lines
    pub line_total: u64,

    /// Whether the line counts toward totals
    pub availability: Availability,

    /// Whether promo codes may discount this line
    pub promo_eligible: bool,
}

impl PricedLine {
    /// Whether the line counts toward totals.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.availability.is_available()
    }
}

/// A fully priced cart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PricedCart {
    /// Every stored line, available or not
    pub lines: Vec<PricedLine>,

    /// Quantity over available lines
    pub total_quantity: u64,

    /// Price over available lines
    pub total_price: u64,
}

impl PricedCart {
    /// Lines counting toward totals.
    pub fn available(&self) -> impl Iterator<Item = &PricedLine> {
        self.lines.iter().filter(|line| line.is_available())
    }

    /// Lines excluded from totals.
    pub fn unavailable(&self) -> impl Iterator<Item = &PricedLine> {
        self.lines.iter().filter(|line| !line.is_available())
    }

    /// Number of stored lines.
    #[must_use]
    pub fn items_count(&self) -> usize {
        self.lines.len()
    }

    /// Whether nothing is stored in the cart.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Price of available lines that promo codes may discount.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] on overflow.
    pub fn promo_eligible_amount(&self) -> Result<u64, PricingError> {
        pricing::sum(
            self.available()
                .filter(|line| line.promo_eligible)
                .map(|line| line.line_total),
        )
    }
}

/// Price every line at `now`.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] on overflow.
pub fn price_cart<I>(lines: I, now: Timestamp) -> Result<PricedCart, PricingError>
where
    I: IntoIterator<Item = CartLine>,
{
    let mut priced = PricedCart::default();

    for line in lines {
        let availability = line.source.availability(now);
        let unit_price = line.source.price();

        let line_total = match (availability, unit_price) {
            (Availability::Available, Some(price)) => pricing::line_total(price, line.quantity)?,
            _ => 0,
        };

        if availability.is_available() {
            priced.total_quantity = priced
                .total_quantity
                .checked_add(u64::from(line.quantity))
                .ok_or(PricingError::Overflow)?;
            priced.total_price = priced
                .total_price
                .checked_add(line_total)
                .ok_or(PricingError::Overflow)?;
        }

        priced.lines.push(PricedLine {
            key: line.key,
            name: line.source.name().map(str::to_string),
            quantity: line.quantity,
            unit_price,
            line_total,
            availability,
            promo_eligible: line.source.promo_eligible(),
        });
    }

    Ok(priced)
}

/// Totals shown next to the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSummary {
    /// Quantity over available lines
    pub total_quantity: u64,

    /// Price over available lines
    pub total_price: u64,

    /// Number of stored lines
    pub items_count: usize,

    /// Number of lines excluded from totals
    pub unavailable_count: usize,

    /// Freshly evaluated promo code, if one is associated with the cart
    pub promo_code: Option<PromoCodeInfo>,
}

/// Summarise a priced cart.
#[must_use]
pub fn summarize(cart: &PricedCart, promo_code: Option<PromoCodeInfo>) -> CartSummary {
    CartSummary {
        total_quantity: cart.total_quantity,
        total_price: cart.total_price,
        items_count: cart.items_count(),
        unavailable_count: cart.unavailable().count(),
        promo_code,
    }
}

/// Request to add something to a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddItem {
    /// Product to add.
    pub product: Option<ProductUuid>,

    /// Offer to add.
    pub offer: Option<OfferUuid>,

    /// Quantity to add.
    pub quantity: u32,
}

/// A checked [`AddItem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidAddItem {
    /// What to add.
    pub key: CartLineKey,

    /// How many to add.
    pub quantity: u32,
}

impl AddItem {
    /// Check the reference and quantity.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ItemReference`] unless exactly one of product and
    /// offer is set, and [`ValidationError::Quantity`] for a zero quantity.
    pub fn validate(self) -> Result<ValidAddItem, ValidationError> {
        let key = match (self.product, self.offer) {
            (Some(product), None) => CartLineKey::Product(product),
            (None, Some(offer)) => CartLineKey::Offer(offer),
            _ => return Err(ValidationError::ItemReference),
        };

        Ok(ValidAddItem {
            key,
            quantity: quantity(self.quantity)?,
        })
    }
}

/// Largest quantity a single line may hold; quantities are stored as `INTEGER`.
pub const MAX_QUANTITY: u32 = 2_147_483_647;

/// Reject quantities below one or above [`MAX_QUANTITY`].
///
/// # Errors
///
/// Returns [`ValidationError::Quantity`].
pub fn quantity(value: u32) -> Result<u32, ValidationError> {
    if (1..=MAX_QUANTITY).contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::Quantity)
    }
}

/// Combine an anonymous cart into a user's cart.
///
/// Lines are keyed by product or offer. Colliding keys sum their quantities, capped
/// at [`MAX_QUANTITY`]; keys only in `source` are appended in their original order.
#[must_use]
pub fn merge_lines(
    target: &[(CartLineKey, u32)],
    source: &[(CartLineKey, u32)],
) -> Vec<(CartLineKey, u32)> {
    let mut merged: Vec<(CartLineKey, u32)> = Vec::with_capacity(target.len() + source.len());
    let mut positions: FxHashMap<CartLineKey, usize> = FxHashMap::default();

    for &(key, quantity) in target.iter().chain(source) {
        if let Some(&position) = positions.get(&key)
            && let Some((_, existing)) = merged.get_mut(position)
        {
            *existing = existing.saturating_add(quantity).min(MAX_QUANTITY);

            continue;
        }

        positions.insert(key, merged.len());
        merged.push((key, quantity.min(MAX_QUANTITY)));
    }

    merged
}
