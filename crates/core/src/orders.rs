//! Orders
//!
//! Turns a priced cart, or a manager's line list, into an order snapshot. Prices and
//! quantities are copied into [`OrderLine`]s and never read from the catalog again.

use jiff::civil::Date;
use thiserror::Error;

use crate::{
    cart::{Availability, CartLineKey, PricedCart},
    errors::{self, ErrorKind, ValidationError},
    phone,
    pricing::{self, PricingError},
    promo::PromoCodeInfo,
    uuids::{DeliveryMethodUuid, OfferUuid, OrderStatusUuid, PaymentMethodUuid, ProductUuid},
};

const NAME_MAX: usize = 200;
const ADDRESS_MAX: usize = 500;
const COMMENT_MAX: usize = 2_000;

/// Which method a checkout refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    /// Delivery method.
    Delivery,

    /// Payment method.
    Payment,
}

impl MethodKind {
    /// Human-readable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Delivery => "delivery",
            Self::Payment => "payment",
        }
    }
}

/// Errors raised while assembling an order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderAssemblyError {
    /// Nothing to order.
    #[error("cart is empty")]
    EmptyCart,

    /// A line's product or offer vanished or became unusable.
    #[error("item {key} is {}", .availability.as_str())]
    ItemUnavailable {
        /// The offending line
        key: CartLineKey,

        /// Why it cannot be ordered
        availability: Availability,
    },

    /// Unknown or inactive delivery or payment method.
    #[error("invalid {} method", .0.as_str())]
    InvalidMethod(MethodKind),

    /// The promo code no longer applies.
    #[error("promo code rejected: {0}")]
    PromoCode(String),

    /// Money arithmetic failed.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

impl OrderAssemblyError {
    /// Taxonomy class.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyCart => ErrorKind::InvalidInput,
            Self::ItemUnavailable { availability, .. } => availability.error_kind(),
            Self::InvalidMethod(_) => ErrorKind::NotFound,
            Self::PromoCode(_) => ErrorKind::ValidationFailed,
            Self::Pricing(_) => ErrorKind::Internal,
        }
    }
}

/// Pricing-relevant view of a delivery method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryMethodSnapshot {
    /// Identifier
    pub uuid: DeliveryMethodUuid,

    /// Delivery price in kopecks
    pub price: u64,

    /// Whether the method may be chosen
    pub is_active: bool,
}

/// Checkout-relevant view of a payment method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentMethodSnapshot {
    /// Identifier
    pub uuid: PaymentMethodUuid,

    /// Whether the method may be chosen
    pub is_active: bool,
}

/// Order status flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    /// Identifier
    pub uuid: OrderStatusUuid,

    /// Stable code, e.g. `new`
    pub code: String,

    /// Whether orders may be moved into this status
    pub is_active: bool,

    /// Status given to new orders
    pub is_initial: bool,

    /// Orders in this status are closed
    pub is_final: bool,
}

impl StatusSnapshot {
    /// Whether new orders may start in this status.
    #[must_use]
    pub const fn can_start_orders(&self) -> bool {
        self.is_initial && self.is_active && !self.is_final
    }
}

/// A frozen order line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    /// Product or offer ordered
    pub key: CartLineKey,

    /// Name at order time
    pub name: String,

    /// Unit price at order time, in kopecks
    pub unit_price: u64,

    /// Quantity ordered
    pub quantity: u32,

    /// `unit_price × quantity`
    pub line_total: u64,
}

/// Order money totals, all in kopecks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    /// Sum of line totals
    pub subtotal: u64,

    /// Promo discount
    pub discount: u64,

    /// Delivery price
    pub delivery: u64,

    /// `subtotal − discount + delivery`
    pub total: u64,
}

impl OrderTotals {
    /// Compute totals; the discount never exceeds the subtotal.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] on overflow.
    pub fn new(subtotal: u64, discount: u64, delivery: u64) -> Result<Self, PricingError> {
        let discount = discount.min(subtotal);

        let total = (subtotal - discount)
            .checked_add(delivery)
            .ok_or(PricingError::Overflow)?;

        Ok(Self {
            subtotal,
            discount,
            delivery,
            total,
        })
    }
}

/// Everything needed to write an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledOrder {
    /// Frozen lines
    pub lines: Vec<OrderLine>,

    /// Money totals
    pub totals: OrderTotals,

    /// Promo code applied, if any
    pub promo_code: Option<PromoCodeInfo>,
}

fn check_methods(
    delivery: Option<&DeliveryMethodSnapshot>,
    payment: Option<&PaymentMethodSnapshot>,
) -> Result<u64, OrderAssemblyError> {
    let Some(delivery) = delivery.filter(|method| method.is_active) else {
        return Err(OrderAssemblyError::InvalidMethod(MethodKind::Delivery));
    };

    if !payment.is_some_and(|method| method.is_active) {
        return Err(OrderAssemblyError::InvalidMethod(MethodKind::Payment));
    }

    Ok(delivery.price)
}

/// Freeze a priced cart into an order.
///
/// `cart` must have been priced inside the transaction that writes the order, and
/// `promo_code` evaluated against that same cart.
///
/// # Errors
///
/// Returns [`OrderAssemblyError`] for an empty cart, any unavailable line, a missing or
/// inactive method, or a rejected promo code.
pub fn assemble(
    cart: &PricedCart,
    delivery: Option<&DeliveryMethodSnapshot>,
    payment: Option<&PaymentMethodSnapshot>,
    promo_code: Option<PromoCodeInfo>,
) -> Result<AssembledOrder, OrderAssemblyError> {
    if cart.is_empty() {
        return Err(OrderAssemblyError::EmptyCart);
    }

    if let Some(line) = cart.unavailable().next() {
        return Err(OrderAssemblyError::ItemUnavailable {
            key: line.key,
            availability: line.availability,
        });
    }

    let delivery_price = check_methods(delivery, payment)?;

    if let Some(error) = promo_code.as_ref().and_then(|info| info.error.clone()) {
        return Err(OrderAssemblyError::PromoCode(error));
    }

    let mut lines = Vec::with_capacity(cart.lines.len());

    for line in &cart.lines {
        let (Some(name), Some(unit_price)) = (line.name.clone(), line.unit_price) else {
            return Err(OrderAssemblyError::ItemUnavailable {
                key: line.key,
                availability: Availability::Missing,
            });
        };

        lines.push(OrderLine {
            key: line.key,
            name,
            unit_price,
            quantity: line.quantity,
            line_total: line.line_total,
        });
    }

    let subtotal = pricing::sum(lines.iter().map(|line| line.line_total))?;
    let discount = promo_code.as_ref().map_or(0, |info| info.discount_amount);

    Ok(AssembledOrder {
        lines,
        totals: OrderTotals::new(subtotal, discount, delivery_price)?,
        promo_code,
    })
}

/// Checkout details supplied by the customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkout {
    /// Delivery method
    pub delivery_method: DeliveryMethodUuid,

    /// Payment method
    pub payment_method: PaymentMethodUuid,

    /// Recipient name
    pub customer_name: String,

    /// Recipient phone
    pub customer_phone: String,

    /// Recipient email
    pub customer_email: Option<String>,

    /// Delivery address
    pub delivery_address: Option<String>,

    /// Free-form comment
    pub comment: Option<String>,

    /// Promo code typed at checkout; overrides the cart's code
    pub promo_code: Option<String>,
}

impl Checkout {
    /// Normalise and check every field.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found, field by field.
    pub fn validate(self) -> Result<Self, ValidationError> {
        let contact = Contact {
            name: self.customer_name,
            phone: self.customer_phone,
            email: self.customer_email,
            address: self.delivery_address,
            comment: self.comment,
        }
        .validate()?;

        let promo_code = match self.promo_code.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(code) => Some(crate::promo::normalize_code(code)?),
        };

        Ok(Self {
            delivery_method: self.delivery_method,
            payment_method: self.payment_method,
            customer_name: contact.name,
            customer_phone: contact.phone,
            customer_email: contact.email,
            delivery_address: contact.address,
            comment: contact.comment,
            promo_code,
        })
    }
}

/// Contact block shared by customer and manager orders.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Contact {
    name: String,
    phone: String,
    email: Option<String>,
    address: Option<String>,
    comment: Option<String>,
}

impl Contact {
    fn validate(self) -> Result<Self, ValidationError> {
        Ok(Self {
            name: errors::required_text("customer_name", &self.name, NAME_MAX)?,
            phone: phone::normalize(&self.phone)?,
            email: match self.email.as_deref().map(str::trim) {
                None | Some("") => None,
                Some(email) => Some(errors::email(email)?),
            },
            address: errors::optional_text("delivery_address", self.address.as_deref(), ADDRESS_MAX)?,
            comment: errors::optional_text("comment", self.comment.as_deref(), COMMENT_MAX)?,
        })
    }
}

/// Ad-hoc offer data for something outside the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineOffer {
    /// Display name
    pub name: String,

    /// Related catalog product, if any
    pub product: Option<ProductUuid>,

    /// Promised delivery time in days
    pub delivery_days: Option<u32>,

    /// Genuine manufacturer part
    pub is_original: bool,

    /// Aftermarket part
    pub is_analog: bool,
}

/// What a manager order line refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagerLineSource {
    /// Existing product.
    Product(ProductUuid),

    /// Existing offer.
    Offer(OfferUuid),

    /// New ad-hoc offer.
    Inline(InlineOffer),
}

/// A manager order line as submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerLineInput {
    /// Existing product
    pub product: Option<ProductUuid>,

    /// Existing offer
    pub offer: Option<OfferUuid>,

    /// Ad-hoc offer data
    pub inline: Option<InlineOffer>,

    /// Quantity
    pub quantity: u32,

    /// Manager price per unit, in kopecks
    pub price: u64,
}

/// A checked manager order line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerLine {
    /// What is sold
    pub source: ManagerLineSource,

    /// Quantity
    pub quantity: u32,

    /// Manager price per unit, in kopecks
    pub price: u64,
}

impl ManagerLineInput {
    /// Check the reference, quantity and price.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(self) -> Result<ManagerLine, ValidationError> {
        let source = match (self.product, self.offer, self.inline) {
            (Some(product), None, None) => ManagerLineSource::Product(product),
            (None, Some(offer), None) => ManagerLineSource::Offer(offer),
            (None, None, Some(inline)) => {
                if inline.is_original && inline.is_analog {
                    return Err(ValidationError::OriginalAndAnalog);
                }

                ManagerLineSource::Inline(InlineOffer {
                    name: errors::required_text("name", &inline.name, NAME_MAX)?,
                    ..inline
                })
            }
            _ => return Err(ValidationError::ItemReference),
        };

        if self.price == 0 {
            return Err(ValidationError::NotPositive { field: "price" });
        }

        Ok(ManagerLine {
            source,
            quantity: crate::cart::quantity(self.quantity)?,
            price: self.price,
        })
    }
}

/// A manager order as submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerOrderInput {
    /// Customer phone; the customer is found or created by it
    pub customer_phone: String,

    /// Customer name
    pub customer_name: String,

    /// Customer email
    pub customer_email: Option<String>,

    /// Delivery method
    pub delivery_method: DeliveryMethodUuid,

    /// Payment method
    pub payment_method: PaymentMethodUuid,

    /// Delivery address
    pub delivery_address: Option<String>,

    /// Free-form comment
    pub comment: Option<String>,

    /// Lines
    pub items: Vec<ManagerLineInput>,
}

/// A checked manager order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerOrder {
    /// Normalised customer phone
    pub customer_phone: String,

    /// Customer name
    pub customer_name: String,

    /// Customer email
    pub customer_email: Option<String>,

    /// Delivery method
    pub delivery_method: DeliveryMethodUuid,

    /// Payment method
    pub payment_method: PaymentMethodUuid,

    /// Delivery address
    pub delivery_address: Option<String>,

    /// Free-form comment
    pub comment: Option<String>,

    /// Checked lines
    pub items: Vec<ManagerLine>,
}

impl ManagerOrderInput {
    /// Check the contact block and every line.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(self) -> Result<ManagerOrder, ValidationError> {
        if self.items.is_empty() {
            return Err(ValidationError::Empty { field: "items" });
        }

        let contact = Contact {
            name: self.customer_name,
            phone: self.customer_phone,
            email: self.customer_email,
            address: self.delivery_address,
            comment: self.comment,
        }
        .validate()?;

        let items = self
            .items
            .into_iter()
            .map(ManagerLineInput::validate)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ManagerOrder {
            customer_phone: contact.phone,
            customer_name: contact.name,
            customer_email: contact.email,
            delivery_method: self.delivery_method,
            payment_method: self.payment_method,
            delivery_address: contact.address,
            comment: contact.comment,
            items,
        })
    }
}

/// A manager line after its source was looked up (and inline offers created).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedManagerLine {
    /// Product or offer sold
    pub key: CartLineKey,

    /// Source name
    pub name: String,

    /// Whether the source may be sold
    pub availability: Availability,

    /// Quantity
    pub quantity: u32,

    /// Manager price per unit
    pub price: u64,
}

/// Freeze a manager's lines into an order. Manager orders carry no promo discount.
///
/// # Errors
///
/// Returns [`OrderAssemblyError`] for an empty list, any unavailable source, or a
/// missing or inactive method.
pub fn assemble_manager(
    lines: Vec<ResolvedManagerLine>,
    delivery: Option<&DeliveryMethodSnapshot>,
    payment: Option<&PaymentMethodSnapshot>,
) -> Result<AssembledOrder, OrderAssemblyError> {
    if lines.is_empty() {
        return Err(OrderAssemblyError::EmptyCart);
    }

    if let Some(line) = lines.iter().find(|line| !line.availability.is_available()) {
        return Err(OrderAssemblyError::ItemUnavailable {
            key: line.key,
            availability: line.availability,
        });
    }

    let delivery_price = check_methods(delivery, payment)?;

    let lines = lines
        .into_iter()
        .map(|line| {
            Ok(OrderLine {
                key: line.key,
                line_total: pricing::line_total(line.price, line.quantity)?,
                name: line.name,
                unit_price: line.price,
                quantity: line.quantity,
            })
        })
        .collect::<Result<Vec<_>, PricingError>>()?;

    let subtotal = pricing::sum(lines.iter().map(|line| line.line_total))?;

    Ok(AssembledOrder {
        lines,
        totals: OrderTotals::new(subtotal, 0, delivery_price)?,
        promo_code: None,
    })
}

/// Order number `YYYYMMDD-NNNN` from the order date and the day's sequence number.
#[must_use]
pub fn order_number(date: Date, sequence: u32) -> String {
    format!(
        "{:04}{:02}{:02}-{sequence:04}",
        date.year(),
        date.month(),
        date.day()
    )
}

#[cfg(test)]
mod tests {
    use jiff::{SignedDuration, Timestamp, civil::date};
    use testresult::TestResult;

    use crate::{
        cart::{CartLine, LineSource, OfferSnapshot, ProductSnapshot, price_cart},
        offers::OfferState,
        promo::DiscountType,
    };

    use super::*;

    fn product_line(price: u64, quantity: u32) -> CartLine {
        let uuid = ProductUuid::new();

        CartLine {
            key: CartLineKey::Product(uuid),
            quantity,
            source: LineSource::Product(ProductSnapshot {
                uuid,
                name: "Timing belt".to_string(),
                price,
                is_active: true,
                in_stock: true,
                exclude_from_promo_codes: false,
            }),
        }
    }

    fn delivery(price: u64) -> DeliveryMethodSnapshot {
        DeliveryMethodSnapshot {
            uuid: DeliveryMethodUuid::new(),
            price,
            is_active: true,
        }
    }

    fn payment() -> PaymentMethodSnapshot {
        PaymentMethodSnapshot {
            uuid: PaymentMethodUuid::new(),
            is_active: true,
        }
    }

    fn promo(amount: u64) -> PromoCodeInfo {
        PromoCodeInfo {
            code: "SAVE10".to_string(),
            discount_amount: amount,
            discount_type: DiscountType::Percentage,
            error: None,
        }
    }

    #[test]
    fn assembles_totals_with_discount_and_delivery() -> TestResult {
        let cart = price_cart(
            [product_line(1_000, 2), product_line(500, 1)],
            Timestamp::now(),
        )?;

        let order = assemble(&cart, Some(&delivery(300)), Some(&payment()), Some(promo(250)))?;

        assert_eq!(order.lines.len(), 2);
        assert_eq!(
            order.totals,
            OrderTotals {
                subtotal: 2_500,
                discount: 250,
                delivery: 300,
                total: 2_550,
            }
        );

        let first = order.lines.first().ok_or("missing line")?;

        assert_eq!(first.unit_price, 1_000);
        assert_eq!(first.quantity, 2);
        assert_eq!(first.line_total, 2_000);

        Ok(())
    }

    #[test]
    fn empty_cart_is_rejected() -> TestResult {
        let cart = price_cart([], Timestamp::now())?;

        assert_eq!(
            assemble(&cart, Some(&delivery(0)), Some(&payment()), None),
            Err(OrderAssemblyError::EmptyCart)
        );

        Ok(())
    }

    #[test]
    fn cancelled_offer_aborts_the_order() -> TestResult {
        let uuid = OfferUuid::new();
        let cancelled = CartLine {
            key: CartLineKey::Offer(uuid),
            quantity: 1,
            source: LineSource::Offer(OfferSnapshot {
                uuid,
                name: "Rebuilt injector".to_string(),
                price: 12_000,
                state: OfferState {
                    is_active: false,
                    is_cancelled: true,
                    expires_at: None,
                    consumed_at: None,
                },
            }),
        };

        let cart = price_cart([product_line(1_000, 1), cancelled], Timestamp::now())?;
        let result = assemble(&cart, Some(&delivery(0)), Some(&payment()), None);

        assert_eq!(
            result,
            Err(OrderAssemblyError::ItemUnavailable {
                key: CartLineKey::Offer(uuid),
                availability: Availability::Cancelled,
            })
        );
        assert_eq!(
            result.err().map(|error| error.kind()),
            Some(ErrorKind::Unavailable)
        );

        Ok(())
    }

    #[test]
    fn expired_offer_aborts_the_order() -> TestResult {
        let now = Timestamp::now();
        let uuid = OfferUuid::new();
        let expired = CartLine {
            key: CartLineKey::Offer(uuid),
            quantity: 1,
            source: LineSource::Offer(OfferSnapshot {
                uuid,
                name: "Rebuilt injector".to_string(),
                price: 12_000,
                state: OfferState {
                    is_active: true,
                    is_cancelled: false,
                    expires_at: Some(now - SignedDuration::from_secs(5)),
                    consumed_at: None,
                },
            }),
        };

        let cart = price_cart([expired], now)?;

        assert!(
            matches!(
                assemble(&cart, Some(&delivery(0)), Some(&payment()), None),
                Err(OrderAssemblyError::ItemUnavailable {
                    availability: Availability::Expired,
                    ..
                })
            ),
            "expired offers must not be ordered"
        );

        Ok(())
    }

    #[test]
    fn inactive_or_missing_methods_are_rejected() -> TestResult {
        let cart = price_cart([product_line(1_000, 1)], Timestamp::now())?;
        let inactive = DeliveryMethodSnapshot {
            is_active: false,
            ..delivery(100)
        };
        let inactive_payment = PaymentMethodSnapshot {
            is_active: false,
            ..payment()
        };

        assert_eq!(
            assemble(&cart, Some(&inactive), Some(&payment()), None),
            Err(OrderAssemblyError::InvalidMethod(MethodKind::Delivery))
        );
        assert_eq!(
            assemble(&cart, None, Some(&payment()), None),
            Err(OrderAssemblyError::InvalidMethod(MethodKind::Delivery))
        );
        assert_eq!(
            assemble(&cart, Some(&delivery(0)), Some(&inactive_payment), None),
            Err(OrderAssemblyError::InvalidMethod(MethodKind::Payment))
        );

        Ok(())
    }

    #[test]
    fn rejected_promo_code_aborts_the_order() -> TestResult {
        let cart = price_cart([product_line(1_000, 1)], Timestamp::now())?;
        let rejected = PromoCodeInfo {
            error: Some("Код недействителен".to_string()),
            ..promo(0)
        };

        let result = assemble(&cart, Some(&delivery(0)), Some(&payment()), Some(rejected));

        assert_eq!(
            result,
            Err(OrderAssemblyError::PromoCode("Код недействителен".to_string()))
        );

        Ok(())
    }

    #[test]
    fn totals_never_go_negative() -> TestResult {
        let totals = OrderTotals::new(1_000, 5_000, 200)?;

        assert_eq!(totals.discount, 1_000);
        assert_eq!(totals.total, 200);

        Ok(())
    }

    #[test]
    fn manager_lines_use_manager_prices() -> TestResult {
        let product = ProductUuid::new();
        let offer = OfferUuid::new();

        let order = assemble_manager(
            vec![
                ResolvedManagerLine {
                    key: CartLineKey::Product(product),
                    name: "Alternator".to_string(),
                    availability: Availability::Available,
                    quantity: 1,
                    price: 90_000,
                },
                ResolvedManagerLine {
                    key: CartLineKey::Offer(offer),
                    name: "Mirror glass".to_string(),
                    availability: Availability::Available,
                    quantity: 2,
                    price: 4_500,
                },
            ],
            Some(&delivery(1_000)),
            Some(&payment()),
        )?;

        assert_eq!(order.totals.subtotal, 99_000);
        assert_eq!(order.totals.discount, 0);
        assert_eq!(order.totals.total, 100_000);
        assert!(order.promo_code.is_none(), "manager orders carry no promo");

        Ok(())
    }

    #[test]
    fn manager_order_is_all_or_nothing() {
        let offer = OfferUuid::new();

        let result = assemble_manager(
            vec![
                ResolvedManagerLine {
                    key: CartLineKey::Product(ProductUuid::new()),
                    name: "Alternator".to_string(),
                    availability: Availability::Available,
                    quantity: 1,
                    price: 90_000,
                },
                ResolvedManagerLine {
                    key: CartLineKey::Offer(offer),
                    name: "Mirror glass".to_string(),
                    availability: Availability::Consumed,
                    quantity: 1,
                    price: 4_500,
                },
            ],
            Some(&delivery(0)),
            Some(&payment()),
        );

        assert_eq!(
            result,
            Err(OrderAssemblyError::ItemUnavailable {
                key: CartLineKey::Offer(offer),
                availability: Availability::Consumed,
            })
        );
    }

    #[test]
    fn manager_line_validation() -> TestResult {
        let inline = InlineOffer {
            name: "  Custom bracket ".to_string(),
            product: None,
            delivery_days: Some(10),
            is_original: false,
            is_analog: true,
        };

        let line = ManagerLineInput {
            product: None,
            offer: None,
            inline: Some(inline.clone()),
            quantity: 1,
            price: 2_000,
        }
        .validate()?;

        assert!(
            matches!(&line.source, ManagerLineSource::Inline(offer) if offer.name == "Custom bracket"),
            "inline name should be trimmed"
        );

        assert_eq!(
            ManagerLineInput {
                product: Some(ProductUuid::new()),
                offer: None,
                inline: Some(inline),
                quantity: 1,
                price: 2_000,
            }
            .validate(),
            Err(ValidationError::ItemReference)
        );
        assert_eq!(
            ManagerLineInput {
                product: Some(ProductUuid::new()),
                offer: None,
                inline: None,
                quantity: 1,
                price: 0,
            }
            .validate(),
            Err(ValidationError::NotPositive { field: "price" })
        );

        Ok(())
    }

    #[test]
    fn manager_order_normalises_contact() -> TestResult {
        let order = ManagerOrderInput {
            customer_phone: "8 (912) 345-67-89".to_string(),
            customer_name: " Пётр ".to_string(),
            customer_email: Some(String::new()),
            delivery_method: DeliveryMethodUuid::new(),
            payment_method: PaymentMethodUuid::new(),
            delivery_address: None,
            comment: Some(" ".to_string()),
            items: vec![ManagerLineInput {
                product: Some(ProductUuid::new()),
                offer: None,
                inline: None,
                quantity: 1,
                price: 100,
            }],
        }
        .validate()?;

        assert_eq!(order.customer_phone, "+79123456789");
        assert_eq!(order.customer_name, "Пётр");
        assert_eq!(order.customer_email, None);
        assert_eq!(order.comment, None);

        Ok(())
    }

    #[test]
    fn checkout_validation() -> TestResult {
        let checkout = Checkout {
            delivery_method: DeliveryMethodUuid::new(),
            payment_method: PaymentMethodUuid::new(),
            customer_name: "Анна".to_string(),
            customer_phone: "+7 999 000-11-22".to_string(),
            customer_email: Some("anna@example.ru".to_string()),
            delivery_address: Some("Казань, ул. Баумана, 1".to_string()),
            comment: None,
            promo_code: Some(" save10 ".to_string()),
        };

        let valid = checkout.clone().validate()?;

        assert_eq!(valid.customer_phone, "+79990001122");
        assert_eq!(valid.promo_code.as_deref(), Some("SAVE10"));

        assert_eq!(
            Checkout {
                customer_name: " ".to_string(),
                ..checkout.clone()
            }
            .validate(),
            Err(ValidationError::Blank {
                field: "customer_name"
            })
        );
        assert_eq!(
            Checkout {
                customer_phone: "12345".to_string(),
                ..checkout
            }
            .validate(),
            Err(ValidationError::Phone)
        );

        Ok(())
    }

    #[test]
    fn order_numbers_are_zero_padded() {
        assert_eq!(order_number(date(2026, 3, 7), 1), "20260307-0001");
        assert_eq!(order_number(date(2026, 11, 30), 1234), "20261130-1234");
    }
}
