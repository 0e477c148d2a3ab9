//! Promo Codes
//!
//! Promo codes are evaluated against the live cart every time they are shown or used.
//! A failed evaluation is data: [`PromoCodeInfo::error`] carries the message and the
//! discount drops to zero.

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::{
    cart::PricedCart,
    errors::ValidationError,
    pricing::{self, PricingError},
    uuids::PromoCodeUuid,
};

const CODE_MIN: usize = 3;
const CODE_MAX: usize = 32;

/// How a promo code discounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscountType {
    /// A fixed number of kopecks.
    FixedAmount,

    /// A percentage of the eligible amount.
    Percentage,
}

/// Unknown discount type name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown discount type: {0}")]
pub struct UnknownDiscountType(pub String);

impl DiscountType {
    /// Database and wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FixedAmount => "FIXED_AMOUNT",
            Self::Percentage => "PERCENTAGE",
        }
    }
}

impl fmt::Display for DiscountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiscountType {
    type Err = UnknownDiscountType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "FIXED_AMOUNT" => Ok(Self::FixedAmount),
            "PERCENTAGE" => Ok(Self::Percentage),
            other => Err(UnknownDiscountType(other.to_string())),
        }
    }
}

/// Discount granted by a promo code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromoDiscount {
    /// Kopecks off the eligible amount.
    FixedAmount(u64),

    /// Percent off the eligible amount.
    Percentage(Decimal),
}

impl PromoDiscount {
    /// The discount type.
    #[must_use]
    pub const fn discount_type(&self) -> DiscountType {
        match self {
            Self::FixedAmount(_) => DiscountType::FixedAmount,
            Self::Percentage(_) => DiscountType::Percentage,
        }
    }

    /// Discount for an eligible amount.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] on overflow.
    pub fn amount_for(&self, eligible: u64) -> Result<u64, PricingError> {
        match *self {
            Self::FixedAmount(amount) => Ok(amount.min(eligible)),
            Self::Percentage(percent) => {
                pricing::percent_of_minor(eligible, percent.min(Decimal::ONE_HUNDRED))
            }
        }
    }
}

/// A stored promo code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromoCode {
    /// Identifier
    pub uuid: PromoCodeUuid,

    /// Upper-case code
    pub code: String,

    /// Discount granted
    pub discount: PromoDiscount,

    /// Minimum eligible amount in kopecks
    pub min_order_amount: Option<u64>,

    /// Start of the validity window
    pub valid_from: Timestamp,

    /// End of the validity window
    pub valid_until: Option<Timestamp>,

    /// Manual on/off switch
    pub is_active: bool,

    /// Usable by anyone; private codes need a grant
    pub is_public: bool,

    /// Only for customers without previous orders
    pub first_order_only: bool,

    /// Total number of uses allowed
    pub max_uses_total: Option<u64>,

    /// Uses allowed per customer
    pub max_uses_per_user: u64,
}

/// Who is trying to use a code and how they used it before.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromoHolder {
    /// Anonymous visitor.
    Anonymous,

    /// Signed-in customer.
    User {
        /// Orders that already used this code
        uses: u64,

        /// Orders the customer has placed
        orders: u64,

        /// The customer was granted access to a private code
        granted: bool,
    },
}

/// Usage data needed to evaluate a code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromoContext {
    /// Orders that used the code, across all customers
    pub total_uses: u64,

    /// The customer applying the code
    pub holder: PromoHolder,
}

/// Why a code gives no discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PromoRejection {
    /// No such code.
    #[error("Код не найден")]
    NotFound,

    /// Switched off, outside its window or used up.
    #[error("Код недействителен")]
    Invalid,

    /// Private and first-order codes need a signed-in customer.
    #[error("Промокод требует авторизации")]
    RequiresAuthentication,

    /// The customer reached the per-user limit.
    #[error("Вы уже использовали этот промокод")]
    AlreadyUsed,

    /// The customer already has orders.
    #[error("Промокод доступен только для первого заказа")]
    FirstOrderOnly,

    /// Private code without a grant.
    #[error("У вас нет доступа к этому промокоду")]
    NoAccess,

    /// Nothing in the cart may be discounted.
    #[error("Нет товаров, к которым применим промокод")]
    NothingEligible,

    /// The eligible amount is below the code's minimum.
    #[error("Минимальная сумма заказа для применения промокода: {}", pricing::format_rub(*.minimum))]
    BelowMinimum {
        /// Required eligible amount in kopecks
        minimum: u64,
    },
}

/// Result of applying a promo code to a cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromoCodeInfo {
    /// The code as evaluated
    pub code: String,

    /// Discount in kopecks, zero on failure
    pub discount_amount: u64,

    /// Discount type, `FIXED_AMOUNT` on failure
    pub discount_type: DiscountType,

    /// Failure message, if the code gives no discount
    pub error: Option<String>,
}

impl PromoCodeInfo {
    /// A zero-discount result carrying `rejection`.
    #[must_use]
    pub fn rejected(code: &str, rejection: PromoRejection) -> Self {
        Self {
            code: code.to_string(),
            discount_amount: 0,
            discount_type: DiscountType::FixedAmount,
            error: Some(rejection.to_string()),
        }
    }

    /// Whether the code grants its discount.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

/// Trim, upper-case and check a code typed by a customer.
///
/// # Errors
///
/// Returns [`ValidationError::PromoCodeFormat`] unless the code is 3 to 32 characters
/// of `A-Z`, `0-9`, `-` and `_`.
pub fn normalize_code(input: &str) -> Result<String, ValidationError> {
    let code = input.trim().to_uppercase();

    let valid_chars = code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-' || c == '_');

    if !valid_chars || !(CODE_MIN..=CODE_MAX).contains(&code.len()) {
        return Err(ValidationError::PromoCodeFormat);
    }

    Ok(code)
}

/// Evaluate `promo` (looked up by `code`) against `cart` at `now`.
///
/// Checks run in order and the first failure wins: existence, validity window and
/// usage cap, holder constraints, cart contents. The discount is capped by both the
/// eligible amount and the cart total.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] on overflow.
pub fn evaluate(
    code: &str,
    promo: Option<&PromoCode>,
    context: &PromoContext,
    cart: &PricedCart,
    now: Timestamp,
) -> Result<PromoCodeInfo, PricingError> {
    let Some(promo) = promo else {
        return Ok(PromoCodeInfo::rejected(code, PromoRejection::NotFound));
    };

    if let Err(rejection) = check_code(promo, context, now) {
        return Ok(PromoCodeInfo::rejected(&promo.code, rejection));
    }

    let eligible = cart.promo_eligible_amount()?;

    if eligible == 0 {
        return Ok(PromoCodeInfo::rejected(
            &promo.code,
            PromoRejection::NothingEligible,
        ));
    }

    if let Some(minimum) = promo.min_order_amount
        && eligible < minimum
    {
        return Ok(PromoCodeInfo::rejected(
            &promo.code,
            PromoRejection::BelowMinimum { minimum },
        ));
    }

    let discount_amount = promo.discount.amount_for(eligible)?.min(cart.total_price);

    Ok(PromoCodeInfo {
        code: promo.code.clone(),
        discount_amount,
        discount_type: promo.discount.discount_type(),
        error: None,
    })
}

fn check_code(
    promo: &PromoCode,
    context: &PromoContext,
    now: Timestamp,
) -> Result<(), PromoRejection> {
    let in_window =
        promo.valid_from <= now && promo.valid_until.is_none_or(|valid_until| now <= valid_until);

    let used_up = promo
        .max_uses_total
        .is_some_and(|max| context.total_uses >= max);

    if !promo.is_active || !in_window || used_up {
        return Err(PromoRejection::Invalid);
    }

    match context.holder {
        PromoHolder::Anonymous => {
            if !promo.is_public || promo.first_order_only {
                return Err(PromoRejection::RequiresAuthentication);
            }
        }
        PromoHolder::User {
            uses,
            orders,
            granted,
        } => {
            if uses >= promo.max_uses_per_user {
                return Err(PromoRejection::AlreadyUsed);
            }

            if promo.first_order_only && orders > 0 {
                return Err(PromoRejection::FirstOrderOnly);
            }

            if !promo.is_public && !granted {
                return Err(PromoRejection::NoAccess);
            }
        }
    }

    Ok(())
}

/// Decimal places a stored percentage keeps.
const PERCENTAGE_SCALE: u32 = 2;

/// Promo code fields an administrator supplies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPromoCode {
    /// Code as typed
    pub code: String,

    /// Discount granted
    pub discount: PromoDiscount,

    /// Minimum eligible amount in kopecks
    pub min_order_amount: Option<u64>,

    /// Start of the validity window
    pub valid_from: Timestamp,

    /// End of the validity window
    pub valid_until: Option<Timestamp>,

    /// Usable by anyone
    pub is_public: bool,

    /// Only for first orders
    pub first_order_only: bool,

    /// Total number of uses allowed
    pub max_uses_total: Option<u64>,

    /// Uses allowed per customer
    pub max_uses_per_user: u64,
}

impl NewPromoCode {
    /// Normalise the code and check every field.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found, field by field.
    pub fn validate(self) -> Result<Self, ValidationError> {
        let code = normalize_code(&self.code)?;

        match self.discount {
            PromoDiscount::FixedAmount(0) => {
                return Err(ValidationError::NotPositive {
                    field: "discount_value",
                });
            }
            PromoDiscount::Percentage(percent)
                if percent <= Decimal::ZERO
                    || percent > Decimal::ONE_HUNDRED
                    || percent.normalize().scale() > PERCENTAGE_SCALE =>
            {
                return Err(ValidationError::Percentage);
            }
            PromoDiscount::FixedAmount(_) | PromoDiscount::Percentage(_) => {}
        }

        if self.min_order_amount == Some(0) {
            return Err(ValidationError::NotPositive {
                field: "min_order_amount",
            });
        }

        if self
            .valid_until
            .is_some_and(|valid_until| valid_until <= self.valid_from)
        {
            return Err(ValidationError::InvertedRange {
                field: "valid_from..valid_until",
            });
        }

        if self.max_uses_total == Some(0) {
            return Err(ValidationError::NotPositive {
                field: "max_uses_total",
            });
        }

        if self.max_uses_per_user == 0 {
            return Err(ValidationError::NotPositive {
                field: "max_uses_per_user",
            });
        }

        Ok(Self { code, ..self })
    }
}

#[cfg(test)]
mod tests {
    use jiff::SignedDuration;
    use testresult::TestResult;

    use crate::{
        cart::{CartLine, CartLineKey, LineSource, ProductSnapshot, price_cart},
        uuids::ProductUuid,
    };

    use super::*;

    fn now() -> Timestamp {
        Timestamp::from_second(1_780_000_000).unwrap_or(Timestamp::UNIX_EPOCH)
    }

    fn promo(code: &str, discount: PromoDiscount) -> PromoCode {
        PromoCode {
            uuid: PromoCodeUuid::new(),
            code: code.to_string(),
            discount,
            min_order_amount: None,
            valid_from: now() - SignedDuration::from_hours(24),
            valid_until: None,
            is_active: true,
            is_public: true,
            first_order_only: false,
            max_uses_total: None,
            max_uses_per_user: 1,
        }
    }

    fn customer() -> PromoContext {
        PromoContext {
            total_uses: 0,
            holder: PromoHolder::User {
                uses: 0,
                orders: 0,
                granted: false,
            },
        }
    }

    fn cart(prices: &[(u64, bool)]) -> Result<PricedCart, PricingError> {
        price_cart(
            prices.iter().map(|&(price, excluded)| {
                let uuid = ProductUuid::new();

                CartLine {
                    key: CartLineKey::Product(uuid),
                    quantity: 1,
                    source: LineSource::Product(ProductSnapshot {
                        uuid,
                        name: "Spark plug".to_string(),
                        price,
                        is_active: true,
                        in_stock: true,
                        exclude_from_promo_codes: excluded,
                    }),
                }
            }),
            now(),
        )
    }

    #[test]
    fn percentage_discount_of_subtotal() -> TestResult {
        let code = promo("SAVE10", PromoDiscount::Percentage(Decimal::TEN));
        let info = evaluate("SAVE10", Some(&code), &customer(), &cart(&[(1_000, false)])?, now())?;

        assert_eq!(info.discount_amount, 100);
        assert_eq!(info.discount_type, DiscountType::Percentage);
        assert!(info.is_valid(), "unexpected error {:?}", info.error);

        Ok(())
    }

    #[test]
    fn fixed_discount_is_capped_at_subtotal() -> TestResult {
        let code = promo("MINUS5000", PromoDiscount::FixedAmount(5_000));
        let info = evaluate("MINUS5000", Some(&code), &customer(), &cart(&[(1_000, false)])?, now())?;

        assert_eq!(info.discount_amount, 1_000);
        assert_eq!(info.discount_type, DiscountType::FixedAmount);

        Ok(())
    }

    #[test]
    fn unknown_code_is_reported_as_data() -> TestResult {
        let info = evaluate("NOPE", None, &customer(), &cart(&[(1_000, false)])?, now())?;

        assert_eq!(info.discount_amount, 0);
        assert_eq!(info.discount_type, DiscountType::FixedAmount);
        assert_eq!(info.error.as_deref(), Some("Код не найден"));

        Ok(())
    }

    #[test]
    fn inactive_or_out_of_window_codes_are_invalid() -> TestResult {
        let priced = cart(&[(1_000, false)])?;

        let inactive = PromoCode {
            is_active: false,
            ..promo("OFF", PromoDiscount::FixedAmount(100))
        };
        let expired = PromoCode {
            valid_until: Some(now() - SignedDuration::from_secs(1)),
            ..promo("OLD", PromoDiscount::FixedAmount(100))
        };
        let early = PromoCode {
            valid_from: now() + SignedDuration::from_hours(1),
            ..promo("SOON", PromoDiscount::FixedAmount(100))
        };
        let used_up = PromoCode {
            max_uses_total: Some(10),
            ..promo("GONE", PromoDiscount::FixedAmount(100))
        };
        let busy = PromoContext {
            total_uses: 10,
            ..customer()
        };

        for (code, context) in [
            (&inactive, customer()),
            (&expired, customer()),
            (&early, customer()),
            (&used_up, busy),
        ] {
            let info = evaluate(&code.code, Some(code), &context, &priced, now())?;

            assert_eq!(
                info.error.as_deref(),
                Some("Код недействителен"),
                "code {} should be invalid",
                code.code
            );
            assert_eq!(info.discount_amount, 0);
        }

        Ok(())
    }

    #[test]
    fn holder_constraints() -> TestResult {
        let priced = cart(&[(1_000, false)])?;
        let private = PromoCode {
            is_public: false,
            ..promo("VIP", PromoDiscount::FixedAmount(100))
        };
        let first = PromoCode {
            first_order_only: true,
            ..promo("HELLO", PromoDiscount::FixedAmount(100))
        };
        let anonymous = PromoContext {
            total_uses: 0,
            holder: PromoHolder::Anonymous,
        };
        let returning = PromoContext {
            total_uses: 0,
            holder: PromoHolder::User {
                uses: 0,
                orders: 2,
                granted: false,
            },
        };
        let repeat = PromoContext {
            total_uses: 1,
            holder: PromoHolder::User {
                uses: 1,
                orders: 1,
                granted: true,
            },
        };
        let granted = PromoContext {
            total_uses: 0,
            holder: PromoHolder::User {
                uses: 0,
                orders: 0,
                granted: true,
            },
        };

        let message = |code: &PromoCode, context: &PromoContext| {
            evaluate(&code.code, Some(code), context, &priced, now()).map(|info| info.error)
        };

        assert_eq!(
            message(&private, &anonymous)?.as_deref(),
            Some("Промокод требует авторизации")
        );
        assert_eq!(
            message(&first, &anonymous)?.as_deref(),
            Some("Промокод требует авторизации")
        );
        assert_eq!(
            message(&first, &returning)?.as_deref(),
            Some("Промокод доступен только для первого заказа")
        );
        assert_eq!(
            message(&private, &customer())?.as_deref(),
            Some("У вас нет доступа к этому промокоду")
        );
        assert_eq!(
            message(&private, &repeat)?.as_deref(),
            Some("Вы уже использовали этот промокод")
        );
        assert_eq!(message(&private, &granted)?, None);

        Ok(())
    }

    #[test]
    fn minimum_applies_to_eligible_amount() -> TestResult {
        let code = PromoCode {
            min_order_amount: Some(2_000),
            ..promo("BIG", PromoDiscount::Percentage(Decimal::TEN))
        };

        // 5000 in the cart, but only 1000 of it may be discounted
        let priced = cart(&[(1_000, false), (4_000, true)])?;
        let info = evaluate("BIG", Some(&code), &customer(), &priced, now())?;

        let message = info.error.unwrap_or_default();

        assert!(
            message.starts_with("Минимальная сумма заказа для применения промокода"),
            "unexpected message {message}"
        );

        let priced = cart(&[(2_500, false), (4_000, true)])?;
        let info = evaluate("BIG", Some(&code), &customer(), &priced, now())?;

        assert_eq!(info.discount_amount, 250);

        Ok(())
    }

    #[test]
    fn fully_excluded_cart_has_nothing_to_discount() -> TestResult {
        let code = promo("SAVE10", PromoDiscount::Percentage(Decimal::TEN));
        let info = evaluate("SAVE10", Some(&code), &customer(), &cart(&[(1_000, true)])?, now())?;

        assert_eq!(
            info.error.as_deref(),
            Some("Нет товаров, к которым применим промокод")
        );

        Ok(())
    }

    #[test]
    fn emptied_cart_invalidates_previous_discount() -> TestResult {
        let code = PromoCode {
            min_order_amount: Some(500),
            ..promo("SAVE10", PromoDiscount::Percentage(Decimal::TEN))
        };

        let before = evaluate("SAVE10", Some(&code), &customer(), &cart(&[(1_000, false)])?, now())?;
        let after = evaluate("SAVE10", Some(&code), &customer(), &cart(&[])?, now())?;

        assert!(before.is_valid(), "code should apply to a full cart");
        assert!(!after.is_valid(), "code should not apply to an empty cart");
        assert_eq!(after.discount_amount, 0);

        Ok(())
    }

    #[test]
    fn normalize_code_uppercases_and_checks_format() -> TestResult {
        assert_eq!(normalize_code("  save10 ")?, "SAVE10");
        assert_eq!(normalize_code("spring_2026-A")?, "SPRING_2026-A");
        assert_eq!(normalize_code("ab"), Err(ValidationError::PromoCodeFormat));
        assert_eq!(
            normalize_code("save 10"),
            Err(ValidationError::PromoCodeFormat)
        );
        assert_eq!(
            normalize_code("скидка"),
            Err(ValidationError::PromoCodeFormat)
        );

        Ok(())
    }

    #[test]
    fn new_promo_code_validation() -> TestResult {
        let base = NewPromoCode {
            code: "spring".to_string(),
            discount: PromoDiscount::Percentage(Decimal::new(125, 1)),
            min_order_amount: None,
            valid_from: now(),
            valid_until: Some(now() + SignedDuration::from_hours(48)),
            is_public: true,
            first_order_only: false,
            max_uses_total: None,
            max_uses_per_user: 1,
        };

        assert_eq!(base.clone().validate()?.code, "SPRING");
        assert_eq!(
            NewPromoCode {
                discount: PromoDiscount::Percentage(Decimal::new(101, 0)),
                ..base.clone()
            }
            .validate(),
            Err(ValidationError::Percentage)
        );
        assert_eq!(
            NewPromoCode {
                discount: PromoDiscount::Percentage(Decimal::new(12_345, 3)),
                ..base.clone()
            }
            .validate(),
            Err(ValidationError::Percentage)
        );
        assert!(
            NewPromoCode {
                discount: PromoDiscount::Percentage(Decimal::new(12_340, 3)),
                ..base.clone()
            }
            .validate()
            .is_ok(),
            "trailing zeros fit the stored scale"
        );
        assert_eq!(
            NewPromoCode {
                valid_until: Some(now()),
                ..base.clone()
            }
            .validate(),
            Err(ValidationError::InvertedRange {
                field: "valid_from..valid_until"
            })
        );
        assert_eq!(
            NewPromoCode {
                max_uses_per_user: 0,
                ..base
            }
            .validate(),
            Err(ValidationError::NotPositive {
                field: "max_uses_per_user"
            })
        );

        Ok(())
    }
}
