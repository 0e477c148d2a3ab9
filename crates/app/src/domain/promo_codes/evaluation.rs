//! Promo code evaluation against a stored cart.

use jiff::Timestamp;
use spareline::{cart::PricedCart, promo, uuids::UserUuid};
use sqlx::{Postgres, Transaction};

use crate::domain::promo_codes::{
    PromoCodesServiceError, records::EvaluatedPromo, repository::PgPromoCodesRepository,
};

/// Load `code` with its usage counters and evaluate it for `user` against `cart`.
///
/// With `lock` the promo code row is held `FOR UPDATE` so usage limits cannot be
/// raced by a concurrent checkout.
pub(crate) async fn evaluate(
    repository: &PgPromoCodesRepository,
    tx: &mut Transaction<'_, Postgres>,
    code: &str,
    user: Option<UserUuid>,
    cart: &PricedCart,
    now: Timestamp,
    lock: bool,
) -> Result<EvaluatedPromo, PromoCodesServiceError> {
    let stored = repository.find_by_code(tx, code, lock).await?;

    let context = match &stored {
        Some(promo) => repository.usage_context(tx, promo.uuid, user).await?,
        None => promo::PromoContext {
            total_uses: 0,
            holder: promo::PromoHolder::Anonymous,
        },
    };

    let info = promo::evaluate(code, stored.as_ref(), &context, cart, now)?;

    Ok(EvaluatedPromo {
        info,
        promo: stored,
    })
}
