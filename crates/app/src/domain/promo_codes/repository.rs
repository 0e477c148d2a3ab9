//! Promo Codes Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use spareline::{
    promo::{DiscountType, NewPromoCode, PromoCode, PromoContext, PromoDiscount, PromoHolder},
    uuids::{PromoCodeUuid, UserUuid},
};
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};
use uuid::Uuid;

use crate::{
    database::{amount_param, try_get_amount, try_get_optional_amount},
    domain::{orders::records::OrderUuid, promo_codes::records::PromoCodeUsageUuid},
};

const FIND_PROMO_CODE_SQL: &str = include_str!("sql/find_promo_code.sql");
const LOCK_PROMO_CODE_SQL: &str = include_str!("sql/lock_promo_code.sql");
const CREATE_PROMO_CODE_SQL: &str = include_str!("sql/create_promo_code.sql");
const GET_USAGE_CONTEXT_SQL: &str = include_str!("sql/get_usage_context.sql");
const CREATE_PROMO_CODE_USAGE_SQL: &str = include_str!("sql/create_promo_code_usage.sql");
const CREATE_PROMO_CODE_GRANT_SQL: &str = include_str!("sql/create_promo_code_grant.sql");
const PROMO_CODE_EXISTS_SQL: &str = include_str!("sql/promo_code_exists.sql");

/// Row wrapper so the engine's [`PromoCode`] can be decoded.
struct PromoCodeRow(PromoCode);

#[derive(Debug, Clone, Default)]
pub(crate) struct PgPromoCodesRepository;

impl PgPromoCodesRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Look a code up; with `lock` the row stays locked until the transaction ends.
    pub(crate) async fn find_by_code(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        code: &str,
        lock: bool,
    ) -> Result<Option<PromoCode>, sqlx::Error> {
        let sql = if lock {
            LOCK_PROMO_CODE_SQL
        } else {
            FIND_PROMO_CODE_SQL
        };

        let row = query_as::<Postgres, PromoCodeRow>(sql)
            .bind(code)
            .fetch_optional(&mut **tx)
            .await?;

        Ok(row.map(|row| row.0))
    }

    pub(crate) async fn exists(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        uuid: PromoCodeUuid,
    ) -> Result<bool, sqlx::Error> {
        query_scalar(PROMO_CODE_EXISTS_SQL)
            .bind(uuid.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn create(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        uuid: PromoCodeUuid,
        promo: &NewPromoCode,
    ) -> Result<PromoCode, sqlx::Error> {
        let discount_value = match promo.discount {
            PromoDiscount::FixedAmount(amount) => Decimal::from(amount),
            PromoDiscount::Percentage(percent) => percent,
        };

        let row = query_as::<Postgres, PromoCodeRow>(CREATE_PROMO_CODE_SQL)
            .bind(uuid.into_uuid())
            .bind(&promo.code)
            .bind(promo.discount.discount_type().as_str())
            .bind(discount_value)
            .bind(promo.min_order_amount.map(amount_param).transpose()?)
            .bind(SqlxTimestamp::from(promo.valid_from))
            .bind(promo.valid_until.map(SqlxTimestamp::from))
            .bind(promo.is_public)
            .bind(promo.first_order_only)
            .bind(promo.max_uses_total.map(amount_param).transpose()?)
            .bind(amount_param(promo.max_uses_per_user)?)
            .fetch_one(&mut **tx)
            .await?;

        Ok(row.0)
    }

    /// Usage counters for `promo`, seen by `user` (or an anonymous visitor).
    pub(crate) async fn usage_context(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        promo: PromoCodeUuid,
        user: Option<UserUuid>,
    ) -> Result<PromoContext, sqlx::Error> {
        let row = query(GET_USAGE_CONTEXT_SQL)
            .bind(promo.into_uuid())
            .bind(user.map(UserUuid::into_uuid))
            .fetch_one(&mut **tx)
            .await?;

        let holder = match user {
            None => PromoHolder::Anonymous,
            Some(_) => PromoHolder::User {
                uses: try_get_amount(&row, "user_uses")?,
                orders: try_get_amount(&row, "user_orders")?,
                granted: row.try_get("granted")?,
            },
        };

        Ok(PromoContext {
            total_uses: try_get_amount(&row, "total_uses")?,
            holder,
        })
    }

    pub(crate) async fn record_usage(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        promo: PromoCodeUuid,
        user: UserUuid,
        order: OrderUuid,
        discount_amount: u64,
    ) -> Result<(), sqlx::Error> {
        query(CREATE_PROMO_CODE_USAGE_SQL)
            .bind(PromoCodeUsageUuid::new().into_uuid())
            .bind(promo.into_uuid())
            .bind(user.into_uuid())
            .bind(order.into_uuid())
            .bind(amount_param(discount_amount)?)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    pub(crate) async fn grant(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        promo: PromoCodeUuid,
        user: UserUuid,
    ) -> Result<(), sqlx::Error> {
        query(CREATE_PROMO_CODE_GRANT_SQL)
            .bind(promo.into_uuid())
            .bind(user.into_uuid())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}

fn decode_error(col: &str, message: String) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: message.into(),
    }
}

impl<'r> FromRow<'r, PgRow> for PromoCodeRow {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let discount_type: String = row.try_get("discount_type")?;
        let discount_value: Decimal = row.try_get("discount_value")?;

        let discount = match discount_type.parse::<DiscountType>() {
            Ok(DiscountType::Percentage) => PromoDiscount::Percentage(discount_value),
            Ok(DiscountType::FixedAmount) => discount_value
                .fract()
                .is_zero()
                .then(|| discount_value.to_u64())
                .flatten()
                .map(PromoDiscount::FixedAmount)
                .ok_or_else(|| {
                    decode_error("discount_value", format!("not whole kopecks: {discount_value}"))
                })?,
            Err(error) => return Err(decode_error("discount_type", error.to_string())),
        };

        let max_uses_total = try_get_optional_amount(row, "max_uses_total")?;

        Ok(Self(PromoCode {
            uuid: PromoCodeUuid::from_uuid(row.try_get::<Uuid, _>("uuid")?),
            code: row.try_get("code")?,
            discount,
            min_order_amount: try_get_optional_amount(row, "min_order_amount")?,
            valid_from: row.try_get::<SqlxTimestamp, _>("valid_from")?.to_jiff(),
            valid_until: row
                .try_get::<Option<SqlxTimestamp>, _>("valid_until")?
                .map(SqlxTimestamp::to_jiff),
            is_active: row.try_get("is_active")?,
            is_public: row.try_get("is_public")?,
            first_order_only: row.try_get("first_order_only")?,
            max_uses_total,
            max_uses_per_user: try_get_amount(row, "max_uses_per_user")?,
        }))
    }
}
