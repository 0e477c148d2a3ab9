//! Carts Repository

use spareline::{
    identity::Owner,
    uuids::{AnonymousUuid, UserUuid},
};
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use uuid::Uuid;

use crate::domain::carts::records::{CartRecord, CartUuid};

const FIND_CART_SQL: &str = include_str!("../sql/find_cart.sql");
const LOCK_CART_SQL: &str = include_str!("../sql/lock_cart.sql");
const CREATE_CART_SQL: &str = include_str!("../sql/create_cart.sql");
const SET_CART_PROMO_CODE_SQL: &str = include_str!("../sql/set_cart_promo_code.sql");
const DELETE_CART_SQL: &str = include_str!("../sql/delete_cart.sql");
const REASSIGN_CART_SQL: &str = include_str!("../sql/reassign_cart.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCartsRepository;

impl PgCartsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn find(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner: Owner,
    ) -> Result<Option<CartRecord>, sqlx::Error> {
        query_as::<Postgres, CartRecord>(FIND_CART_SQL)
            .bind(owner.user_uuid().map(UserUuid::into_uuid))
            .bind(owner.anonymous_uuid().map(AnonymousUuid::into_uuid))
            .fetch_optional(&mut **tx)
            .await
    }

    /// Find the owner's cart and hold its row lock until the transaction ends.
    pub(crate) async fn lock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner: Owner,
    ) -> Result<Option<CartRecord>, sqlx::Error> {
        query_as::<Postgres, CartRecord>(LOCK_CART_SQL)
            .bind(owner.user_uuid().map(UserUuid::into_uuid))
            .bind(owner.anonymous_uuid().map(AnonymousUuid::into_uuid))
            .fetch_optional(&mut **tx)
            .await
    }

    /// Return the owner's cart, creating it first when there is none.
    ///
    /// The returned cart is locked.
    pub(crate) async fn ensure(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner: Owner,
    ) -> Result<CartRecord, sqlx::Error> {
        query(CREATE_CART_SQL)
            .bind(CartUuid::new().into_uuid())
            .bind(owner.user_uuid().map(UserUuid::into_uuid))
            .bind(owner.anonymous_uuid().map(AnonymousUuid::into_uuid))
            .execute(&mut **tx)
            .await?;

        self.lock(tx, owner).await?.ok_or(sqlx::Error::RowNotFound)
    }

    pub(crate) async fn set_promo_code(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
        code: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        query(SET_CART_PROMO_CODE_SQL)
            .bind(cart.into_uuid())
            .bind(code)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    pub(crate) async fn delete(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
    ) -> Result<(), sqlx::Error> {
        query(DELETE_CART_SQL)
            .bind(cart.into_uuid())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    /// Hand an anonymous cart over to `user`.
    pub(crate) async fn reassign(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
        user: UserUuid,
    ) -> Result<(), sqlx::Error> {
        query(REASSIGN_CART_SQL)
            .bind(cart.into_uuid())
            .bind(user.into_uuid())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}

impl<'r> FromRow<'r, PgRow> for CartRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let user: Option<Uuid> = row.try_get("user_uuid")?;
        let anonymous: Option<Uuid> = row.try_get("anonymous_uuid")?;

        let owner = match (user, anonymous) {
            (Some(user), None) => Owner::User(UserUuid::from_uuid(user)),
            (None, Some(anonymous)) => Owner::Anonymous(AnonymousUuid::from_uuid(anonymous)),
            _ => {
                return Err(sqlx::Error::ColumnDecode {
                    index: "user_uuid".to_string(),
                    source: "cart must have exactly one owner".into(),
                });
            }
        };

        Ok(Self {
            uuid: CartUuid::from_uuid(row.try_get("uuid")?),
            owner,
            promo_code: row.try_get("promo_code")?,
        })
    }
}
