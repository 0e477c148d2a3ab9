//! Favorites Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use spareline::{
    identity::Owner,
    uuids::{AnonymousUuid, ProductUuid, UserUuid},
};
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};
use uuid::Uuid;

use crate::{
    database::try_get_amount,
    domain::favorites::records::{FavoriteRecord, FavoriteUuid},
};

const LIST_FAVORITES_SQL: &str = include_str!("sql/list_favorites.sql");
const ADD_FAVORITE_SQL: &str = include_str!("sql/add_favorite.sql");
const REMOVE_FAVORITE_SQL: &str = include_str!("sql/remove_favorite.sql");
const LIST_ANONYMOUS_FAVORITE_PRODUCTS_SQL: &str =
    include_str!("sql/list_anonymous_favorite_products.sql");
const INSERT_USER_FAVORITES_SQL: &str = include_str!("sql/insert_user_favorites.sql");
const DELETE_ANONYMOUS_FAVORITES_SQL: &str = include_str!("sql/delete_anonymous_favorites.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgFavoritesRepository;

impl PgFavoritesRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn list(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner: Owner,
    ) -> Result<Vec<FavoriteRecord>, sqlx::Error> {
        query_as::<Postgres, FavoriteRecord>(LIST_FAVORITES_SQL)
            .bind(owner.user_uuid().map(UserUuid::into_uuid))
            .bind(owner.anonymous_uuid().map(AnonymousUuid::into_uuid))
            .fetch_all(&mut **tx)
            .await
    }

    /// Returns whether a new favorite was stored.
    pub(crate) async fn add(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner: Owner,
        product: ProductUuid,
    ) -> Result<bool, sqlx::Error> {
        let rows_affected = query(ADD_FAVORITE_SQL)
            .bind(FavoriteUuid::new().into_uuid())
            .bind(owner.user_uuid().map(UserUuid::into_uuid))
            .bind(owner.anonymous_uuid().map(AnonymousUuid::into_uuid))
            .bind(product.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }

    pub(crate) async fn remove(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner: Owner,
        product: ProductUuid,
    ) -> Result<bool, sqlx::Error> {
        let rows_affected = query(REMOVE_FAVORITE_SQL)
            .bind(owner.user_uuid().map(UserUuid::into_uuid))
            .bind(owner.anonymous_uuid().map(AnonymousUuid::into_uuid))
            .bind(product.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }

    /// Move an anonymous visitor's favorites to `user`, skipping products the user
    /// already has. Returns how many favorites were added to the user.
    pub(crate) async fn merge(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        anonymous: AnonymousUuid,
        user: UserUuid,
    ) -> Result<u64, sqlx::Error> {
        let products: Vec<Uuid> = query_scalar(LIST_ANONYMOUS_FAVORITE_PRODUCTS_SQL)
            .bind(anonymous.into_uuid())
            .fetch_all(&mut **tx)
            .await?;

        let mut added = 0;

        if !products.is_empty() {
            let uuids: Vec<Uuid> = products
                .iter()
                .map(|_| FavoriteUuid::new().into_uuid())
                .collect();

            added = query(INSERT_USER_FAVORITES_SQL)
                .bind(user.into_uuid())
                .bind(uuids)
                .bind(products)
                .execute(&mut **tx)
                .await?
                .rows_affected();
        }

        query(DELETE_ANONYMOUS_FAVORITES_SQL)
            .bind(anonymous.into_uuid())
            .execute(&mut **tx)
            .await?;

        Ok(added)
    }
}

impl<'r> FromRow<'r, PgRow> for FavoriteRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: FavoriteUuid::from_uuid(row.try_get("uuid")?),
            product_uuid: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            name: row.try_get("product_name")?,
            sku: row.try_get("product_sku")?,
            price: try_get_amount(row, "product_price")?,
            is_active: row.try_get("product_is_active")?,
            in_stock: row.try_get("product_in_stock")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}
