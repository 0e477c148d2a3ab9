//! Favorites Service

use async_trait::async_trait;
use mockall::automock;
use spareline::{identity::Owner, uuids::ProductUuid};
use tracing::info;

use crate::{
    database::Db,
    domain::favorites::{
        FavoritesServiceError, records::FavoriteRecord, repository::PgFavoritesRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgFavoritesService {
    db: Db,
    favorites: PgFavoritesRepository,
}

impl PgFavoritesService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            favorites: PgFavoritesRepository::new(),
        }
    }
}

#[async_trait]
impl FavoritesService for PgFavoritesService {
    #[tracing::instrument(name = "favorites.service.list", skip(self), fields(owner = ?owner), err)]
    async fn list(&self, owner: Owner) -> Result<Vec<FavoriteRecord>, FavoritesServiceError> {
        let mut tx = self.db.begin().await?;

        let favorites = self.favorites.list(&mut tx, owner).await?;

        tx.commit().await?;

        Ok(favorites)
    }

    #[tracing::instrument(
        name = "favorites.service.add",
        skip(self),
        fields(owner = ?owner, product_uuid = %product),
        err
    )]
    async fn add(&self, owner: Owner, product: ProductUuid) -> Result<(), FavoritesServiceError> {
        let mut tx = self.db.begin().await?;

        if self.favorites.add(&mut tx, owner, product).await? {
            info!(product_uuid = %product, "added favorite");
        }

        tx.commit().await?;

        Ok(())
    }

    #[tracing::instrument(
        name = "favorites.service.remove",
        skip(self),
        fields(owner = ?owner, product_uuid = %product),
        err
    )]
    async fn remove(&self, owner: Owner, product: ProductUuid) -> Result<(), FavoritesServiceError> {
        let mut tx = self.db.begin().await?;

        self.favorites.remove(&mut tx, owner, product).await?;

        tx.commit().await?;

        Ok(())
    }
}

#[automock]
#[async_trait]
pub trait FavoritesService: Send + Sync {
    async fn list(&self, owner: Owner) -> Result<Vec<FavoriteRecord>, FavoritesServiceError>;

    /// Mark a product as favorite. Adding it twice keeps one entry.
    async fn add(&self, owner: Owner, product: ProductUuid) -> Result<(), FavoritesServiceError>;

    /// Unmark a product. Removing an absent favorite succeeds.
    async fn remove(&self, owner: Owner, product: ProductUuid) -> Result<(), FavoritesServiceError>;
}

#[cfg(test)]
mod tests {
    use spareline::{identity::Owner, uuids::ProductUuid};
    use testresult::TestResult;

    use crate::{
        domain::favorites::{FavoritesService, FavoritesServiceError},
        test::{TestContext, fixtures},
    };

    #[tokio::test]
    async fn adding_twice_keeps_one_favorite() -> TestResult {
        let ctx = TestContext::new().await;
        let owner = Owner::User(fixtures::customer(&ctx).await.uuid);
        let product = fixtures::product(&ctx, "Radiator", 900_000).await;

        ctx.favorites.add(owner, product).await?;
        ctx.favorites.add(owner, product).await?;

        let favorites = ctx.favorites.list(owner).await?;

        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites.first().map(|f| f.product_uuid), Some(product));

        ctx.favorites.remove(owner, product).await?;
        ctx.favorites.remove(owner, product).await?;

        assert!(ctx.favorites.list(owner).await?.is_empty(), "removed");

        Ok(())
    }

    #[tokio::test]
    async fn unknown_product_is_rejected() -> TestResult {
        let ctx = TestContext::new().await;
        let owner = Owner::User(fixtures::customer(&ctx).await.uuid);

        let result = ctx.favorites.add(owner, ProductUuid::new()).await;

        assert!(
            matches!(result, Err(FavoritesServiceError::ProductNotFound)),
            "unexpected result: {result:?}"
        );

        Ok(())
    }
}
