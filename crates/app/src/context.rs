//! App Context

use std::sync::Arc;

use thiserror::Error;

use crate::{
    database::{self, Db},
    domain::{
        carts::{CartsService, PgCartsService},
        catalog::{CatalogService, PgCatalogService},
        favorites::{FavoritesService, PgFavoritesService},
        identity::{
            IdentityService, PgIdentityService, otp::OtpDelivery, records::IdentitySettings,
        },
        offers::{OffersService, PgOffersService},
        orders::{OrdersService, PgOrdersService},
        promo_codes::{PgPromoCodesService, PromoCodesService},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),
}

#[derive(Clone)]
pub struct AppContext {
    pub identity: Arc<dyn IdentityService>,
    pub carts: Arc<dyn CartsService>,
    pub favorites: Arc<dyn FavoritesService>,
    pub catalog: Arc<dyn CatalogService>,
    pub offers: Arc<dyn OffersService>,
    pub orders: Arc<dyn OrdersService>,
    pub promo_codes: Arc<dyn PromoCodesService>,
}

impl AppContext {
    /// Build every service over one shared database handle.
    #[must_use]
    pub fn new(db: Db, settings: IdentitySettings, delivery: Arc<dyn OtpDelivery>) -> Self {
        Self {
            identity: Arc::new(PgIdentityService::new(db.clone(), settings, delivery)),
            carts: Arc::new(PgCartsService::new(db.clone())),
            favorites: Arc::new(PgFavoritesService::new(db.clone())),
            catalog: Arc::new(PgCatalogService::new(db.clone())),
            offers: Arc::new(PgOffersService::new(db.clone())),
            orders: Arc::new(PgOrdersService::new(db.clone())),
            promo_codes: Arc::new(PgPromoCodesService::new(db)),
        }
    }

    /// Build application context from a database URL.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection fails.
    pub async fn from_database_url(
        url: &str,
        settings: IdentitySettings,
        delivery: Arc<dyn OtpDelivery>,
    ) -> Result<Self, AppInitError> {
        let pool = database::connect(url)
            .await
            .map_err(AppInitError::Database)?;

        Ok(Self::new(Db::new(pool), settings, delivery))
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext").finish_non_exhaustive()
    }
}
