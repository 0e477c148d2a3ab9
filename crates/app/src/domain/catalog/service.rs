//! Catalog Service

use async_trait::async_trait;
use mockall::automock;
use spareline::{
    facets::{self, AvailableFilters, ProductFilter},
    identity::AuthenticatedUser,
    uuids::ProductUuid,
};
use tracing::{Span, info};

use crate::{
    database::Db,
    domain::catalog::{
        CatalogServiceError,
        records::{PricingUpdate, ProductRecord},
        repositories::{PgFacetsRepository, PgProductsRepository},
    },
};

#[derive(Debug, Clone)]
pub struct PgCatalogService {
    db: Db,
    products: PgProductsRepository,
    facets: PgFacetsRepository,
}

impl PgCatalogService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            products: PgProductsRepository::new(),
            facets: PgFacetsRepository::new(),
        }
    }
}

#[async_trait]
impl CatalogService for PgCatalogService {
    #[tracing::instrument(
        name = "catalog.service.available_filters",
        skip(self, filter),
        fields(
            product_count = tracing::field::Empty,
            attribute_count = tracing::field::Empty
        ),
        err
    )]
    async fn available_filters(
        &self,
        filter: ProductFilter,
    ) -> Result<AvailableFilters, CatalogServiceError> {
        let filter = filter.validate()?;

        let mut tx = self.db.begin().await?;

        let products = self
            .facets
            .products(&mut tx, filter.search.as_deref(), filter.in_stock)
            .await?;

        let attributes = self.facets.attributes(&mut tx).await?;

        tx.commit().await?;

        let span = Span::current();

        span.record("product_count", tracing::field::display(products.len()));
        span.record("attribute_count", tracing::field::display(attributes.len()));

        Ok(facets::build_facets(&products, &attributes, &filter))
    }

    #[tracing::instrument(
        name = "catalog.service.update_pricing",
        skip(self, actor, update),
        fields(manager_uuid = %actor.uuid, product_uuid = %product),
        err
    )]
    async fn update_pricing(
        &self,
        actor: AuthenticatedUser,
        product: ProductUuid,
        update: PricingUpdate,
    ) -> Result<ProductRecord, CatalogServiceError> {
        if !actor.role.is_staff() {
            return Err(CatalogServiceError::Forbidden);
        }

        let update = update.validate()?;

        let mut tx = self.db.begin().await?;

        let record = self.products.update_pricing(&mut tx, product, update).await?;

        tx.commit().await?;

        info!(
            product_uuid = %record.uuid,
            price = record.price,
            is_active = record.is_active,
            "updated product pricing"
        );

        Ok(record)
    }

    #[tracing::instrument(
        name = "catalog.service.get_product",
        skip(self),
        fields(product_uuid = %product),
        err
    )]
    async fn get_product(&self, product: ProductUuid) -> Result<ProductRecord, CatalogServiceError> {
        let mut tx = self.db.begin().await?;

        let record = self
            .products
            .get(&mut tx, product)
            .await?
            .ok_or(CatalogServiceError::NotFound)?;

        tx.commit().await?;

        Ok(record)
    }
}

#[automock]
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Facet counts for the products matching `filter`.
    async fn available_filters(
        &self,
        filter: ProductFilter,
    ) -> Result<AvailableFilters, CatalogServiceError>;

    /// Change a product's price, activity, stock or promo exclusion.
    async fn update_pricing(
        &self,
        actor: AuthenticatedUser,
        product: ProductUuid,
        update: PricingUpdate,
    ) -> Result<ProductRecord, CatalogServiceError>;

    async fn get_product(&self, product: ProductUuid) -> Result<ProductRecord, CatalogServiceError>;
}

#[cfg(test)]
mod tests {
    use spareline::facets::{AttributeSelection, AvailableFilters, FacetValues, ProductFilter};
    use testresult::TestResult;

    use crate::{
        domain::catalog::{CatalogService, CatalogServiceError, records::PricingUpdate},
        test::{TestContext, fixtures},
    };

    #[tokio::test]
    async fn no_matches_give_empty_facets() -> TestResult {
        let ctx = TestContext::new().await;

        fixtures::product(&ctx, "Brake disc", 300_000).await;

        let filters = ctx
            .catalog
            .available_filters(ProductFilter {
                search: Some("windscreen".to_string()),
                ..ProductFilter::default()
            })
            .await?;

        assert_eq!(filters, AvailableFilters::default());
        assert!(filters.price_range.is_none(), "no price span");

        Ok(())
    }

    #[tokio::test]
    async fn selected_brand_keeps_other_brands_counted() -> TestResult {
        let ctx = TestContext::new().await;
        let bosch = fixtures::brand(&ctx, "Bosch").await;
        let brembo = fixtures::brand(&ctx, "Brembo").await;

        let pad = fixtures::product_in(&ctx, "Brake pad", 200_000, Some(bosch)).await;
        let disc = fixtures::product_in(&ctx, "Brake disc", 500_000, Some(brembo)).await;
        let caliper = fixtures::product_in(&ctx, "Brake caliper", 900_000, Some(brembo)).await;

        fixtures::category(&ctx, "Brakes", &[pad, disc, caliper]).await;

        let (position, options) = fixtures::select_attribute(&ctx, "Axle", &["Front", "Rear"]).await;
        let (front, rear) = match options.as_slice() {
            [front, rear] => (*front, *rear),
            _ => return Err("expected two axle options".into()),
        };

        fixtures::set_option(&ctx, pad, position, front).await;
        fixtures::set_option(&ctx, disc, position, front).await;
        fixtures::set_option(&ctx, caliper, position, rear).await;

        let filters = ctx
            .catalog
            .available_filters(ProductFilter {
                brand_uuids: vec![brembo],
                ..ProductFilter::default()
            })
            .await?;

        let brand_count = |uuid| {
            filters
                .brands
                .iter()
                .find(|facet| facet.uuid == uuid)
                .map(|facet| facet.count)
        };

        assert_eq!(brand_count(bosch), Some(1), "other brands stay visible");
        assert_eq!(brand_count(brembo), Some(2));

        let range = filters.price_range.ok_or("price range missing")?;

        assert_eq!((range.min, range.max), (500_000, 900_000));

        let axle = filters
            .attributes
            .iter()
            .find(|facet| facet.uuid == position)
            .ok_or("axle facet missing")?;

        let FacetValues::Options(counts) = &axle.values else {
            return Err("axle should list options".into());
        };

        let option_count = |uuid| {
            counts
                .iter()
                .find(|count| count.uuid == uuid)
                .map(|count| count.count)
        };

        assert_eq!(option_count(front), Some(1), "counted within the brand");
        assert_eq!(option_count(rear), Some(1));

        // selecting an axle narrows the brand counts but not the axle counts
        let filters = ctx
            .catalog
            .available_filters(ProductFilter {
                attributes: [(position, AttributeSelection::Options(vec![rear]))].into(),
                ..ProductFilter::default()
            })
            .await?;

        assert_eq!(filters.brands.len(), 1, "only Brembo has a rear part");

        Ok(())
    }

    #[tokio::test]
    async fn pricing_updates_are_for_staff() -> TestResult {
        let ctx = TestContext::new().await;
        let manager = fixtures::manager(&ctx).await;
        let customer = fixtures::customer(&ctx).await;
        let product = fixtures::product(&ctx, "Thermostat", 150_000).await;

        let update = PricingUpdate {
            price: Some(175_000),
            exclude_from_promo_codes: Some(true),
            ..PricingUpdate::default()
        };

        let forbidden = ctx.catalog.update_pricing(customer, product, update).await;

        assert!(
            matches!(forbidden, Err(CatalogServiceError::Forbidden)),
            "unexpected result: {forbidden:?}"
        );

        let updated = ctx.catalog.update_pricing(manager, product, update).await?;

        assert_eq!(updated.price, 175_000);
        assert!(updated.exclude_from_promo_codes, "flag set");
        assert!(updated.is_active, "untouched fields keep their value");

        Ok(())
    }
}
