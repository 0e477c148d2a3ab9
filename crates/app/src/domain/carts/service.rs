//! Carts Service

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use spareline::{
    cart::{self, AddItem, CartLineKey, CartSummary},
    identity::Owner,
    promo::{self, PromoCodeInfo},
    uuids::AnonymousUuid,
};
use sqlx::{Postgres, Transaction};
use tracing::{Span, info};

use crate::{
    database::Db,
    domain::{
        carts::{
            CartsServiceError,
            records::{CartRecord, CartView},
            repositories::{PgCartItemsRepository, PgCartsRepository},
        },
        catalog::repositories::PgProductsRepository,
        identity::repositories::PgAnonymousUsersRepository,
        offers::repository::PgOffersRepository,
        promo_codes::{evaluation, repository::PgPromoCodesRepository},
    },
};

#[derive(Debug, Clone)]
pub struct PgCartsService {
    db: Db,
    carts: PgCartsRepository,
    items: PgCartItemsRepository,
    products: PgProductsRepository,
    offers: PgOffersRepository,
    promo_codes: PgPromoCodesRepository,
    visitors: PgAnonymousUsersRepository,
}

impl PgCartsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            carts: PgCartsRepository::new(),
            items: PgCartItemsRepository::new(),
            products: PgProductsRepository::new(),
            offers: PgOffersRepository::new(),
            promo_codes: PgPromoCodesRepository::new(),
            visitors: PgAnonymousUsersRepository::new(),
        }
    }

    /// Price `cart` at `now` and re-evaluate its promo code.
    async fn view(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: Option<&CartRecord>,
        now: Timestamp,
    ) -> Result<CartView, CartsServiceError> {
        let Some(cart) = cart else {
            return Ok(CartView::default());
        };

        let lines = self.items.lines(tx, cart.uuid).await?;
        let priced = cart::price_cart(lines, now)?;

        let promo_code = match &cart.promo_code {
            Some(code) => {
                let evaluated = evaluation::evaluate(
                    &self.promo_codes,
                    tx,
                    code,
                    cart.owner.user_uuid(),
                    &priced,
                    now,
                    false,
                )
                .await?;

                Some(evaluated.info)
            }
            None => None,
        };

        Ok(CartView {
            cart: priced,
            promo_code,
        })
    }

    /// Refuse to create carts for a visitor that sign-in already merged away.
    async fn ensure_visitor_active(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        visitor: AnonymousUuid,
    ) -> Result<(), CartsServiceError> {
        match self.visitors.share(tx, visitor).await? {
            Some(record) if record.retired_at.is_none() => Ok(()),
            _ => Err(CartsServiceError::RetiredVisitor),
        }
    }

    /// Check that the product or offer behind `key` can be added right now.
    async fn ensure_purchasable(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        key: CartLineKey,
        now: Timestamp,
    ) -> Result<(), CartsServiceError> {
        let availability = match key {
            CartLineKey::Product(uuid) => self
                .products
                .get(tx, uuid)
                .await?
                .ok_or(CartsServiceError::ItemNotFound)?
                .snapshot()
                .availability(),
            CartLineKey::Offer(uuid) => self
                .offers
                .get(tx, uuid)
                .await?
                .ok_or(CartsServiceError::ItemNotFound)?
                .state()
                .availability(now),
        };

        if availability.is_available() {
            Ok(())
        } else {
            Err(CartsServiceError::Unavailable(availability))
        }
    }
}

#[async_trait]
impl CartsService for PgCartsService {
    #[tracing::instrument(
        name = "carts.service.get_cart",
        skip(self),
        fields(owner = ?owner, line_count = tracing::field::Empty),
        err
    )]
    async fn get_cart(&self, owner: Owner) -> Result<CartView, CartsServiceError> {
        let now = Timestamp::now();
        let mut tx = self.db.begin().await?;

        let cart = self.carts.find(&mut tx, owner).await?;
        let view = self.view(&mut tx, cart.as_ref(), now).await?;

        tx.commit().await?;

        Span::current().record(
            "line_count",
            tracing::field::display(view.cart.items_count()),
        );

        Ok(view)
    }

    #[tracing::instrument(name = "carts.service.get_summary", skip(self), fields(owner = ?owner), err)]
    async fn get_summary(&self, owner: Owner) -> Result<CartSummary, CartsServiceError> {
        Ok(self.get_cart(owner).await?.summary())
    }

    #[tracing::instrument(
        name = "carts.service.add_item",
        skip(self, item),
        fields(
            owner = ?owner,
            item_key = tracing::field::Empty,
            quantity = item.quantity
        ),
        err
    )]
    async fn add_item(&self, owner: Owner, item: AddItem) -> Result<CartView, CartsServiceError> {
        let item = item.validate()?;
        let now = Timestamp::now();

        Span::current().record("item_key", tracing::field::display(item.key));

        let mut tx = self.db.begin().await?;

        if let Owner::Anonymous(visitor) = owner {
            self.ensure_visitor_active(&mut tx, visitor).await?;
        }

        self.ensure_purchasable(&mut tx, item.key, now).await?;

        let cart = self.carts.ensure(&mut tx, owner).await?;

        self.items
            .add(&mut tx, cart.uuid, item.key, item.quantity)
            .await?;

        let view = self.view(&mut tx, Some(&cart), now).await?;

        tx.commit().await?;

        info!(cart_uuid = %cart.uuid, item_key = %item.key, "added cart item");

        Ok(view)
    }

    #[tracing::instrument(
        name = "carts.service.update_item",
        skip(self),
        fields(owner = ?owner, item_key = %key),
        err
    )]
    async fn update_item(
        &self,
        owner: Owner,
        key: CartLineKey,
        quantity: u32,
    ) -> Result<CartView, CartsServiceError> {
        let quantity = cart::quantity(quantity)?;
        let now = Timestamp::now();

        let mut tx = self.db.begin().await?;

        let cart = self
            .carts
            .lock(&mut tx, owner)
            .await?
            .ok_or(CartsServiceError::LineNotFound)?;

        if !self
            .items
            .set_quantity(&mut tx, cart.uuid, key, quantity)
            .await?
        {
            return Err(CartsServiceError::LineNotFound);
        }

        let view = self.view(&mut tx, Some(&cart), now).await?;

        tx.commit().await?;

        info!(cart_uuid = %cart.uuid, item_key = %key, quantity, "updated cart item");

        Ok(view)
    }

    #[tracing::instrument(
        name = "carts.service.remove_item",
        skip(self),
        fields(owner = ?owner, item_key = %key, removed = tracing::field::Empty),
        err
    )]
    async fn remove_item(
        &self,
        owner: Owner,
        key: CartLineKey,
    ) -> Result<CartView, CartsServiceError> {
        let now = Timestamp::now();
        let mut tx = self.db.begin().await?;

        let cart = self.carts.lock(&mut tx, owner).await?;

        if let Some(cart) = &cart {
            let removed = self.items.remove(&mut tx, cart.uuid, key).await?;

            Span::current().record("removed", removed);
        }

        let view = self.view(&mut tx, cart.as_ref(), now).await?;

        tx.commit().await?;

        Ok(view)
    }

    #[tracing::instrument(
        name = "carts.service.clear",
        skip(self),
        fields(owner = ?owner, removed = tracing::field::Empty),
        err
    )]
    async fn clear(&self, owner: Owner) -> Result<(), CartsServiceError> {
        let mut tx = self.db.begin().await?;

        if let Some(cart) = self.carts.lock(&mut tx, owner).await? {
            let removed = self.items.clear(&mut tx, cart.uuid).await?;

            Span::current().record("removed", removed);
        }

        tx.commit().await?;

        Ok(())
    }

    #[tracing::instrument(
        name = "carts.service.apply_promo_code",
        skip(self, code),
        fields(owner = ?owner, code = tracing::field::Empty, valid = tracing::field::Empty),
        err
    )]
    async fn apply_promo_code(
        &self,
        owner: Owner,
        code: String,
    ) -> Result<PromoCodeInfo, CartsServiceError> {
        let code = promo::normalize_code(&code)?;
        let now = Timestamp::now();

        let span = Span::current();

        span.record("code", tracing::field::display(&code));

        let mut tx = self.db.begin().await?;

        let cart = self.carts.lock(&mut tx, owner).await?;

        let lines = match &cart {
            Some(cart) => self.items.lines(&mut tx, cart.uuid).await?,
            None => Vec::new(),
        };

        let priced = cart::price_cart(lines, now)?;

        let evaluated = evaluation::evaluate(
            &self.promo_codes,
            &mut tx,
            &code,
            owner.user_uuid(),
            &priced,
            now,
            false,
        )
        .await?;

        span.record("valid", evaluated.info.is_valid());

        if let Some(cart) = &cart
            && evaluated.info.is_valid()
        {
            self.carts
                .set_promo_code(&mut tx, cart.uuid, Some(&evaluated.info.code))
                .await?;

            info!(cart_uuid = %cart.uuid, code = %evaluated.info.code, "applied promo code");
        }

        tx.commit().await?;

        Ok(evaluated.info)
    }

    #[tracing::instrument(
        name = "carts.service.remove_promo_code",
        skip(self),
        fields(owner = ?owner),
        err
    )]
    async fn remove_promo_code(&self, owner: Owner) -> Result<(), CartsServiceError> {
        let mut tx = self.db.begin().await?;

        if let Some(cart) = self.carts.lock(&mut tx, owner).await?
            && cart.promo_code.is_some()
        {
            self.carts.set_promo_code(&mut tx, cart.uuid, None).await?;
        }

        tx.commit().await?;

        Ok(())
    }
}

#[automock]
#[async_trait]
pub trait CartsService: Send + Sync {
    /// The owner's cart, priced now. An owner without a cart gets an empty one.
    async fn get_cart(&self, owner: Owner) -> Result<CartView, CartsServiceError>;

    async fn get_summary(&self, owner: Owner) -> Result<CartSummary, CartsServiceError>;

    /// Add a product or offer; an existing line for the same key is incremented.
    async fn add_item(&self, owner: Owner, item: AddItem) -> Result<CartView, CartsServiceError>;

    async fn update_item(
        &self,
        owner: Owner,
        key: CartLineKey,
        quantity: u32,
    ) -> Result<CartView, CartsServiceError>;

    /// Remove a line. Removing an absent line succeeds without change.
    async fn remove_item(&self, owner: Owner, key: CartLineKey)
    -> Result<CartView, CartsServiceError>;

    async fn clear(&self, owner: Owner) -> Result<(), CartsServiceError>;

    /// Evaluate `code` against the cart and keep it only when it applies.
    async fn apply_promo_code(
        &self,
        owner: Owner,
        code: String,
    ) -> Result<PromoCodeInfo, CartsServiceError>;

    async fn remove_promo_code(&self, owner: Owner) -> Result<(), CartsServiceError>;
}
